use crate::error::{Result, TradegeneError};
use chrono::{DateTime, Utc};

/// Column names of a bare OHLCV history, timestamp excluded
pub const OHLCV_COLUMNS: [&str; 5] = ["open", "high", "low", "close", "volume"];

/// Bar-ordered feature table: one timestamp plus one feature row per bar.
/// Reference operands index into the feature row, so the row holds every
/// numeric column except the timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceHistory {
    columns: Vec<String>,
    timestamps: Vec<i64>,
    rows: Vec<Vec<f64>>,
    close_index: usize,
}

/// One bar as seen by a strategy
#[derive(Debug, Clone, Copy)]
pub struct Bar<'a> {
    pub timestamp: i64,
    pub close: f64,
    pub features: &'a [f64],
}

impl<'a> Bar<'a> {
    pub fn time(&self) -> String {
        format_timestamp(self.timestamp)
    }
}

/// Render a millisecond timestamp the way the logs print dates
pub fn format_timestamp(timestamp: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

impl PriceHistory {
    pub fn new(
        columns: Vec<String>,
        timestamps: Vec<i64>,
        rows: Vec<Vec<f64>>,
        close_column: &str,
    ) -> Result<Self> {
        let close_index = columns
            .iter()
            .position(|c| c == close_column)
            .ok_or_else(|| {
                TradegeneError::DataLoading(format!("Close column '{}' not found", close_column))
            })?;

        if timestamps.len() != rows.len() {
            return Err(TradegeneError::DataLoading(format!(
                "{} timestamps for {} rows",
                timestamps.len(),
                rows.len()
            )));
        }
        if let Some(i) = rows.iter().position(|r| r.len() != columns.len()) {
            return Err(TradegeneError::DataLoading(format!(
                "Row {} has {} values, expected {}",
                i,
                rows[i].len(),
                columns.len()
            )));
        }

        Ok(Self {
            columns,
            timestamps,
            rows,
            close_index,
        })
    }

    /// Build from `[timestamp, open, high, low, close, volume]` candles
    pub fn from_candles(candles: &[[f64; 6]]) -> Self {
        Self {
            columns: OHLCV_COLUMNS.iter().map(|c| c.to_string()).collect(),
            timestamps: candles.iter().map(|c| c[0] as i64).collect(),
            rows: candles.iter().map(|c| c[1..].to_vec()).collect(),
            close_index: 3,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row_width(&self) -> usize {
        self.columns.len()
    }

    pub fn bar(&self, index: usize) -> Option<Bar<'_>> {
        self.rows.get(index).map(|row| Bar {
            timestamp: self.timestamps[index],
            close: row[self.close_index],
            features: row,
        })
    }

    pub fn last_bar(&self) -> Option<Bar<'_>> {
        self.len().checked_sub(1).and_then(|i| self.bar(i))
    }

    /// Copy of `len` bars starting at `start`, clamped to the available range
    pub fn window(&self, start: usize, len: usize) -> PriceHistory {
        let start = start.min(self.len());
        let end = start.saturating_add(len).min(self.len());
        Self {
            columns: self.columns.clone(),
            timestamps: self.timestamps[start..end].to_vec(),
            rows: self.rows[start..end].to_vec(),
            close_index: self.close_index,
        }
    }

    /// The most recent `len` bars
    pub fn tail(&self, len: usize) -> PriceHistory {
        self.window(self.len().saturating_sub(len), len)
    }
}

/// Shared time cursor over a history. The first `step` lands on bar 0; each
/// further step advances by `stride` bars until the history is exhausted.
pub struct MarketFeed<'a> {
    history: &'a PriceHistory,
    cursor: Option<usize>,
    stride: usize,
}

impl<'a> MarketFeed<'a> {
    pub fn new(history: &'a PriceHistory, stride: usize) -> Self {
        Self {
            history,
            cursor: None,
            stride: stride.max(1),
        }
    }

    /// Advance the cursor; `false` once no bar is left
    pub fn step(&mut self) -> bool {
        let next = match self.cursor {
            Some(current) => current + self.stride,
            None => 0,
        };
        if next >= self.history.len() {
            return false;
        }
        self.cursor = Some(next);
        true
    }

    pub fn current_bar(&self) -> Option<Bar<'a>> {
        self.cursor.and_then(|i| self.history.bar(i))
    }

    pub fn position(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }
}
