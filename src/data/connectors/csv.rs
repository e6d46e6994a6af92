use crate::data::history::PriceHistory;
use crate::error::{Result, TradegeneError};
use polars::prelude::*;
use std::path::Path;

pub struct CsvConnector;

impl CsvConnector {
    /// Load CSV file into DataFrame
    pub fn load<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
            .finish()
            .map_err(|e| TradegeneError::DataLoading(format!("Failed to read CSV: {}", e)))?;

        Ok(df)
    }

    /// Load a candle/feature CSV. Every column except the timestamp becomes a
    /// feature column.
    pub fn load_history<P: AsRef<Path>>(
        path: P,
        timestamp_column: &str,
        close_column: &str,
    ) -> Result<PriceHistory> {
        let df = Self::load(&path)?;
        let history = Self::to_history(&df, timestamp_column, close_column)?;
        log::info!(
            "Loaded {} bars x {} columns from {}",
            history.len(),
            history.row_width(),
            path.as_ref().display()
        );
        Ok(history)
    }

    /// Convert a frame into a [`PriceHistory`]. Leading rows with missing
    /// values (indicator warm-up) are dropped; gaps after that are an error.
    pub fn to_history(df: &DataFrame, timestamp_column: &str, close_column: &str) -> Result<PriceHistory> {
        let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
        if !names.iter().any(|n| n == timestamp_column) {
            return Err(TradegeneError::DataLoading(format!(
                "Timestamp column '{}' not found",
                timestamp_column
            )));
        }

        let timestamps = df.column(timestamp_column)?.cast(&DataType::Int64)?;
        let timestamps: Vec<Option<i64>> = timestamps.i64()?.into_iter().collect();

        let feature_names: Vec<String> = names.into_iter().filter(|n| n != timestamp_column).collect();
        let mut columns: Vec<Vec<Option<f64>>> = Vec::with_capacity(feature_names.len());
        for name in &feature_names {
            let column = df.column(name)?.cast(&DataType::Float64)?;
            columns.push(
                column
                    .f64()?
                    .into_iter()
                    .map(|v| v.filter(|x| !x.is_nan()))
                    .collect(),
            );
        }

        let complete = |row: usize| timestamps[row].is_some() && columns.iter().all(|c| c[row].is_some());
        let first = (0..df.height()).find(|&row| complete(row)).unwrap_or(df.height());
        if first > 0 {
            log::warn!("Dropping {} leading rows with missing values", first);
        }

        let mut stamps = Vec::with_capacity(df.height() - first);
        let mut rows = Vec::with_capacity(df.height() - first);
        for row in first..df.height() {
            if !complete(row) {
                return Err(TradegeneError::DataLoading(format!("Missing value in row {}", row)));
            }
            stamps.push(timestamps[row].unwrap_or_default());
            rows.push(columns.iter().map(|c| c[row].unwrap_or_default()).collect());
        }

        PriceHistory::new(feature_names, stamps, rows, close_column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    #[test]
    fn test_to_history_drops_warmup_rows() {
        let df = df! {
            "timestamp" => &[0i64, 60_000, 120_000],
            "close" => &[100.0, 101.0, 102.0],
            "sma2" => &[None, Some(100.5), Some(101.5)],
        }
        .unwrap();

        let history = CsvConnector::to_history(&df, "timestamp", "close").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.columns(), &["close".to_string(), "sma2".to_string()]);
        assert_eq!(history.row_width(), 2);
        assert_eq!(history.bar(0).unwrap().close, 101.0);
        assert_eq!(history.bar(1).unwrap().features, &[102.0, 101.5]);
    }

    #[test]
    fn test_to_history_rejects_interior_gap() {
        let df = df! {
            "timestamp" => &[0i64, 60_000, 120_000],
            "close" => &[Some(100.0), None, Some(102.0)],
        }
        .unwrap();

        assert!(CsvConnector::to_history(&df, "timestamp", "close").is_err());
    }
}
