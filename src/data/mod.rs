pub mod connectors;
pub mod history;
pub mod snapshot;

pub use connectors::CsvConnector;
pub use history::{format_timestamp, Bar, MarketFeed, PriceHistory};
pub use snapshot::SnapshotKey;
