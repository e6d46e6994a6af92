pub mod incubator;
pub mod ledger;
pub mod progress;
pub mod signals;
pub mod simulator;
pub mod walk_forward;

pub use incubator::{BestStrategy, Incubator};
pub use ledger::{Ledger, Wallet};
pub use progress::{ConsoleProgressCallback, ProgressCallback, SilentProgress};
pub use signals::{trade_bar, Signal, Strategy};
pub use simulator::MarketSimulator;
pub use walk_forward::{WalkForward, WalkForwardReport};
