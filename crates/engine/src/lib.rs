pub mod binance;
pub mod dispatch;
pub mod lifecycle;
pub mod scanner;
pub mod trend;

pub use binance::BinanceClient;
pub use dispatch::SignalDispatcher;
pub use lifecycle::{Scheduler, SchedulerHandle};
pub use scanner::{CycleReport, Scanner};
pub use trend::TrendClassifier;
