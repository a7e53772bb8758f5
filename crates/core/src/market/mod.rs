pub mod cache;
pub mod error;
pub mod format;
pub mod provider;
pub mod service;
pub mod yahoo;

pub use cache::SnapshotCache;
pub use error::MarketError;
pub use provider::MarketDataProvider;
pub use service::FinancialDataService;
