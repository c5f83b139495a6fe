pub mod cache;
pub mod deep_analysis;
pub mod news;
pub mod scheduler;
pub mod signals;
pub mod watchlist;

pub use cache::Cache;
pub use deep_analysis::DeepAnalysisTrigger;
pub use scheduler::{DashboardSession, FocusedSnapshot, SessionProviders, SessionState};
pub use signals::{analyze, SignalAnalysis, SignalEngine, SortOption};
pub use watchlist::WatchlistCache;
