//! Swingbot - trading signal engine and multi-cadence watchlist refresher

pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
pub use services::{DashboardSession, SessionProviders, WatchlistCache};
pub use types::*;
