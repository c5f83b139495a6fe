pub mod asset;
pub mod chart;
pub mod news;
pub mod sentiment;
pub mod signals;
pub mod watchlist;

pub use asset::*;
pub use chart::*;
pub use news::*;
pub use sentiment::*;
pub use signals::*;
pub use watchlist::*;
