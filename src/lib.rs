pub mod db;

pub mod assets;
pub mod batch;
pub mod calendar;
pub mod constants;
pub mod errors;
pub mod market_data;
pub mod pnl;
pub mod portfolios;
pub mod positions;
pub mod schema;
pub mod snapshots;
pub mod valuation;

pub use batch::*;
pub use pnl::*;
