pub mod pnl_errors;
pub mod pnl_service;


pub use pnl_errors::*;
pub use pnl_service::*;
