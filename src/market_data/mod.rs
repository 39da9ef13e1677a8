pub mod market_data_constants;
pub mod market_data_errors;
pub mod market_data_model;
pub mod market_data_repository;
pub mod market_data_traits;
pub mod price_resolver;

pub use market_data_constants::*;
pub use market_data_errors::*;
pub use market_data_model::*;
pub use market_data_repository::*;
pub use market_data_traits::*;
pub use price_resolver::*;
