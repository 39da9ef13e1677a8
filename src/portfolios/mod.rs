pub mod portfolios_model;
pub mod portfolios_repository;
pub mod portfolios_traits;

pub use portfolios_model::*;
pub use portfolios_repository::*;
pub use portfolios_traits::*;
