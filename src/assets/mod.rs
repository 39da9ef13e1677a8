pub mod assets_constants;
pub mod assets_errors;
pub mod assets_model;
pub mod assets_repository;
pub mod assets_service;
pub mod assets_traits;

pub use assets_constants::*;
pub use assets_errors::*;
pub use assets_model::*;
pub use assets_repository::*;
pub use assets_service::*;
pub use assets_traits::*;
