pub mod snapshot_model;
pub mod snapshot_repository;
pub mod snapshot_traits;

pub use snapshot_model::*;
pub use snapshot_repository::*;
pub use snapshot_traits::*;
