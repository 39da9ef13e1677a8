pub mod positions_model;
pub mod positions_repository;
pub mod positions_traits;

pub use positions_model::*;
pub use positions_repository::*;
pub use positions_traits::*;
