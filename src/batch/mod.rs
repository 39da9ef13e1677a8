pub mod batch_model;
pub mod batch_phases;
pub mod batch_service;
pub mod batch_traits;

#[cfg(test)]
mod batch_service_tests;

pub use batch_model::*;
pub use batch_phases::*;
pub use batch_service::*;
pub use batch_traits::*;
