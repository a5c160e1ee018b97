pub mod error;
pub mod service;
pub mod validation;

pub use error::DomainError;
