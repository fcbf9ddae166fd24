pub mod product;
pub mod user;

pub use product::{NewProduct, Products};
pub use user::{NewUser, Users};

use thiserror::Error;

/// Errors from the domain-entity layer. Validation happens here, before any
/// write; the gateway below performs none.
#[derive(Debug, Error)]
pub enum EntityError {
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error(transparent)]
    Gateway(#[from] crate::database::GatewayError),
}

impl EntityError {
    pub fn validation_errors(&self) -> Option<&[String]> {
        match self {
            EntityError::Validation(errors) => Some(errors),
            EntityError::Gateway(_) => None,
        }
    }
}
