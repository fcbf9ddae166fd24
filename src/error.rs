use thiserror::Error;

use crate::database::gateway::GatewayError;
use crate::entities::EntityError;
use crate::routing::RouterError;

/// Top-level error for the dispatch pipeline. Anything a controller action
/// bubbles up lands here and is converted into a 500 page by the server-layer
/// boundary (detailed in development, generic in production).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Internal(String),
}

impl From<RouterError> for AppError {
    fn from(err: RouterError) -> Self {
        AppError::Config(err.to_string())
    }
}

// Validation errors are normally translated into flash messages at the
// controller boundary; one escaping to the top level is a programming error.
impl From<EntityError> for AppError {
    fn from(err: EntityError) -> Self {
        match err {
            EntityError::Gateway(e) => AppError::Gateway(e),
            EntityError::Validation(errors) => AppError::Internal(format!(
                "unhandled validation failure: {}",
                errors.join("; ")
            )),
        }
    }
}
