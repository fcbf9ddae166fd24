pub mod context;
pub mod route;
pub mod router;

pub use context::RequestContext;
pub use route::Route;
pub use router::{DispatchTarget, RouteTable};

use thiserror::Error;

/// Errors raised while building the route table. All of these are bootstrap
/// failures; nothing here occurs on the request path.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("unknown middleware '{0}'")]
    UnknownGuard(String),

    #[error(transparent)]
    Regex(#[from] regex::Error),
}
