use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use axum::response::{Html, IntoResponse};

use crate::middleware::{Guard, Verdict};
use crate::routing::RequestContext;

/// Mutating requests must echo the session's CSRF token, either as the
/// `_token` form field or the `x-csrf-token` header. Safe methods pass
/// through untouched.
pub struct CsrfGuard;

fn is_safe(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

#[async_trait]
impl Guard for CsrfGuard {
    fn name(&self) -> &str {
        "csrf"
    }

    async fn check(&self, ctx: &mut RequestContext) -> Verdict {
        if is_safe(&ctx.method) {
            return Verdict::Allow;
        }
        match ctx.provided_csrf_token() {
            Some(token) if token == ctx.session.csrf_token => Verdict::Allow,
            _ => Verdict::Deny(
                (
                    StatusCode::FORBIDDEN,
                    Html("<h1>Request rejected</h1><p>Missing or invalid CSRF token.</p>"),
                )
                    .into_response(),
            ),
        }
    }
}
