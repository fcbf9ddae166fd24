use async_trait::async_trait;
use axum::response::{IntoResponse, Redirect};

use crate::middleware::{Guard, Verdict};
use crate::routing::RequestContext;
use crate::session::FlashKind;

/// Requires a signed-in session; anonymous requests are redirected to the
/// login page.
pub struct AuthGuard;

#[async_trait]
impl Guard for AuthGuard {
    fn name(&self) -> &str {
        "auth"
    }

    async fn check(&self, ctx: &mut RequestContext) -> Verdict {
        if ctx.session.logged_in {
            return Verdict::Allow;
        }
        ctx.flash(FlashKind::Warning, "Please log in to continue");
        let login = format!("{}/login", ctx.state.config.server.base_path);
        Verdict::Deny(Redirect::to(&login).into_response())
    }
}
