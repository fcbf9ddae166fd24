use async_trait::async_trait;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect};

use crate::middleware::{Guard, Verdict};
use crate::routing::RequestContext;
use crate::session::FlashKind;

/// Layers a role check atop the auth check: anonymous requests go to the
/// login page, authenticated non-admins get an access-denied response.
pub struct AdminGuard;

#[async_trait]
impl Guard for AdminGuard {
    fn name(&self) -> &str {
        "admin"
    }

    async fn check(&self, ctx: &mut RequestContext) -> Verdict {
        if !ctx.session.logged_in {
            ctx.flash(FlashKind::Warning, "Please log in to continue");
            let login = format!("{}/login", ctx.state.config.server.base_path);
            return Verdict::Deny(Redirect::to(&login).into_response());
        }
        if !ctx.session.is_admin() {
            return Verdict::Deny(
                (
                    StatusCode::FORBIDDEN,
                    Html("<h1>Access denied</h1><p>This area requires an administrator account.</p>"),
                )
                    .into_response(),
            );
        }
        Verdict::Allow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use crate::testing;
    use axum::http::Method;

    fn ctx_with_role(role: Option<&str>) -> RequestContext {
        let mut session = Session::anonymous();
        if let Some(role) = role {
            session.logged_in = true;
            session.role = Some(role.to_string());
        }
        RequestContext::new(testing::state(), Method::GET, "/admin", session)
    }

    #[tokio::test]
    async fn anonymous_goes_to_login() {
        let mut ctx = ctx_with_role(None);
        match AdminGuard.check(&mut ctx).await {
            Verdict::Deny(response) => {
                assert_eq!(response.status(), StatusCode::SEE_OTHER)
            }
            Verdict::Allow => panic!("expected deny"),
        }
    }

    #[tokio::test]
    async fn customer_is_forbidden() {
        let mut ctx = ctx_with_role(Some("customer"));
        match AdminGuard.check(&mut ctx).await {
            Verdict::Deny(response) => {
                assert_eq!(response.status(), StatusCode::FORBIDDEN)
            }
            Verdict::Allow => panic!("expected deny"),
        }
    }

    #[tokio::test]
    async fn admin_is_allowed() {
        let mut ctx = ctx_with_role(Some("admin"));
        assert!(matches!(AdminGuard.check(&mut ctx).await, Verdict::Allow));
    }
}
