use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Redirect, Response};
use serde_json::{json, Value};
use tera::Context;

use crate::database::models::user::ROLE_ADMIN;
use crate::error::AppError;
use crate::routing::RequestContext;
use crate::session::FlashKind;
use crate::views::DEFAULT_LAYOUT;

/// Identity snapshot taken from the session by the auth guards.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

/// Result of an in-action auth check. `Denied` carries the full response;
/// the caller must return it immediately, so no code can run past a failed
/// check without the compiler noticing the unhandled variant.
pub enum AuthCheck {
    Authorized(CurrentUser),
    Denied(Response),
}

pub fn require_auth(ctx: &mut RequestContext) -> AuthCheck {
    let session = &ctx.session;
    if session.logged_in {
        if let (Some(id), Some(username), Some(email), Some(role)) = (
            session.user_id,
            session.username.clone(),
            session.email.clone(),
            session.role.clone(),
        ) {
            return AuthCheck::Authorized(CurrentUser {
                id,
                username,
                email,
                role,
            });
        }
    }
    ctx.flash(FlashKind::Warning, "Please log in to continue");
    AuthCheck::Denied(redirect(ctx, "/login"))
}

pub fn require_admin(ctx: &mut RequestContext) -> AuthCheck {
    match require_auth(ctx) {
        AuthCheck::Authorized(user) if user.is_admin() => AuthCheck::Authorized(user),
        AuthCheck::Authorized(_) => AuthCheck::Denied(
            (
                StatusCode::FORBIDDEN,
                Html("<h1>Access denied</h1><p>This area requires an administrator account.</p>"),
            )
                .into_response(),
        ),
        denied => denied,
    }
}

/// Render a view inside the default layout with a 200 status.
pub fn render(
    ctx: &mut RequestContext,
    view: &str,
    data: Value,
) -> Result<Response, AppError> {
    render_with(ctx, view, data, Some(DEFAULT_LAYOUT), StatusCode::OK)
}

/// Full render contract: the view runs first (pure templating, no data
/// access), its output is injected as `content` into the layout, and the
/// shared globals (flash queue, identity, CSRF token, base path) are merged
/// into both scopes. A missing view or layout is a fatal configuration error
/// surfaced as a 500 by the outer boundary. Rendering drains the flash queue.
pub fn render_with(
    ctx: &mut RequestContext,
    view: &str,
    data: Value,
    layout: Option<&str>,
    status: StatusCode,
) -> Result<Response, AppError> {
    let mut context = Context::from_value(data)?;
    context.insert("base_path", &ctx.state.config.server.base_path);
    context.insert("csrf_token", &ctx.session.csrf_token);
    context.insert("flashes", &ctx.session.take_flashes());
    context.insert("current_user", &current_user_value(ctx));

    let content = ctx.state.views.render(view, &context)?;
    let body = match layout {
        None => content,
        Some(layout) => {
            context.insert("content", &content);
            ctx.state.views.render(layout, &context)?
        }
    };
    Ok((status, Html(body)).into_response())
}

/// Redirect within the application; the target is prefixed with the
/// configured base path.
pub fn redirect(ctx: &RequestContext, to: &str) -> Response {
    Redirect::to(&format!("{}{}", ctx.state.config.server.base_path, to)).into_response()
}

/// Serialize a JSON body with the given status. Producing the response ends
/// the action; there is no way to keep writing after returning it.
pub fn json_response(data: Value, status: StatusCode) -> Response {
    (status, Json(data)).into_response()
}

fn current_user_value(ctx: &RequestContext) -> Value {
    let session = &ctx.session;
    if !session.logged_in {
        return Value::Null;
    }
    json!({
        "id": session.user_id,
        "username": session.username,
        "email": session.email,
        "role": session.role,
        "is_admin": session.is_admin(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::User;
    use crate::session::Session;
    use crate::testing;
    use axum::http::Method;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn anonymous_ctx() -> RequestContext {
        RequestContext::new(
            testing::state(),
            Method::GET,
            "/account",
            Session::anonymous(),
        )
    }

    fn signed_in_ctx(role: &str) -> RequestContext {
        let mut session = Session::anonymous();
        session.sign_in(&User {
            id: 5,
            username: "ada".into(),
            email: "ada@example.com".into(),
            password_hash: String::new(),
            role: role.into(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        });
        RequestContext::new(testing::state(), Method::GET, "/account", session)
    }

    // Models the early-return contract: nothing after a failed check may run.
    async fn guarded_action(
        ctx: &mut RequestContext,
        after_guard: Arc<AtomicUsize>,
    ) -> Result<Response, AppError> {
        let user = match require_auth(ctx) {
            AuthCheck::Authorized(user) => user,
            AuthCheck::Denied(response) => return Ok(response),
        };
        after_guard.fetch_add(1, Ordering::SeqCst);
        Ok(json_response(json!({ "user": user.username }), StatusCode::OK))
    }

    #[tokio::test]
    async fn failed_auth_check_runs_nothing_afterwards() {
        let mut ctx = anonymous_ctx();
        let after_guard = Arc::new(AtomicUsize::new(0));
        let response = guarded_action(&mut ctx, after_guard.clone()).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(after_guard.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn passed_auth_check_reaches_the_action_body() {
        let mut ctx = signed_in_ctx("customer");
        let after_guard = Arc::new(AtomicUsize::new(0));
        let response = guarded_action(&mut ctx, after_guard.clone()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(after_guard.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn require_admin_rejects_customers() {
        let mut ctx = signed_in_ctx("customer");
        match require_admin(&mut ctx) {
            AuthCheck::Denied(response) => {
                assert_eq!(response.status(), StatusCode::FORBIDDEN)
            }
            AuthCheck::Authorized(_) => panic!("expected deny"),
        }
    }

    #[tokio::test]
    async fn render_drains_the_flash_queue() {
        let mut ctx = anonymous_ctx();
        ctx.flash(FlashKind::Success, "saved");
        render(&mut ctx, "errors/404.html", json!({"title": "x"})).unwrap();
        assert!(ctx.session.flash_messages.is_empty());
    }

    #[tokio::test]
    async fn missing_view_is_a_template_error() {
        let mut ctx = anonymous_ctx();
        let err = render(&mut ctx, "missing/view.html", json!({})).unwrap_err();
        assert!(matches!(err, AppError::Template(_)));
    }

    #[tokio::test]
    async fn render_without_layout_skips_the_chrome() {
        let mut ctx = anonymous_ctx();
        let response = render_with(
            &mut ctx,
            "errors/500.html",
            json!({}),
            None,
            StatusCode::INTERNAL_SERVER_ERROR,
        )
        .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains("Something went wrong"));
        assert!(!body.contains("<nav>"));
    }
}
