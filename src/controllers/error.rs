use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use crate::controllers::base;
use crate::error::AppError;
use crate::routing::RequestContext;
use crate::views::DEFAULT_LAYOUT;

/// Missing pages are expected traffic; rendered at debug level only.
pub async fn not_found(ctx: &mut RequestContext) -> Result<Response, AppError> {
    tracing::debug!(path = %ctx.path, "no route matched");
    base::render_with(
        ctx,
        "errors/404.html",
        json!({ "title": "Page not found" }),
        Some(DEFAULT_LAYOUT),
        StatusCode::NOT_FOUND,
    )
}

/// Terminal boundary for infrastructure failures. Logs the full error, then
/// renders the detailed page in development and a generic one in production.
/// If even that render fails, falls back to plain text rather than recursing.
pub async fn internal_error(ctx: &mut RequestContext, err: AppError) -> Response {
    error!(path = %ctx.path, error = ?err, "request failed");

    let rendered = if ctx.state.config.is_development() {
        base::render_with(
            ctx,
            "errors/500_debug.html",
            json!({ "title": "Internal error", "detail": format!("{:?}", err) }),
            Some(DEFAULT_LAYOUT),
            StatusCode::INTERNAL_SERVER_ERROR,
        )
    } else {
        base::render_with(
            ctx,
            "errors/500.html",
            json!({ "title": "Internal error" }),
            Some(DEFAULT_LAYOUT),
            StatusCode::INTERNAL_SERVER_ERROR,
        )
    };

    rendered.unwrap_or_else(|render_err| {
        error!(error = ?render_err, "error page failed to render");
        (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong").into_response()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use crate::testing;
    use axum::http::Method;

    #[tokio::test]
    async fn not_found_renders_with_404_status() {
        let mut ctx = RequestContext::new(
            testing::state(),
            Method::GET,
            "/no/such/page",
            Session::anonymous(),
        );
        let response = not_found(&mut ctx).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn internal_error_always_produces_a_500() {
        let mut ctx = RequestContext::new(
            testing::state(),
            Method::GET,
            "/boom",
            Session::anonymous(),
        );
        let response =
            internal_error(&mut ctx, AppError::Internal("disk on fire".into())).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
