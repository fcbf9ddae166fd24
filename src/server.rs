use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{HeaderValue, Request};
use axum::response::Response;
use axum::Router;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::controllers::error;
use crate::routing::RequestContext;
use crate::state::AppState;

/// Build the axum application. All traffic funnels through the single
/// fallback handler; routing happens in the application's own route table.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .fallback(handle)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request<Body>,
) -> Response {
    let (parts, body) = request.into_parts();

    let cookie_id = parts
        .headers
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|raw| cookie_value(raw, &state.config.session.cookie_name));
    let session = state.sessions.load_or_create(cookie_id.as_deref()).await;

    let mut ctx = RequestContext::new(
        state.clone(),
        parts.method.clone(),
        parts.uri.path(),
        session,
    );
    ctx.headers = parts.headers;
    ctx.peer = connect_info.map(|ConnectInfo(addr)| addr.ip());
    ctx.query = parse_pairs(parts.uri.query().unwrap_or(""));

    if wants_form_body(&ctx) {
        let limit = state.config.server.max_request_size_bytes;
        match axum::body::to_bytes(body, limit).await {
            Ok(bytes) => ctx.form = parse_pairs(std::str::from_utf8(&bytes).unwrap_or("")),
            Err(err) => warn!(error = %err, "discarding oversized or unreadable body"),
        }
    }

    let mut response = match state.routes.dispatch(&mut ctx).await {
        Ok(response) => response,
        Err(err) => error::internal_error(&mut ctx, err).await,
    };

    if let Some(old_id) = ctx.dropped_session.take() {
        state.sessions.destroy(&old_id).await;
    }
    state.sessions.save(&ctx.session).await;

    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        state.config.session.cookie_name, ctx.session.id
    );
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().append(SET_COOKIE, value);
    }
    response
}

fn wants_form_body(ctx: &RequestContext) -> bool {
    let mutating = matches!(
        ctx.method.as_str(),
        "POST" | "PUT" | "PATCH" | "DELETE"
    );
    mutating
        && ctx
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("application/x-www-form-urlencoded"))
            .unwrap_or(false)
}

fn parse_pairs(raw: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(raw.as_bytes())
        .into_owned()
        .collect()
}

fn cookie_value(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_header_parsing() {
        let header = "other=1; storefront_session=abc-123; theme=dark";
        assert_eq!(
            cookie_value(header, "storefront_session").as_deref(),
            Some("abc-123")
        );
        assert_eq!(cookie_value(header, "missing"), None);
    }

    #[test]
    fn urlencoded_pairs_decode() {
        let pairs = parse_pairs("q=red+mug&page=2&empty=");
        assert_eq!(pairs.get("q").map(String::as_str), Some("red mug"));
        assert_eq!(pairs.get("page").map(String::as_str), Some("2"));
        assert_eq!(pairs.get("empty").map(String::as_str), Some(""));
    }
}
