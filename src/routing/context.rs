use axum::http::{HeaderMap, Method};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

use crate::session::{FlashKind, Session};
use crate::state::AppState;

/// Per-request bundle handed to guards and controller actions. Created at
/// dispatch start and dropped at response send; the session it carries is
/// written back to the store by the server layer afterwards.
pub struct RequestContext {
    pub state: Arc<AppState>,
    pub method: Method,
    /// Raw request path before base-prefix stripping.
    pub path: String,
    /// Named path parameters captured by the matched route.
    pub params: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub form: HashMap<String, String>,
    pub headers: HeaderMap,
    pub peer: Option<IpAddr>,
    pub session: Session,
    /// Session id destroyed during this request (logout rotation); the server
    /// layer removes it from the store before saving the current session.
    pub dropped_session: Option<String>,
}

impl RequestContext {
    pub fn new(
        state: Arc<AppState>,
        method: Method,
        path: impl Into<String>,
        session: Session,
    ) -> Self {
        Self {
            state,
            method,
            path: path.into(),
            params: HashMap::new(),
            query: HashMap::new(),
            form: HashMap::new(),
            headers: HeaderMap::new(),
            peer: None,
            session,
            dropped_session: None,
        }
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn form_value(&self, name: &str) -> Option<&str> {
        self.form.get(name).map(String::as_str)
    }

    pub fn flash(&mut self, kind: FlashKind, text: impl Into<String>) {
        self.session.push_flash(kind, text);
    }

    /// Destroy the current session and start a fresh anonymous one. Used on
    /// logout and after login to rotate the session id.
    pub fn reset_session(&mut self) {
        let old = std::mem::replace(&mut self.session, Session::anonymous());
        self.dropped_session = Some(old.id);
    }

    /// CSRF token supplied by the client, from the `_token` form field or the
    /// `x-csrf-token` header.
    pub fn provided_csrf_token(&self) -> Option<&str> {
        if let Some(token) = self.form.get("_token") {
            return Some(token.as_str());
        }
        self.headers
            .get("x-csrf-token")
            .and_then(|v| v.to_str().ok())
    }
}
