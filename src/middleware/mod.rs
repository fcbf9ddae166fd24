pub mod admin;
pub mod auth;
pub mod csrf;
pub mod throttle;

pub use admin::AdminGuard;
pub use auth::AuthGuard;
pub use csrf::CsrfGuard;
pub use throttle::ThrottleGuard;

use async_trait::async_trait;
use axum::response::Response;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::SecurityConfig;
use crate::routing::RequestContext;

/// Outcome of a guard check. Deny carries the response the guard produced
/// (redirect or 4xx); dispatch stops at the first deny.
pub enum Verdict {
    Allow,
    Deny(Response),
}

/// Named, reusable predicate over the request context. Guards are stateless
/// across requests apart from their own interior counters (throttling).
#[async_trait]
pub trait Guard: Send + Sync {
    fn name(&self) -> &str;

    async fn check(&self, ctx: &mut RequestContext) -> Verdict;
}

/// Name -> implementation mapping, consulted once per route at registration
/// time. Never used on the request path.
pub struct GuardRegistry {
    guards: HashMap<String, Arc<dyn Guard>>,
}

impl GuardRegistry {
    pub fn new() -> Self {
        Self {
            guards: HashMap::new(),
        }
    }

    /// Registry with the four built-in guards: auth, admin, csrf, throttle.
    pub fn with_builtin(security: &SecurityConfig) -> Self {
        let mut registry = Self::new();
        registry.insert(Arc::new(AuthGuard));
        registry.insert(Arc::new(AdminGuard));
        registry.insert(Arc::new(CsrfGuard));
        registry.insert(Arc::new(ThrottleGuard::new(
            security.throttle_limit,
            Duration::from_secs(security.throttle_window_secs),
        )));
        registry
    }

    pub fn insert(&mut self, guard: Arc<dyn Guard>) {
        self.guards.insert(guard.name().to_string(), guard);
    }

    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Guard>> {
        self.guards.get(name).cloned()
    }
}

impl Default for GuardRegistry {
    fn default() -> Self {
        Self::new()
    }
}
