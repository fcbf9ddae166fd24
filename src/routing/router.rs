use async_trait::async_trait;
use axum::http::Method;
use axum::response::Response;
use std::collections::HashMap;

use crate::error::AppError;
use crate::middleware::{GuardRegistry, Verdict};
use crate::routing::route::Route;
use crate::routing::{RequestContext, RouterError};

/// A route target. Implemented by the application's action enum so every
/// registered target is a compile-time reference; there is no runtime
/// name-to-handler resolution and thus no "handler not found" failure mode.
#[async_trait]
pub trait DispatchTarget: Send + Sync {
    /// Invoke the action with path-parameter values in the order they were
    /// declared in the pattern. Named parameters are also available on the
    /// context.
    async fn invoke(
        &self,
        ctx: &mut RequestContext,
        args: &[String],
    ) -> Result<Response, AppError>;
}

/// Ordered route table. Matching is first-match-wins in registration order,
/// not longest- or most-specific-match; overlapping patterns resolve to
/// whichever was registered first.
pub struct RouteTable<A> {
    base_path: String,
    registry: GuardRegistry,
    routes: Vec<Route<A>>,
    not_found: A,
}

impl<A: DispatchTarget> RouteTable<A> {
    pub fn new(base_path: String, registry: GuardRegistry, not_found: A) -> Self {
        Self {
            base_path,
            registry,
            routes: Vec::new(),
            not_found,
        }
    }

    /// Register a route. The pattern is compiled and the guard names are
    /// resolved against the registry now, at bootstrap, so neither can fail
    /// during dispatch.
    pub fn register(
        &mut self,
        method: Method,
        pattern: &str,
        action: A,
        guard_names: &[&str],
    ) -> Result<(), RouterError> {
        let guards = guard_names
            .iter()
            .map(|name| {
                self.registry
                    .resolve(name)
                    .ok_or_else(|| RouterError::UnknownGuard(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.routes
            .push(Route::new(method, pattern, action, guards)?);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Strip the configured mount prefix. Trailing slashes are deliberately
    /// left alone: `/products` and `/products/` are distinct paths.
    fn normalize_path<'p>(&self, raw: &'p str) -> &'p str {
        let path = if !self.base_path.is_empty() {
            raw.strip_prefix(self.base_path.as_str()).unwrap_or(raw)
        } else {
            raw
        };
        if path.is_empty() {
            "/"
        } else {
            path
        }
    }

    fn find(&self, method: &Method, path: &str) -> Option<Matched<'_, A>> {
        for route in &self.routes {
            if route.method != *method {
                continue;
            }
            if let Some(captures) = route.regex.captures(path) {
                let mut named = HashMap::new();
                let mut positional = Vec::with_capacity(route.param_names.len());
                for name in &route.param_names {
                    let value = captures
                        .name(name)
                        .map(|m| m.as_str().to_string())
                        .unwrap_or_default();
                    named.insert(name.clone(), value.clone());
                    positional.push(value);
                }
                return Some(Matched {
                    route,
                    positional,
                    named,
                });
            }
        }
        None
    }

    /// Match and run a request. No match (including a method mismatch on an
    /// otherwise-matching path) goes to the not-found action without running
    /// any middleware. Guards run in list order and the first deny
    /// short-circuits with the response it produced. Errors bubble to the
    /// server-layer boundary.
    pub async fn dispatch(&self, ctx: &mut RequestContext) -> Result<Response, AppError> {
        let path = self.normalize_path(&ctx.path).to_string();
        let matched = match self.find(&ctx.method.clone(), &path) {
            Some(m) => m,
            None => return self.not_found.invoke(ctx, &[]).await,
        };

        ctx.params = matched.named;
        for guard in &matched.route.guards {
            match guard.check(ctx).await {
                Verdict::Allow => {}
                Verdict::Deny(response) => return Ok(response),
            }
        }
        matched.route.action.invoke(ctx, &matched.positional).await
    }
}

struct Matched<'t, A> {
    route: &'t Route<A>,
    positional: Vec<String>,
    named: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::Guard;
    use crate::testing;
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone)]
    struct TestAction {
        label: &'static str,
        hits: Arc<AtomicUsize>,
    }

    impl TestAction {
        fn new(label: &'static str) -> Self {
            Self {
                label,
                hits: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl DispatchTarget for TestAction {
        async fn invoke(
            &self,
            _ctx: &mut RequestContext,
            args: &[String],
        ) -> Result<Response, AppError> {
            self.hits.fetch_add(1, Ordering::SeqCst);
            Ok((StatusCode::OK, format!("{}:{}", self.label, args.join(","))).into_response())
        }
    }

    struct DenyGuard {
        checked: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Guard for DenyGuard {
        fn name(&self) -> &str {
            "deny"
        }

        async fn check(&self, _ctx: &mut RequestContext) -> Verdict {
            self.checked.fetch_add(1, Ordering::SeqCst);
            Verdict::Deny((StatusCode::FORBIDDEN, "denied").into_response())
        }
    }

    struct AllowGuard;

    #[async_trait]
    impl Guard for AllowGuard {
        fn name(&self) -> &str {
            "allow"
        }

        async fn check(&self, _ctx: &mut RequestContext) -> Verdict {
            Verdict::Allow
        }
    }

    fn table(base_path: &str) -> RouteTable<TestAction> {
        RouteTable::new(
            base_path.to_string(),
            GuardRegistry::new(),
            TestAction::new("404"),
        )
    }

    fn ctx(method: Method, path: &str) -> RequestContext {
        RequestContext::new(
            testing::state(),
            method,
            path,
            crate::session::Session::anonymous(),
        )
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn first_match_wins_in_registration_order() {
        let mut table = table("");
        table
            .register(Method::GET, "/product/new", TestAction::new("literal"), &[])
            .unwrap();
        table
            .register(Method::GET, "/product/{id}", TestAction::new("param"), &[])
            .unwrap();

        let mut ctx = ctx(Method::GET, "/product/new");
        let response = table.dispatch(&mut ctx).await.unwrap();
        assert_eq!(body_text(response).await, "literal:");
    }

    #[tokio::test]
    async fn reversed_registration_order_flips_the_outcome() {
        let mut table = table("");
        table
            .register(Method::GET, "/product/{id}", TestAction::new("param"), &[])
            .unwrap();
        table
            .register(Method::GET, "/product/new", TestAction::new("literal"), &[])
            .unwrap();

        let mut ctx = ctx(Method::GET, "/product/new");
        let response = table.dispatch(&mut ctx).await.unwrap();
        assert_eq!(body_text(response).await, "param:new");
    }

    #[tokio::test]
    async fn path_parameters_round_trip_verbatim() {
        let mut table = table("");
        table
            .register(Method::GET, "/category/{id}", TestAction::new("cat"), &[])
            .unwrap();

        let mut ctx = ctx(Method::GET, "/category/42");
        let response = table.dispatch(&mut ctx).await.unwrap();
        assert_eq!(body_text(response).await, "cat:42");
        assert_eq!(ctx.param("id"), Some("42"));
    }

    #[tokio::test]
    async fn denying_guard_short_circuits_the_action() {
        let mut registry = GuardRegistry::new();
        let checked = Arc::new(AtomicUsize::new(0));
        registry.insert(Arc::new(DenyGuard {
            checked: checked.clone(),
        }));
        registry.insert(Arc::new(AllowGuard));

        let mut table =
            RouteTable::new(String::new(), registry, TestAction::new("404"));
        let action = TestAction::new("guarded");
        let hits = action.hits.clone();
        table
            .register(Method::POST, "/secret", action, &["deny", "allow"])
            .unwrap();

        let mut ctx = ctx(Method::POST, "/secret");
        let response = table.dispatch(&mut ctx).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(checked.load(Ordering::SeqCst), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unmatched_path_falls_through_to_not_found_without_middleware() {
        let mut registry = GuardRegistry::new();
        let checked = Arc::new(AtomicUsize::new(0));
        registry.insert(Arc::new(DenyGuard {
            checked: checked.clone(),
        }));

        let not_found = TestAction::new("404");
        let not_found_hits = not_found.hits.clone();
        let mut table = RouteTable::new(String::new(), registry, not_found);
        table
            .register(Method::GET, "/products", TestAction::new("list"), &["deny"])
            .unwrap();

        let mut ctx = ctx(Method::GET, "/nope");
        table.dispatch(&mut ctx).await.unwrap();
        assert_eq!(not_found_hits.load(Ordering::SeqCst), 1);
        assert_eq!(checked.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn method_mismatch_is_treated_as_no_match() {
        let mut table = table("");
        let action = TestAction::new("list");
        let hits = action.hits.clone();
        table.register(Method::GET, "/products", action, &[]).unwrap();

        let mut ctx = ctx(Method::POST, "/products");
        let response = table.dispatch(&mut ctx).await.unwrap();
        assert_eq!(body_text(response).await, "404:");
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn trailing_slash_is_a_different_path() {
        let mut table = table("");
        table
            .register(Method::GET, "/products", TestAction::new("list"), &[])
            .unwrap();

        let mut ctx = ctx(Method::GET, "/products/");
        let response = table.dispatch(&mut ctx).await.unwrap();
        assert_eq!(body_text(response).await, "404:");
    }

    #[tokio::test]
    async fn base_path_prefix_is_stripped() {
        let mut table = table("/shop");
        table
            .register(Method::GET, "/products", TestAction::new("list"), &[])
            .unwrap();

        let mut prefixed = ctx(Method::GET, "/shop/products");
        let response = table.dispatch(&mut prefixed).await.unwrap();
        assert_eq!(body_text(response).await, "list:");

        // The prefix alone normalizes to the root path.
        let mut bare = ctx(Method::GET, "/shop");
        let response = table.dispatch(&mut bare).await.unwrap();
        assert_eq!(body_text(response).await, "404:");
    }

    #[tokio::test]
    async fn unknown_guard_name_is_a_registration_error() {
        let mut table = table("");
        let err = table
            .register(Method::GET, "/x", TestAction::new("x"), &["nope"])
            .unwrap_err();
        assert!(matches!(err, RouterError::UnknownGuard(name) if name == "nope"));
    }
}
