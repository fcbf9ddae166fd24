use async_trait::async_trait;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::middleware::{Guard, Verdict};
use crate::routing::RequestContext;

/// Fixed-window request counter keyed by peer address. Requests without a
/// known peer (e.g. in-process tests) are not throttled.
pub struct ThrottleGuard {
    limit: u32,
    window: Duration,
    hits: RwLock<HashMap<IpAddr, WindowCounter>>,
}

struct WindowCounter {
    window_start: Instant,
    count: u32,
}

impl ThrottleGuard {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            hits: RwLock::new(HashMap::new()),
        }
    }

    async fn register_hit(&self, peer: IpAddr) -> bool {
        let now = Instant::now();
        let mut hits = self.hits.write().await;
        // Drop peers whose window has lapsed so the map tracks only
        // currently-active clients.
        hits.retain(|_, counter| now.duration_since(counter.window_start) < self.window);
        let counter = hits.entry(peer).or_insert(WindowCounter {
            window_start: now,
            count: 0,
        });
        counter.count += 1;
        counter.count <= self.limit
    }
}

#[async_trait]
impl Guard for ThrottleGuard {
    fn name(&self) -> &str {
        "throttle"
    }

    async fn check(&self, ctx: &mut RequestContext) -> Verdict {
        let peer = match ctx.peer {
            Some(peer) => peer,
            None => return Verdict::Allow,
        };
        if self.register_hit(peer).await {
            Verdict::Allow
        } else {
            Verdict::Deny(
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    Html("<h1>Slow down</h1><p>Too many requests; try again shortly.</p>"),
                )
                    .into_response(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use crate::testing;
    use axum::http::Method;

    fn ctx(peer: Option<IpAddr>) -> RequestContext {
        let mut ctx = RequestContext::new(
            testing::state(),
            Method::POST,
            "/login",
            Session::anonymous(),
        );
        ctx.peer = peer;
        ctx
    }

    #[tokio::test]
    async fn denies_after_limit_within_window() {
        let guard = ThrottleGuard::new(2, Duration::from_secs(60));
        let peer: IpAddr = "10.0.0.1".parse().unwrap();

        let mut ctx = ctx(Some(peer));
        assert!(matches!(guard.check(&mut ctx).await, Verdict::Allow));
        assert!(matches!(guard.check(&mut ctx).await, Verdict::Allow));
        match guard.check(&mut ctx).await {
            Verdict::Deny(response) => {
                assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS)
            }
            Verdict::Allow => panic!("expected deny"),
        }
    }

    #[tokio::test]
    async fn peers_are_counted_separately() {
        let guard = ThrottleGuard::new(1, Duration::from_secs(60));
        let mut first = ctx(Some("10.0.0.1".parse().unwrap()));
        let mut second = ctx(Some("10.0.0.2".parse().unwrap()));

        assert!(matches!(guard.check(&mut first).await, Verdict::Allow));
        assert!(matches!(guard.check(&mut second).await, Verdict::Allow));
        assert!(matches!(guard.check(&mut first).await, Verdict::Deny(_)));
    }

    #[tokio::test]
    async fn window_resets_the_counter() {
        let guard = ThrottleGuard::new(1, Duration::from_millis(0));
        let mut ctx = ctx(Some("10.0.0.3".parse().unwrap()));
        assert!(matches!(guard.check(&mut ctx).await, Verdict::Allow));
        assert!(matches!(guard.check(&mut ctx).await, Verdict::Allow));
    }

    #[tokio::test]
    async fn lapsed_peers_are_evicted_from_the_map() {
        let guard = ThrottleGuard::new(10, Duration::from_millis(0));
        for i in 0..100u8 {
            let mut ctx = ctx(Some(IpAddr::from([10, 0, 0, i])));
            guard.check(&mut ctx).await;
        }
        // Every earlier window has lapsed; only the latest peer remains.
        assert_eq!(guard.hits.read().await.len(), 1);
    }

    #[tokio::test]
    async fn active_peers_survive_eviction() {
        let guard = ThrottleGuard::new(10, Duration::from_secs(60));
        for i in 0..5u8 {
            let mut ctx = ctx(Some(IpAddr::from([10, 0, 1, i])));
            guard.check(&mut ctx).await;
        }
        assert_eq!(guard.hits.read().await.len(), 5);
    }

    #[tokio::test]
    async fn unknown_peer_is_not_throttled() {
        let guard = ThrottleGuard::new(0, Duration::from_secs(60));
        let mut ctx = ctx(None);
        assert!(matches!(guard.check(&mut ctx).await, Verdict::Allow));
    }
}
