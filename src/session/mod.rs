use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::models::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
    Warning,
    Info,
}

/// One-shot, session-scoped notification. The next full-page render drains
/// the whole queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlashMessage {
    pub kind: FlashKind,
    pub text: String,
}

/// Explicit per-client session value carried in every request context.
/// Holds identity plus the flash queue; the cookie carries only the opaque id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub logged_in: bool,
    pub csrf_token: String,
    pub flash_messages: Vec<FlashMessage>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: None,
            username: None,
            email: None,
            role: None,
            logged_in: false,
            csrf_token: Uuid::new_v4().to_string(),
            flash_messages: Vec::new(),
        }
    }

    pub fn sign_in(&mut self, user: &User) {
        self.user_id = Some(user.id);
        self.username = Some(user.username.clone());
        self.email = Some(user.email.clone());
        self.role = Some(user.role.clone());
        self.logged_in = true;
    }

    pub fn is_admin(&self) -> bool {
        self.logged_in && self.role.as_deref() == Some(crate::database::models::user::ROLE_ADMIN)
    }

    pub fn push_flash(&mut self, kind: FlashKind, text: impl Into<String>) {
        self.flash_messages.push(FlashMessage {
            kind,
            text: text.into(),
        });
    }

    /// Read-and-clear the flash queue.
    pub fn take_flashes(&mut self) -> Vec<FlashMessage> {
        std::mem::take(&mut self.flash_messages)
    }
}

struct StoredSession {
    session: Session,
    expires_at: Instant,
}

/// In-memory session store keyed by the opaque cookie id. Reads and writes
/// are whole-session (read-then-write per request); two concurrent requests
/// under the same id can race on flash mutations, matching the upstream
/// session-store semantics.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, StoredSession>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Resolve the cookie id to a live session, or mint a fresh anonymous one
    /// when the id is absent, unknown, or expired.
    pub async fn load_or_create(&self, id: Option<&str>) -> Session {
        if let Some(id) = id {
            let sessions = self.inner.read().await;
            if let Some(stored) = sessions.get(id) {
                if stored.expires_at > Instant::now() {
                    return stored.session.clone();
                }
            }
        }
        Session::anonymous()
    }

    pub async fn save(&self, session: &Session) {
        let mut sessions = self.inner.write().await;
        let now = Instant::now();
        sessions.retain(|_, stored| stored.expires_at > now);
        sessions.insert(
            session.id.clone(),
            StoredSession {
                session: session.clone(),
                expires_at: now + self.ttl,
            },
        );
    }

    pub async fn destroy(&self, id: &str) {
        self.inner.write().await.remove(id);
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}
