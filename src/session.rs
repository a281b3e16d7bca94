//! Cookie-identified sessions with a one-shot flash message
//!
//! Session data lives in process memory and is lost on restart. The
//! middleware resolves (or opens) the session for each request, hands a
//! [`Session`] to handlers through request extensions and sets the cookie
//! when a new session was opened. Sessions idle for longer than the store's
//! TTL are evicted whenever a session is opened.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use active_model::Message;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue, header},
    middleware::Next,
    response::Response,
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::state::AppState;

pub const SESSION_COOKIE: &str = "corretores_session";

pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(24 * 60);

#[derive(Debug)]
struct SessionData {
    ip: Option<String>,
    values: HashMap<String, String>,
    flash: Option<Message>,
    last_seen: Instant,
}

impl SessionData {
    fn new(ip: Option<String>, now: Instant) -> Self {
        Self {
            ip,
            values: HashMap::new(),
            flash: None,
            last_seen: now,
        }
    }
}

/// All open sessions
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<Uuid, SessionData>>>,
    idle_ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_idle_ttl(DEFAULT_IDLE_TTL)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_ttl(idle_ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            idle_ttl,
        }
    }

    /// Existing session for `id`, or a fresh one recording `ip`.
    ///
    /// Expired sessions are dropped first, so an expired cookie gets a new
    /// session.
    pub async fn open(&self, id: Option<Uuid>, ip: Option<String>) -> (Session, bool) {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().await;

        let before = sessions.len();
        sessions.retain(|_, data| now.duration_since(data.last_seen) < self.idle_ttl);
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::debug!(evicted, remaining = sessions.len(), "idle sessions evicted");
        }

        if let Some(id) = id {
            if let Some(data) = sessions.get_mut(&id) {
                data.last_seen = now;
                return (self.handle(id), false);
            }
        }

        let id = Uuid::new_v4();
        sessions.insert(id, SessionData::new(ip, now));
        tracing::debug!(session = %id, "session opened");
        (self.handle(id), true)
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    fn handle(&self, id: Uuid) -> Session {
        Session {
            id,
            store: self.clone(),
        }
    }
}

/// One client's session
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    store: SessionStore,
}

impl Session {
    pub fn id(&self) -> Uuid {
        self.id
    }

    async fn with_data<T>(&self, f: impl FnOnce(&mut SessionData) -> T) -> Option<T> {
        let mut sessions = self.store.sessions.lock().await;
        sessions.get_mut(&self.id).map(f)
    }

    pub async fn create(&self, key: &str, value: impl Into<String>) {
        let value = value.into();
        self.with_data(|data| data.values.insert(key.to_string(), value))
            .await;
    }

    pub async fn check(&self, key: &str) -> bool {
        self.with_data(|data| data.values.contains_key(key))
            .await
            .unwrap_or(false)
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.with_data(|data| data.values.get(key).cloned())
            .await
            .flatten()
    }

    pub async fn clear(&self, key: &str) {
        self.with_data(|data| data.values.remove(key)).await;
    }

    /// Drop the whole session
    pub async fn delete(&self) {
        self.store.sessions.lock().await.remove(&self.id);
    }

    /// Client address recorded when the session was opened
    pub async fn ip(&self) -> Option<String> {
        self.with_data(|data| data.ip.clone()).await.flatten()
    }

    /// Store a message for the next render, replacing any pending one
    pub async fn flash(&self, message: Message) {
        self.with_data(|data| data.flash = Some(message)).await;
    }

    /// Pending message, removed on read
    pub async fn take_flash(&self) -> Option<Message> {
        self.with_data(|data| data.flash.take()).await.flatten()
    }
}

/// Resolve the session for a request and expose it as an extension
pub async fn session_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let cookie_id = session_id_from_headers(req.headers());
    let ip = client_ip(
        req.headers(),
        req.extensions().get::<ConnectInfo<SocketAddr>>(),
    );

    let (session, created) = state.sessions.open(cookie_id, ip).await;
    let id = session.id();
    req.extensions_mut().insert(session);

    let mut response = next.run(req).await;

    if created {
        let cookie = format!(
            "{SESSION_COOKIE}={id}; Path={}; HttpOnly; SameSite=Lax",
            state.site.base_path
        );
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(err) => tracing::warn!(error = %err, "invalid session cookie"),
        }
    }

    response
}

pub fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value).ok())
}

/// Client address: proxy headers first, then the socket peer
fn client_ip(headers: &HeaderMap, peer: Option<&ConnectInfo<SocketAddr>>) -> Option<String> {
    let from_header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    from_header("client-ip")
        .or_else(|| from_header("x-forwarded-for"))
        .or_else(|| peer.map(|ConnectInfo(addr)| addr.ip().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn flash_is_consumed_once() {
        let store = SessionStore::new();
        let (session, created) = store.open(None, Some("10.0.0.1".to_string())).await;
        assert!(created);

        session.flash(Message::alert("first")).await;
        session.flash(Message::success("second")).await;

        let flash = session.take_flash().await.unwrap();
        assert_eq!(flash.text(), "second");
        assert!(session.take_flash().await.is_none());
        assert_eq!(session.ip().await.as_deref(), Some("10.0.0.1"));
    }

    #[tokio::test]
    async fn known_id_reuses_session() {
        let store = SessionStore::new();
        let (first, _) = store.open(None, None).await;
        first.create("theme", "dark").await;

        let (again, created) = store.open(Some(first.id()), None).await;
        assert!(!created);
        assert_eq!(again.get("theme").await.as_deref(), Some("dark"));

        // unknown ids get a fresh session
        let (other, created) = store.open(Some(Uuid::new_v4()), None).await;
        assert!(created);
        assert_ne!(other.id(), first.id());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn idle_sessions_are_evicted() {
        let store = SessionStore::with_idle_ttl(Duration::from_millis(200));
        let (idle, _) = store.open(None, None).await;
        let (active, _) = store.open(None, None).await;

        tokio::time::sleep(Duration::from_millis(120)).await;
        let (_, created) = store.open(Some(active.id()), None).await;
        assert!(!created);

        tokio::time::sleep(Duration::from_millis(120)).await;
        let (fresh, created) = store.open(None, None).await;
        assert!(created);
        assert_eq!(store.len().await, 2);

        // the idle one is gone, so its cookie opens a new session
        let (reopened, created) = store.open(Some(idle.id()), None).await;
        assert!(created);
        assert_ne!(reopened.id(), idle.id());
        assert!(idle.take_flash().await.is_none());

        let (kept, created) = store.open(Some(active.id()), None).await;
        assert!(!created);
        assert_eq!(kept.id(), active.id());
        assert_ne!(fresh.id(), active.id());
    }

    #[tokio::test]
    async fn values_and_delete() {
        let store = SessionStore::new();
        let (session, _) = store.open(None, None).await;

        session.create("k", "v").await;
        assert!(session.check("k").await);
        session.clear("k").await;
        assert!(!session.check("k").await);

        session.delete().await;
        assert!(store.is_empty().await);
        assert!(session.take_flash().await.is_none());
    }

    #[test]
    fn cookie_parsing() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("other=1; {SESSION_COOKIE}={id}")).unwrap(),
        );
        assert_eq!(session_id_from_headers(&headers), Some(id));

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("corretores_session=garbage"));
        assert_eq!(session_id_from_headers(&headers), None);
    }

    #[test]
    fn ip_prefers_proxy_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9"));
        let peer = ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000)));
        assert_eq!(client_ip(&headers, Some(&peer)).as_deref(), Some("203.0.113.9"));
        assert_eq!(
            client_ip(&HeaderMap::new(), Some(&peer)).as_deref(),
            Some("127.0.0.1")
        );
    }
}
