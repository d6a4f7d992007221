use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

use super::Request;

/// Cookie carrying the session id between requests.
pub const SESSION_COOKIE: &str = "NESTSESSID";

/// Key-value storage shared by the requests of one client.
///
/// A handle: clones see the same values, so a handler can `put` through the
/// `&Request` it was given and the next request of the same session reads
/// it back. A request that was never attached to a [`SessionStore`] carries
/// a private session that lives only as long as the request.
#[derive(Clone)]
pub struct Session {
    id: Arc<str>,
    values: Arc<RwLock<HashMap<String, JsonValue>>>,
}

impl Session {
    /// A new empty session with a fresh id
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: ulid::Ulid::new().to_string().into(),
            values: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Value stored under `key`, if any
    #[must_use]
    pub fn get(&self, key: &str) -> Option<JsonValue> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Store `value` under `key`, replacing any previous value
    pub fn put(&self, key: impl Into<String>, value: impl Into<JsonValue>) {
        let key = key.into();
        debug!(session_id = %self.id, key = %key, "Session value stored");
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value.into());
    }

    /// Remove and return the value under `key`
    pub fn remove(&self, key: &str) -> Option<JsonValue> {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("len", &self.len())
            .finish()
    }
}

/// Server-side sessions owned by the host, keyed by id.
///
/// Cheap to clone; clones share the same sessions. Sessions are never
/// expired by the store.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the session named by the request's [`SESSION_COOKIE`].
    ///
    /// An unknown or missing cookie starts a new session, which is stored
    /// and returned; the host sends its id back with [`Self::cookie_header`].
    pub fn open(&self, request: &mut Request) -> Session {
        let cookie = request.cookies().remove(SESSION_COOKIE);

        if let Some(id) = cookie.as_deref() {
            let existing = self
                .sessions
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get(id)
                .cloned();
            if let Some(session) = existing {
                debug!(session_id = %id, "Session resumed");
                request.set_session(session.clone());
                return session;
            }
        }

        let session = Session::new();
        debug!(
            session_id = %session.id(),
            stale_cookie = cookie.is_some(),
            "Session started"
        );
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session.id().to_string(), session.clone());
        request.set_session(session.clone());
        session
    }

    /// Look up a session by id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Session> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Drop a session; later requests carrying its cookie start over
    pub fn destroy(&self, id: &str) -> bool {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `Set-Cookie` value that keeps `session` on the client
    #[must_use]
    pub fn cookie_header(session: &Session) -> String {
        format!("{SESSION_COOKIE}={}; Path=/; HttpOnly", session.id())
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("sessions", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use serde_json::json;

    #[test]
    fn test_put_then_get() {
        let session = Session::new();
        session.put("user", "ada");
        session.put("visits", 3);
        assert_eq!(session.get("user"), Some(json!("ada")));
        assert_eq!(session.get("visits"), Some(json!(3)));
        assert_eq!(session.len(), 2);
    }

    #[test]
    fn test_missing_key_is_none() {
        let session = Session::new();
        assert_eq!(session.get("absent"), None);
        assert!(session.is_empty());
    }

    #[test]
    fn test_put_replaces_and_remove() {
        let session = Session::new();
        session.put("theme", "dark");
        session.put("theme", "light");
        assert_eq!(session.get("theme"), Some(json!("light")));
        assert_eq!(session.remove("theme"), Some(json!("light")));
        assert_eq!(session.get("theme"), None);
    }

    #[test]
    fn test_clones_share_values() {
        let session = Session::new();
        let other = session.clone();
        other.put("k", "v");
        assert_eq!(session.get("k"), Some(json!("v")));
        assert_eq!(session.id(), other.id());
    }

    #[test]
    fn test_store_resumes_by_cookie() {
        let store = SessionStore::new();

        let mut first = Request::new(Method::GET, "/login");
        let session = store.open(&mut first);
        first.session().put("user", "ada");
        assert_eq!(store.len(), 1);

        let cookie = SessionStore::cookie_header(&session);
        assert!(cookie.starts_with("NESTSESSID="));

        let mut second = Request::new(Method::GET, "/profile")
            .with_header("Cookie", format!("{SESSION_COOKIE}={}", session.id()));
        let resumed = store.open(&mut second);
        assert_eq!(resumed.id(), session.id());
        assert_eq!(second.session().get("user"), Some(json!("ada")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_starts_new_session_for_unknown_cookie() {
        let store = SessionStore::new();
        let mut request = Request::new(Method::GET, "/")
            .with_header("cookie", "NESTSESSID=forged; other=1");
        let session = store.open(&mut request);
        assert_ne!(session.id(), "forged");
        assert!(store.get(session.id()).is_some());
        assert!(store.get("forged").is_none());
    }

    #[test]
    fn test_destroy() {
        let store = SessionStore::new();
        let mut request = Request::new(Method::GET, "/");
        let id = store.open(&mut request).id().to_string();
        assert!(store.destroy(&id));
        assert!(!store.destroy(&id));
        assert!(store.is_empty());
    }
}
