use http::Method;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use super::Session;
use crate::router::Bindings;
use crate::views::{ViewError, ViewRenderer};

/// An HTTP request as seen by the router.
///
/// Method, URI, headers and body are fixed once captured. The parameter
/// store is the mutable part: the dispatcher writes matched path variables
/// into it and handlers read them back. The request also carries its
/// [`Session`] and, while a handler runs, the dispatcher's view renderer.
#[derive(Clone)]
pub struct Request {
    method: Method,
    uri: String,
    /// Headers (lowercase keys)
    headers: HashMap<String, String>,
    query_params: HashMap<String, String>,
    body: Option<String>,
    params: HashMap<String, String>,
    /// Keys written by the last [`Request::bind`]
    bound: Vec<String>,
    session: Session,
    views: Option<Arc<dyn ViewRenderer>>,
}

/// Extract cookies from the `cookie` header.
pub fn parse_cookies(headers: &HashMap<String, String>) -> HashMap<String, String> {
    headers
        .get("cookie")
        .map(|c| {
            c.split(';')
                .filter_map(|pair| {
                    let mut parts = pair.trim().splitn(2, '=');
                    let name = parts.next()?.trim().to_string();
                    let value = parts.next().unwrap_or("").trim().to_string();
                    Some((name, value))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Parse query string parameters from a URI
///
/// Extracts everything after the `?` character and URL-decodes parameter names and values.
///
/// # Arguments
///
/// * `uri` - The request URI (e.g., `/users?limit=10&offset=20`)
///
/// # Returns
///
/// A map of query parameter names to values
pub fn parse_query_params(uri: &str) -> HashMap<String, String> {
    if let Some(pos) = uri.find('?') {
        let query_str = &uri[pos + 1..];
        url::form_urlencoded::parse(query_str.as_bytes())
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    } else {
        HashMap::new()
    }
}

impl Request {
    /// Capture a request from its method and URI.
    #[must_use]
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        let uri = uri.into();
        let query_params = parse_query_params(&uri);
        debug!(
            method = %method,
            uri = %uri,
            param_count = query_params.len(),
            "Request captured"
        );
        Self {
            method,
            uri,
            headers: HashMap::new(),
            query_params,
            body: None,
            params: HashMap::new(),
            bound: Vec::new(),
            session: Session::new(),
            views: None,
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The URI as received, including any query string
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The URI up to the query string or fragment; this is what routes match against
    #[must_use]
    pub fn path(&self) -> &str {
        let end = self.uri.find(['?', '#']).unwrap_or(self.uri.len());
        &self.uri[..end]
    }

    /// Get a query parameter by name
    #[must_use]
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn query_params(&self) -> &HashMap<String, String> {
        &self.query_params
    }

    /// Get a header by name (case-insensitive)
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    #[must_use]
    pub fn cookies(&self) -> HashMap<String, String> {
        parse_cookies(&self.headers)
    }

    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Set a route parameter, replacing any previous value
    pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.insert(name.into(), value.into());
    }

    /// Get a route parameter by name
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Merge matched path variables into the parameter store.
    ///
    /// Existing keys with the same name are overwritten. Variables bound by
    /// an earlier dispatch of this request are removed first, so the store
    /// only ever holds the current route's variables next to whatever the
    /// host set itself.
    pub fn bind(&mut self, bindings: Bindings) {
        for name in self.bound.drain(..) {
            self.params.remove(&name);
        }
        for (name, value) in bindings {
            let name = name.to_string();
            self.bound.push(name.clone());
            self.params.insert(name, value);
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Replace the request's session, usually with one from a
    /// [`super::SessionStore`]
    pub fn set_session(&mut self, session: Session) {
        self.session = session;
    }

    #[must_use]
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    /// Render the dotted template `name` with the dispatcher's renderer.
    ///
    /// # Errors
    ///
    /// [`ViewError`] if the template is missing or fails to render. Outside
    /// a dispatch no renderer is attached and every name is `NotFound`.
    pub fn view(&self, name: &str, vars: &JsonValue) -> Result<String, ViewError> {
        match &self.views {
            Some(views) => views.render(name, vars),
            None => Err(ViewError::NotFound {
                name: name.to_string(),
            }),
        }
    }

    pub(crate) fn attach_views(&mut self, views: Arc<dyn ViewRenderer>) {
        self.views = Some(views);
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("headers", &self.headers)
            .field("params", &self.params)
            .field("body", &self.body)
            .field("session", &self.session)
            .field("views", &self.views.is_some())
            .finish()
    }
}

impl From<http::Request<String>> for Request {
    fn from(req: http::Request<String>) -> Self {
        let (parts, body) = req.into_parts();
        let uri = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());

        let mut request = Request::new(parts.method, uri);
        for (name, value) in &parts.headers {
            if let Ok(value) = value.to_str() {
                request.headers.insert(name.as_str().to_string(), value.to_string());
            }
        }
        if !body.is_empty() {
            request.body = Some(body);
        }
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cookies() {
        let mut h = HashMap::new();
        h.insert("cookie".to_string(), "a=b; c=d".to_string());
        let cookies = parse_cookies(&h);
        assert_eq!(cookies.get("a"), Some(&"b".to_string()));
        assert_eq!(cookies.get("c"), Some(&"d".to_string()));
    }

    #[test]
    fn test_parse_query_params() {
        let q = parse_query_params("/p?x=1&y=hello%20world");
        assert_eq!(q.get("x"), Some(&"1".to_string()));
        assert_eq!(q.get("y"), Some(&"hello world".to_string()));
    }

    #[test]
    fn test_path_strips_query_and_fragment() {
        assert_eq!(Request::new(Method::GET, "/users/5?tab=posts").path(), "/users/5");
        assert_eq!(Request::new(Method::GET, "/docs#intro").path(), "/docs");
        assert_eq!(Request::new(Method::GET, "/").path(), "/");
    }

    #[test]
    fn test_set_param_overwrites() {
        let mut req = Request::new(Method::GET, "/");
        req.set_param("user", "1");
        req.set_param("user", "2");
        assert_eq!(req.param("user"), Some("2"));
        assert_eq!(req.params().len(), 1);
    }

    #[test]
    fn test_rebind_drops_previous_route_variables() {
        let pattern = crate::router::PathPattern::parse("/:section/:id").unwrap();
        let other = crate::router::PathPattern::parse("/users/:user").unwrap();

        let mut req = Request::new(Method::GET, "/users/7");
        req.set_param("tenant", "acme");
        req.bind(pattern.matches(req.path()).unwrap());
        assert_eq!(req.param("section"), Some("users"));

        req.bind(other.matches(req.path()).unwrap());
        assert_eq!(req.param("user"), Some("7"));
        assert_eq!(req.param("section"), None);
        assert_eq!(req.param("id"), None);
        assert_eq!(req.param("tenant"), Some("acme"));
    }

    #[test]
    fn test_view_without_renderer_is_not_found() {
        let req = Request::new(Method::GET, "/");
        let err = req.view("home.index", &serde_json::json!({})).unwrap_err();
        assert_eq!(
            err,
            ViewError::NotFound {
                name: "home.index".to_string()
            }
        );
    }

    #[test]
    fn test_from_http_request() {
        let http_req = http::Request::builder()
            .method(Method::POST)
            .uri("http://example.com/login?next=%2Fhome")
            .header("Content-Type", "text/plain")
            .header("Cookie", "sid=abc")
            .body("name=ada".to_string())
            .unwrap();

        let req = Request::from(http_req);
        assert_eq!(req.method(), &Method::POST);
        assert_eq!(req.uri(), "/login?next=%2Fhome");
        assert_eq!(req.path(), "/login");
        assert_eq!(req.query("next"), Some("/home"));
        assert_eq!(req.header("content-type"), Some("text/plain"));
        assert_eq!(req.cookies().get("sid").map(String::as_str), Some("abc"));
        assert_eq!(req.body(), Some("name=ada"));
    }
}
