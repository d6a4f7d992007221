//! # Router Module
//!
//! Route templates, per-method route tables and path matching.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Parsing route templates such as `/users/:userId/invite` into [`PathPattern`]s
//! - Keeping one ordered route list per supported HTTP method
//! - Validating every registration up front (method, template, handler reference)
//! - Finding the first route, in registration order, that matches a request path
//!
//! ## Two phases
//!
//! 1. **Registration**: during startup the host builds a [`RouteTable`]. Every
//!    registration returns a `Result`, and any [`RouteError`] should abort startup.
//!
//! 2. **Matching**: for each request the table is only read. Routes for the
//!    request method are tried in order and the first whose pattern matches wins.
//!
//! ## Example
//!
//! ```rust,ignore
//! use nestrouter::router::RouteTable;
//! use nestrouter::server::Request;
//!
//! let mut table = RouteTable::new();
//! table
//!     .get("/", |_req: &Request| "home")?
//!     .get("/users/:userId", |req: &Request| {
//!         format!("user {}", req.param("userId").unwrap_or_default())
//!     })?;
//!
//! if let Some((route, bindings)) = table.find(&http::Method::GET, "/users/42") {
//!     assert_eq!(route.pattern().as_str(), "/users/:userId");
//!     assert_eq!(bindings.get("userId"), Some("42"));
//! }
//! ```
//!
//! ## Matching rules
//!
//! - A template with no variables matches only the identical path string
//! - Otherwise the path must have the same number of `/` segments as the template
//! - Literal segments compare by exact string equality
//! - Variable segments bind whatever is at that position, including an empty segment
//! - Values are bound verbatim: no decoding and no type coercion

mod error;
mod pattern;
mod table;
#[cfg(test)]
mod tests;

pub use error::RouteError;
pub use pattern::{
    match_path, BindingVec, Bindings, PathPattern, Segment, MAX_INLINE_BINDINGS, VARIABLE_SIGIL,
};
pub use table::{DuplicatePolicy, Lookup, Route, RouteTable};
pub(crate) use table::parse_method;
