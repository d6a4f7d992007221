//! # Dispatcher Module
//!
//! Turns a request into a response using a built [`crate::router::RouteTable`].
//!
//! ## Overview
//!
//! One [`Dispatcher`] is created per request. It:
//! - Looks up the route list for the request method (none: 405)
//! - Tries each route in registration order (no match: 404)
//! - Writes the matched path variables into the request parameters
//! - Constructs the handler's declared dependencies and calls it (200)
//! - Answers 500 when a dependency cannot be constructed or the handler panics
//!
//! 404 and 405 bodies come from the `errors.http` view, rendered with
//! `statusCode` and `statusMessage`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use nestrouter::dispatcher::Dispatcher;
//! use nestrouter::router::RouteTable;
//! use nestrouter::server::Request;
//! use nestrouter::views::TemplateEngine;
//! use std::sync::Arc;
//!
//! let mut table = RouteTable::new();
//! table.get("/users/:user", |req: &Request| {
//!     format!("hello {}", req.param("user").unwrap_or_default())
//! })?;
//! let views = Arc::new(TemplateEngine::new());
//!
//! let mut request = Request::new(http::Method::GET, "/users/ada");
//! let response = Dispatcher::new(&table, views).dispatch(&mut request);
//! assert_eq!(response.status(), http::StatusCode::OK);
//! assert_eq!(response.body(), "hello ada");
//! assert_eq!(request.param("user"), Some("ada"));
//! ```
//!
//! ## Error Handling
//!
//! Dispatch never returns an error. Failures are logged with the
//! dispatch's [`crate::ids::DispatchId`] and become 404, 405 or 500
//! responses; the route table is never modified.

mod core;

pub use core::{Dispatcher, INTERNAL_ERROR_BODY};
