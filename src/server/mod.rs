//! # Server Module
//!
//! Request and response types exchanged with the transport.
//!
//! The router does not own a socket. A host captures each incoming request
//! into a [`Request`] (directly, or from an `http::Request<String>`), hands
//! it to a [`crate::dispatcher::Dispatcher`], and writes the returned
//! [`Response`] status and body back to the client.
//!
//! Sessions are the host's to keep: a [`SessionStore`] lives next to the
//! route table and [`SessionStore::open`] attaches the client's [`Session`]
//! (found through the `NESTSESSID` cookie) to each request before dispatch.

pub mod request;
pub mod response;
pub mod session;

pub use request::{parse_cookies, parse_query_params, Request};
pub use response::{Outcome, Response};
pub use session::{Session, SessionStore, SESSION_COOKIE};
