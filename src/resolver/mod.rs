//! # Resolver Module
//!
//! Builds handler argument lists for the dispatcher.
//!
//! ## Overview
//!
//! Every handler declares its parameters as data: when a function or
//! controller action is turned into a [`Handler`], the parameter types it
//! takes after `&Request` are recorded as an ordered list of
//! [`DependencySpec`]s. At dispatch time the [`HandlerResolver`] walks that
//! list and constructs a fresh value of each type with no arguments, then
//! the handler is called with the results. Nothing is cached between
//! requests and no types are inspected at runtime.
//!
//! ## Handlers
//!
//! ```rust,ignore
//! use nestrouter::resolver::{Dependency, Handler};
//! use nestrouter::server::Request;
//!
//! #[derive(Default, Dependency)]
//! struct Clock;
//!
//! fn show_user(req: &Request, _clock: Clock) -> String {
//!     format!("user {}", req.param("userId").unwrap_or("?"))
//! }
//!
//! let handler = Handler::from_fn(show_user);
//! assert_eq!(handler.dependencies().len(), 1);
//! ```
//!
//! ## Controllers
//!
//! Controller actions take the controller by reference first; the
//! controller is constructed per dispatch like any other dependency. Route
//! tables refer to actions by `(controller, action)` name and the
//! [`ControllerRegistry`] rejects names that do not exist when the route is
//! registered.

mod controller;
mod core;
mod handler;

pub use controller::{ControllerBuilder, ControllerEntry, ControllerRegistry};
pub use core::{
    Arguments, Dependency, DependencyConstructionError, DependencyError, DependencySpec,
    HandlerResolutionError, HandlerResolver,
};
pub use handler::{
    FunctionMarker, Handler, HandlerKind, HandlerRef, IntoAction, IntoBody, IntoHandler,
    IntoHandlerRef, MethodMarker,
};
pub use nestrouter_macros::Dependency;
