//! # nestrouter
//!
//! **nestrouter** is a small synchronous HTTP router: register handlers against
//! `/`-delimited route templates per HTTP method, then dispatch requests to the
//! first matching route.
//!
//! ## Overview
//!
//! A host application builds a [`RouteTable`] during startup, then hands each
//! incoming [`Request`] to a fresh [`Dispatcher`]. The dispatcher finds the
//! route, writes the path variables into the request, constructs the handler's
//! declared dependencies and calls it. Requests that match nothing get a 404 or
//! 405 body rendered from the `errors.http` view.
//!
//! ## Architecture
//!
//! - **[`router`]** - Route templates, per-method route tables and path matching
//! - **[`resolver`]** - Handler values, declared dependencies and controller registry
//! - **[`dispatcher`]** - Per-request state machine producing a [`Response`]
//! - **[`server`]** - Request and response types
//! - **[`views`]** - `minijinja` view rendering and the `errors.http` fallback
//! - **[`config`]** - YAML/TOML router configuration with environment overrides
//! - **[`logging`]** - `tracing` subscriber setup
//! - **[`cli`]** - The `nestrouter` command-line tool
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Host
//!     participant Dispatcher
//!     participant Table as RouteTable
//!     participant Resolver as HandlerResolver
//!     participant Handler
//!     participant Views as ViewRenderer
//!
//!     Host->>Dispatcher: dispatch(&mut request)
//!     Dispatcher->>Table: lookup(method, path)
//!
//!     alt Method has no route list
//!         Dispatcher->>Views: render("errors.http", 405)
//!         Dispatcher-->>Host: 405 Method Not Allowed
//!     end
//!
//!     alt No pattern matched
//!         Dispatcher->>Views: render("errors.http", 404)
//!         Dispatcher-->>Host: 404 Not Found
//!     end
//!
//!     Table-->>Dispatcher: Route + Bindings
//!     Dispatcher->>Dispatcher: request.bind(bindings)
//!     Dispatcher->>Resolver: resolve(handler)
//!
//!     alt Dependency construction failed
//!         Dispatcher-->>Host: 500 Internal Server Error
//!     end
//!
//!     Resolver-->>Dispatcher: Arguments
//!     Dispatcher->>Handler: call(&request, arguments)
//!     Handler-->>Dispatcher: body
//!     Dispatcher-->>Host: 200 + body
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use nestrouter::{Dependency, Dispatcher, Request, RouteTable, TemplateEngine};
//!
//! #[derive(Default, Dependency)]
//! struct Mailer;
//!
//! #[derive(Default, Dependency)]
//! struct UserController;
//!
//! impl UserController {
//!     fn invite(&self, req: &Request, _mailer: Mailer) -> String {
//!         format!("invited {}", req.param("userId").unwrap_or_default())
//!     }
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     nestrouter::logging::init_logging()?;
//!
//!     let mut table = RouteTable::new();
//!     table
//!         .controllers_mut()
//!         .register::<UserController>("UserController")
//!         .action("invite", UserController::invite);
//!     table
//!         .get("/", |_req: &Request| "home")?
//!         .post("/users/:userId/invite", ("UserController", "invite"))?;
//!
//!     let views = std::sync::Arc::new(TemplateEngine::new());
//!     let mut request = Request::new(http::Method::POST, "/users/42/invite");
//!     let response = Dispatcher::new(&table, views).dispatch(&mut request);
//!     assert_eq!(response.body(), "invited 42");
//!     Ok(())
//! }
//! ```
//!
//! ## Concurrency
//!
//! Dispatch is synchronous. A built [`RouteTable`] is `Send + Sync` and is only
//! read during dispatch, so hosts may share it across threads and run one
//! dispatcher per request. Registration must finish before serving starts.

// Lets `#[derive(Dependency)]` expand to `::nestrouter::...` inside this crate too
extern crate self as nestrouter;

pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod ids;
pub mod logging;
pub mod resolver;
pub mod router;
pub mod server;
pub mod views;

pub use config::RouterConfig;
pub use dispatcher::Dispatcher;
pub use ids::DispatchId;
pub use resolver::{
    ControllerRegistry, Dependency, DependencyConstructionError, DependencyError, Handler,
    HandlerRef, HandlerResolutionError, HandlerResolver,
};
pub use router::{Bindings, DuplicatePolicy, PathPattern, Route, RouteError, RouteTable};
pub use server::{Outcome, Request, Response, Session, SessionStore};
pub use views::{TemplateEngine, ViewError, ViewRenderer};
