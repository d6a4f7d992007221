use serde_json::json;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::ids::{DispatchId, REQUEST_ID_HEADER};
use crate::resolver::HandlerResolver;
use crate::router::{Lookup, Route, RouteTable};
use crate::server::response::status_line;
use crate::server::{Outcome, Request, Response};
use crate::views::{ViewRenderer, ERROR_TEMPLATE};

/// Body of every 500 response.
pub const INTERNAL_ERROR_BODY: &str = "Internal Server Error";

/// Runs one request through a [`RouteTable`].
///
/// Constructed per request and consumed by [`Dispatcher::dispatch`], so it
/// cannot be run twice. The table is borrowed and the renderer shared, so
/// any number of dispatchers may run concurrently against them. Handlers
/// reach the renderer through [`Request::view`].
pub struct Dispatcher<'a> {
    table: &'a RouteTable,
    views: Arc<dyn ViewRenderer>,
    resolver: HandlerResolver,
    id: Option<DispatchId>,
}

impl<'a> Dispatcher<'a> {
    #[must_use]
    pub fn new(table: &'a RouteTable, views: Arc<dyn ViewRenderer>) -> Self {
        Self {
            table,
            views,
            resolver: HandlerResolver::new(),
            id: None,
        }
    }

    /// Use `id` in log events instead of the request's `x-request-id` or
    /// a fresh one
    #[must_use]
    pub fn with_id(mut self, id: DispatchId) -> Self {
        self.id = Some(id);
        self
    }

    /// Route `request` and produce its response.
    ///
    /// - method with no route list: 405 rendered from `errors.http`
    /// - no pattern matches: 404 rendered from `errors.http`
    /// - match: path variables are written into the request parameters,
    ///   overwriting existing keys, then the handler's dependencies are
    ///   constructed and the handler is called; its return value is the
    ///   200 body
    /// - a dependency that cannot be constructed, or a handler panic: 500
    ///   with [`INTERNAL_ERROR_BODY`]
    ///
    /// The dispatch id comes from [`Dispatcher::with_id`], else from a valid
    /// `x-request-id` header, else is minted; it tags every log event and
    /// the returned response.
    ///
    /// Never fails: every error is logged and turned into a response.
    pub fn dispatch(self, request: &mut Request) -> Response {
        let start = Instant::now();
        let id = self
            .id
            .unwrap_or_else(|| DispatchId::from_header_or_new(request.header(REQUEST_ID_HEADER)));

        debug!(
            dispatch_id = %id,
            method = %request.method(),
            path = %request.path(),
            "Dispatch start"
        );

        let response = match self.table.lookup(request.method(), request.path()) {
            Lookup::MethodNotAllowed => {
                warn!(
                    dispatch_id = %id,
                    method = %request.method(),
                    path = %request.path(),
                    supported = ?self.table.supported_methods(),
                    "Method not allowed"
                );
                self.fallback(id, Outcome::MethodNotAllowed)
            }
            Lookup::NotFound => {
                warn!(
                    dispatch_id = %id,
                    method = %request.method(),
                    path = %request.path(),
                    candidates = self.table.routes(request.method()).map_or(0, <[_]>::len),
                    "No route matched"
                );
                self.fallback(id, Outcome::NotFound)
            }
            Lookup::Matched(route, bindings) => {
                info!(
                    dispatch_id = %id,
                    method = %request.method(),
                    path = %request.path(),
                    pattern = %route.pattern(),
                    handler = %route.handler().name(),
                    param_count = bindings.len(),
                    "Route matched"
                );
                request.bind(bindings);
                request.attach_views(Arc::clone(&self.views));
                self.invoke(id, route, request)
            }
        };

        info!(
            dispatch_id = %id,
            method = %request.method(),
            path = %request.path(),
            status = response.status().as_u16(),
            duration_us = start.elapsed().as_micros(),
            "Dispatch complete"
        );
        response.with_dispatch_id(id)
    }

    fn invoke(&self, id: DispatchId, route: &Route, request: &Request) -> Response {
        let handler = route.handler();

        let args = match self.resolver.resolve(handler) {
            Ok(args) => args,
            Err(err) => {
                error!(
                    dispatch_id = %id,
                    handler = %handler.name(),
                    dependency = err.type_name,
                    position = err.position,
                    error = %err,
                    "Handler dependencies could not be constructed"
                );
                return internal_error();
            }
        };

        let start = Instant::now();
        match catch_unwind(AssertUnwindSafe(|| handler.call(request, args))) {
            Ok(Ok(body)) => {
                debug!(
                    dispatch_id = %id,
                    handler = %handler.name(),
                    body_len = body.len(),
                    execution_us = start.elapsed().as_micros(),
                    "Handler complete"
                );
                Response::ok(body)
            }
            Ok(Err(err)) => {
                error!(
                    dispatch_id = %id,
                    handler = %handler.name(),
                    error = %err,
                    "Handler arguments did not match its parameters"
                );
                internal_error()
            }
            Err(panic) => {
                error!(
                    dispatch_id = %id,
                    handler = %handler.name(),
                    panic_message = %panic_message(panic.as_ref()),
                    "Handler panicked"
                );
                internal_error()
            }
        }
    }

    /// Render `errors.http` for a 404 or 405.
    ///
    /// Falls back to a plain `"<code> <reason>"` body if rendering fails.
    fn fallback(&self, id: DispatchId, outcome: Outcome) -> Response {
        let status = outcome.status();
        let vars = json!({
            "statusCode": status.as_u16(),
            "statusMessage": status.canonical_reason().unwrap_or_default(),
        });

        let body = match self.views.render(ERROR_TEMPLATE, &vars) {
            Ok(body) => body,
            Err(err) => {
                error!(
                    dispatch_id = %id,
                    status = status.as_u16(),
                    template = ERROR_TEMPLATE,
                    error = %err,
                    "Error template failed to render"
                );
                status_line(status)
            }
        };
        Response::new(outcome, body)
    }
}

fn internal_error() -> Response {
    Response::new(Outcome::Failed, INTERNAL_ERROR_BODY.to_string())
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
