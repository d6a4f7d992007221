use http::Method;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::{Bindings, PathPattern, RouteError};
use crate::config::RouterConfig;
use crate::resolver::{ControllerRegistry, Handler, HandlerRef, IntoHandlerRef};

/// What to do when a pattern is registered twice for the same method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Keep both; the first registered is the only one ever matched
    #[default]
    Shadow,
    /// Fail registration with [`RouteError::DuplicateRoute`]
    Reject,
}

/// A registered route: method, parsed pattern and resolved handler.
#[derive(Debug, Clone)]
pub struct Route {
    method: Method,
    pattern: PathPattern,
    handler: Handler,
}

impl Route {
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    #[must_use]
    pub fn handler(&self) -> &Handler {
        &self.handler
    }
}

/// Result of looking a request up in a [`RouteTable`].
#[derive(Debug)]
pub enum Lookup<'a> {
    /// First route, in registration order, whose pattern matched
    Matched(&'a Route, Bindings),
    /// The method is supported but no pattern matched
    NotFound,
    /// The method has no entry in the table
    MethodNotAllowed,
}

/// Per-method ordered route lists.
///
/// Built during startup, then shared read-only with every dispatch. Every
/// supported method has an entry, possibly empty; a request for a method
/// outside that set is answered with 405 rather than 404.
#[derive(Debug, Clone)]
pub struct RouteTable {
    methods: Vec<Method>,
    routes: HashMap<Method, Vec<Route>>,
    controllers: ControllerRegistry,
    duplicate_policy: DuplicatePolicy,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteTable {
    /// Table supporting `GET` and `POST` that shadows duplicate patterns
    #[must_use]
    pub fn new() -> Self {
        Self::with_methods([Method::GET, Method::POST])
    }

    /// Table supporting exactly `methods`
    #[must_use]
    pub fn with_methods(methods: impl IntoIterator<Item = Method>) -> Self {
        let mut supported: Vec<Method> = Vec::new();
        for method in methods {
            if !supported.contains(&method) {
                supported.push(method);
            }
        }
        let routes = supported.iter().map(|m| (m.clone(), Vec::new())).collect();

        Self {
            methods: supported,
            routes,
            controllers: ControllerRegistry::new(),
            duplicate_policy: DuplicatePolicy::default(),
        }
    }

    /// Table using the configured method set and duplicate policy
    ///
    /// # Errors
    ///
    /// [`RouteError::UnsupportedMethod`] if a configured method is not a
    /// valid HTTP method token.
    pub fn from_config(config: &RouterConfig) -> Result<Self, RouteError> {
        let methods = config
            .methods
            .iter()
            .map(|m| parse_method(m))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::with_methods(methods).with_duplicate_policy(config.duplicate_policy))
    }

    #[must_use]
    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    #[must_use]
    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicate_policy
    }

    /// Use `controllers` to resolve `(controller, action)` references
    #[must_use]
    pub fn with_controllers(mut self, controllers: ControllerRegistry) -> Self {
        self.controllers = controllers;
        self
    }

    #[must_use]
    pub fn controllers(&self) -> &ControllerRegistry {
        &self.controllers
    }

    pub fn controllers_mut(&mut self) -> &mut ControllerRegistry {
        &mut self.controllers
    }

    /// Supported methods in the order they were configured
    #[must_use]
    pub fn supported_methods(&self) -> &[Method] {
        &self.methods
    }

    #[must_use]
    pub fn supports(&self, method: &Method) -> bool {
        self.routes.contains_key(method)
    }

    /// Routes for `method` in match-priority order
    #[must_use]
    pub fn routes(&self, method: &Method) -> Option<&[Route]> {
        self.routes.get(method).map(Vec::as_slice)
    }

    /// Total number of registered routes across all methods
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register `handler` for `pattern` under `method`.
    ///
    /// `handler` may be a function or closure taking `&Request` followed by
    /// [`crate::resolver::Dependency`] parameters, a `(controller, action)`
    /// pair, or a prepared [`HandlerRef`].
    ///
    /// # Errors
    ///
    /// - [`RouteError::UnsupportedMethod`] if `method` is not in the supported set
    /// - [`RouteError::InvalidPattern`] if `pattern` does not parse
    /// - [`RouteError::HandlerResolution`] for an unknown controller or action
    /// - [`RouteError::DuplicateRoute`] under [`DuplicatePolicy::Reject`]
    pub fn register<M, H>(
        &mut self,
        method: impl AsRef<str>,
        pattern: &str,
        handler: H,
    ) -> Result<&mut Self, RouteError>
    where
        H: IntoHandlerRef<M>,
    {
        let method = parse_method(method.as_ref())?;
        if !self.supports(&method) {
            warn!(
                method = %method,
                pattern = %pattern,
                supported = ?self.methods,
                "Route registration for unsupported method"
            );
            return Err(RouteError::UnsupportedMethod {
                method: method.to_string(),
            });
        }

        let pattern = PathPattern::parse(pattern)?;
        let handler = self.resolve_handler(handler.into_handler_ref())?;
        self.check_duplicate(&method, &pattern)?;
        self.insert(method, pattern, handler);
        Ok(self)
    }

    /// Register a `GET` route
    ///
    /// # Errors
    ///
    /// See [`RouteTable::register`].
    pub fn get<M, H>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouteError>
    where
        H: IntoHandlerRef<M>,
    {
        self.register(Method::GET, pattern, handler)
    }

    /// Register a `POST` route
    ///
    /// # Errors
    ///
    /// See [`RouteTable::register`].
    pub fn post<M, H>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouteError>
    where
        H: IntoHandlerRef<M>,
    {
        self.register(Method::POST, pattern, handler)
    }

    /// Register the same handler for every supported method.
    ///
    /// Either every method gets the route or none does.
    ///
    /// # Errors
    ///
    /// See [`RouteTable::register`].
    pub fn any<M, H>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouteError>
    where
        H: IntoHandlerRef<M>,
    {
        let pattern = PathPattern::parse(pattern)?;
        let handler = self.resolve_handler(handler.into_handler_ref())?;

        for method in &self.methods {
            self.check_duplicate(method, &pattern)?;
        }
        for method in self.methods.clone() {
            self.insert(method, pattern.clone(), handler.clone());
        }
        Ok(self)
    }

    /// Find the route for `method` and `path`.
    ///
    /// Routes are tried in registration order and the first match wins,
    /// even when a later pattern would also match.
    #[must_use]
    pub fn lookup(&self, method: &Method, path: &str) -> Lookup<'_> {
        let Some(routes) = self.routes.get(method) else {
            return Lookup::MethodNotAllowed;
        };

        let start = Instant::now();
        for (index, route) in routes.iter().enumerate() {
            debug!(
                method = %method,
                path = %path,
                index = index,
                pattern = %route.pattern,
                "Route match attempt"
            );
            if let Some(bindings) = route.pattern.matches(path) {
                debug!(
                    method = %method,
                    path = %path,
                    pattern = %route.pattern,
                    bindings = ?bindings,
                    duration_us = start.elapsed().as_micros(),
                    "Route matched"
                );
                return Lookup::Matched(route, bindings);
            }
        }

        Lookup::NotFound
    }

    /// First route for `method` matching `path`, with its bindings
    #[must_use]
    pub fn find(&self, method: &Method, path: &str) -> Option<(&Route, Bindings)> {
        match self.lookup(method, path) {
            Lookup::Matched(route, bindings) => Some((route, bindings)),
            Lookup::NotFound | Lookup::MethodNotAllowed => None,
        }
    }

    /// Every registered `(method, pattern)` in match order
    #[must_use]
    pub fn all_patterns(&self) -> Vec<(Method, String)> {
        self.methods
            .iter()
            .flat_map(|m| {
                self.routes
                    .get(m)
                    .into_iter()
                    .flatten()
                    .map(|r| (r.method.clone(), r.pattern.as_str().to_string()))
            })
            .collect()
    }

    /// Log every registered route
    ///
    /// Useful for verifying that startup registration produced the expected table.
    pub fn dump_routes(&self) {
        info!(
            routes_count = self.len(),
            methods = ?self.methods,
            duplicate_policy = ?self.duplicate_policy,
            "Route table"
        );
        for method in &self.methods {
            for (index, route) in self.routes.get(method).into_iter().flatten().enumerate() {
                info!(
                    method = %method,
                    index = index,
                    pattern = %route.pattern,
                    handler = %route.handler.name(),
                    "Route"
                );
            }
        }
    }

    fn resolve_handler(&self, handler: HandlerRef) -> Result<Handler, RouteError> {
        match handler {
            HandlerRef::Function(handler) => Ok(handler),
            HandlerRef::Method { controller, action } => self
                .controllers
                .resolve(&controller, &action)
                .map_err(|err| {
                    warn!(
                        controller = %controller,
                        action = %action,
                        error = %err,
                        "Handler reference did not resolve"
                    );
                    RouteError::from(err)
                }),
        }
    }

    fn check_duplicate(&self, method: &Method, pattern: &PathPattern) -> Result<(), RouteError> {
        let exists = self
            .routes
            .get(method)
            .is_some_and(|routes| routes.iter().any(|r| r.pattern.as_str() == pattern.as_str()));
        if !exists {
            return Ok(());
        }

        match self.duplicate_policy {
            DuplicatePolicy::Reject => Err(RouteError::DuplicateRoute {
                method: method.to_string(),
                pattern: pattern.as_str().to_string(),
            }),
            DuplicatePolicy::Shadow => {
                warn!(
                    method = %method,
                    pattern = %pattern,
                    "Duplicate route registered; it is shadowed by the earlier one"
                );
                Ok(())
            }
        }
    }

    fn insert(&mut self, method: Method, pattern: PathPattern, handler: Handler) {
        let routes = self.routes.entry(method.clone()).or_default();
        info!(
            method = %method,
            pattern = %pattern,
            handler = %handler.name(),
            dependencies = handler.dependencies().len(),
            priority = routes.len(),
            "Route registered"
        );
        routes.push(Route {
            method,
            pattern,
            handler,
        });
    }
}

/// Parse a method name, upper-casing it first.
pub(crate) fn parse_method(name: &str) -> Result<Method, RouteError> {
    Method::from_bytes(name.trim().to_ascii_uppercase().as_bytes()).map_err(|_| {
        RouteError::UnsupportedMethod {
            method: name.to_string(),
        }
    })
}
