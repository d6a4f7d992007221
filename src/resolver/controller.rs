use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{info, warn};

use super::{Dependency, Handler, HandlerResolutionError, IntoAction};

/// A registered controller and its named actions.
#[derive(Debug, Clone)]
pub struct ControllerEntry {
    name: Arc<str>,
    type_name: &'static str,
    actions: HashMap<String, Handler>,
}

impl ControllerEntry {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rust type backing this controller
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Registered action names, sorted
    #[must_use]
    pub fn actions(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn action(&self, name: &str) -> Option<&Handler> {
        self.actions.get(name)
    }
}

/// Registry of controllers that `(controller, action)` route references are
/// checked against.
///
/// Populated during startup alongside the route table. A reference that
/// does not resolve here is rejected when the route is registered, not when
/// it is first requested.
#[derive(Debug, Clone, Default)]
pub struct ControllerRegistry {
    controllers: HashMap<String, ControllerEntry>,
}

impl ControllerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register controller type `C` under `name` and start adding actions.
    ///
    /// Registering a name twice replaces the earlier controller and all of
    /// its actions.
    ///
    /// ```rust,ignore
    /// registry
    ///     .register::<UserController>("UserController")
    ///     .action("show", UserController::show)
    ///     .action("index", UserController::index);
    /// ```
    pub fn register<C: Dependency>(&mut self, name: &str) -> ControllerBuilder<'_, C> {
        let fresh = ControllerEntry {
            name: Arc::from(name),
            type_name: std::any::type_name::<C>(),
            actions: HashMap::new(),
        };

        let entry = match self.controllers.entry(name.to_string()) {
            Entry::Occupied(mut occupied) => {
                warn!(controller = %name, "Replaced existing controller");
                occupied.insert(fresh);
                occupied.into_mut()
            }
            Entry::Vacant(vacant) => {
                info!(
                    controller = %name,
                    type_name = fresh.type_name,
                    "Controller registered"
                );
                vacant.insert(fresh)
            }
        };

        ControllerBuilder {
            entry,
            _controller: PhantomData,
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ControllerEntry> {
        self.controllers.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.controllers.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    /// Look up the handler for `controller`'s `action`.
    ///
    /// # Errors
    ///
    /// [`HandlerResolutionError::UnknownController`] or
    /// [`HandlerResolutionError::UnknownAction`].
    pub fn resolve(&self, controller: &str, action: &str) -> Result<Handler, HandlerResolutionError> {
        let entry = self
            .controllers
            .get(controller)
            .ok_or_else(|| HandlerResolutionError::UnknownController {
                controller: controller.to_string(),
            })?;

        entry
            .actions
            .get(action)
            .cloned()
            .ok_or_else(|| HandlerResolutionError::UnknownAction {
                controller: controller.to_string(),
                action: action.to_string(),
            })
    }
}

/// Adds actions to a freshly registered controller of type `C`.
pub struct ControllerBuilder<'a, C> {
    entry: &'a mut ControllerEntry,
    _controller: PhantomData<fn() -> C>,
}

impl<C: Dependency> ControllerBuilder<'_, C> {
    /// Register `f` as the action `name`
    pub fn action<A, F>(self, name: &str, f: F) -> Self
    where
        F: IntoAction<C, A>,
    {
        let handler = f
            .into_action()
            .into_method(Arc::clone(&self.entry.name), Arc::from(name));

        if self.entry.actions.insert(name.to_string(), handler).is_some() {
            warn!(
                controller = %self.entry.name,
                action = %name,
                "Replaced existing controller action"
            );
        }

        self
    }
}
