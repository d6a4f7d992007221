use std::any::Any;
use std::fmt;

use tracing::{debug, error};

use super::Handler;

/// A handler parameter type that can be built with no arguments.
///
/// The resolver constructs a fresh value for every declared parameter on
/// every dispatch. There are no registered bindings, scopes or caches.
///
/// Types implementing `Default` can use `#[derive(Dependency)]`.
pub trait Dependency: Sized + 'static {
    /// Build a fresh instance
    ///
    /// # Errors
    ///
    /// Returns [`DependencyError`] when the value cannot be produced; the
    /// dispatch then ends with a 500 response.
    fn construct() -> Result<Self, DependencyError>;
}

/// Failure reported by [`Dependency::construct`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyError {
    message: String,
}

impl DependencyError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for DependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for DependencyError {}

/// A declared handler parameter could not be provided at dispatch time.
///
/// Scoped to a single request: the dispatcher turns it into a 500 response
/// and the route table is unaffected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyConstructionError {
    /// `std::any::type_name` of the parameter type
    pub type_name: &'static str,
    /// Zero-based position in the handler's declared parameter list
    pub position: usize,
    /// Underlying cause
    pub source: DependencyError,
}

impl fmt::Display for DependencyConstructionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot construct handler parameter #{} ({}): {}",
            self.position, self.type_name, self.source
        )
    }
}

impl std::error::Error for DependencyConstructionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// A controller/action reference that names nothing registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerResolutionError {
    /// No controller is registered under this name
    UnknownController {
        /// The requested controller name
        controller: String,
    },
    /// The controller exists but has no such action
    UnknownAction {
        /// The controller name
        controller: String,
        /// The requested action name
        action: String,
    },
}

impl fmt::Display for HandlerResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerResolutionError::UnknownController { controller } => {
                write!(f, "no controller named '{controller}' is registered")
            }
            HandlerResolutionError::UnknownAction { controller, action } => {
                write!(f, "controller '{controller}' has no action '{action}'")
            }
        }
    }
}

impl std::error::Error for HandlerResolutionError {}

type Factory = fn() -> Result<Box<dyn Any>, DependencyError>;

fn construct_boxed<D: Dependency>() -> Result<Box<dyn Any>, DependencyError> {
    D::construct().map(|value| Box::new(value) as Box<dyn Any>)
}

/// One declared handler parameter: its type name and a zero-argument factory.
///
/// A handler's parameter list is computed once, when the handler value is
/// built, and never re-derived per request.
#[derive(Debug, Clone, Copy)]
pub struct DependencySpec {
    type_name: &'static str,
    factory: Factory,
}

impl DependencySpec {
    /// Describe parameter type `D`
    #[must_use]
    pub fn of<D: Dependency>() -> Self {
        Self {
            type_name: std::any::type_name::<D>(),
            factory: construct_boxed::<D>,
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn construct(&self) -> Result<Box<dyn Any>, DependencyError> {
        (self.factory)()
    }
}

/// Resolved argument values for one handler invocation, in declaration order.
///
/// Owned by a single dispatch and consumed by the handler call.
pub struct Arguments {
    values: std::vec::IntoIter<(&'static str, Box<dyn Any>)>,
    position: usize,
}

impl Arguments {
    fn new(values: Vec<(&'static str, Box<dyn Any>)>) -> Self {
        Self {
            values: values.into_iter(),
            position: 0,
        }
    }

    /// Number of values not yet taken
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.values.len()
    }

    /// Take the next value as `D`.
    pub(crate) fn take<D: 'static>(&mut self) -> Result<D, DependencyConstructionError> {
        let position = self.position;
        self.position += 1;

        let Some((type_name, value)) = self.values.next() else {
            return Err(DependencyConstructionError {
                type_name: std::any::type_name::<D>(),
                position,
                source: DependencyError::new("argument list exhausted"),
            });
        };

        value
            .downcast::<D>()
            .map(|boxed| *boxed)
            .map_err(|_| DependencyConstructionError {
                type_name,
                position,
                source: DependencyError::new(format!(
                    "resolved value is not a {}",
                    std::any::type_name::<D>()
                )),
            })
    }
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arguments")
            .field("remaining", &self.values.len())
            .field("position", &self.position)
            .finish()
    }
}

/// Builds handler argument lists by constructing each declared parameter.
#[derive(Debug, Clone, Copy, Default)]
pub struct HandlerResolver;

impl HandlerResolver {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Construct every declared parameter of `handler`, in order.
    ///
    /// Stops at the first failure; nothing is retried.
    ///
    /// # Errors
    ///
    /// Returns [`DependencyConstructionError`] naming the parameter that
    /// could not be built.
    pub fn resolve(&self, handler: &Handler) -> Result<Arguments, DependencyConstructionError> {
        let specs = handler.dependencies();
        let mut values = Vec::with_capacity(specs.len());

        for (position, spec) in specs.iter().enumerate() {
            match spec.construct() {
                Ok(value) => {
                    debug!(
                        handler = %handler.name(),
                        position = position,
                        dependency = spec.type_name(),
                        "Dependency constructed"
                    );
                    values.push((spec.type_name(), value));
                }
                Err(source) => {
                    error!(
                        handler = %handler.name(),
                        position = position,
                        dependency = spec.type_name(),
                        error = %source,
                        "Dependency construction failed"
                    );
                    return Err(DependencyConstructionError {
                        type_name: spec.type_name(),
                        position,
                        source,
                    });
                }
            }
        }

        Ok(Arguments::new(values))
    }
}
