use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;

use super::{Arguments, Dependency, DependencyConstructionError, DependencySpec};
use crate::server::Request;

type InvokeFn = dyn Fn(&Request, Arguments) -> Result<String, DependencyConstructionError>
    + Send
    + Sync;

/// What a [`Handler`] was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerKind {
    /// A free function or closure
    Function,
    /// An action registered on a controller
    Method {
        /// Controller name in the registry
        controller: Arc<str>,
        /// Action name on that controller
        action: Arc<str>,
    },
}

/// Type-erased route handler.
///
/// Carries its declared parameter list as data next to the call itself, so
/// dispatch never inspects types. Cheap to clone.
#[derive(Clone)]
pub struct Handler {
    kind: HandlerKind,
    dependencies: Arc<[DependencySpec]>,
    invoke: Arc<InvokeFn>,
}

impl Handler {
    fn new<F>(kind: HandlerKind, dependencies: Vec<DependencySpec>, invoke: F) -> Self
    where
        F: Fn(&Request, Arguments) -> Result<String, DependencyConstructionError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            kind,
            dependencies: dependencies.into(),
            invoke: Arc::new(invoke),
        }
    }

    /// Build a handler from a function or closure
    pub fn from_fn<A, F: IntoHandler<A>>(f: F) -> Self {
        f.into_handler()
    }

    #[must_use]
    pub fn kind(&self) -> &HandlerKind {
        &self.kind
    }

    /// Declared parameter list, in call order
    #[must_use]
    pub fn dependencies(&self) -> &[DependencySpec] {
        &self.dependencies
    }

    /// Display name for logs: `Controller@action` or `fn`
    #[must_use]
    pub fn name(&self) -> Cow<'static, str> {
        match &self.kind {
            HandlerKind::Function => Cow::Borrowed("fn"),
            HandlerKind::Method { controller, action } => {
                Cow::Owned(format!("{controller}@{action}"))
            }
        }
    }

    /// Invoke with arguments produced by [`super::HandlerResolver::resolve`]
    ///
    /// # Errors
    ///
    /// Fails only if `args` does not line up with the declared parameters.
    pub fn call(&self, req: &Request, args: Arguments) -> Result<String, DependencyConstructionError> {
        (self.invoke)(req, args)
    }

    pub(crate) fn into_method(mut self, controller: Arc<str>, action: Arc<str>) -> Self {
        self.kind = HandlerKind::Method { controller, action };
        self
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("kind", &self.kind)
            .field(
                "dependencies",
                &self
                    .dependencies
                    .iter()
                    .map(DependencySpec::type_name)
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Handler return values that become a response body.
pub trait IntoBody {
    fn into_body(self) -> String;
}

impl IntoBody for String {
    fn into_body(self) -> String {
        self
    }
}

impl IntoBody for &'static str {
    fn into_body(self) -> String {
        self.to_string()
    }
}

impl IntoBody for Cow<'static, str> {
    fn into_body(self) -> String {
        self.into_owned()
    }
}

impl IntoBody for Value {
    fn into_body(self) -> String {
        self.to_string()
    }
}

/// Functions usable as route handlers.
///
/// Implemented for `Fn(&Request, D1, ..., Dn) -> R` with up to eight
/// parameters where every `Di: Dependency` and `R: IntoBody`. `Args` is the
/// tuple of parameter types and only serves to keep the impls apart.
pub trait IntoHandler<Args>: Send + Sync + 'static {
    fn into_handler(self) -> Handler;
}

/// Functions usable as controller actions.
///
/// Implemented for `Fn(&C, &Request, D1, ..., Dn) -> R`. The controller `C`
/// is itself constructed per dispatch and is the first declared parameter.
pub trait IntoAction<C, Args>: Send + Sync + 'static {
    fn into_action(self) -> Handler;
}

macro_rules! impl_handler_arity {
    ($($dep:ident),*) => {
        #[allow(non_snake_case, unused_mut, unused_variables)]
        impl<F, R, $($dep,)*> IntoHandler<($($dep,)*)> for F
        where
            F: Fn(&Request, $($dep,)*) -> R + Send + Sync + 'static,
            R: IntoBody,
            $($dep: Dependency,)*
        {
            fn into_handler(self) -> Handler {
                Handler::new(
                    HandlerKind::Function,
                    vec![$(DependencySpec::of::<$dep>(),)*],
                    move |req: &Request, mut args: Arguments| {
                        $(let $dep = args.take::<$dep>()?;)*
                        Ok((self)(req, $($dep,)*).into_body())
                    },
                )
            }
        }

        #[allow(non_snake_case, unused_mut, unused_variables)]
        impl<F, R, C, $($dep,)*> IntoAction<C, ($($dep,)*)> for F
        where
            F: Fn(&C, &Request, $($dep,)*) -> R + Send + Sync + 'static,
            R: IntoBody,
            C: Dependency,
            $($dep: Dependency,)*
        {
            fn into_action(self) -> Handler {
                Handler::new(
                    HandlerKind::Function,
                    vec![DependencySpec::of::<C>(), $(DependencySpec::of::<$dep>(),)*],
                    move |req: &Request, mut args: Arguments| {
                        let controller = args.take::<C>()?;
                        $(let $dep = args.take::<$dep>()?;)*
                        Ok((self)(&controller, req, $($dep,)*).into_body())
                    },
                )
            }
        }
    };
}

impl_handler_arity!();
impl_handler_arity!(D1);
impl_handler_arity!(D1, D2);
impl_handler_arity!(D1, D2, D3);
impl_handler_arity!(D1, D2, D3, D4);
impl_handler_arity!(D1, D2, D3, D4, D5);
impl_handler_arity!(D1, D2, D3, D4, D5, D6);
impl_handler_arity!(D1, D2, D3, D4, D5, D6, D7);
impl_handler_arity!(D1, D2, D3, D4, D5, D6, D7, D8);

/// What a route points at, before registration validates it.
#[derive(Debug, Clone)]
pub enum HandlerRef {
    /// A ready-to-call handler
    Function(Handler),
    /// A controller action looked up in the table's controller registry
    Method {
        /// Controller name
        controller: String,
        /// Action name
        action: String,
    },
}

impl HandlerRef {
    /// Reference a function or closure
    pub fn function<A, F: IntoHandler<A>>(f: F) -> Self {
        HandlerRef::Function(f.into_handler())
    }

    /// Reference `controller`'s `action`
    pub fn method(controller: impl Into<String>, action: impl Into<String>) -> Self {
        HandlerRef::Method {
            controller: controller.into(),
            action: action.into(),
        }
    }
}

impl From<Handler> for HandlerRef {
    fn from(handler: Handler) -> Self {
        HandlerRef::Function(handler)
    }
}

/// Everything the registration functions accept as a handler.
///
/// `M` is a marker that keeps the impls for functions, `(controller, action)`
/// pairs and prepared references from overlapping.
pub trait IntoHandlerRef<M> {
    fn into_handler_ref(self) -> HandlerRef;
}

/// Marker for plain functions and closures
pub struct FunctionMarker<A>(PhantomData<fn() -> A>);

/// Marker for `(controller, action)` pairs
pub struct MethodMarker;

impl<F, A> IntoHandlerRef<FunctionMarker<A>> for F
where
    F: IntoHandler<A>,
{
    fn into_handler_ref(self) -> HandlerRef {
        HandlerRef::Function(self.into_handler())
    }
}

impl IntoHandlerRef<MethodMarker> for (&str, &str) {
    fn into_handler_ref(self) -> HandlerRef {
        HandlerRef::method(self.0, self.1)
    }
}

impl IntoHandlerRef<HandlerRef> for HandlerRef {
    fn into_handler_ref(self) -> HandlerRef {
        self
    }
}

impl IntoHandlerRef<Handler> for Handler {
    fn into_handler_ref(self) -> HandlerRef {
        HandlerRef::Function(self)
    }
}
