use std::fmt;

use crate::resolver::HandlerResolutionError;

/// Registration-time routing error
///
/// Returned by the `RouteTable` registration functions. Every variant is
/// fatal to startup: a host should refuse to serve with a partially built
/// table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// The method is not in the table's supported set
    UnsupportedMethod {
        /// The rejected method name
        method: String,
    },
    /// The route template could not be parsed
    InvalidPattern {
        /// The offending template
        pattern: String,
        /// Why it was rejected
        reason: String,
    },
    /// A controller/action reference does not name a registered target
    HandlerResolution(HandlerResolutionError),
    /// The pattern is already registered for this method and the table
    /// rejects duplicates
    DuplicateRoute {
        /// Method of the existing route
        method: String,
        /// The duplicated template
        pattern: String,
    },
}

impl RouteError {
    pub(crate) fn invalid_pattern(pattern: &str, reason: impl Into<String>) -> Self {
        RouteError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::UnsupportedMethod { method } => {
                write!(f, "unsupported HTTP method '{method}' for route registration")
            }
            RouteError::InvalidPattern { pattern, reason } => {
                write!(f, "invalid route pattern '{pattern}': {reason}")
            }
            RouteError::HandlerResolution(err) => write!(f, "handler resolution failed: {err}"),
            RouteError::DuplicateRoute { method, pattern } => {
                write!(f, "route {method} {pattern} is already registered")
            }
        }
    }
}

impl std::error::Error for RouteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RouteError::HandlerResolution(err) => Some(err),
            _ => None,
        }
    }
}

impl From<HandlerResolutionError> for RouteError {
    fn from(err: HandlerResolutionError) -> Self {
        RouteError::HandlerResolution(err)
    }
}
