use http::StatusCode;
use std::fmt;

use crate::ids::DispatchId;

/// How a dispatch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A route matched and its handler produced the body
    Done,
    /// No route matched the path for a supported method
    NotFound,
    /// The request method has no route table
    MethodNotAllowed,
    /// A handler dependency could not be constructed
    Failed,
}

impl Outcome {
    #[must_use]
    pub fn status(self) -> StatusCode {
        match self {
            Outcome::Done => StatusCode::OK,
            Outcome::NotFound => StatusCode::NOT_FOUND,
            Outcome::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Outcome::Failed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Status and body produced by one dispatch.
///
/// No headers: content negotiation belongs to the transport that writes
/// the response out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    outcome: Outcome,
    body: String,
    dispatch_id: Option<DispatchId>,
}

impl Response {
    #[must_use]
    pub fn new(outcome: Outcome, body: String) -> Self {
        Self {
            outcome,
            body,
            dispatch_id: None,
        }
    }

    #[must_use]
    pub fn with_dispatch_id(mut self, id: DispatchId) -> Self {
        self.dispatch_id = Some(id);
        self
    }

    /// Id of the dispatch that produced this response; hosts echo it as
    /// `x-request-id`
    #[must_use]
    pub fn dispatch_id(&self) -> Option<DispatchId> {
        self.dispatch_id
    }

    /// 200 with the handler's body
    #[must_use]
    pub fn ok(body: String) -> Self {
        Self::new(Outcome::Done, body)
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.outcome.status()
    }

    #[must_use]
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub fn into_body(self) -> String {
        self.body
    }
}

/// `"<code> <reason>"`, e.g. `404 Not Found`
pub(crate) fn status_line(status: StatusCode) -> String {
    format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown")
    )
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n\n{}", status_line(self.status()), self.body)
    }
}
