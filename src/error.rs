use serde_json::Value;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A request was rejected before reaching the network.
    #[error("{0}")]
    InvalidParameter(String),

    /// The service answered with a status other than the one expected for the verb.
    /// Displays as the bare status line, e.g. `404 Not Found`.
    #[error("{status}")]
    Status {
        code: u16,
        status: String,
        body: Option<Value>,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("unexpected response payload: {0}")]
    UnexpectedPayload(String),

    /// Composite message assembled from a rejected response body.
    #[error("{0}")]
    InvalidResponse(String),

    #[error("{entity} is invalid: {} can't be blank", .missing.join(", "))]
    Invalid {
        entity: &'static str,
        missing: Vec<&'static str>,
    },

    #[error("{0}")]
    Rule(String),

    #[error("{0}")]
    NotFound(String),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Status { code: 404, .. } | Error::NotFound(_))
    }
}
