use alloc::borrow::Cow;
use alloc::string::String;

use thiserror::Error;
use vc_convert::error::{ConvertError, ValueParseError};

/// Errors of [`Agent`](crate::Agent) requests.
///
/// Every variant maps to a response status, see [`status`](Self::status).
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AgentError {
    /// No root is registered under the requested name.
    #[error("no object registered as `{0}`")]
    UnknownObject(String),
    /// The request itself is malformed.
    #[error("bad request: {0}")]
    BadRequest(Cow<'static, str>),
    #[error(transparent)]
    Convert(#[from] ConvertError),
}

impl From<ValueParseError> for AgentError {
    #[inline]
    fn from(err: ValueParseError) -> Self {
        AgentError::BadRequest(Cow::Owned(alloc::format!("{err}")))
    }
}

impl AgentError {
    /// The HTTP-like status code of the error response.
    pub fn status(&self) -> u16 {
        match self {
            AgentError::UnknownObject(_) => 404,
            AgentError::BadRequest(_) => 400,
            AgentError::Convert(err) => match err {
                ConvertError::PathNotFound { .. } | ConvertError::AttributeNotFound { .. } => 404,
                ConvertError::NotWritable { .. } => 403,
                ConvertError::InvalidPath(_)
                | ConvertError::TypeMismatch { .. }
                | ConvertError::IndexOutOfRange { .. }
                | ConvertError::Conversion(_) => 400,
                _ => 500,
            },
        }
    }

    /// The `error_type` member of the error response.
    pub fn kind_name(&self) -> &'static str {
        match self {
            AgentError::UnknownObject(_) => "UnknownObject",
            AgentError::BadRequest(_) => "BadRequest",
            AgentError::Convert(err) => err.kind_name(),
        }
    }
}
