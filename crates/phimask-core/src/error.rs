use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("malformed token: {0}")]
    MalformedToken(String),
}

/// Failure of an external PHI detection backend.
///
/// Any of these for any chunk is fatal to the whole masking operation.
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("detection service unavailable: {0}")]
    Unavailable(String),

    #[error("detection request throttled: {0}")]
    Throttled(String),

    #[error("detection credentials rejected: {0}")]
    InvalidCredentials(String),

    #[error("text of {chars} characters exceeds detector limit of {limit}")]
    InputTooLong { chars: usize, limit: usize },

    #[error("malformed detection response: {0}")]
    MalformedResponse(String),
}
