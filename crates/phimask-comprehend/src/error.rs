use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComprehendError {
    #[error("AWS config error: {0}")]
    Config(String),
}
