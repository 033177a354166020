use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// The session has no analysis to anchor a follow-up on.
    #[error("Session has no prior analysis: {0}")]
    InvalidSession(String),

    #[error("Session store error: {0}")]
    SessionStore(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
