use thiserror::Error;

/// Errors produced by the chat pipeline.
///
/// `BackendUnavailable` and `BackendError` never reach a caller of
/// `sendMessage`; the service turns them into a fallback reply.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// Malformed input (empty text, negative page size, bad argument shape).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No chat with the requested id.
    #[error("Chat not found: {0}")]
    NotFound(String),

    /// Generation backend unreachable or timed out.
    #[error("Generation backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Generation backend answered with an error status or a bad payload.
    #[error("Generation backend error: {0}")]
    BackendError(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ChatError {
    /// Stable code reported in the `extensions.code` field of protocol errors.
    pub fn code(&self) -> &'static str {
        match self {
            ChatError::InvalidArgument(_) => "BAD_USER_INPUT",
            ChatError::NotFound(_) => "NOT_FOUND",
            ChatError::BackendUnavailable(_) => "BACKEND_UNAVAILABLE",
            ChatError::BackendError(_) => "BACKEND_ERROR",
            ChatError::Config(_) | ChatError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn is_backend_failure(&self) -> bool {
        matches!(self, ChatError::BackendUnavailable(_) | ChatError::BackendError(_))
    }
}
