use neocare_common::ValidationReport;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NeoCareError {
    #[error("could not reach the service: {0}")]
    Transport(String),

    #[error("service returned {status}: {message}")]
    Service { status: u16, message: String },

    #[error("session expired; run `neocare login` again")]
    SessionExpired,

    #[error("request is not valid: {0}")]
    Validation(ValidationReport),

    #[error("message cannot be empty")]
    EmptyMessage,

    #[error("delivery location is missing; confirm to send the request without it")]
    ConfirmationRequired,

    #[error("request was already submitted")]
    AlreadySubmitted,

    #[error("no line item with id {0}")]
    UnknownLineItem(u32),

    #[error("config error: {0}")]
    Config(String),

    #[error("nothing saved under {0}; run the previous step first")]
    MissingSession(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("folder not found: {0}")]
    FolderNotFound(String),

    #[error("no images found: {0}")]
    NoImagesFound(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Common(#[from] neocare_common::Error),
}

/// Coarse failure taxonomy used by callers to decide what to show or retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Service,
    Logical,
    Validation,
    Auth,
    Local,
}

impl NeoCareError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NeoCareError::Transport(_) => ErrorKind::Transport,
            NeoCareError::Service { .. } => ErrorKind::Service,
            NeoCareError::SessionExpired => ErrorKind::Auth,
            NeoCareError::Validation(_) | NeoCareError::ConfirmationRequired | NeoCareError::EmptyMessage => {
                ErrorKind::Validation
            }
            NeoCareError::AlreadySubmitted
            | NeoCareError::UnknownLineItem(_)
            | NeoCareError::MissingSession(_) => ErrorKind::Logical,
            NeoCareError::Config(_)
            | NeoCareError::FileNotFound(_)
            | NeoCareError::FolderNotFound(_)
            | NeoCareError::NoImagesFound(_)
            | NeoCareError::Storage(_)
            | NeoCareError::Io(_)
            | NeoCareError::Json(_)
            | NeoCareError::Common(_) => ErrorKind::Local,
        }
    }

    /// Only transport and service failures are worth resending unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Transport | ErrorKind::Service)
    }
}

pub type Result<T> = std::result::Result<T, NeoCareError>;
