use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PayloadError>;

#[derive(Debug, Error)]
pub enum PayloadError {
    /// Header value is not standard base64.
    #[error("header value is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Decoded header bytes are not UTF-8.
    #[error("header value is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    /// Decoded header text is not a JSON object.
    #[error("header payload is not a JSON object: {0}")]
    MalformedPayload(String),

    #[error("request body could not be serialized: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Build root or build file is missing, or resolves outside the context.
    #[error("build context not found: {}", .0.display())]
    ContextNotFound(PathBuf),

    #[error("failed to archive '{}': {source}", path.display())]
    ArchiveIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid filter '{0}', expected 'name=value'")]
    InvalidFilter(String),

    #[error("invalid CIDR '{0}'")]
    InvalidCidr(String),

    #[error("malformed stream frame: {0}")]
    MalformedFrame(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PayloadError {
    pub(crate) fn archive_io(path: impl Into<PathBuf>, source: std::io::Error) -> PayloadError {
        PayloadError::ArchiveIo {
            path: path.into(),
            source,
        }
    }
}
