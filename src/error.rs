use crate::sink::SinkError;

/// Top-level error of the ingestion process.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid endpoint URL: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    #[error("failed to install signal handlers: {0}")]
    Signal(std::io::Error),
    #[error(transparent)]
    Sink(#[from] SinkError),
}

pub type Result<T> = std::result::Result<T, Error>;
