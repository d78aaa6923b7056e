use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Validation(#[from] sentiscan_core::ValidationError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error("digest delivery failed: {0}")]
    Delivery(sentiscan_core::SourceError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Usage(_) => 1,
            Self::Validation(_) => 2,
            Self::Serialization(_) => 4,
            Self::Delivery(_) => 6,
            Self::Io(_) => 10,
        }
    }
}
