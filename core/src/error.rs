use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriveFmtError {
    #[error("Volume enumeration failed: {0}")]
    Enumeration(String),

    #[error("Platform not supported: {0}")]
    PlatformNotSupported(String),

    #[error("Failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed while waiting for the format process: {0}")]
    Wait(#[source] std::io::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl DriveFmtError {
    /// Name of the component the error originated in, shown in the
    /// top-level diagnostic.
    pub fn component(&self) -> &'static str {
        match self {
            DriveFmtError::Enumeration(_) | DriveFmtError::PlatformNotSupported(_) => {
                "volume enumerator"
            }
            DriveFmtError::Spawn { .. } | DriveFmtError::Wait(_) => "format invoker",
            DriveFmtError::IoError(_) | DriveFmtError::Other(_) => "command dispatcher",
        }
    }
}
