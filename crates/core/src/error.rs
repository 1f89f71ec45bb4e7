#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("Permission denied: radio capability is not available")]
    PermissionDenied,

    #[error("Invalid device identifier: {0}")]
    InvalidDevice(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}
