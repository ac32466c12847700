use thiserror::Error;

/// Error taxonomy for the core. Platform adapters surface native failures
/// through the `Platform*` variants; dispatcher input problems use the last
/// three. Action handlers never bubble these to the caller directly — the
/// dispatcher folds them into an `ActionResult` record.
#[derive(Error, Debug)]
pub enum CupError {
    #[error("Unsupported platform: {0}")]
    PlatformUnsupported(String),

    #[error("Permission denied by the operating system: {0}")]
    PlatformPermission(String),

    #[error("Required native helper unavailable: {0}")]
    PlatformUnavailable(String),

    #[error("Platform call timed out: {0}")]
    PlatformTimeout(String),

    #[error("Platform call failed: {0}")]
    PlatformFailure(String),

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Element not found: {0}")]
    UnknownElement(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Stale snapshot: {0}")]
    StaleSnapshot(String),
}

pub type Result<T> = std::result::Result<T, CupError>;
