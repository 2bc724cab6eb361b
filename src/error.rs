//! Error types for the keyboard interceptor.

use thiserror::Error;

/// Result type alias for keyintercept operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while capturing keyboard input.
#[derive(Debug, Error)]
pub enum Error {
    /// Capture is already active for this interceptor.
    #[error("keyboard capture is already running")]
    AlreadyRunning,

    /// Capture is not active.
    #[error("keyboard capture is not running")]
    NotRunning,

    /// The OS refused to install the low-level keyboard hook.
    #[error("could not install keyboard hook (os error {code}): {message}")]
    HookInstallFailed {
        /// Underlying OS error code.
        code: i32,
        /// OS supplied description.
        message: String,
    },

    /// Failed to remove the hook.
    #[error("failed to uninstall keyboard hook: {0}")]
    HookUninstallFailed(String),

    /// The full keyboard state could not be queried.
    #[error("keyboard state unavailable: {0}")]
    KeyboardStateUnavailable(String),

    /// Thread-related error.
    #[error("thread error: {0}")]
    ThreadError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_failure_carries_os_code() {
        let err = Error::HookInstallFailed {
            code: 5,
            message: "Access is denied.".into(),
        };
        assert_eq!(
            err.to_string(),
            "could not install keyboard hook (os error 5): Access is denied."
        );
    }
}
