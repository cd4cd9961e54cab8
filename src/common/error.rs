//! Error types for the NVDA system-test controller
//!
//! Messages are what the test runner shows when a test errors, so they carry
//! the paths, keyword names and remote diagnostics needed to act on them.

use std::io;
use std::path::Path;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the session controller
#[derive(Error, Debug)]
pub enum Error {
    // === Filesystem Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to copy '{from}' to '{to}': {error}")]
    FileCopy {
        from: String,
        to: String,
        error: String,
    },

    #[error("Failed to remove '{path}': {error}")]
    FileRemove { path: String, error: String },

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Process Errors ===
    #[error("Failed to start process: {0}")]
    ProcessSpawn(String),

    #[error("NVDA process is not running (exited with code {exit_code:?})")]
    ProcessNotRunning { exit_code: Option<i32> },

    #[error("No NVDA process has been launched in this session")]
    NoApplicationProcess,

    // === Spy / Remote Errors ===
    #[error("{message} (gave up after {secs} seconds)")]
    SpyUnreachable { message: String, secs: u64 },

    #[error("nvdaSpy is not reachable at {uri}")]
    SpyNotReachable { uri: String },

    #[error("Not connected to nvdaSpy. Start a session first")]
    SpyNotConnected,

    #[error("Remote call '{method}' exceeded {secs} seconds, connection closed")]
    RemoteTimeout { method: String, secs: u64 },

    #[error("Connection to remote server broken: {0}")]
    RemoteTransport(String),

    #[error("Remote protocol error: {0}")]
    RemoteProtocol(String),

    #[error("Remote fault {code}: {message}")]
    RemoteFault { code: i64, message: String },

    #[error("nvdaSpy keyword '{keyword}' failed: {message}")]
    KeywordFailed { keyword: String, message: String },

    // === Shutdown Errors ===
    #[error("Quitting NVDA failed: {}", join_errors(.0))]
    Shutdown(Vec<Error>),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === Test Errors ===
    #[error("Test assertion failed: {0}")]
    TestAssertion(String),
}

impl Error {
    /// Create a file copy error
    pub fn file_copy(from: &Path, to: &Path, error: io::Error) -> Self {
        Self::FileCopy {
            from: from.display().to_string(),
            to: to.display().to_string(),
            error: error.to_string(),
        }
    }

    /// Create a file removal error
    pub fn file_remove(path: &Path, error: io::Error) -> Self {
        Self::FileRemove {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }

    /// Create a keyword failure error
    pub fn keyword_failed(keyword: &str, message: &str) -> Self {
        Self::KeywordFailed {
            keyword: keyword.to_string(),
            message: message.to_string(),
        }
    }

    /// Combine the errors collected while quitting.
    ///
    /// A single error is returned as-is.
    pub fn shutdown(mut errors: Vec<Error>) -> Self {
        if errors.len() == 1 {
            errors.remove(0)
        } else {
            Self::Shutdown(errors)
        }
    }
}

fn join_errors(errors: &[Error]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutdown_single_error_is_unwrapped() {
        let err = Error::shutdown(vec![Error::NoApplicationProcess]);
        assert!(matches!(err, Error::NoApplicationProcess));
    }

    #[test]
    fn test_shutdown_joins_messages() {
        let err = Error::shutdown(vec![
            Error::FileRemove {
                path: "nvda.ini".to_string(),
                error: "denied".to_string(),
            },
            Error::ProcessSpawn("no shell".to_string()),
        ]);
        let msg = err.to_string();
        assert!(msg.starts_with("Quitting NVDA failed: "));
        assert!(msg.contains("Failed to remove 'nvda.ini': denied"));
        assert!(msg.contains("; Failed to start process: no shell"));
    }

    #[test]
    fn test_single_failed_reachability_check_has_no_deadline() {
        let err = Error::SpyNotReachable {
            uri: "http://127.0.0.1:8270".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "nvdaSpy is not reachable at http://127.0.0.1:8270"
        );
    }
}
