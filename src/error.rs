//! Error types for the media server.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// ServerError
// ============================================================================

/// Startup and lifecycle errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The web export folder could not be located. Fatal at construction.
    #[error("couldn't find web folder (searched `{0}`)")]
    ExportFolderMissing(PathBuf),

    #[error("failed to bind 127.0.0.1:{port}: {message}")]
    Bind { port: u16, message: String },

    #[error("failed to spawn server thread")]
    Spawn(#[source] io::Error),

    /// The background thread could not bind; carries the logged reason.
    #[error("server failed to start: {0}")]
    StartupFailed(String),

    #[error("server was already started")]
    AlreadyStarted,

    #[error("server stopped before it was bound")]
    Stopped,
}

// ============================================================================
// BackendError
// ============================================================================

/// Failures reported by the host backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The search expression could not be parsed.
    #[error("invalid search: {0}")]
    InvalidSearch(String),

    /// No collection is open, so there is nothing to compute over.
    #[error("no collection is open")]
    NoCollection,

    #[error("{0}")]
    Other(String),
}

// ============================================================================
// TransferError
// ============================================================================

/// Writing a response to the client failed part-way, usually because the
/// browser view navigated away before the body was sent.
#[derive(Debug, Error)]
#[error("transfer to client failed")]
pub struct TransferError(#[from] pub io::Error);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_messages() {
        let err = ServerError::ExportFolderMissing(PathBuf::from("/data/web"));
        assert_eq!(err.to_string(), "couldn't find web folder (searched `/data/web`)");

        let err = ServerError::Bind {
            port: 8080,
            message: "address in use".into(),
        };
        assert_eq!(err.to_string(), "failed to bind 127.0.0.1:8080: address in use");
    }

    #[test]
    fn test_transfer_error_keeps_source() {
        use std::error::Error as _;

        let err = TransferError::from(io::Error::new(io::ErrorKind::BrokenPipe, "gone"));
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("gone"));
    }
}
