//! Error types for the `sse` crate.
use std::error::Error as StdError;
use std::fmt;

/// Errors surfaced by a connection writer.
///
/// Producers never see these: a publish is fire-and-forget, and a failing
/// connection only tears itself down.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    /// The transport rejected a write or flush. The connection has been torn down.
    TransportWrite,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (&self.error_kind, &self.source) {
            (ErrorKind::TransportWrite, Some(source)) => {
                write!(f, "SSE transport write failed: {source}")
            }
            (ErrorKind::TransportWrite, None) => write!(f, "SSE transport write failed"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: ErrorKind::TransportWrite,
        }
    }
}
