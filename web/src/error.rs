use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug)]
pub struct Error {
    pub error_kind: ErrorKind,
}

/// Request problems the web layer reports back to the caller.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    /// A required form field was missing or empty. Carries the message returned to the client.
    MissingParameter(&'static str),
    /// A form field was present but not acceptable.
    InvalidParameter(String),
}

impl Error {
    pub fn missing_parameter(message: &'static str) -> Self {
        Self {
            error_kind: ErrorKind::MissingParameter(message),
        }
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self {
            error_kind: ErrorKind::InvalidParameter(message.into()),
        }
    }
}

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        match &self.error_kind {
            ErrorKind::MissingParameter(message) => write!(fmt, "{message}"),
            ErrorKind::InvalidParameter(message) => write!(fmt, "{message}"),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self.error_kind {
            ErrorKind::MissingParameter(message) => {
                (StatusCode::BAD_REQUEST, message).into_response()
            }
            ErrorKind::InvalidParameter(message) => {
                (StatusCode::BAD_REQUEST, message).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_parameter_is_bad_request() {
        let response = Error::missing_parameter("Fragment parameter required").into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_invalid_parameter_is_bad_request() {
        let error = Error::invalid_parameter("Invalid fragment name: a b");

        assert_eq!(error.to_string(), "Invalid fragment name: a b");
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
