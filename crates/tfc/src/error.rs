//! Error model for the request pipeline

use std::fmt;

use thiserror::Error;

use crate::codec::ApiError;

/// Errors raised by the API client.
///
/// Every failure in the pipeline collapses into one of four kinds; callers
/// that need to branch can use [`ClientError::kind`] instead of matching on
/// the variants directly.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// A request precondition failed before any network call was made
    #[error("validation error: {0}")]
    Validation(String),
    /// The response body could not be parsed into a JSON:API envelope
    #[error("invalid JSON response: {message}")]
    InvalidResponse {
        /// HTTP status of the response, when one was received
        status: Option<u16>,
        /// Parser diagnostic
        message: String,
    },
    /// The API answered with a 4xx or 5xx status
    #[error("{message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Human-readable message composed from the error entries
        message: String,
        /// Structured error entries from the response body
        errors: Vec<ApiError>,
    },
    /// The request never produced an HTTP status (connect, DNS, TLS, timeout)
    #[error("request failed: {0}")]
    Transport(String),
}

/// Discriminator for [`ClientError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`ClientError::Validation`]
    Validation,
    /// See [`ClientError::InvalidResponse`]
    InvalidResponse,
    /// See [`ClientError::Api`]
    Api,
    /// See [`ClientError::Transport`]
    Transport,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::InvalidResponse => "invalid_response",
            ErrorKind::Api => "api",
            ErrorKind::Transport => "transport",
        };
        f.write_str(name)
    }
}

impl ClientError {
    /// Build a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ClientError::Validation(message.into())
    }

    /// Build an API error from a status and the parsed error entries.
    ///
    /// The message lists every entry that carries both a title and a detail;
    /// entries missing either are kept in `errors` but left out of the text.
    pub fn api(status: u16, errors: Vec<ApiError>) -> Self {
        let mut message = format!("API request failed with status {}", status);
        let details = errors
            .iter()
            .filter_map(|err| match (&err.title, &err.detail) {
                (Some(title), Some(detail)) => Some(format!("{}: {}", title, detail)),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("; ");
        if !details.is_empty() {
            message.push_str(": ");
            message.push_str(&details);
        }
        ClientError::Api {
            status,
            message,
            errors,
        }
    }

    /// The kind of failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Validation(_) => ErrorKind::Validation,
            ClientError::InvalidResponse { .. } => ErrorKind::InvalidResponse,
            ClientError::Api { .. } => ErrorKind::Api,
            ClientError::Transport(_) => ErrorKind::Transport,
        }
    }

    /// HTTP status associated with the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::InvalidResponse { status, .. } => *status,
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Validation(_) | ClientError::Transport(_) => None,
        }
    }

    /// Structured error entries returned by the API (empty for other kinds).
    pub fn errors(&self) -> &[ApiError] {
        match self {
            ClientError::Api { errors, .. } => errors,
            _ => &[],
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: Option<&str>, detail: Option<&str>) -> ApiError {
        ApiError {
            title: title.map(String::from),
            detail: detail.map(String::from),
            ..ApiError::default()
        }
    }

    #[test]
    fn test_api_message_joins_complete_entries() {
        let err = ClientError::api(
            422,
            vec![
                entry(Some("Invalid"), Some("name is taken")),
                entry(Some("Only title"), None),
                entry(Some("Invalid"), Some("bad mode")),
            ],
        );

        assert_eq!(
            err.to_string(),
            "API request failed with status 422: Invalid: name is taken; Invalid: bad mode"
        );
        assert_eq!(err.errors().len(), 3);
        assert_eq!(err.status(), Some(422));
        assert_eq!(err.kind(), ErrorKind::Api);
    }

    #[test]
    fn test_api_message_without_entries() {
        let err = ClientError::api(500, Vec::new());
        assert_eq!(err.to_string(), "API request failed with status 500");
    }

    #[test]
    fn test_kinds_and_status() {
        let err = ClientError::validation("nope");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.status(), None);

        let err = ClientError::InvalidResponse {
            status: Some(200),
            message: "expected value".into(),
        };
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);
        assert_eq!(err.status(), Some(200));

        let err = ClientError::Transport("connection refused".into());
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.errors().is_empty());
        assert_eq!(err.kind().to_string(), "transport");
    }
}
