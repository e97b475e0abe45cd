use reqwest::StatusCode;
use serde_json::Value;
use std::error::Error as StdError;
use std::io::ErrorKind;
use thiserror::Error;

/// Why a call to the chat API could not be completed.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error(
        "request to '{url}' timed out after {timeout_secs}s; \
         increase LLM_TIMEOUT or check model responsiveness"
    )]
    Timeout { url: String, timeout_secs: u64 },

    #[error(
        "connection refused by chat API at '{url}'; \
         ensure the server is running and LLM_BASE_URL is correct"
    )]
    ConnectionRefused { url: String },

    #[error(
        "failed to connect to chat API at '{url}'; \
         check LLM_BASE_URL and network connectivity"
    )]
    Connect {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to call chat API at '{url}': {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("chat API rejected the credentials (HTTP {status}); check LLM_API_KEY")]
    Auth { status: u16, body: String },

    #[error("chat API returned HTTP {status}: {message}")]
    Status {
        status: u16,
        message: String,
        body: String,
    },

    #[error("malformed response from chat API: {0}")]
    Malformed(String),

    #[error("chat API reported an error: {0}")]
    Remote(String),

    #[error("response stream interrupted: {0}")]
    Interrupted(String),
}

impl TransportError {
    /// Raw detail worth showing in debug mode: the response body or the
    /// underlying error chain.
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::Auth { body, .. } | Self::Status { body, .. } if !body.is_empty() => {
                Some(body.clone())
            }
            Self::Connect { source, .. } | Self::Request { source, .. } => {
                Some(error_chain(source))
            }
            _ => None,
        }
    }

    pub(crate) fn from_status(status: StatusCode, body: String) -> Self {
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Self::Auth {
                status: status.as_u16(),
                body,
            };
        }

        let message = api_error_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        });
        Self::Status {
            status: status.as_u16(),
            message,
            body,
        }
    }
}

/// Pulls `error.message` out of an OpenAI-style error body.
pub(crate) fn api_error_message(body: &str) -> Option<String> {
    let json = serde_json::from_str::<Value>(body).ok()?;
    let error = json.get("error")?;
    error
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| error.as_str())
        .map(str::to_string)
}

fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut current = err.source();
    while let Some(source) = current {
        parts.push(source.to_string());
        current = source.source();
    }
    parts.join(": ")
}

fn error_chain_has(err: &(dyn StdError + 'static), kind: ErrorKind, needle: &str) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(source) = current {
        if let Some(io_err) = source.downcast_ref::<std::io::Error>()
            && io_err.kind() == kind
        {
            return true;
        }

        if source.to_string().to_ascii_lowercase().contains(needle) {
            return true;
        }

        current = source.source();
    }

    false
}

fn error_chain_has_connection_refused(err: &(dyn StdError + 'static)) -> bool {
    error_chain_has(err, ErrorKind::ConnectionRefused, "connection refused")
}

fn error_chain_has_timeout(err: &(dyn StdError + 'static)) -> bool {
    error_chain_has(err, ErrorKind::TimedOut, "timed out")
}

pub(crate) fn request_error(err: reqwest::Error, url: &str, timeout_secs: u64) -> TransportError {
    if err.is_timeout() || error_chain_has_timeout(&err) {
        return TransportError::Timeout {
            url: url.to_string(),
            timeout_secs,
        };
    }

    if err.is_connect() {
        if error_chain_has_connection_refused(&err) {
            return TransportError::ConnectionRefused {
                url: url.to_string(),
            };
        }
        return TransportError::Connect {
            url: url.to_string(),
            source: err,
        };
    }

    TransportError::Request {
        url: url.to_string(),
        source: err,
    }
}
