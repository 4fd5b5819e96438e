//! Outbound calls to the BI server.
//!
//! The flow only depends on [`ScaleoutTransport`]; [`RedashClient`] is the
//! HTTP implementation used by the binary.

mod http;

pub use http::RedashClient;

use crate::model::{ScaleoutRequest, ScaleoutResponse};
use futures::future::BoxFuture;
use thiserror::Error;

/// Why a scale-out submission failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScaleoutError {
    /// No response was received.
    #[error("{0}")]
    Transport(String),
    /// The server answered with an error indication.
    #[error("{}", application_text(*status, message.as_deref()))]
    Application {
        status: Option<u16>,
        message: Option<String>,
    },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

fn application_text(status: Option<u16>, message: Option<&str>) -> String {
    match (message.map(str::trim).filter(|m| !m.is_empty()), status) {
        (Some(m), _) => m.to_string(),
        (None, Some(code)) => format!("server responded with HTTP {code}"),
        (None, None) => "server reported a failure".to_string(),
    }
}

impl ScaleoutError {
    /// Text shown in the single failure notification.
    pub fn user_message(&self) -> String {
        format!("Scale-out request failed: {self}")
    }
}

/// Sends one scale-out request and resolves with the server's answer.
pub trait ScaleoutTransport: Send + Sync {
    fn submit<'a>(
        &'a self,
        request: &'a ScaleoutRequest,
    ) -> BoxFuture<'a, Result<ScaleoutResponse, ScaleoutError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_wins() {
        let err = ScaleoutError::Application {
            status: Some(500),
            message: Some("Redis unreachable".into()),
        };
        assert_eq!(err.user_message(), "Scale-out request failed: Redis unreachable");
    }

    #[test]
    fn blank_message_falls_back_to_status() {
        let err = ScaleoutError::Application {
            status: Some(502),
            message: Some("  ".into()),
        };
        assert_eq!(
            err.user_message(),
            "Scale-out request failed: server responded with HTTP 502"
        );
    }

    #[test]
    fn transport_error_text_is_kept() {
        let err = ScaleoutError::Transport("connection refused".into());
        assert_eq!(err.user_message(), "Scale-out request failed: connection refused");
    }
}
