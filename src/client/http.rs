use super::{ScaleoutError, ScaleoutTransport};
use crate::config::AppConfig;
use crate::metadata::QueryResultSnapshot;
use crate::model::{ScaleoutRequest, ScaleoutResponse};
use anyhow::{Context, Result};
use futures::future::BoxFuture;
use reqwest::StatusCode;
use serde::Deserialize;

/// HTTP client for the BI server's scale-out and query-result endpoints.
pub struct RedashClient {
    http: reqwest::Client,
    base_url: String,
    scaleout_endpoint: String,
    api_key: Option<String>,
}

impl RedashClient {
    pub fn new(cfg: &AppConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(format!("trino-scaleout/{}", env!("CARGO_PKG_VERSION")))
            .timeout(cfg.request_timeout)
            .build()
            .context("build http client")?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            scaleout_endpoint: cfg.scaleout.endpoint.clone(),
            api_key: cfg.api_key.clone().filter(|k| !k.trim().is_empty()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, rb: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.api_key.as_deref() {
            Some(key) => rb.header(reqwest::header::AUTHORIZATION, format!("Key {key}")),
            None => rb,
        }
    }

    async fn post_scaleout(
        &self,
        request: &ScaleoutRequest,
    ) -> Result<ScaleoutResponse, ScaleoutError> {
        let url = self.url(&self.scaleout_endpoint);
        let body = request.body();
        tracing::debug!(%url, ?body, "posting scale-out request");

        let resp = self
            .authorize(self.http.post(&url).json(&body))
            .send()
            .await
            .map_err(|e| ScaleoutError::Transport(transport_text(&e)))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ScaleoutError::Transport(transport_text(&e)))?;
        interpret_response(status, &text)
    }

    /// Fetch `/api/query_results/{id}` and reduce it to a snapshot.
    pub async fn fetch_query_result(&self, id: u64) -> Result<QueryResultSnapshot> {
        let url = self.url(&format!("/api/query_results/{id}"));
        let resp = self
            .authorize(self.http.get(&url))
            .send()
            .await
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("GET {url}"))?;
        let raw = resp.text().await.context("read query result body")?;
        QueryResultSnapshot::from_envelope_json(&raw).context("parse query result")
    }
}

impl ScaleoutTransport for RedashClient {
    fn submit<'a>(
        &'a self,
        request: &'a ScaleoutRequest,
    ) -> BoxFuture<'a, Result<ScaleoutResponse, ScaleoutError>> {
        Box::pin(self.post_scaleout(request))
    }
}

fn transport_text(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        format!("could not connect to server: {e}")
    } else {
        e.to_string()
    }
}

/// Error bodies carry `message` at the top level or under `error`.
#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Text(String),
    Body {
        #[serde(default)]
        message: Option<String>,
    },
}

impl ErrorEnvelope {
    fn into_message(self) -> Option<String> {
        let nested = match self.error {
            Some(ErrorDetail::Text(t)) => Some(t),
            Some(ErrorDetail::Body { message }) => message,
            None => None,
        };
        self.message.or(nested)
    }
}

fn interpret_response(status: StatusCode, body: &str) -> Result<ScaleoutResponse, ScaleoutError> {
    if !status.is_success() {
        let message = serde_json::from_str::<ErrorEnvelope>(body)
            .ok()
            .and_then(ErrorEnvelope::into_message);
        return Err(ScaleoutError::Application {
            status: Some(status.as_u16()),
            message,
        });
    }

    let response: ScaleoutResponse = if body.trim().is_empty() {
        ScaleoutResponse::default()
    } else {
        serde_json::from_str(body).map_err(|e| ScaleoutError::Decode(e.to_string()))?
    };
    if response.success == Some(false) {
        return Err(ScaleoutError::Application {
            status: Some(status.as_u16()),
            message: response.message,
        });
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_body_is_parsed() {
        let body = r#"{"success": true, "message": "Scale-out queued (Scale: 20)", "scale_size": 20, "expire_at": "2026-10-19T14:00:00", "redis_list_length": 3}"#;
        let resp = interpret_response(StatusCode::OK, body).unwrap();
        assert_eq!(resp.message.as_deref(), Some("Scale-out queued (Scale: 20)"));
        assert_eq!(resp.scale_size, Some(20));
        assert_eq!(resp.redis_list_length, Some(3));
    }

    #[test]
    fn server_error_carries_message() {
        let body = r#"{"success": false, "message": "Redis operation timed out"}"#;
        let err = interpret_response(StatusCode::INTERNAL_SERVER_ERROR, body).unwrap_err();
        assert_eq!(
            err,
            ScaleoutError::Application {
                status: Some(500),
                message: Some("Redis operation timed out".into()),
            }
        );
    }

    #[test]
    fn nested_error_envelope_is_understood() {
        let body = r#"{"error": {"message": "forbidden"}}"#;
        let err = interpret_response(StatusCode::FORBIDDEN, body).unwrap_err();
        assert_eq!(err.to_string(), "forbidden");

        let body = r#"{"error": "not allowed"}"#;
        let err = interpret_response(StatusCode::FORBIDDEN, body).unwrap_err();
        assert_eq!(err.to_string(), "not allowed");
    }

    #[test]
    fn non_json_error_falls_back_to_status() {
        let err = interpret_response(StatusCode::BAD_GATEWAY, "<html>oops</html>").unwrap_err();
        assert_eq!(err.to_string(), "server responded with HTTP 502");
    }

    #[test]
    fn success_flag_false_on_2xx_is_a_failure() {
        let err = interpret_response(StatusCode::OK, r#"{"success": false}"#).unwrap_err();
        assert!(matches!(err, ScaleoutError::Application { message: None, .. }));
    }

    #[test]
    fn garbage_2xx_body_is_a_decode_error() {
        let err = interpret_response(StatusCode::OK, "not json").unwrap_err();
        assert!(matches!(err, ScaleoutError::Decode(_)));
    }

    #[test]
    fn empty_2xx_body_is_accepted() {
        let resp = interpret_response(StatusCode::OK, "").unwrap();
        assert_eq!(resp, ScaleoutResponse::default());
    }
}
