//! HTTP client for the spam classification service.
//!
//! Owns the single network boundary: `POST /predict` with a JSON body, and
//! the interpretation of whatever comes back into a `ClassificationResult`
//! or one of the `ClassifyError` branches.

use crate::model::{ClassificationResult, ClassifyError, PredictRequest, RunConfig};
use anyhow::{Context, Result};
use tracing::{debug, warn};

#[derive(Clone)]
pub struct PredictClient {
    http: reqwest::Client,
    predict_url: String,
}

impl PredictClient {
    pub fn new(cfg: &RunConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.request_timeout)
            .user_agent(cfg.user_agent.clone())
            .build()
            .context("build HTTP client")?;
        let predict_url = format!("{}/predict", cfg.base_url.trim_end_matches('/'));
        Ok(Self { http, predict_url })
    }

    /// Send one classification request and interpret the response.
    ///
    /// Branches are mutually exclusive and checked in priority order:
    /// transport failure, non-success status, undecodable body, body that
    /// self-reports failure, success.
    pub async fn classify(&self, message: &str) -> Result<ClassificationResult, ClassifyError> {
        debug!(len = message.chars().count(), "sending prediction request");

        let resp = self
            .http
            .post(&self.predict_url)
            .json(&PredictRequest { message })
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "prediction request failed in transport");
                ClassifyError::Transport(e)
            })?;

        let status = resp.status();
        if !status.is_success() {
            // Best effort: surface the server's own message when the error
            // body happens to be JSON. A decode failure here is swallowed,
            // never escalated into a second error.
            let detail = resp
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|v| extract_message(&v));
            warn!(status = status.as_u16(), "server rejected prediction request");
            return Err(ClassifyError::Server {
                status: status.as_u16(),
                detail,
            });
        }

        let body: serde_json::Value = resp.json().await.map_err(|e| {
            warn!(error = %e, "invalid JSON in prediction response");
            ClassifyError::Decode
        })?;

        if body.get("error").map(is_truthy).unwrap_or(false) {
            return Err(ClassifyError::Logical {
                detail: extract_message(&body),
            });
        }

        let result: ClassificationResult =
            serde_json::from_value(body).map_err(|e| {
                warn!(error = %e, "prediction response missing expected fields");
                ClassifyError::Decode
            })?;
        debug!(
            prediction = %result.prediction,
            confidence = result.confidence,
            "prediction received"
        );
        Ok(result)
    }
}

/// Surface a truthy `message` field, stringifying non-string values the way
/// the service's own web client does. Falsy values count as absent.
fn extract_message(body: &serde_json::Value) -> Option<String> {
    let msg = body.get("message")?;
    if !is_truthy(msg) {
        return None;
    }
    Some(match msg {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

/// JS-style truthiness: the original service signals logical failure with a
/// truthy `error` field, not a strict boolean.
fn is_truthy(v: &serde_json::Value) -> bool {
    match v {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn test_config(base_url: String) -> RunConfig {
        RunConfig {
            base_url,
            request_timeout: Duration::from_secs(2),
            user_agent: "sms-spam-cli/test".into(),
        }
    }

    /// Serve exactly one canned HTTP response on an ephemeral port.
    async fn spawn_one_shot_server(status_line: &str, content_type: &str, body: &str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            // Read the full request (headers plus Content-Length body) before
            // responding, so the client never sees a reset mid-write.
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = sock.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    let headers = String::from_utf8_lossy(&buf[..pos]).to_lowercase();
                    let content_length = headers
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if buf.len() >= pos + 4 + content_length {
                        break;
                    }
                }
            }
            sock.write_all(response.as_bytes()).await.unwrap();
            sock.shutdown().await.ok();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn success_response_decodes_into_result() {
        let body = json!({
            "error": false,
            "is_spam": true,
            "prediction": "Spam",
            "confidence": 92.0,
            "message": "Win a free prize!"
        })
        .to_string();
        let base = spawn_one_shot_server("200 OK", "application/json", &body).await;

        let client = PredictClient::new(&test_config(base)).unwrap();
        let result = client.classify("Win a free prize!").await.unwrap();
        assert!(result.is_spam);
        assert_eq!(result.prediction, "Spam");
        assert_eq!(result.confidence, 92.0);
        assert_eq!(result.message, "Win a free prize!");
    }

    #[tokio::test]
    async fn non_success_status_surfaces_server_message() {
        let body = json!({ "message": "rate limited" }).to_string();
        let base =
            spawn_one_shot_server("429 Too Many Requests", "application/json", &body).await;

        let client = PredictClient::new(&test_config(base)).unwrap();
        let err = client.classify("hello world").await.unwrap_err();
        assert_eq!(err.user_message(), "Server returned 429 - rate limited");
    }

    #[tokio::test]
    async fn non_json_error_body_falls_back_to_bare_status() {
        let base =
            spawn_one_shot_server("500 Internal Server Error", "text/html", "<h1>boom</h1>").await;

        let client = PredictClient::new(&test_config(base)).unwrap();
        let err = client.classify("hello world").await.unwrap_err();
        assert_eq!(err.user_message(), "Server returned 500");
    }

    #[tokio::test]
    async fn undecodable_success_body_is_a_decode_error() {
        let base = spawn_one_shot_server("200 OK", "text/plain", "not json at all").await;

        let client = PredictClient::new(&test_config(base)).unwrap();
        let err = client.classify("hello world").await.unwrap_err();
        assert!(matches!(err, ClassifyError::Decode));
        assert_eq!(err.user_message(), "Received invalid response from server.");
    }

    #[tokio::test]
    async fn truthy_error_field_is_a_logical_failure() {
        let body = json!({ "error": true, "message": "Model not loaded" }).to_string();
        let base = spawn_one_shot_server("200 OK", "application/json", &body).await;

        let client = PredictClient::new(&test_config(base)).unwrap();
        let err = client.classify("hello world").await.unwrap_err();
        assert!(matches!(err, ClassifyError::Logical { .. }));
        assert_eq!(err.user_message(), "Model not loaded");
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_failure() {
        // Bind then drop to get a port with nothing listening on it.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = PredictClient::new(&test_config(format!("http://{addr}"))).unwrap();
        let err = client.classify("hello world").await.unwrap_err();
        assert!(matches!(err, ClassifyError::Transport(_)));
        assert_eq!(
            err.user_message(),
            "Failed to connect to the server. Please check your network and try again."
        );
    }

    #[tokio::test]
    async fn numeric_server_message_is_stringified() {
        let body = json!({ "message": 42 }).to_string();
        let base =
            spawn_one_shot_server("503 Service Unavailable", "application/json", &body).await;

        let client = PredictClient::new(&test_config(base)).unwrap();
        let err = client.classify("hello world").await.unwrap_err();
        assert_eq!(err.user_message(), "Server returned 503 - 42");
    }

    #[test]
    fn extract_message_surfaces_only_truthy_values() {
        assert_eq!(
            extract_message(&json!({ "message": "busy" })),
            Some("busy".into())
        );
        assert_eq!(extract_message(&json!({ "message": 42 })), Some("42".into()));
        assert_eq!(extract_message(&json!({ "message": "" })), None);
        assert_eq!(extract_message(&json!({ "message": null })), None);
        assert_eq!(extract_message(&json!({})), None);
    }

    #[test]
    fn truthiness_follows_js_coercion() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("yes")));
        assert!(is_truthy(&json!({})));
    }
}
