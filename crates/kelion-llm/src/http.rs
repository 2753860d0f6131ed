//! HTTP plumbing shared by the adapters
//!
//! Maps transport failures and non-2xx responses onto the shared error
//! taxonomy. Nothing here retries; fallback belongs to the pool.

use crate::error::{BackendCode, Error, Result};
use crate::util::sanitize_api_error;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Build a client whose every request is bounded by `timeout`
pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::backend(BackendCode::Transport, e.to_string()))
}

/// Classify a failed `send()`
pub(crate) fn map_send_error(err: reqwest::Error) -> Error {
    let code = if err.is_timeout() {
        BackendCode::Timeout
    } else if err.is_connect() {
        BackendCode::Connect
    } else {
        BackendCode::Transport
    };
    Error::backend(code, sanitize_api_error(&err.without_url().to_string()))
}

/// Read the body of a response, turning 429 and other non-2xx statuses into errors
pub(crate) async fn read_body(response: Response) -> Result<String> {
    let status = response.status();
    let body = response.text().await.map_err(map_send_error)?;

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(Error::RateLimited);
    }
    if !status.is_success() {
        // SECURITY: Don't expose raw HTTP response body
        return Err(Error::backend(
            BackendCode::Status(status.as_u16()),
            sanitize_api_error(&error_detail(&body)),
        ));
    }

    Ok(body)
}

/// Decode a successful body
pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| Error::backend(BackendCode::Decode, e.to_string()))
}

/// Error text from `{"error": {"message": ..}}`, `{"error": ".."}` or the raw body
fn error_detail(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_string();
    };
    let error = &value["error"];
    if let Some(message) = error["message"].as_str() {
        return message.to_string();
    }
    if let Some(message) = error.as_str() {
        return message.to_string();
    }
    body.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_detail_nested_message() {
        let body = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        assert_eq!(error_detail(body), "Overloaded");
    }

    #[test]
    fn test_error_detail_flat_string() {
        assert_eq!(error_detail(r#"{"error":"model not found"}"#), "model not found");
    }

    #[test]
    fn test_error_detail_plain_body() {
        assert_eq!(error_detail("  bad gateway \n"), "bad gateway");
    }

    #[test]
    fn test_decode_failure_is_backend_error() {
        let err = decode::<serde_json::Value>("not json").unwrap_err();
        assert!(matches!(
            err,
            Error::Backend {
                code: BackendCode::Decode,
                ..
            }
        ));
    }
}
