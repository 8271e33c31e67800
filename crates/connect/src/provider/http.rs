//! Plumbing shared by the reqwest-backed provider clients.

use std::time::Duration;

use log::debug;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use ledgerlink_core::errors::{Error, Result};

#[derive(Debug, serde::Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Option<serde_json::Value>,
}

/// Builds the underlying HTTP client with the request timeout applied.
pub(crate) fn build_client(timeout_ms: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()
        .map_err(|e| Error::Unexpected(format!("Failed to initialize HTTP client: {}", e)))
}

/// Sends a request. Transport failures are reported as transient.
pub(crate) async fn send(label: &str, request: RequestBuilder) -> Result<Response> {
    request.send().await.map_err(|e| {
        debug!("[{}] Request failed: {}", label, e);
        Error::Transient(format!("{} request failed: {}", label, e))
    })
}

/// Fails with `Error::Upstream` unless the response is a success.
///
/// Returns the status and body on success so callers can branch on
/// `202 Accepted` and similar.
pub(crate) async fn read_success(label: &str, response: Response) -> Result<(StatusCode, String)> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| Error::Transient(format!("Failed to read {} response: {}", label, e)))?;

    if !status.is_success() {
        return Err(upstream_error(status, &body));
    }
    Ok((status, body))
}

/// Parses a JSON success body.
pub(crate) async fn parse_response<T: DeserializeOwned>(label: &str, response: Response) -> Result<T> {
    let (_, body) = read_success(label, response).await?;
    parse_body(label, &body)
}

/// Downloads a binary body, such as a generated PDF.
pub(crate) async fn download_bytes(
    label: &str,
    client: &reqwest::Client,
    url: &str,
) -> Result<Vec<u8>> {
    let response = send(label, client.get(url)).await?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::upstream(status.as_u16(), "PDF download failed"));
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::Transient(format!("Failed to read {} download: {}", label, e)))?;
    Ok(bytes.to_vec())
}

pub(crate) fn parse_body<T: DeserializeOwned>(label: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| {
        Error::Unexpected(format!(
            "Failed to parse {} response: {} - {}",
            label,
            e,
            body.chars().take(200).collect::<String>()
        ))
    })
}

fn upstream_error(status: StatusCode, body: &str) -> Error {
    // Try to parse error response for a better message
    if let Ok(err) = serde_json::from_str::<ApiErrorResponse>(body) {
        let message = err
            .message
            .or(err.error)
            .or_else(|| err.errors.map(|e| e.to_string()))
            .unwrap_or_else(|| format!("HTTP {}", status));
        return Error::upstream(status.as_u16(), message);
    }
    Error::upstream(
        status.as_u16(),
        format!("HTTP {}: {}", status, body.chars().take(200).collect::<String>()),
    )
}
