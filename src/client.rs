// One multipart POST per conversion. No timeout is set here.

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ConvertError;
use crate::widget::{ConversionOutcome, ConversionRequest};

const GENERIC_FAILURE: &str = "Conversion failed";

pub fn build_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Error body returned by the service on failure.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

/// Extracts the server's `detail` message, falling back to a generic one.
pub fn error_detail(body: &[u8]) -> String {
    let detail = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail);
    match detail {
        Some(serde_json::Value::String(s)) if !s.is_empty() => s,
        Some(serde_json::Value::Null) | Some(serde_json::Value::String(_)) | None => {
            GENERIC_FAILURE.to_string()
        }
        Some(other) => other.to_string(),
    }
}

/// Posts `request` to its endpoint under `base_url` and returns the body.
pub async fn submit(
    client: &reqwest::Client,
    base_url: &str,
    request: &ConversionRequest,
) -> Result<Vec<u8>, ConvertError> {
    let endpoint = request.operation.endpoint(base_url);
    let file = &request.file;

    let part = Part::bytes(file.bytes.to_vec())
        .file_name(file.name.clone())
        .mime_str(file.mime())
        .map_err(|e| ConvertError::request_failed(e.to_string()))?;
    let form = Form::new()
        .part("file", part)
        .text("target_format", request.target.to_string());

    info!("POST {} ({} bytes)", endpoint, file.bytes.len());
    let response = client
        .post(&endpoint)
        .multipart(form)
        .send()
        .await
        .map_err(|e| ConvertError::request_failed(e.to_string()))?;

    let status = response.status();
    debug!("{} answered {}", endpoint, status);
    if !status.is_success() {
        let body = response.bytes().await.unwrap_or_default();
        return Err(ConvertError::request_failed(error_detail(&body)));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| ConvertError::request_failed(e.to_string()))?;
    Ok(body.to_vec())
}

/// Runs `request` to completion and packages the result for the UI thread.
pub async fn run_conversion(
    client: reqwest::Client,
    base_url: String,
    request: ConversionRequest,
) -> ConversionOutcome {
    let result = submit(&client, &base_url, &request).await;
    ConversionOutcome {
        generation: request.generation,
        target: request.target,
        result,
    }
}
