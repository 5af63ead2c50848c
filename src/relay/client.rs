//! KServe v2 inference client.
//!
//! Speaks the subset of the v2 REST protocol the relay needs: one BYTES
//! input tensor carrying the prompt and one requested output tensor.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Name of the input tensor holding the prompt.
pub const PROMPT_TENSOR: &str = "PROMPT";

/// Name of the output tensor holding the generated text.
pub const RESPONSE_TENSOR: &str = "RESPONSE";

#[derive(Error, Debug)]
pub enum ForwardError {
    #[error("inference server returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("inference server ({url}) request failed: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid inference request for {url}: {source}")]
    InvalidRequest {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to read inference response: {0}")]
    Body(#[source] reqwest::Error),

    #[error("malformed inference response: {0}")]
    Malformed(String),
}

impl ForwardError {
    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::Upstream { .. } => "upstream_status",
            ForwardError::Unreachable { .. } => "unreachable",
            ForwardError::InvalidRequest { .. }
            | ForwardError::Body(_)
            | ForwardError::Malformed(_) => "unexpected",
        }
    }

    /// HTTP status reported to the client.
    ///
    /// Downstream error statuses pass through; a non-error, non-success
    /// status (e.g. an unfollowed redirect) is reported as 502.
    pub fn status_code(&self) -> u16 {
        match self {
            ForwardError::Upstream { status, .. } if *status >= 400 => *status,
            ForwardError::Upstream { .. } => 502,
            ForwardError::Unreachable { .. } => 503,
            ForwardError::InvalidRequest { .. }
            | ForwardError::Body(_)
            | ForwardError::Malformed(_) => 500,
        }
    }

    /// Classify a failed `send()`: a request that could not be built is
    /// local, anything else means no response was obtained.
    fn from_send(url: &str, source: reqwest::Error) -> Self {
        if source.is_builder() {
            ForwardError::InvalidRequest {
                url: url.to_string(),
                source,
            }
        } else {
            ForwardError::Unreachable {
                url: url.to_string(),
                source,
            }
        }
    }

    /// Classify a failed body read. Timeouts and broken transfers count as
    /// an unreachable server, same as a failed send. `text()` decodes
    /// lossily, so a decode error from it is a broken body stream too.
    fn from_body(url: &str, source: reqwest::Error) -> Self {
        if source.is_timeout()
            || source.is_request()
            || source.is_connect()
            || source.is_body()
            || source.is_decode()
        {
            ForwardError::Unreachable {
                url: url.to_string(),
                source,
            }
        } else {
            ForwardError::Body(source)
        }
    }
}

/// `POST /v2/models/{model}/infer` request body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InferRequest {
    pub inputs: Vec<InferInput>,
    pub outputs: Vec<RequestedOutput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InferInput {
    pub name: String,
    pub shape: Vec<usize>,
    pub datatype: String,
    pub data: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestedOutput {
    pub name: String,
}

impl InferRequest {
    /// Single-prompt request asking for the response tensor.
    pub fn for_prompt(prompt: impl Into<String>) -> Self {
        Self {
            inputs: vec![InferInput {
                name: PROMPT_TENSOR.to_string(),
                shape: vec![1],
                datatype: "BYTES".to_string(),
                data: vec![prompt.into()],
            }],
            outputs: vec![RequestedOutput {
                name: RESPONSE_TENSOR.to_string(),
            }],
        }
    }
}

/// Inference reply. Only the fields the relay reads are modelled.
#[derive(Debug, Clone, Deserialize)]
pub struct InferResponse {
    pub outputs: Vec<InferOutput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InferOutput {
    #[serde(default)]
    pub name: Option<String>,
    pub data: Vec<serde_json::Value>,
}

impl InferResponse {
    /// First element of the first output tensor.
    pub fn first_text(&self) -> Result<&str, ForwardError> {
        let output = self
            .outputs
            .first()
            .ok_or_else(|| ForwardError::Malformed("response has no outputs".to_string()))?;
        let value = output
            .data
            .first()
            .ok_or_else(|| ForwardError::Malformed("first output has no data".to_string()))?;
        value.as_str().ok_or_else(|| {
            ForwardError::Malformed(format!("first output element is not a string: {value}"))
        })
    }
}

/// HTTP client bound to a model repository root.
#[derive(Debug, Clone)]
pub struct InferClient {
    http: Client,
    base_url: String,
}

impl InferClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Target URL for a model.
    pub fn infer_url(&self, model: &str) -> String {
        format!("{}/{}/infer", self.base_url, model)
    }

    /// Run one inference call and return the raw generated text.
    pub async fn infer(&self, model: &str, prompt: &str) -> Result<String, ForwardError> {
        let url = self.infer_url(model);
        let payload = InferRequest::for_prompt(prompt);

        debug!(url, prompt_len = prompt.len(), "Forwarding prompt");

        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|source| ForwardError::from_send(&url, source))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response body>".to_string());
            warn!(url, status = status.as_u16(), "Inference server returned an error");
            return Err(ForwardError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| ForwardError::from_body(&url, source))?;
        let parsed: InferResponse = serde_json::from_str(&body)
            .map_err(|e| ForwardError::Malformed(e.to_string()))?;

        parsed.first_text().map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let payload = serde_json::to_value(InferRequest::for_prompt("hi")).unwrap();
        assert_eq!(
            payload,
            serde_json::json!({
                "inputs": [{"name": "PROMPT", "shape": [1], "datatype": "BYTES", "data": ["hi"]}],
                "outputs": [{"name": "RESPONSE"}]
            })
        );
    }

    #[test]
    fn test_infer_url_trims_slash() {
        let client = InferClient::new("http://triton:8000/v2/models/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.infer_url("Qwen"), "http://triton:8000/v2/models/Qwen/infer");
    }

    #[tokio::test]
    async fn test_unbuildable_url_is_not_unreachable() {
        let client = InferClient::new("not a url", Duration::from_secs(1)).unwrap();
        let err = client.infer("Qwen", "hi").await.unwrap_err();
        assert!(matches!(err, ForwardError::InvalidRequest { .. }), "{err:?}");
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.kind(), "unexpected");
    }

    #[test]
    fn test_first_text() {
        let parsed: InferResponse = serde_json::from_value(serde_json::json!({
            "model_name": "Qwen",
            "outputs": [{"name": "RESPONSE", "datatype": "BYTES", "shape": [1], "data": ["hello", "ignored"]}]
        }))
        .unwrap();
        assert_eq!(parsed.first_text().unwrap(), "hello");
    }

    #[test]
    fn test_first_text_rejects_bad_shapes() {
        let empty: InferResponse = serde_json::from_value(serde_json::json!({"outputs": []})).unwrap();
        assert!(matches!(empty.first_text(), Err(ForwardError::Malformed(_))));

        let no_data: InferResponse =
            serde_json::from_value(serde_json::json!({"outputs": [{"data": []}]})).unwrap();
        assert!(matches!(no_data.first_text(), Err(ForwardError::Malformed(_))));

        let numeric: InferResponse =
            serde_json::from_value(serde_json::json!({"outputs": [{"data": [7]}]})).unwrap();
        assert!(matches!(numeric.first_text(), Err(ForwardError::Malformed(_))));
    }
}
