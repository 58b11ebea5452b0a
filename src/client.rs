//! Inference service client.
//!
//! The service takes a PNG image as the raw request body and answers with a
//! JSON document whose `prediction` field is the label map as nested arrays:
//!
//! ```text
//! POST /predict            Content-Type: image/png
//! 200 OK                   {"prediction": [[0, 1, ...], ...]}
//! ```
//!
//! The client performs exactly one blocking request per prediction and never
//! retries; failures surface to the caller.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::io::Read;
use std::time::Duration;
use url::Url;

use crate::label_map::LabelMap;

pub const DEFAULT_PREDICT_URL: &str = "http://127.0.0.1:5000/predict";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const MAX_RESPONSE_BYTES: u64 = 64 * 1024 * 1024;
const PNG_CONTENT_TYPE: &str = "image/png";

/// Configuration for the inference client.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Prediction endpoint. Supported schemes: http, https.
    pub url: String,
    /// Whole-request timeout.
    pub timeout: Duration,
    /// Largest accepted response body, in bytes.
    pub max_response_bytes: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_PREDICT_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_response_bytes: MAX_RESPONSE_BYTES,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PredictionResponse {
    prediction: Value,
}

pub struct InferenceClient {
    url: Url,
    agent: ureq::Agent,
    max_response_bytes: u64,
}

impl InferenceClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let url = parse_endpoint(&config.url)?;
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Ok(Self {
            url,
            agent,
            max_response_bytes: config.max_response_bytes,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Sends `png` to the service and parses the returned label map.
    pub fn predict(&self, png: &[u8]) -> Result<LabelMap> {
        log::debug!("posting {} bytes to {}", png.len(), self.url);
        let response = match self
            .agent
            .post(self.url.as_str())
            .set("Content-Type", PNG_CONTENT_TYPE)
            .send_bytes(png)
        {
            Ok(response) => response,
            Err(ureq::Error::Status(code, response)) => {
                let detail = response.into_string().unwrap_or_default();
                return Err(anyhow!(
                    "inference service returned HTTP {}: {}",
                    code,
                    detail.trim()
                ));
            }
            Err(err) => {
                return Err(err).with_context(|| format!("post image to {}", self.url));
            }
        };

        let mut body = Vec::new();
        response
            .into_reader()
            .take(self.max_response_bytes.saturating_add(1))
            .read_to_end(&mut body)
            .context("read prediction response")?;
        // One byte past the limit is read to tell "exactly at" from "over".
        if body.len() as u64 > self.max_response_bytes {
            return Err(anyhow!(
                "prediction response exceeds {} bytes",
                self.max_response_bytes
            ));
        }
        parse_prediction(&body)
    }
}

/// Parses a `{"prediction": [[...]]}` response body.
pub fn parse_prediction(body: &[u8]) -> Result<LabelMap> {
    let response: PredictionResponse =
        serde_json::from_slice(body).context("parse prediction response json")?;
    let labels = LabelMap::from_json(&response.prediction).context("invalid prediction grid")?;
    log::debug!(
        "received {}x{} label map",
        labels.width(),
        labels.height()
    );
    Ok(labels)
}

fn parse_endpoint(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("parse inference url '{}'", raw))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(anyhow!(
            "unsupported inference url scheme '{}'; expected http(s)",
            other
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_http_endpoints() {
        let err = InferenceClient::new(ClientConfig {
            url: "udp://127.0.0.1:5000".to_string(),
            ..ClientConfig::default()
        })
        .err()
        .unwrap();
        assert!(err.to_string().contains("unsupported inference url scheme"));
        assert!(InferenceClient::new(ClientConfig {
            url: "not a url".to_string(),
            ..ClientConfig::default()
        })
        .is_err());
    }

    #[test]
    fn parses_prediction_field() {
        let labels = parse_prediction(br#"{"prediction": [[0, 1], [7, 2]], "ms": 12}"#).unwrap();
        assert_eq!(labels.as_slice(), &[0, 1, 7, 2]);
    }

    #[test]
    fn missing_or_malformed_prediction_is_an_error() {
        assert!(parse_prediction(br#"{"mask": [[0]]}"#).is_err());
        assert!(parse_prediction(br#"{"prediction": [[0, 1], [2]]}"#).is_err());
        assert!(parse_prediction(b"<html>").is_err());
    }
}
