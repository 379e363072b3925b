//! Picture description through an OpenAI-compatible chat-completions
//! endpoint.
//!
//! Every picture is sent as one user message with two parts: the configured
//! prompt, and the image as a base64 PNG data URL. Local and remote VLMs use
//! the same wire format; only the URL and headers differ. There are no
//! retries: a failed picture is kept in the document without a description.

use super::encode::encode_data_url;
use crate::error::EngineError;
use crate::pipeline::PictureDescriptionOptions;
use image::DynamicImage;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

pub struct PictureDescriber {
    client: reqwest::Client,
    options: PictureDescriptionOptions,
}

impl PictureDescriber {
    pub fn new(options: PictureDescriptionOptions, timeout: Duration) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, options })
    }

    /// Whether a picture covering `area_fraction` of its page qualifies.
    pub fn qualifies(&self, area_fraction: f32) -> bool {
        area_fraction >= self.options.picture_area_threshold
    }

    fn request_body(&self, data_url: &str) -> Value {
        json!({
            "model": self.options.model,
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": self.options.prompt},
                    {"type": "image_url", "image_url": {"url": data_url}},
                ],
            }],
        })
    }

    /// Describe one picture.
    pub async fn describe(&self, img: &DynamicImage) -> Result<String, EngineError> {
        let url = &self.options.url;
        let fail = |detail: String| EngineError::PictureDescription {
            url: url.clone(),
            detail,
        };

        let body = self.request_body(&encode_data_url(img)?);
        let mut request = self.client.post(url);
        for (key, value) in &self.options.headers {
            request = request.header(key, value);
        }

        let response = request
            .json(&body)
            .send()
            .await
            .map_err(|e| fail(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            return Err(fail(format!("HTTP {status}: {error_body}")));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| fail(format!("Failed to parse response: {e}")))?;

        let text = payload
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| fail("response carried no message content".to_string()))?;

        debug!("Picture described by {} ({} chars)", self.options.model, text.len());
        Ok(text.to_string())
    }

    /// Describe one picture; failures are logged and yield `None`.
    pub async fn describe_soft(&self, img: &DynamicImage) -> Option<String> {
        match self.describe(img).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Picture description skipped: {e}");
                None
            }
        }
    }
}
