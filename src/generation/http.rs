use std::time::Duration;

use crate::{
    foundation::core::ImageRef,
    foundation::error::{AlbumError, AlbumResult},
    generation::generator::{ImageService, SourcePhoto},
    generation::state::GenerationFailure,
};

const MAX_ERROR_BODY_CHARS: usize = 200;

/// [`ImageService`] speaking a plain multipart protocol.
///
/// Request: `POST <endpoint>` with a `prompt` text part and an `image` file part.
/// Response: the generated image bytes with an `image/*` content type.
#[derive(Clone, Debug)]
pub struct HttpImageService {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpImageService {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> AlbumResult<Self> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(AlbumError::config("generation endpoint must be non-empty"));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AlbumError::config(format!("build http client: {e}")))?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request(&self, source: &SourcePhoto, prompt: &str) -> Result<ImageRef, String> {
        let image_part = reqwest::multipart::Part::bytes(source.bytes.to_vec())
            .file_name("source")
            .mime_str(&source.mime_type)
            .map_err(|e| format!("invalid source mime type '{}': {e}", source.mime_type))?;
        let form = reqwest::multipart::Form::new()
            .text("prompt", prompt.to_string())
            .part("image", image_part);

        let mut req = self.client.post(&self.endpoint).multipart(form);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await.map_err(|e| format!("request failed: {e}"))?;
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = resp
            .bytes()
            .await
            .map_err(|e| format!("reading response failed: {e}"))?;

        if !status.is_success() {
            return Err(format!(
                "service returned {status}: {}",
                snippet(&String::from_utf8_lossy(&body))
            ));
        }
        if !content_type.starts_with("image/") {
            return Err(format!(
                "service responded with '{content_type}' instead of an image: {}",
                snippet(&String::from_utf8_lossy(&body))
            ));
        }
        if body.is_empty() {
            return Err("service returned an empty image".to_string());
        }
        Ok(ImageRef::from_bytes(body.to_vec()))
    }
}

impl ImageService for HttpImageService {
    async fn generate(
        &self,
        source: &SourcePhoto,
        prompt: &str,
    ) -> Result<ImageRef, GenerationFailure> {
        self.request(source, prompt)
            .await
            .map_err(GenerationFailure::new)
    }
}

fn snippet(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= MAX_ERROR_BODY_CHARS {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
#[path = "../../tests/unit/generation/http.rs"]
mod tests;
