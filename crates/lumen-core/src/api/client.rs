//! Client for the Lumen vision API.
//!
//! Every operation is a JSON POST authenticated with the stored bearer token.
//! Errors are surfaced with the server's message; a message mentioning
//! credits becomes [`ApiError::InsufficientCredits`].

use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::image::{decode_image, ImageInput};
use crate::config::ApiConfig;
use crate::error::ApiError;

/// Options for the tag operation.
#[derive(Debug, Clone, Default)]
pub struct TagOptions {
    /// What to tag for
    pub prompt: String,
    /// Model mode, server default when `None`
    pub mode: Option<String>,
    /// Restrict tags to these choices (empty means free-form)
    pub choices: Vec<String>,
    /// Allow more than one tag
    pub multiple: bool,
}

/// What an embedding is computed from.
#[derive(Debug, Clone)]
pub enum EmbedInput {
    Image(ImageInput),
    Text(String),
}

/// Result of an edit call: the decoded image and, if known, its extension.
#[derive(Debug, Clone)]
pub struct EditedImage {
    pub bytes: Vec<u8>,
    pub extension: Option<&'static str>,
}

/// Authenticated vision API client.
pub struct VisionClient {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
    timeout: Duration,
}

// --- Request types ---

#[derive(Serialize)]
struct EditRequest<'a> {
    image: String,
    prompt: &'a str,
}

#[derive(Serialize)]
struct DescribeRequest {
    image: String,
}

#[derive(Serialize)]
struct TagRequest<'a> {
    image: String,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<&'a str>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    options: &'a [String],
    multiple: bool,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    input: String,
    #[serde(rename = "type")]
    kind: &'static str,
    mode: &'a str,
}

// --- Response types ---

#[derive(Deserialize)]
struct EditResponse {
    image: String,
}

#[derive(Deserialize)]
struct DescribeResponse {
    description: String,
}

#[derive(Deserialize)]
struct TagResponse {
    tags: Vec<String>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f64>,
}

impl VisionClient {
    pub fn new(config: &ApiConfig, access_token: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(format!("lumen/{}", crate::VERSION))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {e}");
                reqwest::Client::new()
            });
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    /// Apply a prompt-driven edit and return the resulting image.
    pub async fn edit(&self, image: &ImageInput, prompt: &str) -> Result<EditedImage, ApiError> {
        let resp: EditResponse = self
            .post(
                "v1/edit",
                &EditRequest {
                    image: image.data_url(),
                    prompt,
                },
            )
            .await?;
        Ok(EditedImage {
            extension: super::image::extension_for_data_url(&resp.image),
            bytes: decode_image(&resp.image)?,
        })
    }

    /// Describe an image in natural language.
    pub async fn describe(&self, image: &ImageInput) -> Result<String, ApiError> {
        let resp: DescribeResponse = self
            .post(
                "v1/describe",
                &DescribeRequest {
                    image: image.data_url(),
                },
            )
            .await?;
        Ok(resp.description.trim().to_string())
    }

    /// Tag an image.
    pub async fn tag(&self, image: &ImageInput, options: &TagOptions) -> Result<Vec<String>, ApiError> {
        let resp: TagResponse = self
            .post(
                "v1/tag",
                &TagRequest {
                    image: image.data_url(),
                    prompt: &options.prompt,
                    mode: options.mode.as_deref(),
                    options: &options.choices,
                    multiple: options.multiple,
                },
            )
            .await?;
        Ok(resp.tags)
    }

    /// Compute an embedding for an image or a text query.
    pub async fn embed(&self, input: &EmbedInput, mode: &str) -> Result<Vec<f64>, ApiError> {
        let (input, kind) = match input {
            EmbedInput::Image(image) => (image.data_url(), "image"),
            EmbedInput::Text(text) => (text.clone(), "text"),
        };
        let resp: EmbedResponse = self
            .post("v1/embed", &EmbedRequest { input, kind, mode })
            .await?;
        if resp.embedding.is_empty() {
            return Err(ApiError::InvalidResponse(
                "embedding response was empty".to_string(),
            ));
        }
        Ok(resp.embedding)
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let start = Instant::now();
        let url = format!("{}/{}", self.base_url, path);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Remote {
                message: format!("request to {path} failed: {e}"),
                status_code: None,
            })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| ApiError::Remote {
            message: format!("failed to read {path} response: {e}"),
            status_code: Some(status.as_u16()),
        })?;
        tracing::debug!(
            "{path} -> HTTP {} in {}ms",
            status.as_u16(),
            start.elapsed().as_millis()
        );

        if !status.is_success() {
            return Err(ApiError::from_message(
                error_message(status.as_u16(), &text),
                Some(status.as_u16()),
            ));
        }

        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("{path}: {e}")))
    }
}

/// Extract a human-readable message from an error body.
///
/// Accepts `{"error": "..."}`, `{"error": {"message": "..."}}` and
/// `{"message": "..."}`, falling back to the raw body.
pub(crate) fn error_message(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let message = value
            .get("error")
            .and_then(|e| e.as_str().or_else(|| e.get("message").and_then(|m| m.as_str())))
            .or_else(|| value.get("message").and_then(|m| m.as_str()));
        if let Some(message) = message {
            return message.to_string();
        }
    }
    let body = body.trim();
    if body.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {body}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(error_message(400, r#"{"error":"bad image"}"#), "bad image");
        assert_eq!(
            error_message(402, r#"{"error":{"message":"out of credits"}}"#),
            "out of credits"
        );
        assert_eq!(error_message(500, r#"{"message":"boom"}"#), "boom");
        assert_eq!(error_message(502, "upstream down"), "HTTP 502: upstream down");
        assert_eq!(error_message(503, ""), "HTTP 503");
    }

    #[test]
    fn test_credit_error_classification_via_body() {
        let err = ApiError::from_message(
            error_message(402, r#"{"error":"Insufficient credits"}"#),
            Some(402),
        );
        assert!(matches!(err, ApiError::InsufficientCredits(_)));
    }

    #[test]
    fn test_tag_request_serialization() {
        let choices = vec!["cat".to_string(), "dog".to_string()];
        let req = TagRequest {
            image: "data:image/png;base64,AQID".to_string(),
            prompt: "animal",
            mode: Some("fast"),
            options: &choices,
            multiple: false,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["options"], serde_json::json!(["cat", "dog"]));
        assert_eq!(json["multiple"], false);
        assert_eq!(json["mode"], "fast");
    }

    #[test]
    fn test_tag_request_omits_empty_options_and_mode() {
        let req = TagRequest {
            image: String::new(),
            prompt: "anything",
            mode: None,
            options: &[],
            multiple: true,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("options").is_none());
        assert!(json.get("mode").is_none());
    }

    #[test]
    fn test_embed_request_uses_type_field() {
        let req = EmbedRequest {
            input: "red car".to_string(),
            kind: "text",
            mode: "default",
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["input"], "red car");
    }

    #[test]
    fn test_client_trims_base_url() {
        let config = ApiConfig {
            base_url: "https://api.example.com/".to_string(),
            timeout_ms: 1000,
        };
        let client = VisionClient::new(&config, "tok");
        assert_eq!(client.base_url, "https://api.example.com");
        assert_eq!(client.timeout, Duration::from_millis(1000));
    }
}
