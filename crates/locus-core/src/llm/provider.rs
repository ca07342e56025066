//! LLM provider trait and request/response types.
//!
//! Defines the interface the description and keyword-extraction strategies
//! talk to. Ollama is the only backend; the trait is the seam tests mock.

use crate::error::PipelineError;
use crate::pipeline::SourceImage;
use async_trait::async_trait;
use base64::Engine;

/// Base64-encoded image ready to send to a model API.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Base64-encoded image bytes
    pub data: String,
    /// MIME type (e.g., "image/jpeg", "image/png")
    pub media_type: String,
}

impl ImageInput {
    /// Create an `ImageInput` from raw bytes and format string.
    ///
    /// The format is the image format identifier (e.g., "jpeg", "png", "webp").
    pub fn from_bytes(bytes: &[u8], format: &str) -> Self {
        let media_type = match format {
            "jpeg" | "jpg" => "image/jpeg",
            "png" => "image/png",
            "webp" => "image/webp",
            "gif" => "image/gif",
            "bmp" => "image/bmp",
            "tiff" => "image/tiff",
            other => {
                tracing::warn!("Unknown image format '{other}', defaulting to image/jpeg");
                "image/jpeg"
            }
        };

        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type: media_type.to_string(),
        }
    }

    /// Encode a loaded source image using its original bytes.
    pub fn from_source(source: &SourceImage) -> Self {
        Self::from_bytes(&source.bytes, source.format_name())
    }
}

/// A single-turn chat request.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// Text prompt for the model
    pub prompt: String,
    /// Image attached to the prompt, for vision models
    pub image: Option<ImageInput>,
    /// Sampling temperature; the model default when `None`
    pub temperature: Option<f32>,
}

impl LlmRequest {
    /// Ask a vision model to describe an image.
    pub fn describe_image(image: ImageInput, prompt: &str) -> Self {
        Self {
            prompt: prompt.to_string(),
            image: Some(image),
            temperature: None,
        }
    }

    /// Ask a text model to pull object keywords out of a description.
    pub fn extract_keywords(instruction: &str, description: &str) -> Self {
        Self {
            prompt: format!("{instruction}\n\nDescription:\n{description}"),
            image: None,
            temperature: Some(0.0),
        }
    }
}

/// The response from an LLM call.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Generated text, possibly empty
    pub text: String,
    /// Round-trip latency in milliseconds
    pub latency_ms: u64,
}

/// Trait that all LLM providers implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (we need `Box<dyn LlmProvider>` for dynamic dispatch).
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Model this provider talks to.
    fn model(&self) -> &str;

    /// Bring the model into memory so the first request doesn't pay for it.
    async fn load(&self) -> Result<(), PipelineError>;

    /// Release the model's memory.
    async fn unload(&self) -> Result<(), PipelineError>;

    /// Run one generation. Empty text is a valid response, not an error.
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, PipelineError>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_input_from_bytes_jpeg() {
        let input = ImageInput::from_bytes(&[0xFF, 0xD8, 0xFF], "jpeg");
        assert_eq!(input.media_type, "image/jpeg");
        assert_eq!(input.data, "/9j/");
    }

    #[test]
    fn test_image_input_from_bytes_png() {
        let input = ImageInput::from_bytes(&[0x89, 0x50, 0x4E, 0x47], "png");
        assert_eq!(input.media_type, "image/png");
    }

    #[test]
    fn test_describe_request_carries_image() {
        let image = ImageInput::from_bytes(&[1, 2, 3], "jpeg");
        let request = LlmRequest::describe_image(image, "Describe the image.");
        assert_eq!(request.prompt, "Describe the image.");
        assert!(request.image.is_some());
        assert!(request.temperature.is_none());
    }

    #[test]
    fn test_extract_request_is_text_only() {
        let request = LlmRequest::extract_keywords("List objects.", "A cup on a table.");
        assert!(request.image.is_none());
        assert!(request.prompt.starts_with("List objects."));
        assert!(request.prompt.ends_with("A cup on a table."));
        assert_eq!(request.temperature, Some(0.0));
    }
}
