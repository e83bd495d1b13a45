use async_trait::async_trait;

use crate::error::AppError;
use crate::upload::UploadedImage;

pub mod gemini;

pub use gemini::GeminiClient;

/// One element of a generation request.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    InlineData { mime_type: String, bytes: Vec<u8> },
}

impl From<&UploadedImage> for Part {
    fn from(image: &UploadedImage) -> Self {
        Part::InlineData {
            mime_type: image.mime_type.to_string(),
            bytes: image.bytes.clone(),
        }
    }
}

/// Hosted text generation, one request per call.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, parts: &[Part]) -> Result<String, AppError>;
}

/// Sends `prompt`, preceded by `image` when given.
pub async fn generate_text(
    generator: &dyn TextGenerator,
    prompt: &str,
    image: Option<&UploadedImage>,
) -> Result<String, AppError> {
    let mut parts = Vec::with_capacity(2);
    if let Some(image) = image {
        parts.push(Part::from(image));
    }
    parts.push(Part::Text(prompt.to_string()));
    generator.generate(&parts).await
}
