use image::ImageFormat;
use std::path::Path;

use crate::error::AppError;

const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// An uploaded image whose encoding has been checked.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedImage {
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

impl UploadedImage {
    /// Accepts JPEG and PNG data only. The format is taken from the byte
    /// signature, the file name only narrows what is accepted.
    pub fn from_upload(file_name: Option<&str>, bytes: Vec<u8>) -> Result<Self, AppError> {
        if bytes.is_empty() {
            return Err(AppError::MissingInput("Please upload an image.".to_string()));
        }

        if let Some(name) = file_name.filter(|n| !n.is_empty()) {
            let extension = Path::new(name)
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase())
                .unwrap_or_default();
            if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
                return Err(AppError::UnsupportedImage(format!(
                    "{name}: only .jpg, .jpeg and .png files are accepted"
                )));
            }
        }

        let mime_type = match image::guess_format(&bytes) {
            Ok(ImageFormat::Jpeg) => "image/jpeg",
            Ok(ImageFormat::Png) => "image/png",
            Ok(other) => {
                return Err(AppError::UnsupportedImage(format!(
                    "{other:?} images are not supported, upload a JPEG or PNG"
                )))
            }
            Err(_) => {
                return Err(AppError::UnsupportedImage(
                    "the upload is not a recognizable JPEG or PNG image".to_string(),
                ))
            }
        };

        Ok(Self { mime_type, bytes })
    }

    /// Rejects a missing upload the way an empty one is rejected.
    pub fn require(upload: Option<(Option<String>, Vec<u8>)>) -> Result<Self, AppError> {
        match upload {
            Some((name, bytes)) => Self::from_upload(name.as_deref(), bytes),
            None => Err(AppError::MissingInput("Please upload an image.".to_string())),
        }
    }
}
