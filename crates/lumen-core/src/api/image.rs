//! Image payloads sent to the vision API.

use base64::Engine;
use std::path::Path;

use crate::error::{ApiError, LumenError};

/// Base64-encoded image ready to send to the API.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Base64-encoded image bytes
    pub data: String,
    /// MIME type (e.g., "image/jpeg", "image/png")
    pub media_type: String,
}

impl ImageInput {
    /// Create an `ImageInput` from raw bytes and a file extension.
    pub fn from_bytes(bytes: &[u8], extension: &str) -> Self {
        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type: media_type_for(extension).to_string(),
        }
    }

    /// Read an image file. Missing files are reported before anything is sent.
    pub fn from_path(path: &Path) -> Result<Self, LumenError> {
        if !path.is_file() {
            return Err(LumenError::FileNotFound(path.to_path_buf()));
        }
        let bytes = std::fs::read(path)?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        Ok(Self::from_bytes(&bytes, extension))
    }

    /// Return a data URL, the form the API accepts for image fields.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

fn media_type_for(extension: &str) -> &'static str {
    match extension.to_lowercase().as_str() {
        "jpeg" | "jpg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        other => {
            tracing::warn!("Unknown image format '{other}', defaulting to image/jpeg");
            "image/jpeg"
        }
    }
}

/// Decode an image returned by the API, accepting bare base64 or a data URL.
pub fn decode_image(data: &str) -> Result<Vec<u8>, ApiError> {
    let payload = match data.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data,
    };
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| ApiError::InvalidResponse(format!("image is not valid base64: {e}")))
}

/// File extension matching a data URL's MIME type, if recognisable.
pub fn extension_for_data_url(data: &str) -> Option<&'static str> {
    let mime = data.strip_prefix("data:")?.split(';').next()?;
    match mime {
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpg"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_input_from_bytes_jpeg() {
        let input = ImageInput::from_bytes(&[0xFF, 0xD8, 0xFF], "JPG");
        assert_eq!(input.media_type, "image/jpeg");
        assert_eq!(input.data, "/9j/");
    }

    #[test]
    fn test_image_input_media_types() {
        assert_eq!(ImageInput::from_bytes(&[1], "png").media_type, "image/png");
        assert_eq!(ImageInput::from_bytes(&[1], "bmp").media_type, "image/bmp");
        assert_eq!(ImageInput::from_bytes(&[1], "tiff").media_type, "image/tiff");
    }

    #[test]
    fn test_image_input_data_url() {
        let input = ImageInput::from_bytes(&[1, 2, 3], "png");
        assert_eq!(input.data_url(), "data:image/png;base64,AQID");
    }

    #[test]
    fn test_from_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ImageInput::from_path(&dir.path().join("nope.jpg")).unwrap_err();
        assert!(matches!(err, LumenError::FileNotFound(_)));
    }

    #[test]
    fn test_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pic.webp");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();
        let input = ImageInput::from_path(&path).unwrap();
        assert_eq!(input.media_type, "image/webp");
        assert_eq!(input.data, "AQID");
    }

    #[test]
    fn test_decode_image_accepts_data_url_and_bare_base64() {
        assert_eq!(decode_image("data:image/png;base64,AQID").unwrap(), vec![1, 2, 3]);
        assert_eq!(decode_image("AQID").unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_decode_image_rejects_garbage() {
        assert!(matches!(
            decode_image("not base64!!"),
            Err(ApiError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_extension_for_data_url() {
        assert_eq!(extension_for_data_url("data:image/png;base64,AQID"), Some("png"));
        assert_eq!(extension_for_data_url("AQID"), None);
    }
}
