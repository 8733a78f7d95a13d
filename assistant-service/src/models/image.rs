use base64::{engine::general_purpose::STANDARD, Engine as _};
use axum::body::Bytes;
use serde::Serialize;

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// One file from the `images` multipart field, held in memory for the
/// duration of the request.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub bytes: Bytes,
    pub mime_type: String,
}

impl UploadedImage {
    pub fn new(bytes: impl Into<Bytes>, mime_type: Option<&str>) -> Self {
        let mime_type = mime_type
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(FALLBACK_MIME_TYPE)
            .to_string();

        Self {
            bytes: bytes.into(),
            mime_type,
        }
    }

    /// `data:` URL accepted by vision chat endpoints as an `image_url`.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}

/// Result entry for one uploaded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAnalysis {
    /// 1-based position in upload order.
    pub image_index: usize,
    pub analysis: String,
}
