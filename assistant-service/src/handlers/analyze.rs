use crate::models::{ImageAnalysis, UploadedImage};
use crate::startup::AppState;
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

/// Multipart field carrying the uploaded images.
pub const IMAGES_FIELD: &str = "images";

/// `POST /analyze` (also `/api/analyze`): one analysis per uploaded image.
pub async fn analyze_images(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Vec<ImageAnalysis>>, AppError> {
    // A request that is not multipart at all simply carries no images.
    let images = match multipart {
        Ok(multipart) => collect_images(multipart).await?,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Request is not multipart");
            Vec::new()
        }
    };

    if images.is_empty() {
        return Err(AppError::bad_request("No images uploaded"));
    }

    tracing::info!(image_count = images.len(), "Analyzing uploaded images");

    let results = state.analyzer.analyze_batch(&images).await;
    Ok(Json(results))
}

async fn collect_images(mut multipart: Multipart) -> Result<Vec<UploadedImage>, AppError> {
    let mut images = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(IMAGES_FIELD) {
            continue;
        }

        let mime_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;
        images.push(UploadedImage::new(bytes, mime_type.as_deref()));
    }

    Ok(images)
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(anyhow::anyhow!("Upload exceeds the size limit"))
    } else {
        AppError::BadRequest(anyhow::anyhow!("Failed to read multipart body: {}", err))
    }
}
