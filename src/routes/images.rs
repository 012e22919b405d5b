//! Image upload, listing and tag search for the authenticated user.

use axum::{
    extract::{multipart::MultipartError, Multipart, Query, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::{error, info};
use uuid::Uuid;

use crate::models::{
    AppState, ImageRecord, ImageSummary, ImagesResponse, NewImage, SearchParams, UploadResponse,
};
use crate::storage::object_key;
use crate::tagging::{tag_or_empty, ImageInput};
use crate::token::Principal;
use crate::types::{AppError, AppResult};

const IMAGE_FIELDS: [&str; 2] = ["image", "file"];

/// Tag, store, then record. A failed metadata insert removes the stored
/// object again so no half-committed upload is left behind.
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(user): Extension<Principal>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    let image = read_image(&mut multipart).await?;
    let tags = tag_or_empty(state.tagger.as_ref(), &image).await;

    let image_id = Uuid::new_v4();
    let key = object_key(&user, image_id, &image.mime_type);
    let filename = state
        .objects
        .put(&key, image.bytes.clone(), image.mime_type.as_ref())
        .await
        .map_err(AppError::Storage)?;

    let record = NewImage {
        id: image_id,
        user_id: user.clone(),
        filename: filename.clone(),
        tags: tags.clone(),
    };
    if let Err(e) = state.metadata.insert_image(&record).await {
        if let Err(cleanup) = state.objects.delete(&filename).await {
            error!("Failed to remove orphaned object {}: {:#}", filename, cleanup);
        }
        return Err(AppError::Metadata(e));
    }

    info!(user_id = %user, %image_id, tags = tags.len(), "Image uploaded");
    Ok(Json(UploadResponse {
        success: true,
        image_id,
        url: state.objects.public_url(&filename),
        filename,
        tags,
    }))
}

pub async fn list_images(
    State(state): State<AppState>,
    Extension(user): Extension<Principal>,
) -> AppResult<Json<ImagesResponse>> {
    let images = state
        .metadata
        .images_for_user(&user)
        .await
        .map_err(AppError::Metadata)?;

    Ok(Json(images_response(&state, images)))
}

pub async fn search_images(
    State(state): State<AppState>,
    Extension(user): Extension<Principal>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<ImagesResponse>> {
    let query = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::InvalidRequest("Missing search query".to_string()))?;

    let images = state
        .metadata
        .search_images(&user, query)
        .await
        .map_err(AppError::Metadata)?;

    Ok(Json(images_response(&state, images)))
}

fn images_response(state: &AppState, images: Vec<ImageRecord>) -> ImagesResponse {
    let images = images
        .into_iter()
        .map(|image| ImageSummary {
            id: image.id,
            url: state.objects.public_url(&image.filename),
            filename: image.filename,
            tags: image.tags,
            created_at: image.created_at,
        })
        .collect();

    ImagesResponse {
        success: true,
        images,
    }
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::InvalidRequest(e.body_text())
    }
}

/// First `image`/`file` part. The declared content type wins unless it is
/// missing or generic, in which case the file name decides.
async fn read_image(multipart: &mut Multipart) -> AppResult<ImageInput> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if !field.name().is_some_and(|name| IMAGE_FIELDS.contains(&name)) {
            continue;
        }

        let declared = field
            .content_type()
            .and_then(|ct| ct.parse::<mime::Mime>().ok())
            .filter(|m| *m != mime::APPLICATION_OCTET_STREAM);
        let guessed = field
            .file_name()
            .and_then(|name| mime_guess::from_path(name).first());
        let mime_type = declared
            .or(guessed)
            .filter(|m| m.type_() == mime::IMAGE)
            .ok_or_else(|| AppError::InvalidRequest("Only image uploads are supported".to_string()))?;

        let bytes = field.bytes().await.map_err(multipart_error)?;
        if bytes.is_empty() {
            return Err(AppError::InvalidRequest("Image is empty".to_string()));
        }

        return Ok(ImageInput::new(bytes, mime_type));
    }

    Err(AppError::InvalidRequest("Missing image field".to_string()))
}
