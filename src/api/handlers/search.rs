use crate::AppState;
use crate::api::error::AppError;
use axum::{
    Json,
    extract::{Multipart, State},
};
use futures::TryStreamExt;
use serde::Serialize;
use tokio_util::io::StreamReader;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct FindFacesResponse {
    /// Filenames of matching reference photos, best match first
    pub matches: Vec<String>,
}

#[derive(ToSchema)]
#[allow(unused)]
pub struct ProbeUpload {
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

#[utoipa::path(
    post,
    path = "/find_faces/",
    request_body(content = ProbeUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Matching reference photos, best first", body = FindFacesResponse),
        (status = 400, description = "No file field in the request"),
        (status = 500, description = "Bucket sync or face search failed")
    ),
    tag = "search"
)]
pub async fn find_faces(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<FindFacesResponse>, AppError> {
    // Variant with a remote photo corpus: refresh the local copy first.
    if let Some(mirror) = &state.mirror {
        mirror.sync().await.map_err(AppError::Sync)?;
    }

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name != "file" {
            continue;
        }

        let body_with_io_error =
            field.map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err));
        let reader = StreamReader::new(body_with_io_error);

        upload = Some(state.uploads.store(reader).await.map_err(AppError::Match)?);
        break;
    }

    let upload = upload.ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;

    let result = state
        .recognizer
        .find(upload.path(), &state.config.photo_db_dir)
        .await;

    // The probe is request-scoped; delete it before either outcome returns.
    upload.remove().await;

    let matches = result
        .map_err(AppError::Match)?
        .into_iter()
        .map(|m| m.identity)
        .collect();

    Ok(Json(FindFacesResponse { matches }))
}
