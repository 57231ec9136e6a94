pub mod api;
pub mod config;
pub mod infrastructure;
pub mod services;

use crate::config::AppConfig;
use crate::services::mirror::PhotoMirror;
use crate::services::recognizer::FaceRecognizer;
use crate::services::uploads::TempUploadStore;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::search::find_faces,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::search::FindFacesResponse,
            api::handlers::search::ProbeUpload,
            api::handlers::health::HealthResponse,
        )
    ),
    tags(
        (name = "search", description = "Face search endpoints"),
        (name = "system", description = "Service status endpoints")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub recognizer: Arc<dyn FaceRecognizer>,
    pub uploads: TempUploadStore,
    /// Present only when bucket sync is enabled
    pub mirror: Option<Arc<PhotoMirror>>,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route("/find_faces/", post(api::handlers::search::find_faces))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(axum::extract::DefaultBodyLimit::max(
            state.config.max_upload_size,
        ))
        .with_state(state)
}
