use dotenvy::dotenv;
use face_search_backend::config::AppConfig;
use face_search_backend::infrastructure::storage;
use face_search_backend::services::mirror::PhotoMirror;
use face_search_backend::services::recognizer;
use face_search_backend::services::uploads::TempUploadStore;
use face_search_backend::{AppState, create_app};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Initialize tracing with EnvFilter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "face_search_backend=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting Face Search Backend...");

    let config = AppConfig::from_env();

    tokio::fs::create_dir_all(&config.photo_db_dir).await?;
    tokio::fs::create_dir_all(&config.temp_upload_dir).await?;
    info!(
        "📁 Reference dir: {}, scratch dir: {}",
        config.photo_db_dir.display(),
        config.temp_upload_dir.display()
    );

    let recognizer = recognizer::create_recognizer(&config)?;
    info!(
        "🔍 Recognizer: {} ({})",
        config.recognizer, config.face_engine_url
    );

    let mirror = if config.bucket_sync_enabled {
        let object_store = storage::setup_object_store().await;
        Some(Arc::new(PhotoMirror::new(
            object_store,
            config.photo_db_dir.clone(),
        )))
    } else {
        None
    };

    let uploads = TempUploadStore::new(config.temp_upload_dir.clone());

    let state = AppState {
        config: config.clone(),
        recognizer,
        uploads,
        mirror,
    };

    let app = create_app(state).layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            })
            .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                info!("📥 {} {}", request.method(), request.uri());
            })
            .on_response(
                |response: &axum::http::Response<_>,
                 latency: std::time::Duration,
                 _span: &tracing::Span| {
                    info!(
                        "📤 Finished in {:?} with status {}",
                        latency,
                        response.status()
                    );
                },
            ),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("✅ Server ready at http://{}", addr);
    info!("📖 Swagger UI: http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("🛑 Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, starting graceful shutdown...");
        },
    }
}
