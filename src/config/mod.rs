use std::env;
use std::path::PathBuf;

/// Runtime configuration for the face search service
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding the searchable reference photos (default: "photo_db")
    pub photo_db_dir: PathBuf,

    /// Scratch directory for uploaded probe photos (default: "temp_uploads")
    pub temp_upload_dir: PathBuf,

    /// TCP port to listen on (default: 3000)
    pub port: u16,

    /// Maximum accepted upload size in bytes (default: 32 MB)
    pub max_upload_size: usize,

    /// Recognition engine type: "deepface" or "noop" (default: "deepface")
    pub recognizer: String,

    /// Base URL of the recognition engine (default: "http://127.0.0.1:5005")
    pub face_engine_url: String,

    /// Request timeout against the recognition engine in milliseconds (default: 60000)
    pub face_engine_timeout_ms: u64,

    /// Mirror the photo bucket into the reference directory before each
    /// search (default: false)
    pub bucket_sync_enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            photo_db_dir: PathBuf::from("photo_db"),
            temp_upload_dir: PathBuf::from("temp_uploads"),
            port: 3000,
            max_upload_size: 32 * 1024 * 1024, // 32 MB
            recognizer: "deepface".to_string(),
            face_engine_url: "http://127.0.0.1:5005".to_string(),
            face_engine_timeout_ms: 60_000,
            bucket_sync_enabled: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            photo_db_dir: env::var("PHOTO_DB_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.photo_db_dir),

            temp_upload_dir: env::var("TEMP_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.temp_upload_dir),

            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),

            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),

            recognizer: env::var("RECOGNIZER").unwrap_or(default.recognizer),

            face_engine_url: env::var("FACE_ENGINE_URL").unwrap_or(default.face_engine_url),

            face_engine_timeout_ms: env::var("FACE_ENGINE_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.face_engine_timeout_ms),

            bucket_sync_enabled: env::var("BUCKET_SYNC_ENABLED")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(default.bucket_sync_enabled),
        }
    }

    /// Create config for development (no engine, no bucket sync)
    pub fn development() -> Self {
        Self {
            recognizer: "noop".to_string(),
            bucket_sync_enabled: false,
            ..Self::default()
        }
    }
}
