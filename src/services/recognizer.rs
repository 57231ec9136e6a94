use crate::config::AppConfig;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// A reference photo ranked against the probe image by the engine.
#[derive(Debug, Clone, Deserialize)]
pub struct FaceMatch {
    pub identity: String,
    pub distance: f64,
}

/// Seam to the external face-recognition engine. The engine owns detection,
/// embedding and similarity search; this service only hands it paths.
#[async_trait]
pub trait FaceRecognizer: Send + Sync {
    /// Ranks the photos under `db_path` against the probe at `img_path`,
    /// best match first. An empty vec means no candidate was found.
    async fn find(&self, img_path: &Path, db_path: &Path) -> Result<Vec<FaceMatch>>;
}

/// Client for a DeepFace-compatible recognition service that shares this
/// host's filesystem: both paths are passed through and read by the engine
/// directly.
pub struct DeepFaceRecognizer {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct FindRequest<'a> {
    img_path: &'a str,
    db_path: &'a str,
    enforce_detection: bool,
}

#[derive(Deserialize)]
struct FindResponse {
    results: Vec<Vec<FaceMatch>>,
}

impl DeepFaceRecognizer {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build recognition engine client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl FaceRecognizer for DeepFaceRecognizer {
    async fn find(&self, img_path: &Path, db_path: &Path) -> Result<Vec<FaceMatch>> {
        let url = format!("{}/find", self.base_url);
        let request = FindRequest {
            img_path: img_path
                .to_str()
                .ok_or_else(|| anyhow!("non-UTF-8 upload path"))?,
            db_path: db_path
                .to_str()
                .ok_or_else(|| anyhow!("non-UTF-8 reference directory"))?,
            // Relaxed detection: a probe with no confident face is still
            // matched against the corpus instead of erroring out.
            enforce_detection: false,
        };

        tracing::debug!("Engine lookup for {}", request.img_path);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("POST {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("recognition engine returned {}: {}", status, body));
        }

        let parsed: FindResponse = response
            .json()
            .await
            .context("decode recognition engine response")?;

        Ok(first_result_set(parsed))
    }
}

/// The engine returns one result set per face found in the probe image.
/// Only the first set is used; no sets means no matches.
fn first_result_set(response: FindResponse) -> Vec<FaceMatch> {
    response.results.into_iter().next().unwrap_or_default()
}

/// No-op recognizer for development/testing
pub struct NoopRecognizer;

#[async_trait]
impl FaceRecognizer for NoopRecognizer {
    async fn find(&self, _img_path: &Path, _db_path: &Path) -> Result<Vec<FaceMatch>> {
        tracing::warn!("NoopRecognizer: returning no matches (development mode)");
        Ok(Vec::new())
    }
}

/// Factory function to create the appropriate recognizer based on config
pub fn create_recognizer(config: &AppConfig) -> Result<Arc<dyn FaceRecognizer>> {
    match config.recognizer.to_lowercase().as_str() {
        "deepface" => Ok(Arc::new(DeepFaceRecognizer::new(
            config.face_engine_url.clone(),
            Duration::from_millis(config.face_engine_timeout_ms),
        )?)),
        "noop" | "none" | "disabled" => Ok(Arc::new(NoopRecognizer)),
        other => {
            tracing::warn!("Unknown recognizer '{}', using NoopRecognizer", other);
            Ok(Arc::new(NoopRecognizer))
        }
    }
}
