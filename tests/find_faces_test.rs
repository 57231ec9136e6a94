use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use face_search_backend::config::AppConfig;
use face_search_backend::services::mirror::PhotoMirror;
use face_search_backend::services::object_store::ObjectStore;
use face_search_backend::services::recognizer::{FaceMatch, FaceRecognizer};
use face_search_backend::services::uploads::TempUploadStore;
use face_search_backend::{AppState, create_app};
use http_body_util::BodyExt;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use tower::ServiceExt;

/// Recognizer double returning a fixed ranking and counting invocations.
struct StaticRecognizer {
    identities: Vec<&'static str>,
    calls: AtomicUsize,
}

impl StaticRecognizer {
    fn new(identities: Vec<&'static str>) -> Arc<Self> {
        Arc::new(Self {
            identities,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait::async_trait]
impl FaceRecognizer for StaticRecognizer {
    async fn find(&self, img_path: &Path, _db_path: &Path) -> anyhow::Result<Vec<FaceMatch>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // The probe must still be on disk while the engine runs.
        assert!(img_path.exists());
        Ok(self
            .identities
            .iter()
            .enumerate()
            .map(|(i, identity)| FaceMatch {
                identity: identity.to_string(),
                distance: 0.2 + i as f64 * 0.1,
            })
            .collect())
    }
}

struct FailingRecognizer;

#[async_trait::async_trait]
impl FaceRecognizer for FailingRecognizer {
    async fn find(&self, _img_path: &Path, _db_path: &Path) -> anyhow::Result<Vec<FaceMatch>> {
        Err(anyhow::anyhow!("engine offline"))
    }
}

struct StaticObjectStore {
    objects: Vec<(String, Vec<u8>)>,
}

#[async_trait::async_trait]
impl ObjectStore for StaticObjectStore {
    async fn list_objects(&self, _prefix: &str) -> anyhow::Result<Vec<String>> {
        Ok(self.objects.iter().map(|(k, _)| k.clone()).collect())
    }

    async fn get_file(&self, key: &str) -> anyhow::Result<Vec<u8>> {
        self.objects
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| anyhow::anyhow!("no such key: {}", key))
    }
}

struct FailingObjectStore;

#[async_trait::async_trait]
impl ObjectStore for FailingObjectStore {
    async fn list_objects(&self, _prefix: &str) -> anyhow::Result<Vec<String>> {
        Err(anyhow::anyhow!("bucket unreachable"))
    }

    async fn get_file(&self, _key: &str) -> anyhow::Result<Vec<u8>> {
        Err(anyhow::anyhow!("bucket unreachable"))
    }
}

struct TestHarness {
    state: AppState,
    photo_db: TempDir,
    scratch: TempDir,
}

fn harness(
    recognizer: Arc<dyn FaceRecognizer>,
    object_store: Option<Arc<dyn ObjectStore>>,
) -> TestHarness {
    let photo_db = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();

    let mut config = AppConfig::development();
    config.photo_db_dir = photo_db.path().to_path_buf();
    config.temp_upload_dir = scratch.path().to_path_buf();

    let mirror =
        object_store.map(|store| Arc::new(PhotoMirror::new(store, photo_db.path())));

    let state = AppState {
        config,
        recognizer,
        uploads: TempUploadStore::new(scratch.path()),
        mirror,
    };

    TestHarness {
        state,
        photo_db,
        scratch,
    }
}

const BOUNDARY: &str = "---------------------------123456789012345678901234567";

fn multipart_request(field_name: &str) -> Request<Body> {
    let body = format!(
        "--{boundary}\r\n\
        Content-Disposition: form-data; name=\"{field}\"; filename=\"selfie.jpg\"\r\n\
        Content-Type: image/jpeg\r\n\r\n\
        not really jpeg bytes\r\n\
        --{boundary}--\r\n",
        boundary = BOUNDARY,
        field = field_name
    );

    Request::builder()
        .method("POST")
        .uri("/find_faces/")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn scratch_is_empty(harness: &TestHarness) -> bool {
    std::fs::read_dir(harness.scratch.path()).unwrap().count() == 0
}

#[tokio::test]
async fn returns_matched_identities_in_order() {
    let recognizer = StaticRecognizer::new(vec!["photo_db/alice.jpg", "photo_db/bob.jpg"]);
    let harness = harness(recognizer.clone(), None);
    let app = create_app(harness.state.clone());

    let response = app.oneshot(multipart_request("file")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        json["matches"],
        serde_json::json!(["photo_db/alice.jpg", "photo_db/bob.jpg"])
    );

    assert_eq!(recognizer.calls.load(Ordering::SeqCst), 1);
    assert!(scratch_is_empty(&harness));
}

#[tokio::test]
async fn empty_match_list_when_no_candidates() {
    let harness = harness(StaticRecognizer::new(vec![]), None);
    let app = create_app(harness.state.clone());

    let response = app.oneshot(multipart_request("file")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["matches"], serde_json::json!([]));
    assert!(scratch_is_empty(&harness));
}

#[tokio::test]
async fn missing_file_field_is_bad_request() {
    let recognizer = StaticRecognizer::new(vec!["photo_db/alice.jpg"]);
    let harness = harness(recognizer.clone(), None);
    let app = create_app(harness.state.clone());

    let response = app.oneshot(multipart_request("avatar")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "No file provided");

    assert_eq!(recognizer.calls.load(Ordering::SeqCst), 0);
    assert!(scratch_is_empty(&harness));
}

#[tokio::test]
async fn engine_failure_maps_to_server_error() {
    let harness = harness(Arc::new(FailingRecognizer), None);
    let app = create_app(harness.state.clone());

    let response = app.oneshot(multipart_request("file")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert!(
        json["error"].as_str().unwrap().contains("engine offline"),
        "unexpected error payload: {}",
        json
    );

    // Cleanup is guaranteed on the failure path too.
    assert!(scratch_is_empty(&harness));
}

#[tokio::test]
async fn sync_failure_short_circuits_the_search() {
    let recognizer = StaticRecognizer::new(vec!["photo_db/alice.jpg"]);
    let harness = harness(recognizer.clone(), Some(Arc::new(FailingObjectStore)));
    let app = create_app(harness.state.clone());

    let response = app.oneshot(multipart_request("file")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert!(
        json["error"].as_str().unwrap().contains("list photo bucket"),
        "unexpected error payload: {}",
        json
    );

    assert_eq!(recognizer.calls.load(Ordering::SeqCst), 0);
    assert!(scratch_is_empty(&harness));
}

#[tokio::test]
async fn sync_refreshes_the_reference_dir_before_searching() {
    let store = Arc::new(StaticObjectStore {
        objects: vec![("events/carol.jpg".to_string(), b"c".to_vec())],
    });
    let harness = harness(StaticRecognizer::new(vec![]), Some(store));
    let app = create_app(harness.state.clone());

    let response = app.oneshot(multipart_request("file")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        std::fs::read(harness.photo_db.path().join("carol.jpg")).unwrap(),
        b"c"
    );
    assert!(scratch_is_empty(&harness));
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let harness = harness(StaticRecognizer::new(vec![]), None);
    let app = create_app(harness.state.clone());

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
}
