use crate::services::object_store::S3ObjectStore;
use aws_sdk_s3::config::Region;
use std::env;
use std::sync::Arc;
use tracing::info;

pub async fn setup_object_store() -> Arc<S3ObjectStore> {
    // Setup S3 client, read-only against the photo bucket
    let bucket = env::var("PHOTO_BUCKET").expect("PHOTO_BUCKET must be set");
    let region = env::var("PHOTO_BUCKET_REGION").expect("PHOTO_BUCKET_REGION must be set");
    let access_key = env::var("PHOTO_BUCKET_ACCESS_KEY").expect("PHOTO_BUCKET_ACCESS_KEY must be set");
    let secret_key = env::var("PHOTO_BUCKET_SECRET_KEY").expect("PHOTO_BUCKET_SECRET_KEY must be set");

    info!("☁️  Photo bucket: {} ({})", bucket, region);

    let mut loader = aws_config::from_env()
        .region(Region::new(region))
        .credentials_provider(aws_sdk_s3::config::Credentials::new(
            access_key, secret_key, None, None, "static",
        ));

    // MinIO-compatible stores need an explicit endpoint
    if let Ok(endpoint_url) = env::var("PHOTO_BUCKET_ENDPOINT") {
        loader = loader.endpoint_url(endpoint_url);
    }

    let aws_config = loader.load().await;

    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(true)
        .build();

    let s3_client = aws_sdk_s3::Client::from_conf(s3_config);
    Arc::new(S3ObjectStore::new(s3_client, bucket))
}
