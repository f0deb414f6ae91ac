use std::env;
use std::sync::Arc;

use aws_sdk_s3::config::Region;
use tracing::info;

use crate::services::object_store::{MemoryObjectStore, ObjectStore, S3ObjectStore};

pub async fn setup_storage() -> Arc<dyn ObjectStore> {
    if env::var("STORAGE_BACKEND").as_deref() == Ok("memory") {
        tracing::warn!("💾 MemoryObjectStore: nothing persists across restarts (development mode)");
        return Arc::new(MemoryObjectStore::default());
    }

    // Setup S3 client
    let endpoint_url = env::var("MINIO_ENDPOINT").expect("MINIO_ENDPOINT must be set");
    let access_key = env::var("MINIO_ACCESS_KEY").expect("MINIO_ACCESS_KEY must be set");
    let secret_key = env::var("MINIO_SECRET_KEY").expect("MINIO_SECRET_KEY must be set");
    let bucket = env::var("MINIO_BUCKET").expect("MINIO_BUCKET must be set");

    info!("☁️  S3 Storage: {} (Bucket: {})", endpoint_url, bucket);

    let aws_config = aws_config::from_env()
        .endpoint_url(&endpoint_url)
        .region(Region::new("us-east-1"))
        .credentials_provider(aws_sdk_s3::config::Credentials::new(
            access_key, secret_key, None, None, "static",
        ))
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(true)
        .build();

    let s3_client = aws_sdk_s3::Client::from_conf(s3_config);
    Arc::new(S3ObjectStore::new(s3_client, bucket))
}
