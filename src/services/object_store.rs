use std::collections::HashMap;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::models::ObjectInfo;

/// Marker object some storage backends keep inside otherwise-empty buckets.
/// It is never a real file and must never get a status row.
pub const EMPTY_FOLDER_PLACEHOLDER: &str = ".emptyFolderPlaceholder";

/// Blob storage seen by the rest of the application. Listing reports
/// everything the backend holds, placeholders included; callers that want
/// real files filter on [`EMPTY_FOLDER_PLACEHOLDER`].
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn list(&self) -> Result<Vec<ObjectInfo>>;

    async fn upload(&self, name: &str, data: Bytes) -> Result<()>;

    async fn download(&self, name: &str) -> Result<Bytes>;

    /// Remove a batch of objects in one call. Names that do not exist are
    /// silently skipped, matching S3 delete semantics.
    async fn remove(&self, names: &[String]) -> Result<()>;
}

/// S3/MinIO-backed store
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list(&self) -> Result<Vec<ObjectInfo>> {
        let mut objects = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut req = self.client.list_objects_v2().bucket(&self.bucket);
            if let Some(token) = &continuation {
                req = req.continuation_token(token);
            }
            let resp = req.send().await?;

            for obj in resp.contents() {
                let name = obj.key().unwrap_or_default().to_string();
                if name.is_empty() {
                    continue;
                }
                objects.push(ObjectInfo {
                    name,
                    size_bytes: obj.size().unwrap_or(0),
                    created_at: obj.last_modified().and_then(|t| {
                        DateTime::<Utc>::from_timestamp(t.secs(), t.subsec_nanos())
                    }),
                });
            }

            if resp.is_truncated() == Some(true) {
                continuation = resp.next_continuation_token().map(str::to_string);
            } else {
                break;
            }
        }

        Ok(objects)
    }

    async fn upload(&self, name: &str, data: Bytes) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(name)
            .content_type(mime::APPLICATION_PDF.as_ref())
            .body(ByteStream::from(data))
            .send()
            .await?;
        Ok(())
    }

    async fn download(&self, name: &str) -> Result<Bytes> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(name)
            .send()
            .await?;
        Ok(resp.body.collect().await?.into_bytes())
    }

    async fn remove(&self, names: &[String]) -> Result<()> {
        let identifiers = names
            .iter()
            .map(|n| Ok(ObjectIdentifier::builder().key(n).build()?))
            .collect::<Result<Vec<_>>>()?;

        let delete = Delete::builder()
            .set_objects(Some(identifiers))
            .quiet(true)
            .build()?;

        self.client
            .delete_objects()
            .bucket(&self.bucket)
            .delete(delete)
            .send()
            .await?;
        Ok(())
    }
}

/// In-memory store for development and tests
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<String, (Bytes, DateTime<Utc>)>>,
}

impl MemoryObjectStore {
    /// Pre-seed the store, e.g. to simulate blobs that arrived out-of-band.
    pub async fn seed(&self, name: &str, data: Bytes) {
        self.objects
            .write()
            .await
            .insert(name.to_string(), (data, Utc::now()));
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn list(&self) -> Result<Vec<ObjectInfo>> {
        let objects = self.objects.read().await;
        let mut infos: Vec<ObjectInfo> = objects
            .iter()
            .map(|(name, (data, created_at))| ObjectInfo {
                name: name.clone(),
                size_bytes: data.len() as i64,
                created_at: Some(*created_at),
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(infos)
    }

    async fn upload(&self, name: &str, data: Bytes) -> Result<()> {
        self.objects
            .write()
            .await
            .insert(name.to_string(), (data, Utc::now()));
        Ok(())
    }

    async fn download(&self, name: &str) -> Result<Bytes> {
        self.objects
            .read()
            .await
            .get(name)
            .map(|(data, _)| data.clone())
            .ok_or_else(|| anyhow!("object not found: {}", name))
    }

    async fn remove(&self, names: &[String]) -> Result<()> {
        let mut objects = self.objects.write().await;
        for name in names {
            objects.remove(name);
        }
        Ok(())
    }
}
