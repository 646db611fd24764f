use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use aws_sdk_s3::{error::DisplayErrorContext, primitives::ByteStream};

use crate::config::StorageConfig;

/// Object-storage collaborator for uploaded images.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Stores the object and returns its public URL.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> anyhow::Result<String>;

    async fn delete(&self, key: &str) -> anyhow::Result<()>;

    /// Recovers the object key from a URL previously returned by `put`.
    fn key_from_url(&self, url: &str) -> Option<String>;
}

pub async fn from_config(config: &StorageConfig) -> anyhow::Result<Arc<dyn ImageStore>> {
    let store: Arc<dyn ImageStore> = match config {
        StorageConfig::S3 {
            bucket,
            region,
            public_base_url,
        } => Arc::new(
            S3ImageStore::connect(bucket.clone(), region.clone(), public_base_url.clone()).await,
        ),
        StorageConfig::Local {
            dir,
            public_base_url,
        } => {
            tokio::fs::create_dir_all(dir).await?;
            Arc::new(LocalImageStore::new(
                dir,
                format!("{}/uploads", public_base_url.trim_end_matches('/')),
            ))
        }
    };
    Ok(store)
}

pub struct S3ImageStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base_url: String,
}

impl S3ImageStore {
    pub async fn connect(bucket: String, region: String, public_base_url: Option<String>) -> Self {
        let public_base_url = public_base_url
            .unwrap_or_else(|| format!("https://{bucket}.s3.{region}.amazonaws.com"))
            .trim_end_matches('/')
            .to_string();
        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new(region))
            .load()
            .await;
        Self {
            client: aws_sdk_s3::Client::new(&shared),
            bucket,
            public_base_url,
        }
    }
}

#[async_trait]
impl ImageStore for S3ImageStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> anyhow::Result<String> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|err| anyhow::anyhow!("s3 put_object failed: {}", DisplayErrorContext(&err)))?;
        Ok(format!("{}/{key}", self.public_base_url))
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                anyhow::anyhow!("s3 delete_object failed: {}", DisplayErrorContext(&err))
            })?;
        Ok(())
    }

    fn key_from_url(&self, url: &str) -> Option<String> {
        key_under_base(&self.public_base_url, url)
    }
}

/// Writes images below a directory that the router serves at `/uploads`.
pub struct LocalImageStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> anyhow::Result<String> {
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        Ok(format!("{}/{key}", self.public_base_url))
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        tokio::fs::remove_file(self.root.join(key)).await?;
        Ok(())
    }

    fn key_from_url(&self, url: &str) -> Option<String> {
        key_under_base(&self.public_base_url, url)
    }
}

/// Only URLs below `base` map to a key; anything else is foreign to the store.
fn key_under_base(base: &str, raw: &str) -> Option<String> {
    let base = url::Url::parse(base).ok()?;
    let url = url::Url::parse(raw).ok()?;
    if url.scheme() != base.scheme() || url.host_str() != base.host_str() || url.port() != base.port()
    {
        return None;
    }

    let prefix = base.path().trim_end_matches('/');
    let rest = url.path().strip_prefix(prefix)?;
    let key = rest.strip_prefix('/')?;
    if key.is_empty() || key.split('/').any(|segment| segment == ".." || segment.is_empty()) {
        return None;
    }
    Some(key.to_string())
}

#[cfg(test)]
mod tests {
    use super::{ImageStore, LocalImageStore, key_under_base};

    #[test]
    fn derives_key_from_bucket_url() {
        assert_eq!(
            key_under_base(
                "https://bucket.s3.us-east-1.amazonaws.com",
                "https://bucket.s3.us-east-1.amazonaws.com/images/abc.png"
            ),
            Some("images/abc.png".to_string())
        );
    }

    #[test]
    fn derives_key_below_path_prefix() {
        assert_eq!(
            key_under_base(
                "http://localhost:3000/uploads",
                "http://localhost:3000/uploads/categories/x.webp"
            ),
            Some("categories/x.webp".to_string())
        );
    }

    #[test]
    fn rejects_foreign_and_malformed_urls() {
        let base = "http://localhost:3000/uploads";
        assert_eq!(key_under_base(base, "http://evil.test/uploads/a.png"), None);
        assert_eq!(key_under_base(base, "http://localhost:3000/other/a.png"), None);
        assert_eq!(key_under_base(base, "not a url"), None);
        assert_eq!(key_under_base(base, "http://localhost:3000/uploads/"), None);
        assert_eq!(key_under_base(base, "http://localhost:3000/uploadsX/a.png"), None);
    }

    #[tokio::test]
    async fn local_store_writes_and_removes_files() {
        let root = std::env::temp_dir().join(format!("menu-admin-{}", uuid::Uuid::new_v4()));
        let store = LocalImageStore::new(&root, "http://localhost:3000/uploads/");

        let url = store
            .put("images/a.png", vec![1, 2, 3], "image/png")
            .await
            .unwrap();
        assert_eq!(url, "http://localhost:3000/uploads/images/a.png");
        assert_eq!(tokio::fs::read(root.join("images/a.png")).await.unwrap(), [1, 2, 3]);

        let key = store.key_from_url(&url).unwrap();
        store.delete(&key).await.unwrap();
        assert!(!root.join("images/a.png").exists());
        assert!(store.delete(&key).await.is_err());

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }
}
