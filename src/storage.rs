use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use tracing::debug;

/// Public file storage for avatars.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Moves `src` into storage under `key` and returns its public URL path.
    async fn put_file(&self, src: &Path, key: &str) -> anyhow::Result<String>;
    async fn delete_object(&self, key: &str) -> anyhow::Result<()>;
    /// Storage key for a URL previously returned by `put_file`.
    fn key_for_url<'a>(&self, url: &'a str) -> Option<&'a str>;
}

/// Directory served under a fixed URL prefix.
#[derive(Clone)]
pub struct LocalStorage {
    root: PathBuf,
    url_prefix: String,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>, url_prefix: &str) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.trim_matches('/').to_string(),
        }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl StorageClient for LocalStorage {
    async fn put_file(&self, src: &Path, key: &str) -> anyhow::Result<String> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("create {}", self.root.display()))?;
        let dest = self.path_for(key);

        if tokio::fs::rename(src, &dest).await.is_err() {
            // rename cannot cross filesystems
            tokio::fs::copy(src, &dest)
                .await
                .with_context(|| format!("copy {} -> {}", src.display(), dest.display()))?;
            tokio::fs::remove_file(src)
                .await
                .with_context(|| format!("remove {}", src.display()))?;
        }

        debug!(key, "stored file");
        Ok(format!("{}/{}", self.url_prefix, key))
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        tokio::fs::remove_file(self.path_for(key))
            .await
            .with_context(|| format!("delete {}", key))?;
        Ok(())
    }

    fn key_for_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(self.url_prefix.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|key| !key.is_empty() && !key.contains('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_file_moves_and_returns_url() {
        let tmp = tempfile::tempdir().unwrap();
        let public = tempfile::tempdir().unwrap();
        let src = tmp.path().join("upload.png");
        tokio::fs::write(&src, b"bytes").await.unwrap();

        let storage = LocalStorage::new(public.path(), "avatars");
        let url = storage.put_file(&src, "u1_upload.png").await.unwrap();

        assert_eq!(url, "avatars/u1_upload.png");
        assert!(!src.exists());
        assert_eq!(
            tokio::fs::read(public.path().join("u1_upload.png")).await.unwrap(),
            b"bytes"
        );
    }

    #[tokio::test]
    async fn delete_object_removes_file() {
        let public = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(public.path(), "avatars");
        tokio::fs::write(public.path().join("k.jpg"), b"x").await.unwrap();

        storage.delete_object("k.jpg").await.unwrap();
        assert!(!public.path().join("k.jpg").exists());
        assert!(storage.delete_object("k.jpg").await.is_err());
    }

    #[test]
    fn key_for_url_only_matches_own_prefix() {
        let storage = LocalStorage::new("public/avatars", "/avatars/");
        assert_eq!(storage.key_for_url("avatars/u1_a.png"), Some("u1_a.png"));
        assert_eq!(storage.key_for_url("https://www.gravatar.com/avatar/abc"), None);
        assert_eq!(storage.key_for_url("avatars/"), None);
        assert_eq!(storage.key_for_url("avatars/../etc"), None);
    }
}
