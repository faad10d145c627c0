use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use uuid::Uuid;

/// Blob storage for uploaded files, addressed by `/`-separated keys.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, body: Bytes) -> anyhow::Result<()>;
    async fn delete(&self, key: &str) -> anyhow::Result<()>;
}

/// Stores objects under a root directory on the local filesystem.
///
/// `put` writes the body to a temporary file first and renames it into place,
/// so a key either resolves to the complete object or does not exist; the
/// temporary file is removed if publishing fails.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn put(&self, key: &str, body: Bytes) -> anyhow::Result<()> {
        let target = self.resolve(key);
        let parent = target.parent().unwrap_or_else(|| self.root.as_path());
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("create dir for {}", key))?;

        // temp file lives next to the target so the rename stays on one
        // filesystem and is atomic
        let tmp = parent.join(format!(".tmp-{}", Uuid::new_v4()));
        if let Err(e) = fs::write(&tmp, &body).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(anyhow::Error::new(e).context(format!("write temp for {}", key)));
        }
        if let Err(e) = fs::rename(&tmp, &target).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(anyhow::Error::new(e).context(format!("publish {}", key)));
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        let target = self.resolve(key);
        match fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(anyhow::Error::new(e).context(format!("delete {}", key))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn scratch_root() -> PathBuf {
        std::env::temp_dir().join(format!("campus-store-{}", Uuid::new_v4()))
    }

    async fn temp_files_in(dir: &Path) -> usize {
        let mut count = 0;
        let mut entries = fs::read_dir(dir).await.expect("read dir");
        while let Some(entry) = entries.next_entry().await.expect("next entry") {
            if entry
                .file_name()
                .to_string_lossy()
                .starts_with(".tmp-")
            {
                count += 1;
            }
        }
        count
    }

    #[tokio::test]
    async fn put_publishes_complete_object_under_key() {
        let root = scratch_root();
        let store = LocalStore::new(&root);

        store
            .put("students/1/pic.png", Bytes::from_static(b"image-bytes"))
            .await
            .expect("put");

        let data = fs::read(root.join("students/1/pic.png")).await.expect("read");
        assert_eq!(data, b"image-bytes");
        assert_eq!(temp_files_in(&root.join("students/1")).await, 0);

        fs::remove_dir_all(&root).await.expect("cleanup");
    }

    #[tokio::test]
    async fn put_overwrites_existing_object() {
        let root = scratch_root();
        let store = LocalStore::new(&root);

        store.put("a/b.bin", Bytes::from_static(b"one")).await.expect("put");
        store.put("a/b.bin", Bytes::from_static(b"two")).await.expect("put again");

        let data = fs::read(root.join("a/b.bin")).await.expect("read");
        assert_eq!(data, b"two");

        fs::remove_dir_all(&root).await.expect("cleanup");
    }

    #[tokio::test]
    async fn delete_removes_object_and_tolerates_absence() {
        let root = scratch_root();
        let store = LocalStore::new(&root);

        store.put("x/y.jpg", Bytes::from_static(b"z")).await.expect("put");
        store.delete("x/y.jpg").await.expect("delete");
        assert!(fs::metadata(root.join("x/y.jpg")).await.is_err());

        // deleting a missing key is not an error
        store.delete("x/y.jpg").await.expect("delete missing");

        fs::remove_dir_all(&root).await.expect("cleanup");
    }
}
