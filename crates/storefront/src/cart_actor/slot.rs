//! Durable key-value slots holding one serialized cart per partition key.

use super::error::SlotError;
use crate::model::{CartItem, PartitionKey};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// A slot backend. `load` returns `Ok(None)` for a key that was never written or was removed.
#[async_trait]
pub trait SlotStore: Send + Sync + 'static {
    async fn load(&self, key: &PartitionKey) -> Result<Option<Vec<CartItem>>, SlotError>;
    async fn save(&self, key: &PartitionKey, items: &[CartItem]) -> Result<(), SlotError>;
    async fn remove(&self, key: &PartitionKey) -> Result<(), SlotError>;
}

fn decode(key: &PartitionKey, bytes: &[u8]) -> Result<Vec<CartItem>, SlotError> {
    serde_json::from_slice(bytes).map_err(|source| SlotError::Malformed {
        key: key.to_string(),
        source,
    })
}

/// One JSON file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileSlotStore {
    dir: PathBuf,
}

impl FileSlotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Uids come from outside, so anything but `[A-Za-z0-9_-]` is replaced before it
    /// reaches the file system.
    pub fn path_for(&self, key: &PartitionKey) -> PathBuf {
        let file: String = key
            .as_str()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

#[async_trait]
impl SlotStore for FileSlotStore {
    async fn load(&self, key: &PartitionKey) -> Result<Option<Vec<CartItem>>, SlotError> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(bytes) => decode(key, &bytes).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, key: &PartitionKey, items: &[CartItem]) -> Result<(), SlotError> {
        let bytes = serde_json::to_vec_pretty(items).map_err(SlotError::Encode)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(key);
        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, bytes).await?;
        tokio::fs::rename(&staging, &path).await?;
        debug!(%key, path = %path.display(), "Slot written");
        Ok(())
    }

    async fn remove(&self, key: &PartitionKey) -> Result<(), SlotError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory slots, stored as JSON text like the file backend.
///
/// Clones share the same slots. `set_offline(true)` makes every operation fail with
/// [`SlotError::Unavailable`].
#[derive(Debug, Clone, Default)]
pub struct MemorySlotStore {
    slots: Arc<Mutex<HashMap<PartitionKey, String>>>,
    offline: Arc<AtomicBool>,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self, key: &PartitionKey) -> Option<String> {
        self.lock().get(key).cloned()
    }

    pub fn insert_raw(&self, key: PartitionKey, json: impl Into<String>) {
        self.lock().insert(key, json.into());
    }

    pub fn contains(&self, key: &PartitionKey) -> bool {
        self.lock().contains_key(key)
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), SlotError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(SlotError::Unavailable(io::Error::other("slot storage offline")));
        }
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PartitionKey, String>> {
        // A poisoned map is still structurally valid.
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl SlotStore for MemorySlotStore {
    async fn load(&self, key: &PartitionKey) -> Result<Option<Vec<CartItem>>, SlotError> {
        self.check_online()?;
        let raw = self.raw(key);
        raw.map(|json| decode(key, json.as_bytes())).transpose()
    }

    async fn save(&self, key: &PartitionKey, items: &[CartItem]) -> Result<(), SlotError> {
        self.check_online()?;
        let json = serde_json::to_string(items).map_err(SlotError::Encode)?;
        self.lock().insert(key.clone(), json);
        Ok(())
    }

    async fn remove(&self, key: &PartitionKey) -> Result<(), SlotError> {
        self.check_online()?;
        self.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Product, UserId};
    use rust_decimal::Decimal;

    fn items() -> Vec<CartItem> {
        vec![CartItem::from_product(Product::new(
            "p1",
            "Mug",
            Decimal::new(1250, 2),
        ))]
    }

    #[tokio::test]
    async fn test_file_store_save_load_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSlotStore::new(dir.path().join("carts"));
        let key = PartitionKey::for_user(&UserId::new("u1"));

        assert!(store.load(&key).await.unwrap().is_none());

        store.save(&key, &items()).await.unwrap();
        assert_eq!(store.load(&key).await.unwrap(), Some(items()));
        assert!(store.path_for(&key).exists());

        store.remove(&key).await.unwrap();
        assert!(store.load(&key).await.unwrap().is_none());
        store.remove(&key).await.unwrap();
    }

    #[tokio::test]
    async fn test_file_store_reports_corrupt_slot() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSlotStore::new(dir.path());
        let key = PartitionKey::guest();
        std::fs::write(store.path_for(&key), b"{not json").unwrap();

        let err = store.load(&key).await.unwrap_err();
        assert!(matches!(err, SlotError::Malformed { key, .. } if key == "cart_guest"));
    }

    #[test]
    fn test_file_names_are_sanitized() {
        let store = FileSlotStore::new("/carts");
        let key = PartitionKey::for_user(&UserId::new("../etc/passwd"));
        assert_eq!(store.path_for(&key), PathBuf::from("/carts/cart____etc_passwd.json"));
    }

    #[tokio::test]
    async fn test_memory_store_offline() {
        let store = MemorySlotStore::new();
        let key = PartitionKey::guest();
        store.save(&key, &items()).await.unwrap();

        store.set_offline(true);
        assert!(matches!(store.load(&key).await, Err(SlotError::Unavailable(_))));
        assert!(store.save(&key, &[]).await.is_err());

        store.set_offline(false);
        assert_eq!(store.load(&key).await.unwrap(), Some(items()));
    }
}
