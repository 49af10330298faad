use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use super::{ObjectInfo, ObjectStore, StorageError, StoredObject};

#[derive(Debug, Clone)]
struct Entry {
    body: Vec<u8>,
    content_type: String,
    last_modified: DateTime<Utc>,
}

/// In-process object store for tests. Keys listed in lexical order.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, Entry>>,
    failing_keys: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_with_modified(&self, key: &str, body: &[u8], last_modified: DateTime<Utc>) {
        self.objects.lock().unwrap().insert(
            key.to_string(),
            Entry {
                body: body.to_vec(),
                content_type: "text/plain".to_string(),
                last_modified,
            },
        );
    }

    /// Makes every put/delete on `key` fail.
    pub fn fail_on(&self, key: &str) {
        self.failing_keys.lock().unwrap().push(key.to_string());
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn content_type_of(&self, key: &str) -> Option<String> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|e| e.content_type.clone())
    }

    fn check(&self, key: &str) -> Result<(), StorageError> {
        if self.failing_keys.lock().unwrap().iter().any(|k| k == key) {
            return Err(StorageError::Backend(format!("injected failure for {key}")));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn bucket(&self) -> &str {
        "test-bucket"
    }

    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), StorageError> {
        self.check(key)?;
        self.objects.lock().unwrap().insert(
            key.to_string(),
            Entry {
                body,
                content_type: content_type.to_string(),
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<StoredObject, StorageError> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|e| StoredObject {
                body: Bytes::from(e.body.clone()),
                content_type: Some(e.content_type.clone()),
            })
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, StorageError> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, e)| ObjectInfo {
                key: k.clone(),
                size: e.body.len() as u64,
                last_modified: e.last_modified,
            })
            .collect())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.check(key)?;
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}
