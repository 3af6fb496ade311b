//! In-memory storage implementation.

use super::{BoxFuture, DocumentStore, SessionStore, StorageError, StorageResult, UploadedFile};
use crate::question::QuestionSet;
use std::collections::BTreeMap;
use std::sync::RwLock;

#[derive(Debug, Clone)]
struct StoredObject {
    mime: String,
    bytes: Vec<u8>,
}

/// In-memory bucket for testing and for running without a storage service.
pub struct MemoryStore {
    bucket: String,
    objects: RwLock<BTreeMap<String, StoredObject>>,
}

impl MemoryStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: RwLock::new(BTreeMap::new()),
        }
    }

    /// Bytes and MIME type of a stored object.
    pub fn get(&self, name: &str) -> StorageResult<(Vec<u8>, String)> {
        let objects = self
            .objects
            .read()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
        objects
            .get(name)
            .map(|o| (o.bytes.clone(), o.mime.clone()))
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }

    fn url_for(&self, name: &str) -> String {
        format!("memory://{}/{}", self.bucket, name)
    }
}

impl DocumentStore for MemoryStore {
    fn upload<'a>(
        &'a self,
        name: &'a str,
        bytes: Vec<u8>,
        mime: &'a str,
    ) -> BoxFuture<'a, StorageResult<UploadedFile>> {
        Box::pin(async move {
            let mut objects = self
                .objects
                .write()
                .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
            objects.insert(name.to_string(), StoredObject { mime: mime.to_string(), bytes });
            Ok(UploadedFile { name: name.to_string(), url: self.url_for(name) })
        })
    }

    fn public_url(&self, name: &str) -> StorageResult<String> {
        Ok(self.url_for(name))
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<UploadedFile>>> {
        Box::pin(async move {
            let objects = self
                .objects
                .read()
                .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
            Ok(objects
                .keys()
                .map(|name| UploadedFile { name: name.clone(), url: self.url_for(name) })
                .collect())
        })
    }

    fn remove<'a>(&'a self, name: &'a str) -> BoxFuture<'a, StorageResult<()>> {
        Box::pin(async move {
            let mut objects = self
                .objects
                .write()
                .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
            objects.remove(name);
            Ok(())
        })
    }
}

/// Session hand-off held in memory.
#[derive(Default)]
pub struct MemorySession {
    json: RwLock<Option<String>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySession {
    fn save_questions(&self, questions: &QuestionSet) -> StorageResult<()> {
        let json = questions
            .to_json()
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        *self
            .json
            .write()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))? = Some(json);
        Ok(())
    }

    fn load_questions(&self) -> StorageResult<Option<QuestionSet>> {
        let json = self
            .json
            .read()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
        json.as_deref()
            .map(QuestionSet::from_json)
            .transpose()
            .map_err(|e| StorageError::Serialization(e.to_string()))
    }

    fn clear(&self) -> StorageResult<()> {
        *self
            .json
            .write()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))? = None;
        Ok(())
    }
}
