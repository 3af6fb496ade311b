//! Where uploaded documents and the extracted questions live.

mod bucket;
mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

#[cfg(target_arch = "wasm32")]
mod web;

pub use bucket::HttpBucketStore;
pub use memory::{MemorySession, MemoryStore};

#[cfg(not(target_arch = "wasm32"))]
pub use file::{DirectoryStore, FileSession};

#[cfg(target_arch = "wasm32")]
pub use web::WebSession;

use crate::config::ServiceConfig;
use crate::question::QuestionSet;
use crate::services::ServiceError;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

/// Key under which the extracted questions are handed to the whiteboard page.
pub const SESSION_KEY: &str = "prorev.questions";

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Storage API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Storage error: {0}")]
    Other(String),
}

impl From<ServiceError> for StorageError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Http(e) => StorageError::Http(e),
            ServiceError::Api { status, message } => StorageError::Api { status, message },
            ServiceError::Parse(msg) => StorageError::Serialization(msg),
            other => StorageError::Other(other.to_string()),
        }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations. Native futures must be `Send` so they
/// can run on the tokio runtime; WASM is single-threaded.
#[cfg(not(target_arch = "wasm32"))]
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[cfg(target_arch = "wasm32")]
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// A stored document and where it can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub name: String,
    pub url: String,
}

/// A bucket of uploaded homework documents.
///
/// Uploading an existing name replaces it. After `upload` returns,
/// `public_url` and `list` reflect the new content.
#[cfg(not(target_arch = "wasm32"))]
pub trait DocumentStore: Send + Sync {
    fn upload<'a>(&'a self, name: &'a str, bytes: Vec<u8>, mime: &'a str)
        -> BoxFuture<'a, StorageResult<UploadedFile>>;

    fn public_url(&self, name: &str) -> StorageResult<String>;

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<UploadedFile>>>;

    fn remove<'a>(&'a self, name: &'a str) -> BoxFuture<'a, StorageResult<()>>;
}

/// A bucket of uploaded homework documents (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait DocumentStore {
    fn upload<'a>(&'a self, name: &'a str, bytes: Vec<u8>, mime: &'a str)
        -> BoxFuture<'a, StorageResult<UploadedFile>>;

    fn public_url(&self, name: &str) -> StorageResult<String>;

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<UploadedFile>>>;

    fn remove<'a>(&'a self, name: &'a str) -> BoxFuture<'a, StorageResult<()>>;
}

/// Hands the extracted questions from the upload page to the whiteboard.
pub trait SessionStore {
    fn save_questions(&self, questions: &QuestionSet) -> StorageResult<()>;

    /// `Ok(None)` when nothing was handed off.
    fn load_questions(&self) -> StorageResult<Option<QuestionSet>>;

    fn clear(&self) -> StorageResult<()>;
}

/// Uploads shown on the upload page, in upload order, unique by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadList {
    files: Vec<UploadedFile>,
}

impl UploadList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, replacing an entry with the same name in place.
    pub fn upsert(&mut self, file: UploadedFile) {
        match self.files.iter_mut().find(|f| f.name == file.name) {
            Some(existing) => *existing = file,
            None => self.files.push(file),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<UploadedFile> {
        let index = self.files.iter().position(|f| f.name == name)?;
        Some(self.files.remove(index))
    }

    pub fn get(&self, name: &str) -> Option<&UploadedFile> {
        self.files.iter().find(|f| f.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &UploadedFile> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Platform-specific document store.
pub type PlatformStore = Arc<dyn DocumentStore>;

/// Platform-specific session hand-off.
#[cfg(not(target_arch = "wasm32"))]
pub type PlatformSession = FileSession;

#[cfg(target_arch = "wasm32")]
pub type PlatformSession = WebSession;

/// The configured bucket, or a local stand-in when no storage URL is set.
pub fn create_default_store(config: &ServiceConfig, client: reqwest::Client) -> StorageResult<PlatformStore> {
    if let Some(base) = &config.storage_base {
        log::info!("Using storage bucket {} at {}", config.bucket, base);
        return Ok(Arc::new(HttpBucketStore::new(
            client,
            base.clone(),
            config.bucket.clone(),
            config.api_key.clone(),
        )
        .with_timeout(config.request_timeout())));
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let store = DirectoryStore::default_location(&config.bucket)?;
        log::info!("No storage URL configured, keeping uploads in {}", store.base_path().display());
        Ok(Arc::new(store))
    }

    #[cfg(target_arch = "wasm32")]
    {
        log::info!("No storage URL configured, keeping uploads in memory");
        Ok(Arc::new(MemoryStore::new(config.bucket.clone())))
    }
}

pub fn create_default_session() -> StorageResult<PlatformSession> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        FileSession::default_location()
    }

    #[cfg(target_arch = "wasm32")]
    {
        Ok(WebSession::new())
    }
}

#[cfg(test)]
pub(crate) fn block_on<F: std::future::Future>(f: F) -> F::Output {
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    fn dummy_raw_waker() -> RawWaker {
        fn no_op(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            dummy_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    let mut f = std::pin::pin!(f);

    loop {
        match f.as_mut().poll(&mut cx) {
            Poll::Ready(result) => return result,
            Poll::Pending => {}
        }
    }
}
