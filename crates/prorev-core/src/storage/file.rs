//! Local directory storage for native platforms.

use super::{BoxFuture, DocumentStore, SessionStore, StorageError, StorageResult, UploadedFile};
use crate::question::QuestionSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Root of all ProRev data: `~/.local/share/prorev` on Linux,
/// `%LOCALAPPDATA%\prorev` on Windows.
fn data_root() -> StorageResult<PathBuf> {
    let base = dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;
    Ok(base.join("prorev"))
}

/// A local directory standing in for the storage bucket.
pub struct DirectoryStore {
    base_path: PathBuf,
}

impl DirectoryStore {
    /// Use `base_path`, creating it if it doesn't exist.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// `<data dir>/prorev/<bucket>/`
    pub fn default_location(bucket: &str) -> StorageResult<Self> {
        Self::new(data_root()?.join(sanitize(bucket)))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn object_path(&self, name: &str) -> PathBuf {
        self.base_path.join(sanitize(name))
    }

    fn url_for(path: &Path) -> String {
        format!("file://{}", path.display())
    }
}

/// Keep names safe for the filesystem while preserving the extension.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect::<String>()
        .trim_start_matches('.')
        .to_string()
}

impl DocumentStore for DirectoryStore {
    fn upload<'a>(
        &'a self,
        name: &'a str,
        bytes: Vec<u8>,
        _mime: &'a str,
    ) -> BoxFuture<'a, StorageResult<UploadedFile>> {
        let path = self.object_path(name);
        Box::pin(async move {
            fs::write(&path, bytes).map_err(|e| {
                StorageError::Io(format!("Failed to write {}: {}", path.display(), e))
            })?;
            Ok(UploadedFile { name: name.to_string(), url: Self::url_for(&path) })
        })
    }

    fn public_url(&self, name: &str) -> StorageResult<String> {
        Ok(Self::url_for(&self.object_path(name)))
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<UploadedFile>>> {
        let base = self.base_path.clone();
        Box::pin(async move {
            if !base.exists() {
                return Ok(vec![]);
            }
            let entries = fs::read_dir(&base)
                .map_err(|e| StorageError::Io(format!("Failed to read directory: {}", e)))?;

            let mut files: Vec<UploadedFile> = entries
                .flatten()
                .filter(|entry| entry.path().is_file())
                .filter_map(|entry| {
                    let path = entry.path();
                    let name = path.file_name()?.to_str()?.to_string();
                    Some(UploadedFile { name, url: Self::url_for(&path) })
                })
                .collect();
            files.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(files)
        })
    }

    fn remove<'a>(&'a self, name: &'a str) -> BoxFuture<'a, StorageResult<()>> {
        let path = self.object_path(name);
        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    StorageError::Io(format!("Failed to delete {}: {}", path.display(), e))
                })?;
            }
            Ok(())
        })
    }
}

/// Session hand-off kept in a JSON file.
pub struct FileSession {
    path: PathBuf,
}

impl FileSession {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// `<data dir>/prorev/session.json`
    pub fn default_location() -> StorageResult<Self> {
        Ok(Self::new(data_root()?.join("session.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSession {
    fn save_questions(&self, questions: &QuestionSet) -> StorageResult<()> {
        let json = questions
            .to_json()
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| StorageError::Io(format!("Failed to create {}: {}", parent.display(), e)))?;
        }
        fs::write(&self.path, json)
            .map_err(|e| StorageError::Io(format!("Failed to write {}: {}", self.path.display(), e)))
    }

    fn load_questions(&self) -> StorageResult<Option<QuestionSet>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&self.path)
            .map_err(|e| StorageError::Io(format!("Failed to read {}: {}", self.path.display(), e)))?;
        QuestionSet::from_json(&json).map(Some).map_err(|e| {
            StorageError::Serialization(format!("Failed to parse {}: {}", self.path.display(), e))
        })
    }

    fn clear(&self) -> StorageResult<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| {
                StorageError::Io(format!("Failed to delete {}: {}", self.path.display(), e))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::block_on;
    use tempfile::tempdir;

    #[test]
    fn test_directory_upload_twice_keeps_second() {
        let dir = tempdir().unwrap();
        let store = DirectoryStore::new(dir.path().join("PDFBucket")).unwrap();

        block_on(store.upload("hw.png", b"first".to_vec(), "image/png")).unwrap();
        let file = block_on(store.upload("hw.png", b"second".to_vec(), "image/png")).unwrap();

        let list = block_on(store.list()).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0], file);
        assert_eq!(fs::read(store.base_path().join("hw.png")).unwrap(), b"second");
        assert!(file.url.starts_with("file://"));
        assert_eq!(store.public_url("hw.png").unwrap(), file.url);
    }

    #[test]
    fn test_directory_remove() {
        let dir = tempdir().unwrap();
        let store = DirectoryStore::new(dir.path().to_path_buf()).unwrap();
        block_on(store.upload("a.pdf", vec![0], "application/pdf")).unwrap();
        block_on(store.remove("a.pdf")).unwrap();
        block_on(store.remove("a.pdf")).unwrap();
        assert!(block_on(store.list()).unwrap().is_empty());
    }

    #[test]
    fn test_directory_sanitizes_names() {
        let dir = tempdir().unwrap();
        let store = DirectoryStore::new(dir.path().to_path_buf()).unwrap();
        let file = block_on(store.upload("../week 3/hw.png", vec![1], "image/png")).unwrap();
        assert_eq!(file.name, "../week 3/hw.png");
        assert!(store.base_path().join("_week_3_hw.png").exists());
    }

    #[test]
    fn test_file_session_round_trip() {
        let dir = tempdir().unwrap();
        let session = FileSession::new(dir.path().join("nested").join("session.json"));
        assert!(session.load_questions().unwrap().is_none());

        let set = QuestionSet::practice().with_source("hw.png");
        session.save_questions(&set).unwrap();
        assert_eq!(session.load_questions().unwrap(), Some(set));

        session.clear().unwrap();
        assert!(!session.path().exists());
    }

    #[test]
    fn test_file_session_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();
        let session = FileSession::new(path);
        assert!(matches!(session.load_questions(), Err(StorageError::Serialization(_))));
    }
}
