//! Browser `sessionStorage` hand-off for WebAssembly.

use super::{SESSION_KEY, SessionStore, StorageError, StorageResult};
use crate::question::QuestionSet;

/// Keeps the extracted questions in the tab's `sessionStorage`, so they
/// survive a reload but not a new tab.
#[derive(Default)]
pub struct WebSession;

impl WebSession {
    pub fn new() -> Self {
        Self
    }

    fn storage(&self) -> StorageResult<web_sys::Storage> {
        let window = web_sys::window()
            .ok_or_else(|| StorageError::Other("No window object".to_string()))?;
        window
            .session_storage()
            .map_err(|e| StorageError::Other(format!("sessionStorage error: {:?}", e)))?
            .ok_or_else(|| StorageError::Other("sessionStorage not available".to_string()))
    }
}

impl SessionStore for WebSession {
    fn save_questions(&self, questions: &QuestionSet) -> StorageResult<()> {
        let json = questions
            .to_json()
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.storage()?
            .set_item(SESSION_KEY, &json)
            .map_err(|e| StorageError::Io(format!("Failed to write session: {:?}", e)))
    }

    fn load_questions(&self) -> StorageResult<Option<QuestionSet>> {
        let json = self
            .storage()?
            .get_item(SESSION_KEY)
            .map_err(|e| StorageError::Io(format!("Failed to read session: {:?}", e)))?;
        json.as_deref()
            .map(QuestionSet::from_json)
            .transpose()
            .map_err(|e| StorageError::Serialization(e.to_string()))
    }

    fn clear(&self) -> StorageResult<()> {
        self.storage()?
            .remove_item(SESSION_KEY)
            .map_err(|e| StorageError::Io(format!("Failed to clear session: {:?}", e)))
    }
}
