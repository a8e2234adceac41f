//! JSON file persistence for the conversation history
//!
//! The file is a flat array of `{"role": ..., "content": ...}` records and is
//! replaced wholesale on every save.

use std::io::Write;
use std::path::{Path, PathBuf};

use super::history::{ConversationHistory, ConversationTurn};
use crate::{Error, Result};

/// Loads and saves the history at a fixed path
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    /// Create a store for the given file path
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the history file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted history
    ///
    /// A missing file yields an empty history, as does content that does not
    /// decode to an array of turns.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read
    pub fn load(&self) -> Result<ConversationHistory> {
        let content = match std::fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no history file, starting fresh");
                return Ok(ConversationHistory::new());
            }
            Err(e) => return Err(e.into()),
        };

        match decode(&content) {
            Ok(history) => {
                tracing::info!(
                    path = %self.path.display(),
                    turns = history.len(),
                    "loaded conversation history"
                );
                Ok(history)
            }
            Err(reason) => {
                tracing::warn!(
                    path = %self.path.display(),
                    reason = %reason,
                    "history file is not a list of turns, starting fresh"
                );
                Ok(ConversationHistory::new())
            }
        }
    }

    /// Overwrite the persisted history
    ///
    /// Writes to a temporary sibling file and renames it over the target, so
    /// a crash mid-write leaves the previous file intact.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written
    pub fn save(&self, history: &ConversationHistory) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let json = serde_json::to_string_pretty(history)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .map_err(|e| Error::Persistence(format!("{}: {}", self.path.display(), e.error)))?;

        tracing::info!(
            path = %self.path.display(),
            turns = history.len(),
            "saved conversation history"
        );
        Ok(())
    }
}

/// Decode file content, rejecting anything that is not an array of turns
fn decode(content: &[u8]) -> std::result::Result<ConversationHistory, String> {
    let value: serde_json::Value =
        serde_json::from_slice(content).map_err(|e| format!("invalid JSON: {e}"))?;

    if !value.is_array() {
        return Err("top-level value is not an array".to_string());
    }

    let turns: Vec<ConversationTurn> =
        serde_json::from_value(value).map_err(|e| format!("invalid turn: {e}"))?;

    Ok(ConversationHistory::from(turns))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_history() -> ConversationHistory {
        let mut history = ConversationHistory::new();
        history.push(ConversationTurn::user("what is two plus two"));
        history.push(ConversationTurn::model("Four."));
        history
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"));

        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load_returns_same_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"));
        let history = sample_history();

        store.save(&history).unwrap();
        assert_eq!(store.load().unwrap(), history);
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("nested/deeper/history.json"));

        store.save(&sample_history()).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_save_overwrites_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"));

        store.save(&sample_history()).unwrap();

        let mut longer = sample_history();
        longer.push(ConversationTurn::user("and three plus three"));
        longer.push(ConversationTurn::model("Six."));
        store.save(&longer).unwrap();

        assert_eq!(store.load().unwrap().len(), 4);
    }

    #[test]
    fn test_non_array_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, r#"{"role": "user", "content": "hi"}"#).unwrap();

        assert!(HistoryStore::new(path).load().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_json_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "[{\"role\": \"user\", \"content\"").unwrap();

        assert!(HistoryStore::new(path).load().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_utf8_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, [0xff, 0xfe, b'[', b']']).unwrap();

        assert!(HistoryStore::new(path).load().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_role_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, r#"[{"role": "system", "content": "x"}]"#).unwrap();

        assert!(HistoryStore::new(path).load().unwrap().is_empty());
    }

    #[test]
    fn test_file_format_is_role_content_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        HistoryStore::new(&path).save(&sample_history()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["role"], "user");
        assert_eq!(value[0]["content"], "what is two plus two");
        assert_eq!(value[1]["role"], "model");
    }
}
