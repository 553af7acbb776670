//! JSON file backing for the contact list.
//!
//! The file holds a pretty-printed JSON array of address strings. Writes go
//! to a sibling temp file first and are then renamed over the original.

use std::path::{Path, PathBuf};

use crate::domain::Contact;
use crate::services::{ContactError, ContactStorage};

/// Contact storage in a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn storage_error(&self, e: impl std::fmt::Display) -> ContactError {
        ContactError::Storage(format!("{}: {}", self.path.display(), e))
    }
}

impl ContactStorage for JsonFileStorage {
    fn load(&self) -> Result<Vec<Contact>, ContactError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.storage_error(e)),
        };

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&contents).map_err(|e| self.storage_error(e))
    }

    fn save_all(&self, contacts: &[Contact]) -> Result<(), ContactError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.storage_error(e))?;
        }

        let json = serde_json::to_string_pretty(contacts).map_err(|e| self.storage_error(e))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| self.storage_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.storage_error(e))?;

        tracing::debug!(path = %self.path.display(), count = contacts.len(), "Saved contacts");
        Ok(())
    }
}
