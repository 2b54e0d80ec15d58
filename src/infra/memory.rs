use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::domain::entities::export::ExportFile;
use crate::usecase::ports::export::{ExportError, FileSink};
use crate::usecase::ports::storage::{PreferenceStore, StorageError};

/// Preferences that last as long as the process.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: RefCell<BTreeMap<String, String>>,
}

impl MemoryPreferenceStore {
    pub fn keys(&self) -> Vec<String> {
        self.values.borrow().keys().cloned().collect()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values.borrow_mut().remove(key);
        Ok(())
    }
}

/// Keeps finished exports in memory instead of writing them to disk.
#[derive(Debug, Default)]
pub struct MemorySink {
    files: RefCell<Vec<ExportFile>>,
}

impl MemorySink {
    pub fn files(&self) -> Vec<ExportFile> {
        self.files.borrow().clone()
    }
}

impl FileSink for MemorySink {
    fn save(&self, file: &ExportFile) -> Result<PathBuf, ExportError> {
        self.files.borrow_mut().push(file.clone());
        Ok(PathBuf::from(&file.file_name))
    }
}
