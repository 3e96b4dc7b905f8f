// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 EduChain

//! File-backed record store.
//!
//! Each row is one JSON file; logs are daily JSONL files. Row writes are
//! atomic via temp-file-plus-rename. Read-modify-write mutations (cached
//! balance increments, task-state transitions) go through
//! [`RecordStore::mutate_json`], which serializes them behind a store-wide
//! write lock — the atomic-increment primitive of this deployment, valid
//! because this service is the only writer of the data directory.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use serde::{de::DeserializeOwned, Serialize};

use super::StoragePaths;

/// Error type for record-store operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("storage not initialized")]
    NotInitialized,

    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl From<io::Error> for StorageError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::NotFound {
            StorageError::NotFound(e.to_string())
        } else {
            StorageError::Io(e)
        }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// File-backed record store rooted at the data directory.
#[derive(Debug)]
pub struct RecordStore {
    paths: StoragePaths,
    initialized: bool,
    write_lock: Mutex<()>,
}

impl RecordStore {
    /// Create a new RecordStore instance.
    ///
    /// Does NOT initialize the directory structure. Call `initialize()` first.
    pub fn new(paths: StoragePaths) -> Self {
        Self {
            paths,
            initialized: false,
            write_lock: Mutex::new(()),
        }
    }

    /// Get the storage paths.
    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    /// Initialize the record-store directory structure.
    ///
    /// Safe to call multiple times (idempotent).
    pub fn initialize(&mut self) -> StorageResult<()> {
        let dirs = [
            self.paths.wallets_dir(),
            self.paths.students_dir(),
            self.paths.tasks_dir(),
            self.paths.vouchers_dir(),
            self.paths.reconciliation_dir(),
            self.paths.audit_dir(),
        ];

        for dir in dirs {
            fs::create_dir_all(&dir)?;
        }

        self.initialized = true;
        Ok(())
    }

    /// Check that the data directory is writable.
    pub fn health_check(&self) -> StorageResult<()> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let test_file = self.paths.root().join(".health_check");
        let test_data = b"health_check_data";
        fs::write(&test_file, test_data)?;
        let read_data = fs::read(&test_file)?;
        fs::remove_file(&test_file)?;

        if read_data != test_data {
            return Err(StorageError::InvalidState(
                "health check data mismatch".to_string(),
            ));
        }
        Ok(())
    }

    // ========== Generic JSON Operations ==========

    /// Read a JSON file and deserialize it.
    pub fn read_json<T: DeserializeOwned>(&self, path: impl AsRef<Path>) -> StorageResult<T> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let file = File::open(path.as_ref())?;
        let reader = BufReader::new(file);
        let value = serde_json::from_reader(reader)?;
        Ok(value)
    }

    /// Write a JSON file (atomic write via rename).
    pub fn write_json<T: Serialize>(&self, path: impl AsRef<Path>, value: &T) -> StorageResult<()> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write to temp file first, then rename for atomicity
        let temp_path = path.with_extension("tmp");
        {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.flush()?;
        }
        fs::rename(&temp_path, path)?;
        Ok(())
    }

    /// Atomically read-modify-write a JSON row under the store write lock.
    ///
    /// The closure sees the current row and may return a value (e.g. the
    /// balance after an increment). Concurrent mutations of any row are
    /// serialized; plain reads are not blocked.
    pub fn mutate_json<T, R>(
        &self,
        path: impl AsRef<Path>,
        mutate: impl FnOnce(&mut T) -> StorageResult<R>,
    ) -> StorageResult<R>
    where
        T: DeserializeOwned + Serialize,
    {
        let _guard = self.write_lock.lock().expect("storage write lock poisoned");
        let mut value: T = self.read_json(path.as_ref())?;
        let result = mutate(&mut value)?;
        self.write_json(path.as_ref(), &value)?;
        Ok(result)
    }

    /// Append one line to a JSONL log file.
    pub fn append_line(&self, path: impl AsRef<Path>, line: &str) -> StorageResult<()> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
        Ok(())
    }

    /// Read all lines from a JSONL log file; empty when the file is absent.
    pub fn read_lines(&self, path: impl AsRef<Path>) -> StorageResult<Vec<String>> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        match fs::read_to_string(path.as_ref()) {
            Ok(content) => Ok(content.lines().map(str::to_string).collect()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Check if a file exists.
    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        path.as_ref().is_file()
    }

    /// List the stem names of all JSON rows in a directory.
    pub fn list_rows(&self, dir: impl AsRef<Path>) -> StorageResult<Vec<String>> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Row {
        id: String,
        count: i64,
    }

    fn test_store() -> (tempfile::TempDir, RecordStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = RecordStore::new(StoragePaths::new(dir.path()));
        store.initialize().expect("initialize");
        (dir, store)
    }

    #[test]
    fn uninitialized_store_refuses_io() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(StoragePaths::new(dir.path()));
        let err = store.read_json::<Row>(dir.path().join("x.json")).unwrap_err();
        assert!(matches!(err, StorageError::NotInitialized));
    }

    #[test]
    fn json_round_trip() {
        let (_dir, store) = test_store();
        let path = store.paths().students_dir().join("row.json");
        let row = Row {
            id: "a".to_string(),
            count: 3,
        };

        store.write_json(&path, &row).unwrap();
        let loaded: Row = store.read_json(&path).unwrap();
        assert_eq!(loaded, row);
    }

    #[test]
    fn read_missing_row_is_not_found() {
        let (_dir, store) = test_store();
        let err = store
            .read_json::<Row>(store.paths().students_dir().join("nope.json"))
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[test]
    fn mutate_json_applies_and_persists() {
        let (_dir, store) = test_store();
        let path = store.paths().students_dir().join("row.json");
        store
            .write_json(
                &path,
                &Row {
                    id: "a".to_string(),
                    count: 10,
                },
            )
            .unwrap();

        let after = store
            .mutate_json::<Row, i64>(&path, |row| {
                row.count += 15;
                Ok(row.count)
            })
            .unwrap();
        assert_eq!(after, 25);

        let loaded: Row = store.read_json(&path).unwrap();
        assert_eq!(loaded.count, 25);
    }

    #[test]
    fn mutate_json_failure_leaves_row_untouched() {
        let (_dir, store) = test_store();
        let path = store.paths().students_dir().join("row.json");
        store
            .write_json(
                &path,
                &Row {
                    id: "a".to_string(),
                    count: 10,
                },
            )
            .unwrap();

        let err = store
            .mutate_json::<Row, ()>(&path, |row| {
                row.count = 999;
                Err(StorageError::InvalidState("nope".to_string()))
            })
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidState(_)));

        let loaded: Row = store.read_json(&path).unwrap();
        assert_eq!(loaded.count, 10, "failed mutation must not persist");
    }

    #[test]
    fn append_and_read_lines() {
        let (_dir, store) = test_store();
        let path = store.paths().audit_events_file("2026-08-29");

        assert!(store.read_lines(&path).unwrap().is_empty());
        store.append_line(&path, r#"{"a":1}"#).unwrap();
        store.append_line(&path, r#"{"a":2}"#).unwrap();

        let lines = store.read_lines(&path).unwrap();
        assert_eq!(lines, vec![r#"{"a":1}"#, r#"{"a":2}"#]);
    }

    #[test]
    fn list_rows_returns_sorted_stems() {
        let (_dir, store) = test_store();
        let dir = store.paths().vouchers_dir();
        store
            .write_json(dir.join("bbb.json"), &Row { id: "b".into(), count: 0 })
            .unwrap();
        store
            .write_json(dir.join("aaa.json"), &Row { id: "a".into(), count: 0 })
            .unwrap();

        assert_eq!(store.list_rows(&dir).unwrap(), vec!["aaa", "bbb"]);
    }

    #[test]
    fn health_check_passes_on_writable_root() {
        let (_dir, store) = test_store();
        store.health_check().unwrap();
    }
}
