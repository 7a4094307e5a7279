//! Task store
//!
//! Completed task outputs, keyed by task name. Every entry is backed by one file
//! `{root}/{name}.{extension}`; opening the store reads back the files of every known task,
//! so a re-run resumes where the previous one stopped.

use crate::error::StorageError;
use crate::task::validate_task_name;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default extension for generated subspec files.
pub const DEFAULT_EXTENSION: &str = "md";

/// In-memory map of generated text, mirrored to the output directory.
#[derive(Debug)]
pub struct TaskStore {
    root: PathBuf,
    extension: String,
    outputs: HashMap<String, String>,
}

impl TaskStore {
    /// Open the store at `root`, creating the directory if needed, and load the existing
    /// output of every name in `known_names`. Files for other names are ignored.
    pub fn open<'a, P, I>(root: P, extension: &str, known_names: I) -> Result<Self, StorageError>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = &'a str>,
    {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| {
            StorageError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to create output directory at {:?}: {}", root, e),
            ))
        })?;

        let mut store = Self {
            root,
            extension: extension.trim_start_matches('.').to_string(),
            outputs: HashMap::new(),
        };

        for name in known_names {
            let path = store.path_for(name)?;
            if !path.is_file() {
                continue;
            }
            let text = fs::read_to_string(&path).map_err(|e| {
                StorageError::IoError(std::io::Error::new(
                    e.kind(),
                    format!("Failed to read existing output {:?}: {}", path, e),
                ))
            })?;
            debug!(task = %name, path = %path.display(), "Loaded existing output");
            store.outputs.insert(name.to_string(), text);
        }

        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.outputs.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.outputs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Stored names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.outputs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Output file path for `name`.
    pub fn path_for(&self, name: &str) -> Result<PathBuf, StorageError> {
        validate_task_name(name).map_err(|_| StorageError::InvalidName(name.to_string()))?;
        let file_name = if self.extension.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", name, self.extension)
        };
        Ok(self.root.join(file_name))
    }

    /// Persist `text` for `name`, then record it in memory.
    ///
    /// Writes to a temporary sibling and renames it over the final path, so a failed write
    /// leaves neither a partial file nor an in-memory entry.
    pub fn put(&mut self, name: &str, text: &str) -> Result<PathBuf, StorageError> {
        let path = self.path_for(name)?;
        let mut temp_name = path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        fs::write(&temp_path, text).map_err(|source| StorageError::WriteFailed {
            name: name.to_string(),
            path: temp_path.clone(),
            source,
        })?;

        fs::rename(&temp_path, &path).map_err(|source| {
            let _ = fs::remove_file(&temp_path);
            StorageError::WriteFailed {
                name: name.to_string(),
                path: path.clone(),
                source,
            }
        })?;

        self.outputs.insert(name.to_string(), text.to_string());
        Ok(path)
    }
}
