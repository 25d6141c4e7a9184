// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File {
        content: Vec<u8>,
        executable: bool,
        touched: bool,
    },
    Dir,
}

/// In-memory filesystem for unit tests.
///
/// Directories are implicit for files; `add_dir` creates an explicit one so
/// tree removal can be observed.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    entries: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
    /// Simulate a platform without executable permissions.
    no_exec_concept: bool,
    exec_updates: Arc<AtomicUsize>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_executable_concept() -> Self {
        Self {
            no_exec_concept: true,
            ..Self::default()
        }
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        self.insert_file(path.as_ref(), content.into(), false);
    }

    pub fn add_executable(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        self.insert_file(path.as_ref(), content.into(), true);
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(path.as_ref().to_path_buf(), MockEntry::Dir);
    }

    pub fn was_touched(&self, path: impl AsRef<Path>) -> bool {
        let entries = self.entries.lock().unwrap();
        matches!(
            entries.get(path.as_ref()),
            Some(MockEntry::File { touched: true, .. })
        )
    }

    /// Number of `set_executable_bit` calls so far.
    pub fn executable_updates(&self) -> usize {
        self.exec_updates.load(Ordering::SeqCst)
    }

    pub fn is_executable(&self, path: impl AsRef<Path>) -> bool {
        let entries = self.entries.lock().unwrap();
        matches!(
            entries.get(path.as_ref()),
            Some(MockEntry::File { executable: true, .. })
        )
    }

    fn insert_file(&self, path: &Path, content: Vec<u8>, executable: bool) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            path.to_path_buf(),
            MockEntry::File {
                content,
                executable,
                touched: false,
            },
        );
    }

    fn file_content(&self, path: &Path) -> Result<Vec<u8>> {
        let entries = self.entries.lock().unwrap();
        match entries.get(path) {
            Some(MockEntry::File { content, .. }) => Ok(content.clone()),
            Some(MockEntry::Dir) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        let entries = self.entries.lock().unwrap();
        entries.contains_key(path)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let content = self.file_content(path)?;
        String::from_utf8(content).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.insert_file(path, contents.to_vec(), false);
        Ok(())
    }

    fn append(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get_mut(path) {
            Some(MockEntry::File { content, .. }) => {
                content.extend_from_slice(contents);
                Ok(())
            }
            Some(MockEntry::Dir) => Err(anyhow!("Is a directory: {:?}", path)),
            None => {
                entries.insert(
                    path.to_path_buf(),
                    MockEntry::File {
                        content: contents.to_vec(),
                        executable: false,
                        touched: false,
                    },
                );
                Ok(())
            }
        }
    }

    fn remove_file_if_exists(&self, path: &Path) -> Result<bool> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(path) {
            Some(MockEntry::Dir) => Err(anyhow!("Is a directory: {:?}", path)),
            Some(MockEntry::File { .. }) => {
                entries.remove(path);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove_dir_all_if_exists(&self, path: &Path) -> Result<bool> {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|p, _| !p.starts_with(path));
        Ok(entries.len() != before)
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
        let content = self.file_content(from)?;
        self.insert_file(to, content, false);
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries
            .remove(from)
            .ok_or_else(|| anyhow!("File not found: {:?}", from))?;
        entries.insert(to.to_path_buf(), entry);
        Ok(())
    }

    fn touch_now(&self, path: &Path) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get_mut(path) {
            Some(MockEntry::File { touched, .. }) => {
                *touched = true;
                Ok(())
            }
            _ => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn executable_bit(&self, path: &Path) -> Result<Option<bool>> {
        if self.no_exec_concept {
            return Ok(None);
        }
        let entries = self.entries.lock().unwrap();
        match entries.get(path) {
            Some(MockEntry::File { executable, .. }) => Ok(Some(*executable)),
            Some(MockEntry::Dir) => Ok(Some(true)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn set_executable_bit(&self, path: &Path, value: bool) -> Result<()> {
        self.exec_updates.fetch_add(1, Ordering::SeqCst);
        let mut entries = self.entries.lock().unwrap();
        match entries.get_mut(path) {
            Some(MockEntry::File { executable, .. }) => {
                *executable = value;
                Ok(())
            }
            _ => Err(anyhow!("File not found: {:?}", path)),
        }
    }
}
