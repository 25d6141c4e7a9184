// src/fs/mod.rs

use std::ffi::OsString;
use std::fmt::Debug;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use filetime::FileTime;

pub mod mock;

/// Abstract filesystem interface used for artifact handling.
///
/// Child processes write to the real filesystem regardless; this trait covers
/// what the worker itself does to targets and scratch paths.
pub trait FileSystem: Send + Sync + Debug {
    fn exists(&self, path: &Path) -> bool;
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Create or truncate `path`, creating parent directories as needed.
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;
    fn append(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Remove a file. Returns whether something was removed.
    fn remove_file_if_exists(&self, path: &Path) -> Result<bool>;
    /// Remove a directory tree. Returns whether something was removed.
    fn remove_dir_all_if_exists(&self, path: &Path) -> Result<bool>;

    fn copy_file(&self, from: &Path, to: &Path) -> Result<()>;
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Set the modification time of `path` to now.
    fn touch_now(&self, path: &Path) -> Result<()>;

    /// Executable permission bit of `path`, or `None` when the platform has
    /// no such concept.
    fn executable_bit(&self, path: &Path) -> Result<Option<bool>>;
    fn set_executable_bit(&self, path: &Path, executable: bool) -> Result<()>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| format!("creating dir {:?}", parent))?;
        }
    }
    Ok(())
}

/// `dir/.name.copy-tmp` next to `path`.
fn staging_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(".copy-tmp");
    path.with_file_name(name)
}

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let bytes = fs::read(path).with_context(|| format!("reading file {:?}", path))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        ensure_parent(path)?;
        let mut file = fs::File::create(path).with_context(|| format!("creating file {:?}", path))?;
        file.write_all(contents).with_context(|| format!("writing to file {:?}", path))?;
        Ok(())
    }

    fn append(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let mut file = fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .with_context(|| format!("opening {:?} for append", path))?;
        file.write_all(contents).with_context(|| format!("appending to file {:?}", path))?;
        Ok(())
    }

    fn remove_file_if_exists(&self, path: &Path) -> Result<bool> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("removing file {:?}", path)),
        }
    }

    fn remove_dir_all_if_exists(&self, path: &Path) -> Result<bool> {
        match fs::remove_dir_all(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("removing dir {:?}", path)),
        }
    }

    /// Writes a sibling temp file and renames it over `to`, so a failed copy
    /// never leaves a partial target.
    fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
        ensure_parent(to)?;
        let contents = fs::read(from).with_context(|| format!("reading file {:?}", from))?;
        let staging = staging_path(to);
        // Permissions are the caller's business; see `set_executable_bit`.
        let written = fs::File::create(&staging)
            .and_then(|mut file| file.write_all(&contents))
            .with_context(|| format!("writing to file {:?}", staging))
            .and_then(|()| {
                fs::rename(&staging, to)
                    .with_context(|| format!("moving {:?} to {:?}", staging, to))
            });
        if written.is_err() {
            let _ = fs::remove_file(&staging);
        }
        written
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        ensure_parent(to)?;
        if fs::rename(from, to).is_ok() {
            return Ok(());
        }
        // Cross-device moves: fall back to copy + remove.
        fs::copy(from, to).with_context(|| format!("moving {:?} to {:?}", from, to))?;
        fs::remove_file(from).with_context(|| format!("removing file {:?}", from))?;
        Ok(())
    }

    fn touch_now(&self, path: &Path) -> Result<()> {
        filetime::set_file_mtime(path, FileTime::now())
            .with_context(|| format!("setting mtime of {:?}", path))
    }

    fn executable_bit(&self, path: &Path) -> Result<Option<bool>> {
        let meta = fs::metadata(path).with_context(|| format!("reading metadata of {:?}", path))?;
        Ok(perms::executable(&meta.permissions()))
    }

    fn set_executable_bit(&self, path: &Path, executable: bool) -> Result<()> {
        let meta = fs::metadata(path).with_context(|| format!("reading metadata of {:?}", path))?;
        let mut permissions = meta.permissions();
        if perms::set_executable(&mut permissions, executable) {
            fs::set_permissions(path, permissions)
                .with_context(|| format!("setting permissions of {:?}", path))?;
        }
        Ok(())
    }
}

/// Executable-bit helpers. Platforms without the concept report `None` and
/// ignore updates.
mod perms {
    use std::fs::Permissions;

    #[cfg(unix)]
    pub fn executable(p: &Permissions) -> Option<bool> {
        use std::os::unix::fs::PermissionsExt as _;
        Some(p.mode() & 0o111 != 0)
    }

    #[cfg(not(unix))]
    pub fn executable(_p: &Permissions) -> Option<bool> {
        None
    }

    /// Returns whether `p` was changed.
    #[cfg(unix)]
    pub fn set_executable(p: &mut Permissions, executable: bool) -> bool {
        use std::os::unix::fs::PermissionsExt as _;
        let mode = p.mode();
        let new_mode = if executable {
            // Mirror read bits onto execute bits, like `chmod +x` under a
            // typical umask.
            mode | ((mode & 0o444) >> 2)
        } else {
            mode & !0o111
        };
        p.set_mode(new_mode);
        new_mode != mode
    }

    #[cfg(not(unix))]
    pub fn set_executable(_p: &mut Permissions, _executable: bool) -> bool {
        false
    }
}
