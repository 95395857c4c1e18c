//! Atomic file writes: temp file in the target directory, fsync, rename.
//!
//! Readers never observe a half-written project file. Content is written
//! byte-for-byte; no line-ending normalization is applied.

use camino::Utf8Path;
use std::io::{self, Write};
use tempfile::NamedTempFile;

use crate::paths::ensure_dir_all;

/// Atomically replace `path` with `content`.
///
/// Parent directories are created as needed. On unix, `mode` sets the
/// permission bits of the final file (the temp file defaults to 0600).
///
/// # Errors
///
/// Any failure creating, writing, syncing or renaming the temp file. The
/// target is left untouched in that case.
pub fn write_file_atomic(path: &Utf8Path, content: &[u8], mode: Option<u32>) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_str().is_empty() => p,
        _ => Utf8Path::new("."),
    };
    ensure_dir_all(parent)?;

    let mut temp_file = NamedTempFile::new_in(parent)?;
    temp_file.write_all(content)?;
    apply_mode(&temp_file, mode)?;
    temp_file.as_file().sync_all()?;

    temp_file
        .persist(path.as_std_path())
        .map_err(|persist_error| persist_error.error)?;
    Ok(())
}

#[cfg(unix)]
fn apply_mode(temp_file: &NamedTempFile, mode: Option<u32>) -> io::Result<()> {
    use std::fs::Permissions;
    use std::os::unix::fs::PermissionsExt;

    match mode {
        Some(mode) => temp_file
            .as_file()
            .set_permissions(Permissions::from_mode(mode)),
        None => Ok(()),
    }
}

#[cfg(not(unix))]
fn apply_mode(_temp_file: &NamedTempFile, _mode: Option<u32>) -> io::Result<()> {
    Ok(())
}
