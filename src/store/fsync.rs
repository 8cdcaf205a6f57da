//! Durable file replacement.
//!
//! Writing a snapshot is only crash-safe if both the file and its directory
//! entry reach disk. The sequence is:
//!
//! 1. Write `<path>.tmp` and fsync it
//! 2. Rename it over `<path>`
//! 3. fsync the parent directory so the rename survives power loss

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Syncs a directory so its entries (creates, renames) are durable.
pub fn fsync_dir(dir_path: &Path) -> io::Result<()> {
    OpenOptions::new().read(true).open(dir_path)?.sync_all()
}

/// Atomically replaces `path` with `bytes`.
///
/// Readers see either the old contents or the new, never a partial write.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        std::fs::create_dir_all(parent)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = Path::new(&tmp_name);

    {
        let mut file: File = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }

    std::fs::rename(tmp_path, path)?;

    if let Some(parent) = parent {
        fsync_dir(parent)?;
    }
    Ok(())
}
