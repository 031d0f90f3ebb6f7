use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// Creates the directory and any missing parents.
pub fn ensure_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
}

/// Writes `bytes` to `path` through a temporary file in the same directory,
/// renamed into place once complete. An aborted run can leave a stray temp
/// file behind but never a partial file at the final path.
pub fn write_file_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_file_atomically_creates_file_with_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("card.png");

        write_file_atomically(&path, b"fake image bytes").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"fake image bytes");
    }

    #[test]
    fn test_write_file_atomically_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("card.png");

        write_file_atomically(&path, b"bytes").unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_ensure_dir_is_idempotent() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a/b");

        ensure_dir(&nested).unwrap();
        ensure_dir(&nested).unwrap();

        assert!(nested.is_dir());
    }
}
