//! Content-hash freshness for outputs.
//!
//! Outputs are only rewritten when their blake3 hash changes, so an
//! incremental build leaves untouched files (and their mtimes) alone.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// blake3 of a file's content, `None` when it cannot be read.
pub fn file_hash(path: &Path) -> Option<blake3::Hash> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; 64 * 1024];
    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => {
                hasher.update(&buffer[..n]);
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(_) => return None,
        }
    }
    Some(hasher.finalize())
}

/// Write `bytes` to `path` unless the file already holds them.
///
/// Returns whether the file was written.
pub async fn write_if_changed(path: &Path, bytes: &[u8]) -> io::Result<bool> {
    if let Ok(existing) = tokio::fs::read(path).await
        && blake3::hash(&existing) == blake3::hash(bytes)
    {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await?;
    Ok(true)
}

/// Copy `source` to `dest` unless `dest` already has the same content.
///
/// Returns whether the file was copied.
pub fn copy_if_changed(source: &Path, dest: &Path) -> io::Result<bool> {
    if dest.exists() && file_hash(source).is_some_and(|h| Some(h) == file_hash(dest)) {
        return Ok(false);
    }
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::copy(source, dest)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn writes_only_on_change() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/index.html");

        assert!(write_if_changed(&path, b"<p>a</p>").await.unwrap());
        assert!(!write_if_changed(&path, b"<p>a</p>").await.unwrap());
        assert!(write_if_changed(&path, b"<p>b</p>").await.unwrap());
        assert_eq!(fs::read(&path).unwrap(), b"<p>b</p>");
    }

    #[test]
    fn copies_only_on_change() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("logo.svg");
        let dest = dir.path().join("out/logo.svg");
        fs::write(&src, "<svg/>").unwrap();

        assert!(copy_if_changed(&src, &dest).unwrap());
        assert!(!copy_if_changed(&src, &dest).unwrap());

        fs::write(&src, "<svg></svg>").unwrap();
        assert!(copy_if_changed(&src, &dest).unwrap());
    }

    #[test]
    fn missing_file_has_no_hash() {
        assert!(file_hash(Path::new("/definitely/not/here")).is_none());
    }
}
