//! Page output
//!
//! Every 2xx body is written to a flat directory, named after the last
//! segment of its URL path. Later pages with the same name overwrite
//! earlier ones; no directory hierarchy is recreated.
//!
//! Each page is written to a private temporary file in the same directory
//! and renamed over its target, so a file always holds one complete body
//! even when two workers save pages with the same name at once.

use crate::url::{output_filename, parse_url};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Writes fetched pages into one directory
#[derive(Debug, Clone)]
pub struct PageWriter {
    directory: PathBuf,
}

impl PageWriter {
    /// Creates a writer for an existing directory
    ///
    /// # Returns
    ///
    /// * `Ok(PageWriter)` - The directory exists
    /// * `Err(io::Error)` - The directory is missing or is not a directory
    pub fn new(directory: impl Into<PathBuf>) -> io::Result<Self> {
        let directory = directory.into();
        let metadata = std::fs::metadata(&directory)?;
        if !metadata.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a directory", directory.display()),
            ));
        }
        Ok(Self { directory })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path a page fetched from `url` is written to
    pub fn path_for(&self, url: &str) -> io::Result<PathBuf> {
        let parsed = parse_url(url)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
        Ok(self.directory.join(output_filename(&parsed.path)))
    }

    /// Writes `body` for the page fetched from `url`, replacing any existing file
    pub async fn save(&self, url: &str, body: &[u8]) -> io::Result<PathBuf> {
        let path = self.path_for(url)?;
        let temp = self.temp_path(&path);

        if let Err(e) = tokio::fs::write(&temp, body).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e);
        }
        if let Err(e) = tokio::fs::rename(&temp, &path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e);
        }
        Ok(path)
    }

    /// Unique sibling of `path` used while its contents are being written
    fn temp_path(&self, path: &Path) -> PathBuf {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.directory
            .join(format!(".{}.{}.{}.part", name, std::process::id(), n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_uses_last_segment() {
        let dir = TempDir::new().unwrap();
        let writer = PageWriter::new(dir.path()).unwrap();

        let path = writer
            .save("http://example.com/a/b/page.html", b"hello")
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("page.html"));
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_trailing_slash_saves_index() {
        let dir = TempDir::new().unwrap();
        let writer = PageWriter::new(dir.path()).unwrap();

        let path = writer.save("http://example.com/", b"root").await.unwrap();
        assert_eq!(path, dir.path().join("index"));
    }

    #[tokio::test]
    async fn test_same_name_overwrites() {
        let dir = TempDir::new().unwrap();
        let writer = PageWriter::new(dir.path()).unwrap();

        writer.save("http://a.com/x/page", b"first").await.unwrap();
        let path = writer.save("http://b.com/y/page", b"second").await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"second");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_saves_to_same_name_never_mix() {
        let dir = TempDir::new().unwrap();
        let writer = PageWriter::new(dir.path()).unwrap();
        let large = vec![b'L'; 4 * 1024 * 1024];
        let small = vec![b's'; 1024];

        for round in 0..50 {
            let (a, b) = tokio::join!(
                {
                    let writer = writer.clone();
                    let large = large.clone();
                    tokio::spawn(async move { writer.save("http://a.com/x/page", &large).await })
                },
                {
                    let writer = writer.clone();
                    let small = small.clone();
                    tokio::spawn(async move { writer.save("http://b.com/y/page", &small).await })
                }
            );
            a.unwrap().unwrap();
            b.unwrap().unwrap();

            let contents = std::fs::read(dir.path().join("page")).unwrap();
            assert!(
                contents == large || contents == small,
                "round {}: file of {} bytes holds neither body",
                round,
                contents.len()
            );
        }

        // No temporary files left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected() {
        let dir = TempDir::new().unwrap();
        let writer = PageWriter::new(dir.path()).unwrap();

        let err = writer.save("not-a-url", b"x").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_missing_directory_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(PageWriter::new(dir.path().join("missing")).is_err());

        let file = dir.path().join("file");
        std::fs::write(&file, b"").unwrap();
        assert!(PageWriter::new(&file).is_err());
    }
}
