//! Album cover file storage.
//!
//! Covers are written to a local directory and served back by the router
//! under `/upload/images`. File names are `<unix millis>-<original name>`.

use std::path::{Path, PathBuf};

use openmusic_core::{OpenMusicResult, StorageError};

use crate::config::ApiConfig;

/// URL path the upload directory is mounted on.
pub const COVER_ROUTE: &str = "/upload/images";

/// Local-disk cover storage.
#[derive(Debug, Clone)]
pub struct CoverStorage {
    dir: PathBuf,
    public_base_url: String,
    max_bytes: usize,
}

impl CoverStorage {
    pub fn new(config: &ApiConfig) -> Self {
        Self {
            dir: PathBuf::from(&config.upload_dir),
            public_base_url: config.public_base_url.clone(),
            max_bytes: config.max_cover_bytes,
        }
    }

    /// Directory covers are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Largest accepted cover in bytes.
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Public URL of a stored file.
    pub fn url_for(&self, file_name: &str) -> String {
        format!("{}{}/{}", self.public_base_url, COVER_ROUTE, file_name)
    }

    /// Write a cover and return its public URL.
    pub async fn save(&self, original_name: &str, contents: &[u8]) -> OpenMusicResult<String> {
        let file_name = format!(
            "{}-{}",
            chrono::Utc::now().timestamp_millis(),
            sanitize_file_name(original_name)
        );

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_error(&self.dir, e))?;

        let path = self.dir.join(&file_name);
        tokio::fs::write(&path, contents)
            .await
            .map_err(|e| io_error(&path, e))?;

        tracing::debug!(path = %path.display(), bytes = contents.len(), "cover stored");
        Ok(self.url_for(&file_name))
    }
}

fn io_error(path: &Path, err: std::io::Error) -> openmusic_core::OpenMusicError {
    StorageError::Backend {
        reason: format!("{}: {}", path.display(), err),
    }
    .into()
}

/// Keep only the final path component and drop anything that could escape
/// the upload directory.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_control() { '_' } else { c })
        .collect();
    match cleaned.trim_start_matches('.') {
        "" => "cover".to_string(),
        rest => rest.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage(dir: &Path) -> CoverStorage {
        CoverStorage::new(&ApiConfig {
            upload_dir: dir.to_string_lossy().into_owned(),
            ..ApiConfig::default()
        })
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("cover.jpg"), "cover.jpg");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\pics\\art.png"), "art.png");
        assert_eq!(sanitize_file_name(".."), "cover");
        assert_eq!(sanitize_file_name(""), "cover");
    }

    #[test]
    fn test_url_for() {
        let storage = CoverStorage::new(&ApiConfig::default());
        assert_eq!(
            storage.url_for("1-cover.jpg"),
            "http://localhost:5000/upload/images/1-cover.jpg"
        );
    }

    #[tokio::test]
    async fn test_save_writes_file() {
        let scratch = TempDir::new().unwrap();
        let dir = scratch.path().join("covers");
        let storage = storage(&dir);

        let url = storage.save("cover.jpg", b"jpeg bytes").await.unwrap();
        let file_name = url.rsplit('/').next().unwrap();
        assert!(file_name.ends_with("-cover.jpg"));

        let written = tokio::fs::read(dir.join(file_name)).await.unwrap();
        assert_eq!(written, b"jpeg bytes");
    }
}
