//! Writes an uploaded photo under the armed target name.
//!
//! Data goes to a hidden temp file first and is renamed over the target, so a
//! failed upload never leaves a half-written photo where the host expects one.

use crate::utils::security;
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Saves `data` as `save_dir/target_filename`, replacing any existing file.
pub async fn save_upload(save_dir: &Path, target_filename: &str, data: &[u8]) -> Result<PathBuf> {
    security::validate_filename(target_filename)
        .map_err(|e| anyhow!("Invalid target filename '{}': {}", target_filename, e))?;

    let final_path = save_dir.join(target_filename);
    let temp_path = save_dir.join(format!(
        ".{}.{}.part",
        target_filename,
        Uuid::new_v4().simple()
    ));

    if let Err(err) = write_then_rename(&temp_path, &final_path, data).await {
        if let Err(cleanup_err) = tokio::fs::remove_file(&temp_path).await {
            if cleanup_err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    "Failed to remove temp upload {}: {}",
                    temp_path.display(),
                    cleanup_err
                );
            }
        }
        return Err(err);
    }

    Ok(final_path)
}

async fn write_then_rename(temp_path: &Path, final_path: &Path, data: &[u8]) -> Result<()> {
    let mut file = tokio::fs::File::create(temp_path)
        .await
        .with_context(|| format!("Failed to create {}", temp_path.display()))?;
    file.write_all(data)
        .await
        .context("Failed to write upload")?;
    file.sync_all().await.context("Failed to flush upload")?;
    drop(file);

    tokio::fs::rename(temp_path, final_path)
        .await
        .with_context(|| format!("Failed to move upload into {}", final_path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn leftover_temp_files(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .expect("read dir")
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".part"))
            .count()
    }

    #[tokio::test]
    async fn saves_bytes_under_target_name() {
        let dir = TempDir::new().unwrap();
        let path = save_upload(dir.path(), "front.jpg", b"jpeg-bytes")
            .await
            .expect("save");

        assert_eq!(path, dir.path().join("front.jpg"));
        assert_eq!(std::fs::read(&path).unwrap(), b"jpeg-bytes");
        assert_eq!(leftover_temp_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("front.jpg"), b"old photo, longer").unwrap();

        let path = save_upload(dir.path(), "front.jpg", b"new").await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"new");
    }

    #[tokio::test]
    async fn failed_rename_cleans_up_temp_file() {
        let dir = TempDir::new().unwrap();
        // A directory squatting on the target name makes the rename fail
        std::fs::create_dir(dir.path().join("front.jpg")).unwrap();
        std::fs::write(dir.path().join("front.jpg").join("keep"), b"x").unwrap();

        let result = save_upload(dir.path(), "front.jpg", b"data").await;
        assert!(result.is_err());
        assert_eq!(leftover_temp_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone");
        assert!(save_upload(&missing, "front.jpg", b"data").await.is_err());
    }

    #[tokio::test]
    async fn traversal_target_is_refused() {
        let dir = TempDir::new().unwrap();
        assert!(save_upload(dir.path(), "../escape.jpg", b"data").await.is_err());
    }
}
