//! Filesystem helpers for encoder outputs.
//!
//! Encoders write to a sibling `.partial` file which is renamed into place
//! only after the encoder succeeds, so a failed step never leaves a file at
//! the path later steps read from.

use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{MediaError, MediaResult};

/// Sibling path used while an output is being written.
///
/// Keeps the original extension last so FFmpeg still infers the container:
/// `mask.mov` becomes `mask.partial.mov`.
pub fn partial_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match output.extension() {
        Some(ext) => format!("{}.partial.{}", stem, ext.to_string_lossy()),
        None => format!("{}.partial", stem),
    };
    output.with_file_name(name)
}

/// Run `write` against a partial path, then move the result to `output`.
///
/// On failure the partial file is removed (best effort) and the original
/// error is returned unchanged.
pub async fn write_via_partial<F, Fut>(output: &Path, write: F) -> MediaResult<PathBuf>
where
    F: FnOnce(PathBuf) -> Fut,
    Fut: Future<Output = MediaResult<()>>,
{
    let partial = partial_path(output);

    if let Err(e) = write(partial.clone()).await {
        discard(&partial).await;
        return Err(e);
    }

    if fs::metadata(&partial).await.is_err() {
        return Err(MediaError::internal(format!(
            "encoder reported success but wrote no file at {}",
            partial.display()
        )));
    }

    if let Err(e) = fs::rename(&partial, output).await {
        tracing::error!(
            "Failed to move {} into place at {}: {}",
            partial.display(),
            output.display(),
            e
        );
        discard(&partial).await;
        return Err(MediaError::from(e));
    }

    Ok(output.to_path_buf())
}

async fn discard(partial: &Path) {
    match fs::remove_file(partial).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(
            "Failed to remove partial output {}: {}",
            partial.display(),
            e
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_path_keeps_extension() {
        assert_eq!(
            partial_path(Path::new("/w/mask.mov")),
            PathBuf::from("/w/mask.partial.mov")
        );
        assert_eq!(
            partial_path(Path::new("/w/output")),
            PathBuf::from("/w/output.partial")
        );
    }

    #[tokio::test]
    async fn test_success_moves_into_place() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("output.mp4");

        let written = write_via_partial(&output, |partial| async move {
            fs::write(&partial, b"video").await?;
            Ok(())
        })
        .await
        .unwrap();

        assert_eq!(written, output);
        assert_eq!(fs::read(&output).await.unwrap(), b"video");
        assert!(!partial_path(&output).exists());
    }

    #[tokio::test]
    async fn test_failure_leaves_nothing_behind() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("mask.mov");

        let result = write_via_partial(&output, |partial| async move {
            fs::write(&partial, b"half a frame").await?;
            Err(MediaError::ffmpeg_failed("boom", None, Some(1)))
        })
        .await;

        assert!(matches!(result, Err(MediaError::FfmpegFailed { .. })));
        assert!(!output.exists());
        assert!(!partial_path(&output).exists());
    }

    #[tokio::test]
    async fn test_success_without_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("output.mp4");

        let result = write_via_partial(&output, |_| async { Ok(()) }).await;
        assert!(matches!(result, Err(MediaError::Internal(_))));
        assert!(!output.exists());
    }
}
