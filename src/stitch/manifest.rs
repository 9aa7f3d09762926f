// SYNOID Stitch - Concat Manifest
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// The concat demuxer reads a plain list of `file '<path>'` lines. Paths are
// single-quoted, so an embedded quote is closed, escaped and reopened.

use std::path::{Path, PathBuf};
use tracing::info;

use super::error::{StitchError, StitchResult};

/// Quote a path for a concat manifest line.
pub fn escape_path(path: &Path) -> String {
    path.to_string_lossy().replace('\'', "'\\''")
}

/// Build the manifest text: one newline-terminated line per clip, in order.
pub fn create_concat_manifest(clips: &[PathBuf]) -> String {
    clips
        .iter()
        .map(|p| format!("file '{}'\n", escape_path(p)))
        .collect()
}

/// Write the manifest for `clips` to `path`.
pub async fn write_manifest(path: &Path, clips: &[PathBuf]) -> StitchResult<()> {
    let content = create_concat_manifest(clips);
    tokio::fs::write(path, content.as_bytes())
        .await
        .map_err(|e| StitchError::io(format!("failed to write concat manifest {:?}", path), e))?;

    info!(
        "[STITCHER] Manifest written ({} clips): {:?}",
        clips.len(),
        path
    );
    Ok(())
}
