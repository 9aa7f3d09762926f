// SYNOID Stitch - Audio Resolver
// Copyright (c) 2026 Xing_The_Creator | SYNOID

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::resolver::{latest_any, latest_by_prefix};

/// Formats accepted as a music bed.
pub const AUDIO_EXTS: &[&str] = &["wav", "mp3", "m4a", "ogg"];

/// Pick the single music track for the job.
///
/// Prefixes are tried in order; the first one with any match wins and its
/// naturally-last file is used. With no match and `fallback_latest` set, the
/// naturally-last audio file in the directory is used instead. `None` means
/// the job runs without a music bed, which is not an error.
pub fn resolve_audio(prefixes: &[String], audio_dir: &Path, fallback_latest: bool) -> Option<PathBuf> {
    for prefix in prefixes {
        if let Some(found) = latest_by_prefix(audio_dir, prefix, AUDIO_EXTS) {
            info!("[AUDIO] Prefix '{}' -> {:?}", prefix, found);
            return Some(found);
        }
    }

    if fallback_latest {
        if let Some(found) = latest_any(audio_dir, AUDIO_EXTS) {
            info!("[AUDIO] No prefix matched, using latest track {:?}", found);
            return Some(found);
        }
    }

    warn!("[AUDIO] No audio resolved in {:?}; output will be silent", audio_dir);
    None
}
