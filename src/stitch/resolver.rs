// SYNOID Stitch - Clip Resolver
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Turns loose clip identifiers (full filenames or render prefixes) into
// concrete files, searching an ordered list of directories. The first
// directory that produces a match wins, so the order of `search_dirs`
// encodes priority.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::error::{StitchError, StitchResult};
use super::natural::{has_extension, list_sorted};

/// Containers accepted as clips.
pub const VIDEO_EXTS: &[&str] = &["mp4", "mov", "mkv"];

/// Suffix the renderer gives the first take of every shot.
const FIRST_TAKE_SUFFIX: &str = "_00001_";

/// How an identifier is interpreted. Decided purely from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    Filename,
    Prefix,
}

impl IdentifierKind {
    pub fn classify(identifier: &str) -> Self {
        if has_extension(identifier, VIDEO_EXTS) {
            IdentifierKind::Filename
        } else {
            IdentifierKind::Prefix
        }
    }
}

/// Resolve every identifier to an existing absolute path.
///
/// The output has exactly one entry per identifier, in input order. That
/// order is the cut order of the finished trailer.
pub fn resolve_clips(identifiers: &[String], search_dirs: &[PathBuf]) -> StitchResult<Vec<PathBuf>> {
    let mut resolved = Vec::with_capacity(identifiers.len());

    for identifier in identifiers {
        let path = match IdentifierKind::classify(identifier) {
            IdentifierKind::Filename => resolve_filename(identifier, search_dirs)?,
            IdentifierKind::Prefix => resolve_prefix(identifier, search_dirs)?,
        };
        debug!("[RESOLVER] {} -> {:?}", identifier, path);
        resolved.push(path);
    }

    info!("[RESOLVER] Resolved {} clip(s)", resolved.len());
    Ok(resolved)
}

/// A literal filename: usable as-is, else looked up in each directory.
fn resolve_filename(name: &str, search_dirs: &[PathBuf]) -> StitchResult<PathBuf> {
    let direct = Path::new(name);
    if direct.is_file() {
        return absolutize(direct);
    }

    for dir in search_dirs {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return absolutize(&candidate);
        }
    }

    Err(StitchError::ClipNotFound {
        identifier: name.to_string(),
        searched: search_dirs.to_vec(),
    })
}

/// A prefix: first-take fast path across all directories, then the
/// naturally-last file carrying the prefix.
fn resolve_prefix(prefix: &str, search_dirs: &[PathBuf]) -> StitchResult<PathBuf> {
    for dir in search_dirs {
        for ext in VIDEO_EXTS {
            let candidate = dir.join(format!("{}{}.{}", prefix, FIRST_TAKE_SUFFIX, ext));
            if candidate.is_file() {
                return absolutize(&candidate);
            }
        }
    }

    for dir in search_dirs {
        if let Some(found) = latest_by_prefix(dir, prefix, VIDEO_EXTS) {
            return absolutize(&found);
        }
    }

    Err(StitchError::PrefixNotFound {
        prefix: prefix.to_string(),
        searched: search_dirs.to_vec(),
    })
}

/// Naturally-last file in `dir` starting with `prefix` (case-insensitive)
/// and carrying one of `exts`.
pub fn latest_by_prefix(dir: &Path, prefix: &str, exts: &[&str]) -> Option<PathBuf> {
    let wanted = prefix.to_lowercase();
    list_sorted(dir, exts)
        .into_iter()
        .filter(|name| name.to_lowercase().starts_with(&wanted))
        .last()
        .map(|name| dir.join(name))
}

/// Naturally-last file in `dir` with one of `exts`, whatever its name.
pub fn latest_any(dir: &Path, exts: &[&str]) -> Option<PathBuf> {
    list_sorted(dir, exts).pop().map(|name| dir.join(name))
}

pub(crate) fn absolutize(path: &Path) -> StitchResult<PathBuf> {
    std::path::absolute(path)
        .map_err(|e| StitchError::io(format!("failed to absolutize {:?}", path), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let p = dir.join(name);
        fs::write(&p, b"clip").unwrap();
        p
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_classify_by_extension() {
        assert_eq!(IdentifierKind::classify("shot_01_00001_.mp4"), IdentifierKind::Filename);
        assert_eq!(IdentifierKind::classify("shot_01.MKV"), IdentifierKind::Filename);
        assert_eq!(IdentifierKind::classify("shot_01"), IdentifierKind::Prefix);
        assert_eq!(IdentifierKind::classify("shot_01.wav"), IdentifierKind::Prefix);
    }

    #[test]
    fn test_first_directory_wins_for_first_take() {
        let x = TempDir::new().unwrap();
        let y = TempDir::new().unwrap();
        let in_x = touch(x.path(), "shotA_00001_.mp4");
        touch(y.path(), "shotA_00001_.mp4");

        let dirs = vec![x.path().to_path_buf(), y.path().to_path_buf()];
        let resolved = resolve_clips(&ids(&["shotA"]), &dirs).unwrap();
        assert_eq!(resolved, vec![in_x]);
    }

    #[test]
    fn test_first_take_in_later_dir_beats_latest_in_earlier_dir() {
        let x = TempDir::new().unwrap();
        let y = TempDir::new().unwrap();
        touch(x.path(), "shotB_00007_.mp4");
        let in_y = touch(y.path(), "shotB_00001_.mp4");

        let dirs = vec![x.path().to_path_buf(), y.path().to_path_buf()];
        let resolved = resolve_clips(&ids(&["shotB"]), &dirs).unwrap();
        assert_eq!(resolved, vec![in_y]);
    }

    #[test]
    fn test_prefix_falls_back_to_naturally_last() {
        let x = TempDir::new().unwrap();
        touch(x.path(), "hero_final.mp4");
        let v2 = touch(x.path(), "hero_v2.mp4");
        touch(x.path(), "hero_v2.txt");

        let resolved = resolve_clips(&ids(&["hero"]), &[x.path().to_path_buf()]).unwrap();
        assert_eq!(resolved, vec![v2]);
    }

    #[test]
    fn test_latest_by_prefix_uses_numeric_order() {
        let x = TempDir::new().unwrap();
        touch(x.path(), "wan_shot_00002_.mp4");
        let ten = touch(x.path(), "wan_shot_00010_.mp4");
        touch(x.path(), "wan_shot_00009_.mp4");

        assert_eq!(latest_by_prefix(x.path(), "wan_shot", VIDEO_EXTS), Some(ten));
    }

    #[test]
    fn test_output_order_follows_input_order() {
        let x = TempDir::new().unwrap();
        let c = touch(x.path(), "c_00001_.mp4");
        let a = touch(x.path(), "a_00001_.mp4");
        let b = touch(x.path(), "b.mov");

        let resolved =
            resolve_clips(&ids(&["c", "b.mov", "a", "c"]), &[x.path().to_path_buf()]).unwrap();
        assert_eq!(resolved, vec![c.clone(), b, a, c]);
    }

    #[test]
    fn test_filename_searched_in_directory_order() {
        let x = TempDir::new().unwrap();
        let y = TempDir::new().unwrap();
        let in_y = touch(y.path(), "closing.mkv");

        let dirs = vec![x.path().to_path_buf(), y.path().to_path_buf()];
        let resolved = resolve_clips(&ids(&["closing.mkv"]), &dirs).unwrap();
        assert_eq!(resolved, vec![in_y]);
    }

    #[test]
    fn test_existing_path_used_directly() {
        let x = TempDir::new().unwrap();
        let direct = touch(x.path(), "direct.mp4");

        let resolved = resolve_clips(&[direct.to_string_lossy().into_owned()], &[]).unwrap();
        assert_eq!(resolved, vec![direct]);
    }

    #[test]
    fn test_missing_prefix_reports_identifier_and_dirs() {
        let x = TempDir::new().unwrap();
        touch(x.path(), "other_00001_.mp4");

        let dirs = vec![x.path().to_path_buf()];
        let err = resolve_clips(&ids(&["ghost"]), &dirs).unwrap_err();
        assert!(err.is_not_found());
        let msg = err.to_string();
        assert!(msg.contains("ghost"));
        assert!(msg.contains(&x.path().display().to_string()));
    }

    #[test]
    fn test_missing_filename_is_not_found() {
        let x = TempDir::new().unwrap();
        let err = resolve_clips(&ids(&["nope.mp4"]), &[x.path().to_path_buf()]).unwrap_err();
        assert!(matches!(err, StitchError::ClipNotFound { .. }));
    }
}
