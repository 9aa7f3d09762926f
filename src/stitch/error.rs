// SYNOID Stitch - Error Taxonomy
// Copyright (c) 2026 Xing_The_Creator | SYNOID

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can abort a stitch job.
///
/// A missing clip is always an error. A missing audio track is not, so the
/// audio resolver returns `Option` and never produces one of these.
#[derive(Debug, Error)]
pub enum StitchError {
    #[error("video file \"{identifier}\" not found in any of: {}", fmt_dirs(.searched))]
    ClipNotFound {
        identifier: String,
        searched: Vec<PathBuf>,
    },

    #[error("no video found for prefix \"{prefix}\" in any of: {}", fmt_dirs(.searched))]
    PrefixNotFound {
        prefix: String,
        searched: Vec<PathBuf>,
    },

    #[error("{stage} failed: {reason}")]
    ToolFailed { stage: &'static str, reason: String },

    #[error("could not launch {program}: {source}")]
    ToolLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("nothing to stitch: no clip identifiers were given")]
    EmptyJob,
}

impl StitchError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// True for the resolution failures, which happen before any encoder call.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ClipNotFound { .. } | Self::PrefixNotFound { .. }
        )
    }
}

fn fmt_dirs(dirs: &[PathBuf]) -> String {
    let list = dirs
        .iter()
        .map(|d| format!("\"{}\"", d.display()))
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{}]", list)
}

pub type StitchResult<T> = Result<T, StitchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_lists_every_directory() {
        let err = StitchError::PrefixNotFound {
            prefix: "shot_07".to_string(),
            searched: vec![PathBuf::from("/out/video"), PathBuf::from("/out/trailer")],
        };
        let msg = err.to_string();
        assert!(msg.contains("shot_07"));
        assert!(msg.contains("/out/video"));
        assert!(msg.contains("/out/trailer"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_tool_failure_is_not_resolution_failure() {
        let err = StitchError::ToolFailed {
            stage: "mux",
            reason: "boom".into(),
        };
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "mux failed: boom");
    }
}
