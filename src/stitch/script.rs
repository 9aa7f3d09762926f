// SYNOID Stitch - Script Mode
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Hands the whole job to an external stitch script instead of the built-in
// resolver. The script gets shell-glob patterns, not prefixes, and does its
// own concat and mux.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::info;

use super::encoder::run_tool;
use super::error::{StitchError, StitchResult};
use super::report::StitchReport;
use crate::config::ScriptConfig;

/// Clip glob handed to the script when none is given.
pub const DEFAULT_CLIP_GLOB: &str = "shot_*.mp4";
/// Audio track handed to the script when none is given.
pub const DEFAULT_SCRIPT_AUDIO: &str = "trailer_audio.wav";

/// The argv for a script run, plus whether it goes through `bash -lc`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptInvocation {
    pub words: Vec<String>,
    pub via_shell: bool,
}

impl ScriptInvocation {
    pub fn build(config: &ScriptConfig) -> Self {
        let dest_dir = config.dest_dir.display().to_string();
        let glob = config
            .glob_override
            .clone()
            .filter(|g| !g.trim().is_empty())
            .unwrap_or_else(|| config.dest_dir.join(DEFAULT_CLIP_GLOB).display().to_string());
        let audio = config
            .audio_override
            .clone()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| config.dest_dir.join(DEFAULT_SCRIPT_AUDIO).display().to_string());

        let words = vec![
            config.script_path.display().to_string(),
            dest_dir,
            glob,
            audio,
            config.destination().display().to_string(),
        ];
        let via_shell = config.script_path.extension().map_or(true, |e| e != "sh");

        Self { words, via_shell }
    }

    /// Space-joined form, as recorded in the report.
    pub fn command_line(&self) -> String {
        self.words.join(" ")
    }

    fn program_and_args(&self) -> (PathBuf, Vec<OsString>) {
        if self.via_shell {
            (
                PathBuf::from("bash"),
                vec![OsString::from("-lc"), OsString::from(self.command_line())],
            )
        } else {
            let args = self.words[1..].iter().map(OsString::from).collect();
            (PathBuf::from(&self.words[0]), args)
        }
    }
}

/// Run the stitch script and return the expected output path with a report.
pub async fn run_script(config: &ScriptConfig) -> StitchResult<(PathBuf, StitchReport)> {
    create_dir(&config.dest_dir).await?;

    let invocation = ScriptInvocation::build(config);
    let report = StitchReport::for_script(config, invocation.command_line());
    info!("[SCRIPT] Running: {}", invocation.command_line());

    let (program, args) = invocation.program_and_args();
    run_tool("script", &program, &args).await?;

    Ok((config.destination(), report))
}

async fn create_dir(dir: &Path) -> StitchResult<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| StitchError::io(format!("failed to create {:?}", dir), e))
}
