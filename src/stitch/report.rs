// SYNOID Stitch - Job Report
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// The debug record a job hands back next to the final path. Holds enough to
// diagnose a bad resolution without re-running: where we looked, what we
// picked, and the settings in effect. No timestamps, so identical jobs give
// identical reports.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::{ScriptConfig, StitchConfig};

/// Which concat tier produced the merged video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConcatMode {
    Copy,
    Reencode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StitchReport {
    pub video_dirs: Vec<PathBuf>,
    pub audio_dir: Option<PathBuf>,
    pub dest_dir: PathBuf,
    pub dest_name: String,
    pub items: Vec<String>,
    pub audio_prefixes: Vec<String>,
    pub ffmpeg: String,
    pub use_shell_script: bool,
    pub resolved_clips: Vec<PathBuf>,
    pub audio_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concat_mode: Option<ConcatMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell_cmd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<StitchConfig>,
}

impl StitchReport {
    /// Report skeleton for a resolver/encoder job, before anything resolves.
    pub fn for_job(config: &StitchConfig, encoder: &str) -> Self {
        Self {
            video_dirs: config.search_dirs.clone(),
            audio_dir: Some(config.audio_dir.clone()),
            dest_dir: config.dest_dir.clone(),
            dest_name: config.dest_name.clone(),
            items: config.identifiers.clone(),
            audio_prefixes: config.audio_prefixes.clone(),
            ffmpeg: encoder.to_string(),
            use_shell_script: false,
            resolved_clips: Vec::new(),
            audio_file: None,
            concat_mode: None,
            shell_cmd: None,
            config: Some(config.clone()),
        }
    }

    /// Report for the stitch-script mode, which resolves nothing itself.
    pub fn for_script(config: &ScriptConfig, shell_cmd: String) -> Self {
        Self {
            video_dirs: Vec::new(),
            audio_dir: None,
            dest_dir: config.dest_dir.clone(),
            dest_name: config.dest_name.clone(),
            items: Vec::new(),
            audio_prefixes: Vec::new(),
            ffmpeg: String::new(),
            use_shell_script: true,
            resolved_clips: Vec::new(),
            audio_file: None,
            concat_mode: None,
            shell_cmd: Some(shell_cmd),
            config: None,
        }
    }

    pub fn to_json(&self) -> String {
        // Fails only on non-UTF-8 paths.
        serde_json::to_string_pretty(self).unwrap_or_else(|_| format!("{:#?}", self))
    }

    /// Write the report as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| format!("Failed to create report dir: {}", e))?;
        }
        fs::write(path, self.to_json()).map_err(|e| format!("Failed to write report: {}", e))?;
        info!("[REPORT] Debug record saved: {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn sample_config() -> StitchConfig {
        StitchConfig::new(
            vec!["shot_01".into(), "shot_02.mp4".into()],
            vec![PathBuf::from("/out/video"), PathBuf::from("/out/trailer")],
            "/out/audio",
            "/out/trailer",
        )
    }

    #[test]
    fn test_job_report_json_shape() {
        let mut report = StitchReport::for_job(&sample_config(), "ffmpeg");
        report.resolved_clips = vec![PathBuf::from("/out/video/shot_01_00001_.mp4")];
        report.concat_mode = Some(ConcatMode::Reencode);

        let json: Value = serde_json::from_str(&report.to_json()).unwrap();
        assert_eq!(json["items"][1], "shot_02.mp4");
        assert_eq!(json["video_dirs"][0], "/out/video");
        assert_eq!(json["audio_file"], Value::Null);
        assert_eq!(json["concat_mode"], "reencode");
        assert_eq!(json["config"]["scale"], "1920:1080");
        assert_eq!(json["config"]["fps"], 24);
        assert!(json.get("shell_cmd").is_none());
    }

    #[test]
    fn test_script_report_carries_command() {
        let config = ScriptConfig {
            script_path: PathBuf::from("/w/stitch.sh"),
            dest_dir: PathBuf::from("/w/out"),
            dest_name: "final.mp4".into(),
            glob_override: None,
            audio_override: None,
        };
        let report = StitchReport::for_script(&config, "/w/stitch.sh /w/out".into());
        let json: Value = serde_json::from_str(&report.to_json()).unwrap();
        assert_eq!(json["use_shell_script"], true);
        assert_eq!(json["shell_cmd"], "/w/stitch.sh /w/out");
        assert!(json.get("concat_mode").is_none());
    }

    #[test]
    fn test_save_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("job.json");
        let report = StitchReport::for_job(&sample_config(), "ffmpeg");
        report.save(&path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, report.to_json());
    }
}
