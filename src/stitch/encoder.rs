// SYNOID Stitch - Encoder Backend
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// All media work is delegated to an external encoder. The pipeline only
// talks to the `Encoder` trait, so tests can swap in a fake that never
// touches a real media tool.

use async_trait::async_trait;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use super::error::{StitchError, StitchResult};
use crate::config::ScaleMode;

/// Quality used when the fast path fails and clips are re-encoded.
pub const REENCODE_CRF: u32 = 18;
pub const REENCODE_PRESET: &str = "veryfast";
pub const MUSIC_CODEC: &str = "aac";

/// The four invocations the stitch pipeline needs.
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Short label recorded in the debug report.
    fn describe(&self) -> String;

    /// Lossless concat of the clips listed in `manifest`.
    async fn concat_copy(&self, manifest: &Path, out: &Path) -> StitchResult<()>;

    /// Concat with every frame normalised to `fps` and `scale`. Video only.
    async fn concat_reencode(
        &self,
        manifest: &Path,
        out: &Path,
        fps: u32,
        scale: &ScaleMode,
    ) -> StitchResult<()>;

    /// Copy the video track of `video`, add the first audio track of
    /// `audio` at `gain_db`, and stop at the shorter of the two.
    async fn mux_audio(&self, video: &Path, audio: &Path, out: &Path, gain_db: f64) -> StitchResult<()>;

    /// Stream-copy `src` into a clean container at `dest`.
    async fn rewrap(&self, src: &Path, dest: &Path) -> StitchResult<()>;
}

/// `ffmpeg` command-line backend.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    program: PathBuf,
}

impl FfmpegEncoder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Run `<ffmpeg> -version` and return its first output line.
    pub async fn check_version(&self) -> StitchResult<String> {
        let output = Command::new(&self.program)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| StitchError::ToolLaunch {
                program: self.program.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(StitchError::ToolFailed {
                stage: "version check",
                reason: failure_reason(&self.program, &[OsString::from("-version")], &output.stderr),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    fn describe(&self) -> String {
        self.program.display().to_string()
    }

    async fn concat_copy(&self, manifest: &Path, out: &Path) -> StitchResult<()> {
        run_tool("stream-copy concat", &self.program, &concat_copy_args(manifest, out)).await
    }

    async fn concat_reencode(
        &self,
        manifest: &Path,
        out: &Path,
        fps: u32,
        scale: &ScaleMode,
    ) -> StitchResult<()> {
        let args = concat_reencode_args(manifest, out, fps, scale);
        run_tool("re-encode concat", &self.program, &args).await
    }

    async fn mux_audio(&self, video: &Path, audio: &Path, out: &Path, gain_db: f64) -> StitchResult<()> {
        run_tool("audio mux", &self.program, &mux_args(video, audio, out, gain_db)).await
    }

    async fn rewrap(&self, src: &Path, dest: &Path) -> StitchResult<()> {
        run_tool("finalize", &self.program, &rewrap_args(src, dest)).await
    }
}

fn args_of<I, S>(items: I) -> Vec<OsString>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    items.into_iter().map(|s| s.as_ref().to_os_string()).collect()
}

pub fn concat_copy_args(manifest: &Path, out: &Path) -> Vec<OsString> {
    let mut args = args_of(["-y", "-f", "concat", "-safe", "0", "-i"]);
    args.push(manifest.into());
    args.extend(args_of(["-c", "copy"]));
    args.push(out.into());
    args
}

/// Filter graph for the re-encode path. A fixed target is scaled down to
/// fit and padded to the exact size, centred.
pub fn video_filter(fps: u32, scale: &ScaleMode) -> String {
    match scale {
        ScaleMode::Keep => format!("fps={},format=yuv420p", fps),
        ScaleMode::Fixed { width, height } => format!(
            "fps={fps},scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,format=yuv420p",
            fps = fps,
            w = width,
            h = height
        ),
    }
}

pub fn concat_reencode_args(manifest: &Path, out: &Path, fps: u32, scale: &ScaleMode) -> Vec<OsString> {
    let mut args = args_of(["-y", "-f", "concat", "-safe", "0", "-i"]);
    args.push(manifest.into());
    args.extend(args_of([
        "-vf".to_string(),
        video_filter(fps, scale),
        "-r".to_string(),
        fps.to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        REENCODE_PRESET.to_string(),
        "-crf".to_string(),
        REENCODE_CRF.to_string(),
        "-an".to_string(),
    ]));
    args.push(out.into());
    args
}

pub fn mux_args(video: &Path, audio: &Path, out: &Path, gain_db: f64) -> Vec<OsString> {
    let mut args = args_of(["-y", "-i"]);
    args.push(video.into());
    args.push("-i".into());
    args.push(audio.into());
    args.extend(args_of([
        "-filter:a".to_string(),
        format!("volume={}dB", gain_db),
        "-map".to_string(),
        "0:v:0".to_string(),
        "-map".to_string(),
        "1:a:0".to_string(),
        "-c:v".to_string(),
        "copy".to_string(),
        "-c:a".to_string(),
        MUSIC_CODEC.to_string(),
        "-shortest".to_string(),
    ]));
    args.push(out.into());
    args
}

pub fn rewrap_args(src: &Path, dest: &Path) -> Vec<OsString> {
    let mut args = args_of(["-y", "-i"]);
    args.push(src.into());
    args.extend(args_of(["-c", "copy"]));
    args.push(dest.into());
    args
}

/// Run an external tool to completion. A non-zero exit becomes
/// `ToolFailed` carrying the tool's stderr.
pub(crate) async fn run_tool(stage: &'static str, program: &Path, args: &[OsString]) -> StitchResult<()> {
    debug!("[ENCODER] {}: {:?} {:?}", stage, program, args);

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|source| StitchError::ToolLaunch {
            program: program.display().to_string(),
            source,
        })?;

    if output.status.success() {
        Ok(())
    } else {
        Err(StitchError::ToolFailed {
            stage,
            reason: failure_reason(program, args, &output.stderr),
        })
    }
}

fn failure_reason(program: &Path, args: &[OsString], stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr).trim().to_string();
    if !text.is_empty() {
        return text;
    }
    let argv = std::iter::once(program.as_os_str())
        .chain(args.iter().map(OsString::as_os_str))
        .map(|a| a.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    format!("command failed: {}", argv)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_copy_concat_args() {
        let args = concat_copy_args(Path::new("/w/concat.txt"), Path::new("/w/concat_fast.mp4"));
        assert_eq!(
            strings(&args),
            ["-y", "-f", "concat", "-safe", "0", "-i", "/w/concat.txt", "-c", "copy", "/w/concat_fast.mp4"]
        );
    }

    #[test]
    fn test_filter_for_fixed_scale_pads_centered() {
        let vf = video_filter(24, &ScaleMode::Fixed { width: 1920, height: 1080 });
        assert_eq!(
            vf,
            "fps=24,scale=1920:1080:force_original_aspect_ratio=decrease,pad=1920:1080:(ow-iw)/2:(oh-ih)/2,format=yuv420p"
        );
        assert_eq!(video_filter(30, &ScaleMode::Keep), "fps=30,format=yuv420p");
    }

    #[test]
    fn test_reencode_strips_audio_and_forces_rate() {
        let args = strings(&concat_reencode_args(
            Path::new("list.txt"),
            Path::new("out.mp4"),
            25,
            &ScaleMode::Keep,
        ));
        let r = args.iter().position(|a| a == "-r").unwrap();
        assert_eq!(args[r + 1], "25");
        assert!(args.contains(&"-an".to_string()));
        assert!(args.contains(&"libx264".to_string()));
        assert_eq!(args.last().unwrap(), "out.mp4");
    }

    #[test]
    fn test_mux_maps_video_then_audio_with_gain() {
        let args = strings(&mux_args(
            Path::new("v.mp4"),
            Path::new("m.wav"),
            Path::new("mux.mp4"),
            -8.0,
        ));
        assert_eq!(&args[..5], ["-y", "-i", "v.mp4", "-i", "m.wav"]);
        assert!(args.contains(&"volume=-8dB".to_string()));
        assert!(args.windows(2).any(|w| w == ["-map", "0:v:0"]));
        assert!(args.windows(2).any(|w| w == ["-map", "1:a:0"]));
        assert!(args.contains(&"-shortest".to_string()));
    }

    #[test]
    fn test_failure_reason_falls_back_to_command_line() {
        let reason = failure_reason(Path::new("ffmpeg"), &args_of(["-i", "x"]), b"  \n");
        assert_eq!(reason, "command failed: ffmpeg -i x");
        let reason = failure_reason(Path::new("ffmpeg"), &[], b"Invalid data found\n");
        assert_eq!(reason, "Invalid data found");
    }

    #[tokio::test]
    async fn test_missing_binary_is_launch_error() {
        let encoder = FfmpegEncoder::new("/nonexistent/ffmpeg-for-tests");
        let err = encoder
            .rewrap(Path::new("a.mp4"), Path::new("b.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, StitchError::ToolLaunch { .. }));
    }
}
