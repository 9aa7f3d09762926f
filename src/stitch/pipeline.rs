// SYNOID Stitch - Concat / Mux / Finalize Pipeline
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Resolve -> Concat (copy, else re-encode) -> [Mux] -> Finalize.
//
// Every intermediate file lives in a per-job work directory that is removed
// when the job ends, whichever way it ends. The destination is only touched
// by the final rename, so a failed job never leaves a partial trailer.

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{info, warn};

use super::audio::resolve_audio;
use super::encoder::Encoder;
use super::error::{StitchError, StitchResult};
use super::manifest::write_manifest;
use super::report::{ConcatMode, StitchReport};
use super::resolver::{absolutize, resolve_clips};
use crate::config::{ScaleMode, StitchConfig};

pub const MANIFEST_NAME: &str = "concat.txt";
pub const FAST_OUT: &str = "concat_fast.mp4";
pub const REENCODE_OUT: &str = "concat_reenc.mp4";
pub const MUX_OUT: &str = "mux.mp4";

const WORK_DIR_PREFIX: &str = "synoid-stitch-";

/// What a finished job hands back.
#[derive(Debug, Clone)]
pub struct StitchOutcome {
    pub final_path: PathBuf,
    pub report: StitchReport,
}

/// A failed job together with the debug record as far as it got, so a bad
/// resolution can be diagnosed from the searched dirs and effective config.
#[derive(Debug)]
pub struct JobFailure {
    pub error: StitchError,
    pub report: StitchReport,
}

/// Run one stitch job end to end.
pub async fn run_job<E>(config: &StitchConfig, encoder: &E) -> StitchResult<StitchOutcome>
where
    E: Encoder + ?Sized,
{
    run_job_with_report(config, encoder)
        .await
        .map_err(|failure| failure.error)
}

/// Same as `run_job`, but a failure keeps the partially filled report.
pub async fn run_job_with_report<E>(config: &StitchConfig, encoder: &E) -> Result<StitchOutcome, JobFailure>
where
    E: Encoder + ?Sized,
{
    let mut report = StitchReport::for_job(config, &encoder.describe());
    match execute(config, encoder, &mut report).await {
        Ok(final_path) => Ok(StitchOutcome { final_path, report }),
        Err(error) => Err(JobFailure { error, report }),
    }
}

async fn execute<E>(config: &StitchConfig, encoder: &E, report: &mut StitchReport) -> StitchResult<PathBuf>
where
    E: Encoder + ?Sized,
{
    if config.identifiers.is_empty() {
        return Err(StitchError::EmptyJob);
    }

    info!(
        "[STITCHER] Resolving {} clip(s) across {} dir(s)",
        config.identifiers.len(),
        config.search_dirs.len()
    );
    let clips = resolve_clips(&config.identifiers, &config.search_dirs)?;
    report.resolved_clips = clips.clone();

    let audio = resolve_audio(&config.audio_prefixes, &config.audio_dir, config.fallback_latest_audio)
        .map(|track| absolutize(&track))
        .transpose()?;
    report.audio_file = audio.clone();

    tokio::fs::create_dir_all(&config.dest_dir)
        .await
        .map_err(|e| StitchError::io(format!("failed to create {:?}", config.dest_dir), e))?;
    let destination = absolutize(&config.destination())?;

    let work = create_work_dir(config.work_root.as_deref())?;
    let manifest = work.path().join(MANIFEST_NAME);
    write_manifest(&manifest, &clips).await?;

    let (merged, mode) = concat_clips(encoder, &manifest, work.path(), config.fps, &config.scale).await?;
    report.concat_mode = Some(mode);

    let main_artifact = match &audio {
        Some(track) => {
            let muxed = work.path().join(MUX_OUT);
            info!("[STITCHER] Mixing in {:?} at {}dB", track, config.music_gain_db);
            encoder
                .mux_audio(&merged, track, &muxed, config.music_gain_db)
                .await?;
            muxed
        }
        None => merged,
    };

    let final_path = finalize(encoder, &main_artifact, &destination).await?;

    // The trailer is already in place; a leftover work dir is not a failed job.
    let work_path = work.path().to_path_buf();
    if let Err(e) = work.close() {
        warn!("[STITCHER] Could not remove work directory {:?}: {}", work_path, e);
    }

    info!("[STITCHER] ✅ Final output: {:?}", final_path);
    Ok(final_path)
}

/// Merge the manifest's clips into one video inside `work_dir`.
///
/// Stream copy is tried first. Any failure there is expected when clips
/// differ in codec or geometry and falls through to a full re-encode; a
/// re-encode failure is fatal.
pub async fn concat_clips<E>(
    encoder: &E,
    manifest: &Path,
    work_dir: &Path,
    fps: u32,
    scale: &ScaleMode,
) -> StitchResult<(PathBuf, ConcatMode)>
where
    E: Encoder + ?Sized,
{
    let fast = work_dir.join(FAST_OUT);
    match encoder.concat_copy(manifest, &fast).await {
        Ok(()) => {
            info!("[STITCHER] Stream-copy concat succeeded");
            return Ok((fast, ConcatMode::Copy));
        }
        Err(e) => warn!(
            "[STITCHER] Stream-copy concat failed ({}); re-encoding at {} fps, scale {}",
            e, fps, scale
        ),
    }

    let reencoded = work_dir.join(REENCODE_OUT);
    encoder
        .concat_reencode(manifest, &reencoded, fps, scale)
        .await?;
    Ok((reencoded, ConcatMode::Reencode))
}

/// Rewrap `source` into `destination` through a hidden staging file next to
/// it, renamed into place only once the rewrap succeeded.
pub async fn finalize<E>(encoder: &E, source: &Path, destination: &Path) -> StitchResult<PathBuf>
where
    E: Encoder + ?Sized,
{
    let staging = staging_path(destination);

    if let Err(e) = encoder.rewrap(source, &staging).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(e);
    }

    if let Err(e) = tokio::fs::rename(&staging, destination).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(StitchError::io(
            format!("failed to move output into {:?}", destination),
            e,
        ));
    }

    Ok(destination.to_path_buf())
}

/// `.<stem>.partial.<ext>` beside `destination`. The extension is kept so
/// the encoder still picks the right container.
pub fn staging_path(destination: &Path) -> PathBuf {
    let stem = destination
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match destination.extension() {
        Some(ext) => format!(".{}.partial.{}", stem, ext.to_string_lossy()),
        None => format!(".{}.partial", stem),
    };
    destination.with_file_name(name)
}

fn create_work_dir(root: Option<&Path>) -> StitchResult<TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(WORK_DIR_PREFIX);
    let dir = match root {
        Some(root) => {
            std::fs::create_dir_all(root)
                .map_err(|e| StitchError::io(format!("failed to create {:?}", root), e))?;
            builder.tempdir_in(root)
        }
        None => builder.tempdir(),
    };
    dir.map_err(|e| StitchError::io("failed to create work directory", e))
}
