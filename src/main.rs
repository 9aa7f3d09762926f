// SYNOID Stitch Entry Point
// Copyright (c) 2026 Xing_The_Creator | SYNOID

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use serde_json::Value;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use synoid_stitch::config::{Defaults, JobInput, ScriptConfig};
use synoid_stitch::stitch::{self, FfmpegEncoder, StitchReport};

#[derive(Parser)]
#[command(name = "synoid-stitch")]
#[command(about = "SYNOID Trailer Stitcher", long_about = None)]
struct Cli {
    /// Log at debug level (shows every encoder command line)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve clips and audio, then concat, mux and finalize
    Run(RunArgs),

    /// Hand the job to an external stitch script
    Script {
        /// Script to run (executed directly if it ends in .sh, else via bash -lc)
        #[arg(long)]
        script: Option<PathBuf>,

        /// Clip glob passed to the script
        #[arg(long)]
        glob: Option<String>,

        /// Audio file passed to the script
        #[arg(long)]
        audio: Option<String>,

        #[arg(long)]
        dest_dir: Option<PathBuf>,

        #[arg(long)]
        dest_name: Option<String>,

        /// Write the debug record here instead of stdout
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Check that the encoder binary is runnable
    Check,
}

#[derive(Args)]
struct RunArgs {
    /// Clip filenames or render prefixes, in cut order
    identifiers: Vec<String>,

    /// Clip list as a JSON array string (used when no identifiers are given)
    #[arg(long)]
    items_json: Option<String>,

    /// JSON job file; flags given on the command line override its fields
    #[arg(long)]
    job: Option<PathBuf>,

    /// Single legacy video directory
    #[arg(long)]
    video_dir: Option<PathBuf>,

    /// Ordered search directories as a JSON array string
    #[arg(long)]
    video_dirs_json: Option<String>,

    #[arg(long)]
    audio_dir: Option<PathBuf>,

    #[arg(long)]
    dest_dir: Option<PathBuf>,

    #[arg(long)]
    dest_name: Option<String>,

    /// Audio name prefixes as a JSON array string, tried in order
    #[arg(long)]
    audio_prefixes_json: Option<String>,

    /// Do not fall back to the latest track when no prefix matches
    #[arg(long)]
    no_fallback_audio: bool,

    /// Music gain in dB (-24 to 6)
    #[arg(long, allow_hyphen_values = true)]
    music_gain_db: Option<f64>,

    /// Frame rate for the re-encode path (1 to 120)
    #[arg(long)]
    fps: Option<i64>,

    /// Re-encode frame size as W:H, or "keep"
    #[arg(long)]
    scale: Option<String>,

    /// Parent directory for the per-job work directory
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Write the debug record here instead of stdout
    #[arg(long)]
    report: Option<PathBuf>,
}

impl RunArgs {
    fn into_job_input(self) -> Result<(JobInput, Option<PathBuf>)> {
        let from_file = match &self.job {
            Some(path) => JobInput::from_file(path)?,
            None => JobInput::default(),
        };

        let items = if !self.identifiers.is_empty() {
            Some(Value::Array(self.identifiers.into_iter().map(Value::String).collect()))
        } else {
            self.items_json.map(Value::String)
        };

        let flags = JobInput {
            items,
            video_dir: self.video_dir,
            video_dirs: self.video_dirs_json.map(Value::String),
            audio_dir: self.audio_dir,
            dest_dir: self.dest_dir,
            dest_name: self.dest_name,
            audio_prefixes: self.audio_prefixes_json.map(Value::String),
            fallback_latest_audio: self.no_fallback_audio.then_some(false),
            music_gain_db: self.music_gain_db,
            fps: self.fps,
            scale: self.scale,
            work_dir: self.work_dir,
        };

        Ok((from_file.merge(flags), self.report))
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn emit_report(report: &StitchReport, target: Option<&PathBuf>) -> Result<()> {
    match target {
        Some(path) => report
            .save(path)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("could not save report to {:?}", path)),
        None => {
            println!("{}", report.to_json());
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let defaults = Defaults::from_env();
    let encoder = FfmpegEncoder::new(defaults.ffmpeg.clone());

    match cli.command {
        Commands::Run(args) => {
            let (input, report_path) = args.into_job_input()?;
            let config = input.into_config(&defaults);

            match stitch::run_job_with_report(&config, &encoder).await {
                Ok(outcome) => {
                    println!("{}", outcome.final_path.display());
                    emit_report(&outcome.report, report_path.as_ref())?;
                }
                Err(failure) => {
                    // stdout stays reserved for a finished trailer.
                    match report_path.as_ref() {
                        Some(path) => {
                            if let Err(e) = failure.report.save(path) {
                                error!("[STITCHER] Could not save report to {:?}: {}", path, e);
                            }
                        }
                        None => error!("[STITCHER] Report at failure: {}", failure.report.to_json()),
                    }
                    return Err(anyhow::Error::new(failure.error).context("stitch job failed"));
                }
            }
        }
        Commands::Script {
            script,
            glob,
            audio,
            dest_dir,
            dest_name,
            report,
        } => {
            let mut config = ScriptConfig::from_defaults(&defaults);
            if let Some(script) = script {
                config.script_path = script;
            }
            if let Some(dir) = dest_dir {
                config.dest_dir = dir;
            }
            if let Some(name) = dest_name {
                config.dest_name = name;
            }
            config.glob_override = glob;
            config.audio_override = audio;

            let (final_path, job_report) = stitch::script::run_script(&config)
                .await
                .context("stitch script failed")?;

            println!("{}", final_path.display());
            emit_report(&job_report, report.as_ref())?;
        }
        Commands::Check => match encoder.check_version().await {
            Ok(version) => {
                info!("[CHECK] Encoder OK: {}", version);
                println!("{}", version);
            }
            Err(e) => {
                error!("[CHECK] Encoder {:?} unusable: {}", encoder.program(), e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
