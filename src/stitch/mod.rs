// SYNOID Stitch Modules
// Copyright (c) 2026 Xing_The_Creator | SYNOID

pub mod audio;
pub mod encoder;
pub mod error;
pub mod manifest;
pub mod natural;
pub mod pipeline;
pub mod report;
pub mod resolver;
pub mod script;

pub use encoder::{Encoder, FfmpegEncoder};
pub use error::{StitchError, StitchResult};
pub use pipeline::{run_job, run_job_with_report, JobFailure, StitchOutcome};
pub use report::{ConcatMode, StitchReport};
