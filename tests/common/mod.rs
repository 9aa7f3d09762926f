// Shared fixtures for the stitch integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use synoid_stitch::config::ScaleMode;
use synoid_stitch::stitch::{Encoder, StitchError, StitchResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ConcatCopy,
    ConcatReencode { fps: u32, scale: ScaleMode },
    Mux { audio: PathBuf, gain_db: f64 },
    Rewrap { dest: PathBuf },
}

/// Encoder double. Writes small text "media" files so stage outputs can be
/// traced through to the destination.
#[derive(Default)]
pub struct FakeEncoder {
    pub fail_copy: bool,
    pub fail_reencode: bool,
    pub fail_mux: bool,
    pub fail_rewrap: bool,
    /// Delete the job's work dir during rewrap, so its clean-up has nothing left to remove.
    pub remove_work_dir_on_rewrap: bool,
    pub calls: Mutex<Vec<Call>>,
    pub manifests: Mutex<Vec<String>>,
}

impl FakeEncoder {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn manifests(&self) -> Vec<String> {
        self.manifests.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn failure(stage: &'static str) -> StitchError {
        StitchError::ToolFailed {
            stage,
            reason: format!("simulated {} failure", stage),
        }
    }
}

#[async_trait]
impl Encoder for FakeEncoder {
    fn describe(&self) -> String {
        "fake-ffmpeg".to_string()
    }

    async fn concat_copy(&self, manifest: &Path, out: &Path) -> StitchResult<()> {
        self.record(Call::ConcatCopy);
        let list = fs::read_to_string(manifest).unwrap();
        self.manifests.lock().unwrap().push(list.clone());
        if self.fail_copy {
            return Err(Self::failure("stream-copy concat"));
        }
        fs::write(out, format!("copy\n{}", list)).unwrap();
        Ok(())
    }

    async fn concat_reencode(
        &self,
        manifest: &Path,
        out: &Path,
        fps: u32,
        scale: &ScaleMode,
    ) -> StitchResult<()> {
        self.record(Call::ConcatReencode { fps, scale: *scale });
        if self.fail_reencode {
            return Err(Self::failure("re-encode concat"));
        }
        let list = fs::read_to_string(manifest).unwrap();
        fs::write(out, format!("reencode {} {}\n{}", fps, scale, list)).unwrap();
        Ok(())
    }

    async fn mux_audio(&self, video: &Path, audio: &Path, out: &Path, gain_db: f64) -> StitchResult<()> {
        self.record(Call::Mux {
            audio: audio.to_path_buf(),
            gain_db,
        });
        if self.fail_mux {
            return Err(Self::failure("audio mux"));
        }
        let video = fs::read_to_string(video).unwrap();
        fs::write(out, format!("{}+audio {}\n", video, audio.display())).unwrap();
        Ok(())
    }

    async fn rewrap(&self, src: &Path, dest: &Path) -> StitchResult<()> {
        self.record(Call::Rewrap {
            dest: dest.to_path_buf(),
        });
        if self.fail_rewrap {
            fs::write(dest, b"half-written").unwrap();
            return Err(Self::failure("finalize"));
        }
        fs::copy(src, dest).unwrap();
        if self.remove_work_dir_on_rewrap {
            fs::remove_dir_all(src.parent().unwrap()).unwrap();
        }
        Ok(())
    }
}

pub fn touch(dir: &Path, name: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let p = dir.join(name);
    fs::write(&p, name.as_bytes()).unwrap();
    p
}

pub fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

pub fn is_empty_dir(dir: &Path) -> bool {
    fs::read_dir(dir).map(|mut d| d.next().is_none()).unwrap_or(true)
}
