// SYNOID Stitch - Job Configuration
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// The stitcher is driven by loosely-typed input (CLI flags, JSON job files
// written by other tools). This module is the only place that input is
// interpreted: malformed values are replaced by defaults with a warning, and
// the rest of the crate only ever sees a validated `StitchConfig`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::warn;

pub const DEFAULT_VIDEO_DIR: &str = "/workspace/ComfyUI/output/video";
pub const DEFAULT_AUDIO_DIR: &str = "/workspace/ComfyUI/output/audio";
pub const DEFAULT_DEST_DIR: &str = "/workspace/trailer_output";
pub const DEFAULT_DEST_NAME: &str = "trailer_final.mp4";
pub const DEFAULT_FFMPEG: &str = "ffmpeg";
pub const DEFAULT_SCRIPT: &str = "/workspace/stitch_trailer.sh";

pub const DEFAULT_MUSIC_GAIN_DB: f64 = -8.0;
pub const MUSIC_GAIN_RANGE: (f64, f64) = (-24.0, 6.0);
pub const DEFAULT_FPS: u32 = 24;
pub const FPS_RANGE: (u32, u32) = (1, 120);

/// Output frame geometry for the re-encode path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum ScaleMode {
    /// Normalise pixel format and frame rate only.
    Keep,
    /// Letterbox/pillarbox every clip into exactly this size.
    Fixed { width: u32, height: u32 },
}

impl Default for ScaleMode {
    fn default() -> Self {
        ScaleMode::Fixed {
            width: 1920,
            height: 1080,
        }
    }
}

impl fmt::Display for ScaleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaleMode::Keep => write!(f, "keep"),
            ScaleMode::Fixed { width, height } => write!(f, "{}:{}", width, height),
        }
    }
}

impl From<ScaleMode> for String {
    fn from(scale: ScaleMode) -> Self {
        scale.to_string()
    }
}

impl FromStr for ScaleMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("keep") {
            return Ok(ScaleMode::Keep);
        }
        let (w, h) = s
            .split_once(':')
            .ok_or_else(|| format!("expected W:H or keep, got '{}'", s))?;
        let width: u32 = w.trim().parse().map_err(|_| format!("bad width in '{}'", s))?;
        let height: u32 = h.trim().parse().map_err(|_| format!("bad height in '{}'", s))?;
        if width == 0 || height == 0 {
            return Err(format!("zero dimension in '{}'", s));
        }
        Ok(ScaleMode::Fixed { width, height })
    }
}

/// Process-wide defaults. Read from the environment by the binary, never by
/// the pipeline itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Defaults {
    pub video_dir: PathBuf,
    pub audio_dir: PathBuf,
    pub dest_dir: PathBuf,
    pub dest_name: String,
    pub ffmpeg: PathBuf,
    pub script_path: PathBuf,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            video_dir: PathBuf::from(DEFAULT_VIDEO_DIR),
            audio_dir: PathBuf::from(DEFAULT_AUDIO_DIR),
            dest_dir: PathBuf::from(DEFAULT_DEST_DIR),
            dest_name: DEFAULT_DEST_NAME.to_string(),
            ffmpeg: PathBuf::from(DEFAULT_FFMPEG),
            script_path: PathBuf::from(DEFAULT_SCRIPT),
        }
    }
}

impl Defaults {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build defaults from any key lookup; unset or empty keys keep the
    /// built-in value. Each setting also answers to the key the rest of the
    /// render pipeline already exports (`COMFY_VIDEO_DIR`, `TRAILER_DEST_DIR`,
    /// ...), consulted when the `STITCH_*` key is unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |keys: &[&str]| {
            keys.iter()
                .find_map(|key| lookup(key).filter(|v| !v.trim().is_empty()))
        };
        let base = Self::default();
        Self {
            video_dir: get(&["STITCH_VIDEO_DIR", "COMFY_VIDEO_DIR"])
                .map(PathBuf::from)
                .unwrap_or(base.video_dir),
            audio_dir: get(&["STITCH_AUDIO_DIR", "COMFY_AUDIO_DIR"])
                .map(PathBuf::from)
                .unwrap_or(base.audio_dir),
            dest_dir: get(&["STITCH_DEST_DIR", "TRAILER_DEST_DIR"])
                .map(PathBuf::from)
                .unwrap_or(base.dest_dir),
            dest_name: get(&["STITCH_DEST_NAME", "TRAILER_DEST_NAME"]).unwrap_or(base.dest_name),
            ffmpeg: get(&["FFMPEG_PATH"]).map(PathBuf::from).unwrap_or(base.ffmpeg),
            script_path: get(&["STITCH_SCRIPT_PATH"])
                .map(PathBuf::from)
                .unwrap_or(base.script_path),
        }
    }

    /// Rendered clips live in the video dir; older jobs left them next to
    /// the trailer output, which is searched second.
    pub fn search_dirs(&self) -> Vec<PathBuf> {
        vec![self.video_dir.clone(), self.dest_dir.clone()]
    }
}

/// Validated settings for one stitch job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StitchConfig {
    pub identifiers: Vec<String>,
    pub search_dirs: Vec<PathBuf>,
    pub audio_dir: PathBuf,
    pub dest_dir: PathBuf,
    pub dest_name: String,
    pub audio_prefixes: Vec<String>,
    pub fallback_latest_audio: bool,
    pub music_gain_db: f64,
    pub fps: u32,
    pub scale: ScaleMode,
    /// Parent for the per-job work directory. System temp dir when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_root: Option<PathBuf>,
}

impl StitchConfig {
    /// A config with every optional setting at its default.
    pub fn new(
        identifiers: Vec<String>,
        search_dirs: Vec<PathBuf>,
        audio_dir: impl Into<PathBuf>,
        dest_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            identifiers,
            search_dirs,
            audio_dir: audio_dir.into(),
            dest_dir: dest_dir.into(),
            dest_name: DEFAULT_DEST_NAME.to_string(),
            audio_prefixes: Vec::new(),
            fallback_latest_audio: true,
            music_gain_db: DEFAULT_MUSIC_GAIN_DB,
            fps: DEFAULT_FPS,
            scale: ScaleMode::default(),
            work_root: None,
        }
    }

    pub fn destination(&self) -> PathBuf {
        self.dest_dir.join(&self.dest_name)
    }
}

/// Settings for the external stitch-script mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScriptConfig {
    pub script_path: PathBuf,
    pub dest_dir: PathBuf,
    pub dest_name: String,
    pub glob_override: Option<String>,
    pub audio_override: Option<String>,
}

impl ScriptConfig {
    pub fn from_defaults(defaults: &Defaults) -> Self {
        Self {
            script_path: defaults.script_path.clone(),
            dest_dir: defaults.dest_dir.clone(),
            dest_name: defaults.dest_name.clone(),
            glob_override: None,
            audio_override: None,
        }
    }

    pub fn destination(&self) -> PathBuf {
        self.dest_dir.join(&self.dest_name)
    }
}

/// Raw job description as other tools hand it over.
///
/// List fields accept either a JSON array or a string holding one, since
/// upstream tools pass lists through text widgets. Scalar fields of the
/// wrong type are dropped with a warning, so the field takes its default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JobInput {
    #[serde(alias = "identifiers", alias = "prefixes")]
    pub items: Option<Value>,
    #[serde(deserialize_with = "loose::path")]
    pub video_dir: Option<PathBuf>,
    #[serde(alias = "search_dirs")]
    pub video_dirs: Option<Value>,
    #[serde(deserialize_with = "loose::path")]
    pub audio_dir: Option<PathBuf>,
    #[serde(deserialize_with = "loose::path")]
    pub dest_dir: Option<PathBuf>,
    #[serde(deserialize_with = "loose::string")]
    pub dest_name: Option<String>,
    pub audio_prefixes: Option<Value>,
    #[serde(deserialize_with = "loose::flag")]
    pub fallback_latest_audio: Option<bool>,
    #[serde(deserialize_with = "loose::number")]
    pub music_gain_db: Option<f64>,
    #[serde(deserialize_with = "loose::whole_number")]
    pub fps: Option<i64>,
    #[serde(deserialize_with = "loose::string")]
    pub scale: Option<String>,
    #[serde(deserialize_with = "loose::path")]
    pub work_dir: Option<PathBuf>,
}

/// Tolerant readers for `JobInput` scalars. Each accepts any JSON value and
/// yields `None` (with a warning) when it cannot be read as the field type.
mod loose {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;
    use std::path::PathBuf;
    use tracing::warn;

    fn read<'de, D, T>(deserializer: D, what: &str, convert: fn(&Value) -> Option<T>) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        if value.is_null() {
            return Ok(None);
        }
        let converted = convert(&value);
        if converted.is_none() {
            warn!("[CONFIG] Ignoring {} where {} was expected", value, what);
        }
        Ok(converted)
    }

    pub fn string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        read(deserializer, "a string", |v| v.as_str().map(str::to_string))
    }

    pub fn path<'de, D>(deserializer: D) -> Result<Option<PathBuf>, D::Error>
    where
        D: Deserializer<'de>,
    {
        read(deserializer, "a path", |v| {
            v.as_str().filter(|s| !s.trim().is_empty()).map(PathBuf::from)
        })
    }

    pub fn flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        read(deserializer, "true/false", as_flag)
    }

    pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        read(deserializer, "a number", as_number)
    }

    /// Fractional values (`23.976`) round to the nearest integer.
    pub fn whole_number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        read(deserializer, "an integer", |v| match v.as_i64() {
            Some(n) => Some(n),
            None => as_number(v)
                .filter(|n| n.is_finite())
                .map(|n| n.round() as i64),
        })
    }

    fn as_number(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    fn as_flag(value: &Value) -> Option<bool> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Some(false),
                Some(1) => Some(true),
                _ => None,
            },
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Some(true),
                "false" | "no" | "off" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Outcome of reading one list-valued field.
#[derive(Debug, Clone, PartialEq)]
pub enum ListField {
    Absent,
    List(Vec<String>),
    Malformed,
}

/// Interpret a loosely-typed list. Non-string and blank entries are dropped.
pub fn parse_string_list(value: Option<&Value>) -> ListField {
    let value = match value {
        None | Some(Value::Null) => return ListField::Absent,
        Some(v) => v,
    };

    let parsed;
    let items = match value {
        Value::Array(items) => items,
        Value::String(text) if text.trim().is_empty() => return ListField::List(Vec::new()),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Array(items)) => {
                parsed = items;
                &parsed
            }
            _ => return ListField::Malformed,
        },
        _ => return ListField::Malformed,
    };

    ListField::List(
        items
            .iter()
            .filter_map(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .collect(),
    )
}

impl JobInput {
    /// Load a JSON job file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read job file {:?}", path))?;
        serde_json::from_str(&text)
            .with_context(|| format!("job file {:?} is not valid JSON with a top-level object", path))
    }

    /// Fields set in `overrides` replace the ones in `self`.
    pub fn merge(self, overrides: JobInput) -> JobInput {
        JobInput {
            items: overrides.items.or(self.items),
            video_dir: overrides.video_dir.or(self.video_dir),
            video_dirs: overrides.video_dirs.or(self.video_dirs),
            audio_dir: overrides.audio_dir.or(self.audio_dir),
            dest_dir: overrides.dest_dir.or(self.dest_dir),
            dest_name: overrides.dest_name.or(self.dest_name),
            audio_prefixes: overrides.audio_prefixes.or(self.audio_prefixes),
            fallback_latest_audio: overrides.fallback_latest_audio.or(self.fallback_latest_audio),
            music_gain_db: overrides.music_gain_db.or(self.music_gain_db),
            fps: overrides.fps.or(self.fps),
            scale: overrides.scale.or(self.scale),
            work_dir: overrides.work_dir.or(self.work_dir),
        }
    }

    /// Parse-or-default into a validated config. Never fails.
    pub fn into_config(self, defaults: &Defaults) -> StitchConfig {
        let identifiers = match parse_string_list(self.items.as_ref()) {
            ListField::List(items) => items,
            ListField::Absent => Vec::new(),
            ListField::Malformed => {
                warn!("[CONFIG] Clip list is not a JSON list; treating it as empty");
                Vec::new()
            }
        };

        let legacy_dir = self.video_dir.clone().unwrap_or_else(|| defaults.video_dir.clone());
        let search_dirs = match parse_string_list(self.video_dirs.as_ref()) {
            ListField::List(dirs) => dirs.into_iter().map(PathBuf::from).collect(),
            ListField::Absent => match self.video_dir {
                Some(dir) => vec![dir, defaults.dest_dir.clone()],
                None => defaults.search_dirs(),
            },
            ListField::Malformed => {
                warn!("[CONFIG] Video dir list is malformed; searching only {:?}", legacy_dir);
                vec![legacy_dir]
            }
        };

        let audio_prefixes = match parse_string_list(self.audio_prefixes.as_ref()) {
            ListField::List(prefixes) => prefixes,
            ListField::Absent => Vec::new(),
            ListField::Malformed => {
                warn!("[CONFIG] Audio prefix list is malformed; ignoring it");
                Vec::new()
            }
        };

        let music_gain_db = match self.music_gain_db {
            Some(gain) if gain.is_finite() => {
                let clamped = gain.clamp(MUSIC_GAIN_RANGE.0, MUSIC_GAIN_RANGE.1);
                if clamped != gain {
                    warn!("[CONFIG] Music gain {}dB out of range, using {}dB", gain, clamped);
                }
                clamped
            }
            Some(gain) => {
                warn!("[CONFIG] Music gain {} is not a number, using default", gain);
                DEFAULT_MUSIC_GAIN_DB
            }
            None => DEFAULT_MUSIC_GAIN_DB,
        };

        let fps = match self.fps {
            Some(fps) => {
                let clamped = fps.clamp(FPS_RANGE.0 as i64, FPS_RANGE.1 as i64) as u32;
                if clamped as i64 != fps {
                    warn!("[CONFIG] fps {} out of range, using {}", fps, clamped);
                }
                clamped
            }
            None => DEFAULT_FPS,
        };

        let scale = match self.scale.as_deref() {
            Some(text) => text.parse().unwrap_or_else(|e| {
                warn!("[CONFIG] Invalid scale ({}), using {}", e, ScaleMode::default());
                ScaleMode::default()
            }),
            None => ScaleMode::default(),
        };

        StitchConfig {
            identifiers,
            search_dirs,
            audio_dir: self.audio_dir.unwrap_or_else(|| defaults.audio_dir.clone()),
            dest_dir: self.dest_dir.unwrap_or_else(|| defaults.dest_dir.clone()),
            dest_name: self
                .dest_name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| defaults.dest_name.clone()),
            audio_prefixes,
            fallback_latest_audio: self.fallback_latest_audio.unwrap_or(true),
            music_gain_db,
            fps,
            scale,
            work_root: self.work_dir,
        }
    }
}
