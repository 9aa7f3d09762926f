// SYNOID Stitch - Natural Order Listing
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Upstream renders number their takes (`shot_2`, `shot_10`), so plain
// lexical order would put take 10 before take 2.

use std::cmp::Ordering;
use std::path::Path;
use walkdir::WalkDir;

/// One run of a split filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPart {
    Text(String),
    Number(u128),
}

impl Ord for KeyPart {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (KeyPart::Number(a), KeyPart::Number(b)) => a.cmp(b),
            (KeyPart::Text(a), KeyPart::Text(b)) => a.cmp(b),
            // Digits sort ahead of letters, same as their code points do.
            (KeyPart::Number(_), KeyPart::Text(_)) => Ordering::Less,
            (KeyPart::Text(_), KeyPart::Number(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for KeyPart {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Split `name` into alternating text/digit runs. Text runs are lowercased,
/// digit runs compare as integers.
pub fn natural_key(name: &str) -> Vec<KeyPart> {
    let mut parts = Vec::new();
    let mut run = String::new();
    let mut in_digits = false;

    for ch in name.chars() {
        let is_digit = ch.is_ascii_digit();
        if !run.is_empty() && is_digit != in_digits {
            parts.push(finish_run(&run, in_digits));
            run.clear();
        }
        in_digits = is_digit;
        run.push(ch);
    }
    if !run.is_empty() {
        parts.push(finish_run(&run, in_digits));
    }
    parts
}

fn finish_run(run: &str, digits: bool) -> KeyPart {
    if digits {
        // Absurdly long digit runs fall back to text rather than overflowing.
        match run.parse::<u128>() {
            Ok(n) => KeyPart::Number(n),
            Err(_) => KeyPart::Text(run.to_string()),
        }
    } else {
        KeyPart::Text(run.to_lowercase())
    }
}

/// Compare two filenames in natural order. Ties on the key are broken on the
/// raw name so the order is total and stable across runs.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_key(a)
        .cmp(&natural_key(b))
        .then_with(|| a.cmp(b))
}

/// Case-insensitive `.ext` suffix check against a set of bare extensions.
pub fn has_extension(name: &str, exts: &[&str]) -> bool {
    let lower = name.to_lowercase();
    exts.iter()
        .any(|e| lower.ends_with(&format!(".{}", e.to_lowercase())))
}

/// List the files directly inside `dir` whose extension is in `exts`,
/// naturally sorted. A missing or unreadable directory lists as empty.
pub fn list_sorted(dir: &Path, exts: &[&str]) -> Vec<String> {
    if !dir.is_dir() {
        return Vec::new();
    }

    let mut names: Vec<String> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.file_name().to_str().map(str::to_string))
        .filter(|name| has_extension(name, exts))
        .collect();

    names.sort_by(|a, b| natural_cmp(a, b));
    names
}
