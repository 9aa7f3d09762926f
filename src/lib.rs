// SYNOID Stitch Library
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Assembles rendered shot clips and a music bed into a single trailer.

pub mod config;
pub mod stitch;
