//! Render pipelines and the bind group layouts they are built against.
//!
//! The viewer has a single pipeline for models. The overlay is drawn by
//! `egui-wgpu`, which brings its own.

pub mod basic;
