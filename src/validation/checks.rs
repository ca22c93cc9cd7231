//! Individual validation checks.
//!
//! Each check looks at the whole batch and returns at most one violation.

use std::collections::HashSet;

use crate::types::{GenerationSpec, ProcessedFrame};

use super::violation::{Violation, ViolationKind};

/// Every frame must match the generation spec resolution.
pub fn check_dimensions(frames: &[ProcessedFrame], spec: &GenerationSpec) -> Option<Violation> {
    let expected = spec.resolution();
    let wrong: Vec<String> = frames
        .iter()
        .filter(|f| f.size() != (expected.width, expected.height))
        .map(|f| format!("#{} is {}x{}", f.index(), f.width(), f.height()))
        .collect();

    if wrong.is_empty() {
        return None;
    }
    Some(
        Violation::error(
            ViolationKind::Dimensions,
            format!("expected {} frames, but {}", expected, wrong.join(", ")),
        )
        .with_help("Enable post-processing so frames are normalized"),
    )
}

/// Every frame must contain transparent pixels when transparency is required.
pub fn check_transparency(frames: &[ProcessedFrame], spec: &GenerationSpec) -> Option<Violation> {
    if !spec.constraints().require_transparency {
        return None;
    }

    let opaque: Vec<String> = frames
        .iter()
        .filter(|f| !f.has_transparency())
        .map(|f| format!("#{}", f.index()))
        .collect();

    if opaque.is_empty() {
        return None;
    }
    Some(
        Violation::error(
            ViolationKind::Transparency,
            format!("frames {} have no transparent pixels", opaque.join(", ")),
        )
        .with_help("Background isolation may have been skipped"),
    )
}

/// Distinct visible RGB colours across the batch, ignoring alpha.
pub fn colour_count(frames: &[ProcessedFrame]) -> usize {
    frames
        .iter()
        .flat_map(|f| f.image().pixels())
        .filter(|p| p[3] > 0)
        .map(|p| [p[0], p[1], p[2]])
        .collect::<HashSet<_>>()
        .len()
}

/// The batch must not use more than `maxColors` colours.
pub fn check_palette(frames: &[ProcessedFrame], spec: &GenerationSpec) -> Option<Violation> {
    let max = spec.constraints().max_colors?;
    let count = colour_count(frames);

    (count > max).then(|| {
        Violation::error(
            ViolationKind::Palette,
            format!("uses {} colours, limit is {}", count, max),
        )
        .with_help("Enable post-processing so frames are quantized")
    })
}

/// The batch must have exactly `frameCount` frames.
pub fn check_frame_count(frames: &[ProcessedFrame], spec: &GenerationSpec) -> Option<Violation> {
    let expected = spec.frame_count() as usize;
    (frames.len() != expected).then(|| {
        Violation::error(
            ViolationKind::FrameCount,
            format!("expected {} frames, got {}", expected, frames.len()),
        )
    })
}

/// Pixel-aligned output should have no partially transparent pixels.
pub fn check_pixel_alignment(frames: &[ProcessedFrame], spec: &GenerationSpec) -> Option<Violation> {
    if !spec.constraints().require_pixel_alignment {
        return None;
    }

    let soft = frames
        .iter()
        .flat_map(|f| f.image().pixels())
        .filter(|p| p[3] > 0 && p[3] < 255)
        .count();

    (soft > 0).then(|| {
        Violation::warning(
            ViolationKind::PixelAlignment,
            format!("{} partially transparent pixels", soft),
        )
    })
}
