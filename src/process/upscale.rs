//! Upscaling.
//!
//! Runs after validation. Every upscaler returns exactly
//! `original * factor` pixels on each axis and scales the pivot with it.

use std::fmt;

use image::imageops::{self, FilterType};
use serde::{Deserialize, Serialize};

use crate::error::{GenError, Result};
use crate::types::{Pivot, ProcessedFrame};

/// Largest output edge an upscaler will produce.
const MAX_OUTPUT_EDGE: u32 = 8192;

pub trait Upscaler: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn upscale(&self, frame: &ProcessedFrame, factor: u32) -> Result<ProcessedFrame>;
}

fn scaled(frame: &ProcessedFrame, factor: u32, filter: FilterType, name: &'static str) -> Result<ProcessedFrame> {
    let factor = factor.max(1);
    if factor == 1 {
        return Ok(frame.clone());
    }

    let (w, h) = frame.size();
    let (tw, th) = match (w.checked_mul(factor), h.checked_mul(factor)) {
        (Some(tw), Some(th)) if tw <= MAX_OUTPUT_EDGE && th <= MAX_OUTPUT_EDGE => (tw, th),
        _ => {
            return Err(GenError::processing(
                name,
                format!("{}x{} at {}x exceeds {}px", w, h, factor, MAX_OUTPUT_EDGE),
            ))
        }
    };

    let image = imageops::resize(frame.image(), tw, th, filter);
    let pivot = frame.pivot();
    Ok(frame
        .with_image(image)
        .with_pivot(Pivot::new(pivot.x * factor, pivot.y * factor)))
}

/// Pixel-perfect block scaling.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestUpscaler;

impl Upscaler for NearestUpscaler {
    fn name(&self) -> &'static str {
        "nearest"
    }

    fn upscale(&self, frame: &ProcessedFrame, factor: u32) -> Result<ProcessedFrame> {
        scaled(frame, factor, FilterType::Nearest, self.name())
    }
}

/// Catmull-Rom interpolation for painted styles.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmoothUpscaler;

impl Upscaler for SmoothUpscaler {
    fn name(&self) -> &'static str {
        "smooth"
    }

    fn upscale(&self, frame: &ProcessedFrame, factor: u32) -> Result<ProcessedFrame> {
        scaled(frame, factor, FilterType::CatmullRom, self.name())
    }
}

/// Configured upscaler choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpscalerKind {
    #[default]
    Nearest,
    Smooth,
}

impl UpscalerKind {
    pub fn upscaler(self) -> Box<dyn Upscaler> {
        match self {
            UpscalerKind::Nearest => Box::new(NearestUpscaler),
            UpscalerKind::Smooth => Box::new(SmoothUpscaler),
        }
    }
}

/// Upscale a whole batch with one upscaler.
pub fn upscale_frames(
    upscaler: &dyn Upscaler,
    frames: &[ProcessedFrame],
    factor: u32,
) -> Result<Vec<ProcessedFrame>> {
    frames.iter().map(|f| upscaler.upscale(f, factor)).collect()
}
