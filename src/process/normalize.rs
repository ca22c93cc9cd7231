//! Size normalization.

use image::imageops::{self, FilterType};
use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::error::{GenError, Result};
use crate::types::{GenerationSpec, Pivot, ProcessedFrame, Resolution};

use super::Transform;

/// How a frame is fitted into the target size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fit {
    /// Scale to fit inside, keep aspect ratio, pad with transparency.
    #[default]
    Contain,
    /// Scale each axis independently to fill.
    Stretch,
}

/// Resizes every frame to the batch's target resolution.
#[derive(Debug, Clone, Copy)]
pub struct Normalize {
    target: Resolution,
    fit: Fit,
    filter: FilterType,
}

impl Normalize {
    pub fn new(target: Resolution, fit: Fit, pixel_art: bool) -> Self {
        Self {
            target,
            fit,
            filter: if pixel_art {
                FilterType::Nearest
            } else {
                FilterType::Triangle
            },
        }
    }

    pub fn for_spec(spec: &GenerationSpec, fit: Fit) -> Self {
        Self::new(spec.resolution(), fit, spec.style().is_pixel_art())
    }

    /// Normalize one image. Already-normalized images come back unchanged.
    pub fn resize(&self, image: &RgbaImage) -> RgbaImage {
        let (tw, th) = (self.target.width, self.target.height);
        let (w, h) = image.dimensions();
        if (w, h) == (tw, th) {
            return image.clone();
        }

        match self.fit {
            Fit::Stretch => imageops::resize(image, tw, th, self.filter),
            Fit::Contain => {
                let scale = (tw as f64 / w as f64).min(th as f64 / h as f64);
                let sw = ((w as f64 * scale).round() as u32).clamp(1, tw);
                let sh = ((h as f64 * scale).round() as u32).clamp(1, th);
                let scaled = imageops::resize(image, sw, sh, self.filter);

                let mut canvas = RgbaImage::new(tw, th);
                imageops::replace(&mut canvas, &scaled, ((tw - sw) / 2) as i64, ((th - sh) / 2) as i64);
                canvas
            }
        }
    }
}

impl Transform for Normalize {
    fn name(&self) -> &'static str {
        "normalize"
    }

    fn apply(&self, frames: &[ProcessedFrame]) -> Result<Vec<ProcessedFrame>> {
        if let Some(empty) = frames.iter().find(|f| f.width() == 0 || f.height() == 0) {
            return Err(GenError::processing(
                self.name(),
                format!("frame {} has no pixels", empty.index()),
            ));
        }

        Ok(frames
            .iter()
            .map(|frame| {
                let image = self.resize(frame.image());
                let pivot = Pivot::centre_of(image.width(), image.height());
                frame.with_image(image).with_pivot(pivot)
            })
            .collect())
    }
}
