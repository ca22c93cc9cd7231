//! Cross-frame alignment.
//!
//! Every frame is re-composited onto a blank canvas so that its content
//! pivot lands on the reference pivot taken from the first frame.

use image::imageops;
use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::error::{GenError, Result};
use crate::types::{content_bounds, Pivot, ProcessedFrame};

use super::Transform;

/// Which point of the content box is lined up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    #[default]
    Center,
    /// Bottom-centre, so feet stay on the ground line.
    Bottom,
}

impl Anchor {
    /// The content pivot of an image, or the canvas centre when it is empty.
    pub fn pivot_of(self, image: &RgbaImage) -> Pivot {
        match content_bounds(image) {
            Some(bounds) => match self {
                Anchor::Center => bounds.centre(),
                Anchor::Bottom => bounds.bottom_centre(),
            },
            None => Pivot::centre_of(image.width(), image.height()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Align {
    anchor: Anchor,
}

impl Align {
    pub fn new(anchor: Anchor) -> Self {
        Self { anchor }
    }
}

impl Transform for Align {
    fn name(&self) -> &'static str {
        "align"
    }

    fn apply(&self, frames: &[ProcessedFrame]) -> Result<Vec<ProcessedFrame>> {
        let Some(first) = frames.first() else {
            return Ok(Vec::new());
        };

        let size = first.size();
        if let Some(odd) = frames.iter().find(|f| f.size() != size) {
            return Err(GenError::processing(
                self.name(),
                format!(
                    "frame {} is {}x{}, expected {}x{}",
                    odd.index(),
                    odd.width(),
                    odd.height(),
                    size.0,
                    size.1
                ),
            ));
        }

        let reference = self.anchor.pivot_of(first.image());

        Ok(frames
            .iter()
            .map(|frame| {
                let own = self.anchor.pivot_of(frame.image());
                let dx = reference.x as i64 - own.x as i64;
                let dy = reference.y as i64 - own.y as i64;

                let image = if dx == 0 && dy == 0 {
                    frame.image().clone()
                } else {
                    let mut canvas = RgbaImage::new(size.0, size.1);
                    imageops::overlay(&mut canvas, frame.image(), dx, dy);
                    canvas
                };
                frame.with_image(image).with_pivot(reference)
            })
            .collect())
    }
}
