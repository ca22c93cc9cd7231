//! Background isolation.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use image::{Rgba, RgbaImage};

use crate::error::{GenError, Result};
use crate::types::{Colour, ProcessedFrame};

use super::Transform;

/// Separates foreground from background in one image.
pub trait IsolationModel: Send + Sync + fmt::Debug {
    /// Whether the model can run at all.
    fn available(&self) -> bool {
        true
    }

    /// Return a copy with background pixels made fully transparent.
    fn isolate(&self, image: &RgbaImage) -> Result<RgbaImage>;
}

/// Keys out a uniform border colour.
///
/// Flood-fills from every edge pixel whose colour is within `tolerance`
/// of the dominant edge colour. Frames whose border is already
/// transparent, or has no dominant colour, are returned unchanged.
#[derive(Debug, Clone, Copy)]
pub struct BorderKeyModel {
    pub tolerance: u32,
}

impl Default for BorderKeyModel {
    fn default() -> Self {
        Self { tolerance: 1200 }
    }
}

impl BorderKeyModel {
    fn border_key(image: &RgbaImage) -> Option<Colour> {
        let (w, h) = image.dimensions();
        let mut border = Vec::with_capacity(2 * (w + h) as usize);
        for x in 0..w {
            border.push(Colour::from(*image.get_pixel(x, 0)));
            border.push(Colour::from(*image.get_pixel(x, h - 1)));
        }
        for y in 0..h {
            border.push(Colour::from(*image.get_pixel(0, y)));
            border.push(Colour::from(*image.get_pixel(w - 1, y)));
        }

        let mut counts = std::collections::HashMap::new();
        for c in &border {
            *counts.entry(*c).or_insert(0usize) += 1;
        }
        let (key, count) = counts.into_iter().max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))?;

        // Needs at least half the border to count as a backdrop.
        (count * 2 >= border.len() && !key.is_transparent()).then_some(key)
    }
}

impl IsolationModel for BorderKeyModel {
    fn isolate(&self, image: &RgbaImage) -> Result<RgbaImage> {
        let (w, h) = image.dimensions();
        if w == 0 || h == 0 {
            return Ok(image.clone());
        }
        let Some(key) = Self::border_key(image) else {
            return Ok(image.clone());
        };

        let matches = |x: u32, y: u32| {
            let c = Colour::from(*image.get_pixel(x, y));
            !c.is_transparent() && c.distance(key) <= self.tolerance
        };

        let mut out = image.clone();
        let mut seen = vec![false; (w * h) as usize];
        let mut queue = VecDeque::new();

        let edges = (0..w)
            .flat_map(|x| [(x, 0), (x, h - 1)])
            .chain((0..h).flat_map(|y| [(0, y), (w - 1, y)]));
        for (x, y) in edges {
            let i = (y * w + x) as usize;
            if !seen[i] && matches(x, y) {
                seen[i] = true;
                queue.push_back((x, y));
            }
        }

        while let Some((x, y)) = queue.pop_front() {
            out.put_pixel(x, y, Rgba([0, 0, 0, 0]));

            let neighbours = [
                (x.wrapping_sub(1), y),
                (x + 1, y),
                (x, y.wrapping_sub(1)),
                (x, y + 1),
            ];
            for (nx, ny) in neighbours {
                if nx >= w || ny >= h {
                    continue;
                }
                let i = (ny * w + nx) as usize;
                if !seen[i] && matches(nx, ny) {
                    seen[i] = true;
                    queue.push_back((nx, ny));
                }
            }
        }

        Ok(out)
    }
}

/// Background isolation transform.
#[derive(Debug, Clone)]
pub struct Isolate {
    model: Arc<dyn IsolationModel>,
}

impl Isolate {
    pub fn new(model: Arc<dyn IsolationModel>) -> Self {
        Self { model }
    }
}

impl Transform for Isolate {
    fn name(&self) -> &'static str {
        "isolate"
    }

    fn apply(&self, frames: &[ProcessedFrame]) -> Result<Vec<ProcessedFrame>> {
        if !self.model.available() {
            return Err(GenError::processing(self.name(), "isolation model unavailable"));
        }

        frames
            .iter()
            .map(|frame| Ok(frame.with_image(self.model.isolate(frame.image())?)))
            .collect()
    }
}
