//! Frame buffers flowing through the pipeline.
//!
//! A [`RawFrame`] is what a generator produced. A [`ProcessedFrame`] is a raw
//! frame after zero or more post-processing transforms. Neither is mutated in
//! place: transforms build new values, so a failed transform can always fall
//! back to its untouched input.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use super::Colour;

/// A point in frame pixel coordinates used to line frames up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pivot {
    pub x: u32,
    pub y: u32,
}

impl Pivot {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Centre of a `width` x `height` canvas.
    pub fn centre_of(width: u32, height: u32) -> Self {
        Self::new(width / 2, height / 2)
    }
}

/// Inclusive-exclusive bounding box of non-transparent pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentBounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ContentBounds {
    /// Geometric centre of the box.
    pub fn centre(&self) -> Pivot {
        Pivot::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Bottom-centre of the box (where a character's feet are).
    pub fn bottom_centre(&self) -> Pivot {
        Pivot::new(self.x + self.width / 2, self.y + self.height.saturating_sub(1))
    }
}

/// Find the bounding box of every pixel with non-zero alpha.
pub fn content_bounds(image: &RgbaImage) -> Option<ContentBounds> {
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0;
    let mut max_y = 0;
    let mut found = false;

    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel[3] == 0 {
            continue;
        }
        found = true;
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }

    found.then(|| ContentBounds {
        x: min_x,
        y: min_y,
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
    })
}

/// One generated image buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    index: usize,
    image: RgbaImage,
}

impl RawFrame {
    pub fn new(index: usize, image: RgbaImage) -> Self {
        Self { index, image }
    }

    /// Position of this frame in its batch.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

/// A frame that has entered the post-processing chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedFrame {
    index: usize,
    image: RgbaImage,
    pivot: Pivot,
    palette: Vec<Colour>,
}

impl ProcessedFrame {
    /// Wrap a raw frame, pivoting on the canvas centre with no palette yet.
    pub fn from_raw(raw: RawFrame) -> Self {
        let pivot = Pivot::centre_of(raw.width(), raw.height());
        Self {
            index: raw.index,
            image: raw.image,
            pivot,
            palette: Vec::new(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn pivot(&self) -> Pivot {
        self.pivot
    }

    /// Dominant colours, most frequent first. Empty until palette extraction runs.
    pub fn palette(&self) -> &[Colour] {
        &self.palette
    }

    /// A copy of this frame with a new image, keeping index, pivot and palette.
    pub fn with_image(&self, image: RgbaImage) -> Self {
        Self {
            index: self.index,
            image,
            pivot: self.pivot,
            palette: self.palette.clone(),
        }
    }

    pub fn with_pivot(self, pivot: Pivot) -> Self {
        Self { pivot, ..self }
    }

    pub fn with_palette(self, palette: Vec<Colour>) -> Self {
        Self { palette, ..self }
    }

    /// Whether any pixel is less than fully opaque.
    pub fn has_transparency(&self) -> bool {
        self.image.pixels().any(|p| p[3] < 255)
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}
