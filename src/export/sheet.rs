//! Sprite sheet packer.
//!
//! Packs frames into a single image either in one row or in a fixed-column
//! grid, recording each frame's bounds on the sheet.

use std::fmt;
use std::str::FromStr;

use image::{imageops, RgbaImage};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{GenError, Result};
use crate::types::ProcessedFrame;

/// Where a frame sits on the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    pub fn overlaps(&self, other: &Bounds) -> bool {
        self.x < other.right() && other.x < self.right() && self.y < other.bottom() && other.y < self.bottom()
    }
}

/// Largest sheet area, in pixels, the packer will allocate.
pub const MAX_SHEET_PIXELS: u64 = 1 << 28;

/// Frame arrangement on the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// All frames left to right in one row.
    #[default]
    Horizontal,
    /// Rows of at most `columns` frames.
    Grid { columns: u32 },
}

impl FromStr for Layout {
    type Err = GenError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if s == "horizontal" || s == "row" {
            return Ok(Layout::Horizontal);
        }
        if let Some(columns) = s.strip_prefix("grid:") {
            if let Ok(columns) = columns.trim().parse::<u32>() {
                if columns > 0 {
                    return Ok(Layout::Grid { columns });
                }
            }
        }
        Err(GenError::Config {
            message: format!("Unknown sheet layout '{}'", s),
            help: Some("Use 'horizontal' or 'grid:<columns>'".to_string()),
        })
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Horizontal => write!(f, "horizontal"),
            Layout::Grid { columns } => write!(f, "grid:{}", columns),
        }
    }
}

impl Serialize for Layout {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Layout {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A packed sheet and the bounds of every frame in input order.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub image: RgbaImage,
    pub bounds: Vec<Bounds>,
    pub padding: u32,
}

impl Sheet {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SheetPacker {
    pub layout: Layout,
    pub padding: u32,
}

impl SheetPacker {
    pub fn new(layout: Layout, padding: u32) -> Self {
        Self { layout, padding }
    }

    /// Pack frames. Cells are sized to the largest frame; each frame sits at
    /// its cell's top-left corner.
    ///
    /// Fails when the sheet would not fit in `u32` coordinates or would
    /// exceed [`MAX_SHEET_PIXELS`].
    pub fn pack(&self, frames: &[ProcessedFrame]) -> Result<Sheet> {
        if frames.is_empty() {
            return Ok(Sheet {
                image: RgbaImage::new(0, 0),
                bounds: Vec::new(),
                padding: self.padding,
            });
        }

        let cell_w = frames.iter().map(ProcessedFrame::width).max().unwrap_or(0);
        let cell_h = frames.iter().map(ProcessedFrame::height).max().unwrap_or(0);
        let count = frames.len() as u32;
        let columns = match self.layout {
            Layout::Horizontal => count,
            Layout::Grid { columns } => columns.min(count).max(1),
        };
        let rows = count.div_ceil(columns);

        let too_large = || GenError::Export {
            message: format!(
                "{} frames of {}x{} with {}px padding do not fit on one sheet",
                count, cell_w, cell_h, self.padding
            ),
            help: Some("Reduce padding, upscale or frame count".to_string()),
        };
        let span = |cells: u32, size: u32| {
            cells
                .checked_mul(size)?
                .checked_add(cells.saturating_sub(1).checked_mul(self.padding)?)
        };
        let width = span(columns, cell_w).ok_or_else(too_large)?;
        let height = span(rows, cell_h).ok_or_else(too_large)?;
        if u64::from(width) * u64::from(height) > MAX_SHEET_PIXELS {
            return Err(too_large());
        }

        // col <= columns - 1, so each term is bounded by the checked span.
        let mut image = RgbaImage::new(width, height);

        let bounds = frames
            .iter()
            .enumerate()
            .map(|(i, frame)| {
                let (col, row) = (i as u32 % columns, i as u32 / columns);
                let x = col * cell_w + col * self.padding;
                let y = row * cell_h + row * self.padding;
                imageops::replace(&mut image, frame.image(), x as i64, y as i64);
                Bounds {
                    x,
                    y,
                    width: frame.width(),
                    height: frame.height(),
                }
            })
            .collect();

        Ok(Sheet {
            image,
            bounds,
            padding: self.padding,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawFrame;
    use image::Rgba;

    fn frames(n: usize, w: u32, h: u32) -> Vec<ProcessedFrame> {
        (0..n)
            .map(|i| {
                let img = RgbaImage::from_pixel(w, h, Rgba([i as u8 * 10, 0, 0, 255]));
                ProcessedFrame::from_raw(RawFrame::new(i, img))
            })
            .collect()
    }

    #[test]
    fn test_pack_empty() {
        let sheet = SheetPacker::default().pack(&[]).unwrap();
        assert_eq!((sheet.width(), sheet.height()), (0, 0));
        assert!(sheet.bounds.is_empty());
    }

    #[test]
    fn test_horizontal_width_is_sum_of_frames() {
        let sheet = SheetPacker::default().pack(&frames(8, 32, 32)).unwrap();
        assert_eq!(sheet.width(), 8 * 32);
        assert_eq!(sheet.height(), 32);
        assert_eq!(sheet.bounds.iter().map(|b| b.width).sum::<u32>(), sheet.width());
        assert_eq!(sheet.bounds[3], Bounds { x: 96, y: 0, width: 32, height: 32 });
    }

    #[test]
    fn test_padding_between_frames_only() {
        let sheet = SheetPacker::new(Layout::Horizontal, 2).pack(&frames(3, 4, 4)).unwrap();
        assert_eq!(sheet.width(), 3 * 4 + 2 * 2);
        assert_eq!(sheet.bounds[1].x, 6);
        assert_eq!(sheet.image.get_pixel(4, 0)[3], 0);
    }

    #[test]
    fn test_grid_layout() {
        let sheet = SheetPacker::new(Layout::Grid { columns: 3 }, 0).pack(&frames(7, 4, 4)).unwrap();
        assert_eq!((sheet.width(), sheet.height()), (12, 12));
        assert_eq!(sheet.bounds[4], Bounds { x: 4, y: 4, width: 4, height: 4 });
        assert_eq!(sheet.bounds[6], Bounds { x: 0, y: 8, width: 4, height: 4 });
        for (i, a) in sheet.bounds.iter().enumerate() {
            for b in &sheet.bounds[i + 1..] {
                assert!(!a.overlaps(b));
            }
        }
    }

    #[test]
    fn test_pack_preserves_pixels() {
        let sheet = SheetPacker::default().pack(&frames(3, 2, 2)).unwrap();
        for (i, b) in sheet.bounds.iter().enumerate() {
            assert_eq!(sheet.image.get_pixel(b.x, b.y)[0], i as u8 * 10);
        }
    }

    #[test]
    fn test_oversized_padding_is_an_error() {
        let packer = SheetPacker::new(Layout::Horizontal, 3_000_000_000);
        let err = packer.pack(&frames(3, 32, 32)).unwrap_err();
        assert!(err.to_string().contains("do not fit"));

        // fits in u32 but not under the area cap
        let packer = SheetPacker::new(Layout::Grid { columns: 2 }, 100_000);
        assert!(packer.pack(&frames(4, 4, 4)).is_err());

        // a single frame never pays for padding
        let sheet = SheetPacker::new(Layout::Horizontal, u32::MAX).pack(&frames(1, 4, 4)).unwrap();
        assert_eq!(sheet.width(), 4);
    }

    #[test]
    fn test_layout_parse() {
        assert_eq!("horizontal".parse::<Layout>().unwrap(), Layout::Horizontal);
        assert_eq!("grid:4".parse::<Layout>().unwrap(), Layout::Grid { columns: 4 });
        assert!("grid:0".parse::<Layout>().is_err());
        assert!("spiral".parse::<Layout>().is_err());
        assert_eq!(Layout::Grid { columns: 2 }.to_string(), "grid:2");
    }
}
