//! Palette extraction and quantization.
//!
//! One palette is chosen for the whole batch so frames never flicker
//! between near-identical colours. The palette is the generation spec's explicit
//! palette when there is one, otherwise the `maxColors` most frequent
//! colours across every frame.

use image::Rgba;

use crate::error::{GenError, Result};
use crate::types::palette::dominant_colours;
use crate::types::{Colour, GenerationSpec, ProcessedFrame};

use super::Transform;

/// Palette summary size when no quantization is requested.
const SUMMARY_LIMIT: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct Quantize {
    palette: Option<Vec<Colour>>,
    max_colors: Option<usize>,
    snap_alpha: bool,
}

impl Quantize {
    pub fn new(palette: Option<Vec<Colour>>, max_colors: Option<usize>, snap_alpha: bool) -> Self {
        Self {
            palette,
            max_colors,
            snap_alpha,
        }
    }

    pub fn for_spec(spec: &GenerationSpec) -> Self {
        let constraints = spec.constraints();
        Self::new(
            spec.palette().and_then(|p| p.colours()),
            constraints.max_colors,
            constraints.require_pixel_alignment,
        )
    }

    /// Opaque colours, most frequent first, without repeats.
    fn batch_colours(frames: &[ProcessedFrame], limit: Option<usize>) -> Vec<Colour> {
        let mut out: Vec<Colour> = Vec::new();
        for colour in dominant_colours(frames.iter().map(ProcessedFrame::image), None) {
            let opaque = colour.with_alpha(255);
            if !out.contains(&opaque) {
                out.push(opaque);
            }
            if limit.is_some_and(|l| out.len() >= l) {
                break;
            }
        }
        out
    }

    fn target_palette(&self, frames: &[ProcessedFrame]) -> Option<Vec<Colour>> {
        match (&self.palette, self.max_colors) {
            (Some(palette), Some(max)) if palette.len() > max => {
                // Keep the palette entries the frames actually lean on.
                let used = Self::batch_colours(frames, None);
                let mut ranked: Vec<Colour> = Vec::new();
                for colour in used {
                    if let Some(entry) = colour.nearest(palette) {
                        if !ranked.contains(&entry) {
                            ranked.push(entry);
                        }
                    }
                }
                ranked.truncate(max);
                Some(ranked)
            }
            (Some(palette), _) => Some(palette.clone()),
            (None, Some(max)) => Some(Self::batch_colours(frames, Some(max))),
            (None, None) => None,
        }
    }
}

impl Transform for Quantize {
    fn name(&self) -> &'static str {
        "quantize"
    }

    fn apply(&self, frames: &[ProcessedFrame]) -> Result<Vec<ProcessedFrame>> {
        let target = self.target_palette(frames);

        if let Some(palette) = &target {
            if palette.is_empty() && frames.iter().any(|f| f.image().pixels().any(|p| p[3] > 0)) {
                return Err(GenError::processing(self.name(), "palette has no colours"));
            }
        }

        Ok(frames
            .iter()
            .map(|frame| {
                let mut image = frame.image().clone();
                for pixel in image.pixels_mut() {
                    let mut alpha = pixel[3];
                    if self.snap_alpha {
                        alpha = if alpha >= 128 { 255 } else { 0 };
                    }
                    if alpha == 0 {
                        *pixel = Rgba([0, 0, 0, 0]);
                        continue;
                    }
                    let colour = Colour::from(*pixel);
                    let mapped = match &target {
                        Some(palette) => colour.nearest(palette).unwrap_or(colour),
                        None => colour,
                    };
                    *pixel = mapped.with_alpha(alpha).into();
                }

                let summary = match &target {
                    Some(palette) => palette.clone(),
                    None => Self::batch_colours(std::slice::from_ref(frame), Some(SUMMARY_LIMIT)),
                };
                frame.with_image(image).with_palette(summary)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::palette::GAMEBOY;
    use crate::types::{PaletteConstraint, RawFrame};
    use image::RgbaImage;
    use std::collections::HashSet;

    /// 8x8 frame with a horizontal gradient of eight colours.
    fn gradient() -> ProcessedFrame {
        let mut img = RgbaImage::new(8, 8);
        for (x, _, p) in img.enumerate_pixels_mut() {
            *p = Rgba([(x * 32) as u8, 100, 255 - (x * 32) as u8, 255]);
        }
        ProcessedFrame::from_raw(RawFrame::new(0, img))
    }

    fn colours(frame: &ProcessedFrame) -> HashSet<[u8; 3]> {
        frame
            .image()
            .pixels()
            .filter(|p| p[3] > 0)
            .map(|p| [p[0], p[1], p[2]])
            .collect()
    }

    #[test]
    fn test_max_colors_limits_batch() {
        let frames = [gradient(), gradient()];
        let out = Quantize::new(None, Some(4), false).apply(&frames).unwrap();
        assert!(colours(&out[0]).len() <= 4);
        assert_eq!(out[0].palette(), out[1].palette());
        assert_eq!(out[0].palette().len(), 4);
    }

    #[test]
    fn test_named_palette_mapping() {
        let spec = GenerationSpec::builder("tree")
            .palette(PaletteConstraint::Named("gameboy".into()))
            .build()
            .unwrap();
        let out = Quantize::for_spec(&spec).apply(&[gradient()]).unwrap();
        for c in colours(&out[0]) {
            assert!(GAMEBOY.iter().any(|g| [g.r, g.g, g.b] == c), "{c:?} not in palette");
        }
    }

    #[test]
    fn test_palette_trimmed_to_max_colors() {
        let q = Quantize::new(Some(GAMEBOY.to_vec()), Some(2), false);
        let out = q.apply(&[gradient()]).unwrap();
        assert!(colours(&out[0]).len() <= 2);
        assert_eq!(out[0].palette().len(), 2);
    }

    #[test]
    fn test_without_constraints_only_summarises() {
        let input = gradient();
        let out = Quantize::new(None, None, false).apply(std::slice::from_ref(&input)).unwrap();
        assert_eq!(out[0].image(), input.image());
        assert_eq!(out[0].palette().len(), 8);
    }

    #[test]
    fn test_alpha_snapping() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([10, 10, 10, 100]));
        img.put_pixel(1, 0, Rgba([10, 10, 10, 200]));
        let frames = [ProcessedFrame::from_raw(RawFrame::new(0, img))];

        let out = Quantize::new(None, None, true).apply(&frames).unwrap();
        assert_eq!(out[0].image().get_pixel(0, 0), &Rgba([0, 0, 0, 0]));
        assert_eq!(out[0].image().get_pixel(1, 0), &Rgba([10, 10, 10, 255]));
    }
}
