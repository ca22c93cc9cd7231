//! Animation metadata.
//!
//! Describes a packed sheet: its size, each frame's bounds, and the named
//! animation cycles that reference frame indices.

use serde::Serialize;

use crate::error::{GenError, Result};
use crate::types::GenerationSpec;

use super::sheet::{Bounds, Layout, Sheet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameInfo {
    pub index: usize,
    pub bounds: Bounds,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationCycle {
    pub name: String,
    pub frames: Vec<usize>,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub frame_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationMetadata {
    pub name: String,
    pub image: String,
    pub sprite_sheet_dimensions: Dimensions,
    pub frame_width: u32,
    pub frame_height: u32,
    pub padding: u32,
    pub layout: Layout,
    pub frames: Vec<FrameInfo>,
    pub animations: Vec<AnimationCycle>,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub frame_rate: u32,
}

/// Whether an action plays on repeat.
pub fn loops(action: &str) -> bool {
    matches!(action, "idle" | "walk" | "run" | "cast")
}

/// Playback rate in frames per second for an action.
pub fn frame_rate(action: &str, frames: usize) -> u32 {
    if frames <= 1 {
        return 0;
    }
    match action {
        "idle" => 8,
        "walk" => 10,
        "run" | "attack" => 12,
        "hurt" => 8,
        "death" => 6,
        _ => 10,
    }
}

/// Named cycles for an action over `count` frames.
///
/// The full action cycle always comes first; some actions add phase
/// sub-cycles over the first and second half.
pub fn cycles(action: &str, count: usize) -> Vec<AnimationCycle> {
    let rate = frame_rate(action, count);
    let mut out = vec![AnimationCycle {
        name: action.to_string(),
        frames: (0..count).collect(),
        looping: loops(action),
        frame_rate: rate,
    }];

    let phases = match action {
        "attack" => Some(("windup", "strike")),
        "jump" => Some(("rise", "fall")),
        _ => None,
    };
    if let Some((first, second)) = phases {
        if count >= 2 {
            let split = count / 2;
            for (name, frames) in [
                (first, (0..split).collect::<Vec<_>>()),
                (second, (split..count).collect()),
            ] {
                out.push(AnimationCycle {
                    name: format!("{}-{}", action, name),
                    frames,
                    looping: false,
                    frame_rate: rate,
                });
            }
        }
    }
    out
}

impl AnimationMetadata {
    /// Describe `sheet`, which was packed from frames generated for `spec`.
    pub fn describe(spec: &GenerationSpec, sheet: &Sheet, layout: Layout, image: impl Into<String>) -> Self {
        let frame_width = sheet.bounds.iter().map(|b| b.width).max().unwrap_or(0);
        let frame_height = sheet.bounds.iter().map(|b| b.height).max().unwrap_or(0);
        let count = sheet.bounds.len();

        Self {
            name: spec.asset_name(),
            image: image.into(),
            sprite_sheet_dimensions: Dimensions {
                width: sheet.width(),
                height: sheet.height(),
            },
            frame_width,
            frame_height,
            padding: sheet.padding,
            layout,
            frames: sheet
                .bounds
                .iter()
                .enumerate()
                .map(|(index, &bounds)| FrameInfo { index, bounds })
                .collect(),
            animations: cycles(spec.action(), count),
            looping: loops(spec.action()) && count > 1,
            frame_rate: frame_rate(spec.action(), count),
        }
    }

    pub fn cycle(&self, name: &str) -> Option<&AnimationCycle> {
        self.animations.iter().find(|c| c.name == name)
    }

    /// Verify the metadata is internally consistent.
    ///
    /// Every cycle index must exist, frame bounds must lie inside the
    /// sheet without overlapping, and a horizontal row must account for
    /// the full sheet width once padding is included.
    pub fn check(&self) -> Result<()> {
        let fail = |message: String| {
            Err(GenError::Export {
                message,
                help: None,
            })
        };

        for cycle in &self.animations {
            if let Some(&bad) = cycle.frames.iter().find(|&&i| i >= self.frames.len()) {
                return fail(format!("cycle '{}' references missing frame {}", cycle.name, bad));
            }
        }

        let sheet = self.sprite_sheet_dimensions;
        for (i, frame) in self.frames.iter().enumerate() {
            if frame.index != i {
                return fail(format!("frame {} is listed at position {}", frame.index, i));
            }
            let b = frame.bounds;
            if b.right() > sheet.width || b.bottom() > sheet.height {
                return fail(format!("frame {} lies outside the sheet", i));
            }
            if let Some(other) = self.frames[i + 1..].iter().find(|o| o.bounds.overlaps(&b)) {
                return fail(format!("frames {} and {} overlap", i, other.index));
            }
        }

        if self.layout == Layout::Horizontal && !self.frames.is_empty() {
            let widths: u64 = self.frames.iter().map(|f| u64::from(f.bounds.width)).sum();
            let gaps = u64::from(self.padding) * (self.frames.len() as u64 - 1);
            if widths + gaps != u64::from(sheet.width) {
                return fail(format!(
                    "frames span {}px but the sheet is {}px wide",
                    widths + gaps,
                    sheet.width
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::sheet::SheetPacker;
    use crate::types::{ProcessedFrame, RawFrame};
    use image::RgbaImage;
    use pretty_assertions::assert_eq;

    fn sheet(n: usize, padding: u32) -> Sheet {
        let frames: Vec<_> = (0..n)
            .map(|i| ProcessedFrame::from_raw(RawFrame::new(i, RgbaImage::new(16, 16))))
            .collect();
        SheetPacker::new(Layout::Horizontal, padding).pack(&frames).unwrap()
    }

    fn spec(action: &str, frames: u32) -> GenerationSpec {
        GenerationSpec::builder("pet")
            .theme("fire")
            .action(action)
            .frame_count(frames)
            .build()
            .unwrap()
    }

    #[test]
    fn test_idle_cycle_covers_all_frames() {
        let meta = AnimationMetadata::describe(&spec("idle", 8), &sheet(8, 0), Layout::Horizontal, "fire-pet-idle-sheet.png");
        assert_eq!(meta.frames.len(), 8);
        assert_eq!(meta.animations.len(), 1);
        let idle = meta.cycle("idle").unwrap();
        assert_eq!(idle.frames, (0..8).collect::<Vec<_>>());
        assert!(idle.looping);
        assert!(meta.looping);
        assert_eq!(meta.frame_rate, 8);
        assert_eq!(meta.sprite_sheet_dimensions, Dimensions { width: 128, height: 16 });
        meta.check().unwrap();
    }

    #[test]
    fn test_attack_has_phase_cycles() {
        let cycles = cycles("attack", 6);
        let names: Vec<&str> = cycles.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["attack", "attack-windup", "attack-strike"]);
        assert_eq!(cycles[1].frames, [0, 1, 2]);
        assert_eq!(cycles[2].frames, [3, 4, 5]);
        assert!(!cycles[0].looping);
    }

    #[test]
    fn test_single_frame_metadata() {
        let meta = AnimationMetadata::describe(&spec("idle", 1), &sheet(1, 0), Layout::Horizontal, "pet.png");
        assert!(!meta.looping);
        assert_eq!(meta.frame_rate, 0);
        assert_eq!(meta.animations[0].frames, [0]);
        meta.check().unwrap();
    }

    #[test]
    fn test_check_accounts_for_padding() {
        let meta = AnimationMetadata::describe(&spec("walk", 4), &sheet(4, 3), Layout::Horizontal, "s.png");
        assert_eq!(meta.sprite_sheet_dimensions.width, 4 * 16 + 3 * 3);
        meta.check().unwrap();
    }

    #[test]
    fn test_check_rejects_bad_cycle_and_overlap() {
        let mut meta = AnimationMetadata::describe(&spec("walk", 2), &sheet(2, 0), Layout::Horizontal, "s.png");
        meta.animations[0].frames.push(9);
        assert!(meta.check().unwrap_err().to_string().contains("missing frame 9"));

        let mut meta = AnimationMetadata::describe(&spec("walk", 2), &sheet(2, 0), Layout::Horizontal, "s.png");
        meta.frames[1].bounds.x = 8;
        assert!(meta.check().is_err());
    }

    #[test]
    fn test_serialized_shape() {
        let meta = AnimationMetadata::describe(&spec("run", 2), &sheet(2, 0), Layout::Horizontal, "s.png");
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["spriteSheetDimensions"]["width"], 32);
        assert_eq!(json["frameWidth"], 16);
        assert_eq!(json["frames"][1]["bounds"]["x"], 16);
        assert_eq!(json["animations"][0]["loop"], true);
        assert_eq!(json["animations"][0]["frameRate"], 12);
        assert_eq!(json["layout"], "horizontal");
    }
}
