//! The structured generation request derived from a concept.
//!
//! A [`GenerationSpec`] is built once per request through [`SpecBuilder`],
//! which enforces the invariants (at least one frame, positive resolution,
//! non-empty entity). Once built it is never modified; batch variants are
//! made by going back through [`GenerationSpec::to_builder`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GenError, Result};

use super::palette::named_palette;
use super::Colour;

/// Largest width or height a spec may request.
pub const MAX_EDGE: u32 = 4096;

/// Most frames a single spec may request.
pub const MAX_FRAMES: u32 = 64;

/// Cap on `frames * width * height` across one batch.
pub const MAX_BATCH_PIXELS: u64 = 1 << 26;

/// Visual style tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Style {
    PixelArt,
    Cartoon,
    Painterly,
    Realistic,
    LowPoly,
}

impl Style {
    pub fn as_str(self) -> &'static str {
        match self {
            Style::PixelArt => "pixel-art",
            Style::Cartoon => "cartoon",
            Style::Painterly => "painterly",
            Style::Realistic => "realistic",
            Style::LowPoly => "low-poly",
        }
    }

    /// Hard-edged styles resample with nearest-neighbour.
    pub fn is_pixel_art(self) -> bool {
        self == Style::PixelArt
    }

    /// Resolution used when the concept names none.
    pub fn default_resolution(self) -> Resolution {
        match self {
            Style::PixelArt => Resolution { width: 32, height: 32 },
            _ => Resolution { width: 128, height: 128 },
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Camera angle the sprite is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewAngle {
    Side,
    Front,
    Back,
    ThreeQuarter,
    TopDown,
    Isometric,
}

impl ViewAngle {
    pub fn as_str(self) -> &'static str {
        match self {
            ViewAngle::Side => "side",
            ViewAngle::Front => "front",
            ViewAngle::Back => "back",
            ViewAngle::ThreeQuarter => "three-quarter",
            ViewAngle::TopDown => "top-down",
            ViewAngle::Isometric => "isometric",
        }
    }
}

impl fmt::Display for ViewAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Create a resolution, rejecting zero dimensions.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(GenError::Parse {
                message: format!("Invalid resolution {}x{}", width, height),
                help: Some("Both dimensions must be positive".to_string()),
            });
        }
        Ok(Self { width, height })
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = GenError;

    /// Parse `WxH` (e.g. "64x48").
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_lowercase();
        let parse = |part: &str| {
            part.trim().parse::<u32>().map_err(|_| GenError::Parse {
                message: format!("Invalid resolution: '{}'", s),
                help: Some("Expected WxH, e.g. 64x64".to_string()),
            })
        };
        match s.split_once('x') {
            Some((w, h)) => Self::new(parse(w)?, parse(h)?),
            None => Err(GenError::Parse {
                message: format!("Invalid resolution: '{}'", s),
                help: Some("Expected WxH, e.g. 64x64".to_string()),
            }),
        }
    }
}

/// A colour restriction: an explicit list or a builtin palette name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaletteConstraint {
    Hex(Vec<Colour>),
    Named(String),
}

impl PaletteConstraint {
    /// The concrete colours, if the palette is known.
    pub fn colours(&self) -> Option<Vec<Colour>> {
        match self {
            PaletteConstraint::Hex(colours) => Some(colours.clone()),
            PaletteConstraint::Named(name) => named_palette(name).map(<[Colour]>::to_vec),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            PaletteConstraint::Hex(colours) => colours
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" "),
            PaletteConstraint::Named(name) => format!("{} palette", name),
        }
    }
}

/// Hard requirements the validator checks the output against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    pub max_colors: Option<usize>,
    pub require_transparency: bool,
    pub require_pixel_alignment: bool,
}

/// Everything the generator and post-processing chain need for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSpec {
    entity: String,
    style: Style,
    theme: String,
    action: String,
    frame_count: u32,
    view: ViewAngle,
    resolution: Resolution,
    palette: Option<PaletteConstraint>,
    constraints: Constraints,
    seed: Option<u64>,
}

impl GenerationSpec {
    pub fn builder(entity: impl Into<String>) -> SpecBuilder {
        SpecBuilder::new(entity)
    }

    /// A builder pre-filled with this spec, for deriving variants.
    pub fn to_builder(&self) -> SpecBuilder {
        SpecBuilder {
            entity: self.entity.clone(),
            style: Some(self.style),
            theme: Some(self.theme.clone()),
            action: Some(self.action.clone()),
            frame_count: Some(self.frame_count),
            view: Some(self.view),
            resolution: Some(self.resolution),
            palette: self.palette.clone(),
            max_colors: self.constraints.max_colors,
            require_transparency: Some(self.constraints.require_transparency),
            require_pixel_alignment: Some(self.constraints.require_pixel_alignment),
            seed: self.seed,
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn style(&self) -> Style {
        self.style
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn view(&self) -> ViewAngle {
        self.view
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn palette(&self) -> Option<&PaletteConstraint> {
        self.palette.as_ref()
    }

    pub fn constraints(&self) -> Constraints {
        self.constraints
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// File-system friendly name, e.g. "fire-pet-idle".
    ///
    /// Only `[a-z0-9_-]` survives, so the name is always a single path
    /// component.
    pub fn asset_name(&self) -> String {
        let mut parts = Vec::new();
        if self.theme != DEFAULT_THEME {
            parts.push(self.theme.as_str());
        }
        parts.push(self.entity.as_str());
        if self.frame_count > 1 {
            parts.push(self.action.as_str());
        }
        let name = slug(&parts.join("-"));
        if name.is_empty() {
            "sprite".to_string()
        } else {
            name
        }
    }
}

/// Lowercase, map anything outside `[a-z0-9_]` to '-', collapse repeats.
fn slug(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_end_matches('-').to_string()
}

/// Theme used when the concept names none.
pub const DEFAULT_THEME: &str = "neutral";

/// Action used when the concept names none.
pub const DEFAULT_ACTION: &str = "idle";

/// Builder for [`GenerationSpec`].
#[derive(Debug, Clone)]
pub struct SpecBuilder {
    entity: String,
    style: Option<Style>,
    theme: Option<String>,
    action: Option<String>,
    frame_count: Option<u32>,
    view: Option<ViewAngle>,
    resolution: Option<Resolution>,
    palette: Option<PaletteConstraint>,
    max_colors: Option<usize>,
    require_transparency: Option<bool>,
    require_pixel_alignment: Option<bool>,
    seed: Option<u64>,
}

impl SpecBuilder {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            style: None,
            theme: None,
            action: None,
            frame_count: None,
            view: None,
            resolution: None,
            palette: None,
            max_colors: None,
            require_transparency: None,
            require_pixel_alignment: None,
            seed: None,
        }
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = Some(style);
        self
    }

    pub fn theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = Some(theme.into());
        self
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn frame_count(mut self, frames: u32) -> Self {
        self.frame_count = Some(frames);
        self
    }

    pub fn view(mut self, view: ViewAngle) -> Self {
        self.view = Some(view);
        self
    }

    pub fn resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = Some(resolution);
        self
    }

    pub fn palette(mut self, palette: PaletteConstraint) -> Self {
        self.palette = Some(palette);
        self
    }

    pub fn max_colors(mut self, max: usize) -> Self {
        self.max_colors = Some(max);
        self
    }

    pub fn require_transparency(mut self, required: bool) -> Self {
        self.require_transparency = Some(required);
        self
    }

    pub fn require_pixel_alignment(mut self, required: bool) -> Self {
        self.require_pixel_alignment = Some(required);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Fill defaults and check invariants.
    pub fn build(self) -> Result<GenerationSpec> {
        let entity = self.entity.trim().to_string();
        if entity.is_empty() {
            return Err(GenError::Parse {
                message: "Generation spec needs an entity name".to_string(),
                help: None,
            });
        }

        let frame_count = self.frame_count.unwrap_or(1);
        if frame_count == 0 {
            return Err(GenError::Parse {
                message: "Frame count must be at least 1".to_string(),
                help: None,
            });
        }
        if frame_count > MAX_FRAMES {
            return Err(GenError::Parse {
                message: format!("Frame count {} exceeds the limit of {}", frame_count, MAX_FRAMES),
                help: Some("Split long animations into several cycles".to_string()),
            });
        }

        let style = self.style.unwrap_or(Style::PixelArt);
        let resolution = match self.resolution {
            Some(r) => Resolution::new(r.width, r.height)?,
            None => style.default_resolution(),
        };
        if resolution.width > MAX_EDGE || resolution.height > MAX_EDGE {
            return Err(GenError::Parse {
                message: format!("Resolution {} exceeds the {}px limit", resolution, MAX_EDGE),
                help: Some("Generate at a smaller size and use upscale".to_string()),
            });
        }
        let pixels = u64::from(frame_count) * u64::from(resolution.width) * u64::from(resolution.height);
        if pixels > MAX_BATCH_PIXELS {
            return Err(GenError::Parse {
                message: format!(
                    "{} frames at {} exceed the {} pixel batch limit",
                    frame_count, resolution, MAX_BATCH_PIXELS
                ),
                help: Some("Lower the resolution or the frame count".to_string()),
            });
        }

        if let Some(PaletteConstraint::Named(name)) = &self.palette {
            if named_palette(name).is_none() {
                return Err(GenError::Parse {
                    message: format!("Unknown palette '{}'", name),
                    help: Some("Known palettes: pico-8, gameboy, nes, grayscale".to_string()),
                });
            }
        }

        // An explicit palette caps the colour count unless a tighter cap was given.
        let palette_len = self.palette.as_ref().and_then(|p| p.colours()).map(|c| c.len());
        let max_colors = match (self.max_colors, palette_len) {
            (Some(0), _) => {
                return Err(GenError::Parse {
                    message: "maxColors must be at least 1".to_string(),
                    help: None,
                })
            }
            (Some(max), Some(len)) => Some(max.min(len)),
            (Some(max), None) => Some(max),
            (None, len) => len,
        };

        Ok(GenerationSpec {
            entity,
            style,
            theme: self.theme.unwrap_or_else(|| DEFAULT_THEME.to_string()),
            action: self.action.unwrap_or_else(|| DEFAULT_ACTION.to_string()),
            frame_count,
            view: self.view.unwrap_or(ViewAngle::Side),
            resolution,
            palette: self.palette,
            constraints: Constraints {
                max_colors,
                require_transparency: self.require_transparency.unwrap_or(true),
                require_pixel_alignment: self
                    .require_pixel_alignment
                    .unwrap_or(style.is_pixel_art()),
            },
            seed: self.seed,
        })
    }
}
