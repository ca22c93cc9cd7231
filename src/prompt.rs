//! Prompt compilation.
//!
//! Turns a [`GenerationSpec`] into the text prompt and sampling parameters a
//! generative backend expects. Compilation is a pure function of the generation spec:
//! the same spec always yields the same prompt, model and seed.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::types::{GenerationSpec, Style, ViewAngle, DEFAULT_THEME};

/// Backend-ready prompt and parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledPrompt {
    pub prompt: String,
    pub negative_prompt: String,
    pub model: String,
    pub width: u32,
    pub height: u32,
    pub frames: u32,
    pub seed: u64,
    pub steps: u32,
    pub guidance: f32,
}

/// Model and sampling preset for a style.
struct StylePreset {
    model: &'static str,
    phrase: &'static str,
    steps: u32,
    guidance: f32,
}

fn preset(style: Style) -> StylePreset {
    match style {
        Style::PixelArt => StylePreset {
            model: "pixel-art-xl",
            phrase: "pixel art, crisp pixels, limited palette",
            steps: 20,
            guidance: 7.5,
        },
        Style::Cartoon => StylePreset {
            model: "toon-diffusion",
            phrase: "cartoon, bold outlines, flat shading",
            steps: 25,
            guidance: 7.0,
        },
        Style::Painterly => StylePreset {
            model: "sdxl-base",
            phrase: "hand painted, painterly brush strokes",
            steps: 30,
            guidance: 6.5,
        },
        Style::Realistic => StylePreset {
            model: "sdxl-base",
            phrase: "realistic, detailed, studio lighting",
            steps: 35,
            guidance: 6.0,
        },
        Style::LowPoly => StylePreset {
            model: "sdxl-base",
            phrase: "low poly render, faceted, flat colours",
            steps: 25,
            guidance: 7.0,
        },
    }
}

fn view_phrase(view: ViewAngle) -> &'static str {
    match view {
        ViewAngle::Side => "side view",
        ViewAngle::Front => "front view, facing camera",
        ViewAngle::Back => "back view, facing away",
        ViewAngle::ThreeQuarter => "three-quarter view",
        ViewAngle::TopDown => "top-down view",
        ViewAngle::Isometric => "isometric view",
    }
}

const NEGATIVE_BASE: &str = "blurry, watermark, text, signature, cropped, multiple characters";

/// Compile a spec into a backend prompt.
pub fn compile(spec: &GenerationSpec) -> CompiledPrompt {
    let preset = preset(spec.style());

    let mut parts: Vec<String> = vec![preset.phrase.to_string()];
    let subject = if spec.theme() == DEFAULT_THEME {
        spec.entity().replace('-', " ")
    } else {
        format!("{} themed {}", spec.theme(), spec.entity().replace('-', " "))
    };
    parts.push(subject);

    if spec.frame_count() > 1 {
        parts.push(format!(
            "{} animation, frame sequence of {}",
            spec.action(),
            spec.frame_count()
        ));
    } else {
        parts.push(format!("{} pose", spec.action()));
    }
    parts.push(view_phrase(spec.view()).to_string());

    if let Some(palette) = spec.palette() {
        parts.push(format!("palette: {}", palette.describe()));
    }
    if let Some(max) = spec.constraints().max_colors {
        parts.push(format!("at most {} colours", max));
    }

    let mut negative = NEGATIVE_BASE.to_string();
    if spec.constraints().require_transparency {
        parts.push("isolated on a transparent background".to_string());
        negative.push_str(", background scenery");
    }
    if spec.style().is_pixel_art() {
        negative.push_str(", anti-aliasing, gradients, jpeg artifacts");
    }
    parts.push("game sprite".to_string());

    let prompt = parts.join(", ");
    let seed = spec.seed().unwrap_or_else(|| seed_for(&prompt, spec));
    let resolution = spec.resolution();

    CompiledPrompt {
        prompt,
        negative_prompt: negative,
        model: preset.model.to_string(),
        width: resolution.width,
        height: resolution.height,
        frames: spec.frame_count(),
        seed,
        steps: preset.steps,
        guidance: preset.guidance,
    }
}

/// Stable seed: the first eight bytes of SHA-256 over the prompt and size.
fn seed_for(prompt: &str, spec: &GenerationSpec) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    hasher.update(spec.resolution().to_string().as_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PaletteConstraint, Resolution};

    fn pet() -> GenerationSpec {
        GenerationSpec::builder("pet")
            .theme("fire")
            .frame_count(8)
            .build()
            .unwrap()
    }

    #[test]
    fn test_compile_is_deterministic() {
        let a = compile(&pet());
        let b = compile(&pet());
        assert_eq!(a, b);
    }

    #[test]
    fn test_prompt_content() {
        let compiled = compile(&pet());
        assert!(compiled.prompt.starts_with("pixel art"));
        assert!(compiled.prompt.contains("fire themed pet"));
        assert!(compiled.prompt.contains("idle animation, frame sequence of 8"));
        assert!(compiled.prompt.contains("side view"));
        assert!(compiled.prompt.contains("transparent background"));
        assert!(compiled.negative_prompt.contains("anti-aliasing"));
        assert_eq!(compiled.model, "pixel-art-xl");
        assert_eq!((compiled.width, compiled.height), (32, 32));
        assert_eq!(compiled.frames, 8);
    }

    #[test]
    fn test_seed_changes_with_spec() {
        let a = compile(&pet());
        let b = compile(&pet().to_builder().theme("ice").build().unwrap());
        assert_ne!(a.seed, b.seed);

        let c = compile(
            &pet()
                .to_builder()
                .resolution(Resolution::new(64, 64).unwrap())
                .build()
                .unwrap(),
        );
        assert_ne!(a.seed, c.seed);
    }

    #[test]
    fn test_explicit_seed_wins() {
        let spec = pet().to_builder().seed(42).build().unwrap();
        assert_eq!(compile(&spec).seed, 42);
    }

    #[test]
    fn test_palette_and_style_presets() {
        let spec = GenerationSpec::builder("tree")
            .style(Style::Painterly)
            .palette(PaletteConstraint::Named("gameboy".into()))
            .require_transparency(false)
            .build()
            .unwrap();
        let compiled = compile(&spec);
        assert_eq!(compiled.model, "sdxl-base");
        assert!(compiled.prompt.contains("gameboy palette"));
        assert!(compiled.prompt.contains("at most 4 colours"));
        assert!(!compiled.prompt.contains("transparent"));
        assert!(compiled.prompt.contains("idle pose"));
    }
}
