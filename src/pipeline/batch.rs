//! Batch generation of related assets.

use std::fmt;
use std::str::FromStr;
use std::thread;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::concept::keywords::action_by_name;
use crate::error::{GenError, Result};
use crate::types::{GenerationSpec, ViewAngle};

use super::{Pipeline, PipelineConfig, PipelineResult, Warning, WarningKind};

const DIRECTIONS: [ViewAngle; 4] = [
    ViewAngle::Front,
    ViewAngle::Back,
    ViewAngle::Side,
    ViewAngle::ThreeQuarter,
];

const ANIMATIONS: [&str; 5] = ["idle", "walk", "run", "attack", "jump"];

const THEME_VARIANTS: [&str; 4] = ["fire", "water", "nature", "shadow"];

/// The dimension a batch varies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SetType {
    Directional,
    Animation,
    #[serde(alias = "colour-variants")]
    ColorVariants,
}

impl SetType {
    pub fn as_str(self) -> &'static str {
        match self {
            SetType::Directional => "directional",
            SetType::Animation => "animation",
            SetType::ColorVariants => "color-variants",
        }
    }
}

impl fmt::Display for SetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SetType {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "directional" => Ok(SetType::Directional),
            "animation" => Ok(SetType::Animation),
            "color-variants" | "colour-variants" => Ok(SetType::ColorVariants),
            other => Err(GenError::Parse {
                message: format!("Unknown set type '{}'", other),
                help: Some("Expected one of: directional, animation, color-variants".to_string()),
            }),
        }
    }
}

/// Specs for every member of a set, in a fixed order.
///
/// All members share the base spec; only the dimension named by `set`
/// changes.
pub fn variants(base: &GenerationSpec, set: SetType) -> Result<Vec<GenerationSpec>> {
    match set {
        SetType::Directional => DIRECTIONS
            .iter()
            .map(|view| base.to_builder().view(*view).build())
            .collect(),
        SetType::Animation => ANIMATIONS
            .iter()
            .map(|name| {
                let frames = action_by_name(name).map_or(1, |a| a.frames);
                base.to_builder().action(*name).frame_count(frames).build()
            })
            .collect(),
        SetType::ColorVariants => {
            let mut themes = vec![base.theme()];
            themes.extend(THEME_VARIANTS.iter().copied().filter(|t| *t != base.theme()));
            themes
                .into_iter()
                .map(|theme| base.to_builder().theme(theme).build())
                .collect()
        }
    }
}

impl Pipeline {
    /// Interpret `base_concept` once and run one pipeline per set member.
    ///
    /// Members run concurrently and come back in [`variants`] order. When
    /// the base concept cannot be interpreted, a single failed result is
    /// returned.
    #[tracing::instrument(skip(self, config))]
    pub fn generate_asset_set(&self, base_concept: &str, set: SetType, config: &PipelineConfig) -> Vec<PipelineResult> {
        let interpretation = match self.interpreter.interpret(base_concept) {
            Ok(interpretation) => interpretation,
            Err(e) => return vec![PipelineResult::failure(e.to_string())],
        };
        let specs = match variants(&interpretation.spec, set) {
            Ok(specs) => specs,
            Err(e) => {
                let mut result = PipelineResult::failure(e.to_string());
                result.spec = Some(interpretation.spec);
                return vec![result];
            }
        };
        info!(members = specs.len(), %set, "generating asset set");

        let defaulted = interpretation.defaulted.contains(&"entity").then(|| {
            Warning::new(
                WarningKind::InterpretationDefault,
                format!(
                    "no subject recognised in \"{}\", using \"{}\"",
                    base_concept,
                    interpretation.spec.entity()
                ),
            )
        });

        let mut results: Vec<PipelineResult> = thread::scope(|scope| {
            let handles: Vec<_> = specs
                .into_iter()
                .map(|spec| scope.spawn(move || self.execute_spec(spec, config)))
                .collect();
            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|_| PipelineResult::failure("asset set member panicked"))
                })
                .collect()
        });

        if let Some(warning) = defaulted {
            for result in &mut results {
                result.warnings.insert(0, warning.clone());
            }
        }
        results
    }
}
