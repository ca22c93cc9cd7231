//! The externally visible outcome of a pipeline run.

use std::fmt;

use image::RgbaImage;
use serde::Serialize;

use crate::export::{AnimationMetadata, CodeBinding};
use crate::generate::StrategyKind;
use crate::prompt::CompiledPrompt;
use crate::types::{GenerationSpec, ProcessedFrame};
use crate::validation::ValidationResult;

/// The degradation a warning reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningKind {
    InterpretationDefault,
    GenerationUnavailable,
    PostProcessingDegraded,
    ValidationViolation,
    ExportUnsupportedEngine,
    ExportDegraded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Where a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    Done,
    Failed,
}

/// Everything one `execute` call produced. Immutable once returned.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub success: bool,
    pub outcome: Outcome,
    pub spec: Option<GenerationSpec>,
    pub prompt: Option<CompiledPrompt>,
    pub strategy: Option<StrategyKind>,
    /// Frames as validated, before any upscaling.
    pub frames: Vec<ProcessedFrame>,
    /// The sprite itself when the generation spec asked for a single frame.
    pub sprite: Option<RgbaImage>,
    pub sheet: Option<RgbaImage>,
    pub metadata: Option<AnimationMetadata>,
    pub bindings: Vec<CodeBinding>,
    pub validation: Option<ValidationResult>,
    pub warnings: Vec<Warning>,
    pub errors: Vec<String>,
}

impl PipelineResult {
    pub(crate) fn empty() -> Self {
        Self {
            success: false,
            outcome: Outcome::Failed,
            spec: None,
            prompt: None,
            strategy: None,
            frames: Vec::new(),
            sprite: None,
            sheet: None,
            metadata: None,
            bindings: Vec::new(),
            validation: None,
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// A failed result carrying one error.
    pub fn failure(error: impl Into<String>) -> Self {
        let mut result = Self::empty();
        result.errors.push(error.into());
        result
    }

    /// File-system friendly name, or "sprite" when interpretation failed.
    pub fn name(&self) -> String {
        self.spec
            .as_ref()
            .map(GenerationSpec::asset_name)
            .unwrap_or_else(|| "sprite".to_string())
    }

    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }

    pub fn has_warning(&self, kind: WarningKind) -> bool {
        self.warnings.iter().any(|w| w.kind == kind)
    }

    pub fn is_valid(&self) -> bool {
        self.validation.as_ref().map_or(true, |v| v.valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_result() {
        let result = PipelineResult::failure("concept contains no words");
        assert!(!result.success);
        assert_eq!(result.outcome, Outcome::Failed);
        assert_eq!(result.errors, ["concept contains no words"]);
        assert_eq!(result.name(), "sprite");
        assert!(result.is_valid());
    }

    #[test]
    fn test_warning_lookup() {
        let mut result = PipelineResult::empty();
        result
            .warnings
            .push(Warning::new(WarningKind::GenerationUnavailable, "fell back"));
        assert!(result.has_warning(WarningKind::GenerationUnavailable));
        assert!(!result.has_warning(WarningKind::ExportDegraded));
        assert_eq!(result.warning_messages(), ["fell back"]);
    }
}
