//! The orchestrator state machine.
//!
//! A run moves through
//! `interpreting -> generating -> post-processing -> validating -> exporting -> done`.
//! Only interpretation and generation can reach `failed`; every later
//! stage turns its own problems into warnings and moves on.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::concept::Interpreter;
use crate::export::{ExportIssue, Exporter};
use crate::generate::Generator;
use crate::process::{upscale_frames, Chain, ChainOptions, IsolationModel};
use crate::prompt::compile;
use crate::types::{GenerationSpec, ProcessedFrame};
use crate::validation;

use super::config::PipelineConfig;
use super::result::{Outcome, PipelineResult, Warning, WarningKind};

/// One state of a run, carrying the data the next transition needs.
#[derive(Debug, Clone)]
pub enum Stage {
    Interpreting { concept: String },
    Generating { spec: GenerationSpec },
    PostProcessing { spec: GenerationSpec, frames: Vec<ProcessedFrame> },
    Validating { spec: GenerationSpec, frames: Vec<ProcessedFrame> },
    Exporting { spec: GenerationSpec, frames: Vec<ProcessedFrame> },
    Done,
    Failed,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Interpreting { .. } => "interpreting",
            Stage::Generating { .. } => "generating",
            Stage::PostProcessing { .. } => "post-processing",
            Stage::Validating { .. } => "validating",
            Stage::Exporting { .. } => "exporting",
            Stage::Done => "done",
            Stage::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Done | Stage::Failed)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Collaborators a run needs.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Services<'a> {
    pub interpreter: &'a Interpreter,
    pub generator: &'a Generator,
    pub isolation: &'a Arc<dyn IsolationModel>,
}

/// A single run: the transition functions plus the result being built.
pub(crate) struct Run<'a> {
    services: Services<'a>,
    config: &'a PipelineConfig,
    result: PipelineResult,
}

impl<'a> Run<'a> {
    pub fn new(services: Services<'a>, config: &'a PipelineConfig) -> Self {
        Self {
            services,
            config,
            result: PipelineResult::empty(),
        }
    }

    /// Step from `start` until a terminal stage and return the result.
    pub fn drive(mut self, start: Stage) -> PipelineResult {
        let mut stage = start;
        loop {
            info!(stage = stage.name(), "entering stage");
            stage = match stage {
                Stage::Interpreting { concept } => self.interpret(&concept),
                Stage::Generating { spec } => self.generate(spec),
                Stage::PostProcessing { spec, frames } => self.post_process(spec, frames),
                Stage::Validating { spec, frames } => self.validate(spec, frames),
                Stage::Exporting { spec, frames } => self.export(spec, frames),
                Stage::Done => return self.finish(Outcome::Done),
                Stage::Failed => return self.finish(Outcome::Failed),
            };
        }
    }

    fn finish(mut self, outcome: Outcome) -> PipelineResult {
        self.result.outcome = outcome;
        self.result.success = outcome == Outcome::Done;
        self.result
    }

    fn warn(&mut self, kind: WarningKind, message: impl Into<String>) {
        let warning = Warning::new(kind, message);
        warn!(kind = ?warning.kind, "{}", warning.message);
        self.result.warnings.push(warning);
    }

    fn interpret(&mut self, concept: &str) -> Stage {
        match self.services.interpreter.interpret(concept) {
            Ok(interpretation) => {
                if interpretation.defaulted.contains(&"entity") {
                    self.warn(
                        WarningKind::InterpretationDefault,
                        format!(
                            "no subject recognised in \"{}\", using \"{}\"",
                            concept,
                            interpretation.spec.entity()
                        ),
                    );
                }
                Stage::Generating {
                    spec: interpretation.spec,
                }
            }
            Err(e) => {
                self.result.errors.push(e.to_string());
                Stage::Failed
            }
        }
    }

    fn generate(&mut self, spec: GenerationSpec) -> Stage {
        self.result.spec = Some(spec.clone());
        let prompt = compile(&spec);
        debug!(prompt = %prompt.prompt, seed = prompt.seed, "compiled prompt");

        let generation = match self
            .services
            .generator
            .generate(&spec, &prompt, self.config.allow_backend)
        {
            Ok(generation) => generation,
            Err(e) => {
                self.result.prompt = Some(prompt);
                self.result.errors.push(e.to_string());
                return Stage::Failed;
            }
        };
        self.result.prompt = Some(prompt);
        self.result.strategy = Some(generation.strategy);

        if let Some(reason) = generation.fallback {
            self.warn(
                WarningKind::GenerationUnavailable,
                format!("generation backend unavailable, used procedural fallback ({})", reason),
            );
        }

        let frames = generation
            .frames
            .into_iter()
            .map(ProcessedFrame::from_raw)
            .collect();

        if self.config.enable_post_processing {
            Stage::PostProcessing { spec, frames }
        } else {
            self.after_processing(spec, frames)
        }
    }

    fn after_processing(&self, spec: GenerationSpec, frames: Vec<ProcessedFrame>) -> Stage {
        if self.config.enable_validation {
            Stage::Validating { spec, frames }
        } else {
            Stage::Exporting { spec, frames }
        }
    }

    fn post_process(&mut self, spec: GenerationSpec, frames: Vec<ProcessedFrame>) -> Stage {
        let options = ChainOptions {
            fit: self.config.fit,
            anchor: self.config.anchor,
            isolation: Arc::clone(self.services.isolation),
        };
        let output = Chain::standard(&spec, &options).run(frames);

        for degraded in &output.degraded {
            self.warn(WarningKind::PostProcessingDegraded, degraded.to_string());
        }
        self.after_processing(spec, output.frames)
    }

    fn validate(&mut self, spec: GenerationSpec, frames: Vec<ProcessedFrame>) -> Stage {
        let verdict = validation::validate(&frames, &spec);
        for violation in &verdict.violations {
            self.warn(WarningKind::ValidationViolation, violation.to_string());
        }
        self.result.validation = Some(verdict);
        Stage::Exporting { spec, frames }
    }

    fn export(&mut self, spec: GenerationSpec, frames: Vec<ProcessedFrame>) -> Stage {
        let factor = self.config.upscale.max(1);
        let upscaled = if factor > 1 {
            let upscaler = self.config.upscaler.upscaler();
            match upscale_frames(upscaler.as_ref(), &frames, factor) {
                Ok(scaled) => Some(scaled),
                Err(e) => {
                    self.warn(WarningKind::PostProcessingDegraded, format!("upscale skipped: {}", e));
                    None
                }
            }
        } else {
            None
        };
        let output_frames = upscaled.as_deref().unwrap_or(&frames);

        if spec.frame_count() == 1 {
            self.result.sprite = output_frames.first().map(|f| f.image().clone());
        }

        if self.config.enable_export {
            let exporter = Exporter::new(self.config.layout, self.config.padding);
            let output = match exporter.export(&spec, output_frames, self.config.target_engine.as_deref()) {
                Ok(output) => output,
                Err(e) => {
                    self.warn(WarningKind::ExportDegraded, format!("sheet skipped: {}", e));
                    self.result.frames = frames;
                    return Stage::Done;
                }
            };

            for issue in output.issues {
                match issue {
                    ExportIssue::UnsupportedEngine(engine) => self.warn(
                        WarningKind::ExportUnsupportedEngine,
                        format!("no binding template for engine '{}', emitted a generic stub", engine),
                    ),
                    ExportIssue::Degraded(message) => {
                        self.warn(WarningKind::ExportDegraded, format!("metadata dropped: {}", message))
                    }
                }
            }

            self.result.sheet = Some(output.sheet.image);
            self.result.metadata = output.metadata;
            self.result.bindings = output.bindings;
        }

        self.result.frames = frames;
        Stage::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::BorderKeyModel;

    fn run(start: Stage, config: &PipelineConfig) -> PipelineResult {
        let interpreter = Interpreter;
        let generator = Generator::procedural();
        let isolation: Arc<dyn IsolationModel> = Arc::new(BorderKeyModel::default());
        let services = Services {
            interpreter: &interpreter,
            generator: &generator,
            isolation: &isolation,
        };
        Run::new(services, config).drive(start)
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::Done.to_string(), "done");
        assert!(Stage::Failed.is_terminal());
        assert!(!Stage::Interpreting { concept: String::new() }.is_terminal());
    }

    #[test]
    fn test_malformed_concept_fails_in_interpreting() {
        let result = run(
            Stage::Interpreting {
                concept: "   !!! ".into(),
            },
            &PipelineConfig::default(),
        );
        assert!(!result.success);
        assert_eq!(result.outcome, Outcome::Failed);
        assert!(result.spec.is_none());
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_generating_start_skips_interpretation() {
        let spec = GenerationSpec::builder("slime").frame_count(2).build().unwrap();
        let result = run(Stage::Generating { spec: spec.clone() }, &PipelineConfig::default());
        assert!(result.success);
        assert_eq!(result.spec, Some(spec));
        assert_eq!(result.frames.len(), 2);
        assert!(result.sprite.is_none());
        assert!(result.sheet.is_some());
    }

    #[test]
    fn test_disabled_stages_are_skipped() {
        let config = PipelineConfig {
            enable_post_processing: false,
            enable_validation: false,
            enable_export: false,
            ..PipelineConfig::default()
        };
        let spec = GenerationSpec::builder("slime").build().unwrap();
        let result = run(Stage::Generating { spec }, &config);
        assert!(result.success);
        assert!(result.validation.is_none());
        assert!(result.sheet.is_none());
        assert!(result.metadata.is_none());
        assert!(result.sprite.is_some());
    }

    #[test]
    fn test_unpackable_sheet_degrades_export() {
        let config = PipelineConfig {
            padding: 3_000_000_000,
            ..PipelineConfig::default()
        };
        let spec = GenerationSpec::builder("bat").action("run").frame_count(6).build().unwrap();
        let result = run(Stage::Generating { spec }, &config);

        assert!(result.success);
        assert_eq!(result.frames.len(), 6);
        assert!(result.sheet.is_none());
        assert!(result.metadata.is_none());
        assert!(result.has_warning(WarningKind::ExportDegraded));
    }

    #[test]
    fn test_upscale_applies_after_validation() {
        let config = PipelineConfig {
            upscale: 3,
            ..PipelineConfig::default()
        };
        let spec = GenerationSpec::builder("slime").build().unwrap();
        let result = run(Stage::Generating { spec }, &config);

        assert!(result.validation.as_ref().unwrap().valid);
        assert_eq!(result.frames[0].size(), (32, 32));
        assert_eq!(result.sprite.as_ref().unwrap().dimensions(), (96, 96));
        assert_eq!(result.metadata.as_ref().unwrap().frame_width, 96);
    }
}
