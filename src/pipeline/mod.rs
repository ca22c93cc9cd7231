//! Pipeline orchestration.
//!
//! [`Pipeline::execute`] runs one concept through every stage and always
//! returns a [`PipelineResult`]. A pipeline holds no per-run state, so one
//! value can serve any number of concurrent runs; the only shared resource
//! is the generation backend's slot pool.

mod batch;
mod config;
mod result;
mod stage;

pub use batch::{variants, SetType};
pub use config::{PipelineConfig, MAX_PADDING, MAX_UPSCALE};
pub use result::{Outcome, PipelineResult, Warning, WarningKind};
pub use stage::Stage;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;
use tracing::warn;

use crate::concept::Interpreter;
use crate::generate::Generator;
use crate::process::{BorderKeyModel, IsolationModel};
use crate::types::GenerationSpec;
use crate::validation::{ValidationResult, Violation, ViolationKind};

use stage::{Run, Services};

#[derive(Debug, Clone)]
pub struct Pipeline {
    interpreter: Interpreter,
    generator: Generator,
    isolation: Arc<dyn IsolationModel>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            interpreter: Interpreter,
            generator: Generator::procedural(),
            isolation: Arc::new(BorderKeyModel::default()),
        }
    }
}

impl Pipeline {
    /// A pipeline that only uses the procedural generator.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_generator(mut self, generator: Generator) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_isolation_model(mut self, model: Arc<dyn IsolationModel>) -> Self {
        self.isolation = model;
        self
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    /// Run a free-text concept through the whole pipeline.
    #[tracing::instrument(skip(self, config), fields(engine = ?config.target_engine))]
    pub fn execute(&self, concept: &str, config: &PipelineConfig) -> PipelineResult {
        let start = Stage::Interpreting {
            concept: concept.to_string(),
        };
        self.run_bounded(start, None, config)
    }

    /// Run an already-built spec, skipping interpretation.
    pub fn execute_spec(&self, spec: GenerationSpec, config: &PipelineConfig) -> PipelineResult {
        let start = Stage::Generating { spec: spec.clone() };
        self.run_bounded(start, Some(spec), config)
    }

    /// Drive one run; a panic in any stage becomes a failed result.
    fn run(&self, start: Stage, config: &PipelineConfig) -> PipelineResult {
        let services = Services {
            interpreter: &self.interpreter,
            generator: &self.generator,
            isolation: &self.isolation,
        };
        let run = AssertUnwindSafe(|| Run::new(services, config).drive(start));
        panic::catch_unwind(run).unwrap_or_else(|payload| {
            let reason = panic_message(payload.as_ref());
            warn!(reason, "pipeline run panicked");
            PipelineResult::failure(format!("internal error: {}", reason))
        })
    }

    fn run_bounded(&self, start: Stage, spec: Option<GenerationSpec>, config: &PipelineConfig) -> PipelineResult {
        let Some(limit) = config.timeout() else {
            return self.run(start, config);
        };

        let (tx, rx) = crossbeam_channel::bounded(1);
        let pipeline = self.clone();
        let worker_config = config.clone();
        thread::spawn(move || {
            // The receiver is gone once the caller has timed out.
            let _ = tx.send(pipeline.run(start, &worker_config));
        });

        match rx.recv_timeout(limit) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                warn!(?limit, "pipeline run timed out");
                timed_out(spec, limit)
            }
            Err(RecvTimeoutError::Disconnected) => {
                let mut result = PipelineResult::failure("pipeline worker stopped before producing a result");
                result.spec = spec;
                result
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

fn timed_out(spec: Option<GenerationSpec>, limit: Duration) -> PipelineResult {
    let message = format!("run did not finish within {} ms", limit.as_millis());
    let mut result = PipelineResult::failure(message.clone());
    result.spec = spec;
    result.validation = Some(ValidationResult::failed(Violation::error(ViolationKind::Timeout, message)));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::generate::{BackendError, BackendStrategy, GenerationBackend, SlotPool};
    use crate::prompt::CompiledPrompt;
    use image::RgbaImage;

    #[derive(Debug)]
    struct SlowBackend;

    impl GenerationBackend for SlowBackend {
        fn name(&self) -> &str {
            "slow"
        }

        fn generate(&self, prompt: &CompiledPrompt) -> std::result::Result<Vec<RgbaImage>, BackendError> {
            thread::sleep(Duration::from_millis(500));
            Ok((0..prompt.frames).map(|_| RgbaImage::new(prompt.width, prompt.height)).collect())
        }
    }

    #[derive(Debug)]
    struct BrokenBackend;

    impl GenerationBackend for BrokenBackend {
        fn name(&self) -> &str {
            "broken"
        }

        fn generate(&self, _: &CompiledPrompt) -> std::result::Result<Vec<RgbaImage>, BackendError> {
            panic!("decoder state corrupted")
        }
    }

    #[derive(Debug)]
    struct NoIsolation;

    impl IsolationModel for NoIsolation {
        fn available(&self) -> bool {
            false
        }

        fn isolate(&self, image: &RgbaImage) -> Result<RgbaImage> {
            Ok(image.clone())
        }
    }

    #[test]
    fn test_execute_single_sprite() {
        let result = Pipeline::new().execute("pixel art slime", &PipelineConfig::default());
        assert!(result.success, "{:?}", result.errors);
        assert_eq!(result.outcome, Outcome::Done);
        assert!(result.sprite.is_some());
        assert_eq!(result.name(), "slime");
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    #[test]
    fn test_timeout_returns_failed_result() {
        let backend = BackendStrategy::new(Arc::new(SlowBackend), Arc::new(SlotPool::new(1)));
        let pipeline = Pipeline::new().with_generator(Generator::with_backend(backend));
        let config = PipelineConfig::default().with_timeout(Duration::from_millis(50));

        let result = pipeline.execute("slime", &config);
        assert!(!result.success);
        assert!(result.frames.is_empty());
        let validation = result.validation.unwrap();
        assert!(validation.has(ViolationKind::Timeout));
        assert!(!validation.valid);
    }

    #[test]
    fn test_panicking_stage_becomes_failed_result() {
        let backend = BackendStrategy::new(Arc::new(BrokenBackend), Arc::new(SlotPool::new(1)));
        let pipeline = Pipeline::new().with_generator(Generator::with_backend(backend));

        let result = pipeline.execute("slime", &PipelineConfig::default());
        assert!(!result.success);
        assert_eq!(result.outcome, Outcome::Failed);
        assert!(result.errors[0].contains("decoder state corrupted"));

        let bounded = pipeline.execute("slime", &PipelineConfig::default().with_timeout(Duration::from_secs(30)));
        assert!(!bounded.success);
        assert!(bounded.errors[0].contains("decoder state corrupted"));
    }

    #[test]
    fn test_generous_timeout_completes() {
        let config = PipelineConfig::default().with_timeout(Duration::from_secs(30));
        let result = Pipeline::new().execute("slime", &config);
        assert!(result.success);
    }

    #[test]
    fn test_unavailable_isolation_degrades() {
        let pipeline = Pipeline::new().with_isolation_model(Arc::new(NoIsolation));
        let result = pipeline.execute("slime", &PipelineConfig::default());
        assert!(result.success);
        assert!(result.has_warning(WarningKind::PostProcessingDegraded));
    }

    #[test]
    fn test_unrecognised_subject_warns() {
        let result = Pipeline::new().execute("pixel art", &PipelineConfig::default());
        assert!(result.success);
        assert!(result.has_warning(WarningKind::InterpretationDefault));
    }
}
