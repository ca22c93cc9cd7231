//! pxgen - Sprite and animation sheet generator
//!
//! Turns a free-text concept such as "pixel art fire pet idle animation"
//! into engine-ready assets: a sprite or frame sequence, a packed sheet,
//! animation metadata and optional engine code bindings.
//!
//! ```no_run
//! use pxgen::{Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::default().with_engine("godot");
//! let result = Pipeline::new().execute("pixel art fire pet idle animation", &config);
//! assert!(result.success);
//! ```

pub mod cli;
pub mod concept;
pub mod config;
pub mod error;
pub mod export;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod prompt;
pub mod tool;
pub mod types;
pub mod validation;

pub use concept::{interpret, Interpretation, Interpreter};
pub use config::{BackendSettings, Settings};
pub use error::{GenError, Result};
pub use export::{write_artifacts, AnimationMetadata, CodeBinding, Engine, Exporter, Layout};
pub use generate::{BackendStrategy, GenerationBackend, Generator, HttpBackend, ProceduralStrategy, StrategyKind};
pub use pipeline::{Outcome, Pipeline, PipelineConfig, PipelineResult, SetType, Stage, Warning, WarningKind};
pub use prompt::{compile, CompiledPrompt};
pub use types::{Colour, GenerationSpec, ProcessedFrame, RawFrame, Resolution, SpecBuilder, Style, ViewAngle};
pub use validation::{validate, Severity, ValidationResult, Violation, ViolationKind};
