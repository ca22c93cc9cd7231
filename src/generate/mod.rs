//! Frame generation.
//!
//! Two strategies produce raw frames: an external backend and the local
//! procedural synthesiser. The [`Generator`] picks one per request and
//! substitutes the procedural strategy whenever the backend reports itself
//! unavailable.

pub mod backend;
pub mod procedural;
pub mod slots;

use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

pub use backend::{BackendError, BackendStrategy, GenerationBackend, HttpBackend};
pub use procedural::ProceduralStrategy;
pub use slots::SlotPool;

use crate::error::{GenError, Result};
use crate::prompt::CompiledPrompt;
use crate::types::{GenerationSpec, RawFrame};

/// Which strategy produced a set of frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Backend,
    Procedural,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Backend => write!(f, "backend"),
            StrategyKind::Procedural => write!(f, "procedural"),
        }
    }
}

/// A selected generation strategy.
#[derive(Debug, Clone)]
pub enum Strategy {
    Backend(BackendStrategy),
    Procedural(ProceduralStrategy),
}

impl Strategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Backend(_) => StrategyKind::Backend,
            Strategy::Procedural(_) => StrategyKind::Procedural,
        }
    }

    pub fn generate(&self, spec: &GenerationSpec, prompt: &CompiledPrompt) -> Result<Vec<RawFrame>> {
        match self {
            Strategy::Backend(backend) => backend.generate(spec, prompt),
            Strategy::Procedural(procedural) => procedural.generate(spec, prompt),
        }
    }
}

/// Frames plus a record of how they were made.
#[derive(Debug, Clone)]
pub struct Generation {
    pub frames: Vec<RawFrame>,
    pub strategy: StrategyKind,
    /// Why the backend was skipped, when the procedural strategy stood in.
    pub fallback: Option<String>,
}

/// Chooses a strategy and applies the fallback policy.
#[derive(Debug, Clone, Default)]
pub struct Generator {
    backend: Option<BackendStrategy>,
    procedural: ProceduralStrategy,
}

impl Generator {
    /// A generator with no backend configured.
    pub fn procedural() -> Self {
        Self::default()
    }

    pub fn with_backend(backend: BackendStrategy) -> Self {
        Self {
            backend: Some(backend),
            procedural: ProceduralStrategy,
        }
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    /// The backend when one is configured, allowed and reachable, else procedural.
    pub fn select(&self, allow_backend: bool) -> Strategy {
        match &self.backend {
            Some(backend) if allow_backend && backend.available() => Strategy::Backend(backend.clone()),
            _ => Strategy::Procedural(self.procedural),
        }
    }

    /// Produce exactly `spec.frame_count()` frames.
    ///
    /// Backend unavailability is never fatal: the procedural strategy runs
    /// instead and the reason is returned in [`Generation::fallback`].
    pub fn generate(
        &self,
        spec: &GenerationSpec,
        prompt: &CompiledPrompt,
        allow_backend: bool,
    ) -> Result<Generation> {
        let strategy = self.select(allow_backend);
        debug!(strategy = %strategy.kind(), "generating frames");

        match strategy.generate(spec, prompt) {
            Ok(frames) => Ok(Generation {
                frames,
                strategy: strategy.kind(),
                fallback: None,
            }),
            Err(GenError::GenerationUnavailable { message }) => {
                warn!(reason = %message, "backend unavailable, using procedural generator");
                let frames = self.run_procedural(spec, prompt)?;
                Ok(Generation {
                    frames,
                    strategy: StrategyKind::Procedural,
                    fallback: Some(message),
                })
            }
            Err(e) => Err(e),
        }
    }

    fn run_procedural(&self, spec: &GenerationSpec, prompt: &CompiledPrompt) -> Result<Vec<RawFrame>> {
        self.procedural.generate(spec, prompt).map_err(|e| match e {
            fatal @ GenError::GenerationFatal { .. } => fatal,
            other => GenError::GenerationFatal {
                message: other.to_string(),
            },
        })
    }
}
