//! Post-processing chain.
//!
//! Each [`Transform`] takes the whole frame batch and returns a new batch,
//! so cross-frame invariants (shared size, shared pivot, shared palette)
//! can be enforced in one place. The [`Chain`] runs transforms in order;
//! a transform that fails leaves the batch untouched and is reported as
//! degraded instead of failing the run.

mod align;
mod isolate;
mod normalize;
mod quantize;
mod upscale;

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

pub use align::{Align, Anchor};
pub use isolate::{BorderKeyModel, Isolate, IsolationModel};
pub use normalize::{Fit, Normalize};
pub use quantize::Quantize;
pub use upscale::{upscale_frames, NearestUpscaler, SmoothUpscaler, Upscaler, UpscalerKind};

use crate::error::Result;
use crate::types::{GenerationSpec, ProcessedFrame};

/// A batch-wide, pure frame transform.
pub trait Transform: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Produce a new batch. An error means "could not run", never "half ran".
    fn apply(&self, frames: &[ProcessedFrame]) -> Result<Vec<ProcessedFrame>>;
}

/// A transform that could not run, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Degradation {
    pub transform: &'static str,
    pub message: String,
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} skipped: {}", self.transform, self.message)
    }
}

/// Result of running a chain.
#[derive(Debug, Clone)]
pub struct ChainOutput {
    pub frames: Vec<ProcessedFrame>,
    pub degraded: Vec<Degradation>,
}

/// Options for the standard chain that do not come from the generation spec.
#[derive(Debug, Clone)]
pub struct ChainOptions {
    pub fit: Fit,
    pub anchor: Anchor,
    pub isolation: Arc<dyn IsolationModel>,
}

impl Default for ChainOptions {
    fn default() -> Self {
        Self {
            fit: Fit::default(),
            anchor: Anchor::default(),
            isolation: Arc::new(BorderKeyModel::default()),
        }
    }
}

/// An ordered list of transforms.
#[derive(Debug, Default)]
pub struct Chain {
    transforms: Vec<Box<dyn Transform>>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard order: isolate, normalize, align, quantize.
    ///
    /// Isolation is left out when the generation spec does not ask for transparency.
    pub fn standard(spec: &GenerationSpec, options: &ChainOptions) -> Self {
        let mut chain = Self::new();
        if spec.constraints().require_transparency {
            chain = chain.then(Isolate::new(Arc::clone(&options.isolation)));
        }
        chain
            .then(Normalize::for_spec(spec, options.fit))
            .then(Align::new(options.anchor))
            .then(Quantize::for_spec(spec))
    }

    pub fn then(mut self, transform: impl Transform + 'static) -> Self {
        self.transforms.push(Box::new(transform));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn run(&self, frames: Vec<ProcessedFrame>) -> ChainOutput {
        let mut frames = frames;
        let mut degraded = Vec::new();

        for transform in &self.transforms {
            match transform.apply(&frames) {
                Ok(next) => {
                    debug!(transform = transform.name(), frames = next.len(), "transform applied");
                    frames = next;
                }
                Err(e) => {
                    warn!(transform = transform.name(), error = %e, "transform degraded, frames passed through");
                    degraded.push(Degradation {
                        transform: transform.name(),
                        message: e.to_string(),
                    });
                }
            }
        }

        ChainOutput { frames, degraded }
    }
}
