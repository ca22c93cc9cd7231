//! Quality validation for processed frames.
//!
//! Runs every check against the batch and the generation spec it was generated
//! from. Checks never short-circuit: the result always lists every
//! violation so callers can choose between retrying and accepting
//! degraded output.

mod checks;
mod violation;

pub use checks::colour_count;
pub use violation::{Severity, ValidationResult, Violation, ViolationKind};

use tracing::debug;

use crate::types::{GenerationSpec, ProcessedFrame};

/// Check frames against the generation spec's constraints.
pub fn validate(frames: &[ProcessedFrame], spec: &GenerationSpec) -> ValidationResult {
    let violations: Vec<Violation> = [
        checks::check_dimensions(frames, spec),
        checks::check_transparency(frames, spec),
        checks::check_palette(frames, spec),
        checks::check_frame_count(frames, spec),
        checks::check_pixel_alignment(frames, spec),
    ]
    .into_iter()
    .flatten()
    .collect();

    let result = ValidationResult::from_violations(violations);
    debug!(valid = result.valid, score = result.score, violations = result.violations.len(), "validated");
    result
}
