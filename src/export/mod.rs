//! Export: sheet assembly, animation metadata and engine bindings.

pub mod bindings;
pub mod metadata;
mod persist;
mod png;
pub mod sheet;

pub use bindings::{CodeBinding, Engine};
pub use metadata::{AnimationCycle, AnimationMetadata, Dimensions, FrameInfo};
pub use persist::write_artifacts;
pub use png::{encode_png, write_png};
pub use sheet::{Bounds, Layout, Sheet, SheetPacker};

use tracing::{debug, warn};

use crate::error::Result;
use crate::types::{GenerationSpec, ProcessedFrame};

/// Something the exporter could not do fully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportIssue {
    /// No template for this engine; a stub was emitted.
    UnsupportedEngine(String),
    /// Metadata failed its consistency check and was dropped.
    Degraded(String),
}

/// Everything the exporter produced.
#[derive(Debug, Clone)]
pub struct ExportOutput {
    pub sheet: Sheet,
    pub metadata: Option<AnimationMetadata>,
    pub bindings: Vec<CodeBinding>,
    pub issues: Vec<ExportIssue>,
}

/// File name of the packed sheet for a spec.
pub fn sheet_file_name(spec: &GenerationSpec) -> String {
    format!("{}-sheet.png", spec.asset_name())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Exporter {
    packer: SheetPacker,
}

impl Exporter {
    pub fn new(layout: Layout, padding: u32) -> Self {
        Self {
            packer: SheetPacker::new(layout, padding),
        }
    }

    /// Pack, describe and bind `frames`.
    ///
    /// Only packing can fail; metadata and binding problems come back as
    /// [`ExportIssue`]s.
    pub fn export(&self, spec: &GenerationSpec, frames: &[ProcessedFrame], engine: Option<&str>) -> Result<ExportOutput> {
        let sheet = self.packer.pack(frames)?;
        let mut issues = Vec::new();

        let metadata = AnimationMetadata::describe(spec, &sheet, self.packer.layout, sheet_file_name(spec));
        let metadata = match metadata.check() {
            Ok(()) => Some(metadata),
            Err(e) => {
                warn!(error = %e, "metadata failed consistency check");
                issues.push(ExportIssue::Degraded(e.to_string()));
                None
            }
        };

        let mut bindings = Vec::new();
        if let (Some(engine), Some(meta)) = (engine, &metadata) {
            let generated = bindings::generate(engine, meta);
            if let Some(id) = generated.unsupported {
                warn!(engine = %id, "no binding template, emitted stub");
                issues.push(ExportIssue::UnsupportedEngine(id));
            }
            bindings = generated.bindings;
        }

        debug!(
            width = sheet.width(),
            height = sheet.height(),
            bindings = bindings.len(),
            "exported"
        );

        Ok(ExportOutput {
            sheet,
            metadata,
            bindings,
            issues,
        })
    }
}
