//! Per-run pipeline options.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{GenError, Result};
use crate::export::Layout;
use crate::process::{Anchor, Fit, UpscalerKind};

/// Largest accepted upscale factor.
pub const MAX_UPSCALE: u32 = 16;

/// Largest accepted gap between sheet cells, in pixels.
pub const MAX_PADDING: u32 = 1024;

/// Options for one `execute` call.
///
/// Deserializes from camelCase keys so a tool request's parameter object
/// can be passed straight through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineConfig {
    pub enable_post_processing: bool,
    pub enable_validation: bool,
    pub enable_export: bool,
    pub target_engine: Option<String>,
    /// Try the configured backend before the procedural generator.
    pub allow_backend: bool,
    /// Post-validation upscale factor; 1 disables upscaling.
    pub upscale: u32,
    pub upscaler: UpscalerKind,
    pub layout: Layout,
    pub padding: u32,
    pub fit: Fit,
    pub anchor: Anchor,
    /// Whole-run timeout in milliseconds.
    pub timeout_ms: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enable_post_processing: true,
            enable_validation: true,
            enable_export: true,
            target_engine: None,
            allow_backend: true,
            upscale: 1,
            upscaler: UpscalerKind::Nearest,
            layout: Layout::Horizontal,
            padding: 0,
            fit: Fit::Contain,
            anchor: Anchor::Center,
            timeout_ms: None,
        }
    }
}

impl PipelineConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.target_engine = Some(engine.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Reject option values outside their supported ranges.
    pub fn check(&self) -> Result<()> {
        if self.upscale > MAX_UPSCALE {
            return Err(GenError::Config {
                message: format!("upscale {} exceeds the maximum of {}", self.upscale, MAX_UPSCALE),
                help: None,
            });
        }
        if self.padding > MAX_PADDING {
            return Err(GenError::Config {
                message: format!("padding {} exceeds the maximum of {}px", self.padding, MAX_PADDING),
                help: None,
            });
        }
        Ok(())
    }
}
