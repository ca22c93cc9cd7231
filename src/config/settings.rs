//! Project settings (pxgen.yaml) parsing.
//!
//! The settings file names the output directory, an optional default
//! engine, the generation backend and the per-run pipeline defaults.
//! Every key is optional.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GenError, Result};
use crate::export::Layout;
use crate::generate::{BackendStrategy, Generator, HttpBackend};
use crate::pipeline::{Pipeline, PipelineConfig};
use crate::process::{Anchor, Fit, UpscalerKind};

/// Environment variable that replaces (or enables) the backend URL.
pub const BACKEND_URL_ENV: &str = "PXGEN_BACKEND_URL";

/// Project settings loaded from pxgen.yaml.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Output directory for written artifacts.
    pub output: PathBuf,

    /// Default engine for code bindings.
    pub engine: Option<String>,

    /// Generation backend; absent means procedural generation only.
    pub backend: Option<BackendSettings>,

    pub pipeline: PipelineSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output: PathBuf::from("dist"),
            engine: None,
            backend: None,
            pipeline: PipelineSettings::default(),
        }
    }
}

/// Connection and concurrency settings for the HTTP generation backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    pub url: String,
    pub timeout_secs: u64,
    /// Size of the shared request slot pool.
    pub slots: usize,
    pub retry_delay_ms: u64,
    /// How long a caller waits for a free slot.
    pub slot_wait_ms: u64,
    /// Name of the env var holding a bearer token.
    pub api_key_env: Option<String>,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_secs: 60,
            slots: 2,
            retry_delay_ms: 500,
            slot_wait_ms: 5000,
            api_key_env: None,
        }
    }
}

/// Defaults for each pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub post_processing: bool,
    pub validation: bool,
    pub export: bool,
    pub upscale: u32,
    pub upscaler: UpscalerKind,
    pub padding: u32,
    pub layout: Layout,
    pub fit: Fit,
    pub anchor: Anchor,
    pub timeout_secs: Option<u64>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            post_processing: true,
            validation: true,
            export: true,
            upscale: 1,
            upscaler: UpscalerKind::Nearest,
            padding: 0,
            layout: Layout::Horizontal,
            fit: Fit::Contain,
            anchor: Anchor::Center,
            timeout_secs: None,
        }
    }
}

impl Settings {
    /// Load settings from a pxgen.yaml file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| GenError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read settings: {}", e),
        })?;

        Self::parse(&content)
    }

    /// Parse settings from a YAML string.
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Self = serde_yaml::from_str(content).map_err(|e| GenError::Config {
            message: format!("Invalid settings: {}", e),
            help: Some(format!("Check {} syntax", super::SETTINGS_FILENAME)),
        })?;
        settings.pipeline_config().check()?;
        Ok(settings)
    }

    /// Replace the backend URL from the environment when set.
    pub fn with_env_overrides(self) -> Self {
        self.with_backend_url(std::env::var(BACKEND_URL_ENV).ok())
    }

    fn with_backend_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            debug!(%url, "backend url from environment");
            self.backend.get_or_insert_with(BackendSettings::default).url = url;
        }
        self
    }

    /// Per-run options derived from these settings.
    pub fn pipeline_config(&self) -> PipelineConfig {
        let p = &self.pipeline;
        PipelineConfig {
            enable_post_processing: p.post_processing,
            enable_validation: p.validation,
            enable_export: p.export,
            target_engine: self.engine.clone(),
            allow_backend: true,
            upscale: p.upscale.max(1),
            upscaler: p.upscaler,
            layout: p.layout,
            padding: p.padding,
            fit: p.fit,
            anchor: p.anchor,
            timeout_ms: p.timeout_secs.map(|s| Duration::from_secs(s).as_millis() as u64),
        }
    }

    /// A pipeline wired to the configured backend, if any.
    pub fn build_pipeline(&self) -> Result<Pipeline> {
        let Some(backend) = self.backend.as_ref().filter(|b| !b.url.trim().is_empty()) else {
            return Ok(Pipeline::new());
        };
        if backend.slots == 0 {
            return Err(GenError::Config {
                message: "backend.slots must be at least 1".to_string(),
                help: None,
            });
        }

        let client = HttpBackend::from_settings(backend)?;
        let strategy = BackendStrategy::from_settings(Arc::new(client), backend);
        Ok(Pipeline::new().with_generator(Generator::with_backend(strategy)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_minimal_settings() {
        let settings = Settings::parse("output: build").unwrap();

        assert_eq!(settings.output, PathBuf::from("build"));
        assert!(settings.backend.is_none());
        assert_eq!(settings.pipeline, PipelineSettings::default());
    }

    #[test]
    fn test_parse_full_settings() {
        let yaml = r#"
output: dist/sprites
engine: godot
backend:
  url: http://localhost:7860/generate
  slots: 4
  api_key_env: PXGEN_TOKEN
pipeline:
  validation: false
  upscale: 4
  upscaler: smooth
  padding: 2
  layout: "grid:4"
  fit: stretch
  anchor: bottom
  timeout_secs: 30
"#;
        let settings = Settings::parse(yaml).unwrap();

        assert_eq!(settings.output, PathBuf::from("dist/sprites"));
        assert_eq!(settings.engine.as_deref(), Some("godot"));
        let backend = settings.backend.as_ref().unwrap();
        assert_eq!(backend.slots, 4);
        assert_eq!(backend.timeout_secs, 60);
        assert_eq!(backend.api_key_env.as_deref(), Some("PXGEN_TOKEN"));

        let config = settings.pipeline_config();
        assert!(!config.enable_validation);
        assert_eq!(config.target_engine.as_deref(), Some("godot"));
        assert_eq!(config.upscale, 4);
        assert_eq!(config.upscaler, UpscalerKind::Smooth);
        assert_eq!(config.layout, Layout::Grid { columns: 4 });
        assert_eq!(config.fit, Fit::Stretch);
        assert_eq!(config.anchor, Anchor::Bottom);
        assert_eq!(config.timeout_ms, Some(30_000));
    }

    #[test]
    fn test_parse_empty_settings() {
        let settings = Settings::parse("").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_invalid_settings() {
        let err = Settings::parse("pipeline: nope").unwrap_err();
        assert!(matches!(err, GenError::Config { .. }));
    }

    #[test]
    fn test_out_of_range_pipeline_settings() {
        let err = Settings::parse("pipeline:\n  padding: 5000\n").unwrap_err();
        assert!(err.to_string().contains("padding"));
    }

    #[test]
    fn test_backend_url_override() {
        let settings = Settings::default().with_backend_url(Some("http://gpu:9000".into()));
        assert_eq!(settings.backend.unwrap().url, "http://gpu:9000");

        let settings = Settings::default().with_backend_url(Some("  ".into()));
        assert!(settings.backend.is_none());
    }

    #[test]
    fn test_build_pipeline_without_backend_is_procedural() {
        let pipeline = Settings::default().build_pipeline().unwrap();
        assert!(!pipeline.generator().has_backend());
    }

    #[test]
    fn test_build_pipeline_rejects_zero_slots() {
        let mut settings = Settings::default();
        settings.backend = Some(BackendSettings {
            url: "http://localhost:1".into(),
            slots: 0,
            ..BackendSettings::default()
        });
        assert!(settings.build_pipeline().is_err());
    }
}
