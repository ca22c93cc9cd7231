//! Project configuration.
//!
//! Settings come from a `pxgen.yaml` file found in the working directory
//! or one of its ancestors, with environment overrides applied on top.

mod settings;

use std::path::{Path, PathBuf};

use crate::error::Result;

pub use settings::{BackendSettings, PipelineSettings, Settings, BACKEND_URL_ENV};

/// The name of the settings file.
pub const SETTINGS_FILENAME: &str = "pxgen.yaml";

/// Walk up from `start` looking for a settings file.
pub fn find_settings(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(SETTINGS_FILENAME))
        .find(|candidate| candidate.is_file())
}

/// Load the nearest settings file, or defaults when there is none.
///
/// Returns the settings and the file they came from.
pub fn load_settings(start: &Path) -> Result<(Settings, Option<PathBuf>)> {
    let path = find_settings(start);
    let settings = match &path {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    Ok((settings.with_env_overrides(), path))
}
