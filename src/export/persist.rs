//! Writing a finished result to disk.

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{GenError, Result};
use crate::pipeline::PipelineResult;

use super::png::write_png;

/// Write every artifact of `result` under `dir` and return the paths written.
///
/// Produces `<name>.png` for a single sprite, `<name>-sheet.png`,
/// `<name>.json` for the metadata, and each binding at its relative path.
/// Missing directories are created. Every path stays under `dir`.
pub fn write_artifacts(result: &PipelineResult, dir: &Path) -> Result<Vec<PathBuf>> {
    create_dir(dir)?;
    let name = result.name();
    let mut written = Vec::new();

    if let Some(sprite) = &result.sprite {
        let path = inside(dir, &format!("{}.png", name))?;
        write_png(sprite, &path)?;
        written.push(path);
    }

    if let Some(sheet) = &result.sheet {
        let file = result
            .metadata
            .as_ref()
            .map(|m| m.image.clone())
            .unwrap_or_else(|| format!("{}-sheet.png", name));
        let path = inside(dir, &file)?;
        write_png(sheet, &path)?;
        written.push(path);
    }

    if let Some(metadata) = &result.metadata {
        let path = inside(dir, &format!("{}.json", name))?;
        let json = serde_json::to_string_pretty(metadata).map_err(|e| GenError::Export {
            message: format!("Failed to serialise metadata: {}", e),
            help: None,
        })?;
        write_file(&path, json.as_bytes())?;
        written.push(path);
    }

    for binding in &result.bindings {
        let path = inside(dir, &binding.path)?;
        if let Some(parent) = path.parent() {
            create_dir(parent)?;
        }
        write_file(&path, binding.source.as_bytes())?;
        written.push(path);
    }

    debug!(count = written.len(), dir = %dir.display(), "wrote artifacts");
    Ok(written)
}

/// Join `relative` onto `dir`, refusing anything but plain path segments.
fn inside(dir: &Path, relative: &str) -> Result<PathBuf> {
    let rel = Path::new(relative);
    let plain = rel.components().next().is_some()
        && rel.components().all(|c| matches!(c, Component::Normal(_)));
    if !plain {
        return Err(GenError::Export {
            message: format!("refusing to write '{}' outside the output directory", relative),
            help: None,
        });
    }
    Ok(dir.join(rel))
}

fn create_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| GenError::Io {
        path: dir.to_path_buf(),
        message: format!("Failed to create directory: {}", e),
    })
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    fs::write(path, contents).map_err(|e| GenError::Io {
        path: path.to_path_buf(),
        message: format!("Failed to write file: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Pipeline, PipelineConfig};
    use tempfile::TempDir;

    #[test]
    fn test_write_single_sprite() {
        let result = Pipeline::new().execute("pixel art slime", &PipelineConfig::default());
        let dir = TempDir::new().unwrap();

        let written = write_artifacts(&result, dir.path()).unwrap();
        let names: Vec<_> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["slime.png", "slime-sheet.png", "slime.json"]);
        assert!(written.iter().all(|p| p.exists()));
    }

    #[test]
    fn test_write_bindings_into_subdirectories() {
        let config = PipelineConfig::default().with_engine("godot");
        let result = Pipeline::new().execute("bat walk cycle", &config);
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("nested");

        let written = write_artifacts(&result, &out).unwrap();
        assert!(!written.iter().any(|p| p.ends_with("bat-walk.png")));
        assert!(out.join("bat-walk-sheet.png").exists());
        assert!(out.join("scripts").join("bat_walk.gd").exists());

        let json = std::fs::read_to_string(out.join("bat-walk.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["frames"].as_array().unwrap().len(), 8);
        assert_eq!(value["frameWidth"], 32);
    }

    #[test]
    fn test_artifacts_stay_inside_output_dir() {
        let mut result = Pipeline::new().execute("/tmp/escape ../../slime", &PipelineConfig::default());
        let dir = TempDir::new().unwrap();

        let written = write_artifacts(&result, dir.path()).unwrap();
        assert!(!written.is_empty());
        assert!(written.iter().all(|p| p.starts_with(dir.path())));

        result.bindings.push(crate::export::CodeBinding {
            engine: "custom".into(),
            path: "../outside.txt".into(),
            source: String::new(),
        });
        assert!(write_artifacts(&result, dir.path()).is_err());
        assert!(!dir.path().parent().unwrap().join("outside.txt").exists());
    }

    #[test]
    fn test_inside_rejects_absolute_and_parent_paths() {
        let dir = Path::new("out");
        assert_eq!(inside(dir, "scripts/a.gd").unwrap(), dir.join("scripts").join("a.gd"));
        assert!(inside(dir, "/etc/passwd").is_err());
        assert!(inside(dir, "a/../../b").is_err());
        assert!(inside(dir, "").is_err());
    }

    #[test]
    fn test_failed_result_writes_nothing() {
        let result = PipelineResult::failure("no words");
        let dir = TempDir::new().unwrap();
        assert!(write_artifacts(&result, dir.path()).unwrap().is_empty());
    }
}
