//! Init command implementation.
//!
//! Writes a commented default `pxgen.yaml`.

use std::fs;
use std::path::PathBuf;

use clap::Args;

use crate::config::SETTINGS_FILENAME;
use crate::error::{GenError, Result};
use crate::output::{display_path, Printer};

/// Initialize a pxgen project by writing pxgen.yaml
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Project directory (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite an existing pxgen.yaml
    #[arg(long)]
    pub force: bool,

    /// Default engine for code bindings
    #[arg(long)]
    pub engine: Option<String>,

    /// Generation backend URL
    #[arg(long)]
    pub backend: Option<String>,
}

/// Render the settings file.
pub fn template(engine: Option<&str>, backend: Option<&str>) -> String {
    let mut yaml = String::new();
    yaml.push_str("# pxgen project settings\n\n");
    yaml.push_str("output: dist\n");

    match engine {
        Some(engine) => yaml.push_str(&format!("engine: {}\n", engine)),
        None => yaml.push_str("# engine: godot  # godot | unity | phaser | love2d | generic\n"),
    }

    yaml.push('\n');
    match backend {
        Some(url) => {
            yaml.push_str("backend:\n");
            yaml.push_str(&format!("  url: {}\n", url));
            yaml.push_str("  timeout_secs: 60\n");
            yaml.push_str("  slots: 2\n");
            yaml.push_str("  # api_key_env: PXGEN_API_KEY\n");
        }
        None => {
            yaml.push_str("# Without a backend every sprite is drawn procedurally.\n");
            yaml.push_str("# backend:\n");
            yaml.push_str("#   url: http://localhost:7860/generate\n");
            yaml.push_str("#   timeout_secs: 60\n");
            yaml.push_str("#   slots: 2\n");
            yaml.push_str("#   api_key_env: PXGEN_API_KEY\n");
        }
    }

    yaml.push_str(
        "\npipeline:\n  post_processing: true\n  validation: true\n  export: true\n  upscale: 1\n  upscaler: nearest  # nearest | smooth\n  layout: horizontal  # horizontal | grid:<columns>\n  padding: 0\n  fit: contain  # contain | stretch\n  anchor: center  # center | bottom\n",
    );
    yaml
}

pub fn run(args: InitArgs, printer: &Printer) -> Result<()> {
    let settings_path = args.path.join(SETTINGS_FILENAME);

    if settings_path.exists() && !args.force {
        return Err(GenError::Config {
            message: format!("{} already exists", SETTINGS_FILENAME),
            help: Some("Use --force to overwrite".to_string()),
        });
    }

    let yaml = template(args.engine.as_deref(), args.backend.as_deref());
    fs::write(&settings_path, &yaml).map_err(|e| GenError::Io {
        path: settings_path.clone(),
        message: format!("Failed to write settings: {}", e),
    })?;

    printer.status("Created", &display_path(&settings_path));
    Ok(())
}
