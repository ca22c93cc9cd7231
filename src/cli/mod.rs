pub mod completions;
pub mod generate;
pub mod init;
pub mod palette;
pub mod set;
pub mod tool;

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::config::{load_settings, Settings};
use crate::error::Result;
use crate::export::Layout;
use crate::output::{display_path, Printer};
use crate::pipeline::{Pipeline, PipelineConfig};
use crate::process::UpscalerKind;

/// pxgen - Sprite and animation sheet generator
#[derive(Parser, Debug)]
#[command(name = "pxgen")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a sprite or animation from a concept
    Generate(generate::GenerateArgs),

    /// Generate a set of related sprites from one concept
    Set(set::SetArgs),

    /// Answer one tool-protocol request read from stdin
    Tool(tool::ToolArgs),

    /// Initialize a pxgen project (writes pxgen.yaml)
    Init(init::InitArgs),

    /// Extract the dominant colours of a PNG file
    Palette(palette::PaletteArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Pipeline options shared by the generating commands.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Engine to emit code bindings for (godot, unity, phaser, love2d, generic)
    #[arg(long, short)]
    pub engine: Option<String>,

    /// Output directory (default from pxgen.yaml, else dist)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Integer upscale factor applied after validation
    #[arg(long)]
    pub upscale: Option<u32>,

    /// Upscale with Catmull-Rom instead of nearest-neighbour
    #[arg(long)]
    pub smooth: bool,

    /// Sheet layout: horizontal or grid:<columns>
    #[arg(long)]
    pub layout: Option<Layout>,

    /// Padding between sheet cells in pixels
    #[arg(long)]
    pub padding: Option<u32>,

    /// Whole-run timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Never call the generation backend
    #[arg(long)]
    pub offline: bool,

    /// Skip the post-processing chain
    #[arg(long)]
    pub no_post_processing: bool,

    /// Skip validation
    #[arg(long)]
    pub no_validation: bool,
}

impl RunArgs {
    /// Overlay command-line options on the configured defaults.
    pub fn apply(&self, mut config: PipelineConfig) -> PipelineConfig {
        if let Some(engine) = &self.engine {
            config.target_engine = Some(engine.clone());
        }
        if let Some(upscale) = self.upscale {
            config.upscale = upscale.max(1);
        }
        if self.smooth {
            config.upscaler = UpscalerKind::Smooth;
        }
        if let Some(layout) = self.layout {
            config.layout = layout;
        }
        if let Some(padding) = self.padding {
            config.padding = padding;
        }
        if let Some(secs) = self.timeout {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if self.offline {
            config.allow_backend = false;
        }
        if self.no_post_processing {
            config.enable_post_processing = false;
        }
        if self.no_validation {
            config.enable_validation = false;
        }
        config
    }

    pub fn output_dir(&self, settings: &Settings) -> PathBuf {
        self.output.clone().unwrap_or_else(|| settings.output.clone())
    }
}

/// Settings from the nearest pxgen.yaml plus the pipeline they describe.
pub(crate) fn load_project(printer: &Printer) -> Result<(Settings, Pipeline)> {
    let cwd = std::env::current_dir()?;
    let (settings, path) = load_settings(&cwd)?;
    if let Some(path) = path {
        printer.info("Using", &display_path(&path));
    }
    let pipeline = settings.build_pipeline()?;
    Ok((settings, pipeline))
}
