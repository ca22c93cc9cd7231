use std::path::PathBuf;

use clap::Args;

use crate::error::{GenError, Result};
use crate::output::{display_path, plural, Printer};
use crate::types::palette::dominant_colours;

/// Extract the dominant colours of a PNG file
#[derive(Args, Debug)]
pub struct PaletteArgs {
    /// PNG file to extract colours from
    #[arg(required = true)]
    pub file: PathBuf,

    /// Maximum number of colours to output
    #[arg(long)]
    pub max: Option<usize>,
}

pub fn run(args: PaletteArgs, printer: &Printer) -> Result<()> {
    let path = &args.file;

    let img = image::open(path)
        .map_err(|e| GenError::Io {
            path: path.clone(),
            message: e.to_string(),
        })?
        .to_rgba8();

    let colours = dominant_colours(std::iter::once(&img), args.max);
    printer.status(
        "Sampled",
        &format!("{} from {}", plural(colours.len(), "colour", "colours"), display_path(path)),
    );

    // Hex lines on stdout can be pasted into a concept as an explicit palette.
    for colour in &colours {
        println!("{}", colour);
    }

    Ok(())
}
