//! Generate command implementation.
//!
//! Runs one concept through the pipeline and writes the artifacts.

use clap::Args;

use crate::error::{GenError, Result};
use crate::export::write_artifacts;
use crate::output::Printer;

use super::{load_project, RunArgs};

/// Generate a sprite or animation from a concept
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Free-text description, e.g. "pixel art fire pet idle animation"
    pub concept: String,

    #[command(flatten)]
    pub run: RunArgs,
}

pub fn run(args: GenerateArgs, printer: &Printer) -> Result<()> {
    let (settings, pipeline) = load_project(printer)?;
    let config = args.run.apply(settings.pipeline_config());
    config.check()?;
    let output = args.run.output_dir(&settings);

    printer.status("Generating", &format!("\"{}\"", args.concept));
    let result = pipeline.execute(&args.concept, &config);
    printer.report(&result);

    if !result.success {
        return Err(GenError::Export {
            message: format!("nothing written for \"{}\"", args.concept),
            help: result.errors.first().cloned(),
        });
    }

    for path in write_artifacts(&result, &output)? {
        printer.wrote(&path);
    }
    Ok(())
}
