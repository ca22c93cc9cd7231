//! Set command implementation.

use clap::Args;

use crate::error::{GenError, Result};
use crate::export::write_artifacts;
use crate::output::{plural, Printer};
use crate::pipeline::SetType;

use super::{load_project, RunArgs};

/// Generate a set of related sprites from one concept
#[derive(Args, Debug)]
pub struct SetArgs {
    /// Base concept shared by every member of the set
    pub concept: String,

    /// Dimension to vary: directional, animation or color-variants
    #[arg(long, short, default_value = "directional")]
    pub kind: SetType,

    #[command(flatten)]
    pub run: RunArgs,
}

pub fn run(args: SetArgs, printer: &Printer) -> Result<()> {
    let (settings, pipeline) = load_project(printer)?;
    let config = args.run.apply(settings.pipeline_config());
    config.check()?;
    let output = args.run.output_dir(&settings);

    printer.status("Generating", &format!("{} set for \"{}\"", args.kind, args.concept));
    let results = pipeline.generate_asset_set(&args.concept, args.kind, &config);

    let mut failed = 0;
    for result in &results {
        printer.report(result);
        if !result.success {
            failed += 1;
            continue;
        }
        for path in write_artifacts(result, &output)? {
            printer.wrote(&path);
        }
    }

    if failed > 0 {
        return Err(GenError::Export {
            message: format!("{} of {} failed", plural(failed, "member", "members"), results.len()),
            help: None,
        });
    }
    printer.status("Finished", &plural(results.len(), "asset", "assets"));
    Ok(())
}
