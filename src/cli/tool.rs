//! Tool command: one protocol request on stdin, one response on stdout.

use std::io::{self, Read};

use clap::Args;

use crate::error::Result;
use crate::output::Printer;
use crate::tool::Dispatcher;

use super::load_project;

/// Answer one tool-protocol request read from stdin
#[derive(Args, Debug)]
pub struct ToolArgs {
    /// Print the operation schemas instead of reading a request
    #[arg(long)]
    pub describe: bool,
}

pub fn run(args: ToolArgs, printer: &Printer) -> Result<()> {
    let (settings, pipeline) = load_project(printer)?;
    let dispatcher = Dispatcher::new(pipeline, settings.pipeline_config());

    if args.describe {
        println!("{}", dispatcher.describe());
        return Ok(());
    }

    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    println!("{}", dispatcher.handle_json(&input));
    Ok(())
}
