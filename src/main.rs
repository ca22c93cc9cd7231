use clap::Parser;
use miette::Result;
use pxgen::cli::{Cli, Commands};
use pxgen::output::Printer;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let printer = Printer::new();
    match cli.command {
        Commands::Generate(args) => pxgen::cli::generate::run(args, &printer)?,
        Commands::Set(args) => pxgen::cli::set::run(args, &printer)?,
        Commands::Tool(args) => pxgen::cli::tool::run(args, &printer)?,
        Commands::Init(args) => pxgen::cli::init::run(args, &printer)?,
        Commands::Palette(args) => pxgen::cli::palette::run(args, &printer)?,
        Commands::Completions(args) => pxgen::cli::completions::run(args)?,
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("pxgen={}", level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
