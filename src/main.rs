mod cli;
mod commands;
mod error;
mod export;
mod matcher;
mod model;
mod ocr;
mod pipeline;
mod region;
mod registry;
mod schema;
mod similarity;
mod store;
mod tokenizer;
mod util;
mod validator;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let data_dir = cli.data_dir;

    match cli.command {
        Commands::Tokenize(args) => commands::tokenize::run(args),
        Commands::Ocr(args) => commands::ocr::run(args),
        Commands::Region(args) => commands::region::run(args),
        Commands::Validate(args) => commands::validate::run(args, &data_dir),
        Commands::Schemas(args) => commands::schemas::run(args, &data_dir),
        Commands::Overrides(args) => commands::overrides::run(args, &data_dir),
        Commands::Map(args) => commands::map::run(args, &data_dir),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
