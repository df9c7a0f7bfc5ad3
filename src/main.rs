extern crate clap;
extern crate env_logger;
extern crate log;
extern crate yellowant;

use clap::Parser;
use log::LevelFilter;
use std::env;
use std::process;
use yellowant::commands::{self, Command, Context, StdinPrompt};
use yellowant::settings::{self, Settings};
use yellowant::store::Workspace;
use yellowant::Result;

/// This tool allows YellowAnt application developers to manage their applications.
#[derive(Debug, Parser)]
#[command(name = "yellowant", version)]
struct Cli {
    /// YellowAnt Developer Token
    #[arg(long)]
    token: Option<String>,
    /// YellowAnt Host URL
    #[arg(long)]
    host: Option<String>,
    /// Enables verbose mode.
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        })
        .parse_default_env()
        .init();

    match run(cli) {
        Ok(report) => eprintln!("{}", report),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<String> {
    let auth_file = settings::auth_file_path();
    let settings = Settings::load(&auth_file, cli.token, cli.host)?;
    let workspace = Workspace::new(env::current_dir()?);
    let mut ctx = Context::new(settings, auth_file, workspace)?;
    commands::dispatch(cli.command, &mut ctx, &mut StdinPrompt)
}
