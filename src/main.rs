mod cli;
mod config;
mod dag;
mod error;
mod gitlab;
mod output;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

fn main() -> Result<()> {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting gendag - synthetic CI job graph generator");
    cli.execute()?;

    Ok(())
}
