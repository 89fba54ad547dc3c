// ABOUTME: Entry point for the reimage CLI application.
// ABOUTME: Parses arguments, sets up logging and dispatches to command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::Cli;
use reimage::config::Settings;
use reimage::error::Result;
use reimage::output::Output;
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // --verbose forces debug for this crate; otherwise RUST_LOG or warn
    let filter = if cli.verbose {
        EnvFilter::new("reimage=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mut output = Output::new(cli.output_mode()).with_verbose(cli.verbose);
    output.start_timer();

    if let Err(e) = run(cli, &output).await {
        output.error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: &Output) -> Result<()> {
    let cwd = env::current_dir()?;

    if cli.list {
        let settings = Settings::resolve(&cwd, &cli.overrides())?;
        let runtime = commands::connect_to_runtime(&settings, output).await?;
        return commands::list(&runtime, output).await;
    }

    if let Some(path) = &cli.restore {
        let settings = Settings::resolve(&cwd, &cli.overrides())?;
        let runtime = commands::connect_to_runtime(&settings, output).await?;
        return commands::restore(&runtime, &settings, path, output).await;
    }

    let target = cli.target()?;
    let settings = Settings::resolve(&cwd, &cli.overrides())?;
    let options = cli.update_options(settings.timeouts.stop);
    let runtime = commands::connect_to_runtime(&settings, output).await?;
    commands::update(&runtime, &settings, &target, options, output).await
}
