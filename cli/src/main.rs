use anyhow::Context;
use clap::Parser;
use drivefmt_core::{
    Command, Console, Dispatcher, DriveFmtError, FormatterConfig, ShellExecutor, StdoutConsole,
};
use drivefmt_platform::PlatformVolumeSource;
use std::backtrace::BacktraceStatus;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Every token is passed through untouched; the dispatcher decides what they
/// mean, including `?`, `/?`, `-h`, `--help`, `-l` and `--list`.
#[derive(Parser)]
#[command(name = "drivefmt")]
#[command(
    about = "Formats drives through the operating system's format utility",
    long_about = None
)]
#[command(disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// Drive identifiers to format (e.g. D: E:), or --list
    #[arg(allow_hyphen_values = true, trailing_var_arg = true)]
    tokens: Vec<String>,
}

#[tokio::main]
async fn main() {
    init_logging();

    // Internal failures are reported on stdout and the process still exits 0.
    if let Err(error) = run().await {
        report_failure(&error, &mut StdoutConsole);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::try_parse().context("Failed to read the command line")?;
    let command = Command::from_args(&cli.tokens);

    let config = FormatterConfig::from_env();
    tracing::debug!("Starting with {:?}", config);

    let executor = Arc::new(ShellExecutor::new(config.interpreter.clone()));
    let dispatcher = Dispatcher::new(config, Arc::new(PlatformVolumeSource::default()), executor);

    dispatcher
        .run(&command, &mut StdoutConsole)
        .await
        .context("Dispatch failed")?;
    Ok(())
}

/// Prints the single diagnostic for a failure nothing else handled.
fn report_failure(error: &anyhow::Error, console: &mut dyn Console) {
    tracing::error!("{:#}", error);

    let component = error
        .chain()
        .find_map(|cause| cause.downcast_ref::<DriveFmtError>())
        .map(DriveFmtError::component)
        .unwrap_or("drivefmt");

    console.line("Application stopped unexpectedly.");
    console.line(&error.root_cause().to_string());
    console.line(component);
    for cause in error.chain() {
        console.line(&format!("  at: {}", cause));
    }
    let backtrace = error.backtrace();
    if backtrace.status() == BacktraceStatus::Captured {
        console.line(&backtrace.to_string());
    }
    console.line("");
}
