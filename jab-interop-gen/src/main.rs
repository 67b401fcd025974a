use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "abgen=info";

/// Regenerate the Java Access Bridge interop source.
#[derive(Parser, Debug)]
#[command(name = "jab-interop-gen", version, about)]
struct Cli {
    /// Destination C# file.
    output: PathBuf,
}

/// Filter directives from `var`, falling back to `abgen=info`.
fn log_filter(var: &str) -> EnvFilter {
    EnvFilter::try_from_env(var).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(EnvFilter::DEFAULT_ENV))
        .init();

    let cli = Cli::parse();
    jab_interop_gen::generate(&cli.output)?;

    println!("Generated Access Bridge interop source at {}", cli.output.display());
    Ok(())
}
