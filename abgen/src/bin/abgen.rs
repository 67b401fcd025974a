//! CLI entry point for abgen.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

/// abgen: generate C# interop glue from a declarative ABI schema.
#[derive(Parser, Debug)]
#[command(name = "abgen", version, about)]
struct Cli {
    /// Path to the schema TOML file.
    schema: PathBuf,

    /// Output file path (overrides the schema's `output.file`).
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("abgen=info")),
        )
        .init();

    let cli = Cli::parse();
    abgen::run(&cli.schema, cli.output.as_deref())?;
    Ok(())
}
