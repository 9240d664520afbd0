use anyhow::Context;
use archgen::{Config, DEFAULT_API_URL, DEFAULT_MAX_CORPUS_CHARS, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "archgen",
    version,
    about = "Generate a reference architecture from discovery docs via Claude",
    long_about = "Generate a reference architecture from discovery docs via Claude.\n\n\
    Reads every .md, .txt and .pdf file directly inside the docs directory, \
    sends them in one prompt, and writes a Mermaid diagram, an explanation \
    and the full JSON response to the output directory.\n\n\
    The API key is read from ANTHROPIC_API_KEY (a .env file in the working \
    directory is loaded first).\n\n\
    USAGE EXAMPLES:\n  \
      # Use ./discovery-docs and ./outputs\n  \
      archgen\n\n  \
      # Another client folder and a larger answer budget\n  \
      archgen --docs-dir ./acme --out-dir ./acme-out --max-tokens 8000\n\n  \
      # Inspect the prompt without calling the API\n  \
      archgen --dry-run"
)]
struct Cli {
    /// Directory with discovery documents (not scanned recursively)
    #[arg(long, default_value = "discovery-docs", value_name = "PATH")]
    docs_dir: PathBuf,

    /// Output directory for the diagram, explanation and raw response
    #[arg(long, default_value = "outputs", value_name = "PATH")]
    out_dir: PathBuf,

    /// Model identifier
    #[arg(long, env = "ARCHGEN_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Maximum output tokens
    #[arg(long, env = "ARCHGEN_MAX_TOKENS", default_value_t = DEFAULT_MAX_TOKENS)]
    max_tokens: u32,

    /// Ceiling on the combined document text, in characters
    #[arg(long, env = "ARCHGEN_MAX_CORPUS_CHARS", default_value_t = DEFAULT_MAX_CORPUS_CHARS)]
    max_corpus_chars: usize,

    /// Messages API base URL
    #[arg(long, env = "ANTHROPIC_BASE_URL", default_value = DEFAULT_API_URL, hide_env_values = true)]
    api_url: String,

    /// Dry run (write the prompt, don't call the API)
    #[arg(long)]
    dry_run: bool,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    // .env must be loaded before clap reads env-backed defaults
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    setup_tracing(cli.verbose)?;

    match dotenv {
        Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => tracing::debug!("No .env file found"),
        Err(e) => tracing::warn!("Ignoring unreadable .env file: {}", e),
    }

    let config = Config::builder()
        .docs_dir(cli.docs_dir)
        .output_dir(cli.out_dir)
        .model(cli.model)
        .max_tokens(cli.max_tokens)
        .max_corpus_chars(cli.max_corpus_chars)
        .api_url(cli.api_url)
        .dry_run(cli.dry_run)
        .build()
        .context("Failed to build configuration")?;

    let stats = archgen::run(config).context("Architecture generation failed")?;
    stats.print_summary();

    Ok(())
}

fn setup_tracing(verbosity: u8) -> anyhow::Result<()> {
    let filter = match verbosity {
        0 => EnvFilter::new("archgen=info"),
        1 => EnvFilter::new("archgen=debug"),
        _ => EnvFilter::new("archgen=trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}
