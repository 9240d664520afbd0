//! # archgen
//!
//! Generates a reference architecture from a folder of discovery documents
//! (SOWs, Q&A transcripts, architecture notes) with one call to an LLM.
//!
//! ## Features
//!
//! - Markdown, plain text and PDF inputs (best-effort PDF extraction)
//! - Deterministic corpus with a character ceiling
//! - One blocking request to the Anthropic Messages API
//! - Mermaid diagram, explanation and raw response written side by side
//!
//! ## Quick Start
//!
//! ```no_run
//! use archgen::Config;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::builder()
//!     .docs_dir("./discovery-docs")
//!     .output_dir("./outputs")
//!     .max_tokens(4_000)
//!     .build()?;
//!
//! archgen::run(config)?.print_summary();
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library follows a pipeline architecture:
//! 1. **Scanner**: reads supported files into a [`Corpus`]
//! 2. **Template**: wraps the corpus in the instruction prompt
//! 3. **Client**: sends the prompt to the generation service
//! 4. **Splitter**: separates the mermaid block from the prose
//! 5. **Writer**: persists diagram, explanation and raw response

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod client;
mod config;
mod corpus;
mod error;
mod file;
mod pipeline;
mod scanner;
mod splitter;
mod template;
mod writer;

pub use client::{
    AnthropicClient, Credentials, GenerationClient, GenerationRequest, GenerationResult, Usage,
    API_KEY_VAR,
};
pub use config::{
    Config, ConfigBuilder, DEFAULT_API_URL, DEFAULT_MAX_CORPUS_CHARS, DEFAULT_MAX_TOKENS,
    DEFAULT_MODEL,
};
pub use corpus::{Corpus, TRUNCATION_MARKER};
pub use error::{Error, Result};
pub use file::{extract, Document, DocumentKind, Extraction};
pub use pipeline::{Pipeline, RunStats};
pub use splitter::{split_response, SplitOutput, DIAGRAM_PLACEHOLDER};
pub use template::{Prompt, SYSTEM_PROMPT};
pub use writer::{
    WrittenFiles, DIAGRAM_FILE, EXPLANATION_FILE, FULL_RESPONSE_FILE, PROMPT_FILE,
};

/// Runs a complete generation with the given configuration.
///
/// This is the main entry point for the library. The API credential is read
/// from the environment before anything else happens, so a missing key fails
/// fast. In dry-run mode no credential is needed and only the prompt is
/// written.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration is invalid
/// - The API credential is missing
/// - The docs directory cannot be listed
/// - The generation call fails
/// - Output files cannot be written
pub fn run(config: Config) -> Result<RunStats> {
    run_with_key(config, std::env::var(API_KEY_VAR).ok())
}

fn run_with_key(config: Config, api_key: Option<String>) -> Result<RunStats> {
    if config.dry_run {
        return Pipeline::new(config)?.dry_run();
    }

    let credentials = Credentials::from_value(api_key)?;
    let client = AnthropicClient::new(&config.api_url, credentials);
    Pipeline::new(config)?.run(&client)
}
