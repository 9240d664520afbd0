use crate::{
    client::{GenerationClient, GenerationRequest, Usage},
    config::Config,
    error::Result,
    scanner::Scanner,
    splitter::split_response,
    template::{PromptBuilder, SYSTEM_PROMPT},
    writer::{WrittenFiles, Writer},
};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

/// Statistics collected during a run.
#[derive(Debug, Clone)]
pub struct RunStats {
    /// Documents folded into the corpus
    pub documents: usize,

    /// Documents replaced by an extraction diagnostic
    pub diagnostics: usize,

    /// Corpus length in characters (including any truncation marker)
    pub corpus_chars: usize,

    /// Whether the corpus hit the character ceiling
    pub truncated: bool,

    /// Prompt length in characters
    pub prompt_chars: usize,

    /// Whether the response contained a mermaid block
    pub found_diagram: bool,

    /// Model that answered, if the service was called
    pub model: Option<String>,

    /// Token usage, if the service was called
    pub usage: Option<Usage>,

    /// Files written by a full run
    pub written: Option<WrittenFiles>,

    /// Prompt file written by a dry run
    pub prompt_file: Option<PathBuf>,

    /// Total execution time
    pub duration: Duration,

    /// Time spent scanning and extracting
    pub scan_duration: Duration,

    /// Time spent waiting for the service
    pub generate_duration: Duration,

    /// Time spent writing
    pub write_duration: Duration,
}

impl RunStats {
    /// Prints a human-readable summary to stdout.
    pub fn print_summary(&self) {
        if let Some(prompt_file) = &self.prompt_file {
            println!("Dry run, no request sent. Saved:");
            println!("- prompt: {}", prompt_file.display());
        }

        if let Some(files) = &self.written {
            println!("Saved:");
            println!("- diagram: {}", files.diagram.display());
            println!("- explanation: {}", files.explanation.display());
            println!("- full response JSON: {}", files.full_response.display());
        }

        println!(
            "Documents: {} ({} unreadable), corpus {} chars{}, prompt {} chars",
            self.documents,
            self.diagnostics,
            self.corpus_chars,
            if self.truncated { " (truncated)" } else { "" },
            self.prompt_chars
        );

        if let (Some(model), Some(usage)) = (&self.model, &self.usage) {
            println!(
                "Model: {} ({} input / {} output tokens)",
                model, usage.input_tokens, usage.output_tokens
            );
        }

        if self.written.is_some() && !self.found_diagram {
            println!("Warning: no mermaid block in the response, diagram holds a placeholder");
        }

        println!(
            "Time: {:.2}s (scan {:.2}s, generate {:.2}s, write {:.2}s)",
            self.duration.as_secs_f64(),
            self.scan_duration.as_secs_f64(),
            self.generate_duration.as_secs_f64(),
            self.write_duration.as_secs_f64()
        );
    }
}

/// Orchestrates scan → prompt → generate → split → write.
pub struct Pipeline {
    config: Config,
    scanner: Scanner,
    prompt_builder: PromptBuilder,
    writer: Writer,
}

impl Pipeline {
    /// Creates a new pipeline with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration validation fails
    /// - The prompt template fails to parse
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let scanner = Scanner::new(&config);
        let prompt_builder = PromptBuilder::new()?;
        let writer = Writer::new(&config);

        Ok(Self {
            config,
            scanner,
            prompt_builder,
            writer,
        })
    }

    /// Executes the complete pipeline against a generation client.
    ///
    /// # Process
    ///
    /// 1. **Scan**: reads supported documents into the corpus
    /// 2. **Prompt**: renders the instruction template around the corpus
    /// 3. **Generate**: one call to the generation service
    /// 4. **Split**: separates the mermaid block from the prose
    /// 5. **Write**: persists diagram, explanation and raw response
    ///
    /// # Errors
    ///
    /// Returns an error if listing the docs directory, rendering, the
    /// generation call, or any write fails. Extraction problems are not errors.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use archgen::{AnthropicClient, Config, Pipeline};
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let config = Config::builder()
    ///     .docs_dir("./discovery-docs")
    ///     .build()?;
    ///
    /// let client = AnthropicClient::from_config(&config)?;
    /// let stats = Pipeline::new(config)?.run(&client)?;
    /// stats.print_summary();
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip(self, client), fields(docs_dir = %self.config.docs_dir.display()))]
    pub fn run<C>(self, client: &C) -> Result<RunStats>
    where
        C: GenerationClient + ?Sized,
    {
        let start_time = Instant::now();
        info!("Starting run");

        let scan_start = Instant::now();
        let corpus = self.scanner.scan()?;
        let scan_duration = scan_start.elapsed();
        info!(
            "Collected {} documents ({} chars)",
            corpus.document_count(),
            corpus.char_count()
        );

        let prompt = self.prompt_builder.build(&corpus)?;

        let generate_start = Instant::now();
        let request = GenerationRequest {
            prompt: prompt.as_str(),
            system: SYSTEM_PROMPT,
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };
        let result = client.generate(&request)?;
        let generate_duration = generate_start.elapsed();
        info!(
            "Received {} chars from {} in {:.2}s",
            result.text.len(),
            result.model,
            generate_duration.as_secs_f64()
        );

        let split = split_response(&result.text);

        let write_start = Instant::now();
        let written = self.writer.write(&split, &result)?;
        let write_duration = write_start.elapsed();

        Ok(RunStats {
            documents: corpus.document_count(),
            diagnostics: corpus.diagnostic_count(),
            corpus_chars: corpus.char_count(),
            truncated: corpus.is_truncated(),
            prompt_chars: prompt.as_str().chars().count(),
            found_diagram: split.found_diagram,
            model: Some(result.model),
            usage: Some(result.usage),
            written: Some(written),
            prompt_file: None,
            duration: start_time.elapsed(),
            scan_duration,
            generate_duration,
            write_duration,
        })
    }

    /// Builds the prompt and writes it to the output directory without
    /// calling the generation service.
    ///
    /// # Errors
    ///
    /// Returns an error if scanning, rendering or writing fails.
    #[instrument(skip(self), fields(docs_dir = %self.config.docs_dir.display()))]
    pub fn dry_run(self) -> Result<RunStats> {
        let start_time = Instant::now();
        warn!("Dry run: the generation service will not be called");

        let scan_start = Instant::now();
        let corpus = self.scanner.scan()?;
        let scan_duration = scan_start.elapsed();

        let prompt = self.prompt_builder.build(&corpus)?;

        let write_start = Instant::now();
        let prompt_file = self.writer.write_prompt(&prompt)?;
        let write_duration = write_start.elapsed();

        Ok(RunStats {
            documents: corpus.document_count(),
            diagnostics: corpus.diagnostic_count(),
            corpus_chars: corpus.char_count(),
            truncated: corpus.is_truncated(),
            prompt_chars: prompt.as_str().chars().count(),
            found_diagram: false,
            model: None,
            usage: None,
            written: None,
            prompt_file: Some(prompt_file),
            duration: start_time.elapsed(),
            scan_duration,
            generate_duration: Duration::ZERO,
            write_duration,
        })
    }
}
