use crate::error::{Error, Result};
use std::path::PathBuf;

/// Default model identifier for the Messages API.
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20240620";
/// Default maximum number of output tokens requested from the model.
pub const DEFAULT_MAX_TOKENS: u32 = 4_000;
/// Default ceiling on the combined corpus, in characters.
pub const DEFAULT_MAX_CORPUS_CHARS: usize = 400_000;
/// Default Messages API base URL.
pub const DEFAULT_API_URL: &str = "https://api.anthropic.com";

const DEFAULT_DOCS_DIR: &str = "discovery-docs";
const DEFAULT_OUTPUT_DIR: &str = "outputs";
const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Configuration for an archgen run.
///
/// Use [`Config::builder()`] to construct a new configuration.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    /// Directory holding the discovery documents (scanned non-recursively)
    pub docs_dir: PathBuf,

    /// Output directory for the diagram, explanation and raw response
    pub output_dir: PathBuf,

    /// Model identifier sent with the request
    pub model: String,

    /// Maximum output tokens requested from the model
    pub max_tokens: u32,

    /// Ceiling on the combined corpus, in characters
    pub max_corpus_chars: usize,

    /// Sampling temperature
    pub temperature: f32,

    /// Base URL of the Messages API
    pub api_url: String,

    /// Dry run mode (write the prompt only, no network call)
    pub dry_run: bool,
}

impl Config {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use archgen::Config;
    ///
    /// let config = Config::builder()
    ///     .docs_dir("./discovery-docs")
    ///     .max_tokens(2_000)
    ///     .build()
    ///     .expect("valid configuration");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// A missing docs directory is accepted (it yields an empty corpus), but a
    /// docs path that exists and is not a directory is rejected.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The docs path is not a directory
    /// - The model identifier is blank or contains whitespace
    /// - Token or character budgets are zero
    /// - Temperature is outside `0.0..=1.0`
    pub fn validate(&self) -> Result<()> {
        if self.docs_dir.exists() && !self.docs_dir.is_dir() {
            return Err(Error::config(format!(
                "Docs path is not a directory: {}",
                self.docs_dir.display()
            )));
        }

        if self.model.trim().is_empty() {
            return Err(Error::config("model identifier must not be empty"));
        }

        if self.model.chars().any(char::is_whitespace) {
            return Err(Error::config(format!(
                "model identifier must not contain whitespace: '{}'",
                self.model
            )));
        }

        if self.max_tokens == 0 {
            return Err(Error::config("max_tokens must be greater than 0"));
        }

        if self.max_corpus_chars == 0 {
            return Err(Error::config("max_corpus_chars must be greater than 0"));
        }

        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(Error::config(format!(
                "temperature ({}) must be between 0.0 and 1.0",
                self.temperature
            )));
        }

        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(Error::config(format!(
                "api_url must be an http(s) URL: '{}'",
                self.api_url
            )));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from(DEFAULT_DOCS_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            max_corpus_chars: DEFAULT_MAX_CORPUS_CHARS,
            temperature: DEFAULT_TEMPERATURE,
            api_url: DEFAULT_API_URL.to_string(),
            dry_run: false,
        }
    }
}

/// Builder for creating a [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    docs_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    model: Option<String>,
    max_tokens: Option<u32>,
    max_corpus_chars: Option<usize>,
    temperature: Option<f32>,
    api_url: Option<String>,
    dry_run: bool,
}

impl ConfigBuilder {
    /// Sets the directory holding the discovery documents.
    #[must_use]
    pub fn docs_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.docs_dir = Some(path.into());
        self
    }

    /// Sets the output directory for generated files.
    #[must_use]
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Sets the model identifier.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the maximum output tokens.
    #[must_use]
    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    /// Sets the corpus ceiling in characters.
    #[must_use]
    pub fn max_corpus_chars(mut self, chars: usize) -> Self {
        self.max_corpus_chars = Some(chars);
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the Messages API base URL.
    #[must_use]
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Enables dry run mode (prompt is written, service is not called).
    #[must_use]
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn build(self) -> Result<Config> {
        let config = Config {
            docs_dir: self
                .docs_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DOCS_DIR)),
            output_dir: self
                .output_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            max_corpus_chars: self.max_corpus_chars.unwrap_or(DEFAULT_MAX_CORPUS_CHARS),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            api_url: self
                .api_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            dry_run: self.dry_run,
        };

        config.validate()?;
        Ok(config)
    }
}
