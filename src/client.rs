//! Generation client for the Anthropic Messages API.
//!
//! One blocking request per run. Failures are surfaced as errors and never
//! retried.

use crate::{
    config::Config,
    error::{Error, Result},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::{debug, info};

/// Environment variable holding the API credential.
pub const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MESSAGES_PATH: &str = "/v1/messages";

/// Everything needed for one generation call.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    /// User prompt
    pub prompt: &'a str,
    /// System prompt
    pub system: &'a str,
    /// Model identifier
    pub model: &'a str,
    /// Maximum output tokens
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl GenerationRequest<'_> {
    /// Checks the request before it is sent.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an empty prompt or model, or a zero
    /// token budget.
    pub fn validate(&self) -> Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(Error::config("prompt must not be empty"));
        }
        if self.model.trim().is_empty() {
            return Err(Error::config("model identifier must not be empty"));
        }
        if self.max_tokens == 0 {
            return Err(Error::config("max_tokens must be greater than 0"));
        }
        Ok(())
    }
}

/// Token usage reported by the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Prompt tokens
    #[serde(default)]
    pub input_tokens: u64,
    /// Completion tokens
    #[serde(default)]
    pub output_tokens: u64,
}

/// The reply from the generation service.
///
/// The raw JSON is kept untouched for the full-response dump; only the text
/// blocks, model and usage are interpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    /// Raw response body
    pub raw: Value,
    /// Concatenation of all text content blocks
    pub text: String,
    /// Model that produced the reply
    pub model: String,
    /// Token usage
    pub usage: Usage,
}

#[derive(Deserialize)]
struct MessageResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

impl GenerationResult {
    /// Interprets a raw Messages API response.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the body is not a message object.
    pub fn from_raw(raw: Value) -> Result<Self> {
        let message: MessageResponse = serde_json::from_value(raw.clone())?;

        let text = message
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect::<String>();

        Ok(Self {
            raw,
            text,
            model: message.model,
            usage: message.usage,
        })
    }
}

/// A service that turns a prompt into a [`GenerationResult`].
pub trait GenerationClient {
    /// Performs one synchronous generation call.
    ///
    /// # Errors
    ///
    /// Returns an error on any transport, authentication or service failure.
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<GenerationResult>;
}

/// API credential, loaded once at startup.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
}

impl Credentials {
    /// Reads the credential from [`API_KEY_VAR`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCredential`] if the variable is unset or blank.
    pub fn from_env() -> Result<Self> {
        Self::from_value(std::env::var(API_KEY_VAR).ok())
    }

    /// Wraps an already-read credential value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCredential`] if the value is absent or blank.
    pub fn from_value(value: Option<String>) -> Result<Self> {
        match value {
            Some(key) if !key.trim().is_empty() => Ok(Self {
                api_key: key.trim().to_string(),
            }),
            _ => Err(Error::missing_credential(API_KEY_VAR)),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    message: String,
}

/// Blocking client for the Anthropic Messages API.
pub struct AnthropicClient {
    agent: ureq::Agent,
    endpoint: String,
    credentials: Credentials,
}

impl AnthropicClient {
    /// Creates a client for the given API base URL.
    #[must_use]
    pub fn new(api_url: &str, credentials: Credentials) -> Self {
        // non-2xx bodies carry the error message, so read them ourselves
        let agent_config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build();

        Self {
            agent: ureq::Agent::new_with_config(agent_config),
            endpoint: format!("{}{MESSAGES_PATH}", api_url.trim_end_matches('/')),
            credentials,
        }
    }

    /// Creates a client from configuration and the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCredential`] if no API key is set.
    pub fn from_config(config: &Config) -> Result<Self> {
        let credentials = Credentials::from_env()?;
        Ok(Self::new(&config.api_url, credentials))
    }

    /// The full URL requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl GenerationClient for AnthropicClient {
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<GenerationResult> {
        request.validate()?;

        let body = MessagesRequest {
            model: request.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: request.system,
            messages: [Message {
                role: "user",
                content: request.prompt,
            }],
        };

        info!("Calling {} (model {})", self.endpoint, request.model);

        let mut response = self
            .agent
            .post(self.endpoint.as_str())
            .header("x-api-key", self.credentials.api_key.as_str())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .send_json(&body)?;

        let status = response.status();
        let text = response.body_mut().read_to_string()?;
        debug!("Response status {}, {} bytes", status, text.len());

        if !status.is_success() {
            return Err(Error::api(status.as_u16(), api_error_message(&text)));
        }

        let raw: Value = serde_json::from_str(&text)?;
        GenerationResult::from_raw(raw)
    }
}

/// Extracts a readable message from an error response body.
fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) if !parsed.error.kind.is_empty() => {
            format!("{}: {}", parsed.error.kind, parsed.error.message)
        }
        Ok(parsed) => parsed.error.message,
        Err(_) if body.trim().is_empty() => "empty response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}
