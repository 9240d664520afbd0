use crate::{
    corpus::Corpus,
    error::{Error, Result},
};
use serde::Serialize;
use tera::{Context, Tera};

const PROMPT_TEMPLATE: &str = "prompt";

/// System prompt sent alongside every request.
pub const SYSTEM_PROMPT: &str = "Be precise, practical, and production-oriented. \
Infer platforms, services, and patterns strictly from the provided discovery materials. \
Apply industry best practices appropriate to whatever stack the documents imply \
(cloud/on-prem, any provider, any workload). \
When information is missing, state reasonable assumptions explicitly. \
Return a single Mermaid diagram first (in a fenced triple-backtick block), \
then concise sections: Explanation, Assumptions, Constraints.";

#[derive(Serialize)]
struct PromptContext<'a> {
    corpus: Option<&'a str>,
}

/// A fully rendered prompt, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    text: String,
}

impl Prompt {
    /// Returns the prompt text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// Renders the compiled-in instruction template around a corpus.
pub(crate) struct PromptBuilder {
    tera: Tera,
}

impl PromptBuilder {
    /// Creates a new builder with the built-in template registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the template fails to parse.
    pub(crate) fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_template(PROMPT_TEMPLATE, include_str!("../templates/prompt.tera"))
            .map_err(|e| Error::template(PROMPT_TEMPLATE, e))?;

        Ok(Self { tera })
    }

    /// Builds the prompt for a corpus.
    ///
    /// An empty corpus produces the instructions only, with a note that no
    /// documents were supplied.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub(crate) fn build(&self, corpus: &Corpus) -> Result<Prompt> {
        let context = PromptContext {
            corpus: corpus.text(),
        };
        let tera_context = Context::from_serialize(&context)
            .map_err(|e| Error::template(PROMPT_TEMPLATE, e))?;

        let text = self
            .tera
            .render(PROMPT_TEMPLATE, &tera_context)
            .map_err(|e| Error::template(PROMPT_TEMPLATE, e))?;

        Ok(Prompt { text })
    }
}
