use crate::{
    client::GenerationResult,
    config::Config,
    error::{Error, Result},
    splitter::SplitOutput,
    template::Prompt,
};
use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// File name of the diagram output.
pub const DIAGRAM_FILE: &str = "diagram.mmd";
/// File name of the explanation output.
pub const EXPLANATION_FILE: &str = "explanation.md";
/// File name of the raw response dump.
pub const FULL_RESPONSE_FILE: &str = "full_response.json";
/// File name of the prompt written in dry-run mode.
pub const PROMPT_FILE: &str = "prompt.md";

/// Paths of the files produced by a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFiles {
    /// Diagram source
    pub diagram: PathBuf,
    /// Prose explanation
    pub explanation: PathBuf,
    /// Pretty-printed raw response
    pub full_response: PathBuf,
}

/// Persists run outputs into the output directory.
///
/// Existing files are overwritten in place. Nothing run-specific (timestamps,
/// durations) is written, so identical inputs produce identical files.
pub(crate) struct Writer {
    output_dir: PathBuf,
}

impl Writer {
    /// Creates a new writer from configuration.
    pub(crate) fn new(config: &Config) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
        }
    }

    /// Writes the diagram, explanation and raw response, in that order.
    ///
    /// A failed write aborts; files written before it stay on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Output directory cannot be created
    /// - Any file cannot be written
    pub(crate) fn write(
        &self,
        split: &SplitOutput,
        result: &GenerationResult,
    ) -> Result<WrittenFiles> {
        self.ensure_output_dir()?;

        let files = WrittenFiles {
            diagram: self.output_dir.join(DIAGRAM_FILE),
            explanation: self.output_dir.join(EXPLANATION_FILE),
            full_response: self.output_dir.join(FULL_RESPONSE_FILE),
        };

        write_file(&files.diagram, split.diagram.as_bytes())?;
        write_file(&files.explanation, split.explanation.as_bytes())?;
        write_json(&files.full_response, &result.raw)?;

        info!("Wrote outputs to {}", self.output_dir.display());
        Ok(files)
    }

    /// Writes the assembled prompt (dry-run mode).
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub(crate) fn write_prompt(&self, prompt: &Prompt) -> Result<PathBuf> {
        self.ensure_output_dir()?;

        let path = self.output_dir.join(PROMPT_FILE);
        write_file(&path, prompt.as_str().as_bytes())?;

        info!("Wrote prompt to {}", path.display());
        Ok(path)
    }

    fn ensure_output_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.output_dir).map_err(|e| Error::io(&self.output_dir, e))
    }
}

fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    fs::write(path, content).map_err(|e| Error::io(path, e))?;
    debug!("Wrote {} ({} bytes)", path.display(), content.len());
    Ok(())
}

fn write_json(path: &Path, value: &serde_json::Value) -> Result<()> {
    let file = fs::File::create(path).map_err(|e| Error::io(path, e))?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush().map_err(|e| Error::io(path, e))?;

    debug!("Wrote {}", path.display());
    Ok(())
}
