use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

/// Written as the diagram when the response has no mermaid block.
pub const DIAGRAM_PLACEHOLDER: &str = "%% No mermaid block found\n";

// First ```mermaid fence, tag matched case-insensitively, body non-greedy.
static MERMAID_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)```[ \t]*mermaid[ \t]*\r?\n(.*?)\r?\n[ \t]*```")
        .expect("mermaid fence pattern is valid")
});

/// A response separated into its diagram and its prose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOutput {
    /// Diagram source, or [`DIAGRAM_PLACEHOLDER`]
    pub diagram: String,

    /// Everything else, trimmed
    pub explanation: String,

    /// Whether a mermaid block was found
    pub found_diagram: bool,
}

/// Splits a response into the first mermaid block and the remaining text.
///
/// Only the first block is extracted; any later blocks stay in the
/// explanation. The diagram is never empty.
#[must_use]
pub fn split_response(text: &str) -> SplitOutput {
    let Some(caps) = MERMAID_BLOCK.captures(text) else {
        warn!("No mermaid block found in response");
        return without_diagram(text);
    };
    let (Some(block), Some(body)) = (caps.get(0), caps.get(1)) else {
        return without_diagram(text);
    };

    let diagram = body.as_str().trim();
    let explanation = format!("{}{}", &text[..block.start()], &text[block.end()..]);

    debug!(
        "Split response: {} diagram chars, {} explanation chars",
        diagram.len(),
        explanation.trim().len()
    );

    SplitOutput {
        diagram: if diagram.is_empty() {
            DIAGRAM_PLACEHOLDER.to_string()
        } else {
            diagram.to_string()
        },
        explanation: explanation.trim().to_string(),
        found_diagram: !diagram.is_empty(),
    }
}

fn without_diagram(text: &str) -> SplitOutput {
    SplitOutput {
        diagram: DIAGRAM_PLACEHOLDER.to_string(),
        explanation: text.trim().to_string(),
        found_diagram: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_block_is_extracted() {
        let text = "```mermaid\ngraph TD\n  A-->B\n```\n\n## Explanation\nTwo services.";
        let split = split_response(text);

        assert!(split.found_diagram);
        assert_eq!(split.diagram, "graph TD\n  A-->B");
        assert_eq!(split.explanation, "## Explanation\nTwo services.");
        assert!(!split.explanation.contains("```"));
        assert!(!split.explanation.contains("A-->B"));
    }

    #[test]
    fn test_tag_is_case_insensitive() {
        let split = split_response("Intro\n``` Mermaid\nflowchart LR\nX-->Y\n```\nOutro");

        assert_eq!(split.diagram, "flowchart LR\nX-->Y");
        assert_eq!(split.explanation, "Intro\n\nOutro");
    }

    #[test]
    fn test_missing_block_gives_placeholder() {
        let text = "## Explanation\nNo diagram here.\n```python\nprint(1)\n```";
        let first = split_response(text);
        let second = split_response(text);

        assert!(!first.found_diagram);
        assert_eq!(first.diagram, DIAGRAM_PLACEHOLDER);
        assert_eq!(first.diagram.as_bytes(), second.diagram.as_bytes());
        assert_eq!(first.explanation, text.trim());
    }

    #[test]
    fn test_only_first_block_is_taken() {
        let text = "```mermaid\ngraph TD\nA-->B\n```\nthen\n```mermaid\ngraph TD\nC-->D\n```";
        let split = split_response(text);

        assert_eq!(split.diagram, "graph TD\nA-->B");
        assert!(split.explanation.contains("C-->D"));
    }

    #[test]
    fn test_empty_block_still_gives_placeholder() {
        let split = split_response("```mermaid\n\n```\nprose");

        assert!(!split.found_diagram);
        assert_eq!(split.diagram, DIAGRAM_PLACEHOLDER);
        assert_eq!(split.explanation, "prose");
    }

    #[test]
    fn test_crlf_fences() {
        let split = split_response("```mermaid\r\ngraph TD\r\nA-->B\r\n```\r\nDone");

        assert_eq!(split.diagram, "graph TD\r\nA-->B");
        assert_eq!(split.explanation, "Done");
    }
}
