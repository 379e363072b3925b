//! Prompts sent to the vision-language model.
//!
//! Callers can override the default via `VLM_PROMPT`; the constant here is
//! used when the setting is unset, blank, or the literal `"default"`.

use crate::config::DEFAULT_PROMPT_SENTINEL;

/// Default prompt for describing a picture found in a document.
pub const DEFAULT_VLM_PROMPT: &str = r#"
Analyze the provided image and extract all relevant information.
If the image contains text, transcribe it accurately.
If it's a diagram, chart, or any visual representation, describe its key elements, labels, and the relationships or trends it conveys.
Focus on factual details and avoid subjective interpretations.
Present the extracted information in a structured markdown format, prioritizing clarity and completeness.
"#;

/// Resolve the prompt configured for the process.
pub fn effective_prompt(configured: &str) -> &str {
    let trimmed = configured.trim();
    if trimmed.is_empty() || trimmed == DEFAULT_PROMPT_SENTINEL {
        DEFAULT_VLM_PROMPT
    } else {
        configured
    }
}
