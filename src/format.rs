//! Output renderers over a canonical [`ExtractionResult`].
//!
//! All renderers are pure. They never re-run extraction and never touch the
//! filesystem.

use crate::output::{ExtractionResult, TableGrid};
use once_cell::sync::Lazy;
use pulldown_cmark::{html, Options, Parser};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

/// Output shapes offered by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Markdown,
    Json,
    Html,
    Text,
}

impl OutputFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Markdown => "text/markdown; charset=utf-8",
            OutputFormat::Json => "application/json",
            OutputFormat::Html => "text/html; charset=utf-8",
            OutputFormat::Text => "text/plain; charset=utf-8",
        }
    }

    /// Render `result` in this format.
    pub fn render(self, result: &ExtractionResult) -> String {
        match self {
            OutputFormat::Markdown => render_markdown(result),
            OutputFormat::Json => {
                serde_json::to_string(&JsonDocument::from(result)).unwrap_or_else(|_| "{}".into())
            }
            OutputFormat::Html => render_html(result),
            OutputFormat::Text => render_text(result),
        }
    }
}

// ── Markdown ─────────────────────────────────────────────────────────────────

pub fn render_markdown(result: &ExtractionResult) -> String {
    result.markdown.clone()
}

// ── JSON ─────────────────────────────────────────────────────────────────────

/// `{content: {markdown, tables}, metadata}` response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonDocument {
    pub content: JsonContent,
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonContent {
    pub markdown: String,
    pub tables: Vec<TableGrid>,
}

impl From<&ExtractionResult> for JsonDocument {
    fn from(result: &ExtractionResult) -> Self {
        Self {
            content: JsonContent {
                markdown: result.markdown.clone(),
                tables: result.tables.clone(),
            },
            metadata: result.metadata.clone(),
        }
    }
}

pub fn render_json(result: &ExtractionResult) -> JsonDocument {
    JsonDocument::from(result)
}

// ── HTML ─────────────────────────────────────────────────────────────────────

const HTML_STYLE: &str = "        body { font-family: Arial, sans-serif; max-width: 800px; margin: 40px auto; padding: 20px; }
        table { border-collapse: collapse; width: 100%; margin: 20px 0; }
        th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
        th { background-color: #f2f2f2; }";

/// Markdown → HTML5 document with tables and a small stylesheet. The title
/// is the source filename, or `Document`.
pub fn render_html(result: &ExtractionResult) -> String {
    let mut body = String::with_capacity(result.markdown.len() * 2);
    html::push_html(
        &mut body,
        Parser::new_ext(&result.markdown, Options::ENABLE_TABLES),
    );
    let title = escape_html(result.filename().unwrap_or("Document"));

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n    <meta charset=\"UTF-8\">\n    <title>{title}</title>\n    <style>\n{HTML_STYLE}\n    </style>\n</head>\n<body>\n{body}\n</body>\n</html>"
    )
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

// ── Plain text ───────────────────────────────────────────────────────────────

static RE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#{1,6}\s+").unwrap());
static RE_EMPHASIS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[*_]{1,2}([^*_]+)[*_]{1,2}").unwrap());
static RE_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]+)\]\([^\)]+\)").unwrap());

/// Strip heading markers, bold/italic markers and link syntax. Everything
/// else, tables included, passes through.
pub fn render_text(result: &ExtractionResult) -> String {
    let text = RE_HEADING.replace_all(&result.markdown, "");
    let text = RE_EMPHASIS.replace_all(&text, "$1");
    RE_LINK.replace_all(&text, "$1").into_owned()
}
