//! In-memory document produced by [`super::StandardEngine`].
//!
//! A document is a list of pages; a page is a list of blocks. Markdown export
//! renders each page on its own, normalises it, and joins the pages with the
//! caller's page-break placeholder.

use super::{tables, ConvertedDocument, DetectedTable, RawPageCount};
use once_cell::sync::Lazy;
use regex::Regex;

/// Marker emitted in place of every picture.
pub const IMAGE_PLACEHOLDER: &str = "<!-- image -->";

/// One content block on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Text(String),
    Table(DetectedTable),
    /// An embedded picture, with the VLM description if one was produced.
    Picture { description: Option<String> },
}

impl Block {
    fn to_markdown(&self) -> String {
        match self {
            Block::Text(text) => text.trim().to_string(),
            Block::Table(table) => tables::to_markdown(table),
            Block::Picture { description: None } => IMAGE_PLACEHOLDER.to_string(),
            Block::Picture {
                description: Some(d),
            } => format!("{IMAGE_PLACEHOLDER}\n{}", d.trim()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub blocks: Vec<Block>,
}

impl Page {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    fn to_markdown(&self) -> String {
        let body = self
            .blocks
            .iter()
            .map(Block::to_markdown)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
        normalise(&body)
    }
}

/// A fully converted document.
#[derive(Debug, Clone, Default)]
pub struct EngineDocument {
    pages: Vec<Page>,
    tables: Vec<DetectedTable>,
}

impl EngineDocument {
    pub fn new(pages: Vec<Page>) -> Self {
        let tables = pages
            .iter()
            .flat_map(|p| p.blocks.iter())
            .filter_map(|b| match b {
                Block::Table(t) => Some(t.clone()),
                _ => None,
            })
            .collect();
        Self { pages, tables }
    }
}

impl ConvertedDocument for EngineDocument {
    fn tables(&self) -> &[DetectedTable] {
        &self.tables
    }

    fn export_markdown(&self, page_break_placeholder: &str) -> String {
        self.pages
            .iter()
            .map(Page::to_markdown)
            .collect::<Vec<_>>()
            .join(page_break_placeholder)
    }

    fn page_count(&self) -> RawPageCount {
        RawPageCount::from(self.pages.len())
    }
}

// ── Normalisation ────────────────────────────────────────────────────────────

static RE_BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn normalise(input: &str) -> String {
    let s = input.replace("\r\n", "\n").replace('\r', "\n");
    let s = s
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    let s = RE_BLANK_RUNS.replace_all(&s, "\n\n");
    remove_invisible_chars(&s).trim().to_string()
}

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}
