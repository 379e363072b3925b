//! Table-structure recognition over plain text.
//!
//! Two shapes are recognised:
//!
//! * GFM pipe tables (`| a | b |`), with or without a separator row.
//! * Columnar runs in extracted PDF/OCR text: at least two consecutive lines
//!   whose cells are separated by a tab or two or more spaces.
//!
//! In [`TableMode::Accurate`] every row of a candidate must have the same
//! number of cells or the run is left as text. [`TableMode::Fast`] pads short
//! rows instead.

use super::document::Block;
use super::DetectedTable;
use crate::pipeline::TableMode;
use once_cell::sync::Lazy;
use regex::Regex;

static RE_COLUMN_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\t+|\s{2,}").unwrap());

/// Split `text` into text and table blocks.
///
/// `columnar` enables detection of whitespace-aligned columns, which only
/// makes sense for text extracted from a rendered page.
pub fn split_blocks(text: &str, mode: TableMode, columnar: bool) -> Vec<Block> {
    let lines: Vec<&str> = text.lines().collect();
    let mut blocks = Vec::new();
    let mut pending: Vec<&str> = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let run_end = if is_table_row(lines[i]) {
            run_length(&lines[i..], is_table_row)
        } else if columnar {
            run_length(&lines[i..], |l| column_cells(l).len() >= 2)
        } else {
            0
        };

        let table = if run_end >= 2 {
            let run = &lines[i..i + run_end];
            if is_table_row(lines[i]) {
                parse_pipe_table(run, mode)
            } else {
                parse_columnar(run, mode)
            }
        } else {
            None
        };

        match table {
            Some(table) => {
                flush_text(&mut pending, &mut blocks);
                blocks.push(Block::Table(table));
                i += run_end;
            }
            None => {
                pending.push(lines[i]);
                i += 1;
            }
        }
    }
    flush_text(&mut pending, &mut blocks);
    blocks
}

fn run_length(lines: &[&str], pred: impl Fn(&str) -> bool) -> usize {
    lines.iter().take_while(|l| pred(l)).count()
}

fn flush_text(pending: &mut Vec<&str>, blocks: &mut Vec<Block>) {
    if pending.is_empty() {
        return;
    }
    let text = pending.join("\n");
    pending.clear();
    if !text.trim().is_empty() {
        blocks.push(Block::Text(text));
    }
}

fn is_table_row(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with('|') && trimmed.ends_with('|') && trimmed.len() > 2
}

fn is_separator_row(line: &str) -> bool {
    let trimmed = line.trim();
    if !trimmed.starts_with('|') || !trimmed.contains('-') {
        return false;
    }
    trimmed
        .chars()
        .all(|c| c == '|' || c == '-' || c == ':' || c == ' ')
}

fn pipe_cells(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(|c| c.trim().to_string()).collect()
}

fn column_cells(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    RE_COLUMN_GAP
        .split(trimmed)
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

fn parse_pipe_table(run: &[&str], mode: TableMode) -> Option<DetectedTable> {
    let has_header = run.get(1).is_some_and(|l| is_separator_row(l));
    let rows: Vec<Vec<String>> = run
        .iter()
        .enumerate()
        .filter(|(idx, _)| !(has_header && *idx == 1))
        .map(|(_, l)| pipe_cells(l))
        .collect();
    shape(rows, has_header, mode)
}

fn parse_columnar(run: &[&str], mode: TableMode) -> Option<DetectedTable> {
    let rows = run.iter().map(|l| column_cells(l)).collect();
    shape(rows, true, mode)
}

fn shape(mut rows: Vec<Vec<String>>, has_header: bool, mode: TableMode) -> Option<DetectedTable> {
    if rows.is_empty() {
        return None;
    }
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let uniform = rows.iter().all(|r| r.len() == width);
    match mode {
        TableMode::Accurate if !uniform => return None,
        _ => {
            for row in &mut rows {
                row.resize(width, String::new());
            }
        }
    }
    Some(DetectedTable {
        cells: rows,
        has_header,
    })
}

/// Render a table as a GFM pipe table. Headerless tables get an empty
/// header row so the output stays valid GFM.
pub fn to_markdown(table: &DetectedTable) -> String {
    let width = table.cells.iter().map(Vec::len).max().unwrap_or(0);
    if width == 0 {
        return String::new();
    }

    let render_row = |row: &[String]| -> String {
        let cells: Vec<String> = (0..width)
            .map(|i| row.get(i).map(|c| c.replace('|', "\\|")).unwrap_or_default())
            .collect();
        format!("| {} |", cells.join(" | "))
    };

    let (header, body) = match (table.has_header, table.cells.split_first()) {
        (true, Some((first, rest))) => (render_row(first), rest),
        _ => (render_row(&[]), table.cells.as_slice()),
    };
    let separator = format!("|{}", " --- |".repeat(width));

    std::iter::once(header)
        .chain(std::iter::once(separator))
        .chain(body.iter().map(|r| render_row(r)))
        .collect::<Vec<_>>()
        .join("\n")
}
