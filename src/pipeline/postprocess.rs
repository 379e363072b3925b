//! Post-processing: turn the engine's page-break placeholders into
//! human-readable page headers.
//!
//! The engine is asked to export markdown with [`PAGE_BREAK_PLACEHOLDER`]
//! between pages. That placeholder contains a line whose trimmed content is
//! exactly [`PAGE_BREAK_MARKER`]; every such line becomes `## Page N`.
//!
//! ## Known fragility
//!
//! Matching is by exact trimmed-line equality. A document that itself
//! contains a `## PAGE_BREAK_MARKER` line is indistinguishable from a real
//! page break and will be numbered as one.
//!
//! The rewrite is a no-op on its own output because no `## Page N` header
//! ever equals the marker.

/// Reserved marker line the engine emits between pages.
pub const PAGE_BREAK_MARKER: &str = "## PAGE_BREAK_MARKER";

/// Placeholder handed to the engine's markdown exporter.
pub const PAGE_BREAK_PLACEHOLDER: &str = "\n\n---\n## PAGE_BREAK_MARKER\n\n";

/// Header line for page `n` (1-indexed).
pub fn page_header(n: usize) -> String {
    format!("## Page {n}")
}

/// Replace page-break marker lines with `## Page N` headers.
///
/// When at least one marker is found, `## Page 1` is prepended so every page
/// gets a header. Text without markers is returned unchanged.
pub fn rewrite_page_markers(markdown: &str) -> String {
    let mut page = 1usize;
    let mut lines: Vec<String> = Vec::new();

    for line in markdown.split('\n') {
        if line.trim() == PAGE_BREAK_MARKER {
            page += 1;
            lines.push(page_header(page));
        } else {
            lines.push(line.to_string());
        }
    }

    let body = lines.join("\n");
    if page > 1 {
        format!("{}\n\n{}", page_header(1), body)
    } else {
        body
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_marker_numbers_both_pages() {
        let out = rewrite_page_markers("A\n## PAGE_BREAK_MARKER\nB");
        assert!(out.starts_with("## Page 1"));
        assert!(out.contains("## Page 2"));
        let a = out.find('A').unwrap();
        let b = out.find('B').unwrap();
        assert!(a < b, "A and B keep their order");
        assert!(!out.contains(PAGE_BREAK_MARKER));
    }

    #[test]
    fn placeholder_round_trip() {
        let raw = format!("intro{PAGE_BREAK_PLACEHOLDER}second{PAGE_BREAK_PLACEHOLDER}third");
        let out = rewrite_page_markers(&raw);
        assert_eq!(
            out,
            "## Page 1\n\nintro\n\n---\n## Page 2\n\nsecond\n\n---\n## Page 3\n\nthird"
        );
    }

    #[test]
    fn no_marker_passes_through() {
        let input = "# Title\n\nbody\n";
        assert_eq!(rewrite_page_markers(input), input);
    }

    #[test]
    fn indented_marker_still_matches() {
        let out = rewrite_page_markers("a\n   ## PAGE_BREAK_MARKER  \nb");
        assert!(out.contains("\n## Page 2\n"));
    }

    #[test]
    fn marker_inside_longer_line_is_ignored() {
        let input = "see ## PAGE_BREAK_MARKER here";
        assert_eq!(rewrite_page_markers(input), input);
    }

    #[test]
    fn rewrite_is_idempotent() {
        let once = rewrite_page_markers("A\n## PAGE_BREAK_MARKER\nB");
        assert_eq!(rewrite_page_markers(&once), once);
    }

    #[test]
    fn headers_never_equal_marker() {
        for n in 1..50 {
            assert_ne!(page_header(n).trim(), PAGE_BREAK_MARKER);
        }
    }

    #[test]
    fn literal_marker_in_content_is_taken_as_page_break() {
        // Documents quoting the marker verbatim are misread as page breaks.
        let out = rewrite_page_markers("Our token is:\n## PAGE_BREAK_MARKER");
        assert!(out.starts_with("## Page 1\n\n"));
        assert!(out.ends_with("## Page 2"));
    }
}
