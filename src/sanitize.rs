//! HTML to plain-text sanitization
//!
//! Stripping every tag from an HTML mail in one go turns it into a
//! single run-on line. The conversion therefore runs in two passes:
//!
//! 1. Parse the markup and re-serialize it keeping only `<br>` and
//!    `<p>` (no attributes, no comments, no `script`/`style` content,
//!    no reformatting). The result is canonical: every `<` left in it
//!    starts one of those two tags, because text is escaped.
//! 2. Put a line break after every `<br>` and two in front of every
//!    paragraph's content, then strip all remaining markup.
//!
//! The text stays HTML-escaped (`&amp;`, `&lt;`, `&nbsp;`), which is
//! what a sanitizer allowing no markup at all emits. No `<` or `>`
//! survives.

use ammonia::Builder;
use std::collections::HashSet;

const LINE_BREAK_TAG: &str = "<br>";
const PARAGRAPH_TAG: &str = "<p>";

/// Elements whose content is dropped along with the element.
const DROPPED_CONTENT: [&str; 2] = ["script", "style"];

/// Convert an HTML document or fragment to line-structured plain text.
#[must_use]
pub fn html_to_text(html: &str) -> String {
    let structure = keep_line_structure(html);
    let marked = mark_line_breaks(&structure);
    strip_markup(&marked)
}

/// Pass 1: canonical serialization keeping only `<br>` and `<p>`.
fn keep_line_structure(html: &str) -> String {
    Builder::empty()
        .tags(HashSet::from(["br", "p"]))
        .clean_content_tags(HashSet::from(DROPPED_CONTENT))
        .clean(html)
        .to_string()
}

/// Insert one newline after each line break and two before each
/// paragraph's content. Only valid on [`keep_line_structure`] output.
fn mark_line_breaks(structure: &str) -> String {
    structure
        .replace(LINE_BREAK_TAG, "<br>\n")
        .replace(PARAGRAPH_TAG, "<p>\n\n")
}

/// Pass 2: drop every tag and attribute.
fn strip_markup(html: &str) -> String {
    Builder::empty()
        .clean_content_tags(HashSet::from(DROPPED_CONTENT))
        .clean(html)
        .to_string()
}
