//! `svn annotate --xml` output, matched field by field.
//!
//! Every `<entry>` must carry a line number, a commit revision, an author and a
//! date. Entries lacking any of them (uncommitted local modifications, for one)
//! are skipped rather than rejected, so callers must not assume that record
//! `i` describes line `i + 1`.

use super::record::{BlameRecord, BlameTime};
use crate::text::unescape_html;
use regex::Regex;
use std::sync::OnceLock;

struct EntryPatterns {
    entry_start: Regex,
    line_number: Regex,
    revision: Regex,
    author: Regex,
    date: Regex,
}

static ENTRY_PATTERNS: OnceLock<EntryPatterns> = OnceLock::new();

fn patterns() -> &'static EntryPatterns {
    ENTRY_PATTERNS.get_or_init(|| EntryPatterns {
        entry_start: Regex::new(r"<entry\s").expect("Failed to compile entry regex"),
        line_number: Regex::new(r#"line-number="(\d+)""#)
            .expect("Failed to compile line-number regex"),
        revision: Regex::new(r#"revision="(\d+)""#).expect("Failed to compile revision regex"),
        author: Regex::new(r"<author>(.*)</author>").expect("Failed to compile author regex"),
        date: Regex::new(r"<date>(.*)</date>").expect("Failed to compile date regex"),
    })
}

/// Parse annotate entries for the file at `path`, in document order.
pub fn parse_entries(text: &str, path: &str) -> Vec<BlameRecord> {
    text.split("</entry>")
        .filter_map(|fragment| parse_entry(fragment, path))
        .collect()
}

fn parse_entry(fragment: &str, path: &str) -> Option<BlameRecord> {
    let p = patterns();
    let start = p.entry_start.find(fragment)?;
    let entry = &fragment[start.end()..];

    let line_number = capture(&p.line_number, entry)?.parse().ok()?;
    let Some(revision) = capture(&p.revision, entry) else {
        log::debug!("skipping annotate entry for line {line_number}: no revision");
        return None;
    };
    let Some(author) = capture(&p.author, entry) else {
        log::debug!("skipping annotate entry for line {line_number}: no author");
        return None;
    };
    let Some(date) = capture(&p.date, entry) else {
        log::debug!("skipping annotate entry for line {line_number}: no date");
        return None;
    };

    Some(BlameRecord {
        line_number,
        revision: revision.to_string(),
        original_line_number: line_number,
        author: unescape_html(author),
        when: BlameTime::Date(date.to_string()),
        source_path: path.to_string(),
        content: None,
    })
}

fn capture<'a>(re: &Regex, text: &'a str) -> Option<&'a str> {
    re.captures(text)?.get(1).map(|m| m.as_str())
}
