use super::anchor::{anchored, AnchorKey};
use crate::route::Route;
use crate::scan::BlameRecord;
use crate::text::{chomp, escape_html as h, expand_tab, form_encode};
use std::collections::HashMap;

/// Column widths shared by every row of one page, in characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnWidths {
    pub author: usize,
    pub revision: usize,
}

impl ColumnWidths {
    pub fn measure(records: &[BlameRecord]) -> Self {
        records.iter().fold(ColumnWidths::default(), |w, r| ColumnWidths {
            author: w.author.max(r.author.chars().count()),
            revision: w.revision.max(r.revision.chars().count()),
        })
    }
}

/// Where a blamed line links to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlameDirection {
    /// The commit that last changed the line.
    Forward,
    /// The diffs to the children of the last revision containing the line.
    Reverse,
}

/// The revision of the previous row; a row repeating it renders its
/// revision column blank.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunState<'a> {
    prev_revision: Option<&'a str>,
}

impl<'a> RunState<'a> {
    fn repeats(&self, revision: &str) -> bool {
        self.prev_revision == Some(revision)
    }

    fn after(revision: Option<&'a str>) -> Self {
        RunState {
            prev_revision: revision,
        }
    }
}

// ── Porcelain view ──

/// Render one porcelain-blamed line: date link, author, content.
pub fn render_blame_line<'a>(
    record: &'a BlameRecord,
    widths: ColumnWidths,
    direction: BlameDirection,
    tab_width: usize,
    state: RunState<'a>,
) -> (String, RunState<'a>) {
    let revision = record.revision.clone();
    let target = match direction {
        BlameDirection::Forward => Route::Commit { revision },
        BlameDirection::Reverse => Route::DiffChildren { revision },
    };
    let url = anchored(
        &target,
        &AnchorKey::Line {
            revision: &record.revision,
            path: &record.source_path,
            line: record.original_line_number,
        },
    );

    let date = record.when.date();
    let date = if state.repeats(&record.revision) {
        " ".repeat(date.chars().count())
    } else {
        date
    };
    let author = format!("{:<width$}", record.author, width = widths.author);
    let content = record.content.as_deref().unwrap_or_default();
    let content = expand_tab(chomp(content), tab_width);

    let line = format!(
        "<a name=\"{}\"></a><a href=\"{}\" title=\"{}\">{}</a> {} {}\n",
        record.line_number,
        h(&url),
        h(&record.when.full()),
        h(&date),
        h(&author),
        h(&content),
    );
    (line, RunState::after(Some(&record.revision)))
}

/// Render a whole file from porcelain records.
pub fn render_blame_page(
    records: &[BlameRecord],
    direction: BlameDirection,
    tab_width: usize,
) -> String {
    let widths = ColumnWidths::measure(records);
    let mut state = RunState::default();
    let mut out = String::from("<pre>");
    for record in records {
        let (line, next) = render_blame_line(record, widths, direction, tab_width, state);
        out.push_str(&line);
        state = next;
    }
    out.push_str("</pre>");
    out
}

// ── Annotate view ──

/// Render one line of file content with its annotate record, if any.
///
/// Rows without a record keep their anchors but show blank attribution and
/// no commit link.
pub fn render_annotated_line<'a>(
    line_number: usize,
    content: &str,
    record: Option<&'a BlameRecord>,
    widths: ColumnWidths,
    state: RunState<'a>,
) -> (String, RunState<'a>) {
    let mut line = format!(
        "<a name=\"{line_number}\"></a><a name=\"{}\"></a>",
        h(&form_encode(content))
    );

    let Some(record) = record else {
        line.push_str(&format!(
            "{} {} {}\n",
            " ".repeat(widths.revision),
            " ".repeat(widths.author),
            h(content)
        ));
        return (line, RunState::after(None));
    };

    let url = anchored(
        &Route::Commit {
            revision: record.revision.clone(),
        },
        &AnchorKey::Content {
            revision: &record.revision,
            content,
        },
    );
    let revision = if state.repeats(&record.revision) {
        " ".repeat(widths.revision)
    } else {
        format!("{:>width$}", record.revision, width = widths.revision)
    };
    let author = format!("{:<width$}", record.author, width = widths.author);

    line.push_str(&format!(
        "<a href=\"{}\" title=\"{}\">{}</a> {} {}\n",
        h(&url),
        h(&record.when.full()),
        h(&revision),
        h(&author),
        h(content),
    ));
    (line, RunState::after(Some(&record.revision)))
}

/// Render file `content` against annotate records matched by line number.
pub fn render_annotated_page(content: &str, records: &[BlameRecord], tab_width: usize) -> String {
    let widths = ColumnWidths::measure(records);
    let by_line: HashMap<usize, &BlameRecord> =
        records.iter().map(|r| (r.line_number, r)).collect();

    let mut state = RunState::default();
    let mut out = String::from("<pre>");
    for (i, line) in content.lines().enumerate() {
        let line_number = i + 1;
        let expanded = expand_tab(line, tab_width);
        let (row, next) = render_annotated_line(
            line_number,
            &expanded,
            by_line.get(&line_number).copied(),
            widths,
            state,
        );
        out.push_str(&row);
        state = next;
    }
    out.push_str("</pre>");
    out
}
