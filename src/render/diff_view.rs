use super::anchor::{file_line_url, AnchorKey};
use crate::scan::{scan, DiffEvent};
use crate::text::{escape_html as h, expand_tab};
use std::borrow::Cow;

/// The two revisions a diff goes between, and how its lines are anchored.
#[derive(Debug, Clone, Copy)]
pub struct DiffSides<'a> {
    pub old_revision: &'a str,
    pub new_revision: &'a str,
    /// Also emit `(revision, content)` anchors, for repositories whose file
    /// view links by content.
    pub content_anchors: bool,
    /// Drop git's `a/` and `b/` prefixes from header paths.
    pub strip_prefixes: bool,
    pub tab_width: usize,
}

/// File paths announced by the most recent `---`/`+++` headers.
#[derive(Debug, Clone)]
pub struct DiffState<'a> {
    old_path: Cow<'a, str>,
    new_path: Cow<'a, str>,
}

impl Default for DiffState<'_> {
    fn default() -> Self {
        DiffState {
            old_path: Cow::Borrowed("?"),
            new_path: Cow::Borrowed("?"),
        }
    }
}

/// Render one diff event.
pub fn render_diff_line<'a>(
    event: &DiffEvent<'a>,
    sides: &DiffSides<'_>,
    state: DiffState<'a>,
) -> (String, DiffState<'a>) {
    let mut state = state;
    let mut out = String::new();

    match event {
        DiffEvent::FileHeaderOld { path, .. } => {
            state.old_path = strip_side_prefix(path, "a/", sides.strip_prefixes);
        }
        DiffEvent::FileHeaderNew { path, .. } => {
            state.new_path = strip_side_prefix(path, "b/", sides.strip_prefixes);
        }
        _ => {}
    }

    match *event {
        DiffEvent::Removed {
            content, old_line, ..
        } => {
            let content = expand_tab(content, sides.tab_width);
            push_anchors(&mut out, sides.old_revision, &state.old_path, old_line, &content, sides);
            push_link(&mut out, sides.old_revision, &state.old_path, old_line, " -");
            out.push_str(&h(&content));
        }
        DiffEvent::Added {
            content, new_line, ..
        } => {
            let content = expand_tab(content, sides.tab_width);
            push_anchors(&mut out, sides.new_revision, &state.new_path, new_line, &content, sides);
            push_link(&mut out, sides.new_revision, &state.new_path, new_line, " +");
            out.push_str(&h(&content));
        }
        DiffEvent::Common {
            content,
            old_line,
            new_line,
            ..
        } => {
            let content = expand_tab(content, sides.tab_width);
            push_line_anchor(&mut out, sides.old_revision, &state.old_path, old_line);
            push_line_anchor(&mut out, sides.new_revision, &state.new_path, new_line);
            if sides.content_anchors {
                push_content_anchor(&mut out, sides.old_revision, &content);
                push_content_anchor(&mut out, sides.new_revision, &content);
            }
            push_link(&mut out, sides.old_revision, &state.old_path, old_line, " ");
            push_link(&mut out, sides.new_revision, &state.new_path, new_line, " ");
            out.push_str(&h(&content));
        }
        _ => {
            out.push(' ');
            out.push_str(&h(&expand_tab(event.raw_line(), sides.tab_width)));
        }
    }
    out.push('\n');
    (out, state)
}

/// Render a whole diff as one `<pre>` block.
pub fn render_diff(text: &str, sides: &DiffSides<'_>) -> String {
    let mut state = DiffState::default();
    let mut out = String::from("<pre>");
    for event in scan(text) {
        let (line, next) = render_diff_line(&event, sides, state);
        out.push_str(&line);
        state = next;
    }
    out.push_str("</pre>");
    out
}

fn strip_side_prefix<'a>(path: &Cow<'a, str>, prefix: &str, strip: bool) -> Cow<'a, str> {
    match path {
        Cow::Borrowed(p) if strip => {
            let p: &'a str = *p;
            Cow::Borrowed(p.strip_prefix(prefix).unwrap_or(p))
        }
        Cow::Owned(p) if strip => Cow::Owned(p.strip_prefix(prefix).unwrap_or(p).to_string()),
        _ => path.clone(),
    }
}

fn push_anchors(
    out: &mut String,
    revision: &str,
    path: &str,
    line: usize,
    content: &str,
    sides: &DiffSides<'_>,
) {
    push_line_anchor(out, revision, path, line);
    if sides.content_anchors {
        push_content_anchor(out, revision, content);
    }
}

fn push_line_anchor(out: &mut String, revision: &str, path: &str, line: usize) {
    let key = AnchorKey::Line {
        revision,
        path,
        line,
    };
    out.push_str(&format!("<a name=\"{}\"></a>", h(&key.fragment())));
}

fn push_content_anchor(out: &mut String, revision: &str, content: &str) {
    let key = AnchorKey::Content { revision, content };
    out.push_str(&format!("<a name=\"{}\"></a>", h(&key.fragment())));
}

fn push_link(out: &mut String, revision: &str, path: &str, line: usize, label: &str) {
    out.push_str(&format!(
        "<a href=\"{}\">{label}</a>",
        h(&file_line_url(revision, path, line))
    ));
}
