use crate::route::Route;
use crate::text::form_encode;

/// Names one rendered line so that every page linking to it agrees on the
/// fragment.
///
/// `Line` is used wherever the line number of `path` at `revision` is known.
/// `Content` covers blame formats that report no original line number: the
/// line is then found by its text within the revision's diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorKey<'a> {
    Line {
        revision: &'a str,
        path: &'a str,
        line: usize,
    },
    Content {
        revision: &'a str,
        content: &'a str,
    },
}

impl AnchorKey<'_> {
    /// URL fragment (without `#`), form-url-encoded. HTML-escape before
    /// embedding it in markup.
    pub fn fragment(&self) -> String {
        match self {
            AnchorKey::Line {
                revision,
                path,
                line,
            } => form_encode(&format!("{revision}/{path}:{line}")),
            AnchorKey::Content { revision, content } => {
                form_encode(&format!("{revision}:{content}"))
            }
        }
    }
}

/// Link to `route` scrolled to `anchor`.
pub fn anchored(route: &Route, anchor: &AnchorKey<'_>) -> String {
    format!("{}#{}", route.to_path(), anchor.fragment())
}

/// Link to line `line` of the file view of `path` at `revision`.
pub fn file_line_url(revision: &str, path: &str, line: usize) -> String {
    let route = Route::File {
        revision: revision.to_string(),
        path: path.to_string(),
    };
    format!("{}#{line}", route.to_path())
}
