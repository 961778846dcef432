use crate::error::{Error, Result};
use crate::text::{decode_segment, form_encode};

/// A page request, as addressed by the paths pages link to each other with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `file/<revision>/<path…>`: forward blame of a file
    File { revision: String, path: String },
    /// `file-reverse/<revision>/<path…>`: last revision each line survived in
    FileReverse { revision: String, path: String },
    /// `commit/<revision>`: log message plus diff against each parent
    Commit { revision: String },
    /// `diff-parents/<revision>`
    DiffParents { revision: String },
    /// `diff-children/<revision>`
    DiffChildren { revision: String },
}

impl Route {
    /// Parse a request path. Segments are form-url-decoded; empty segments are
    /// ignored, so leading and doubled slashes do not matter.
    pub fn parse(request_path: &str) -> Result<Route> {
        let segments: Vec<String> = request_path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(decode_segment)
            .collect();

        let unknown = || Error::UnknownRoute(request_path.to_string());
        let (command, rest) = segments.split_first().ok_or_else(unknown)?;
        let (revision, rest) = rest.split_first().ok_or_else(unknown)?;
        let revision = revision.clone();

        match (command.as_str(), rest.is_empty()) {
            ("file", false) => Ok(Route::File {
                revision,
                path: rest.join("/"),
            }),
            ("file-reverse", false) => Ok(Route::FileReverse {
                revision,
                path: rest.join("/"),
            }),
            ("commit", true) => Ok(Route::Commit { revision }),
            ("diff-parents", true) => Ok(Route::DiffParents { revision }),
            ("diff-children", true) => Ok(Route::DiffChildren { revision }),
            _ => Err(unknown()),
        }
    }

    /// The request path for this page, each segment form-url-encoded.
    pub fn to_path(&self) -> String {
        match self {
            Route::File { revision, path } => file_path("file", revision, path),
            Route::FileReverse { revision, path } => file_path("file-reverse", revision, path),
            Route::Commit { revision } => format!("/commit/{}", form_encode(revision)),
            Route::DiffParents { revision } => format!("/diff-parents/{}", form_encode(revision)),
            Route::DiffChildren { revision } => {
                format!("/diff-children/{}", form_encode(revision))
            }
        }
    }

    pub fn revision(&self) -> &str {
        match self {
            Route::File { revision, .. }
            | Route::FileReverse { revision, .. }
            | Route::Commit { revision }
            | Route::DiffParents { revision }
            | Route::DiffChildren { revision } => revision,
        }
    }
}

fn file_path(command: &str, revision: &str, path: &str) -> String {
    let mut out = format!("/{command}/{}", form_encode(revision));
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        out.push('/');
        out.push_str(&form_encode(segment));
    }
    out
}
