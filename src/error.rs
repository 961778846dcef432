use thiserror::Error;

/// Failures that abort a render.
///
/// Lossy decoding and incomplete `svn ann` entries are deliberately absent:
/// those degrade the output instead of failing it.
#[derive(Debug, Error)]
pub enum Error {
    /// A version-control command could not be run or exited unsuccessfully.
    #[error("{command} failed: {detail}")]
    Fetch { command: String, detail: String },

    /// Tool output lacked a structural marker the page depends on.
    #[error("unexpected {what}: {context}")]
    MalformedGrammar { what: String, context: String },

    #[error("blame unavailable for {path}@{revision}: {detail}")]
    BlameUnavailable {
        path: String,
        revision: String,
        detail: String,
    },

    #[error("unexpected request path: {0}")]
    UnknownRoute(String),

    #[error("not a plain file ({kind}): {path}@{revision}")]
    NotAFile {
        path: String,
        revision: String,
        kind: String,
    },

    #[error("cannot find a repository for {0}")]
    NoRepository(String),

    #[error("{0} is not supported by this repository")]
    Unsupported(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn malformed(what: impl Into<String>, context: impl Into<String>) -> Self {
        Error::MalformedGrammar {
            what: what.into(),
            context: context.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
