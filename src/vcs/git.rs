use super::cache::FetchCache;
use super::command;
use crate::config::AnnConfig;
use crate::error::{Error, Result};
use crate::render::{self, BlameDirection, DiffSides};
use crate::route::Route;
use crate::scan::parse_porcelain;
use crate::text::scrub;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

/// Git's well-known empty tree; root commits are diffed against it.
const EMPTY_TREE: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

/// A git working tree, queried through the `git` executable.
pub struct GitRepo {
    topdir: PathBuf,
    program: String,
    tab_width: usize,
    blames: FetchCache<Arc<[u8]>>,
    reverse_blames: FetchCache<Arc<[u8]>>,
    diffs: FetchCache<Arc<[u8]>>,
}

impl GitRepo {
    pub fn new(topdir: &Path, config: &AnnConfig) -> Self {
        GitRepo {
            topdir: topdir.to_path_buf(),
            program: config.tools.git.clone(),
            tab_width: config.display.tab_width,
            blames: FetchCache::new(),
            reverse_blames: FetchCache::new(),
            diffs: FetchCache::new(),
        }
    }

    fn git(&self, args: &[&str]) -> Result<Vec<u8>> {
        command::run(&self.program, args, Some(&self.topdir))
    }

    // ── Collaborator fetches ──

    /// `git blame --porcelain` of `path` as of `revision`.
    pub fn blame_forward(&self, path: &str, revision: &str) -> Result<Arc<[u8]>> {
        self.blames.get_or_fetch(path, revision, || {
            self.git(&["blame", "--porcelain", revision, "--", path])
                .map(Arc::from)
                .map_err(|e| blame_unavailable(e, path, revision))
        })
    }

    /// Blame walking forward from `revision` to `HEAD`: each line is
    /// attributed to the last revision that still contained it.
    pub fn blame_reverse(&self, path: &str, revision: &str) -> Result<Arc<[u8]>> {
        self.reverse_blames.get_or_fetch(path, revision, || {
            let range = format!("{revision}..HEAD");
            self.git(&["blame", "--porcelain", "--reverse", &range, "--", path])
                .map(Arc::from)
                .map_err(|e| blame_unavailable(e, path, revision))
        })
    }

    pub fn diff(&self, from: &str, to: &str) -> Result<Arc<[u8]>> {
        self.diffs.get_or_fetch(from, to, || {
            self.git(&["diff", "--no-color", "--no-ext-diff", from, to])
                .map(Arc::from)
        })
    }

    pub fn commit_log(&self, revision: &str) -> Result<String> {
        let out = self.git(&["log", "-1", "--parents", "--no-decorate", revision])?;
        Ok(scrub(&out).into_owned())
    }

    /// Children of `revision` among all refs, in `rev-list` order.
    pub fn child_revisions(&self, revision: &str) -> Result<Vec<String>> {
        let spec = format!("{revision}^{{commit}}");
        let full = self.git(&["rev-parse", "--verify", &spec])?;
        let full = scrub(&full).trim().to_string();
        let listing = self.git(&["rev-list", "--all", "--children"])?;
        Ok(parse_children(&scrub(&listing), &full))
    }

    // ── Pages ──

    pub fn render(&self, route: &Route) -> Result<String> {
        match route {
            Route::File { revision, path } => {
                self.format_file(revision, path, BlameDirection::Forward)
            }
            Route::FileReverse { revision, path } => {
                self.format_file(revision, path, BlameDirection::Reverse)
            }
            Route::Commit { revision } => self.format_commit(revision),
            Route::DiffParents { revision } => {
                let (commit, parents) = parse_commit_line(&self.commit_log(revision)?)?;
                self.format_diffs(parents.iter().map(|p| (p.as_str(), commit.as_str())))
            }
            Route::DiffChildren { revision } => {
                let children = self.child_revisions(revision)?;
                if children.is_empty() {
                    return Ok("<pre> (no child revisions)\n</pre>".to_string());
                }
                self.format_diffs(children.iter().map(|c| (revision.as_str(), c.as_str())))
            }
        }
    }

    fn format_file(&self, revision: &str, path: &str, direction: BlameDirection) -> Result<String> {
        let raw = match direction {
            BlameDirection::Forward => self.blame_forward(path, revision)?,
            BlameDirection::Reverse => self.blame_reverse(path, revision)?,
        };
        let records = parse_porcelain(&scrub(&raw))?;
        Ok(render::render_blame_page(&records, direction, self.tab_width))
    }

    fn format_commit(&self, revision: &str) -> Result<String> {
        let log = self.commit_log(revision)?;
        let (commit, parents) = parse_commit_line(&log)?;
        let mut out = render::log_block(&log);
        out.push_str(&self.format_diffs(parents.iter().map(|p| (p.as_str(), commit.as_str())))?);
        Ok(out)
    }

    fn format_diffs<'a>(&self, pairs: impl Iterator<Item = (&'a str, &'a str)>) -> Result<String> {
        let mut out = String::new();
        for (from, to) in pairs {
            let raw = self.diff(from, to)?;
            let sides = DiffSides {
                old_revision: from,
                new_revision: to,
                content_anchors: false,
                strip_prefixes: true,
                tab_width: self.tab_width,
            };
            out.push_str(&render::render_diff(&scrub(&raw), &sides));
        }
        Ok(out)
    }
}

fn blame_unavailable(err: Error, path: &str, revision: &str) -> Error {
    let detail = match err {
        Error::Fetch { command, detail } => format!("{command}: {detail}"),
        other => other.to_string(),
    };
    Error::BlameUnavailable {
        path: path.to_string(),
        revision: revision.to_string(),
        detail,
    }
}

static COMMIT_LINE: OnceLock<Regex> = OnceLock::new();

/// Read `commit <sha> <parent…>` from `git log --parents` output.
/// Root commits get the empty tree as their only parent.
pub fn parse_commit_line(log: &str) -> Result<(String, Vec<String>)> {
    let re = COMMIT_LINE.get_or_init(|| {
        Regex::new(r"(?m)^commit ([0-9a-f]+)(.*)$").expect("Failed to compile commit regex")
    });
    let caps = re
        .captures(log)
        .ok_or_else(|| Error::malformed("git log output: no 'commit' line", log))?;

    let commit = caps[1].to_string();
    let mut parents: Vec<String> = caps[2]
        .split_whitespace()
        .take_while(|p| p.bytes().all(|b| b.is_ascii_hexdigit()))
        .map(str::to_string)
        .collect();
    if parents.is_empty() {
        parents.push(EMPTY_TREE.to_string());
    }
    Ok((commit, parents))
}

/// Pick the children of `revision` out of `git rev-list --children` output.
pub fn parse_children(listing: &str, revision: &str) -> Vec<String> {
    listing
        .lines()
        .find_map(|line| {
            let mut ids = line.split_whitespace();
            (ids.next() == Some(revision)).then(|| ids.map(str::to_string).collect())
        })
        .unwrap_or_default()
}
