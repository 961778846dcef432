mod cache;
mod command;
mod git;
mod svn;

pub use git::GitRepo;
pub use svn::SvnRepo;

use crate::config::AnnConfig;
use crate::error::{Error, Result};
use crate::route::Route;
use crate::text::scrub;
use std::path::{Path, PathBuf};

/// A repository able to render every page kind.
pub enum Repository {
    Git(GitRepo),
    Svn(SvnRepo),
}

impl Repository {
    pub fn render(&self, route: &Route) -> Result<String> {
        match self {
            Repository::Git(repo) => repo.render(route),
            Repository::Svn(repo) => repo.render(route),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutKind {
    Git,
    Svn,
}

/// The working copy a target file lives in, found from the filesystem alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkout {
    pub kind: CheckoutKind,
    /// Directory holding the `.git` / `.svn` marker.
    pub root: PathBuf,
    /// Canonical path of the target file.
    pub target: PathBuf,
}

/// A target file resolved to its repository, path and latest revision.
pub struct Located {
    pub repository: Repository,
    /// Repository-relative path with `/` separators.
    pub path: String,
    pub revision: String,
}

impl Located {
    /// The file view for the located file.
    pub fn file_route(&self, reverse: bool) -> Route {
        let revision = self.revision.clone();
        let path = self.path.trim_start_matches('/').to_string();
        if reverse {
            Route::FileReverse { revision, path }
        } else {
            Route::File { revision, path }
        }
    }
}

/// Walk up from the target's directory to the nearest `.svn` or `.git`.
pub fn locate(target: &Path) -> Result<Checkout> {
    let target = target.canonicalize()?;
    let start = target.parent().unwrap_or(&target);
    for dir in start.ancestors() {
        let kind = if dir.join(".svn").exists() {
            CheckoutKind::Svn
        } else if dir.join(".git").exists() {
            CheckoutKind::Git
        } else {
            continue;
        };
        log::debug!("found {:?} checkout at {}", kind, dir.display());
        return Ok(Checkout {
            kind,
            root: dir.to_path_buf(),
            target: target.clone(),
        });
    }
    Err(Error::NoRepository(target.display().to_string()))
}

impl Checkout {
    /// Ask the version-control tool where the target lives and at which revision.
    pub fn open(&self, config: &AnnConfig) -> Result<Located> {
        match self.kind {
            CheckoutKind::Git => {
                let path = relative_path(&self.target, &self.root)?;
                let program = config.tools.git.as_str();
                let out = command::run(
                    program,
                    &["log", "--pretty=format:%H", "-1", "--", &path],
                    Some(&self.root),
                )?;
                let revision = scrub(&out).trim().to_string();
                if revision.is_empty() {
                    return Err(Error::malformed(
                        "'git log' result: no commit touches the file",
                        path,
                    ));
                }
                Ok(Located {
                    repository: Repository::Git(GitRepo::new(&self.root, config)),
                    path,
                    revision,
                })
            }
            CheckoutKind::Svn => {
                let target = self.target.to_string_lossy();
                let out = command::run(&config.tools.svn, &["info", "--xml", &target], None)?;
                let location = svn::parse_svn_info(&scrub(&out))?;
                Ok(Located {
                    repository: Repository::Svn(SvnRepo::new(&location.root, config)),
                    path: location.relpath,
                    revision: location.revision,
                })
            }
        }
    }
}

fn relative_path(target: &Path, root: &Path) -> Result<String> {
    let rel = target
        .strip_prefix(root)
        .map_err(|_| Error::NoRepository(target.display().to_string()))?;
    let segments: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(segments.join("/"))
}
