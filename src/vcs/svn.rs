use super::cache::FetchCache;
use super::command;
use crate::config::AnnConfig;
use crate::error::{Error, Result};
use crate::render::{self, DiffSides};
use crate::route::Route;
use crate::scan::parse_entries;
use crate::text::{scrub, unescape_html};
use regex::Regex;
use std::sync::{Arc, OnceLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Directory,
    Missing,
}

impl NodeKind {
    fn label(self) -> &'static str {
        match self {
            NodeKind::File => "file",
            NodeKind::Directory => "directory",
            NodeKind::Missing => "not existing",
        }
    }
}

/// A Subversion repository addressed by its root URL.
///
/// Paths are repository-relative and start with `/`.
pub struct SvnRepo {
    root: String,
    program: String,
    tab_width: usize,
    kinds: FetchCache<NodeKind>,
    contents: FetchCache<Arc<[u8]>>,
    annotations: FetchCache<Arc<[u8]>>,
    diffs: FetchCache<Arc<[u8]>>,
}

impl SvnRepo {
    pub fn new(root: &str, config: &AnnConfig) -> Self {
        SvnRepo {
            root: root.to_string(),
            program: config.tools.svn.clone(),
            tab_width: config.display.tab_width,
            kinds: FetchCache::new(),
            contents: FetchCache::new(),
            annotations: FetchCache::new(),
            diffs: FetchCache::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.root, path)
    }

    fn svn(&self, args: &[&str]) -> Result<Vec<u8>> {
        command::run(&self.program, args, None)
    }

    // ── Collaborator fetches ──

    pub fn node_kind(&self, path: &str, revision: &str) -> Result<NodeKind> {
        self.kinds.get_or_fetch(path, revision, || {
            let rev = format!("-r{revision}");
            let url = self.url(path);
            let args = ["info", rev.as_str(), url.as_str()];
            let output = command::capture(&self.program, &args, None)?;
            if output.status.success() {
                parse_node_kind(&scrub(&output.stdout))
            } else if is_missing_location(&scrub(&output.stderr)) {
                Ok(NodeKind::Missing)
            } else {
                Err(command::failure(&self.program, &args, &output))
            }
        })
    }

    fn require_file(&self, path: &str, revision: &str) -> Result<()> {
        match self.node_kind(path, revision)? {
            NodeKind::File => Ok(()),
            kind => Err(Error::NotAFile {
                path: path.to_string(),
                revision: revision.to_string(),
                kind: kind.label().to_string(),
            }),
        }
    }

    /// `svn cat`: the annotate XML carries no line text.
    pub fn file_content(&self, path: &str, revision: &str) -> Result<Arc<[u8]>> {
        self.require_file(path, revision)?;
        self.contents.get_or_fetch(path, revision, || {
            let rev = format!("-r{revision}");
            self.svn(&["cat", &rev, &self.url(path)]).map(Arc::from)
        })
    }

    pub fn blame_structured(&self, path: &str, revision: &str) -> Result<Arc<[u8]>> {
        self.require_file(path, revision)?;
        self.annotations.get_or_fetch(path, revision, || {
            let rev = format!("-r{revision}");
            self.svn(&["annotate", "--xml", &rev, &self.url(path)])
                .map(Arc::from)
                .map_err(|e| Error::BlameUnavailable {
                    path: path.to_string(),
                    revision: revision.to_string(),
                    detail: e.to_string(),
                })
        })
    }

    pub fn commit_log(&self, revision: &str) -> Result<String> {
        let rev = format!("-r{revision}");
        let out = self.svn(&["log", &rev, &self.root])?;
        Ok(scrub(&out).into_owned())
    }

    pub fn diff(&self, from: &str, to: &str) -> Result<Arc<[u8]>> {
        self.diffs.get_or_fetch(from, to, || {
            let range = format!("-r{from}:{to}");
            self.svn(&["diff", &range, &self.root]).map(Arc::from)
        })
    }

    /// Revision numbers are global, so the next revision is the only child.
    pub fn child_revisions(&self, revision: &str) -> Result<Vec<String>> {
        Ok(vec![(revision_number(revision)? + 1).to_string()])
    }

    pub fn parent_revisions(&self, revision: &str) -> Result<Vec<String>> {
        let number = revision_number(revision)?;
        Ok(number.checked_sub(1).map(|p| p.to_string()).into_iter().collect())
    }

    // ── Pages ──

    pub fn render(&self, route: &Route) -> Result<String> {
        match route {
            Route::File { revision, path } => self.format_file(revision, &format!("/{path}")),
            Route::FileReverse { .. } => Err(Error::Unsupported("reverse blame")),
            Route::Commit { revision } => {
                let mut out = render::log_block(&self.commit_log(revision)?);
                out.push_str(&self.format_parent_diffs(revision)?);
                Ok(out)
            }
            Route::DiffParents { revision } => self.format_parent_diffs(revision),
            Route::DiffChildren { revision } => {
                let mut out = String::new();
                for child in self.child_revisions(revision)? {
                    out.push_str(&self.format_diff(revision, &child)?);
                }
                Ok(out)
            }
        }
    }

    fn format_file(&self, revision: &str, path: &str) -> Result<String> {
        let content = self.file_content(path, revision)?;
        let annotations = self.blame_structured(path, revision)?;
        let records = parse_entries(&scrub(&annotations), path);
        Ok(render::render_annotated_page(
            &scrub(&content),
            &records,
            self.tab_width,
        ))
    }

    fn format_parent_diffs(&self, revision: &str) -> Result<String> {
        let mut out = String::new();
        for parent in self.parent_revisions(revision)? {
            out.push_str(&self.format_diff(&parent, revision)?);
        }
        Ok(out)
    }

    fn format_diff(&self, from: &str, to: &str) -> Result<String> {
        let raw = self.diff(from, to)?;
        let sides = DiffSides {
            old_revision: from,
            new_revision: to,
            content_anchors: true,
            strip_prefixes: false,
            tab_width: self.tab_width,
        };
        Ok(render::render_diff(&scrub(&raw), &sides))
    }
}

fn revision_number(revision: &str) -> Result<u64> {
    revision
        .parse()
        .map_err(|_| Error::malformed("svn revision number", revision))
}

fn is_missing_location(stderr: &str) -> bool {
    stderr.contains("Unable to find repository location")
        || stderr.contains("path not found")
}

/// Read `Node Kind:` from `svn info` output.
pub fn parse_node_kind(info: &str) -> Result<NodeKind> {
    info.lines()
        .find_map(|line| match line.strip_prefix("Node Kind: ")?.trim() {
            "file" => Some(NodeKind::File),
            "directory" => Some(NodeKind::Directory),
            _ => None,
        })
        .ok_or_else(|| Error::malformed("svn info output: no node kind", info))
}

/// Where a working copy points inside its repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvnLocation {
    pub root: String,
    /// Repository-relative path, empty or starting with `/`.
    pub relpath: String,
    pub revision: String,
}

struct InfoPatterns {
    url: Regex,
    root: Regex,
    commit: Regex,
}

static INFO_PATTERNS: OnceLock<InfoPatterns> = OnceLock::new();

/// Parse `svn info --xml` for a working-copy path.
pub fn parse_svn_info(xml: &str) -> Result<SvnLocation> {
    let p = INFO_PATTERNS.get_or_init(|| InfoPatterns {
        url: Regex::new(r"<url>(.*?)</url>").expect("Failed to compile url regex"),
        root: Regex::new(r"<root>(.*?)</root>").expect("Failed to compile root regex"),
        commit: Regex::new(r#"<commit\s+revision="(\d+)">"#)
            .expect("Failed to compile commit regex"),
    });

    let field = |re: &Regex, what: &str| -> Result<String> {
        re.captures(xml)
            .map(|c| unescape_html(&c[1]))
            .ok_or_else(|| Error::malformed(format!("'svn info' result: no {what}"), xml))
    };
    let url = field(&p.url, "url element")?;
    let root = field(&p.root, "root element")?;
    let revision = field(&p.commit, "revision")?;

    let relpath = url
        .strip_prefix(root.as_str())
        .ok_or_else(|| {
            Error::malformed(
                "'svn info' result: url is not under root",
                format!("{url} / {root}"),
            )
        })?
        .to_string();
    if !relpath.is_empty() && !relpath.starts_with('/') {
        return Err(Error::malformed(
            "'svn info' result: relpath doesn't start with a slash",
            relpath,
        ));
    }

    Ok(SvnLocation {
        root,
        relpath,
        revision,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const INFO_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<info>
<entry
   kind="file"
   path="ChangeLog"
   revision="44935">
<url>http://svn.example.org/repos/project/trunk/ChangeLog</url>
<relative-url>^/trunk/ChangeLog</relative-url>
<repository>
<root>http://svn.example.org/repos/project</root>
<uuid>b2dd03c8-39d4-4d8f-98ff-823fe69b080e</uuid>
</repository>
<commit
   revision="44930">
<author>ann</author>
<date>2014-02-13T12:34:56.123456Z</date>
</commit>
</entry>
</info>
"#;

    #[test]
    fn svn_info_location() {
        assert_eq!(
            parse_svn_info(INFO_XML).unwrap(),
            SvnLocation {
                root: "http://svn.example.org/repos/project".to_string(),
                relpath: "/trunk/ChangeLog".to_string(),
                revision: "44930".to_string(),
            }
        );
    }

    #[test]
    fn svn_info_unescapes_urls() {
        let xml = INFO_XML
            .replace("project/trunk/ChangeLog</url>", "project/trunk/a&amp;b</url>");
        assert_eq!(parse_svn_info(&xml).unwrap().relpath, "/trunk/a&b");
    }

    #[test]
    fn svn_info_missing_elements() {
        let no_url = INFO_XML.replace("<url>", "<href>");
        assert!(parse_svn_info(&no_url)
            .unwrap_err()
            .to_string()
            .contains("no url element"));
        let no_commit = INFO_XML.replace("<commit\n", "<last\n");
        assert!(parse_svn_info(&no_commit)
            .unwrap_err()
            .to_string()
            .contains("no revision"));
    }

    #[test]
    fn svn_info_url_outside_root() {
        let xml = INFO_XML.replace(
            "<root>http://svn.example.org/repos/project</root>",
            "<root>http://svn.example.org/other</root>",
        );
        assert!(matches!(
            parse_svn_info(&xml),
            Err(Error::MalformedGrammar { .. })
        ));
        let xml = INFO_XML.replace(
            "<root>http://svn.example.org/repos/project</root>",
            "<root>http://svn.example.org/repos/proj</root>",
        );
        assert!(parse_svn_info(&xml).unwrap_err().to_string().contains("slash"));
    }

    #[test]
    fn node_kind_from_info() {
        let info = "Path: x\nURL: http://h/r/x\nNode Kind: directory\nRevision: 3\n";
        assert_eq!(parse_node_kind(info).unwrap(), NodeKind::Directory);
        assert_eq!(parse_node_kind("Node Kind: file\n").unwrap(), NodeKind::File);
        assert!(parse_node_kind("Path: x\n").is_err());
    }

    #[test]
    fn missing_location_detected() {
        assert!(is_missing_location(
            "svn: E170000: Unable to find repository location for 'x' in revision 3\n"
        ));
        assert!(!is_missing_location("svn: E170013: Unable to connect\n"));
    }

    #[test]
    fn parent_and_child_revisions() {
        let repo = SvnRepo::new("http://h/r", &AnnConfig::default());
        assert_eq!(repo.parent_revisions("42").unwrap(), vec!["41".to_string()]);
        assert!(repo.parent_revisions("0").unwrap().is_empty());
        assert_eq!(repo.child_revisions("42").unwrap(), vec!["43".to_string()]);
        assert!(matches!(
            repo.child_revisions("HEAD"),
            Err(Error::MalformedGrammar { .. })
        ));
    }

    #[test]
    fn diff_failure_is_retried_then_cached() {
        let config = AnnConfig {
            tools: crate::config::ToolsConfig {
                svn: "vcs-ann-no-such-svn".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let repo = SvnRepo::new("http://h/r", &config);
        assert!(matches!(repo.diff("1", "2"), Err(Error::Fetch { .. })));

        repo.diffs
            .get_or_fetch("1", "2", || Ok(Arc::from(&b"Index: f\n"[..])))
            .unwrap();
        assert_eq!(&repo.diff("1", "2").unwrap()[..], b"Index: f\n");
    }

    #[test]
    fn reverse_blame_unsupported() {
        let repo = SvnRepo::new("http://h/r", &AnnConfig::default());
        let route = Route::FileReverse {
            revision: "1".to_string(),
            path: "f".to_string(),
        };
        assert!(matches!(repo.render(&route), Err(Error::Unsupported(_))));
    }
}
