use super::record::{BlameRecord, BlameTime};
use crate::error::{Error, Result};
use std::collections::HashMap;

/// Commit metadata that `git blame --porcelain` prints only the first time a
/// revision shows up in its output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlameHeader {
    pub author: String,
    pub author_time: i64,
    pub author_tz: String,
    pub filename: String,
}

impl BlameHeader {
    /// Overwrite the fields a block carries; keys it omits keep their value.
    fn absorb(&mut self, fields: &[&str]) {
        for (key, value) in fields.iter().filter_map(|f| f.split_once(' ')) {
            match key {
                "author" => self.author = value.to_string(),
                "author-time" => self.author_time = value.trim().parse().unwrap_or(0),
                "author-tz" => self.author_tz = value.to_string(),
                "filename" => self.filename = value.to_string(),
                _ => {}
            }
        }
    }

    pub fn when(&self) -> BlameTime {
        BlameTime::Unix {
            seconds: self.author_time,
            offset: self.author_tz.clone(),
        }
    }
}

/// Headers per revision, accumulated over one blame output.
#[derive(Debug, Default)]
pub struct HeaderCache {
    headers: HashMap<String, BlameHeader>,
}

impl HeaderCache {
    /// Merge a block's header lines into what is known about `revision`.
    pub fn remember(&mut self, revision: &str, fields: &[&str]) {
        self.headers
            .entry(revision.to_string())
            .or_default()
            .absorb(fields);
    }

    pub fn lookup(&self, revision: &str) -> Option<&BlameHeader> {
        self.headers.get(revision)
    }
}

/// Parse `git blame --porcelain` output (forward or `--reverse`) into one
/// record per line of the blamed file.
pub fn parse_porcelain(text: &str) -> Result<Vec<BlameRecord>> {
    let mut cache = HeaderCache::default();
    parse_porcelain_with(text, &mut cache)
}

/// Like [`parse_porcelain`], reading and filling a caller-owned header cache.
pub fn parse_porcelain_with(text: &str, cache: &mut HeaderCache) -> Result<Vec<BlameRecord>> {
    let mut records = Vec::new();
    let mut block: Vec<&str> = Vec::new();

    for line in text.lines() {
        match line.strip_prefix('\t') {
            Some(content) => {
                records.push(finish_block(&block, content, cache)?);
                block.clear();
            }
            None => block.push(line),
        }
    }

    if !block.is_empty() {
        log::warn!(
            "porcelain blame ended with {} header line(s) and no content line",
            block.len()
        );
    }

    Ok(records)
}

fn finish_block(block: &[&str], content: &str, cache: &mut HeaderCache) -> Result<BlameRecord> {
    let (first, fields) = block
        .split_first()
        .ok_or_else(|| Error::malformed("porcelain content line without header", content))?;

    let mut parts = first.split_whitespace();
    let revision = parts
        .next()
        .ok_or_else(|| Error::malformed("porcelain header line", *first))?;
    let original_line_number = parse_number(parts.next(), first)?;
    let line_number = parse_number(parts.next(), first)?;

    if !fields.is_empty() {
        cache.remember(revision, fields);
    }

    let header = cache.lookup(revision).ok_or_else(|| {
        Error::malformed(
            "porcelain block",
            format!("revision {revision} never carried author headers"),
        )
    })?;

    Ok(BlameRecord {
        line_number,
        revision: revision.to_string(),
        original_line_number,
        author: header.author.clone(),
        when: header.when(),
        source_path: header.filename.clone(),
        content: Some(content.to_string()),
    })
}

fn parse_number(field: Option<&str>, line: &str) -> Result<usize> {
    field
        .and_then(|f| f.parse().ok())
        .ok_or_else(|| Error::malformed("porcelain header line", line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "\
4a5b6c 1 1 2
author Jane Doe
author-mail <jane@example.com>
author-time 1000000000
author-tz +0900
committer Jane Doe
summary Initial import
boundary
filename src/lib.rs
\tfn main() {
4a5b6c 2 2
\t\tprintln!(\"hi\");
9f8e7d 2 3 1
author Bob
author-time 1100000000
author-tz -0500
previous 4a5b6c src/lib.rs
filename src/main.rs
\t    let x = 1;
4a5b6c 3 4 1
\t}
";

    #[test]
    fn porcelain_headers_reused_for_later_blocks() {
        let raw = "abc123 1 1 1\nauthor Jane\nauthor-time 1000000000\n\tHello\nabc123 2 2 1\n\tWorld\n";
        let records = parse_porcelain(raw).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].author, "Jane");
        assert_eq!(records[1].author, "Jane");
        assert_eq!(records[1].when, records[0].when);
        assert_eq!(records[1].content.as_deref(), Some("World"));
    }

    #[test]
    fn porcelain_full_sample() {
        let records = parse_porcelain(SAMPLE).unwrap();
        let lines: Vec<usize> = records.iter().map(|r| r.line_number).collect();
        assert_eq!(lines, vec![1, 2, 3, 4]);

        assert_eq!(
            records[2],
            BlameRecord {
                line_number: 3,
                revision: "9f8e7d".to_string(),
                original_line_number: 2,
                author: "Bob".to_string(),
                when: BlameTime::Unix {
                    seconds: 1_100_000_000,
                    offset: "-0500".to_string(),
                },
                source_path: "src/main.rs".to_string(),
                content: Some("    let x = 1;".to_string()),
            }
        );
        for i in [0, 1, 3] {
            assert_eq!(records[i].revision, "4a5b6c");
            assert_eq!(records[i].author, "Jane Doe");
            assert_eq!(records[i].source_path, "src/lib.rs");
        }
        assert_eq!(records[3].original_line_number, 3);
        assert_eq!(records[1].content.as_deref(), Some("\tprintln!(\"hi\");"));
    }

    #[test]
    fn porcelain_later_headers_replace_cached_ones() {
        let raw = "r1 1 1 1\nauthor A\n\tx\nr1 2 2 1\nauthor B\n\ty\nr1 3 3 1\n\tz\n";
        let records = parse_porcelain(raw).unwrap();
        let authors: Vec<&str> = records.iter().map(|r| r.author.as_str()).collect();
        assert_eq!(authors, vec!["A", "B", "B"]);
    }

    #[test]
    fn porcelain_filename_only_block_keeps_author() {
        // A commit blamed under two paths repeats only `filename`.
        let raw = "\
f67d 1 1 1
author Jane
author-time 1000000000
author-tz +0900
filename a.txt
\tfrom a
f67d 1 2 1
previous 0bad a.txt
filename c.txt
\tfrom c
f67d 2 3 1
\tstill c
";
        let records = parse_porcelain(raw).unwrap();
        for r in &records {
            assert_eq!(r.author, "Jane");
            assert_eq!(
                r.when,
                BlameTime::Unix {
                    seconds: 1_000_000_000,
                    offset: "+0900".to_string(),
                }
            );
        }
        let paths: Vec<&str> = records.iter().map(|r| r.source_path.as_str()).collect();
        assert_eq!(paths, vec!["a.txt", "c.txt", "c.txt"]);
    }

    #[test]
    fn porcelain_cache_is_scoped_to_one_call() {
        let first = "r1 1 1 1\nauthor A\n\tx\n";
        let second = "r1 1 1 1\n\tx\n";
        parse_porcelain(first).unwrap();
        assert!(matches!(
            parse_porcelain(second),
            Err(Error::MalformedGrammar { .. })
        ));

        let mut cache = HeaderCache::default();
        parse_porcelain_with(first, &mut cache).unwrap();
        let records = parse_porcelain_with(second, &mut cache).unwrap();
        assert_eq!(records[0].author, "A");
    }

    #[test]
    fn porcelain_empty_output_is_empty_file() {
        assert!(parse_porcelain("").unwrap().is_empty());
    }

    #[test]
    fn porcelain_malformed_header_line() {
        let err = parse_porcelain("r1 one 1 1\nauthor A\n\tx\n").unwrap_err();
        assert!(err.to_string().contains("r1 one 1 1"), "{err}");
        assert!(parse_porcelain("\torphan\n").is_err());
        assert!(parse_porcelain("r1 1\nauthor A\n\tx\n").is_err());
    }

    #[test]
    fn porcelain_missing_author_time_defaults_to_epoch() {
        let records = parse_porcelain("r1 1 1 1\nauthor A\n\tx\n").unwrap();
        assert_eq!(
            records[0].when,
            BlameTime::Unix {
                seconds: 0,
                offset: String::new()
            }
        );
    }
}
