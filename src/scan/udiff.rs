use std::borrow::Cow;
use std::str::Lines;

/// One classified line of unified diff output.
///
/// `raw_line` is the full input line without its terminator; `content` is the
/// text after the one-character `-`/`+`/` ` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffEvent<'a> {
    FileHeaderOld {
        raw_line: &'a str,
        path: Cow<'a, str>,
    },
    FileHeaderNew {
        raw_line: &'a str,
        path: Cow<'a, str>,
    },
    HunkHeader {
        raw_line: &'a str,
        old_start: usize,
        old_count: usize,
        new_start: usize,
        new_count: usize,
    },
    Removed {
        raw_line: &'a str,
        content: &'a str,
        old_line: usize,
    },
    Added {
        raw_line: &'a str,
        content: &'a str,
        new_line: usize,
    },
    Common {
        raw_line: &'a str,
        content: &'a str,
        old_line: usize,
        new_line: usize,
    },
    Other {
        raw_line: &'a str,
    },
}

impl<'a> DiffEvent<'a> {
    pub fn raw_line(&self) -> &'a str {
        match *self {
            DiffEvent::FileHeaderOld { raw_line, .. }
            | DiffEvent::FileHeaderNew { raw_line, .. }
            | DiffEvent::HunkHeader { raw_line, .. }
            | DiffEvent::Removed { raw_line, .. }
            | DiffEvent::Added { raw_line, .. }
            | DiffEvent::Common { raw_line, .. }
            | DiffEvent::Other { raw_line } => raw_line,
        }
    }
}

/// Lazily classifies unified diff text line by line.
///
/// Hunk arithmetic that disagrees with the body never fails the scan: lines
/// beyond a hunk's declared counts come out as [`DiffEvent::Other`].
pub struct DiffScanner<'a> {
    lines: Lines<'a>,
    cur_old: usize,
    cur_new: usize,
    remaining_old: usize,
    remaining_new: usize,
}

/// Scan decoded diff text. Decode raw bytes with [`crate::text::scrub`] first.
pub fn scan(text: &str) -> DiffScanner<'_> {
    DiffScanner {
        lines: text.lines(),
        cur_old: 0,
        cur_new: 0,
        remaining_old: 0,
        remaining_new: 0,
    }
}

impl<'a> DiffScanner<'a> {
    fn classify(&mut self, line: &'a str) -> DiffEvent<'a> {
        if let Some(event) = self.hunk_body(line) {
            return event;
        }
        if let Some(path) = header_path(line, "---") {
            return DiffEvent::FileHeaderOld {
                raw_line: line,
                path,
            };
        }
        if let Some(path) = header_path(line, "+++") {
            return DiffEvent::FileHeaderNew {
                raw_line: line,
                path,
            };
        }
        if let Some(range) = parse_hunk_header(line) {
            self.cur_old = range.old_start;
            self.remaining_old = range.old_count;
            self.cur_new = range.new_start;
            self.remaining_new = range.new_count;
            return DiffEvent::HunkHeader {
                raw_line: line,
                old_start: range.old_start,
                old_count: range.old_count,
                new_start: range.new_start,
                new_count: range.new_count,
            };
        }
        DiffEvent::Other { raw_line: line }
    }

    /// Body lines of the active hunk; `None` once the line is out of budget.
    fn hunk_body(&mut self, line: &'a str) -> Option<DiffEvent<'a>> {
        if let Some(content) = line.strip_prefix('-') {
            if self.remaining_old == 0 {
                return None;
            }
            let event = DiffEvent::Removed {
                raw_line: line,
                content,
                old_line: self.cur_old,
            };
            self.cur_old += 1;
            self.remaining_old -= 1;
            Some(event)
        } else if let Some(content) = line.strip_prefix('+') {
            if self.remaining_new == 0 {
                return None;
            }
            let event = DiffEvent::Added {
                raw_line: line,
                content,
                new_line: self.cur_new,
            };
            self.cur_new += 1;
            self.remaining_new -= 1;
            Some(event)
        } else if let Some(content) = line.strip_prefix(' ') {
            if self.remaining_old == 0 || self.remaining_new == 0 {
                return None;
            }
            let event = DiffEvent::Common {
                raw_line: line,
                content,
                old_line: self.cur_old,
                new_line: self.cur_new,
            };
            self.cur_old += 1;
            self.cur_new += 1;
            self.remaining_old -= 1;
            self.remaining_new -= 1;
            Some(event)
        } else {
            None
        }
    }
}

impl<'a> Iterator for DiffScanner<'a> {
    type Item = DiffEvent<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.lines.next()?;
        Some(self.classify(line))
    }
}

/// `--- path` / `+++ path`. The path runs up to a tab (git adds one after
/// paths containing spaces, svn before its `(revision N)` label) or to the end
/// of the line; git's C-quoted `"a/..."` form is unquoted.
fn header_path<'a>(line: &'a str, marker: &str) -> Option<Cow<'a, str>> {
    let rest = line.strip_prefix(marker)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim_start();
    if rest.starts_with('"') {
        if let Some(path) = unquote(rest) {
            return Some(Cow::Owned(path));
        }
    }
    let path = match rest.split_once('\t') {
        Some((path, _)) => path,
        None => rest.trim_end(),
    };
    (!path.is_empty()).then_some(Cow::Borrowed(path))
}

/// Undo git's quoting of unusual paths: `"a/t\303\251st \"x\""`.
fn unquote(quoted: &str) -> Option<String> {
    let mut bytes = quoted.strip_prefix('"')?.bytes();
    let mut out = Vec::new();
    loop {
        match bytes.next()? {
            b'"' => return Some(String::from_utf8_lossy(&out).into_owned()),
            b'\\' => {
                let escaped = bytes.next()?;
                let byte = match escaped {
                    b'a' => 0x07,
                    b'b' => 0x08,
                    b't' => b'\t',
                    b'n' => b'\n',
                    b'v' => 0x0b,
                    b'f' => 0x0c,
                    b'r' => b'\r',
                    b'0'..=b'7' => {
                        let mut value = u32::from(escaped - b'0');
                        for _ in 0..2 {
                            let digit = bytes.next()?;
                            if !(b'0'..=b'7').contains(&digit) {
                                return None;
                            }
                            value = value * 8 + u32::from(digit - b'0');
                        }
                        u8::try_from(value).ok()?
                    }
                    other => other,
                };
                out.push(byte);
            }
            byte => out.push(byte),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct HunkRange {
    old_start: usize,
    old_count: usize,
    new_start: usize,
    new_count: usize,
}

/// Parse a hunk header like "@@ -10,4 +10,15 @@ fn foo()"
fn parse_hunk_header(line: &str) -> Option<HunkRange> {
    let after_first = line.strip_prefix("@@ ")?;
    let end_idx = after_first.find(" @@")?;
    let range_str = &after_first[..end_idx];

    let mut parts = range_str.split(' ');
    let old = parts.next()?.strip_prefix('-')?;
    let new = parts.next()?.strip_prefix('+')?;
    if parts.next().is_some() {
        return None;
    }

    let (old_start, old_count) = parse_range(old)?;
    let (new_start, new_count) = parse_range(new)?;
    Some(HunkRange {
        old_start,
        old_count,
        new_start,
        new_count,
    })
}

/// Parse "start,count" or just "start" (count defaults to 1)
fn parse_range(s: &str) -> Option<(usize, usize)> {
    if let Some((start, count)) = s.split_once(',') {
        Some((start.parse().ok()?, count.parse().ok()?))
    } else {
        Some((s.parse().ok()?, 1))
    }
}
