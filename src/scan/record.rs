use chrono::{DateTime, FixedOffset, Offset, Utc};

/// When a line was last touched, as each blame format reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlameTime {
    /// `author-time` seconds plus the `author-tz` offset (e.g. `+0900`).
    Unix { seconds: i64, offset: String },
    /// An ISO-8601 timestamp such as `2014-02-13T12:34:56.123456Z`.
    Date(String),
}

impl BlameTime {
    /// `YYYY-MM-DD` in the author's own timezone.
    pub fn date(&self) -> String {
        match self {
            BlameTime::Unix { seconds, offset } => {
                let offset = parse_offset(offset).unwrap_or_else(utc);
                DateTime::from_timestamp(*seconds, 0)
                    .map(|t| t.with_timezone(&offset).format("%Y-%m-%d").to_string())
                    .unwrap_or_default()
            }
            BlameTime::Date(date) => date.get(..10).unwrap_or(date.as_str()).to_string(),
        }
    }

    /// Full timestamp, used for hover titles.
    pub fn full(&self) -> String {
        match self {
            BlameTime::Unix { seconds, offset } => {
                let offset = parse_offset(offset).unwrap_or_else(utc);
                DateTime::from_timestamp(*seconds, 0)
                    .map(|t| t.with_timezone(&offset).to_rfc3339())
                    .unwrap_or_default()
            }
            BlameTime::Date(date) => date.clone(),
        }
    }
}

fn utc() -> FixedOffset {
    Utc.fix()
}

/// Parse git's `+HHMM` / `-HHMM` timezone notation.
fn parse_offset(tz: &str) -> Option<FixedOffset> {
    let (sign, digits) = match tz.as_bytes().first()? {
        b'+' => (1, &tz[1..]),
        b'-' => (-1, &tz[1..]),
        _ => return None,
    };
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Authorship of one line of a blamed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlameRecord {
    /// 1-based line number in the blamed revision of the file.
    pub line_number: usize,
    pub revision: String,
    /// Line number in `source_path` as of `revision`.
    pub original_line_number: usize,
    pub author: String,
    pub when: BlameTime,
    /// Path of the file as of `revision` (differs after renames).
    pub source_path: String,
    /// Line text, when the blame format carries it.
    pub content: Option<String>,
}
