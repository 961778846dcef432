use std::borrow::Cow;
use url::form_urlencoded;

/// Tab stop used when no configuration overrides it
pub const DEFAULT_TAB_WIDTH: usize = 8;

/// Decode tool output, replacing invalid UTF-8 with U+FFFD instead of failing.
pub fn scrub(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

/// Strip a single trailing `\n` or `\r\n`.
pub fn chomp(line: &str) -> &str {
    line.strip_suffix('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .unwrap_or(line)
}

/// Expand the leading run of tabs to `width` spaces each.
/// Tabs after the first non-tab character are kept as they are.
pub fn expand_tab(line: &str, width: usize) -> Cow<'_, str> {
    let body = line.trim_start_matches('\t');
    let tabs = line.len() - body.len();
    if tabs == 0 {
        return Cow::Borrowed(line);
    }
    let mut expanded = String::with_capacity(tabs * width + body.len());
    expanded.push_str(&" ".repeat(tabs * width));
    expanded.push_str(body);
    Cow::Owned(expanded)
}

/// Escape text for use in HTML content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}

/// Resolve the predefined XML entities and numeric character references.
/// Unknown or unterminated references are left untouched.
pub fn unescape_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        result.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_entity(&tail[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                result.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                result.push('&');
                rest = &tail[1..];
            }
        }
    }
    result.push_str(rest);
    result
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// `application/x-www-form-urlencoded` encoding of a whole string (space becomes `+`).
pub fn form_encode(text: &str) -> String {
    form_urlencoded::byte_serialize(text.as_bytes()).collect()
}

/// Decode one path segment produced by [`form_encode`].
pub fn decode_segment(segment: &str) -> String {
    // Literal `&` and `=` are data here, not pair separators.
    let escaped = segment.replace('&', "%26").replace('=', "%3D");
    form_urlencoded::parse(escaped.as_bytes())
        .next()
        .map(|(key, _)| key.into_owned())
        .unwrap_or_default()
}
