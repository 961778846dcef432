use crate::text::{chomp, escape_html as h};

/// Commit log text, escaped line by line.
pub fn log_block(log: &str) -> String {
    let mut out = String::from("<pre>");
    for line in chomp(log).lines() {
        out.push_str(&h(line));
        out.push('\n');
    }
    out.push_str("</pre>");
    out
}

/// Wrap a rendered fragment into a standalone HTML document.
pub fn document(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        h(title),
        body
    )
}
