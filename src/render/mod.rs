mod anchor;
mod diff_view;
mod file_view;
mod page;

#[allow(unused_imports)]
pub use anchor::{anchored, file_line_url, AnchorKey};
#[allow(unused_imports)]
pub use diff_view::{render_diff, render_diff_line, DiffSides, DiffState};
#[allow(unused_imports)]
pub use file_view::{
    render_annotated_line, render_annotated_page, render_blame_line, render_blame_page,
    BlameDirection, ColumnWidths, RunState,
};
pub use page::{document, log_block};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{parse_entries, parse_porcelain};

    /// Every `href="…#frag"` target fragment in `page` pointing at `prefix`.
    fn fragments_to(page: &str, prefix: &str) -> Vec<String> {
        let needle = format!("href=\"{prefix}#");
        page.match_indices(&needle)
            .map(|(i, _)| {
                let rest = &page[i + needle.len()..];
                rest[..rest.find('"').unwrap()].to_string()
            })
            .collect()
    }

    #[test]
    fn file_view_links_land_on_diff_anchors() {
        let blame = "\
c0ffee 2 1 1
author Jane
author-time 1000000000
author-tz +0000
filename src/lib.rs
\tpub fn added() {}
";
        let records = parse_porcelain(blame).unwrap();
        let file_page = render_blame_page(&records, BlameDirection::Forward, 8);
        let links = fragments_to(&file_page, "/commit/c0ffee");
        assert_eq!(links.len(), 1);

        let diff = "\
--- a/src/lib.rs
+++ b/src/lib.rs
@@ -1,1 +1,2 @@
 use std::io;
+pub fn added() {}
";
        let sides = DiffSides {
            old_revision: "beef",
            new_revision: "c0ffee",
            content_anchors: false,
            strip_prefixes: true,
            tab_width: 8,
        };
        let diff_page = render_diff(diff, &sides);
        assert!(
            diff_page.contains(&format!("<a name=\"{}\"></a>", links[0])),
            "{} not in {diff_page}",
            links[0]
        );
    }

    #[test]
    fn links_land_on_anchors_for_paths_with_spaces() {
        let blame = "c0ffee 2 2 1\nauthor Jane\nauthor-time 1000000000\nfilename my file.txt\n\tb\n";
        let records = parse_porcelain(blame).unwrap();
        let file_page = render_blame_page(&records, BlameDirection::Forward, 8);
        let links = fragments_to(&file_page, "/commit/c0ffee");
        assert_eq!(links, vec!["c0ffee%2Fmy+file.txt%3A2".to_string()]);

        let diff = "--- a/my file.txt\t\n+++ b/my file.txt\t\n@@ -1,1 +1,2 @@\n a\n+b\n";
        let sides = DiffSides {
            old_revision: "beef",
            new_revision: "c0ffee",
            content_anchors: false,
            strip_prefixes: true,
            tab_width: 8,
        };
        let diff_page = render_diff(diff, &sides);
        assert!(diff_page.contains(&format!("<a name=\"{}\"></a>", links[0])));
    }

    #[test]
    fn reverse_view_links_land_on_child_diff_anchors() {
        let blame = "\
0ld 3 3 1
author Jane
author-time 1000000000
filename src/lib.rs
\tfn gone() {}
";
        let records = parse_porcelain(blame).unwrap();
        let file_page = render_blame_page(&records, BlameDirection::Reverse, 8);
        let links = fragments_to(&file_page, "/diff-children/0ld");

        let diff = "--- a/src/lib.rs\n+++ b/src/lib.rs\n@@ -2,2 +2,1 @@\n kept\n-fn gone() {}\n";
        let sides = DiffSides {
            old_revision: "0ld",
            new_revision: "n3w",
            content_anchors: false,
            strip_prefixes: true,
            tab_width: 8,
        };
        let diff_page = render_diff(diff, &sides);
        assert!(diff_page.contains(&format!("<a name=\"{}\"></a>", links[0])));
    }

    #[test]
    fn annotated_links_land_on_content_anchors() {
        let xml = "<entry\n   line-number=\"1\">\n<commit\n   revision=\"42\">\n\
                   <author>ann</author>\n<date>2014-01-01T00:00:00Z</date>\n\
                   </commit>\n</entry>\n";
        let records = parse_entries(xml, "/trunk/f.c");
        let file_page = render_annotated_page("\tx = a & b;\n", &records, 8);
        let links = fragments_to(&file_page, "/commit/42");

        let diff = "--- trunk/f.c\t(revision 41)\n+++ trunk/f.c\t(revision 42)\n\
                    @@ -0,0 +1,1 @@\n+\tx = a & b;\n";
        let sides = DiffSides {
            old_revision: "41",
            new_revision: "42",
            content_anchors: true,
            strip_prefixes: false,
            tab_width: 8,
        };
        let diff_page = render_diff(diff, &sides);
        assert!(diff_page.contains(&format!("<a name=\"{}\"></a>", links[0])));
    }

    #[test]
    fn diff_view_links_land_on_file_view_line_anchors() {
        let diff = "--- a/src/lib.rs\n+++ b/src/lib.rs\n@@ -1,0 +1,1 @@\n+x\n";
        let sides = DiffSides {
            old_revision: "p",
            new_revision: "c",
            content_anchors: false,
            strip_prefixes: true,
            tab_width: 8,
        };
        let diff_page = render_diff(diff, &sides);
        assert!(diff_page.contains("href=\"/file/c/src/lib.rs#1\""));

        let blame = "c 1 1 1\nauthor A\nfilename src/lib.rs\n\tx\n";
        let file_page = render_blame_page(&parse_porcelain(blame).unwrap(), BlameDirection::Forward, 8);
        assert!(file_page.contains("<a name=\"1\"></a>"));
    }
}
