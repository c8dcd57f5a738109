//! Comment cleaning
//!
//! Schema comments may carry AsciiDoc region markers (`// tag::name[]`,
//! `// end::name[]`) so the `.proto` file itself can be included piecewise.
//! Those lines are stripped before a comment is rendered.

use std::borrow::Cow;

/// Opening region marker
pub const REGION_BEGIN: &str = "tag::";

/// Closing region marker
pub const REGION_END: &str = "end::";

fn is_region_marker(line: &str) -> bool {
    line.contains(REGION_BEGIN) || line.contains(REGION_END)
}

/// Clean a raw descriptor comment
///
/// Drops empty lines and region-marker lines; every other line is kept
/// byte-for-byte, in order.
pub fn clean(raw: &str) -> String {
    raw.split('\n')
        .filter(|line| !line.is_empty() && !is_region_marker(line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Per-line rewrite hook for comment conventions of a specific schema source
pub trait CommentDialect {
    /// Rewrite one raw comment line before it is trimmed
    fn rewrite_line<'a>(&self, line: &'a str) -> Cow<'a, str>;
}

/// Comment conventions of the googleapis protos
///
/// Their comments are Markdown-ish: `# Heading`, `Example ...` captions and
/// single-space lines around indented samples.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoogleApisDialect;

impl CommentDialect for GoogleApisDialect {
    fn rewrite_line<'a>(&self, line: &'a str) -> Cow<'a, str> {
        if line == " " {
            return Cow::Borrowed("----");
        }
        if !line.contains("# ") && !line.contains("Example ") {
            return Cow::Borrowed(line);
        }
        Cow::Owned(
            line.replacen("# ", "=== ", 1)
                .replacen("Example ", ".Example ", 1),
        )
    }
}

static GOOGLE_APIS: GoogleApisDialect = GoogleApisDialect;

/// Pick the dialect for a source file from its path
pub fn dialect_for_source(path: &str) -> Option<&'static dyn CommentDialect> {
    if path.contains("google") {
        Some(&GOOGLE_APIS)
    } else {
        None
    }
}

/// Clean comment lines read straight from `.proto` source text
///
/// Besides dropping region markers this trims tab, space and `*` padding
/// (left over from `/* */` blocks) and applies the dialect hook first.
pub fn clean_legacy<S: AsRef<str>>(lines: &[S], dialect: Option<&dyn CommentDialect>) -> String {
    lines
        .iter()
        .map(|line| line.as_ref())
        .filter(|line| !is_region_marker(line))
        .map(|line| match dialect {
            Some(dialect) => dialect.rewrite_line(line),
            None => Cow::Borrowed(line),
        })
        .map(|line| line.trim_matches(|c| matches!(c, '\t' | ' ' | '*')).to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_drops_blank_lines() {
        assert_eq!(clean(" First\n\n Second\n"), " First\n Second");
    }

    #[test]
    fn test_clean_drops_region_markers_only() {
        let raw = " tag::User[]\n  Keeps  internal   spacing\n end::User[]\n";
        assert_eq!(clean(raw), "  Keeps  internal   spacing");
    }

    #[test]
    fn test_clean_is_idempotent() {
        let raw = "a\n\n b\n tag::x[]\nc \n";
        let once = clean(raw);
        assert_eq!(clean(&once), once);
    }

    #[test]
    fn test_clean_all_markers_yields_empty() {
        assert_eq!(clean(""), "");
        assert_eq!(clean("tag::a[]\nend::a[]\n\n"), "");
    }

    #[test]
    fn test_clean_legacy_trims_padding() {
        let lines = vec!["* Block line", "\t indented *", " tag::x[]", "   "];
        assert_eq!(clean_legacy(&lines, None), "Block line\nindented");
    }

    #[test]
    fn test_google_dialect_rewrites() {
        let dialect = dialect_for_source("third_party/google/api/http.proto");
        assert!(dialect.is_some());

        let lines = vec![" # Overview", " Example 1:", " ", " plain"];
        assert_eq!(
            clean_legacy(&lines, dialect),
            "=== Overview\n.Example 1:\n----\nplain"
        );
    }

    #[test]
    fn test_no_dialect_for_other_sources() {
        assert!(dialect_for_source("api/user.proto").is_none());
        let lines = vec![" # Overview", " "];
        assert_eq!(clean_legacy(&lines, None), "# Overview");
    }
}
