use crate::model::{SeveritySet, SeverityTag};
use crate::policy::Policy;

/// How a single report line reads under a policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineKind {
    /// Starts a finding for a file inside the tracked tree.
    RelevantHeader(SeverityTag),
    /// Starts a finding for some other file.
    OtherHeader,
    /// Empty or whitespace only.
    Blank,
    /// Every severity keyword on the line.
    Body(SeveritySet),
}

impl LineKind {
    /// Whether this line ends the block currently being captured.
    pub fn terminates(&self) -> bool {
        matches!(self, LineKind::OtherHeader | LineKind::Blank | LineKind::RelevantHeader(_))
    }
}

/// Header, terminator and severity predicates compiled from a [`Policy`].
///
/// All matching is plain substring search on a lowercased copy of the line,
/// so path separators in the fragment are never interpreted as syntax.
#[derive(Clone, Debug)]
pub struct LineMatcher {
    prefix: String,
    fragment: String,
    require_extension: bool,
    extension_needles: Vec<String>,
    normalize_separators: bool,
}

impl LineMatcher {
    pub fn new(policy: &Policy) -> Self {
        let normalize_separators = policy.normalize_separators;
        let normalize = |s: &str| normalize_text(s, normalize_separators);
        Self {
            prefix: normalize(&policy.header_prefix),
            fragment: normalize(&policy.path_fragment),
            require_extension: policy.require_source_extension,
            extension_needles: policy
                .source_extensions
                .iter()
                .map(|ext| format!(".{}", ext.to_lowercase()))
                .collect(),
            normalize_separators,
        }
    }

    pub fn inspect(&self, line: &str) -> LineKind {
        if line.trim().is_empty() {
            return LineKind::Blank;
        }
        let norm = normalize_text(line, self.normalize_separators);
        if !norm.starts_with(&self.prefix) {
            return LineKind::Body(SeverityTag::all_in_lowered(&norm));
        }
        if self.is_relevant(&norm) {
            LineKind::RelevantHeader(SeverityTag::classify_lowered(&norm))
        } else {
            LineKind::OtherHeader
        }
    }

    fn is_relevant(&self, norm: &str) -> bool {
        let Some(pos) = norm.find(&self.fragment) else {
            return false;
        };
        if !self.require_extension {
            return true;
        }
        let rest = &norm[pos + self.fragment.len()..];
        self.extension_needles
            .iter()
            .any(|needle| references_extension(rest, needle))
    }
}

/// Lowercase, and fold `\` onto `/` when requested.
pub fn normalize_text(s: &str, normalize_separators: bool) -> String {
    let lower = s.to_lowercase();
    if normalize_separators {
        lower.replace('\\', "/")
    } else {
        lower
    }
}

/// `needle` is `.ext`; it must not run on into more name characters (`.c` vs `.cpp`).
fn references_extension(text: &str, needle: &str) -> bool {
    text.match_indices(needle).any(|(i, m)| {
        text[i + m.len()..]
            .chars()
            .next()
            .map_or(true, |c| !(c.is_alphanumeric() || c == '_'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(fragment: &str, require_ext: bool) -> LineMatcher {
        LineMatcher::new(&Policy::new(fragment).with_source_extension(require_ext))
    }

    impl LineMatcher {
        fn is_relevant_header(&self, line: &str) -> bool {
            matches!(self.inspect(line), LineKind::RelevantHeader(_))
        }
    }

    #[test]
    fn header_needs_prefix_and_fragment() {
        let m = matcher("application/source/", false);
        assert!(m.is_relevant_header("File application/source/foo.c: issue"));
        assert!(!m.is_relevant_header("File other/bar.c: issue"));
        assert!(!m.is_relevant_header("  see application/source/foo.c"));
        assert_eq!(m.inspect("file other/bar.c: issue"), LineKind::OtherHeader);
    }

    #[test]
    fn separators_and_case_are_normalized() {
        let m = matcher("application/source/", false);
        assert!(m.is_relevant_header("FILE APPLICATION\\SOURCE\\foo.c, line 10: Note"));

        let m = matcher("application\\source\\", false);
        assert!(m.is_relevant_header("File application/source/foo.c: issue"));
    }

    #[test]
    fn separators_kept_literal_when_normalization_off() {
        let mut p = Policy::new("application/source/");
        p.normalize_separators = false;
        let m = LineMatcher::new(&p);
        assert!(!m.is_relevant_header("File application\\source\\foo.c: issue"));
        assert!(m.is_relevant_header("File Application/Source/foo.c: issue"));
    }

    #[test]
    fn fragment_is_not_a_pattern() {
        // `.` and `*` would be regex syntax; here they only match themselves
        let m = matcher("src/.*", false);
        assert!(!m.is_relevant_header("File src/main.c: issue"));
        assert!(m.is_relevant_header("File src/.*/weird.c: issue"));
    }

    #[test]
    fn source_extension_boundary() {
        let m = matcher("application/source/", true);
        assert!(m.is_relevant_header("File application\\source\\led.c, line 3: Note 9045"));
        assert!(m.is_relevant_header("File application/source/led.c"));
        assert!(!m.is_relevant_header("File application/source/led.cpp: issue"));
        assert!(!m.is_relevant_header("File application/source/led.h: issue"));
        // the extension has to follow the fragment
        assert!(!m.is_relevant_header("File x.c application/source/readme"));
    }

    #[test]
    fn inspect_kinds() {
        let m = matcher("application/source/", false);
        assert_eq!(m.inspect(""), LineKind::Blank);
        assert_eq!(m.inspect(" \t\r\n"), LineKind::Blank);
        assert_eq!(m.inspect("File other/x.c: required"), LineKind::OtherHeader);
        assert_eq!(
            m.inspect("File application/source/x.c: [Rule 8.4, required]"),
            LineKind::RelevantHeader(SeverityTag::Required)
        );
        assert_eq!(
            m.inspect("  advisory: note"),
            LineKind::Body(SeveritySet::from([SeverityTag::Advisory]))
        );
        assert_eq!(
            m.inspect("  Advisory: see the required rationale"),
            LineKind::Body(SeveritySet::from([SeverityTag::Advisory, SeverityTag::Required]))
        );
        assert_eq!(m.inspect("    x = 1;"), LineKind::Body(SeveritySet::from([SeverityTag::None])));
        assert!(m.inspect("File other/x.c").terminates());
        assert!(!m.inspect("  body").terminates());
    }
}
