// Copyright 2026 the Shader Cross Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structured compiler diagnostics.
//!
//! The front-end library reports problems as line-oriented text against the combined
//! translation unit. [`parse_messages`] turns that text into [`Diagnostic`]s and uses a
//! [`FragmentMap`] to attribute each line number to the fragment it came from.

use std::fmt;

/// The pipeline step that produced a diagnostic.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Parse,
    Link,
    Lower,
    Decompile,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Parse => "parse",
            Self::Link => "link",
            Self::Lower => "lower",
            Self::Decompile => "decompile",
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Error => "error",
            Self::Warning => "warning",
        })
    }
}

/// One of the three pieces a translation unit is assembled from, in order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Fragment {
    Preamble,
    Defines,
    Source,
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Preamble => "preamble",
            Self::Defines => "defines",
            Self::Source => "source",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub phase: Phase,
    pub severity: Severity,
    pub message: String,
    pub fragment: Option<Fragment>,
    /// 1-based line within [`fragment`](Self::fragment).
    pub line: Option<u32>,
    /// 1-based column, when the reporting library provides one.
    pub column: Option<u32>,
}

impl Diagnostic {
    /// A diagnostic that is not tied to any source location.
    pub fn new(phase: Phase, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            phase,
            severity,
            message: message.into(),
            fragment: None,
            line: None,
            column: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: ", self.phase, self.severity)?;
        match (self.fragment, self.line, self.column) {
            (Some(fragment), Some(line), Some(column)) => write!(f, "{fragment}:{line}:{column}: ")?,
            (Some(fragment), Some(line), None) => write!(f, "{fragment}:{line}: ")?,
            (Some(fragment), None, _) => write!(f, "{fragment}: ")?,
            _ => {}
        }
        f.write_str(&self.message)
    }
}

/// A list of diagnostics, rendered one per line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiagnosticList(pub Vec<Diagnostic>);

impl DiagnosticList {
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for DiagnosticList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.0.iter().enumerate() {
            if i != 0 {
                writeln!(f)?;
            }
            write!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}

impl From<Vec<Diagnostic>> for DiagnosticList {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self(diagnostics)
    }
}

impl IntoIterator for DiagnosticList {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// First line of each fragment within the combined translation unit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FragmentMap {
    defines_start: u32,
    source_start: u32,
}

impl FragmentMap {
    pub fn new(preamble: &str, defines: &str) -> Self {
        let defines_start = 1 + count_newlines(preamble);
        let source_start = defines_start + count_newlines(defines);
        Self {
            defines_start,
            source_start,
        }
    }

    /// Map a 1-based line of the combined unit to a fragment and a 1-based local line.
    ///
    /// A line shared by two fragments (a fragment without a trailing newline) belongs
    /// to the later one.
    pub fn locate(&self, line: u32) -> (Fragment, u32) {
        if line >= self.source_start {
            (Fragment::Source, line - self.source_start + 1)
        } else if line >= self.defines_start {
            (Fragment::Defines, line - self.defines_start + 1)
        } else {
            (Fragment::Preamble, line.max(1))
        }
    }
}

fn count_newlines(text: &str) -> u32 {
    text.bytes().filter(|&b| b == b'\n').count() as u32
}

const MARKERS: [(&str, Severity); 2] = [
    (": error: ", Severity::Error),
    (": warning: ", Severity::Warning),
];

/// Parse the front end's log into diagnostics.
///
/// Accepted lines look like `name:LINE: error: text` or `name: error: text`.
/// Messages beginning with `Linking` are attributed to [`Phase::Link`], everything else
/// to [`Phase::Parse`]. Summary lines such as `2 errors generated.` are dropped. If no
/// line could be parsed, the whole log becomes a single diagnostic of severity
/// `fallback`.
pub fn parse_messages(text: &str, fallback: Severity, fragments: &FragmentMap) -> Vec<Diagnostic> {
    let mut diagnostics = vec![];
    for line in text.lines() {
        let line = line.trim_end();
        let Some((location, severity, message)) = split_line(line) else {
            continue;
        };
        let phase = if message.starts_with("Linking") {
            Phase::Link
        } else {
            Phase::Parse
        };
        let mut diagnostic = Diagnostic::new(phase, severity, message);
        if let Some(number) = location.and_then(line_number) {
            let (fragment, local) = fragments.locate(number);
            diagnostic.fragment = Some(fragment);
            diagnostic.line = Some(local);
        }
        diagnostics.push(diagnostic);
    }
    if diagnostics.is_empty() && !text.trim().is_empty() {
        diagnostics.push(Diagnostic::new(Phase::Parse, fallback, text.trim()));
    }
    diagnostics
}

/// Lines of the front end's log that [`parse_messages`] does not turn into diagnostics,
/// other than the `N errors generated.` summaries.
pub fn unparsed_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .filter(|line| split_line(line).is_none() && !line.ends_with(" generated."))
        .collect()
}

fn split_line(line: &str) -> Option<(Option<&str>, Severity, &str)> {
    for (marker, severity) in MARKERS {
        if let Some(index) = line.find(marker) {
            let message = line[index + marker.len()..].trim();
            return Some((Some(&line[..index]), severity, message));
        }
        let bare = &marker[2..];
        if let Some(message) = line.strip_prefix(bare) {
            return Some((None, severity, message.trim()));
        }
    }
    None
}

// Parse from the right: source names may themselves contain `:`.
fn line_number(location: &str) -> Option<u32> {
    let (_, number) = location.rsplit_once(':')?;
    number.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> FragmentMap {
        // Three preamble lines, two define lines.
        FragmentMap::new(
            "#version 320 es\nprecision highp float;\nprecision highp int;\n",
            "#define A 1\n#define B 2\n",
        )
    }

    #[test]
    fn locate_fragments() {
        let map = map();
        assert_eq!(map.locate(1), (Fragment::Preamble, 1));
        assert_eq!(map.locate(3), (Fragment::Preamble, 3));
        assert_eq!(map.locate(4), (Fragment::Defines, 1));
        assert_eq!(map.locate(5), (Fragment::Defines, 2));
        assert_eq!(map.locate(6), (Fragment::Source, 1));
        assert_eq!(map.locate(10), (Fragment::Source, 5));
    }

    #[test]
    fn empty_defines_go_straight_to_source() {
        let map = FragmentMap::new("a\nb\nc\n", "");
        assert_eq!(map.locate(4), (Fragment::Source, 1));
        assert_eq!(map.locate(3), (Fragment::Preamble, 3));
    }

    #[test]
    fn unterminated_defines_share_a_line_with_source() {
        let map = FragmentMap::new("a\n", "#define X 1");
        assert_eq!(map.locate(2), (Fragment::Source, 1));
    }

    #[test]
    fn parse_error_lines() {
        let log = "broken.vert:6: error: '' :  syntax error, unexpected end of file\n\
                   1 error generated.\n";
        let diagnostics = parse_messages(log, Severity::Error, &map());
        assert_eq!(diagnostics.len(), 1);
        let d = &diagnostics[0];
        assert_eq!(d.phase, Phase::Parse);
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.fragment, Some(Fragment::Source));
        assert_eq!(d.line, Some(1));
        assert!(d.message.contains("syntax error"));
    }

    #[test]
    fn link_errors_have_no_location() {
        let log = "empty.geom: error: Linking geometry stage: At least one shader must specify an input layout primitive";
        let diagnostics = parse_messages(log, Severity::Error, &map());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].phase, Phase::Link);
        assert_eq!(diagnostics[0].fragment, None);
        assert_eq!(diagnostics[0].line, None);
    }

    #[test]
    fn names_with_colons() {
        let log = r"C:\shaders\a.frag:4: warning: something odd";
        let diagnostics = parse_messages(log, Severity::Error, &map());
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert_eq!(diagnostics[0].fragment, Some(Fragment::Defines));
        assert_eq!(diagnostics[0].line, Some(1));
    }

    #[test]
    fn unparseable_log_is_kept() {
        let diagnostics = parse_messages("internal failure\n", Severity::Error, &map());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "internal failure");
        assert!(parse_messages("  \n", Severity::Error, &map()).is_empty());
    }

    #[test]
    fn render_list() {
        let list = DiagnosticList(vec![
            Diagnostic {
                fragment: Some(Fragment::Source),
                line: Some(2),
                ..Diagnostic::new(Phase::Parse, Severity::Error, "bad token")
            },
            Diagnostic::new(Phase::Link, Severity::Error, "Linking vertex stage: no main"),
        ]);
        assert_eq!(
            list.to_string(),
            "parse error: source:2: bad token\nlink error: Linking vertex stage: no main"
        );
    }

    #[test]
    fn unparsed_lines_are_reported() {
        let log = "a.frag:4: error: 'x' : undeclared identifier\n\
                   glslang internal failure\n\
                   \n\
                   1 error generated.\n";
        assert_eq!(unparsed_lines(log), ["glslang internal failure"]);
        assert!(unparsed_lines("a.frag:4: warning: unused\n1 warning generated.\n").is_empty());
    }
}
