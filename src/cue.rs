//! The normalised subtitle representation shared by every parser and writer.

use std::fmt::Display;

/// A single subtitle entry.
///
/// Timestamps are kept in SRT form (`HH:MM:SS,mmm`). Text is always a single
/// line. The index keeps the digits it was read with, so `007` stays `007`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    pub index: String,
    pub start: String,
    pub end: String,
    pub text: String,
}

impl Cue {
    pub fn new(
        index: impl ToString,
        start: impl Into<String>,
        end: impl Into<String>,
        text: impl AsRef<str>,
    ) -> Self {
        Self {
            index: index.to_string(),
            start: start.into(),
            end: end.into(),
            text: single_line(text.as_ref()),
        }
    }
}

/// Joins the lines of `s` with single spaces.
pub(crate) fn single_line(s: &str) -> String {
    if !s.contains(['\n', '\r']) {
        return s.to_owned();
    }
    s.split("\r\n")
        .flat_map(|s| s.split(['\n', '\r']))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Returns `true` for a run of ASCII digits that isn't all zeros.
///
/// There is no upper bound since the index is never used as a number.
pub(crate) fn is_positive_index(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) && s.bytes().any(|b| b != b'0')
}

/// A recoverable anomaly found while parsing.
///
/// The offending line or row is skipped and parsing continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// 1-based line (or spreadsheet row) number.
    pub line: usize,
    pub content: String,
    pub reason: String,
}

impl Warning {
    pub(crate) fn new(line: usize, content: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            line,
            content: content.into(),
            reason: reason.into(),
        }
    }
}

impl Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {} (skipped `{}`)", self.line, self.reason, self.content)
    }
}

/// The output of a parser: the cues in source order plus anything that was skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parsed {
    pub cues: Vec<Cue>,
    pub warnings: Vec<Warning>,
}

impl Parsed {
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }
}
