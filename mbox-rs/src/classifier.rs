//! Separator heuristic
//!
//! A line starting with `From ` is either the start of a new message or an
//! unescaped body line. It counts as a separator only when the bytes after
//! it look like a header block: at least `min_header_lines` header-shaped
//! lines before the first blank line.

use crate::config::{DEFAULT_LOOKAHEAD, DEFAULT_MIN_HEADER_LINES};
use crate::source::LineSource;
use regex::bytes::Regex;
use std::io::{self, Read};
use std::sync::LazyLock;

const SEPARATOR_PREFIX: &[u8] = b"From ";

/// Generic header shape: alphanumeric name, optionally hyphen-segmented,
/// optional whitespace, then a colon. Vertical tab is not whitespace here.
static HEADER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u)^[a-zA-Z0-9]+(-[a-zA-Z0-9]+)*[\t\n\x0C\r ]*:").expect("header pattern is valid")
});

/// Trims ASCII whitespace including vertical tab, which `trim_ascii` keeps.
fn trim_space(bytes: &[u8]) -> &[u8] {
    let is_space = |b: &u8| matches!(b, b'\t' | b'\n' | b'\x0B' | b'\x0C' | b'\r' | b' ');
    let start = bytes.iter().position(|b| !is_space(b)).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| !is_space(b)).map_or(start, |i| i + 1);
    &bytes[start..end]
}

#[derive(Debug, Clone)]
pub struct SeparatorClassifier {
    lookahead: usize,
    min_header_lines: usize,
}

impl Default for SeparatorClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKAHEAD, DEFAULT_MIN_HEADER_LINES)
    }
}

impl SeparatorClassifier {
    pub fn new(lookahead: usize, min_header_lines: usize) -> Self {
        Self {
            lookahead,
            min_header_lines,
        }
    }

    /// Size of the peek window taken after a candidate line.
    pub fn lookahead(&self) -> usize {
        self.lookahead
    }

    /// Decides whether `line` is a message boundary given the bytes that
    /// follow it.
    ///
    /// When the window ends before a blank line the header lines seen so
    /// far decide, so a very large header block can be under-counted.
    pub fn is_separator(&self, line: &[u8], lookahead: &[u8]) -> bool {
        if !line.starts_with(SEPARATOR_PREFIX) {
            return false;
        }

        let window = trim_space(lookahead);
        if window.is_empty() {
            return false;
        }

        let mut header_lines = 0;
        // Splitting on '\n' and trimming folds CRLF and LF endings together.
        for candidate in window.split(|&b| b == b'\n').map(trim_space) {
            if candidate.is_empty() {
                return header_lines >= self.min_header_lines;
            }
            if HEADER_LINE.is_match(candidate) {
                header_lines += 1;
            }
        }

        header_lines >= self.min_header_lines
    }

    /// Classifies `line`, which has just been read from `source`, by peeking
    /// at what follows it. The cursor is not moved.
    pub(crate) fn classify<R: Read>(
        &self,
        line: &[u8],
        source: &mut LineSource<R>,
    ) -> io::Result<bool> {
        if !line.starts_with(SEPARATOR_PREFIX) {
            return Ok(false);
        }

        let lookahead = source.peek(self.lookahead)?;
        Ok(self.is_separator(line, lookahead))
    }
}
