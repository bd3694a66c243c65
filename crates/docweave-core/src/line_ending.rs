//! Line-ending detection and normalization for inserted text.

use serde::{Deserialize, Serialize};

/// Predominant line terminator of a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineEndingStyle {
    /// Only `\n`.
    Lf,
    /// Only `\r\n`.
    CrLf,
    /// Both kinds present.
    Mixed,
    /// No line terminators at all.
    None,
}

impl LineEndingStyle {
    /// Classify `text` by counting lone LF and CRLF terminators.
    pub fn detect(text: &str) -> Self {
        let mut lf = 0usize;
        let mut crlf = 0usize;
        let bytes = text.as_bytes();

        for (i, &byte) in bytes.iter().enumerate() {
            if byte == b'\n' {
                if i > 0 && bytes[i - 1] == b'\r' {
                    crlf += 1;
                } else {
                    lf += 1;
                }
            }
        }

        match (lf, crlf) {
            (0, 0) => LineEndingStyle::None,
            (_, 0) => LineEndingStyle::Lf,
            (0, _) => LineEndingStyle::CrLf,
            _ => LineEndingStyle::Mixed,
        }
    }

    /// Terminator to use for new lines, if the style settles on one.
    pub fn terminator(&self) -> Option<&'static str> {
        match self {
            LineEndingStyle::Lf => Some("\n"),
            LineEndingStyle::CrLf => Some("\r\n"),
            LineEndingStyle::Mixed | LineEndingStyle::None => None,
        }
    }

    /// Rewrite the terminators of `text` to this style.
    ///
    /// `Mixed` and `None` leave the text untouched.
    pub fn normalize(&self, text: &str) -> String {
        match self.terminator() {
            Some("\n") => text.replace("\r\n", "\n"),
            Some(terminator) => text.replace("\r\n", "\n").replace('\n', terminator),
            None => text.to_string(),
        }
    }
}
