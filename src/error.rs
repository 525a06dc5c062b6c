//! Error taxonomy for loading FTL documents.
//!
//! Both variants are fatal: a document that fails to parse or validate is
//! rejected outright and playback never starts.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FtlError {
    /// The text is not a well-formed nested list expression.
    #[error("malformed document at {line}:{column}: {reason}")]
    MalformedDocument {
        line: usize,
        column: usize,
        reason: String,
    },

    /// The text parsed, but does not follow the `(ftl (frame N (bullet ...)))` layout.
    #[error("invalid document shape at {location}: {reason}")]
    InvalidDocumentShape { location: String, reason: String },
}

impl FtlError {
    pub(crate) fn malformed(source: &str, offset: usize, reason: impl Into<String>) -> Self {
        let (line, column) = line_column(source, offset);
        FtlError::MalformedDocument {
            line,
            column,
            reason: reason.into(),
        }
    }

    pub(crate) fn shape(location: impl Into<String>, reason: impl Into<String>) -> Self {
        FtlError::InvalidDocumentShape {
            location: location.into(),
            reason: reason.into(),
        }
    }
}

/// 1-based line and column of a byte offset.
fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let column = match before.rfind('\n') {
        Some(nl) => before[nl + 1..].chars().count() + 1,
        None => before.chars().count() + 1,
    };
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_map_to_line_and_column() {
        let src = "(ftl\n  (frame 0)\n";
        assert_eq!(line_column(src, 0), (1, 1));
        assert_eq!(line_column(src, 7), (2, 3));
        assert_eq!(line_column(src, src.len()), (3, 1));
    }
}
