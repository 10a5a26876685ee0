use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Fatal errors
// ---------------------------------------------------------------------------

/// File-level failures. Anything row- or entry-scoped is a [`Diagnostic`]
/// instead and never aborts a parse.
#[derive(Debug, thiserror::Error)]
pub enum SipError {
    #[error("Don't know how to read {path}: first line {first_line:?} matches no known SIP dialect")]
    UnsupportedFormat { path: PathBuf, first_line: String },

    #[error("Could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Export to {path} failed: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

impl SipError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SipError::Io {
            path: path.into(),
            source,
        }
    }
}

// ---------------------------------------------------------------------------
// Recoverable conditions collected during a parse
// ---------------------------------------------------------------------------

/// A non-fatal problem found while parsing. The offending row or entry is
/// skipped and parsing continues.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Diagnostic {
    #[error("line {line}: dropped record ({reason})")]
    MalformedRecord { line: usize, reason: String },

    #[error("line {line}: header entry [{token}] has non-numeric value {value:?}")]
    HeaderParse {
        line: usize,
        token: String,
        value: String,
    },

    #[error("no line containing {marker:?} found")]
    MissingSection { marker: &'static str },
}

impl Diagnostic {
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Diagnostic::MalformedRecord {
            line,
            reason: reason.into(),
        }
    }

    /// Line number (1-based) the diagnostic refers to, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            Diagnostic::MalformedRecord { line, .. } | Diagnostic::HeaderParse { line, .. } => {
                Some(*line)
            }
            Diagnostic::MissingSection { .. } => None,
        }
    }
}
