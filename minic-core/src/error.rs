use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors of a single compilation. The first one raised stops the
/// pipeline; nothing is rendered or generated after it.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("lex error at {line}:{column}: {message}")]
    LexError {
        line: usize,
        column: usize,
        message: String,
    },
    #[error("syntax error at {line}:{column}: {message}")]
    SyntaxError {
        line: usize,
        column: usize,
        message: String,
    },
    #[error("variable '{0}' is already declared")]
    DuplicateDeclaration(String),
    #[error("variable '{0}' used but not declared")]
    UndeclaredVariable(String),
    /// The io error is part of the message, not a chained source.
    #[error("cannot access {path}: {reason}")]
    ResourceError {
        path: PathBuf,
        reason: std::io::Error,
    },
}

impl CoreError {
    pub fn resource(path: impl Into<PathBuf>, reason: std::io::Error) -> Self {
        CoreError::ResourceError {
            path: path.into(),
            reason,
        }
    }
}

/// Translate a byte offset into a 1-based `(line, column)` pair.
pub fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;
    for (index, ch) in source.char_indices() {
        if index >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}
