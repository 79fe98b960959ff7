//! Error kinds the core signals to its callers.
//!
//! Per-line parse failures are *not* represented here: a parser that fails
//! on a line reports it as a multi-line continuation (see `index::parallel`),
//! not as a `CoreError`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("parser config is not valid JSON: {0}")]
    ConfigSyntax(#[from] serde_json::Error),

    #[error("parser config names both a literal 'magic' detector and a scripted 'detector': {parser}")]
    ConflictingDetectors { parser: String },

    #[error("column `{column}` references capture group {group}, but the regex only has {available} groups")]
    ColumnMisreference {
        parser: String,
        column: String,
        group: usize,
        available: usize,
    },

    #[error("regex syntax error in parser `{parser}`: {source}")]
    RegexSyntax {
        parser: String,
        #[source]
        source: regex::Error,
    },

    #[error("operation was cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;
