//! Turning a raw line into named columns.

pub mod default_parser;
pub mod regex_parser;
pub mod repository;

pub use default_parser::DefaultParser;
pub use regex_parser::RegexParser;
pub use repository::Repository;

/// Column metadata, stable for the lifetime of a parser instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFormat {
    pub name: String,
    pub indexed: bool,
    pub autosize: bool,
    /// Regex capture group this column is drawn from (0 for parsers that
    /// don't use capture groups, e.g. the default passthrough parser).
    pub group: usize,
}

/// Per-thread scratch state a parser may mutate while parsing, also known
/// as the "parser context"; concrete parsers hold whatever they
/// need here, e.g. a reusable regex capture-locations buffer.
pub trait ParserContext: Send {
    fn as_any(&mut self) -> &mut dyn std::any::Any;
}

/// Closed capability set every line parser implements. User-extensible
/// (regex configs loaded at runtime), so this stays a trait object rather
/// than a tagged enum — unlike `bitset::BitSet`'s two fixed variants.
pub trait ILineParser: Send + Sync {
    /// Parse `line` into `columns`, one entry per `column_formats()`.
    /// Returns false if the line doesn't match this parser's shape; the
    /// caller treats that as a multi-line continuation, not an error.
    fn parse_line(&self, line: &str, columns: &mut Vec<String>, ctx: &mut dyn ParserContext) -> bool;

    fn column_formats(&self) -> &[ColumnFormat];

    /// Classifier used by the repository to auto-detect a parser for a
    /// freshly opened file from its first few sample lines.
    fn is_match(&self, sample_lines: &[String], file_name: Option<&str>) -> bool;

    fn name(&self) -> &str;

    /// Optional foreground color for a row, given its parsed columns.
    fn rgb(&self, _columns: &[String]) -> Option<u32> {
        None
    }

    fn create_context(&self) -> Box<dyn ParserContext>;
}

pub(crate) fn message_column_index(formats: &[ColumnFormat]) -> Option<usize> {
    formats
        .iter()
        .rposition(|c| c.name.eq_ignore_ascii_case("message"))
        .or(if formats.is_empty() { None } else { Some(formats.len() - 1) })
}
