//! Literal/regex search over a candidate line range.

use regex::RegexBuilder;

use crate::bitset::AppendOnlyBitSet;
use crate::error::{CoreError, CoreResult};
use crate::files::{FileParser, SeekableRead};
use crate::hist::Hist;
use crate::line_parser::{message_column_index, ColumnFormat, ILineParser};

/// Compiles the search pattern once, honoring the {literal, case-sensitive,
/// unicode-aware} flags, and matches it against each candidate line's text.
pub struct Searcher {
    re: regex::Regex,
}

impl Searcher {
    pub fn compile(text: &str, is_regex: bool, case_sensitive: bool, unicode_aware: bool) -> CoreResult<Self> {
        let pattern = if is_regex { text.to_string() } else { regex::escape(text) };
        let re = RegexBuilder::new(&pattern)
            .case_insensitive(!case_sensitive)
            .unicode(unicode_aware)
            .build()
            .map_err(|source| CoreError::RegexSyntax {
                parser: "search".to_string(),
                source,
            })?;
        Ok(Self { re })
    }

    /// Returns `(start, length)` of the first match at or after `from`, if any.
    pub fn search(&self, haystack: &str, from: usize) -> Option<(usize, usize)> {
        let from = haystack
            .char_indices()
            .map(|(i, _)| i)
            .find(|&i| i >= from)
            .unwrap_or(haystack.len());
        self.re
            .find_at(haystack, from)
            .map(|m| (m.start(), m.end() - m.start()))
    }
}

/// Run a search over `candidates` (ascending line numbers), returning the new
/// `LineMap` bitset, or `None` if cancelled before completion.
#[allow(clippy::too_many_arguments)]
pub fn run<R: SeekableRead>(
    file: &mut FileParser<R>,
    parser: &dyn ILineParser,
    formats: &[ColumnFormat],
    candidates: impl Iterator<Item = u64>,
    searcher: &Searcher,
    message_only: bool,
    hist: &Hist,
    total: usize,
    stop_requested: &dyn Fn() -> bool,
    mut progress: impl FnMut(usize, usize),
) -> CoreResult<Option<AppendOnlyBitSet>> {
    let mut result = AppendOnlyBitSet::new();
    let message_column = message_column_index(formats);
    let mut ctx = parser.create_context();
    let mut cols = Vec::new();
    let mut done = 0usize;

    for n in candidates {
        if stop_requested() {
            return Ok(None);
        }
        let line = file.read_line_string(n as usize)?;
        let haystack = if message_only {
            if parser.parse_line(&line, &mut cols, &mut *ctx) {
                message_column.and_then(|i| cols.get(i).cloned()).unwrap_or(line)
            } else {
                line
            }
        } else {
            line
        };

        if searcher.search(&haystack, 0).is_some() {
            result.add(n);
            hist.add(n as usize, total);
        }
        done += 1;
        progress(done, total);
    }

    Ok(Some(result))
}
