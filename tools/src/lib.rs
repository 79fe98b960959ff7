//! Command implementations shared by the `tools`, `tail` and `cat`/`tac`
//! demonstrator binaries: plain line dumps on top of `indexed_file`'s
//! `FileParser`, without the column index or `LogFile` session machinery.

pub mod cat;

pub use cat::{cat_cmd, tac_cmd, tail_cmd};
