pub mod cached_stream_reader;
pub mod encoding;
pub mod file_parser;

pub use cached_stream_reader::CachedStreamReader;
pub use encoding::Encoding;
pub use file_parser::{open_text_file, FileParser, SeekableRead};

use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

/// A log byte source: a plain file, stdin/a pipe, or a decompressed copy of
/// either held in memory. Grouped behind one type so `FileParser` stays
/// generic over a single concrete reader per instance while callers still
/// get to open "whatever the user pointed us at" uniformly.
pub enum LogSource {
    File(std::fs::File),
    Pipe(CachedStreamReader),
    InMemory(Cursor<Vec<u8>>),
}

impl Read for LogSource {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            LogSource::File(f) => f.read(buf),
            LogSource::Pipe(p) => p.read(buf),
            LogSource::InMemory(c) => c.read(buf),
        }
    }
}

impl std::io::Seek for LogSource {
    fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
        match self {
            LogSource::File(f) => f.seek(pos),
            LogSource::Pipe(p) => p.seek(pos),
            LogSource::InMemory(c) => c.seek(pos),
        }
    }
}

impl SeekableRead for LogSource {
    fn grow(&mut self) -> std::io::Result<bool> {
        match self {
            LogSource::Pipe(p) => Ok(p.wait()),
            LogSource::File(_) | LogSource::InMemory(_) => Ok(false),
        }
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "gz")
}

fn is_zstd(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "zst")
}

/// Open a path as a `LogSource`, transparently decompressing `.gz`/`.zst`
/// files into memory first. Plain files are opened directly and indexed by
/// seeking the real file descriptor, which is the common case and avoids
/// the memory cost. `None` reads from stdin/a pipe. Shared by `new_text_file`
/// and by `LogFile::open`/`reload`, which need the raw source rather than
/// one already wrapped in a `FileParser`.
pub fn open_log_source(path: Option<&PathBuf>) -> std::io::Result<LogSource> {
    Ok(match path {
        None => LogSource::Pipe(CachedStreamReader::new(None)?),
        Some(path) if is_gzip(path) => {
            let file = std::fs::File::open(path)?;
            let mut decoder = flate2::read::GzDecoder::new(file);
            let mut buf = Vec::new();
            decoder.read_to_end(&mut buf)?;
            LogSource::InMemory(Cursor::new(buf))
        }
        Some(path) if is_zstd(path) => {
            let file = std::fs::File::open(path)?;
            let mut decoder = ruzstd::StreamingDecoder::new(file)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            let mut buf = Vec::new();
            decoder.read_to_end(&mut buf)?;
            LogSource::InMemory(Cursor::new(buf))
        }
        Some(path) => LogSource::File(std::fs::File::open(path)?),
    })
}

/// Open a path as a `FileParser` directly, for callers that only need
/// random-access line reads (`cat`/`tail`/`tac`-style tools) rather than the
/// full `LogFile` session/indexing machinery.
pub fn new_text_file(path: Option<&PathBuf>) -> std::io::Result<FileParser<LogSource>> {
    FileParser::new(open_log_source(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_plain_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        use std::io::Write;
        writeln!(tmp, "hello").unwrap();
        let path = tmp.path().to_path_buf();
        let mut parser = new_text_file(Some(&path)).unwrap();
        assert!(parser.index(|_, _| {}, || false).unwrap());
        assert_eq!(parser.line_count(), 1);
    }
}
