//! Maps a seekable byte stream to a random-access index of logical lines
//!.

use std::io::{Read, Seek, SeekFrom};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{CoreError, CoreResult};
use crate::offset_index::OffsetIndex;

use super::encoding::{detect_bom, Encoding};

/// Sparsity of the `OffsetIndex`: we store every 32nd line's byte offset
/// and re-scan forward for the rest.
const DEFAULT_DELTA: usize = 32;

pub trait SeekableRead: Read + Seek + Send {
    /// Pull in more data from an unbounded source (a pipe/stdin) if any is
    /// still forthcoming. Returns whether the source might still grow.
    /// Plain seekable files and in-memory buffers are already complete, so
    /// the default does nothing.
    fn grow(&mut self) -> std::io::Result<bool> {
        Ok(false)
    }
}

impl SeekableRead for std::fs::File {}
impl SeekableRead for std::io::Cursor<Vec<u8>> {}

struct Trailing {
    has_terminator: bool,
    len: usize,
}

pub struct FileParser<R> {
    reader: Arc<Mutex<R>>,
    encoding: Encoding,
    base_offset: usize,
    file_size: usize,
    offset_index: OffsetIndex,
    trailing: Option<Trailing>,
}

/// Scan forward from `from` looking for the next line terminator.
/// Returns `(next_line_offset, line_end_for_decode)` on success, or `None`
/// at end-of-stream with no terminator found.
fn find_newline_from<R: Read + Seek>(
    reader: &mut R,
    encoding: Encoding,
    base_offset: usize,
    from: usize,
) -> std::io::Result<Option<(usize, usize)>> {
    let char_width = encoding.char_width();
    let low = match encoding {
        Encoding::Utf16Be | Encoding::Utf32Be => char_width - 1,
        _ => 0,
    };
    reader.seek(SeekFrom::Start(from as u64))?;
    let mut buf = [0u8; 8192];
    let mut pos = from;
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            return Ok(None);
        }
        for (i, &b) in buf[..n].iter().enumerate() {
            let abs = pos + i;
            if b == b'\n' && (abs - base_offset) % char_width == low {
                let right_pad = encoding.eol_right_padding();
                let left_pad = encoding.eol_left_padding();
                let next = abs + 1 + right_pad;
                let line_end = abs - left_pad;
                return Ok(Some((next, line_end)));
            }
        }
        pos += n;
    }
}

impl<R: SeekableRead> FileParser<R> {
    pub fn new(mut reader: R) -> std::io::Result<Self> {
        // Drain an unbounded source (a pipe/stdin) completely before
        // treating it as a fixed-size byte range; otherwise `file_size`
        // below would freeze at whatever happened to have arrived yet.
        while reader.grow()? {}
        let file_size = reader.seek(SeekFrom::End(0))? as usize;
        reader.seek(SeekFrom::Start(0))?;
        let mut probe = [0u8; 4];
        let probe_len = {
            let mut total = 0;
            while total < probe.len() {
                let n = reader.read(&mut probe[total..])?;
                if n == 0 {
                    break;
                }
                total += n;
            }
            total
        };
        let (encoding, bom_len) = detect_bom(&probe[..probe_len]);
        let base_offset = bom_len;
        reader.seek(SeekFrom::Start(base_offset as u64))?;

        Ok(Self {
            reader: Arc::new(Mutex::new(reader)),
            encoding,
            base_offset,
            file_size,
            offset_index: OffsetIndex::new(),
            trailing: None,
        })
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn file_size(&self) -> usize {
        self.file_size
    }

    pub fn line_count(&self) -> usize {
        self.offset_index.size().saturating_sub(1)
    }

    /// Build the offset index: one entry per line, ending with a sentinel
    /// at end-of-file so `line_count()` drops it back out.
    pub fn index(
        &mut self,
        mut progress: impl FnMut(usize, usize),
        stop_requested: impl Fn() -> bool,
    ) -> CoreResult<bool> {
        log::trace!("FileParser::index starting, encoding {:?}, size {}", self.encoding, self.file_size);
        let encoding = self.encoding;
        let base_offset = self.base_offset;
        let reader_for_next = Arc::clone(&self.reader);
        self.offset_index.reset(
            DEFAULT_DELTA,
            Box::new(move |from: usize| -> std::io::Result<usize> {
                let mut guard = reader_for_next.lock();
                match find_newline_from(&mut *guard, encoding, base_offset, from)? {
                    Some((next, _)) => Ok(next),
                    None => Ok(from),
                }
            }),
        );

        let mut offset = base_offset;
        let mut stopped = false;
        while offset < self.file_size {
            if stop_requested() {
                stopped = true;
                break;
            }
            self.offset_index.add(offset);
            let scan = {
                let mut guard = self.reader.lock();
                find_newline_from(&mut *guard, encoding, base_offset, offset)?
            };
            match scan {
                Some((next, _line_end)) => {
                    progress(next, self.file_size);
                    offset = next;
                }
                None => {
                    self.trailing = Some(Trailing {
                        has_terminator: false,
                        len: self.file_size - offset,
                    });
                    break;
                }
            }
        }
        if stopped {
            return Ok(false);
        }
        self.offset_index.add(self.file_size);
        Ok(true)
    }

    /// Read logical line `i` into `out`, converting to UTF-8 and trimming
    /// any encoding-specific padding and, for a terminator-less last line,
    /// any trailing NUL run.
    pub fn read_line(&mut self, i: usize, out: &mut String) -> CoreResult<()> {
        assert!(i < self.line_count(), "FileParser::read_line index out of range");
        let start = self.offset_index.map(i)?;
        let is_last = i + 1 == self.line_count();

        let mut guard = self.reader.lock();
        let raw_end = if is_last && self.trailing.as_ref().is_some_and(|t| !t.has_terminator) {
            self.file_size
        } else {
            match find_newline_from(&mut *guard, self.encoding, self.base_offset, start)? {
                Some((_, line_end)) => line_end,
                None => self.file_size,
            }
        };

        guard.seek(SeekFrom::Start(start as u64))?;
        let mut buf = vec![0u8; raw_end.saturating_sub(start)];
        guard.read_exact(&mut buf)?;
        drop(guard);

        let mut decoded = self.encoding.decode(&buf);
        if is_last && self.trailing.as_ref().is_some_and(|t| !t.has_terminator) {
            while decoded.ends_with('\0') {
                decoded.pop();
            }
        }
        out.clear();
        out.push_str(&decoded);
        Ok(())
    }

    pub fn read_line_string(&mut self, i: usize) -> CoreResult<String> {
        let mut out = String::new();
        self.read_line(i, &mut out)?;
        Ok(out)
    }
}

impl<R: SeekableRead> std::fmt::Debug for FileParser<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileParser")
            .field("encoding", &self.encoding)
            .field("file_size", &self.file_size)
            .field("line_count", &self.line_count())
            .finish()
    }
}

pub fn open_text_file(path: &std::path::Path) -> std::io::Result<FileParser<std::fs::File>> {
    let file = std::fs::File::open(path)?;
    FileParser::new(file)
}

impl From<CoreError> for std::io::Error {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Io(io) => io,
            other => std::io::Error::new(std::io::ErrorKind::Other, other.to_string()),
        }
    }
}
