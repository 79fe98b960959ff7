//! A non-blocking, seekable reader for stdin/pipes. Supports `FileParser`'s
//! `Seek` requirement over an unbounded stream by spooling everything ever
//! read from the pipe into memory.
//!
//! Random seeks are supported by keeping a copy of all data received so
//! far. This is wasteful compared to a real file, but the only portable
//! way to give stdin the same random-access contract as a file.

use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::thread;

const QUEUE_SIZE: usize = 256;
const READ_AHEAD: usize = 10 * 1024;

pub struct CachedStreamReader {
    buffer: Vec<u8>,
    rx: Option<Receiver<Vec<u8>>>,
    pos: u64,
}

impl CachedStreamReader {
    pub fn new(pipe: Option<PathBuf>) -> std::io::Result<Self> {
        let source: Box<dyn Read + Send> = match pipe {
            Some(path) => Box::new(std::fs::File::open(path)?),
            None => Box::new(std::io::stdin()),
        };
        Ok(Self {
            buffer: Vec::new(),
            rx: Some(Self::spawn_reader(source)),
            pos: 0,
        })
    }

    pub fn is_open(&self) -> bool {
        self.rx.is_some()
    }

    fn fill_buffer(&mut self, up_to: usize) {
        if up_to + READ_AHEAD <= self.buffer.len() {
            return;
        }
        if let Some(rx) = &self.rx {
            loop {
                match rx.try_recv() {
                    Ok(mut chunk) => self.buffer.append(&mut chunk),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        self.rx = None;
                        break;
                    }
                }
            }
        }
    }

    /// Block until at least one more chunk arrives (or the stream closes).
    /// Returns whether the stream is still open.
    pub fn wait(&mut self) -> bool {
        if let Some(rx) = &self.rx {
            match rx.recv() {
                Ok(mut chunk) => self.buffer.append(&mut chunk),
                Err(_) => self.rx = None,
            }
        }
        self.rx.is_some()
    }

    fn spawn_reader(mut source: Box<dyn Read + Send>) -> Receiver<Vec<u8>> {
        let (tx, rx) = mpsc::sync_channel::<Vec<u8>>(QUEUE_SIZE);
        thread::spawn(move || {
            let mut buf = [0u8; 8192];
            loop {
                match source.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        });
        rx
    }
}

impl Read for CachedStreamReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let start = self.pos as usize;
        self.fill_buffer(start + buf.len());
        let len = buf.len().min(self.buffer.len().saturating_sub(start));
        if len > 0 {
            buf[..len].copy_from_slice(&self.buffer[start..start + len]);
            self.pos += len as u64;
        }
        Ok(len)
    }
}

impl Seek for CachedStreamReader {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        let (base, offset) = match pos {
            SeekFrom::Start(n) => (0i64, n as i64),
            SeekFrom::Current(n) => (self.pos as i64, n),
            SeekFrom::End(n) => (self.buffer.len() as i64, n),
        };
        self.pos = (base.saturating_add(offset).max(0) as u64).min(self.buffer.len() as u64);
        Ok(self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_from_file_as_pipe() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "line one").unwrap();
        writeln!(tmp, "line two").unwrap();
        let path = tmp.path().to_path_buf();
        let mut reader = CachedStreamReader::new(Some(path)).unwrap();
        while reader.wait() {}
        let mut out = Vec::new();
        reader.seek(SeekFrom::Start(0)).unwrap();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"line one\nline two\n");
    }
}
