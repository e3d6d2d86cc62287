//! Buffered byte cursor
//!
//! Wraps a raw reader in a hold-back buffer offering non-destructive
//! lookahead (`peek`) next to consuming reads (`consume`, `read_line`).
//! The separator heuristic needs to look past the line it is judging
//! without moving the cursor, which `std::io::BufReader` cannot promise
//! for an arbitrary window size.

use std::io::{self, Read};

const READ_CHUNK: usize = 8 * 1024;

/// One physical line, or a chunk of one when it exceeds the line cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Line {
    /// Line content without its terminator
    pub bytes: Vec<u8>,
    /// The physical line continues past this chunk
    pub partial: bool,
}

impl Line {
    pub fn is_blank(&self) -> bool {
        self.bytes.is_empty() && !self.partial
    }
}

pub(crate) struct LineSource<R> {
    inner: R,
    buf: Vec<u8>,
    pos: usize,
    eof: bool,
    max_line_length: usize,
}

impl<R: Read> LineSource<R> {
    pub fn new(inner: R, max_line_length: usize) -> Self {
        Self {
            inner,
            buf: Vec::with_capacity(READ_CHUNK),
            pos: 0,
            eof: false,
            max_line_length,
        }
    }

    fn buffered(&self) -> &[u8] {
        &self.buf[self.pos..]
    }

    /// Reads until at least `want` bytes are buffered or the input ends.
    ///
    /// On error the buffer is left exactly as it was, so nothing is lost
    /// and a later call resumes at the same position.
    fn fill_to(&mut self, want: usize) -> io::Result<()> {
        if self.buffered().len() >= want {
            return Ok(());
        }

        if self.pos > 0 {
            self.buf.drain(..self.pos);
            self.pos = 0;
        }

        while self.buf.len() < want && !self.eof {
            let start = self.buf.len();
            self.buf.resize(start + READ_CHUNK.max(want - start), 0);

            match self.inner.read(&mut self.buf[start..]) {
                Ok(0) => {
                    self.buf.truncate(start);
                    self.eof = true;
                }
                Ok(n) => self.buf.truncate(start + n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => self.buf.truncate(start),
                Err(e) => {
                    self.buf.truncate(start);
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    /// Returns up to `n` upcoming bytes without consuming them. Fewer bytes
    /// are returned only when the input ends first.
    pub fn peek(&mut self, n: usize) -> io::Result<&[u8]> {
        self.fill_to(n)?;
        let available = self.buffered();
        Ok(&available[..n.min(available.len())])
    }

    /// Advances the cursor by `n` bytes, bounded by what is buffered.
    pub fn consume(&mut self, n: usize) {
        let available = self.buf.len() - self.pos;
        self.pos += n.min(available);
    }

    /// Reads one physical line, stripping `\n` or `\r\n`.
    ///
    /// A line without a newline inside the first `max_line_length` bytes is
    /// returned as a partial chunk; the following calls return the rest of
    /// it. `Ok(None)` means the input ended cleanly.
    pub fn read_line(&mut self) -> io::Result<Option<Line>> {
        let mut scanned = 0;

        loop {
            let available = self.buffered();
            let window = available.len().min(self.max_line_length);

            if let Some(i) = available[scanned..window].iter().position(|&b| b == b'\n') {
                let end = scanned + i;
                let content = &available[..end];
                let content = content.strip_suffix(b"\r").unwrap_or(content);
                let line = Line {
                    bytes: content.to_vec(),
                    partial: false,
                };
                self.consume(end + 1);
                return Ok(Some(line));
            }

            if window == self.max_line_length {
                // Never split a "\r\n" pair across two chunks.
                let mut take = window;
                if take > 1 && available[take - 1] == b'\r' {
                    take -= 1;
                }
                let line = Line {
                    bytes: available[..take].to_vec(),
                    partial: true,
                };
                self.consume(take);
                return Ok(Some(line));
            }

            if self.eof {
                if available.is_empty() {
                    return Ok(None);
                }
                let line = Line {
                    bytes: available.to_vec(),
                    partial: false,
                };
                let len = line.bytes.len();
                self.consume(len);
                return Ok(Some(line));
            }

            scanned = window;
            let want = available.len() + 1;
            self.fill_to(want)?;
        }
    }

    /// Discards the remainder of a line whose first chunk was partial.
    pub fn skip_line(&mut self) -> io::Result<()> {
        while let Some(line) = self.read_line()? {
            if !line.partial {
                break;
            }
        }
        Ok(())
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}
