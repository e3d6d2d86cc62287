//! Per-message reader
//!
//! Reassembles the lines of one message from the shared archive cursor,
//! normalizes terminators to CRLF and stops at the next separator line.

use crate::classifier::SeparatorClassifier;
use crate::source::{Line, LineSource};
use std::io::{self, BufRead, Read};
use tracing::trace;

const CRLF: &[u8] = b"\r\n";

/// Where the message reader stands between two output chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    /// Next step reads a fresh line (or the rest of an oversized one)
    AwaitingLine,
    /// A blank line was read but not emitted yet; it is dropped if the
    /// next line is a separator or the input ends
    PeekedOneBlank,
    /// A separator line ended the message
    AtSeparator,
    /// The input ended
    Done,
}

/// Reader state kept by the archive so that an unread message can still be
/// drained after its `MessageReader` is gone.
#[derive(Debug)]
pub(crate) struct MessageState {
    phase: Phase,
    pending: Vec<u8>,
    offset: usize,
    mid_line: bool,
    /// Line taken from the source whose classification has not finished
    held: Option<Line>,
    /// The separator line continues past the chunk that was judged
    separator_tail: bool,
}

impl MessageState {
    pub fn new() -> Self {
        Self {
            phase: Phase::AwaitingLine,
            pending: Vec::new(),
            offset: 0,
            mid_line: false,
            held: None,
            separator_tail: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::AtSeparator | Phase::Done) && !self.has_pending()
    }

    fn has_pending(&self) -> bool {
        self.offset < self.pending.len()
    }

    fn queue_line(&mut self, line: &Line) {
        self.pending.extend_from_slice(&line.bytes);
        if !line.partial {
            self.pending.extend_from_slice(CRLF);
        }
        self.mid_line = line.partial;
    }

    fn next_line<R: Read>(&mut self, source: &mut LineSource<R>) -> io::Result<Option<Line>> {
        match self.held.take() {
            Some(line) => Ok(Some(line)),
            None => source.read_line(),
        }
    }

    /// Classifies a line that is already off the source. On failure the
    /// line is kept so the next call judges it again.
    fn classify<R: Read>(
        &mut self,
        line: Line,
        source: &mut LineSource<R>,
        classifier: &SeparatorClassifier,
    ) -> io::Result<(Line, bool)> {
        match classifier.classify(&line.bytes, source) {
            Ok(is_separator) => Ok((line, is_separator)),
            Err(e) => {
                self.held = Some(line);
                Err(e)
            }
        }
    }

    fn enter_separator<R: Read>(
        &mut self,
        line: &Line,
        source: &mut LineSource<R>,
    ) -> io::Result<()> {
        trace!("Separator line found, message complete");
        self.phase = Phase::AtSeparator;
        self.separator_tail = line.partial;
        self.finish_separator(source)
    }

    fn finish_separator<R: Read>(&mut self, source: &mut LineSource<R>) -> io::Result<()> {
        if self.separator_tail {
            source.skip_line()?;
            self.separator_tail = false;
        }
        Ok(())
    }

    /// Runs the state machine until output is queued or the message ends.
    fn fill<R: Read>(
        &mut self,
        source: &mut LineSource<R>,
        classifier: &SeparatorClassifier,
    ) -> io::Result<()> {
        while !self.has_pending() {
            match self.phase {
                Phase::AtSeparator => return self.finish_separator(source),
                Phase::Done => return Ok(()),
                Phase::AwaitingLine => {
                    let Some(line) = self.next_line(source)? else {
                        if self.mid_line {
                            self.pending.extend_from_slice(CRLF);
                            self.mid_line = false;
                        }
                        self.phase = Phase::Done;
                        continue;
                    };

                    if self.mid_line {
                        self.queue_line(&line);
                        continue;
                    }

                    let (line, is_separator) = self.classify(line, source, classifier)?;
                    if is_separator {
                        self.enter_separator(&line, source)?;
                    } else if line.is_blank() {
                        self.phase = Phase::PeekedOneBlank;
                    } else {
                        self.queue_line(&line);
                    }
                }
                Phase::PeekedOneBlank => {
                    // A blank line right before the end of the message is dropped.
                    let Some(line) = self.next_line(source)? else {
                        self.phase = Phase::Done;
                        continue;
                    };

                    let (line, is_separator) = self.classify(line, source, classifier)?;
                    if is_separator {
                        self.enter_separator(&line, source)?;
                        continue;
                    }

                    self.pending.extend_from_slice(CRLF);
                    if !line.is_blank() {
                        self.phase = Phase::AwaitingLine;
                        self.queue_line(&line);
                    }
                }
            }
        }

        Ok(())
    }

    fn buffer(&self) -> &[u8] {
        &self.pending[self.offset..]
    }

    fn advance(&mut self, amt: usize) {
        self.offset = (self.offset + amt).min(self.pending.len());
        if self.offset == self.pending.len() {
            self.pending.clear();
            self.offset = 0;
        }
    }
}

/// Byte stream of a single message: headers, blank line and body, with
/// CRLF line endings.
///
/// Borrows the archive cursor exclusively; ask the `ArchiveReader` for the
/// next message once this one is no longer needed. Any bytes left unread
/// are skipped at that point.
pub struct MessageReader<'a, R> {
    source: &'a mut LineSource<R>,
    classifier: &'a SeparatorClassifier,
    state: &'a mut MessageState,
}

impl<'a, R: Read> MessageReader<'a, R> {
    pub(crate) fn new(
        source: &'a mut LineSource<R>,
        classifier: &'a SeparatorClassifier,
        state: &'a mut MessageState,
    ) -> Self {
        Self {
            source,
            classifier,
            state,
        }
    }

    /// True once end-of-data has been reached and every byte handed out.
    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }
}

impl<R: Read> Read for MessageReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let available = self.fill_buf()?;
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.consume(n);
        Ok(n)
    }
}

impl<R: Read> BufRead for MessageReader<'_, R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.state.fill(self.source, self.classifier)?;
        Ok(self.state.buffer())
    }

    fn consume(&mut self, amt: usize) {
        self.state.advance(amt);
    }
}
