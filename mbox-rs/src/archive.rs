//! Archive cursor
//!
//! Splits an mbox archive into messages without buffering it. Each call to
//! [`ArchiveReader::next_message`] skips whatever is left of the previous
//! message and hands out a reader for the next one.

use crate::classifier::SeparatorClassifier;
use crate::config::MboxConfig;
use crate::error::{MboxError, Result};
use crate::message::{MessageReader, MessageState, Phase};
use crate::source::{Line, LineSource};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveState {
    /// Nothing read yet
    Start,
    /// A message reader has been handed out
    Open,
    /// No messages left
    Exhausted,
    /// The archive did not start with a separator line
    Invalid,
}

/// MBOX reader for splitting an archive into messages
pub struct ArchiveReader<R> {
    source: LineSource<R>,
    classifier: SeparatorClassifier,
    message: MessageState,
    state: ArchiveState,
    message_count: u64,
    /// First non-blank line, kept until it has been judged
    candidate: Option<Line>,
}

impl ArchiveReader<File> {
    /// Open an archive file with the default configuration
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(file))
    }
}

impl<R: Read> ArchiveReader<R> {
    /// Create a new reader with the default configuration
    pub fn new(source: R) -> Self {
        Self::build(source, &MboxConfig::default())
    }

    /// Create a new reader, rejecting an invalid configuration
    pub fn with_config(source: R, config: MboxConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(source, &config))
    }

    fn build(source: R, config: &MboxConfig) -> Self {
        Self {
            source: LineSource::new(source, config.max_line_length),
            classifier: SeparatorClassifier::new(config.lookahead, config.min_header_lines),
            message: MessageState::new(),
            state: ArchiveState::Start,
            message_count: 0,
            candidate: None,
        }
    }

    /// Returns a reader for the next message, or `None` at the end of the
    /// archive.
    ///
    /// Unread bytes of the previous message are read and discarded first.
    /// An archive that does not open with a separator line yields
    /// [`MboxError::InvalidFormat`] on this and every later call.
    pub fn next_message(&mut self) -> Result<Option<MessageReader<'_, R>>> {
        match self.state {
            ArchiveState::Invalid => return Err(invalid_format()),
            ArchiveState::Exhausted => return Ok(None),
            ArchiveState::Start => {
                if !self.find_first_separator()? {
                    return Ok(None);
                }
            }
            ArchiveState::Open => {
                let discarded = self.drain_current()?;
                if discarded > 0 {
                    debug!(
                        "Skipped {} unread bytes of message {}",
                        discarded, self.message_count
                    );
                }

                if self.message.phase() == Phase::Done {
                    debug!("End of archive after {} messages", self.message_count);
                    self.state = ArchiveState::Exhausted;
                    return Ok(None);
                }
            }
        }

        self.state = ArchiveState::Open;
        self.message = MessageState::new();
        self.message_count += 1;
        trace!("Starting message {}", self.message_count);

        Ok(Some(MessageReader::new(
            &mut self.source,
            &self.classifier,
            &mut self.message,
        )))
    }

    /// Reads the next message completely into memory.
    pub fn next_message_bytes(&mut self) -> Result<Option<Vec<u8>>> {
        let Some(mut reader) = self.next_message()? else {
            return Ok(None);
        };

        let mut content = Vec::new();
        reader.read_to_end(&mut content)?;
        Ok(Some(content))
    }

    /// Get the number of messages handed out so far
    pub fn message_count(&self) -> u64 {
        self.message_count
    }

    pub fn get_ref(&self) -> &R {
        self.source.get_ref()
    }

    /// Returns the wrapped source. Bytes already buffered are lost.
    pub fn into_inner(self) -> R {
        self.source.into_inner()
    }

    /// Skips leading blank lines and checks the first line is a separator.
    ///
    /// A line taken from the source stays in `candidate` until it has been
    /// judged, so a failed read leaves it in place for the next call.
    fn find_first_separator(&mut self) -> Result<bool> {
        loop {
            let mut line = match self.candidate.take() {
                Some(line) => line,
                None => match self.source.read_line()? {
                    Some(line) => line,
                    None => {
                        debug!("Archive contains no messages");
                        self.state = ArchiveState::Exhausted;
                        return Ok(false);
                    }
                },
            };

            // Only the first chunk of an oversized line is judged.
            if line.partial {
                if let Err(e) = self.source.skip_line() {
                    self.candidate = Some(line);
                    return Err(e.into());
                }
                line.partial = false;
            }

            if line.bytes.is_empty() {
                trace!("Skipping leading blank line");
                continue;
            }

            match self.classifier.classify(&line.bytes, &mut self.source) {
                Ok(true) => return Ok(true),
                Ok(false) => {}
                Err(e) => {
                    self.candidate = Some(line);
                    return Err(e.into());
                }
            }

            warn!(
                "Archive does not start with a separator line: {:?}",
                String::from_utf8_lossy(&line.bytes[..line.bytes.len().min(80)])
            );
            self.state = ArchiveState::Invalid;
            return Err(invalid_format());
        }
    }

    fn drain_current(&mut self) -> Result<u64> {
        let mut reader = MessageReader::new(&mut self.source, &self.classifier, &mut self.message);
        Ok(io::copy(&mut reader, &mut io::sink())?)
    }
}

fn invalid_format() -> MboxError {
    MboxError::InvalidFormat("archive does not start with a separator line".to_string())
}

/// Count messages in an MBOX archive, using the same separator heuristic as
/// [`ArchiveReader`]
pub fn count_messages<R: Read>(reader: R) -> Result<u64> {
    let mut archive = ArchiveReader::new(reader);
    while archive.next_message()?.is_some() {}
    Ok(archive.message_count())
}
