//! mbox-rs: Streaming mbox archive splitter
//!
//! Splits a concatenated mbox archive into individual messages without
//! loading the archive into memory. Each message is exposed as a
//! forward-only byte stream with CRLF line endings, ready for a standard
//! mail parser.
//!
//! # Separator detection
//!
//! A line starting with `From ` begins a new message only when it is
//! followed by at least two header-shaped lines before the first blank
//! line. Anything else, including `>From ` lines, is body content and is
//! passed through unchanged.
//!
//! # Example
//!
//! ```no_run
//! use mbox_rs::ArchiveReader;
//! use std::io::Read;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut archive = ArchiveReader::open("inbox.mbox")?;
//!
//!     while let Some(mut message) = archive.next_message()? {
//!         let mut raw = Vec::new();
//!         message.read_to_end(&mut raw)?;
//!         println!("{} bytes", raw.len());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`archive`]: Archive cursor handing out one message at a time
//! - [`message`]: Per-message reader
//! - [`classifier`]: Separator line heuristic
//! - [`config`]: Reader limits
//! - [`error`]: Error types and handling

pub mod archive;
pub mod classifier;
pub mod config;
pub mod error;
pub mod message;
mod source;

// Re-export commonly used types
pub use archive::{count_messages, ArchiveReader};
pub use classifier::SeparatorClassifier;
pub use config::MboxConfig;
pub use error::{MboxError, Result};
pub use message::MessageReader;
