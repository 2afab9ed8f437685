//! Source adapters: autonomous polling loops that normalize heterogeneous
//! text sources into one stream of line-shaped ingest items.
//!
//! Each adapter owns its blocking I/O so the interactive thread never does.
//! Cancellation is cooperative: the session's [`CancelFlag`] is checked at
//! the top of every poll iteration, so an adapter exits within one polling
//! interval of being asked to stop.
//!
//! [`CancelFlag`]: crate::pipeline::CancelFlag

mod clipboard_poll;
mod file_tail;
mod screen;

pub use clipboard_poll::ClipboardPollAdapter;
pub use file_tail::FileTailAdapter;
pub use screen::ScreenRegionAdapter;

use std::sync::mpsc::Sender;

use crate::pipeline::IngestItem;

/// The closed set of text sources a session can ingest from.
///
/// An adapter runs until it is cancelled or, for the file tail, until its
/// source fails. Failures never escape `run`; they are pushed onto the
/// output channel as tagged error items.
pub trait SourceAdapter: Send + 'static {
    /// Component name used to tag error signals from this adapter.
    fn name(&self) -> &'static str;

    /// Consumes the adapter and polls its source until cancelled.
    fn run(self: Box<Self>, out: Sender<IngestItem>);
}
