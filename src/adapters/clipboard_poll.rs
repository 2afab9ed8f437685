use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::debug;

use super::SourceAdapter;
use crate::clipboard::ClipboardReader;
use crate::pipeline::{CancelFlag, ErrorSignal, IngestItem};

const COMPONENT: &str = "clipboard";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(150);
const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Polls the clipboard and emits its trimmed text whenever the raw value
/// changes. The comparison is against the last raw clipboard value, one
/// slot deep, so copying the same text twice in a row emits once.
pub struct ClipboardPollAdapter {
    reader: Arc<dyn ClipboardReader>,
    cancel: CancelFlag,
    poll_interval: Duration,
    error_backoff: Duration,
}

impl ClipboardPollAdapter {
    pub fn new(reader: Arc<dyn ClipboardReader>, cancel: CancelFlag) -> Self {
        Self {
            reader,
            cancel,
            poll_interval: DEFAULT_POLL_INTERVAL,
            error_backoff: DEFAULT_ERROR_BACKOFF,
        }
    }

    pub fn with_intervals(mut self, poll: Duration, error_backoff: Duration) -> Self {
        self.poll_interval = poll;
        self.error_backoff = error_backoff;
        self
    }
}

impl SourceAdapter for ClipboardPollAdapter {
    fn name(&self) -> &'static str {
        COMPONENT
    }

    fn run(self: Box<Self>, out: Sender<IngestItem>) {
        let mut last_value: Option<String> = None;

        while !self.cancel.is_cancelled() {
            match self.reader.read_text() {
                Ok(text) => {
                    let changed = last_value.as_deref() != Some(text.as_str());
                    if changed && !text.trim().is_empty() {
                        let _ = out.send(IngestItem::Line(text.trim().to_string()));
                        last_value = Some(text);
                    }
                    thread::sleep(self.poll_interval);
                }
                Err(message) => {
                    let _ = out.send(IngestItem::Error(ErrorSignal::new(COMPONENT, message)));
                    thread::sleep(self.error_backoff);
                }
            }
        }

        debug!("Clipboard adapter exiting");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::mpsc;
    use std::sync::Mutex;

    struct ScriptedClipboard {
        reads: Mutex<VecDeque<Result<String, String>>>,
        idle: String,
    }

    impl ScriptedClipboard {
        fn new(reads: Vec<Result<String, String>>, idle: &str) -> Arc<Self> {
            Arc::new(Self {
                reads: Mutex::new(reads.into()),
                idle: idle.to_string(),
            })
        }
    }

    impl ClipboardReader for ScriptedClipboard {
        fn read_text(&self) -> Result<String, String> {
            self.reads
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(self.idle.clone()))
        }
    }

    fn collect(reads: Vec<Result<String, String>>, idle: &str, expected: usize) -> Vec<IngestItem> {
        let cancel = CancelFlag::new();
        let adapter = Box::new(
            ClipboardPollAdapter::new(ScriptedClipboard::new(reads, idle), cancel.clone())
                .with_intervals(Duration::from_millis(5), Duration::from_millis(5)),
        );
        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || adapter.run(tx));

        let mut items = Vec::new();
        while items.len() < expected {
            match rx.recv_timeout(Duration::from_secs(2)) {
                Ok(item) => items.push(item),
                Err(e) => panic!("expected {} items, got {:?} then {}", expected, items, e),
            }
        }

        cancel.cancel();
        handle.join().unwrap();
        items
    }

    #[test]
    fn the_same_value_twice_in_a_row_emits_once() {
        let items = collect(
            vec![
                Ok("gg ez".to_string()),
                Ok("gg ez".to_string()),
                Ok("nice".to_string()),
            ],
            "nice",
            2,
        );
        assert_eq!(
            items,
            vec![
                IngestItem::Line("gg ez".to_string()),
                IngestItem::Line("nice".to_string()),
            ]
        );
    }

    #[test]
    fn emitted_text_is_trimmed_but_compared_raw() {
        // The raw value changes ("gg ez" vs "gg ez\n"), so both reads emit
        // even though they trim to the same line.
        let items = collect(
            vec![Ok("gg ez".to_string()), Ok("gg ez\n".to_string())],
            "",
            2,
        );
        assert_eq!(
            items,
            vec![
                IngestItem::Line("gg ez".to_string()),
                IngestItem::Line("gg ez".to_string()),
            ]
        );
    }

    #[test]
    fn whitespace_only_clipboard_content_is_ignored() {
        let items = collect(
            vec![Ok("   ".to_string()), Ok("nice shot".to_string())],
            "nice shot",
            1,
        );
        assert_eq!(items, vec![IngestItem::Line("nice shot".to_string())]);
    }

    #[test]
    fn read_failures_are_reported_and_polling_continues() {
        let items = collect(
            vec![
                Ok("gg ez".to_string()),
                Err("clipboard locked".to_string()),
                Ok("nice".to_string()),
            ],
            "nice",
            3,
        );
        assert_eq!(items[0], IngestItem::Line("gg ez".to_string()));
        assert_eq!(
            items[1],
            IngestItem::Error(ErrorSignal::new("clipboard", "clipboard locked"))
        );
        assert_eq!(items[2], IngestItem::Line("nice".to_string()));
    }
}
