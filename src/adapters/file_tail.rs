use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use log::{debug, info};

use super::SourceAdapter;
use crate::pipeline::{CancelFlag, ErrorSignal, IngestItem};

const COMPONENT: &str = "file";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Tails a chat log file: seeks to the current end on open and emits only
/// complete lines appended afterwards.
///
/// A file access failure is terminal for this adapter. It pushes one error
/// item and exits; file errors are not treated as transient.
pub struct FileTailAdapter {
    path: PathBuf,
    cancel: CancelFlag,
    poll_interval: Duration,
}

impl FileTailAdapter {
    pub fn new(path: impl Into<PathBuf>, cancel: CancelFlag) -> Self {
        Self {
            path: path.into(),
            cancel,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn tail(&self, out: &Sender<IngestItem>) -> Result<(), String> {
        let file = File::open(&self.path)
            .map_err(|e| format!("failed to open {}: {}", self.path.display(), e))?;
        let mut reader = BufReader::new(file);
        reader
            .seek(SeekFrom::End(0))
            .map_err(|e| format!("failed to seek {}: {}", self.path.display(), e))?;

        info!(
            "Tailing {} from the end of its current content",
            self.path.display()
        );

        // Writers may flush partial lines; hold them back until the
        // terminating newline arrives.
        let mut pending = String::new();
        let mut chunk = String::new();

        while !self.cancel.is_cancelled() {
            chunk.clear();
            let read = reader
                .read_line(&mut chunk)
                .map_err(|e| format!("failed to read {}: {}", self.path.display(), e))?;

            if read == 0 {
                thread::sleep(self.poll_interval);
                continue;
            }

            pending.push_str(&chunk);
            if pending.ends_with('\n') {
                let line = pending.trim();
                if !line.is_empty() {
                    let _ = out.send(IngestItem::Line(line.to_string()));
                }
                pending.clear();
            }
        }

        Ok(())
    }
}

impl SourceAdapter for FileTailAdapter {
    fn name(&self) -> &'static str {
        COMPONENT
    }

    fn run(self: Box<Self>, out: Sender<IngestItem>) {
        if let Err(message) = self.tail(&out) {
            let _ = out.send(IngestItem::Error(ErrorSignal::new(COMPONENT, message)));
        }
        debug!("File tail adapter exiting for {}", self.path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::mpsc;
    use std::time::Duration;

    fn spawn_adapter(
        path: PathBuf,
        cancel: CancelFlag,
    ) -> (mpsc::Receiver<IngestItem>, thread::JoinHandle<()>) {
        let adapter = Box::new(
            FileTailAdapter::new(path, cancel).with_poll_interval(Duration::from_millis(10)),
        );
        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || adapter.run(tx));
        (rx, handle)
    }

    #[test]
    fn preexisting_content_is_skipped_and_appends_are_emitted() {
        let mut log = tempfile::NamedTempFile::new().unwrap();
        writeln!(log, "old line before start").unwrap();
        log.flush().unwrap();

        let cancel = CancelFlag::new();
        let (rx, handle) = spawn_adapter(log.path().to_path_buf(), cancel.clone());

        // give the adapter time to open and seek before appending
        thread::sleep(Duration::from_millis(50));
        writeln!(log, "gg ez").unwrap();
        log.flush().unwrap();

        let item = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(item, IngestItem::Line("gg ez".to_string()));

        cancel.cancel();
        handle.join().unwrap();
    }

    #[test]
    fn a_partially_written_line_is_held_until_its_newline() {
        let log = tempfile::NamedTempFile::new().unwrap();
        let cancel = CancelFlag::new();
        let (rx, handle) = spawn_adapter(log.path().to_path_buf(), cancel.clone());

        thread::sleep(Duration::from_millis(50));
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(log.path())
            .unwrap();
        write!(file, "gg").unwrap();
        file.flush().unwrap();
        thread::sleep(Duration::from_millis(50));
        writeln!(file, " ez").unwrap();
        file.flush().unwrap();

        let item = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(item, IngestItem::Line("gg ez".to_string()));

        cancel.cancel();
        handle.join().unwrap();
    }

    #[test]
    fn blank_lines_are_not_emitted() {
        let log = tempfile::NamedTempFile::new().unwrap();
        let cancel = CancelFlag::new();
        let (rx, handle) = spawn_adapter(log.path().to_path_buf(), cancel.clone());

        thread::sleep(Duration::from_millis(50));
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(log.path())
            .unwrap();
        writeln!(file, "   ").unwrap();
        writeln!(file, "nice shot").unwrap();
        file.flush().unwrap();

        let item = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(item, IngestItem::Line("nice shot".to_string()));

        cancel.cancel();
        handle.join().unwrap();
    }

    #[test]
    fn a_missing_file_produces_one_error_and_terminates() {
        let cancel = CancelFlag::new();
        let adapter = Box::new(
            FileTailAdapter::new("/definitely/not/a/chat.log", cancel)
                .with_poll_interval(Duration::from_millis(10)),
        );
        let (tx, rx) = mpsc::channel();

        // run on the current thread; a missing file returns immediately
        adapter.run(tx);

        match rx.recv().unwrap() {
            IngestItem::Error(signal) => {
                assert_eq!(signal.component, "file");
                assert!(signal.message.contains("failed to open"));
            }
            other => panic!("expected an error item, got {:?}", other),
        }
        // the sender is gone, so the loop really terminated
        assert!(rx.recv().is_err());
    }
}
