use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use log::debug;

use crate::pipeline::{CancelFlag, IngestItem, RenderItem, TranslatedPair};
use crate::settings::TargetLanguage;
use crate::translator::Translator;

const RECV_TIMEOUT: Duration = Duration::from_millis(200);
const DISPATCH_PACING: Duration = Duration::from_millis(50);

/// Single consumer of the ingest channel.
///
/// One worker exists per session. It is the only code that touches the
/// translator (and therefore the cache), so neither needs locking. Lines
/// whose translation fails are dropped; only the error signal travels on.
pub struct DispatchWorker {
    translator: Translator,
    language: TargetLanguage,
    cancel: CancelFlag,
}

impl DispatchWorker {
    pub fn new(translator: Translator, language: TargetLanguage, cancel: CancelFlag) -> Self {
        Self {
            translator,
            language,
            cancel,
        }
    }

    pub fn run(mut self, ingest: Receiver<IngestItem>, render: Sender<RenderItem>) {
        loop {
            let item = match ingest.recv_timeout(RECV_TIMEOUT) {
                Ok(item) => item,
                Err(RecvTimeoutError::Timeout) => {
                    // the bounded wait doubles as the cancellation check
                    if self.cancel.is_cancelled() {
                        break;
                    }
                    continue;
                }
                // every producer is gone; nothing further can arrive
                Err(RecvTimeoutError::Disconnected) => break,
            };

            match item {
                IngestItem::Line(line) => {
                    let outcome = match self.translator.translate(&line, self.language) {
                        Ok(translated) => RenderItem::Pair(TranslatedPair {
                            original: line,
                            translated,
                        }),
                        Err(signal) => RenderItem::Error(signal),
                    };
                    if render.send(outcome).is_err() {
                        break;
                    }
                    // crude rate limiter between external calls
                    thread::sleep(DISPATCH_PACING);
                }
                IngestItem::Error(signal) => {
                    if render.send(RenderItem::Error(signal)).is_err() {
                        break;
                    }
                }
            }
        }

        debug!("Dispatch worker exiting");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ErrorSignal;
    use crate::translator::{ChatRequest, TranslationBackend};
    use std::sync::mpsc;

    struct UppercaseBackend;

    impl TranslationBackend for UppercaseBackend {
        fn complete(&self, request: &ChatRequest) -> Result<String, String> {
            // the message sits on the prompt's last line
            let line = request.user_prompt.rsplit("Message: ").next().unwrap_or("");
            Ok(line.to_uppercase())
        }
    }

    struct RefusingBackend;

    impl TranslationBackend for RefusingBackend {
        fn complete(&self, _request: &ChatRequest) -> Result<String, String> {
            Err("quota exceeded".to_string())
        }
    }

    fn spawn_worker(
        backend: Box<dyn TranslationBackend>,
        cancel: CancelFlag,
    ) -> (
        mpsc::Sender<IngestItem>,
        mpsc::Receiver<RenderItem>,
        thread::JoinHandle<()>,
    ) {
        let translator = Translator::new(backend, "test-model");
        let worker = DispatchWorker::new(translator, TargetLanguage::Spanish, cancel);
        let (ingest_tx, ingest_rx) = mpsc::channel();
        let (render_tx, render_rx) = mpsc::channel();
        let handle = thread::spawn(move || worker.run(ingest_rx, render_tx));
        (ingest_tx, render_rx, handle)
    }

    #[test]
    fn lines_become_pairs_and_adapter_errors_pass_through() {
        let cancel = CancelFlag::new();
        let (ingest_tx, render_rx, handle) = spawn_worker(Box::new(UppercaseBackend), cancel);

        ingest_tx
            .send(IngestItem::Line("gg ez".to_string()))
            .unwrap();
        ingest_tx
            .send(IngestItem::Error(ErrorSignal::new("file", "gone")))
            .unwrap();

        let first = render_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(
            first,
            RenderItem::Pair(TranslatedPair {
                original: "gg ez".to_string(),
                translated: "GG EZ".to_string(),
            })
        );

        let second = render_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(
            second,
            RenderItem::Error(ErrorSignal::new("file", "gone"))
        );

        drop(ingest_tx);
        handle.join().unwrap();
    }

    #[test]
    fn a_failed_translation_surfaces_as_an_error_and_the_line_is_dropped() {
        let cancel = CancelFlag::new();
        let (ingest_tx, render_rx, handle) = spawn_worker(Box::new(RefusingBackend), cancel);

        ingest_tx
            .send(IngestItem::Line("gg ez".to_string()))
            .unwrap();

        match render_rx.recv_timeout(Duration::from_secs(2)).unwrap() {
            RenderItem::Error(signal) => {
                assert_eq!(signal.component, "translator");
                assert!(signal.message.contains("quota exceeded"));
            }
            other => panic!("expected an error item, got {:?}", other),
        }

        drop(ingest_tx);
        handle.join().unwrap();
    }

    #[test]
    fn cancellation_is_observed_within_the_queue_wait() {
        let cancel = CancelFlag::new();
        let (ingest_tx, _render_rx, handle) = spawn_worker(Box::new(UppercaseBackend), cancel.clone());

        cancel.cancel();
        handle.join().unwrap();
        drop(ingest_tx);
    }
}
