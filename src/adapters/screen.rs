use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::debug;

use super::SourceAdapter;
use crate::ocr::OcrCapture;
use crate::pipeline::{CancelFlag, ErrorSignal, IngestItem};
use crate::settings::CaptureRegion;

const COMPONENT: &str = "screen";
const DEFAULT_CAPTURE_INTERVAL: Duration = Duration::from_millis(600);
const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Polls a rectangular screen region through the OCR capability and emits
/// each recognized line that differs from the single most recently emitted
/// one.
///
/// The duplicate filter is one slot deep on purpose: a line that repeats
/// immediately is dropped, but the same line recurring after a different
/// one is emitted again.
///
/// Capture and OCR failures are transient here: one error item, a backoff,
/// and the loop keeps polling.
pub struct ScreenRegionAdapter {
    region: CaptureRegion,
    ocr: Arc<dyn OcrCapture>,
    cancel: CancelFlag,
    capture_interval: Duration,
    error_backoff: Duration,
}

impl ScreenRegionAdapter {
    pub fn new(region: CaptureRegion, ocr: Arc<dyn OcrCapture>, cancel: CancelFlag) -> Self {
        Self {
            region,
            ocr,
            cancel,
            capture_interval: DEFAULT_CAPTURE_INTERVAL,
            error_backoff: DEFAULT_ERROR_BACKOFF,
        }
    }

    pub fn with_intervals(mut self, capture: Duration, error_backoff: Duration) -> Self {
        self.capture_interval = capture;
        self.error_backoff = error_backoff;
        self
    }
}

impl SourceAdapter for ScreenRegionAdapter {
    fn name(&self) -> &'static str {
        COMPONENT
    }

    fn run(self: Box<Self>, out: Sender<IngestItem>) {
        let mut last_emitted = String::new();

        while !self.cancel.is_cancelled() {
            match self.ocr.capture_text(&self.region) {
                Ok(text) => {
                    let text = text.replace('\r', "\n");
                    for line in text.split('\n').map(str::trim).filter(|l| !l.is_empty()) {
                        if line != last_emitted {
                            let _ = out.send(IngestItem::Line(line.to_string()));
                            last_emitted = line.to_string();
                        }
                    }
                    thread::sleep(self.capture_interval);
                }
                Err(message) => {
                    let _ = out.send(IngestItem::Error(ErrorSignal::new(COMPONENT, message)));
                    thread::sleep(self.error_backoff);
                }
            }
        }

        debug!("Screen region adapter exiting for {}", self.region);
    }
}
