//! Session lifecycle: start/stop coordination for one adapter + one worker.
//!
//! A session owns nothing shared with any other session. Stopping sets the
//! shared cancel flag and returns immediately; background threads notice
//! within their own bounded intervals and drain out on their own. The stop
//! path never joins.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

use log::{info, warn};

use crate::adapters::{ClipboardPollAdapter, FileTailAdapter, ScreenRegionAdapter, SourceAdapter};
use crate::clipboard::{ClipboardReader, CommandClipboard};
use crate::ocr::{CommandOcr, OcrCapture};
use crate::pipeline::{CancelFlag, RenderItem};
use crate::settings::{AdapterKind, ConfigError, SessionConfig};
use crate::translator::{OpenAiBackend, TranslationBackend, Translator};
use crate::worker::DispatchWorker;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
}

/// Capabilities a session needs at start. Injected so tests can script the
/// OCR, clipboard, and translation boundaries.
pub struct SessionDeps {
    pub ocr: Arc<dyn OcrCapture>,
    pub clipboard: Arc<dyn ClipboardReader>,
    pub backend: Box<dyn TranslationBackend>,
}

impl SessionDeps {
    /// Production capabilities: command-driven OCR and clipboard plus the
    /// OpenAI-compatible chat backend.
    pub fn native(config: &SessionConfig) -> Result<Self, ConfigError> {
        let api_key = config.resolve_api_key()?;
        let backend = OpenAiBackend::new(&config.base_url, &api_key).map_err(ConfigError::Backend)?;
        Ok(Self {
            ocr: Arc::new(CommandOcr::new()),
            clipboard: Arc::new(CommandClipboard::new()),
            backend: Box::new(backend),
        })
    }
}

struct Session {
    cancel: CancelFlag,
    render_rx: Receiver<RenderItem>,
    adapter: AdapterKind,
    running: bool,
}

/// Owns the at-most-one live [`Session`] and the interactive-thread view of
/// its output.
#[derive(Default)]
pub struct SessionManager {
    session: Option<Session>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        match &self.session {
            Some(session) if session.running => SessionState::Running,
            _ => SessionState::Idle,
        }
    }

    /// Validates the configuration and spawns the adapter and worker
    /// threads. Validation failures spawn nothing and leave the manager
    /// idle. Calling start while a session is running is ignored.
    pub fn start(&mut self, config: &SessionConfig, deps: SessionDeps) -> Result<(), ConfigError> {
        if self.state() == SessionState::Running {
            warn!("Session already running; ignoring start request");
            return Ok(());
        }

        config.validate()?;

        let cancel = CancelFlag::new();
        let (ingest_tx, ingest_rx) = mpsc::channel();
        let (render_tx, render_rx) = mpsc::channel();

        let adapter = build_adapter(config, &deps, cancel.clone())?;
        let translator = Translator::new(deps.backend, &config.model);
        let worker = DispatchWorker::new(translator, config.target_language, cancel.clone());

        thread::spawn(move || adapter.run(ingest_tx));
        thread::spawn(move || worker.run(ingest_rx, render_tx));

        info!(
            "Session started: {} adapter, translating to {}",
            config.adapter, config.target_language
        );

        self.session = Some(Session {
            cancel,
            render_rx,
            adapter: config.adapter,
            running: true,
        });
        Ok(())
    }

    /// Signals cancellation and transitions to idle immediately. Idempotent;
    /// calling stop while idle does nothing. Items already translated stay
    /// drainable until the next start.
    pub fn stop(&mut self) {
        if let Some(session) = self.session.as_mut() {
            if session.running {
                session.cancel.cancel();
                session.running = false;
                info!("Session stopped: {} adapter", session.adapter);
            }
        }
    }

    /// Drains every render item currently available, without blocking. An
    /// empty queue is a normal, silent tick.
    pub fn drain_ready(&mut self) -> Vec<RenderItem> {
        let Some(session) = self.session.as_ref() else {
            return Vec::new();
        };

        let mut items = Vec::new();
        loop {
            match session.render_rx.try_recv() {
                Ok(item) => items.push(item),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        items
    }
}

fn build_adapter(
    config: &SessionConfig,
    deps: &SessionDeps,
    cancel: CancelFlag,
) -> Result<Box<dyn SourceAdapter>, ConfigError> {
    match config.adapter {
        AdapterKind::File => {
            let path = config
                .source_path
                .clone()
                .ok_or(ConfigError::MissingSourcePath)?;
            Ok(Box::new(FileTailAdapter::new(path, cancel)))
        }
        AdapterKind::Screen => {
            let region = config.region.ok_or(ConfigError::MissingRegion)?;
            Ok(Box::new(ScreenRegionAdapter::new(
                region,
                deps.ocr.clone(),
                cancel,
            )))
        }
        AdapterKind::Clipboard => Ok(Box::new(ClipboardPollAdapter::new(
            deps.clipboard.clone(),
            cancel,
        ))),
    }
}
