use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use log::info;

use crate::display::{DisplayMode, TerminalSink};
use crate::session::{SessionDeps, SessionManager};
use crate::settings::{self, AdapterKind, CaptureRegion, SessionConfig, TargetLanguage};

/// Tick interval of the interactive drain loop.
const UI_TICK: Duration = Duration::from_millis(120);

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "lingo", about = "Lingo - live game chat translation")]
pub struct CliArgs {
    /// Text source to ingest: file, screen, or clipboard
    #[arg(long)]
    pub adapter: Option<AdapterKind>,

    /// Chat log file to tail (file adapter)
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Screen capture region as left,top,right,bottom (screen adapter)
    #[arg(long)]
    pub region: Option<String>,

    /// Target language
    #[arg(long)]
    pub language: Option<TargetLanguage>,

    /// API key for the translation service (falls back to OPENAI_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Model used for translation
    #[arg(long)]
    pub model: Option<String>,

    /// Base URL of an OpenAI-compatible endpoint
    #[arg(long)]
    pub base_url: Option<String>,

    /// Show translations only, without the original lines
    #[arg(long)]
    pub compact: bool,

    /// Load session settings from a JSON file (flags override it)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl CliArgs {
    /// Builds the session config: file settings first, flags on top.
    pub fn session_config(&self) -> Result<SessionConfig> {
        let mut config = match &self.config {
            Some(path) => settings::load_config(path)?,
            None => SessionConfig::default(),
        };

        if let Some(adapter) = self.adapter {
            config.adapter = adapter;
        }
        if let Some(file) = &self.file {
            config.source_path = Some(file.clone());
        }
        if let Some(region) = &self.region {
            config.region = Some(CaptureRegion::parse(region)?);
        }
        if let Some(language) = self.language {
            config.target_language = language;
        }
        if let Some(api_key) = &self.api_key {
            config.api_key = Some(api_key.clone());
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }

        Ok(config)
    }
}

#[cfg(unix)]
fn install_shutdown_flag() -> Result<Arc<AtomicBool>> {
    let flag = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, flag.clone())?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, flag.clone())?;
    Ok(flag)
}

#[cfg(not(unix))]
fn install_shutdown_flag() -> Result<Arc<AtomicBool>> {
    Ok(Arc::new(AtomicBool::new(false)))
}

/// Runs one session against the terminal sink until interrupted.
///
/// The loop below is the interactive thread: it only drains and prints.
/// All file, screen, clipboard, and network I/O happens on the session's
/// background threads.
pub fn run(args: CliArgs) -> Result<()> {
    let config = args.session_config()?;
    let deps = SessionDeps::native(&config)?;

    let mut manager = SessionManager::new();
    manager.start(&config, deps)?;

    let mode = if args.compact {
        DisplayMode::Compact
    } else {
        DisplayMode::Verbose
    };
    let sink = TerminalSink::new(mode);
    let shutdown = install_shutdown_flag()?;

    info!("Press Ctrl-C to stop");
    while !shutdown.load(Ordering::Relaxed) {
        for item in manager.drain_ready() {
            sink.render(&item);
        }
        thread::sleep(UI_TICK);
    }

    manager.stop();
    // print whatever finished translating before the interrupt
    for item in manager.drain_ready() {
        sink.render(&item);
    }
    Ok(())
}
