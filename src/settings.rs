use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::translator::{DEFAULT_BASE_URL, DEFAULT_MODEL};

/// Environment variable consulted when no API key is configured explicitly.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Languages the translation prompt knows how to target.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TargetLanguage {
    Spanish,
    French,
    German,
    Japanese,
    Korean,
    ChineseSimplified,
    Portuguese,
    Russian,
    Arabic,
}

impl TargetLanguage {
    pub const ALL: [TargetLanguage; 9] = [
        TargetLanguage::Spanish,
        TargetLanguage::French,
        TargetLanguage::German,
        TargetLanguage::Japanese,
        TargetLanguage::Korean,
        TargetLanguage::ChineseSimplified,
        TargetLanguage::Portuguese,
        TargetLanguage::Russian,
        TargetLanguage::Arabic,
    ];

    /// Name used in prompts and cache keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetLanguage::Spanish => "Spanish",
            TargetLanguage::French => "French",
            TargetLanguage::German => "German",
            TargetLanguage::Japanese => "Japanese",
            TargetLanguage::Korean => "Korean",
            TargetLanguage::ChineseSimplified => "Chinese (Simplified)",
            TargetLanguage::Portuguese => "Portuguese",
            TargetLanguage::Russian => "Russian",
            TargetLanguage::Arabic => "Arabic",
        }
    }
}

impl fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        let language = match normalized.as_str() {
            "spanish" => TargetLanguage::Spanish,
            "french" => TargetLanguage::French,
            "german" => TargetLanguage::German,
            "japanese" => TargetLanguage::Japanese,
            "korean" => TargetLanguage::Korean,
            "chinese" | "chinesesimplified" => TargetLanguage::ChineseSimplified,
            "portuguese" => TargetLanguage::Portuguese,
            "russian" => TargetLanguage::Russian,
            "arabic" => TargetLanguage::Arabic,
            _ => {
                let known = TargetLanguage::ALL
                    .iter()
                    .map(|l| l.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                return Err(format!("unknown target language '{}' (expected one of: {})", s, known));
            }
        };

        Ok(language)
    }
}

/// Which text source a session ingests from.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdapterKind {
    File,
    Screen,
    Clipboard,
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AdapterKind::File => "file",
            AdapterKind::Screen => "screen",
            AdapterKind::Clipboard => "clipboard",
        };
        f.write_str(name)
    }
}

impl FromStr for AdapterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(AdapterKind::File),
            // "ocr" is accepted as a synonym for the screen source
            "screen" | "ocr" => Ok(AdapterKind::Screen),
            "clipboard" => Ok(AdapterKind::Clipboard),
            other => Err(format!(
                "unknown adapter '{}' (expected file, screen, or clipboard)",
                other
            )),
        }
    }
}

/// Rectangular screen region in absolute pixel coordinates.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRegion {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl CaptureRegion {
    /// Parses a `left,top,right,bottom` pixel rectangle.
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidRegion {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = input.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(invalid("expected four comma-separated integers"));
        }

        let mut values = [0i32; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| invalid(&format!("'{}' is not an integer", part)))?;
        }

        let region = Self {
            left: values[0],
            top: values[1],
            right: values[2],
            bottom: values[3],
        };
        region.validate()?;
        Ok(region)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.right <= self.left || self.bottom <= self.top {
            return Err(ConfigError::InvalidRegion {
                input: self.to_string(),
                reason: "right must exceed left and bottom must exceed top".to_string(),
            });
        }
        Ok(())
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

impl fmt::Display for CaptureRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.left, self.top, self.right, self.bottom)
    }
}

/// Everything a session needs to start. Loadable from a JSON file; any field
/// left out falls back to its default.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SessionConfig {
    pub adapter: AdapterKind,
    pub source_path: Option<PathBuf>,
    pub region: Option<CaptureRegion>,
    pub target_language: TargetLanguage,
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            adapter: AdapterKind::Clipboard,
            source_path: None,
            region: None,
            target_language: TargetLanguage::Spanish,
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl SessionConfig {
    /// Resolves the API credential from the config or the environment.
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        if let Some(key) = self.api_key.as_deref() {
            let key = key.trim();
            if !key.is_empty() {
                return Ok(key.to_string());
            }
        }

        match env::var(OPENAI_API_KEY_ENV) {
            Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
            _ => Err(ConfigError::MissingApiKey),
        }
    }

    /// Checks everything a session start depends on, before any thread is
    /// spawned. A failure here leaves the session idle.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.resolve_api_key()?;

        match self.adapter {
            AdapterKind::File => {
                let path = self
                    .source_path
                    .as_ref()
                    .ok_or(ConfigError::MissingSourcePath)?;
                if !path.is_file() {
                    return Err(ConfigError::SourceNotFound(path.clone()));
                }
            }
            AdapterKind::Screen => {
                let region = self.region.ok_or(ConfigError::MissingRegion)?;
                region.validate()?;
            }
            AdapterKind::Clipboard => {}
        }

        Ok(())
    }
}

/// Loads a session config from a JSON file.
pub fn load_config(path: &Path) -> Result<SessionConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::ConfigUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::ConfigInvalid {
        path: path.to_path_buf(),
        source,
    })
}

/// Problems that prevent a session from starting. All of these are detected
/// synchronously in `validate`, before any background thread exists.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing API key: pass --api-key or set OPENAI_API_KEY")]
    MissingApiKey,
    #[error("the file adapter requires a chat log path")]
    MissingSourcePath,
    #[error("chat log not found: {}", .0.display())]
    SourceNotFound(PathBuf),
    #[error("the screen adapter requires a capture region")]
    MissingRegion,
    #[error("invalid capture region '{input}': {reason}")]
    InvalidRegion { input: String, reason: String },
    #[error("failed to read config file {}: {source}", .path.display())]
    ConfigUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {}: {source}", .path.display())]
    ConfigInvalid {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to initialize translation backend: {0}")]
    Backend(String),
}
