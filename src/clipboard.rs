//! Clipboard access.
//!
//! The pipeline only depends on the [`ClipboardReader`] trait; the default
//! implementation shells out to the platform paste tool.

use std::process::Command;

use log::debug;

/// Opaque clipboard capability: return the current clipboard text.
pub trait ClipboardReader: Send + Sync {
    fn read_text(&self) -> Result<String, String>;
}

/// Default reader backed by the platform paste tool
/// (wl-paste/xclip/xsel, pbpaste, or powershell).
#[derive(Debug, Default)]
pub struct CommandClipboard;

impl CommandClipboard {
    pub fn new() -> Self {
        Self
    }
}

impl ClipboardReader for CommandClipboard {
    fn read_text(&self) -> Result<String, String> {
        read_clipboard_text()
    }
}

/// Runs a paste tool and returns its stdout. Some tools exit non-zero when
/// the clipboard holds no text; that reads as empty, not as a failure.
fn run_paste_tool(command: &mut Command, tool: &str) -> Result<String, String> {
    let output = command
        .output()
        .map_err(|e| format!("Failed to launch {}: {}", tool, e))?;

    if !output.status.success() {
        debug!(
            "{} exited with status {}; treating clipboard as empty",
            tool, output.status
        );
        return Ok(String::new());
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(target_os = "linux")]
fn tool_available(tool: &str) -> bool {
    Command::new("which")
        .arg(tool)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(target_os = "linux")]
fn is_wayland_session() -> bool {
    std::env::var("WAYLAND_DISPLAY").is_ok()
        || std::env::var("XDG_SESSION_TYPE")
            .map(|v| v.eq_ignore_ascii_case("wayland"))
            .unwrap_or(false)
}

#[cfg(target_os = "linux")]
fn read_clipboard_text() -> Result<String, String> {
    if is_wayland_session() && tool_available("wl-paste") {
        run_paste_tool(Command::new("wl-paste").arg("--no-newline"), "wl-paste")
    } else if tool_available("xclip") {
        run_paste_tool(
            Command::new("xclip").args(["-selection", "clipboard", "-o"]),
            "xclip",
        )
    } else if tool_available("xsel") {
        run_paste_tool(Command::new("xsel").args(["--clipboard", "--output"]), "xsel")
    } else {
        Err(
            "No clipboard tool found. Install `wl-paste` (Wayland) or `xclip`/`xsel` (X11)."
                .to_string(),
        )
    }
}

#[cfg(target_os = "macos")]
fn read_clipboard_text() -> Result<String, String> {
    run_paste_tool(&mut Command::new("pbpaste"), "pbpaste")
}

#[cfg(target_os = "windows")]
fn read_clipboard_text() -> Result<String, String> {
    run_paste_tool(
        Command::new("powershell").args(["-NoProfile", "-Command", "Get-Clipboard -Raw"]),
        "powershell",
    )
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn read_clipboard_text() -> Result<String, String> {
    Err("Clipboard access is not supported on this platform.".to_string())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn a_nonzero_exit_reads_as_an_empty_clipboard() {
        let text = run_paste_tool(&mut Command::new("false"), "false").unwrap();
        assert_eq!(text, "");
    }

    #[test]
    fn stdout_is_returned_verbatim() {
        let text = run_paste_tool(Command::new("printf").arg("gg ez"), "printf").unwrap();
        assert_eq!(text, "gg ez");
    }

    #[test]
    fn a_missing_tool_is_a_failure() {
        let result = run_paste_tool(
            &mut Command::new("/definitely/not/a/paste-tool"),
            "paste-tool",
        );
        assert!(result.is_err());
    }
}
