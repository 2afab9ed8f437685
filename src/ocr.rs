//! Screen-region text extraction.
//!
//! The pipeline only depends on the [`OcrCapture`] trait; the default
//! implementation drives a platform screenshot tool plus the `tesseract`
//! CLI.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::settings::CaptureRegion;

/// Overrides the `tesseract` executable used for text extraction.
pub const TESSERACT_PATH_ENV: &str = "LINGO_TESSERACT_PATH";

const TESSERACT_EXECUTABLE: &str = "tesseract";
const TESSERACT_OUTPUT_TARGET: &str = "stdout";
const TESSERACT_PAGE_SEGMENT_MODE: &str = "6";

/// Opaque screen-text capability: capture a rectangular screen region and
/// return whatever text it contains.
pub trait OcrCapture: Send + Sync {
    fn capture_text(&self, region: &CaptureRegion) -> Result<String, String>;
}

/// Default capture backend: platform screenshot tool + tesseract CLI.
#[derive(Debug, Default)]
pub struct CommandOcr;

impl CommandOcr {
    pub fn new() -> Self {
        Self
    }
}

impl OcrCapture for CommandOcr {
    fn capture_text(&self, region: &CaptureRegion) -> Result<String, String> {
        let screenshot = TempImageFile::create("png")?;
        capture_region_screenshot(region, screenshot.path())?;
        run_tesseract(screenshot.path())
    }
}

fn resolve_tesseract_executable() -> String {
    match env::var(TESSERACT_PATH_ENV) {
        Ok(path) if !path.trim().is_empty() => path.trim().to_string(),
        _ => TESSERACT_EXECUTABLE.to_string(),
    }
}

fn run_tesseract(image_path: &Path) -> Result<String, String> {
    let executable = resolve_tesseract_executable();
    let output = Command::new(&executable)
        .arg(image_path)
        .arg(TESSERACT_OUTPUT_TARGET)
        .arg("--psm")
        .arg(TESSERACT_PAGE_SEGMENT_MODE)
        .output()
        .map_err(|error| format!("Failed to launch {}: {}", executable, error))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.trim().is_empty() {
            return Err(format!("Tesseract exited with status {}.", output.status));
        }
        return Err(format!("Tesseract OCR failed: {}", stderr.trim()));
    }

    String::from_utf8(output.stdout)
        .map(|text| text.trim().to_string())
        .map_err(|error| format!("Failed to decode Tesseract output: {}", error))
}

#[cfg(any(target_os = "linux", test))]
fn grim_geometry(region: &CaptureRegion) -> String {
    format!(
        "{},{} {}x{}",
        region.left,
        region.top,
        region.width(),
        region.height()
    )
}

#[cfg(any(target_os = "linux", test))]
fn import_crop_geometry(region: &CaptureRegion) -> String {
    format!(
        "{}x{}+{}+{}",
        region.width(),
        region.height(),
        region.left,
        region.top
    )
}

#[cfg(target_os = "linux")]
fn is_wayland_session() -> bool {
    env::var("WAYLAND_DISPLAY").is_ok()
        || env::var("XDG_SESSION_TYPE")
            .map(|v| v.eq_ignore_ascii_case("wayland"))
            .unwrap_or(false)
}

#[cfg(target_os = "linux")]
fn capture_region_screenshot(region: &CaptureRegion, output_path: &Path) -> Result<(), String> {
    const GRIM_EXECUTABLE: &str = "grim";
    const IMPORT_EXECUTABLE: &str = "import";

    if is_wayland_session() && command_exists(GRIM_EXECUTABLE) {
        let output = Command::new(GRIM_EXECUTABLE)
            .arg("-g")
            .arg(grim_geometry(region))
            .arg(output_path)
            .output()
            .map_err(|error| format!("Failed to launch {}: {}", GRIM_EXECUTABLE, error))?;
        check_capture_output(GRIM_EXECUTABLE, &output, output_path)
    } else if command_exists(IMPORT_EXECUTABLE) {
        let output = Command::new(IMPORT_EXECUTABLE)
            .arg("-window")
            .arg("root")
            .arg("-crop")
            .arg(import_crop_geometry(region))
            .arg(output_path)
            .output()
            .map_err(|error| format!("Failed to launch {}: {}", IMPORT_EXECUTABLE, error))?;
        check_capture_output(IMPORT_EXECUTABLE, &output, output_path)
    } else {
        Err(
            "No screen capture tool found. Install `grim` (Wayland) or ImageMagick `import` (X11)."
                .to_string(),
        )
    }
}

#[cfg(target_os = "macos")]
fn capture_region_screenshot(region: &CaptureRegion, output_path: &Path) -> Result<(), String> {
    const SCREENCAPTURE_EXECUTABLE: &str = "screencapture";

    let rect = format!(
        "{},{},{},{}",
        region.left,
        region.top,
        region.width(),
        region.height()
    );
    let output = Command::new(SCREENCAPTURE_EXECUTABLE)
        .arg("-x")
        .arg("-R")
        .arg(rect)
        .arg(output_path)
        .output()
        .map_err(|error| format!("Failed to launch {}: {}", SCREENCAPTURE_EXECUTABLE, error))?;
    check_capture_output(SCREENCAPTURE_EXECUTABLE, &output, output_path)
}

#[cfg(target_os = "windows")]
fn capture_region_screenshot(region: &CaptureRegion, output_path: &Path) -> Result<(), String> {
    let script = format!(
        "Add-Type -AssemblyName System.Drawing; \
$bmp = New-Object System.Drawing.Bitmap {width}, {height}; \
$gfx = [System.Drawing.Graphics]::FromImage($bmp); \
$gfx.CopyFromScreen({left}, {top}, 0, 0, $bmp.Size); \
$bmp.Save('{path}')",
        width = region.width(),
        height = region.height(),
        left = region.left,
        top = region.top,
        path = output_path.display(),
    );
    let output = Command::new("powershell")
        .args(["-NoProfile", "-Command", &script])
        .output()
        .map_err(|error| format!("Failed to launch powershell: {}", error))?;
    check_capture_output("powershell", &output, output_path)
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn capture_region_screenshot(_region: &CaptureRegion, _output_path: &Path) -> Result<(), String> {
    Err("Screen capture is not supported on this platform.".to_string())
}

#[allow(dead_code)]
fn check_capture_output(
    tool: &str,
    output: &std::process::Output,
    output_path: &Path,
) -> Result<(), String> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.trim().is_empty() {
            return Err(format!("{} exited with status {}.", tool, output.status));
        }
        return Err(format!("{} failed: {}", tool, stderr.trim()));
    }

    let metadata = fs::metadata(output_path).map_err(|error| {
        format!(
            "Screenshot command did not produce output file '{}': {}",
            output_path.display(),
            error
        )
    })?;

    if metadata.len() == 0 {
        return Err(format!(
            "Screenshot command produced an empty file: '{}'.",
            output_path.display()
        ));
    }

    Ok(())
}

#[cfg(target_os = "linux")]
fn command_exists(command: &str) -> bool {
    if command.contains('/') {
        return is_executable(Path::new(command));
    }

    env::var_os("PATH")
        .map(|path_var| {
            env::split_paths(&path_var).any(|directory| is_executable(&directory.join(command)))
        })
        .unwrap_or(false)
}

#[cfg(target_os = "linux")]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    fs::metadata(path)
        .map(|metadata| metadata.is_file() && (metadata.permissions().mode() & 0o111 != 0))
        .unwrap_or(false)
}

struct TempImageFile {
    path: PathBuf,
}

impl TempImageFile {
    fn create(extension: &str) -> Result<Self, String> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|duration| duration.as_nanos())
            .unwrap_or_default();

        let path = env::temp_dir().join(format!(
            "lingo-ocr-{}-{}.{}",
            std::process::id(),
            timestamp,
            extension
        ));

        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempImageFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> CaptureRegion {
        CaptureRegion {
            left: 100,
            top: 600,
            right: 900,
            bottom: 900,
        }
    }

    #[test]
    fn grim_geometry_uses_origin_plus_size() {
        assert_eq!(grim_geometry(&region()), "100,600 800x300");
    }

    #[test]
    fn import_crop_geometry_uses_size_plus_offset() {
        assert_eq!(import_crop_geometry(&region()), "800x300+100+600");
    }

    #[test]
    fn tesseract_executable_honors_the_env_override() {
        env::set_var(TESSERACT_PATH_ENV, "/opt/tesseract/bin/tesseract");
        assert_eq!(
            resolve_tesseract_executable(),
            "/opt/tesseract/bin/tesseract"
        );

        env::set_var(TESSERACT_PATH_ENV, "  ");
        assert_eq!(resolve_tesseract_executable(), TESSERACT_EXECUTABLE);

        env::remove_var(TESSERACT_PATH_ENV);
        assert_eq!(resolve_tesseract_executable(), TESSERACT_EXECUTABLE);
    }
}
