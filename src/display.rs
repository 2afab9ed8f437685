use chrono::Local;

use crate::pipeline::RenderItem;

/// How translated pairs are presented. Compact shows translations only,
/// for overlay-style output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayMode {
    Verbose,
    Compact,
}

/// Formats one render item for a line-oriented sink. Error items look the
/// same in both modes so they stay visible in compact output.
pub fn format_item(item: &RenderItem, mode: DisplayMode) -> String {
    match item {
        RenderItem::Error(signal) => format!("[error] {}: {}", signal.component, signal.message),
        RenderItem::Pair(pair) => match mode {
            DisplayMode::Compact => pair.translated.clone(),
            DisplayMode::Verbose => {
                format!("[orig] {}\n[translated] {}", pair.original, pair.translated)
            }
        },
    }
}

/// Terminal display sink: prints render items in arrival order, each line
/// stamped with the local wall-clock time.
pub struct TerminalSink {
    mode: DisplayMode,
}

impl TerminalSink {
    pub fn new(mode: DisplayMode) -> Self {
        Self { mode }
    }

    pub fn render(&self, item: &RenderItem) {
        let stamp = Local::now().format("%H:%M:%S");
        for line in format_item(item, self.mode).lines() {
            println!("[{}] {}", stamp, line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{ErrorSignal, TranslatedPair};

    fn pair() -> RenderItem {
        RenderItem::Pair(TranslatedPair {
            original: "gg ez".to_string(),
            translated: "fácil, bien jugado".to_string(),
        })
    }

    #[test]
    fn verbose_mode_shows_both_sides() {
        let text = format_item(&pair(), DisplayMode::Verbose);
        assert_eq!(text, "[orig] gg ez\n[translated] fácil, bien jugado");
    }

    #[test]
    fn compact_mode_shows_only_the_translation() {
        let text = format_item(&pair(), DisplayMode::Compact);
        assert_eq!(text, "fácil, bien jugado");
    }

    #[test]
    fn errors_are_marked_regardless_of_mode() {
        let item = RenderItem::Error(ErrorSignal::new("screen", "capture failed"));
        for mode in [DisplayMode::Verbose, DisplayMode::Compact] {
            assert_eq!(format_item(&item, mode), "[error] screen: capture failed");
        }
    }
}
