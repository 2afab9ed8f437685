use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation token shared between a session and its
/// background loops.
///
/// Loops check the flag at the top of each poll iteration, so cancellation
/// is observed within one polling interval. Nothing is ever force-killed.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Failure notice produced by a background component, tagged with the
/// component name so the display sink can attribute it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorSignal {
    pub component: String,
    pub message: String,
}

impl ErrorSignal {
    pub fn new(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.component, self.message)
    }
}

/// Items carried by the ingest channel, from adapters to the dispatch
/// worker. Lines are already trimmed and non-empty when they reach the
/// channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IngestItem {
    Line(String),
    Error(ErrorSignal),
}

/// A successfully translated line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranslatedPair {
    pub original: String,
    pub translated: String,
}

/// Items carried by the render channel, from the dispatch worker to the
/// display sink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderItem {
    Pair(TranslatedPair),
    Error(ErrorSignal),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_flag_is_shared_between_clones() {
        let flag = CancelFlag::new();
        let observer = flag.clone();
        assert!(!observer.is_cancelled());
        flag.cancel();
        assert!(observer.is_cancelled());
    }

    #[test]
    fn error_signal_displays_component_and_message() {
        let signal = ErrorSignal::new("clipboard", "access denied");
        assert_eq!(signal.to_string(), "clipboard: access denied");
    }
}
