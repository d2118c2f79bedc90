use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared "something is loading" indicator read by the UI each frame.
///
/// Counts outstanding guards, so overlapping operations keep it raised until
/// the last one finishes.
#[derive(Debug, Clone, Default)]
pub struct LoadingFlag {
    active: Arc<AtomicUsize>,
}

impl LoadingFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.active.load(Ordering::Acquire) > 0
    }

    /// Raises the indicator until the returned guard is dropped.
    pub fn begin(&self) -> LoadingGuard {
        self.active.fetch_add(1, Ordering::AcqRel);
        LoadingGuard {
            active: Arc::clone(&self.active),
        }
    }
}

#[must_use = "the indicator drops as soon as the guard does"]
#[derive(Debug)]
pub struct LoadingGuard {
    active: Arc<AtomicUsize>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::AcqRel);
    }
}
