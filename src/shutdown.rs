//! Cooperative stop flag shared between the signal watcher and the capture loop.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Process-wide stop request. Cloning shares the same flag.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    flag: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the loop to stop at its next chunk boundary
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
