//! Mock Audio Source for Testing

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use turnflow::audio::AudioSource;
use turnflow::error::{FlowError, FlowResult};
use turnflow::shutdown::Shutdown;

/// Audio source that returns constant chunks
pub struct MockAudio {
    expected: u32,
    actual: u32,
    pub reads: Arc<AtomicUsize>,
    /// Trigger this shutdown once this many reads happened
    stop_after: Option<(usize, Shutdown)>,
    /// Fail reads beyond this count
    limit: Option<usize>,
}

impl MockAudio {
    pub fn new(expected: u32, actual: u32) -> Self {
        Self {
            expected,
            actual,
            reads: Arc::new(AtomicUsize::new(0)),
            stop_after: None,
            limit: None,
        }
    }

    pub fn at(rate: u32) -> Self {
        Self::new(rate, rate)
    }

    pub fn stop_after(mut self, reads: usize, shutdown: Shutdown) -> Self {
        self.stop_after = Some((reads, shutdown));
        self
    }

    pub fn fail_after(mut self, reads: usize) -> Self {
        self.limit = Some(reads);
        self
    }
}

impl AudioSource for MockAudio {
    fn read(&mut self, n: usize) -> FlowResult<Vec<f32>> {
        let count = self.reads.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(limit) = self.limit {
            if count > limit {
                return Err(FlowError::Audio("Capture stream closed".to_string()));
            }
        }
        if let Some((after, shutdown)) = &self.stop_after {
            if count >= *after {
                shutdown.trigger();
            }
        }

        Ok(vec![0.25; n])
    }

    fn expected_sample_rate(&self) -> u32 {
        self.expected
    }

    fn actual_sample_rate(&self) -> u32 {
        self.actual
    }
}
