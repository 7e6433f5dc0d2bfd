//! Mock Streaming Recognizer for Testing
//!
//! Plays back a script of hypotheses, one entry per decode step.

use super::EventLog;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use turnflow::asr::{AsrResult, StreamingRecognizer};
use turnflow::error::FlowResult;

/// What the recognizer reports after one decode step
#[derive(Debug, Clone)]
pub struct ScriptStep {
    pub text: String,
    pub endpoint: bool,
    /// Text revealed once trailing silence is decoded
    pub padded_text: Option<String>,
}

impl ScriptStep {
    pub fn partial(text: &str) -> Self {
        Self {
            text: text.to_string(),
            endpoint: false,
            padded_text: None,
        }
    }

    pub fn endpoint(text: &str) -> Self {
        Self {
            text: text.to_string(),
            endpoint: true,
            padded_text: None,
        }
    }

    pub fn endpoint_with_tail(text: &str, padded: &str) -> Self {
        Self {
            text: text.to_string(),
            endpoint: true,
            padded_text: Some(padded.to_string()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MockStream {
    ready: usize,
    text: String,
    endpoint: bool,
    padded_text: Option<String>,
}

/// Mock recognizer that returns predetermined hypotheses
pub struct MockAsr {
    script: Mutex<VecDeque<ScriptStep>>,
    rate: u32,
    /// Decode steps made ready by each accepted waveform
    decodes_per_chunk: usize,
    events: EventLog,
    /// Length of every waveform accepted (for verification)
    pub fed: Arc<Mutex<Vec<usize>>>,
    pub decodes: Arc<AtomicUsize>,
    pub streams_created: Arc<AtomicUsize>,
}

impl MockAsr {
    pub fn new(script: Vec<ScriptStep>, events: EventLog) -> Self {
        Self {
            script: Mutex::new(script.into()),
            rate: 16000,
            decodes_per_chunk: 1,
            events,
            fed: Arc::new(Mutex::new(Vec::new())),
            decodes: Arc::new(AtomicUsize::new(0)),
            streams_created: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_decodes_per_chunk(mut self, n: usize) -> Self {
        self.decodes_per_chunk = n;
        self
    }
}

impl StreamingRecognizer for MockAsr {
    type Stream = MockStream;

    fn sample_rate(&self) -> u32 {
        self.rate
    }

    fn create_stream(&self) -> FlowResult<MockStream> {
        self.streams_created.fetch_add(1, Ordering::SeqCst);
        Ok(MockStream::default())
    }

    fn accept_waveform(&self, stream: &mut MockStream, _sample_rate: u32, samples: &[f32]) {
        self.fed.lock().unwrap().push(samples.len());
        stream.ready += self.decodes_per_chunk;
    }

    fn is_ready(&self, stream: &MockStream) -> bool {
        stream.ready > 0
    }

    fn decode(&self, stream: &mut MockStream) {
        self.decodes.fetch_add(1, Ordering::SeqCst);
        stream.ready -= 1;

        if stream.endpoint {
            if let Some(padded) = stream.padded_text.take() {
                stream.text = padded;
            }
            return;
        }

        if let Some(step) = self.script.lock().unwrap().pop_front() {
            stream.text = step.text;
            stream.endpoint = step.endpoint;
            stream.padded_text = step.padded_text;
        }
    }

    fn result(&self, stream: &MockStream) -> AsrResult {
        AsrResult {
            text: stream.text.clone(),
        }
    }

    fn is_endpoint(&self, stream: &MockStream) -> bool {
        stream.endpoint
    }

    fn reset(&self, stream: &mut MockStream) {
        self.events.push("reset");
        *stream = MockStream::default();
    }
}
