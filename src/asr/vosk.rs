//! Streaming recognizer backed by Vosk

use super::{AsrResult, StreamingRecognizer};
use crate::error::{FlowError, FlowResult};
use std::path::Path;
use tracing::{debug, info};
use vosk::{DecodingState, Model, Recognizer};

/// Audio handed to Vosk per decode step
const FRAME_SECONDS: f32 = 0.1;

/// Vosk-based streaming ASR engine
pub struct VoskRecognizer {
    model: Model,
    sample_rate: u32,
}

/// Per-session Vosk decoding state
pub struct VoskStream {
    recognizer: Recognizer,
    pending: Vec<i16>,
    frame_len: usize,
    text: String,
    endpoint: bool,
}

impl VoskRecognizer {
    /// Load a Vosk model directory
    pub fn new(model_path: &Path, sample_rate: u32) -> FlowResult<Self> {
        if !model_path.exists() {
            return Err(FlowError::Asr(format!(
                "Vosk model not found at {}",
                model_path.display()
            )));
        }

        info!("Loading Vosk model from: {}", model_path.display());

        let model_str = model_path.to_str().ok_or_else(|| {
            FlowError::Asr(format!(
                "Vosk model path is not valid UTF-8: {}",
                model_path.display()
            ))
        })?;

        let model = Model::new(model_str)
            .ok_or_else(|| FlowError::Asr("Failed to load Vosk model".to_string()))?;

        Ok(Self { model, sample_rate })
    }
}

impl StreamingRecognizer for VoskRecognizer {
    type Stream = VoskStream;

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn create_stream(&self) -> FlowResult<VoskStream> {
        let recognizer = Recognizer::new(&self.model, self.sample_rate as f32)
            .ok_or_else(|| FlowError::Asr("Failed to create Vosk recognizer".to_string()))?;

        Ok(VoskStream {
            recognizer,
            pending: Vec::new(),
            frame_len: ((self.sample_rate as f32 * FRAME_SECONDS) as usize).max(1),
            text: String::new(),
            endpoint: false,
        })
    }

    fn accept_waveform(&self, stream: &mut VoskStream, sample_rate: u32, samples: &[f32]) {
        if sample_rate != self.sample_rate {
            debug!(
                "Waveform at {} Hz fed to a {} Hz model",
                sample_rate, self.sample_rate
            );
        }
        stream.pending.extend(samples.iter().map(|&s| to_pcm16(s)));
    }

    fn is_ready(&self, stream: &VoskStream) -> bool {
        stream.pending.len() >= stream.frame_len
    }

    fn decode(&self, stream: &mut VoskStream) {
        let take = stream.frame_len.min(stream.pending.len());
        let frame: Vec<i16> = stream.pending.drain(..take).collect();

        match stream.recognizer.accept_waveform(&frame) {
            DecodingState::Finalized => {
                let result = stream.recognizer.final_result();
                let text = result
                    .single()
                    .and_then(|single| extract_text(single.text))
                    .unwrap_or_default();
                stream.text = text;
                stream.endpoint = true;
            }
            DecodingState::Running => {
                if !stream.endpoint {
                    let partial = stream.recognizer.partial_result().partial;
                    stream.text = extract_text(partial).unwrap_or_default();
                }
            }
            DecodingState::Failed => {
                debug!("Decoding failed for this chunk");
            }
        }
    }

    fn result(&self, stream: &VoskStream) -> AsrResult {
        AsrResult {
            text: stream.text.clone(),
        }
    }

    fn is_endpoint(&self, stream: &VoskStream) -> bool {
        stream.endpoint
    }

    fn reset(&self, stream: &mut VoskStream) {
        stream.recognizer.reset();
        stream.pending.clear();
        stream.text.clear();
        stream.endpoint = false;
    }
}

fn to_pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Extract text from Vosk result, filtering empty results
fn extract_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
