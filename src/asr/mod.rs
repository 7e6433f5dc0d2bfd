//! ASR (Automatic Speech Recognition) Module
//!
//! Streaming recognizers consume audio into a per-session decoding stream
//! and expose the current best hypothesis plus an endpoint flag.
//! - Vosk: local offline recognition

pub mod vosk;

// Re-export main types
pub use vosk::VoskRecognizer;

use crate::error::FlowResult;

/// Current best hypothesis for a stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AsrResult {
    pub text: String,
}

/// Trait for streaming ASR engines
///
/// A stream is created once per session and reset, not recreated, at every
/// endpoint. Only one stream is decoded at a time.
pub trait StreamingRecognizer {
    type Stream;

    /// Sample rate the model was configured for
    fn sample_rate(&self) -> u32;

    /// Create the decoding state for a new session
    fn create_stream(&self) -> FlowResult<Self::Stream>;

    /// Append audio to the stream
    fn accept_waveform(&self, stream: &mut Self::Stream, sample_rate: u32, samples: &[f32]);

    /// True when enough audio is buffered for another decode step
    fn is_ready(&self, stream: &Self::Stream) -> bool;

    /// Run one decode step
    fn decode(&self, stream: &mut Self::Stream);

    fn result(&self, stream: &Self::Stream) -> AsrResult;

    /// True when the speaker is believed to have finished an utterance
    fn is_endpoint(&self, stream: &Self::Stream) -> bool;

    /// Clear the stream so the next utterance starts fresh
    fn reset(&self, stream: &mut Self::Stream);

    /// Decode until the stream has no more buffered work
    fn drain(&self, stream: &mut Self::Stream) {
        while self.is_ready(stream) {
            self.decode(stream);
        }
    }
}
