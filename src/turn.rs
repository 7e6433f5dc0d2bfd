//! Turn Coordinator
//!
//! Owns the capture → decode → endpoint loop and the synchronous handshake
//! that hands each finished utterance to the language-model service and
//! then tells the speech-output service to hold its output.
//!
//! Everything here runs on one thread. The only thing shared with other
//! threads is the [`Shutdown`] flag, which is polled once per chunk.

use crate::asr::StreamingRecognizer;
use crate::audio::{check_sample_rate, AudioSource};
use crate::channel::RequestChannel;
use crate::config::Config;
use crate::display::Display;
use crate::error::FlowResult;
use crate::shutdown::Shutdown;
use crate::text::{normalize, HypothesisFilter};
use crate::transcript::Transcript;
use tracing::{debug, info, warn};

/// Whether the speech-output side is currently held
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnState {
    #[default]
    Capturing,
    Blocked,
}

impl TurnState {
    fn block(self) -> Self {
        debug_assert_eq!(self, TurnState::Capturing, "handshake re-entered");
        TurnState::Blocked
    }

    fn release(self) -> Self {
        debug_assert_eq!(self, TurnState::Blocked, "release without block");
        TurnState::Capturing
    }
}

/// Which request of the handshake failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeStage {
    Deliver,
    Block,
}

/// Result of one finalized, non-empty utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Delivered {
        segment: u64,
        text: String,
        reply: String,
        block_ack: String,
    },
    DeliveryFailed {
        segment: u64,
        text: String,
        stage: HandshakeStage,
        error: String,
    },
}

impl TurnOutcome {
    pub fn segment(&self) -> u64 {
        match self {
            TurnOutcome::Delivered { segment, .. } | TurnOutcome::DeliveryFailed { segment, .. } => {
                *segment
            }
        }
    }

    pub fn text(&self) -> &str {
        match self {
            TurnOutcome::Delivered { text, .. } | TurnOutcome::DeliveryFailed { text, .. } => text,
        }
    }
}

/// Counters reported when the loop exits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub turns_delivered: u64,
    pub turns_failed: u64,
    pub segments: u64,
}

/// Loop parameters derived from the config and the negotiated device rate
#[derive(Debug, Clone, PartialEq)]
pub struct TurnSettings {
    pub sample_rate: u32,
    pub chunk_samples: usize,
    pub tail_sensitive: bool,
    pub tail_padding_samples: usize,
    pub block_message: String,
}

impl TurnSettings {
    pub fn from_config(config: &Config, actual_rate: u32) -> Self {
        Self {
            sample_rate: config.sample_rate,
            chunk_samples: config.chunk_samples(actual_rate),
            tail_sensitive: config.tail_sensitive(),
            tail_padding_samples: config.tail_padding_samples(),
            block_message: config.block_message.clone(),
        }
    }
}

/// The two downstream request/response clients
pub struct TurnChannels {
    /// Receives each finalized utterance
    pub llm: Box<dyn RequestChannel>,
    /// Receives the fixed block signal
    pub block: Box<dyn RequestChannel>,
}

pub struct TurnCoordinator<R: StreamingRecognizer, A: AudioSource> {
    recognizer: R,
    stream: R::Stream,
    audio: A,
    channels: TurnChannels,
    display: Box<dyn Display>,
    shutdown: Shutdown,
    settings: TurnSettings,
    filter: HypothesisFilter,
    segment: u64,
    state: TurnState,
    transcript: Option<Transcript>,
    summary: SessionSummary,
}

impl<R: StreamingRecognizer, A: AudioSource> TurnCoordinator<R, A> {
    /// Check the audio rate and create the session's stream.
    ///
    /// A rate mismatch fails before any stream exists.
    pub fn new(
        recognizer: R,
        audio: A,
        channels: TurnChannels,
        display: Box<dyn Display>,
        shutdown: Shutdown,
        settings: TurnSettings,
    ) -> FlowResult<Self> {
        check_sample_rate(&audio, settings.sample_rate)?;
        let stream = recognizer.create_stream()?;

        info!(
            "🎧 Session ready: {} Hz, {} samples/chunk, tail padding {}",
            settings.sample_rate,
            settings.chunk_samples,
            if settings.tail_sensitive { "on" } else { "off" }
        );

        Ok(Self {
            recognizer,
            stream,
            audio,
            channels,
            display,
            shutdown,
            settings,
            filter: HypothesisFilter::new(),
            segment: 0,
            state: TurnState::Capturing,
            transcript: None,
            summary: SessionSummary::default(),
        })
    }

    pub fn with_transcript(mut self, transcript: Transcript) -> Self {
        self.transcript = Some(transcript);
        self
    }

    pub fn segment(&self) -> u64 {
        self.segment
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn summary(&self) -> &SessionSummary {
        &self.summary
    }

    /// Run until the shutdown flag is seen at a chunk boundary.
    ///
    /// Audio errors end the session; handshake failures do not.
    pub fn run(&mut self) -> FlowResult<SessionSummary> {
        while !self.shutdown.is_triggered() {
            self.step()?;
        }

        info!(
            "🛑 Stopping after {} segment(s): {} delivered, {} failed",
            self.summary.segments, self.summary.turns_delivered, self.summary.turns_failed
        );
        Ok(self.summary.clone())
    }

    /// One capture → decode → dedup → endpoint iteration.
    ///
    /// Returns the outcome when this chunk finished a non-empty utterance.
    pub fn step(&mut self) -> FlowResult<Option<TurnOutcome>> {
        let samples = self.audio.read(self.settings.chunk_samples)?;
        self.recognizer
            .accept_waveform(&mut self.stream, self.settings.sample_rate, &samples);
        self.recognizer.drain(&mut self.stream);

        let mut text = self.recognizer.result(&self.stream).text;
        let is_endpoint = self.recognizer.is_endpoint(&self.stream);

        if is_endpoint && self.settings.tail_sensitive {
            self.flush_tail();
            text = self.recognizer.result(&self.stream).text;
        }

        if let Some(shown) = self.filter.accept(&text) {
            self.display.show(self.segment, shown);
        }

        if !is_endpoint {
            return Ok(None);
        }

        let finalized = normalize(&text);
        let outcome = if finalized.is_empty() {
            debug!("Endpoint with empty text, skipping handshake");
            None
        } else {
            Some(self.handshake(finalized))
        };

        self.recognizer.reset(&mut self.stream);
        self.filter.clear();
        Ok(outcome)
    }

    /// Feed trailing silence so a tail-sensitive decoder emits its last tokens
    fn flush_tail(&mut self) {
        let padding = vec![0.0f32; self.settings.tail_padding_samples];
        debug!("Flushing tail with {} zero samples", padding.len());
        self.recognizer
            .accept_waveform(&mut self.stream, self.settings.sample_rate, &padding);
        self.recognizer.drain(&mut self.stream);
    }

    /// Deliver, then block, then advance the segment. Strictly in that order.
    fn handshake(&mut self, text: String) -> TurnOutcome {
        let segment = self.segment;

        let outcome = match self.channels.llm.request(&text) {
            Ok(reply) => {
                info!("[LLM -> Voice] Response: {}", reply);

                self.state = self.state.block();
                let block = self
                    .channels
                    .block
                    .request(&self.settings.block_message);
                self.state = self.state.release();

                match block {
                    Ok(block_ack) => {
                        info!("[TTS -> Voice] Block response: {}", block_ack);
                        TurnOutcome::Delivered {
                            segment,
                            text,
                            reply,
                            block_ack,
                        }
                    }
                    Err(e) => {
                        warn!(
                            "⚠️ Block signal to {} failed for segment {}: {}",
                            self.channels.block.address(),
                            segment,
                            e
                        );
                        TurnOutcome::DeliveryFailed {
                            segment,
                            text,
                            stage: HandshakeStage::Block,
                            error: e.to_string(),
                        }
                    }
                }
            }
            Err(e) => {
                warn!(
                    "⚠️ Delivery to {} failed for segment {}: {}",
                    self.channels.llm.address(),
                    segment,
                    e
                );
                TurnOutcome::DeliveryFailed {
                    segment,
                    text,
                    stage: HandshakeStage::Deliver,
                    error: e.to_string(),
                }
            }
        };

        self.segment += 1;
        self.summary.segments = self.segment;
        let status = match &outcome {
            TurnOutcome::Delivered { .. } => {
                self.summary.turns_delivered += 1;
                "delivered"
            }
            TurnOutcome::DeliveryFailed { .. } => {
                self.summary.turns_failed += 1;
                "failed"
            }
        };

        if let Some(transcript) = &self.transcript {
            if let Err(e) = transcript.record(segment, status, outcome.text()) {
                warn!("Failed to write transcript: {}", e);
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_state_transitions() {
        let state = TurnState::default();
        assert_eq!(state, TurnState::Capturing);
        let blocked = state.block();
        assert_eq!(blocked, TurnState::Blocked);
        assert_eq!(blocked.release(), TurnState::Capturing);
    }

    #[test]
    fn test_settings_from_config() {
        let config = Config {
            encoder_model_path: "encoder.onnx".to_string(),
            ..Config::default()
        };
        let settings = TurnSettings::from_config(&config, 16000);
        assert_eq!(settings.chunk_samples, 1600);
        assert_eq!(settings.tail_padding_samples, 16000);
        assert!(settings.tail_sensitive);
        assert_eq!(settings.block_message, "block");
    }
}
