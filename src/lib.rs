//! Turnflow Library
//!
//! Streaming speech recognition front end: turns a continuous microphone
//! stream into discrete utterances and hands each one to a language-model
//! service while holding back the speech-output service.

pub mod asr;
pub mod audio;
pub mod channel;
pub mod config;
pub mod display;
pub mod error;
pub mod shutdown;
pub mod text;
pub mod transcript;
pub mod turn;
