//! Audio capture module using cpal

use crate::error::{FlowError, FlowResult};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, SupportedStreamConfig};
use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};
use tracing::{debug, info, warn};

/// Blocking pull source of mono PCM samples
pub trait AudioSource {
    /// Block until `n` samples are available and return them
    fn read(&mut self, n: usize) -> FlowResult<Vec<f32>>;

    /// Rate the source was asked to deliver
    fn expected_sample_rate(&self) -> u32;

    /// Rate the device actually negotiated
    fn actual_sample_rate(&self) -> u32;
}

/// Fail startup when the device rate differs from what the recognizer expects.
///
/// Samples are never resampled or truncated to paper over a mismatch.
pub fn check_sample_rate(source: &dyn AudioSource, recognizer_rate: u32) -> FlowResult<()> {
    let actual = source.actual_sample_rate();
    if actual != recognizer_rate {
        return Err(FlowError::SampleRateMismatch {
            expected: recognizer_rate,
            actual,
        });
    }
    Ok(())
}

/// List the names of available input devices
pub fn list_devices() -> FlowResult<Vec<String>> {
    let host = cpal::default_host();
    let devices = host
        .input_devices()
        .map_err(|e| FlowError::Audio(e.to_string()))?;
    Ok(devices
        .map(|d| d.name().unwrap_or_else(|_| "Unknown".to_string()))
        .collect())
}

/// Microphone capture through cpal
pub struct MicSource {
    // Dropping the stream stops capture
    _stream: cpal::Stream,
    rx: Receiver<Vec<f32>>,
    pending: VecDeque<f32>,
    expected_rate: u32,
    actual_rate: u32,
}

impl MicSource {
    /// Open a named input device (or the default one) and start capturing
    pub fn open(device_name: Option<&str>, expected_rate: u32) -> FlowResult<Self> {
        let host = cpal::default_host();

        let device = match device_name {
            Some(wanted) => host
                .input_devices()
                .map_err(|e| FlowError::Audio(e.to_string()))?
                .find(|d| d.name().map(|n| n == wanted).unwrap_or(false))
                .ok_or_else(|| FlowError::Audio(format!("Input device not found: {}", wanted)))?,
            None => host
                .default_input_device()
                .ok_or_else(|| FlowError::Audio("No default input device".to_string()))?,
        };

        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        info!("Using audio device: {}", name);

        let supported = pick_config(&device, expected_rate)?;
        let actual_rate = supported.sample_rate().0;
        let channels = supported.channels() as usize;
        let format = supported.sample_format();
        if actual_rate != expected_rate {
            warn!(
                "⚠️ Device '{}' does not offer {} Hz, negotiated {} Hz",
                name, expected_rate, actual_rate
            );
        }
        debug!(
            "Stream config: {} Hz, {} channel(s), {:?}",
            actual_rate, channels, format
        );

        let (tx, rx): (Sender<Vec<f32>>, Receiver<Vec<f32>>) = mpsc::channel();
        let config = supported.config();
        let err_fn = |err: cpal::StreamError| warn!("Audio stream error: {}", err);

        let stream = match format {
            SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    forward(&tx, downmix(data, channels));
                },
                err_fn,
                None,
            ),
            SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let floats: Vec<f32> = data.iter().map(|&s| s as f32 / 32768.0).collect();
                    forward(&tx, downmix(&floats, channels));
                },
                err_fn,
                None,
            ),
            other => {
                return Err(FlowError::Audio(format!(
                    "Unsupported sample format: {:?}",
                    other
                )))
            }
        }
        .map_err(|e| FlowError::Audio(e.to_string()))?;

        stream
            .play()
            .map_err(|e| FlowError::Audio(e.to_string()))?;
        info!("🎙️ Audio capture started");

        Ok(Self {
            _stream: stream,
            rx,
            pending: VecDeque::new(),
            expected_rate,
            actual_rate,
        })
    }
}

impl AudioSource for MicSource {
    fn read(&mut self, n: usize) -> FlowResult<Vec<f32>> {
        while self.pending.len() < n {
            let frame = self
                .rx
                .recv()
                .map_err(|_| FlowError::Audio("Capture stream closed".to_string()))?;
            self.pending.extend(frame);
        }
        Ok(self.pending.drain(..n).collect())
    }

    fn expected_sample_rate(&self) -> u32 {
        self.expected_rate
    }

    fn actual_sample_rate(&self) -> u32 {
        self.actual_rate
    }
}

/// Prefer a config that offers the expected rate in a format we can read,
/// otherwise fall back to the device default.
fn pick_config(device: &cpal::Device, expected_rate: u32) -> FlowResult<SupportedStreamConfig> {
    let ranges = device
        .supported_input_configs()
        .map_err(|e| FlowError::Audio(e.to_string()))?;

    let mut best: Option<SupportedStreamConfig> = None;
    for range in ranges {
        let readable = matches!(range.sample_format(), SampleFormat::F32 | SampleFormat::I16);
        let covers = range.min_sample_rate().0 <= expected_rate
            && range.max_sample_rate().0 >= expected_rate;
        if !readable || !covers {
            continue;
        }
        let candidate = range.with_sample_rate(SampleRate(expected_rate));
        let fewer_channels = best
            .as_ref()
            .map(|b| candidate.channels() < b.channels())
            .unwrap_or(true);
        if fewer_channels {
            best = Some(candidate);
        }
    }

    match best {
        Some(config) => Ok(config),
        None => device
            .default_input_config()
            .map_err(|e| FlowError::Audio(e.to_string())),
    }
}

fn forward(tx: &Sender<Vec<f32>>, samples: Vec<f32>) {
    if tx.send(samples).is_err() {
        warn!("Audio receiver dropped");
    }
}

/// Average interleaved channels into a mono signal
pub fn downmix(data: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return data.to_vec();
    }
    data.chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}
