//! Turnflow - streaming voice front end
//!
//! Listens on a microphone, prints partial hypotheses, and forwards each
//! finished utterance to the language-model service.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use turnflow::asr::VoskRecognizer;
use turnflow::audio::{self, AudioSource, MicSource};
use turnflow::channel;
use turnflow::config::{self, Config};
use turnflow::display::TerminalDisplay;
use turnflow::shutdown::Shutdown;
use turnflow::transcript::Transcript;
use turnflow::turn::{SessionSummary, TurnChannels, TurnCoordinator, TurnSettings};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Audio input device name (system default when omitted)
    device: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Sample rate the recognizer expects
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Encoder model path; enables tail padding on endpoints
    #[arg(long)]
    encoder: Option<String>,

    /// Vosk model directory
    #[arg(long)]
    model: Option<String>,

    /// Language-model service address (tcp://, unix:// or http://)
    #[arg(long)]
    llm: Option<String>,

    /// Speech-output block address
    #[arg(long)]
    block: Option<String>,

    /// Per-request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Append finished turns to this file
    #[arg(long)]
    transcript: Option<String>,

    /// List input devices and exit
    #[arg(long)]
    list_devices: bool,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(rate) = self.sample_rate {
            config.sample_rate = rate;
        }
        if let Some(encoder) = &self.encoder {
            config.encoder_model_path = encoder.clone();
        }
        if let Some(model) = &self.model {
            config.model_path = model.clone();
        }
        if let Some(llm) = &self.llm {
            config.llm_address = llm.clone();
        }
        if let Some(block) = &self.block {
            config.block_address = block.clone();
        }
        if let Some(timeout) = self.timeout_ms {
            config.request_timeout_ms = timeout;
        }
        if let Some(transcript) = &self.transcript {
            config.transcript_path = transcript.clone();
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config_path = args.config.clone().unwrap_or_else(config::config_path);
    let mut config = Config::load_from(&config_path)
        .with_context(|| format!("Failed to read config {}", config_path.display()))?;
    args.apply(&mut config);

    // Setup logging
    let level = if args.verbose {
        Level::DEBUG
    } else {
        config.log_level.parse().unwrap_or(Level::INFO)
    };
    // RUST_LOG wins over the configured level
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if args.list_devices {
        for (i, name) in audio::list_devices()?.iter().enumerate() {
            println!("[{}] {}", i, name);
        }
        return Ok(());
    }

    config.validate()?;
    info!("🎙️ Turnflow v{} starting...", env!("CARGO_PKG_VERSION"));

    let shutdown = Shutdown::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Caught Ctrl + C. Exiting...");
                shutdown.trigger();
            }
        });
    }

    // Capture and decoding stay on one blocking thread for the whole session
    let device = args.device.clone();
    let summary = tokio::task::spawn_blocking(move || run_session(config, device, shutdown))
        .await
        .context("Session thread panicked")??;

    info!(
        "✅ Session finished: {} delivered, {} failed",
        summary.turns_delivered, summary.turns_failed
    );
    Ok(())
}

fn run_session(
    config: Config,
    device: Option<String>,
    shutdown: Shutdown,
) -> Result<SessionSummary> {
    let mic = MicSource::open(device.as_deref(), config.sample_rate)
        .context("Failed to open audio device")?;
    audio::check_sample_rate(&mic, config.sample_rate)?;

    let recognizer = VoskRecognizer::new(Path::new(&config.model_path), config.sample_rate)?;

    let channels = TurnChannels {
        llm: channel::open(&config.llm_address, config.request_timeout())?,
        block: channel::open(&config.block_address, config.request_timeout())?,
    };
    info!(
        "🔌 Delivering to {}, block signal to {}",
        config.llm_address, config.block_address
    );

    let settings = TurnSettings::from_config(&config, mic.actual_sample_rate());
    let mut coordinator = TurnCoordinator::new(
        recognizer,
        mic,
        channels,
        Box::new(TerminalDisplay::stderr()),
        shutdown,
        settings,
    )?;
    if !config.transcript_path.is_empty() {
        coordinator = coordinator.with_transcript(Transcript::new(&config.transcript_path));
    }

    info!("✅ Listening - speak now");
    Ok(coordinator.run()?)
}
