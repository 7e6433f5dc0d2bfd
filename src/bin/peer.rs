//! Turnflow Peer - loopback stand-in for a downstream service
//!
//! Run with: cargo run --bin turnflow-peer -- --role tts --listen 127.0.0.1:6677

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::time::Duration;
use tracing::{info, Level};
use turnflow::channel::ChannelServer;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Role {
    /// Acknowledge delivered utterances
    Llm,
    /// Acknowledge block signals
    Tts,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:5555")]
    listen: String,

    /// Which service to impersonate
    #[arg(short, long, value_enum, default_value = "llm")]
    role: Role,

    /// Simulated processing time per request
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let role = args.role;
    let delay = Duration::from_millis(args.delay_ms);
    let mut server = ChannelServer::new();
    let addr = server.start(&args.listen, move |payload| {
        info!("📥 {:?} request: {}", role, payload);
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        match role {
            Role::Llm => Ok(format!("ack: {}", payload)),
            Role::Tts if payload == "block" => Ok("blocked".to_string()),
            Role::Tts => Err(format!("unknown signal: {}", payload)),
        }
    })?;

    info!("✅ Peer ({:?}) ready on {}", role, addr);
    tokio::signal::ctrl_c().await?;
    server.stop();
    Ok(())
}
