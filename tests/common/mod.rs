#![allow(dead_code)]

pub mod mock_asr;
pub mod mock_audio;
pub mod mock_channel;

use std::net::{TcpListener, TcpStream};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use turnflow::display::Display;

/// Ordered record of what the fakes saw, shared across them
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Index of the first event equal to `event`
    pub fn position(&self, event: &str) -> Option<usize> {
        self.0.lock().unwrap().iter().position(|e| e == event)
    }
}

/// Display that records every call
#[derive(Clone, Default)]
pub struct RecordingDisplay {
    pub shown: Arc<Mutex<Vec<(u64, String)>>>,
    events: EventLog,
}

impl RecordingDisplay {
    pub fn new(events: EventLog) -> Self {
        Self {
            shown: Arc::new(Mutex::new(Vec::new())),
            events,
        }
    }

    pub fn texts(&self) -> Vec<String> {
        self.shown.lock().unwrap().iter().map(|(_, t)| t.clone()).collect()
    }
}

impl Display for RecordingDisplay {
    fn show(&mut self, segment: u64, text: &str) {
        self.events.push(format!("show:{}:{}", segment, text));
        self.shown.lock().unwrap().push((segment, text.to_string()));
    }
}

/// A `turnflow-peer` process listening on a free local port
pub struct PeerContext {
    pub child: Child,
    pub address: String,
}

impl PeerContext {
    pub fn spawn(role: &str) -> Self {
        let bin_path = env!("CARGO_BIN_EXE_turnflow-peer");

        // Bind then release to find a free port for the peer
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to probe port");
            listener.local_addr().unwrap().port()
        };
        let listen = format!("127.0.0.1:{}", port);

        let child = Command::new(bin_path)
            .args(["--listen", &listen, "--role", role])
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .expect("Failed to spawn turnflow-peer");

        let ctx = PeerContext {
            child,
            address: listen,
        };
        ctx.wait_for_port();
        ctx
    }

    pub fn url(&self) -> String {
        format!("tcp://{}", self.address)
    }

    fn wait_for_port(&self) {
        let start = std::time::Instant::now();
        while start.elapsed() < Duration::from_secs(5) {
            if TcpStream::connect(&self.address).is_ok() {
                return;
            }
            thread::sleep(Duration::from_millis(50));
        }
        panic!("Timed out waiting for peer at {}", self.address);
    }
}

impl Drop for PeerContext {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
