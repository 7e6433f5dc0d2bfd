//! Channel Server
//!
//! TCP server answering socket-channel requests with a handler closure.
//! Stands in for the downstream services during local runs and tests.

use anyhow::Result;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{ChannelRequest, ChannelResponse};

/// Largest request line accepted from a client
const MAX_REQUEST_BYTES: u64 = 64 * 1024;

/// Handler type: payload in, reply payload or error message out
pub type RequestHandler = dyn Fn(&str) -> Result<String, String> + Send + Sync;

/// Request/response server
pub struct ChannelServer {
    running: Arc<AtomicBool>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

impl ChannelServer {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        }
    }

    /// Bind `addr` (host:port) and serve requests until stopped.
    /// Returns the bound address, which resolves port 0.
    pub fn start<F>(&mut self, addr: &str, handler: F) -> Result<SocketAddr>
    where
        F: Fn(&str) -> Result<String, String> + Send + Sync + 'static,
    {
        let listener = TcpListener::bind(addr)?;
        let local_addr = listener.local_addr()?;
        listener.set_nonblocking(true)?;

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();
        let handler: Arc<RequestHandler> = Arc::new(handler);

        info!("🔌 Channel server listening on {}", local_addr);

        let handle = thread::spawn(move || {
            while running.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, peer)) => {
                        debug!("Connection from {}", peer);
                        let handler = handler.clone();
                        thread::spawn(move || {
                            if let Err(e) = handle_client(stream, handler.as_ref()) {
                                warn!("Channel client error: {}", e);
                            }
                        });
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(Duration::from_millis(20));
                    }
                    Err(e) => {
                        warn!("Channel accept error: {}", e);
                    }
                }
            }

            info!("🔌 Channel server stopped");
        });

        self.thread_handle = Some(handle);
        Ok(local_addr)
    }

    /// Stop the server
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Default for ChannelServer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ChannelServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Handle a single client connection
fn handle_client(mut stream: TcpStream, handler: &RequestHandler) -> Result<()> {
    stream.set_nonblocking(false)?;

    let mut reader = BufReader::new(stream.try_clone()?).take(MAX_REQUEST_BYTES);
    let mut line = String::new();
    reader.read_line(&mut line)?;

    if line.is_empty() {
        return Ok(());
    }
    if !line.ends_with('\n') {
        warn!("⚠️ Oversized or truncated request rejected");
        return Ok(());
    }

    let request: ChannelRequest = serde_json::from_str(line.trim())?;
    debug!("📨 Channel request: {:?}", request);

    let response = match request {
        ChannelRequest::Request { seq_id, payload } => match handler(&payload) {
            Ok(reply) => ChannelResponse::Response {
                seq_id,
                payload: reply,
            },
            Err(message) => ChannelResponse::Error { seq_id, message },
        },
    };

    let response_json = serde_json::to_string(&response)? + "\n";
    stream.write_all(response_json.as_bytes())?;

    Ok(())
}
