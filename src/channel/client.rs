//! Socket Channel Client
//!
//! TCP or Unix socket client, one connection per request.

use super::{ChannelAddress, ChannelRequest, ChannelResponse, RequestChannel};
use crate::error::{FlowError, FlowResult};
use std::io::{ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// Largest reply line accepted from a service
pub const MAX_REPLY_BYTES: usize = 64 * 1024;

static NEXT_SEQ_ID: AtomicU64 = AtomicU64::new(1);

fn next_seq_id() -> u64 {
    NEXT_SEQ_ID.fetch_add(1, Ordering::SeqCst)
}

/// Stream socket whose blocking calls can be bounded
trait TimedStream: Read + Write {
    fn set_budget(&self, remaining: Duration) -> std::io::Result<()>;
}

impl TimedStream for TcpStream {
    fn set_budget(&self, remaining: Duration) -> std::io::Result<()> {
        self.set_read_timeout(Some(remaining))?;
        self.set_write_timeout(Some(remaining))
    }
}

impl TimedStream for UnixStream {
    fn set_budget(&self, remaining: Duration) -> std::io::Result<()> {
        self.set_read_timeout(Some(remaining))?;
        self.set_write_timeout(Some(remaining))
    }
}

/// Request/response client over a stream socket
pub struct SocketChannel {
    label: String,
    target: ChannelAddress,
    timeout: Duration,
}

impl SocketChannel {
    pub fn new(label: &str, target: ChannelAddress, timeout: Duration) -> Self {
        Self {
            label: label.to_string(),
            target,
            timeout,
        }
    }

    fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }

    /// Time left before `deadline`, or a timeout error once it has passed
    fn remaining(&self, deadline: Instant) -> FlowResult<Duration> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(FlowError::Timeout(self.timeout_ms()));
        }
        Ok(remaining)
    }

    fn connect_tcp(&self, host_port: &str, deadline: Instant) -> FlowResult<TcpStream> {
        let addrs = host_port
            .to_socket_addrs()
            .map_err(|e| FlowError::Channel(format!("Cannot resolve {}: {}", host_port, e)))?;

        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.remaining(deadline)?) {
                Ok(stream) => return Ok(stream),
                Err(e) => last_err = Some(e),
            }
        }

        Err(match last_err {
            Some(e) => self.map_io(e),
            None => FlowError::Channel(format!("No addresses for {}", host_port)),
        })
    }

    fn map_io(&self, err: std::io::Error) -> FlowError {
        match err.kind() {
            ErrorKind::WouldBlock | ErrorKind::TimedOut => FlowError::Timeout(self.timeout_ms()),
            _ => FlowError::Channel(format!("{}: {}", self.label, err)),
        }
    }

    fn exchange<S: TimedStream>(
        &self,
        mut stream: S,
        payload: &str,
        deadline: Instant,
    ) -> FlowResult<String> {
        let seq_id = next_seq_id();
        let request = ChannelRequest::Request {
            seq_id,
            payload: payload.to_string(),
        };

        let request_json = serde_json::to_string(&request)? + "\n";
        stream
            .set_budget(self.remaining(deadline)?)
            .map_err(|e| self.map_io(e))?;
        stream
            .write_all(request_json.as_bytes())
            .map_err(|e| self.map_io(e))?;

        let line = self.read_reply(&mut stream, deadline)?;
        let response: ChannelResponse = serde_json::from_str(&line)
            .map_err(|e| FlowError::Protocol(format!("Malformed reply: {}", e)))?;
        debug!("📨 Channel response: {:?}", response);

        if response.seq_id() != seq_id {
            return Err(FlowError::Protocol(format!(
                "Sequence ID mismatch: expected {}, got {}",
                seq_id,
                response.seq_id()
            )));
        }

        match response {
            ChannelResponse::Response { payload, .. } => Ok(payload),
            ChannelResponse::Error { message, .. } => Err(FlowError::Channel(format!(
                "{} rejected request: {}",
                self.label, message
            ))),
        }
    }

    /// Read one newline-terminated reply. The whole read shares the request
    /// deadline, so a peer trickling bytes cannot extend it.
    fn read_reply<S: TimedStream>(&self, stream: &mut S, deadline: Instant) -> FlowResult<String> {
        let mut reply = Vec::new();
        let mut buf = [0u8; 4096];

        loop {
            stream
                .set_budget(self.remaining(deadline)?)
                .map_err(|e| self.map_io(e))?;

            let read = match stream.read(&mut buf) {
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(self.map_io(e)),
            };

            if read == 0 {
                return Err(FlowError::Protocol(if reply.is_empty() {
                    format!("{} closed the connection without replying", self.label)
                } else {
                    format!("{} closed the connection mid-reply", self.label)
                }));
            }

            let newline = buf[..read].iter().position(|&b| b == b'\n');
            reply.extend_from_slice(&buf[..newline.unwrap_or(read)]);

            if reply.len() > MAX_REPLY_BYTES {
                return Err(FlowError::Protocol(format!(
                    "{} reply exceeds {} bytes",
                    self.label, MAX_REPLY_BYTES
                )));
            }
            if newline.is_some() {
                break;
            }
        }

        String::from_utf8(reply)
            .map(|line| line.trim().to_string())
            .map_err(|e| FlowError::Protocol(format!("Reply is not UTF-8: {}", e)))
    }
}

impl RequestChannel for SocketChannel {
    fn request(&mut self, payload: &str) -> FlowResult<String> {
        let deadline = Instant::now() + self.timeout;
        match &self.target {
            ChannelAddress::Tcp(host_port) => {
                let stream = self.connect_tcp(host_port, deadline)?;
                self.exchange(stream, payload, deadline)
            }
            ChannelAddress::Unix(path) => {
                let stream = UnixStream::connect(path).map_err(|e| self.map_io(e))?;
                self.exchange(stream, payload, deadline)
            }
            ChannelAddress::Http(url) => Err(FlowError::Config(format!(
                "HTTP address handed to a socket channel: {}",
                url
            ))),
        }
    }

    fn address(&self) -> &str {
        &self.label
    }
}
