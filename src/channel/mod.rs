//! Request Channels
//!
//! Synchronous request/response clients used to reach the language-model
//! and speech-output services.
//! Socket protocol: JSON over newline-delimited messages, one exchange per connection.

pub mod client;
pub mod http;
pub mod messages;
pub mod server;

pub use client::SocketChannel;
pub use http::HttpChannel;
pub use messages::*;
pub use server::ChannelServer;

use crate::error::{FlowError, FlowResult};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Blocking request/response capability
pub trait RequestChannel {
    /// Send `payload` and wait (bounded) for the reply
    fn request(&mut self, payload: &str) -> FlowResult<String>;

    /// Where requests are sent, for logging
    fn address(&self) -> &str;
}

impl<T: RequestChannel + ?Sized> RequestChannel for Box<T> {
    fn request(&mut self, payload: &str) -> FlowResult<String> {
        (**self).request(payload)
    }

    fn address(&self) -> &str {
        (**self).address()
    }
}

/// Parsed channel endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelAddress {
    /// `tcp://host:port`
    Tcp(String),
    /// `unix:///path/to.sock`
    Unix(PathBuf),
    /// `http://…` or `https://…`
    Http(String),
}

impl FromStr for ChannelAddress {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = s.strip_prefix("tcp://") {
            if rest.rsplit_once(':').map_or(true, |(host, port)| {
                host.is_empty() || port.parse::<u16>().is_err()
            }) {
                return Err(FlowError::Config(format!(
                    "TCP address needs host:port: {}",
                    s
                )));
            }
            Ok(ChannelAddress::Tcp(rest.to_string()))
        } else if let Some(rest) = s.strip_prefix("unix://") {
            if rest.is_empty() {
                return Err(FlowError::Config("Unix address needs a socket path".into()));
            }
            Ok(ChannelAddress::Unix(PathBuf::from(rest)))
        } else if s.starts_with("http://") || s.starts_with("https://") {
            Ok(ChannelAddress::Http(s.to_string()))
        } else {
            Err(FlowError::Config(format!(
                "Unsupported channel address (expected tcp://, unix:// or http://): {}",
                s
            )))
        }
    }
}

/// Build the channel for a configured address
pub fn open(address: &str, timeout: Duration) -> FlowResult<Box<dyn RequestChannel>> {
    let parsed: ChannelAddress = address.parse()?;
    let channel: Box<dyn RequestChannel> = match parsed {
        ChannelAddress::Http(url) => Box::new(HttpChannel::new(&url, timeout)?),
        other => Box::new(SocketChannel::new(address, other, timeout)),
    };
    Ok(channel)
}
