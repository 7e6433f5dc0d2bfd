//! HTTP Channel
//!
//! Posts the payload as the request body and returns the response body.

use super::RequestChannel;
use crate::error::{FlowError, FlowResult};
use std::time::Duration;
use tracing::{debug, warn};

pub struct HttpChannel {
    url: String,
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl HttpChannel {
    pub fn new(url: &str, timeout: Duration) -> FlowResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FlowError::Channel(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.to_string(),
            client,
            timeout,
        })
    }
}

impl HttpChannel {
    /// The client timeout covers both sending and reading the body
    fn map_reqwest(&self, err: reqwest::Error) -> FlowError {
        if err.is_timeout() {
            FlowError::Timeout(self.timeout.as_millis() as u64)
        } else {
            FlowError::Channel(format!("{}: {}", self.url, err))
        }
    }
}

impl RequestChannel for HttpChannel {
    fn request(&mut self, payload: &str) -> FlowResult<String> {
        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(payload.to_string())
            .send()
            .map_err(|e| self.map_reqwest(e))?;

        let status = response.status();
        let body = response.text().map_err(|e| self.map_reqwest(e))?;

        if !status.is_success() {
            warn!("❌ HTTP channel error ({}): {}", status, body);
            return Err(FlowError::Channel(format!(
                "{} answered {}",
                self.url, status
            )));
        }

        debug!("📨 HTTP response: {}", body);
        Ok(body)
    }

    fn address(&self) -> &str {
        &self.url
    }
}
