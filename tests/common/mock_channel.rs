//! Mock Request Channel for Testing
//!
//! Records every request into the shared event log.

use super::EventLog;
use std::sync::{Arc, Mutex};
use turnflow::channel::RequestChannel;
use turnflow::error::{FlowError, FlowResult};

pub struct MockChannel {
    label: String,
    reply: String,
    fail: bool,
    events: EventLog,
    /// Every payload received
    pub requests: Arc<Mutex<Vec<String>>>,
    /// Runs inside the request, before replying
    on_request: Option<Box<dyn FnMut()>>,
}

impl MockChannel {
    pub fn new(label: &str, reply: &str, events: EventLog) -> Self {
        Self {
            label: label.to_string(),
            reply: reply.to_string(),
            fail: false,
            events,
            requests: Arc::new(Mutex::new(Vec::new())),
            on_request: None,
        }
    }

    /// Simulate a peer that never answers in time
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn on_request(mut self, hook: impl FnMut() + 'static) -> Self {
        self.on_request = Some(Box::new(hook));
        self
    }
}

impl RequestChannel for MockChannel {
    fn request(&mut self, payload: &str) -> FlowResult<String> {
        self.events.push(format!("{}:{}", self.label, payload));
        self.requests.lock().unwrap().push(payload.to_string());

        if let Some(hook) = self.on_request.as_mut() {
            hook();
        }

        if self.fail {
            return Err(FlowError::Timeout(10));
        }
        self.events.push(format!("{}:done", self.label));
        Ok(self.reply.clone())
    }

    fn address(&self) -> &str {
        &self.label
    }
}
