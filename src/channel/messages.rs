//! Channel Message Types
//!
//! JSON-serializable envelopes for the socket request/response protocol.

use serde::{Deserialize, Serialize};

/// Request sent from the coordinator to a downstream service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChannelRequest {
    #[serde(rename = "request")]
    Request { seq_id: u64, payload: String },
}

/// Reply from a downstream service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChannelResponse {
    #[serde(rename = "response")]
    Response { seq_id: u64, payload: String },

    /// The service understood the request but could not serve it
    #[serde(rename = "error")]
    Error { seq_id: u64, message: String },
}

impl ChannelResponse {
    pub fn seq_id(&self) -> u64 {
        match self {
            ChannelResponse::Response { seq_id, .. } | ChannelResponse::Error { seq_id, .. } => {
                *seq_id
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_shape() {
        let req = ChannelRequest::Request {
            seq_id: 7,
            payload: "hello".to_string(),
        };
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"type":"request","seq_id":7,"payload":"hello"}"#);
    }

    #[test]
    fn test_error_response_parse() {
        let resp: ChannelResponse =
            serde_json::from_str(r#"{"type":"error","seq_id":3,"message":"busy"}"#).unwrap();
        assert_eq!(resp.seq_id(), 3);
        assert!(matches!(resp, ChannelResponse::Error { .. }));
    }
}
