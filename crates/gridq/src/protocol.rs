// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Query wire protocol.
//!
//! Requests and responses travel as length-prefixed JSON frames: a
//! 4-byte big-endian body length followed by the JSON body. Attribute
//! order inside ads survives the wire (see [`crate::ads::Ad`]).

use crate::ads::Ad;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Size of the frame length prefix in bytes.
pub const FRAME_HEADER_LEN: usize = 4;

/// The ad category a collector query asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdCategory {
    /// Any ad the collector holds.
    Any,
    /// Machine (execute-node) ads.
    Machine,
    /// Schedd (job-queue daemon) ads.
    Schedd,
}

impl std::fmt::Display for AdCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdCategory::Any => f.write_str("any"),
            AdCategory::Machine => f.write_str("machine"),
            AdCategory::Schedd => f.write_str("schedd"),
        }
    }
}

/// A query sent to a collector or schedd.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Requested ad category.
    pub category: AdCategory,

    /// Boolean filter expression; `"true"` matches everything.
    pub constraint: String,

    /// Attribute projection; empty means the server's default set.
    #[serde(default)]
    pub projection: Vec<String>,

    /// Protocol version of the peer, for wire compatibility. Empty
    /// when unknown.
    #[serde(default)]
    pub peer_version: String,
}

/// A query response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Raw result code (see [`crate::error::ResultCode`]).
    pub code: i32,

    /// Matching ads in server stream order.
    #[serde(default)]
    pub ads: Vec<Ad>,
}

impl QueryRequest {
    /// Encode this request as a wire frame.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let body = serde_json::to_vec(self)
            .map_err(|e| Error::InvalidRequest(format!("unencodable query: {}", e)))?;
        let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + body.len());
        frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
        frame.extend_from_slice(&body);
        Ok(frame)
    }
}

impl QueryResponse {
    /// Decode a response frame body.
    ///
    /// A body that does not parse means the exchange broke down
    /// mid-stream, so the failure classifies as [`Error::Unreachable`].
    pub fn decode(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body)
            .map_err(|e| Error::Unreachable(format!("undecodable query response: {}", e)))
    }

    /// Encode this response as a wire frame. Used by servers and test
    /// fixtures.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let body = serde_json::to_vec(self)
            .map_err(|e| Error::Unreachable(format!("unencodable response: {}", e)))?;
        let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + body.len());
        frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
        frame.extend_from_slice(&body);
        Ok(frame)
    }
}

/// Validate a frame length prefix against the configured cap.
pub fn check_frame_len(len: usize, max_message_size: usize) -> Result<()> {
    if len == 0 || len > max_message_size {
        return Err(Error::Unreachable(format!(
            "invalid frame length {} (max {})",
            len, max_message_size
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ads::AdValue;

    #[test]
    fn test_request_frame_round_trip() {
        let req = QueryRequest {
            category: AdCategory::Schedd,
            constraint: "TotalJobAds > 0".into(),
            projection: vec!["Name".into(), "Address".into()],
            peer_version: "0.3".into(),
        };

        let frame = req.encode().unwrap();
        let len = u32::from_be_bytes(frame[..4].try_into().unwrap()) as usize;
        assert_eq!(len, frame.len() - FRAME_HEADER_LEN);

        let back: QueryRequest = serde_json::from_slice(&frame[4..]).unwrap();
        assert_eq!(back.category, AdCategory::Schedd);
        assert_eq!(back.constraint, "TotalJobAds > 0");
        assert_eq!(back.projection, ["Name", "Address"]);
        assert_eq!(back.peer_version, "0.3");
    }

    #[test]
    fn test_request_defaults_for_missing_fields() {
        let back: QueryRequest =
            serde_json::from_slice(br#"{"category":"any","constraint":"true"}"#).unwrap();
        assert_eq!(back.category, AdCategory::Any);
        assert!(back.projection.is_empty());
        assert!(back.peer_version.is_empty());
    }

    #[test]
    fn test_response_round_trip_preserves_ad_order() {
        let mut ad = Ad::new();
        ad.insert("Name", AdValue::String("sched1".into()));
        ad.insert("Address", AdValue::String("10.0.0.7:9618".into()));

        let resp = QueryResponse {
            code: 0,
            ads: vec![ad.clone(), ad],
        };
        let frame = resp.encode().unwrap();
        let back = QueryResponse::decode(&frame[FRAME_HEADER_LEN..]).unwrap();
        assert_eq!(back.code, 0);
        assert_eq!(back.ads.len(), 2);
        let names: Vec<&str> = back.ads[0].iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["Name", "Address"]);
    }

    #[test]
    fn test_undecodable_response_is_unreachable() {
        let err = QueryResponse::decode(b"not json").unwrap_err();
        assert!(matches!(err, Error::Unreachable(_)));
    }

    #[test]
    fn test_frame_len_bounds() {
        assert!(check_frame_len(1, 1024).is_ok());
        assert!(check_frame_len(1024, 1024).is_ok());
        assert!(check_frame_len(0, 1024).is_err());
        assert!(check_frame_len(1025, 1024).is_err());
    }
}
