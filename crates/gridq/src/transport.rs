// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Query transport: one blocking round-trip per call.
//!
//! [`QueryTransport`] is the seam between the query clients and the
//! network; tests inject an in-memory implementation. The production
//! [`TcpTransport`] opens a fresh connection per query, writes the
//! request frame, reads exactly one response frame, and closes. Every
//! I/O failure, including a timeout, classifies as unreachable.

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::protocol::{check_frame_len, QueryRequest, QueryResponse, FRAME_HEADER_LEN};
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

/// A blocking query channel to a collector or schedd address.
pub trait QueryTransport: Send + Sync {
    /// Send one query to `address` and wait for the response.
    fn send_query(&self, address: &str, request: &QueryRequest) -> Result<QueryResponse>;
}

/// TCP transport speaking the length-prefixed JSON query protocol.
#[derive(Debug, Clone)]
pub struct TcpTransport {
    connect_timeout: Duration,
    read_timeout: Duration,
    max_message_size: usize,
}

impl TcpTransport {
    /// Build a transport from client configuration.
    pub fn new(config: &ClientConfig) -> Self {
        TcpTransport {
            connect_timeout: config.connect_timeout(),
            read_timeout: config.read_timeout(),
            max_message_size: config.max_message_size,
        }
    }

    fn connect(&self, address: &str) -> Result<TcpStream> {
        let mut last_err = None;
        let addrs = address
            .to_socket_addrs()
            .map_err(|e| Error::Unreachable(format!("cannot resolve {}: {}", address, e)))?;

        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(stream) => {
                    stream.set_nodelay(true).ok();
                    stream.set_read_timeout(Some(self.read_timeout)).ok();
                    return Ok(stream);
                }
                Err(e) => last_err = Some(e),
            }
        }

        Err(match last_err {
            Some(e) => Error::Unreachable(format!("cannot connect to {}: {}", address, e)),
            None => Error::Unreachable(format!("{} resolved to no addresses", address)),
        })
    }
}

impl QueryTransport for TcpTransport {
    fn send_query(&self, address: &str, request: &QueryRequest) -> Result<QueryResponse> {
        let frame = request.encode()?;
        let mut stream = self.connect(address)?;

        log::debug!(
            "[transport] query {} -> {} ({} bytes)",
            request.category,
            address,
            frame.len()
        );

        stream
            .write_all(&frame)
            .and_then(|()| stream.flush())
            .map_err(|e| Error::Unreachable(format!("send to {} failed: {}", address, e)))?;

        let mut len_buf = [0u8; FRAME_HEADER_LEN];
        stream
            .read_exact(&mut len_buf)
            .map_err(|e| Error::Unreachable(format!("read from {} failed: {}", address, e)))?;

        let len = u32::from_be_bytes(len_buf) as usize;
        check_frame_len(len, self.max_message_size)?;

        let mut body = vec![0u8; len];
        stream
            .read_exact(&mut body)
            .map_err(|e| Error::Unreachable(format!("read from {} failed: {}", address, e)))?;

        QueryResponse::decode(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::AdCategory;

    fn fast_transport() -> TcpTransport {
        TcpTransport::new(
            &ClientConfig::default()
                .with_connect_timeout_secs(1)
                .with_read_timeout_secs(1),
        )
    }

    fn any_request() -> QueryRequest {
        QueryRequest {
            category: AdCategory::Any,
            constraint: "true".into(),
            projection: Vec::new(),
            peer_version: String::new(),
        }
    }

    #[test]
    fn test_unresolvable_address_is_unreachable() {
        let err = fast_transport()
            .send_query("not an address", &any_request())
            .unwrap_err();
        assert!(matches!(err, Error::Unreachable(_)));
    }

    #[test]
    fn test_refused_connection_is_unreachable() {
        // Bind then drop to get a port nothing is listening on.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let err = fast_transport()
            .send_query(&format!("127.0.0.1:{}", port), &any_request())
            .unwrap_err();
        assert!(matches!(err, Error::Unreachable(_)));
    }

    #[test]
    fn test_oversized_response_frame_rejected() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = std::thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let mut discard = [0u8; 1024];
            let _ = socket.read(&mut discard);
            // Claim a body far beyond any sane cap.
            socket.write_all(&u32::MAX.to_be_bytes()).unwrap();
        });

        let transport = TcpTransport::new(
            &ClientConfig::default()
                .with_connect_timeout_secs(1)
                .with_read_timeout_secs(1)
                .with_max_message_size(1024),
        );
        let err = transport
            .send_query(&addr.to_string(), &any_request())
            .unwrap_err();
        assert!(matches!(err, Error::Unreachable(_)));
        handle.join().unwrap();
    }
}
