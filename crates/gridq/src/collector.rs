// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collector (registry) queries.
//!
//! A collector holds ads describing the daemons of a pool. This client
//! queries one named collector, or the locally configured collector
//! set when no pool is named, and hands back independent copies of the
//! matching ads in stream order.

use crate::ads::{Ad, Projection};
use crate::config::ClientConfig;
use crate::constraint::{and_all, Constraint};
use crate::error::{classify, Error, QueryOrigin, Result, ResultCode};
use crate::protocol::{AdCategory, QueryRequest};
use crate::transport::{QueryTransport, TcpTransport};
use std::sync::Arc;

/// Which collector(s) a query goes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolSelector {
    /// The locally configured collector set, queried in order.
    Default,
    /// Exactly one named collector (`host` or `host:port`).
    Named(String),
}

impl PoolSelector {
    /// Convenience constructor for a named pool.
    pub fn named(address: impl Into<String>) -> Self {
        PoolSelector::Named(address.into())
    }
}

/// Client for collector queries.
pub struct CollectorClient {
    config: Arc<ClientConfig>,
    transport: Arc<dyn QueryTransport>,
}

impl CollectorClient {
    /// Create a client over the TCP transport.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = Arc::new(TcpTransport::new(&config));
        Ok(CollectorClient {
            config: Arc::new(config),
            transport,
        })
    }

    /// Create a client over an injected transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn QueryTransport>) -> Result<Self> {
        config.validate()?;
        Ok(CollectorClient {
            config: Arc::new(config),
            transport,
        })
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn shared_config(&self) -> Arc<ClientConfig> {
        Arc::clone(&self.config)
    }

    /// Query the collector(s) selected by `pool` for ads of `category`.
    ///
    /// A missing constraint matches everything; an empty projection
    /// requests the server's default attribute set. With
    /// [`PoolSelector::Default`] the configured collectors are queried
    /// in order and their results merged (collector order, then server
    /// stream order, no dedup); any collector failing fails the whole
    /// call with no partial results.
    pub fn query(
        &self,
        category: AdCategory,
        pool: &PoolSelector,
        constraint: Option<&Constraint>,
        projection: &Projection,
    ) -> Result<Vec<Ad>> {
        let request = QueryRequest {
            category,
            constraint: and_all([constraint]).as_str().to_string(),
            projection: projection.names().to_vec(),
            peer_version: String::new(),
        };

        match pool {
            PoolSelector::Named(address) => self.query_one(address, &request),
            PoolSelector::Default => {
                if self.config.collectors.is_empty() {
                    // Same condition a collector reports as NoCollectorHost.
                    return Err(Error::ConfigurationError(
                        "unable to determine collector host: no collectors configured".into(),
                    ));
                }
                let mut merged = Vec::new();
                for address in &self.config.collectors {
                    merged.extend(self.query_one(address, &request)?);
                }
                Ok(merged)
            }
        }
    }

    fn query_one(&self, address: &str, request: &QueryRequest) -> Result<Vec<Ad>> {
        let response = self.transport.send_query(address, request)?;
        let code = ResultCode::from_wire(response.code);
        if let Err(err) = classify(code, QueryOrigin::Collector) {
            if let Error::UnknownFailure { code, .. } = &err {
                log::warn!("[collector] {} returned unknown result code {}", address, code);
            }
            return Err(err);
        }
        log::debug!(
            "[collector] {} returned {} {} ad(s)",
            address,
            response.ads.len(),
            request.category
        );
        Ok(response.ads)
    }
}
