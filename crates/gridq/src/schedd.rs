// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Direct job-queue queries against a located schedd.
//!
//! The second phase of the two-phase resolution: given a
//! [`ScheddLocation`] (from the locator, from a collector ad, or
//! supplied directly), open a channel to that address and fetch the
//! job ads matching a constraint.

use crate::ads::{Ad, Projection};
use crate::config::ClientConfig;
use crate::constraint::{and_all, Constraint};
use crate::error::{classify, Error, QueryOrigin, Result, ResultCode};
use crate::locate::ScheddLocation;
use crate::protocol::{AdCategory, QueryRequest};
use crate::transport::{QueryTransport, TcpTransport};
use std::sync::Arc;

/// Client for one schedd's job queue.
pub struct ScheddClient {
    location: ScheddLocation,
    transport: Arc<dyn QueryTransport>,
}

impl std::fmt::Debug for ScheddClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheddClient")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl ScheddClient {
    /// Create a client for the given location over the TCP transport.
    ///
    /// A location with an empty address is structurally invalid and is
    /// rejected here, before any network activity.
    pub fn new(config: &ClientConfig, location: ScheddLocation) -> Result<Self> {
        config.validate()?;
        let transport = Arc::new(TcpTransport::new(config));
        Self::with_transport(location, transport)
    }

    /// Create a client over an injected transport.
    pub fn with_transport(
        location: ScheddLocation,
        transport: Arc<dyn QueryTransport>,
    ) -> Result<Self> {
        if location.address.is_empty() {
            return Err(Error::InvalidRequest("schedd address is empty".into()));
        }
        Ok(ScheddClient {
            location,
            transport,
        })
    }

    /// Create a client from a schedd ad returned by a collector.
    pub fn from_ad(config: &ClientConfig, ad: &Ad) -> Result<Self> {
        Self::new(config, ScheddLocation::from_ad(ad)?)
    }

    /// The location this client queries.
    pub fn location(&self) -> &ScheddLocation {
        &self.location
    }

    /// Fetch the job ads matching `constraint`, projected onto the
    /// requested attributes.
    ///
    /// A missing constraint matches every job; an empty projection
    /// returns all attributes the schedd chooses to send. Results keep
    /// server stream order, each ad an independent copy.
    pub fn query_jobs(
        &self,
        constraint: Option<&Constraint>,
        projection: &Projection,
    ) -> Result<Vec<Ad>> {
        let request = QueryRequest {
            // Category selection is a collector concern; the schedd
            // serves exactly its job queue.
            category: AdCategory::Any,
            constraint: and_all([constraint]).as_str().to_string(),
            projection: projection.names().to_vec(),
            peer_version: self.location.version.clone(),
        };

        let response = self.transport.send_query(&self.location.address, &request)?;
        classify(ResultCode::from_wire(response.code), QueryOrigin::Schedd)?;

        log::debug!(
            "[schedd] {} returned {} job ad(s)",
            self.location.address,
            response.ads.len()
        );
        Ok(response.ads)
    }
}
