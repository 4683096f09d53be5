// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Schedd location: resolving a daemon's address via the collector or
//! local configuration.
//!
//! Location is the first phase of the two-phase resolution: a
//! collector lookup yields a [`ScheddLocation`], which a
//! [`crate::schedd::ScheddClient`] then queries directly. A location
//! is always fully formed; a daemon whose address cannot be determined
//! produces a classified error, never a partial descriptor.

use crate::ads::{Ad, Projection};
use crate::collector::{CollectorClient, PoolSelector};
use crate::config::ClientConfig;
use crate::constraint::Constraint;
use crate::error::{Error, Result};
use crate::protocol::AdCategory;
use std::sync::Arc;

/// Well-known ad attribute: daemon address (`host:port`).
pub const ATTR_ADDRESS: &str = "Address";
/// Well-known ad attribute: daemon display name.
pub const ATTR_NAME: &str = "Name";
/// Well-known ad attribute: host the daemon runs on.
pub const ATTR_MACHINE: &str = "Machine";
/// Well-known ad attribute: daemon protocol version.
pub const ATTR_VERSION: &str = "DaemonVersion";
/// Well-known ad attribute: job-slot capacity, nonzero for an active
/// schedd.
pub const ATTR_MAX_JOBS_RUNNING: &str = "MaxJobsRunning";

const UNKNOWN: &str = "Unknown";

/// A resolved schedd location.
///
/// Immutable value type with no lifecycle tie to the collector that
/// produced it. The address is always non-empty; name and hostname
/// fall back to `"Unknown"` and the version to `""` when the source
/// ad or configuration does not carry them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheddLocation {
    /// Daemon address (`host:port`), never empty.
    pub address: String,
    /// Daemon display name.
    pub name: String,
    /// Host the daemon runs on.
    pub hostname: String,
    /// Daemon protocol version, empty when unknown.
    pub version: String,
}

impl ScheddLocation {
    /// Extract a location from a schedd ad.
    ///
    /// The address attribute is required; name, hostname and version
    /// take their defaults when absent.
    pub fn from_ad(ad: &Ad) -> Result<Self> {
        let address = match ad.get_str(ATTR_ADDRESS) {
            Some(addr) if !addr.is_empty() => addr.to_string(),
            _ => {
                return Err(Error::InvalidRequest(
                    "schedd address not specified in ad".into(),
                ))
            }
        };
        Ok(ScheddLocation {
            address,
            name: ad.get_str(ATTR_NAME).unwrap_or(UNKNOWN).to_string(),
            hostname: ad.get_str(ATTR_MACHINE).unwrap_or(UNKNOWN).to_string(),
            version: ad.get_str(ATTR_VERSION).unwrap_or_default().to_string(),
        })
    }
}

impl std::fmt::Display for ScheddLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.name, self.address)
    }
}

/// Resolves schedd locations by name, by readiness, or from local
/// configuration.
pub struct ScheddLocator {
    config: Arc<ClientConfig>,
    collector: CollectorClient,
}

impl ScheddLocator {
    /// Build a locator over a collector client.
    pub fn new(collector: CollectorClient) -> Self {
        ScheddLocator {
            config: collector.shared_config(),
            collector,
        }
    }

    /// Locate the locally configured schedd. No collector round-trip.
    ///
    /// Fails `NotFound` when this host has no local schedd configured
    /// at all, and `ConfigurationError` when one is configured but its
    /// address cannot be determined.
    pub fn locate_local(&self) -> Result<ScheddLocation> {
        let local = self
            .config
            .local_schedd
            .as_ref()
            .ok_or_else(|| Error::NotFound("unable to locate local schedd".into()))?;

        let address = match local.address.as_deref() {
            Some(addr) if !addr.is_empty() => addr.to_string(),
            _ => {
                return Err(Error::ConfigurationError(
                    "unable to determine local schedd address".into(),
                ))
            }
        };

        Ok(ScheddLocation {
            address,
            name: local.name.clone().unwrap_or_else(|| UNKNOWN.to_string()),
            hostname: local.hostname.clone().unwrap_or_else(|| UNKNOWN.to_string()),
            version: local.version.clone().unwrap_or_default(),
        })
    }

    /// Locate the schedd with exactly the given name.
    ///
    /// Returns the first of possibly multiple matches; zero valid
    /// matches is `NotFound`.
    pub fn locate_by_name(&self, pool: &PoolSelector, name: &str) -> Result<ScheddLocation> {
        let constraint = Constraint::attr_eq(ATTR_NAME, name)?;
        let mut matches = self.locate_matching(pool, &constraint)?;
        if matches.is_empty() {
            return Err(Error::NotFound(format!("no schedd named {:?}", name)));
        }
        Ok(matches.swap_remove(0))
    }

    /// Locate every active schedd in the pool.
    ///
    /// Zero matches is an empty vector, not an error.
    pub fn locate_all(&self, pool: &PoolSelector) -> Result<Vec<ScheddLocation>> {
        let active = Constraint::parse(&format!("{} > 0", ATTR_MAX_JOBS_RUNNING))?;
        self.locate_matching(pool, &active)
    }

    /// Locate every schedd matching a constraint.
    ///
    /// Ads missing the address attribute are dropped with a warning;
    /// collector entries may be incomplete and an incomplete entry
    /// must not fail the whole lookup.
    pub fn locate_matching(
        &self,
        pool: &PoolSelector,
        constraint: &Constraint,
    ) -> Result<Vec<ScheddLocation>> {
        let ads = self
            .collector
            .query(AdCategory::Schedd, pool, Some(constraint), &Projection::all())?;

        let mut locations = Vec::with_capacity(ads.len());
        for ad in &ads {
            match ScheddLocation::from_ad(ad) {
                Ok(location) => locations.push(location),
                Err(_) => {
                    log::warn!(
                        "[locate] dropping schedd ad without address (Name = {:?})",
                        ad.get_str(ATTR_NAME).unwrap_or("<unset>")
                    );
                }
            }
        }
        Ok(locations)
    }
}
