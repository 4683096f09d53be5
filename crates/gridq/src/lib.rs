// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # gridq - discovery and query client for cluster pools
//!
//! A pool is managed by a central registry (the *collector*) holding
//! ads that describe every daemon, and by per-node job-queue daemons
//! (*schedds*). This crate implements the client side of the
//! discovery-and-query protocol:
//!
//! 1. query the collector for ads of a category, filtered by a
//!    constraint and projected onto requested attributes;
//! 2. resolve a schedd's network location from those ads (or from
//!    local configuration);
//! 3. query the located schedd's job queue directly.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gridq::{
//!     ClientConfig, CollectorClient, Constraint, PoolSelector, Projection, ScheddClient,
//!     ScheddLocator,
//! };
//!
//! fn main() -> gridq::Result<()> {
//!     let config = ClientConfig::new("collector.pool-a.example.org:9618");
//!
//!     // Phase one: resolve the schedd's address via the collector.
//!     let locator = ScheddLocator::new(CollectorClient::new(config.clone())?);
//!     let location = locator.locate_by_name(&PoolSelector::Default, "sched1@node7")?;
//!
//!     // Phase two: query its job queue directly.
//!     let schedd = ScheddClient::new(&config, location)?;
//!     let constraint = Constraint::parse("Owner == \"astra\"")?;
//!     let jobs = schedd.query_jobs(Some(&constraint), &Projection::new(["ClusterId"]))?;
//!
//!     for job in &jobs {
//!         println!("{:?}", job.get("ClusterId"));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! All calls are synchronous blocking round-trips with no caching and
//! no built-in retry; every failure surfaces as exactly one
//! [`Error`] kind with a human-readable message.

/// Ads (ordered attribute records) and attribute projections.
pub mod ads;
/// Collector (registry) query client.
pub mod collector;
/// Client configuration (collector set, local schedd, transport limits).
pub mod config;
/// Constraint expressions and the AND-combining builder.
pub mod constraint;
/// Error taxonomy shared by both query paths.
pub mod error;
/// Schedd location resolution (by name, by readiness, local).
pub mod locate;
/// Query wire protocol (length-prefixed JSON frames).
pub mod protocol;
/// Direct job-queue queries against a located schedd.
pub mod schedd;
/// Blocking query transport (TCP, plus the injectable seam).
pub mod transport;

pub use ads::{Ad, AdValue, Projection};
pub use collector::{CollectorClient, PoolSelector};
pub use config::{ClientConfig, LocalScheddConfig};
pub use constraint::{and_all, Constraint};
pub use error::{classify, Error, QueryOrigin, Result, ResultCode};
pub use locate::{ScheddLocation, ScheddLocator};
pub use protocol::{AdCategory, QueryRequest, QueryResponse};
pub use schedd::ScheddClient;
pub use transport::{QueryTransport, TcpTransport};
