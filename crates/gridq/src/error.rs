// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error taxonomy for collector and schedd queries.
//!
//! Both query paths report low-level [`ResultCode`]s on the wire. The
//! mapping into client-visible [`Error`] kinds happens exactly once, at
//! the point a code is first observed; everything above that propagates
//! the typed error unchanged.

/// Low-level result codes reported by collectors and schedds.
///
/// The numeric wire values are stable protocol constants; anything a
/// newer server sends that this client does not know is preserved as
/// [`ResultCode::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    /// Query succeeded.
    Ok,
    /// The requested ad category is not supported by the query type.
    UnsupportedCategory,
    /// Server-side memory allocation failure.
    MemoryAllocation,
    /// The constraint expression could not be parsed.
    ParseError,
    /// Communication with the peer failed.
    CommunicationFailure,
    /// The query itself was structurally invalid.
    InvalidQuery,
    /// No collector host could be determined.
    NoCollectorHost,
    /// Any code not covered above, kept verbatim for diagnosis.
    Other(i32),
}

impl ResultCode {
    /// Decode a raw wire code.
    pub fn from_wire(code: i32) -> Self {
        match code {
            0 => ResultCode::Ok,
            1 => ResultCode::UnsupportedCategory,
            2 => ResultCode::MemoryAllocation,
            3 => ResultCode::ParseError,
            4 => ResultCode::CommunicationFailure,
            5 => ResultCode::InvalidQuery,
            6 => ResultCode::NoCollectorHost,
            other => ResultCode::Other(other),
        }
    }

    /// Raw wire value of this code.
    pub fn to_wire(self) -> i32 {
        match self {
            ResultCode::Ok => 0,
            ResultCode::UnsupportedCategory => 1,
            ResultCode::MemoryAllocation => 2,
            ResultCode::ParseError => 3,
            ResultCode::CommunicationFailure => 4,
            ResultCode::InvalidQuery => 5,
            ResultCode::NoCollectorHost => 6,
            ResultCode::Other(code) => code,
        }
    }
}

/// Which query path produced a result code.
///
/// The two paths map the same codes differently: a schedd rejecting a
/// constraint and a collector rejecting one are both
/// [`Error::MalformedConstraint`], but most schedd-side failures
/// collapse into [`Error::Unreachable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOrigin {
    /// A collector (registry) query.
    Collector,
    /// A direct schedd (job-queue daemon) query.
    Schedd,
}

/// Errors returned by gridq client operations.
#[derive(Debug)]
pub enum Error {
    /// Caller-supplied parameters are structurally invalid (empty
    /// address, unsupported category, invalid query shape).
    InvalidRequest(String),
    /// The constraint expression failed to parse, locally or on the
    /// server.
    MalformedConstraint(String),
    /// The collector or schedd could not be contacted, or the
    /// transport failed mid-exchange.
    Unreachable(String),
    /// The server reported a memory/resource allocation failure.
    ResourceExhausted(String),
    /// Local configuration did not specify enough information to
    /// resolve a collector or local schedd.
    ConfigurationError(String),
    /// A locate operation that must resolve to exactly one daemon
    /// found zero matches.
    NotFound(String),
    /// A result code not covered by any known mapping.
    UnknownFailure {
        /// Raw wire code, kept for diagnosis.
        code: i32,
        /// Human-readable context.
        message: String,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            Error::MalformedConstraint(msg) => write!(f, "Malformed constraint: {}", msg),
            Error::Unreachable(msg) => write!(f, "Unreachable: {}", msg),
            Error::ResourceExhausted(msg) => write!(f, "Resource exhausted: {}", msg),
            Error::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            Error::NotFound(msg) => write!(f, "Not found: {}", msg),
            Error::UnknownFailure { code, message } => {
                write!(f, "Unknown failure (code {}): {}", code, message)
            }
        }
    }
}

impl std::error::Error for Error {}

/// Convenient alias for client API results.
pub type Result<T> = std::result::Result<T, Error>;

/// Classify a low-level result code observed on `origin`.
///
/// Pure mapping, no side effects. `Ok(())` for [`ResultCode::Ok`];
/// every other code becomes exactly one [`Error`] kind. Callers log
/// [`Error::UnknownFailure`] with the raw code before surfacing it.
pub fn classify(code: ResultCode, origin: QueryOrigin) -> Result<()> {
    match origin {
        QueryOrigin::Collector => match code {
            ResultCode::Ok => Ok(()),
            ResultCode::UnsupportedCategory => Err(Error::InvalidRequest(
                "ad category not supported by query type".into(),
            )),
            ResultCode::MemoryAllocation => Err(Error::ResourceExhausted(
                "collector reported a memory allocation failure".into(),
            )),
            ResultCode::ParseError => Err(Error::MalformedConstraint(
                "query constraint could not be parsed".into(),
            )),
            ResultCode::CommunicationFailure => Err(Error::Unreachable(
                "failed communication with collector".into(),
            )),
            ResultCode::InvalidQuery => Err(Error::InvalidRequest("invalid query".into())),
            ResultCode::NoCollectorHost => Err(Error::ConfigurationError(
                "unable to determine collector host".into(),
            )),
            ResultCode::Other(raw) => Err(Error::UnknownFailure {
                code: raw,
                message: "unknown result from collector query".into(),
            }),
        },
        QueryOrigin::Schedd => match code {
            ResultCode::Ok => Ok(()),
            // Schedds report a rejected constraint under either code.
            ResultCode::ParseError | ResultCode::UnsupportedCategory => Err(
                Error::MalformedConstraint("parse error in constraint".into()),
            ),
            other => Err(Error::Unreachable(format!(
                "failed to fetch ads from schedd (code {})",
                other.to_wire()
            ))),
        },
    }
}
