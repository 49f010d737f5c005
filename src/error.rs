//! Broker-level error types shared across flows, the portal client, and lease stores.

// self
use crate::_prelude::*;

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical broker error exposed by public APIs.
///
/// Startup callers treat [`Error::Config`] and the [`Error::Auth`]/[`Error::Storage`] values
/// surfaced while connecting as fatal. During request handling every variant is a server-side
/// fault to report to the caller; admission denials never appear here, they are ordinary
/// flow outcomes (see [`crate::admission::CapacityExceeded`]).
#[derive(Debug, ThisError)]
pub enum Error {
	/// Credential exchange against the portal token endpoint failed.
	#[error(transparent)]
	Auth(#[from] crate::portal::AuthError),
	/// Local or portal-side configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Lease-store failure (purge, count, or insert).
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
}

/// Configuration and startup-validation failures raised by the broker.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Portal descriptor validation failed.
	#[error("Portal descriptor is invalid.")]
	Descriptor(#[from] crate::portal::PortalDescriptorError),
	/// Lease record builder validation failed.
	#[error("Unable to build lease record.")]
	LeaseBuild(#[from] crate::lease::LeaseBuilderError),

	/// Descriptor declares no licensing endpoint but capacity discovery was requested.
	#[error("Descriptor does not declare a licensing endpoint.")]
	MissingLicensingEndpoint,
	/// Transport failure while querying the licensing endpoint.
	#[error("Transport failure while querying the licensing endpoint.")]
	LicensingTransport {
		/// Underlying transport failure.
		#[source]
		source: TransportError,
	},
	/// Portal rejected the licensing query.
	#[error("Portal rejected the licensing query: {message}.")]
	LicensingRejected {
		/// Portal-supplied reason string.
		message: String,
	},
	/// Licensing endpoint responded with malformed JSON.
	#[error("Licensing endpoint returned malformed JSON.")]
	LicensingResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Licensing metadata does not list the configured user type.
	#[error("Licensing metadata does not list the `{user_type}` user type.")]
	UnknownUserType {
		/// User type identifier that was requested.
		user_type: String,
	},
	/// Licensing metadata lists the user type but omits its seat maximum.
	#[error("Licensing metadata omits the seat maximum for the `{user_type}` user type.")]
	MissingCapacity {
		/// User type identifier that was requested.
		user_type: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
///
/// Adapters fold these into [`crate::portal::AuthError`] or [`crate::store::StoreError`]
/// before they reach a caller, so a bounded-timeout expiry surfaces as the kind of the
/// operation that timed out.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the portal.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the portal.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
