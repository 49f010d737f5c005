//! Transport primitives for portal form exchanges.
//!
//! The module exposes [`PortalHttpClient`] alongside [`ResponseMetadata`] and
//! [`ResponseMetadataSlot`] so downstream crates can integrate custom HTTP clients
//! without losing the broker's instrumentation hooks. Implementations call
//! [`ResponseMetadataSlot::take`] before dispatching a request and
//! [`ResponseMetadataSlot::store`] once an HTTP status or retry hint is known, so the
//! token and store adapters can classify failures with consistent metadata.

// std
#[cfg(feature = "reqwest")] use std::time::Duration as StdDuration;
// crates.io
#[cfg(feature = "reqwest")]
use reqwest::{
	header::{HeaderMap, RETRY_AFTER},
	redirect::Policy,
};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, error::TransportError};
#[cfg(feature = "reqwest")] use crate::error::ConfigError;

/// Boxed future returned by transport implementations.
pub type TransportFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing portal form exchanges while
/// publishing response metadata to the broker's instrumentation pipeline.
///
/// The trait acts as the broker's only dependency on an HTTP stack. Callers provide an
/// implementation (typically behind `Arc<T>` where `T: PortalHttpClient`) shared by the
/// token client, the licensing client, and the feature-table store. Implementations must
/// be `Send + Sync + 'static` so they can be shared across broker instances without
/// additional wrappers, and the futures they return must be `Send` for the lifetime of
/// the in-flight operation.
///
/// # Metadata Contract
///
/// - Call [`ResponseMetadataSlot::take`] before submitting the HTTP request so stale
///   information never leaks across attempts.
/// - Once an HTTP response (successful or erroneous) provides status headers, save them
///   with [`ResponseMetadataSlot::store`].
/// - Never retain the slot clone beyond the lifetime of the returned future.
pub trait PortalHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Executes a `POST` carrying URL-encoded form fields and returns the raw response
	/// body, recording outcome metadata in `slot`.
	///
	/// Non-success HTTP statuses are not transport failures; the portal dialect reports
	/// most faults inside a `200` body, so callers inspect the body and the slot instead.
	fn post_form<'a>(
		&'a self,
		endpoint: &'a Url,
		form: &'a BTreeMap<String, String>,
		slot: ResponseMetadataSlot,
	) -> TransportFuture<'a, Vec<u8>>;
}

/// Captures metadata from the most recent HTTP response for downstream error mapping.
///
/// Additional metadata fields may be added in future releases, so downstream code
/// should construct values using field names instead of struct update syntax.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status code returned by the portal, if available.
	pub status: Option<u16>,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
}

/// Thread-safe slot for sharing [`ResponseMetadata`] between transport and error layers.
///
/// Adapters create a fresh slot for each portal request and read the captured metadata
/// immediately after the transport resolves. Transport implementations borrow the slot
/// just long enough to call [`store`](ResponseMetadataSlot::store) and must keep
/// ownership with the adapter.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Stores new metadata for the current request.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, if any, consuming it from the slot.
	///
	/// Custom HTTP clients should invoke this helper before performing a request to
	/// ensure traces from prior attempts never leak into the new invocation.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}

	/// Returns the captured HTTP status without consuming the rest of the metadata.
	pub fn status(&self) -> Option<u16> {
		self.0.lock().as_ref().and_then(|meta| meta.status)
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
/// Portal requests should not follow redirects; token and feature-service endpoints
/// return results directly instead of delegating to another URI. Configure any custom
/// [`ReqwestClient`] to disable redirect following and to carry a bounded request
/// timeout, matching what [`ReqwestHttpClient::bounded`] builds.
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Request timeout applied by [`ReqwestHttpClient::bounded`].
	pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(30);

	/// Builds a client with the default bounded timeout and redirects disabled.
	///
	/// Every outbound portal call shares this ceiling; a timeout surfaces as the error
	/// kind of the operation that was in flight.
	pub fn bounded() -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.timeout(Self::DEFAULT_TIMEOUT)
			.redirect(Policy::none())
			.build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl PortalHttpClient for ReqwestHttpClient {
	fn post_form<'a>(
		&'a self,
		endpoint: &'a Url,
		form: &'a BTreeMap<String, String>,
		slot: ResponseMetadataSlot,
	) -> TransportFuture<'a, Vec<u8>> {
		let client = self.0.clone();

		Box::pin(async move {
			slot.take();

			let response = client
				.post(endpoint.clone())
				.form(form)
				.send()
				.await
				.map_err(TransportError::from)?;
			let status = response.status();
			let retry_after = parse_retry_after(response.headers());

			slot.store(ResponseMetadata { status: Some(status.as_u16()), retry_after });

			let body = response.bytes().await.map_err(TransportError::from)?;

			Ok(body.to_vec())
		})
	}
}

#[cfg(feature = "reqwest")]
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(secs as i64));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn slot_take_consumes_stored_metadata() {
		let slot = ResponseMetadataSlot::default();

		slot.store(ResponseMetadata { status: Some(200), retry_after: None });

		assert_eq!(slot.status(), Some(200));

		let taken = slot.take().expect("Stored metadata should be takeable.");

		assert_eq!(taken.status, Some(200));
		assert!(slot.take().is_none());
	}
}
