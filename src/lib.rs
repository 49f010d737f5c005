//! Rust’s turnkey creator-seat lease broker—capacity-aware reservations, feature-service lease
//! stores, and transport-aware observability in one crate built for production.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod admission;
pub mod error;
pub mod flows;
pub mod http;
pub mod lease;
pub mod obs;
pub mod portal;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		admission::AdmissionPolicy,
		flows::Broker,
		http::ReqwestHttpClient,
		lease::PortalId,
		portal::{PortalCredentials, PortalDescriptor},
		store::{FeatureTableStore, LeaseStore, MemoryStore},
	};

	/// Broker type alias used by reqwest-backed integration tests.
	pub type ReqwestTestBroker = Broker<ReqwestHttpClient>;

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Portal credentials shared by integration test fixtures.
	pub fn test_credentials() -> PortalCredentials {
		PortalCredentials::new("gis-operator", "gis-password")
	}

	/// Descriptor pointing at unreachable placeholder endpoints, for brokers that never touch
	/// the network (e.g. memory-store scenarios).
	pub fn test_descriptor(lease_minutes: i64) -> PortalDescriptor {
		let portal_id =
			PortalId::new("test-portal").expect("Test portal identifier should be valid.");

		PortalDescriptor::builder(portal_id)
			.token_endpoint(
				Url::parse("https://portal.example.com/sharing/rest/generateToken")
					.expect("Placeholder token endpoint should parse successfully."),
			)
			.table_endpoint(
				Url::parse("https://portal.example.com/server/rest/services/leases/0")
					.expect("Placeholder table endpoint should parse successfully."),
			)
			.lease_duration(Duration::minutes(lease_minutes))
			.build()
			.expect("Placeholder descriptor should build successfully.")
	}

	/// Constructs a [`Broker`] whose lease store speaks to a real (mock) feature service over
	/// the reqwest transport used across integration tests.
	pub fn build_reqwest_test_broker(
		descriptor: PortalDescriptor,
		capacity: u32,
	) -> ReqwestTestBroker {
		let http_client = test_reqwest_http_client();
		let store = Arc::new(FeatureTableStore::<ReqwestHttpClient>::new(
			Arc::new(http_client.clone()),
			&descriptor,
			test_credentials(),
		));

		Broker::with_http_client(store, descriptor, AdmissionPolicy::new(capacity), http_client)
	}

	/// Constructs a [`Broker`] backed by an in-memory lease store, for scenarios that exercise
	/// admission and purge semantics without a portal.
	pub fn build_memory_test_broker(
		capacity: u32,
		lease_minutes: i64,
	) -> (ReqwestTestBroker, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn LeaseStore> = store_backend.clone();
		let broker = Broker::with_http_client(
			store,
			test_descriptor(lease_minutes),
			AdmissionPolicy::new(capacity),
			test_reqwest_http_client(),
		);

		(broker, store_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _, seat_broker as _};
