//! Storage contracts and built-in store implementations for lease records.

pub mod feature_table;
pub mod memory;

pub use feature_table::FeatureTableStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, lease::Lease};

/// Boxed future returned by [`LeaseStore`] operations.
///
/// Operations resolve to the broker-wide [`enum@Error`]: the remote adapter acquires a
/// token per call, so auth failures surface alongside storage failures.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Storage backend contract implemented by lease stores.
///
/// The store is the single source of truth: there is no broker-side cache, and every
/// read begins with a lazy purge of expired records.
pub trait LeaseStore
where
	Self: Send + Sync,
{
	/// Deletes every lease whose end instant has passed, then counts the survivors.
	///
	/// The "has passed" comparison belongs to the store's own clock, not the broker's,
	/// which keeps purge decisions immune to clock skew between the two. A failed purge
	/// aborts the whole operation; the count is never taken over unpurged state.
	fn purge_and_count(&self) -> StoreFuture<'_, u32>;

	/// Persists one lease as a single-record batch with rollback-on-failure.
	///
	/// On [`InsertOutcome::RolledBack`] no partial record exists; a subsequent count
	/// observes the same state as before the attempt.
	fn insert(&self, lease: Lease) -> StoreFuture<'_, InsertOutcome>;

	/// Purges, then inserts the lease only if the surviving active count stays below
	/// `capacity`.
	///
	/// Backends that can hold a lock across the count and the insert (e.g.
	/// [`MemoryStore`]) make this check atomic. The remote feature service offers no
	/// such transaction, so its implementation degrades to the same check-then-insert
	/// sequence as the two-step flow; see [`FeatureTableStore`].
	fn reserve(&self, lease: Lease, capacity: u32) -> StoreFuture<'_, ReserveOutcome>;
}

/// Result of a single-record batch insert.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertOutcome {
	/// The record was committed.
	Committed,
	/// The store rejected the record and rolled the batch back.
	RolledBack,
}

/// Result of a conditional reserve attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReserveOutcome {
	/// The lease was inserted; `active` counts leases observed before the insert.
	Reserved {
		/// Active leases at decision time.
		active: u32,
	},
	/// Every seat was held; nothing was inserted.
	Exhausted {
		/// Active leases at decision time.
		active: u32,
	},
	/// Admission passed but the store rejected the insert and rolled it back.
	RolledBack,
}

/// Error type produced by [`LeaseStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced while encoding or decoding store payloads.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as StdError;
	// self
	use super::*;
	use crate::error::Error;

	#[test]
	fn store_error_converts_into_broker_error_with_source() {
		let store_error = StoreError::Backend { message: "lease table unreachable".into() };
		let broker_error: Error = store_error.clone().into();

		assert!(matches!(broker_error, Error::Storage(_)));
		assert!(broker_error.to_string().contains("lease table unreachable"));

		let source = StdError::source(&broker_error)
			.expect("Broker error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn outcomes_serialize_as_labels() {
		let payload = serde_json::to_string(&InsertOutcome::Committed)
			.expect("InsertOutcome should serialize to JSON.");

		assert_eq!(payload, "\"Committed\"");

		let round_trip: ReserveOutcome =
			serde_json::from_str("{\"Exhausted\":{\"active\":2}}")
				.expect("Serialized outcome should deserialize from JSON.");

		assert_eq!(round_trip, ReserveOutcome::Exhausted { active: 2 });
	}
}
