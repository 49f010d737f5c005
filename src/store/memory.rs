//! Thread-safe in-memory [`LeaseStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	lease::{Lease, UnixMillis},
	store::{InsertOutcome, LeaseStore, ReserveOutcome, StoreFuture},
};

type LeaseRows = Arc<RwLock<Vec<Lease>>>;

/// In-process lease store that keeps records in a plain vector.
///
/// The store is its own "server", so purge decisions use the local clock. Records are
/// deliberately unkeyed: the table enforces no identifier uniqueness, and duplicate
/// concurrent leases must stay representable.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
	rows: LeaseRows,
	pending_insert_faults: Arc<Mutex<usize>>,
}
impl MemoryStore {
	/// Returns a snapshot of the surviving records.
	pub fn snapshot(&self) -> Vec<Lease> {
		self.rows.read().clone()
	}

	/// Makes the next insert report a rollback, for exercising failure paths in tests
	/// and demos. Calls accumulate; each one fails exactly one insert.
	pub fn fail_next_insert(&self) {
		*self.pending_insert_faults.lock() += 1;
	}

	fn take_insert_fault(&self) -> bool {
		let mut pending = self.pending_insert_faults.lock();

		if *pending > 0 {
			*pending -= 1;

			true
		} else {
			false
		}
	}

	fn purge_and_count_now(rows: &LeaseRows) -> u32 {
		let now = UnixMillis::now();
		let mut guard = rows.write();

		// Removes exactly the records whose end has passed; purging twice in a row
		// yields the same surviving set.
		guard.retain(|lease| lease.end >= now);

		u32::try_from(guard.len()).unwrap_or(u32::MAX)
	}
}
impl LeaseStore for MemoryStore {
	fn purge_and_count(&self) -> StoreFuture<'_, u32> {
		let rows = self.rows.clone();

		Box::pin(async move { Ok(Self::purge_and_count_now(&rows)) })
	}

	fn insert(&self, lease: Lease) -> StoreFuture<'_, InsertOutcome> {
		Box::pin(async move {
			if self.take_insert_fault() {
				return Ok(InsertOutcome::RolledBack);
			}

			self.rows.write().push(lease);

			Ok(InsertOutcome::Committed)
		})
	}

	fn reserve(&self, lease: Lease, capacity: u32) -> StoreFuture<'_, ReserveOutcome> {
		Box::pin(async move {
			let now = UnixMillis::now();
			let mut guard = self.rows.write();

			guard.retain(|row| row.end >= now);

			// The write guard spans the count and the insert, so concurrent reservers
			// cannot interleave and the capacity ceiling is hard here.
			let active = u32::try_from(guard.len()).unwrap_or(u32::MAX);

			if active >= capacity {
				return Ok(ReserveOutcome::Exhausted { active });
			}
			if self.take_insert_fault() {
				return Ok(ReserveOutcome::RolledBack);
			}

			guard.push(lease);

			Ok(ReserveOutcome::Reserved { active })
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::lease::LeaseId;

	fn lease(id: &str, end_offset_ms: i64) -> Lease {
		let now = UnixMillis::now();

		Lease::builder(LeaseId::new(id).expect("Lease identifier fixture should be valid."))
			.starts_at(now)
			.expires_at(UnixMillis::from_raw(now.as_raw() + end_offset_ms))
			.build()
			.expect("Lease fixture should build successfully.")
	}

	#[tokio::test]
	async fn purge_is_idempotent_and_exact() {
		let store = MemoryStore::default();

		store.insert(lease("expired", -1_000)).await.expect("Insert should succeed.");
		store.insert(lease("live", 3_600_000)).await.expect("Insert should succeed.");

		let first = store.purge_and_count().await.expect("First purge should succeed.");

		assert_eq!(first, 1);
		assert_eq!(store.snapshot().len(), 1);
		assert_eq!(store.snapshot()[0].id.as_ref(), "live");

		let second = store.purge_and_count().await.expect("Second purge should succeed.");

		assert_eq!(second, 1);
	}

	#[tokio::test]
	async fn reserve_holds_the_capacity_ceiling() {
		let store = MemoryStore::default();
		let first = store
			.reserve(lease("seat-1", 3_600_000), 1)
			.await
			.expect("First reserve should succeed.");

		assert_eq!(first, ReserveOutcome::Reserved { active: 0 });

		let second = store
			.reserve(lease("seat-2", 3_600_000), 1)
			.await
			.expect("Second reserve should succeed.");

		assert_eq!(second, ReserveOutcome::Exhausted { active: 1 });
		assert_eq!(store.snapshot().len(), 1);
	}

	#[tokio::test]
	async fn injected_fault_rolls_back_one_insert() {
		let store = MemoryStore::default();

		store.fail_next_insert();

		let outcome = store.insert(lease("seat-1", 60_000)).await.expect("Insert should resolve.");

		assert_eq!(outcome, InsertOutcome::RolledBack);
		assert!(store.snapshot().is_empty());

		let retry = store.insert(lease("seat-1", 60_000)).await.expect("Retry should resolve.");

		assert_eq!(retry, InsertOutcome::Committed);
		assert_eq!(store.snapshot().len(), 1);
	}
}
