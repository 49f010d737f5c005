// self
use seat_broker::{
	lease::{Lease, LeaseId, UnixMillis},
	store::{InsertOutcome, LeaseStore, MemoryStore, ReserveOutcome},
};

fn lease(id: &str, end_offset_ms: i64) -> Lease {
	let now = UnixMillis::now();

	Lease::builder(LeaseId::new(id).expect("Lease identifier fixture should be valid."))
		.starts_at(now)
		.expires_at(UnixMillis::from_raw(now.as_raw() + end_offset_ms))
		.build()
		.expect("Lease fixture should build successfully.")
}

#[tokio::test]
async fn purge_removes_exactly_the_expired_records() {
	let store = MemoryStore::default();

	store.insert(lease("expired-a", -3_600_000)).await.expect("Insert should succeed.");
	store.insert(lease("expired-b", -1_000)).await.expect("Insert should succeed.");
	store.insert(lease("live-a", 1_000)).await.expect("Insert should succeed.");
	store.insert(lease("live-b", 3_600_000)).await.expect("Insert should succeed.");

	let survivors = store.purge_and_count().await.expect("Purge should succeed.");

	assert_eq!(survivors, 2);

	let mut surviving_ids = store
		.snapshot()
		.into_iter()
		.map(|record| record.id.as_ref().to_owned())
		.collect::<Vec<_>>();

	surviving_ids.sort();

	assert_eq!(surviving_ids, ["live-a", "live-b"]);

	// Purging twice in succession yields the same surviving set.
	let again = store.purge_and_count().await.expect("Second purge should succeed.");

	assert_eq!(again, 2);
	assert_eq!(store.snapshot().len(), 2);
}

#[tokio::test]
async fn failed_insert_leaves_the_count_unchanged() {
	let store = MemoryStore::default();

	store.insert(lease("live", 3_600_000)).await.expect("Insert should succeed.");
	store.fail_next_insert();

	let outcome = store.insert(lease("doomed", 3_600_000)).await.expect("Insert should resolve.");

	assert_eq!(outcome, InsertOutcome::RolledBack);

	let count = store.purge_and_count().await.expect("Count should succeed.");

	assert_eq!(count, 1, "A rolled-back insert must leave no partial record behind.");
}

#[tokio::test]
async fn reserve_denies_at_the_capacity_boundary() {
	let store = MemoryStore::default();

	store.insert(lease("holder-1", 3_600_000)).await.expect("Insert should succeed.");
	store.insert(lease("holder-2", 3_600_000)).await.expect("Insert should succeed.");

	let outcome = store
		.reserve(lease("late", 3_600_000), 2)
		.await
		.expect("Reserve should resolve.");

	assert_eq!(outcome, ReserveOutcome::Exhausted { active: 2 });
	assert_eq!(store.snapshot().len(), 2);
}

#[tokio::test]
async fn reserve_purges_before_deciding() {
	let store = MemoryStore::default();

	store.insert(lease("expired", -1_000)).await.expect("Insert should succeed.");
	store.insert(lease("live", 3_600_000)).await.expect("Insert should succeed.");

	let outcome = store
		.reserve(lease("fresh", 3_600_000), 2)
		.await
		.expect("Reserve should resolve.");

	assert_eq!(outcome, ReserveOutcome::Reserved { active: 1 });
	assert_eq!(store.snapshot().len(), 2);
}

#[tokio::test]
async fn concurrent_reserves_admit_a_single_winner() {
	let store = MemoryStore::default();
	let store_a = store.clone();
	let store_b = store.clone();
	let task_a = tokio::spawn(async move {
		store_a
			.reserve(lease("contender-a", 3_600_000), 1)
			.await
			.expect("Reserve task A should complete successfully.")
	});
	let task_b = tokio::spawn(async move {
		store_b
			.reserve(lease("contender-b", 3_600_000), 1)
			.await
			.expect("Reserve task B should complete successfully.")
	});
	let (outcome_a, outcome_b) = tokio::join!(task_a, task_b);
	let outcome_a = outcome_a.expect("Reserve task A should not panic.");
	let outcome_b = outcome_b.expect("Reserve task B should not panic.");
	let reservations = [outcome_a, outcome_b]
		.iter()
		.filter(|outcome| matches!(outcome, ReserveOutcome::Reserved { .. }))
		.count();

	assert_eq!(reservations, 1, "only one reserve should win the last seat");
	assert_eq!(store.snapshot().len(), 1);
}

#[tokio::test]
async fn rolled_back_reserve_keeps_the_seat_free() {
	let store = MemoryStore::default();

	store.fail_next_insert();

	let outcome = store
		.reserve(lease("doomed", 3_600_000), 1)
		.await
		.expect("Reserve should resolve.");

	assert_eq!(outcome, ReserveOutcome::RolledBack);
	assert!(store.snapshot().is_empty());

	let retry = store
		.reserve(lease("fresh", 3_600_000), 1)
		.await
		.expect("Retry reserve should resolve.");

	assert_eq!(retry, ReserveOutcome::Reserved { active: 0 });
}
