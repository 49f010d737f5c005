// crates.io
use httpmock::prelude::*;
// self
use seat_broker::{
	_preludet::*,
	error::Error,
	flows::FlowStatus,
	lease::{Lease, LeaseId, PortalId, UnixMillis},
	portal::PortalDescriptor,
	store::LeaseStore,
};

fn build_descriptor(server: &MockServer) -> PortalDescriptor {
	let portal_id = PortalId::new("mock-check-portal")
		.expect("Portal identifier should be valid for check tests.");

	PortalDescriptor::builder(portal_id)
		.token_endpoint(
			Url::parse(&server.url("/generateToken"))
				.expect("Mock token endpoint should parse successfully."),
		)
		.table_endpoint(
			Url::parse(&server.url("/leases/0"))
				.expect("Mock table endpoint should parse successfully."),
		)
		.build()
		.expect("Portal descriptor should build successfully.")
}

fn feature_rows(count: usize) -> String {
	let rows = (0..count)
		.map(|index| {
			format!(
				"{{\"attributes\":{{\"id\":\"seat-{index}\",\"user_\":null,\"start\":0,\"end_\":9999999999999}}}}"
			)
		})
		.collect::<Vec<_>>()
		.join(",");

	format!("{{\"features\":[{rows}]}}")
}

#[tokio::test]
async fn check_reports_free_seats_after_purging() {
	let server = MockServer::start_async().await;
	let descriptor = build_descriptor(&server);
	let broker = build_reqwest_test_broker(descriptor, 5);
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/generateToken");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"token\":\"check-token\"}");
		})
		.await;
	let delete_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/leases/0/deleteFeatures")
				.body_includes("end_+%3C+CURRENT_TIMESTAMP")
				.body_includes("token=check-token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"success\":true}");
		})
		.await;
	let query_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/leases/0/query").body_includes("where=1%3D1");
			then.status(200)
				.header("content-type", "application/json")
				.body(feature_rows(1));
		})
		.await;
	let report = broker.check_availability().await.expect("Availability check should succeed.");

	assert_eq!(report.status, FlowStatus::Success);
	assert_eq!(report.licences, 4);
	assert!(report.message.contains("4 remaining creator licences"));

	token_mock.assert_async().await;
	delete_mock.assert_async().await;
	query_mock.assert_async().await;
}

#[tokio::test]
async fn check_reports_exhaustion_with_zero_licences() {
	let server = MockServer::start_async().await;
	let descriptor = build_descriptor(&server);
	let broker = build_reqwest_test_broker(descriptor, 2);
	let _token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/generateToken");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"token\":\"check-token\"}");
		})
		.await;
	let _delete_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/leases/0/deleteFeatures");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"success\":true}");
		})
		.await;
	let _query_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/leases/0/query");
			then.status(200)
				.header("content-type", "application/json")
				.body(feature_rows(2));
		})
		.await;
	let report = broker.check_availability().await.expect("Availability check should succeed.");

	assert_eq!(report.status, FlowStatus::Failed);
	assert_eq!(report.licences, 0);
	assert!(report.message.contains("No creator licences available"));
}

#[tokio::test]
async fn failed_purge_aborts_the_check() {
	let server = MockServer::start_async().await;
	let descriptor = build_descriptor(&server);
	let broker = build_reqwest_test_broker(descriptor, 2);
	let _token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/generateToken");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"token\":\"check-token\"}");
		})
		.await;
	let _delete_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/leases/0/deleteFeatures");
			then.status(200).header("content-type", "application/json").body(
				"{\"error\":{\"code\":500,\"message\":\"Unable to complete operation.\",\"details\":[]}}",
			);
		})
		.await;
	let query_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/leases/0/query");
			then.status(200)
				.header("content-type", "application/json")
				.body(feature_rows(0));
		})
		.await;
	let err = broker
		.check_availability()
		.await
		.expect_err("A rejected purge should abort the check.");

	assert!(matches!(err, Error::Storage(_)));

	// The count must never run over unpurged state.
	query_mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn check_purges_expired_leases_from_a_seeded_store() {
	let (broker, store) = build_memory_test_broker(5, 60);
	let now = UnixMillis::now();
	let expired = Lease::builder(
		LeaseId::new("expired-seat").expect("Lease identifier fixture should be valid."),
	)
	.starts_at(UnixMillis::from_raw(now.as_raw() - 3_600_000))
	.expires_at(UnixMillis::from_raw(now.as_raw() - 1_000))
	.build()
	.expect("Expired lease fixture should build.");
	let live = Lease::builder(
		LeaseId::new("live-seat").expect("Lease identifier fixture should be valid."),
	)
	.starts_at(now)
	.expires_at(UnixMillis::from_raw(now.as_raw() + 3_600_000))
	.build()
	.expect("Live lease fixture should build.");

	store.insert(expired).await.expect("Seeding the expired lease should succeed.");
	store.insert(live).await.expect("Seeding the live lease should succeed.");

	let report = broker.check_availability().await.expect("Availability check should succeed.");

	assert_eq!(report.status, FlowStatus::Success);
	assert_eq!(report.licences, 4);

	let survivors = store.snapshot();

	assert_eq!(survivors.len(), 1);
	assert_eq!(survivors[0].id.as_ref(), "live-seat");
}
