//! Demonstrates the availability check: the broker purges expired leases, counts the
//! survivors, and reports how many creator seats remain.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use seat_broker::{
	admission::AdmissionPolicy,
	flows::Broker,
	http::ReqwestHttpClient,
	lease::PortalId,
	portal::{PortalCredentials, PortalDescriptor},
	reqwest::Client,
	store::FeatureTableStore,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let _token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/generateToken");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"token\":\"demo-token\"}");
		})
		.await;
	let delete_mock = server
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
			then.status(200).header("content-type", "application/json").body(
				"{\"features\":[{\"attributes\":{\"id\":\"held-seat\",\"user_\":null,\"start\":0,\"end_\":9999999999999}}]}",
			);
		})
		.await;
	let descriptor = PortalDescriptor::builder(PortalId::new("demo-portal")?)
		.token_endpoint(Url::parse(&server.url("/generateToken"))?)
		.table_endpoint(Url::parse(&server.url("/leases/0"))?)
		.build()?;
	let http_client = ReqwestHttpClient::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?,
	);
	let store = Arc::new(FeatureTableStore::<ReqwestHttpClient>::new(
		Arc::new(http_client.clone()),
		&descriptor,
		PortalCredentials::new("demo-operator", "demo-password"),
	));
	let broker = Broker::with_http_client(store, descriptor, AdmissionPolicy::new(5), http_client);
	let report = broker.check_availability().await?;

	println!("Availability report: {}.", serde_json::to_string_pretty(&report)?);

	// The check purges even though it only reports.
	delete_mock.assert_async().await;

	Ok(())
}
