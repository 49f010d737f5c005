//! Demonstrates connecting to a (mock) portal, discovering creator capacity, and
//! acquiring one seat lease with the default reqwest transport.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use seat_broker::{
	flows::{Broker, LeaseRequest},
	http::ReqwestHttpClient,
	lease::{LeaseId, PortalId},
	portal::{PortalCredentials, PortalDescriptor},
	reqwest::Client,
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
				.body("{\"token\":\"demo-token\",\"expires\":1893456000000}");
		})
		.await;
	let _licensing_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/licenses");
			then.status(200).header("content-type", "application/json").body(
				"{\"userTypes\":[{\"id\":\"creatorUT\",\"maximumRegisteredMembers\":3}]}",
			);
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
				.body("{\"features\":[]}");
		})
		.await;
	let add_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/leases/0/addFeatures");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"addResults\":[{\"objectId\":1,\"success\":true}]}");
		})
		.await;
	let descriptor = PortalDescriptor::builder(PortalId::new("demo-portal")?)
		.token_endpoint(Url::parse(&server.url("/generateToken"))?)
		.table_endpoint(Url::parse(&server.url("/leases/0"))?)
		.licensing_endpoint(Url::parse(&server.url("/licenses"))?)
		.build()?;
	let http_client = ReqwestHttpClient::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?,
	);
	let broker = Broker::connect_with_http_client(
		descriptor,
		PortalCredentials::new("demo-operator", "demo-password"),
		http_client,
	)
	.await?;
	let receipt = broker
		.acquire_lease(LeaseRequest::new(LeaseId::new("demo-seat")?).with_owner("demo-user"))
		.await?;

	println!("Lease receipt: {}.", serde_json::to_string_pretty(&receipt)?);

	add_mock.assert_async().await;

	Ok(())
}
