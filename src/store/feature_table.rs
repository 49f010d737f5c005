//! Remote [`LeaseStore`] adapter speaking the feature-service table dialect.
//!
//! Each operation acquires a fresh portal token, POSTs a URL-encoded form to one of the
//! table's sub-endpoints (`deleteFeatures`, `query`, `addFeatures`), and decodes the
//! JSON envelope the service answers with. Faults arrive inside `200` bodies, so the
//! adapter inspects envelopes rather than HTTP statuses.

// self
use crate::{
	_prelude::*,
	http::{PortalHttpClient, ResponseMetadataSlot},
	lease::Lease,
	portal::{PortalCredentials, PortalDescriptor, PortalFault, PortalToken, TokenClient, parse_json},
	store::{InsertOutcome, LeaseStore, ReserveOutcome, StoreError, StoreFuture},
};

/// Selects the records the store considers expired, evaluated against the store's own
/// server clock so purge decisions are immune to broker-side clock skew.
const EXPIRED_WHERE: &str = "end_ < CURRENT_TIMESTAMP";
/// Selects every surviving record for the post-purge count.
const ALL_WHERE: &str = "1=1";

/// Lease store backed by a remote feature-service table.
pub struct FeatureTableStore<C>
where
	C: ?Sized + PortalHttpClient,
{
	http_client: Arc<C>,
	table: Url,
	token_client: TokenClient<C>,
}
impl<C> FeatureTableStore<C>
where
	C: ?Sized + PortalHttpClient,
{
	/// Creates a store adapter for the descriptor's lease table endpoint.
	pub fn new(
		http_client: impl Into<Arc<C>>,
		descriptor: &PortalDescriptor,
		credentials: PortalCredentials,
	) -> Self {
		let http_client = http_client.into();
		let token_client = TokenClient::new(http_client.clone(), descriptor, credentials);

		Self { http_client, table: descriptor.endpoints.table.clone(), token_client }
	}

	fn op_endpoint(&self, op: &str) -> Result<Url, StoreError> {
		let mut url = self.table.clone();

		url.path_segments_mut()
			.map_err(|()| StoreError::Backend {
				message: "Lease table URL cannot be a base.".into(),
			})?
			.pop_if_empty()
			.push(op);

		Ok(url)
	}

	async fn post(
		&self,
		op: &'static str,
		form: &BTreeMap<String, String>,
	) -> Result<Vec<u8>, StoreError> {
		let endpoint = self.op_endpoint(op)?;
		let slot = ResponseMetadataSlot::default();

		self.http_client.post_form(&endpoint, form, slot).await.map_err(|source| {
			StoreError::Backend { message: format!("Transport failure during {op}: {source}") }
		})
	}

	async fn delete_expired(&self, token: &PortalToken) -> Result<(), StoreError> {
		let form = BTreeMap::from_iter([
			("where".into(), EXPIRED_WHERE.into()),
			("f".into(), "json".into()),
			("token".into(), token.secret.expose().into()),
		]);
		let body = self.post("deleteFeatures", &form).await?;
		let envelope: DeleteEnvelope = parse_json(&body).map_err(|source| {
			StoreError::Serialization { message: format!("deleteFeatures response: {source}") }
		})?;

		if let Some(fault) = envelope.error {
			return Err(StoreError::Backend {
				message: format!("Expired-lease purge was rejected: {}", fault.summary()),
			});
		}
		if envelope.success == Some(false) {
			return Err(StoreError::Backend {
				message: "Expired-lease purge reported failure.".into(),
			});
		}

		Ok(())
	}

	async fn count_survivors(&self, token: &PortalToken) -> Result<u32, StoreError> {
		let form = BTreeMap::from_iter([
			("where".into(), ALL_WHERE.into()),
			("outFields".into(), "*".into()),
			("returnGeometry".into(), "false".into()),
			("f".into(), "json".into()),
			("token".into(), token.secret.expose().into()),
		]);
		let body = self.post("query", &form).await?;
		let envelope: QueryEnvelope = parse_json(&body).map_err(|source| {
			StoreError::Serialization { message: format!("query response: {source}") }
		})?;

		if let Some(fault) = envelope.error {
			return Err(StoreError::Backend {
				message: format!("Lease query was rejected: {}", fault.summary()),
			});
		}

		let features = envelope.features.ok_or_else(|| StoreError::Serialization {
			message: "query response is missing the features array".into(),
		})?;

		Ok(u32::try_from(features.len()).unwrap_or(u32::MAX))
	}

	async fn purge_and_count_inner(&self) -> Result<u32> {
		let token = self.token_client.acquire_token().await?;

		self.delete_expired(&token).await?;

		Ok(self.count_survivors(&token).await?)
	}

	async fn insert_inner(&self, lease: Lease) -> Result<InsertOutcome> {
		let token = self.token_client.acquire_token().await?;
		let features =
			serde_json::to_string(&[LeaseFeature::from(&lease)]).map_err(|source| {
				StoreError::Serialization { message: format!("lease attributes: {source}") }
			})?;
		let form = BTreeMap::from_iter([
			("features".into(), features),
			("gdbVersion".into(), String::new()),
			("rollbackOnFailure".into(), "true".into()),
			("timeReferenceUnknownClient".into(), "false".into()),
			("f".into(), "json".into()),
			("token".into(), token.secret.expose().into()),
		]);
		let body = self.post("addFeatures", &form).await?;
		let envelope: AddEnvelope = parse_json(&body).map_err(|source| {
			StoreError::Serialization { message: format!("addFeatures response: {source}") }
		})?;

		if let Some(fault) = envelope.error {
			return Err(StoreError::Backend {
				message: format!("Lease insert was rejected: {}", fault.summary()),
			}
			.into());
		}

		let result = envelope
			.add_results
			.and_then(|results| results.into_iter().next())
			.ok_or_else(|| StoreError::Serialization {
				message: "addFeatures response is missing add results".into(),
			})?;

		// rollbackOnFailure guarantees the single-record batch left no partial row.
		if result.success { Ok(InsertOutcome::Committed) } else { Ok(InsertOutcome::RolledBack) }
	}

	async fn reserve_inner(&self, lease: Lease, capacity: u32) -> Result<ReserveOutcome> {
		// No portal transaction spans the count and the insert; concurrent reservers can
		// interleave between the two requests, so this conditional remains advisory on
		// the feature-service backend.
		let active = self.purge_and_count_inner().await?;

		if active >= capacity {
			return Ok(ReserveOutcome::Exhausted { active });
		}

		match self.insert_inner(lease).await? {
			InsertOutcome::Committed => Ok(ReserveOutcome::Reserved { active }),
			InsertOutcome::RolledBack => Ok(ReserveOutcome::RolledBack),
		}
	}
}
impl<C> LeaseStore for FeatureTableStore<C>
where
	C: ?Sized + PortalHttpClient,
{
	fn purge_and_count(&self) -> StoreFuture<'_, u32> {
		Box::pin(self.purge_and_count_inner())
	}

	fn insert(&self, lease: Lease) -> StoreFuture<'_, InsertOutcome> {
		Box::pin(self.insert_inner(lease))
	}

	fn reserve(&self, lease: Lease, capacity: u32) -> StoreFuture<'_, ReserveOutcome> {
		Box::pin(self.reserve_inner(lease, capacity))
	}
}
impl<C> Debug for FeatureTableStore<C>
where
	C: ?Sized + PortalHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("FeatureTableStore").field("table", &self.table.as_str()).finish()
	}
}

#[derive(Serialize)]
struct LeaseFeature<'a> {
	attributes: LeaseAttributes<'a>,
}
impl<'a> From<&'a Lease> for LeaseFeature<'a> {
	fn from(lease: &'a Lease) -> Self {
		Self {
			attributes: LeaseAttributes {
				id: &lease.id,
				user_: lease.owner.as_deref(),
				start: lease.start.as_raw(),
				end_: lease.end.as_raw(),
			},
		}
	}
}

// Field names mirror the table's column names; `user` and `end` are reserved words
// there, hence the trailing underscores.
#[derive(Serialize)]
struct LeaseAttributes<'a> {
	id: &'a str,
	user_: Option<&'a str>,
	start: i64,
	end_: i64,
}

#[derive(Deserialize)]
struct DeleteEnvelope {
	success: Option<bool>,
	error: Option<PortalFault>,
}

#[derive(Deserialize)]
struct QueryEnvelope {
	features: Option<Vec<serde_json::Value>>,
	error: Option<PortalFault>,
}

#[derive(Deserialize)]
struct AddEnvelope {
	#[serde(rename = "addResults")]
	add_results: Option<Vec<AddResult>>,
	error: Option<PortalFault>,
}

#[derive(Deserialize)]
struct AddResult {
	success: bool,
}
