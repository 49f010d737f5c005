//! High-level lease flows coordinated by the broker.

pub mod acquire;
pub mod check;
pub mod common;

pub use acquire::*;
pub use check::*;
pub use common::*;

// self
use crate::{
	_prelude::*,
	admission::AdmissionPolicy,
	http::PortalHttpClient,
	portal::{LicensingClient, PortalCredentials, PortalDescriptor, TokenClient},
	store::{FeatureTableStore, LeaseStore},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// Broker specialized for the crate's default reqwest transport stack.
pub type ReqwestBroker = Broker<ReqwestHttpClient>;

/// Selects how acquire flows admit a new lease.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionMode {
	#[default]
	/// Count first, then insert in a separate store call. Faithful to the table's
	/// original usage; concurrent processes can both pass the count.
	CheckThenInsert,
	/// Delegate the conditional insert to [`LeaseStore::reserve`], which is atomic on
	/// backends that can hold a lock across the check.
	AtomicReserve,
}

/// Coordinates seat-lease flows against a single portal descriptor.
///
/// The broker owns the HTTP client, lease store, descriptor, and admission policy so
/// the flow implementations can focus on sequencing (purge, count, admit, insert).
/// Capacity is resolved once at construction and never refreshed while serving.
#[derive(Clone)]
pub struct Broker<C>
where
	C: ?Sized + PortalHttpClient,
{
	/// HTTP client wrapper shared by every outbound portal request.
	pub http_client: Arc<C>,
	/// Lease store treated as the single source of truth on every operation.
	pub store: Arc<dyn LeaseStore>,
	/// Portal descriptor validated at startup.
	pub descriptor: PortalDescriptor,
	/// Fixed-capacity admission policy.
	pub policy: AdmissionPolicy,
	/// Admission strategy used by acquire flows.
	pub admission_mode: AdmissionMode,
	pub(crate) acquire_guard: Arc<AsyncMutex<()>>,
}
impl<C> Broker<C>
where
	C: ?Sized + PortalHttpClient,
{
	/// Creates a broker that reuses the caller-provided transport.
	pub fn with_http_client(
		store: Arc<dyn LeaseStore>,
		descriptor: PortalDescriptor,
		policy: AdmissionPolicy,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			store,
			descriptor,
			policy,
			admission_mode: AdmissionMode::default(),
			acquire_guard: Default::default(),
		}
	}

	/// Overrides the admission strategy used by acquire flows.
	pub fn with_admission_mode(mut self, mode: AdmissionMode) -> Self {
		self.admission_mode = mode;

		self
	}

	/// Connects to the portal over the provided transport: exchanges credentials once,
	/// resolves the licensed seat capacity, and wires a feature-table lease store.
	///
	/// Every error here is a startup fault; callers treat it as fatal and decide for
	/// themselves whether to terminate.
	pub async fn connect_with_http_client(
		descriptor: PortalDescriptor,
		credentials: PortalCredentials,
		http_client: impl Into<Arc<C>>,
	) -> Result<Self> {
		let http_client = http_client.into();
		let token_client: TokenClient<C> =
			TokenClient::new(http_client.clone(), &descriptor, credentials.clone());
		let token = token_client.acquire_token().await?;
		let licensing: LicensingClient<C> =
			LicensingClient::from_descriptor(http_client.clone(), &descriptor)?;
		let capacity = licensing.licensed_capacity(&token).await?;
		let store =
			Arc::new(FeatureTableStore::<C>::new(http_client.clone(), &descriptor, credentials));

		Ok(Self::with_http_client(
			store,
			descriptor,
			AdmissionPolicy::new(capacity),
			http_client,
		))
	}
}
#[cfg(feature = "reqwest")]
impl Broker<ReqwestHttpClient> {
	/// Connects using a fresh reqwest transport with the default bounded timeout.
	pub async fn connect(
		descriptor: PortalDescriptor,
		credentials: PortalCredentials,
	) -> Result<Self> {
		let http_client = ReqwestHttpClient::bounded()?;

		Self::connect_with_http_client(descriptor, credentials, http_client).await
	}
}
impl<C> Debug for Broker<C>
where
	C: ?Sized + PortalHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Broker")
			.field("descriptor", &self.descriptor)
			.field("policy", &self.policy)
			.field("admission_mode", &self.admission_mode)
			.finish()
	}
}
