//! Lease acquisition flow.
//!
//! The flow reproduces the table's original admission sequence: purge, count, decide,
//! insert. An in-process advisory guard serializes concurrent acquires inside one
//! broker, but the lease table itself provides no locking, so instances in other
//! processes can still interleave between the count and the insert. The
//! [`AdmissionMode::AtomicReserve`] path closes that window only on backends whose
//! [`LeaseStore::reserve`] is genuinely atomic.

// self
use crate::{
	_prelude::*,
	admission::{AdmissionDecision, CapacityExceeded},
	error::ConfigError,
	flows::{AdmissionMode, Broker, FlowStatus, LeaseRequest},
	http::PortalHttpClient,
	lease::{Lease, LeaseId},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::{InsertOutcome, LeaseStore, ReserveOutcome},
};

/// Outcome payload returned by [`Broker::acquire_lease`].
///
/// Denials and store-side rollbacks are ordinary receipts with a failed status; only
/// portal faults surface as [`enum@Error`] values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseReceipt {
	/// Caller-supplied lease identifier, echoed back.
	pub id: LeaseId,
	/// Seat holder's display name, echoed back.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub owner: Option<String>,
	/// Lease start rendered as `YYYY-MM-DD HH:MM:SS` UTC (granted receipts only).
	#[serde(skip_serializing_if = "Option::is_none")]
	pub start: Option<String>,
	/// Lease end rendered as `YYYY-MM-DD HH:MM:SS` UTC (granted receipts only).
	#[serde(skip_serializing_if = "Option::is_none")]
	pub end: Option<String>,
	/// Lease lifetime in minutes (granted receipts only).
	#[serde(skip_serializing_if = "Option::is_none")]
	pub remaining_minutes: Option<i64>,
	/// `success` when the lease was committed, `failed` otherwise.
	pub status: FlowStatus,
	/// Free seats left after this grant (granted receipts only).
	#[serde(skip_serializing_if = "Option::is_none")]
	pub licences_remaining: Option<u32>,
	/// Human-readable summary suitable for response bodies.
	pub message: String,
}
impl LeaseReceipt {
	fn granted(lease: &Lease, duration_minutes: i64, licences_remaining: u32) -> Self {
		Self {
			id: lease.id.clone(),
			owner: lease.owner.clone(),
			start: Some(lease.start.display_utc()),
			end: Some(lease.end.display_utc()),
			remaining_minutes: Some(duration_minutes),
			status: FlowStatus::Success,
			licences_remaining: Some(licences_remaining),
			message: format!("Remaining creator licences: {licences_remaining}."),
		}
	}

	fn denied(request: &LeaseRequest, denial: &CapacityExceeded) -> Self {
		Self {
			id: request.id.clone(),
			owner: request.owner.clone(),
			start: None,
			end: None,
			remaining_minutes: None,
			status: FlowStatus::Failed,
			licences_remaining: None,
			message: denial.to_string(),
		}
	}

	fn rolled_back(request: &LeaseRequest) -> Self {
		Self {
			id: request.id.clone(),
			owner: request.owner.clone(),
			start: None,
			end: None,
			remaining_minutes: None,
			status: FlowStatus::Failed,
			licences_remaining: None,
			message: "Failed to add the lease record.".into(),
		}
	}

	/// Returns `true` when the receipt records a committed lease.
	pub const fn is_granted(&self) -> bool {
		matches!(self.status, FlowStatus::Success)
	}
}

impl<C> Broker<C>
where
	C: ?Sized + PortalHttpClient,
{
	/// Attempts to reserve one creator seat for the requested identifier.
	///
	/// Denials return a failed receipt without contacting the token endpoint or the
	/// store again; portal faults propagate as errors for the embedding server to
	/// render as a 5xx-equivalent response.
	pub async fn acquire_lease(&self, request: LeaseRequest) -> Result<LeaseReceipt> {
		const KIND: FlowKind = FlowKind::AcquireLease;

		let span = FlowSpan::new(KIND, "acquire_lease");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let _advisory = self.acquire_guard.lock().await;

				match self.admission_mode {
					AdmissionMode::CheckThenInsert => self.acquire_checked(request).await,
					AdmissionMode::AtomicReserve => self.acquire_reserved(request).await,
				}
			})
			.await;

		match &result {
			Ok(receipt) if receipt.is_granted() =>
				obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Denied),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn acquire_checked(&self, request: LeaseRequest) -> Result<LeaseReceipt> {
		let active = self.store.purge_and_count().await?;
		let remaining = match self.policy.evaluate(active) {
			AdmissionDecision::Granted { remaining } => remaining,
			AdmissionDecision::Denied(denial) =>
				return Ok(LeaseReceipt::denied(&request, &denial)),
		};
		let lease = self.build_lease(&request)?;

		match self.store.insert(lease.clone()).await? {
			InsertOutcome::Committed =>
				Ok(LeaseReceipt::granted(&lease, self.descriptor.lease_minutes(), remaining - 1)),
			InsertOutcome::RolledBack => Ok(LeaseReceipt::rolled_back(&request)),
		}
	}

	async fn acquire_reserved(&self, request: LeaseRequest) -> Result<LeaseReceipt> {
		let lease = self.build_lease(&request)?;
		let capacity = self.policy.capacity();

		match <dyn LeaseStore>::reserve(self.store.as_ref(), lease.clone(), capacity).await? {
			ReserveOutcome::Reserved { active } => Ok(LeaseReceipt::granted(
				&lease,
				self.descriptor.lease_minutes(),
				capacity - active - 1,
			)),
			ReserveOutcome::Exhausted { active } => Ok(LeaseReceipt::denied(
				&request,
				&CapacityExceeded { capacity, active },
			)),
			ReserveOutcome::RolledBack => Ok(LeaseReceipt::rolled_back(&request)),
		}
	}

	fn build_lease(&self, request: &LeaseRequest) -> Result<Lease> {
		let mut builder = Lease::builder(request.id.clone())
			.duration_minutes(self.descriptor.lease_minutes());

		if let Some(owner) = &request.owner {
			builder = builder.owner(owner);
		}
		if let Some(instant) = request.starts_at {
			builder = builder.starts_at(instant);
		}

		builder.build().map_err(|source| ConfigError::from(source).into())
	}
}
