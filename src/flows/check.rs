//! Availability reporting flow.
//!
//! Checking availability is read-only in intent but still purges: the lazy expiry
//! model relies on every count being preceded by a sweep of overdue records.

// self
use crate::{
	_prelude::*,
	admission::{AdmissionDecision, CapacityExceeded},
	flows::{Broker, FlowStatus},
	http::PortalHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Availability summary returned by [`Broker::check_availability`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityReport {
	/// `success` when at least one seat is free, `failed` otherwise.
	pub status: FlowStatus,
	/// Free seats after the purge (zero when exhausted).
	pub licences: u32,
	/// Human-readable summary suitable for response bodies.
	pub message: String,
}
impl AvailabilityReport {
	fn available(licences: u32) -> Self {
		Self {
			status: FlowStatus::Success,
			licences,
			message: format!("There exist {licences} remaining creator licences."),
		}
	}

	fn exhausted(denial: &CapacityExceeded) -> Self {
		Self { status: FlowStatus::Failed, licences: 0, message: denial.to_string() }
	}

	/// Returns `true` when the report advertises at least one free seat.
	pub const fn is_available(&self) -> bool {
		matches!(self.status, FlowStatus::Success)
	}
}

impl<C> Broker<C>
where
	C: ?Sized + PortalHttpClient,
{
	/// Purges expired leases, counts the survivors, and reports how many seats remain.
	pub async fn check_availability(&self) -> Result<AvailabilityReport> {
		const KIND: FlowKind = FlowKind::CheckAvailability;

		let span = FlowSpan::new(KIND, "check_availability");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let active = self.store.purge_and_count().await?;

				match self.policy.evaluate(active) {
					AdmissionDecision::Granted { remaining } =>
						Ok(AvailabilityReport::available(remaining)),
					AdmissionDecision::Denied(denial) =>
						Ok(AvailabilityReport::exhausted(&denial)),
				}
			})
			.await;

		match &result {
			Ok(report) if report.is_available() =>
				obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Denied),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}
