//! Capacity-based admission control for seat leases.
//!
//! The policy is a pure decision function over two integers; all state lives in the
//! lease table, which is consulted (and purged) immediately before every evaluation.

// self
use crate::_prelude::*;

/// Admission denial reported when every licensed seat is held by an active lease.
///
/// This is a domain outcome, not a fault: flows surface it inside an ordinary response
/// body with a failed status instead of propagating it as an [`enum@crate::error::Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
#[error("No creator licences available: {active} active of {capacity} seats")]
pub struct CapacityExceeded {
	/// Licensed seat maximum.
	pub capacity: u32,
	/// Active leases observed at evaluation time.
	pub active: u32,
}

/// Outcome of evaluating an admission request against the policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdmissionDecision {
	/// A seat is available; `remaining` counts free seats before the new lease lands.
	Granted {
		/// Free seats at evaluation time (`capacity - active`, at least one).
		remaining: u32,
	},
	/// Every seat is held.
	Denied(CapacityExceeded),
}
impl AdmissionDecision {
	/// Returns `true` when the decision grants a seat.
	pub const fn is_granted(&self) -> bool {
		matches!(self, Self::Granted { .. })
	}

	/// Converts the decision into a result carrying the free-seat count.
	pub fn into_result(self) -> Result<u32, CapacityExceeded> {
		match self {
			Self::Granted { remaining } => Ok(remaining),
			Self::Denied(denial) => Err(denial),
		}
	}
}

/// Fixed-capacity admission policy for creator seats.
///
/// Capacity is resolved once at startup from portal licensing metadata and never
/// refreshed afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionPolicy {
	capacity: u32,
}
impl AdmissionPolicy {
	/// Creates a policy for the provided seat maximum.
	pub const fn new(capacity: u32) -> Self {
		Self { capacity }
	}

	/// Licensed seat maximum.
	pub const fn capacity(&self) -> u32 {
		self.capacity
	}

	/// Evaluates an admission request given the current active-lease count.
	///
	/// Admission is granted iff `active < capacity`; the `active == capacity` boundary
	/// denies.
	pub fn evaluate(&self, active: u32) -> AdmissionDecision {
		if active < self.capacity {
			AdmissionDecision::Granted { remaining: self.capacity - active }
		} else {
			AdmissionDecision::Denied(CapacityExceeded { capacity: self.capacity, active })
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn admission_grants_iff_active_below_capacity() {
		let policy = AdmissionPolicy::new(3);

		assert_eq!(policy.evaluate(0), AdmissionDecision::Granted { remaining: 3 });
		assert_eq!(policy.evaluate(2), AdmissionDecision::Granted { remaining: 1 });
		assert_eq!(
			policy.evaluate(3),
			AdmissionDecision::Denied(CapacityExceeded { capacity: 3, active: 3 })
		);
		assert_eq!(
			policy.evaluate(7),
			AdmissionDecision::Denied(CapacityExceeded { capacity: 3, active: 7 })
		);
	}

	#[test]
	fn zero_capacity_always_denies() {
		let policy = AdmissionPolicy::new(0);

		assert!(!policy.evaluate(0).is_granted());
	}

	#[test]
	fn decision_converts_into_result() {
		let policy = AdmissionPolicy::new(2);

		assert_eq!(policy.evaluate(1).into_result(), Ok(1));
		assert_eq!(
			policy.evaluate(2).into_result(),
			Err(CapacityExceeded { capacity: 2, active: 2 })
		);
	}

	#[test]
	fn denial_renders_reportable_message() {
		let denial = CapacityExceeded { capacity: 2, active: 2 };

		assert_eq!(denial.to_string(), "No creator licences available: 2 active of 2 seats");
	}
}
