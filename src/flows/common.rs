//! Shared request and status types used by both lease flows.

// self
use crate::{
	_prelude::*,
	lease::{LeaseId, UnixMillis},
};

/// Reported outcome of a flow, mirrored verbatim into response payloads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowStatus {
	/// The operation achieved its goal.
	Success,
	/// The operation was processed but its goal was not achieved (e.g. no seats left).
	Failed,
}
impl FlowStatus {
	/// Returns a stable label suitable for payload or log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowStatus::Success => "success",
			FlowStatus::Failed => "failed",
		}
	}
}
impl Display for FlowStatus {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Parameters for one acquire-lease attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseRequest {
	/// Caller-supplied lease identifier.
	pub id: LeaseId,
	/// Optional display name of the seat holder.
	pub owner: Option<String>,
	/// Overrides the lease creation instant (defaults to the broker's clock).
	pub starts_at: Option<UnixMillis>,
}
impl LeaseRequest {
	/// Creates a request for the provided lease identifier.
	pub fn new(id: LeaseId) -> Self {
		Self { id, owner: None, starts_at: None }
	}

	/// Attaches the seat holder's display name.
	pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
		self.owner = Some(owner.into());

		self
	}

	/// Pins the lease creation instant, for deterministic tests and replays.
	pub fn with_starts_at(mut self, instant: UnixMillis) -> Self {
		self.starts_at = Some(instant);

		self
	}
}
