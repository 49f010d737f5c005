//! Immutable lease record structs, lifecycle helpers, and builders.

// crates.io
use time::{format_description::BorrowedFormatItem, macros::format_description};
// self
use crate::{_prelude::*, lease::LeaseId};

const DISPLAY_FORMAT: &[BorrowedFormatItem<'static>] =
	format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Millisecond-precision epoch timestamp, the wire format of the lease table.
///
/// All lease arithmetic stays in integer milliseconds so `start + minutes * 60_000` is exact;
/// conversions to [`OffsetDateTime`] exist only at the display boundary.
#[derive(
	Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct UnixMillis(i64);
impl UnixMillis {
	/// Wraps a raw millisecond count since the Unix epoch.
	pub const fn from_raw(raw: i64) -> Self {
		Self(raw)
	}

	/// Returns the raw millisecond count since the Unix epoch.
	pub const fn as_raw(self) -> i64 {
		self.0
	}

	/// Returns the instant shifted forward by the given whole minutes.
	pub const fn plus_minutes(self, minutes: i64) -> Self {
		Self(self.0 + minutes * 60_000)
	}

	/// Captures the current UTC instant.
	pub fn now() -> Self {
		Self::from_datetime(OffsetDateTime::now_utc())
	}

	/// Truncates an [`OffsetDateTime`] to millisecond precision.
	pub fn from_datetime(instant: OffsetDateTime) -> Self {
		Self((instant.unix_timestamp_nanos() / 1_000_000) as i64)
	}

	/// Converts back into an [`OffsetDateTime`], if the value is within the representable range.
	pub fn datetime(self) -> Option<OffsetDateTime> {
		OffsetDateTime::from_unix_timestamp_nanos(self.0 as i128 * 1_000_000).ok()
	}

	/// Renders the instant as `YYYY-MM-DD HH:MM:SS` in UTC, falling back to the raw
	/// millisecond count for out-of-range values.
	pub fn display_utc(self) -> String {
		self.datetime()
			.and_then(|instant| instant.format(DISPLAY_FORMAT).ok())
			.unwrap_or_else(|| self.0.to_string())
	}
}
impl Display for UnixMillis {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.display_utc())
	}
}

/// Current lifecycle status for a lease record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaseStatus {
	/// Lease end instant is still in the future.
	Active,
	/// Lease end instant has been reached or passed.
	Expired,
}

/// Errors produced by [`LeaseBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum LeaseBuilderError {
	/// Issued when no expiry (absolute or relative) was configured.
	#[error("Expiry must be supplied via expires_at or duration_minutes.")]
	MissingExpiry,
	/// Issued when the relative duration is zero or negative.
	#[error("Lease duration must be a positive number of minutes.")]
	NonPositiveDuration,
}

/// Immutable record describing one creator-seat reservation.
///
/// Records are never updated in place; expired records are removed wholesale by the lazy
/// purge that precedes every count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
	/// Caller-supplied lease identifier (not unique).
	pub id: LeaseId,
	/// Optional display name of the seat holder.
	pub owner: Option<String>,
	/// Creation instant.
	pub start: UnixMillis,
	/// Expiry instant; the lease is active strictly before this instant.
	pub end: UnixMillis,
}
impl Lease {
	/// Returns a builder for the provided lease identifier.
	pub fn builder(id: LeaseId) -> LeaseBuilder {
		LeaseBuilder::new(id)
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: UnixMillis) -> LeaseStatus {
		if instant < self.end { LeaseStatus::Active } else { LeaseStatus::Expired }
	}

	/// Convenience helper that checks the status using the current UTC instant.
	pub fn status(&self) -> LeaseStatus {
		self.status_at(UnixMillis::now())
	}

	/// Returns `true` if the lease is active at the provided instant.
	pub fn is_active_at(&self, instant: UnixMillis) -> bool {
		matches!(self.status_at(instant), LeaseStatus::Active)
	}

	/// Returns `true` if the lease is active relative to the current clock.
	pub fn is_active(&self) -> bool {
		matches!(self.status(), LeaseStatus::Active)
	}

	/// Returns `true` if the lease has expired at the provided instant.
	pub fn is_expired_at(&self, instant: UnixMillis) -> bool {
		matches!(self.status_at(instant), LeaseStatus::Expired)
	}

	/// Returns `true` if the lease is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		matches!(self.status(), LeaseStatus::Expired)
	}
}

/// Builder for [`Lease`].
#[derive(Clone, Debug)]
pub struct LeaseBuilder {
	id: LeaseId,
	owner: Option<String>,
	start: Option<UnixMillis>,
	end: Option<UnixMillis>,
	duration_minutes: Option<i64>,
}
impl LeaseBuilder {
	fn new(id: LeaseId) -> Self {
		Self { id, owner: None, start: None, end: None, duration_minutes: None }
	}

	/// Sets the seat holder's display name.
	pub fn owner(mut self, owner: impl Into<String>) -> Self {
		self.owner = Some(owner.into());

		self
	}

	/// Sets the creation instant (defaults to the current clock).
	pub fn starts_at(mut self, instant: UnixMillis) -> Self {
		self.start = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: UnixMillis) -> Self {
		self.end = Some(instant);

		self
	}

	/// Sets a relative expiry as whole minutes from the creation instant.
	pub fn duration_minutes(mut self, minutes: i64) -> Self {
		self.duration_minutes = Some(minutes);

		self
	}

	/// Consumes the builder and produces a [`Lease`].
	pub fn build(self) -> Result<Lease, LeaseBuilderError> {
		let start = self.start.unwrap_or_else(UnixMillis::now);
		let end = match (self.end, self.duration_minutes) {
			(Some(instant), _) => instant,
			(None, Some(minutes)) if minutes > 0 => start.plus_minutes(minutes),
			(None, Some(_)) => return Err(LeaseBuilderError::NonPositiveDuration),
			(None, None) => return Err(LeaseBuilderError::MissingExpiry),
		};

		Ok(Lease { id: self.id, owner: self.owner, start, end })
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn lease_id(value: &str) -> LeaseId {
		LeaseId::new(value).expect("Lease identifier fixture should be valid.")
	}

	#[test]
	fn relative_expiry_is_exact_integer_arithmetic() {
		let start = UnixMillis::from_raw(1_709_290_800_123);
		let lease = Lease::builder(lease_id("seat-1"))
			.starts_at(start)
			.duration_minutes(90)
			.build()
			.expect("Lease builder should support relative expiry calculations.");

		assert_eq!(lease.end.as_raw(), start.as_raw() + 90 * 60_000);
	}

	#[test]
	fn status_is_active_strictly_before_end() {
		let start = UnixMillis::from_raw(1_000);
		let lease = Lease::builder(lease_id("seat-2"))
			.starts_at(start)
			.expires_at(UnixMillis::from_raw(61_000))
			.build()
			.expect("Lease builder should accept an absolute expiry.");

		assert_eq!(lease.status_at(UnixMillis::from_raw(60_999)), LeaseStatus::Active);
		assert_eq!(lease.status_at(UnixMillis::from_raw(61_000)), LeaseStatus::Expired);
		assert_eq!(lease.status_at(UnixMillis::from_raw(61_001)), LeaseStatus::Expired);
		assert!(lease.is_active_at(UnixMillis::from_raw(1_000)));
		assert!(lease.is_expired_at(UnixMillis::from_raw(90_000)));
	}

	#[test]
	fn builder_requires_some_expiry() {
		assert_eq!(
			Lease::builder(lease_id("seat-3")).build(),
			Err(LeaseBuilderError::MissingExpiry)
		);
		assert_eq!(
			Lease::builder(lease_id("seat-3")).duration_minutes(0).build(),
			Err(LeaseBuilderError::NonPositiveDuration)
		);
		assert_eq!(
			Lease::builder(lease_id("seat-3")).duration_minutes(-5).build(),
			Err(LeaseBuilderError::NonPositiveDuration)
		);
	}

	#[test]
	fn display_matches_utc_wall_clock() {
		let instant = UnixMillis::from_datetime(macros::datetime!(2026-03-01 12:30:45 UTC));

		assert_eq!(instant.display_utc(), "2026-03-01 12:30:45");
		assert_eq!(instant.to_string(), "2026-03-01 12:30:45");
	}

	#[test]
	fn datetime_round_trip_preserves_milliseconds() {
		let instant = UnixMillis::from_raw(1_709_290_800_123);
		let round_trip = instant
			.datetime()
			.map(UnixMillis::from_datetime)
			.expect("In-range instant should convert to a datetime.");

		assert_eq!(round_trip, instant);
	}
}
