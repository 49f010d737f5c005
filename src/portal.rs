//! Portal-side protocol: descriptors, credential exchange, and licensing lookups.

pub mod descriptor;
pub mod licensing;
pub mod token;

pub use descriptor::*;
pub use licensing::*;
pub use token::*;

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::_prelude::*;

/// Username/password pair used for every portal credential exchange.
///
/// The password is wrapped in [`TokenSecret`] so accidental `Debug`/`Display` output
/// never leaks it.
#[derive(Clone, Debug)]
pub struct PortalCredentials {
	/// Portal account name.
	pub username: String,
	/// Portal account password; callers must avoid logging it.
	pub password: TokenSecret,
}
impl PortalCredentials {
	/// Creates a credentials pair.
	pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
		Self { username: username.into(), password: TokenSecret::new(password) }
	}
}

/// Error object embedded in portal response bodies.
///
/// The portal dialect reports most faults inside an HTTP `200` body; every response
/// envelope carries an optional [`PortalFault`] that adapters check before reading the
/// payload fields.
#[derive(Clone, Debug, Deserialize)]
pub struct PortalFault {
	/// Portal-assigned fault code.
	pub code: Option<i64>,
	/// Human-readable fault message.
	pub message: Option<String>,
	/// Additional fault detail lines.
	#[serde(default)]
	pub details: Vec<String>,
}
impl PortalFault {
	/// Renders the fault as a single reportable line.
	pub fn summary(&self) -> String {
		let detail = self
			.message
			.clone()
			.or_else(|| self.details.first().cloned())
			.unwrap_or_else(|| "no detail supplied".into());

		match self.code {
			Some(code) => format!("code {code}: {detail}"),
			None => detail,
		}
	}
}

/// Deserializes a portal response body while tracking the path of any failure.
pub(crate) fn parse_json<T>(
	bytes: &[u8],
) -> Result<T, serde_path_to_error::Error<serde_json::Error>>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(bytes);

	serde_path_to_error::deserialize(&mut deserializer)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn fault_summary_prefers_message_over_details() {
		let fault: PortalFault = serde_json::from_str(
			"{\"code\":498,\"message\":\"Invalid token.\",\"details\":[\"expired\"]}",
		)
		.expect("Portal fault fixture should deserialize.");

		assert_eq!(fault.summary(), "code 498: Invalid token.");

		let details_only: PortalFault =
			serde_json::from_str("{\"details\":[\"Unable to add feature.\"]}")
				.expect("Detail-only fault fixture should deserialize.");

		assert_eq!(details_only.summary(), "Unable to add feature.");

		let empty: PortalFault =
			serde_json::from_str("{}").expect("Empty fault fixture should deserialize.");

		assert_eq!(empty.summary(), "no detail supplied");
	}

	#[test]
	fn credentials_debug_redacts_password() {
		let credentials = PortalCredentials::new("gis-operator", "hunter2");
		let rendered = format!("{credentials:?}");

		assert!(rendered.contains("gis-operator"));
		assert!(!rendered.contains("hunter2"));
	}
}
