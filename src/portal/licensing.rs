//! Seat-capacity discovery from the portal's licensing metadata.
//!
//! Capacity is read once at startup and cached for the process lifetime; the broker
//! never refreshes it while serving.

// self
use crate::{
	_prelude::*,
	error::ConfigError,
	http::{PortalHttpClient, ResponseMetadataSlot},
	portal::{PortalDescriptor, PortalFault, PortalToken, parse_json},
};

/// User type identifier carrying creator seats in portal licensing metadata.
pub const CREATOR_USER_TYPE: &str = "creatorUT";

/// Resolves the licensed seat maximum for a configured user type.
#[derive(Clone, Debug)]
pub struct LicensingClient<C>
where
	C: ?Sized + PortalHttpClient,
{
	http_client: Arc<C>,
	endpoint: Url,
	user_type: String,
}
impl<C> LicensingClient<C>
where
	C: ?Sized + PortalHttpClient,
{
	/// Creates a licensing client from the descriptor's licensing endpoint.
	pub fn from_descriptor(
		http_client: impl Into<Arc<C>>,
		descriptor: &PortalDescriptor,
	) -> Result<Self, ConfigError> {
		let endpoint = descriptor
			.endpoints
			.licensing
			.clone()
			.ok_or(ConfigError::MissingLicensingEndpoint)?;

		Ok(Self {
			http_client: http_client.into(),
			endpoint,
			user_type: descriptor.licensed_user_type.clone(),
		})
	}

	/// Returns the seat maximum registered for the configured user type.
	pub async fn licensed_capacity(&self, token: &PortalToken) -> Result<u32, ConfigError> {
		let form = BTreeMap::from_iter([
			("token".into(), token.secret.expose().into()),
			("f".into(), "json".into()),
		]);
		let slot = ResponseMetadataSlot::default();
		let body = self
			.http_client
			.post_form(&self.endpoint, &form, slot)
			.await
			.map_err(|source| ConfigError::LicensingTransport { source })?;
		let envelope: LicensingEnvelope =
			parse_json(&body).map_err(|source| ConfigError::LicensingResponseParse { source })?;

		if let Some(fault) = envelope.error {
			return Err(ConfigError::LicensingRejected { message: fault.summary() });
		}

		let entry = envelope
			.user_types
			.into_iter()
			.flatten()
			.find(|entry| entry.id == self.user_type)
			.ok_or_else(|| ConfigError::UnknownUserType { user_type: self.user_type.clone() })?;

		entry
			.maximum_registered_members
			.ok_or_else(|| ConfigError::MissingCapacity { user_type: self.user_type.clone() })
	}
}

#[derive(Deserialize)]
struct LicensingEnvelope {
	#[serde(rename = "userTypes")]
	user_types: Option<Vec<UserTypeEntry>>,
	error: Option<PortalFault>,
}

#[derive(Deserialize)]
struct UserTypeEntry {
	id: String,
	#[serde(rename = "maximumRegisteredMembers")]
	maximum_registered_members: Option<u32>,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn licensing_envelope_reads_camel_case_fields() {
		let envelope: LicensingEnvelope = serde_json::from_str(
			"{\"userTypes\":[{\"id\":\"creatorUT\",\"maximumRegisteredMembers\":12},{\"id\":\"viewerUT\"}]}",
		)
		.expect("Licensing envelope fixture should deserialize.");
		let user_types = envelope.user_types.expect("User types should be present.");

		assert_eq!(user_types.len(), 2);
		assert_eq!(user_types[0].id, "creatorUT");
		assert_eq!(user_types[0].maximum_registered_members, Some(12));
		assert_eq!(user_types[1].maximum_registered_members, None);
	}
}
