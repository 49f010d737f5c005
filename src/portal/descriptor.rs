//! Portal descriptor data structures and validation shared by all flows.
//!
//! A descriptor is the broker's immutable startup configuration: every endpoint and
//! duration is read once, validated once, and then shared by reference for the process
//! lifetime.

// self
use crate::{_prelude::*, lease::PortalId, portal::licensing::CREATOR_USER_TYPE};

/// Endpoint set declared by a portal descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalEndpoints {
	/// Token endpoint used for credential exchanges.
	pub token: Url,
	/// Lease table endpoint (feature-service table layer).
	pub table: Url,
	/// Optional licensing endpoint used for capacity discovery at startup.
	pub licensing: Option<Url>,
}

/// Immutable portal descriptor consumed by the broker and its adapters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalDescriptor {
	/// Descriptor identifier.
	pub id: PortalId,
	/// Endpoint definitions exposed by the portal.
	pub endpoints: PortalEndpoints,
	/// Lifetime of every granted lease, in whole minutes.
	pub lease_duration: Duration,
	/// Requested lifetime for portal access tokens, in whole minutes.
	pub token_ttl: Duration,
	/// Licensed user type whose seat maximum bounds admission.
	pub licensed_user_type: String,
}
impl PortalDescriptor {
	/// Creates a new builder for the provided identifier.
	pub fn builder(id: PortalId) -> PortalDescriptorBuilder {
		PortalDescriptorBuilder::new(id)
	}

	/// Lease lifetime as whole minutes.
	pub fn lease_minutes(&self) -> i64 {
		self.lease_duration.whole_minutes()
	}

	/// Validates invariants for the descriptor.
	fn validate(&self) -> Result<(), PortalDescriptorError> {
		validate_endpoint("token", &self.endpoints.token)?;
		validate_endpoint("table", &self.endpoints.table)?;

		if let Some(licensing) = self.endpoints.licensing.as_ref() {
			validate_endpoint("licensing", licensing)?;
		}

		validate_duration("lease_duration", self.lease_duration)?;
		validate_duration("token_ttl", self.token_ttl)?;

		Ok(())
	}
}

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum PortalDescriptorError {
	/// Token endpoint is mandatory for every flow.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// Lease table endpoint is mandatory for every flow.
	#[error("Missing lease table endpoint.")]
	MissingTableEndpoint,
	/// Endpoints must use HTTPS.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Durations must be strictly positive.
	#[error("The {what} duration must be positive.")]
	NonPositiveDuration {
		/// Which duration failed validation.
		what: &'static str,
	},
	/// The portal expresses lifetimes in whole minutes.
	#[error("The {what} duration must be a whole number of minutes.")]
	SubMinuteDuration {
		/// Which duration failed validation.
		what: &'static str,
	},
}

/// Builder for [`PortalDescriptor`] values.
#[derive(Debug)]
pub struct PortalDescriptorBuilder {
	/// Identifier for the descriptor being constructed.
	pub id: PortalId,
	/// Token endpoint used for credential exchanges.
	pub token_endpoint: Option<Url>,
	/// Lease table endpoint.
	pub table_endpoint: Option<Url>,
	/// Optional licensing endpoint.
	pub licensing_endpoint: Option<Url>,
	/// Lease lifetime (defaults to 60 minutes).
	pub lease_duration: Duration,
	/// Token lifetime (defaults to 60 minutes).
	pub token_ttl: Duration,
	/// Licensed user type identifier (defaults to the creator user type).
	pub licensed_user_type: String,
}
impl PortalDescriptorBuilder {
	const DEFAULT_LEASE_DURATION: Duration = Duration::minutes(60);
	const DEFAULT_TOKEN_TTL: Duration = Duration::minutes(60);

	/// Creates a new builder seeded with the provided identifier.
	pub fn new(id: PortalId) -> Self {
		Self {
			id,
			token_endpoint: None,
			table_endpoint: None,
			licensing_endpoint: None,
			lease_duration: Self::DEFAULT_LEASE_DURATION,
			token_ttl: Self::DEFAULT_TOKEN_TTL,
			licensed_user_type: CREATOR_USER_TYPE.into(),
		}
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the lease table endpoint.
	pub fn table_endpoint(mut self, url: Url) -> Self {
		self.table_endpoint = Some(url);

		self
	}

	/// Sets the optional licensing endpoint.
	pub fn licensing_endpoint(mut self, url: Url) -> Self {
		self.licensing_endpoint = Some(url);

		self
	}

	/// Overrides the lease lifetime.
	pub fn lease_duration(mut self, duration: Duration) -> Self {
		self.lease_duration = duration;

		self
	}

	/// Overrides the requested token lifetime.
	pub fn token_ttl(mut self, ttl: Duration) -> Self {
		self.token_ttl = ttl;

		self
	}

	/// Overrides the licensed user type consulted during capacity discovery.
	pub fn licensed_user_type(mut self, user_type: impl Into<String>) -> Self {
		self.licensed_user_type = user_type.into();

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<PortalDescriptor, PortalDescriptorError> {
		let token = self.token_endpoint.ok_or(PortalDescriptorError::MissingTokenEndpoint)?;
		let table = self.table_endpoint.ok_or(PortalDescriptorError::MissingTableEndpoint)?;
		let endpoints = PortalEndpoints { token, table, licensing: self.licensing_endpoint };
		let descriptor = PortalDescriptor {
			id: self.id,
			endpoints,
			lease_duration: self.lease_duration,
			token_ttl: self.token_ttl,
			licensed_user_type: self.licensed_user_type,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), PortalDescriptorError> {
	if url.scheme() != "https" {
		Err(PortalDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	} else {
		Ok(())
	}
}

fn validate_duration(what: &'static str, duration: Duration) -> Result<(), PortalDescriptorError> {
	if !duration.is_positive() {
		return Err(PortalDescriptorError::NonPositiveDuration { what });
	}
	if duration.whole_seconds() % 60 != 0 || duration.subsec_nanoseconds() != 0 {
		return Err(PortalDescriptorError::SubMinuteDuration { what });
	}

	Ok(())
}
