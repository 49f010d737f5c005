//! Credential-to-token exchange against the portal token endpoint.

// self
use crate::{
	_prelude::*,
	error::TransportError,
	http::{PortalHttpClient, ResponseMetadataSlot},
	lease::UnixMillis,
	portal::{PortalCredentials, PortalDescriptor, PortalFault, parse_json},
};

/// Fixed referer marker the portal expects on credential exchanges.
pub(crate) const REFERER_MARKER: &str = ".";

/// Redacted secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner secret value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Short-lived access token minted by the portal.
#[derive(Clone, Debug)]
pub struct PortalToken {
	/// Token secret attached to subsequent portal requests.
	pub secret: TokenSecret,
	/// Expiry instant reported by the portal, when present.
	pub expires_at: Option<UnixMillis>,
}

/// Failures raised while exchanging credentials for a token.
#[derive(Debug, ThisError)]
pub enum AuthError {
	/// Portal rejected the exchange with an explicit fault.
	#[error("Portal rejected the credential exchange: {message}.")]
	Rejected {
		/// Portal-supplied reason string.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Response parsed but carried no token field.
	#[error("Token endpoint response is missing the token field.")]
	MissingToken,
	/// Token endpoint responded with malformed JSON.
	#[error("Token endpoint returned malformed JSON.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Transport failure (network, timeout, IO) while calling the token endpoint.
	#[error("Transport failure while calling the token endpoint.")]
	Transport {
		/// Underlying transport failure.
		#[source]
		source: TransportError,
	},
}

/// Exchanges long-lived portal credentials for short-lived access tokens.
///
/// Every lease-store operation acquires a fresh token; the client holds no token cache,
/// matching the table's role as the single source of truth for all shared state.
#[derive(Clone, Debug)]
pub struct TokenClient<C>
where
	C: ?Sized + PortalHttpClient,
{
	http_client: Arc<C>,
	endpoint: Url,
	ttl: Duration,
	credentials: PortalCredentials,
}
impl<C> TokenClient<C>
where
	C: ?Sized + PortalHttpClient,
{
	/// Creates a token client for the descriptor's token endpoint.
	pub fn new(
		http_client: impl Into<Arc<C>>,
		descriptor: &PortalDescriptor,
		credentials: PortalCredentials,
	) -> Self {
		Self {
			http_client: http_client.into(),
			endpoint: descriptor.endpoints.token.clone(),
			ttl: descriptor.token_ttl,
			credentials,
		}
	}

	/// Performs the credential exchange and returns the minted token.
	pub async fn acquire_token(&self) -> Result<PortalToken, AuthError> {
		let form = BTreeMap::from_iter([
			("username".into(), self.credentials.username.clone()),
			("password".into(), self.credentials.password.expose().into()),
			("referer".into(), REFERER_MARKER.into()),
			("expiration".into(), self.ttl.whole_minutes().to_string()),
			("f".into(), "json".into()),
		]);
		let slot = ResponseMetadataSlot::default();
		let body = self
			.http_client
			.post_form(&self.endpoint, &form, slot.clone())
			.await
			.map_err(|source| AuthError::Transport { source })?;
		let status = slot.status();
		let envelope: TokenEnvelope =
			parse_json(&body).map_err(|source| AuthError::ResponseParse { source, status })?;

		if let Some(fault) = envelope.error {
			return Err(AuthError::Rejected { message: fault.summary(), status });
		}

		let secret = envelope.token.ok_or(AuthError::MissingToken)?;

		Ok(PortalToken {
			secret: TokenSecret::new(secret),
			expires_at: envelope.expires.map(UnixMillis::from_raw),
		})
	}
}

#[derive(Deserialize)]
struct TokenEnvelope {
	token: Option<String>,
	expires: Option<i64>,
	error: Option<PortalFault>,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = TokenSecret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
	}

	#[test]
	fn token_envelope_accepts_fault_bodies() {
		let envelope: TokenEnvelope = serde_json::from_str(
			"{\"error\":{\"code\":400,\"message\":\"Unable to generate token.\",\"details\":[]}}",
		)
		.expect("Fault envelope fixture should deserialize.");

		assert!(envelope.token.is_none());
		assert!(envelope.error.is_some());

		let minted: TokenEnvelope =
			serde_json::from_str("{\"token\":\"abc\",\"expires\":1700000000000}")
				.expect("Minted envelope fixture should deserialize.");

		assert_eq!(minted.token.as_deref(), Some("abc"));
		assert_eq!(minted.expires, Some(1_700_000_000_000));
	}
}
