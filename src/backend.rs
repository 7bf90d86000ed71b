//! Identity-backend boundary consumed by the reset flow.
//!
//! The backend that issues and redeems recovery credentials is an opaque,
//! externally-supplied service. [`IdentityBackend`] is the only seam the flow
//! knows about, and [`BackendError`] is the one normalized error shape decided at
//! this boundary: arbitrary backend error objects are flattened into a message
//! (plus optional HTTP metadata) exactly once, then consumed uniformly by the
//! classifier.

#[cfg(feature = "reqwest")] pub mod http;
#[cfg(feature = "reqwest")] pub use http::*;

// self
use crate::_prelude::*;

/// Boxed future returned by [`IdentityBackend`] operations.
pub type BackendFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, BackendError>> + 'a + Send>>;

/// Thread-safe slot holding the current-session credential between establish and
/// teardown.
///
/// Backend implementations keep exactly one of these per client. [`store`](SessionSlot::store)
/// happens when an establish operation succeeds, [`take`](SessionSlot::take) during
/// teardown, so a drained slot is the proof that no residual session credential
/// survived the attempt.
#[derive(Clone, Default)]
pub struct SessionSlot(Arc<Mutex<Option<String>>>);
impl SessionSlot {
	/// Stores the credential for the freshly-established session.
	pub fn store(&self, access_token: impl Into<String>) {
		*self.0.lock() = Some(access_token.into());
	}

	/// Returns a copy of the current-session credential, if one is active.
	pub fn current(&self) -> Option<String> {
		self.0.lock().clone()
	}

	/// Drains the slot, returning the credential that was active.
	pub fn take(&self) -> Option<String> {
		self.0.lock().take()
	}
}
impl Debug for SessionSlot {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("SessionSlot").field(&self.current().map(|_| "<redacted>")).finish()
	}
}

/// Normalized failure reported by an identity-backend operation.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("{message}")]
pub struct BackendError {
	message: String,
	status: Option<u16>,
	retry_after: Option<Duration>,
}
impl BackendError {
	/// Wraps a raw error message.
	pub fn new(message: impl Into<String>) -> Self {
		Self { message: message.into(), status: None, retry_after: None }
	}

	/// Attaches the HTTP status code that accompanied the failure.
	pub fn with_status(mut self, status: u16) -> Self {
		self.status = Some(status);

		self
	}

	/// Attaches an upstream Retry-After hint.
	pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
		self.retry_after = Some(retry_after);

		self
	}

	/// Extracts a human-readable message from a JSON error body, falling back to
	/// the raw body text.
	///
	/// Backends disagree on the field name (`error_description`, `msg`, `message`,
	/// `error`), so all of them are probed in that order.
	pub fn from_json_body(status: u16, body: &str) -> Self {
		let message = serde_json::from_str::<serde_json::Value>(body)
			.ok()
			.and_then(|value| {
				["error_description", "msg", "message", "error"].iter().find_map(|key| {
					value.get(key).and_then(serde_json::Value::as_str).map(str::to_owned)
				})
			})
			.unwrap_or_else(|| body.trim().to_owned());

		Self::new(message).with_status(status)
	}

	/// Returns the normalized raw message. Development-only diagnostic.
	pub fn message(&self) -> &str {
		&self.message
	}

	/// Returns the HTTP status code, when the failure carried one.
	pub const fn status(&self) -> Option<u16> {
		self.status
	}

	/// Returns the upstream Retry-After hint, when one was supplied.
	pub const fn retry_after(&self) -> Option<Duration> {
		self.retry_after
	}
}

/// Identity confirmed by a successful establish operation.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResolvedUser {
	/// Backend-assigned user identifier.
	pub id: String,
	/// Email the recovery credential was delivered to, when the backend returns it.
	#[serde(default)]
	pub email: Option<String>,
}

/// Decodes a [`ResolvedUser`] payload, reporting the JSON path of any mismatch.
pub fn decode_user(body: &str) -> Result<ResolvedUser, BackendError> {
	let deserializer = &mut serde_json::Deserializer::from_str(body);

	serde_path_to_error::deserialize(deserializer)
		.map_err(|err| BackendError::new(format!("malformed user payload: {err}")))
}

/// Contract for identity backends able to execute one password-recovery protocol.
///
/// All four operations are strictly sequential from the flow's point of view; an
/// implementation only needs interior mutability for whatever "current session"
/// notion it keeps between establish and teardown. Establish operations return
/// `Ok(None)` when the backend reported no error yet resolved no user identity;
/// the flow treats that as a failure in its own right.
pub trait IdentityBackend: Send + Sync {
	/// Adopts a short-lived session from a standard access+refresh pair.
	fn adopt_session<'a>(
		&'a self,
		access_token: &'a str,
		refresh_token: &'a str,
	) -> BackendFuture<'a, Option<ResolvedUser>>;

	/// Redeems a one-time recovery token hash.
	fn verify_recovery_token<'a>(
		&'a self,
		token_hash: &'a str,
	) -> BackendFuture<'a, Option<ResolvedUser>>;

	/// Sets a new password for the current session.
	fn set_password<'a>(&'a self, new_password: &'a str) -> BackendFuture<'a, ()>;

	/// Terminates the current session, discarding any residual credentials.
	fn terminate_session(&self) -> BackendFuture<'_, ()>;
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn json_body_probes_known_message_fields() {
		let err = BackendError::from_json_body(400, r#"{"error_description":"session expired"}"#);

		assert_eq!(err.message(), "session expired");
		assert_eq!(err.status(), Some(400));

		let err = BackendError::from_json_body(422, r#"{"msg":"password too weak"}"#);

		assert_eq!(err.message(), "password too weak");
	}

	#[test]
	fn non_json_body_falls_back_to_raw_text() {
		let err = BackendError::from_json_body(502, "Bad Gateway\n");

		assert_eq!(err.message(), "Bad Gateway");
		assert_eq!(err.status(), Some(502));
	}

	#[test]
	fn decode_user_reports_json_path() {
		let user = decode_user(r#"{"id":"user-1","email":"a@b.example"}"#)
			.expect("Well-formed payload should decode.");

		assert_eq!(user.id, "user-1");

		let err = decode_user(r#"{"id":42}"#).expect_err("Mistyped id must fail decoding.");

		assert!(err.message().contains("id"));
	}
}
