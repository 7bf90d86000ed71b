//! Default reqwest-backed identity backend client.
//!
//! Speaks the GoTrue-style REST dialect most hosted identity providers expose:
//! `GET /user` resolves the identity behind an access token, `POST /verify`
//! redeems a one-time recovery token, `PUT /user` updates the password for the
//! current session, and `POST /logout` terminates it. The current-session bearer
//! token lives in a [`SessionSlot`] so establish and teardown stay symmetric.
//! Every transport or HTTP failure is normalized into [`BackendError`] at this
//! boundary; nothing reqwest-specific leaks upward.

// crates.io
use reqwest::{
	RequestBuilder, Response,
	header::{HeaderMap, RETRY_AFTER},
};
use time::{OffsetDateTime, format_description::well_known::Rfc2822};
// self
use crate::{
	_prelude::*,
	backend::{
		BackendError, BackendFuture, IdentityBackend, ResolvedUser, SessionSlot, decode_user,
	},
	error::ConfigError,
};

/// Reqwest-backed [`IdentityBackend`] implementation.
pub struct HttpIdentityBackend {
	client: ReqwestClient,
	api_key: Option<String>,
	user_endpoint: Url,
	verify_endpoint: Url,
	logout_endpoint: Url,
	refresh_endpoint: Url,
	session: SessionSlot,
}
impl HttpIdentityBackend {
	/// Creates a client for the provided backend base URL with a default
	/// transport.
	pub fn new(base_url: &str) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().build()?;
		let base = Url::parse(base_url).map_err(|source| ConfigError::InvalidBaseUrl { source })?;

		Self::with_client(client, base)
	}

	/// Creates a client that reuses a caller-provided [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient, base_url: Url) -> Result<Self, ConfigError> {
		let base = normalize_base(base_url).map_err(|source| ConfigError::InvalidBaseUrl { source })?;
		let join = |path: &str| {
			base.join(path).map_err(|source| ConfigError::InvalidBaseUrl { source })
		};

		Ok(Self {
			client,
			api_key: None,
			user_endpoint: join("user")?,
			verify_endpoint: join("verify")?,
			logout_endpoint: join("logout")?,
			refresh_endpoint: join("token?grant_type=refresh_token")?,
			session: SessionSlot::default(),
		})
	}

	/// Attaches the provider API key sent with every request.
	pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
		self.api_key = Some(api_key.into());

		self
	}

	fn request(&self, builder: RequestBuilder) -> RequestBuilder {
		match &self.api_key {
			Some(key) => builder.header("apikey", key),
			None => builder,
		}
	}

	async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
		let response = self.request(request).send().await.map_err(map_reqwest_error)?;
		let status = response.status();

		if status.is_success() {
			return Ok(response);
		}

		let retry_after = parse_retry_after(response.headers());
		let body = response.text().await.unwrap_or_default();
		let mut err = BackendError::from_json_body(status.as_u16(), &body);

		if let Some(hint) = retry_after {
			err = err.with_retry_after(hint);
		}

		Err(err)
	}

	async fn establish_via_refresh(
		&self,
		refresh_token: &str,
	) -> Result<Option<ResolvedUser>, BackendError> {
		let response = self
			.send(self.client.post(self.refresh_endpoint.clone()).json(&RefreshRequest {
				refresh_token,
			}))
			.await?;
		let body = response.text().await.map_err(map_reqwest_error)?;
		let payload = decode_session(&body)?;

		self.session.store(payload.access_token);

		Ok(payload.user)
	}
}
impl IdentityBackend for HttpIdentityBackend {
	fn adopt_session<'a>(
		&'a self,
		access_token: &'a str,
		refresh_token: &'a str,
	) -> BackendFuture<'a, Option<ResolvedUser>> {
		Box::pin(async move {
			let attempt =
				self.send(self.client.get(self.user_endpoint.clone()).bearer_auth(access_token));

			match attempt.await {
				Ok(response) => {
					let body = response.text().await.map_err(map_reqwest_error)?;
					let user = decode_user(&body)?;

					self.session.store(access_token);

					Ok(Some(user))
				},
				// An expired access half can still be adopted through its refresh
				// half; any other rejection stands.
				Err(err) if err.status() == Some(401) =>
					self.establish_via_refresh(refresh_token).await,
				Err(err) => Err(err),
			}
		})
	}

	fn verify_recovery_token<'a>(
		&'a self,
		token_hash: &'a str,
	) -> BackendFuture<'a, Option<ResolvedUser>> {
		Box::pin(async move {
			let response = self
				.send(self.client.post(self.verify_endpoint.clone()).json(&VerifyRequest {
					kind: "recovery",
					token_hash,
				}))
				.await?;
			let body = response.text().await.map_err(map_reqwest_error)?;
			let payload = decode_session(&body)?;

			self.session.store(payload.access_token);

			Ok(payload.user)
		})
	}

	fn set_password<'a>(&'a self, new_password: &'a str) -> BackendFuture<'a, ()> {
		Box::pin(async move {
			let Some(access_token) = self.session.current() else {
				return Err(BackendError::new("no current session"));
			};

			self.send(
				self.client
					.put(self.user_endpoint.clone())
					.bearer_auth(access_token)
					.json(&PasswordRequest { password: new_password }),
			)
			.await?;

			Ok(())
		})
	}

	fn terminate_session(&self) -> BackendFuture<'_, ()> {
		Box::pin(async move {
			// Draining the slot first guarantees no credential survives locally even
			// when the logout call itself fails.
			let Some(access_token) = self.session.take() else {
				return Ok(());
			};

			self.send(self.client.post(self.logout_endpoint.clone()).bearer_auth(access_token))
				.await?;

			Ok(())
		})
	}
}
impl Debug for HttpIdentityBackend {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HttpIdentityBackend")
			.field("user_endpoint", &self.user_endpoint)
			.field("api_key_set", &self.api_key.is_some())
			.finish_non_exhaustive()
	}
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
	#[serde(rename = "type")]
	kind: &'a str,
	token_hash: &'a str,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
	refresh_token: &'a str,
}

#[derive(Serialize)]
struct PasswordRequest<'a> {
	password: &'a str,
}

#[derive(Deserialize)]
struct SessionPayload {
	access_token: String,
	#[serde(default)]
	user: Option<ResolvedUser>,
}

fn decode_session(body: &str) -> Result<SessionPayload, BackendError> {
	let deserializer = &mut serde_json::Deserializer::from_str(body);

	serde_path_to_error::deserialize(deserializer)
		.map_err(|err| BackendError::new(format!("malformed session payload: {err}")))
}

fn normalize_base(mut base: Url) -> Result<Url, url::ParseError> {
	if base.cannot_be_a_base() {
		return Err(url::ParseError::RelativeUrlWithoutBase);
	}
	if !base.path().ends_with('/') {
		let path = format!("{}/", base.path());

		base.set_path(&path);
	}

	Ok(base)
}

fn map_reqwest_error(err: ReqwestError) -> BackendError {
	if err.is_timeout() {
		BackendError::new("request timed out")
	} else if err.is_connect() {
		BackendError::new("network connection failed")
	} else {
		BackendError::new(format!("network transport failure: {err}"))
	}
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		// The header is untrusted; a value past i64::MAX must not wrap negative.
		return i64::try_from(secs).ok().map(Duration::seconds);
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn base_url_gets_a_trailing_slash() {
		let backend = HttpIdentityBackend::new("https://id.example.com/auth/v1")
			.expect("Backend fixture should build.");

		assert_eq!(backend.user_endpoint.as_str(), "https://id.example.com/auth/v1/user");
		assert_eq!(
			backend.refresh_endpoint.as_str(),
			"https://id.example.com/auth/v1/token?grant_type=refresh_token"
		);
	}

	#[test]
	fn retry_after_parses_seconds() {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, "7".parse().expect("Header fixture should parse."));

		assert_eq!(parse_retry_after(&headers), Some(Duration::seconds(7)));
	}

	#[test]
	fn retry_after_rejects_overflowing_seconds() {
		let mut headers = HeaderMap::new();

		// u64::MAX fits the numeric parse but not Duration's signed seconds.
		headers.insert(
			RETRY_AFTER,
			"18446744073709551615".parse().expect("Header fixture should parse."),
		);

		assert_eq!(parse_retry_after(&headers), None);
	}
}
