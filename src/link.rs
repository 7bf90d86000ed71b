//! Reset-link parameter extraction.
//!
//! A reset link arrives as a URL carrying recovery credentials in its query string,
//! its fragment, or both (providers differ on where they place them). [`ResetLink`]
//! normalizes both locations into one view and [`ResetLink::extract`] applies the
//! precedence rules to produce [`ResetTokens`]. Everything in this module is a pure
//! function over the URL: no I/O, no backend calls, fully deterministic.

// crates.io
use url::form_urlencoded;
// self
use crate::{_prelude::*, token::ResetTokens};

const ACCESS_TOKEN: &str = "access_token";
const REFRESH_TOKEN: &str = "refresh_token";
const TOKEN_HASH: &str = "token_hash";
const ERROR: &str = "error";
const ERROR_CODE: &str = "error_code";
const ERROR_DESCRIPTION: &str = "error_description";

/// Parsed view of a reset link's query and fragment parameters.
#[derive(Clone, Default)]
pub struct ResetLink {
	query: Vec<(String, String)>,
	fragment: Vec<(String, String)>,
}
impl ResetLink {
	/// Parses an already-validated [`Url`], reading the fragment as its own query
	/// string.
	pub fn parse(url: &Url) -> Self {
		let query = url.query_pairs().into_owned().collect();
		let fragment = url
			.fragment()
			.map(|raw| form_urlencoded::parse(raw.as_bytes()).into_owned().collect())
			.unwrap_or_default();

		Self { query, fragment }
	}

	/// Parses a raw URL string, surfacing unparseable input as a malformed-link
	/// failure.
	pub fn parse_str(raw: &str) -> Result<Self, crate::token::ValidationError> {
		let url = Url::parse(raw).map_err(crate::token::ValidationError::MalformedUrl)?;

		Ok(Self::parse(&url))
	}

	/// Builds a link view from separately-obtained query pairs and an optional raw
	/// fragment string.
	pub fn from_parts<I, K, V>(query: I, fragment: Option<&str>) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		let query = query.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
		let fragment = fragment
			.map(|raw| form_urlencoded::parse(raw.as_bytes()).into_owned().collect())
			.unwrap_or_default();

		Self { query, fragment }
	}

	/// Normalizes the link into [`ResetTokens`], or `None` when no usable
	/// credentials are present.
	///
	/// Query parameters take precedence; the fragment only fills gaps. An
	/// access+refresh pair wins over a token hash so the two formats never mix.
	pub fn extract(&self) -> Option<ResetTokens> {
		let access = self.param(ACCESS_TOKEN);
		let refresh = self.param(REFRESH_TOKEN);
		let hash = self.param(TOKEN_HASH);

		if let (Some(access), Some(refresh)) = (access, refresh) {
			return Some(ResetTokens::standard(access, refresh));
		}
		if let Some(hash) = hash {
			return Some(ResetTokens::hash(hash));
		}

		None
	}

	/// Reads an explicit provider-issued rejection from the redirect parameters.
	///
	/// Providers that refuse to honor a link redirect back with `error`,
	/// `error_code`, and `error_description` instead of credentials.
	pub fn provider_rejection(&self) -> Option<ProviderRejection> {
		let code = self.param(ERROR)?.to_owned();
		let error_code = self.param(ERROR_CODE).map(str::to_owned);
		let description = self.param(ERROR_DESCRIPTION).map(str::to_owned);

		Some(ProviderRejection { code, error_code, description })
	}

	// Empty values count as absent so the fragment can fill the gap.
	fn param(&self, key: &str) -> Option<&str> {
		self.query
			.iter()
			.chain(self.fragment.iter())
			.find(|(k, v)| k == key && !v.is_empty())
			.map(|(_, v)| v.as_str())
	}
}
// Parameter values can carry live credentials, never print them.
impl Debug for ResetLink {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ResetLink")
			.field("query", &format_args!("[{} parameter(s)]", self.query.len()))
			.field("fragment", &format_args!("[{} parameter(s)]", self.fragment.len()))
			.finish()
	}
}

/// Explicit provider-issued rejection carried on a reset-link redirect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderRejection {
	/// Raw `error` parameter (e.g. `access_denied`).
	pub code: String,
	/// Raw `error_code` parameter, when the provider supplies one.
	pub error_code: Option<String>,
	/// Raw `error_description` parameter.
	pub description: Option<String>,
}
impl ProviderRejection {
	/// Maps the rejection into the structural failure taxonomy.
	///
	/// A rejection whose code or description mentions expiry becomes an
	/// expired-link failure; everything else surfaces as a provider rejection with
	/// the raw code kept as an internal diagnostic.
	pub fn into_validation_error(self) -> crate::token::ValidationError {
		let expired = [Some(self.code.as_str()), self.error_code.as_deref(), self.description.as_deref()]
			.into_iter()
			.flatten()
			.any(|value| value.to_ascii_lowercase().contains("expired"));

		if expired {
			return crate::token::ValidationError::ExpiredTokens;
		}

		crate::token::ValidationError::AuthError { code: self.code }
	}
}
