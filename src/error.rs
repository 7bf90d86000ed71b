//! Crate-level error types shared across link parsing, validation, and reset flows.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Reset link failed structural validation before any backend call was made.
	#[error(transparent)]
	Validation(#[from] crate::token::ValidationError),
	/// Identity backend rejected an operation; already classified for display.
	#[error(transparent)]
	Classified(#[from] crate::classify::ClassifiedError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
}
impl Error {
	/// Returns the fixed sentence that is safe to show to an end user.
	///
	/// Configuration failures have no user-facing category of their own and fall back
	/// to the unknown-category sentence.
	pub fn user_message(&self) -> &'static str {
		match self {
			Self::Validation(err) => err.user_message(),
			Self::Classified(err) => err.user_message(),
			Self::Config(_) => crate::classify::ErrorCategory::Unknown.user_message(),
		}
	}
}

/// Configuration and setup failures raised locally, never by the identity backend.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Identity backend base URL cannot be parsed.
	#[error("Identity backend base URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}
