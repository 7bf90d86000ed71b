//! Structural reset-token validation.
//!
//! Everything here is resolved client-side: the checks reject trivially short or
//! malformed credentials before any backend round-trip, and the module has no
//! handle to an identity backend, so "checking" a link can never establish a
//! session. Structural validity never implies server-side validity.

// self
use crate::{_prelude::*, token::ResetTokens};

/// Minimum character count accepted for any token field.
pub const MIN_TOKEN_CHARS: usize = 10;
/// Segment count required of standard (dot-delimited) tokens.
pub const STANDARD_SEGMENTS: usize = 3;

/// Closed taxonomy of structural (pre-flight) failure categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StructuralCategory {
	/// The link carried no recognizable recovery credentials.
	MissingTokens,
	/// Credentials were present but failed the length or shape checks.
	InvalidTokens,
	/// The provider explicitly flagged the link as expired.
	ExpiredTokens,
	/// The link URL itself could not be parsed.
	MalformedUrl,
	/// The provider explicitly rejected the link via redirect error parameters.
	AuthError,
}
impl StructuralCategory {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			StructuralCategory::MissingTokens => "missing_tokens",
			StructuralCategory::InvalidTokens => "invalid_tokens",
			StructuralCategory::ExpiredTokens => "expired_tokens",
			StructuralCategory::MalformedUrl => "malformed_url",
			StructuralCategory::AuthError => "auth_error",
		}
	}
}
impl Display for StructuralCategory {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Structural validation failure.
///
/// `Display` renders the internal diagnostic used for development-only logs;
/// [`ValidationError::user_message`] returns the fixed sentence that may be shown
/// to a user. Neither ever echoes token material.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ValidationError {
	/// No recovery credentials were found on the link.
	#[error("Reset link carries no recovery credentials.")]
	MissingTokens,
	/// Credentials failed the length or segment-shape checks.
	#[error("Reset link credentials failed structural checks: {detail}.")]
	InvalidTokens {
		/// Which check failed, phrased without the offending value.
		detail: &'static str,
	},
	/// Provider-issued rejection indicating the link already expired.
	#[error("Provider flagged the reset link as expired.")]
	ExpiredTokens,
	/// The reset link URL could not be parsed at all.
	#[error("Reset link URL could not be parsed.")]
	MalformedUrl(#[source] url::ParseError),
	/// Provider-issued rejection carried on the redirect.
	#[error("Provider rejected the reset link: {code}.")]
	AuthError {
		/// Raw provider error code (diagnostic only).
		code: String,
	},
}
impl ValidationError {
	/// Returns the structural category for this failure.
	pub const fn category(&self) -> StructuralCategory {
		match self {
			Self::MissingTokens => StructuralCategory::MissingTokens,
			Self::InvalidTokens { .. } => StructuralCategory::InvalidTokens,
			Self::ExpiredTokens => StructuralCategory::ExpiredTokens,
			Self::MalformedUrl(_) => StructuralCategory::MalformedUrl,
			Self::AuthError { .. } => StructuralCategory::AuthError,
		}
	}

	/// Returns the fixed sentence that is safe to show to an end user.
	pub const fn user_message(&self) -> &'static str {
		match self.category() {
			StructuralCategory::MissingTokens =>
				"This reset link is incomplete. Please request a new password reset.",
			StructuralCategory::InvalidTokens =>
				"This reset link is invalid. Please request a new password reset.",
			StructuralCategory::ExpiredTokens =>
				"This reset link has expired. Please request a new password reset.",
			StructuralCategory::MalformedUrl =>
				"This reset link could not be read. Please request a new password reset.",
			StructuralCategory::AuthError =>
				"This reset link was rejected. Please request a new password reset.",
		}
	}
}

impl ResetTokens {
	/// Checks syntactic validity without contacting the identity backend.
	///
	/// Standard pairs must pass both the minimum-length check and a three-segment
	/// dot-delimited shape check per field; hash-type values are backend-opaque and
	/// only get the length check.
	pub fn validate(&self) -> Result<(), ValidationError> {
		match self {
			Self::Standard { access_token, refresh_token } => {
				check_length(access_token.char_count(), "access half shorter than minimum")?;
				check_length(refresh_token.char_count(), "refresh half shorter than minimum")?;
				check_segments(access_token.expose(), "access half is not three dot segments")?;
				check_segments(refresh_token.expose(), "refresh half is not three dot segments")?;

				Ok(())
			},
			Self::Hash { token_hash } =>
				check_length(token_hash.char_count(), "hash shorter than minimum"),
		}
	}
}

fn check_length(count: usize, detail: &'static str) -> Result<(), ValidationError> {
	if count < MIN_TOKEN_CHARS {
		return Err(ValidationError::InvalidTokens { detail });
	}

	Ok(())
}

fn check_segments(value: &str, detail: &'static str) -> Result<(), ValidationError> {
	let mut segments = 0_usize;

	for segment in value.split('.') {
		if segment.is_empty() {
			return Err(ValidationError::InvalidTokens { detail });
		}

		segments += 1;
	}
	if segments != STANDARD_SEGMENTS {
		return Err(ValidationError::InvalidTokens { detail });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn well_formed(prefix: &str) -> String {
		format!("{prefix}-header.{prefix}-payload.{prefix}-signature")
	}

	#[test]
	fn standard_pair_with_segments_passes() {
		let tokens = ResetTokens::standard(well_formed("access"), well_formed("refresh"));

		assert_eq!(tokens.validate(), Ok(()));
	}

	#[test]
	fn short_tokens_are_rejected_before_shape_checks() {
		let tokens = ResetTokens::standard("short", "token");
		let err = tokens.validate().expect_err("Short tokens must fail validation.");

		assert_eq!(err.category(), StructuralCategory::InvalidTokens);
	}

	#[test]
	fn standard_tokens_require_three_nonempty_segments() {
		let two_segments = ResetTokens::standard("header.payload-only", well_formed("refresh"));
		let empty_segment = ResetTokens::standard("header..signature-x", well_formed("refresh"));

		assert!(two_segments.validate().is_err());
		assert!(empty_segment.validate().is_err());
	}

	#[test]
	fn hash_tokens_skip_the_segment_check() {
		let hash = ResetTokens::hash("opaque-hash-without-dots");

		assert_eq!(hash.validate(), Ok(()));
		assert!(ResetTokens::hash("tiny").validate().is_err());
	}

	#[test]
	fn diagnostics_never_echo_token_values() {
		let tokens = ResetTokens::standard("secret-access-value", well_formed("refresh"));
		let err = tokens.validate().expect_err("Malformed access half must fail validation.");

		assert!(!err.to_string().contains("secret-access-value"));
		assert!(!err.user_message().contains("secret-access-value"));
	}
}
