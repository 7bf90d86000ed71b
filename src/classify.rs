//! Classification of raw backend failures into a closed user-facing taxonomy.
//!
//! Raw backend error text is a development-only diagnostic. Before anything
//! reaches a user, it passes through [`classify`], which keyword-matches the
//! lower-cased text (and an HTTP status hint, when one exists) into
//! [`ErrorCategory`]. Each category owns exactly one pre-written sentence, so
//! backend internals (token fragments, account identifiers, stack traces) can
//! never leak into the UI. Classification is total: anything unmatched becomes
//! [`ErrorCategory::Unknown`].

// self
use crate::_prelude::*;

/// Which backend operation produced the raw error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorContext {
	/// Session adoption from an access+refresh pair.
	Session,
	/// One-time recovery-token verification.
	Otp,
	/// The password update itself.
	Password,
}
impl ErrorContext {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ErrorContext::Session => "session",
			ErrorContext::Otp => "otp",
			ErrorContext::Password => "password",
		}
	}
}
impl Display for ErrorContext {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Closed taxonomy of operational failure categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
	/// The recovery credential has expired.
	Expired,
	/// The recovery credential is invalid or unrecognized.
	Invalid,
	/// The recovery credential was already redeemed.
	Used,
	/// Transport-level failure; worth retrying.
	Network,
	/// The backend throttled the request.
	RateLimited,
	/// The new password failed a strength requirement.
	Weak,
	/// The new password matches the current one.
	Same,
	/// The new password is below the minimum length.
	TooShort,
	/// The new password appears in common-password lists.
	Common,
	/// Anything that matched no other category.
	Unknown,
}
impl ErrorCategory {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ErrorCategory::Expired => "expired",
			ErrorCategory::Invalid => "invalid",
			ErrorCategory::Used => "used",
			ErrorCategory::Network => "network",
			ErrorCategory::RateLimited => "rate_limited",
			ErrorCategory::Weak => "weak",
			ErrorCategory::Same => "same",
			ErrorCategory::TooShort => "too_short",
			ErrorCategory::Common => "common",
			ErrorCategory::Unknown => "unknown",
		}
	}

	/// Returns the one fixed sentence shown to users for this category.
	pub const fn user_message(self) -> &'static str {
		match self {
			ErrorCategory::Expired =>
				"This reset link has expired. Please request a new password reset.",
			ErrorCategory::Invalid =>
				"This reset link is invalid. Please request a new password reset.",
			ErrorCategory::Used =>
				"This reset link has already been used. Please request a new password reset.",
			ErrorCategory::Network =>
				"A network problem interrupted the reset. Check your connection and try again.",
			ErrorCategory::RateLimited =>
				"Too many attempts. Please wait a moment and try again.",
			ErrorCategory::Weak =>
				"That password is too weak. Use a longer mix of letters, numbers, and symbols.",
			ErrorCategory::Same =>
				"Your new password must be different from your current password.",
			ErrorCategory::TooShort => "That password is too short. Use at least 8 characters.",
			ErrorCategory::Common =>
				"That password is too easy to guess. Please choose a less common one.",
			ErrorCategory::Unknown =>
				"Reset link validation failed. Please request a new password reset.",
		}
	}
}
impl Display for ErrorCategory {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Operational failure after classification.
///
/// `Display` renders only the fixed per-category sentence; the raw backend text
/// stays behind [`ClassifiedError::detail`] for development-only diagnostics.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("{}", self.category.user_message())]
pub struct ClassifiedError {
	category: ErrorCategory,
	context: ErrorContext,
	detail: String,
}
impl ClassifiedError {
	/// Builds a classified error directly from its parts.
	pub fn new(category: ErrorCategory, context: ErrorContext, detail: impl Into<String>) -> Self {
		Self { category, context, detail: detail.into() }
	}

	/// Failure used when an establish operation reports neither an error nor a
	/// resolved user identity.
	pub fn unresolved_identity(context: ErrorContext) -> Self {
		Self::new(
			ErrorCategory::Unknown,
			context,
			"establish operation resolved no user identity",
		)
	}

	/// Returns the classified category.
	pub const fn category(&self) -> ErrorCategory {
		self.category
	}

	/// Returns the backend operation that failed.
	pub const fn context(&self) -> ErrorContext {
		self.context
	}

	/// Returns the fixed sentence that is safe to show to an end user.
	pub const fn user_message(&self) -> &'static str {
		self.category.user_message()
	}

	/// Returns the raw backend text. Development-only diagnostic; never display it.
	pub fn detail(&self) -> &str {
		&self.detail
	}
}

/// Classifies a raw backend error message under the given context.
pub fn classify(context: ErrorContext, raw: &str) -> ClassifiedError {
	classify_with_status(context, raw, None)
}

/// Classifies a raw backend error message with an optional HTTP status hint.
///
/// Keyword matches on the message always win; the status only decides otherwise
/// ambiguous failures (429 throttles, 5xx/transport outages).
pub fn classify_with_status(
	context: ErrorContext,
	raw: &str,
	status: Option<u16>,
) -> ClassifiedError {
	let lowered = raw.to_lowercase();
	let category = match_keywords(context, &lowered)
		.or_else(|| match_status(status))
		.unwrap_or(ErrorCategory::Unknown);

	ClassifiedError::new(category, context, raw)
}

fn match_keywords(context: ErrorContext, lowered: &str) -> Option<ErrorCategory> {
	if context == ErrorContext::Password
		&& let Some(category) = match_password_keywords(lowered)
	{
		return Some(category);
	}

	match lowered {
		text if text.contains("rate limit") || text.contains("too many") =>
			Some(ErrorCategory::RateLimited),
		text if text.contains("expired") || text.contains("expiry") =>
			Some(ErrorCategory::Expired),
		// Transport text must be resolved before the used arm: "connection refused"
		// is a retryable outage, not a consumed link.
		text if is_network_text(text) => Some(ErrorCategory::Network),
		text if text.contains("consumed") || contains_word(text, "used") =>
			Some(ErrorCategory::Used),
		text if text.contains("invalid") || text.contains("not found") || text.contains("malformed") =>
			Some(ErrorCategory::Invalid),
		_ => None,
	}
}

fn match_password_keywords(lowered: &str) -> Option<ErrorCategory> {
	match lowered {
		text if text.contains("same") || text.contains("identical") || text.contains("different") =>
			Some(ErrorCategory::Same),
		text if text.contains("too short") || text.contains("at least") =>
			Some(ErrorCategory::TooShort),
		text if text.contains("common") || text.contains("pwned") || text.contains("breach") =>
			Some(ErrorCategory::Common),
		text if text.contains("weak") || text.contains("strength") => Some(ErrorCategory::Weak),
		_ => None,
	}
}

fn is_network_text(lowered: &str) -> bool {
	["network", "timed out", "timeout", "connection", "refused", "unreachable", "dns"]
		.iter()
		.any(|needle| lowered.contains(needle))
}

// "used" needs a word boundary; bare substring matching would catch "refused" and
// "paused".
fn contains_word(lowered: &str, needle: &str) -> bool {
	lowered.split(|c: char| !c.is_ascii_alphanumeric()).any(|word| word == needle)
}

fn match_status(status: Option<u16>) -> Option<ErrorCategory> {
	match status {
		Some(429) => Some(ErrorCategory::RateLimited),
		Some(code) if code >= 500 => Some(ErrorCategory::Network),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn session_errors_map_to_link_categories() {
		assert_eq!(
			classify(ErrorContext::Session, "session expired").category(),
			ErrorCategory::Expired
		);
		assert_eq!(
			classify(ErrorContext::Otp, "token already consumed").category(),
			ErrorCategory::Used
		);
		assert_eq!(
			classify(ErrorContext::Session, "invalid refresh token").category(),
			ErrorCategory::Invalid
		);
	}

	#[test]
	fn password_rules_only_apply_in_password_context() {
		assert_eq!(
			classify(ErrorContext::Password, "password too weak").category(),
			ErrorCategory::Weak
		);
		assert_eq!(
			classify(ErrorContext::Password, "new password must be different from the old one")
				.category(),
			ErrorCategory::Same
		);
		assert_eq!(
			classify(ErrorContext::Password, "password must be at least 8 characters")
				.category(),
			ErrorCategory::TooShort
		);
		assert_eq!(
			classify(ErrorContext::Password, "password found in breach corpus").category(),
			ErrorCategory::Common
		);
		// Outside the password context the same text falls through to Unknown.
		assert_eq!(
			classify(ErrorContext::Session, "weak signal").category(),
			ErrorCategory::Unknown
		);
	}

	#[test]
	fn network_and_throttle_hints_match() {
		assert_eq!(
			classify(ErrorContext::Session, "connection reset by peer").category(),
			ErrorCategory::Network
		);
		assert_eq!(
			classify(ErrorContext::Otp, "request timed out").category(),
			ErrorCategory::Network
		);
		assert_eq!(
			classify(ErrorContext::Password, "too many requests").category(),
			ErrorCategory::RateLimited
		);
	}

	#[test]
	fn status_hint_decides_unmatched_text() {
		assert_eq!(
			classify_with_status(ErrorContext::Session, "gateway hiccup", Some(503)).category(),
			ErrorCategory::Network
		);
		assert_eq!(
			classify_with_status(ErrorContext::Otp, "slow down", Some(429)).category(),
			ErrorCategory::RateLimited
		);
		// Message keywords win over the status hint.
		assert_eq!(
			classify_with_status(ErrorContext::Session, "session expired", Some(503)).category(),
			ErrorCategory::Expired
		);
	}

	#[test]
	fn transport_failures_are_never_mistaken_for_consumed_links() {
		// Raw proxy/transport bodies routinely contain "refused"/"paused"; those must
		// stay retryable instead of landing in the terminal used-link category.
		assert_eq!(
			classify(ErrorContext::Session, "connection refused by upstream").category(),
			ErrorCategory::Network
		);
		assert_eq!(
			classify(ErrorContext::Otp, "upstream refused the request").category(),
			ErrorCategory::Network
		);
		assert_eq!(
			classify(ErrorContext::Session, "request paused by proxy").category(),
			ErrorCategory::Unknown
		);
		// Genuinely consumed links still classify as used.
		assert_eq!(
			classify(ErrorContext::Otp, "recovery token already used").category(),
			ErrorCategory::Used
		);
		assert_eq!(
			classify(ErrorContext::Otp, "token already consumed").category(),
			ErrorCategory::Used
		);
	}

	#[test]
	fn classification_is_total() {
		let classified = classify(ErrorContext::Session, "entirely novel failure text");

		assert_eq!(classified.category(), ErrorCategory::Unknown);
	}

	#[test]
	fn display_never_echoes_raw_text() {
		let classified = classify(ErrorContext::Session, "auth token for session xyz rejected");

		assert_eq!(classified.to_string(), classified.user_message());
		assert!(!classified.to_string().contains("auth"));
		assert_eq!(classified.detail(), "auth token for session xyz rejected");
	}
}
