//! Reset-token data model and structural validation.
//!
//! [`ResetTokens`] is the normalized representation of one reset attempt. The enum
//! makes the "exactly one kind" rule unrepresentable to break: a standard pair can
//! never carry a token hash and vice versa. Values are constructed once by the link
//! extractor, stay immutable, and are dropped when the attempt resolves; they are
//! deliberately not serializable because they must never be persisted.

pub mod secret;
pub mod validate;

pub use secret::*;
pub use validate::*;

// self
use crate::_prelude::*;

/// Normalized recovery credentials carried by a reset link.
#[derive(Clone, PartialEq, Eq)]
pub enum ResetTokens {
	/// Access + refresh token pair used to adopt a short-lived session.
	Standard {
		/// Access token half of the pair.
		access_token: TokenSecret,
		/// Refresh token half of the pair.
		refresh_token: TokenSecret,
	},
	/// Opaque one-time verification code redeemed through the recovery endpoint.
	Hash {
		/// Backend-opaque token hash.
		token_hash: TokenSecret,
	},
}
impl ResetTokens {
	/// Builds a standard pair from raw string values.
	pub fn standard(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
		Self::Standard {
			access_token: TokenSecret::new(access_token),
			refresh_token: TokenSecret::new(refresh_token),
		}
	}

	/// Builds a hash-type value from a raw string.
	pub fn hash(token_hash: impl Into<String>) -> Self {
		Self::Hash { token_hash: TokenSecret::new(token_hash) }
	}

	/// Returns which token format this value carries.
	pub const fn kind(&self) -> TokenKind {
		match self {
			Self::Standard { .. } => TokenKind::Standard,
			Self::Hash { .. } => TokenKind::Hash,
		}
	}

	/// Returns the primary credential: the access token for standard pairs, the hash
	/// for hash-type values.
	///
	/// Downstream code that only needs "the token identifying this attempt" can stay
	/// agnostic of the format.
	pub fn access_token(&self) -> &TokenSecret {
		match self {
			Self::Standard { access_token, .. } => access_token,
			Self::Hash { token_hash } => token_hash,
		}
	}
}
impl Debug for ResetTokens {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Standard { .. } => f.write_str("ResetTokens::Standard(..)"),
			Self::Hash { .. } => f.write_str("ResetTokens::Hash(..)"),
		}
	}
}

/// Token format labels for observability and branching.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
	/// Access + refresh token pair.
	Standard,
	/// Opaque one-time token hash.
	Hash,
}
impl TokenKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			TokenKind::Standard => "standard",
			TokenKind::Hash => "hash",
		}
	}
}
impl Display for TokenKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
