//! Presentation-facing sequencing for one reset attempt.
//!
//! [`ResetAttempt`] is the thin controller between a reset view and the flow:
//! extraction and structural validation happen up front with zero backend calls,
//! the password prompt is only offered for structurally valid links, and
//! submissions are strictly serialized: while one is in flight a second
//! [`submit`](ResetAttempt::submit) reports [`AttemptPhase::InFlight`] instead of
//! racing the one-time credential. After a failure, exactly one more submission
//! is permitted; nothing auto-retries.

// self
use crate::{
	_prelude::*,
	classify::ErrorCategory,
	flow::ResetFlow,
	link::ResetLink,
	token::{ResetTokens, ValidationError},
};

/// Observable state of a reset attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttemptPhase {
	/// Link is structurally valid; the password prompt may be shown.
	PromptReady,
	/// A submission is currently in flight; further submissions are refused.
	InFlight,
	/// Password updated. The presentation layer should redirect after the delay
	/// (and owns cancelling that timer on unmount).
	Succeeded {
		/// Fixed delay before the post-success redirect.
		redirect_after: Duration,
	},
	/// The attempt failed. Terminal failures accept no further submissions.
	Failed {
		/// Fixed sentence safe to display.
		message: &'static str,
		/// Whether another submission is permitted.
		terminal: bool,
	},
}

struct AttemptInner {
	tokens: Option<ResetTokens>,
	phase: AttemptPhase,
	retries_left: u8,
}

/// One self-contained reset attempt, from link to outcome.
///
/// Each attempt owns its tokens exclusively and discards them once the attempt
/// resolves; nothing is cached or persisted across attempts.
pub struct ResetAttempt {
	flow: ResetFlow,
	inner: AsyncMutex<AttemptInner>,
}
impl ResetAttempt {
	/// Fixed delay surfaced with [`AttemptPhase::Succeeded`].
	pub const REDIRECT_DELAY: Duration = Duration::seconds(3);
	/// Additional submissions permitted after a non-terminal failure.
	const RETRY_BUDGET: u8 = 1;

	/// Sequences extraction and structural validation for a freshly-opened link.
	///
	/// Runs entirely client-side: a rejected, credential-less, or malformed link
	/// lands in a terminal failure phase without a single backend call.
	pub fn begin(flow: ResetFlow, link: &ResetLink) -> Self {
		let (phase, tokens) = if let Some(rejection) = link.provider_rejection() {
			(terminal_failure(rejection.into_validation_error()), None)
		} else {
			match link.extract() {
				None => (terminal_failure(ValidationError::MissingTokens), None),
				Some(tokens) => match tokens.validate() {
					Err(err) => (terminal_failure(err), None),
					Ok(()) => (AttemptPhase::PromptReady, Some(tokens)),
				},
			}
		};

		Self {
			flow,
			inner: AsyncMutex::new(AttemptInner {
				tokens,
				phase,
				retries_left: Self::RETRY_BUDGET,
			}),
		}
	}

	/// Convenience wrapper over [`ResetAttempt::begin`] for a raw URL string.
	pub fn begin_with_url(flow: ResetFlow, raw_url: &str) -> Self {
		match ResetLink::parse_str(raw_url) {
			Ok(link) => Self::begin(flow, &link),
			Err(err) => Self {
				flow,
				inner: AsyncMutex::new(AttemptInner {
					tokens: None,
					phase: terminal_failure(err),
					retries_left: 0,
				}),
			},
		}
	}

	/// Returns the currently observable phase.
	pub fn phase(&self) -> AttemptPhase {
		// The held submission lock is the in-flight marker.
		match self.inner.try_lock() {
			Some(inner) => inner.phase.clone(),
			None => AttemptPhase::InFlight,
		}
	}

	/// Submits a new password for the validated tokens.
	///
	/// Refused (reporting the current phase) unless the attempt is awaiting a
	/// submission. On success the tokens are dropped immediately; a terminal
	/// used/expired classification drops them too, honoring their single-use
	/// contract.
	pub async fn submit(&self, new_password: &str) -> AttemptPhase {
		let Some(mut inner) = self.inner.try_lock() else {
			return AttemptPhase::InFlight;
		};

		match &inner.phase {
			AttemptPhase::PromptReady | AttemptPhase::Failed { terminal: false, .. } => {},
			other => return other.clone(),
		}

		let Some(tokens) = inner.tokens.clone() else {
			return inner.phase.clone();
		};

		match self.flow.update_password(&tokens, new_password).await {
			Ok(()) => {
				inner.tokens = None;
				inner.phase = AttemptPhase::Succeeded { redirect_after: Self::REDIRECT_DELAY };
			},
			Err(err) => {
				let consumed =
					matches!(err.category(), ErrorCategory::Used | ErrorCategory::Expired);
				let terminal = consumed || inner.retries_left == 0;

				if consumed {
					inner.tokens = None;
				}
				if !terminal {
					inner.retries_left -= 1;
				}

				inner.phase = AttemptPhase::Failed { message: err.user_message(), terminal };
			},
		}

		inner.phase.clone()
	}
}
impl Debug for ResetAttempt {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ResetAttempt").field("phase", &self.phase()).finish_non_exhaustive()
	}
}

fn terminal_failure(err: ValidationError) -> AttemptPhase {
	AttemptPhase::Failed { message: err.user_message(), terminal: true }
}
