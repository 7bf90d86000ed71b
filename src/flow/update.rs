//! The session-scoped password updater.
//!
//! [`ResetFlow::update_password`] runs the whole protocol for one reset attempt:
//! establish a minimal-lifetime session from the validated tokens, apply exactly
//! one password update inside it, then tear the session down. The progression
//! maps onto [`FlowStage`](crate::obs::FlowStage): establish → update → teardown,
//! with both failure branches still passing through teardown.
//!
//! The central security property lives here: the function never returns while a
//! session it established remains active. Reset links are single-use,
//! narrowly-scoped credentials; a residual session would be a privilege
//! escalation. Teardown therefore runs exactly once per call, on every path
//! (success, establish failure, and update failure alike), and a teardown failure
//! is logged but never overrides the primary result.

// self
use crate::{
	_prelude::*,
	backend::BackendError,
	classify::{ClassifiedError, ErrorContext, classify_with_status},
	flow::ResetFlow,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	token::ResetTokens,
};

impl ResetFlow {
	/// Performs one session-scoped password update.
	///
	/// The tokens should already have passed structural validation; this call is
	/// the first to contact the identity backend. One `ResetTokens` value supports
	/// at most one successful call; the backend consumes the recovery credential,
	/// so a second call surfaces as a used-link failure rather than succeeding.
	pub async fn update_password(
		&self,
		tokens: &ResetTokens,
		new_password: &str,
	) -> Result<(), ClassifiedError> {
		let kind = FlowKind::from(tokens.kind());
		let span = FlowSpan::new(kind, "update_password");

		obs::record_flow_outcome(kind, FlowOutcome::Attempt);
		self.update_metrics.record_attempt();

		let result = span.instrument(self.run_protocol(kind, tokens, new_password)).await;

		match &result {
			Ok(_) => {
				self.update_metrics.record_success();
				obs::record_flow_outcome(kind, FlowOutcome::Success);
			},
			Err(_) => {
				self.update_metrics.record_failure();
				obs::record_flow_outcome(kind, FlowOutcome::Failure);
			},
		}

		result
	}

	async fn run_protocol(
		&self,
		kind: FlowKind,
		tokens: &ResetTokens,
		new_password: &str,
	) -> Result<(), ClassifiedError> {
		let establish_context = match tokens {
			ResetTokens::Standard { .. } => ErrorContext::Session,
			ResetTokens::Hash { .. } => ErrorContext::Otp,
		};
		let established = match tokens {
			ResetTokens::Standard { access_token, refresh_token } =>
				self.backend.adopt_session(access_token.expose(), refresh_token.expose()).await,
			ResetTokens::Hash { token_hash } =>
				self.backend.verify_recovery_token(token_hash.expose()).await,
		};
		// The primary result is decided before teardown so teardown can never mask
		// it. Teardown still runs after a failed establish: the attempt may have
		// partially mutated backend state.
		let primary = match established {
			Err(raw) => Err(classify_backend(establish_context, &raw)),
			// No explicit error, but no resolved identity either. That is a failure
			// in its own right.
			Ok(None) => Err(ClassifiedError::unresolved_identity(establish_context)),
			Ok(Some(_user)) => match self.backend.set_password(new_password).await {
				Ok(()) => Ok(()),
				Err(raw) => Err(classify_backend(ErrorContext::Password, &raw)),
			},
		};

		if let Err(raw) = self.backend.terminate_session().await {
			obs::record_teardown_failure(kind, raw.message());
		}

		primary
	}
}

fn classify_backend(context: ErrorContext, raw: &BackendError) -> ClassifiedError {
	classify_with_status(context, raw.message(), raw.status())
}
