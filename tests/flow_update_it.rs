// self
use recovery_broker::{
	_preludet::*,
	classify::{ErrorCategory, ErrorContext},
	token::ResetTokens,
};

fn standard_tokens() -> ResetTokens {
	ResetTokens::standard("valid-access.token.12345", "valid-refresh.token.12345")
}

fn hash_tokens() -> ResetTokens {
	ResetTokens::hash("valid-token-hash-12345")
}

fn terminate_count(calls: &[BackendCall]) -> usize {
	calls.iter().filter(|call| matches!(call, BackendCall::TerminateSession)).count()
}

#[tokio::test]
async fn standard_flow_runs_adopt_update_teardown_in_order() {
	let (flow, backend) = scripted_flow(ScriptedBackend::succeeding());
	let tokens = standard_tokens();

	tokens.validate().expect("Well-formed fixture tokens should validate.");
	flow.update_password(&tokens, "brand-new-password")
		.await
		.expect("Scripted happy path should succeed.");

	assert_eq!(
		backend.calls(),
		vec![BackendCall::AdoptSession, BackendCall::SetPassword, BackendCall::TerminateSession]
	);
	assert!(!backend.session_active(), "No session may survive a completed attempt.");
}

#[tokio::test]
async fn hash_flow_verifies_then_updates_then_tears_down() {
	let (flow, backend) = scripted_flow(ScriptedBackend::succeeding());

	flow.update_password(&hash_tokens(), "brand-new-password")
		.await
		.expect("Scripted hash flow should succeed.");

	assert_eq!(
		backend.calls(),
		vec![
			BackendCall::VerifyRecoveryToken,
			BackendCall::SetPassword,
			BackendCall::TerminateSession,
		]
	);
}

#[tokio::test]
async fn structural_validation_makes_zero_backend_calls() {
	let (_flow, backend) = scripted_flow(ScriptedBackend::succeeding());
	let invalid = ResetTokens::standard("short", "token");

	standard_tokens().validate().expect("Valid fixture should pass.");
	invalid.validate().expect_err("Short fixture should fail.");

	assert!(backend.calls().is_empty(), "Validation must never contact the backend.");
}

#[tokio::test]
async fn teardown_runs_exactly_once_on_every_path() {
	// {establish ok/fail} x {update ok/fail}; the update leg only exists when
	// establish succeeded.
	let cases = [
		ScriptedBackend::succeeding(),
		ScriptedBackend::succeeding().with_adopt_error("session expired"),
		ScriptedBackend::succeeding().with_password_error("password too weak"),
		ScriptedBackend::succeeding()
			.with_password_error("password too weak")
			.with_terminate_error("logout failed"),
	];

	for case in cases {
		let (flow, backend) = scripted_flow(case);
		let _ = flow.update_password(&standard_tokens(), "brand-new-password").await;
		let calls = backend.calls();

		assert_eq!(terminate_count(&calls), 1, "Teardown must run exactly once: {calls:?}.");
		assert_eq!(
			calls.last(),
			Some(&BackendCall::TerminateSession),
			"Teardown must run strictly after the establish/update attempt: {calls:?}."
		);
	}
}

#[tokio::test]
async fn establish_failure_still_tears_down_and_classifies() {
	let (flow, backend) = scripted_flow(ScriptedBackend::succeeding().with_adopt_error("session expired"));
	let err = flow
		.update_password(&standard_tokens(), "brand-new-password")
		.await
		.expect_err("Scripted establish failure must surface.");

	assert_eq!(err.category(), ErrorCategory::Expired);
	assert_eq!(err.context(), ErrorContext::Session);
	assert_eq!(err.user_message(), "This reset link has expired. Please request a new password reset.");
	assert_ne!(err.user_message(), "session expired");
	assert_eq!(backend.calls(), vec![BackendCall::AdoptSession, BackendCall::TerminateSession]);
}

#[tokio::test]
async fn update_failure_tears_down_after_the_failed_update() {
	let (flow, backend) =
		scripted_flow(ScriptedBackend::succeeding().with_password_error("password too weak"));
	let err = flow
		.update_password(&standard_tokens(), "brand-new-password")
		.await
		.expect_err("Scripted password failure must surface.");

	assert_eq!(err.category(), ErrorCategory::Weak);
	assert_eq!(err.context(), ErrorContext::Password);
	assert_eq!(
		backend.calls(),
		vec![BackendCall::AdoptSession, BackendCall::SetPassword, BackendCall::TerminateSession]
	);
}

#[tokio::test]
async fn raw_backend_text_never_reaches_the_user_message() {
	let raw_errors =
		["auth token rejected", "session store corrupt", "token family revoked upstream"];

	for raw in raw_errors {
		let (flow, _backend) = scripted_flow(ScriptedBackend::succeeding().with_verify_error(raw));
		let err = flow
			.update_password(&hash_tokens(), "brand-new-password")
			.await
			.expect_err("Scripted verify failure must surface.");

		for needle in ["token", "session", "auth"] {
			assert!(
				!err.user_message().contains(needle),
				"User message must not leak `{needle}`: {}.",
				err.user_message()
			);
		}
	}
}

#[tokio::test]
async fn url_entry_point_runs_the_whole_protocol() {
	let (flow, backend) = scripted_flow(ScriptedBackend::succeeding());

	flow.update_password_with_url(
		"https://app.example.com/reset?token_hash=valid-token-hash-12345",
		"brand-new-password",
	)
	.await
	.expect("Scripted URL entry point should succeed.");

	assert_eq!(
		backend.calls(),
		vec![
			BackendCall::VerifyRecoveryToken,
			BackendCall::SetPassword,
			BackendCall::TerminateSession,
		]
	);
}

#[tokio::test]
async fn url_entry_point_resolves_structural_failures_without_backend_calls() {
	let (flow, backend) = scripted_flow(ScriptedBackend::succeeding());
	let err = flow
		.update_password_with_url("https://app.example.com/reset", "brand-new-password")
		.await
		.expect_err("Credential-less link must fail before any backend call.");

	assert_eq!(
		err.user_message(),
		"This reset link is incomplete. Please request a new password reset."
	);
	assert!(backend.calls().is_empty());

	let err = flow
		.update_password_with_url("definitely not a url", "brand-new-password")
		.await
		.expect_err("Unparseable input must fail before any backend call.");

	assert_eq!(
		err.user_message(),
		"This reset link could not be read. Please request a new password reset."
	);
	assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn tokens_are_single_use_across_calls() {
	let (flow, backend) = scripted_flow(ScriptedBackend::succeeding());
	let tokens = hash_tokens();

	flow.update_password(&tokens, "first-new-password")
		.await
		.expect("First redemption should succeed.");

	let err = flow
		.update_password(&tokens, "second-new-password")
		.await
		.expect_err("Reusing consumed tokens must not succeed.");

	assert_eq!(err.category(), ErrorCategory::Used);

	let calls = backend.calls();

	assert_eq!(terminate_count(&calls), 2, "Each call tears down exactly once: {calls:?}.");
}

#[tokio::test]
async fn unresolved_identity_is_a_failure_with_teardown() {
	let (flow, backend) = scripted_flow(ScriptedBackend::succeeding().without_resolved_user());
	let err = flow
		.update_password(&standard_tokens(), "brand-new-password")
		.await
		.expect_err("Missing identity must fail the update.");

	assert_eq!(err.category(), ErrorCategory::Unknown);
	assert_eq!(backend.calls(), vec![BackendCall::AdoptSession, BackendCall::TerminateSession]);
}
