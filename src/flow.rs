//! High-level reset flow facade and orchestration.

pub mod attempt;
pub mod update;

mod metrics;

pub use attempt::*;
pub use metrics::UpdateMetrics;

// self
use crate::{
	_prelude::*, backend::IdentityBackend, link::ResetLink, token::ValidationError,
};

/// Coordinates one password-recovery protocol against an identity backend.
///
/// The flow owns the backend handle and the shared metrics recorder so the
/// protocol implementation can focus on sequencing: establish a minimal-lifetime
/// session from validated reset tokens, perform exactly one password update inside
/// it, and unconditionally tear the session down. The facade itself keeps no
/// per-attempt state; every [`update_password`](ResetFlow::update_password) call
/// is self-contained.
#[derive(Clone)]
pub struct ResetFlow {
	/// Identity backend that redeems tokens and applies the password update.
	pub backend: Arc<dyn IdentityBackend>,
	/// Shared metrics recorder for update outcomes.
	pub update_metrics: Arc<UpdateMetrics>,
}
impl ResetFlow {
	/// Creates a flow for the provided identity backend.
	pub fn new(backend: Arc<dyn IdentityBackend>) -> Self {
		Self { backend, update_metrics: Default::default() }
	}

	/// One-shot entry point from a raw reset-link URL.
	///
	/// Parses the link, resolves provider rejections, extracts and structurally
	/// validates the tokens (all client-side), then runs one
	/// [`update_password`](ResetFlow::update_password) call. Structural and
	/// classified failures both surface through the crate [`Error`], whose
	/// [`user_message`](Error::user_message) stays a fixed safe sentence.
	pub async fn update_password_with_url(&self, raw_url: &str, new_password: &str) -> Result<()> {
		let link = ResetLink::parse_str(raw_url)?;

		if let Some(rejection) = link.provider_rejection() {
			return Err(rejection.into_validation_error().into());
		}

		let tokens = link.extract().ok_or(ValidationError::MissingTokens)?;

		tokens.validate()?;
		self.update_password(&tokens, new_password).await?;

		Ok(())
	}
}
impl Debug for ResetFlow {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ResetFlow").finish_non_exhaustive()
	}
}
