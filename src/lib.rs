//! Secure password-recovery flow engine: reset-link token extraction, structural
//! validation, error classification, and a session-scoped password updater with
//! guaranteed teardown.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod backend;
pub mod classify;
pub mod error;
pub mod flow;
pub mod link;
pub mod obs;
pub mod token;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::collections::HashSet;
	// self
	use crate::{
		backend::{BackendError, BackendFuture, IdentityBackend, ResolvedUser, SessionSlot},
		flow::ResetFlow,
	};

	/// Identity-backend operations, recorded in invocation order.
	#[derive(Clone, Copy, Debug, PartialEq, Eq)]
	pub enum BackendCall {
		/// Session adoption from an access+refresh pair.
		AdoptSession,
		/// One-time recovery-token verification.
		VerifyRecoveryToken,
		/// Password update for the current session.
		SetPassword,
		/// Session teardown.
		TerminateSession,
	}

	/// Scripted in-memory identity backend that records every call it receives.
	///
	/// Establish credentials are one-time, as with a real backend: redeeming the
	/// same credential twice fails with an already-consumed error.
	#[derive(Debug, Default)]
	pub struct ScriptedBackend {
		adopt_error: Option<String>,
		verify_error: Option<String>,
		password_error: Option<String>,
		terminate_error: Option<String>,
		resolve_user: bool,
		session: SessionSlot,
		consumed: Mutex<HashSet<String>>,
		calls: Mutex<Vec<BackendCall>>,
	}
	impl ScriptedBackend {
		/// Backend whose every operation succeeds.
		pub fn succeeding() -> Self {
			Self { resolve_user: true, ..Default::default() }
		}

		/// Scripts a raw failure for session adoption.
		pub fn with_adopt_error(mut self, raw: impl Into<String>) -> Self {
			self.adopt_error = Some(raw.into());

			self
		}

		/// Scripts a raw failure for recovery-token verification.
		pub fn with_verify_error(mut self, raw: impl Into<String>) -> Self {
			self.verify_error = Some(raw.into());

			self
		}

		/// Scripts a raw failure for the password update.
		pub fn with_password_error(mut self, raw: impl Into<String>) -> Self {
			self.password_error = Some(raw.into());

			self
		}

		/// Scripts a raw failure for session teardown.
		pub fn with_terminate_error(mut self, raw: impl Into<String>) -> Self {
			self.terminate_error = Some(raw.into());

			self
		}

		/// Makes establish operations report no error yet resolve no identity.
		pub fn without_resolved_user(mut self) -> Self {
			self.resolve_user = false;

			self
		}

		/// Returns every recorded call, in order.
		pub fn calls(&self) -> Vec<BackendCall> {
			self.calls.lock().clone()
		}

		/// Reports whether an established session is still active.
		pub fn session_active(&self) -> bool {
			self.session.current().is_some()
		}

		fn record(&self, call: BackendCall) {
			self.calls.lock().push(call);
		}

		fn establish(
			&self,
			credential: &str,
			scripted: &Option<String>,
		) -> Result<Option<ResolvedUser>, BackendError> {
			if let Some(raw) = scripted {
				return Err(BackendError::new(raw.clone()));
			}
			if !self.consumed.lock().insert(credential.to_owned()) {
				return Err(BackendError::new("recovery token already consumed"));
			}

			self.session.store(credential);

			Ok(self
				.resolve_user
				.then(|| ResolvedUser { id: "scripted-user".into(), email: None }))
		}
	}
	impl IdentityBackend for ScriptedBackend {
		fn adopt_session<'a>(
			&'a self,
			access_token: &'a str,
			_refresh_token: &'a str,
		) -> BackendFuture<'a, Option<ResolvedUser>> {
			Box::pin(async move {
				self.record(BackendCall::AdoptSession);
				self.establish(access_token, &self.adopt_error)
			})
		}

		fn verify_recovery_token<'a>(
			&'a self,
			token_hash: &'a str,
		) -> BackendFuture<'a, Option<ResolvedUser>> {
			Box::pin(async move {
				self.record(BackendCall::VerifyRecoveryToken);
				self.establish(token_hash, &self.verify_error)
			})
		}

		fn set_password<'a>(&'a self, _new_password: &'a str) -> BackendFuture<'a, ()> {
			Box::pin(async move {
				self.record(BackendCall::SetPassword);

				if let Some(raw) = &self.password_error {
					return Err(BackendError::new(raw.clone()));
				}
				if self.session.current().is_none() {
					return Err(BackendError::new("no current session"));
				}

				Ok(())
			})
		}

		fn terminate_session(&self) -> BackendFuture<'_, ()> {
			Box::pin(async move {
				self.record(BackendCall::TerminateSession);
				self.session.take();

				if let Some(raw) = &self.terminate_error {
					return Err(BackendError::new(raw.clone()));
				}

				Ok(())
			})
		}
	}

	/// Builds a [`ResetFlow`] over the provided scripted backend, returning the
	/// backend handle for call-order assertions.
	pub fn scripted_flow(backend: ScriptedBackend) -> (ResetFlow, Arc<ScriptedBackend>) {
		let backend = Arc::new(backend);

		(ResetFlow::new(backend.clone()), backend)
	}
}

mod _prelude {
	pub use std::{
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::Duration;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, recovery_broker as _};
