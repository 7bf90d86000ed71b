//! Optional observability helpers for reset flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `recovery_broker.flow` with the `flow`
//!   (token kind) and `stage` (call site) fields, plus a development-only debug event when
//!   session teardown fails.
//! - Enable `metrics` to increment the `recovery_broker_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`.

// self
use crate::{_prelude::*, token::TokenKind};

/// Reset flow kinds observed by the crate, one per token format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Access+refresh pair adoption flow.
	StandardReset,
	/// One-time token-hash verification flow.
	HashReset,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::StandardReset => "standard_reset",
			FlowKind::HashReset => "hash_reset",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl From<TokenKind> for FlowKind {
	fn from(kind: TokenKind) -> Self {
		match kind {
			TokenKind::Standard => Self::StandardReset,
			TokenKind::Hash => Self::HashReset,
		}
	}
}

/// Protocol stages of one password-update call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowStage {
	/// Establishing the minimal-lifetime session.
	Establish,
	/// Applying the password update.
	Update,
	/// Mandatory session teardown.
	Teardown,
}
impl FlowStage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowStage::Establish => "establish",
			FlowStage::Update => "update",
			FlowStage::Teardown => "teardown",
		}
	}
}
impl Display for FlowStage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a flow helper.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by reset flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("recovery_broker.flow", flow = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"recovery_broker_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Logs a teardown failure as a development-only diagnostic (when enabled).
///
/// Teardown failures never override the primary flow result, so this hook is their
/// only escape hatch.
pub fn record_teardown_failure(kind: FlowKind, detail: &str) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(
			flow = kind.as_str(),
			stage = FlowStage::Teardown.as_str(),
			detail,
			"Session teardown reported a failure after the primary result was decided.",
		);
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, detail);
	}
}
