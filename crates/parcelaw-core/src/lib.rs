//! Answer resolution and explanation engine.
//!
//! Resolves a zoning question for a parcel by looking up the base rule for
//! its district, layering overlay adjustments, lot exceptions, and manual
//! overrides in strict precedence order, then emitting the final answer
//! together with a step-by-step computation trace.
//!
//! All resolution logic is pure and synchronous; loading of overlay,
//! exception, and override definitions is the caller's responsibility
//! (see the `parcelaw-data` crate).

pub mod answer;
pub mod citations;
pub mod conditions;
pub mod conflicts;
pub mod overlays;
pub mod overrides;
pub mod resolve;
pub mod rules;
pub mod trace;

pub use answer::{Answer, AnswerStatus, CodeCitation, Intent, Provenance};
pub use conditions::{ExceptionRule, LotContext};
pub use conflicts::{ConflictResolution, ConflictSource, SourceKind, resolve_conflicts};
pub use overlays::{AdjustmentOp, OverlayAdjustment, apply_overlay_adjustments};
pub use overrides::{Override, OverrideScope, select_override};
pub use resolve::{Resolution, ResolveRequest, resolve_all, resolve_answer};
pub use rules::RuleTable;
pub use trace::{AnswerTrace, TraceError, TraceStep, build_trace};
