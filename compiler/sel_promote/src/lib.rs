//! Constant-parameter promotion for the Sel compiler.
//!
//! Detects function parameters that receive a compile-time constant at
//! every call site, proves the surrounding branches can be specialized
//! away safely, and rewrites each such function into one monomorphized
//! variant per observed value combination — with the promoted parameters
//! gone from the runtime signature and every call site rewired.
//!
//! # Pipeline Position
//!
//! ```text
//! Constant Folding → **promotion** → Monomorphized codegen
//! ```
//!
//! Upstream folding must already have run (the pass refuses snapshots
//! without the precondition flag); downstream dead-code elimination
//! consumes the literal-substituted bodies through the [`DeadCodeElim`]
//! seam.
//!
//! # Phases
//!
//! - [`callgraph`] — function → call-site index, address-taken set,
//!   strongly-connected components
//! - [`classify`] — per-argument `Constant` / `Recursive` / `RuntimeKnown`
//! - [`domain`] — observed-variant sets per (function, parameter), merged
//!   union-wise across workers, recursion resolved per component
//! - [`eligibility`] — exported / address-taken / uncalled exclusion
//! - [`decide`] — co-occurrence variant tuples plus the bloat heuristic
//! - [`rewrite`] — specialization, signature rewriting, call rewiring
//!
//! The whole pass is a pure transformation over a frozen snapshot: it
//! either returns a complete new generation or (on error or cancellation)
//! nothing at all.

pub mod callgraph;
mod cancel;
pub mod classify;
mod config;
pub mod dce;
pub mod decide;
pub mod domain;
pub mod eligibility;
mod error;
mod pass;
pub mod report;
pub mod rewrite;

pub use cancel::CancelToken;
pub use config::{CostModel, InstrCountCost, PromoteConfig};
pub use dce::{BranchFolder, DeadCodeElim};
pub use decide::{Decision, PromotionRecord, VariantTuple};
pub use error::PassError;
pub use pass::{promote, promote_with, PassOutcome};
pub use report::{
    FuncReport, GenerationReport, IneligibleReason, PassDecision, PassReport, PromotedParam,
    VariantInfo,
};

#[cfg(test)]
mod test_helpers;
