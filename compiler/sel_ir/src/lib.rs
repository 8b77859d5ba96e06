//! Frozen middle-IR for the Sel compiler's optimization passes.
//!
//! This crate defines the data model that middle-end passes consume: a
//! [`Program`] holding a table of [`Function`]s, each with a parameter list
//! (every parameter carries its value [`ParamDomain`]), a visibility flag,
//! and a basic-block [`Body`].
//!
//! # Pipeline Position
//!
//! ```text
//! Lowering → Constant Folding → **middle-end passes** → Codegen
//! ```
//!
//! Passes treat these types as read-only views over a frozen snapshot: a
//! pass never mutates a `Program` in place, it produces a new generation.
//! The [`Program::const_prop_done`] flag records that upstream constant
//! propagation and folding have already run, which several passes require
//! before they will accept the snapshot.
//!
//! # Crate Dependencies
//!
//! No dependency on the frontend or the backend. The optional `cache`
//! feature adds serde derives so programs can be snapshotted to disk.

mod body;
mod domain;
mod func;
mod program;
mod value;

pub use body::{Block, BlockId, Body, Callee, Instr, LocalId, Operand, Terminator};
pub use domain::{DomainValues, ParamDomain};
pub use func::{FuncId, Function, Param, Visibility};
pub use program::Program;
pub use value::ConstValue;
