//! Sel middle-end driver.
//!
//! Exposes the promotion pass as a command over on-disk program
//! snapshots: read a serialized [`sel_ir::Program`], run the pass, print
//! the diagnostic report, write the new generation back out.
//!
//! Exit codes: `0` on success, `1` on a usage error, `2` when the pass
//! refuses to run (precondition unmet, malformed call graph) or on I/O
//! failure.

pub mod commands;
pub mod options;

pub use commands::run_promote;
pub use options::PromoteOptions;

/// Exit code for usage errors.
pub const EXIT_USAGE: i32 = 1;
/// Exit code for pass or I/O failures.
pub const EXIT_FAILURE: i32 = 2;
