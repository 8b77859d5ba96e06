//! Fatal pass errors.
//!
//! These abort the whole run with no partial output. Per-parameter
//! ineligibility (runtime arguments, unbounded domains) and bloat
//! rejection are decision outcomes, not errors — they live in
//! [`crate::report`].

use std::error::Error;
use std::fmt;

use sel_ir::FuncId;

/// A fatal error from the promotion pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PassError {
    /// A call site references a callee that is not in the function table,
    /// or passes the wrong number of arguments. The upstream IR must be
    /// fixed before the pass can run.
    MalformedCallGraph { caller: FuncId, callee: FuncId },
    /// The snapshot's `const_prop_done` flag is unset. Classification over
    /// unfolded IR would under-classify, so the pass refuses to run.
    PreconditionUnmet,
    /// The run was cancelled before the rewriter committed.
    Cancelled,
    /// An internal invariant was violated. Always a bug in the pass.
    Internal { message: String },
}

impl fmt::Display for PassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassError::MalformedCallGraph { caller, callee } => write!(
                f,
                "malformed call graph: function {} has a bad call to function {}",
                caller.raw(),
                callee.raw(),
            ),
            PassError::PreconditionUnmet => {
                write!(f, "constant propagation has not run on this program")
            }
            PassError::Cancelled => write!(f, "promotion pass cancelled"),
            PassError::Internal { message } => write!(f, "internal pass error: {message}"),
        }
    }
}

impl Error for PassError {}
