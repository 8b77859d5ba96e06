//! Argument classification at call sites.
//!
//! Runs strictly after upstream constant propagation and folding: anything
//! compile-time-known is already an [`Operand::Const`], so classification
//! is a plain inspection of leaf operands, not an evaluation. Running it
//! earlier would under-classify — not unsound, merely suboptimal — so the
//! pass refuses snapshots without the folded-IR precondition flag.
//!
//! A caller's own parameter flowing into a callee on the same call cycle
//! is classified [`ArgBinding::Recursive`]; the domain tracker resolves
//! those by fixpoint instead of poisoning the callee outright. Any other
//! runtime value is [`ArgBinding::RuntimeKnown`].

use rayon::prelude::*;

use sel_ir::{ConstValue, Operand, Program};

use crate::callgraph::{CallGraph, CallSite};
use crate::error::PassError;

/// Classification of one argument at one call site.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgBinding {
    /// A compile-time constant literal.
    Constant(ConstValue),
    /// The caller's parameter `param`, where caller and callee share a
    /// call cycle. Resolved by the domain tracker's per-component
    /// fixpoint.
    Recursive { param: u32 },
    /// Only known at runtime.
    RuntimeKnown,
}

/// A call site with every argument classified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassifiedSite {
    /// Index into [`CallGraph::sites`].
    pub site: usize,
    pub bindings: Vec<ArgBinding>,
}

/// Classify every direct call site in the program.
///
/// Sites are independent, so classification fans out across worker
/// threads; the output preserves site order and is deterministic.
pub fn classify_sites(
    program: &Program,
    graph: &CallGraph,
) -> Result<Vec<ClassifiedSite>, PassError> {
    if !program.const_prop_done {
        return Err(PassError::PreconditionUnmet);
    }

    let classified: Vec<ClassifiedSite> = graph
        .sites()
        .par_iter()
        .enumerate()
        .map(|(idx, site)| ClassifiedSite {
            site: idx,
            bindings: site.args.iter().map(|arg| classify_arg(*arg, site, graph)).collect(),
        })
        .collect();

    tracing::debug!(sites = classified.len(), "call-site arguments classified");
    Ok(classified)
}

fn classify_arg(arg: Operand, site: &CallSite, graph: &CallGraph) -> ArgBinding {
    match arg {
        Operand::Const(value) => ArgBinding::Constant(value),
        Operand::Param(param) if graph.same_scc(site.caller, site.callee) => {
            ArgBinding::Recursive { param }
        }
        Operand::Param(_) | Operand::Local(_) | Operand::FuncRef(_) => ArgBinding::RuntimeKnown,
    }
}
