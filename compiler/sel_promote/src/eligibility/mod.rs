//! Function-level eligibility.
//!
//! Computed once from the call-graph annotations and never revisited
//! during analysis. Ineligible functions pass through the rewriter
//! unmodified, whatever their call sites look like.

use sel_ir::{Function, Visibility};

use crate::callgraph::CallGraph;
use crate::config::PromoteConfig;
use crate::report::IneligibleReason;

/// Returns the reason a function can take no promotion at all, or `None`
/// when it is at least a candidate.
///
/// Exported functions can be entered from outside compiler-controlled
/// call sites; address-taken functions have indirect callers that pin the
/// original signature. Zero-call-site functions have nothing to
/// specialize for. `treat_address_taken_as_exported` only folds the
/// address-taken reason into `Exported` for reporting — the function is
/// excluded either way.
pub fn global_ineligibility(
    func: &Function,
    graph: &CallGraph,
    config: &PromoteConfig,
) -> Option<IneligibleReason> {
    if func.visibility == Visibility::Exported {
        return Some(IneligibleReason::Exported);
    }
    if graph.is_address_taken(func.id) {
        return Some(if config.treat_address_taken_as_exported {
            IneligibleReason::Exported
        } else {
            IneligibleReason::AddressTaken
        });
    }
    if graph.call_site_count(func.id) == 0 {
        return Some(IneligibleReason::NoCallSites);
    }
    None
}
