//! The promotion decision engine.
//!
//! Consumes the observed-variant table and produces, per function, one of
//! three outcomes: not eligible (with a reason), rejected by the bloat
//! heuristic, or promoted with a concrete variant list.
//!
//! # Variant Tuples
//!
//! The variants for a function are the distinct value combinations its
//! call sites can actually produce — never the free cartesian product of
//! independently-observed values. A call with `(true, 1)` and another
//! with `(false, 2)` yields exactly those two tuples; `(true, 2)` was
//! never passed, is proven unreachable, and must not be materialized.
//!
//! Recursive bindings project the caller's own tuple set through the call
//! site, iterated to fixpoint within each strongly-connected component.
//!
//! # Whole-Function Decisions
//!
//! Promotion is all-or-nothing per function. Partial promotion of only
//! some call sites is impossible by construction: a parameter is only a
//! candidate when *every* site agrees it is constant. Likewise a bloat
//! rejection rejects the function whole, and any parameter elsewhere in
//! the component that forwarded into the rejected function re-poisons and
//! the component's decisions recompute.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use sel_ir::{ConstValue, FuncId, Program};

use crate::callgraph::CallGraph;
use crate::classify::{ArgBinding, ClassifiedSite};
use crate::config::{CostModel, PromoteConfig};
use crate::domain::{DomainTable, ParamState, PoisonKind};
use crate::eligibility::global_ineligibility;
use crate::report::IneligibleReason;

/// Concrete values for a function's promoted parameters, in promoted-index
/// order.
pub type VariantTuple = SmallVec<[ConstValue; 4]>;

/// The promotion selected for one function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromotionRecord {
    pub func: FuncId,
    /// Promoted parameter indices, ascending.
    pub promoted: Vec<u32>,
    /// Distinct observed variant tuples, sorted for determinism.
    pub variants: Vec<VariantTuple>,
}

/// Decision for one function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    NotEligible(IneligibleReason),
    RejectedByBloat { variant_count: usize },
    Promoted(PromotionRecord),
}

/// Decide promotions for every function in the program.
///
/// `classified` must be positionally aligned with `graph.sites()`.
pub fn decide(
    program: &Program,
    graph: &CallGraph,
    classified: &[ClassifiedSite],
    domains: &DomainTable,
    config: &PromoteConfig,
    cost: &dyn CostModel,
) -> FxHashMap<FuncId, Decision> {
    debug_assert!(classified.iter().enumerate().all(|(i, c)| c.site == i));

    let mut decisions: FxHashMap<FuncId, Decision> = FxHashMap::default();

    for component in graph.components() {
        decide_component(
            program, graph, classified, domains, config, cost, component, &mut decisions,
        );
    }

    tracing::debug!(
        promoted = decisions.values().filter(|d| matches!(d, Decision::Promoted(_))).count(),
        functions = decisions.len(),
        "promotion decisions made"
    );
    decisions
}

#[allow(clippy::too_many_arguments)]
fn decide_component(
    program: &Program,
    graph: &CallGraph,
    classified: &[ClassifiedSite],
    domains: &DomainTable,
    config: &PromoteConfig,
    cost: &dyn CostModel,
    component: &[FuncId],
    decisions: &mut FxHashMap<FuncId, Decision>,
) {
    let mut candidates: Vec<FuncId> = Vec::new();
    for &id in component {
        let Some(func) = program.function(id) else {
            continue;
        };
        if let Some(reason) = global_ineligibility(func, graph, config) {
            decisions.insert(id, Decision::NotEligible(reason));
        } else {
            candidates.push(id);
        }
    }
    if candidates.is_empty() {
        return;
    }

    let mut poisoned: FxHashSet<(FuncId, u32)> = FxHashSet::default();
    let mut rejected: FxHashMap<FuncId, usize> = FxHashMap::default();
    let mut promoted_sets: FxHashMap<FuncId, Vec<u32>> = FxHashMap::default();
    let mut tuple_sets: FxHashMap<FuncId, FxHashSet<VariantTuple>> = FxHashMap::default();

    // Decisions inside a component are interdependent: rejecting one
    // member can poison parameters of another. States only ever degrade,
    // so this loop terminates.
    loop {
        promoted_sets.clear();
        for &id in &candidates {
            if rejected.contains_key(&id) {
                continue;
            }
            promoted_sets.insert(id, candidate_params(program, domains, config, &poisoned, id));
        }

        // A recursive binding is only sound when its source parameter is
        // itself being promoted; otherwise the argument stays a runtime
        // parameter reference and the sink is poisoned.
        let mut changed = false;
        for (&id, params) in &promoted_sets {
            for &site_idx in graph.sites_of(id) {
                let site = &graph.sites()[site_idx];
                for &k in params {
                    match classified[site_idx].bindings[k as usize] {
                        ArgBinding::Constant(_) => {}
                        ArgBinding::Recursive { param } => {
                            let supported = !rejected.contains_key(&site.caller)
                                && promoted_sets
                                    .get(&site.caller)
                                    .is_some_and(|p| p.contains(&param));
                            if !supported {
                                changed |= poisoned.insert((id, k));
                            }
                        }
                        ArgBinding::RuntimeKnown => {
                            changed |= poisoned.insert((id, k));
                        }
                    }
                }
            }
        }
        if changed {
            continue;
        }

        compute_tuples(graph, classified, &promoted_sets, &mut tuple_sets);

        // Bloat heuristic: all-or-nothing per function. Reject one member
        // at a time (lowest id first): a rejection can poison another
        // member's forwarded parameters and shrink its variant set, so
        // the remaining members are re-evaluated before being condemned.
        let mut newly_rejected = false;
        for &id in &candidates {
            if rejected.contains_key(&id) {
                continue;
            }
            let Some(params) = promoted_sets.get(&id) else {
                continue;
            };
            if params.is_empty() {
                continue;
            }
            let count = tuple_sets.get(&id).map_or(0, FxHashSet::len);
            if count == 0 {
                continue;
            }
            let Some(func) = program.function(id) else {
                continue;
            };
            let growth = count.saturating_mul(cost.body_size(func));
            if count > config.max_variants_per_function
                || growth > config.max_estimated_growth_bytes
            {
                rejected.insert(id, count);
                newly_rejected = true;
                break;
            }
        }
        if !newly_rejected {
            break;
        }
    }

    for &id in &candidates {
        let Some(func) = program.function(id) else {
            continue;
        };
        let decision = if let Some(&variant_count) = rejected.get(&id) {
            Decision::RejectedByBloat { variant_count }
        } else {
            let params = promoted_sets.remove(&id).unwrap_or_default();
            if params.is_empty() {
                Decision::NotEligible(rollup_reason(program, domains, config, &poisoned, id))
            } else {
                let mut variants: Vec<VariantTuple> =
                    tuple_sets.remove(&id).unwrap_or_default().into_iter().collect();
                if variants.is_empty() {
                    Decision::NotEligible(IneligibleReason::NoLiveCallSites)
                } else {
                    variants.sort();
                    Decision::Promoted(PromotionRecord { func: func.id, promoted: params, variants })
                }
            }
        };
        decisions.insert(id, decision);
    }
}

/// Parameter indices currently worth promoting: constant-only, finite,
/// not locally poisoned, and not fully observed unless the policy toggle
/// allows it.
fn candidate_params(
    program: &Program,
    domains: &DomainTable,
    config: &PromoteConfig,
    poisoned: &FxHashSet<(FuncId, u32)>,
    id: FuncId,
) -> Vec<u32> {
    let Some(func) = program.function(id) else {
        return Vec::new();
    };
    let mut params = Vec::new();
    for index in 0..func.params.len() {
        #[allow(clippy::cast_possible_truncation)] // parameter counts fit u32
        let p = index as u32;
        if poisoned.contains(&(id, p)) {
            continue;
        }
        if domains.observed(id, p).is_none() {
            continue;
        }
        if !config.promote_fully_observed && domains.fully_observed(func, p) {
            continue;
        }
        params.push(p);
    }
    params
}

/// Enumerate each function's variant tuples from its call sites, to
/// fixpoint across the component.
///
/// Constant bindings contribute their literal; recursive bindings expand
/// once per tuple of the caller, so co-occurrence is preserved — two
/// parameters forwarded from the same caller vary together, exactly as
/// the caller's own variants do.
fn compute_tuples(
    graph: &CallGraph,
    classified: &[ClassifiedSite],
    promoted_sets: &FxHashMap<FuncId, Vec<u32>>,
    tuple_sets: &mut FxHashMap<FuncId, FxHashSet<VariantTuple>>,
) {
    tuple_sets.clear();
    for &id in promoted_sets.keys() {
        tuple_sets.insert(id, FxHashSet::default());
    }

    loop {
        let mut grew = false;
        for (&id, params) in promoted_sets {
            if params.is_empty() {
                continue;
            }
            for &site_idx in graph.sites_of(id) {
                let site = &graph.sites()[site_idx];
                let bindings = &classified[site_idx].bindings;
                let recursive = params
                    .iter()
                    .any(|&k| matches!(bindings[k as usize], ArgBinding::Recursive { .. }));
                if recursive {
                    let Some(caller_params) = promoted_sets.get(&site.caller) else {
                        continue;
                    };
                    let caller_tuples: Vec<VariantTuple> = match tuple_sets.get(&site.caller) {
                        Some(set) => set.iter().cloned().collect(),
                        None => continue,
                    };
                    for caller_tuple in caller_tuples {
                        let mut tuple = VariantTuple::new();
                        for &k in params {
                            match bindings[k as usize] {
                                ArgBinding::Constant(value) => tuple.push(value),
                                ArgBinding::Recursive { param } => {
                                    let Some(pos) =
                                        caller_params.iter().position(|&j| j == param)
                                    else {
                                        continue;
                                    };
                                    tuple.push(caller_tuple[pos]);
                                }
                                ArgBinding::RuntimeKnown => {}
                            }
                        }
                        if tuple.len() == params.len() {
                            if let Some(set) = tuple_sets.get_mut(&id) {
                                grew |= set.insert(tuple);
                            }
                        }
                    }
                } else {
                    let mut tuple = VariantTuple::new();
                    for &k in params {
                        if let ArgBinding::Constant(value) = bindings[k as usize] {
                            tuple.push(value);
                        }
                    }
                    if tuple.len() == params.len() {
                        if let Some(set) = tuple_sets.get_mut(&id) {
                            grew |= set.insert(tuple);
                        }
                    }
                }
            }
        }
        if !grew {
            break;
        }
    }
}

/// Why nothing on this function could be promoted, most informative
/// reason first: a parameter held back only by the full-domain policy
/// beats a runtime poison, which beats an unbounded domain.
fn rollup_reason(
    program: &Program,
    domains: &DomainTable,
    config: &PromoteConfig,
    poisoned: &FxHashSet<(FuncId, u32)>,
    id: FuncId,
) -> IneligibleReason {
    let Some(func) = program.function(id) else {
        return IneligibleReason::NoPromotableParams;
    };
    if func.params.is_empty() {
        return IneligibleReason::NoPromotableParams;
    }

    let mut saw_runtime = false;
    let mut saw_unbounded = false;
    for index in 0..func.params.len() {
        #[allow(clippy::cast_possible_truncation)]
        let p = index as u32;
        if poisoned.contains(&(id, p)) {
            saw_runtime = true;
            continue;
        }
        match domains.state(id, p) {
            Some(ParamState::Observed(_)) => {
                if !config.promote_fully_observed && domains.fully_observed(func, p) {
                    return IneligibleReason::FullDomainObserved;
                }
                // Candidate that never made it into the promoted set:
                // only possible when it was poisoned above.
            }
            Some(ParamState::Poisoned(PoisonKind::Runtime)) => saw_runtime = true,
            Some(ParamState::Poisoned(PoisonKind::Unbounded)) | None => saw_unbounded = true,
        }
    }
    if saw_runtime {
        IneligibleReason::RuntimeArgumentPresent
    } else if saw_unbounded {
        IneligibleReason::UnboundedDomain
    } else {
        IneligibleReason::NoPromotableParams
    }
}

#[cfg(test)]
mod tests;
