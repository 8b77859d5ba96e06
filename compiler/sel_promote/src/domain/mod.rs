//! The observed-variant table (domain tracker).
//!
//! Accumulates, per function and parameter position, the set of distinct
//! constant values seen across every call site of that function. A single
//! runtime-known binding permanently poisons the pair; an unbounded
//! domain poisons it before any call site is read, since exhaustiveness
//! could never be proven.
//!
//! # Merge Contract
//!
//! Accumulation is a commutative, associative set union, so call sites
//! can be processed in any order and in parallel: each worker folds its
//! slice of sites into a private partial table, then merges the partial
//! into the shared sharded table under that shard's lock. No ordering
//! barrier is needed beyond "all sites are merged before anyone reads".
//!
//! # Recursion
//!
//! Bindings that forward the caller's own parameter around a call cycle
//! are resolved after the direct merge by fixpoint iteration within each
//! strongly-connected component: the callee's set absorbs the caller's,
//! poison flows through, and iteration stops when nothing changes. Sets
//! only ever grow toward finite domains, so convergence is guaranteed.

use parking_lot::Mutex;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use sel_ir::{ConstValue, FuncId, Function, Program, Visibility};

use crate::callgraph::CallGraph;
use crate::classify::{ArgBinding, ClassifiedSite};

/// Why a parameter can never be promoted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum PoisonKind {
    /// Some call site passes a runtime-computed value.
    Runtime,
    /// The domain has no finite cardinality.
    Unbounded,
}

/// Accumulated knowledge about one (function, parameter) pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamState {
    /// Every call site so far passed a constant; these are the distinct
    /// values.
    Observed(FxHashSet<ConstValue>),
    /// Permanently ineligible.
    Poisoned(PoisonKind),
}

impl ParamState {
    /// Commutative merge. Poison absorbs; between two poisons the
    /// stronger kind wins so merge order cannot change the outcome.
    pub fn merge(&mut self, other: ParamState) {
        match (&mut *self, other) {
            (ParamState::Observed(a), ParamState::Observed(b)) => a.extend(b),
            (ParamState::Poisoned(a), ParamState::Poisoned(b)) => *a = (*a).max(b),
            (ParamState::Observed(_), poison @ ParamState::Poisoned(_)) => *self = poison,
            (ParamState::Poisoned(_), ParamState::Observed(_)) => {}
        }
    }

    /// Returns `true` if the pair is permanently ineligible.
    pub fn is_poisoned(&self) -> bool {
        matches!(self, ParamState::Poisoned(_))
    }
}

/// Number of lock shards in the shared merge table.
const SHARDS: usize = 16;

/// Sites folded into one private partial table per work unit.
const CHUNK: usize = 64;

type StateMap = FxHashMap<(FuncId, u32), ParamState>;

/// The completed observed-variant table for one program generation.
#[derive(Debug)]
pub struct DomainTable {
    states: StateMap,
}

impl DomainTable {
    /// Accumulate across all classified call sites and resolve recursive
    /// bindings. Must only be called once every site of the generation
    /// has been classified.
    pub fn build(program: &Program, graph: &CallGraph, sites: &[ClassifiedSite]) -> DomainTable {
        let shards: Vec<Mutex<StateMap>> =
            (0..SHARDS).map(|_| Mutex::new(StateMap::default())).collect();

        // Direct contributions, merged shard-by-shard under the lock.
        sites.par_chunks(CHUNK).for_each(|chunk| {
            let mut partial = StateMap::default();
            for classified in chunk {
                let site = &graph.sites()[classified.site];
                let Some(callee) = program.function(site.callee) else {
                    continue;
                };
                for (index, binding) in classified.bindings.iter().enumerate() {
                    #[allow(clippy::cast_possible_truncation)] // arity checked at build
                    let param = index as u32;
                    let contribution = match binding {
                        ArgBinding::Constant(value) => {
                            if callee.params[index].domain.contains(*value) {
                                let mut set = FxHashSet::default();
                                set.insert(*value);
                                ParamState::Observed(set)
                            } else {
                                // A literal outside the declared domain is
                                // an upstream inconsistency; stay safe.
                                ParamState::Poisoned(PoisonKind::Runtime)
                            }
                        }
                        ArgBinding::RuntimeKnown => ParamState::Poisoned(PoisonKind::Runtime),
                        // Resolved by the component fixpoint below.
                        ArgBinding::Recursive { .. } => continue,
                    };
                    merge_into(&mut partial, (site.callee, param), contribution);
                }
            }
            for (key, state) in partial {
                let mut shard = shards[key.0.raw() as usize % SHARDS].lock();
                merge_into(&mut shard, key, state);
            }
        });

        let mut states = StateMap::default();
        for shard in shards {
            for (key, state) in shard.into_inner() {
                merge_into(&mut states, key, state);
            }
        }

        // Baseline for every parameter: unbounded domains are poisoned
        // before any observation; everything else starts empty.
        for func in program.functions() {
            for (index, param) in func.params.iter().enumerate() {
                #[allow(clippy::cast_possible_truncation)]
                let key = (func.id, index as u32);
                let baseline = if param.domain.is_finite() {
                    ParamState::Observed(FxHashSet::default())
                } else {
                    ParamState::Poisoned(PoisonKind::Unbounded)
                };
                merge_into(&mut states, key, baseline);
            }
        }

        // An indirect call could land on any address-taken function with
        // any arguments; record that as runtime contributions rather than
        // silently omitting the sites.
        if graph.has_indirect_sites() {
            for target in graph.address_taken() {
                let Some(func) = program.function(target) else {
                    continue;
                };
                for index in 0..func.params.len() {
                    #[allow(clippy::cast_possible_truncation)]
                    let key = (target, index as u32);
                    merge_into(&mut states, key, ParamState::Poisoned(PoisonKind::Runtime));
                }
            }
        }

        let mut table = DomainTable { states };
        table.resolve_recursive(program, graph, sites);
        table
    }

    /// Fixpoint over recursive bindings, one component at a time.
    fn resolve_recursive(
        &mut self,
        program: &Program,
        graph: &CallGraph,
        sites: &[ClassifiedSite],
    ) {
        struct RecEdge {
            src: (FuncId, u32),
            dst: (FuncId, u32),
        }

        let mut edges: Vec<RecEdge> = Vec::new();
        for classified in sites {
            let site = &graph.sites()[classified.site];
            for (index, binding) in classified.bindings.iter().enumerate() {
                if let ArgBinding::Recursive { param } = binding {
                    #[allow(clippy::cast_possible_truncation)]
                    let dst = (site.callee, index as u32);
                    edges.push(RecEdge { src: (site.caller, *param), dst });
                }
            }
        }
        if edges.is_empty() {
            return;
        }

        let mut iteration = 0usize;
        loop {
            iteration += 1;
            let mut changed = false;
            for edge in &edges {
                let flowed = self.flow(program, graph, edge.src);
                let Some(dst_func) = program.function(edge.dst.0) else {
                    continue;
                };
                let dst_domain = dst_func.params[edge.dst.1 as usize].domain;
                let contribution = match flowed {
                    ParamState::Poisoned(_) => ParamState::Poisoned(PoisonKind::Runtime),
                    ParamState::Observed(values) => {
                        if values.iter().all(|v| dst_domain.contains(*v)) {
                            ParamState::Observed(values)
                        } else {
                            ParamState::Poisoned(PoisonKind::Runtime)
                        }
                    }
                };
                let entry = self
                    .states
                    .entry(edge.dst)
                    .or_insert_with(|| ParamState::Observed(FxHashSet::default()));
                let before = entry.clone();
                entry.merge(contribution);
                changed |= *entry != before;
            }
            if !changed {
                break;
            }
        }
        tracing::debug!(iterations = iteration, edges = edges.len(), "recursive bindings converged");
    }

    /// What flows out of a source parameter around a cycle. Sources whose
    /// function can be entered from outside the program's own call sites
    /// may carry any value, so they flow poison.
    fn flow(&self, program: &Program, graph: &CallGraph, src: (FuncId, u32)) -> ParamState {
        let Some(func) = program.function(src.0) else {
            return ParamState::Poisoned(PoisonKind::Runtime);
        };
        if func.visibility == Visibility::Exported || graph.is_address_taken(src.0) {
            return ParamState::Poisoned(PoisonKind::Runtime);
        }
        self.states
            .get(&src)
            .cloned()
            .unwrap_or_else(|| ParamState::Observed(FxHashSet::default()))
    }

    /// State for one (function, parameter) pair.
    pub fn state(&self, func: FuncId, param: u32) -> Option<&ParamState> {
        self.states.get(&(func, param))
    }

    /// The observed constant set, or `None` when poisoned or untracked.
    pub fn observed(&self, func: FuncId, param: u32) -> Option<&FxHashSet<ConstValue>> {
        match self.states.get(&(func, param)) {
            Some(ParamState::Observed(set)) => Some(set),
            _ => None,
        }
    }

    /// Returns `true` if every value of the parameter's domain was
    /// observed at some call site.
    pub fn fully_observed(&self, func: &Function, param: u32) -> bool {
        self.unobserved_count(func, param) == Some(0)
    }

    /// Domain values never seen at any call site, or `None` when the
    /// pair is poisoned or the domain unbounded. These are the values
    /// whose branches are provably unreachable after promotion.
    pub fn unobserved_count(&self, func: &Function, param: u32) -> Option<u128> {
        let observed = self.observed(func.id, param)?;
        let cardinality = func.params.get(param as usize)?.domain.cardinality()?;
        Some(cardinality.saturating_sub(observed.len() as u128))
    }
}

fn merge_into(map: &mut StateMap, key: (FuncId, u32), state: ParamState) {
    match map.entry(key) {
        std::collections::hash_map::Entry::Occupied(mut slot) => slot.get_mut().merge(state),
        std::collections::hash_map::Entry::Vacant(slot) => {
            slot.insert(state);
        }
    }
}
