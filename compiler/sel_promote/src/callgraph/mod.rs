//! Call graph construction.
//!
//! Walks every function body once and produces the function → call-site
//! index the rest of the pass reads: direct call sites with their argument
//! operands, the address-taken set (any [`Operand::FuncRef`] occurrence),
//! and the count of indirect call sites. Direct calls to an unknown
//! function, wrong-arity calls, and dangling `FuncRef`s are rejected as
//! [`PassError::MalformedCallGraph`] — fatal for the whole run.
//!
//! The graph is a general digraph, not a tree: strongly-connected
//! components are computed up front (iterative Tarjan, no recursion) so
//! later phases can converge over recursive cycles instead of descending
//! into them.

use rustc_hash::{FxHashMap, FxHashSet};

use sel_ir::{BlockId, Callee, FuncId, Instr, Operand, Program};

use crate::error::PassError;

/// A direct call site: caller, callee, and the argument operands, one per
/// callee parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallSite {
    pub caller: FuncId,
    pub callee: FuncId,
    /// Position inside the caller's body, for diagnostics.
    pub block: BlockId,
    pub instr: usize,
    pub args: Vec<Operand>,
}

/// The whole-program call index, built once per generation from the
/// frozen snapshot.
#[derive(Debug)]
pub struct CallGraph {
    sites: Vec<CallSite>,
    by_callee: FxHashMap<FuncId, Vec<usize>>,
    address_taken: FxHashSet<FuncId>,
    indirect_sites: usize,
    scc_of: FxHashMap<FuncId, u32>,
    components: Vec<Vec<FuncId>>,
}

impl CallGraph {
    /// Build the call graph for a program.
    pub fn build(program: &Program) -> Result<CallGraph, PassError> {
        let mut sites = Vec::new();
        let mut by_callee: FxHashMap<FuncId, Vec<usize>> = FxHashMap::default();
        let mut address_taken = FxHashSet::default();
        let mut indirect_sites = 0usize;

        for func in program.functions() {
            let mut bad_ref = None;
            func.body.for_each_operand(|op| {
                if let Operand::FuncRef(target) = *op {
                    if program.function(target).is_none() {
                        bad_ref = Some(target);
                    } else {
                        address_taken.insert(target);
                    }
                }
            });
            if let Some(target) = bad_ref {
                return Err(PassError::MalformedCallGraph { caller: func.id, callee: target });
            }

            for (block_idx, block) in func.body.blocks.iter().enumerate() {
                for (instr_idx, instr) in block.instrs.iter().enumerate() {
                    let Instr::Call { callee, args, .. } = instr else {
                        continue;
                    };
                    match callee {
                        Callee::Direct(target) => {
                            let Some(target_func) = program.function(*target) else {
                                return Err(PassError::MalformedCallGraph {
                                    caller: func.id,
                                    callee: *target,
                                });
                            };
                            if args.len() != target_func.params.len() {
                                return Err(PassError::MalformedCallGraph {
                                    caller: func.id,
                                    callee: *target,
                                });
                            }
                            #[allow(clippy::cast_possible_truncation)] // block count fits u32
                            let site = CallSite {
                                caller: func.id,
                                callee: *target,
                                block: BlockId::new(block_idx as u32),
                                instr: instr_idx,
                                args: args.clone(),
                            };
                            by_callee.entry(*target).or_default().push(sites.len());
                            sites.push(site);
                        }
                        Callee::Indirect(_) => indirect_sites += 1,
                    }
                }
            }
        }

        let (scc_of, components) = compute_sccs(program, &sites);

        tracing::debug!(
            direct_sites = sites.len(),
            indirect_sites,
            address_taken = address_taken.len(),
            components = components.len(),
            "call graph built"
        );

        Ok(CallGraph { sites, by_callee, address_taken, indirect_sites, scc_of, components })
    }

    /// All direct call sites, in body order per caller.
    pub fn sites(&self) -> &[CallSite] {
        &self.sites
    }

    /// Indices into [`sites`](Self::sites) for every call to `callee`.
    pub fn sites_of(&self, callee: FuncId) -> &[usize] {
        self.by_callee.get(&callee).map_or(&[], Vec::as_slice)
    }

    /// Number of direct call sites targeting `callee`.
    pub fn call_site_count(&self, callee: FuncId) -> usize {
        self.sites_of(callee).len()
    }

    /// Returns `true` if some operand anywhere takes the function's
    /// address.
    pub fn is_address_taken(&self, func: FuncId) -> bool {
        self.address_taken.contains(&func)
    }

    /// Functions whose address is taken, i.e. the conservative target set
    /// of every indirect call.
    pub fn address_taken(&self) -> impl Iterator<Item = FuncId> + '_ {
        self.address_taken.iter().copied()
    }

    /// Returns `true` if the program contains at least one indirect call.
    pub fn has_indirect_sites(&self) -> bool {
        self.indirect_sites > 0
    }

    /// Returns `true` if `a` and `b` sit on a common call cycle.
    pub fn same_scc(&self, a: FuncId, b: FuncId) -> bool {
        match (self.scc_of.get(&a), self.scc_of.get(&b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    /// Strongly-connected components of the call graph. Singleton
    /// components are included.
    pub fn components(&self) -> &[Vec<FuncId>] {
        &self.components
    }
}

/// Iterative Tarjan over the function-level graph.
///
/// An explicit frame stack replaces recursion: deep call chains in the
/// input must not translate into compiler stack depth.
fn compute_sccs(
    program: &Program,
    sites: &[CallSite],
) -> (FxHashMap<FuncId, u32>, Vec<Vec<FuncId>>) {
    let mut succs: FxHashMap<FuncId, Vec<FuncId>> = FxHashMap::default();
    for site in sites {
        succs.entry(site.caller).or_default().push(site.callee);
    }

    let mut index_of: FxHashMap<FuncId, u32> = FxHashMap::default();
    let mut lowlink: FxHashMap<FuncId, u32> = FxHashMap::default();
    let mut on_stack: FxHashSet<FuncId> = FxHashSet::default();
    let mut stack: Vec<FuncId> = Vec::new();
    let mut next_index = 0u32;
    let mut components: Vec<Vec<FuncId>> = Vec::new();
    let empty: Vec<FuncId> = Vec::new();

    for root in program.functions().map(|f| f.id) {
        if index_of.contains_key(&root) {
            continue;
        }
        let mut frames: Vec<(FuncId, usize)> = vec![(root, 0)];
        index_of.insert(root, next_index);
        lowlink.insert(root, next_index);
        next_index += 1;
        stack.push(root);
        on_stack.insert(root);

        while let Some(frame) = frames.last_mut() {
            let (v, edge) = (frame.0, frame.1);
            let out = succs.get(&v).unwrap_or(&empty);
            if edge < out.len() {
                frame.1 += 1;
                let w = out[edge];
                if let Some(&wi) = index_of.get(&w) {
                    if on_stack.contains(&w) && wi < lowlink[&v] {
                        lowlink.insert(v, wi);
                    }
                } else {
                    index_of.insert(w, next_index);
                    lowlink.insert(w, next_index);
                    next_index += 1;
                    stack.push(w);
                    on_stack.insert(w);
                    frames.push((w, 0));
                }
            } else {
                frames.pop();
                if let Some(&(parent, _)) = frames.last() {
                    let lv = lowlink[&v];
                    if lv < lowlink[&parent] {
                        lowlink.insert(parent, lv);
                    }
                }
                if lowlink[&v] == index_of[&v] {
                    let mut component = Vec::new();
                    while let Some(w) = stack.pop() {
                        on_stack.remove(&w);
                        component.push(w);
                        if w == v {
                            break;
                        }
                    }
                    component.sort();
                    components.push(component);
                }
            }
        }
    }

    let mut scc_of = FxHashMap::default();
    for (i, component) in components.iter().enumerate() {
        #[allow(clippy::cast_possible_truncation)] // component count fits u32
        let id = i as u32;
        for &f in component {
            scc_of.insert(f, id);
        }
    }
    (scc_of, components)
}
