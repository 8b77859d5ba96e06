//! Pass orchestration.
//!
//! One generation runs: call graph → classification → domain tracking →
//! decisions → rewrite. Substitution exposes new literal arguments inside
//! specialized bodies (a caller's constant flows one call deeper each
//! time), so a single generation is not a fixpoint; the public entry
//! iterates generations until one promotes nothing. Promotion removes a
//! parameter from every lineage it touches, so the iteration terminates.

use rustc_hash::FxHashMap;

use sel_ir::Program;

use crate::callgraph::CallGraph;
use crate::cancel::CancelToken;
use crate::classify::classify_sites;
use crate::config::{CostModel, InstrCountCost, PromoteConfig};
use crate::dce::{BranchFolder, DeadCodeElim};
use crate::decide::{decide, Decision, PromotionRecord};
use crate::domain::DomainTable;
use crate::error::PassError;
use crate::report::{
    FuncReport, GenerationReport, PassDecision, PassReport, PromotedParam, VariantInfo,
};
use crate::rewrite::rewrite;

/// Result of a successful pass run: the final program generation plus the
/// per-function diagnostic report.
#[derive(Debug)]
pub struct PassOutcome {
    pub program: Program,
    pub report: PassReport,
}

/// Run the pass with the default cost model and eliminator.
pub fn promote(program: &Program, config: &PromoteConfig) -> Result<PassOutcome, PassError> {
    promote_with(program, config, &InstrCountCost, &BranchFolder, None)
}

/// Run the pass with explicit collaborators and optional cancellation.
pub fn promote_with(
    program: &Program,
    config: &PromoteConfig,
    cost: &dyn CostModel,
    dce: &dyn DeadCodeElim,
    cancel: Option<&CancelToken>,
) -> Result<PassOutcome, PassError> {
    if !config.enabled {
        return Ok(PassOutcome { program: program.clone(), report: PassReport::default() });
    }

    if config.threads > 0 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build()
            .map_err(|e| PassError::Internal { message: format!("worker pool: {e}") })?;
        pool.install(|| run_to_fixpoint(program, config, cost, dce, cancel))
    } else {
        run_to_fixpoint(program, config, cost, dce, cancel)
    }
}

fn run_to_fixpoint(
    program: &Program,
    config: &PromoteConfig,
    cost: &dyn CostModel,
    dce: &dyn DeadCodeElim,
    cancel: Option<&CancelToken>,
) -> Result<PassOutcome, PassError> {
    if !program.const_prop_done {
        return Err(PassError::PreconditionUnmet);
    }

    let mut current = program.clone();
    let mut report = PassReport::default();

    loop {
        check_cancel(cancel)?;
        let generation = report.generations.len() + 1;
        tracing::debug!(generation, functions = current.len(), "analysis starting");

        let graph = CallGraph::build(&current)?;
        let classified = classify_sites(&current, &graph)?;
        let domains = DomainTable::build(&current, &graph, &classified);
        let decisions = decide(&current, &graph, &classified, &domains, config, cost);
        check_cancel(cancel)?;

        let records: FxHashMap<_, PromotionRecord> = decisions
            .iter()
            .filter_map(|(&id, decision)| match decision {
                Decision::Promoted(record) => Some((id, record.clone())),
                _ => None,
            })
            .collect();

        if records.is_empty() {
            report.generations.push(build_report(&current, &domains, &decisions, &FxHashMap::default()));
            break;
        }

        let out = rewrite(&current, &records, dce, cancel)?;
        report
            .generations
            .push(build_report(&current, &domains, &decisions, &out.variant_names));
        tracing::debug!(generation, promoted = records.len(), "generation committed");
        current = out.program;
    }

    Ok(PassOutcome { program: current, report })
}

fn check_cancel(cancel: Option<&CancelToken>) -> Result<(), PassError> {
    if cancel.is_some_and(CancelToken::is_cancelled) {
        return Err(PassError::Cancelled);
    }
    Ok(())
}

type VariantNames = FxHashMap<sel_ir::FuncId, Vec<(crate::decide::VariantTuple, String)>>;

fn build_report(
    program: &Program,
    domains: &DomainTable,
    decisions: &FxHashMap<sel_ir::FuncId, Decision>,
    variant_names: &VariantNames,
) -> GenerationReport {
    let mut entries = Vec::with_capacity(decisions.len());
    for func in program.functions() {
        let Some(decision) = decisions.get(&func.id) else {
            continue;
        };
        let decision = match decision {
            Decision::NotEligible(reason) => PassDecision::NotEligible(*reason),
            Decision::RejectedByBloat { variant_count } => {
                PassDecision::RejectedByBloat { variant_count: *variant_count }
            }
            Decision::Promoted(record) => {
                let params = record
                    .promoted
                    .iter()
                    .map(|&index| PromotedParam {
                        index,
                        unobserved: domains.unobserved_count(func, index).unwrap_or(0),
                    })
                    .collect();
                let names = variant_names.get(&func.id);
                let variants = record
                    .variants
                    .iter()
                    .map(|tuple| VariantInfo {
                        name: names
                            .and_then(|n| {
                                n.iter().find(|(t, _)| t == tuple).map(|(_, name)| name.clone())
                            })
                            .unwrap_or_default(),
                        values: tuple.clone(),
                    })
                    .collect();
                PassDecision::Promoted { params, variants }
            }
        };
        entries.push(FuncReport { func: func.id, name: func.name.clone(), decision });
    }
    GenerationReport { entries }
}
