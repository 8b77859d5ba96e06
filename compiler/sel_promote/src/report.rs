//! The per-function diagnostic report.
//!
//! Every function gets a decision each generation: not eligible (with the
//! reason), rejected by the bloat heuristic, or promoted (with the emitted
//! variants). Reports are collected and returned to the caller, never
//! printed from inside the pass.

use std::fmt;

use sel_ir::FuncId;

use crate::decide::VariantTuple;

/// Why a function (or all of its parameters) cannot be promoted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IneligibleReason {
    /// Exported symbol; outside call sites may pass anything.
    Exported,
    /// Address-taken; indirect callers pin the original signature.
    AddressTaken,
    /// Never called, so there is nothing to specialize for.
    NoCallSites,
    /// Only called from bodies that are themselves unreachable (a dead
    /// recursive cluster); no live call site seeds a variant.
    NoLiveCallSites,
    /// The function has no parameters to promote.
    NoPromotableParams,
    /// At least one call site passes a runtime-computed value.
    RuntimeArgumentPresent,
    /// The parameter's domain has no finite cardinality, so
    /// exhaustiveness of the observed set cannot be proven.
    UnboundedDomain,
    /// Every domain value was observed; promotion would eliminate no
    /// branch. Overridable via
    /// [`PromoteConfig::promote_fully_observed`](crate::PromoteConfig::promote_fully_observed).
    FullDomainObserved,
}

impl fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            IneligibleReason::Exported => "exported symbol",
            IneligibleReason::AddressTaken => "address taken",
            IneligibleReason::NoCallSites => "no call sites",
            IneligibleReason::NoLiveCallSites => "no live call sites",
            IneligibleReason::NoPromotableParams => "no promotable parameters",
            IneligibleReason::RuntimeArgumentPresent => "runtime argument present",
            IneligibleReason::UnboundedDomain => "unbounded parameter domain",
            IneligibleReason::FullDomainObserved => "full domain observed",
        };
        f.write_str(text)
    }
}

/// A parameter selected for promotion, with the number of domain values
/// never observed at any call site (the values whose branches the
/// downstream eliminator may drop).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromotedParam {
    pub index: u32,
    pub unobserved: u128,
}

/// One emitted specialization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariantInfo {
    pub name: String,
    pub values: VariantTuple,
}

/// The decision taken for one function in one generation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PassDecision {
    NotEligible(IneligibleReason),
    RejectedByBloat { variant_count: usize },
    Promoted {
        params: Vec<PromotedParam>,
        variants: Vec<VariantInfo>,
    },
}

/// Decision for a single function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FuncReport {
    pub func: FuncId,
    pub name: String,
    pub decision: PassDecision,
}

/// All decisions from one generation of the pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub entries: Vec<FuncReport>,
}

impl GenerationReport {
    /// Number of functions promoted this generation.
    pub fn promoted_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.decision, PassDecision::Promoted { .. }))
            .count()
    }
}

/// The full diagnostic report for a pass run, one entry per generation.
///
/// The pass iterates generations until quiescent, so the last generation
/// always reports zero promotions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PassReport {
    pub generations: Vec<GenerationReport>,
}

impl PassReport {
    /// Total functions promoted across all generations.
    pub fn total_promoted(&self) -> usize {
        self.generations.iter().map(GenerationReport::promoted_count).sum()
    }
}

impl fmt::Display for PassReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, generation) in self.generations.iter().enumerate() {
            writeln!(f, "generation {}:", i + 1)?;
            for entry in &generation.entries {
                match &entry.decision {
                    PassDecision::NotEligible(reason) => {
                        writeln!(f, "  {}: not eligible ({reason})", entry.name)?;
                    }
                    PassDecision::RejectedByBloat { variant_count } => {
                        writeln!(
                            f,
                            "  {}: rejected by bloat heuristic ({variant_count} variants)",
                            entry.name,
                        )?;
                    }
                    PassDecision::Promoted { params, variants } => {
                        let indices: Vec<String> =
                            params.iter().map(|p| p.index.to_string()).collect();
                        let names: Vec<String> = variants
                            .iter()
                            .map(|v| {
                                let vals: Vec<String> =
                                    v.values.iter().map(ToString::to_string).collect();
                                format!("{}({})", v.name, vals.join(", "))
                            })
                            .collect();
                        write!(
                            f,
                            "  {}: promoted on params [{}] -> {}",
                            entry.name,
                            indices.join(", "),
                            names.join(", "),
                        )?;
                        let unobserved: u128 = params.iter().map(|p| p.unobserved).sum();
                        if unobserved > 0 {
                            write!(f, " ({unobserved} domain values unobserved)")?;
                        }
                        writeln!(f)?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
