//! Pass configuration and the specialization cost model.

use sel_ir::Function;

/// Configuration for the promotion pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromoteConfig {
    /// Master toggle. When `false` the pass returns its input unchanged.
    pub enabled: bool,
    /// Hard cap on specialized variants per function. A function whose
    /// observed variant count exceeds this is rejected whole — partial
    /// promotion would leave call sites that still pass the argument.
    pub max_variants_per_function: usize,
    /// Budget for `variant_count × estimated_body_size`. Promotion is
    /// rejected when the estimate exceeds this many bytes.
    pub max_estimated_growth_bytes: usize,
    /// Promote a parameter even when every value of its domain was
    /// observed. Off by default: with the full domain observed there is
    /// no unreachable branch to win back, only code-size growth.
    pub promote_fully_observed: bool,
    /// Report address-taken functions as `Exported` rather than with the
    /// distinct `AddressTaken` reason. Either way they are never
    /// promoted: indirect callers pin the original signature.
    pub treat_address_taken_as_exported: bool,
    /// Worker threads for the parallel phases (0 = rayon's default).
    pub threads: usize,
}

impl Default for PromoteConfig {
    fn default() -> Self {
        PromoteConfig {
            enabled: true,
            max_variants_per_function: 8,
            max_estimated_growth_bytes: 16 * 1024,
            promote_fully_observed: false,
            treat_address_taken_as_exported: true,
            threads: 0,
        }
    }
}

/// Estimates the code size of a function body, in bytes.
///
/// The estimate only has to rank growth against
/// [`PromoteConfig::max_estimated_growth_bytes`]; it is deliberately
/// pluggable since no single metric is right for every backend.
pub trait CostModel: Sync {
    /// Estimated emitted size of `func`'s body in bytes.
    fn body_size(&self, func: &Function) -> usize;
}

/// Default cost model: a flat per-instruction estimate.
#[derive(Clone, Copy, Debug, Default)]
pub struct InstrCountCost;

/// Rough bytes of emitted code per middle-IR instruction.
const BYTES_PER_INSTR: usize = 8;

impl CostModel for InstrCountCost {
    fn body_size(&self, func: &Function) -> usize {
        func.body.instr_count() * BYTES_PER_INSTR
    }
}
