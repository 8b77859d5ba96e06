//! Signature rewriting and monomorphization.
//!
//! A pure IR → IR step: the input generation is never touched. For every
//! promoted function, one specialized body is emitted per variant tuple —
//! promoted parameters are substituted with their literals throughout the
//! body (pure syntactic substitution, no reinterpretation) and dropped
//! from the signature. Every direct call to a promoted function is then
//! rewired to the matching variant, found by looking up the call's
//! now-literal argument tuple. The original function is not carried into
//! the new generation: after rewiring, nothing references it.
//!
//! Specialization of distinct functions is independent and fans out
//! across workers; rewiring owns one function body per worker, so no two
//! workers ever touch the same target. The whole generation is assembled
//! before being returned — a cancelled run commits nothing.

use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use sel_ir::{Callee, ConstValue, FuncId, Function, Instr, Operand, Program};

use crate::cancel::CancelToken;
use crate::dce::DeadCodeElim;
use crate::decide::{PromotionRecord, VariantTuple};
use crate::error::PassError;

/// The new generation plus the emitted variant names, keyed by the
/// original function, for the diagnostic report.
#[derive(Debug)]
pub struct RewriteOutput {
    pub program: Program,
    pub variant_names: FxHashMap<FuncId, Vec<(VariantTuple, String)>>,
}

struct VariantDef<'a> {
    record: &'a PromotionRecord,
    tuple: &'a VariantTuple,
    id: FuncId,
    name: String,
}

/// Apply the promotion records to `program`, producing the next
/// generation.
pub fn rewrite(
    program: &Program,
    records: &FxHashMap<FuncId, PromotionRecord>,
    dce: &dyn DeadCodeElim,
    cancel: Option<&CancelToken>,
) -> Result<RewriteOutput, PassError> {
    check_cancel(cancel)?;

    // Deterministic id and name allocation: records in function-id order,
    // tuples in their (sorted) record order.
    let mut used_names: FxHashSet<String> =
        program.functions().map(|f| f.name.clone()).collect();
    let mut defs: Vec<VariantDef<'_>> = Vec::new();
    let mut variant_ids: FxHashMap<(FuncId, VariantTuple), FuncId> = FxHashMap::default();
    let mut variant_names: FxHashMap<FuncId, Vec<(VariantTuple, String)>> = FxHashMap::default();
    let mut next_id = program.next_func_id().raw();

    let mut ordered: Vec<&PromotionRecord> = records.values().collect();
    ordered.sort_by_key(|r| r.func);
    for record in ordered {
        let Some(original) = program.function(record.func) else {
            return Err(PassError::Internal {
                message: format!("promotion record for unknown function {}", record.func.raw()),
            });
        };
        for tuple in &record.variants {
            let id = FuncId::new(next_id);
            next_id += 1;
            let name = variant_name(&original.name, tuple, &mut used_names);
            variant_ids.insert((record.func, tuple.clone()), id);
            variant_names
                .entry(record.func)
                .or_default()
                .push((tuple.clone(), name.clone()));
            defs.push(VariantDef { record, tuple, id, name });
        }
    }

    // Emit one specialized function per variant.
    let variants: Result<Vec<Function>, PassError> = defs
        .par_iter()
        .map(|def| {
            let original = program.function(def.record.func).ok_or_else(|| {
                PassError::Internal {
                    message: format!("missing original function {}", def.record.func.raw()),
                }
            })?;
            Ok(specialize(original, def))
        })
        .collect();
    let mut variants = variants?;

    // Rewire calls in every surviving body, then let the downstream
    // eliminator drop the branches the substitution made unreachable.
    let carried: Result<Vec<Function>, PassError> = program
        .functions()
        .filter(|f| !records.contains_key(&f.id))
        .map(|f| {
            let mut func = f.clone();
            rewire_body(&mut func, records, &variant_ids)?;
            Ok(func)
        })
        .collect();
    let mut functions = carried?;

    variants.par_iter_mut().try_for_each(|func| {
        rewire_body(func, records, &variant_ids)?;
        dce.run(&mut func.body);
        Ok(())
    })?;

    check_cancel(cancel)?;
    functions.append(&mut variants);
    let program = Program::new(functions, true);
    Ok(RewriteOutput { program, variant_names })
}

fn check_cancel(cancel: Option<&CancelToken>) -> Result<(), PassError> {
    if cancel.is_some_and(CancelToken::is_cancelled) {
        return Err(PassError::Cancelled);
    }
    Ok(())
}

/// Mangle a variant's symbol from the promoted values, uniquified against
/// every name already in use.
fn variant_name(
    base: &str,
    tuple: &VariantTuple,
    used_names: &mut FxHashSet<String>,
) -> String {
    let suffixes: Vec<String> = tuple.iter().map(|v| v.mangle()).collect();
    let mut name = format!("{base}_{}", suffixes.join("_"));
    if used_names.contains(&name) {
        let mut n = 2usize;
        loop {
            let candidate = format!("{name}_{n}");
            if !used_names.contains(&candidate) {
                name = candidate;
                break;
            }
            n += 1;
        }
    }
    used_names.insert(name.clone());
    name
}

/// Clone the original with promoted parameters substituted by the
/// variant's literals and dropped from the signature; surviving
/// parameters are renumbered to stay dense.
fn specialize(original: &Function, def: &VariantDef<'_>) -> Function {
    let promoted = &def.record.promoted;
    let substitution: FxHashMap<u32, ConstValue> =
        promoted.iter().copied().zip(def.tuple.iter().copied()).collect();

    let mut remap: FxHashMap<u32, u32> = FxHashMap::default();
    let mut params = Vec::with_capacity(original.params.len() - promoted.len());
    for (index, param) in original.params.iter().enumerate() {
        #[allow(clippy::cast_possible_truncation)] // parameter counts fit u32
        let p = index as u32;
        if !substitution.contains_key(&p) {
            #[allow(clippy::cast_possible_truncation)]
            let new_index = params.len() as u32;
            remap.insert(p, new_index);
            params.push(param.clone());
        }
    }

    let mut body = original.body.clone();
    body.for_each_operand_mut(|op| {
        if let Operand::Param(p) = *op {
            *op = match substitution.get(&p) {
                Some(&value) => Operand::Const(value),
                None => Operand::Param(remap.get(&p).copied().unwrap_or(p)),
            };
        }
    });

    Function {
        id: def.id,
        name: def.name.clone(),
        params,
        visibility: original.visibility,
        body,
    }
}

/// Redirect every direct call to a promoted function at its matching
/// variant, dropping the promoted arguments. The promoted positions are
/// literal by the time this runs — either originally constant or just
/// substituted — so the lookup cannot miss for sound records.
fn rewire_body(
    func: &mut Function,
    records: &FxHashMap<FuncId, PromotionRecord>,
    variant_ids: &FxHashMap<(FuncId, VariantTuple), FuncId>,
) -> Result<(), PassError> {
    let caller = func.id;
    for block in &mut func.body.blocks {
        for instr in &mut block.instrs {
            let Instr::Call { callee, args, .. } = instr else {
                continue;
            };
            let Callee::Direct(target) = *callee else {
                continue;
            };
            let Some(record) = records.get(&target) else {
                continue;
            };

            let mut tuple = VariantTuple::new();
            for &p in &record.promoted {
                match args.get(p as usize) {
                    Some(Operand::Const(value)) => tuple.push(*value),
                    _ => {
                        return Err(PassError::Internal {
                            message: format!(
                                "call from {} to {}: promoted argument {p} is not a literal",
                                caller.raw(),
                                target.raw(),
                            ),
                        })
                    }
                }
            }
            let Some(&variant) = variant_ids.get(&(target, tuple)) else {
                return Err(PassError::Internal {
                    message: format!(
                        "call from {} to {}: argument tuple has no variant",
                        caller.raw(),
                        target.raw(),
                    ),
                });
            };

            *callee = Callee::Direct(variant);
            let mut index = 0u32;
            args.retain(|_| {
                let keep = !record.promoted.contains(&index);
                index += 1;
                keep
            });
        }
    }
    Ok(())
}
