//! Dead-branch elimination, as seen by the rewriter.
//!
//! The rewriter does not reimplement dead-code elimination; it hands each
//! specialized body to a [`DeadCodeElim`] collaborator whose contract is:
//! given a body whose conditionals now test literal-substituted operands,
//! remove the statically-unreachable branches losslessly. [`BranchFolder`]
//! is the in-tree implementation of that contract.

use rustc_hash::FxHashMap;

use sel_ir::{Block, BlockId, Body, ConstValue, Operand, Terminator};

/// Removes branches made unreachable by literal substitution.
pub trait DeadCodeElim: Sync {
    /// Simplify `body` in place. Must preserve the behavior of every
    /// reachable path.
    fn run(&self, body: &mut Body);
}

/// Default eliminator: folds conditional terminators whose operand is a
/// literal into plain jumps, then sweeps blocks no longer reachable from
/// the entry.
#[derive(Clone, Copy, Debug, Default)]
pub struct BranchFolder;

impl DeadCodeElim for BranchFolder {
    fn run(&self, body: &mut Body) {
        fold_constant_terminators(body);
        sweep_unreachable(body);
    }
}

fn fold_constant_terminators(body: &mut Body) {
    for block in &mut body.blocks {
        let folded = match &block.terminator {
            Terminator::Branch { cond: Operand::Const(ConstValue::Bool(b)), then_blk, else_blk } => {
                Some(if *b { *then_blk } else { *else_blk })
            }
            Terminator::Switch { scrut: Operand::Const(value), cases, default } => Some(
                cases
                    .iter()
                    .find(|(case, _)| case == value)
                    .map_or(*default, |&(_, target)| target),
            ),
            _ => None,
        };
        if let Some(target) = folded {
            block.terminator = Terminator::Jump(target);
        }
    }
}

/// Drop blocks unreachable from the entry and renumber the survivors.
fn sweep_unreachable(body: &mut Body) {
    if body.blocks.is_empty() {
        return;
    }

    let mut reachable = vec![false; body.blocks.len()];
    let mut worklist = vec![BlockId::ENTRY];
    while let Some(id) = worklist.pop() {
        if std::mem::replace(&mut reachable[id.index()], true) {
            continue;
        }
        for succ in body.blocks[id.index()].terminator.successors() {
            if !reachable[succ.index()] {
                worklist.push(succ);
            }
        }
    }
    if reachable.iter().all(|&r| r) {
        return;
    }

    let mut remap: FxHashMap<BlockId, BlockId> = FxHashMap::default();
    let mut kept: Vec<Block> = Vec::new();
    for (index, block) in body.blocks.drain(..).enumerate() {
        if reachable[index] {
            #[allow(clippy::cast_possible_truncation)] // block counts fit u32
            let new_id = BlockId::new(kept.len() as u32);
            #[allow(clippy::cast_possible_truncation)]
            remap.insert(BlockId::new(index as u32), new_id);
            kept.push(block);
        }
    }
    for block in &mut kept {
        retarget(&mut block.terminator, &remap);
    }
    body.blocks = kept;
}

fn retarget(terminator: &mut Terminator, remap: &FxHashMap<BlockId, BlockId>) {
    let map = |id: &mut BlockId| {
        if let Some(&new_id) = remap.get(id) {
            *id = new_id;
        }
    };
    match terminator {
        Terminator::Jump(target) => map(target),
        Terminator::Branch { then_blk, else_blk, .. } => {
            map(then_blk);
            map(else_blk);
        }
        Terminator::Switch { cases, default, .. } => {
            for (_, target) in cases {
                map(target);
            }
            map(default);
        }
        Terminator::Return(_) | Terminator::Unreachable => {}
    }
}

#[cfg(test)]
mod tests;
