//! Basic-block function bodies.
//!
//! The body IR is deliberately small: passes in this workspace only need
//! call expressions, leaf operands, and branching control flow. Opaque
//! computation is represented by [`Instr::Op`], which consumes operands
//! and produces a local without saying how.
//!
//! Values are named via [`LocalId`]. Control flow uses [`BlockId`]
//! references between blocks; the entry block is always block 0.

use smallvec::{smallvec, SmallVec};

use crate::func::FuncId;
use crate::value::ConstValue;

// ── ID newtypes ─────────────────────────────────────────────────────

/// Local value ID within a function body.
///
/// IDs are allocated sequentially starting from 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct LocalId(u32);

impl LocalId {
    /// Create a new local ID from a raw index.
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw `u32` value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Basic block ID within a function body.
///
/// IDs index directly into [`Body::blocks`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct BlockId(u32);

impl BlockId {
    /// The entry block of every body.
    pub const ENTRY: BlockId = BlockId(0);

    /// Create a new block ID from a raw index.
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw `u32` value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// ── Operands ────────────────────────────────────────────────────────

/// A leaf operand. Upstream constant folding guarantees that anything
/// compile-time-known has already been collapsed into [`Operand::Const`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Operand {
    /// An already-folded compile-time constant.
    Const(ConstValue),
    /// The enclosing function's parameter at the given index.
    Param(u32),
    /// A local value produced earlier in the body.
    Local(LocalId),
    /// The address of a function. Marks the referenced function as
    /// address-taken wherever it appears.
    FuncRef(FuncId),
}

/// The callee of a call instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Callee {
    /// A call to a statically-known function.
    Direct(FuncId),
    /// A call through an indirect or virtual mechanism; the target is
    /// only known at runtime.
    Indirect(Operand),
}

// ── Instructions ────────────────────────────────────────────────────

/// A single instruction in a basic block.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Instr {
    /// Copy an operand into a local: `let dst = src`.
    Assign { dst: LocalId, src: Operand },
    /// Opaque computation over operands: `let dst = op(args...)`.
    /// The operation itself is irrelevant to the middle-end passes here;
    /// only the data dependencies matter.
    Op { dst: LocalId, args: Vec<Operand> },
    /// Function call: `let dst = callee(args...)`.
    Call {
        dst: Option<LocalId>,
        callee: Callee,
        args: Vec<Operand>,
    },
}

// ── Terminators ─────────────────────────────────────────────────────

/// Block exit.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Terminator {
    Return(Option<Operand>),
    Jump(BlockId),
    Branch {
        cond: Operand,
        then_blk: BlockId,
        else_blk: BlockId,
    },
    Switch {
        scrut: Operand,
        cases: Vec<(ConstValue, BlockId)>,
        default: BlockId,
    },
    Unreachable,
}

impl Terminator {
    /// Successor block IDs, in case order.
    ///
    /// Returns `SmallVec<[BlockId; 4]>` to avoid heap allocation for the
    /// common case (max 2 successors except Switch with many cases).
    pub fn successors(&self) -> SmallVec<[BlockId; 4]> {
        match self {
            Terminator::Return(_) | Terminator::Unreachable => SmallVec::new(),
            Terminator::Jump(target) => smallvec![*target],
            Terminator::Branch { then_blk, else_blk, .. } => smallvec![*then_blk, *else_blk],
            Terminator::Switch { cases, default, .. } => {
                let mut targets = SmallVec::with_capacity(cases.len() + 1);
                for &(_, b) in cases {
                    targets.push(b);
                }
                targets.push(*default);
                targets
            }
        }
    }
}

// ── Blocks and bodies ───────────────────────────────────────────────

/// A basic block: straight-line instructions plus a terminator.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Block {
    pub instrs: Vec<Instr>,
    pub terminator: Terminator,
}

/// A function body. The entry block is [`BlockId::ENTRY`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Body {
    pub blocks: Vec<Block>,
}

impl Body {
    /// Look up a block by ID.
    #[inline]
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }

    /// Total instruction + terminator count, the unit the default cost
    /// model charges for.
    pub fn instr_count(&self) -> usize {
        self.blocks.iter().map(|b| b.instrs.len() + 1).sum()
    }

    /// Visit every operand in the body, including call args, indirect
    /// callee operands, and terminator operands.
    pub fn for_each_operand(&self, mut f: impl FnMut(&Operand)) {
        for block in &self.blocks {
            for instr in &block.instrs {
                match instr {
                    Instr::Assign { src, .. } => f(src),
                    Instr::Op { args, .. } => args.iter().for_each(&mut f),
                    Instr::Call { callee, args, .. } => {
                        if let Callee::Indirect(op) = callee {
                            f(op);
                        }
                        args.iter().for_each(&mut f);
                    }
                }
            }
            match &block.terminator {
                Terminator::Return(Some(op))
                | Terminator::Branch { cond: op, .. }
                | Terminator::Switch { scrut: op, .. } => f(op),
                Terminator::Return(None) | Terminator::Jump(_) | Terminator::Unreachable => {}
            }
        }
    }

    /// Mutable counterpart of [`for_each_operand`](Self::for_each_operand),
    /// for passes that substitute operands in a cloned body.
    pub fn for_each_operand_mut(&mut self, mut f: impl FnMut(&mut Operand)) {
        for block in &mut self.blocks {
            for instr in &mut block.instrs {
                match instr {
                    Instr::Assign { src, .. } => f(src),
                    Instr::Op { args, .. } => args.iter_mut().for_each(&mut f),
                    Instr::Call { callee, args, .. } => {
                        if let Callee::Indirect(op) = callee {
                            f(op);
                        }
                        args.iter_mut().for_each(&mut f);
                    }
                }
            }
            match &mut block.terminator {
                Terminator::Return(Some(op))
                | Terminator::Branch { cond: op, .. }
                | Terminator::Switch { scrut: op, .. } => f(op),
                Terminator::Return(None) | Terminator::Jump(_) | Terminator::Unreachable => {}
            }
        }
    }
}

#[cfg(test)]
mod tests;
