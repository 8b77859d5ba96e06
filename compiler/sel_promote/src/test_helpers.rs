//! Shared test factories for the promotion pass.
//!
//! Consolidates program/function builders used across the `callgraph`,
//! `classify`, `domain`, `decide`, `rewrite`, and pipeline tests. Only
//! compiled in test builds.

use sel_ir::{
    Block, BlockId, Body, Callee, ConstValue, FuncId, Function, Instr, LocalId, Operand, Param,
    ParamDomain, Program, Terminator, Visibility,
};

/// Shorthand for `FuncId::new(n)`.
pub(crate) fn fid(n: u32) -> FuncId {
    FuncId::new(n)
}

/// Shorthand for `LocalId::new(n)`.
pub(crate) fn lid(n: u32) -> LocalId {
    LocalId::new(n)
}

/// A boolean parameter.
pub(crate) fn bool_param(name: &str) -> Param {
    Param { name: name.to_string(), domain: ParamDomain::Bool }
}

/// A bounded integer parameter.
pub(crate) fn int_param(name: &str, lo: i64, hi: i64) -> Param {
    Param { name: name.to_string(), domain: ParamDomain::IntRange { lo, hi } }
}

/// An unbounded integer parameter.
pub(crate) fn unbounded_param(name: &str) -> Param {
    Param { name: name.to_string(), domain: ParamDomain::Unbounded }
}

/// A single-block body that just returns.
pub(crate) fn ret_body() -> Body {
    Body {
        blocks: vec![Block { instrs: vec![], terminator: Terminator::Return(None) }],
    }
}

/// A single-block body performing the given direct calls in order, then
/// returning.
pub(crate) fn call_body(calls: Vec<(FuncId, Vec<Operand>)>) -> Body {
    let instrs = calls
        .into_iter()
        .enumerate()
        .map(|(i, (callee, args))| {
            #[allow(clippy::cast_possible_truncation)]
            let dst = Some(LocalId::new(i as u32));
            Instr::Call { dst, callee: Callee::Direct(callee), args }
        })
        .collect();
    Body { blocks: vec![Block { instrs, terminator: Terminator::Return(None) }] }
}

/// A body that branches on parameter 0 and returns a different constant
/// per arm. Block 1 is the `true` arm, block 2 the `false` arm.
pub(crate) fn branch_on_param0_body() -> Body {
    Body {
        blocks: vec![
            Block {
                instrs: vec![],
                terminator: Terminator::Branch {
                    cond: Operand::Param(0),
                    then_blk: BlockId::new(1),
                    else_blk: BlockId::new(2),
                },
            },
            Block {
                instrs: vec![],
                terminator: Terminator::Return(Some(Operand::Const(ConstValue::Int(1)))),
            },
            Block {
                instrs: vec![],
                terminator: Terminator::Return(Some(Operand::Const(ConstValue::Int(0)))),
            },
        ],
    }
}

/// An internal function.
pub(crate) fn func(id: FuncId, name: &str, params: Vec<Param>, body: Body) -> Function {
    Function { id, name: name.to_string(), params, visibility: Visibility::Internal, body }
}

/// An exported function.
pub(crate) fn exported(id: FuncId, name: &str, params: Vec<Param>, body: Body) -> Function {
    Function { id, name: name.to_string(), params, visibility: Visibility::Exported, body }
}

/// A program with the constant-folding precondition satisfied.
pub(crate) fn program(functions: Vec<Function>) -> Program {
    Program::new(functions, true)
}

/// Shorthand operands.
pub(crate) fn cbool(b: bool) -> Operand {
    Operand::Const(ConstValue::Bool(b))
}

pub(crate) fn cint(i: i64) -> Operand {
    Operand::Const(ConstValue::Int(i))
}

pub(crate) fn local(n: u32) -> Operand {
    Operand::Local(lid(n))
}
