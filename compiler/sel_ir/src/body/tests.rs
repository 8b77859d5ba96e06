use pretty_assertions::assert_eq;
use smallvec::SmallVec;

use super::*;

fn two_block_body() -> Body {
    Body {
        blocks: vec![
            Block {
                instrs: vec![
                    Instr::Assign { dst: LocalId::new(0), src: Operand::Param(0) },
                    Instr::Call {
                        dst: Some(LocalId::new(1)),
                        callee: Callee::Indirect(Operand::FuncRef(FuncId::new(9))),
                        args: vec![Operand::Const(ConstValue::Int(1))],
                    },
                ],
                terminator: Terminator::Branch {
                    cond: Operand::Local(LocalId::new(1)),
                    then_blk: BlockId::new(1),
                    else_blk: BlockId::new(1),
                },
            },
            Block {
                instrs: vec![],
                terminator: Terminator::Return(Some(Operand::Local(LocalId::new(0)))),
            },
        ],
    }
}

#[test]
fn successors_per_terminator() {
    let ret = Terminator::Return(None);
    assert!(ret.successors().is_empty());

    let jump = Terminator::Jump(BlockId::new(3));
    assert_eq!(jump.successors(), SmallVec::<[BlockId; 4]>::from_vec(vec![BlockId::new(3)]));

    let switch = Terminator::Switch {
        scrut: Operand::Param(0),
        cases: vec![
            (ConstValue::Int(0), BlockId::new(1)),
            (ConstValue::Int(1), BlockId::new(2)),
        ],
        default: BlockId::new(3),
    };
    assert_eq!(
        switch.successors().into_vec(),
        vec![BlockId::new(1), BlockId::new(2), BlockId::new(3)],
    );
}

#[test]
fn instr_count_includes_terminators() {
    assert_eq!(two_block_body().instr_count(), 4);
}

#[test]
fn for_each_operand_reaches_indirect_callee() {
    let mut seen = Vec::new();
    two_block_body().for_each_operand(|op| seen.push(*op));
    assert!(seen.contains(&Operand::FuncRef(FuncId::new(9))));
    assert!(seen.contains(&Operand::Param(0)));
    assert!(seen.contains(&Operand::Const(ConstValue::Int(1))));
    // Branch condition and return value are visited too.
    assert!(seen.contains(&Operand::Local(LocalId::new(1))));
    assert!(seen.contains(&Operand::Local(LocalId::new(0))));
}
