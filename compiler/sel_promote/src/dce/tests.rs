use pretty_assertions::assert_eq;

use sel_ir::{Block, Body, ConstValue, Instr, LocalId, Operand, Terminator};

use super::*;

fn ret(value: i64) -> Terminator {
    Terminator::Return(Some(Operand::Const(ConstValue::Int(value))))
}

fn branch_on(cond: Operand) -> Body {
    Body {
        blocks: vec![
            Block {
                instrs: vec![],
                terminator: Terminator::Branch {
                    cond,
                    then_blk: BlockId::new(1),
                    else_blk: BlockId::new(2),
                },
            },
            Block { instrs: vec![], terminator: ret(1) },
            Block { instrs: vec![], terminator: ret(0) },
        ],
    }
}

#[test]
fn folds_a_true_branch_and_sweeps_the_dead_arm() {
    let mut body = branch_on(Operand::Const(ConstValue::Bool(true)));
    BranchFolder.run(&mut body);

    assert_eq!(body.blocks.len(), 2);
    assert_eq!(body.blocks[0].terminator, Terminator::Jump(BlockId::new(1)));
    assert_eq!(body.blocks[1].terminator, ret(1));
}

#[test]
fn folds_a_false_branch_and_sweeps_the_dead_arm() {
    let mut body = branch_on(Operand::Const(ConstValue::Bool(false)));
    BranchFolder.run(&mut body);

    assert_eq!(body.blocks.len(), 2);
    // The surviving arm was renumbered down.
    assert_eq!(body.blocks[0].terminator, Terminator::Jump(BlockId::new(1)));
    assert_eq!(body.blocks[1].terminator, ret(0));
}

#[test]
fn runtime_branches_are_untouched() {
    let mut body = branch_on(Operand::Local(LocalId::new(0)));
    let before = body.clone();
    BranchFolder.run(&mut body);
    assert_eq!(body, before);
}

#[test]
fn folds_a_constant_switch_to_the_matching_case() {
    let mut body = Body {
        blocks: vec![
            Block {
                instrs: vec![],
                terminator: Terminator::Switch {
                    scrut: Operand::Const(ConstValue::Int(2)),
                    cases: vec![
                        (ConstValue::Int(1), BlockId::new(1)),
                        (ConstValue::Int(2), BlockId::new(2)),
                    ],
                    default: BlockId::new(3),
                },
            },
            Block { instrs: vec![], terminator: ret(10) },
            Block { instrs: vec![], terminator: ret(20) },
            Block { instrs: vec![], terminator: ret(30) },
        ],
    };
    BranchFolder.run(&mut body);

    assert_eq!(body.blocks.len(), 2);
    assert_eq!(body.blocks[0].terminator, Terminator::Jump(BlockId::new(1)));
    assert_eq!(body.blocks[1].terminator, ret(20));
}

#[test]
fn unmatched_switch_falls_back_to_the_default() {
    let mut body = Body {
        blocks: vec![
            Block {
                instrs: vec![],
                terminator: Terminator::Switch {
                    scrut: Operand::Const(ConstValue::Int(9)),
                    cases: vec![(ConstValue::Int(1), BlockId::new(1))],
                    default: BlockId::new(2),
                },
            },
            Block { instrs: vec![], terminator: ret(10) },
            Block { instrs: vec![], terminator: ret(99) },
        ],
    };
    BranchFolder.run(&mut body);

    assert_eq!(body.blocks.len(), 2);
    assert_eq!(body.blocks[1].terminator, ret(99));
}

#[test]
fn sweeping_preserves_instructions_of_live_blocks() {
    let mut body = branch_on(Operand::Const(ConstValue::Bool(true)));
    body.blocks[1].instrs.push(Instr::Assign {
        dst: LocalId::new(0),
        src: Operand::Const(ConstValue::Int(7)),
    });
    BranchFolder.run(&mut body);

    assert_eq!(body.blocks[1].instrs.len(), 1);
}

#[test]
fn empty_bodies_are_tolerated() {
    let mut body = Body::default();
    BranchFolder.run(&mut body);
    assert!(body.blocks.is_empty());
}
