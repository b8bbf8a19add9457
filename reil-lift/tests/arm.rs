mod common;

use common::{Canned, Evaluator, Exit};
use reil_il::Instruction;
use reil_lift::arm::{ArmInsn, ArmOp, ArmReg};
use reil_lift::{translate_arm, Groups, Insn, NativeInstruction, Operand as Op};

fn lift(insns: Vec<ArmInsn>, code_len: usize, base: u64, thumb: bool) -> Vec<NativeInstruction> {
    let code = vec![0u8; code_len];
    translate_arm(Canned::new(insns), &code, base, thumb)
        .map(|r| r.unwrap())
        .collect()
}

fn texts(block: &[Instruction]) -> Vec<String> {
    block.iter().map(|i| i.to_string()).collect()
}

#[test]
fn add_immediate_widens_then_truncates() {
    // 04 00 81 e2  add r0, r1, #4
    let insns = vec![Insn::new(ArmOp::Add, 0x8000, 4, "add", "r0, r1, #4")
        .with_operands(vec![
            Op::Reg(ArmReg::R0),
            Op::Reg(ArmReg::R1),
            Op::Imm(4),
        ])];

    let blocks = lift(insns, 4, 0x8000, false);
    assert_eq!(blocks.len(), 1);
    assert_eq!(
        texts(&blocks[0].il),
        vec![
            "add (r1, 32), (4, 32), (t00, 64)",
            "str (t00, 64), (r0, 32)",
        ]
    );

    let mut eval = Evaluator::new();
    eval.set_reg("r1", 0xffff_fffe);
    eval.run(&blocks[0].il);
    assert_eq!(eval.reg("r0"), 2, "the result wraps at 32 bits");
}

#[test]
fn flag_updating_add_sets_nzcv() {
    let insns = vec![Insn::new(ArmOp::Add, 0x8000, 4, "adds", "r0, r1, r2")
        .with_operands(vec![
            Op::Reg(ArmReg::R0),
            Op::Reg(ArmReg::R1),
            Op::Reg(ArmReg::R2),
        ])
        .with_update_flags()];

    let blocks = lift(insns, 4, 0x8000, false);

    let mut eval = Evaluator::new();
    eval.set_reg("r1", 0xffff_ffff);
    eval.set_reg("r2", 1);
    eval.run(&blocks[0].il);
    assert_eq!(eval.reg("r0"), 0);
    assert_eq!(eval.reg("z"), 1);
    assert_eq!(eval.reg("c"), 1);
    assert_eq!(eval.reg("n"), 0);
    assert_eq!(eval.reg("v"), 0);

    let mut eval = Evaluator::new();
    eval.set_reg("r1", 0x7fff_ffff);
    eval.set_reg("r2", 1);
    eval.run(&blocks[0].il);
    assert_eq!(eval.reg("n"), 1);
    assert_eq!(eval.reg("v"), 1);
    assert_eq!(eval.reg("z"), 0);
}

#[test]
fn cmp_updates_flags_without_writeback() {
    let insns = vec![Insn::new(ArmOp::Cmp, 0x8000, 4, "cmp", "r0, r1")
        .with_operands(vec![Op::Reg(ArmReg::R0), Op::Reg(ArmReg::R1)])
        .with_update_flags()];

    let blocks = lift(insns, 4, 0x8000, false);

    let mut eval = Evaluator::new();
    eval.set_reg("r0", 3);
    eval.set_reg("r1", 3);
    eval.run(&blocks[0].il);
    assert_eq!(eval.reg("r0"), 3);
    assert_eq!(eval.reg("z"), 1);
}

#[test]
fn movt_replaces_only_the_high_half() {
    let insns = vec![Insn::new(ArmOp::Movt, 0x8000, 4, "movt", "r0, #0x1234")
        .with_operands(vec![Op::Reg(ArmReg::R0), Op::Imm(0x1234)])];

    let blocks = lift(insns, 4, 0x8000, false);

    let mut eval = Evaluator::new();
    eval.set_reg("r0", 0xaaaa_5678);
    eval.run(&blocks[0].il);
    assert_eq!(eval.reg("r0"), 0x1234_5678);
}

#[test]
fn branch_ends_the_basic_block() {
    let insns = vec![
        Insn::new(ArmOp::B, 0x8000, 4, "b", "#0x8100")
            .with_operands(vec![Op::Imm(0x8100)])
            .with_groups(Groups::JUMP),
        Insn::new(ArmOp::Mov, 0x8004, 4, "mov", "r0, r1")
            .with_operands(vec![Op::Reg(ArmReg::R0), Op::Reg(ArmReg::R1)]),
    ];

    let blocks = lift(insns, 8, 0x8000, false);
    assert_eq!(blocks.len(), 1);
    assert!(blocks[0].ends_basic_block);

    let mut eval = Evaluator::new();
    assert_eq!(eval.run(&blocks[0].il), Exit::Jumped(0x8100));
}

#[test]
fn blx_in_thumb_mode_sets_the_link_bit() {
    let insns = vec![Insn::new(ArmOp::Blx, 0x8000, 2, "blx", "r3")
        .with_operands(vec![Op::Reg(ArmReg::R3)])];

    let blocks = lift(insns, 2, 0x8000, true);

    let mut eval = Evaluator::new();
    eval.set_reg("pc", 0x8004);
    eval.set_reg("r3", 0x9000);
    assert_eq!(eval.run(&blocks[0].il), Exit::Jumped(0x9000));
    assert_eq!(eval.reg("lr"), 0x8004 | 1);
}

#[test]
fn push_stores_each_register_below_the_stack_pointer() {
    let insns = vec![Insn::new(ArmOp::Push, 0x8000, 4, "push", "{r0, r1}")
        .with_operands(vec![Op::Reg(ArmReg::R0), Op::Reg(ArmReg::R1)])];

    let blocks = lift(insns, 4, 0x8000, false);

    let mut eval = Evaluator::new();
    eval.set_reg("sp", 0x1000);
    eval.set_reg("r0", 0x11111111);
    eval.set_reg("r1", 0x22222222);
    eval.run(&blocks[0].il);
    assert_eq!(eval.reg("sp"), 0x1000 - 8);
    assert_eq!(eval.load(0x1000 - 4, 4), vec![0x11; 4]);
    assert_eq!(eval.load(0x1000 - 8, 4), vec![0x22; 4]);
}

#[test]
fn str_stores_the_register_through_the_memory_operand() {
    use reil_lift::MemOperand;

    let insns = vec![Insn::new(ArmOp::Str, 0x8000, 4, "str", "r0, [r1, #8]")
        .with_operands(vec![
            Op::Reg(ArmReg::R0),
            Op::Mem(MemOperand::base_disp(ArmReg::R1, 8)),
        ])];

    let blocks = lift(insns, 4, 0x8000, false);

    let mut eval = Evaluator::new();
    eval.set_reg("r0", 0xcafe_f00d);
    eval.set_reg("r1", 0x2000);
    eval.run(&blocks[0].il);
    assert_eq!(eval.load(0x2008, 4), vec![0x0d, 0xf0, 0xfe, 0xca]);
}
