mod common;

use common::{Canned, Evaluator, Exit};
use reil_il::Instruction;
use reil_lift::arm64::{Arm64Insn, Arm64Op, Arm64Reg};
use reil_lift::{
    translate_arm64, Arm64Condition, Groups, Insn, MemOperand, NativeInstruction, Operand as Op,
};

fn lift(insns: Vec<Arm64Insn>, code_len: usize, base: u64) -> Vec<NativeInstruction> {
    let code = vec![0u8; code_len];
    translate_arm64(Canned::new(insns), &code, base)
        .map(|r| r.unwrap())
        .collect()
}

fn texts(block: &[Instruction]) -> Vec<String> {
    block.iter().map(|i| i.to_string()).collect()
}

#[test]
fn cmp_sets_nzcv_and_never_writes_back() {
    // 1f 00 00 eb  cmp x0, x0
    let insns = vec![Insn::new(Arm64Op::Cmp, 0x40_0000, 4, "cmp", "x0, x0")
        .with_operands(vec![Op::Reg(Arm64Reg::X0), Op::Reg(Arm64Reg::X0)])
        .with_update_flags()];

    let blocks = lift(insns, 4, 0x40_0000);
    assert_eq!(blocks.len(), 1);

    let il = &blocks[0].il;
    assert_eq!(texts(il)[0], "sub (x0, 64), (x0, 64), (t00, 128)");

    let mut eval = Evaluator::new();
    eval.set_reg("x0", 5);
    eval.run(il);
    assert_eq!(eval.reg("x0"), 5, "cmp must not write a register back");
    assert_eq!(eval.reg("z"), 1);
    assert_eq!(eval.reg("n"), 0);
    assert_eq!(eval.reg("c"), 0);
    assert_eq!(eval.reg("v"), 0);
}

#[test]
fn writes_to_the_zero_registers_are_discarded() {
    for zero in [Arm64Reg::Xzr, Arm64Reg::Wzr] {
        let insns = vec![Insn::new(Arm64Op::Mov, 0x40_0000, 4, "mov", "zr, x1")
            .with_operands(vec![Op::Reg(zero), Op::Reg(Arm64Reg::X1)])];

        let blocks = lift(insns, 4, 0x40_0000);
        assert!(
            blocks[0].il.is_empty(),
            "a write to {zero:?} must produce no il"
        );
    }
}

#[test]
fn the_zero_registers_read_as_zero() {
    let insns = vec![Insn::new(Arm64Op::Mov, 0x40_0000, 4, "mov", "x0, xzr")
        .with_operands(vec![Op::Reg(Arm64Reg::X0), Op::Reg(Arm64Reg::Xzr)])];

    let blocks = lift(insns, 4, 0x40_0000);

    let mut eval = Evaluator::new();
    eval.set_reg("x0", 0xdead);
    eval.run(&blocks[0].il);
    assert_eq!(eval.reg("x0"), 0);
}

#[test]
fn w_register_writes_zero_extend_into_the_x_parent() {
    let insns = vec![Insn::new(Arm64Op::Mov, 0x40_0000, 4, "mov", "w0, #5")
        .with_operands(vec![Op::Reg(Arm64Reg::W0), Op::Imm(5)])];

    let blocks = lift(insns, 4, 0x40_0000);

    let mut eval = Evaluator::new();
    eval.set_reg("x0", 0xffff_ffff_ffff_ffff);
    eval.run(&blocks[0].il);
    assert_eq!(eval.reg("x0"), 5);
}

#[test]
fn conditional_branch_evaluates_the_condition_code() {
    let insns = vec![Insn::new(Arm64Op::B, 0x40_0000, 4, "b.eq", "#0x400100")
        .with_operands(vec![Op::Imm(0x40_0100)])
        .with_cc(Arm64Condition::Eq)
        .with_groups(Groups::JUMP)];

    let blocks = lift(insns, 4, 0x40_0000);
    assert!(blocks[0].ends_basic_block);

    let mut eval = Evaluator::new();
    eval.set_reg("z", 1);
    assert_eq!(eval.run(&blocks[0].il), Exit::Jumped(0x40_0100));

    let mut eval = Evaluator::new();
    eval.set_reg("z", 0);
    assert_eq!(eval.run(&blocks[0].il), Exit::FellThrough);
}

#[test]
fn inverted_condition_codes_negate_the_base_predicate() {
    let insns = vec![Insn::new(Arm64Op::B, 0x40_0000, 4, "b.ne", "#0x400100")
        .with_operands(vec![Op::Imm(0x40_0100)])
        .with_cc(Arm64Condition::Ne)
        .with_groups(Groups::JUMP)];

    let blocks = lift(insns, 4, 0x40_0000);

    let mut eval = Evaluator::new();
    eval.set_reg("z", 0);
    assert_eq!(eval.run(&blocks[0].il), Exit::Jumped(0x40_0100));

    let mut eval = Evaluator::new();
    eval.set_reg("z", 1);
    assert_eq!(eval.run(&blocks[0].il), Exit::FellThrough);
}

#[test]
fn stp_stores_the_pair_with_writeback() {
    // stp x0, x1, [sp, #-16]!
    let insns = vec![Insn::new(Arm64Op::Stp, 0x40_0000, 4, "stp", "x0, x1, [sp, #-16]!")
        .with_operands(vec![
            Op::Reg(Arm64Reg::X0),
            Op::Reg(Arm64Reg::X1),
            Op::Mem(MemOperand::base_disp(Arm64Reg::Sp, -16)),
        ])
        .with_writeback()];

    let blocks = lift(insns, 4, 0x40_0000);

    let mut eval = Evaluator::new();
    eval.set_reg("sp", 0x1000);
    eval.set_reg("x0", 0x1111_1111_1111_1111);
    eval.set_reg("x1", 0x2222_2222_2222_2222);
    eval.run(&blocks[0].il);

    // the first register lands at the lower address
    assert_eq!(eval.load(0x1000 - 16, 8), vec![0x11; 8]);
    assert_eq!(eval.load(0x1000 - 8, 8), vec![0x22; 8]);
    assert_eq!(eval.reg("sp"), 0x1000 - 16);
}

#[test]
fn mrs_leaves_its_destination_undefined() {
    let insns = vec![Insn::new(Arm64Op::Mrs, 0x40_0000, 4, "mrs", "x0, tpidr_el0")
        .with_operands(vec![Op::Reg(Arm64Reg::X0)])];

    let blocks = lift(insns, 4, 0x40_0000);
    assert_eq!(texts(&blocks[0].il), vec!["undef (x0, 64)"]);

    let mut eval = Evaluator::new();
    eval.set_reg("x0", 7);
    eval.run(&blocks[0].il);
    assert!(eval.is_undefined("x0"));
}

#[test]
fn str_stores_through_the_memory_operand() {
    let insns = vec![Insn::new(Arm64Op::Str, 0x40_0000, 4, "str", "x0, [sp, #8]")
        .with_operands(vec![
            Op::Reg(Arm64Reg::X0),
            Op::Mem(MemOperand::base_disp(Arm64Reg::Sp, 8)),
        ])];

    let blocks = lift(insns, 4, 0x40_0000);

    let mut eval = Evaluator::new();
    eval.set_reg("sp", 0x2000);
    eval.set_reg("x0", 0x0807_0605_0403_0201);
    eval.run(&blocks[0].il);
    assert_eq!(
        eval.load(0x2008, 8),
        vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]
    );
}
