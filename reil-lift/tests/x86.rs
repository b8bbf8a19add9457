mod common;

use common::{Canned, Evaluator, Exit};
use reil_il::{Instruction, Opcode, Operand};
use reil_lift::x86::{X86Insn, X86Op, X86Reg};
use reil_lift::{translate_x86, Groups, Insn, MemOperand, NativeInstruction, X86Options};

use reil_lift::Operand as Op;

fn lift32(insns: Vec<X86Insn>, code_len: usize, base: u64) -> Vec<NativeInstruction> {
    let code = vec![0u8; code_len];
    translate_x86(Canned::new(insns), &code, base, X86Options::default())
        .map(|r| r.unwrap())
        .collect()
}

fn lift64(insns: Vec<X86Insn>, code_len: usize, base: u64) -> Vec<NativeInstruction> {
    let code = vec![0u8; code_len];
    let opts = X86Options {
        x86_64: true,
        use_rip: false,
    };
    translate_x86(Canned::new(insns), &code, base, opts)
        .map(|r| r.unwrap())
        .collect()
}

fn texts(block: &[Instruction]) -> Vec<String> {
    block.iter().map(|i| i.to_string()).collect()
}

/// Temporary indices must appear in first-use order with no gaps.
fn assert_dense_temporaries(block: &[Instruction]) {
    let mut next = 0u16;
    for i in block {
        for op in [&i.input0, &i.input1, &i.output].into_iter().flatten() {
            if let Operand::Temporary(tmp) = op {
                assert!(tmp.index <= next, "temporary t{:02} out of order", tmp.index);
                if tmp.index == next {
                    next += 1;
                }
            }
        }
    }
}

/// No label survives finalisation: every jcc target is an immediate, a
/// register, or an in-range offset.
fn assert_resolved_targets(block: &[Instruction]) {
    for i in block {
        if i.opcode == Opcode::Jcc {
            match i.output.as_ref().unwrap() {
                Operand::Offset(off) => {
                    assert!((off.offset as usize) < block.len());
                }
                Operand::Immediate(_) | Operand::Register(_) | Operand::Temporary(_) => {}
            }
        }
    }
}

#[test]
fn mov_rax_rdi_is_a_single_str() {
    // 48 89 f8  mov rax, rdi
    let insns = vec![Insn::new(X86Op::Mov, 0x1000, 3, "mov", "rax, rdi")
        .with_operands(vec![Op::Reg(X86Reg::Rax), Op::Reg(X86Reg::Rdi)])];

    let blocks = lift64(insns, 3, 0x1000);
    assert_eq!(blocks.len(), 1);

    let native = &blocks[0];
    assert_eq!(native.mnemonic, "mov rax, rdi");
    assert_eq!(native.size, 3);
    assert!(!native.ends_basic_block);
    assert_eq!(texts(&native.il), vec!["str (rdi, 64), (rax, 64)"]);
}

#[test]
fn add_eax_imm_computes_flags_and_truncates() {
    // 05 01 00 00 00  add eax, 1
    let insns = vec![Insn::new(X86Op::Add, 0x1000, 5, "add", "eax, 1")
        .with_operands(vec![Op::Reg(X86Reg::Eax), Op::Imm(1)])];

    let blocks = lift32(insns, 5, 0x1000);
    let il = &blocks[0].il;
    assert_dense_temporaries(il);
    assert_resolved_targets(il);

    let il_text = texts(il);
    // the byte immediate is sign-extended, added into a double-width
    // temporary, and the low half written back
    assert_eq!(il_text[0], "sex (1, 8), (t00, 32)");
    assert_eq!(il_text[1], "add (eax, 32), (t00, 32), (t01, 64)");
    assert_eq!(il_text.last().unwrap(), "str (t13, 32), (eax, 32)");

    // flag order: of, sf, zf, cf, pf, then af marked undefined
    let flag_writes: Vec<&str> = il
        .iter()
        .filter_map(|i| match (&i.opcode, &i.output) {
            (Opcode::Bisz | Opcode::Bisnz | Opcode::And | Opcode::Undef, Some(Operand::Register(r)))
                if r.size == 8 =>
            {
                Some(&*r.name)
            }
            _ => None,
        })
        .collect();
    assert_eq!(flag_writes, vec!["of", "sf", "zf", "cf", "pf", "af"]);

    // 0x7fffffff + 1 overflows into the sign bit
    let mut eval = Evaluator::new();
    eval.set_reg("eax", 0x7fff_ffff);
    assert_eq!(eval.run(il), Exit::FellThrough);
    assert_eq!(eval.reg("eax"), 0x8000_0000);
    assert_eq!(eval.reg("of"), 1);
    assert_eq!(eval.reg("sf"), 1);
    assert_eq!(eval.reg("zf"), 0);
    assert_eq!(eval.reg("cf"), 0);
    assert_eq!(eval.reg("pf"), 1);
    assert!(eval.is_undefined("af"));

    // 0xffffffff + 1 wraps to zero with carry out
    let mut eval = Evaluator::new();
    eval.set_reg("eax", 0xffff_ffff);
    eval.run(il);
    assert_eq!(eval.reg("eax"), 0);
    assert_eq!(eval.reg("zf"), 1);
    assert_eq!(eval.reg("cf"), 1);
    assert_eq!(eval.reg("of"), 0);
}

#[test]
fn call_pushes_return_address_and_ends_the_block() {
    // e8 00 00 00 00  call 0x1005
    let insns = vec![
        Insn::new(X86Op::Call, 0x1000, 5, "call", "0x1005")
            .with_operands(vec![Op::Imm(0x1005)]),
        // unreachable: the driver must stop at the call
        Insn::new(X86Op::Nop, 0x1005, 1, "nop", ""),
    ];

    let blocks = lift32(insns, 6, 0x1000);
    assert_eq!(blocks.len(), 1, "the stream must stop at a block end");

    let native = &blocks[0];
    assert!(native.ends_basic_block);
    assert_eq!(
        texts(&native.il),
        vec![
            "sub (esp, 32), (4, 32), (esp, 32)",
            "stm (4101, 32), (esp, 32)",
            "jcc (1, 8), (4101, 32)",
        ]
    );

    // the pushed value is the address of the next instruction
    let mut eval = Evaluator::new();
    eval.set_reg("esp", 0x9000);
    assert_eq!(eval.run(&native.il), Exit::Jumped(0x1005));
    assert_eq!(eval.reg("esp"), 0x9000 - 4);
    assert_eq!(eval.load(0x9000 - 4, 4), vec![0x05, 0x10, 0x00, 0x00]);
}

fn rep_movsb() -> Vec<X86Insn> {
    vec![Insn::new(X86Op::Movsb, 0x2000, 2, "rep movsb", "byte ptr es:[edi], byte ptr [esi]")
        .with_operands(vec![
            Op::Mem(MemOperand::base(X86Reg::Edi)),
            Op::Mem(MemOperand::base(X86Reg::Esi)),
        ])]
}

#[test]
fn rep_movsb_loops_in_place() {
    let blocks = lift32(rep_movsb(), 2, 0x2000);
    let il = &blocks[0].il;
    assert_resolved_targets(il);

    let il_text = texts(il);
    // prologue: a zero counter skips to the next native instruction
    assert_eq!(il_text[0], "bisz (ecx, 32), (t01, 8)");
    assert_eq!(il_text[1], "jcc (t01, 8), (8194, 32)");
    // epilogue: decrement, test, and loop back to the block start
    assert_eq!(il_text[il_text.len() - 3], "sub (ecx, 32), (1, 32), (ecx, 32)");
    assert_eq!(il_text[il_text.len() - 2], "bisnz (ecx, 32), (t02, 8)");
    assert_eq!(il_text[il_text.len() - 1], "jcc (t02, 8), (.00, 8)");
}

#[test]
fn rep_movsb_with_zero_counter_skips_the_body() {
    let blocks = lift32(rep_movsb(), 2, 0x2000);

    let mut eval = Evaluator::new();
    eval.set_reg("ecx", 0);
    eval.set_reg("esi", 0x100);
    eval.set_reg("edi", 0x200);
    eval.store(0x100, &[0xaa]);

    assert_eq!(eval.run(&blocks[0].il), Exit::Jumped(0x2002));
    assert_eq!(eval.load(0x200, 1), vec![0x00], "the body must not run");
}

#[test]
fn rep_movsb_copies_counter_bytes() {
    let blocks = lift32(rep_movsb(), 2, 0x2000);

    let mut eval = Evaluator::new();
    eval.set_reg("ecx", 3);
    eval.set_reg("esi", 0x100);
    eval.set_reg("edi", 0x200);
    eval.set_reg("df", 0);
    eval.store(0x100, &[0x11, 0x22, 0x33]);

    assert_eq!(eval.run(&blocks[0].il), Exit::FellThrough);
    assert_eq!(eval.load(0x200, 3), vec![0x11, 0x22, 0x33]);
    assert_eq!(eval.reg("ecx"), 0);
    assert_eq!(eval.reg("esi"), 0x103);
    assert_eq!(eval.reg("edi"), 0x203);
}

#[test]
fn dword_writes_zero_extend_to_the_full_register() {
    // mov eax, 0xdeadbeef in 64-bit mode
    let insns = vec![Insn::new(X86Op::Mov, 0x1000, 5, "mov", "eax, 0xdeadbeef")
        .with_operands(vec![Op::Reg(X86Reg::Eax), Op::Imm(0xdead_beef)])];

    let blocks = lift64(insns, 5, 0x1000);

    let mut eval = Evaluator::new();
    eval.set_reg("rax", 0x1122_3344_5566_7788);
    eval.run(&blocks[0].il);
    assert_eq!(eval.reg("rax"), 0x0000_0000_dead_beef);
}

#[test]
fn high_byte_writes_splice_without_disturbing_neighbours() {
    // mov ah, 0x42 in 64-bit mode
    let insns = vec![Insn::new(X86Op::Mov, 0x1000, 2, "mov", "ah, 0x42")
        .with_operands(vec![Op::Reg(X86Reg::Ah), Op::Imm(0x42)])];

    let blocks = lift64(insns, 2, 0x1000);

    let mut eval = Evaluator::new();
    eval.set_reg("rax", 0x1122_3344_5566_7788);
    eval.run(&blocks[0].il);
    assert_eq!(eval.reg("rax"), 0x1122_3344_5566_4288);
}

#[test]
fn word_writes_preserve_the_upper_half() {
    // mov ax, 0x1234 in 32-bit mode; the high half of eax survives
    let insns = vec![Insn::new(X86Op::Mov, 0x1000, 4, "mov", "ax, 0x1234")
        .with_operands(vec![Op::Reg(X86Reg::Ax), Op::Imm(0x1234)])];

    let blocks = lift32(insns, 4, 0x1000);

    let mut eval = Evaluator::new();
    eval.set_reg("eax", 0xaabb_ccdd);
    eval.run(&blocks[0].il);
    assert_eq!(eval.reg("eax"), 0xaabb_1234);
}

#[test]
fn jump_group_ends_the_basic_block() {
    let insns = vec![
        Insn::new(X86Op::Jne, 0x1000, 2, "jne", "0x1010")
            .with_operands(vec![Op::Imm(0x1010)])
            .with_groups(Groups::JUMP),
        Insn::new(X86Op::Nop, 0x1002, 1, "nop", ""),
    ];

    let blocks = lift32(insns, 3, 0x1000);
    assert_eq!(blocks.len(), 1);
    assert!(blocks[0].ends_basic_block);

    // jne jumps exactly when zf is clear
    let mut eval = Evaluator::new();
    eval.set_reg("zf", 0);
    assert_eq!(eval.run(&blocks[0].il), Exit::Jumped(0x1010));

    let mut eval = Evaluator::new();
    eval.set_reg("zf", 1);
    assert_eq!(eval.run(&blocks[0].il), Exit::FellThrough);
}

#[test]
fn setg_evaluates_the_signed_greater_predicate() {
    let insns = vec![Insn::new(X86Op::Setg, 0x1000, 3, "setg", "al")
        .with_operands(vec![Op::Reg(X86Reg::Al)])];

    let blocks = lift32(insns, 3, 0x1000);
    let il = &blocks[0].il;

    for (zf, sf, of, expected) in [
        (0, 0, 0, 1),
        (0, 1, 1, 1),
        (1, 0, 0, 0),
        (0, 1, 0, 0),
        (0, 0, 1, 0),
    ] {
        let mut eval = Evaluator::new();
        eval.set_reg("zf", zf);
        eval.set_reg("sf", sf);
        eval.set_reg("of", of);
        eval.set_reg("eax", 0xffff_ff00);
        eval.run(il);
        assert_eq!(eval.reg("eax") & 0xff, expected, "zf={zf} sf={sf} of={of}");
    }
}

#[test]
fn ret_pops_into_a_temporary_and_jumps_there() {
    let insns = vec![Insn::new(X86Op::Ret, 0x1000, 1, "ret", "")];

    let blocks = lift32(insns, 1, 0x1000);
    assert!(blocks[0].ends_basic_block);

    let mut eval = Evaluator::new();
    eval.set_reg("esp", 0x9000);
    eval.store(0x9000, &[0x44, 0x33, 0x22, 0x11]);
    assert_eq!(eval.run(&blocks[0].il), Exit::Jumped(0x1122_3344));
    assert_eq!(eval.reg("esp"), 0x9004);
}

#[test]
fn memory_operands_compute_base_index_scale_displacement() {
    // mov eax, dword ptr [ebx + esi*4 + 8]
    let insns = vec![Insn::new(
        X86Op::Mov,
        0x1000,
        3,
        "mov",
        "eax, dword ptr [ebx + esi*4 + 8]",
    )
    .with_operands(vec![
        Op::Reg(X86Reg::Eax),
        Op::Mem(MemOperand {
            segment: None,
            base: Some(X86Reg::Ebx),
            index: Some(X86Reg::Esi),
            scale: 4,
            disp: 8,
        }),
    ])];

    let blocks = lift32(insns, 3, 0x1000);

    let mut eval = Evaluator::new();
    eval.set_reg("ebx", 0x1000);
    eval.set_reg("esi", 3);
    eval.store(0x1000 + 8 + 12, &[0x78, 0x56, 0x34, 0x12]);
    eval.run(&blocks[0].il);
    assert_eq!(eval.reg("eax"), 0x1234_5678);
}

#[test]
fn unmodeled_instructions_become_a_single_unkn() {
    let insns = vec![Insn::new(X86Op::Fsin, 0x1000, 2, "fsin", "")];

    let blocks = lift32(insns, 2, 0x1000);
    assert_eq!(texts(&blocks[0].il), vec!["unkn"]);
}

#[test]
fn xchg_swaps_register_values() {
    let insns = vec![Insn::new(X86Op::Xchg, 0x1000, 2, "xchg", "eax, ebx")
        .with_operands(vec![Op::Reg(X86Reg::Eax), Op::Reg(X86Reg::Ebx)])];

    let blocks = lift32(insns, 2, 0x1000);

    let mut eval = Evaluator::new();
    eval.set_reg("eax", 7);
    eval.set_reg("ebx", 9);
    eval.run(&blocks[0].il);
    assert_eq!(eval.reg("eax"), 9);
    assert_eq!(eval.reg("ebx"), 7);
}

#[test]
fn every_block_round_trips_through_the_text_form() {
    let insns = vec![Insn::new(X86Op::Add, 0x1000, 5, "add", "eax, 1")
        .with_operands(vec![Op::Reg(X86Reg::Eax), Op::Imm(1)])];

    for native in lift32(insns, 5, 0x1000) {
        for instruction in &native.il {
            let text = instruction.to_string();
            let parsed: Instruction = text.parse().unwrap();
            assert_eq!(&parsed, instruction, "{text}");
        }
    }
}
