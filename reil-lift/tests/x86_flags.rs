//! Flag algebra of the arithmetic handlers, checked against an independent
//! reference over the boundary values of every operand width.

mod common;

use common::{Canned, Evaluator};
use reil_il::bits::{mask, sign_bit};
use reil_lift::x86::{X86Insn, X86Op, X86Reg};
use reil_lift::{translate_x86, Insn, Operand as Op, X86Options};

struct Width {
    bits: u16,
    x86_64: bool,
    a_reg: X86Reg,
    b_reg: X86Reg,
    a_name: &'static str,
    b_name: &'static str,
}

const WIDTHS: [Width; 4] = [
    Width { bits: 8, x86_64: false, a_reg: X86Reg::Al, b_reg: X86Reg::Bl, a_name: "eax", b_name: "ebx" },
    Width { bits: 16, x86_64: false, a_reg: X86Reg::Ax, b_reg: X86Reg::Bx, a_name: "eax", b_name: "ebx" },
    Width { bits: 32, x86_64: false, a_reg: X86Reg::Eax, b_reg: X86Reg::Ebx, a_name: "eax", b_name: "ebx" },
    Width { bits: 64, x86_64: true, a_reg: X86Reg::Rax, b_reg: X86Reg::Rbx, a_name: "rax", b_name: "rbx" },
];

/// The boundary set: 0, 1, -1, signed min, signed max.
fn boundary_values(bits: u16) -> [u128; 5] {
    [0, 1, mask(bits), sign_bit(bits), sign_bit(bits) - 1]
}

fn lift_one(op: X86Op, mnemonic: &str, width: &Width) -> Vec<reil_il::Instruction> {
    let insn: X86Insn = Insn::new(op, 0x1000, 2, mnemonic, "")
        .with_operands(vec![Op::Reg(width.a_reg), Op::Reg(width.b_reg)]);
    let code = [0u8; 2];
    let opts = X86Options {
        x86_64: width.x86_64,
        use_rip: false,
    };
    let native = translate_x86(Canned::new(vec![insn]), &code, 0x1000, opts)
        .next()
        .unwrap()
        .unwrap();
    native.il
}

fn sign(value: u128, bits: u16) -> bool {
    value & sign_bit(bits) != 0
}

fn parity_even(value: u128) -> bool {
    (value as u8).count_ones() % 2 == 0
}

struct Flags {
    cf: u128,
    of: u128,
    sf: u128,
    zf: u128,
    pf: u128,
}

fn reference_add(a: u128, b: u128, bits: u16) -> (u128, Flags) {
    let r = (a.wrapping_add(b)) & mask(bits);
    let carry = (a.wrapping_add(b) >> bits) & 1;
    let (sa, sb, sr) = (sign(a, bits), sign(b, bits), sign(r, bits));
    (
        r,
        Flags {
            cf: carry,
            of: (sa == sb && sa != sr) as u128,
            sf: sr as u128,
            zf: (r == 0) as u128,
            pf: parity_even(r) as u128,
        },
    )
}

fn reference_sub(a: u128, b: u128, bits: u16) -> (u128, Flags) {
    let r = a.wrapping_sub(b) & mask(bits);
    let (sa, sb, sr) = (sign(a, bits), sign(b, bits), sign(r, bits));
    (
        r,
        Flags {
            cf: (a < b) as u128,
            of: (sa != sb && sr != sa) as u128,
            sf: sr as u128,
            zf: (r == 0) as u128,
            pf: parity_even(r) as u128,
        },
    )
}

fn check_flags(eval: &Evaluator, expected: &Flags, what: &str) {
    assert_eq!(eval.reg("cf"), expected.cf, "cf for {what}");
    assert_eq!(eval.reg("of"), expected.of, "of for {what}");
    assert_eq!(eval.reg("sf"), expected.sf, "sf for {what}");
    assert_eq!(eval.reg("zf"), expected.zf, "zf for {what}");
    assert_eq!(eval.reg("pf"), expected.pf, "pf for {what}");
    assert!(eval.is_undefined("af"), "af for {what}");
}

#[test]
fn add_flags_match_the_reference_at_every_boundary() {
    for width in &WIDTHS {
        let il = lift_one(X86Op::Add, "add", width);

        for a in boundary_values(width.bits) {
            for b in boundary_values(width.bits) {
                let mut eval = Evaluator::new();
                eval.set_reg(width.a_name, a);
                eval.set_reg(width.b_name, b);
                eval.run(&il);

                let (r, expected) = reference_add(a, b, width.bits);
                let what = format!("add {a:#x}, {b:#x} at {} bits", width.bits);
                assert_eq!(eval.reg(width.a_name) & mask(width.bits), r, "{what}");
                check_flags(&eval, &expected, &what);
            }
        }
    }
}

#[test]
fn cmp_flags_match_the_reference_at_every_boundary() {
    for width in &WIDTHS {
        let il = lift_one(X86Op::Cmp, "cmp", width);

        for a in boundary_values(width.bits) {
            for b in boundary_values(width.bits) {
                let mut eval = Evaluator::new();
                eval.set_reg(width.a_name, a);
                eval.set_reg(width.b_name, b);
                eval.run(&il);

                let (_, expected) = reference_sub(a, b, width.bits);
                let what = format!("cmp {a:#x}, {b:#x} at {} bits", width.bits);
                // cmp must not write its operands back
                assert_eq!(eval.reg(width.a_name), a, "{what}");
                check_flags(&eval, &expected, &what);
            }
        }
    }
}

#[test]
fn sub_writes_back_and_sets_flags() {
    for width in &WIDTHS {
        let il = lift_one(X86Op::Sub, "sub", width);

        for a in boundary_values(width.bits) {
            for b in boundary_values(width.bits) {
                let mut eval = Evaluator::new();
                eval.set_reg(width.a_name, a);
                eval.set_reg(width.b_name, b);
                eval.run(&il);

                let (r, expected) = reference_sub(a, b, width.bits);
                let what = format!("sub {a:#x}, {b:#x} at {} bits", width.bits);
                assert_eq!(eval.reg(width.a_name) & mask(width.bits), r, "{what}");
                check_flags(&eval, &expected, &what);
            }
        }
    }
}
