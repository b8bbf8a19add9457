//! Shared test support: a canned disassembler standing in for the upstream
//! oracle, and a miniature REIL evaluator for checking the semantics of
//! emitted blocks.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};

use reil_il::bits::{mask, sign_bit};
use reil_il::{Instruction, Opcode, Operand};
use reil_lift::{Disassembler, Insn};

/// A disassembler that replays pre-decoded records, keyed by address.
pub struct Canned<O, R> {
    insns: VecDeque<Insn<O, R>>,
}

impl<O, R> Canned<O, R> {
    pub fn new(insns: Vec<Insn<O, R>>) -> Self {
        Canned {
            insns: insns.into(),
        }
    }
}

impl<O, R> Disassembler for Canned<O, R> {
    type Op = O;
    type Reg = R;

    fn decode(&mut self, _code: &[u8], address: u64) -> Option<Insn<O, R>> {
        let matches = self
            .insns
            .front()
            .map_or(false, |next| next.address == address);
        match matches {
            true => self.insns.pop_front(),
            false => None,
        }
    }
}

/// How evaluation of a block ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// Execution ran off the end of the block.
    FellThrough,
    /// A jcc left the block for the given target address.
    Jumped(u128),
}

/// Executes REIL blocks over a name-keyed register file and byte-addressed
/// little-endian memory. Only the subset of behaviors the emitted blocks
/// exercise is modeled; anything else panics, which in a test is exactly
/// what we want.
#[derive(Default)]
pub struct Evaluator {
    regs: HashMap<String, u128>,
    mem: HashMap<u64, u8>,
    undefined: HashSet<String>,
}

fn key(op: &Operand) -> String {
    match op {
        Operand::Register(reg) => reg.name.to_string(),
        Operand::Temporary(tmp) => format!("t{:02}", tmp.index),
        other => panic!("{other} does not name a register"),
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_reg(&mut self, name: &str, value: u128) {
        self.regs.insert(name.to_owned(), value);
        self.undefined.remove(name);
    }

    pub fn reg(&self, name: &str) -> u128 {
        assert!(
            !self.undefined.contains(name),
            "{name} is undefined at this point"
        );
        *self.regs.get(name).unwrap_or(&0)
    }

    pub fn is_undefined(&self, name: &str) -> bool {
        self.undefined.contains(name)
    }

    pub fn store(&mut self, address: u64, bytes: &[u8]) {
        for (offset, byte) in bytes.iter().enumerate() {
            self.mem.insert(address + offset as u64, *byte);
        }
    }

    pub fn load(&self, address: u64, len: usize) -> Vec<u8> {
        (0..len)
            .map(|offset| *self.mem.get(&(address + offset as u64)).unwrap_or(&0))
            .collect()
    }

    fn read(&self, op: &Operand) -> u128 {
        match op {
            Operand::Immediate(imm) => imm.value,
            Operand::Register(_) | Operand::Temporary(_) => {
                self.reg(&key(op)) & mask(op.size())
            }
            Operand::Offset(_) => panic!("offsets are not values"),
        }
    }

    fn read_signed(&self, op: &Operand) -> i128 {
        let value = self.read(op);
        let size = op.size();
        if value & sign_bit(size) != 0 {
            (value | !mask(size)) as i128
        } else {
            value as i128
        }
    }

    fn write(&mut self, op: &Operand, value: u128) {
        let name = key(op);
        self.undefined.remove(&name);
        self.regs.insert(name, value & mask(op.size()));
    }

    /// Run `block` to completion, following block-local jumps.
    pub fn run(&mut self, block: &[Instruction]) -> Exit {
        let mut pc = 0usize;
        let mut steps = 0u32;

        while pc < block.len() {
            steps += 1;
            assert!(steps < 100_000, "block did not terminate");

            let i = &block[pc];
            pc += 1;

            let in0 = i.input0.as_ref();
            let in1 = i.input1.as_ref();
            let out = i.output.as_ref();

            match i.opcode {
                Opcode::Add => {
                    let value = self
                        .read(in0.unwrap())
                        .wrapping_add(self.read(in1.unwrap()));
                    self.write(out.unwrap(), value);
                }
                Opcode::Sub => {
                    let value = self
                        .read(in0.unwrap())
                        .wrapping_sub(self.read(in1.unwrap()));
                    self.write(out.unwrap(), value);
                }
                Opcode::Mul => {
                    let value = self
                        .read(in0.unwrap())
                        .wrapping_mul(self.read(in1.unwrap()));
                    self.write(out.unwrap(), value);
                }
                Opcode::Div => {
                    let value = self.read(in0.unwrap()) / self.read(in1.unwrap());
                    self.write(out.unwrap(), value);
                }
                Opcode::Sdiv => {
                    let value = self.read_signed(in0.unwrap()) / self.read_signed(in1.unwrap());
                    self.write(out.unwrap(), value as u128);
                }
                Opcode::Mod => {
                    let value = self.read(in0.unwrap()) % self.read(in1.unwrap());
                    self.write(out.unwrap(), value);
                }
                Opcode::And => {
                    let value = self.read(in0.unwrap()) & self.read(in1.unwrap());
                    self.write(out.unwrap(), value);
                }
                Opcode::Or => {
                    let value = self.read(in0.unwrap()) | self.read(in1.unwrap());
                    self.write(out.unwrap(), value);
                }
                Opcode::Xor => {
                    let value = self.read(in0.unwrap()) ^ self.read(in1.unwrap());
                    self.write(out.unwrap(), value);
                }
                Opcode::Bsh => {
                    let value = self.read(in0.unwrap());
                    let amount = self.read_signed(in1.unwrap());
                    let shifted = if amount >= 0 {
                        value.checked_shl(amount as u32).unwrap_or(0)
                    } else {
                        value.checked_shr(-amount as u32).unwrap_or(0)
                    };
                    self.write(out.unwrap(), shifted);
                }
                Opcode::Lshl => {
                    let value = self.read(in0.unwrap());
                    let amount = self.read(in1.unwrap()).min(u32::MAX as u128) as u32;
                    self.write(out.unwrap(), value.checked_shl(amount).unwrap_or(0));
                }
                Opcode::Lshr => {
                    let value = self.read(in0.unwrap());
                    let amount = self.read(in1.unwrap()).min(u32::MAX as u128) as u32;
                    self.write(out.unwrap(), value.checked_shr(amount).unwrap_or(0));
                }
                Opcode::Ashr => {
                    let value = self.read_signed(in0.unwrap());
                    let amount = self.read(in1.unwrap()).min(127) as u32;
                    self.write(out.unwrap(), (value >> amount) as u128);
                }
                Opcode::Bisz => {
                    let value = self.read(in0.unwrap());
                    self.write(out.unwrap(), (value == 0) as u128);
                }
                Opcode::Bisnz => {
                    let value = self.read(in0.unwrap());
                    self.write(out.unwrap(), (value != 0) as u128);
                }
                Opcode::Equ => {
                    let value = self.read(in0.unwrap()) == self.read(in1.unwrap());
                    self.write(out.unwrap(), value as u128);
                }
                Opcode::Str => {
                    let value = self.read(in0.unwrap());
                    self.write(out.unwrap(), value);
                }
                Opcode::Sex => {
                    let value = self.read_signed(in0.unwrap());
                    self.write(out.unwrap(), value as u128);
                }
                Opcode::Ldm => {
                    let address = self.read(in0.unwrap()) as u64;
                    let out = out.unwrap();
                    let len = out.size() as usize / 8;
                    let mut value = 0u128;
                    for (offset, byte) in self.load(address, len).into_iter().enumerate() {
                        value |= (byte as u128) << (8 * offset);
                    }
                    self.write(out, value);
                }
                Opcode::Stm => {
                    let value = self.read(in0.unwrap());
                    let len = in0.unwrap().size() as usize / 8;
                    let address = self.read(out.unwrap()) as u64;
                    let bytes: Vec<u8> = (0..len).map(|o| (value >> (8 * o)) as u8).collect();
                    self.store(address, &bytes);
                }
                Opcode::Jcc => {
                    if self.read(in0.unwrap()) != 0 {
                        match out.unwrap() {
                            Operand::Offset(off) => pc = off.offset as usize,
                            target => return Exit::Jumped(self.read(target)),
                        }
                    }
                }
                Opcode::Undef => {
                    self.undefined.insert(key(out.unwrap()));
                }
                Opcode::Nop | Opcode::Unkn | Opcode::Sys => {}
            }
        }
        Exit::FellThrough
    }
}
