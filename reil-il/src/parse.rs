//! Parsing of the stable textual form.
//!
//! The printable form produced by the `Display` impls is the interchange
//! format analysis tooling stores and diffs; this module makes it
//! round-trip.

use core::fmt;
use std::borrow::Cow;
use std::str::FromStr;

use crate::{Immediate, Instruction, Offset, Opcode, Operand, Register, Temporary};

/// Error produced when parsing the textual form of an instruction or
/// operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    message: String,
}

impl ParseError {
    fn new(message: impl Into<String>) -> Self {
        ParseError {
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed REIL text: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

impl FromStr for Operand {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .ok_or_else(|| ParseError::new(format!("operand {s:?} is not parenthesised")))?;
        let (name, size) = inner
            .split_once(", ")
            .ok_or_else(|| ParseError::new(format!("operand {s:?} has no size field")))?;
        let size: u16 = size
            .parse()
            .map_err(|_| ParseError::new(format!("bad operand size {size:?}")))?;

        if let Some(hex) = name.strip_prefix('.') {
            let offset = u8::from_str_radix(hex, 16)
                .map_err(|_| ParseError::new(format!("bad offset {name:?}")))?;
            return Ok(Operand::Offset(Offset::new(offset)));
        }
        if name.bytes().all(|b| b.is_ascii_digit()) {
            let value: u128 = name
                .parse()
                .map_err(|_| ParseError::new(format!("bad immediate {name:?}")))?;
            return Ok(Operand::Immediate(Immediate::new(value, size)));
        }
        if let Some(index) = name.strip_prefix('t') {
            if index.bytes().all(|b| b.is_ascii_digit()) {
                let index: u16 = index
                    .parse()
                    .map_err(|_| ParseError::new(format!("bad temporary {name:?}")))?;
                return Ok(Operand::Temporary(Temporary::new(index, size)));
            }
        }
        Ok(Operand::Register(Register {
            name: Cow::Owned(name.to_owned()),
            size,
        }))
    }
}

impl FromStr for Instruction {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (mnemonic, rest) = match s.split_once(' ') {
            Some((mnemonic, rest)) => (mnemonic, Some(rest)),
            None => (s, None),
        };
        let opcode = Opcode::from_str(mnemonic)
            .map_err(|_| ParseError::new(format!("unknown opcode {mnemonic:?}")))?;

        let mut operands = Vec::new();
        if let Some(rest) = rest {
            for part in rest.split(", (") {
                let part = if part.starts_with('(') {
                    part.to_owned()
                } else {
                    format!("({part}")
                };
                operands.push(part.parse::<Operand>()?);
            }
        }

        let mut operands = operands.into_iter();
        let (input0, input1, output) = match (opcode, operands.len()) {
            (_, 3) => (operands.next(), operands.next(), operands.next()),
            (Opcode::Sys, 1) => (operands.next(), None, None),
            (Opcode::Undef, 1) => (None, None, operands.next()),
            (_, 2) => (operands.next(), None, operands.next()),
            (_, 0) => (None, None, None),
            (_, n) => {
                return Err(ParseError::new(format!(
                    "{n} operands do not fit the slots of {opcode}"
                )))
            }
        };
        Ok(Instruction::new(opcode, input0, input1, output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shorthand::*;
    use rstest::rstest;

    #[rstest]
    #[case("(1, 8)")]
    #[case("(rax, 64)")]
    #[case("(t07, 128)")]
    #[case("(.1f, 8)")]
    fn operand_round_trip(#[case] text: &str) {
        let operand: Operand = text.parse().unwrap();
        assert_eq!(operand.to_string(), text);
    }

    #[test]
    fn instruction_round_trip() {
        let samples = vec![
            nop_(),
            unkn_(),
            sys_(Some(Immediate::new(3, 8))),
            undef_(Register::new("af", 8)),
            str_(Register::new("rdi", 64), Register::new("rax", 64)),
            add_(
                Register::new("eax", 32),
                Immediate::new(1, 32),
                Temporary::new(0, 64),
            ),
            jcc_(Immediate::new(1, 8), Offset::new(4)),
            stm_(Temporary::new(1, 32), Register::new("esp", 32)),
        ];
        for instruction in samples {
            let text = instruction.to_string();
            assert_eq!(text.parse::<Instruction>().unwrap(), instruction, "{text}");
        }
    }
}
