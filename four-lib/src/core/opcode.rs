//! This file defines the instructions, and some utility types and functions.
//! The opcode constants, the arity table and the conversion from and to raw operand
//! fields are generated by the OpCode derive-macro. The order of the variants is the
//! opcode, so it must not be changed.

use derive_more::{Display, From, Into};
use proc_macros::OpCode;
use strum_macros::IntoStaticStr;

use std::fmt;

/// A cell index as it appears in an operand.
///
/// Decoded operands are always in 0..=99, but a Cell can hold any u8, so
/// range checks happen where the tape is accessed, not here.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, From, Into)]
#[display(fmt = "[{}]", _0)]
pub struct Cell(pub u8);

impl Cell {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One decoded instruction. For the arithmetic variants the first cell is the
/// destination, the other two are the operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, OpCode, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Instruction {
    Add(Cell, Cell, Cell),
    Sub(Cell, Cell, Cell),
    Mul(Cell, Cell, Cell),
    /// floor division
    Div(Cell, Cell, Cell),
    Halt,
    /// writes the cell's value as a single byte
    Output(Cell),
    /// stores the literal in the cell
    Set(Cell, u8),
    /// reads a single byte into the cell
    Input(Cell),
    /// jumps past the matching LoopEnd if the cell is zero
    LoopStart(Cell),
    /// jumps back to the matching LoopStart
    LoopEnd,
}

impl Instruction {
    pub fn mnemonic(&self) -> &'static str {
        self.into()
    }

    /// appends the digit encoding of this instruction: opcode digit followed by
    /// one two-digit field per operand
    pub fn encode_into(&self, out: &mut String) {
        out.push(char::from(b'0' + self.opcode()));
        for operand in self.operands() {
            out.push_str(&format!("{:02}", operand));
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;
        write!(f, "{}", self.mnemonic())?;
        match self {
            Add(a, b, c) | Sub(a, b, c) | Mul(a, b, c) | Div(a, b, c) => {
                write!(f, " {} {} {}", a, b, c)
            }
            Output(a) | Input(a) | LoopStart(a) => write!(f, " {}", a),
            Set(a, b) => write!(f, " {} {}", a, b),
            Halt | LoopEnd => Ok(()),
        }
    }
}
