//! Turns program text into a [`Program`].
//!
//! Loading happens in two steps. First the whitespace free text is matched against
//! the grammar, which yields the digit body. Then the body is decoded in a single pass:
//! a character cursor walks the digits, reading an opcode digit and as many two digit
//! operand fields as the opcode's arity demands, while a separate counter numbers the
//! instructions and the loop table is built alongside.

use thiserror::Error;

use crate::core::*;
use crate::parser::{self, PestError};
use crate::utils::bug;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("program must begin with '3.' and end with '4'\n{0}")]
    Syntax(Box<PestError>),

    #[error("unbalanced loop end at instruction {index}")]
    UnbalancedLoopEnd { index: usize },

    #[error("unbalanced loop start at instruction {index}")]
    UnbalancedLoopStart { index: usize },

    #[error("truncated operand of instruction {index} (opcode {opcode}) at digit {cursor}")]
    Truncated {
        index: usize,
        opcode: u8,
        cursor: usize,
    },

    #[error("expected a digit at position {position}, found {found:?}")]
    InvalidDigit { position: usize, found: char },
}

impl From<PestError> for LoadError {
    fn from(value: PestError) -> Self {
        LoadError::Syntax(Box::new(value))
    }
}

pub type LoadResult<T> = Result<T, LoadError>;

/// strips all whitespace from src, validates it and decodes the digit body
pub fn load(src: &str) -> LoadResult<Program> {
    let cleaned = parser::strip_whitespace(src);
    let digits = parser::program_body(&cleaned)?;
    log::debug!("program body has {} digits", digits.len());
    decode(digits)
}

/// decodes a digit stream, i.e. the part between "3." and the final "4"
pub fn decode(digits: &str) -> LoadResult<Program> {
    let mut stream = DigitStream::new(digits);
    let mut loops = LoopTableBuilder::default();
    let mut instructions = vec![];
    let mut index = 0usize;

    while let Some(opcode) = stream.next_digit()? {
        let Some(arity) = Instruction::arity_of(opcode) else {
            bug!("opcode {} has no arity", opcode);
        };
        let mut fields = Vec::with_capacity(arity);
        for _ in 0..arity {
            let cursor = stream.cursor;
            let field = stream.operand()?.ok_or(LoadError::Truncated {
                index,
                opcode,
                cursor,
            })?;
            fields.push(field);
        }
        let Some(instruction) = Instruction::from_fields(opcode, &fields) else {
            bug!("opcode {} rejected its own arity", opcode);
        };
        log::trace!("decoded {}: {}", index, instruction);

        loops.visit(index, &instruction)?;
        instructions.push(instruction);
        index += 1;
    }

    let loops = loops.finish()?;
    log::debug!(
        "decoded {} instructions, {} loops",
        instructions.len(),
        loops.len() / 2
    );
    Ok(Program::from_parts(instructions, loops))
}

/// the scan cursor over the digit body
struct DigitStream<'a> {
    src: &'a str,
    cursor: usize,
}

impl<'a> DigitStream<'a> {
    fn new(src: &'a str) -> Self {
        DigitStream { src, cursor: 0 }
    }

    /// the next digit, or None at the end of the stream
    fn next_digit(&mut self) -> LoadResult<Option<u8>> {
        let Some(c) = self.src[self.cursor..].chars().next() else {
            return Ok(None);
        };
        let Some(digit) = c.to_digit(10) else {
            return Err(LoadError::InvalidDigit {
                position: self.cursor,
                found: c,
            });
        };
        self.cursor += c.len_utf8();
        Ok(Some(digit as u8))
    }

    /// a two digit operand field, or None if the stream ends before it is complete
    fn operand(&mut self) -> LoadResult<Option<u8>> {
        let Some(tens) = self.next_digit()? else {
            return Ok(None);
        };
        let Some(ones) = self.next_digit()? else {
            return Ok(None);
        };
        Ok(Some(tens * 10 + ones))
    }
}
