//! Contains the executor, which runs a [Program] against a [Tape].
//!
//! The instruction pointer starts before the first instruction. Each step first
//! increments it and then dispatches the instruction it points at, so a jump that
//! assigns index `t` continues with `t + 1`. This is why a loop start is only tested
//! when it is reached by falling through: a loop end jumps back to its loop start,
//! and execution resumes right behind it.

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::Zero;
use std::io::{self, Read, Write};
use std::result::Result as StdResult;
use thiserror::Error;

use crate::core::*;
use crate::utils::bug;
use crate::FaultKind;

/// the value an input instruction stores at the end of input, with [EofBehavior::Sentinel]
pub const EOF_SENTINEL: i64 = -1;

#[derive(Error, Debug)]
pub enum Error {
    #[error("instruction {index} addresses cell {cell}, which is not on the tape")]
    CellOutOfRange { index: usize, cell: u8 },

    #[error("instruction {index} divides by zero")]
    DivisionByZero { index: usize },

    #[error("instruction {index} tried to output {value}, which is not a byte")]
    NotAByte { index: usize, value: BigInt },

    #[error("instruction {index} read past the end of input")]
    EndOfInput { index: usize },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub fn kind(&self) -> FaultKind {
        use Error::*;
        match self {
            CellOutOfRange { .. } | NotAByte { .. } => FaultKind::Range,
            DivisionByZero { .. } => FaultKind::Arithmetic,
            EndOfInput { .. } => FaultKind::EndOfInput,
            Io(_) => FaultKind::Io,
        }
    }
}

pub type Result<T> = StdResult<T, Error>;

/// What an input instruction does when there is no more input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EofBehavior {
    /// ends the run normally
    #[default]
    Halt,
    /// stores [EOF_SENTINEL] in the cell and continues
    Sentinel,
    /// aborts the run with [Error::EndOfInput]
    Error,
}

/// why a run ended without an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    /// a halt instruction at `index` was executed
    Halted { index: usize },
    /// the instruction pointer moved past the last instruction
    EndOfProgram,
    /// the input instruction at `index` found no more input
    EndOfInput { index: usize },
}

/// returned by [Executor::step]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecOutcome {
    Continue,
    Halt(HaltReason),
}

/// Executes one program. Owns the tape for the lifetime of the run.
pub struct Executor<'p, R, W> {
    program: &'p Program,
    tape: Tape,
    /// index of the last dispatched instruction, or the target of the last jump.
    /// None before the first step
    ip: Option<usize>,
    input: R,
    output: W,
    on_eof: EofBehavior,
}

impl<'p, R: Read, W: Write> Executor<'p, R, W> {
    pub fn new(program: &'p Program, input: R, output: W) -> Self {
        Executor {
            program,
            tape: Tape::new(),
            ip: None,
            input,
            output,
            on_eof: EofBehavior::default(),
        }
    }

    pub fn with_eof_behavior(mut self, on_eof: EofBehavior) -> Self {
        self.on_eof = on_eof;
        self
    }

    pub fn program(&self) -> &'p Program {
        self.program
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn ip(&self) -> Option<usize> {
        self.ip
    }

    /// the index of the instruction that the next step dispatches
    pub fn next_index(&self) -> usize {
        self.ip.map_or(0, |ip| ip + 1)
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    /// runs until the program halts or fails
    pub fn run(&mut self) -> Result<HaltReason> {
        loop {
            if let ExecOutcome::Halt(reason) = self.step()? {
                log::debug!("halted: {:?}", reason);
                return Ok(reason);
            }
        }
    }

    /// advances the instruction pointer and executes the instruction under it
    pub fn step(&mut self) -> Result<ExecOutcome> {
        let index = self.next_index();
        self.ip = Some(index);
        let Some(&instruction) = self.program.get(index) else {
            return Ok(ExecOutcome::Halt(HaltReason::EndOfProgram));
        };
        log::trace!("{}: {}", index, instruction);

        use Instruction::*;
        match instruction {
            Add(a, b, c) => self.arith(index, a, b, c, |x, y| x + y)?,
            Sub(a, b, c) => self.arith(index, a, b, c, |x, y| x - y)?,
            Mul(a, b, c) => self.arith(index, a, b, c, |x, y| x * y)?,
            Div(a, b, c) => {
                if self.read(index, c)?.is_zero() {
                    return Err(Error::DivisionByZero { index });
                }
                self.arith(index, a, b, c, Integer::div_floor)?
            }
            Halt => return Ok(ExecOutcome::Halt(HaltReason::Halted { index })),
            Output(a) => {
                let value = self.read(index, a)?;
                let byte = u8::try_from(value).map_err(|_| Error::NotAByte {
                    index,
                    value: value.clone(),
                })?;
                self.output.write_all(&[byte])?;
                self.output.flush()?;
            }
            Set(a, b) => *self.cell_mut(index, a)? = BigInt::from(b),
            Input(a) => {
                // the cell is checked before any input is consumed
                self.read(index, a)?;
                let value = match self.read_byte()? {
                    Some(byte) => BigInt::from(byte),
                    None => match self.on_eof {
                        EofBehavior::Halt => {
                            return Ok(ExecOutcome::Halt(HaltReason::EndOfInput { index }))
                        }
                        EofBehavior::Sentinel => BigInt::from(EOF_SENTINEL),
                        EofBehavior::Error => return Err(Error::EndOfInput { index }),
                    },
                };
                *self.cell_mut(index, a)? = value;
            }
            LoopStart(a) => {
                if self.read(index, a)?.is_zero() {
                    self.ip = Some(self.partner(index));
                }
            }
            LoopEnd => self.ip = Some(self.partner(index)),
        }
        Ok(ExecOutcome::Continue)
    }

    fn arith(
        &mut self,
        index: usize,
        dest: Cell,
        lhs: Cell,
        rhs: Cell,
        op: fn(&BigInt, &BigInt) -> BigInt,
    ) -> Result<()> {
        let value = op(self.read(index, lhs)?, self.read(index, rhs)?);
        *self.cell_mut(index, dest)? = value;
        Ok(())
    }

    fn read(&self, index: usize, cell: Cell) -> Result<&BigInt> {
        self.tape.get(cell).ok_or(Error::CellOutOfRange {
            index,
            cell: cell.into(),
        })
    }

    fn cell_mut(&mut self, index: usize, cell: Cell) -> Result<&mut BigInt> {
        self.tape.get_mut(cell).ok_or(Error::CellOutOfRange {
            index,
            cell: cell.into(),
        })
    }

    fn partner(&self, index: usize) -> usize {
        match self.program.loops().partner(index) {
            Some(partner) => partner,
            None => bug!("loop instruction {} has no partner", index),
        }
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut buf = [0u8; 1];
        match self.input.read_exact(&mut buf) {
            Ok(()) => Ok(Some(buf[0])),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load;
    use Instruction::*;

    fn int(value: i64) -> BigInt {
        BigInt::from(value)
    }

    fn run_src(src: &str, input: &[u8]) -> (Result<HaltReason>, Vec<u8>, Tape) {
        let program = load(src).unwrap();
        let mut out = vec![];
        let mut executor = Executor::new(&program, input, &mut out);
        let res = executor.run();
        let tape = executor.tape().clone();
        (res, out, tape)
    }

    #[test]
    fn test_set_and_output() {
        let (res, out, _) = run_src("3. 6 00 65  5 00 4", b"");
        assert_eq!(res.unwrap(), HaltReason::EndOfProgram);
        assert_eq!(out, b"A");
    }

    #[test]
    fn test_arithmetic() {
        // [0] = 7, [1] = 3, then [2..=5] = [0] op [1]
        let src = "3. 6 00 07  6 01 03  0 02 00 01  1 03 00 01  2 04 00 01  3 05 00 01 4";
        let (res, _, tape) = run_src(src, b"");
        res.unwrap();
        assert_eq!(tape[..6].to_vec(), [7, 3, 10, 4, 21, 2].map(int));
    }

    #[test]
    fn test_division_rounds_down() {
        // [2] = [1] - [0] = -7, [4] = [2] / [3] = -7 / 2
        let (res, _, tape) = run_src("3. 6 00 07  1 02 01 00  6 03 02  3 04 02 03 4", b"");
        res.unwrap();
        assert_eq!(tape[2], int(-7));
        assert_eq!(tape[4], int(-4));
    }

    #[test]
    fn test_division_by_zero_leaves_tape_untouched() {
        let (res, _, tape) = run_src("3. 6 00 07  3 00 00 01 4", b"");
        assert!(matches!(res, Err(Error::DivisionByZero { index: 1 })));
        assert_eq!(tape[0], int(7));
        assert_eq!(res.unwrap_err().kind(), FaultKind::Arithmetic);
    }

    #[test]
    fn test_cells_are_unbounded() {
        // [0] = 99^16, [1] = [0] / [0], [3] = 64 + [1]
        let src = "3. 6 00 99  2 00 00 00  2 00 00 00  2 00 00 00  2 00 00 00 \
                   3 01 00 00  6 02 64  0 03 02 01  5 03 4";
        let (res, out, tape) = run_src(src, b"");
        assert_eq!(res.unwrap(), HaltReason::EndOfProgram);
        assert_eq!(out, b"A");
        assert_eq!(tape[0], int(99).pow(16));
        assert!(tape[0] > int(i64::MAX));
        assert_eq!(tape[1], int(1));
    }

    #[test]
    fn test_large_negative_division_rounds_down() {
        // [1] = -(99^8), [3] = [1] / 2
        let src = "3. 6 00 99  2 00 00 00  2 00 00 00  2 00 00 00 \
                   1 01 02 00  6 02 02  3 03 01 02 4";
        let (res, _, tape) = run_src(src, b"");
        res.unwrap();
        let big = int(99).pow(8);
        assert_eq!(tape[1], -big.clone());
        assert_eq!(tape[3], (-big - 1) / 2);
    }

    #[test]
    fn test_last_cell_is_valid_and_one_past_is_not() {
        let (res, out, tape) = run_src("3. 6 99 42  5 99 4", b"");
        res.unwrap();
        assert_eq!(tape[99], int(42));
        assert_eq!(out, b"*");

        let program = Program::from_instructions(vec![Set(Cell(100), 1)]).unwrap();
        let mut executor = Executor::new(&program, io::empty(), io::sink());
        let err = executor.run().unwrap_err();
        assert!(matches!(err, Error::CellOutOfRange { index: 0, cell: 100 }));
        assert_eq!(err.kind(), FaultKind::Range);
    }

    #[test]
    fn test_out_of_range_input_consumes_nothing() {
        let program = Program::from_instructions(vec![Input(Cell(100))]).unwrap();
        let mut input: &[u8] = b"x";
        let mut executor = Executor::new(&program, &mut input, io::sink());
        assert!(matches!(
            executor.run(),
            Err(Error::CellOutOfRange { index: 0, cell: 100 })
        ));
        assert_eq!(input, b"x");
    }

    #[test]
    fn test_output_must_be_a_byte() {
        // [1] = [2] - [0] = -1
        let (res, out, _) = run_src("3. 6 00 01  1 01 02 00  5 01 4", b"");
        assert!(matches!(res, Err(Error::NotAByte { index: 2, ref value }) if *value == int(-1)));
        assert!(out.is_empty());
    }

    #[test]
    fn test_halt_stops_immediately() {
        let (res, out, _) = run_src("3. 4  6 00 65  5 00 4", b"");
        assert_eq!(res.unwrap(), HaltReason::Halted { index: 0 });
        assert!(out.is_empty());
    }

    #[test]
    fn test_empty_program_runs_off_the_end() {
        let (res, out, _) = run_src("3.4", b"");
        assert_eq!(res.unwrap(), HaltReason::EndOfProgram);
        assert!(out.is_empty());
    }

    #[test]
    fn test_taken_loop_start_resumes_behind_loop_end() {
        // 0: set [0] 0, 1: loop_start [0], 2: set [1] 66, 3: output [1], 4: loop_end,
        // 5: set [1] 65, 6: output [1]
        let program = load("3. 6 00 00  8 00  6 01 66  5 01  9  6 01 65  5 01 4").unwrap();
        let mut out = vec![];
        let mut executor = Executor::new(&program, io::empty(), &mut out);
        assert_eq!(executor.step().unwrap(), ExecOutcome::Continue);
        assert_eq!(executor.step().unwrap(), ExecOutcome::Continue);
        assert_eq!(executor.ip(), Some(4));
        assert_eq!(executor.next_index(), 5);
        assert_eq!(executor.run().unwrap(), HaltReason::EndOfProgram);
        assert_eq!(out, b"A");
    }

    /// A loop start is not tested again when its loop end jumps back. Clearing the
    /// condition cell inside the body does not end the loop.
    #[test]
    fn test_loop_condition_is_not_retested() {
        // 0: set [0] 1, 1: set [1] 65, 2: loop_start [0], 3: set [0] 0, 4: output [1],
        // 5: loop_end
        let program = load("3. 6 00 01  6 01 65  8 00  6 00 00  5 01  9 4").unwrap();
        let mut out = vec![];
        let mut executor = Executor::new(&program, io::empty(), &mut out);
        let mut dispatched = vec![];
        for _ in 0..30 {
            dispatched.push(executor.next_index());
            assert_eq!(executor.step().unwrap(), ExecOutcome::Continue);
        }
        assert!(executor.tape()[0].is_zero());
        assert_eq!(dispatched.iter().filter(|i| **i == 2).count(), 1);
        assert_eq!(&dispatched[..9], &[0, 1, 2, 3, 4, 5, 3, 4, 5]);
        assert_eq!(out, b"A".repeat(9));
    }

    #[test]
    fn test_loop_left_through_halt() {
        // counts [1] down from 3, printing 'A' each pass. [4] = 1 / ([1] + 1) is 1 only
        // once [1] reached 0, which enters the inner loop whose body halts
        let src = "3. 6 00 01  6 01 03  6 02 65 \
                   8 00 \
                       5 02 \
                       1 01 01 00 \
                       0 03 01 00 \
                       3 04 00 03 \
                       8 04  4  9 \
                   9 4";
        let (res, out, tape) = run_src(src, b"");
        assert_eq!(res.unwrap(), HaltReason::Halted { index: 9 });
        assert_eq!(out, b"AAA");
        assert!(tape[1].is_zero());
    }

    #[test]
    fn test_cat_copies_input_and_terminates() {
        let input = b"hello, world\n\x00\xff tail";
        let (res, out, _) = run_src(crate::CAT_PROGRAM, input);
        assert_eq!(res.unwrap(), HaltReason::EndOfInput { index: 2 });
        assert_eq!(out, input);
    }

    #[test]
    fn test_eof_behaviors() {
        let program = load("3. 7 00 4").unwrap();

        let mut executor = Executor::new(&program, io::empty(), io::sink())
            .with_eof_behavior(EofBehavior::Sentinel);
        assert_eq!(executor.run().unwrap(), HaltReason::EndOfProgram);
        assert_eq!(executor.tape()[0], int(EOF_SENTINEL));

        let mut executor = Executor::new(&program, io::empty(), io::sink())
            .with_eof_behavior(EofBehavior::Error);
        let err = executor.run().unwrap_err();
        assert!(matches!(err, Error::EndOfInput { index: 0 }));
        assert_eq!(err.kind(), FaultKind::EndOfInput);

        let mut executor = Executor::new(&program, &b"Z"[..], io::sink());
        assert_eq!(executor.run().unwrap(), HaltReason::EndOfProgram);
        assert_eq!(executor.tape()[0], int(90));
    }
}
