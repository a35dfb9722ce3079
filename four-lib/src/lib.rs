//! A virtual machine for the esoteric language "4".
//!
//! A program is written as `3.`, followed by decimal digits, followed by a final `4`.
//! Whitespace anywhere is ignored. The digits are a sequence of instructions, each an
//! opcode digit followed by a fixed number of two digit operands:
//!
//! | op | instruction  | effect                                  |
//! |----|--------------|-----------------------------------------|
//! | 0  | `0 a b c`    | `[a] = [b] + [c]`                       |
//! | 1  | `1 a b c`    | `[a] = [b] - [c]`                       |
//! | 2  | `2 a b c`    | `[a] = [b] * [c]`                       |
//! | 3  | `3 a b c`    | `[a] = [b] / [c]`, rounding down        |
//! | 4  | `4`          | halt                                    |
//! | 5  | `5 a`        | write `[a]` as a byte                   |
//! | 6  | `6 a n`      | `[a] = n`                               |
//! | 7  | `7 a`        | read a byte into `[a]`                  |
//! | 8  | `8 a`        | skip past the matching `9` if `[a] == 0` |
//! | 9  | `9`          | jump back behind the matching `8`       |
//!
//! `[a]` is cell `a` of a tape of 100 integer cells that start out as zero. Cells are
//! unbounded, so arithmetic never overflows.
//!
//! To execute a program:
//! 1. load the source into a [`Program`](crate::core::Program) using [`loader::load`]
//! 1. create a [`vm::Executor`] with the program, an input and an output
//! 1. call [`vm::Executor::run`], or [`vm::Executor::step`] to go one instruction at a time
//!
//! ```
//! use four_lib::{loader, vm};
//!
//! let program = loader::load("3. 6 00 65  5 00 4").unwrap();
//! let mut out = vec![];
//! let mut executor = vm::Executor::new(&program, std::io::empty(), &mut out);
//! executor.run().unwrap();
//! assert_eq!(out, b"A");
//! ```
//!
//! [`run`] does all of that at once, [`execute`] does the last two steps.

use std::io::{Read, Write};

pub mod core;
pub mod error;
pub mod loader;
pub mod parser;
pub mod utils;
pub mod vm;

pub use error::{Error, FaultKind};

/// reads bytes from input and writes them back out until the input ends
pub const CAT_PROGRAM: &str = "3.6000180071051094";

/// loads and runs a program
pub fn run<R: Read, W: Write>(
    src: &str,
    input: R,
    output: W,
    on_eof: vm::EofBehavior,
) -> Result<vm::HaltReason, Error> {
    let program = loader::load(src)?;
    execute(&program, input, output, on_eof)
}

/// runs an already loaded program to completion
pub fn execute<R: Read, W: Write>(
    program: &crate::core::Program,
    input: R,
    output: W,
    on_eof: vm::EofBehavior,
) -> Result<vm::HaltReason, Error> {
    let mut executor = vm::Executor::new(program, input, output).with_eof_behavior(on_eof);
    Ok(executor.run()?)
}
