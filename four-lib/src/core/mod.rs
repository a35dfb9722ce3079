//! contains all important data structures

pub mod opcode;
pub use opcode::*;

pub mod tape;
pub use tape::*;

pub mod program;
pub use program::*;
