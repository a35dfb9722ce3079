use std::collections::BTreeMap;
use std::fmt;

use crate::core::*;
use crate::loader::LoadError;

/// Correlates matching LoopStart and LoopEnd instructions by their index.
///
/// The table is symmetric: if `partner(s) == Some(e)` then `partner(e) == Some(s)`.
/// Only indices of loop instructions are present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopTable(BTreeMap<usize, usize>);

impl LoopTable {
    /// the index of the matching loop instruction
    pub fn partner(&self, index: usize) -> Option<usize> {
        self.0.get(&index).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// iterates over (LoopStart index, LoopEnd index) pairs, ordered by start
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.0
            .iter()
            .filter(|(start, end)| start < end)
            .map(|(s, e)| (*s, *e))
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    fn link(&mut self, start: usize, end: usize) {
        self.0.insert(start, end);
        self.0.insert(end, start);
    }
}

/// Builds the loop table in the same pass that produces the instructions.
///
/// LoopStart indices are pushed onto a stack of pending opens, each LoopEnd
/// pops the innermost one.
#[derive(Debug, Default)]
pub(crate) struct LoopTableBuilder {
    pending: Vec<usize>,
    table: LoopTable,
}

impl LoopTableBuilder {
    pub fn visit(&mut self, index: usize, instruction: &Instruction) -> Result<(), LoadError> {
        match instruction {
            Instruction::LoopStart(_) => self.pending.push(index),
            Instruction::LoopEnd => {
                let start = self
                    .pending
                    .pop()
                    .ok_or(LoadError::UnbalancedLoopEnd { index })?;
                self.table.link(start, index);
            }
            _ => {}
        }
        Ok(())
    }

    pub fn finish(self) -> Result<LoopTable, LoadError> {
        match self.pending.last() {
            Some(&index) => Err(LoadError::UnbalancedLoopStart { index }),
            None => Ok(self.table),
        }
    }
}

/// A decoded program: the instruction sequence together with its loop table.
/// Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    instructions: Vec<Instruction>,
    loops: LoopTable,
}

impl Program {
    pub(crate) fn from_parts(instructions: Vec<Instruction>, loops: LoopTable) -> Self {
        Program {
            instructions,
            loops,
        }
    }

    /// builds a program from already decoded instructions, pairing up the loops
    pub fn from_instructions(instructions: Vec<Instruction>) -> Result<Self, LoadError> {
        let mut builder = LoopTableBuilder::default();
        for (index, instruction) in instructions.iter().enumerate() {
            builder.visit(index, instruction)?;
        }
        let loops = builder.finish()?;
        Ok(Self::from_parts(instructions, loops))
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn loops(&self) -> &LoopTable {
        &self.loops
    }

    /// the canonical source text of this program, without any whitespace
    pub fn to_source(&self) -> String {
        let mut src = String::from("3.");
        for instruction in &self.instructions {
            instruction.encode_into(&mut src);
        }
        src.push('4');
        src
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, instruction) in self.instructions.iter().enumerate() {
            match self.loops.partner(i) {
                Some(partner) => {
                    let text = instruction.to_string();
                    writeln!(f, "{:>4}: {:<20} -> {}", i, text, partner)?
                }
                None => writeln!(f, "{:>4}: {}", i, instruction)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Instruction::*;

    #[test]
    fn test_nested_loops_pair_innermost_first() {
        let program = Program::from_instructions(vec![
            LoopStart(Cell(0)),
            LoopStart(Cell(1)),
            Halt,
            LoopEnd,
            LoopStart(Cell(2)),
            LoopEnd,
            LoopEnd,
        ])
        .unwrap();
        let loops = program.loops();
        assert_eq!(loops.partner(0), Some(6));
        assert_eq!(loops.partner(1), Some(3));
        assert_eq!(loops.partner(4), Some(5));
        assert_eq!(loops.partner(2), None);
        assert_eq!(loops.len(), 6);
        assert_eq!(loops.pairs().collect::<Vec<_>>(), vec![(0, 6), (1, 3), (4, 5)]);
        for (k, v) in loops.iter() {
            assert_eq!(loops.partner(v), Some(k));
        }
    }

    #[test]
    fn test_unbalanced() {
        let err = Program::from_instructions(vec![LoopEnd]).unwrap_err();
        assert!(matches!(err, LoadError::UnbalancedLoopEnd { index: 0 }));

        let err = Program::from_instructions(vec![LoopStart(Cell(0)), LoopStart(Cell(0)), LoopEnd])
            .unwrap_err();
        assert!(matches!(err, LoadError::UnbalancedLoopStart { index: 0 }));

        let err = Program::from_instructions(vec![
            LoopStart(Cell(0)),
            LoopEnd,
            Halt,
            LoopStart(Cell(0)),
        ])
        .unwrap_err();
        assert!(matches!(err, LoadError::UnbalancedLoopStart { index: 3 }));
    }

    #[test]
    fn test_to_source() {
        let program = Program::from_instructions(vec![Set(Cell(0), 65), Output(Cell(0))]).unwrap();
        assert_eq!(program.to_source(), "3.600655004");
        assert_eq!(Program::from_instructions(vec![]).unwrap().to_source(), "3.4");
    }

    #[test]
    fn test_listing() {
        let program =
            Program::from_instructions(vec![LoopStart(Cell(0)), Output(Cell(1)), LoopEnd]).unwrap();
        let listing = program.to_string();
        let lines: Vec<_> = listing.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("   0: loop_start [0]"));
        assert!(lines[0].ends_with("-> 2"));
        assert_eq!(lines[1], "   1: output [1]");
        assert!(lines[2].ends_with("-> 0"));
    }
}
