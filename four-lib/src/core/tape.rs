use derive_more::Deref;
use num_bigint::BigInt;
use num_traits::Zero;

use crate::core::Cell;

/// number of cells on the tape
pub const TAPE_LEN: usize = 100;

/// The memory of the vm. A fixed number of unbounded integer cells, all zero initially.
///
/// There is no data pointer, every instruction names the cells it touches.
/// Access through a [`Cell`] is checked, since a cell can name an index past the end.
#[derive(Debug, Clone, PartialEq, Eq, Deref)]
pub struct Tape([BigInt; TAPE_LEN]);

impl Default for Tape {
    fn default() -> Self {
        Self::new()
    }
}

impl Tape {
    pub fn new() -> Self {
        Tape(std::array::from_fn(|_| BigInt::zero()))
    }

    pub fn get(&self, cell: Cell) -> Option<&BigInt> {
        self.0.get(cell.index())
    }

    pub fn get_mut(&mut self, cell: Cell) -> Option<&mut BigInt> {
        self.0.get_mut(cell.index())
    }

    /// iterates over all cells that are not zero, with their index
    pub fn non_zero(&self) -> impl Iterator<Item = (usize, &BigInt)> + '_ {
        self.0.iter().enumerate().filter(|(_, v)| !v.is_zero())
    }
}
