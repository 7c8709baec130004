//! Memory subsystem
//!
//! Flat, word-addressed, zero-initialised. Addresses are signed words so
//! that a negative address popped off the stack can be reported as a fault
//! rather than wrapped.

use stackvm_spec::{MachineConfig, MemoryPolicy, Word};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memory {
    cells: Vec<Word>,
    policy: MemoryPolicy,
    max_cells: usize,
}

impl Memory {
    pub fn new(config: &MachineConfig) -> Self {
        Memory {
            cells: vec![0; config.memory_size],
            policy: config.memory_policy,
            max_cells: config.max_memory_cells,
        }
    }

    /// Current size in cells
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn policy(&self) -> MemoryPolicy {
        self.policy
    }

    /// Value at `address`, or `None` if the address is not readable
    pub fn read(&self, address: Word) -> Option<Word> {
        let index = usize::try_from(address).ok()?;
        match self.policy {
            MemoryPolicy::Fixed => self.cells.get(index).copied(),
            MemoryPolicy::Grow if index < self.max_cells => {
                Some(self.cells.get(index).copied().unwrap_or(0))
            }
            MemoryPolicy::Grow => None,
        }
    }

    /// Cell index for a write to `address`, or `None` if it is not writable
    pub fn writable(&self, address: Word) -> Option<usize> {
        let index = usize::try_from(address).ok()?;
        let limit = match self.policy {
            MemoryPolicy::Fixed => self.cells.len(),
            MemoryPolicy::Grow => self.max_cells,
        };
        (index < limit).then_some(index)
    }

    /// Store at an index previously checked with [`Memory::writable`]
    pub fn store(&mut self, index: usize, value: Word) {
        if index >= self.cells.len() {
            tracing::debug!("growing memory from {} to {} cells", self.cells.len(), index + 1);
            self.cells.resize(index + 1, 0);
        }
        tracing::trace!("mem[{:#x}] = {}", index, value);
        self.cells[index] = value;
    }

    /// Checked write; `false` if the address is not writable
    pub fn write(&mut self, address: Word, value: Word) -> bool {
        match self.writable(address) {
            Some(index) => {
                self.store(index, value);
                true
            }
            None => false,
        }
    }

    /// Copy `values` into consecutive cells starting at `start`
    ///
    /// Returns the first address that did not fit; nothing is written then.
    pub fn load(&mut self, start: usize, values: &[Word]) -> Result<(), usize> {
        let end = start.checked_add(values.len()).ok_or(start)?;
        if values.is_empty() {
            return Ok(());
        }
        if let Some(bad) = (start..end).find(|&i| self.writable(i as Word).is_none()) {
            return Err(bad);
        }
        if end > self.cells.len() {
            self.cells.resize(end, 0);
        }
        self.cells[start..end].copy_from_slice(values);
        Ok(())
    }

    /// Zero every cell and shrink back to `size`
    pub fn clear(&mut self, size: usize) {
        self.cells.clear();
        self.cells.resize(size, 0);
    }

    pub fn as_slice(&self) -> &[Word] {
        &self.cells
    }

    /// Non-zero cells by address
    pub fn non_zero(&self) -> BTreeMap<usize, Word> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, value)| **value != 0)
            .map(|(index, value)| (index, *value))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(policy: MemoryPolicy) -> Memory {
        let mut config = MachineConfig::new(8, 16, policy).unwrap();
        config.max_memory_cells = 32;
        Memory::new(&config)
    }

    #[test]
    fn test_fixed_bounds() {
        let mut mem = small(MemoryPolicy::Fixed);
        assert_eq!(mem.len(), 8);
        assert_eq!(mem.read(0), Some(0));
        assert_eq!(mem.read(7), Some(0));
        assert_eq!(mem.read(8), None);
        assert_eq!(mem.read(-1), None);

        assert!(mem.write(7, 42));
        assert_eq!(mem.read(7), Some(42));
        assert!(!mem.write(8, 1));
        assert!(!mem.write(-5, 1));
        assert_eq!(mem.len(), 8);
    }

    #[test]
    fn test_grow_policy() {
        let mut mem = small(MemoryPolicy::Grow);
        assert_eq!(mem.read(20), Some(0));
        assert!(mem.write(20, 9));
        assert_eq!(mem.len(), 21);
        assert_eq!(mem.read(20), Some(9));
        assert_eq!(mem.read(32), None);
        assert!(!mem.write(32, 1));
    }

    #[test]
    fn test_load_block() {
        let mut mem = small(MemoryPolicy::Fixed);
        mem.load(2, &[1, 2, 3]).unwrap();
        assert_eq!(&mem.as_slice()[..6], &[0, 0, 1, 2, 3, 0]);

        assert_eq!(mem.load(6, &[1, 2, 3]), Err(8));
        assert_eq!(mem.read(6), Some(0));
    }

    #[test]
    fn test_clear_and_non_zero() {
        let mut mem = small(MemoryPolicy::Grow);
        mem.write(1, 5);
        mem.write(10, -2);
        let cells = mem.non_zero();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[&10], -2);

        mem.clear(8);
        assert_eq!(mem.len(), 8);
        assert!(mem.non_zero().is_empty());
    }
}
