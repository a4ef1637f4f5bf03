//! VM memory subsystem.
//!
//! A flat array of signed words with a write-protection set and a
//! per-address access counter used for the heat map view.

use std::collections::BTreeSet;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// The memory sizes the machine can be built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum MemorySize {
    /// 27 words (3^3)
    Small,
    /// 81 words (3^4)
    #[default]
    Medium,
    /// 243 words (3^5)
    Large,
}

impl MemorySize {
    /// Every supported size, smallest first.
    pub const ALL: [MemorySize; 3] = [MemorySize::Small, MemorySize::Medium, MemorySize::Large];

    /// Number of words.
    pub const fn words(self) -> usize {
        match self {
            MemorySize::Small => 27,
            MemorySize::Medium => 81,
            MemorySize::Large => 243,
        }
    }
}

impl TryFrom<usize> for MemorySize {
    type Error = MemoryError;

    fn try_from(words: usize) -> Result<Self, Self::Error> {
        match words {
            27 => Ok(MemorySize::Small),
            81 => Ok(MemorySize::Medium),
            243 => Ok(MemorySize::Large),
            other => Err(MemoryError::UnsupportedSize(other)),
        }
    }
}

impl From<MemorySize> for usize {
    fn from(size: MemorySize) -> Self {
        size.words()
    }
}

impl std::fmt::Display for MemorySize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.words())
    }
}

/// Machine memory.
#[derive(Clone, Serialize, Deserialize)]
pub struct Memory {
    cells: Vec<i64>,
    protected: BTreeSet<usize>,
    access_counts: Vec<u64>,
    tracking: bool,
}

impl Memory {
    /// Create a zeroed memory of the given size.
    pub fn new(size: MemorySize) -> Self {
        Self {
            cells: vec![0; size.words()],
            protected: BTreeSet::new(),
            access_counts: vec![0; size.words()],
            tracking: false,
        }
    }

    /// Number of words.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false; memory is never built empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Map a word value to an index if it addresses a cell.
    #[inline]
    pub fn address(&self, value: i64) -> Option<usize> {
        usize::try_from(value).ok().filter(|&a| a < self.cells.len())
    }

    /// Read without touching the access counters.
    #[inline]
    pub fn peek(&self, addr: usize) -> Option<i64> {
        self.cells.get(addr).copied()
    }

    /// Read a data word, counting the access when tracking is on.
    pub fn load(&mut self, addr: usize) -> Result<i64, MemoryError> {
        let value = self.peek(addr).ok_or(MemoryError::AddressOutOfRange(addr))?;
        self.touch(addr);
        Ok(value)
    }

    /// Write a data word. Protected cells reject the write and keep their value.
    pub fn store(&mut self, addr: usize, value: i64) -> Result<(), MemoryError> {
        if addr >= self.cells.len() {
            return Err(MemoryError::AddressOutOfRange(addr));
        }
        if self.protected.contains(&addr) {
            return Err(MemoryError::Protected(addr));
        }
        self.cells[addr] = value;
        self.touch(addr);
        Ok(())
    }

    /// Write ignoring protection and counters (program loading, editors).
    pub fn poke(&mut self, addr: usize, value: i64) -> Result<(), MemoryError> {
        let cell = self.cells.get_mut(addr).ok_or(MemoryError::AddressOutOfRange(addr))?;
        *cell = value;
        Ok(())
    }

    fn touch(&mut self, addr: usize) {
        if self.tracking {
            self.access_counts[addr] += 1;
        }
    }

    /// All cells, lowest address first.
    pub fn cells(&self) -> &[i64] {
        &self.cells
    }

    /// Overwrite every cell from a saved copy of the same length.
    pub(crate) fn restore(&mut self, cells: &[i64]) {
        self.cells.copy_from_slice(cells);
    }

    /// Write-protect a cell.
    pub fn protect(&mut self, addr: usize) -> Result<(), MemoryError> {
        if addr >= self.cells.len() {
            return Err(MemoryError::AddressOutOfRange(addr));
        }
        self.protected.insert(addr);
        Ok(())
    }

    /// Lift write protection. Returns whether the cell was protected.
    pub fn unprotect(&mut self, addr: usize) -> bool {
        self.protected.remove(&addr)
    }

    pub fn is_protected(&self, addr: usize) -> bool {
        self.protected.contains(&addr)
    }

    /// Protected addresses in ascending order.
    pub fn protected(&self) -> impl Iterator<Item = usize> + '_ {
        self.protected.iter().copied()
    }

    /// Enable or disable access counting. Counts are kept when disabled.
    pub fn set_tracking(&mut self, enabled: bool) {
        self.tracking = enabled;
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    /// Per-address load/store counts.
    pub fn access_counts(&self) -> &[u64] {
        &self.access_counts
    }

    /// Zero the cells, protection set and counters. Tracking mode is kept.
    pub fn clear(&mut self) {
        self.cells.fill(0);
        self.access_counts.fill(0);
        self.protected.clear();
    }

    /// Copy a program image into memory from address 0, ignoring protection
    /// and counters. Words past the end are dropped. Returns the number written.
    pub fn load_image(&mut self, words: &[i64]) -> usize {
        let count = words.len().min(self.cells.len());
        self.cells[..count].copy_from_slice(&words[..count]);
        count
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new(MemorySize::default())
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.cells.iter().filter(|&&cell| cell != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &self.cells.len())
            .field("protected", &self.protected)
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("memory address {0} out of range")]
    AddressOutOfRange(usize),

    #[error("memory protection violation at address {0}")]
    Protected(usize),

    #[error("unsupported memory size {0} (expected 27, 81 or 243)")]
    UnsupportedSize(usize),
}
