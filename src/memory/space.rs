//! Simulated linear address space
//!
//! Storage is a set of non-overlapping regions keyed by their start address.
//! [`MemorySpace::allocate`] places a region in the first gap large enough for
//! it, so freed addresses are reused and a region is always exactly the
//! requested size.
//!
//! Every mutation goes through [`MemorySpace::write`] or
//! [`MemorySpace::write_word`], which invoke the write callback exactly once
//! after a successful write. Rejected writes and reads never notify.
//!
//! The `*_safe` readers return `None` instead of failing, for callers that
//! inspect memory they do not own (visualizers, builtin string reads).

use super::{Address, Word, ADDRESS_SPACE_START};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Observer of every successful write: `(address, new value)`
pub type WriteCallback = Box<dyn FnMut(Address, Word) + Send>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("cannot allocate a region of 0 bytes")]
    ZeroSizedAllocation,

    #[error("out of memory: no free region of {requested} bytes")]
    OutOfMemory { requested: u32 },

    #[error("invalid free of address 0x{0:08x}")]
    InvalidFree(Address),

    #[error("access to {width} byte(s) at unallocated address 0x{address:08x}")]
    Unmapped { address: Address, width: u32 },
}

pub struct MemorySpace {
    regions: BTreeMap<Address, Vec<u8>>,
    capacity: u32,
    on_write: Option<WriteCallback>,
}

impl fmt::Debug for MemorySpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySpace")
            .field("regions", &self.regions.len())
            .field("allocated_bytes", &self.allocated_bytes())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl MemorySpace {
    /// Create an empty address space of `capacity` bytes
    pub fn new(capacity: u32) -> Self {
        MemorySpace {
            regions: BTreeMap::new(),
            capacity,
            on_write: None,
        }
    }

    /// Reserve a fresh region of exactly `size` bytes, zero-filled
    pub fn allocate(&mut self, size: u32) -> Result<Address, MemoryError> {
        if size == 0 {
            return Err(MemoryError::ZeroSizedAllocation);
        }

        let end_of_space = ADDRESS_SPACE_START as u64 + self.capacity as u64;
        let mut cursor = ADDRESS_SPACE_START as u64;
        for (&start, bytes) in &self.regions {
            if start as u64 - cursor >= size as u64 {
                break;
            }
            cursor = start as u64 + bytes.len() as u64;
        }
        if end_of_space - cursor.min(end_of_space) < size as u64 {
            return Err(MemoryError::OutOfMemory { requested: size });
        }

        let address = cursor as Address;
        self.regions.insert(address, vec![0; size as usize]);
        tracing::trace!(address, size, "allocate");
        Ok(address)
    }

    /// Release the region starting at `address`
    pub fn free(&mut self, address: Address) -> Result<(), MemoryError> {
        match self.regions.remove(&address) {
            Some(bytes) => {
                tracing::trace!(address, size = bytes.len(), "free");
                Ok(())
            }
            None => Err(MemoryError::InvalidFree(address)),
        }
    }

    /// Whether a region starts exactly at `address`
    pub fn is_allocated(&self, address: Address) -> bool {
        self.regions.contains_key(&address)
    }

    /// Size of the region starting at `address`
    pub fn region_size(&self, address: Address) -> Option<u32> {
        self.regions.get(&address).map(|bytes| bytes.len() as u32)
    }

    /// Locate `width` bytes at `address` inside a single region
    fn locate(&self, address: Address, width: u32) -> Option<(Address, usize)> {
        let (&start, bytes) = self.regions.range(..=address).next_back()?;
        let offset = (address - start) as usize;
        if offset + width as usize <= bytes.len() {
            Some((start, offset))
        } else {
            None
        }
    }

    fn notify(&mut self, address: Address, value: Word) {
        if let Some(callback) = self.on_write.as_mut() {
            callback(address, value);
        }
    }

    pub fn write(&mut self, address: Address, byte: u8) -> Result<(), MemoryError> {
        let (start, offset) = self
            .locate(address, 1)
            .ok_or(MemoryError::Unmapped { address, width: 1 })?;
        if let Some(bytes) = self.regions.get_mut(&start) {
            bytes[offset] = byte;
        }
        tracing::trace!(address, value = byte, "write byte");
        self.notify(address, byte as Word);
        Ok(())
    }

    /// Write a little-endian word; all four bytes must lie in one region
    pub fn write_word(&mut self, address: Address, value: Word) -> Result<(), MemoryError> {
        let (start, offset) = self
            .locate(address, 4)
            .ok_or(MemoryError::Unmapped { address, width: 4 })?;
        if let Some(bytes) = self.regions.get_mut(&start) {
            bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        }
        tracing::trace!(address, value, "write word");
        self.notify(address, value);
        Ok(())
    }

    pub fn read(&self, address: Address) -> Result<u8, MemoryError> {
        self.read_safe(address)
            .ok_or(MemoryError::Unmapped { address, width: 1 })
    }

    pub fn read_word(&self, address: Address) -> Result<Word, MemoryError> {
        self.read_word_safe(address)
            .ok_or(MemoryError::Unmapped { address, width: 4 })
    }

    pub fn read_safe(&self, address: Address) -> Option<u8> {
        let (start, offset) = self.locate(address, 1)?;
        self.regions.get(&start).map(|bytes| bytes[offset])
    }

    pub fn read_word_safe(&self, address: Address) -> Option<Word> {
        let (start, offset) = self.locate(address, 4)?;
        let bytes = self.regions.get(&start)?;
        let mut word = [0u8; 4];
        word.copy_from_slice(&bytes[offset..offset + 4]);
        Some(Word::from_le_bytes(word))
    }

    /// Install the process-wide write observer, replacing any previous one
    pub fn set_write_callback(&mut self, callback: WriteCallback) {
        self.on_write = Some(callback);
    }

    pub fn clear_write_callback(&mut self) -> Option<WriteCallback> {
        self.on_write.take()
    }

    /// Live regions in address order
    pub fn regions(&self) -> impl Iterator<Item = (Address, &[u8])> {
        self.regions
            .iter()
            .map(|(&start, bytes)| (start, bytes.as_slice()))
    }

    pub fn live_regions(&self) -> usize {
        self.regions.len()
    }

    pub fn allocated_bytes(&self) -> u32 {
        self.regions.values().map(|bytes| bytes.len() as u32).sum()
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Drop every region; the write callback stays installed
    pub fn clear(&mut self) {
        self.regions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_allocations_do_not_overlap() {
        let mut memory = MemorySpace::new(1024);
        let a = memory.allocate(4).unwrap();
        let b = memory.allocate(10).unwrap();
        let c = memory.allocate(1).unwrap();
        assert_eq!(a, ADDRESS_SPACE_START);
        assert_eq!(b, a + 4);
        assert_eq!(c, b + 10);
        assert_eq!(memory.allocated_bytes(), 15);
    }

    #[test]
    fn test_freed_gap_is_reused_first_fit() {
        let mut memory = MemorySpace::new(1024);
        let a = memory.allocate(8).unwrap();
        let b = memory.allocate(8).unwrap();
        memory.free(a).unwrap();
        assert_eq!(memory.allocate(4).unwrap(), a);
        assert_eq!(memory.allocate(8).unwrap(), b + 8);
    }

    #[test]
    fn test_out_of_memory_and_zero_size() {
        let mut memory = MemorySpace::new(16);
        memory.allocate(12).unwrap();
        assert_eq!(
            memory.allocate(8),
            Err(MemoryError::OutOfMemory { requested: 8 })
        );
        assert!(memory.allocate(4).is_ok());
        assert_eq!(memory.allocate(0), Err(MemoryError::ZeroSizedAllocation));
    }

    #[test]
    fn test_invalid_free() {
        let mut memory = MemorySpace::new(64);
        let a = memory.allocate(8).unwrap();
        assert_eq!(memory.free(a + 1), Err(MemoryError::InvalidFree(a + 1)));
        memory.free(a).unwrap();
        assert_eq!(memory.free(a), Err(MemoryError::InvalidFree(a)));
    }

    #[test]
    fn test_word_round_trip_is_little_endian() {
        let mut memory = MemorySpace::new(64);
        let a = memory.allocate(8).unwrap();
        memory.write_word(a + 4, -2).unwrap();
        assert_eq!(memory.read_word(a + 4), Ok(-2));
        assert_eq!(memory.read(a + 4), Ok(0xFE));
        assert_eq!(memory.read(a + 7), Ok(0xFF));
    }

    #[test]
    fn test_word_may_not_straddle_regions() {
        let mut memory = MemorySpace::new(64);
        let a = memory.allocate(2).unwrap();
        memory.allocate(2).unwrap();
        assert_eq!(
            memory.write_word(a, 1),
            Err(MemoryError::Unmapped { address: a, width: 4 })
        );
        assert_eq!(memory.read_word_safe(a), None);
    }

    #[test]
    fn test_safe_reads_of_unmapped_memory() {
        let memory = MemorySpace::new(64);
        assert_eq!(memory.read_safe(0), None);
        assert_eq!(memory.read_word_safe(ADDRESS_SPACE_START), None);
        assert!(memory.read(0).is_err());
    }

    #[test]
    fn test_write_callback_fires_once_per_successful_write() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let mut memory = MemorySpace::new(64);
        memory.set_write_callback(Box::new(move |address, value| {
            sink.lock().unwrap().push((address, value));
        }));

        let a = memory.allocate(4).unwrap();
        memory.write_word(a, 42).unwrap();
        memory.write(a + 1, 7).unwrap();
        let _ = memory.read_word(a);
        assert!(memory.write_word(a + 2, 1).is_err());
        assert!(memory.write(0, 1).is_err());

        assert_eq!(*seen.lock().unwrap(), vec![(a, 42), (a + 1, 7)]);
    }
}
