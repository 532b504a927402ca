// Copyright 2025 Google
// SPDX-License-Identifier: MIT

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use crate::mhw_defines::MhwError;
use crate::mhw_defines::MhwResult;
use crate::mhw_defines::MHW_PAGE_SIZE;
use crate::sys::platform::page_size;
use crate::sys::platform::PlatformArena;
use crate::traits::ArenaProvider;
use crate::traits::StateHeapArena;

const GPU_VA_BASE: u64 = 0x1_0000_0000;

/// A state-heap arena in process memory with a synthetic GPU address.
pub struct SystemArena {
    memory: PlatformArena,
    gpu_address: u64,
    locked: bool,
}

impl StateHeapArena for SystemArena {
    fn size(&self) -> usize {
        self.memory.as_slice().len()
    }

    fn gpu_address(&self) -> u64 {
        self.gpu_address
    }

    fn lock(&mut self) -> MhwResult<()> {
        if self.locked {
            return Err(MhwError::AlreadyLocked);
        }
        self.locked = true;
        Ok(())
    }

    fn unlock(&mut self) -> MhwResult<()> {
        if !self.locked {
            return Err(MhwError::NotLocked);
        }
        self.locked = false;
        Ok(())
    }

    fn is_locked(&self) -> bool {
        self.locked
    }

    fn data(&self) -> MhwResult<&[u8]> {
        if !self.locked {
            return Err(MhwError::NotLocked);
        }
        Ok(self.memory.as_slice())
    }

    fn data_mut(&mut self) -> MhwResult<&mut [u8]> {
        if !self.locked {
            return Err(MhwError::NotLocked);
        }
        Ok(self.memory.as_mut_slice())
    }
}

/// Hands out arenas from process memory, assigning each a distinct GPU address range.
pub struct SystemArenaProvider {
    next_gpu_address: AtomicU64,
}

impl SystemArenaProvider {
    pub fn new() -> SystemArenaProvider {
        SystemArenaProvider {
            next_gpu_address: AtomicU64::new(GPU_VA_BASE),
        }
    }
}

impl Default for SystemArenaProvider {
    fn default() -> SystemArenaProvider {
        SystemArenaProvider::new()
    }
}

impl ArenaProvider for SystemArenaProvider {
    fn allocate_linear_arena(
        &self,
        size: usize,
        alignment: usize,
    ) -> MhwResult<Box<dyn StateHeapArena>> {
        if alignment == 0 || !alignment.is_power_of_two() {
            return Err(MhwError::InvalidArgs);
        }

        let granule = alignment.max(page_size()).max(MHW_PAGE_SIZE as usize);
        let mapped_size = size
            .checked_next_multiple_of(granule)
            .ok_or(MhwError::InvalidArgs)?;
        let memory = PlatformArena::new(mapped_size)?;
        let mut gpu_address = 0;
        self.next_gpu_address
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |next| {
                gpu_address = next.checked_next_multiple_of(granule as u64)?;
                gpu_address.checked_add(mapped_size as u64)
            })
            .map_err(|_| MhwError::WithContext("gpu address space exhausted"))?;

        Ok(Box::new(SystemArena {
            memory,
            gpu_address,
            locked: false,
        }))
    }
}

#[cfg(test)]
mod tests {
    use crate::*;

    #[test]
    fn test_arena_lock_protocol() {
        let provider = SystemArenaProvider::new();
        let mut arena = provider.allocate_linear_arena(100, 64).unwrap();
        assert!(arena.size() >= 100);
        assert_eq!(arena.gpu_address() % 64, 0);
        assert!(matches!(arena.data(), Err(MhwError::NotLocked)));

        arena.lock().unwrap();
        assert!(matches!(arena.lock(), Err(MhwError::AlreadyLocked)));
        arena.data_mut().unwrap()[99] = 7;
        assert_eq!(arena.data().unwrap()[99], 7);
        assert!(arena.data().unwrap()[..99].iter().all(|b| *b == 0));

        arena.unlock().unwrap();
        assert!(matches!(arena.unlock(), Err(MhwError::NotLocked)));
    }

    #[test]
    fn test_distinct_gpu_ranges() {
        let provider = SystemArenaProvider::new();
        let first = provider.allocate_linear_arena(5000, 4096).unwrap();
        let second = provider.allocate_linear_arena(64, 4096).unwrap();
        assert!(second.gpu_address() >= first.gpu_address() + first.size() as u64);
        assert!(provider.allocate_linear_arena(64, 3).is_err());
        assert!(provider.allocate_linear_arena(0, 64).is_err());
    }
}
