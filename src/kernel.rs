// Copyright 2025 Google
// SPDX-License-Identifier: BSD-3-Clause

//! kernel: Tracks which kernel binaries are resident in the instruction state heap.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use log::debug;
use log::error;
use serde::Serialize;

use crate::renderhal_utils::*;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub enum KernelAllocationState {
    #[default]
    Free,
    Used,
    /// Resident and never picked for eviction.
    Locked,
}

/// Identity of a kernel binary: unique id plus cache id.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct KernelKey {
    pub unique_id: u32,
    pub cache_id: u64,
}

/// Dispatch parameters recorded alongside a resident kernel.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct KernelParams {
    pub grf_count: u32,
    pub binding_table_count: u32,
    pub sampler_count: u32,
    pub thread_count: u32,
    pub curbe_length: u32,
    pub block_width: u32,
    pub block_height: u32,
    pub blocks_x: u32,
    pub blocks_y: u32,
}

/// Caller-owned handle whose flag reports whether its kernel is resident.
///
/// Clones share the flag.
#[derive(Clone, Debug, Default)]
pub struct KernelCacheEntry {
    loaded: Arc<AtomicBool>,
}

impl KernelCacheEntry {
    pub fn new() -> KernelCacheEntry {
        Default::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    fn set_loaded(&self, loaded: bool) {
        self.loaded.store(loaded, Ordering::Release);
    }
}

/// A kernel binary to be placed in the instruction heap.
pub struct KernelBinary<'a> {
    pub binary: &'a [u8],
    pub key: KernelKey,
    pub params: KernelParams,
    pub cache_entry: Option<KernelCacheEntry>,
}

#[derive(Clone, Debug, Default)]
pub struct KernelAllocation {
    /// Interface descriptor index this kernel last used, reused when still unclaimed.
    pub kernel_id: Option<usize>,
    pub key: Option<KernelKey>,
    pub offset: u32,
    pub size: u32,
    pub state: KernelAllocationState,
    pub count: u32,
    pub sync: u32,
    pub alloc_index: usize,
    pub params: KernelParams,
    cache_entry: Option<KernelCacheEntry>,
}

impl KernelAllocation {
    fn release(&mut self) {
        if let Some(entry) = self.cache_entry.take() {
            entry.set_loaded(false);
        }
        self.kernel_id = None;
        self.key = None;
        self.sync = 0;
        self.state = KernelAllocationState::Free;
        self.count = 0;
    }

    pub fn range(&self) -> std::ops::Range<u32> {
        self.offset..self.offset + self.size
    }
}

pub struct KernelAllocationTable {
    slots: Vec<KernelAllocation>,
    access_counter: u32,
    kernel_base: u32,
    heap_size: u32,
    block_size: u32,
    used: u32,
}

impl KernelAllocationTable {
    pub fn new(
        count: usize,
        kernel_base: u32,
        heap_size: u32,
        block_size: u32,
    ) -> KernelAllocationTable {
        let mut table = KernelAllocationTable {
            slots: vec![KernelAllocation::default(); count],
            access_counter: 0,
            kernel_base,
            heap_size,
            block_size,
            used: 0,
        };
        table.reset();
        table
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Bytes of the heap handed out past the high-water mark.
    pub fn used(&self) -> u32 {
        self.used
    }

    pub fn access_counter(&self) -> u32 {
        self.access_counter
    }

    pub fn slots(&self) -> &[KernelAllocation] {
        &self.slots
    }

    pub fn get(&self, index: usize) -> RenderHalResult<&KernelAllocation> {
        self.slots
            .get(index)
            .ok_or(RenderHalError::InvalidKernelAllocation(index))
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> RenderHalResult<&mut KernelAllocation> {
        self.slots
            .get_mut(index)
            .ok_or(RenderHalError::InvalidKernelAllocation(index))
    }

    pub fn offset(&self, index: usize) -> RenderHalResult<u32> {
        Ok(self.get(index)?.offset)
    }

    /// Forces every slot free and rewinds the heap high-water mark.
    pub fn reset(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            slot.release();
            slot.offset = 0;
            slot.size = 0;
            slot.alloc_index = index;
            slot.params = KernelParams::default();
        }
        self.access_counter = 0;
        self.used = 0;
    }

    /// Bumps the slot's LRU counter and stamps it with the next tag to be submitted.
    pub fn touch(&mut self, index: usize, next_tag: u32) -> RenderHalResult<()> {
        let access_counter = self.access_counter;
        let slot = self.get_mut(index)?;
        let bump = !matches!(
            slot.state,
            KernelAllocationState::Free | KernelAllocationState::Locked
        );
        if bump {
            slot.count = access_counter;
        }
        slot.sync = next_tag;
        if bump {
            self.access_counter = access_counter.wrapping_add(1);
        }
        Ok(())
    }

    /// Frees a slot once the GPU has finished with it. Returns whether the slot was freed.
    pub fn unload(&mut self, index: usize, fence: u32) -> RenderHalResult<bool> {
        let slot = self.get_mut(index)?;
        if slot.state == KernelAllocationState::Free {
            return Ok(false);
        }

        if !fence_passed(fence, slot.sync) {
            debug!("kernel slot {} still referenced by tag {}", index, slot.sync);
            return Ok(false);
        }

        debug!("unloading kernel {:?} from slot {}", slot.key, index);
        slot.release();
        Ok(true)
    }

    pub fn lock(&mut self, index: usize) -> RenderHalResult<()> {
        let slot = self.get_mut(index)?;
        if slot.state == KernelAllocationState::Free {
            return Err(RenderHalError::InvalidKernelAllocation(index));
        }
        slot.state = KernelAllocationState::Locked;
        Ok(())
    }

    pub fn unlock(&mut self, index: usize) -> RenderHalResult<()> {
        let slot = self.get_mut(index)?;
        if slot.state != KernelAllocationState::Locked {
            return Err(RenderHalError::InvalidKernelAllocation(index));
        }
        slot.state = KernelAllocationState::Used;
        Ok(())
    }

    fn find_resident(&self, key: KernelKey) -> (Option<usize>, Option<usize>) {
        let mut first_free = None;
        for (index, slot) in self.slots.iter().enumerate() {
            if slot.state == KernelAllocationState::Free {
                if first_free.is_none() {
                    first_free = Some(index);
                }
                continue;
            }
            if slot.key == Some(key) {
                return (Some(index), first_free);
            }
        }
        (None, first_free)
    }

    fn best_fit_hole(&self, size: u32) -> Option<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| {
                slot.state == KernelAllocationState::Free && slot.size > 0 && slot.size >= size
            })
            .min_by_key(|(_, slot)| slot.size)
            .map(|(index, _)| index)
    }

    fn eviction_candidate(&self, size: u32, fence: u32) -> Option<usize> {
        let mut oldest = 0u32;
        let mut candidate = None;
        for (index, slot) in self.slots.iter().enumerate() {
            if slot.state != KernelAllocationState::Used || slot.size < size {
                continue;
            }
            if !fence_passed(fence, slot.sync) {
                continue;
            }
            let age = self.access_counter.wrapping_sub(slot.count);
            if age > oldest {
                oldest = age;
                candidate = Some(index);
            }
        }
        candidate
    }

    fn copy_binary(ish: &mut [u8], slot: &KernelAllocation, binary: &[u8]) -> RenderHalResult<()> {
        let start = slot.offset as usize;
        let region = ish
            .get_mut(start..start + slot.size as usize)
            .ok_or(RenderHalError::InvalidKernelAllocation(slot.alloc_index))?;
        region[..binary.len()].copy_from_slice(binary);
        region[binary.len()..].fill(0);
        Ok(())
    }

    /// Makes `kernel` resident in `ish` and returns its slot.
    ///
    /// `fence` is the GPU-reported completion fence; `next_tag` is the tag the next
    /// submission will carry.
    pub fn load(
        &mut self,
        ish: &mut [u8],
        kernel: KernelBinary<'_>,
        fence: u32,
        next_tag: u32,
        force_reload: bool,
    ) -> RenderHalResult<usize> {
        let kernel_size = u32::try_from(kernel.binary.len())
            .map_err(|_| RenderHalError::InvalidParameter("kernel binary too large"))?;
        if kernel_size == 0 {
            return Err(RenderHalError::InvalidParameter("empty kernel binary"));
        }

        let (resident, first_free) = self.find_resident(kernel.key);
        if let Some(index) = resident {
            if force_reload {
                let slot = &self.slots[index];
                if slot.size < kernel_size {
                    return Err(RenderHalError::KernelHeapFull(kernel_size));
                }
                Self::copy_binary(ish, slot, kernel.binary)?;
            }
            self.touch(index, next_tag)?;
            return Ok(index);
        }

        let aligned_size = checked_align_ceil(kernel_size, self.block_size)?;
        let fits = self
            .used
            .checked_add(aligned_size)
            .is_some_and(|end| end <= self.heap_size);
        let index = match first_free {
            Some(free) if fits => {
                let slot = &mut self.slots[free];
                slot.offset = self.kernel_base + self.used;
                slot.size = aligned_size;
                self.used += aligned_size;
                free
            }
            _ => match self.best_fit_hole(kernel_size) {
                Some(hole) => hole,
                None => {
                    let Some(victim) = self.eviction_candidate(kernel_size, fence) else {
                        error!(
                            "no space for kernel {:?} of {} bytes in the instruction heap",
                            kernel.key, kernel_size
                        );
                        return Err(RenderHalError::KernelHeapFull(kernel_size));
                    };
                    debug!("evicting kernel {:?} from slot {}", self.slots[victim].key, victim);
                    self.unload(victim, fence)?;
                    victim
                }
            },
        };

        let slot = &mut self.slots[index];
        slot.kernel_id = None;
        slot.key = Some(kernel.key);
        slot.sync = 0;
        slot.state = KernelAllocationState::Used;
        slot.count = 0;
        slot.params = kernel.params;
        slot.alloc_index = index;
        slot.cache_entry = kernel.cache_entry;
        Self::copy_binary(ish, &self.slots[index], kernel.binary)?;

        debug!(
            "loaded kernel {:?} into slot {} at {:#x}",
            kernel.key, index, self.slots[index].offset
        );
        self.touch(index, next_tag)?;
        if let Some(entry) = &self.slots[index].cache_entry {
            entry.set_loaded(true);
        }
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use crate::*;

    const HEAP: u32 = 65536;
    const BLOCK: u32 = 4096;

    fn key(unique_id: u32) -> KernelKey {
        KernelKey {
            unique_id,
            cache_id: 0,
        }
    }

    fn binary(key: KernelKey, data: &[u8]) -> KernelBinary<'_> {
        KernelBinary {
            binary: data,
            key,
            params: KernelParams::default(),
            cache_entry: None,
        }
    }

    fn assert_exclusive(table: &KernelAllocationTable) {
        let live: Vec<_> = table
            .slots()
            .iter()
            .filter(|s| s.state != KernelAllocationState::Free)
            .collect();
        for (i, a) in live.iter().enumerate() {
            for b in live.iter().skip(i + 1) {
                assert!(
                    a.range().end <= b.range().start || b.range().end <= a.range().start,
                    "{:?} overlaps {:?}",
                    a.range(),
                    b.range()
                );
            }
        }
    }

    #[test]
    fn test_load_same_kernel_twice() {
        let mut ish = vec![0xffu8; HEAP as usize];
        let mut table = KernelAllocationTable::new(4, 0, HEAP, BLOCK);
        let data = vec![7u8; 5000];

        let first = table.load(&mut ish, binary(key(1), &data), 1, 1, false).unwrap();
        assert_eq!(table.get(first).unwrap().offset, 0);
        assert_eq!(table.used(), 8192);
        assert!(ish[..5000].iter().all(|b| *b == 7));
        assert!(ish[5000..8192].iter().all(|b| *b == 0));

        ish[0] = 0;
        let second = table.load(&mut ish, binary(key(1), &data), 1, 2, false).unwrap();
        assert_eq!(first, second);
        assert_eq!(table.used(), 8192);
        assert_eq!(ish[0], 0);

        table.load(&mut ish, binary(key(1), &data), 1, 2, true).unwrap();
        assert_eq!(ish[0], 7);
    }

    #[test]
    fn test_oversized_kernel_rejected() {
        let mut ish = vec![0u8; HEAP as usize];
        let mut table = KernelAllocationTable::new(4, 0, HEAP, BLOCK);
        let data = vec![1u8; HEAP as usize + 1];
        assert!(matches!(
            table.load(&mut ish, binary(key(1), &data), 1, 1, false),
            Err(RenderHalError::KernelHeapFull(size)) if size == HEAP + 1
        ));
        assert!(matches!(
            table.load(&mut ish, binary(key(2), &[]), 1, 1, false),
            Err(RenderHalError::InvalidParameter(_))
        ));
        assert_eq!(table.used(), 0);
    }

    #[test]
    fn test_cache_entry_tracks_residency() {
        let mut ish = vec![0u8; HEAP as usize];
        let mut table = KernelAllocationTable::new(4, 0, HEAP, BLOCK);
        let entry = KernelCacheEntry::new();
        let data = [1u8; 64];
        let kernel = KernelBinary {
            binary: &data,
            key: key(3),
            params: KernelParams::default(),
            cache_entry: Some(entry.clone()),
        };

        let index = table.load(&mut ish, kernel, 1, 1, false).unwrap();
        assert!(entry.is_loaded());

        // Tag 1 has not completed while the fence still reads 1.
        assert!(!table.unload(index, 1).unwrap());
        assert!(entry.is_loaded());

        assert!(table.unload(index, 2).unwrap());
        assert!(!entry.is_loaded());
        let slot = table.get(index).unwrap();
        assert_eq!(slot.state, KernelAllocationState::Free);
        assert_eq!(slot.size, BLOCK);
        assert!(!table.unload(index, 2).unwrap());
    }

    #[test]
    fn test_best_fit_reuses_smallest_hole() {
        let mut ish = vec![0u8; HEAP as usize];
        let mut table = KernelAllocationTable::new(5, 0, 3 * BLOCK + 2 * BLOCK, BLOCK);
        let small = table
            .load(&mut ish, binary(key(1), &[1u8; 100]), 1, 1, false)
            .unwrap();
        let large = table
            .load(&mut ish, binary(key(2), &[2u8; 8000]), 1, 1, false)
            .unwrap();
        table
            .load(&mut ish, binary(key(3), &[3u8; 8000]), 1, 1, false)
            .unwrap();
        assert_eq!(table.used(), 5 * BLOCK);

        assert!(table.unload(large, 5).unwrap());
        assert!(table.unload(small, 5).unwrap());

        let placed = table
            .load(&mut ish, binary(key(4), &[4u8; 200]), 5, 5, false)
            .unwrap();
        assert_eq!(placed, small);
        assert_eq!(table.get(placed).unwrap().offset, 0);
        assert_exclusive(&table);
    }

    #[test]
    fn test_eviction_respects_fence_and_lock() {
        let mut ish = vec![0u8; HEAP as usize];
        let mut table = KernelAllocationTable::new(8, 0, 2 * BLOCK, BLOCK);
        let a = table
            .load(&mut ish, binary(key(1), &[1u8; 10]), 1, 1, false)
            .unwrap();
        let b = table
            .load(&mut ish, binary(key(2), &[2u8; 10]), 1, 2, false)
            .unwrap();

        // Neither kernel's tag has completed: nothing can be evicted.
        assert!(matches!(
            table.load(&mut ish, binary(key(3), &[3u8; 10]), 1, 3, false),
            Err(RenderHalError::KernelHeapFull(10))
        ));

        // Tag 1 completed: only slot `a` is safe.
        let c = table
            .load(&mut ish, binary(key(3), &[3u8; 10]), 2, 3, false)
            .unwrap();
        assert_eq!(c, a);
        assert_eq!(table.get(b).unwrap().key, Some(key(2)));
        assert_exclusive(&table);

        table.lock(b).unwrap();
        assert!(table
            .load(&mut ish, binary(key(4), &[4u8; 10]), 10, 10, false)
            .is_ok());
        assert_eq!(table.get(b).unwrap().key, Some(key(2)));
        assert_exclusive(&table);
    }

    #[test]
    fn test_lru_picks_oldest() {
        let mut ish = vec![0u8; HEAP as usize];
        let mut table = KernelAllocationTable::new(8, 0, 3 * BLOCK, BLOCK);
        let mut slots = Vec::new();
        for id in 0..3 {
            slots.push(
                table
                    .load(&mut ish, binary(key(id), &[0u8; 16]), 1, 1, false)
                    .unwrap(),
            );
        }
        table.touch(slots[0], 1).unwrap();
        table.touch(slots[2], 1).unwrap();

        let placed = table
            .load(&mut ish, binary(key(9), &[0u8; 16]), 2, 2, false)
            .unwrap();
        assert_eq!(placed, slots[1]);
    }

    #[test]
    fn test_touch_locked_only_stamps_sync() {
        let mut ish = vec![0u8; HEAP as usize];
        let mut table = KernelAllocationTable::new(2, 0, HEAP, BLOCK);
        let index = table
            .load(&mut ish, binary(key(1), &[0u8; 16]), 1, 1, false)
            .unwrap();
        table.lock(index).unwrap();
        let counter = table.access_counter();
        table.touch(index, 42).unwrap();
        assert_eq!(table.access_counter(), counter);
        assert_eq!(table.get(index).unwrap().sync, 42);
    }

    #[test]
    fn test_reset() {
        let mut ish = vec![0u8; HEAP as usize];
        let mut table = KernelAllocationTable::new(3, 0, HEAP, BLOCK);
        let entry = KernelCacheEntry::new();
        let data = [0u8; 16];
        table
            .load(
                &mut ish,
                KernelBinary {
                    binary: &data,
                    key: key(1),
                    params: KernelParams::default(),
                    cache_entry: Some(entry.clone()),
                },
                1,
                1,
                false,
            )
            .unwrap();
        table.reset();
        assert!(!entry.is_loaded());
        assert_eq!(table.used(), 0);
        assert_eq!(table.access_counter(), 0);
        for (i, slot) in table.slots().iter().enumerate() {
            assert_eq!(slot.state, KernelAllocationState::Free);
            assert_eq!((slot.offset, slot.size, slot.alloc_index), (0, 0, i));
        }
        assert!(table.offset(3).is_err());
    }
}
