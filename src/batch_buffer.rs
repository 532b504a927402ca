// Copyright 2025 Google
// SPDX-License-Identifier: BSD-3-Clause

//! batch_buffer: Second-level command buffers whose reuse is gated on the completion fence.

use std::collections::BTreeMap;

use log::debug;
use log::error;
use mhw::ArenaProvider;
use mhw::StateHeapArena;
use mhw::MHW_PAGE_SIZE;

use crate::renderhal_utils::*;

pub struct BatchBuffer {
    arena: Box<dyn StateHeapArena>,
    size: usize,
    current: usize,
    pub busy: bool,
    pub sync_tag: u32,
}

impl BatchBuffer {
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn remaining(&self) -> usize {
        self.size - self.current
    }

    pub fn is_locked(&self) -> bool {
        self.arena.is_locked()
    }

    pub fn gpu_address(&self) -> u64 {
        self.arena.gpu_address()
    }

    /// Bytes written since the buffer was allocated or rewound.
    pub fn data(&self) -> RenderHalResult<&[u8]> {
        Ok(&self.arena.data()?[..self.current])
    }

    /// Appends `bytes` to a locked buffer.
    pub fn append(&mut self, bytes: &[u8]) -> RenderHalResult<()> {
        if bytes.len() > self.remaining() {
            return Err(RenderHalError::Mhw(mhw::MhwError::CommandBufferFull {
                needed: bytes.len(),
                remaining: self.remaining(),
            }));
        }

        let start = self.current;
        self.arena.data_mut()?[start..start + bytes.len()].copy_from_slice(bytes);
        self.current += bytes.len();
        Ok(())
    }

    pub fn rewind(&mut self) {
        self.current = 0;
    }
}

/// Every batch buffer allocated through the session, by id.
#[derive(Default)]
pub struct BatchBufferList {
    buffers: BTreeMap<usize, BatchBuffer>,
    next_id: usize,
}

impl BatchBufferList {
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Total bytes of all live batch buffers.
    pub fn total_size(&self) -> usize {
        self.buffers.values().map(BatchBuffer::size).sum()
    }

    pub fn get(&self, id: usize) -> RenderHalResult<&BatchBuffer> {
        self.buffers
            .get(&id)
            .ok_or(RenderHalError::InvalidBatchBuffer(id))
    }

    pub fn get_mut(&mut self, id: usize) -> RenderHalResult<&mut BatchBuffer> {
        self.buffers
            .get_mut(&id)
            .ok_or(RenderHalError::InvalidBatchBuffer(id))
    }

    pub fn allocate(&mut self, provider: &dyn ArenaProvider, size: usize) -> RenderHalResult<usize> {
        if size == 0 {
            return Err(RenderHalError::InvalidParameter("empty batch buffer"));
        }

        let arena = provider.allocate_linear_arena(size, MHW_PAGE_SIZE as usize)?;
        let id = self.next_id;
        self.next_id += 1;
        self.buffers.insert(
            id,
            BatchBuffer {
                arena,
                size,
                current: 0,
                busy: false,
                sync_tag: 0,
            },
        );
        debug!("allocated batch buffer {} of {} bytes", id, size);
        Ok(id)
    }

    pub fn free(&mut self, id: usize) -> RenderHalResult<()> {
        if self.get(id)?.is_locked() {
            self.unlock(id)?;
        }
        self.buffers.remove(&id);
        Ok(())
    }

    pub fn free_all(&mut self) {
        self.buffers.clear();
    }

    pub fn lock(&mut self, id: usize) -> RenderHalResult<()> {
        let buffer = self.get_mut(id)?;
        if buffer.is_locked() {
            error!("batch buffer {} is already locked", id);
            return Err(RenderHalError::BatchBufferAlreadyLocked(id));
        }
        buffer.arena.lock()?;
        Ok(())
    }

    pub fn unlock(&mut self, id: usize) -> RenderHalResult<()> {
        let buffer = self.get_mut(id)?;
        if !buffer.is_locked() {
            error!("batch buffer {} is not locked", id);
            return Err(RenderHalError::BatchBufferNotLocked(id));
        }
        buffer.arena.unlock()?;
        Ok(())
    }

    /// Stamps buffer `id` with the tag of the submission that references it.
    pub fn mark_submitted(&mut self, id: usize, next_tag: u32) -> RenderHalResult<()> {
        let buffer = self.get_mut(id)?;
        buffer.busy = true;
        buffer.sync_tag = next_tag;
        Ok(())
    }

    /// Clears the busy flag of buffers whose tag `fence` has passed. Returns how many stay busy.
    pub fn refresh(&mut self, fence: u32) -> usize {
        let mut in_use = 0;
        for buffer in self.buffers.values_mut().filter(|b| b.busy) {
            if fence_passed(fence, buffer.sync_tag) {
                buffer.busy = false;
            } else {
                in_use += 1;
            }
        }
        in_use
    }
}

#[cfg(test)]
mod tests {
    use crate::*;
    use mhw::SystemArenaProvider;

    #[test]
    fn test_lock_protocol() {
        let provider = SystemArenaProvider::new();
        let mut list = BatchBufferList::default();
        let id = list.allocate(&provider, 4096).unwrap();
        assert!(list.allocate(&provider, 0).is_err());

        assert!(matches!(
            list.unlock(id),
            Err(RenderHalError::BatchBufferNotLocked(0))
        ));
        list.lock(id).unwrap();
        assert!(matches!(
            list.lock(id),
            Err(RenderHalError::BatchBufferAlreadyLocked(0))
        ));

        let buffer = list.get_mut(id).unwrap();
        buffer.append(&[1, 2, 3, 4]).unwrap();
        assert_eq!(buffer.data().unwrap(), &[1, 2, 3, 4]);
        assert_eq!(buffer.remaining(), 4092);
        assert!(buffer.append(&vec![0; 4093]).is_err());

        list.free(id).unwrap();
        assert!(list.is_empty());
        assert!(matches!(
            list.lock(id),
            Err(RenderHalError::InvalidBatchBuffer(0))
        ));
    }

    #[test]
    fn test_refresh_by_fence() {
        let provider = SystemArenaProvider::new();
        let mut list = BatchBufferList::default();
        let a = list.allocate(&provider, 4096).unwrap();
        let b = list.allocate(&provider, 8192).unwrap();
        assert_eq!(list.total_size(), 12288);

        list.mark_submitted(a, 10).unwrap();
        list.mark_submitted(b, 11).unwrap();
        assert_eq!(list.refresh(10), 2);
        assert_eq!(list.refresh(11), 1);
        assert!(!list.get(a).unwrap().busy);
        assert!(list.get(b).unwrap().busy);
        assert_eq!(list.refresh(12), 0);
    }
}
