// Copyright 2025 Google
// SPDX-License-Identifier: MIT

use crate::mhw_defines::MhwResult;

/// A CPU-mapped, GPU-visible linear memory block.
///
/// CPU access through `data`/`data_mut` is only permitted while the arena is locked.
pub trait StateHeapArena {
    fn size(&self) -> usize;

    fn gpu_address(&self) -> u64;

    fn lock(&mut self) -> MhwResult<()>;

    fn unlock(&mut self) -> MhwResult<()>;

    fn is_locked(&self) -> bool;

    fn data(&self) -> MhwResult<&[u8]>;

    fn data_mut(&mut self) -> MhwResult<&mut [u8]>;
}

pub trait ArenaProvider {
    fn allocate_linear_arena(
        &self,
        size: usize,
        alignment: usize,
    ) -> MhwResult<Box<dyn StateHeapArena>>;
}

/// Submission and completion-fence capability of one GPU context.
///
/// The completion fence is the last tag written by the GPU: all work stamped with a tag
/// strictly below it has finished.
pub trait GpuContext {
    fn completion_fence(&self) -> u32;

    fn next_fence_to_request(&self) -> u32;

    fn wait_for_completion_event(&self, timeout_ms: u32) -> MhwResult<()>;

    fn submit_command_buffer(&self, commands: &[u8]) -> MhwResult<()>;
}

pub trait CommandBuffer {
    fn append(&mut self, bytes: &[u8]) -> MhwResult<()>;

    fn remaining(&self) -> usize;

    fn commands(&self) -> &[u8];
}
