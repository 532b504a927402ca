// Copyright 2025 Google
// SPDX-License-Identifier: BSD-3-Clause

//! media_state: Ring of per-dispatch regions (CURBE, samplers, interface descriptors and a
//! timestamp trailer) inside the general state heap.

use log::debug;
use log::error;
use log::warn;
use mhw::read_record;
use mhw::write_record;
use mhw::GpuContext;
use mhw::MhwMediaStateTrailer;
use mhw::MHW_EVENT_TIMEOUT_MS;
use serde::Serialize;

use crate::kernel::KernelAllocation;
use crate::layout::ArenaLayout;
use crate::layout::MediaStateLayout;
use crate::renderhal_utils::*;

#[derive(Clone, Debug, Default, Serialize)]
pub struct MediaState {
    pub index: usize,
    /// Byte offset of the media state in the general state heap.
    pub offset: u32,
    /// Tag the GPU must pass before the media state can be reused.
    pub sync_tag: u32,
    pub busy: bool,
    /// Bytes of CURBE handed out for the current dispatch.
    pub curbe_offset: u32,
    /// Kernel allocation index owning each interface descriptor.
    pub allocation: Vec<Option<usize>>,
}

impl MediaState {
    fn clear(&mut self) {
        self.curbe_offset = 0;
        self.allocation.fill(None);
    }
}

/// Round-robin ring of media states.
pub struct MediaStateRing {
    states: Vec<MediaState>,
    layout: MediaStateLayout,
    next: usize,
    current: Option<usize>,
    states_in_use: usize,
}

impl MediaStateRing {
    pub fn new(layout: &ArenaLayout) -> MediaStateRing {
        let states = (0..layout.media_state_count as usize)
            .map(|index| MediaState {
                index,
                offset: layout.media_state_offset(index),
                allocation: vec![None; layout.media_ids as usize],
                ..Default::default()
            })
            .collect();

        MediaStateRing {
            states,
            layout: layout.media_state,
            next: 0,
            current: None,
            states_in_use: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn states(&self) -> &[MediaState] {
        &self.states
    }

    pub fn layout(&self) -> &MediaStateLayout {
        &self.layout
    }

    pub fn next(&self) -> usize {
        self.next
    }

    pub fn states_in_use(&self) -> usize {
        self.states_in_use
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> RenderHalResult<&MediaState> {
        self.current
            .and_then(|index| self.states.get(index))
            .ok_or(RenderHalError::InvalidMediaState)
    }

    fn current_mut(&mut self) -> RenderHalResult<&mut MediaState> {
        self.current
            .and_then(|index| self.states.get_mut(index))
            .ok_or(RenderHalError::InvalidMediaState)
    }

    /// Marks every media state idle and rewinds the ring.
    pub fn reset(&mut self) {
        for state in &mut self.states {
            state.busy = false;
            state.sync_tag = 0;
            state.clear();
        }
        self.next = 0;
        self.current = None;
        self.states_in_use = 0;
    }

    /// Clears the busy flag of every media state whose tag `fence` has passed and returns
    /// their indices.
    pub fn refresh(&mut self, fence: u32) -> Vec<usize> {
        let mut completed = Vec::new();
        let mut in_use = 0;
        for state in &mut self.states {
            if !state.busy {
                continue;
            }
            if fence_passed(fence, state.sync_tag) {
                state.busy = false;
                completed.push(state.index);
            } else {
                in_use += 1;
            }
        }
        self.states_in_use = in_use;
        completed
    }

    /// Takes the next media state of the ring for a new dispatch by `component`.
    ///
    /// Waits up to `timeout_ms` for the GPU to release it when it is still busy.
    pub fn assign(
        &mut self,
        ctx: &dyn GpuContext,
        gsh: &mut [u8],
        timeout_ms: u32,
        component: RenderHalComponent,
    ) -> RenderHalResult<usize> {
        let index = self.next;
        let state = self
            .states
            .get(index)
            .ok_or(RenderHalError::InvalidMediaState)?;

        if state.busy && !fence_passed(ctx.completion_fence(), state.sync_tag) {
            let tag = state.sync_tag;
            let mut released = false;
            for _ in 0..timeout_ms {
                if let Err(e) = ctx.wait_for_completion_event(MHW_EVENT_TIMEOUT_MS) {
                    warn!("wait for completion event failed: {}", e);
                }
                if fence_passed(ctx.completion_fence(), tag) {
                    released = true;
                    break;
                }
            }
            if !released {
                error!(
                    "media state {} still busy with tag {} after {} ms",
                    index, tag, timeout_ms
                );
                return Err(RenderHalError::Timeout {
                    index,
                    tag,
                    timeout_ms,
                });
            }
        }

        let next_tag = ctx.next_fence_to_request();
        let trailer_offset = self.states[index].offset + self.layout.start_time_offset;
        let trailer = MhwMediaStateTrailer {
            component: component as u32,
            ..Default::default()
        };
        write_record(gsh, trailer_offset as usize, &trailer)?;

        let state = &mut self.states[index];
        state.sync_tag = next_tag;
        state.busy = true;
        state.clear();

        self.current = Some(index);
        self.next = (index + 1) % self.states.len();
        debug!(
            "assigned media state {} to {:?} with tag {}",
            index, component, next_tag
        );
        Ok(index)
    }

    /// Reads the timestamp trailer of media state `index`.
    pub fn read_trailer(&self, gsh: &[u8], index: usize) -> RenderHalResult<MhwMediaStateTrailer> {
        let state = self
            .states
            .get(index)
            .ok_or(RenderHalError::InvalidMediaState)?;
        let offset = state.offset + self.layout.start_time_offset;
        Ok(read_record(gsh, offset as usize)?)
    }

    /// Reserves `size` bytes of CURBE in the current media state, rounded up to a CURBE
    /// block, and returns their offset inside the CURBE region.
    pub fn reserve_curbe(&mut self, size: u32) -> RenderHalResult<u32> {
        let curbe_size = self.layout.curbe_size;
        let state = self.current_mut()?;
        let aligned = align_ceil(size, RENDERHAL_CURBE_BLOCK_ALIGN);
        let available = curbe_size.saturating_sub(state.curbe_offset);
        if aligned > available {
            error!(
                "media state {} has {} curbe bytes left, {} requested",
                state.index, available, aligned
            );
            return Err(RenderHalError::CurbeExhausted {
                requested: aligned,
                available,
            });
        }

        let offset = state.curbe_offset;
        state.curbe_offset += aligned;
        Ok(offset)
    }

    /// Copies `data` into the current media state's CURBE and returns its offset inside the
    /// CURBE region. The block-alignment padding is zeroed.
    pub fn load_curbe(&mut self, gsh: &mut [u8], data: &[u8]) -> RenderHalResult<u32> {
        let size = u32::try_from(data.len())
            .map_err(|_| RenderHalError::InvalidParameter("curbe data too large"))?;
        let offset = self.reserve_curbe(size)?;
        let state = self.current()?;
        let start = (state.offset + self.layout.curbe_offset + offset) as usize;
        let end = start + align_ceil(size, RENDERHAL_CURBE_BLOCK_ALIGN) as usize;
        let region = gsh
            .get_mut(start..end)
            .ok_or(RenderHalError::InvalidParameter("curbe outside the general heap"))?;
        region[..data.len()].copy_from_slice(data);
        region[data.len()..].fill(0);
        Ok(offset)
    }

    /// Picks an interface descriptor of the current media state for `kernel`.
    ///
    /// The descriptor the kernel used last is reused when it is free or already owned by the
    /// same allocation slot; otherwise the first unowned descriptor is taken.
    pub fn get_media_id(&mut self, kernel: &mut KernelAllocation) -> RenderHalResult<usize> {
        let alloc_index = kernel.alloc_index;
        let state = self.current_mut()?;

        let hint = kernel.kernel_id.filter(|&id| {
            matches!(state.allocation.get(id), Some(None))
                || state.allocation.get(id) == Some(&Some(alloc_index))
        });
        let id = match hint {
            Some(id) => id,
            None => state
                .allocation
                .iter()
                .position(Option::is_none)
                .ok_or(RenderHalError::MediaIdExhausted)?,
        };

        state.allocation[id] = Some(alloc_index);
        if kernel.kernel_id.is_none() {
            kernel.kernel_id = Some(id);
        }
        Ok(id)
    }

    /// Byte offset in the general state heap of interface descriptor `id` of the current
    /// media state.
    pub fn media_id_offset(&self, id: usize) -> RenderHalResult<u32> {
        let state = self.current()?;
        Ok(state.offset + self.layout.media_id_offset + id as u32 * self.layout.media_id_size)
    }

    /// Byte offset in the general state heap of the sampler block of interface descriptor
    /// `id` of the current media state.
    pub fn sampler_offset(&self, id: usize) -> RenderHalResult<u32> {
        let state = self.current()?;
        Ok(state.offset + self.layout.sampler_offset + id as u32 * self.layout.sampler_stride)
    }
}
