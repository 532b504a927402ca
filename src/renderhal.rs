// Copyright 2025 Google
// SPDX-License-Identifier: BSD-3-Clause

//! renderhal: The state-heap session. Owns the general, instruction and surface state heaps
//! and everything carved out of them.

use std::time::Duration;

use log::debug;
use log::error;
use log::info;
use mhw::ArenaProvider;
use mhw::CommandBuffer;
use mhw::GpuContext;
use mhw::LinearCommandBuffer;
use mhw::MhwGpgpuWalkerParams;
use mhw::MhwIdEntryParams;
use mhw::MhwRenderInterface;
use mhw::MhwSamplerState;
use mhw::MhwStateBaseAddressParams;
use mhw::MhwVfeParams;
use mhw::PlatformDescriptor;
use mhw::StateHeapArena;
use mhw::MHW_PAGE_SIZE;
use serde::Serialize;

use crate::batch_buffer::BatchBufferList;
use crate::kernel::KernelAllocationState;
use crate::kernel::KernelAllocationTable;
use crate::kernel::KernelBinary;
use crate::layout::plan_layout;
use crate::layout::ArenaLayout;
use crate::media_state::MediaStateRing;
use crate::palette::PaletteTable;
use crate::renderhal_utils::*;
use crate::sequencer;
use crate::sequencer::MediaStatesParams;
use crate::sequencer::VfeRequest;
use crate::sequencer::Walker;
use crate::settings::RenderHalSettings;
use crate::settings::StateHeapSettings;
use crate::surface;
use crate::surface::FormatPolicy;
use crate::surface::RenderHalSurface;
use crate::surface::SurfaceStateParams;
use crate::surface_state::SurfaceStateEntry;
use crate::surface_state::SurfaceStatePool;

const RENDERHAL_COMMAND_BUFFER_SIZE: usize = 0x10000;

/// One sampler slot of an interface descriptor.
#[derive(Copy, Clone, Debug, Default)]
pub enum SamplerStateParams {
    #[default]
    Unused,
    Sampler3D(MhwSamplerState),
    Avs(MhwSamplerState),
}

struct StateHeaps {
    layout: ArenaLayout,
    gsh: Box<dyn StateHeapArena>,
    ish: Box<dyn StateHeapArena>,
    ssh: Box<dyn StateHeapArena>,
    kernels: KernelAllocationTable,
    media_states: MediaStateRing,
    surfaces: SurfaceStatePool,
    sip_loaded: bool,
}

#[derive(Serialize)]
struct HeapStatus<'a> {
    layout: &'a ArenaLayout,
    kernels_loaded: usize,
    kernel_heap_used: u32,
    media_states_in_use: usize,
    next_media_state: usize,
    current_media_state: Option<usize>,
    surface_states_used: usize,
    binding_tables_used: usize,
    batch_buffers: usize,
    batch_buffers_in_use: usize,
}

/// A render/media state-heap session for one GPU.
pub struct RenderHal {
    render: MhwRenderInterface,
    settings: RenderHalSettings,
    provider: Box<dyn ArenaProvider>,
    heaps: Option<StateHeaps>,
    palettes: PaletteTable,
    batch_buffers: BatchBufferList,
    batch_buffers_in_use: usize,
    kernel_time: [Duration; RENDERHAL_COMPONENT_COUNT],
    vfe: Option<MhwVfeParams>,
    current_id_params: Option<MhwIdEntryParams>,
}

impl RenderHal {
    pub fn new(
        platform: PlatformDescriptor,
        settings: RenderHalSettings,
        provider: Box<dyn ArenaProvider>,
    ) -> RenderHal {
        RenderHal {
            render: MhwRenderInterface::new(platform),
            settings,
            provider,
            heaps: None,
            palettes: PaletteTable::default(),
            batch_buffers: BatchBufferList::default(),
            batch_buffers_in_use: 0,
            kernel_time: [Duration::ZERO; RENDERHAL_COMPONENT_COUNT],
            vfe: None,
            current_id_params: None,
        }
    }

    pub fn platform(&self) -> &PlatformDescriptor {
        self.render.platform()
    }

    pub fn render(&self) -> &MhwRenderInterface {
        &self.render
    }

    pub fn settings(&self) -> &RenderHalSettings {
        &self.settings
    }

    fn heaps(&self) -> RenderHalResult<&StateHeaps> {
        self.heaps.as_ref().ok_or(RenderHalError::HeapNotAllocated)
    }

    fn heaps_mut(&mut self) -> RenderHalResult<&mut StateHeaps> {
        self.heaps.as_mut().ok_or(RenderHalError::HeapNotAllocated)
    }

    pub fn layout(&self) -> RenderHalResult<&ArenaLayout> {
        Ok(&self.heaps()?.layout)
    }

    pub fn kernels(&self) -> RenderHalResult<&KernelAllocationTable> {
        Ok(&self.heaps()?.kernels)
    }

    pub fn media_states(&self) -> RenderHalResult<&MediaStateRing> {
        Ok(&self.heaps()?.media_states)
    }

    pub fn surface_states(&self) -> RenderHalResult<&SurfaceStatePool> {
        Ok(&self.heaps()?.surfaces)
    }

    pub fn palettes(&self) -> &PaletteTable {
        &self.palettes
    }

    pub fn batch_buffers(&self) -> &BatchBufferList {
        &self.batch_buffers
    }

    /// Read access to the general state heap.
    pub fn general_state_heap(&self) -> RenderHalResult<&[u8]> {
        Ok(self.heaps()?.gsh.data()?)
    }

    /// Read access to the instruction state heap.
    pub fn instruction_state_heap(&self) -> RenderHalResult<&[u8]> {
        Ok(self.heaps()?.ish.data()?)
    }

    /// Read access to the surface state heap.
    pub fn surface_state_heap(&self) -> RenderHalResult<&[u8]> {
        Ok(self.heaps()?.ssh.data()?)
    }

    /// Plans the heap layout for `settings` and allocates the three heaps, locked for CPU
    /// access for the lifetime of the session.
    ///
    /// Heaps from an earlier call are released first.
    pub fn allocate_state_heaps(&mut self, settings: &StateHeapSettings) -> RenderHalResult<()> {
        let layout = plan_layout(settings, self.render.platform())?;
        self.free_state_heaps();

        let alignment = MHW_PAGE_SIZE as usize;
        let mut gsh = self
            .provider
            .allocate_linear_arena(layout.gsh_size as usize, alignment)?;
        let mut ish = self
            .provider
            .allocate_linear_arena(layout.ish_size as usize, alignment)?;
        let mut ssh = self
            .provider
            .allocate_linear_arena(layout.indirect_heap_size as usize, alignment)?;
        gsh.lock()?;
        ish.lock()?;
        ssh.lock()?;
        gsh.data_mut()?.fill(0);
        ish.data_mut()?.fill(0);
        ssh.data_mut()?.fill(0);

        let kernels = KernelAllocationTable::new(
            settings.kernel_count as usize,
            layout.kernel_base,
            layout.kernel_heap_size,
            settings.kernel_block_size,
        );
        let media_states = MediaStateRing::new(&layout);
        let surfaces = SurfaceStatePool::new(&layout, settings);

        info!(
            "state heaps allocated: gsh {} bytes, ish {} bytes, ssh {} bytes",
            layout.gsh_size, layout.ish_size, layout.indirect_heap_size
        );
        self.settings.state_heap = settings.clone();
        self.heaps = Some(StateHeaps {
            layout,
            gsh,
            ish,
            ssh,
            kernels,
            media_states,
            surfaces,
            sip_loaded: false,
        });
        self.palettes = PaletteTable::default();
        self.batch_buffers.free_all();
        self.batch_buffers_in_use = 0;
        self.vfe = None;
        self.current_id_params = None;
        Ok(())
    }

    /// Releases the heaps and every batch buffer. Calling it again is a no-op.
    pub fn free_state_heaps(&mut self) {
        if let Some(mut heaps) = self.heaps.take() {
            for arena in [&mut heaps.gsh, &mut heaps.ish, &mut heaps.ssh] {
                if arena.is_locked() {
                    if let Err(e) = arena.unlock() {
                        error!("failed to unlock state heap: {}", e);
                    }
                }
            }
            debug!("state heaps released");
        }
        self.batch_buffers.free_all();
        self.batch_buffers_in_use = 0;
        self.current_id_params = None;
    }

    /// Rewinds every allocator without giving memory back.
    pub fn reset(&mut self) -> RenderHalResult<()> {
        let heaps = self.heaps_mut()?;
        heaps.kernels.reset();
        heaps.media_states.reset();
        heaps.surfaces.assign_ssh_instance();
        self.palettes.reset_counts();
        self.kernel_time = [Duration::ZERO; RENDERHAL_COMPONENT_COUNT];
        self.vfe = None;
        self.current_id_params = None;
        Ok(())
    }

    /// Releases every media state and batch buffer whose tag the GPU has passed.
    ///
    /// With kernel-time telemetry on, the trailers of the released media states are added to
    /// the per-component totals.
    pub fn refresh_sync(&mut self, ctx: &dyn GpuContext) -> RenderHalResult<()> {
        let fence = ctx.completion_fence();
        self.batch_buffers_in_use = self.batch_buffers.refresh(fence);

        let dump = self.settings.enable_kernel_time_dump;
        let heaps = self.heaps.as_mut().ok_or(RenderHalError::HeapNotAllocated)?;
        let completed = heaps.media_states.refresh(fence);
        if !dump {
            return Ok(());
        }

        let gsh = heaps.gsh.data()?;
        for index in completed {
            let trailer = heaps.media_states.read_trailer(gsh, index)?;
            let ticks = trailer.end_time.wrapping_sub(trailer.start_time);
            let elapsed = Duration::from_nanos(self.render.platform().ticks_to_ns(ticks));
            if let Some(total) = self.kernel_time.get_mut(trailer.component as usize) {
                *total += elapsed;
            }
        }
        Ok(())
    }

    /// Accumulated kernel execution time of `component`.
    pub fn kernel_time(&self, component: RenderHalComponent) -> Duration {
        self.kernel_time
            .get(component.index())
            .copied()
            .unwrap_or_default()
    }

    /// Takes the next media state of the ring for a dispatch by `component` and returns its
    /// index.
    pub fn assign_media_state(
        &mut self,
        ctx: &dyn GpuContext,
        component: RenderHalComponent,
    ) -> RenderHalResult<usize> {
        self.refresh_sync(ctx)?;

        let timeout_ms = self.settings.timeout_ms;
        let heaps = self.heaps_mut()?;
        let gsh = heaps.gsh.data_mut()?;
        let index = heaps.media_states.assign(ctx, gsh, timeout_ms, component)?;

        self.palettes.reset_counts();
        self.current_id_params = None;
        Ok(index)
    }

    pub fn load_kernel(
        &mut self,
        ctx: &dyn GpuContext,
        kernel: KernelBinary<'_>,
        force_reload: bool,
    ) -> RenderHalResult<usize> {
        let fence = ctx.completion_fence();
        let next_tag = ctx.next_fence_to_request();
        let heaps = self.heaps_mut()?;
        let ish = heaps.ish.data_mut()?;
        heaps.kernels.load(ish, kernel, fence, next_tag, force_reload)
    }

    /// Frees kernel slot `index` unless the GPU may still run it. Returns whether it was freed.
    pub fn unload_kernel(&mut self, ctx: &dyn GpuContext, index: usize) -> RenderHalResult<bool> {
        let fence = ctx.completion_fence();
        self.heaps_mut()?.kernels.unload(index, fence)
    }

    pub fn touch_kernel(&mut self, ctx: &dyn GpuContext, index: usize) -> RenderHalResult<()> {
        let next_tag = ctx.next_fence_to_request();
        self.heaps_mut()?.kernels.touch(index, next_tag)
    }

    pub fn lock_kernel(&mut self, index: usize) -> RenderHalResult<()> {
        self.heaps_mut()?.kernels.lock(index)
    }

    pub fn unlock_kernel(&mut self, index: usize) -> RenderHalResult<()> {
        self.heaps_mut()?.kernels.unlock(index)
    }

    pub fn reset_kernels(&mut self) -> RenderHalResult<()> {
        self.heaps_mut()?.kernels.reset();
        Ok(())
    }

    /// Instruction heap offset of kernel slot `index`.
    pub fn get_kernel_offset(&self, index: usize) -> RenderHalResult<u32> {
        self.heaps()?.kernels.offset(index)
    }

    /// Copies the system instruction pointer routine into its instruction heap region.
    pub fn load_sip_kernel(&mut self, binary: &[u8]) -> RenderHalResult<()> {
        let heaps = self.heaps_mut()?;
        let start = heaps.layout.sip_base as usize;
        let size = heaps.layout.sip_size as usize;
        if binary.is_empty() || binary.len() > size {
            error!("sip kernel of {} bytes does not fit in {} bytes", binary.len(), size);
            return Err(RenderHalError::InvalidParameter("sip kernel size"));
        }

        let ish = heaps.ish.data_mut()?;
        let region = ish
            .get_mut(start..start + size)
            .ok_or(RenderHalError::InvalidParameter("sip region outside the instruction heap"))?;
        region[..binary.len()].copy_from_slice(binary);
        region[binary.len()..].fill(0);
        heaps.sip_loaded = true;
        Ok(())
    }

    /// Copies `data` into the CURBE of the current media state. Returns its offset inside
    /// the CURBE region.
    pub fn load_curbe_data(&mut self, data: &[u8]) -> RenderHalResult<u32> {
        let heaps = self.heaps_mut()?;
        let gsh = heaps.gsh.data_mut()?;
        heaps.media_states.load_curbe(gsh, data)
    }

    /// Claims an interface descriptor of the current media state for kernel slot
    /// `kernel_index` and writes it into the general state heap.
    ///
    /// The CURBE range must lie inside what `load_curbe_data` already placed in the current
    /// media state. A `gpgpu` walker turns on the barrier and sizes the thread group and
    /// shared local memory from it.
    #[allow(clippy::too_many_arguments)]
    pub fn allocate_media_id(
        &mut self,
        ctx: &dyn GpuContext,
        kernel_index: usize,
        binding_table: usize,
        curbe_offset: u32,
        curbe_length: u32,
        cross_thread_length: u32,
        gpgpu: Option<&MhwGpgpuWalkerParams>,
    ) -> RenderHalResult<usize> {
        let next_tag = ctx.next_fence_to_request();
        let platform = *self.render.platform();
        let heaps = self.heaps.as_mut().ok_or(RenderHalError::HeapNotAllocated)?;

        let loaded = heaps.media_states.current()?.curbe_offset;
        let kernel = heaps.kernels.get(kernel_index)?;
        if kernel.state == KernelAllocationState::Free || kernel.size == 0 {
            error!("kernel slot {} is not loaded", kernel_index);
            return Err(RenderHalError::InvalidKernelAllocation(kernel_index));
        }
        if binding_table >= heaps.surfaces.binding_tables() {
            return Err(RenderHalError::InvalidParameter("binding table out of range"));
        }

        let (curbe_offset, curbe_length) = if curbe_length == 0 {
            (0, 0)
        } else {
            let in_range = curbe_offset
                .checked_add(curbe_length)
                .is_some_and(|end| end <= loaded);
            if curbe_offset % 32 != 0 || !in_range {
                error!(
                    "curbe range {}+{} outside the {} bytes loaded",
                    curbe_offset, curbe_length, loaded
                );
                return Err(RenderHalError::InvalidCurbeRange {
                    offset: curbe_offset,
                    length: curbe_length,
                    loaded,
                });
            }
            (curbe_offset, curbe_length)
        };

        let id = heaps
            .media_states
            .get_media_id(heaps.kernels.get_mut(kernel_index)?)?;
        let kernel = heaps.kernels.get(kernel_index)?;
        let (barrier_enable, threads_in_group, slm_size) = match gpgpu {
            Some(walker) => (
                true,
                walker.thread_width * walker.thread_height,
                platform.encode_slm_size(walker.slm_size),
            ),
            None => (false, 1, 0),
        };
        let params = MhwIdEntryParams {
            kernel_offset: kernel.offset,
            sampler_offset: heaps.media_states.sampler_offset(id)?,
            sampler_count: kernel.params.sampler_count,
            binding_table_offset: heaps.surfaces.binding_table_offset(binding_table),
            curbe_offset,
            curbe_length,
            cross_thread_constant_data_length: cross_thread_length,
            barrier_enable,
            threads_in_group,
            slm_size,
        };

        let offset = heaps.media_states.media_id_offset(id)?;
        let gsh = heaps.gsh.data_mut()?;
        self.render
            .set_interface_descriptor_entry(gsh, offset as usize, &params)?;
        heaps.kernels.touch(kernel_index, next_tag)?;

        self.current_id_params = Some(params);
        Ok(id)
    }

    /// Writes the samplers of interface descriptor `media_id` in the current media state.
    ///
    /// 3D samplers go to their slot in the sampler block; AVS samplers are packed into the
    /// AVS block in the order given.
    pub fn set_sampler_states(
        &mut self,
        media_id: usize,
        samplers: &[SamplerStateParams],
    ) -> RenderHalResult<()> {
        let sizes = self.render.platform().sizes;
        let max_samplers = self.settings.state_heap.samplers as usize;
        let heaps = self.heaps.as_mut().ok_or(RenderHalError::HeapNotAllocated)?;
        if media_id >= heaps.layout.media_ids as usize {
            return Err(RenderHalError::InvalidParameter("media id out of range"));
        }
        if samplers.len() > max_samplers {
            return Err(RenderHalError::InvalidParameter("too many samplers"));
        }

        let ms_layout = *heaps.media_states.layout();
        let base = heaps.media_states.sampler_offset(media_id)?;
        let mut avs_offset = heaps.media_states.current()?.offset
            + ms_layout.sampler_avs_offset
            + media_id as u32 * ms_layout.sampler_stride;
        let gsh = heaps.gsh.data_mut()?;
        for (index, sampler) in samplers.iter().enumerate() {
            match sampler {
                SamplerStateParams::Unused => (),
                SamplerStateParams::Sampler3D(state) => {
                    let offset = base + index as u32 * sizes.sampler_state;
                    self.render.set_sampler_state(gsh, offset as usize, state)?;
                }
                SamplerStateParams::Avs(state) => {
                    if ms_layout.sampler_avs_size == 0 {
                        return Err(RenderHalError::InvalidParameter("no avs sampler block"));
                    }
                    self.render
                        .set_sampler_state(gsh, avs_offset as usize, state)?;
                    avs_offset += sizes.sampler_state_avs;
                }
            }
        }
        Ok(())
    }

    pub fn format_policy(&self) -> FormatPolicy {
        let platform = self.render.platform();
        FormatPolicy {
            gen10_or_later: platform.generation.is_gen10_or_later(),
            nv12_height_workaround: platform.nv12_height_workaround,
            p010_single_pass: self.settings.enable_p010_single_pass,
            yv12_single_pass: self.settings.enable_yv12_single_pass,
            max_palettes: self.palettes.max_palettes(),
        }
    }

    pub fn is_2plane_nv12_needed(
        &self,
        surface: &RenderHalSurface,
        params: &SurfaceStateParams,
    ) -> bool {
        surface::is_2plane_nv12_needed(&self.format_policy(), surface, params.boundary)
    }

    /// Starts a new frame in the surface state heap.
    pub fn assign_ssh_instance(&mut self) -> RenderHalResult<()> {
        self.heaps_mut()?.surfaces.assign_ssh_instance();
        Ok(())
    }

    pub fn assign_binding_table(&mut self) -> RenderHalResult<usize> {
        let heaps = self.heaps_mut()?;
        let ssh = heaps.ssh.data_mut()?;
        heaps.surfaces.assign_binding_table(ssh)
    }

    pub fn assign_surface_state(&mut self, surface_type: SurfaceStateType) -> RenderHalResult<usize> {
        self.heaps_mut()?.surfaces.assign_surface_state(surface_type)
    }

    pub fn surface_state_entry(&self, index: usize) -> RenderHalResult<&SurfaceStateEntry> {
        self.heaps()?.surfaces.entry(index)
    }

    pub fn get_surface_state_entries(
        &mut self,
        surface: &mut RenderHalSurface,
        params: &mut SurfaceStateParams,
    ) -> RenderHalResult<Vec<usize>> {
        let policy = self.format_policy();
        self.heaps_mut()?
            .surfaces
            .get_surface_state_entries(&policy, surface, params)
    }

    /// Expands `surface` into its plane entries and writes their hardware surface states.
    /// Returns the plane count and the entry indices.
    pub fn setup_surface_states(
        &mut self,
        surface: &mut RenderHalSurface,
        params: &mut SurfaceStateParams,
    ) -> RenderHalResult<(usize, Vec<usize>)> {
        let indices = self.get_surface_state_entries(surface, params)?;
        let heaps = self.heaps.as_mut().ok_or(RenderHalError::HeapNotAllocated)?;
        let ssh = heaps.ssh.data_mut()?;
        for index in &indices {
            heaps.surfaces.setup_surface_state(&self.render, ssh, *index)?;
        }
        Ok((indices.len(), indices))
    }

    pub fn bind_surface_state(
        &mut self,
        binding_table: usize,
        bt_entry: usize,
        index: usize,
    ) -> RenderHalResult<()> {
        let heaps = self.heaps.as_mut().ok_or(RenderHalError::HeapNotAllocated)?;
        let ssh = heaps.ssh.data_mut()?;
        heaps
            .surfaces
            .bind_surface_state(&self.render, ssh, binding_table, bt_entry, index)
    }

    /// Changes the binding table size while keeping the surface state heap size. Returns the
    /// effective surfaces per binding table.
    pub fn set_surfaces_per_bt(&mut self, surfaces: u32) -> RenderHalResult<u32> {
        self.heaps_mut()?.surfaces.set_surfaces_per_bt(surfaces)
    }

    pub fn allocate_palette_id(&mut self) -> RenderHalResult<usize> {
        self.palettes.allocate_palette_id()
    }

    pub fn get_palette_entry(&mut self, id: usize, entries: usize) -> RenderHalResult<&mut [u32]> {
        self.palettes.get_palette_entry(id, entries)
    }

    pub fn free_palette_id(&mut self, id: usize) -> RenderHalResult<()> {
        self.palettes.free_palette_id(id)
    }

    pub fn enable_palette(&mut self, id: usize, entries: usize) -> RenderHalResult<()> {
        self.palettes.enable_palette(id, entries)
    }

    pub fn allocate_chroma_key(&mut self, low: u32, high: u32) -> RenderHalResult<usize> {
        self.palettes.allocate_chroma_key(low, high)
    }

    pub fn allocate_batch_buffer(&mut self, size: usize) -> RenderHalResult<usize> {
        self.batch_buffers.allocate(self.provider.as_ref(), size)
    }

    pub fn free_batch_buffer(&mut self, id: usize) -> RenderHalResult<()> {
        self.batch_buffers.free(id)
    }

    pub fn lock_batch_buffer(&mut self, id: usize) -> RenderHalResult<()> {
        self.batch_buffers.lock(id)
    }

    pub fn unlock_batch_buffer(&mut self, id: usize) -> RenderHalResult<()> {
        self.batch_buffers.unlock(id)
    }

    /// Appends commands to a locked batch buffer.
    pub fn append_batch_buffer(&mut self, id: usize, bytes: &[u8]) -> RenderHalResult<()> {
        self.batch_buffers.get_mut(id)?.append(bytes)
    }

    pub fn mark_batch_buffer_submitted(
        &mut self,
        ctx: &dyn GpuContext,
        id: usize,
    ) -> RenderHalResult<()> {
        self.batch_buffers
            .mark_submitted(id, ctx.next_fence_to_request())
    }

    /// Chains batch buffer `id` from `cmd_buf` and stamps it with the upcoming tag.
    pub fn send_batch_buffer_start(
        &mut self,
        ctx: &dyn GpuContext,
        cmd_buf: &mut dyn CommandBuffer,
        id: usize,
    ) -> RenderHalResult<()> {
        let address = self.batch_buffers.get(id)?.gpu_address();
        self.render.add_batch_buffer_start(cmd_buf, address)?;
        self.mark_batch_buffer_submitted(ctx, id)
    }

    fn sync_address(&self) -> RenderHalResult<u64> {
        let heaps = self.heaps()?;
        Ok(heaps.gsh.gpu_address() + heaps.layout.sync_offset as u64)
    }

    pub fn send_sync_tag(
        &self,
        ctx: &dyn GpuContext,
        cmd_buf: &mut dyn CommandBuffer,
    ) -> RenderHalResult<()> {
        sequencer::send_sync_tag(
            &self.render,
            cmd_buf,
            self.sync_address()?,
            ctx.next_fence_to_request(),
        )
    }

    pub fn send_sync_tag_index(
        &self,
        ctx: &dyn GpuContext,
        cmd_buf: &mut dyn CommandBuffer,
        index: u32,
    ) -> RenderHalResult<()> {
        let layout = &self.heaps()?.layout;
        let in_range = index
            .checked_add(1)
            .and_then(|slots| slots.checked_mul(RENDERHAL_SYNC_TAG_INDEX_STRIDE))
            .is_some_and(|end| end <= layout.sync_size);
        if !in_range {
            return Err(RenderHalError::InvalidParameter("sync tag index out of range"));
        }
        sequencer::send_sync_tag_index(
            &self.render,
            cmd_buf,
            self.sync_address()?,
            index,
            ctx.next_fence_to_request(),
        )
    }

    /// Computes the VFE state for the next dispatch from `request` and the CURBE loaded so
    /// far in the current media state.
    pub fn set_vfe_state_params(&mut self, request: &VfeRequest) -> RenderHalResult<MhwVfeParams> {
        let heaps = self.heaps()?;
        let curbe_loaded = heaps
            .media_states
            .current()
            .map(|state| state.curbe_offset)
            .unwrap_or(0);
        let scratch_space_base = heaps.gsh.gpu_address() + heaps.layout.scratch_space_base as u64;
        let params = sequencer::compute_vfe_params(
            &self.render.platform().caps,
            curbe_loaded,
            self.settings.state_heap.per_thread_scratch_size,
            scratch_space_base,
            request,
        )?;
        self.vfe = Some(params);
        Ok(params)
    }

    fn media_states_params(&mut self, ctx: &dyn GpuContext) -> RenderHalResult<MediaStatesParams> {
        let vfe = match self.vfe {
            Some(vfe) => vfe,
            None => self.set_vfe_state_params(&VfeRequest::default())?,
        };
        let platform = *self.render.platform();
        let enable_sip = self.settings.enable_sip;
        let heaps = self.heaps()?;
        let layout = &heaps.layout;
        let state = heaps.media_states.current()?;
        let ms_layout = heaps.media_states.layout();

        let sip_base = (enable_sip && platform.supports_sip && heaps.sip_loaded)
            .then(|| heaps.ish.gpu_address() + layout.sip_base as u64);
        Ok(MediaStatesParams {
            sync_address: heaps.gsh.gpu_address() + layout.sync_offset as u64,
            next_tag: ctx.next_fence_to_request(),
            state_base: MhwStateBaseAddressParams {
                general_state_base: heaps.gsh.gpu_address(),
                general_state_size: layout.gsh_size,
                instruction_base: heaps.ish.gpu_address(),
                instruction_size: layout.ish_size,
                surface_state_base: heaps.ssh.gpu_address(),
                indirect_object_size: layout.indirect_heap_size,
            },
            binding_table_pool_size: layout.ssh_instance_size,
            sip_base,
            vfe,
            curbe: (state.offset + ms_layout.curbe_offset, state.curbe_offset),
            media_ids: (
                state.offset + ms_layout.media_id_offset,
                layout.media_ids * ms_layout.media_id_size,
            ),
            id_params: self.current_id_params,
        })
    }

    /// Appends the media-state sequence of the current media state and `walker` to
    /// `cmd_buf`.
    pub fn send_media_states(
        &mut self,
        ctx: &dyn GpuContext,
        cmd_buf: &mut dyn CommandBuffer,
        walker: Option<Walker<'_>>,
    ) -> RenderHalResult<()> {
        let params = self.media_states_params(ctx)?;
        sequencer::send_media_states(&self.render, cmd_buf, &params, &self.palettes, walker)
    }

    /// Builds the media-state sequence in a fresh command buffer and submits it. Nothing is
    /// submitted when any step fails.
    pub fn submit_media_states(
        &mut self,
        ctx: &dyn GpuContext,
        walker: Option<Walker<'_>>,
    ) -> RenderHalResult<()> {
        let mut cmd_buf = LinearCommandBuffer::new(RENDERHAL_COMMAND_BUFFER_SIZE);
        self.send_media_states(ctx, &mut cmd_buf, walker)?;
        ctx.submit_command_buffer(cmd_buf.commands())?;
        Ok(())
    }

    /// Heap counters as JSON, for diagnostics.
    pub fn status_json(&self) -> RenderHalResult<String> {
        let heaps = self.heaps()?;
        let status = HeapStatus {
            layout: &heaps.layout,
            kernels_loaded: heaps
                .kernels
                .slots()
                .iter()
                .filter(|slot| slot.state != KernelAllocationState::Free)
                .count(),
            kernel_heap_used: heaps.kernels.used(),
            media_states_in_use: heaps.media_states.states_in_use(),
            next_media_state: heaps.media_states.next(),
            current_media_state: heaps.media_states.current_index(),
            surface_states_used: heaps.surfaces.current_surface_state(),
            binding_tables_used: heaps.surfaces.current_binding_table(),
            batch_buffers: self.batch_buffers.len(),
            batch_buffers_in_use: self.batch_buffers_in_use,
        };
        Ok(serde_json::to_string(&status)?)
    }
}

impl Drop for RenderHal {
    fn drop(&mut self) {
        self.free_state_heaps();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::*;
    use mhw::*;

    /// Submission stand-in: the fence only moves when the test stores it or after
    /// `advance_after` waits.
    struct MockGpuContext {
        fence: Arc<AtomicU32>,
        next: AtomicU32,
        waits: AtomicU32,
        advance_after: Option<u32>,
        submissions: Mutex<Vec<Vec<u8>>>,
    }

    impl MockGpuContext {
        fn new(advance_after: Option<u32>) -> MockGpuContext {
            MockGpuContext {
                fence: Arc::new(AtomicU32::new(0)),
                next: AtomicU32::new(1),
                waits: AtomicU32::new(0),
                advance_after,
                submissions: Mutex::new(Vec::new()),
            }
        }
    }

    impl GpuContext for MockGpuContext {
        fn completion_fence(&self) -> u32 {
            self.fence.load(Ordering::SeqCst)
        }

        fn next_fence_to_request(&self) -> u32 {
            self.next.load(Ordering::SeqCst)
        }

        fn wait_for_completion_event(&self, _timeout_ms: u32) -> MhwResult<()> {
            let waits = self.waits.fetch_add(1, Ordering::SeqCst) + 1;
            if self.advance_after.is_some_and(|n| waits >= n) {
                self.fence
                    .store(self.next.load(Ordering::SeqCst) + 1, Ordering::SeqCst);
            }
            Ok(())
        }

        fn submit_command_buffer(&self, commands: &[u8]) -> MhwResult<()> {
            self.submissions.lock().unwrap().push(commands.to_vec());
            self.next.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn scenario_settings() -> StateHeapSettings {
        StateHeapSettings {
            media_states: 2,
            curbe_size: 1024,
            samplers: 4,
            binding_tables: 8,
            surfaces_per_bt: 16,
            kernel_heap_size: 65536,
            kernel_block_size: 4096,
            ..Default::default()
        }
    }

    fn session(generation: GpuGeneration) -> RenderHal {
        let settings = RenderHalSettings {
            timeout_ms: 3,
            ..Default::default()
        };
        let mut hal = RenderHal::new(
            PlatformDescriptor::for_generation(generation),
            settings,
            Box::new(SystemArenaProvider::new()),
        );
        hal.allocate_state_heaps(&scenario_settings()).unwrap();
        hal
    }

    fn kernel(unique_id: u32, binary: &[u8]) -> KernelBinary<'_> {
        KernelBinary {
            binary,
            key: KernelKey {
                unique_id,
                cache_id: 0,
            },
            params: KernelParams {
                sampler_count: 2,
                ..Default::default()
            },
            cache_entry: None,
        }
    }

    #[test]
    fn test_heap_lifecycle() {
        let mut hal = RenderHal::new(
            PlatformDescriptor::for_generation(GpuGeneration::Gen9),
            RenderHalSettings::default(),
            Box::new(SystemArenaProvider::new()),
        );
        assert!(matches!(
            hal.assign_binding_table(),
            Err(RenderHalError::HeapNotAllocated)
        ));

        let rejected = [
            StateHeapSettings {
                binding_tables: 0,
                ..scenario_settings()
            },
            StateHeapSettings {
                samplers: 0x1000_0000,
                ..scenario_settings()
            },
            StateHeapSettings {
                per_thread_scratch_size: 3072,
                ..scenario_settings()
            },
        ];
        for bad in &rejected {
            assert!(matches!(
                hal.allocate_state_heaps(bad),
                Err(RenderHalError::InvalidConfig(_))
            ));
            assert!(matches!(hal.layout(), Err(RenderHalError::HeapNotAllocated)));
        }

        hal.allocate_state_heaps(&scenario_settings()).unwrap();
        let layout = hal.layout().unwrap().clone();
        assert_eq!(hal.general_state_heap().unwrap().len() as u32 % MHW_PAGE_SIZE, 0);
        assert!(hal.general_state_heap().unwrap().len() as u32 >= layout.gsh_size);
        assert!(hal.instruction_state_heap().unwrap().len() as u32 >= layout.ish_size);
        assert!(hal.surface_state_heap().unwrap().len() as u32 >= layout.ssh_instance_size);

        hal.free_state_heaps();
        hal.free_state_heaps();
        assert!(matches!(hal.layout(), Err(RenderHalError::HeapNotAllocated)));
    }

    #[test]
    fn test_kernel_residency_scenario() {
        let mut hal = session(GpuGeneration::Gen9);
        let ctx = MockGpuContext::new(None);
        let binary = vec![0x5a; 5000];

        let slot = hal.load_kernel(&ctx, kernel(1, &binary), false).unwrap();
        assert_eq!(hal.get_kernel_offset(slot).unwrap(), 0);
        assert_eq!(hal.kernels().unwrap().used(), 8192);
        assert_eq!(&hal.instruction_state_heap().unwrap()[..5000], &binary[..]);

        let again = hal.load_kernel(&ctx, kernel(1, &binary), false).unwrap();
        assert_eq!(again, slot);
        assert_eq!(hal.kernels().unwrap().used(), 8192);
        assert!(matches!(
            hal.get_kernel_offset(100),
            Err(RenderHalError::InvalidKernelAllocation(100))
        ));

        // Touched with tag 1, so still in flight at fence 0.
        assert!(!hal.unload_kernel(&ctx, slot).unwrap());
        ctx.fence.store(2, Ordering::SeqCst);
        assert!(hal.unload_kernel(&ctx, slot).unwrap());
    }

    #[test]
    fn test_media_state_ring_timeout() {
        let mut hal = session(GpuGeneration::Gen9);
        let ctx = MockGpuContext::new(None);

        assert_eq!(hal.assign_media_state(&ctx, RenderHalComponent::Comp).unwrap(), 0);
        assert_eq!(hal.assign_media_state(&ctx, RenderHalComponent::Comp).unwrap(), 1);
        assert!(matches!(
            hal.assign_media_state(&ctx, RenderHalComponent::Comp),
            Err(RenderHalError::Timeout {
                index: 0,
                tag: 1,
                timeout_ms: 3
            })
        ));
        assert_eq!(ctx.waits.load(Ordering::SeqCst), 3);
        assert!(hal.media_states().unwrap().states()[0].busy);

        ctx.fence.store(2, Ordering::SeqCst);
        assert_eq!(hal.assign_media_state(&ctx, RenderHalComponent::Comp).unwrap(), 0);
        assert_eq!(hal.media_states().unwrap().states_in_use(), 0);
    }

    #[test]
    fn test_media_state_waits_for_fence() {
        let mut hal = session(GpuGeneration::Gen9);
        let ctx = MockGpuContext::new(Some(2));

        hal.assign_media_state(&ctx, RenderHalComponent::Dndi).unwrap();
        hal.assign_media_state(&ctx, RenderHalComponent::Dndi).unwrap();
        assert_eq!(hal.assign_media_state(&ctx, RenderHalComponent::Dndi).unwrap(), 0);
        assert_eq!(ctx.waits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_allocate_media_id() {
        let mut hal = session(GpuGeneration::Gen9);
        let ctx = MockGpuContext::new(None);
        let binary = vec![1u8; 256];
        let slot = hal.load_kernel(&ctx, kernel(7, &binary), false).unwrap();

        assert!(matches!(
            hal.allocate_media_id(&ctx, slot, 0, 0, 0, 0, None),
            Err(RenderHalError::InvalidMediaState)
        ));

        hal.assign_media_state(&ctx, RenderHalComponent::Comp).unwrap();
        assert_eq!(hal.load_curbe_data(&[3u8; 100]).unwrap(), 0);
        assert!(matches!(
            hal.allocate_media_id(&ctx, slot, 0, 0, 256, 0, None),
            Err(RenderHalError::InvalidCurbeRange {
                offset: 0,
                length: 256,
                loaded: 128
            })
        ));
        assert!(hal.allocate_media_id(&ctx, slot, 0, 16, 64, 0, None).is_err());
        assert!(hal.allocate_media_id(&ctx, 5, 0, 0, 0, 0, None).is_err());

        let id = hal.allocate_media_id(&ctx, slot, 1, 0, 128, 0, None).unwrap();
        assert_eq!(id, 0);

        let offset = hal.media_states().unwrap().media_id_offset(id).unwrap();
        let descriptor: MhwInterfaceDescriptorData =
            read_record(hal.general_state_heap().unwrap(), offset as usize).unwrap();
        let expected = hal.render().interface_descriptor(&MhwIdEntryParams {
            kernel_offset: 0,
            sampler_offset: hal.media_states().unwrap().sampler_offset(0).unwrap(),
            sampler_count: 2,
            binding_table_offset: hal.surface_states().unwrap().binding_table_offset(1),
            curbe_offset: 0,
            curbe_length: 128,
            threads_in_group: 1,
            ..Default::default()
        });
        assert_eq!(descriptor, expected);
        assert!(!descriptor.barrier_enabled());

        let walker = MhwGpgpuWalkerParams {
            thread_width: 4,
            thread_height: 2,
            slm_size: 4,
            ..Default::default()
        };
        let id = hal
            .allocate_media_id(&ctx, slot, 0, 0, 0, 0, Some(&walker))
            .unwrap();
        assert_eq!(id, 0);
        let descriptor: MhwInterfaceDescriptorData =
            read_record(hal.general_state_heap().unwrap(), offset as usize).unwrap();
        assert!(descriptor.barrier_enabled());
    }

    #[test]
    fn test_sampler_states() {
        let mut hal = session(GpuGeneration::Gen9);
        let ctx = MockGpuContext::new(None);
        hal.assign_media_state(&ctx, RenderHalComponent::Comp).unwrap();

        let state = MhwSamplerState {
            control: 0x11,
            lod: 0x22,
            border_color_pointer: 0,
            address: 0x33,
        };
        hal.set_sampler_states(
            1,
            &[SamplerStateParams::Unused, SamplerStateParams::Sampler3D(state)],
        )
        .unwrap();

        let sampler_state = hal.platform().sizes.sampler_state;
        let offset = hal.media_states().unwrap().sampler_offset(1).unwrap() + sampler_state;
        let written: MhwSamplerState =
            read_record(hal.general_state_heap().unwrap(), offset as usize).unwrap();
        assert_eq!(written, state);

        assert!(hal
            .set_sampler_states(16, &[SamplerStateParams::Unused])
            .is_err());
        assert!(hal
            .set_sampler_states(0, &[SamplerStateParams::Unused; 5])
            .is_err());
    }

    #[test]
    fn test_submit_media_states() {
        let mut hal = session(GpuGeneration::Gen9);
        let ctx = MockGpuContext::new(None);
        let binary = vec![1u8; 64];
        let slot = hal.load_kernel(&ctx, kernel(3, &binary), false).unwrap();

        hal.assign_ssh_instance().unwrap();
        hal.assign_binding_table().unwrap();
        let bt = hal.assign_binding_table().unwrap();
        let mut surface = RenderHalSurface::new(MosSurface {
            format: MosFormat::A8R8G8B8,
            width: 64,
            height: 32,
            pitch: 256,
            gpu_address: 0x40000,
            ..Default::default()
        });
        let mut params = SurfaceStateParams {
            surface_type: SurfaceStateType::G9,
            ..Default::default()
        };
        let (_, indices) = hal.setup_surface_states(&mut surface, &mut params).unwrap();
        hal.bind_surface_state(bt, 0, indices[0]).unwrap();

        hal.assign_media_state(&ctx, RenderHalComponent::Comp).unwrap();
        hal.load_curbe_data(&[0u8; 64]).unwrap();
        hal.allocate_media_id(&ctx, slot, bt, 0, 64, 0, None).unwrap();
        hal.allocate_chroma_key(0x10, 0x20).unwrap();
        hal.allocate_palette_id().unwrap();
        hal.get_palette_entry(0, 4).unwrap().fill(0xffff);

        let walker = MhwWalkerParams::default();
        hal.submit_media_states(&ctx, Some(Walker::Media(&walker)))
            .unwrap();

        let submissions = ctx.submissions.lock().unwrap();
        assert_eq!(submissions.len(), 1);
        let mut cmd_buf = LinearCommandBuffer::new(submissions[0].len());
        cmd_buf.append(&submissions[0]).unwrap();
        let opcodes: Vec<u32> = cmd_buf.opcodes().collect();
        assert_eq!(
            opcodes,
            vec![
                MHW_OPCODE_PIPE_CONTROL,
                MHW_OPCODE_PIPE_CONTROL,
                MHW_OPCODE_MI_LOAD_REGISTER_IMM,
                MHW_OPCODE_MI_LOAD_REGISTER_IMM,
                MHW_OPCODE_PIPELINE_SELECT,
                MHW_OPCODE_STATE_BASE_ADDRESS,
                MHW_OPCODE_MEDIA_VFE_STATE,
                MHW_OPCODE_MEDIA_CURBE_LOAD,
                MHW_OPCODE_MEDIA_INTERFACE_DESCRIPTOR_LOAD,
                MHW_OPCODE_CHROMA_KEY,
                MHW_OPCODE_SAMPLER_PALETTE_LOAD,
                MHW_OPCODE_MEDIA_OBJECT_WALKER,
            ]
        );

        // The state base address points the GPU at the surface state heap holding the
        // binding table and surface state bound above.
        let sba: MhwStateBaseAddress =
            read_record(&submissions[0], command_offset(&submissions[0], 5)).unwrap();
        let instruction_base =
            (sba.instruction_base_hi as u64) << 32 | sba.instruction_base_lo as u64;
        let surface_state_base =
            (sba.surface_state_base_hi as u64) << 32 | sba.surface_state_base_lo as u64;
        assert!(surface_state_base > instruction_base);
        assert_eq!(surface_state_base % MHW_PAGE_SIZE as u64, 0);

        let surfaces = hal.surface_states().unwrap();
        let layout = hal.layout().unwrap();
        let bt_end = surfaces.binding_table_offset(bt) + layout.binding_table_size;
        assert!(bt_end <= sba.indirect_object_size);
        let entry = hal.surface_state_entry(indices[0]).unwrap();
        assert!(entry.surface_state_offset + layout.surface_state_size <= sba.indirect_object_size);

        let ssh = hal.surface_state_heap().unwrap();
        let binding: MhwBindingTableEntry =
            read_record(ssh, surfaces.binding_table_offset(bt) as usize).unwrap();
        assert_eq!(binding, MhwBindingTableEntry::new(entry.surface_state_offset, false));
    }

    /// Byte offset of command `index` in an encoded command stream.
    fn command_offset(commands: &[u8], index: usize) -> usize {
        let mut offset = 0;
        for _ in 0..index {
            let header: u32 = read_record(commands, offset).unwrap();
            offset += ((header & 0xff) as usize + 2) * 4;
        }
        offset
    }

    #[test]
    fn test_compute_walker_needs_descriptor() {
        let mut hal = session(GpuGeneration::Xe2);
        let ctx = MockGpuContext::new(None);
        hal.assign_media_state(&ctx, RenderHalComponent::Cm).unwrap();

        let walker = MhwGpgpuWalkerParams {
            thread_width: 8,
            thread_height: 1,
            ..Default::default()
        };
        assert!(matches!(
            hal.submit_media_states(&ctx, Some(Walker::Gpgpu(&walker))),
            Err(RenderHalError::InvalidMediaState)
        ));
        assert!(ctx.submissions.lock().unwrap().is_empty());

        let binary = vec![1u8; 64];
        let slot = hal.load_kernel(&ctx, kernel(9, &binary), false).unwrap();
        hal.allocate_media_id(&ctx, slot, 0, 0, 0, 0, Some(&walker))
            .unwrap();
        hal.submit_media_states(&ctx, Some(Walker::Gpgpu(&walker)))
            .unwrap();
        assert_eq!(ctx.submissions.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_surface_states() {
        let mut hal = session(GpuGeneration::Gen9);
        hal.assign_ssh_instance().unwrap();
        let bt = hal.assign_binding_table().unwrap();

        let mut surface = RenderHalSurface::new(MosSurface {
            format: MosFormat::Nv12,
            width: 64,
            height: 32,
            pitch: 128,
            tile_type: TileType::Y,
            gpu_address: 0x20000,
            ..Default::default()
        });
        let mut params = SurfaceStateParams {
            surface_type: SurfaceStateType::G9,
            two_plane_nv12_needed_by_kernel: true,
            ..Default::default()
        };
        assert!(!hal.is_2plane_nv12_needed(&surface, &params));

        let (count, indices) = hal.setup_surface_states(&mut surface, &mut params).unwrap();
        assert_eq!(count, 2);
        for (slot, index) in indices.iter().enumerate() {
            hal.bind_surface_state(bt, slot, *index).unwrap();
        }

        let entry = hal.surface_state_entry(indices[1]).unwrap().clone();
        let ssh = hal.surface_state_heap().unwrap();
        let bt_offset = hal.surface_states().unwrap().binding_table_offset(bt) as usize;
        let binding: MhwBindingTableEntry = read_record(ssh, bt_offset + 4).unwrap();
        assert_eq!(binding, MhwBindingTableEntry::new(entry.surface_state_offset, false));
        assert!(ssh[entry.surface_state_offset as usize..][..64]
            .iter()
            .any(|b| *b != 0));

        assert_eq!(hal.set_surfaces_per_bt(32).unwrap(), 32);
    }

    #[test]
    fn test_batch_buffers_follow_fence() {
        let mut hal = session(GpuGeneration::Gen9);
        let ctx = MockGpuContext::new(None);
        let id = hal.allocate_batch_buffer(4096).unwrap();
        hal.lock_batch_buffer(id).unwrap();
        hal.append_batch_buffer(id, &[0u8; 8]).unwrap();
        hal.unlock_batch_buffer(id).unwrap();

        let mut cmd_buf = LinearCommandBuffer::new(256);
        hal.send_batch_buffer_start(&ctx, &mut cmd_buf, id).unwrap();
        assert_eq!(
            cmd_buf.opcodes().collect::<Vec<_>>(),
            vec![MHW_OPCODE_MI_BATCH_BUFFER_START]
        );
        assert!(hal.batch_buffers().get(id).unwrap().busy);

        hal.refresh_sync(&ctx).unwrap();
        assert!(hal.batch_buffers().get(id).unwrap().busy);
        ctx.fence.store(2, Ordering::SeqCst);
        hal.refresh_sync(&ctx).unwrap();
        assert!(!hal.batch_buffers().get(id).unwrap().busy);

        hal.free_batch_buffer(id).unwrap();
        assert!(hal.batch_buffers().is_empty());
    }

    #[test]
    fn test_sync_tag_index_bounds() {
        let hal = session(GpuGeneration::Gen9);
        let ctx = MockGpuContext::new(None);
        let mut cmd_buf = LinearCommandBuffer::new(1024);
        hal.send_sync_tag(&ctx, &mut cmd_buf).unwrap();
        hal.send_sync_tag_index(&ctx, &mut cmd_buf, 15).unwrap();
        assert!(hal.send_sync_tag_index(&ctx, &mut cmd_buf, 16).is_err());
        for index in [u32::MAX, u32::MAX / RENDERHAL_SYNC_TAG_INDEX_STRIDE] {
            assert!(matches!(
                hal.send_sync_tag_index(&ctx, &mut cmd_buf, index),
                Err(RenderHalError::InvalidParameter(_))
            ));
        }
        assert_eq!(cmd_buf.opcodes().count(), 3);
    }

    #[test]
    fn test_kernel_time_telemetry() {
        let settings = RenderHalSettings {
            enable_kernel_time_dump: true,
            ..Default::default()
        };
        let mut hal = RenderHal::new(
            PlatformDescriptor::for_generation(GpuGeneration::Gen9),
            settings,
            Box::new(SystemArenaProvider::new()),
        );
        hal.allocate_state_heaps(&scenario_settings()).unwrap();
        let ctx = MockGpuContext::new(None);
        let index = hal.assign_media_state(&ctx, RenderHalComponent::Hdr).unwrap();

        // Stand in for the GPU writing the end timestamp.
        let ms_offset = hal.media_states().unwrap().states()[index].offset;
        let trailer_offset = ms_offset + hal.media_states().unwrap().layout().start_time_offset;
        let frequency = hal.platform().caps.timestamp_frequency;
        let trailer = MhwMediaStateTrailer {
            start_time: 0,
            end_time: frequency / 1000,
            component: RenderHalComponent::Hdr as u32,
            ..Default::default()
        };
        write_record(
            hal.heaps.as_mut().unwrap().gsh.data_mut().unwrap(),
            trailer_offset as usize,
            &trailer,
        )
        .unwrap();

        ctx.fence.store(2, Ordering::SeqCst);
        hal.refresh_sync(&ctx).unwrap();
        assert_eq!(
            hal.kernel_time(RenderHalComponent::Hdr),
            Duration::from_millis(1)
        );
        assert_eq!(hal.kernel_time(RenderHalComponent::Comp), Duration::ZERO);

        hal.reset().unwrap();
        assert_eq!(hal.kernel_time(RenderHalComponent::Hdr), Duration::ZERO);
    }

    #[test]
    fn test_status_json() {
        let mut hal = session(GpuGeneration::Gen9);
        let ctx = MockGpuContext::new(None);
        hal.assign_media_state(&ctx, RenderHalComponent::Comp).unwrap();
        let status: serde_json::Value = serde_json::from_str(&hal.status_json().unwrap()).unwrap();
        assert_eq!(status["current_media_state"], 0);
        assert_eq!(status["kernels_loaded"], 0);
        assert_eq!(status["layout"]["media_state_count"], 2);
    }
}
