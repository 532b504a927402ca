// Copyright 2025 Google
// SPDX-License-Identifier: MIT

use zerocopy::FromBytes;
use zerocopy::Immutable;
use zerocopy::IntoBytes;

use crate::mhw_defines::*;
use crate::platform::PlatformDescriptor;
use crate::traits::CommandBuffer;

/// A bounded, CPU-side command buffer.
pub struct LinearCommandBuffer {
    data: Vec<u8>,
    capacity: usize,
}

impl LinearCommandBuffer {
    pub fn new(capacity: usize) -> LinearCommandBuffer {
        LinearCommandBuffer {
            data: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Iterates the opcodes of every command in the buffer.
    pub fn opcodes(&self) -> CommandIter<'_> {
        CommandIter {
            data: &self.data,
            offset: 0,
        }
    }
}

impl CommandBuffer for LinearCommandBuffer {
    fn append(&mut self, bytes: &[u8]) -> MhwResult<()> {
        let remaining = self.remaining();
        if bytes.len() > remaining {
            return Err(MhwError::CommandBufferFull {
                needed: bytes.len(),
                remaining,
            });
        }

        self.data.extend_from_slice(bytes);
        Ok(())
    }

    fn remaining(&self) -> usize {
        self.capacity - self.data.len()
    }

    fn commands(&self) -> &[u8] {
        &self.data
    }
}

pub struct CommandIter<'a> {
    data: &'a [u8],
    offset: usize,
}

impl Iterator for CommandIter<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        let (header, _) = u32::read_from_prefix(self.data.get(self.offset..)?).ok()?;
        let opcode = header >> 16;
        let mut length = ((header & 0xff) as usize + 2) * 4;
        // Palette loads carry their entries inline.
        if opcode == MHW_OPCODE_SAMPLER_PALETTE_LOAD {
            let (load, _) = MhwPaletteLoad::read_from_prefix(&self.data[self.offset..]).ok()?;
            length += load.entry_count as usize * 4;
        }
        self.offset += length;
        Some(opcode)
    }
}

/// Copies a fixed-format record into `region` at `offset`.
pub fn write_record<T: IntoBytes + Immutable>(
    region: &mut [u8],
    offset: usize,
    record: &T,
) -> MhwResult<()> {
    let bytes = record.as_bytes();
    let end = offset
        .checked_add(bytes.len())
        .ok_or(MhwError::InvalidArgs)?;
    let limit = region.len();
    let dst = region.get_mut(offset..end).ok_or(MhwError::OutOfBounds {
        offset,
        size: bytes.len(),
        limit,
    })?;
    dst.copy_from_slice(bytes);
    Ok(())
}

/// Reads a fixed-format record out of `region` at `offset`.
pub fn read_record<T: FromBytes>(region: &[u8], offset: usize) -> MhwResult<T> {
    let size = std::mem::size_of::<T>();
    let limit = region.len();
    let src = region
        .get(offset..offset.saturating_add(size))
        .ok_or(MhwError::OutOfBounds {
            offset,
            size,
            limit,
        })?;
    T::read_from_bytes(src).map_err(|_| MhwError::InvalidArgs)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MhwStateBaseAddressParams {
    pub general_state_base: u64,
    pub general_state_size: u32,
    pub instruction_base: u64,
    pub instruction_size: u32,
    pub surface_state_base: u64,
    pub indirect_object_size: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MhwVfeParams {
    pub max_threads: u32,
    pub num_urb_entries: u32,
    pub urb_entry_alloc_size: u32,
    pub curbe_alloc_size: u32,
    pub scratch_space_base: u64,
    pub per_thread_scratch_space: u32,
    pub scoreboard_enable: bool,
    pub scoreboard_type: u32,
    pub scoreboard_mask: u32,
    pub scoreboard_delta: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MhwIdEntryParams {
    pub kernel_offset: u32,
    pub sampler_offset: u32,
    pub sampler_count: u32,
    pub binding_table_offset: u32,
    pub curbe_offset: u32,
    pub curbe_length: u32,
    pub cross_thread_constant_data_length: u32,
    pub barrier_enable: bool,
    pub threads_in_group: u32,
    pub slm_size: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MhwSurfaceStateParams {
    pub format: u32,
    pub width: u32,
    pub height: u32,
    pub pitch: u32,
    pub flags: u32,
    pub plane: u32,
    pub direction_u: u32,
    pub direction_v: u32,
    pub x_offset: u32,
    pub y_offset: u32,
    pub u_offset_x: u32,
    pub u_offset_y: u32,
    pub v_offset_x: u32,
    pub v_offset_y: u32,
    pub address: u64,
    pub address_control: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MhwWalkerParams {
    pub interface_descriptor_offset: u32,
    pub use_scoreboard: bool,
    pub scoreboard_mask: u32,
    pub color_count_minus_one: u32,
    pub global_resolution: (u32, u32),
    pub global_start: (u32, u32),
    pub global_outer_loop_stride: (u32, u32),
    pub global_inner_loop_unit: (u32, u32),
    pub block_resolution: (u32, u32),
    pub local_start: (u32, u32),
    pub local_end: (u32, u32),
    pub local_outer_loop_stride: (u32, u32),
    pub local_inner_loop_unit: (u32, u32),
    pub middle_loop_extra_steps: u32,
    pub mid_loop_unit: (u32, u32),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MhwGpgpuWalkerParams {
    pub interface_descriptor_offset: u32,
    pub simd_size: u32,
    pub thread_width: u32,
    pub thread_height: u32,
    pub thread_depth: u32,
    pub group_width: u32,
    pub group_height: u32,
    pub group_depth: u32,
    pub group_start_x: u32,
    pub group_start_y: u32,
    pub group_start_z: u32,
    /// Shared local memory per thread group, in KiB.
    pub slm_size: u32,
}

fn pack_xy(value: (u32, u32)) -> u32 {
    (value.1 << 16) | (value.0 & 0xffff)
}

fn lo(address: u64) -> u32 {
    address as u32
}

fn hi(address: u64) -> u32 {
    (address >> 32) as u32
}

/// Serializes render-engine commands and arena records for one platform.
pub struct MhwRenderInterface {
    platform: PlatformDescriptor,
}

impl MhwRenderInterface {
    pub fn new(platform: PlatformDescriptor) -> MhwRenderInterface {
        MhwRenderInterface { platform }
    }

    pub fn platform(&self) -> &PlatformDescriptor {
        &self.platform
    }

    fn add<T: MhwCommand>(&self, cmd_buf: &mut dyn CommandBuffer, cmd: &T) -> MhwResult<()> {
        cmd_buf.append(cmd.as_bytes())
    }

    pub fn add_pipe_control(
        &self,
        cmd_buf: &mut dyn CommandBuffer,
        flags: u32,
        address: u64,
        immediate_data: u32,
    ) -> MhwResult<()> {
        let cmd = MhwPipeControl {
            header: MhwPipeControl::header(),
            flags,
            address_lo: lo(address),
            address_hi: hi(address),
            immediate_data,
            reserved: 0,
        };
        self.add(cmd_buf, &cmd)
    }

    pub fn add_pipeline_select(&self, cmd_buf: &mut dyn CommandBuffer, gpgpu: bool) -> MhwResult<()> {
        let cmd = MhwPipelineSelect {
            header: MhwPipelineSelect::header(),
            pipeline: if gpgpu {
                MHW_PIPELINE_GPGPU
            } else {
                MHW_PIPELINE_MEDIA
            },
        };
        self.add(cmd_buf, &cmd)
    }

    pub fn add_state_base_address(
        &self,
        cmd_buf: &mut dyn CommandBuffer,
        params: &MhwStateBaseAddressParams,
    ) -> MhwResult<()> {
        let cmd = MhwStateBaseAddress {
            header: MhwStateBaseAddress::header(),
            general_state_base_lo: lo(params.general_state_base),
            general_state_base_hi: hi(params.general_state_base),
            general_state_size: params.general_state_size,
            instruction_base_lo: lo(params.instruction_base),
            instruction_base_hi: hi(params.instruction_base),
            instruction_size: params.instruction_size,
            surface_state_base_lo: lo(params.surface_state_base),
            surface_state_base_hi: hi(params.surface_state_base),
            indirect_object_size: params.indirect_object_size,
        };
        self.add(cmd_buf, &cmd)
    }

    pub fn add_binding_table_pool(
        &self,
        cmd_buf: &mut dyn CommandBuffer,
        base: u64,
        size: u32,
    ) -> MhwResult<()> {
        let cmd = MhwBindingTablePoolAlloc {
            header: MhwBindingTablePoolAlloc::header(),
            base_lo: lo(base),
            base_hi: hi(base),
            size,
        };
        self.add(cmd_buf, &cmd)
    }

    pub fn add_sip_state(&self, cmd_buf: &mut dyn CommandBuffer, sip_base: u64) -> MhwResult<()> {
        if !self.platform.supports_sip {
            return Err(MhwError::Unsupported);
        }

        let cmd = MhwSipState {
            header: MhwSipState::header(),
            sip_lo: lo(sip_base),
            sip_hi: hi(sip_base),
        };
        self.add(cmd_buf, &cmd)
    }

    pub fn add_l3_config(&self, cmd_buf: &mut dyn CommandBuffer, enable_slm: bool) -> MhwResult<()> {
        let cmd = MhwLoadRegisterImm {
            header: MhwLoadRegisterImm::header(),
            register: MHW_L3_CNTL_REGISTER,
            value: if enable_slm {
                MHW_L3_CONFIG_SLM
            } else {
                MHW_L3_CONFIG_DEFAULT
            },
        };
        self.add(cmd_buf, &cmd)
    }

    /// No-op on platforms without mid-batch preemption control.
    pub fn add_preemption_config(
        &self,
        cmd_buf: &mut dyn CommandBuffer,
        gpgpu: bool,
    ) -> MhwResult<()> {
        if !self.platform.supports_preemption {
            return Ok(());
        }

        let cmd = MhwLoadRegisterImm {
            header: MhwLoadRegisterImm::header(),
            register: MHW_PREEMPTION_CONTROL_REGISTER,
            value: if gpgpu {
                MHW_PREEMPTION_THREAD_GROUP
            } else {
                MHW_PREEMPTION_MID_THREAD
            },
        };
        self.add(cmd_buf, &cmd)
    }

    pub fn add_vfe_state(&self, cmd_buf: &mut dyn CommandBuffer, params: &MhwVfeParams) -> MhwResult<()> {
        if self.platform.uses_cfe_state {
            let cmd = MhwCfeState {
                header: MhwCfeState::header(),
                scratch_base_lo: lo(params.scratch_space_base),
                scratch_base_hi: hi(params.scratch_space_base),
                per_thread_scratch_space: params.per_thread_scratch_space,
                max_threads: params.max_threads,
                num_urb_entries: params.num_urb_entries,
            };
            return self.add(cmd_buf, &cmd);
        }

        let cmd = MhwVfeState {
            header: MhwVfeState::header(),
            scratch_base_lo: lo(params.scratch_space_base),
            scratch_base_hi: hi(params.scratch_space_base),
            per_thread_scratch_space: params.per_thread_scratch_space,
            max_threads: params.max_threads,
            num_urb_entries: params.num_urb_entries,
            urb_entry_alloc_size: params.urb_entry_alloc_size,
            curbe_alloc_size: params.curbe_alloc_size,
            scoreboard_enable: params.scoreboard_enable as u32,
            scoreboard_type: params.scoreboard_type,
            scoreboard_mask: params.scoreboard_mask,
            scoreboard_delta: params.scoreboard_delta,
        };
        self.add(cmd_buf, &cmd)
    }

    pub fn add_curbe_load(
        &self,
        cmd_buf: &mut dyn CommandBuffer,
        start_address: u32,
        length: u32,
    ) -> MhwResult<()> {
        let cmd = MhwCurbeLoad {
            header: MhwCurbeLoad::header(),
            reserved: 0,
            length,
            start_address,
        };
        self.add(cmd_buf, &cmd)
    }

    pub fn add_id_load(
        &self,
        cmd_buf: &mut dyn CommandBuffer,
        start_address: u32,
        length: u32,
    ) -> MhwResult<()> {
        let cmd = MhwIdLoad {
            header: MhwIdLoad::header(),
            reserved: 0,
            length,
            start_address,
        };
        self.add(cmd_buf, &cmd)
    }

    pub fn add_chroma_key(
        &self,
        cmd_buf: &mut dyn CommandBuffer,
        index: u32,
        low: u32,
        high: u32,
    ) -> MhwResult<()> {
        let cmd = MhwChromaKey {
            header: MhwChromaKey::header(),
            index,
            low,
            high,
        };
        self.add(cmd_buf, &cmd)
    }

    pub fn add_palette_load(
        &self,
        cmd_buf: &mut dyn CommandBuffer,
        palette_id: u32,
        entries: &[u32],
    ) -> MhwResult<()> {
        let cmd = MhwPaletteLoad {
            header: MhwPaletteLoad::header(),
            palette_id,
            entry_count: entries.len() as u32,
        };
        let needed = cmd.as_bytes().len() + entries.as_bytes().len();
        if needed > cmd_buf.remaining() {
            return Err(MhwError::CommandBufferFull {
                needed,
                remaining: cmd_buf.remaining(),
            });
        }

        self.add(cmd_buf, &cmd)?;
        cmd_buf.append(entries.as_bytes())
    }

    pub fn add_media_object_walker(
        &self,
        cmd_buf: &mut dyn CommandBuffer,
        params: &MhwWalkerParams,
    ) -> MhwResult<()> {
        let cmd = MhwMediaObjectWalker {
            header: MhwMediaObjectWalker::header(),
            interface_descriptor_offset: params.interface_descriptor_offset,
            use_scoreboard: params.use_scoreboard as u32,
            scoreboard_mask: params.scoreboard_mask,
            color_count_minus_one: params.color_count_minus_one,
            global_resolution: pack_xy(params.global_resolution),
            global_start: pack_xy(params.global_start),
            global_outer_loop_stride: pack_xy(params.global_outer_loop_stride),
            global_inner_loop_unit: pack_xy(params.global_inner_loop_unit),
            block_resolution: pack_xy(params.block_resolution),
            local_start: pack_xy(params.local_start),
            local_end: pack_xy(params.local_end),
            local_outer_loop_stride: pack_xy(params.local_outer_loop_stride),
            local_inner_loop_unit: pack_xy(params.local_inner_loop_unit),
            middle_loop_extra_steps: params.middle_loop_extra_steps,
            mid_loop_unit: pack_xy(params.mid_loop_unit),
        };
        self.add(cmd_buf, &cmd)
    }

    pub fn add_gpgpu_walker(
        &self,
        cmd_buf: &mut dyn CommandBuffer,
        params: &MhwGpgpuWalkerParams,
    ) -> MhwResult<()> {
        let cmd = MhwGpgpuWalker {
            header: MhwGpgpuWalker::header(),
            interface_descriptor_offset: params.interface_descriptor_offset,
            simd_size: params.simd_size,
            thread_width: params.thread_width,
            thread_height: params.thread_height,
            thread_depth: params.thread_depth,
            group_start_x: params.group_start_x,
            group_width: params.group_width,
            group_start_y: params.group_start_y,
            group_height: params.group_height,
            group_start_z: params.group_start_z,
            group_depth: params.group_depth,
            right_mask: u32::MAX,
            bottom_mask: u32::MAX,
        };
        self.add(cmd_buf, &cmd)
    }

    pub fn add_compute_walker(
        &self,
        cmd_buf: &mut dyn CommandBuffer,
        params: &MhwGpgpuWalkerParams,
        id: &MhwIdEntryParams,
    ) -> MhwResult<()> {
        let descriptor = self.interface_descriptor(id);
        let cmd = MhwComputeWalker {
            header: MhwComputeWalker::header(),
            simd_size: params.simd_size,
            group_width: params.group_width,
            group_height: params.group_height,
            group_depth: params.group_depth,
            kernel_start_pointer: descriptor.kernel_start_pointer,
            binding_table_pointer: descriptor.binding_table,
            sampler_state_pointer: descriptor.sampler_state,
            indirect_data_start: id.curbe_offset,
            indirect_data_length: id.curbe_length,
            thread_group: descriptor.thread_group,
            reserved: 0,
        };
        self.add(cmd_buf, &cmd)
    }

    pub fn add_batch_buffer_start(
        &self,
        cmd_buf: &mut dyn CommandBuffer,
        address: u64,
    ) -> MhwResult<()> {
        let cmd = MhwBatchBufferStart {
            header: MhwBatchBufferStart::header(),
            address_lo: lo(address),
            address_hi: hi(address),
        };
        self.add(cmd_buf, &cmd)
    }

    pub fn interface_descriptor(&self, params: &MhwIdEntryParams) -> MhwInterfaceDescriptorData {
        let mut thread_group = params.threads_in_group & MHW_ID_THREADS_MASK;
        thread_group |= (params.slm_size & MHW_ID_SLM_MASK) << MHW_ID_SLM_SHIFT;
        if params.barrier_enable {
            thread_group |= MHW_ID_BARRIER_ENABLE;
        }

        MhwInterfaceDescriptorData {
            kernel_start_pointer: (params.kernel_offset >> MHW_KERNEL_OFFSET_SHIFT)
                << MHW_KERNEL_OFFSET_SHIFT,
            kernel_start_pointer_high: 0,
            sampler_state: ((params.sampler_offset >> MHW_SAMPLER_SHIFT) << MHW_SAMPLER_SHIFT)
                | ((params.sampler_count.div_ceil(4) & 0x7) << MHW_ID_SAMPLER_COUNT_SHIFT),
            binding_table: (params.binding_table_offset >> MHW_BINDING_TABLE_OFFSET_SHIFT)
                << MHW_BINDING_TABLE_OFFSET_SHIFT,
            constant_urb: ((params.curbe_length >> MHW_CURBE_SHIFT) << MHW_ID_CURBE_LENGTH_SHIFT)
                | (params.curbe_offset >> MHW_CURBE_SHIFT),
            thread_group,
            cross_thread_constant_data_length: params.cross_thread_constant_data_length
                >> MHW_CURBE_SHIFT,
            reserved: 0,
        }
    }

    /// Writes an interface descriptor into the general state heap at `offset`.
    pub fn set_interface_descriptor_entry(
        &self,
        gsh: &mut [u8],
        offset: usize,
        params: &MhwIdEntryParams,
    ) -> MhwResult<()> {
        write_record(gsh, offset, &self.interface_descriptor(params))
    }

    pub fn set_binding_table_entry(
        &self,
        ssh: &mut [u8],
        offset: usize,
        surface_state_offset: u32,
        avs: bool,
    ) -> MhwResult<()> {
        write_record(ssh, offset, &MhwBindingTableEntry::new(surface_state_offset, avs))
    }

    pub fn setup_surface_state(
        &self,
        ssh: &mut [u8],
        offset: usize,
        params: &MhwSurfaceStateParams,
    ) -> MhwResult<()> {
        let state = MhwSurfaceState {
            format: params.format,
            width: params.width.saturating_sub(1),
            height: params.height.saturating_sub(1),
            pitch: params.pitch.saturating_sub(1),
            flags: params.flags,
            y_offset: pack_xy((params.x_offset, params.y_offset)),
            u_offset: pack_xy((params.u_offset_x, params.u_offset_y)),
            v_offset: pack_xy((params.v_offset_x, params.v_offset_y)),
            address_lo: lo(params.address),
            address_hi: hi(params.address),
            plane: params.plane,
            chroma_direction: (params.direction_u << 3) | (params.direction_v & 0x7),
            address_control: params.address_control,
            reserved: [0; 3],
        };
        write_record(ssh, offset, &state)
    }

    pub fn set_sampler_state(
        &self,
        gsh: &mut [u8],
        offset: usize,
        state: &MhwSamplerState,
    ) -> MhwResult<()> {
        write_record(gsh, offset, state)
    }
}

#[cfg(test)]
mod tests {
    use crate::*;

    fn gen9() -> MhwRenderInterface {
        MhwRenderInterface::new(PlatformDescriptor::for_generation(GpuGeneration::Gen9))
    }

    #[test]
    fn test_command_buffer_full() {
        let render = gen9();
        let mut cmd_buf = LinearCommandBuffer::new(8);
        render.add_pipeline_select(&mut cmd_buf, false).unwrap();
        assert!(matches!(
            render.add_pipeline_select(&mut cmd_buf, false),
            Err(MhwError::CommandBufferFull { .. })
        ));
        assert_eq!(cmd_buf.len(), 8);
    }

    #[test]
    fn test_opcode_iteration() {
        let render = gen9();
        let mut cmd_buf = LinearCommandBuffer::new(4096);
        render.add_pipeline_select(&mut cmd_buf, true).unwrap();
        render.add_palette_load(&mut cmd_buf, 1, &[1, 2, 3]).unwrap();
        render.add_curbe_load(&mut cmd_buf, 0x100, 64).unwrap();

        let opcodes: Vec<u32> = cmd_buf.opcodes().collect();
        assert_eq!(
            opcodes,
            vec![
                MHW_OPCODE_PIPELINE_SELECT,
                MHW_OPCODE_SAMPLER_PALETTE_LOAD,
                MHW_OPCODE_MEDIA_CURBE_LOAD
            ]
        );
    }

    #[test]
    fn test_interface_descriptor_encoding() {
        let render = gen9();
        let mut gsh = vec![0u8; 128];
        let params = MhwIdEntryParams {
            kernel_offset: 0x2000,
            sampler_offset: 0x440,
            sampler_count: 5,
            binding_table_offset: 0x80,
            curbe_offset: 0x40,
            curbe_length: 0x60,
            barrier_enable: true,
            threads_in_group: 16,
            slm_size: 2,
            ..Default::default()
        };
        render.set_interface_descriptor_entry(&mut gsh, 32, &params).unwrap();

        let descriptor: MhwInterfaceDescriptorData = read_record(&gsh, 32).unwrap();
        assert_eq!(descriptor.kernel_start_pointer, 0x2000);
        assert_eq!(descriptor.binding_table, 0x80);
        assert_eq!(descriptor.constant_urb, (3 << 16) | 2);
        assert!(descriptor.barrier_enabled());
        assert_eq!(descriptor.threads_in_group(), 16);
        assert_eq!(descriptor.slm_size(), 2);

        assert!(render.set_interface_descriptor_entry(&mut gsh, 112, &params).is_err());
    }
}
