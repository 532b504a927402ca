// Copyright 2025 Google
// SPDX-License-Identifier: MIT

use remain::sorted;
use thiserror::Error;
use zerocopy::FromBytes;
use zerocopy::Immutable;
use zerocopy::IntoBytes;
use zerocopy::KnownLayout;

/// An error type for the hardware-interface layer.
#[sorted]
#[derive(Error, Debug)]
pub enum MhwError {
    #[error("Arena already locked")]
    AlreadyLocked,
    #[error("Command buffer full: need {needed} bytes, {remaining} remaining")]
    CommandBufferFull { needed: usize, remaining: usize },
    #[error("Invalid Arguments")]
    InvalidArgs,
    #[error("An input/output error occurred: {0}")]
    IoError(std::io::Error),
    #[error("Mapping failed")]
    MapFailed,
    #[error("Arena not locked")]
    NotLocked,
    #[error("Write of {size} bytes at offset {offset} exceeds region of {limit} bytes")]
    OutOfBounds {
        offset: usize,
        size: usize,
        limit: usize,
    },
    #[error("Unsupported")]
    Unsupported,
    #[error("{0}")]
    WithContext(&'static str),
}

impl From<std::io::Error> for MhwError {
    fn from(e: std::io::Error) -> MhwError {
        MhwError::IoError(e)
    }
}

pub type MhwResult<T> = std::result::Result<T, MhwError>;

pub const MHW_PAGE_SIZE: u32 = 0x1000;
pub const MHW_MEDIA_STATE_ALIGN: u32 = 128;
pub const MHW_SCRATCH_SPACE_ALIGN: u32 = 1024;
pub const MHW_SAMPLER_STATE_ALIGN: u32 = 64;
pub const MHW_SAMPLER_STATE_VA_ALIGN: u32 = 32;
pub const MHW_SAMPLER_STATE_AVS_ALIGN: u32 = 1024;
pub const MHW_SAMPLER_STATE_AVS_ALIGN_G9: u32 = 2048;
pub const MHW_SURFACE_STATE_ALIGN: u32 = 64;
pub const MHW_CURBE_SHIFT: u32 = 5;
pub const MHW_SAMPLER_SHIFT: u32 = 5;
pub const MHW_BINDING_TABLE_OFFSET_SHIFT: u32 = 6;
pub const MHW_KERNEL_OFFSET_SHIFT: u32 = 6;
pub const MHW_SCRATCH_SPACE_SHIFT: u32 = 10;
pub const MHW_SSH_BASE_SHIFT: u32 = 12;
pub const MHW_SLM_SHIFT: u32 = 2;
pub const MHW_INVALID_SYNC_TAG: u32 = 0xFFFF_FFFF;
pub const MHW_TIMEOUT_MS_DEFAULT: u32 = 100;
pub const MHW_EVENT_TIMEOUT_MS: u32 = 5;
pub const MHW_MAX_VFE_URB_ENTRIES: u32 = 32;

// Command opcodes, stored in bits 31:16 of the first dword.
pub const MHW_OPCODE_MI_BATCH_BUFFER_START: u32 = 0x1880;
pub const MHW_OPCODE_MI_LOAD_REGISTER_IMM: u32 = 0x1100;
pub const MHW_OPCODE_STATE_BASE_ADDRESS: u32 = 0x6101;
pub const MHW_OPCODE_STATE_SIP: u32 = 0x6102;
pub const MHW_OPCODE_PIPELINE_SELECT: u32 = 0x6904;
pub const MHW_OPCODE_MEDIA_VFE_STATE: u32 = 0x7000;
pub const MHW_OPCODE_MEDIA_CURBE_LOAD: u32 = 0x7001;
pub const MHW_OPCODE_MEDIA_INTERFACE_DESCRIPTOR_LOAD: u32 = 0x7002;
pub const MHW_OPCODE_MEDIA_OBJECT_WALKER: u32 = 0x7103;
pub const MHW_OPCODE_GPGPU_WALKER: u32 = 0x7105;
pub const MHW_OPCODE_CFE_STATE: u32 = 0x7200;
pub const MHW_OPCODE_COMPUTE_WALKER: u32 = 0x7202;
pub const MHW_OPCODE_PIPE_CONTROL: u32 = 0x7a00;
pub const MHW_OPCODE_SAMPLER_PALETTE_LOAD: u32 = 0x7902;
pub const MHW_OPCODE_CHROMA_KEY: u32 = 0x7904;
pub const MHW_OPCODE_BINDING_TABLE_POOL_ALLOC: u32 = 0x7919;

// Registers touched through MI_LOAD_REGISTER_IMM.
pub const MHW_L3_CNTL_REGISTER: u32 = 0x7034;
pub const MHW_PREEMPTION_CONTROL_REGISTER: u32 = 0x2580;

pub const MHW_L3_CONFIG_DEFAULT: u32 = 0x6000_0060;
pub const MHW_L3_CONFIG_SLM: u32 = 0x6000_0121;

pub const MHW_PREEMPTION_MID_THREAD: u32 = 0x0006_0000;
pub const MHW_PREEMPTION_THREAD_GROUP: u32 = 0x0006_0002;

pub const MHW_PIPELINE_MEDIA: u32 = 1;
pub const MHW_PIPELINE_GPGPU: u32 = 2;

pub const MHW_PIPE_CONTROL_FLUSH_WRITE_CACHE: u32 = 1 << 0;
pub const MHW_PIPE_CONTROL_INVALIDATE_READ_CACHE: u32 = 1 << 1;
pub const MHW_PIPE_CONTROL_CS_STALL: u32 = 1 << 20;
pub const MHW_PIPE_CONTROL_POST_SYNC_WRITE_IMMEDIATE: u32 = 1 << 14;

/// Builds the header dword of a fixed-format command of `size` bytes.
pub const fn command_header(opcode: u32, size: usize) -> u32 {
    (opcode << 16) | ((size as u32 / 4).saturating_sub(2))
}

/// A fixed-format command that can be appended to a command buffer.
pub trait MhwCommand: IntoBytes + Immutable {
    const OPCODE: u32;

    fn header() -> u32
    where
        Self: Sized,
    {
        command_header(Self::OPCODE, std::mem::size_of::<Self>())
    }
}

macro_rules! mhw_command {
    ($name:ident, $opcode:expr) => {
        impl MhwCommand for $name {
            const OPCODE: u32 = $opcode;
        }
    };
}

#[repr(C)]
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, IntoBytes, FromBytes, Immutable, KnownLayout)]
pub struct MhwPipeControl {
    pub header: u32,
    pub flags: u32,
    pub address_lo: u32,
    pub address_hi: u32,
    pub immediate_data: u32,
    pub reserved: u32,
}

impl MhwPipeControl {
    pub fn has_post_sync_write(&self) -> bool {
        self.flags & MHW_PIPE_CONTROL_POST_SYNC_WRITE_IMMEDIATE != 0
    }
}

#[repr(C)]
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, IntoBytes, FromBytes, Immutable, KnownLayout)]
pub struct MhwPipelineSelect {
    pub header: u32,
    pub pipeline: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, IntoBytes, FromBytes, Immutable, KnownLayout)]
pub struct MhwStateBaseAddress {
    pub header: u32,
    pub general_state_base_lo: u32,
    pub general_state_base_hi: u32,
    pub general_state_size: u32,
    pub instruction_base_lo: u32,
    pub instruction_base_hi: u32,
    pub instruction_size: u32,
    pub surface_state_base_lo: u32,
    pub surface_state_base_hi: u32,
    pub indirect_object_size: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, IntoBytes, FromBytes, Immutable, KnownLayout)]
pub struct MhwBindingTablePoolAlloc {
    pub header: u32,
    pub base_lo: u32,
    pub base_hi: u32,
    pub size: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, IntoBytes, FromBytes, Immutable, KnownLayout)]
pub struct MhwSipState {
    pub header: u32,
    pub sip_lo: u32,
    pub sip_hi: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, IntoBytes, FromBytes, Immutable, KnownLayout)]
pub struct MhwVfeState {
    pub header: u32,
    pub scratch_base_lo: u32,
    pub scratch_base_hi: u32,
    pub per_thread_scratch_space: u32,
    pub max_threads: u32,
    pub num_urb_entries: u32,
    pub urb_entry_alloc_size: u32,
    pub curbe_alloc_size: u32,
    pub scoreboard_enable: u32,
    pub scoreboard_type: u32,
    pub scoreboard_mask: u32,
    pub scoreboard_delta: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, IntoBytes, FromBytes, Immutable, KnownLayout)]
pub struct MhwCfeState {
    pub header: u32,
    pub scratch_base_lo: u32,
    pub scratch_base_hi: u32,
    pub per_thread_scratch_space: u32,
    pub max_threads: u32,
    pub num_urb_entries: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, IntoBytes, FromBytes, Immutable, KnownLayout)]
pub struct MhwCurbeLoad {
    pub header: u32,
    pub reserved: u32,
    pub length: u32,
    pub start_address: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, IntoBytes, FromBytes, Immutable, KnownLayout)]
pub struct MhwIdLoad {
    pub header: u32,
    pub reserved: u32,
    pub length: u32,
    pub start_address: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, IntoBytes, FromBytes, Immutable, KnownLayout)]
pub struct MhwChromaKey {
    pub header: u32,
    pub index: u32,
    pub low: u32,
    pub high: u32,
}

/// Followed in the command stream by `entry_count` dwords of palette data.
#[repr(C)]
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, IntoBytes, FromBytes, Immutable, KnownLayout)]
pub struct MhwPaletteLoad {
    pub header: u32,
    pub palette_id: u32,
    pub entry_count: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, IntoBytes, FromBytes, Immutable, KnownLayout)]
pub struct MhwLoadRegisterImm {
    pub header: u32,
    pub register: u32,
    pub value: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, IntoBytes, FromBytes, Immutable, KnownLayout)]
pub struct MhwBatchBufferStart {
    pub header: u32,
    pub address_lo: u32,
    pub address_hi: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, IntoBytes, FromBytes, Immutable, KnownLayout)]
pub struct MhwMediaObjectWalker {
    pub header: u32,
    pub interface_descriptor_offset: u32,
    pub use_scoreboard: u32,
    pub scoreboard_mask: u32,
    pub color_count_minus_one: u32,
    pub global_resolution: u32,
    pub global_start: u32,
    pub global_outer_loop_stride: u32,
    pub global_inner_loop_unit: u32,
    pub block_resolution: u32,
    pub local_start: u32,
    pub local_end: u32,
    pub local_outer_loop_stride: u32,
    pub local_inner_loop_unit: u32,
    pub middle_loop_extra_steps: u32,
    pub mid_loop_unit: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, IntoBytes, FromBytes, Immutable, KnownLayout)]
pub struct MhwGpgpuWalker {
    pub header: u32,
    pub interface_descriptor_offset: u32,
    pub simd_size: u32,
    pub thread_width: u32,
    pub thread_height: u32,
    pub thread_depth: u32,
    pub group_start_x: u32,
    pub group_width: u32,
    pub group_start_y: u32,
    pub group_height: u32,
    pub group_start_z: u32,
    pub group_depth: u32,
    pub right_mask: u32,
    pub bottom_mask: u32,
}

/// Compute-context dispatch with the interface descriptor folded in.
#[repr(C)]
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, IntoBytes, FromBytes, Immutable, KnownLayout)]
pub struct MhwComputeWalker {
    pub header: u32,
    pub simd_size: u32,
    pub group_width: u32,
    pub group_height: u32,
    pub group_depth: u32,
    pub kernel_start_pointer: u32,
    pub binding_table_pointer: u32,
    pub sampler_state_pointer: u32,
    pub indirect_data_start: u32,
    pub indirect_data_length: u32,
    pub thread_group: u32,
    pub reserved: u32,
}

mhw_command!(MhwPipeControl, MHW_OPCODE_PIPE_CONTROL);
mhw_command!(MhwPipelineSelect, MHW_OPCODE_PIPELINE_SELECT);
mhw_command!(MhwStateBaseAddress, MHW_OPCODE_STATE_BASE_ADDRESS);
mhw_command!(MhwBindingTablePoolAlloc, MHW_OPCODE_BINDING_TABLE_POOL_ALLOC);
mhw_command!(MhwSipState, MHW_OPCODE_STATE_SIP);
mhw_command!(MhwVfeState, MHW_OPCODE_MEDIA_VFE_STATE);
mhw_command!(MhwCfeState, MHW_OPCODE_CFE_STATE);
mhw_command!(MhwCurbeLoad, MHW_OPCODE_MEDIA_CURBE_LOAD);
mhw_command!(MhwIdLoad, MHW_OPCODE_MEDIA_INTERFACE_DESCRIPTOR_LOAD);
mhw_command!(MhwChromaKey, MHW_OPCODE_CHROMA_KEY);
mhw_command!(MhwPaletteLoad, MHW_OPCODE_SAMPLER_PALETTE_LOAD);
mhw_command!(MhwLoadRegisterImm, MHW_OPCODE_MI_LOAD_REGISTER_IMM);
mhw_command!(MhwBatchBufferStart, MHW_OPCODE_MI_BATCH_BUFFER_START);
mhw_command!(MhwMediaObjectWalker, MHW_OPCODE_MEDIA_OBJECT_WALKER);
mhw_command!(MhwGpgpuWalker, MHW_OPCODE_GPGPU_WALKER);
mhw_command!(MhwComputeWalker, MHW_OPCODE_COMPUTE_WALKER);

// Interface descriptor bit fields.
pub const MHW_ID_BARRIER_ENABLE: u32 = 1 << 21;
pub const MHW_ID_SLM_SHIFT: u32 = 16;
pub const MHW_ID_SLM_MASK: u32 = 0x1f;
pub const MHW_ID_THREADS_MASK: u32 = 0x3ff;
pub const MHW_ID_SAMPLER_COUNT_SHIFT: u32 = 2;
pub const MHW_ID_CURBE_LENGTH_SHIFT: u32 = 16;

/// Arena-resident interface descriptor, 32 bytes.
#[repr(C)]
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, IntoBytes, FromBytes, Immutable, KnownLayout)]
pub struct MhwInterfaceDescriptorData {
    pub kernel_start_pointer: u32,
    pub kernel_start_pointer_high: u32,
    pub sampler_state: u32,
    pub binding_table: u32,
    pub constant_urb: u32,
    pub thread_group: u32,
    pub cross_thread_constant_data_length: u32,
    pub reserved: u32,
}

impl MhwInterfaceDescriptorData {
    pub fn barrier_enabled(&self) -> bool {
        self.thread_group & MHW_ID_BARRIER_ENABLE != 0
    }

    pub fn threads_in_group(&self) -> u32 {
        self.thread_group & MHW_ID_THREADS_MASK
    }

    pub fn slm_size(&self) -> u32 {
        (self.thread_group >> MHW_ID_SLM_SHIFT) & MHW_ID_SLM_MASK
    }
}

// Low bit of a binding-table entry marks an advanced (AVS) surface state.
pub const MHW_BT_ENTRY_AVS: u32 = 1 << 0;

#[repr(C)]
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, IntoBytes, FromBytes, Immutable, KnownLayout)]
pub struct MhwBindingTableEntry {
    pub surface_state_pointer: u32,
}

impl MhwBindingTableEntry {
    pub fn new(surface_state_offset: u32, avs: bool) -> MhwBindingTableEntry {
        let mut surface_state_pointer = surface_state_offset & !0x3f;
        if avs {
            surface_state_pointer |= MHW_BT_ENTRY_AVS;
        }
        MhwBindingTableEntry {
            surface_state_pointer,
        }
    }

    pub fn offset(&self) -> u32 {
        self.surface_state_pointer & !0x3f
    }

    pub fn is_avs(&self) -> bool {
        self.surface_state_pointer & MHW_BT_ENTRY_AVS != 0
    }
}

pub const MHW_SURFACE_FLAG_HALF_PITCH_CHROMA: u32 = 1 << 0;
pub const MHW_SURFACE_FLAG_INTERLEAVE_CHROMA: u32 = 1 << 1;
pub const MHW_SURFACE_FLAG_RENDER_TARGET: u32 = 1 << 2;
pub const MHW_SURFACE_FLAG_VERTICAL_STRIDE: u32 = 1 << 3;
pub const MHW_SURFACE_FLAG_VERTICAL_STRIDE_OFFSET: u32 = 1 << 4;
pub const MHW_SURFACE_FLAG_TILED: u32 = 1 << 5;
pub const MHW_SURFACE_FLAG_AVS: u32 = 1 << 6;
pub const MHW_SURFACE_FLAG_WIDTH_IN_DWORD: u32 = 1 << 7;
pub const MHW_SURFACE_FLAG_TILE_WALK_Y: u32 = 1 << 8;

// Sampler and data-port surface formats.
pub const MHW_GFX3DSTATE_SURFACEFORMAT_R32G32B32A32_FLOAT: u32 = 0x000;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_R16G16B16A16_UNORM: u32 = 0x080;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_R16G16B16A16_FLOAT: u32 = 0x084;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_R32_FLOAT_X8X24_TYPELESS: u32 = 0x088;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_B8G8R8A8_UNORM: u32 = 0x0c0;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_R10G10B10A2_UNORM: u32 = 0x0c2;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_R8G8B8A8_UNORM: u32 = 0x0c7;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_R16G16_UNORM: u32 = 0x0cc;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_R16G16_SINT: u32 = 0x0ce;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_B10G10R10A2_UNORM: u32 = 0x0d1;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_R32_SINT: u32 = 0x0d6;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_R32_UINT: u32 = 0x0d7;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_R32_FLOAT: u32 = 0x0d8;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_R24_UNORM_X8_TYPELESS: u32 = 0x0d9;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_B8G8R8X8_UNORM: u32 = 0x0e9;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_R8G8B8X8_UNORM: u32 = 0x0eb;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_R8B8G8A8_UNORM: u32 = 0x0fa;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_B5G6R5_UNORM: u32 = 0x100;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_R8G8_UNORM: u32 = 0x106;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_R8G8_SNORM: u32 = 0x107;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_R16_UNORM: u32 = 0x10a;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_R16_SINT: u32 = 0x10c;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_R16_UINT: u32 = 0x10d;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_R16_FLOAT: u32 = 0x10e;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_L16_UNORM: u32 = 0x112;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_R8_UNORM: u32 = 0x140;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_A8_UNORM: u32 = 0x144;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_L8_UNORM: u32 = 0x146;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_P4A4_UNORM_PALETTE_0: u32 = 0x147;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_A4P4_UNORM_PALETTE_0: u32 = 0x148;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_P8_UNORM_PALETTE_0: u32 = 0x14b;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_P8_UNORM_PALETTE_1: u32 = 0x14d;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_P4A4_UNORM_PALETTE_1: u32 = 0x14e;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_A4P4_UNORM_PALETTE_1: u32 = 0x14f;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_P8A8_UNORM_PALETTE_0: u32 = 0x122;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_P8A8_UNORM_PALETTE_1: u32 = 0x123;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_YCRCB_NORMAL: u32 = 0x182;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_YCRCB_SWAPUVY: u32 = 0x183;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_YCRCB_SWAPUV: u32 = 0x18f;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_YCRCB_SWAPY: u32 = 0x190;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_R8G8B8_UNORM: u32 = 0x193;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_PLANAR_420_8: u32 = 0x1a5;
pub const MHW_GFX3DSTATE_SURFACEFORMAT_PLANAR_420_16: u32 = 0x1a6;

// Advanced (sample_8x8) surface formats.
pub const MHW_MEDIASTATE_SURFACEFORMAT_YCRCB_NORMAL: u32 = 0;
pub const MHW_MEDIASTATE_SURFACEFORMAT_YCRCB_SWAPUVY: u32 = 1;
pub const MHW_MEDIASTATE_SURFACEFORMAT_YCRCB_SWAPUV: u32 = 2;
pub const MHW_MEDIASTATE_SURFACEFORMAT_YCRCB_SWAPY: u32 = 3;
pub const MHW_MEDIASTATE_SURFACEFORMAT_PLANAR_420_8: u32 = 4;
pub const MHW_MEDIASTATE_SURFACEFORMAT_PLANAR_411_8: u32 = 5;
pub const MHW_MEDIASTATE_SURFACEFORMAT_PLANAR_422_8: u32 = 6;
pub const MHW_MEDIASTATE_SURFACEFORMAT_STMM_DN_STATISTICS: u32 = 7;
pub const MHW_MEDIASTATE_SURFACEFORMAT_R10G10B10A2_UNORM: u32 = 8;
pub const MHW_MEDIASTATE_SURFACEFORMAT_R8G8B8A8_UNORM: u32 = 9;
pub const MHW_MEDIASTATE_SURFACEFORMAT_R8B8_UNORM: u32 = 10;
pub const MHW_MEDIASTATE_SURFACEFORMAT_R8_UNORM: u32 = 11;
pub const MHW_MEDIASTATE_SURFACEFORMAT_Y8_UNORM: u32 = 12;
pub const MHW_MEDIASTATE_SURFACEFORMAT_A8Y8U8V8_UNORM: u32 = 13;
pub const MHW_MEDIASTATE_SURFACEFORMAT_B8G8R8A8_UNORM: u32 = 14;
pub const MHW_MEDIASTATE_SURFACEFORMAT_R16G16B16A16: u32 = 15;
pub const MHW_MEDIASTATE_SURFACEFORMAT_Y1_UNORM: u32 = 16;
pub const MHW_MEDIASTATE_SURFACEFORMAT_PLANAR_420_16: u32 = 23;
pub const MHW_MEDIASTATE_SURFACEFORMAT_R16B16_UNORM: u32 = 24;
pub const MHW_MEDIASTATE_SURFACEFORMAT_R16_UNORM: u32 = 25;
pub const MHW_MEDIASTATE_SURFACEFORMAT_Y16_UNORM: u32 = 26;

// Chroma siting flags carried by a surface.
pub const MHW_CHROMA_SITING_NONE: u32 = 0;
pub const MHW_CHROMA_SITING_HORZ_LEFT: u32 = 1 << 0;
pub const MHW_CHROMA_SITING_HORZ_CENTER: u32 = 1 << 1;
pub const MHW_CHROMA_SITING_HORZ_RIGHT: u32 = 1 << 2;
pub const MHW_CHROMA_SITING_VERT_TOP: u32 = 1 << 4;
pub const MHW_CHROMA_SITING_VERT_CENTER: u32 = 1 << 5;
pub const MHW_CHROMA_SITING_VERT_BOTTOM: u32 = 1 << 6;

pub const MHW_CHROMA_SITING_VDIRECTION_0: u8 = 0x0;
pub const MHW_CHROMA_SITING_VDIRECTION_1_4: u8 = 0x1;
pub const MHW_CHROMA_SITING_VDIRECTION_1_2: u8 = 0x2;
pub const MHW_CHROMA_SITING_VDIRECTION_3_4: u8 = 0x3;
pub const MHW_CHROMA_SITING_VDIRECTION_1: u8 = 0x4;
pub const MHW_CHROMA_SITING_UDIRECTION_LEFT: u8 = 0x0;
pub const MHW_CHROMA_SITING_UDIRECTION_CENTER: u8 = 0x1;

/// Arena-resident surface state, 64 bytes for every supported generation.
#[repr(C)]
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, IntoBytes, FromBytes, Immutable, KnownLayout)]
pub struct MhwSurfaceState {
    pub format: u32,
    pub width: u32,
    pub height: u32,
    pub pitch: u32,
    pub flags: u32,
    pub y_offset: u32,
    pub u_offset: u32,
    pub v_offset: u32,
    pub address_lo: u32,
    pub address_hi: u32,
    pub plane: u32,
    pub chroma_direction: u32,
    pub address_control: u32,
    pub reserved: [u32; 3],
}

#[repr(C)]
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, IntoBytes, FromBytes, Immutable, KnownLayout)]
pub struct MhwSamplerState {
    pub control: u32,
    pub lod: u32,
    pub border_color_pointer: u32,
    pub address: u32,
}

/// Timestamp and component trailer at the end of every media state.
#[repr(C)]
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, IntoBytes, FromBytes, Immutable, KnownLayout)]
pub struct MhwMediaStateTrailer {
    pub start_time: u64,
    pub end_time: u64,
    pub component: u32,
    pub reserved: [u32; 11],
}

pub const MHW_MEDIA_STATE_TRAILER_SIZE: u32 = 64;
