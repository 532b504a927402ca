// Copyright 2025 Google
// SPDX-License-Identifier: BSD-3-Clause

//! renderhal_utils: Error codes, hardware limits and small helpers shared by the heap managers.

use mhw::MhwError;
use remain::sorted;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::planes::MosFormat;

/// An error generated while managing the render state heaps.
#[sorted]
#[derive(Error, Debug)]
pub enum RenderHalError {
    #[error("batch buffer {0} is already locked")]
    BatchBufferAlreadyLocked(usize),
    #[error("batch buffer {0} is not locked")]
    BatchBufferNotLocked(usize),
    #[error("no binding table left in the surface state heap")]
    BindingTableExhausted,
    #[error("arithmetic failed: {0}")]
    CheckedArithmetic(&'static str),
    #[error("no chroma key left for this dispatch")]
    ChromaKeyExhausted,
    #[error("curbe exhausted: {requested} bytes requested, {available} available")]
    CurbeExhausted { requested: u32, available: u32 },
    #[error("state heaps are not allocated")]
    HeapNotAllocated,
    #[error("invalid batch buffer {0}")]
    InvalidBatchBuffer(usize),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("curbe range {offset}+{length} lies outside the {loaded} bytes loaded")]
    InvalidCurbeRange {
        offset: u32,
        length: u32,
        loaded: u32,
    },
    #[error("invalid kernel allocation {0}")]
    InvalidKernelAllocation(usize),
    #[error("no media state is currently assigned")]
    InvalidMediaState,
    #[error("invalid palette {0}")]
    InvalidPalette(usize),
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),
    #[error("json error: {0}")]
    Json(serde_json::Error),
    #[error("kernel of {0} bytes does not fit in the instruction heap")]
    KernelHeapFull(u32),
    #[error("all interface descriptors of the media state are in use")]
    MediaIdExhausted,
    #[error("hardware interface error: {0}")]
    Mhw(MhwError),
    #[error("all palettes are in use")]
    PaletteExhausted,
    #[error("no surface state left in the surface state heap")]
    SurfaceStateExhausted,
    #[error("media state {index} still busy with tag {tag} after {timeout_ms} ms")]
    Timeout {
        index: usize,
        tag: u32,
        timeout_ms: u32,
    },
    #[error("unsupported surface format {0:?}")]
    UnsupportedFormat(MosFormat),
}

impl From<MhwError> for RenderHalError {
    fn from(e: MhwError) -> RenderHalError {
        RenderHalError::Mhw(e)
    }
}

impl From<serde_json::Error> for RenderHalError {
    fn from(e: serde_json::Error) -> RenderHalError {
        RenderHalError::Json(e)
    }
}

pub type RenderHalResult<T> = std::result::Result<T, RenderHalError>;

pub const RENDERHAL_SYNC_SIZE: u32 = 128;
pub const RENDERHAL_SYNC_SIZE_MIN: u32 = 128;
pub const RENDERHAL_SYNC_SIZE_MAX: u32 = 4096;
pub const RENDERHAL_MEDIA_STATES: u32 = 16;
pub const RENDERHAL_MEDIA_IDS: u32 = 16;
pub const RENDERHAL_MEDIA_IDS_MAX: u32 = 64;
pub const RENDERHAL_URB_SIZE_MAX: u32 = 2048;
pub const RENDERHAL_CURBE_SIZE: u32 = 832;
pub const RENDERHAL_CURBE_SIZE_MAX: u32 = RENDERHAL_URB_SIZE_MAX - RENDERHAL_MEDIA_IDS_MAX;
pub const RENDERHAL_SAMPLERS: u32 = 16;
pub const RENDERHAL_SAMPLERS_VA: u32 = 8;
pub const RENDERHAL_SAMPLERS_MAX: u32 = 16;
pub const RENDERHAL_SAMPLERS_VA_MAX: u32 = 8;
pub const RENDERHAL_SAMPLERS_AVS_MAX: u32 = 8;
pub const RENDERHAL_KERNEL_COUNT: u32 = 32;
pub const RENDERHAL_KERNEL_COUNT_MIN: u32 = 2;
pub const RENDERHAL_KERNEL_HEAP: u32 = 2_097_152;
pub const RENDERHAL_KERNEL_HEAP_MIN: u32 = 65_536;
pub const RENDERHAL_KERNEL_HEAP_MAX: u32 = 2_097_152;
pub const RENDERHAL_KERNEL_BLOCK_SIZE: u32 = 65_536;
pub const RENDERHAL_KERNEL_BLOCK_MIN: u32 = 1024;
pub const RENDERHAL_KERNEL_BLOCK_MAX: u32 = 65_536;
pub const RENDERHAL_SSH_BINDING_TABLES: u32 = 1;
pub const RENDERHAL_SSH_BINDING_TABLES_MIN: u32 = 1;
pub const RENDERHAL_SSH_BINDING_TABLES_MAX: u32 = 16;
pub const RENDERHAL_SSH_BINDING_TABLE_ALIGN: u32 = 64;
pub const RENDERHAL_SSH_SURFACE_STATES: u32 = 40;
pub const RENDERHAL_SSH_SURFACE_STATES_MIN: u32 = 16;
pub const RENDERHAL_SSH_SURFACE_STATES_MAX: u32 = 256;
pub const RENDERHAL_SSH_SURFACES_PER_BT: u32 = 64;
pub const RENDERHAL_SSH_SURFACES_PER_BT_MIN: u32 = 4;
pub const RENDERHAL_SSH_SURFACES_PER_BT_MAX: u32 = 256;
pub const RENDERHAL_PALETTE_COUNT: usize = 2;
pub const RENDERHAL_PALETTE_ENTRIES_MAX: usize = 256;
pub const RENDERHAL_CHROMA_KEY_COUNT: usize = 4;
pub const RENDERHAL_MAX_SIP_SIZE: u32 = 0x4000;
pub const RENDERHAL_KERNEL_BLOCK_ALIGN: u32 = 64;
pub const RENDERHAL_URB_BLOCK_ALIGN: u32 = 64;
pub const RENDERHAL_SYNC_BLOCK_ALIGN: u32 = 128;
pub const RENDERHAL_CURBE_BLOCK_ALIGN: u32 = 64;
pub const RENDERHAL_MAX_YV12_PLANE_Y_U_OFFSET_G9: u32 = 16383;
pub const RENDERHAL_NV12_HEIGHT_WA_LIMIT: u32 = 16352;
pub const RENDERHAL_SYNC_TAG_INDEX_STRIDE: u32 = 8;
pub const RENDERHAL_MAX_SURFACE_PLANES: usize = 3;

/// Rounds `value` up to a multiple of `align`.
pub fn align_ceil(value: u32, align: u32) -> u32 {
    if align == 0 {
        return value;
    }
    value.div_ceil(align) * align
}

/// `align_ceil` that reports overflow instead of wrapping.
pub fn checked_align_ceil(value: u32, align: u32) -> RenderHalResult<u32> {
    if align == 0 {
        return Ok(value);
    }
    value
        .div_ceil(align)
        .checked_mul(align)
        .ok_or(RenderHalError::CheckedArithmetic("align_ceil"))
}

/// Rounds `value` down to a multiple of `align`.
pub fn align_floor(value: u32, align: u32) -> u32 {
    if align == 0 {
        return value;
    }
    value - value % align
}

/// Returns true once the GPU-reported `fence` has moved strictly past `tag`.
///
/// The comparison is a signed 32-bit difference, valid across wraparound while fewer than
/// 2^31 tags separate the two values.
pub fn fence_passed(fence: u32, tag: u32) -> bool {
    (fence.wrapping_sub(tag) as i32) > 0
}

/// Driver components that submit media work, used to bucket kernel execution time.
#[repr(u32)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RenderHalComponent {
    #[default]
    Unknown = 0,
    Comp = 1,
    Dndi = 2,
    Vebox = 3,
    Cm = 4,
    Align16 = 5,
    Fast1ToN = 6,
    Hdr = 7,
}

pub const RENDERHAL_COMPONENT_COUNT: usize = 16;

impl RenderHalComponent {
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Kind of surface state record a plane is programmed with.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfaceStateType {
    #[default]
    Invalid,
    G8,
    G9,
    G10,
    AdvG8,
    AdvG9,
    AdvG10,
}

impl SurfaceStateType {
    pub fn is_advanced(self) -> bool {
        matches!(
            self,
            SurfaceStateType::AdvG8 | SurfaceStateType::AdvG9 | SurfaceStateType::AdvG10
        )
    }

    /// Regular counterpart of an advanced type.
    pub fn regular(self) -> SurfaceStateType {
        match self {
            SurfaceStateType::AdvG8 => SurfaceStateType::G8,
            SurfaceStateType::AdvG9 => SurfaceStateType::G9,
            SurfaceStateType::AdvG10 => SurfaceStateType::G10,
            other => other,
        }
    }
}
