// Copyright 2025 Google
// SPDX-License-Identifier: BSD-3-Clause

//! A render/media state-heap manager for Intel GPUs: carves kernels, per-dispatch media
//! states and surface states out of GPU-visible heaps and recycles them by completion fence.

#[macro_use]
mod macros;

mod batch_buffer;
mod kernel;
mod layout;
mod media_state;
mod palette;
mod planes;
mod renderhal;
mod renderhal_utils;
mod sequencer;
mod settings;
mod surface;
mod surface_state;

pub use crate::batch_buffer::BatchBuffer;
pub use crate::batch_buffer::BatchBufferList;
pub use crate::kernel::KernelAllocation;
pub use crate::kernel::KernelAllocationState;
pub use crate::kernel::KernelAllocationTable;
pub use crate::kernel::KernelBinary;
pub use crate::kernel::KernelCacheEntry;
pub use crate::kernel::KernelKey;
pub use crate::kernel::KernelParams;
pub use crate::layout::plan_layout;
pub use crate::layout::ArenaLayout;
pub use crate::layout::MediaStateLayout;
pub use crate::media_state::MediaState;
pub use crate::media_state::MediaStateRing;
pub use crate::palette::ChromaKey;
pub use crate::palette::Palette;
pub use crate::palette::PaletteState;
pub use crate::palette::PaletteTable;
pub use crate::planes::get_pixels_per_sample;
pub use crate::planes::MosFormat;
pub use crate::planes::PlaneDefinition;
pub use crate::planes::PlaneId;
pub use crate::planes::PlaneLayout;
pub use crate::renderhal::RenderHal;
pub use crate::renderhal::SamplerStateParams;
pub use crate::renderhal_utils::*;
pub use crate::sequencer::compute_vfe_params;
pub use crate::sequencer::encode_scratch_size;
pub use crate::sequencer::send_media_states;
pub use crate::sequencer::send_sync_tag;
pub use crate::sequencer::send_sync_tag_index;
pub use crate::sequencer::MediaStatesParams;
pub use crate::sequencer::ScoreboardParams;
pub use crate::sequencer::VfeRequest;
pub use crate::sequencer::Walker;
pub use crate::settings::RenderHalSettings;
pub use crate::settings::StateHeapSettings;
pub use crate::surface::adjust_boundary;
pub use crate::surface::calculate_y_offset;
pub use crate::surface::get_align_unit;
pub use crate::surface::get_di_uv_offset;
pub use crate::surface::is_2plane_nv12_needed;
pub use crate::surface::select_planes;
pub use crate::surface::set_chroma_direction;
pub use crate::surface::Boundary;
pub use crate::surface::FormatPolicy;
pub use crate::surface::MosSurface;
pub use crate::surface::PlaneSelection;
pub use crate::surface::Rect;
pub use crate::surface::RenderHalSurface;
pub use crate::surface::SampleType;
pub use crate::surface::ScalingMode;
pub use crate::surface::SurfaceStateParams;
pub use crate::surface::SurfaceUsage;
pub use crate::surface::TileType;
pub use crate::surface_state::round_surfaces_per_bt;
pub use crate::surface_state::SurfaceStateEntry;
pub use crate::surface_state::SurfaceStatePool;
