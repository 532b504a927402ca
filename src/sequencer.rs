// Copyright 2025 Google
// SPDX-License-Identifier: BSD-3-Clause

//! sequencer: Emits the fixed-order command stream that programs one media dispatch.

use log::error;
use mhw::CommandBuffer;
use mhw::MhwGpgpuWalkerParams;
use mhw::MhwIdEntryParams;
use mhw::MhwRenderInterface;
use mhw::MhwStateBaseAddressParams;
use mhw::MhwVfeParams;
use mhw::MhwWalkerParams;
use mhw::RenderEngineCaps;
use mhw::MHW_MAX_VFE_URB_ENTRIES;
use mhw::MHW_PIPE_CONTROL_CS_STALL;
use mhw::MHW_PIPE_CONTROL_FLUSH_WRITE_CACHE;
use mhw::MHW_PIPE_CONTROL_INVALIDATE_READ_CACHE;
use mhw::MHW_PIPE_CONTROL_POST_SYNC_WRITE_IMMEDIATE;
use serde::Deserialize;
use serde::Serialize;

use crate::palette::PaletteTable;
use crate::renderhal_utils::*;

const URB_UNIT_SHIFT: u32 = 5;
const MAX_SCRATCH_ENCODING: u32 = 12;
const MAX_SCOREBOARD_MASK_BITS: u32 = 8;

/// Writes the completion fence of the upcoming submission.
///
/// The first pipe control drains write caches; the second invalidates read caches and
/// stores `next_tag` at `sync_address` once everything before it retired.
pub fn send_sync_tag(
    render: &MhwRenderInterface,
    cmd_buf: &mut dyn CommandBuffer,
    sync_address: u64,
    next_tag: u32,
) -> RenderHalResult<()> {
    render.add_pipe_control(
        cmd_buf,
        MHW_PIPE_CONTROL_FLUSH_WRITE_CACHE | MHW_PIPE_CONTROL_CS_STALL,
        sync_address,
        0,
    )?;
    send_sync_tag_index(render, cmd_buf, sync_address, 0, next_tag)
}

/// Stores `next_tag` in sync slot `index`.
pub fn send_sync_tag_index(
    render: &MhwRenderInterface,
    cmd_buf: &mut dyn CommandBuffer,
    sync_address: u64,
    index: u32,
    next_tag: u32,
) -> RenderHalResult<()> {
    let address = index
        .checked_mul(RENDERHAL_SYNC_TAG_INDEX_STRIDE)
        .and_then(|offset| sync_address.checked_add(offset as u64))
        .ok_or(RenderHalError::InvalidParameter("sync tag index out of range"))?;
    render.add_pipe_control(
        cmd_buf,
        MHW_PIPE_CONTROL_INVALIDATE_READ_CACHE | MHW_PIPE_CONTROL_POST_SYNC_WRITE_IMMEDIATE,
        address,
        next_tag,
    )?;
    Ok(())
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreboardParams {
    /// Number of dependency deltas, below 8.
    pub mask_bits: u32,
    pub scoreboard_type: u32,
    pub delta: u32,
}

/// Caller-side VFE requirements; zero fields take the hardware defaults.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VfeRequest {
    pub max_threads: u32,
    pub curbe_allocation_size: u32,
    pub urb_entry_allocation_size: u32,
    pub scoreboard: Option<ScoreboardParams>,
}

/// Encodes a per-thread scratch size in bytes as log2 of its KiB count.
pub fn encode_scratch_size(per_thread_scratch_size: u32) -> RenderHalResult<u32> {
    let kb = per_thread_scratch_size >> 10;
    if kb == 0 || !kb.is_power_of_two() || kb << 10 != per_thread_scratch_size {
        return Err(RenderHalError::InvalidConfig(format!(
            "per-thread scratch size {} is not a power-of-two KiB count",
            per_thread_scratch_size
        )));
    }

    let encoded = kb.trailing_zeros();
    if encoded >= MAX_SCRATCH_ENCODING {
        return Err(RenderHalError::InvalidConfig(format!(
            "per-thread scratch size {} too large",
            per_thread_scratch_size
        )));
    }
    Ok(encoded)
}

/// Derives the VFE state of a dispatch from the engine limits and the CURBE bytes loaded in
/// the current media state.
pub fn compute_vfe_params(
    caps: &RenderEngineCaps,
    curbe_loaded: u32,
    per_thread_scratch_size: u32,
    scratch_space_base: u64,
    request: &VfeRequest,
) -> RenderHalResult<MhwVfeParams> {
    let curbe_units = request
        .curbe_allocation_size
        .max(curbe_loaded)
        .div_ceil(1 << URB_UNIT_SHIFT);
    let urb_entry_units = request
        .urb_entry_allocation_size
        .div_ceil(1 << URB_UNIT_SHIFT)
        .max(1);
    let num_urb_entries = (caps
        .max_urb_size
        .saturating_sub(curbe_units)
        .saturating_sub(caps.max_interface_descriptor_entries)
        / urb_entry_units)
        .clamp(1, MHW_MAX_VFE_URB_ENTRIES);
    let max_threads = match request.max_threads {
        0 => caps.max_threads,
        threads => threads.min(caps.max_threads),
    };

    let mut params = MhwVfeParams {
        max_threads,
        num_urb_entries,
        urb_entry_alloc_size: urb_entry_units,
        curbe_alloc_size: curbe_units << URB_UNIT_SHIFT,
        scoreboard_enable: true,
        ..Default::default()
    };

    if let Some(scoreboard) = request.scoreboard {
        if scoreboard.mask_bits >= MAX_SCOREBOARD_MASK_BITS {
            return Err(RenderHalError::InvalidParameter("scoreboard mask too wide"));
        }
        params.scoreboard_mask = (1 << scoreboard.mask_bits) - 1;
        params.scoreboard_type = scoreboard.scoreboard_type;
        params.scoreboard_delta = scoreboard.delta;
    }

    if per_thread_scratch_size > 0 {
        params.per_thread_scratch_space = encode_scratch_size(per_thread_scratch_size)?;
        params.scratch_space_base = scratch_space_base;
    }
    Ok(params)
}

/// The dispatch command that ends a media-state sequence.
#[derive(Copy, Clone, Debug)]
pub enum Walker<'a> {
    Media(&'a MhwWalkerParams),
    Gpgpu(&'a MhwGpgpuWalkerParams),
}

/// Everything the sequencer programs ahead of the dispatch.
#[derive(Clone, Debug, Default)]
pub struct MediaStatesParams {
    pub sync_address: u64,
    pub next_tag: u32,
    pub state_base: MhwStateBaseAddressParams,
    pub binding_table_pool_size: u32,
    pub sip_base: Option<u64>,
    pub vfe: MhwVfeParams,
    /// General-heap offset and length of the CURBE loaded for this dispatch.
    pub curbe: (u32, u32),
    /// General-heap offset and length of the interface descriptor block.
    pub media_ids: (u32, u32),
    /// Interface descriptor folded into the compute walker.
    pub id_params: Option<MhwIdEntryParams>,
}

/// Appends the whole media-state sequence for one dispatch to `cmd_buf`.
///
/// Any failure aborts the sequence; the partially filled buffer must not be submitted.
pub fn send_media_states(
    render: &MhwRenderInterface,
    cmd_buf: &mut dyn CommandBuffer,
    params: &MediaStatesParams,
    palettes: &PaletteTable,
    walker: Option<Walker<'_>>,
) -> RenderHalResult<()> {
    let compute_context = render.platform().compute_context;
    let gpgpu = matches!(walker, Some(Walker::Gpgpu(_)));
    let enable_slm = matches!(walker, Some(Walker::Gpgpu(w)) if w.slm_size > 0);

    send_sync_tag(render, cmd_buf, params.sync_address, params.next_tag)?;

    render.add_l3_config(cmd_buf, enable_slm)?;
    render.add_preemption_config(cmd_buf, gpgpu)?;
    render.add_pipeline_select(cmd_buf, gpgpu)?;
    render.add_state_base_address(cmd_buf, &params.state_base)?;

    if compute_context {
        render.add_binding_table_pool(
            cmd_buf,
            params.state_base.surface_state_base,
            params.binding_table_pool_size,
        )?;
    }
    if let Some(sip_base) = params.sip_base {
        render.add_sip_state(cmd_buf, sip_base)?;
    }

    render.add_vfe_state(cmd_buf, &params.vfe)?;

    if !compute_context {
        let (curbe_start, curbe_length) = params.curbe;
        if curbe_length > 0 {
            render.add_curbe_load(cmd_buf, curbe_start, curbe_length)?;
        }
        let (id_start, id_length) = params.media_ids;
        render.add_id_load(cmd_buf, id_start, id_length)?;
    }

    for (index, key) in palettes.chroma_keys().iter().enumerate() {
        render.add_chroma_key(cmd_buf, index as u32, key.low, key.high)?;
    }
    for (id, palette) in palettes.palettes().iter().enumerate() {
        let entries = palette.loaded_entries();
        if !entries.is_empty() {
            render.add_palette_load(cmd_buf, id as u32, entries)?;
        }
    }

    match walker {
        Some(Walker::Media(w)) => render.add_media_object_walker(cmd_buf, w)?,
        Some(Walker::Gpgpu(w)) if compute_context => {
            let Some(id_params) = params.id_params.as_ref() else {
                error!("compute walker without an interface descriptor");
                return Err(RenderHalError::InvalidMediaState);
            };
            render.add_compute_walker(cmd_buf, w, id_params)?
        }
        Some(Walker::Gpgpu(w)) => render.add_gpgpu_walker(cmd_buf, w)?,
        None => {}
    }
    Ok(())
}
