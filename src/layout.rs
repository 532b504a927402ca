// Copyright 2025 Google
// SPDX-License-Identifier: BSD-3-Clause

//! layout: Computes the byte layout of the general, instruction and surface state heaps.

use std::ops::Range;

use mhw::PlatformDescriptor;
use mhw::MHW_MEDIA_STATE_ALIGN;
use mhw::MHW_PAGE_SIZE;
use mhw::MHW_SAMPLER_STATE_ALIGN;
use mhw::MHW_SAMPLER_STATE_AVS_ALIGN;
use mhw::MHW_SAMPLER_STATE_AVS_ALIGN_G9;
use mhw::MHW_SAMPLER_STATE_VA_ALIGN;
use mhw::MHW_SCRATCH_SPACE_ALIGN;
use serde::Serialize;

use crate::renderhal_utils::*;
use crate::settings::StateHeapSettings;

const TIMESTAMP_SIZE: u32 = 8;
const COMPONENT_ID_SIZE: u32 = 4;
const TRAILER_RESERVED_SIZE: u32 = 44;

/// Offsets inside one media state, relative to the media state's base.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MediaStateLayout {
    pub curbe_offset: u32,
    pub curbe_size: u32,
    pub sampler_offset: u32,
    /// Bytes of sampler state owned by one interface descriptor.
    pub sampler_size: u32,
    /// Distance between the sampler blocks of consecutive interface descriptors.
    pub sampler_stride: u32,
    pub sampler_va_offset: u32,
    pub sampler_va_size: u32,
    pub sampler_avs_offset: u32,
    pub sampler_avs_size: u32,
    pub sampler_indirect_offset: u32,
    pub sampler_indirect_size: u32,
    pub sampler_8x8_table_offset: u32,
    pub sampler_8x8_table_size: u32,
    pub media_id_offset: u32,
    pub media_id_size: u32,
    pub start_time_offset: u32,
    pub end_time_offset: u32,
    pub component_id_offset: u32,
    pub reserved_offset: u32,
    pub size: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ArenaLayout {
    pub sync_offset: u32,
    pub sync_size: u32,
    pub media_state_base: u32,
    pub media_state_count: u32,
    pub media_ids: u32,
    pub media_state: MediaStateLayout,
    pub scratch_space_base: u32,
    pub scratch_space_size: u32,
    pub gsh_size: u32,

    pub kernel_base: u32,
    pub kernel_heap_size: u32,
    pub sip_base: u32,
    pub sip_size: u32,
    pub ish_size: u32,

    pub binding_table_size: u32,
    pub binding_table_entry_size: u32,
    pub binding_table_count: u32,
    pub surface_state_offset: u32,
    pub surface_state_size: u32,
    pub surface_state_count: u32,
    pub ssh_instance_size: u32,
    pub indirect_heap_size: u32,
}

impl ArenaLayout {
    /// Byte offset of media state `index` in the general state heap.
    pub fn media_state_offset(&self, index: usize) -> u32 {
        self.media_state_base + index as u32 * self.media_state.size
    }

    /// Every populated general-heap region as `(name, byte range)`.
    pub fn gsh_regions(&self) -> Vec<(&'static str, Range<u32>)> {
        let ms = &self.media_state;
        let mut regions = vec![("sync", self.sync_offset..self.sync_offset + self.sync_size)];
        for index in 0..self.media_state_count as usize {
            let base = self.media_state_offset(index);
            let mut push = |name: &'static str, offset: u32, size: u32| {
                if size > 0 {
                    regions.push((name, base + offset..base + offset + size));
                }
            };
            push("curbe", ms.curbe_offset, ms.curbe_size);
            let samplers_end = if ms.sampler_8x8_table_offset != 0 {
                ms.sampler_8x8_table_offset
            } else {
                ms.media_id_offset
            };
            push("samplers", ms.sampler_offset, samplers_end - ms.sampler_offset);
            if ms.sampler_8x8_table_offset != 0 {
                push(
                    "sampler_8x8",
                    ms.sampler_8x8_table_offset,
                    ms.media_id_offset - ms.sampler_8x8_table_offset,
                );
            }
            push(
                "media_ids",
                ms.media_id_offset,
                self.media_ids * ms.media_id_size,
            );
            push(
                "trailer",
                ms.start_time_offset,
                ms.reserved_offset + TRAILER_RESERVED_SIZE - ms.start_time_offset,
            );
        }
        if self.scratch_space_size > 0 {
            regions.push((
                "scratch",
                self.scratch_space_base..self.scratch_space_base + self.scratch_space_size,
            ));
        }
        regions
    }
}

fn plan_media_state(
    settings: &StateHeapSettings,
    platform: &PlatformDescriptor,
) -> RenderHalResult<MediaStateLayout> {
    let sizes = &platform.sizes;
    let gen9_or_later = platform.generation.is_gen9_or_later();
    let media_ids = settings.media_ids;
    let samplers = settings.samplers;
    let samplers_va = settings.samplers_va;
    let samplers_avs = settings.samplers_avs;
    let mut ms = MediaStateLayout::default();
    let mut cursor = 0u32;

    ms.curbe_offset = cursor;
    ms.curbe_size = settings.curbe_size;
    let curbe_size = ms.curbe_size;
    cursor = checked_arithmetic!(cursor + curbe_size)?;

    let sampler_state = sizes.sampler_state;
    let sampler_bytes = checked_arithmetic!(samplers * sampler_state)?;
    if !platform.combined_avs_sampler_state {
        ms.sampler_offset = cursor;
        ms.sampler_size = checked_align_ceil(sampler_bytes, MHW_SAMPLER_STATE_ALIGN)?;
        ms.sampler_stride = ms.sampler_size;
        let sampler_size = ms.sampler_size;
        let samplers_total = checked_arithmetic!(media_ids * sampler_size)?;
        cursor = checked_arithmetic!(cursor + samplers_total)?;

        ms.sampler_8x8_table_offset = cursor;
        ms.sampler_8x8_table_size =
            checked_align_ceil(sizes.sampler_8x8_table, MHW_SAMPLER_STATE_ALIGN)?;
        let table_size = ms.sampler_8x8_table_size;
        let tables_total = checked_arithmetic!(samplers_avs * table_size)?;
        cursor = checked_arithmetic!(cursor + tables_total)?;
    } else {
        let samplers_start = cursor;
        ms.sampler_offset = cursor;
        ms.sampler_size = checked_align_ceil(sampler_bytes, MHW_SAMPLER_STATE_ALIGN)?;
        let sampler_size = ms.sampler_size;
        cursor = checked_arithmetic!(cursor + sampler_size)?;

        let sampler_state_va = sizes.sampler_state_va;
        let va_bytes = checked_arithmetic!(samplers_va * sampler_state_va)?;
        ms.sampler_va_offset = cursor;
        ms.sampler_va_size = checked_align_ceil(va_bytes, MHW_SAMPLER_STATE_VA_ALIGN)?;
        let va_size = ms.sampler_va_size;
        cursor = checked_arithmetic!(cursor + va_size)?;

        if gen9_or_later {
            let past_curbe = checked_arithmetic!(cursor - curbe_size)?;
            let aligned = checked_align_ceil(past_curbe, MHW_SAMPLER_STATE_AVS_ALIGN_G9)?;
            cursor = checked_arithmetic!(aligned + curbe_size)?;
        }

        let sampler_state_avs = sizes.sampler_state_avs;
        let avs_bytes = checked_arithmetic!(samplers_avs * sampler_state_avs)?;
        ms.sampler_avs_offset = cursor;
        ms.sampler_avs_size = checked_align_ceil(avs_bytes, MHW_SAMPLER_STATE_AVS_ALIGN)?;
        let avs_size = ms.sampler_avs_size;
        cursor = checked_arithmetic!(cursor + avs_size)?;

        let indirect_state = sizes.sampler_indirect_state;
        let indirect_bytes = checked_arithmetic!(samplers * indirect_state)?;
        ms.sampler_indirect_offset = cursor;
        ms.sampler_indirect_size = checked_align_ceil(indirect_bytes, MHW_SAMPLER_STATE_ALIGN)?;
        let indirect_size = ms.sampler_indirect_size;
        cursor = checked_arithmetic!(cursor + indirect_size)?;

        let block = checked_arithmetic!(cursor - samplers_start)?;
        ms.sampler_stride = checked_align_ceil(block, MHW_SAMPLER_STATE_ALIGN)?;
        let stride = ms.sampler_stride;
        let samplers_total = checked_arithmetic!(media_ids * stride)?;
        cursor = checked_arithmetic!(cursor + samplers_total)?;

        // The 8x8 table lives inside each AVS sampler state.
        ms.sampler_8x8_table_offset = 0;
        ms.sampler_8x8_table_size = sizes.sampler_8x8_table;
    }

    ms.media_id_offset = cursor;
    ms.media_id_size = sizes.interface_descriptor;
    let media_id_size = ms.media_id_size;
    let media_ids_total = checked_arithmetic!(media_ids * media_id_size)?;
    cursor = checked_arithmetic!(cursor + media_ids_total)?;

    let timestamp_size = TIMESTAMP_SIZE;
    let component_id_size = COMPONENT_ID_SIZE;
    let reserved_size = TRAILER_RESERVED_SIZE;
    ms.start_time_offset = cursor;
    cursor = checked_arithmetic!(cursor + timestamp_size)?;
    ms.end_time_offset = cursor;
    cursor = checked_arithmetic!(cursor + timestamp_size)?;
    ms.component_id_offset = cursor;
    cursor = checked_arithmetic!(cursor + component_id_size)?;
    ms.reserved_offset = cursor;
    cursor = checked_arithmetic!(cursor + reserved_size)?;

    let trailing_align = if gen9_or_later {
        MHW_SAMPLER_STATE_AVS_ALIGN_G9
    } else {
        MHW_SAMPLER_STATE_AVS_ALIGN
    };
    ms.size = checked_align_ceil(cursor, trailing_align)?;
    Ok(ms)
}

/// Lays out all three state heaps for `settings` on `platform`.
///
/// Settings are validated first; no memory is touched.
pub fn plan_layout(
    settings: &StateHeapSettings,
    platform: &PlatformDescriptor,
) -> RenderHalResult<ArenaLayout> {
    settings.validate()?;

    let mut layout = ArenaLayout {
        sync_offset: 0,
        sync_size: settings.sync_size,
        media_state_count: settings.media_states,
        media_ids: settings.media_ids,
        ..Default::default()
    };

    let mut gsh_size = checked_align_ceil(layout.sync_size, MHW_MEDIA_STATE_ALIGN)?;
    layout.media_state_base = gsh_size;
    layout.media_state = plan_media_state(settings, platform)?;

    let media_state_size = layout.media_state.size;
    let media_states = settings.media_states;
    let media_states_size = checked_arithmetic!(media_state_size * media_states)?;
    gsh_size = checked_arithmetic!(gsh_size + media_states_size)?;

    if settings.per_thread_scratch_size > 0 {
        gsh_size = checked_align_ceil(gsh_size, MHW_SCRATCH_SPACE_ALIGN)?;
        let entries = platform.scratch_space_entries();
        let per_thread = settings.per_thread_scratch_size;
        layout.scratch_space_size = checked_arithmetic!(entries * per_thread)?;
        layout.scratch_space_base = gsh_size;
        let scratch_size = layout.scratch_space_size;
        gsh_size = checked_arithmetic!(gsh_size + scratch_size)?;
    }
    layout.gsh_size = gsh_size;

    layout.kernel_base = 0;
    layout.kernel_heap_size =
        checked_align_ceil(settings.kernel_heap_size, RENDERHAL_KERNEL_BLOCK_ALIGN)?;
    layout.sip_base = layout.kernel_heap_size;
    layout.sip_size = checked_align_ceil(settings.sip_size, RENDERHAL_KERNEL_BLOCK_ALIGN)?;
    let sip_base = layout.sip_base;
    let sip_size = layout.sip_size;
    layout.ish_size = checked_arithmetic!(sip_base + sip_size)?;

    layout.binding_table_entry_size = platform.sizes.binding_table_entry;
    let surfaces_per_bt = settings.surfaces_per_bt;
    let entry_size = layout.binding_table_entry_size;
    let bt_bytes = checked_arithmetic!(surfaces_per_bt * entry_size)?;
    layout.binding_table_size = checked_align_ceil(bt_bytes, settings.bt_alignment)?;
    layout.binding_table_count = settings.binding_tables;
    let bt_count = layout.binding_table_count;
    let bt_size = layout.binding_table_size;
    layout.surface_state_offset = checked_arithmetic!(bt_count * bt_size)?;
    layout.surface_state_size = platform.sizes.surface_state;
    layout.surface_state_count = settings.surface_states;
    let ss_count = layout.surface_state_count;
    let ss_size = layout.surface_state_size;
    let ss_bytes = checked_arithmetic!(ss_count * ss_size)?;
    let ss_offset = layout.surface_state_offset;
    layout.ssh_instance_size = checked_arithmetic!(ss_offset + ss_bytes)?;
    layout.indirect_heap_size = checked_align_ceil(layout.ssh_instance_size, MHW_PAGE_SIZE)?;

    Ok(layout)
}

#[cfg(test)]
mod tests {
    use crate::*;
    use mhw::GpuGeneration;
    use mhw::PlatformDescriptor;

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

    fn assert_disjoint(layout: &ArenaLayout) {
        let regions = layout.gsh_regions();
        for (i, (name_a, a)) in regions.iter().enumerate() {
            assert!(a.end <= layout.gsh_size, "{} exceeds heap", name_a);
            for (name_b, b) in regions.iter().skip(i + 1) {
                assert!(
                    a.end <= b.start,
                    "{} {:?} overlaps or follows {} {:?}",
                    name_a,
                    a,
                    name_b,
                    b
                );
            }
        }
    }

    #[test]
    fn test_scenario_layout() {
        for generation in [GpuGeneration::Gen8, GpuGeneration::Gen9, GpuGeneration::Gen12] {
            let platform = PlatformDescriptor::for_generation(generation);
            let layout = plan_layout(&scenario_settings(), &platform).unwrap();
            let ms = &layout.media_state;

            assert_eq!(layout.media_state_count, 2);
            assert!(ms.size >= 1024 + layout.media_ids * (ms.sampler_size + ms.media_id_size));
            let trailing = if generation.is_gen9_or_later() { 2048 } else { 1024 };
            assert_eq!(ms.size % trailing, 0);
            assert_eq!(layout.media_state_base % 128, 0);
            assert_eq!(
                layout.media_state_offset(1),
                layout.media_state_offset(0) + ms.size
            );
            assert_disjoint(&layout);
        }
    }

    #[test]
    fn test_alignment_invariants() {
        let platform = PlatformDescriptor::for_generation(GpuGeneration::Gen9);
        let mut settings = scenario_settings();
        settings.per_thread_scratch_size = 2048;
        let layout = plan_layout(&settings, &platform).unwrap();
        let ms = &layout.media_state;

        assert_eq!(ms.sampler_size % 64, 0);
        assert_eq!(ms.sampler_stride % 64, 0);
        assert_eq!(ms.sampler_va_size % 32, 0);
        assert_eq!((ms.sampler_avs_offset - ms.curbe_size) % 2048, 0);
        assert_eq!(ms.sampler_avs_size % 1024, 0);
        assert_eq!(layout.scratch_space_base % 1024, 0);
        assert_eq!(
            layout.scratch_space_size,
            platform.scratch_space_entries() * 2048
        );
        assert_eq!(layout.kernel_heap_size % 64, 0);
        assert_eq!(layout.sip_base, 65536);
        assert_eq!(layout.ish_size, 65536 + RENDERHAL_MAX_SIP_SIZE);
        assert_disjoint(&layout);
    }

    #[test]
    fn test_surface_state_heap_size() {
        let platform = PlatformDescriptor::for_generation(GpuGeneration::Gen9);
        let layout = plan_layout(&scenario_settings(), &platform).unwrap();
        assert_eq!(layout.binding_table_size, 64);
        assert_eq!(layout.surface_state_offset, 8 * 64);
        assert_eq!(layout.ssh_instance_size, 8 * 64 + 40 * 64);
        assert_eq!(layout.indirect_heap_size % 4096, 0);
    }

    #[test]
    fn test_invalid_capacity_rejected_before_layout() {
        let platform = PlatformDescriptor::for_generation(GpuGeneration::Gen9);
        let mut settings = scenario_settings();
        settings.surfaces_per_bt = 2;
        assert!(matches!(
            plan_layout(&settings, &platform),
            Err(RenderHalError::InvalidConfig(_))
        ));

        for settings in [
            StateHeapSettings {
                samplers: 0x1000_0000,
                ..Default::default()
            },
            StateHeapSettings {
                samplers_va: 0x1000_0000,
                ..Default::default()
            },
            StateHeapSettings {
                sip_size: u32::MAX,
                ..Default::default()
            },
        ] {
            for generation in [GpuGeneration::Gen8, GpuGeneration::Gen12] {
                let platform = PlatformDescriptor::for_generation(generation);
                assert!(matches!(
                    plan_layout(&settings, &platform),
                    Err(RenderHalError::InvalidConfig(_))
                ));
            }
        }
    }

    #[test]
    fn test_largest_valid_settings_fit() {
        let settings = StateHeapSettings {
            media_states: 64,
            media_ids: RENDERHAL_MEDIA_IDS_MAX,
            curbe_size: RENDERHAL_CURBE_SIZE_MAX,
            samplers: RENDERHAL_SAMPLERS_MAX,
            samplers_va: RENDERHAL_SAMPLERS_VA_MAX,
            binding_tables: RENDERHAL_SSH_BINDING_TABLES_MAX,
            surface_states: RENDERHAL_SSH_SURFACE_STATES_MAX,
            surfaces_per_bt: RENDERHAL_SSH_SURFACES_PER_BT_MAX,
            per_thread_scratch_size: 65536,
            ..Default::default()
        };
        for generation in [GpuGeneration::Gen8, GpuGeneration::Gen9, GpuGeneration::Gen12] {
            let platform = PlatformDescriptor::for_generation(generation);
            let layout = plan_layout(&settings, &platform).unwrap();
            assert_disjoint(&layout);
            assert_eq!(layout.ish_size, RENDERHAL_KERNEL_HEAP + RENDERHAL_MAX_SIP_SIZE);
        }
    }
}
