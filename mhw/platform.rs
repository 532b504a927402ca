// Copyright 2025 Google
// SPDX-License-Identifier: MIT

use crate::mhw_defines::MhwError;
use crate::mhw_defines::MhwResult;

// Device-id tables used to pick the hardware generation.
const BDW_IDS: [u16; 18] = [
    0x1602, 0x1606, 0x160A, 0x160B, 0x160D, 0x160E, 0x1612, 0x1616, 0x161A, 0x161B, 0x161D, 0x161E,
    0x1622, 0x1626, 0x162A, 0x162B, 0x162D, 0x162E,
];

const SKL_KBL_IDS: [u16; 15] = [
    0x1902, 0x1906, 0x190B, 0x1912, 0x1916, 0x191B, 0x191E, 0x1926, 0x1927, 0x193B, 0x5912, 0x5916,
    0x5917, 0x591B, 0x591E,
];

const CNL_IDS: [u16; 12] = [
    0x5A40, 0x5A41, 0x5A42, 0x5A49, 0x5A4A, 0x5A50, 0x5A51, 0x5A52, 0x5A54, 0x5A59, 0x5A5A, 0x5A5C,
];

const ICL_IDS: [u16; 12] = [
    0x8A50, 0x8A51, 0x8A52, 0x8A53, 0x8A56, 0x8A57, 0x8A58, 0x8A59, 0x8A5A, 0x8A5B, 0x8A5C, 0x8A5D,
];

const GEN12_IDS: [u16; 50] = [
    0x4c8a, 0x4c8b, 0x4c8c, 0x4c90, 0x4c9a, 0x4680, 0x4681, 0x4682, 0x4683, 0x4688, 0x4689, 0x4690,
    0x4691, 0x4692, 0x4693, 0x4698, 0x4699, 0x4626, 0x4628, 0x462a, 0x46a0, 0x46a1, 0x46a2, 0x46a3,
    0x46a6, 0x46a8, 0x46aa, 0x46b0, 0x46b1, 0x46b2, 0x46b3, 0x46c0, 0x46c1, 0x46c2, 0x46c3, 0x9A40,
    0x9A49, 0x9A59, 0x9A60, 0x9A68, 0x9A70, 0x9A78, 0x9AC0, 0x9AC9, 0x9AD9, 0x9AF8, 0x4905, 0x4906,
    0x4907, 0x4908,
];

const MTL_IDS: [u16; 5] = [0x7D40, 0x7D60, 0x7D45, 0x7D55, 0x7DD5];

const LNL_IDS: [u16; 3] = [0x6420, 0x64A0, 0x64B0];

const PTL_IDS: [u16; 8] = [
    0xB080, 0xB081, 0xB082, 0xB083, 0xB08F, 0xB090, 0xB0A0, 0xB0B0,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GpuGeneration {
    Gen8,
    Gen9,
    Gen10,
    Gen11,
    Gen12,
    Xe2,
}

impl GpuGeneration {
    pub fn is_gen9_or_later(self) -> bool {
        self >= GpuGeneration::Gen9
    }

    pub fn is_gen10_or_later(self) -> bool {
        self >= GpuGeneration::Gen10
    }
}

/// Determines the hardware generation of an Intel device based on its PCI device id.
pub fn determine_generation(pci_device_id: u16) -> MhwResult<GpuGeneration> {
    if BDW_IDS.contains(&pci_device_id) {
        return Ok(GpuGeneration::Gen8);
    }

    if SKL_KBL_IDS.contains(&pci_device_id) {
        return Ok(GpuGeneration::Gen9);
    }

    if CNL_IDS.contains(&pci_device_id) {
        return Ok(GpuGeneration::Gen10);
    }

    if ICL_IDS.contains(&pci_device_id) {
        return Ok(GpuGeneration::Gen11);
    }

    if GEN12_IDS.contains(&pci_device_id) || MTL_IDS.contains(&pci_device_id) {
        return Ok(GpuGeneration::Gen12);
    }

    if LNL_IDS.contains(&pci_device_id) || PTL_IDS.contains(&pci_device_id) {
        return Ok(GpuGeneration::Xe2);
    }

    Err(MhwError::WithContext("missing intel pci-id"))
}

/// Byte sizes of the hardware state records for one generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderStateSizes {
    pub interface_descriptor: u32,
    pub binding_table_entry: u32,
    pub surface_state: u32,
    pub sampler_state: u32,
    pub sampler_state_avs: u32,
    pub sampler_state_va: u32,
    pub sampler_indirect_state: u32,
    pub sampler_8x8_table: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderEngineCaps {
    pub max_threads: u32,
    pub max_urb_size: u32,
    pub max_interface_descriptor_entries: u32,
    pub max_eu_per_subslice: u32,
    pub threads_per_eu: u32,
    pub max_subslices: u32,
    /// Timestamp counter frequency in Hz.
    pub timestamp_frequency: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlmEncoding {
    /// Size rounded up to 4 KiB units.
    Linear4K,
    /// 0, 1K, 2K, 4K ... 64K as 0..=7.
    Log2K,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceStateGeneration {
    G8,
    G9,
    G10,
}

/// Everything the state-heap manager needs to know about one hardware generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlatformDescriptor {
    pub generation: GpuGeneration,
    pub sizes: RenderStateSizes,
    pub caps: RenderEngineCaps,
    pub combined_avs_sampler_state: bool,
    pub compute_context: bool,
    pub uses_cfe_state: bool,
    pub uses_compute_walker: bool,
    pub supports_preemption: bool,
    pub supports_sip: bool,
    pub nv12_height_workaround: bool,
    pub slm_encoding: SlmEncoding,
    pub surface_state_generation: SurfaceStateGeneration,
}

const GEN8_SIZES: RenderStateSizes = RenderStateSizes {
    interface_descriptor: 32,
    binding_table_entry: 4,
    surface_state: 64,
    sampler_state: 16,
    sampler_state_avs: 1024,
    sampler_state_va: 0,
    sampler_indirect_state: 64,
    sampler_8x8_table: 960,
};

const GEN9_SIZES: RenderStateSizes = RenderStateSizes {
    interface_descriptor: 32,
    binding_table_entry: 4,
    surface_state: 64,
    sampler_state: 16,
    sampler_state_avs: 2048,
    sampler_state_va: 32,
    sampler_indirect_state: 64,
    sampler_8x8_table: 1984,
};

impl PlatformDescriptor {
    pub fn for_generation(generation: GpuGeneration) -> PlatformDescriptor {
        match generation {
            GpuGeneration::Gen8 => PlatformDescriptor {
                generation,
                sizes: GEN8_SIZES,
                caps: RenderEngineCaps {
                    max_threads: 336,
                    max_urb_size: 2048,
                    max_interface_descriptor_entries: 64,
                    max_eu_per_subslice: 8,
                    threads_per_eu: 7,
                    max_subslices: 6,
                    timestamp_frequency: 12_500_000,
                },
                combined_avs_sampler_state: false,
                compute_context: false,
                uses_cfe_state: false,
                uses_compute_walker: false,
                supports_preemption: false,
                supports_sip: true,
                nv12_height_workaround: false,
                slm_encoding: SlmEncoding::Linear4K,
                surface_state_generation: SurfaceStateGeneration::G8,
            },
            GpuGeneration::Gen9 => PlatformDescriptor {
                generation,
                sizes: GEN9_SIZES,
                caps: RenderEngineCaps {
                    max_threads: 336,
                    max_urb_size: 2048,
                    max_interface_descriptor_entries: 64,
                    max_eu_per_subslice: 8,
                    threads_per_eu: 7,
                    max_subslices: 6,
                    timestamp_frequency: 12_000_000,
                },
                combined_avs_sampler_state: true,
                compute_context: false,
                uses_cfe_state: false,
                uses_compute_walker: false,
                supports_preemption: true,
                supports_sip: true,
                nv12_height_workaround: false,
                slm_encoding: SlmEncoding::Linear4K,
                surface_state_generation: SurfaceStateGeneration::G9,
            },
            GpuGeneration::Gen10 | GpuGeneration::Gen11 => PlatformDescriptor {
                generation,
                sizes: GEN9_SIZES,
                caps: RenderEngineCaps {
                    max_threads: 448,
                    max_urb_size: 2048,
                    max_interface_descriptor_entries: 64,
                    max_eu_per_subslice: 8,
                    threads_per_eu: 7,
                    max_subslices: 8,
                    timestamp_frequency: 12_000_000,
                },
                combined_avs_sampler_state: true,
                compute_context: false,
                uses_cfe_state: false,
                uses_compute_walker: false,
                supports_preemption: true,
                supports_sip: true,
                nv12_height_workaround: generation == GpuGeneration::Gen11,
                slm_encoding: SlmEncoding::Linear4K,
                surface_state_generation: SurfaceStateGeneration::G10,
            },
            GpuGeneration::Gen12 => PlatformDescriptor {
                generation,
                sizes: GEN9_SIZES,
                caps: RenderEngineCaps {
                    max_threads: 672,
                    max_urb_size: 2048,
                    max_interface_descriptor_entries: 64,
                    max_eu_per_subslice: 16,
                    threads_per_eu: 7,
                    max_subslices: 6,
                    timestamp_frequency: 19_200_000,
                },
                combined_avs_sampler_state: true,
                compute_context: false,
                uses_cfe_state: false,
                uses_compute_walker: false,
                supports_preemption: true,
                supports_sip: true,
                nv12_height_workaround: true,
                slm_encoding: SlmEncoding::Log2K,
                surface_state_generation: SurfaceStateGeneration::G10,
            },
            GpuGeneration::Xe2 => PlatformDescriptor {
                generation,
                sizes: RenderStateSizes {
                    sampler_state_va: 0,
                    ..GEN9_SIZES
                },
                caps: RenderEngineCaps {
                    max_threads: 1024,
                    max_urb_size: 2048,
                    max_interface_descriptor_entries: 64,
                    max_eu_per_subslice: 8,
                    threads_per_eu: 8,
                    max_subslices: 8,
                    timestamp_frequency: 19_200_000,
                },
                combined_avs_sampler_state: true,
                compute_context: true,
                uses_cfe_state: true,
                uses_compute_walker: true,
                supports_preemption: true,
                supports_sip: true,
                nv12_height_workaround: true,
                slm_encoding: SlmEncoding::Log2K,
                surface_state_generation: SurfaceStateGeneration::G10,
            },
        }
    }

    pub fn for_pci_device(pci_device_id: u16) -> MhwResult<PlatformDescriptor> {
        let generation = determine_generation(pci_device_id)?;
        Ok(PlatformDescriptor::for_generation(generation))
    }

    /// Encodes a shared-local-memory size in KiB for the interface descriptor.
    pub fn encode_slm_size(&self, slm_size_kb: u32) -> u32 {
        if slm_size_kb == 0 {
            return 0;
        }

        match self.slm_encoding {
            SlmEncoding::Linear4K => slm_size_kb.div_ceil(4),
            SlmEncoding::Log2K => {
                let rounded = slm_size_kb.next_power_of_two().min(64);
                rounded.trailing_zeros() + 1
            }
        }
    }

    /// Converts timestamp ticks into nanoseconds.
    pub fn ticks_to_ns(&self, ticks: u64) -> u64 {
        let frequency = self.caps.timestamp_frequency.max(1);
        ((ticks as u128 * 1_000_000_000u128) / frequency as u128) as u64
    }

    /// Number of per-thread scratch slots the engine can use at once.
    pub fn scratch_space_entries(&self) -> u32 {
        self.caps.max_eu_per_subslice * self.caps.threads_per_eu * self.caps.max_subslices
    }
}
