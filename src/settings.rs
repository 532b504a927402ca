// Copyright 2025 Google
// SPDX-License-Identifier: BSD-3-Clause

//! settings: State heap capacities and session switches, loadable from JSON.

use log::error;
use serde::Deserialize;
use serde::Serialize;

use crate::renderhal_utils::*;
use crate::sequencer::encode_scratch_size;
use mhw::MHW_SCRATCH_SPACE_ALIGN;
use mhw::MHW_TIMEOUT_MS_DEFAULT;

/// Capacities of the general, instruction and surface state heaps.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateHeapSettings {
    pub sync_size: u32,
    pub media_states: u32,
    pub media_ids: u32,
    pub curbe_size: u32,
    pub samplers: u32,
    pub samplers_avs: u32,
    pub samplers_va: u32,
    pub kernel_count: u32,
    pub kernel_heap_size: u32,
    pub kernel_block_size: u32,
    pub binding_tables: u32,
    pub surface_states: u32,
    pub surfaces_per_bt: u32,
    pub bt_alignment: u32,
    pub per_thread_scratch_size: u32,
    pub sip_size: u32,
}

impl Default for StateHeapSettings {
    fn default() -> StateHeapSettings {
        StateHeapSettings {
            sync_size: RENDERHAL_SYNC_SIZE,
            media_states: RENDERHAL_MEDIA_STATES,
            media_ids: RENDERHAL_MEDIA_IDS,
            curbe_size: RENDERHAL_CURBE_SIZE,
            samplers: RENDERHAL_SAMPLERS,
            samplers_avs: RENDERHAL_SAMPLERS_AVS_MAX,
            samplers_va: RENDERHAL_SAMPLERS_VA,
            kernel_count: RENDERHAL_KERNEL_COUNT,
            kernel_heap_size: RENDERHAL_KERNEL_HEAP,
            kernel_block_size: RENDERHAL_KERNEL_BLOCK_SIZE,
            binding_tables: RENDERHAL_SSH_BINDING_TABLES,
            surface_states: RENDERHAL_SSH_SURFACE_STATES,
            surfaces_per_bt: RENDERHAL_SSH_SURFACES_PER_BT,
            bt_alignment: RENDERHAL_SSH_BINDING_TABLE_ALIGN,
            per_thread_scratch_size: 0,
            sip_size: RENDERHAL_MAX_SIP_SIZE,
        }
    }
}

fn check(condition: bool, message: String) -> RenderHalResult<()> {
    if condition {
        return Ok(());
    }

    error!("rejecting state heap settings: {}", message);
    Err(RenderHalError::InvalidConfig(message))
}

fn check_range(name: &str, value: u32, min: u32, max: u32) -> RenderHalResult<()> {
    check(
        (min..=max).contains(&value),
        format!("{} = {} outside {}..={}", name, value, min, max),
    )
}

fn check_multiple(name: &str, value: u32, align: u32) -> RenderHalResult<()> {
    check(
        value % align == 0,
        format!("{} = {} is not a multiple of {}", name, value, align),
    )
}

impl StateHeapSettings {
    pub fn from_json(json: &str) -> RenderHalResult<StateHeapSettings> {
        Ok(serde_json::from_str(json)?)
    }

    /// Checks every capacity against its documented bounds. Nothing is clamped here.
    pub fn validate(&self) -> RenderHalResult<()> {
        check_range(
            "sync_size",
            self.sync_size,
            RENDERHAL_SYNC_SIZE_MIN,
            RENDERHAL_SYNC_SIZE_MAX,
        )?;
        check_multiple("sync_size", self.sync_size, RENDERHAL_SYNC_BLOCK_ALIGN)?;
        check(self.media_states >= 1, "media_states must be at least 1".into())?;
        check_range("media_ids", self.media_ids, 1, RENDERHAL_MEDIA_IDS_MAX)?;
        check_range("curbe_size", self.curbe_size, 0, RENDERHAL_CURBE_SIZE_MAX)?;
        check_multiple("curbe_size", self.curbe_size, RENDERHAL_CURBE_BLOCK_ALIGN)?;
        check(
            self.kernel_count >= RENDERHAL_KERNEL_COUNT_MIN,
            format!("kernel_count = {} below {}", self.kernel_count, RENDERHAL_KERNEL_COUNT_MIN),
        )?;
        check_range(
            "kernel_heap_size",
            self.kernel_heap_size,
            RENDERHAL_KERNEL_HEAP_MIN,
            RENDERHAL_KERNEL_HEAP_MAX,
        )?;
        check_multiple(
            "kernel_heap_size",
            self.kernel_heap_size,
            RENDERHAL_KERNEL_BLOCK_ALIGN,
        )?;
        check_range(
            "kernel_block_size",
            self.kernel_block_size,
            RENDERHAL_KERNEL_BLOCK_MIN,
            RENDERHAL_KERNEL_BLOCK_MAX,
        )?;
        check_multiple(
            "kernel_block_size",
            self.kernel_block_size,
            RENDERHAL_KERNEL_BLOCK_ALIGN,
        )?;
        check_range(
            "binding_tables",
            self.binding_tables,
            RENDERHAL_SSH_BINDING_TABLES_MIN,
            RENDERHAL_SSH_BINDING_TABLES_MAX,
        )?;
        check_range(
            "surface_states",
            self.surface_states,
            RENDERHAL_SSH_SURFACE_STATES_MIN,
            RENDERHAL_SSH_SURFACE_STATES_MAX,
        )?;
        check_range(
            "surfaces_per_bt",
            self.surfaces_per_bt,
            RENDERHAL_SSH_SURFACES_PER_BT_MIN,
            RENDERHAL_SSH_SURFACES_PER_BT_MAX,
        )?;
        check(
            self.bt_alignment.is_power_of_two(),
            format!("bt_alignment = {} is not a power of two", self.bt_alignment),
        )?;
        check_multiple(
            "per_thread_scratch_size",
            self.per_thread_scratch_size,
            MHW_SCRATCH_SPACE_ALIGN,
        )?;
        if self.per_thread_scratch_size > 0 {
            if let Err(e) = encode_scratch_size(self.per_thread_scratch_size) {
                error!("rejecting state heap settings: {}", e);
                return Err(e);
            }
        }
        check_range("samplers", self.samplers, 0, RENDERHAL_SAMPLERS_MAX)?;
        check_range("samplers_va", self.samplers_va, 0, RENDERHAL_SAMPLERS_VA_MAX)?;
        check_range("samplers_avs", self.samplers_avs, 0, RENDERHAL_SAMPLERS_AVS_MAX)?;
        check_range("sip_size", self.sip_size, 0, RENDERHAL_MAX_SIP_SIZE)?;
        Ok(())
    }
}

/// Session-wide behaviour switches.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderHalSettings {
    pub state_heap: StateHeapSettings,
    /// Milliseconds to wait for a busy media state before giving up.
    pub timeout_ms: u32,
    pub enable_kernel_time_dump: bool,
    pub enable_p010_single_pass: bool,
    pub enable_yv12_single_pass: bool,
    pub enable_sip: bool,
}

impl Default for RenderHalSettings {
    fn default() -> RenderHalSettings {
        RenderHalSettings {
            state_heap: StateHeapSettings::default(),
            timeout_ms: MHW_TIMEOUT_MS_DEFAULT,
            enable_kernel_time_dump: false,
            enable_p010_single_pass: true,
            enable_yv12_single_pass: true,
            enable_sip: false,
        }
    }
}

impl RenderHalSettings {
    pub fn from_json(json: &str) -> RenderHalResult<RenderHalSettings> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use crate::*;

    #[test]
    fn test_default_settings_are_valid() {
        StateHeapSettings::default().validate().unwrap();
    }

    #[test]
    fn test_validate_rejects() {
        let cases: [(&str, fn(&mut StateHeapSettings)); 18] = [
            ("sync_size below min", |s| s.sync_size = 0),
            ("sync_size unaligned", |s| s.sync_size = 200),
            ("no media states", |s| s.media_states = 0),
            ("too many media ids", |s| s.media_ids = RENDERHAL_MEDIA_IDS_MAX + 1),
            ("curbe_size unaligned", |s| s.curbe_size = 100),
            ("curbe_size too large", |s| s.curbe_size = RENDERHAL_CURBE_SIZE_MAX + 64),
            ("kernel_count too small", |s| s.kernel_count = 1),
            ("kernel_heap_size too large", |s| {
                s.kernel_heap_size = RENDERHAL_KERNEL_HEAP_MAX + 64
            }),
            ("kernel_block_size unaligned", |s| s.kernel_block_size = 4100),
            ("binding_tables too many", |s| s.binding_tables = 17),
            ("surface_states too few", |s| s.surface_states = 8),
            ("surfaces_per_bt too many", |s| s.surfaces_per_bt = 300),
            ("bt_alignment not pow2", |s| s.bt_alignment = 48),
            ("scratch not pow2 KiB", |s| s.per_thread_scratch_size = 3072),
            ("samplers too many", |s| s.samplers = 0x1000_0000),
            ("samplers_va too many", |s| s.samplers_va = RENDERHAL_SAMPLERS_VA_MAX + 1),
            ("samplers_avs too many", |s| s.samplers_avs = RENDERHAL_SAMPLERS_AVS_MAX + 1),
            ("sip_size too large", |s| s.sip_size = u32::MAX),
        ];
        for (name, mutate) in cases {
            let mut settings = StateHeapSettings::default();
            mutate(&mut settings);
            assert!(
                matches!(settings.validate(), Err(RenderHalError::InvalidConfig(_))),
                "{} accepted",
                name
            );
        }
    }

    #[test]
    fn test_scratch_size_accepted() {
        for size in [0, 1024, 2048, 65536] {
            let settings = StateHeapSettings {
                per_thread_scratch_size: size,
                ..Default::default()
            };
            settings.validate().unwrap();
        }
    }

    #[test]
    fn test_from_json_partial() {
        let settings = RenderHalSettings::from_json(
            r#"{ "timeout_ms": 7, "state_heap": { "media_states": 2, "kernel_block_size": 4096 } }"#,
        )
        .unwrap();
        assert_eq!(settings.timeout_ms, 7);
        assert_eq!(settings.state_heap.media_states, 2);
        assert_eq!(settings.state_heap.kernel_block_size, 4096);
        assert_eq!(settings.state_heap.curbe_size, RENDERHAL_CURBE_SIZE);

        assert!(matches!(
            StateHeapSettings::from_json("{ \"media_states\": -1 }"),
            Err(RenderHalError::Json(_))
        ));
    }
}
