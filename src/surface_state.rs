// Copyright 2025 Google
// SPDX-License-Identifier: BSD-3-Clause

//! surface_state: Per-frame surface-state entries and binding tables inside the surface state
//! heap.

use log::debug;
use log::error;
use mhw::*;
use serde::Serialize;

use crate::layout::ArenaLayout;
use crate::planes::PlaneDefinition;
use crate::planes::PlaneId;
use crate::renderhal_utils::*;
use crate::settings::StateHeapSettings;
use crate::surface::*;

/// One plane of a bound surface, as it will be programmed into the surface state heap.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SurfaceStateEntry {
    pub id: usize,
    pub surface_type: SurfaceStateType,
    /// Offset of the hardware surface state inside the SSH instance.
    pub surface_state_offset: u32,
    /// Copy of the surface the entry was built from.
    pub surface: Option<Box<MosSurface>>,
    pub format: u32,
    pub width: u32,
    pub height: u32,
    pub pitch: u32,
    pub qpitch: u32,
    pub plane: PlaneId,
    pub avs: bool,
    pub render_target: bool,
    pub width_in_dword: bool,
    pub vert_stride: bool,
    pub vert_stride_offset: bool,
    pub tiled: bool,
    pub tile_walk_y: bool,
    pub half_pitch_chroma: bool,
    pub interleave_chroma: bool,
    pub direction_u: u8,
    pub direction_v: u8,
    pub u_x_offset: u16,
    pub u_y_offset: u16,
    pub v_x_offset: u16,
    pub v_y_offset: u16,
    pub address_control: u32,
}

impl SurfaceStateEntry {
    fn reset(&mut self, id: usize, surface_type: SurfaceStateType, surface_state_offset: u32) {
        *self = SurfaceStateEntry {
            id,
            surface_type,
            surface_state_offset,
            surface: Some(Box::default()),
            ..Default::default()
        };
    }

    pub fn hw_params(&self) -> MhwSurfaceStateParams {
        let mut flags = 0;
        for (set, flag) in [
            (self.half_pitch_chroma, MHW_SURFACE_FLAG_HALF_PITCH_CHROMA),
            (self.interleave_chroma, MHW_SURFACE_FLAG_INTERLEAVE_CHROMA),
            (self.render_target, MHW_SURFACE_FLAG_RENDER_TARGET),
            (self.vert_stride, MHW_SURFACE_FLAG_VERTICAL_STRIDE),
            (self.vert_stride_offset, MHW_SURFACE_FLAG_VERTICAL_STRIDE_OFFSET),
            (self.tiled, MHW_SURFACE_FLAG_TILED),
            (self.avs, MHW_SURFACE_FLAG_AVS),
            (self.width_in_dword, MHW_SURFACE_FLAG_WIDTH_IN_DWORD),
            (self.tile_walk_y, MHW_SURFACE_FLAG_TILE_WALK_Y),
        ] {
            if set {
                flags |= flag;
            }
        }

        MhwSurfaceStateParams {
            format: self.format,
            width: self.width,
            height: self.height,
            pitch: self.pitch,
            flags,
            plane: self.plane.hw_index(),
            direction_u: self.direction_u as u32,
            direction_v: self.direction_v as u32,
            u_offset_x: self.u_x_offset as u32,
            u_offset_y: self.u_y_offset as u32,
            v_offset_x: self.v_x_offset as u32,
            v_offset_y: self.v_y_offset as u32,
            address: self.surface.as_ref().map_or(0, |s| s.gpu_address),
            address_control: self.address_control,
            ..Default::default()
        }
    }
}

pub struct SurfaceStatePool {
    entries: Vec<SurfaceStateEntry>,
    current_surface_state: usize,
    current_binding_table: usize,
    binding_tables: usize,
    binding_table_size: u32,
    binding_table_entry_size: u32,
    surfaces_per_bt: u32,
    bt_alignment: u32,
    surface_state_offset: u32,
    surface_state_size: u32,
    ssh_instance: usize,
    ssh_instance_size: u32,
}

impl SurfaceStatePool {
    pub fn new(layout: &ArenaLayout, settings: &StateHeapSettings) -> SurfaceStatePool {
        SurfaceStatePool {
            entries: vec![SurfaceStateEntry::default(); layout.surface_state_count as usize],
            current_surface_state: 0,
            current_binding_table: 0,
            binding_tables: layout.binding_table_count as usize,
            binding_table_size: layout.binding_table_size,
            binding_table_entry_size: layout.binding_table_entry_size,
            surfaces_per_bt: settings.surfaces_per_bt,
            bt_alignment: settings.bt_alignment,
            surface_state_offset: layout.surface_state_offset,
            surface_state_size: layout.surface_state_size,
            ssh_instance: 0,
            ssh_instance_size: layout.ssh_instance_size,
        }
    }

    pub fn current_surface_state(&self) -> usize {
        self.current_surface_state
    }

    pub fn current_binding_table(&self) -> usize {
        self.current_binding_table
    }

    pub fn binding_tables(&self) -> usize {
        self.binding_tables
    }

    pub fn binding_table_size(&self) -> u32 {
        self.binding_table_size
    }

    pub fn surfaces_per_bt(&self) -> u32 {
        self.surfaces_per_bt
    }

    pub fn entry(&self, index: usize) -> RenderHalResult<&SurfaceStateEntry> {
        self.entries
            .get(index)
            .ok_or(RenderHalError::InvalidParameter("surface state entry out of range"))
    }

    fn instance_base(&self) -> usize {
        self.ssh_instance * self.ssh_instance_size as usize
    }

    /// Byte offset of binding table `index` inside the surface state heap.
    pub fn binding_table_offset(&self, index: usize) -> u32 {
        self.instance_base() as u32 + index as u32 * self.binding_table_size
    }

    /// Starts a new frame: binding tables and surface states are handed out from zero again.
    pub fn assign_ssh_instance(&mut self) {
        self.current_binding_table = 0;
        self.current_surface_state = 0;
    }

    /// Claims the next binding table and clears it in `ssh`.
    pub fn assign_binding_table(&mut self, ssh: &mut [u8]) -> RenderHalResult<usize> {
        if self.current_binding_table >= self.binding_tables {
            error!(
                "binding tables exhausted ({} configured)",
                self.binding_tables
            );
            return Err(RenderHalError::BindingTableExhausted);
        }

        let index = self.current_binding_table;
        let start = self.binding_table_offset(index) as usize;
        let end = start + self.binding_table_size as usize;
        let limit = ssh.len();
        let table = ssh.get_mut(start..end).ok_or(MhwError::OutOfBounds {
            offset: start,
            size: end - start,
            limit,
        })?;
        table.fill(0);

        self.current_binding_table += 1;
        Ok(index)
    }

    /// Claims the next surface-state entry and resets it to defaults.
    pub fn assign_surface_state(
        &mut self,
        surface_type: SurfaceStateType,
    ) -> RenderHalResult<usize> {
        let index = self.current_surface_state;
        if index >= self.entries.len() {
            error!(
                "surface states exhausted ({} configured)",
                self.entries.len()
            );
            return Err(RenderHalError::SurfaceStateExhausted);
        }

        let offset = self.surface_state_offset + index as u32 * self.surface_state_size;
        self.entries[index].reset(index, surface_type, offset);
        self.current_surface_state += 1;
        Ok(index)
    }

    /// Expands `surface` into one entry per hardware plane and returns the entry indices.
    ///
    /// Either every plane gets an entry or the pool is left untouched.
    pub fn get_surface_state_entries(
        &mut self,
        policy: &FormatPolicy,
        surface: &mut RenderHalSurface,
        params: &mut SurfaceStateParams,
    ) -> RenderHalResult<Vec<usize>> {
        let selection = select_planes(policy, surface, params)?;
        let definition = selection.definition;
        let layouts = definition.planes();
        if self.current_surface_state + layouts.len() > self.entries.len() {
            error!(
                "{:?} needs {} surface states, {} left",
                definition,
                layouts.len(),
                self.entries.len() - self.current_surface_state
            );
            return Err(RenderHalError::SurfaceStateExhausted);
        }

        debug!(
            "{:?} surface {}x{} uses {:?}",
            surface.os_surface.format,
            surface.os_surface.width,
            surface.os_surface.height,
            definition
        );

        let os = &surface.os_surface;
        let mut indices = Vec::with_capacity(layouts.len());
        for plane in layouts {
            let index = self.assign_surface_state(params.surface_type)?;
            let (mut width, mut height) = adjust_boundary(surface, params.boundary);

            // Rounded up so odd heights keep their last chroma row.
            height = height.div_ceil(plane.scale_height);
            width /= plane.scale_width;

            let width_in_dword = if plane.plane_id.is_chroma() {
                params.width_in_dword_uv
            } else {
                params.width_in_dword_y
            };
            if width_in_dword {
                if definition == PlaneDefinition::R32G32B32A32F {
                    width <<= 2;
                } else if definition.is_wide_pixel() {
                    width <<= 1;
                } else if plane.pixels_per_dword > 0 {
                    width = width.div_ceil(plane.pixels_per_dword);
                }
            }

            if params.vert_stride {
                height = (height / 2).max(1);
            }
            height = align_floor(height, plane.align_height);
            width = align_floor(width, plane.align_width);

            let entry = &mut self.entries[index];
            entry.surface = Some(Box::new(os.clone()));
            entry.format = plane.format;
            entry.width = width.max(1);
            entry.height = height.max(1);
            entry.width_in_dword = width_in_dword;
            entry.pitch = if plane.plane_id.is_chroma() {
                selection.uv_pitch
            } else {
                os.pitch
            };
            entry.qpitch = os.qpitch;
            entry.plane = plane.plane_id;
            entry.avs = plane.advanced;
            entry.render_target = params.render_target;
            entry.vert_stride = params.vert_stride;
            entry.vert_stride_offset = params.vert_stride_offset;
            entry.tiled = os.tile_type != TileType::Linear;
            entry.tile_walk_y = os.tile_type == TileType::Y;
            entry.half_pitch_chroma = selection.half_pitch_chroma;
            entry.interleave_chroma = selection.interleave_chroma;
            entry.direction_v = selection.direction & 0x7;
            entry.direction_u = selection.direction >> 3;
            entry.u_x_offset = selection.u_x_offset;
            entry.u_y_offset = selection.u_y_offset;
            entry.v_x_offset = selection.v_x_offset;
            entry.v_y_offset = selection.v_y_offset;
            entry.address_control = params.address_control;
            indices.push(index);
        }

        Ok(indices)
    }

    /// Writes the hardware surface state of entry `index` into `ssh`.
    pub fn setup_surface_state(
        &self,
        render: &MhwRenderInterface,
        ssh: &mut [u8],
        index: usize,
    ) -> RenderHalResult<()> {
        let entry = self.entry(index)?;
        let offset = self.instance_base() + entry.surface_state_offset as usize;
        render.setup_surface_state(ssh, offset, &entry.hw_params())?;
        Ok(())
    }

    /// Points slot `bt_entry` of binding table `bt_index` at surface-state entry `index`.
    pub fn bind_surface_state(
        &self,
        render: &MhwRenderInterface,
        ssh: &mut [u8],
        bt_index: usize,
        bt_entry: usize,
        index: usize,
    ) -> RenderHalResult<()> {
        if bt_index >= self.binding_tables {
            return Err(RenderHalError::InvalidParameter("binding table out of range"));
        }
        if bt_entry >= self.surfaces_per_bt as usize {
            return Err(RenderHalError::InvalidParameter("binding table entry out of range"));
        }

        let entry = self.entry(index)?;
        let offset = self.binding_table_offset(bt_index) as usize
            + bt_entry * self.binding_table_entry_size as usize;
        render.set_binding_table_entry(
            ssh,
            offset,
            entry.surface_state_offset,
            entry.surface_type.is_advanced(),
        )?;
        Ok(())
    }

    /// Resizes binding tables to hold at least `surfaces` entries while keeping the bytes
    /// reserved for binding tables unchanged. Returns the rounded surfaces-per-table count.
    ///
    /// Fails without changing anything when not even one table of the new size fits.
    pub fn set_surfaces_per_bt(&mut self, surfaces: u32) -> RenderHalResult<u32> {
        if surfaces > RENDERHAL_SSH_SURFACES_PER_BT_MAX {
            error!("{} surfaces per binding table is above the limit", surfaces);
            return Err(RenderHalError::InvalidConfig(format!(
                "surfaces_per_bt = {} above {}",
                surfaces, RENDERHAL_SSH_SURFACES_PER_BT_MAX
            )));
        }

        let entry_size = self.binding_table_entry_size;
        let rounded = round_surfaces_per_bt(surfaces, self.bt_alignment, entry_size);
        let binding_table_size = align_ceil(rounded * entry_size, self.bt_alignment);
        let binding_tables = (self.surface_state_offset / binding_table_size) as usize;
        if binding_tables == 0 {
            error!(
                "binding tables of {} bytes do not fit in {} reserved bytes",
                binding_table_size, self.surface_state_offset
            );
            return Err(RenderHalError::InvalidConfig(format!(
                "no binding table of {} surfaces fits",
                rounded
            )));
        }

        self.binding_table_size = binding_table_size;
        self.binding_tables = binding_tables;
        self.surfaces_per_bt = rounded;
        self.current_binding_table = self.current_binding_table.min(self.binding_tables);
        debug!(
            "{} binding tables of {} surfaces",
            self.binding_tables, self.surfaces_per_bt
        );
        Ok(rounded)
    }
}

/// Smallest power-of-two multiple of one aligned block of entries that holds `surfaces`.
pub fn round_surfaces_per_bt(surfaces: u32, bt_alignment: u32, entry_size: u32) -> u32 {
    let mut rounded = (bt_alignment / entry_size.max(1)).max(1);
    while rounded < surfaces {
        rounded <<= 1;
    }
    rounded
}

#[cfg(test)]
mod tests {
    use crate::*;
    use mhw::*;

    fn pool(settings: &StateHeapSettings) -> (SurfaceStatePool, Vec<u8>, MhwRenderInterface) {
        let platform = PlatformDescriptor::for_generation(GpuGeneration::Gen9);
        let layout = plan_layout(settings, &platform).unwrap();
        let ssh = vec![0u8; layout.ssh_instance_size as usize];
        (
            SurfaceStatePool::new(&layout, settings),
            ssh,
            MhwRenderInterface::new(platform),
        )
    }

    fn small_settings() -> StateHeapSettings {
        StateHeapSettings {
            binding_tables: 2,
            surface_states: 16,
            surfaces_per_bt: 16,
            ..Default::default()
        }
    }

    fn policy() -> FormatPolicy {
        FormatPolicy {
            gen10_or_later: false,
            nv12_height_workaround: false,
            p010_single_pass: false,
            yv12_single_pass: false,
            max_palettes: RENDERHAL_PALETTE_COUNT,
        }
    }

    fn nv12(width: u32, height: u32) -> RenderHalSurface {
        RenderHalSurface::new(MosSurface {
            format: MosFormat::Nv12,
            width,
            height,
            pitch: 128,
            tile_type: TileType::Y,
            gpu_address: 0x10000,
            ..Default::default()
        })
    }

    #[test]
    fn test_binding_tables_exhaust_and_reset() {
        let (mut pool, mut ssh, _) = pool(&small_settings());
        ssh.fill(0xaa);
        assert_eq!(pool.assign_binding_table(&mut ssh).unwrap(), 0);
        assert!(ssh[..64].iter().all(|b| *b == 0));
        assert_eq!(ssh[64], 0xaa);
        assert_eq!(pool.assign_binding_table(&mut ssh).unwrap(), 1);
        assert!(matches!(
            pool.assign_binding_table(&mut ssh),
            Err(RenderHalError::BindingTableExhausted)
        ));

        pool.assign_ssh_instance();
        assert_eq!(pool.assign_binding_table(&mut ssh).unwrap(), 0);
    }

    #[test]
    fn test_surface_states_exhaust() {
        let (mut pool, _, _) = pool(&small_settings());
        for i in 0..16 {
            assert_eq!(pool.assign_surface_state(SurfaceStateType::G9).unwrap(), i);
        }
        assert!(matches!(
            pool.assign_surface_state(SurfaceStateType::G9),
            Err(RenderHalError::SurfaceStateExhausted)
        ));
        let entry = pool.entry(3).unwrap();
        assert_eq!(entry.surface_state_offset, 2 * 64 + 3 * 64);
        assert!(entry.surface.is_some());
    }

    #[test]
    fn test_nv12_entries() {
        let (mut pool, _, _) = pool(&small_settings());
        let mut surface = nv12(64, 32);
        let mut params = SurfaceStateParams {
            surface_type: SurfaceStateType::G9,
            two_plane_nv12_needed_by_kernel: true,
            ..Default::default()
        };
        let indices = pool
            .get_surface_state_entries(&policy(), &mut surface, &mut params)
            .unwrap();
        assert_eq!(indices, vec![0, 1]);

        let y = pool.entry(0).unwrap();
        assert_eq!((y.plane, y.width, y.height, y.pitch), (PlaneId::Y, 64, 32, 128));
        assert_eq!(y.format, MHW_GFX3DSTATE_SURFACEFORMAT_R8_UNORM);
        assert!(y.tiled && y.tile_walk_y);
        let uv = pool.entry(1).unwrap();
        assert_eq!((uv.plane, uv.width, uv.height), (PlaneId::U, 32, 16));
        assert_eq!(uv.surface.as_ref().unwrap().gpu_address, 0x10000);
    }

    #[test]
    fn test_plane_count_is_deterministic() {
        let (mut pool, _, _) = pool(&small_settings());
        let run = |pool: &mut SurfaceStatePool| {
            pool.assign_ssh_instance();
            let mut surface = nv12(67, 33);
            let mut params = SurfaceStateParams {
                surface_type: SurfaceStateType::G9,
                boundary: Boundary::SrcRect,
                width_in_dword_y: true,
                ..Default::default()
            };
            let indices = pool
                .get_surface_state_entries(&policy(), &mut surface, &mut params)
                .unwrap();
            indices
                .iter()
                .map(|i| pool.entry(*i).unwrap().clone())
                .collect::<Vec<_>>()
        };

        let first = run(&mut pool);
        let second = run(&mut pool);
        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
        // 67 pixels packed four to a dword.
        assert_eq!(first[0].width, 17);
    }

    #[test]
    fn test_entries_all_or_nothing() {
        let (mut pool, _, _) = pool(&small_settings());
        for _ in 0..15 {
            pool.assign_surface_state(SurfaceStateType::G9).unwrap();
        }
        let mut surface = nv12(64, 32);
        surface.usage = SurfaceUsage::OutRenderTarget;
        let mut params = SurfaceStateParams {
            surface_type: SurfaceStateType::G9,
            ..Default::default()
        };
        assert!(matches!(
            pool.get_surface_state_entries(&policy(), &mut surface, &mut params),
            Err(RenderHalError::SurfaceStateExhausted)
        ));
        assert_eq!(pool.current_surface_state(), 15);
    }

    #[test]
    fn test_bind_surface_state() {
        let (mut pool, mut ssh, render) = pool(&small_settings());
        let bt = pool.assign_binding_table(&mut ssh).unwrap();
        let bt = pool.assign_binding_table(&mut ssh).unwrap().max(bt);
        let index = pool.assign_surface_state(SurfaceStateType::AdvG9).unwrap();
        pool.bind_surface_state(&render, &mut ssh, bt, 3, index).unwrap();

        let entry: MhwBindingTableEntry = read_record(&ssh, 64 + 3 * 4).unwrap();
        assert_eq!(entry.offset(), pool.entry(index).unwrap().surface_state_offset);
        assert!(entry.is_avs());

        assert!(pool.bind_surface_state(&render, &mut ssh, 2, 0, index).is_err());
        assert!(pool.bind_surface_state(&render, &mut ssh, 0, 16, index).is_err());
    }

    #[test]
    fn test_setup_surface_state_record() {
        let (mut pool, mut ssh, render) = pool(&small_settings());
        let mut surface = nv12(64, 32);
        let mut params = SurfaceStateParams {
            surface_type: SurfaceStateType::G9,
            render_target: true,
            ..Default::default()
        };
        surface.usage = SurfaceUsage::OutRenderTarget;
        let indices = pool
            .get_surface_state_entries(&policy(), &mut surface, &mut params)
            .unwrap();
        pool.setup_surface_state(&render, &mut ssh, indices[1]).unwrap();

        let offset = pool.entry(indices[1]).unwrap().surface_state_offset as usize;
        let state: MhwSurfaceState = read_record(&ssh, offset).unwrap();
        assert_eq!(state.width, 31);
        assert_eq!(state.height, 15);
        assert_eq!(state.plane, PlaneId::U.hw_index());
        assert_ne!(state.flags & MHW_SURFACE_FLAG_RENDER_TARGET, 0);
    }

    #[test]
    fn test_set_surfaces_per_bt_preserves_capacity() {
        let settings = StateHeapSettings {
            binding_tables: 8,
            surfaces_per_bt: 16,
            ..Default::default()
        };
        let (mut pool, _, _) = pool(&settings);
        let reserved = pool.binding_tables() as u32 * pool.binding_table_size();

        assert_eq!(pool.set_surfaces_per_bt(20).unwrap(), 32);
        assert_eq!(pool.binding_table_size(), 128);
        assert_eq!(pool.binding_tables(), 4);
        assert_eq!(pool.binding_tables() as u32 * pool.binding_table_size(), reserved);

        assert_eq!(pool.set_surfaces_per_bt(4).unwrap(), 16);
        assert_eq!(pool.binding_tables(), 8);
    }

    #[test]
    fn test_set_surfaces_per_bt_rejects_oversized_tables() {
        let settings = StateHeapSettings {
            binding_tables: 1,
            surfaces_per_bt: 16,
            ..Default::default()
        };
        let (mut pool, _, _) = pool(&settings);
        assert_eq!(pool.binding_tables(), 1);

        assert!(matches!(
            pool.set_surfaces_per_bt(17),
            Err(RenderHalError::InvalidConfig(_))
        ));
        assert!(matches!(
            pool.set_surfaces_per_bt(u32::MAX),
            Err(RenderHalError::InvalidConfig(_))
        ));
        assert_eq!(pool.binding_tables(), 1);
        assert_eq!(pool.binding_table_size(), 64);
    }
}
