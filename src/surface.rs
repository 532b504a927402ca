// Copyright 2025 Google
// SPDX-License-Identifier: BSD-3-Clause

//! surface: Surface descriptions and the plane, offset and boundary math behind their
//! surface states.

use log::debug;
use mhw::*;
use serde::Deserialize;
use serde::Serialize;

use crate::planes::MosFormat;
use crate::planes::PlaneDefinition;
use crate::renderhal_utils::*;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Rect {
        Rect {
            left,
            top,
            right,
            bottom,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileType {
    #[default]
    Linear,
    X,
    Y,
}

/// How the surface is used by the dispatch it is bound to.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfaceUsage {
    #[default]
    Input,
    OutRenderTarget,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalingMode {
    Nearest,
    #[default]
    Bilinear,
    Avs,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleType {
    #[default]
    Progressive,
    InterleavedEvenFirstTopField,
    InterleavedEvenFirstBottomField,
    InterleavedOddFirstTopField,
    InterleavedOddFirstBottomField,
}

/// Rectangle a surface state is clamped to.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Boundary {
    SrcRect,
    DstRect,
    MaxSrcRect,
    #[default]
    Original,
}

/// The memory description of a surface as handed over by the allocator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MosSurface {
    pub format: MosFormat,
    pub width: u32,
    pub height: u32,
    pub pitch: u32,
    pub qpitch: u32,
    pub tile_type: TileType,
    /// Rows between the top of the luma plane and the interleaved chroma plane. 0 means the
    /// chroma plane starts right after `height` rows.
    pub uv_plane_rows: u32,
    pub gpu_address: u64,
}

/// A surface together with the rendering parameters that pick its plane layout.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderHalSurface {
    pub os_surface: MosSurface,
    pub usage: SurfaceUsage,
    pub rc_src: Rect,
    pub rc_dst: Rect,
    pub rc_max_src: Rect,
    pub scaling_mode: ScalingMode,
    pub chroma_siting: u32,
    pub sample_type: SampleType,
    pub deinterlace: bool,
    pub query_variance: bool,
    pub interlaced_scaling: bool,
    pub palette_id: Option<usize>,
}

impl RenderHalSurface {
    pub fn new(os_surface: MosSurface) -> RenderHalSurface {
        let full = Rect::new(0, 0, os_surface.width as i32, os_surface.height as i32);
        RenderHalSurface {
            os_surface,
            rc_src: full,
            rc_dst: full,
            rc_max_src: full,
            ..Default::default()
        }
    }

    fn is_render_target(&self) -> bool {
        self.usage == SurfaceUsage::OutRenderTarget
    }
}

/// Caller-side knobs of a surface-state setup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceStateParams {
    pub surface_type: SurfaceStateType,
    pub boundary: Boundary,
    pub render_target: bool,
    pub width_in_dword_y: bool,
    pub width_in_dword_uv: bool,
    pub vert_stride: bool,
    pub vert_stride_offset: bool,
    pub avs: bool,
    pub vme_use: bool,
    pub force_nv12: bool,
    pub va_surface: bool,
    pub two_plane_nv12_needed_by_kernel: bool,
    pub chroma_siting_enabled: bool,
    pub address_control: u32,
}

/// Session-wide switches and platform traits that steer the plane selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FormatPolicy {
    pub gen10_or_later: bool,
    pub nv12_height_workaround: bool,
    pub p010_single_pass: bool,
    pub yv12_single_pass: bool,
    pub max_palettes: usize,
}

/// Outcome of the format dispatch, shared by every plane of the surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaneSelection {
    pub definition: PlaneDefinition,
    pub uv_pitch: u32,
    pub half_pitch_chroma: bool,
    pub interleave_chroma: bool,
    pub direction: u8,
    pub u_x_offset: u16,
    pub u_y_offset: u16,
    pub v_x_offset: u16,
    pub v_y_offset: u16,
}

/// Width and height granularity a surface is rounded up to.
pub fn get_align_unit(surface: &RenderHalSurface) -> (u32, u32) {
    let (mut width_unit, height_unit) = match surface.os_surface.format {
        // Height is 2 because of AVS scaling of packed 4:2:2.
        MosFormat::Yuy2
        | MosFormat::Uyvy
        | MosFormat::Yvyu
        | MosFormat::Vyuy
        | MosFormat::P208 => (1, 2),
        _ => (1, 1),
    };

    // Deinterlace messages need multiples of 8.
    if surface.deinterlace {
        width_unit = 8;
    }
    (width_unit, height_unit)
}

fn clamp_to(extent: u32, edge: i32) -> u32 {
    extent.min(edge.max(0) as u32)
}

/// Returns the (width, height) the surface covers under `boundary`.
pub fn adjust_boundary(surface: &RenderHalSurface, boundary: Boundary) -> (u32, u32) {
    let (width_unit, height_unit) = get_align_unit(surface);
    let os = &surface.os_surface;
    let rect = match boundary {
        Boundary::SrcRect => Some(surface.rc_src),
        Boundary::DstRect => Some(surface.rc_dst),
        Boundary::MaxSrcRect => Some(surface.rc_max_src),
        Boundary::Original => None,
    };

    match rect {
        Some(rect) => (
            align_ceil(clamp_to(os.width, rect.right), width_unit),
            align_ceil(clamp_to(os.height, rect.bottom), height_unit),
        ),
        None => (
            align_ceil(os.width, width_unit),
            align_ceil(os.height, height_unit),
        ),
    }
}

/// Decides whether an NV12 surface must be programmed as separate Y and UV planes.
pub fn is_2plane_nv12_needed(
    policy: &FormatPolicy,
    surface: &RenderHalSurface,
    boundary: Boundary,
) -> bool {
    let (width_unit, height_unit) = get_align_unit(surface);
    let os = &surface.os_surface;
    let (width, height) = match boundary {
        Boundary::SrcRect => (
            align_ceil(clamp_to(os.width, surface.rc_src.right), width_unit),
            os.height,
        ),
        Boundary::MaxSrcRect => (
            align_ceil(clamp_to(os.width, surface.rc_max_src.right), width_unit),
            os.height,
        ),
        _ => (
            align_ceil(os.width, width_unit),
            align_ceil(os.height, height_unit),
        ),
    };

    let needed = if !policy.gen10_or_later {
        height % 4 != 0 || width % 4 != 0
    } else if surface.scaling_mode == ScalingMode::Avs {
        height % 2 != 0 || width % 2 != 0
    } else {
        height % 4 != 0 || width % 2 != 0
    };

    needed || (policy.nv12_height_workaround && height > RENDERHAL_NV12_HEIGHT_WA_LIMIT)
}

/// Packs the chroma siting of `surface` into the U (bit 3) and V (bits 0..2) directions.
pub fn set_chroma_direction(surface: &RenderHalSurface) -> u8 {
    let siting = surface.chroma_siting;
    let u_direction = if siting & MHW_CHROMA_SITING_HORZ_CENTER != 0 {
        MHW_CHROMA_SITING_UDIRECTION_CENTER
    } else {
        MHW_CHROMA_SITING_UDIRECTION_LEFT
    };

    let top = siting & MHW_CHROMA_SITING_VERT_TOP != 0;
    let bottom = siting & MHW_CHROMA_SITING_VERT_BOTTOM != 0;
    let interlaced = surface.deinterlace || surface.query_variance;
    let v_direction = match surface.sample_type {
        SampleType::InterleavedEvenFirstBottomField | SampleType::InterleavedOddFirstBottomField
            if interlaced =>
        {
            if top {
                MHW_CHROMA_SITING_VDIRECTION_1_2
            } else if bottom {
                MHW_CHROMA_SITING_VDIRECTION_1
            } else {
                MHW_CHROMA_SITING_VDIRECTION_3_4
            }
        }
        SampleType::InterleavedEvenFirstTopField | SampleType::InterleavedOddFirstTopField
            if interlaced =>
        {
            if top {
                MHW_CHROMA_SITING_VDIRECTION_0
            } else if bottom {
                MHW_CHROMA_SITING_VDIRECTION_1_2
            } else {
                MHW_CHROMA_SITING_VDIRECTION_1_4
            }
        }
        _ if interlaced => MHW_CHROMA_SITING_VDIRECTION_0,
        _ => {
            if top {
                MHW_CHROMA_SITING_VDIRECTION_0
            } else if bottom {
                MHW_CHROMA_SITING_VDIRECTION_1
            } else {
                MHW_CHROMA_SITING_VDIRECTION_1_2
            }
        }
    };

    (u_direction << 3) | v_direction
}

/// Offsets of the U and V planes, in pixels from the top-left of the luma plane, used by
/// de-interlace kernels reading planar surfaces as one plane.
///
/// Returns `(u_x, u_y, v_x, v_y)`, all rounded down to even values.
pub fn get_di_uv_offset(surface: &MosSurface) -> (u16, u16, u16, u16) {
    let height = surface.height;
    let pitch = surface.pitch;
    let (mut u_x, mut u_y, mut v_x, mut v_y) = (0, 0, 0, 0);

    match surface.format {
        // YY / V- / U-
        MosFormat::Imc1 => {
            v_y = height;
            u_y = height + (height >> 1);
        }
        // YY / VU
        MosFormat::Imc2 => {
            v_y = height;
            u_y = height;
            u_x = pitch >> 1;
        }
        // YY / U- / V-
        MosFormat::Imc3 | MosFormat::I420 | MosFormat::Iyuv => {
            u_y = height;
            v_y = height + (height >> 1);
        }
        // YY / UV
        MosFormat::Imc4 => {
            u_y = height;
            v_y = height;
            v_x = pitch >> 1;
        }
        MosFormat::Yv12 => {
            u_y = height + (height >> 1);
            v_y = height;
        }
        MosFormat::Yvu9 => {
            u_y = height;
            v_y = height + (height >> 2);
        }
        MosFormat::Nv12
        | MosFormat::Nv21
        | MosFormat::Nv11
        | MosFormat::P208
        | MosFormat::P010
        | MosFormat::P016 => {
            u_y = height;
            v_y = height;
        }
        format => debug!("no de-interlace chroma offsets for {:?}", format),
    }

    let even = |value: u32| align_floor(value, 2).min(u16::MAX as u32) as u16;
    (even(u_x), even(u_y), even(v_x), even(v_y))
}

/// Row offset of the chroma plane of an interleaved surface.
pub fn calculate_y_offset(surface: &MosSurface) -> u16 {
    let rows = if surface.uv_plane_rows != 0 {
        surface.uv_plane_rows
    } else {
        surface.height
    };
    rows.min(u16::MAX as u32) as u16
}

fn fall_back_to_regular(surface: &mut RenderHalSurface, params: &mut SurfaceStateParams) {
    debug!(
        "{:?} is not supported with AVS, using a regular surface state",
        surface.os_surface.format
    );
    params.avs = false;
    surface.scaling_mode = ScalingMode::Bilinear;
    params.surface_type = params.surface_type.regular();
}

// Packed 4:2:2 is exposed as a half-width, double-height surface for motion estimation.
fn apply_vme_packed_workaround(surface: &mut RenderHalSurface) {
    let os = &mut surface.os_surface;
    os.width *= 2;
    os.height /= 2;
    surface.rc_src.right = os.width as i32;
    surface.rc_src.bottom = os.height as i32;
    surface.rc_dst = surface.rc_src;
}

fn select_advanced(
    policy: &FormatPolicy,
    surface: &mut RenderHalSurface,
    params: &mut SurfaceStateParams,
    selection: &mut PlaneSelection,
) -> Option<PlaneDefinition> {
    let format = surface.os_surface.format;
    match format {
        MosFormat::Nv12 => {
            selection.interleave_chroma = true;
            selection.direction = set_chroma_direction(surface);
            if is_2plane_nv12_needed(policy, surface, params.boundary) {
                Some(PlaneDefinition::Nv12TwoPlanesAdv)
            } else {
                selection.u_y_offset = calculate_y_offset(&surface.os_surface);
                Some(PlaneDefinition::Nv12Adv)
            }
        }
        MosFormat::P208 => Some(PlaneDefinition::P208OnePlaneAdv),
        MosFormat::Imc1
        | MosFormat::Imc2
        | MosFormat::Imc3
        | MosFormat::Imc4
        | MosFormat::I420
        | MosFormat::Iyuv
        | MosFormat::Yv12
        | MosFormat::Yvu9 => {
            selection.half_pitch_chroma =
                matches!(format, MosFormat::I420 | MosFormat::Iyuv | MosFormat::Yv12);
            selection.direction = set_chroma_direction(surface);
            if params.avs {
                Some(PlaneDefinition::Pl3Adv)
            } else {
                let (u_x, u_y, v_x, v_y) = get_di_uv_offset(&surface.os_surface);
                selection.u_x_offset = u_x;
                selection.u_y_offset = u_y;
                selection.v_x_offset = v_x;
                selection.v_y_offset = v_y;
                Some(PlaneDefinition::Nv12Adv)
            }
        }
        // U and V fall inside the Y plane; CSC coefficients cancel them out.
        MosFormat::Planar400 => Some(PlaneDefinition::Nv12Adv),
        MosFormat::Planar411 => Some(PlaneDefinition::P411Adv),
        MosFormat::Planar411R => Some(PlaneDefinition::R411Adv),
        MosFormat::Planar422H => Some(PlaneDefinition::H422Adv),
        MosFormat::Planar422V => Some(PlaneDefinition::V422Adv),
        MosFormat::Planar444 => Some(PlaneDefinition::P444Adv),
        MosFormat::Rgbp => Some(PlaneDefinition::RgbpAdv),
        MosFormat::Bgrp => Some(PlaneDefinition::BgrpAdv),
        MosFormat::Ayuv => Some(PlaneDefinition::AyuvAdv),
        MosFormat::Yuyv | MosFormat::Yuy2 => {
            if params.vme_use {
                apply_vme_packed_workaround(surface);
            }
            selection.direction = set_chroma_direction(surface);
            Some(PlaneDefinition::Yuy2Adv)
        }
        MosFormat::Uyvy => {
            selection.direction = set_chroma_direction(surface);
            Some(PlaneDefinition::UyvyAdv)
        }
        MosFormat::Yvyu => {
            selection.direction = set_chroma_direction(surface);
            Some(PlaneDefinition::YvyuAdv)
        }
        MosFormat::Vyuy => {
            selection.direction = set_chroma_direction(surface);
            Some(PlaneDefinition::VyuyAdv)
        }
        MosFormat::A8R8G8B8 | MosFormat::X8R8G8B8 => {
            if params.va_surface {
                surface.os_surface.width *= 32;
                Some(PlaneDefinition::Y1)
            } else {
                Some(PlaneDefinition::ArgbAdv)
            }
        }
        MosFormat::R8G8SN | MosFormat::L16 | MosFormat::R16S if params.va_surface => {
            Some(PlaneDefinition::Y16S)
        }
        MosFormat::V8U8 | MosFormat::D16 | MosFormat::R16U if params.va_surface => {
            Some(PlaneDefinition::Y16U)
        }
        MosFormat::A8 | MosFormat::Buffer2D if params.va_surface => Some(PlaneDefinition::Y8),
        MosFormat::R8G8SN
        | MosFormat::V8U8
        | MosFormat::L16
        | MosFormat::R16S
        | MosFormat::D16
        | MosFormat::R16U
        | MosFormat::A8
        | MosFormat::Buffer2D => None,
        MosFormat::A8B8G8R8 | MosFormat::X8B8G8R8 => Some(PlaneDefinition::AbgrAdv),
        MosFormat::Stmm => Some(PlaneDefinition::StmmAdv),
        MosFormat::Y8 => Some(PlaneDefinition::Y8Adv),
        MosFormat::L8 | MosFormat::R8UN => {
            if params.force_nv12 {
                selection.interleave_chroma = true;
                selection.u_y_offset = surface.os_surface.height.min(u16::MAX as u32) as u16;
                Some(PlaneDefinition::Nv12Adv)
            } else {
                Some(PlaneDefinition::L8Adv)
            }
        }
        MosFormat::A16B16G16R16 | MosFormat::Y416 => Some(PlaneDefinition::A16B16G16R16Adv),
        MosFormat::R10G10B10A2 | MosFormat::Y410 => Some(PlaneDefinition::R10G10B10A2Adv),
        MosFormat::P010 | MosFormat::P016 => {
            if params.vme_use {
                Some(PlaneDefinition::P010OnePlaneAdv)
            } else if policy.p010_single_pass && !surface.is_render_target() {
                selection.interleave_chroma = true;
                selection.u_y_offset = calculate_y_offset(&surface.os_surface);
                selection.direction = set_chroma_direction(surface);
                Some(PlaneDefinition::P010OnePlaneAdv)
            } else {
                fall_back_to_regular(surface, params);
                None
            }
        }
        MosFormat::Y210 | MosFormat::Y216 => {
            if params.vme_use {
                apply_vme_packed_workaround(surface);
                Some(PlaneDefinition::Y210OnePlaneAdv)
            } else {
                Some(PlaneDefinition::Y210Adv)
            }
        }
        _ => {
            fall_back_to_regular(surface, params);
            None
        }
    }
}

fn select_regular(
    policy: &FormatPolicy,
    surface: &RenderHalSurface,
    params: &SurfaceStateParams,
    selection: &mut PlaneSelection,
) -> Option<PlaneDefinition> {
    let os = &surface.os_surface;
    let chroma_siting = params.chroma_siting_enabled;
    let palette_one = surface.palette_id.is_some_and(|id| id != 0);

    let definition = match os.format {
        MosFormat::Imc1
        | MosFormat::Imc2
        | MosFormat::Imc3
        | MosFormat::Imc4
        | MosFormat::I420
        | MosFormat::Iyuv
        | MosFormat::Yvu9 => PlaneDefinition::Pl3,
        MosFormat::Yv12 => {
            selection.half_pitch_chroma = true;
            // The U offset field is 14 bits wide.
            let u_offset = os.height * 2 + os.height / 2;
            if policy.yv12_single_pass
                && !surface.deinterlace
                && !surface.interlaced_scaling
                && os.height % 4 == 0
                && !surface.is_render_target()
                && u_offset < RENDERHAL_MAX_YV12_PLANE_Y_U_OFFSET_G9
            {
                PlaneDefinition::Yv12
            } else {
                PlaneDefinition::Pl3
            }
        }
        MosFormat::Planar400 => PlaneDefinition::Nv12,
        MosFormat::P208 => PlaneDefinition::P208,
        MosFormat::P010 | MosFormat::P016 => {
            if policy.p010_single_pass && !surface.is_render_target() {
                PlaneDefinition::P010OnePlane
            } else {
                PlaneDefinition::P010
            }
        }
        MosFormat::Planar411 => PlaneDefinition::P411,
        MosFormat::Planar411R => PlaneDefinition::R411,
        MosFormat::Planar422H => PlaneDefinition::H422,
        MosFormat::Planar422V => PlaneDefinition::V422,
        MosFormat::Planar444 => PlaneDefinition::P444,
        MosFormat::Rgbp => PlaneDefinition::Rgbp,
        MosFormat::Bgrp => PlaneDefinition::Bgrp,
        MosFormat::Nv12 => {
            if surface.is_render_target()
                || (params.width_in_dword_y && params.width_in_dword_uv)
                || params.two_plane_nv12_needed_by_kernel
                || chroma_siting
                || is_2plane_nv12_needed(policy, surface, params.boundary)
            {
                PlaneDefinition::Nv12TwoPlanes
            } else {
                PlaneDefinition::Nv12
            }
        }
        MosFormat::Yuyv | MosFormat::Yuy2 => {
            if chroma_siting {
                PlaneDefinition::Yuy2TwoPlanes
            } else {
                PlaneDefinition::Yuy2
            }
        }
        MosFormat::G8R8G8B8 | MosFormat::Uyvy => PlaneDefinition::Uyvy,
        MosFormat::Yvyu => PlaneDefinition::Yvyu,
        MosFormat::Vyuy => PlaneDefinition::Vyuy,
        MosFormat::A8R8G8B8 => PlaneDefinition::Argb,
        MosFormat::R32U => PlaneDefinition::R32U,
        MosFormat::R32S => PlaneDefinition::R32S,
        MosFormat::R32F | MosFormat::D32F | MosFormat::R32 => PlaneDefinition::R32F,
        MosFormat::Y8 | MosFormat::R8U | MosFormat::R8UN => PlaneDefinition::R8,
        MosFormat::Y1 => PlaneDefinition::Y1,
        MosFormat::Y16U => PlaneDefinition::Y16U,
        MosFormat::Y16S => PlaneDefinition::Y16S,
        MosFormat::R8G8SN | MosFormat::V8U8 => PlaneDefinition::V8U8,
        MosFormat::R16U => PlaneDefinition::R16U,
        MosFormat::R16S => PlaneDefinition::R16S,
        MosFormat::R8G8UN => PlaneDefinition::R8G8Unorm,
        // No XRGB/XBGR render targets in hardware.
        MosFormat::X8R8G8B8 if params.render_target => PlaneDefinition::Argb,
        MosFormat::X8R8G8B8 => PlaneDefinition::Xrgb,
        MosFormat::A8B8G8R8 => PlaneDefinition::Abgr,
        MosFormat::X8B8G8R8 if params.render_target => PlaneDefinition::Abgr,
        MosFormat::X8B8G8R8 => PlaneDefinition::Xbgr,
        MosFormat::R5G6B5 => PlaneDefinition::Rgb16,
        MosFormat::R8G8B8 => PlaneDefinition::Rgb24,
        MosFormat::Ayuv => PlaneDefinition::Ayuv,
        MosFormat::Ai44 if palette_one => PlaneDefinition::Ai44Palette1,
        MosFormat::Ai44 => PlaneDefinition::Ai44Palette0,
        MosFormat::Ia44 if palette_one => PlaneDefinition::Ia44Palette1,
        MosFormat::Ia44 => PlaneDefinition::Ia44Palette0,
        MosFormat::P8 if palette_one => PlaneDefinition::P8Palette1,
        MosFormat::P8 => PlaneDefinition::P8Palette0,
        MosFormat::A8P8 if palette_one => PlaneDefinition::A8P8Palette1,
        MosFormat::A8P8 => PlaneDefinition::A8P8Palette0,
        MosFormat::Stmm => PlaneDefinition::Stmm,
        MosFormat::L8 => PlaneDefinition::L8,
        MosFormat::A8 | MosFormat::Buffer2D => PlaneDefinition::A8,
        MosFormat::R16UN | MosFormat::D16 | MosFormat::R16 => PlaneDefinition::R16Unorm,
        MosFormat::A16B16G16R16 => PlaneDefinition::A16B16G16R16,
        MosFormat::Y416 if surface.is_render_target() => PlaneDefinition::Y416RenderTarget,
        MosFormat::Y416 => PlaneDefinition::A16B16G16R16,
        MosFormat::A16B16G16R16F => PlaneDefinition::A16B16G16R16F,
        MosFormat::A16R16G16B16F => PlaneDefinition::A16R16G16B16F,
        MosFormat::R32G32B32A32F => PlaneDefinition::R32G32B32A32F,
        MosFormat::Nv21 => PlaneDefinition::Nv21,
        MosFormat::L16 => PlaneDefinition::L16,
        MosFormat::R10G10B10A2 | MosFormat::Y410 => PlaneDefinition::R10G10B10A2,
        MosFormat::Y210 | MosFormat::Y216 if surface.is_render_target() => {
            PlaneDefinition::Y210RenderTarget
        }
        MosFormat::Y210 | MosFormat::Y216 => PlaneDefinition::Y210,
        MosFormat::B10G10R10A2 => PlaneDefinition::B10G10R10A2,
        MosFormat::Irw0 => PlaneDefinition::Irw0,
        MosFormat::Irw1 => PlaneDefinition::Irw1,
        MosFormat::Irw2 => PlaneDefinition::Irw2,
        MosFormat::Irw3 => PlaneDefinition::Irw3,
        MosFormat::R16G16UN => PlaneDefinition::R16G16Unorm,
        MosFormat::R16G16S => PlaneDefinition::R16G16Sint,
        MosFormat::R16F => PlaneDefinition::R16Float,
        MosFormat::R24G8 | MosFormat::D24S8UN => PlaneDefinition::R24UnormX8Typeless,
        MosFormat::R32G8X24 | MosFormat::D32S8X24Float => {
            PlaneDefinition::R32FloatX8X24Typeless
        }
        MosFormat::Invalid | MosFormat::Nv11 => return None,
    };
    Some(definition)
}

/// Picks the plane layout of `surface` for the requested surface-state type.
///
/// Formats the advanced sampler cannot read are downgraded in place: `params.avs` is cleared,
/// `params.surface_type` becomes its regular counterpart and the surface falls back to
/// bilinear scaling. Motion-estimation packed formats rewrite the surface extent in place.
pub fn select_planes(
    policy: &FormatPolicy,
    surface: &mut RenderHalSurface,
    params: &mut SurfaceStateParams,
) -> RenderHalResult<PlaneSelection> {
    let format = surface.os_surface.format;
    if format.is_palettized() {
        match surface.palette_id {
            Some(id) if id < policy.max_palettes => (),
            Some(id) => return Err(RenderHalError::InvalidPalette(id)),
            None => return Err(RenderHalError::InvalidParameter("palettized surface without palette")),
        }
    }

    let pitch = surface.os_surface.pitch;
    let mut selection = PlaneSelection {
        definition: PlaneDefinition::Pl3,
        uv_pitch: match format {
            MosFormat::I420 | MosFormat::Iyuv | MosFormat::Yv12 | MosFormat::Nv11 => pitch >> 1,
            MosFormat::Yvu9 => pitch >> 2,
            _ => pitch,
        },
        half_pitch_chroma: false,
        interleave_chroma: false,
        direction: MHW_CHROMA_SITING_VDIRECTION_0,
        u_x_offset: 0,
        u_y_offset: 0,
        v_x_offset: 0,
        v_y_offset: 0,
    };

    let mut definition = None;
    if params.surface_type.is_advanced() {
        definition = select_advanced(policy, surface, params, &mut selection);
    }
    if definition.is_none() && !params.surface_type.is_advanced() {
        definition = select_regular(policy, surface, params, &mut selection);
    }

    selection.definition = definition.ok_or(RenderHalError::UnsupportedFormat(format))?;
    Ok(selection)
}

#[cfg(test)]
mod tests {
    use crate::*;
    use mhw::*;

    fn policy() -> FormatPolicy {
        FormatPolicy {
            gen10_or_later: true,
            nv12_height_workaround: true,
            p010_single_pass: true,
            yv12_single_pass: true,
            max_palettes: RENDERHAL_PALETTE_COUNT,
        }
    }

    fn surface(format: MosFormat, width: u32, height: u32) -> RenderHalSurface {
        RenderHalSurface::new(MosSurface {
            format,
            width,
            height,
            pitch: width.next_multiple_of(64),
            ..Default::default()
        })
    }

    fn params(surface_type: SurfaceStateType) -> SurfaceStateParams {
        SurfaceStateParams {
            surface_type,
            ..Default::default()
        }
    }

    #[test]
    fn test_adjust_boundary() {
        let mut s = surface(MosFormat::Yuy2, 100, 81);
        s.rc_src = Rect::new(0, 0, 64, 33);
        assert_eq!(adjust_boundary(&s, Boundary::SrcRect), (64, 34));
        assert_eq!(adjust_boundary(&s, Boundary::Original), (100, 82));

        s.deinterlace = true;
        assert_eq!(adjust_boundary(&s, Boundary::DstRect), (104, 82));
    }

    #[test]
    fn test_2plane_nv12_rules() {
        let mut pre_gen10 = policy();
        pre_gen10.gen10_or_later = false;

        let s = surface(MosFormat::Nv12, 66, 64);
        assert!(is_2plane_nv12_needed(&pre_gen10, &s, Boundary::Original));
        assert!(!is_2plane_nv12_needed(&policy(), &s, Boundary::Original));

        let s = surface(MosFormat::Nv12, 64, 62);
        assert!(is_2plane_nv12_needed(&policy(), &s, Boundary::Original));
        let mut avs = s.clone();
        avs.scaling_mode = ScalingMode::Avs;
        assert!(!is_2plane_nv12_needed(&policy(), &avs, Boundary::Original));

        let tall = surface(MosFormat::Nv12, 64, 16384);
        assert!(is_2plane_nv12_needed(&policy(), &tall, Boundary::Original));
        let mut no_wa = policy();
        no_wa.nv12_height_workaround = false;
        assert!(!is_2plane_nv12_needed(&no_wa, &tall, Boundary::Original));
    }

    #[test]
    fn test_di_uv_offsets() {
        let mut s = surface(MosFormat::Yv12, 64, 30).os_surface;
        assert_eq!(get_di_uv_offset(&s), (0, 44, 0, 30));
        s.format = MosFormat::Imc4;
        assert_eq!(get_di_uv_offset(&s), (0, 30, 32, 30));
        s.format = MosFormat::Yuy2;
        assert_eq!(get_di_uv_offset(&s), (0, 0, 0, 0));
    }

    #[test]
    fn test_chroma_direction() {
        let mut s = surface(MosFormat::Nv12, 64, 64);
        s.chroma_siting = MHW_CHROMA_SITING_HORZ_CENTER | MHW_CHROMA_SITING_VERT_TOP;
        assert_eq!(set_chroma_direction(&s), (1 << 3) | MHW_CHROMA_SITING_VDIRECTION_0);

        s.chroma_siting = MHW_CHROMA_SITING_HORZ_LEFT;
        s.deinterlace = true;
        s.sample_type = SampleType::InterleavedEvenFirstBottomField;
        assert_eq!(set_chroma_direction(&s), MHW_CHROMA_SITING_VDIRECTION_3_4);
    }

    #[test]
    fn test_select_regular_formats() {
        let mut p = params(SurfaceStateType::G9);
        let mut s = surface(MosFormat::Nv12, 64, 64);
        assert_eq!(
            select_planes(&policy(), &mut s, &mut p).unwrap().definition,
            PlaneDefinition::Nv12
        );

        s.usage = SurfaceUsage::OutRenderTarget;
        assert_eq!(
            select_planes(&policy(), &mut s, &mut p).unwrap().definition,
            PlaneDefinition::Nv12TwoPlanes
        );

        let mut s = surface(MosFormat::Yv12, 64, 64);
        let selection = select_planes(&policy(), &mut s, &mut p).unwrap();
        assert_eq!(selection.definition, PlaneDefinition::Yv12);
        assert_eq!(selection.uv_pitch, 32);
        assert!(selection.half_pitch_chroma);

        let mut s = surface(MosFormat::Yv12, 64, 6600);
        assert_eq!(
            select_planes(&policy(), &mut s, &mut p).unwrap().definition,
            PlaneDefinition::Pl3
        );

        let mut s = surface(MosFormat::X8R8G8B8, 64, 64);
        p.render_target = true;
        assert_eq!(
            select_planes(&policy(), &mut s, &mut p).unwrap().definition,
            PlaneDefinition::Argb
        );
    }

    #[test]
    fn test_select_advanced_fallback() {
        let mut no_single_pass = policy();
        no_single_pass.p010_single_pass = false;
        let mut p = params(SurfaceStateType::AdvG9);
        p.avs = true;
        let mut s = surface(MosFormat::P010, 64, 64);
        s.scaling_mode = ScalingMode::Avs;

        let selection = select_planes(&no_single_pass, &mut s, &mut p).unwrap();
        assert_eq!(selection.definition, PlaneDefinition::P010);
        assert_eq!(p.surface_type, SurfaceStateType::G9);
        assert!(!p.avs);
        assert_eq!(s.scaling_mode, ScalingMode::Bilinear);
    }

    #[test]
    fn test_select_advanced_vme_packed() {
        let mut p = params(SurfaceStateType::AdvG10);
        p.vme_use = true;
        let mut s = surface(MosFormat::Yuy2, 64, 64);
        let selection = select_planes(&policy(), &mut s, &mut p).unwrap();
        assert_eq!(selection.definition, PlaneDefinition::Yuy2Adv);
        assert_eq!((s.os_surface.width, s.os_surface.height), (128, 32));
        assert_eq!(s.rc_dst, Rect::new(0, 0, 128, 32));
    }

    #[test]
    fn test_select_errors() {
        let mut p = params(SurfaceStateType::G9);
        let mut s = surface(MosFormat::P8, 64, 64);
        assert!(matches!(
            select_planes(&policy(), &mut s, &mut p),
            Err(RenderHalError::InvalidParameter(_))
        ));
        s.palette_id = Some(5);
        assert!(matches!(
            select_planes(&policy(), &mut s, &mut p),
            Err(RenderHalError::InvalidPalette(5))
        ));
        s.palette_id = Some(1);
        assert_eq!(
            select_planes(&policy(), &mut s, &mut p).unwrap().definition,
            PlaneDefinition::P8Palette1
        );

        let mut p = params(SurfaceStateType::AdvG9);
        let mut s = surface(MosFormat::V8U8, 64, 64);
        assert!(matches!(
            select_planes(&policy(), &mut s, &mut p),
            Err(RenderHalError::UnsupportedFormat(MosFormat::V8U8))
        ));
    }
}
