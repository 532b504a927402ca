// Copyright 2025 Google
// SPDX-License-Identifier: BSD-3-Clause

//! Logical pixel formats and the static table describing how each one is split into hardware
//! surface-state planes.

use mhw::*;
use serde::Deserialize;
use serde::Serialize;

/// Logical surface formats understood by the surface-state dispatch.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MosFormat {
    #[default]
    Invalid,
    // Packed RGB
    A8R8G8B8,
    X8R8G8B8,
    A8B8G8R8,
    X8B8G8R8,
    R5G6B5,
    R8G8B8,
    R10G10B10A2,
    B10G10R10A2,
    A16B16G16R16,
    A16B16G16R16F,
    A16R16G16B16F,
    R32G32B32A32F,
    // Packed YUV
    Yuy2,
    Yuyv,
    Uyvy,
    Yvyu,
    Vyuy,
    G8R8G8B8,
    Ayuv,
    Y210,
    Y216,
    Y410,
    Y416,
    // Two plane YUV
    Nv11,
    Nv12,
    Nv21,
    P208,
    P010,
    P016,
    // Three plane YUV
    Imc1,
    Imc2,
    Imc3,
    Imc4,
    I420,
    Iyuv,
    Yv12,
    Yvu9,
    Planar400,
    Planar411,
    Planar411R,
    Planar422H,
    Planar422V,
    Planar444,
    Rgbp,
    Bgrp,
    // Palettized
    Ai44,
    Ia44,
    P8,
    A8P8,
    // Single channel and raw
    A8,
    L8,
    L16,
    Y1,
    Y8,
    Y16S,
    Y16U,
    R8U,
    R8UN,
    R8G8SN,
    R8G8UN,
    V8U8,
    R16,
    R16F,
    R16S,
    R16U,
    R16UN,
    R16G16S,
    R16G16UN,
    D16,
    R32,
    R32F,
    R32S,
    R32U,
    D32F,
    R24G8,
    D24S8UN,
    R32G8X24,
    D32S8X24Float,
    Irw0,
    Irw1,
    Irw2,
    Irw3,
    Stmm,
    Buffer2D,
}

impl MosFormat {
    /// Formats whose chroma lives in separate U and V planes.
    pub fn is_three_plane(self) -> bool {
        matches!(
            self,
            MosFormat::Imc1
                | MosFormat::Imc2
                | MosFormat::Imc3
                | MosFormat::Imc4
                | MosFormat::I420
                | MosFormat::Iyuv
                | MosFormat::Yv12
                | MosFormat::Yvu9
                | MosFormat::Planar411
                | MosFormat::Planar411R
                | MosFormat::Planar422H
                | MosFormat::Planar422V
                | MosFormat::Planar444
        )
    }

    pub fn is_three_plane_rgb(self) -> bool {
        matches!(self, MosFormat::Rgbp | MosFormat::Bgrp)
    }

    /// Formats with a luma plane followed by one interleaved chroma plane.
    pub fn is_two_plane(self) -> bool {
        matches!(
            self,
            MosFormat::Nv11
                | MosFormat::Nv12
                | MosFormat::Nv21
                | MosFormat::P208
                | MosFormat::P010
                | MosFormat::P016
        )
    }

    pub fn is_palettized(self) -> bool {
        matches!(
            self,
            MosFormat::Ai44 | MosFormat::Ia44 | MosFormat::P8 | MosFormat::A8P8
        )
    }
}

/// Which component of a logical surface a plane carries.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaneId {
    #[default]
    Generic,
    Y,
    U,
    V,
}

impl PlaneId {
    pub fn is_chroma(self) -> bool {
        matches!(self, PlaneId::U | PlaneId::V)
    }

    pub fn hw_index(self) -> u32 {
        match self {
            PlaneId::Generic => 0,
            PlaneId::Y => 1,
            PlaneId::U => 2,
            PlaneId::V => 3,
        }
    }
}

/// One row of the plane-definition table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PlaneLayout {
    pub plane_id: PlaneId,
    pub scale_width: u32,
    pub scale_height: u32,
    pub align_width: u32,
    pub align_height: u32,
    /// 0 means the width is already expressed in dwords.
    pub pixels_per_dword: u32,
    pub advanced: bool,
    pub format: u32,
}

macro_rules! planes {
    ($(($id:ident, $sw:expr, $sh:expr, $aw:expr, $ah:expr, $ppd:expr, $adv:expr, $fmt:expr)),+ $(,)?) => {{
        const PLANES: &[PlaneLayout] = &[$(PlaneLayout {
            plane_id: PlaneId::$id,
            scale_width: $sw,
            scale_height: $sh,
            align_width: $aw,
            align_height: $ah,
            pixels_per_dword: $ppd,
            advanced: $adv,
            format: $fmt,
        }),+];
        PLANES
    }};
}

/// Physical plane arrangements a logical format can be programmed as.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaneDefinition {
    Pl3,
    Nv12,
    Yuy2,
    Uyvy,
    Yvyu,
    Vyuy,
    Argb,
    Xrgb,
    Abgr,
    Xbgr,
    Rgb16,
    Rgb24,
    R16U,
    R16S,
    R32U,
    R32S,
    R32F,
    V8U8,
    R8G8Unorm,
    P411,
    R411,
    H422,
    V422,
    P444,
    Rgbp,
    Bgrp,
    Ai44Palette0,
    Ia44Palette0,
    P8Palette0,
    A8P8Palette0,
    Ai44Palette1,
    Ia44Palette1,
    P8Palette1,
    A8P8Palette1,
    Ayuv,
    Stmm,
    L8,
    Pl3Adv,
    Nv12Adv,
    Yuy2Adv,
    UyvyAdv,
    YvyuAdv,
    VyuyAdv,
    ArgbAdv,
    AbgrAdv,
    AyuvAdv,
    StmmAdv,
    L8Adv,
    A8Adv,
    A8,
    R8,
    Nv12TwoPlanes,
    Nv12TwoPlanesAdv,
    P411Adv,
    R411Adv,
    H422Adv,
    V422Adv,
    P444Adv,
    RgbpAdv,
    BgrpAdv,
    R16Unorm,
    Y8,
    Y1,
    Y16U,
    Y16S,
    A16B16G16R16,
    A16B16G16R16Adv,
    R10G10B10A2,
    R10G10B10A2Adv,
    B10G10R10A2,
    L16,
    Nv21,
    Yv12,
    P016,
    P016TwoPlanesAdv,
    P010,
    P010OnePlane,
    P010OnePlaneAdv,
    Irw0,
    Irw1,
    Irw2,
    Irw3,
    A16B16G16R16F,
    R16G16Unorm,
    R16Float,
    A16R16G16B16F,
    Yuy2TwoPlanes,
    Y210Adv,
    Y210RenderTarget,
    Y210,
    Y210OnePlaneAdv,
    R16G16Sint,
    R24UnormX8Typeless,
    R32FloatX8X24Typeless,
    P208,
    P208OnePlaneAdv,
    Y416RenderTarget,
    R32G32B32A32F,
    Y8Adv,
}

impl PlaneDefinition {
    pub fn plane_count(self) -> usize {
        self.planes().len()
    }

    /// Widths of these layouts are doubled (or quadrupled) rather than divided when expressed
    /// in dwords.
    pub fn is_wide_pixel(self) -> bool {
        matches!(
            self,
            PlaneDefinition::A16B16G16R16
                | PlaneDefinition::A16B16G16R16Adv
                | PlaneDefinition::A16B16G16R16F
                | PlaneDefinition::A16R16G16B16F
                | PlaneDefinition::Y210RenderTarget
                | PlaneDefinition::Y416RenderTarget
                | PlaneDefinition::R32FloatX8X24Typeless
        )
    }

    pub fn planes(self) -> &'static [PlaneLayout] {
        match self {
            PlaneDefinition::Pl3 => planes![
                (Y, 1, 1, 1, 1, 4, false, MHW_GFX3DSTATE_SURFACEFORMAT_R8_UNORM),
                (U, 2, 2, 1, 1, 4, false, MHW_GFX3DSTATE_SURFACEFORMAT_R8_UNORM),
                (V, 2, 2, 1, 1, 4, false, MHW_GFX3DSTATE_SURFACEFORMAT_R8_UNORM),
            ],
            PlaneDefinition::Nv12 | PlaneDefinition::Yv12 => planes![(
                Y,
                1,
                1,
                1,
                1,
                4,
                false,
                MHW_GFX3DSTATE_SURFACEFORMAT_PLANAR_420_8
            )],
            PlaneDefinition::Yuy2 => planes![(
                Generic,
                1,
                1,
                1,
                1,
                2,
                false,
                MHW_GFX3DSTATE_SURFACEFORMAT_YCRCB_NORMAL
            )],
            PlaneDefinition::Uyvy => planes![(
                Generic,
                1,
                1,
                1,
                1,
                2,
                false,
                MHW_GFX3DSTATE_SURFACEFORMAT_YCRCB_SWAPY
            )],
            PlaneDefinition::Yvyu => planes![(
                Generic,
                1,
                1,
                1,
                1,
                2,
                false,
                MHW_GFX3DSTATE_SURFACEFORMAT_YCRCB_SWAPUV
            )],
            PlaneDefinition::Vyuy => planes![(
                Generic,
                1,
                1,
                1,
                1,
                2,
                false,
                MHW_GFX3DSTATE_SURFACEFORMAT_YCRCB_SWAPUVY
            )],
            PlaneDefinition::Argb => planes![(
                Generic,
                1,
                1,
                1,
                1,
                1,
                false,
                MHW_GFX3DSTATE_SURFACEFORMAT_B8G8R8A8_UNORM
            )],
            PlaneDefinition::Xrgb => planes![(
                Generic,
                1,
                1,
                1,
                1,
                1,
                false,
                MHW_GFX3DSTATE_SURFACEFORMAT_B8G8R8X8_UNORM
            )],
            PlaneDefinition::Abgr => planes![(
                Generic,
                1,
                1,
                1,
                1,
                1,
                false,
                MHW_GFX3DSTATE_SURFACEFORMAT_R8G8B8A8_UNORM
            )],
            PlaneDefinition::Xbgr => planes![(
                Generic,
                1,
                1,
                1,
                1,
                1,
                false,
                MHW_GFX3DSTATE_SURFACEFORMAT_R8G8B8X8_UNORM
            )],
            PlaneDefinition::Rgb16 => planes![(
                Generic,
                1,
                1,
                1,
                1,
                2,
                false,
                MHW_GFX3DSTATE_SURFACEFORMAT_B5G6R5_UNORM
            )],
            PlaneDefinition::Rgb24 => planes![(
                Generic,
                1,
                1,
                1,
                1,
                2,
                false,
                MHW_GFX3DSTATE_SURFACEFORMAT_R8G8B8_UNORM
            )],
            PlaneDefinition::R16U => {
                planes![(Generic, 1, 1, 1, 1, 2, false, MHW_GFX3DSTATE_SURFACEFORMAT_R16_UINT)]
            }
            PlaneDefinition::R16S => {
                planes![(Generic, 1, 1, 1, 1, 2, false, MHW_GFX3DSTATE_SURFACEFORMAT_R16_SINT)]
            }
            PlaneDefinition::R32U => {
                planes![(Generic, 1, 1, 1, 1, 1, false, MHW_GFX3DSTATE_SURFACEFORMAT_R32_UINT)]
            }
            PlaneDefinition::R32S => {
                planes![(Generic, 1, 1, 1, 1, 1, false, MHW_GFX3DSTATE_SURFACEFORMAT_R32_SINT)]
            }
            PlaneDefinition::R32F => {
                planes![(Generic, 1, 1, 1, 1, 1, false, MHW_GFX3DSTATE_SURFACEFORMAT_R32_FLOAT)]
            }
            PlaneDefinition::V8U8 => {
                planes![(Generic, 1, 1, 1, 1, 2, false, MHW_GFX3DSTATE_SURFACEFORMAT_R8G8_SNORM)]
            }
            PlaneDefinition::R8G8Unorm => {
                planes![(Generic, 1, 1, 1, 1, 2, false, MHW_GFX3DSTATE_SURFACEFORMAT_R8G8_UNORM)]
            }
            PlaneDefinition::P411 => planes![
                (Y, 1, 1, 1, 1, 4, false, MHW_GFX3DSTATE_SURFACEFORMAT_R8_UNORM),
                (U, 4, 1, 1, 1, 4, false, MHW_GFX3DSTATE_SURFACEFORMAT_R8_UNORM),
                (V, 4, 1, 1, 1, 4, false, MHW_GFX3DSTATE_SURFACEFORMAT_R8_UNORM),
            ],
            PlaneDefinition::R411 => planes![
                (Y, 1, 1, 1, 1, 4, false, MHW_GFX3DSTATE_SURFACEFORMAT_R8_UNORM),
                (U, 1, 4, 1, 1, 4, false, MHW_GFX3DSTATE_SURFACEFORMAT_R8_UNORM),
                (V, 1, 4, 1, 1, 4, false, MHW_GFX3DSTATE_SURFACEFORMAT_R8_UNORM),
            ],
            PlaneDefinition::H422 => planes![
                (Y, 1, 1, 1, 1, 4, false, MHW_GFX3DSTATE_SURFACEFORMAT_R8_UNORM),
                (U, 2, 1, 1, 1, 4, false, MHW_GFX3DSTATE_SURFACEFORMAT_R8_UNORM),
                (V, 2, 1, 1, 1, 4, false, MHW_GFX3DSTATE_SURFACEFORMAT_R8_UNORM),
            ],
            PlaneDefinition::V422 => planes![
                (Y, 1, 1, 1, 1, 4, false, MHW_GFX3DSTATE_SURFACEFORMAT_R8_UNORM),
                (U, 1, 2, 1, 1, 4, false, MHW_GFX3DSTATE_SURFACEFORMAT_R8_UNORM),
                (V, 1, 2, 1, 1, 4, false, MHW_GFX3DSTATE_SURFACEFORMAT_R8_UNORM),
            ],
            PlaneDefinition::P444 => planes![
                (Y, 1, 1, 1, 1, 4, false, MHW_GFX3DSTATE_SURFACEFORMAT_R8_UNORM),
                (U, 1, 1, 1, 1, 4, false, MHW_GFX3DSTATE_SURFACEFORMAT_R8_UNORM),
                (V, 1, 1, 1, 1, 4, false, MHW_GFX3DSTATE_SURFACEFORMAT_R8_UNORM),
            ],
            PlaneDefinition::Rgbp => planes![
                (U, 1, 1, 1, 1, 4, false, MHW_GFX3DSTATE_SURFACEFORMAT_R8_UNORM),
                (V, 1, 1, 1, 1, 4, false, MHW_GFX3DSTATE_SURFACEFORMAT_R8_UNORM),
                (Y, 1, 1, 1, 1, 4, false, MHW_GFX3DSTATE_SURFACEFORMAT_R8_UNORM),
            ],
            PlaneDefinition::Bgrp => planes![
                (U, 1, 1, 1, 1, 4, false, MHW_GFX3DSTATE_SURFACEFORMAT_R8_UNORM),
                (Y, 1, 1, 1, 1, 4, false, MHW_GFX3DSTATE_SURFACEFORMAT_R8_UNORM),
                (V, 1, 1, 1, 1, 4, false, MHW_GFX3DSTATE_SURFACEFORMAT_R8_UNORM),
            ],
            PlaneDefinition::Ai44Palette0 => planes![(
                Generic,
                1,
                1,
                1,
                1,
                4,
                false,
                MHW_GFX3DSTATE_SURFACEFORMAT_P4A4_UNORM_PALETTE_0
            )],
            PlaneDefinition::Ia44Palette0 => planes![(
                Generic,
                1,
                1,
                1,
                1,
                4,
                false,
                MHW_GFX3DSTATE_SURFACEFORMAT_A4P4_UNORM_PALETTE_0
            )],
            PlaneDefinition::P8Palette0 => planes![(
                Generic,
                1,
                1,
                1,
                1,
                4,
                false,
                MHW_GFX3DSTATE_SURFACEFORMAT_P8_UNORM_PALETTE_0
            )],
            PlaneDefinition::A8P8Palette0 => planes![(
                Generic,
                1,
                1,
                1,
                1,
                2,
                false,
                MHW_GFX3DSTATE_SURFACEFORMAT_P8A8_UNORM_PALETTE_0
            )],
            PlaneDefinition::Ai44Palette1 => planes![(
                Generic,
                1,
                1,
                1,
                1,
                4,
                false,
                MHW_GFX3DSTATE_SURFACEFORMAT_P4A4_UNORM_PALETTE_1
            )],
            PlaneDefinition::Ia44Palette1 => planes![(
                Generic,
                1,
                1,
                1,
                1,
                4,
                false,
                MHW_GFX3DSTATE_SURFACEFORMAT_A4P4_UNORM_PALETTE_1
            )],
            PlaneDefinition::P8Palette1 => planes![(
                Generic,
                1,
                1,
                1,
                1,
                4,
                false,
                MHW_GFX3DSTATE_SURFACEFORMAT_P8_UNORM_PALETTE_1
            )],
            PlaneDefinition::A8P8Palette1 => planes![(
                Generic,
                1,
                1,
                1,
                1,
                2,
                false,
                MHW_GFX3DSTATE_SURFACEFORMAT_P8A8_UNORM_PALETTE_1
            )],
            PlaneDefinition::Ayuv => planes![(
                Generic,
                1,
                1,
                1,
                1,
                1,
                false,
                MHW_GFX3DSTATE_SURFACEFORMAT_R8B8G8A8_UNORM
            )],
            PlaneDefinition::Stmm | PlaneDefinition::L8 => {
                planes![(Generic, 1, 1, 1, 1, 4, false, MHW_GFX3DSTATE_SURFACEFORMAT_L8_UNORM)]
            }
            PlaneDefinition::Pl3Adv => planes![
                (Y, 1, 1, 1, 1, 4, true, MHW_MEDIASTATE_SURFACEFORMAT_Y8_UNORM),
                (U, 2, 2, 1, 1, 4, true, MHW_MEDIASTATE_SURFACEFORMAT_R8_UNORM),
                (V, 2, 2, 1, 1, 4, true, MHW_MEDIASTATE_SURFACEFORMAT_R8_UNORM),
            ],
            PlaneDefinition::Nv12Adv => {
                planes![(Y, 1, 1, 2, 2, 4, true, MHW_MEDIASTATE_SURFACEFORMAT_PLANAR_420_8)]
            }
            PlaneDefinition::Yuy2Adv => planes![(
                Generic,
                1,
                1,
                2,
                1,
                4,
                true,
                MHW_MEDIASTATE_SURFACEFORMAT_YCRCB_NORMAL
            )],
            PlaneDefinition::UyvyAdv => {
                planes![(Generic, 1, 1, 2, 1, 4, true, MHW_MEDIASTATE_SURFACEFORMAT_YCRCB_SWAPY)]
            }
            PlaneDefinition::YvyuAdv => planes![(
                Generic,
                1,
                1,
                2,
                1,
                4,
                true,
                MHW_MEDIASTATE_SURFACEFORMAT_YCRCB_SWAPUV
            )],
            PlaneDefinition::VyuyAdv => planes![(
                Generic,
                1,
                1,
                2,
                1,
                4,
                true,
                MHW_MEDIASTATE_SURFACEFORMAT_YCRCB_SWAPUVY
            )],
            PlaneDefinition::ArgbAdv => planes![(
                Generic,
                1,
                1,
                1,
                1,
                4,
                true,
                MHW_MEDIASTATE_SURFACEFORMAT_B8G8R8A8_UNORM
            )],
            PlaneDefinition::AbgrAdv => planes![(
                Generic,
                1,
                1,
                1,
                1,
                4,
                true,
                MHW_MEDIASTATE_SURFACEFORMAT_R8G8B8A8_UNORM
            )],
            PlaneDefinition::AyuvAdv => planes![(
                Generic,
                1,
                1,
                1,
                1,
                1,
                true,
                MHW_MEDIASTATE_SURFACEFORMAT_A8Y8U8V8_UNORM
            )],
            PlaneDefinition::StmmAdv => planes![(
                Generic,
                1,
                1,
                1,
                1,
                4,
                true,
                MHW_MEDIASTATE_SURFACEFORMAT_STMM_DN_STATISTICS
            )],
            PlaneDefinition::L8Adv => {
                planes![(Generic, 1, 1, 1, 1, 4, true, MHW_MEDIASTATE_SURFACEFORMAT_R8_UNORM)]
            }
            PlaneDefinition::A8Adv | PlaneDefinition::Y8 => planes![(
                Generic,
                1,
                1,
                1,
                1,
                4,
                true,
                MHW_MEDIASTATE_SURFACEFORMAT_PLANAR_411_8
            )],
            PlaneDefinition::A8 => {
                planes![(Generic, 1, 1, 1, 1, 4, false, MHW_GFX3DSTATE_SURFACEFORMAT_A8_UNORM)]
            }
            PlaneDefinition::R8 => {
                planes![(Generic, 1, 1, 1, 1, 4, false, MHW_GFX3DSTATE_SURFACEFORMAT_R8_UNORM)]
            }
            PlaneDefinition::Nv12TwoPlanes | PlaneDefinition::Nv21 => planes![
                (Y, 1, 1, 1, 1, 4, false, MHW_GFX3DSTATE_SURFACEFORMAT_R8_UNORM),
                (U, 2, 2, 1, 1, 2, false, MHW_GFX3DSTATE_SURFACEFORMAT_R8G8_UNORM),
            ],
            PlaneDefinition::Nv12TwoPlanesAdv => planes![
                (Y, 1, 1, 2, 2, 4, true, MHW_MEDIASTATE_SURFACEFORMAT_Y8_UNORM),
                (U, 2, 2, 1, 1, 2, true, MHW_MEDIASTATE_SURFACEFORMAT_R8B8_UNORM),
            ],
            PlaneDefinition::P411Adv => planes![
                (Y, 1, 1, 1, 1, 4, true, MHW_MEDIASTATE_SURFACEFORMAT_Y8_UNORM),
                (U, 4, 1, 1, 1, 4, true, MHW_MEDIASTATE_SURFACEFORMAT_R8_UNORM),
                (V, 4, 1, 1, 1, 4, true, MHW_MEDIASTATE_SURFACEFORMAT_R8_UNORM),
            ],
            PlaneDefinition::R411Adv => planes![
                (Y, 1, 1, 1, 1, 4, true, MHW_MEDIASTATE_SURFACEFORMAT_Y8_UNORM),
                (U, 1, 4, 1, 1, 4, true, MHW_MEDIASTATE_SURFACEFORMAT_R8_UNORM),
                (V, 1, 4, 1, 1, 4, true, MHW_MEDIASTATE_SURFACEFORMAT_R8_UNORM),
            ],
            PlaneDefinition::H422Adv => planes![
                (Y, 1, 1, 1, 1, 4, true, MHW_MEDIASTATE_SURFACEFORMAT_Y8_UNORM),
                (U, 2, 1, 1, 1, 4, true, MHW_MEDIASTATE_SURFACEFORMAT_R8_UNORM),
                (V, 2, 1, 1, 1, 4, true, MHW_MEDIASTATE_SURFACEFORMAT_R8_UNORM),
            ],
            PlaneDefinition::V422Adv => planes![
                (Y, 1, 1, 1, 1, 4, true, MHW_MEDIASTATE_SURFACEFORMAT_Y8_UNORM),
                (U, 1, 2, 1, 1, 4, true, MHW_MEDIASTATE_SURFACEFORMAT_R8_UNORM),
                (V, 1, 2, 1, 1, 4, true, MHW_MEDIASTATE_SURFACEFORMAT_R8_UNORM),
            ],
            PlaneDefinition::P444Adv => planes![
                (Y, 1, 1, 1, 1, 4, true, MHW_MEDIASTATE_SURFACEFORMAT_Y8_UNORM),
                (U, 1, 1, 1, 1, 4, true, MHW_MEDIASTATE_SURFACEFORMAT_R8_UNORM),
                (V, 1, 1, 1, 1, 4, true, MHW_MEDIASTATE_SURFACEFORMAT_R8_UNORM),
            ],
            PlaneDefinition::RgbpAdv => planes![
                (U, 1, 1, 1, 1, 4, true, MHW_MEDIASTATE_SURFACEFORMAT_Y8_UNORM),
                (V, 1, 1, 1, 1, 4, true, MHW_MEDIASTATE_SURFACEFORMAT_R8_UNORM),
                (Y, 1, 1, 1, 1, 4, true, MHW_MEDIASTATE_SURFACEFORMAT_R8_UNORM),
            ],
            PlaneDefinition::BgrpAdv => planes![
                (U, 1, 1, 1, 1, 4, true, MHW_MEDIASTATE_SURFACEFORMAT_Y8_UNORM),
                (Y, 1, 1, 1, 1, 4, true, MHW_MEDIASTATE_SURFACEFORMAT_R8_UNORM),
                (V, 1, 1, 1, 1, 4, true, MHW_MEDIASTATE_SURFACEFORMAT_R8_UNORM),
            ],
            PlaneDefinition::R16Unorm
            | PlaneDefinition::Irw0
            | PlaneDefinition::Irw1
            | PlaneDefinition::Irw2
            | PlaneDefinition::Irw3 => {
                planes![(Generic, 1, 1, 1, 1, 2, false, MHW_GFX3DSTATE_SURFACEFORMAT_R16_UNORM)]
            }
            PlaneDefinition::Y1 => {
                planes![(Generic, 1, 1, 1, 1, 4, true, MHW_MEDIASTATE_SURFACEFORMAT_Y1_UNORM)]
            }
            PlaneDefinition::Y16U => planes![(
                Generic,
                1,
                1,
                1,
                1,
                2,
                true,
                MHW_MEDIASTATE_SURFACEFORMAT_STMM_DN_STATISTICS
            )],
            PlaneDefinition::Y16S => {
                planes![(Generic, 1, 1, 1, 1, 2, true, MHW_MEDIASTATE_SURFACEFORMAT_PLANAR_422_8)]
            }
            PlaneDefinition::A16B16G16R16 => planes![(
                Generic,
                1,
                1,
                1,
                1,
                0,
                false,
                MHW_GFX3DSTATE_SURFACEFORMAT_R16G16B16A16_UNORM
            )],
            PlaneDefinition::A16B16G16R16Adv => {
                planes![(Generic, 1, 1, 1, 1, 0, true, MHW_MEDIASTATE_SURFACEFORMAT_R16G16B16A16)]
            }
            PlaneDefinition::R10G10B10A2 => planes![(
                Generic,
                1,
                1,
                1,
                1,
                1,
                false,
                MHW_GFX3DSTATE_SURFACEFORMAT_R10G10B10A2_UNORM
            )],
            PlaneDefinition::R10G10B10A2Adv => planes![(
                Generic,
                1,
                1,
                1,
                1,
                0,
                true,
                MHW_MEDIASTATE_SURFACEFORMAT_R10G10B10A2_UNORM
            )],
            PlaneDefinition::B10G10R10A2 => planes![(
                Generic,
                1,
                1,
                1,
                1,
                1,
                false,
                MHW_GFX3DSTATE_SURFACEFORMAT_B10G10R10A2_UNORM
            )],
            PlaneDefinition::L16 => {
                planes![(Generic, 1, 1, 1, 1, 2, false, MHW_GFX3DSTATE_SURFACEFORMAT_L16_UNORM)]
            }
            PlaneDefinition::P016 | PlaneDefinition::P010 => planes![
                (Y, 1, 1, 1, 1, 2, false, MHW_GFX3DSTATE_SURFACEFORMAT_R16_UNORM),
                (U, 2, 2, 1, 1, 1, false, MHW_GFX3DSTATE_SURFACEFORMAT_R16G16_UNORM),
            ],
            PlaneDefinition::P016TwoPlanesAdv => planes![
                (Y, 1, 1, 2, 2, 2, true, MHW_MEDIASTATE_SURFACEFORMAT_Y16_UNORM),
                (U, 2, 2, 2, 2, 1, true, MHW_MEDIASTATE_SURFACEFORMAT_R16B16_UNORM),
            ],
            PlaneDefinition::P010OnePlane => {
                planes![(Y, 1, 1, 2, 2, 2, false, MHW_GFX3DSTATE_SURFACEFORMAT_PLANAR_420_16)]
            }
            PlaneDefinition::P010OnePlaneAdv => {
                planes![(Y, 1, 1, 2, 2, 2, true, MHW_MEDIASTATE_SURFACEFORMAT_PLANAR_420_16)]
            }
            PlaneDefinition::A16B16G16R16F | PlaneDefinition::A16R16G16B16F => planes![(
                Generic,
                1,
                1,
                1,
                1,
                0,
                false,
                MHW_GFX3DSTATE_SURFACEFORMAT_R16G16B16A16_FLOAT
            )],
            PlaneDefinition::R16G16Unorm => planes![(
                Generic,
                1,
                1,
                1,
                1,
                1,
                false,
                MHW_GFX3DSTATE_SURFACEFORMAT_R16G16_UNORM
            )],
            PlaneDefinition::R16Float => {
                planes![(Generic, 1, 1, 1, 1, 1, false, MHW_GFX3DSTATE_SURFACEFORMAT_R16_FLOAT)]
            }
            PlaneDefinition::Yuy2TwoPlanes => planes![
                (Y, 1, 1, 2, 2, 2, false, MHW_GFX3DSTATE_SURFACEFORMAT_R8G8_UNORM),
                (U, 2, 1, 2, 2, 1, false, MHW_GFX3DSTATE_SURFACEFORMAT_R8G8B8A8_UNORM),
            ],
            PlaneDefinition::Y210Adv => planes![
                (Y, 1, 1, 1, 1, 1, true, MHW_MEDIASTATE_SURFACEFORMAT_R16B16_UNORM),
                (U, 2, 1, 1, 1, 0, false, MHW_GFX3DSTATE_SURFACEFORMAT_R16G16B16A16_UNORM),
            ],
            PlaneDefinition::Y210RenderTarget => planes![(
                Generic,
                2,
                1,
                1,
                1,
                1,
                false,
                MHW_GFX3DSTATE_SURFACEFORMAT_R8G8B8A8_UNORM
            )],
            PlaneDefinition::Y210 => planes![
                (Y, 1, 1, 1, 1, 1, false, MHW_GFX3DSTATE_SURFACEFORMAT_R16G16_UNORM),
                (U, 2, 1, 1, 1, 0, false, MHW_GFX3DSTATE_SURFACEFORMAT_R16G16B16A16_UNORM),
            ],
            PlaneDefinition::Y210OnePlaneAdv => planes![(
                Generic,
                1,
                1,
                1,
                1,
                1,
                true,
                MHW_MEDIASTATE_SURFACEFORMAT_R16B16_UNORM
            )],
            PlaneDefinition::R16G16Sint => {
                planes![(Generic, 1, 1, 1, 1, 1, false, MHW_GFX3DSTATE_SURFACEFORMAT_R16G16_SINT)]
            }
            PlaneDefinition::R24UnormX8Typeless => planes![(
                Generic,
                1,
                1,
                1,
                1,
                1,
                false,
                MHW_GFX3DSTATE_SURFACEFORMAT_R24_UNORM_X8_TYPELESS
            )],
            PlaneDefinition::R32FloatX8X24Typeless => planes![(
                Generic,
                1,
                1,
                1,
                1,
                0,
                false,
                MHW_GFX3DSTATE_SURFACEFORMAT_R32_FLOAT_X8X24_TYPELESS
            )],
            PlaneDefinition::P208 => planes![
                (Y, 1, 1, 1, 1, 4, false, MHW_GFX3DSTATE_SURFACEFORMAT_R8_UNORM),
                (U, 2, 1, 1, 1, 2, false, MHW_GFX3DSTATE_SURFACEFORMAT_R8G8_UNORM),
            ],
            PlaneDefinition::P208OnePlaneAdv => planes![(
                Generic,
                1,
                1,
                2,
                1,
                4,
                true,
                MHW_MEDIASTATE_SURFACEFORMAT_YCRCB_NORMAL
            )],
            PlaneDefinition::Y416RenderTarget => planes![(
                Generic,
                1,
                1,
                1,
                1,
                1,
                false,
                MHW_GFX3DSTATE_SURFACEFORMAT_R8G8B8A8_UNORM
            )],
            PlaneDefinition::R32G32B32A32F => planes![(
                Generic,
                1,
                1,
                1,
                1,
                0,
                false,
                MHW_GFX3DSTATE_SURFACEFORMAT_R32G32B32A32_FLOAT
            )],
            PlaneDefinition::Y8Adv => {
                planes![(Generic, 1, 1, 1, 1, 4, true, MHW_MEDIASTATE_SURFACEFORMAT_Y8_UNORM)]
            }
        }
    }
}

/// Number of chroma pixels one dataport sample (a dword) carries for `format`.
pub fn get_pixels_per_sample(format: MosFormat) -> u32 {
    if format.is_three_plane() || format.is_three_plane_rgb() {
        4
    } else if format.is_two_plane() || format == MosFormat::Planar400 {
        2
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use crate::*;
    use mhw::*;

    #[test]
    fn test_plane_counts() {
        assert_eq!(PlaneDefinition::Pl3.plane_count(), 3);
        assert_eq!(PlaneDefinition::Nv12.plane_count(), 1);
        assert_eq!(PlaneDefinition::Nv12TwoPlanes.plane_count(), 2);
        assert_eq!(PlaneDefinition::P010OnePlaneAdv.plane_count(), 1);
        assert_eq!(PlaneDefinition::Y210.plane_count(), 2);
        assert_eq!(PlaneDefinition::RgbpAdv.plane_count(), 3);
    }

    #[test]
    fn test_plane_rows() {
        let nv12 = PlaneDefinition::Nv12TwoPlanes.planes();
        assert_eq!(nv12[0].plane_id, PlaneId::Y);
        assert_eq!(nv12[1].plane_id, PlaneId::U);
        assert_eq!((nv12[1].scale_width, nv12[1].scale_height), (2, 2));
        assert_eq!(nv12[1].format, MHW_GFX3DSTATE_SURFACEFORMAT_R8G8_UNORM);

        let rgbp = PlaneDefinition::RgbpAdv.planes();
        assert_eq!(rgbp[0].plane_id, PlaneId::U);
        assert_eq!(rgbp[0].format, MHW_MEDIASTATE_SURFACEFORMAT_Y8_UNORM);
        assert!(rgbp.iter().all(|p| p.advanced));

        assert_eq!(PlaneDefinition::A16B16G16R16.planes()[0].pixels_per_dword, 0);
        assert_eq!(PlaneDefinition::Y1.planes()[0].format, 16);
    }

    #[test]
    fn test_pixels_per_sample() {
        assert_eq!(get_pixels_per_sample(MosFormat::Yv12), 4);
        assert_eq!(get_pixels_per_sample(MosFormat::Rgbp), 4);
        assert_eq!(get_pixels_per_sample(MosFormat::Nv12), 2);
        assert_eq!(get_pixels_per_sample(MosFormat::Planar400), 2);
        assert_eq!(get_pixels_per_sample(MosFormat::A8R8G8B8), 1);
    }
}
