// Copyright 2025 Google
// SPDX-License-Identifier: MIT

mod arena;
mod encoder;
mod mhw_defines;
mod platform;
mod sys;
mod traits;

pub use mhw_defines::*;

pub use arena::SystemArena;
pub use arena::SystemArenaProvider;
pub use encoder::read_record;
pub use encoder::write_record;
pub use encoder::CommandIter;
pub use encoder::LinearCommandBuffer;
pub use encoder::MhwGpgpuWalkerParams;
pub use encoder::MhwIdEntryParams;
pub use encoder::MhwRenderInterface;
pub use encoder::MhwStateBaseAddressParams;
pub use encoder::MhwSurfaceStateParams;
pub use encoder::MhwVfeParams;
pub use encoder::MhwWalkerParams;
pub use platform::determine_generation;
pub use platform::GpuGeneration;
pub use platform::PlatformDescriptor;
pub use platform::RenderEngineCaps;
pub use platform::RenderStateSizes;
pub use platform::SlmEncoding;
pub use platform::SurfaceStateGeneration;
pub use traits::ArenaProvider;
pub use traits::CommandBuffer;
pub use traits::GpuContext;
pub use traits::StateHeapArena;
