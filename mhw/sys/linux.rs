// Copyright 2025 Google
// SPDX-License-Identifier: MIT

use std::ffi::c_void;
use std::ptr::null_mut;

use log::error;
use rustix::mm::mmap_anonymous;
use rustix::mm::munmap;
use rustix::mm::MapFlags;
use rustix::mm::ProtFlags;

use crate::mhw_defines::MhwError;
use crate::mhw_defines::MhwResult;

pub fn page_size() -> usize {
    rustix::param::page_size()
}

/// Arena memory backed by an anonymous private mapping.
pub struct PlatformArena {
    addr: *mut c_void,
    size: usize,
}

impl PlatformArena {
    pub fn new(size: usize) -> MhwResult<PlatformArena> {
        if size == 0 {
            return Err(MhwError::InvalidArgs);
        }

        // SAFETY:
        // No fixed address is requested, so the kernel picks a fresh range that aliases nothing.
        let addr = unsafe {
            mmap_anonymous(
                null_mut(),
                size,
                ProtFlags::READ | ProtFlags::WRITE,
                MapFlags::PRIVATE,
            )
        }
        .map_err(|e| MhwError::IoError(e.into()))?;

        if addr.is_null() {
            return Err(MhwError::MapFailed);
        }

        Ok(PlatformArena { addr, size })
    }

    pub fn as_slice(&self) -> &[u8] {
        // SAFETY:
        // `addr` is a live mapping of `size` bytes owned by `self`.
        unsafe { std::slice::from_raw_parts(self.addr as *const u8, self.size) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY:
        // `addr` is a live mapping of `size` bytes owned by `self`, borrowed mutably.
        unsafe { std::slice::from_raw_parts_mut(self.addr as *mut u8, self.size) }
    }
}

impl Drop for PlatformArena {
    fn drop(&mut self) {
        // SAFETY:
        // The mapping was created in `new` and is unmapped exactly once.
        let result = unsafe { munmap(self.addr, self.size) };
        if let Err(e) = result {
            error!("failed to unmap arena of {} bytes: {}", self.size, e);
        }
    }
}
