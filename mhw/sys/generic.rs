// Copyright 2025 Google
// SPDX-License-Identifier: MIT

use crate::mhw_defines::MhwError;
use crate::mhw_defines::MhwResult;

pub fn page_size() -> usize {
    4096
}

/// Arena memory backed by a zeroed heap allocation.
pub struct PlatformArena {
    data: Vec<u8>,
}

impl PlatformArena {
    pub fn new(size: usize) -> MhwResult<PlatformArena> {
        if size == 0 {
            return Err(MhwError::InvalidArgs);
        }

        Ok(PlatformArena {
            data: vec![0u8; size],
        })
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }
}
