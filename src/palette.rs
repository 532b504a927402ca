// Copyright 2025 Google
// SPDX-License-Identifier: BSD-3-Clause

//! palette: Sampler palettes and chroma keys.

use log::error;
use log::warn;
use serde::Serialize;

use crate::renderhal_utils::*;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub enum PaletteState {
    #[default]
    Free,
    /// Claimed by `allocate_palette_id` but not filled yet.
    Reserved,
    Loaded(usize),
}

#[derive(Clone, Debug)]
pub struct Palette {
    pub state: PaletteState,
    pub data: Vec<u32>,
}

impl Palette {
    /// Entries to send to the hardware, empty unless the palette is loaded.
    pub fn loaded_entries(&self) -> &[u32] {
        match self.state {
            PaletteState::Loaded(count) => &self.data[..count],
            _ => &[],
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ChromaKey {
    pub low: u32,
    pub high: u32,
}

/// Sampler palettes and chroma keys used by the current dispatch.
pub struct PaletteTable {
    palettes: Vec<Palette>,
    chroma_keys: Vec<ChromaKey>,
    max_entries: usize,
    max_chroma_keys: usize,
}

impl Default for PaletteTable {
    fn default() -> PaletteTable {
        PaletteTable::new(
            RENDERHAL_PALETTE_COUNT,
            RENDERHAL_PALETTE_ENTRIES_MAX,
            RENDERHAL_CHROMA_KEY_COUNT,
        )
    }
}

impl PaletteTable {
    pub fn new(palettes: usize, max_entries: usize, max_chroma_keys: usize) -> PaletteTable {
        PaletteTable {
            palettes: (0..palettes)
                .map(|_| Palette {
                    state: PaletteState::Free,
                    data: vec![0; max_entries],
                })
                .collect(),
            chroma_keys: Vec::with_capacity(max_chroma_keys),
            max_entries,
            max_chroma_keys,
        }
    }

    pub fn max_palettes(&self) -> usize {
        self.palettes.len()
    }

    pub fn palettes(&self) -> &[Palette] {
        &self.palettes
    }

    pub fn chroma_keys(&self) -> &[ChromaKey] {
        &self.chroma_keys
    }

    fn palette_mut(&mut self, id: usize) -> RenderHalResult<&mut Palette> {
        self.palettes
            .get_mut(id)
            .ok_or(RenderHalError::InvalidPalette(id))
    }

    /// Forgets every chroma key and palette content for a new dispatch.
    pub fn reset_counts(&mut self) {
        self.chroma_keys.clear();
        for palette in &mut self.palettes {
            palette.state = PaletteState::Free;
        }
    }

    pub fn allocate_palette_id(&mut self) -> RenderHalResult<usize> {
        let Some(id) = self
            .palettes
            .iter()
            .position(|p| p.state == PaletteState::Free)
        else {
            error!("no free palette among {}", self.palettes.len());
            return Err(RenderHalError::PaletteExhausted);
        };

        self.palettes[id].state = PaletteState::Reserved;
        Ok(id)
    }

    /// Sets palette `id` to `entries` entries, truncated to the hardware maximum, and returns
    /// the entry storage to fill.
    pub fn get_palette_entry(&mut self, id: usize, entries: usize) -> RenderHalResult<&mut [u32]> {
        if entries == 0 {
            return Err(RenderHalError::InvalidParameter("palette without entries"));
        }

        let max_entries = self.max_entries;
        let palette = self.palette_mut(id)?;
        let count = if entries > max_entries {
            warn!("palette truncated from {} to {} entries", entries, max_entries);
            max_entries
        } else {
            entries
        };
        if let PaletteState::Loaded(_) = palette.state {
            error!("overwriting palette {}", id);
        }

        palette.state = PaletteState::Loaded(count);
        Ok(&mut palette.data[..count])
    }

    pub fn free_palette_id(&mut self, id: usize) -> RenderHalResult<()> {
        self.palette_mut(id)?.state = PaletteState::Free;
        Ok(())
    }

    /// Re-enables palette `id` with `entries` entries of its previous data. Zero disables it.
    pub fn enable_palette(&mut self, id: usize, entries: usize) -> RenderHalResult<()> {
        let max_entries = self.max_entries;
        let palette = self.palette_mut(id)?;
        palette.state = match entries.min(max_entries) {
            0 => PaletteState::Free,
            count => PaletteState::Loaded(count),
        };
        Ok(())
    }

    pub fn allocate_chroma_key(&mut self, low: u32, high: u32) -> RenderHalResult<usize> {
        if self.chroma_keys.len() >= self.max_chroma_keys {
            error!("all {} chroma keys in use", self.max_chroma_keys);
            return Err(RenderHalError::ChromaKeyExhausted);
        }

        self.chroma_keys.push(ChromaKey { low, high });
        Ok(self.chroma_keys.len() - 1)
    }
}

#[cfg(test)]
mod tests {
    use crate::*;

    #[test]
    fn test_palette_lifecycle() {
        let mut table = PaletteTable::default();
        assert_eq!(table.allocate_palette_id().unwrap(), 0);
        assert_eq!(table.allocate_palette_id().unwrap(), 1);
        assert!(matches!(
            table.allocate_palette_id(),
            Err(RenderHalError::PaletteExhausted)
        ));

        table.get_palette_entry(1, 3).unwrap().copy_from_slice(&[7, 8, 9]);
        assert_eq!(table.palettes()[1].loaded_entries(), &[7, 8, 9]);
        assert!(table.palettes()[0].loaded_entries().is_empty());

        table.free_palette_id(0).unwrap();
        assert_eq!(table.allocate_palette_id().unwrap(), 0);
        assert!(matches!(
            table.free_palette_id(2),
            Err(RenderHalError::InvalidPalette(2))
        ));
    }

    #[test]
    fn test_palette_truncation_and_enable() {
        let mut table = PaletteTable::default();
        let data = table.get_palette_entry(0, 1000).unwrap();
        assert_eq!(data.len(), RENDERHAL_PALETTE_ENTRIES_MAX);
        assert!(table.get_palette_entry(0, 0).is_err());

        table.enable_palette(1, 4).unwrap();
        assert_eq!(table.palettes()[1].state, PaletteState::Loaded(4));
        table.enable_palette(1, 0).unwrap();
        assert_eq!(table.palettes()[1].state, PaletteState::Free);
    }

    #[test]
    fn test_chroma_keys_bounded() {
        let mut table = PaletteTable::default();
        for i in 0..RENDERHAL_CHROMA_KEY_COUNT {
            assert_eq!(table.allocate_chroma_key(i as u32, 0xff).unwrap(), i);
        }
        assert!(matches!(
            table.allocate_chroma_key(0, 0),
            Err(RenderHalError::ChromaKeyExhausted)
        ));

        table.reset_counts();
        assert!(table.chroma_keys().is_empty());
        assert_eq!(table.allocate_chroma_key(1, 2).unwrap(), 0);
    }
}
