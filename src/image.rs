//! Checksummed ROM images.
//!
//! Combines an application binary and a devicetree blob into a single image
//! ready for programming, laid out as:
//!
//! ```text
//! top:    checksum (long)
//!         devicetree area, blob at its start, 0xFF fill
//!         0xFF fill
//! 0:      application binary
//! ```
//!
//! The checksum is chosen so the big-endian long sum of the whole image is
//! zero, which boot code can check cheaply before trusting the ROM.

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

use alloc::vec;
use alloc::vec::Vec;
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

use crate::{Error, Result};

const KIB: usize = 1024;
const FILL: u8 = 0xFF;

/// Sizes of the image and its devicetree area, in KiB
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RomLayout {
    pub rom_kib: u32,
    /// Includes the checksum.  A multiple of 2, and at least 8.
    pub devtree_kib: u32,
}

impl RomLayout {
    pub const fn new(rom_kib: u32, devtree_kib: u32) -> Self {
        Self {
            rom_kib,
            devtree_kib,
        }
    }

    fn check(&self) -> Result<()> {
        if self.devtree_kib % 2 != 0 || self.devtree_kib < 8 || self.devtree_kib >= self.rom_kib {
            warn!("Bad ROM layout {self:?}");
            return Err(Error::InvalidImage);
        }
        Ok(())
    }

    fn rom_len(&self) -> usize {
        self.rom_kib as usize * KIB
    }

    fn devtree_offset(&self) -> usize {
        (self.rom_kib - self.devtree_kib) as usize * KIB
    }
}

impl Default for RomLayout {
    fn default() -> Self {
        Self::new(512, 8)
    }
}

/// Build a programming image from `app` and the devicetree `blob`.
pub fn build_rom_image(app: &[u8], blob: &[u8], layout: RomLayout) -> Result<Vec<u8>> {
    layout.check()?;

    let len = layout.rom_len();
    let devtree = layout.devtree_offset();
    if app.len() > devtree {
        warn!("Application ({} bytes) overlaps devicetree area", app.len());
        return Err(Error::InvalidImage);
    }
    if blob.len() > len - devtree - 4 {
        warn!("Devicetree blob ({} bytes) too big", blob.len());
        return Err(Error::InvalidImage);
    }

    let mut image = vec![FILL; len];
    image[..app.len()].copy_from_slice(app);
    image[devtree..devtree + blob.len()].copy_from_slice(blob);

    let checksum = 0u32.wrapping_sub(long_sum(&image[..len - 4]));
    image[len - 4..].copy_from_slice(&checksum.to_be_bytes());
    debug!("ROM image {len} bytes, checksum {checksum:08X}");

    Ok(image)
}

/// Whether `image` is a whole number of longs summing to zero.
pub fn verify_rom_image(image: &[u8]) -> bool {
    image.len() % 4 == 0 && long_sum(image) == 0
}

fn long_sum(data: &[u8]) -> u32 {
    data.chunks_exact(4)
        .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
        .fold(0, u32::wrapping_add)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: RomLayout = RomLayout::new(16, 8);

    #[test]
    fn layout_and_checksum() {
        let image = build_rom_image(&[0x4E, 0x71, 0x4E, 0x75], b"dtb", SMALL).unwrap();
        assert_eq!(image.len(), 16 * 1024);
        assert_eq!(&image[..4], [0x4E, 0x71, 0x4E, 0x75]);
        assert!(image[4..8 * 1024].iter().all(|&b| b == 0xFF));
        assert_eq!(&image[8 * 1024..8 * 1024 + 3], b"dtb");
        assert_eq!(image[8 * 1024 + 3], 0xFF);
        assert!(verify_rom_image(&image));
    }

    #[test]
    fn corruption_is_detected() {
        let mut image = build_rom_image(&[1, 2, 3], &[], SMALL).unwrap();
        image[100] ^= 0x01;
        assert!(!verify_rom_image(&image));
        assert!(!verify_rom_image(&image[..7]));
    }

    #[test]
    fn bad_layouts() {
        for layout in [
            RomLayout::new(16, 6),
            RomLayout::new(16, 9),
            RomLayout::new(8, 8),
        ] {
            assert_eq!(build_rom_image(&[], &[], layout), Err(Error::InvalidImage));
        }
    }

    #[test]
    fn oversized_inputs() {
        let app = [0u8; 8 * 1024 + 1];
        assert_eq!(build_rom_image(&app, &[], SMALL), Err(Error::InvalidImage));
        let blob = [0u8; 8 * 1024 - 3];
        assert_eq!(build_rom_image(&[], &blob, SMALL), Err(Error::InvalidImage));
        let blob = [0u8; 8 * 1024 - 4];
        assert!(build_rom_image(&[], &blob, SMALL).is_ok());
    }

    #[test]
    fn default_layout() {
        let image = build_rom_image(&[0xAB; 1000], &[0xCD; 100], RomLayout::default()).unwrap();
        assert_eq!(image.len(), 512 * 1024);
        assert!(verify_rom_image(&image));
    }
}
