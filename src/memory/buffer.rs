//! Buffer-backed address space for running the monitor hosted.

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

use alloc::vec;
use alloc::vec::Vec;

use crate::memory::AddressSpace;
use crate::{Error, Result};

/// A window of big-endian memory starting at `base`.
///
/// Accesses that fall wholly or partly outside the window fail with
/// [`Error::Unmapped`] carrying the requested address.  Alignment is not
/// checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferSpace {
    base: u32,
    bytes: Vec<u8>,
}

impl BufferSpace {
    /// Zero-filled window of `size` bytes
    pub fn new(base: u32, size: usize) -> Self {
        Self::from_bytes(base, vec![0; size])
    }

    pub fn from_bytes(base: u32, bytes: Vec<u8>) -> Self {
        Self { base, bytes }
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// The `len` bytes at `addr`
    pub fn slice(&self, addr: u32, len: usize) -> Result<&[u8]> {
        let range = self.range(addr, len)?;
        Ok(&self.bytes[range])
    }

    fn range(&self, addr: u32, len: usize) -> Result<core::ops::Range<usize>> {
        let offset = addr.wrapping_sub(self.base) as usize;
        match offset.checked_add(len) {
            Some(end) if end <= self.bytes.len() => Ok(offset..end),
            _ => Err(Error::Unmapped(addr)),
        }
    }

    fn load<const N: usize>(&self, addr: u32) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.slice(addr, N)?);
        Ok(out)
    }

    fn store(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        let range = self.range(addr, data.len())?;
        self.bytes[range].copy_from_slice(data);
        Ok(())
    }
}

impl AddressSpace for BufferSpace {
    fn read_u8(&mut self, addr: u32) -> Result<u8> {
        self.load::<1>(addr).map(|b| b[0])
    }

    fn read_u16(&mut self, addr: u32) -> Result<u16> {
        self.load(addr).map(u16::from_be_bytes)
    }

    fn read_u32(&mut self, addr: u32) -> Result<u32> {
        self.load(addr).map(u32::from_be_bytes)
    }

    fn write_u8(&mut self, addr: u32, value: u8) -> Result<()> {
        self.store(addr, &[value])
    }

    fn write_u16(&mut self, addr: u32, value: u16) -> Result<()> {
        self.store(addr, &value.to_be_bytes())
    }

    fn write_u32(&mut self, addr: u32, value: u32) -> Result<()> {
        self.store(addr, &value.to_be_bytes())
    }
}
