//! Direct access to the target's address space.

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

use crate::Result;
use crate::memory::AddressSpace;

/// [`AddressSpace`] backed by the target's own bus.
///
/// Every access is a single volatile load or store of the requested width,
/// so reads of device registers and FIFOs happen exactly as asked.
#[derive(Clone, Copy)]
pub struct RawMemory;

impl RawMemory {
    /// Create a handle on the whole address space.
    ///
    /// # Safety
    ///
    /// Every address handed to this object is dereferenced as-is.  The caller
    /// (ultimately the host driving the monitor) must only name addresses that
    /// are mapped, and word or long accesses must be suitably aligned; on a
    /// 68000 a misaligned access raises an address error.  Writes may clobber
    /// the monitor itself.
    pub const unsafe fn new() -> Self {
        Self
    }
}

impl AddressSpace for RawMemory {
    fn read_u8(&mut self, addr: u32) -> Result<u8> {
        Ok(unsafe { core::ptr::read_volatile(addr as usize as *const u8) })
    }

    fn read_u16(&mut self, addr: u32) -> Result<u16> {
        Ok(unsafe { core::ptr::read_volatile(addr as usize as *const u16) })
    }

    fn read_u32(&mut self, addr: u32) -> Result<u32> {
        Ok(unsafe { core::ptr::read_volatile(addr as usize as *const u32) })
    }

    fn write_u8(&mut self, addr: u32, value: u8) -> Result<()> {
        unsafe { core::ptr::write_volatile(addr as usize as *mut u8, value) };
        Ok(())
    }

    fn write_u16(&mut self, addr: u32, value: u16) -> Result<()> {
        unsafe { core::ptr::write_volatile(addr as usize as *mut u16, value) };
        Ok(())
    }

    fn write_u32(&mut self, addr: u32, value: u32) -> Result<()> {
        unsafe { core::ptr::write_volatile(addr as usize as *mut u32, value) };
        Ok(())
    }
}
