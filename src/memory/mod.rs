//! Memory access engine.
//!
//! Typed byte/word/long access to an [`AddressSpace`], streamed to or from a
//! [`Transport`].  Addresses are trusted completely: nothing here checks
//! bounds, alignment or permissions.  That is what a hardware debug monitor
//! is for.
//!
//! Elements of width 2 or 4 travel big-endian on the wire, most significant
//! byte first, in both directions.
//!
//! Backings:
//! - [`RawMemory`] - the target's own bus, through volatile pointer access
//! - [`BufferSpace`] (`alloc`) - a byte buffer mapped at a base address, for
//!   hosted tests

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

#[cfg(feature = "alloc")]
pub mod buffer;
pub mod raw;

#[cfg(feature = "alloc")]
pub use buffer::BufferSpace;
pub use raw::RawMemory;

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

use crate::Result;
use crate::protocol::Width;
use crate::transport::Transport;

/// An addressable byte space.
///
/// Multi-byte accesses use the target's native byte order, which on a 68k is
/// big-endian.
pub trait AddressSpace {
    fn read_u8(&mut self, addr: u32) -> Result<u8>;

    fn read_u16(&mut self, addr: u32) -> Result<u16>;

    fn read_u32(&mut self, addr: u32) -> Result<u32>;

    fn write_u8(&mut self, addr: u32, value: u8) -> Result<()>;

    fn write_u16(&mut self, addr: u32, value: u16) -> Result<()>;

    fn write_u32(&mut self, addr: u32, value: u32) -> Result<()>;

    /// Read one element of `width`, widened to 32 bits
    fn read(&mut self, addr: u32, width: Width) -> Result<u32> {
        match width {
            Width::Byte => self.read_u8(addr).map(u32::from),
            Width::Word => self.read_u16(addr).map(u32::from),
            Width::Long => self.read_u32(addr),
        }
    }

    /// Write the low `width` bytes of `value`
    fn write(&mut self, addr: u32, width: Width, value: u32) -> Result<()> {
        match width {
            Width::Byte => self.write_u8(addr, value as u8),
            Width::Word => self.write_u16(addr, value as u16),
            Width::Long => self.write_u32(addr, value),
        }
    }
}

impl<M: AddressSpace + ?Sized> AddressSpace for &mut M {
    fn read_u8(&mut self, addr: u32) -> Result<u8> {
        (**self).read_u8(addr)
    }

    fn read_u16(&mut self, addr: u32) -> Result<u16> {
        (**self).read_u16(addr)
    }

    fn read_u32(&mut self, addr: u32) -> Result<u32> {
        (**self).read_u32(addr)
    }

    fn write_u8(&mut self, addr: u32, value: u8) -> Result<()> {
        (**self).write_u8(addr, value)
    }

    fn write_u16(&mut self, addr: u32, value: u16) -> Result<()> {
        (**self).write_u16(addr, value)
    }

    fn write_u32(&mut self, addr: u32, value: u32) -> Result<()> {
        (**self).write_u32(addr, value)
    }
}

/// How the address moves between elements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stride {
    /// Advance by the element width, walking memory
    Advance,
    /// Stay put, e.g. to drain a hardware FIFO
    Fixed,
}

/// A run of `count` elements of `width` starting at `address`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    pub address: u32,
    pub width: Width,
    pub count: u32,
}

impl Access {
    pub const fn new(address: u32, width: Width, count: u32) -> Self {
        Self {
            address,
            width,
            count,
        }
    }

    /// Address of each element in turn.  Wraps at the top of the 32 bit
    /// address space.
    pub fn addresses(&self, stride: Stride) -> impl Iterator<Item = u32> + use<> {
        let base = self.address;
        let step = match stride {
            Stride::Advance => self.width.bytes(),
            Stride::Fixed => 0,
        };
        (0..self.count).map(move |i| base.wrapping_add(i.wrapping_mul(step)))
    }

    /// Total number of bytes on the wire
    pub const fn wire_len(&self) -> u64 {
        self.count as u64 * self.width.bytes() as u64
    }
}

/// Stream `access` from memory to the transport, walking memory.
///
/// With `burst` set, waits once for an empty transmit FIFO and then queues up
/// to a FIFO's worth of elements (16 bytes, 8 words or 4 longs) before
/// waiting again.  Otherwise waits before every element.  Both are valid
/// schedules of a blocking transmitter, and the bytes sent are identical.
pub fn read<M, T>(memory: &mut M, transport: &mut T, access: Access, burst: bool) -> Result<()>
where
    M: AddressSpace + ?Sized,
    T: Transport + ?Sized,
{
    stream_out(memory, transport, access, Stride::Advance, burst)
}

/// As [`read()`], but re-reads the same address for every element.
pub fn read_fixed<M, T>(
    memory: &mut M,
    transport: &mut T,
    access: Access,
    burst: bool,
) -> Result<()>
where
    M: AddressSpace + ?Sized,
    T: Transport + ?Sized,
{
    stream_out(memory, transport, access, Stride::Fixed, burst)
}

/// Receive `access.count` elements from the transport and store them,
/// walking memory.
pub fn write<M, T>(memory: &mut M, transport: &mut T, access: Access) -> Result<()>
where
    M: AddressSpace + ?Sized,
    T: Transport + ?Sized,
{
    trace!(
        "Writing {} x {:?} at {:#010X}",
        access.count, access.width, access.address
    );
    for addr in access.addresses(Stride::Advance) {
        let value = transport.recv_value(access.width)?;
        memory.write(addr, access.width, value)?;
    }
    Ok(())
}

fn stream_out<M, T>(
    memory: &mut M,
    transport: &mut T,
    access: Access,
    stride: Stride,
    burst: bool,
) -> Result<()>
where
    M: AddressSpace + ?Sized,
    T: Transport + ?Sized,
{
    trace!(
        "Reading {} x {:?} at {:#010X} ({stride:?})",
        access.count, access.width, access.address
    );

    let per_wait = if burst { access.width.burst() } else { 1 };
    let mut queued = 0;
    for addr in access.addresses(stride) {
        if queued == 0 {
            transport.wait_tx_empty()?;
        }
        let value = memory.read(addr, access.width)?;
        transport.put_value(value, access.width)?;
        queued = (queued + 1) % per_wait;
    }
    Ok(())
}

#[cfg(all(test, feature = "alloc"))]
mod tests {
    use super::*;
    use crate::transport::QueueTransport;
    use std::vec::Vec;

    /// A single hardware register that yields the next value on every read.
    struct CountingRegister {
        addr: u32,
        next: u32,
    }

    impl AddressSpace for CountingRegister {
        fn read_u8(&mut self, addr: u32) -> Result<u8> {
            self.read_u32(addr).map(|v| v as u8)
        }

        fn read_u16(&mut self, addr: u32) -> Result<u16> {
            self.read_u32(addr).map(|v| v as u16)
        }

        fn read_u32(&mut self, addr: u32) -> Result<u32> {
            if addr != self.addr {
                return Err(crate::Error::Unmapped(addr));
            }
            self.next += 1;
            Ok(self.next)
        }

        fn write_u8(&mut self, addr: u32, _value: u8) -> Result<()> {
            Err(crate::Error::Unmapped(addr))
        }

        fn write_u16(&mut self, addr: u32, _value: u16) -> Result<()> {
            Err(crate::Error::Unmapped(addr))
        }

        fn write_u32(&mut self, addr: u32, _value: u32) -> Result<()> {
            Err(crate::Error::Unmapped(addr))
        }
    }

    #[test]
    fn addresses_advance_by_width() {
        let access = Access::new(0x1000, Width::Word, 3);
        let addrs: Vec<u32> = access.addresses(Stride::Advance).collect();
        assert_eq!(addrs, [0x1000, 0x1002, 0x1004]);
        let fixed: Vec<u32> = access.addresses(Stride::Fixed).collect();
        assert_eq!(fixed, [0x1000, 0x1000, 0x1000]);
    }

    #[test]
    fn addresses_wrap_at_top_of_memory() {
        let access = Access::new(0xFFFF_FFFC, Width::Long, 2);
        let addrs: Vec<u32> = access.addresses(Stride::Advance).collect();
        assert_eq!(addrs, [0xFFFF_FFFC, 0x0000_0000]);
    }

    #[test]
    fn zero_count_sends_nothing() {
        let mut memory = BufferSpace::new(0, 16);
        let mut transport = QueueTransport::new();
        read(&mut memory, &mut transport, Access::new(0, Width::Long, 0), true).unwrap();
        assert!(transport.output().is_empty());
        assert_eq!(transport.tx_empty_waits(), 0);
    }

    #[test]
    fn bursts_wait_once_per_fifo_fill() {
        let mut memory = BufferSpace::new(0, 256);
        let mut transport = QueueTransport::new();

        read(&mut memory, &mut transport, Access::new(0, Width::Byte, 33), true).unwrap();
        assert_eq!(transport.tx_empty_waits(), 3);

        let mut transport = QueueTransport::new();
        read(&mut memory, &mut transport, Access::new(0, Width::Word, 8), true).unwrap();
        assert_eq!(transport.tx_empty_waits(), 1);

        let mut transport = QueueTransport::new();
        read(&mut memory, &mut transport, Access::new(0, Width::Long, 5), true).unwrap();
        assert_eq!(transport.tx_empty_waits(), 2);
        assert_eq!(transport.output().len(), 20);
    }

    #[test]
    fn unbatched_waits_per_element_with_same_bytes() {
        let mut memory = BufferSpace::from_bytes(0x40, (0u8..32).collect());

        let mut burst = QueueTransport::new();
        read(&mut memory, &mut burst, Access::new(0x40, Width::Word, 16), true).unwrap();
        let mut single = QueueTransport::new();
        read(&mut memory, &mut single, Access::new(0x40, Width::Word, 16), false).unwrap();

        assert_eq!(burst.output(), single.output());
        assert_eq!(burst.tx_empty_waits(), 2);
        assert_eq!(single.tx_empty_waits(), 16);
    }

    #[test]
    fn fixed_read_rereads_the_register() {
        let mut register = CountingRegister {
            addr: 0x00C2_0008,
            next: 0,
        };
        let mut transport = QueueTransport::new();
        read_fixed(
            &mut register,
            &mut transport,
            Access::new(0x00C2_0008, Width::Byte, 4),
            true,
        )
        .unwrap();
        assert_eq!(transport.output(), [1, 2, 3, 4]);
    }

    #[test]
    fn write_stores_big_endian_elements() {
        let mut memory = BufferSpace::new(0x2000, 8);
        let mut transport = QueueTransport::with_input(&[0x12, 0x34, 0x56, 0x78]);
        write(&mut memory, &mut transport, Access::new(0x2000, Width::Word, 2)).unwrap();
        assert_eq!(memory.read_u32(0x2000), Ok(0x1234_5678));
        assert_eq!(memory.read_u8(0x2001), Ok(0x34));
    }

    #[test]
    fn short_write_payload_would_block() {
        let mut memory = BufferSpace::new(0x2000, 8);
        let mut transport = QueueTransport::with_input(&[0x12, 0x34, 0x56]);
        assert_eq!(
            write(&mut memory, &mut transport, Access::new(0x2000, Width::Word, 2)),
            Err(crate::Error::WouldBlock)
        );
        // The first element landed before the stall.
        assert_eq!(memory.read_u16(0x2000), Ok(0x1234));
    }
}
