//! Blocking transport primitives over a single serial channel.
//!
//! These are the only suspension points in the monitor.  Every call is a
//! busy-wait on a hardware status condition with no timeout: a silent host
//! stalls the monitor until the board is reset.
//!
//! - [`Transport`] is what the monitor consumes
//! - [`Uart`] implements it over any [`SerialPort`], i.e. a UART's line
//!   status, receive and transmit registers
//! - [`QueueTransport`] (`alloc`) implements it over in-memory queues for
//!   hosted tests

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

#[cfg(feature = "alloc")]
pub mod queue;
pub mod uart;

#[cfg(feature = "alloc")]
pub use queue::QueueTransport;
pub use uart::{MmioPort, SerialPort, Uart};

use bitflags::bitflags;

use crate::Result;
use crate::protocol::Width;

/// Depth of the UART transmit FIFO in bytes
pub const TX_FIFO_DEPTH: u32 = 16;

bitflags! {
    /// Line status register, 16C552 layout
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LineStatus: u8 {
        /// At least one byte is waiting in the receive FIFO
        const DATA_READY = 1 << 0;
        const OVERRUN = 1 << 1;
        const PARITY = 1 << 2;
        const FRAMING = 1 << 3;
        const BREAK = 1 << 4;
        /// Transmit FIFO is empty
        const THR_EMPTY = 1 << 5;
        /// Transmit FIFO and shift register are both empty
        const TX_IDLE = 1 << 6;
        /// At least one error in the receive FIFO
        const FIFO_ERROR = 1 << 7;
    }
}

impl LineStatus {
    /// Receive error conditions
    pub const ERRORS: Self = Self::OVERRUN
        .union(Self::PARITY)
        .union(Self::FRAMING)
        .union(Self::BREAK);

    pub fn errors(self) -> Self {
        self.intersection(Self::ERRORS)
    }
}

/// Blocking byte transport.
///
/// Implementations block until the hardware is ready.  There is no buffering
/// and no partial-read recovery, so a byte dropped on the wire desynchronises
/// the protocol until reset.
pub trait Transport {
    /// Block until a byte has been received, and return it
    fn recv_byte(&mut self) -> Result<u8>;

    /// Write a byte to the transmitter without waiting.  The caller must know
    /// there is room, i.e. it has waited for [`Self::wait_tx_empty()`] and
    /// queued fewer than [`TX_FIFO_DEPTH`] bytes since.
    fn put_byte(&mut self, byte: u8) -> Result<()>;

    /// Block until the transmit FIFO is empty
    fn wait_tx_empty(&mut self) -> Result<()>;

    /// Block until the last byte has left the shift register.  Stronger than
    /// [`Self::wait_tx_empty()`]: the host has the byte once this returns.
    fn wait_tx_idle(&mut self) -> Result<()>;

    /// Turn receive line-error checking on or off.  Transports with no line
    /// status to check ignore this.
    fn set_line_error_checks(&mut self, _check: bool) {}

    /// Block until the transmitter is empty, then send one byte
    fn send_byte(&mut self, byte: u8) -> Result<()> {
        self.wait_tx_empty()?;
        self.put_byte(byte)
    }

    /// Receive a big-endian 16 bit value
    fn recv_word(&mut self) -> Result<u16> {
        Ok(recv_be(self, 2)? as u16)
    }

    /// Receive a big-endian 32 bit value
    fn recv_long(&mut self) -> Result<u32> {
        recv_be(self, 4)
    }

    /// Receive a big-endian value of the given width
    fn recv_value(&mut self, width: Width) -> Result<u32> {
        recv_be(self, width.bytes())
    }

    /// Queue a big-endian value of the given width without waiting.  Same
    /// room requirement as [`Self::put_byte()`].
    fn put_value(&mut self, value: u32, width: Width) -> Result<()> {
        let bytes = value.to_be_bytes();
        for byte in &bytes[4 - width.bytes() as usize..] {
            self.put_byte(*byte)?;
        }
        Ok(())
    }

    /// Send a big-endian 16 bit value, one blocking send per byte
    fn send_word(&mut self, value: u16) -> Result<()> {
        for byte in value.to_be_bytes() {
            self.send_byte(byte)?;
        }
        Ok(())
    }

    /// Send a big-endian 32 bit value, one blocking send per byte
    fn send_long(&mut self, value: u32) -> Result<()> {
        for byte in value.to_be_bytes() {
            self.send_byte(byte)?;
        }
        Ok(())
    }
}

// First byte received is the most significant.
fn recv_be<T: Transport + ?Sized>(transport: &mut T, bytes: u32) -> Result<u32> {
    let mut value = 0u32;
    for _ in 0..bytes {
        value = (value << 8) | transport.recv_byte()? as u32;
    }
    Ok(value)
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn recv_byte(&mut self) -> Result<u8> {
        (**self).recv_byte()
    }

    fn put_byte(&mut self, byte: u8) -> Result<()> {
        (**self).put_byte(byte)
    }

    fn wait_tx_empty(&mut self) -> Result<()> {
        (**self).wait_tx_empty()
    }

    fn wait_tx_idle(&mut self) -> Result<()> {
        (**self).wait_tx_idle()
    }

    fn set_line_error_checks(&mut self, check: bool) {
        (**self).set_line_error_checks(check)
    }
}
