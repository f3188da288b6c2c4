//! UART-backed transport - used by the monitor on the target.

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

use crate::transport::{LineStatus, Transport};
use crate::{Error, Result};

/// Raw register access to a single UART channel.
///
/// Baud rate, data format and FIFO setup are done by board bring-up code
/// before the monitor starts.  This trait only exposes the registers the
/// blocking primitives poll.
pub trait SerialPort {
    /// Read the line status register
    fn line_status(&mut self) -> LineStatus;

    /// Read the receive buffer register
    fn read_data(&mut self) -> u8;

    /// Write the transmit holding register
    fn write_data(&mut self, byte: u8);
}

/// Busy-waiting [`Transport`] over a [`SerialPort`].
pub struct Uart<P: SerialPort> {
    port: P,
    check_line_errors: bool,
}

impl<P: SerialPort> Uart<P> {
    pub const fn new(port: P) -> Self {
        Self {
            port,
            check_line_errors: false,
        }
    }

    /// Fail received bytes that arrive with overrun, parity, framing or break
    /// conditions set.  Off by default: the original firmware never looks.
    pub const fn with_line_error_checks(mut self, check: bool) -> Self {
        self.check_line_errors = check;
        self
    }

    pub fn port(&mut self) -> &mut P {
        &mut self.port
    }

    pub fn into_port(self) -> P {
        self.port
    }

    fn wait_for(&mut self, condition: LineStatus) -> LineStatus {
        loop {
            let status = self.port.line_status();
            if status.contains(condition) {
                return status;
            }
            core::hint::spin_loop();
        }
    }
}

impl<P: SerialPort> Transport for Uart<P> {
    fn recv_byte(&mut self) -> Result<u8> {
        let status = self.wait_for(LineStatus::DATA_READY);

        // The byte is consumed either way so the FIFO keeps moving.
        let byte = self.port.read_data();
        if self.check_line_errors && !status.errors().is_empty() {
            warn!("Receive error, line status {:#04X}", status.bits());
            return Err(Error::TransportFault(status.errors()));
        }

        Ok(byte)
    }

    fn put_byte(&mut self, byte: u8) -> Result<()> {
        self.port.write_data(byte);
        Ok(())
    }

    fn wait_tx_empty(&mut self) -> Result<()> {
        self.wait_for(LineStatus::THR_EMPTY);
        Ok(())
    }

    fn wait_tx_idle(&mut self) -> Result<()> {
        self.wait_for(LineStatus::TX_IDLE);
        Ok(())
    }

    fn set_line_error_checks(&mut self, check: bool) {
        self.check_line_errors = check;
    }
}

/// Memory-mapped 16C552-style UART channel.
///
/// Registers are byte wide and byte spaced: receive buffer and transmit
/// holding share offset 0, line status is at offset 5.
#[derive(Clone, Copy)]
pub struct MmioPort {
    base: u32,
}

impl MmioPort {
    const DATA_REG: u32 = 0x0;
    const LSR_REG: u32 = 0x5;

    /// Create a port for the UART channel whose registers start at `base`.
    ///
    /// # Safety
    ///
    /// `base` must be the register base of a configured UART channel.  Every
    /// access through this port is a volatile read or write at that location.
    pub const unsafe fn new(base: u32) -> Self {
        Self { base }
    }
}

impl SerialPort for MmioPort {
    fn line_status(&mut self) -> LineStatus {
        let bits = unsafe { core::ptr::read_volatile((self.base + Self::LSR_REG) as *const u8) };
        LineStatus::from_bits_retain(bits)
    }

    fn read_data(&mut self) -> u8 {
        unsafe { core::ptr::read_volatile((self.base + Self::DATA_REG) as *const u8) }
    }

    fn write_data(&mut self, byte: u8) {
        unsafe { core::ptr::write_volatile((self.base + Self::DATA_REG) as *mut u8, byte) };
    }
}
