//! Resident serial monitor for 68k boards, plus the host side that drives it.
//!
//! The monitor sits on the target and listens on a UART.  A host uses it to
//! check the board is alive, upload a binary image, branch into that image,
//! and peek or poke raw memory.  The byte stream is a trusted request/response
//! exchange: there is no framing, checksum, retry or authentication layer.
//!
//! `no_std`.  Heap-backed helpers need `alloc`, and the host client needs
//! `async`, which is on by default.
//!
//! ## Modules
//!
//! - [`protocol`] - Command and response bytes, and memory access widths
//! - [`transport`] - Blocking byte/word/long primitives over a serial channel
//! - [`memory`] - The addressable byte space and the memory access engine
//! - [`exec`] - Handing control to a loaded image, as a call or a jump
//! - [`monitor`] - The protocol state machine that runs on the target
//! - [`config`] - Monitor and client configuration
//! - [`client`] - Host side driver for the protocol
//! - [`image`] - Checksummed ROM image builder (`alloc`)
//! - [`hexdump`] - Hex dump formatting for data read from the target (`alloc`)
//!
//! ## Wire protocol
//!
//! All multi-byte integers are big-endian.  Every exchange starts with a
//! single command byte:
//!
//! | Command      | Parameters                       | Response                        |
//! |--------------|----------------------------------|---------------------------------|
//! | `Ping`       | -                                | `Pong`                          |
//! | `LoadCode`   | length (long), address (long), data | `CodeLoaded`                 |
//! | `Execute`    | address (long)                   | `Running`, then `jsr`           |
//! | `Jump`       | address (long)                   | `Running`, then `jmp`           |
//! | `ReadMem`    | width (byte), count (long), address (long) | `ReadMemAck`, data    |
//! | `WriteMem`   | width (byte), count (long), address (long), data | `WriteMemAck`   |
//! | `ReadBlock`  | width (byte), count (long), address (long) | `ReadMemAck`, data    |
//!
//! Unknown command bytes are dropped without a response.
//!
//! ## Target setup
//!
//! 1. Configure the UART (baud rate, 8N1, FIFOs) in board bring-up code
//! 2. Implement [`transport::SerialPort`] over the UART's status and data
//!    registers, and wrap it in a [`transport::Uart`]
//! 3. Create a [`monitor::Monitor`] with [`memory::RawMemory`] and
//!    `exec::M68kTransfer`, then call [`monitor::Monitor::run()`]
//!
//! ## Host setup
//!
//! Implement [`client::AsyncLink`] over the host serial port and use
//! [`client::AsyncMonitorClient`].

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

#![no_std]
#![cfg_attr(target_arch = "m68k", feature(asm_experimental_arch))]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod client;
pub mod config;
pub mod exec;
#[cfg(feature = "alloc")]
pub mod hexdump;
#[cfg(feature = "alloc")]
pub mod image;
pub mod memory;
pub mod monitor;
pub mod protocol;
pub mod transport;

use transport::LineStatus;

/// Violations of the wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// Access width byte was not 1, 2 or 4
    UnsupportedWidth(u8),
    /// The other side answered with a byte other than the one expected
    UnexpectedResponse { expected: u8, got: u8 },
}

/// Monitor and client errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Protocol violation, terminal to the current command only
    Protocol(ProtocolError),
    /// Receiver reported overrun, parity, framing or break
    TransportFault(LineStatus),
    /// An in-memory transport has nothing left to receive
    WouldBlock,
    /// Address is not backed by the address space
    Unmapped(u32),
    /// Address must be word aligned
    Misaligned(u32),
    /// Transfer would run past the end of the 32 bit address space
    AddressOverflow,
    /// Host gave up waiting for the target
    Timeout,
    /// Host link I/O failure
    Io,
    /// Image or layout does not fit
    InvalidImage,
}

impl Error {
    /// Whether the monitor can drop the current command and carry on.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Protocol(_) | Error::TransportFault(_))
    }
}

impl From<ProtocolError> for Error {
    fn from(err: ProtocolError) -> Self {
        Error::Protocol(err)
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Protocol(ProtocolError::UnsupportedWidth(width)) => {
                write!(f, "unsupported access width {width}")
            }
            Error::Protocol(ProtocolError::UnexpectedResponse { expected, got }) => {
                write!(f, "expected response {expected:#04X}, got {got:#04X}")
            }
            Error::TransportFault(status) => {
                write!(f, "transport fault, line status {:#04X}", status.bits())
            }
            Error::WouldBlock => write!(f, "receive would block"),
            Error::Unmapped(addr) => write!(f, "address {addr:#010X} is not mapped"),
            Error::Misaligned(addr) => write!(f, "address {addr:#010X} is not word aligned"),
            Error::AddressOverflow => write!(f, "transfer exceeds 32 bit address space"),
            Error::Timeout => write!(f, "timed out waiting for target"),
            Error::Io => write!(f, "link I/O error"),
            Error::InvalidImage => write!(f, "invalid image"),
        }
    }
}

impl core::error::Error for Error {}

/// Type to represent the result of a monitor or client operation
pub type Result<T> = core::result::Result<T, Error>;
