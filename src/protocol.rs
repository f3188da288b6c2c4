//! Wire enumerations shared by the monitor and the host client.
//!
//! Command and response values share one byte space without overlapping; each
//! response sits just after the command it answers.  They must not change
//! within a deployment.

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

use crate::ProtocolError;

/// Commands sent by the host
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Ping = 0x01,
    LoadCode = 0x03,
    Execute = 0x05,
    Jump = 0x06,
    ReadMem = 0x08,
    WriteMem = 0x0A,
    ReadBlock = 0x0C,
}

impl Command {
    /// Decode a command byte.  Returns `None` for anything unrecognised,
    /// which the monitor silently drops.
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Command::Ping),
            0x03 => Some(Command::LoadCode),
            0x05 => Some(Command::Execute),
            0x06 => Some(Command::Jump),
            0x08 => Some(Command::ReadMem),
            0x0A => Some(Command::WriteMem),
            0x0C => Some(Command::ReadBlock),
            _ => None,
        }
    }
}

/// Responses sent by the monitor
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Pong = 0x02,
    CodeLoaded = 0x04,
    Running = 0x07,
    ReadMemAck = 0x09,
    WriteMemAck = 0x0B,
    /// Reserved.  The monitor acknowledges `ReadBlock` with `ReadMemAck`.
    ReadBlockAck = 0x0D,
}

impl Response {
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x02 => Some(Response::Pong),
            0x04 => Some(Response::CodeLoaded),
            0x07 => Some(Response::Running),
            0x09 => Some(Response::ReadMemAck),
            0x0B => Some(Response::WriteMemAck),
            0x0D => Some(Response::ReadBlockAck),
            _ => None,
        }
    }
}

/// Size of a single memory access element
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    Byte = 1,
    Word = 2,
    Long = 4,
}

impl Width {
    /// Number of bytes per element
    pub const fn bytes(self) -> u32 {
        self as u32
    }

    /// Number of elements that fit in one transmit FIFO fill
    pub const fn burst(self) -> u32 {
        crate::transport::TX_FIFO_DEPTH / self.bytes()
    }
}

impl TryFrom<u8> for Width {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Width::Byte),
            2 => Ok(Width::Word),
            4 => Ok(Width::Long),
            other => Err(ProtocolError::UnsupportedWidth(other)),
        }
    }
}
