//! Host side driver for the monitor protocol.
//!
//! The monitor itself never times out and never retries.  The host does
//! both: every wait for a response is bounded by a number of link read
//! timeouts taken from [`crate::config::ClientConfig`].
//!
//! The host also checks the things the monitor does not:
//! - load and execute addresses must be word aligned
//! - transfers must not run past the end of the 32 bit address space
//!
//! See [`AsyncMonitorClient`] for the async client.

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

#![cfg_attr(not(feature = "async"), allow(dead_code))]

#[cfg(feature = "async")]
pub mod futures;

#[cfg(feature = "async")]
pub use futures::{AsyncLink, AsyncMonitorClient};

use crate::protocol::Width;
use crate::{Error, Result};

// Helper functions

/// Code must start on a word boundary on a 68k.
fn check_word_aligned(addr: u32) -> Result<()> {
    if addr & 1 != 0 {
        Err(Error::Misaligned(addr))
    } else {
        Ok(())
    }
}

/// `len` bytes from `addr` must stay within the 32 bit address space.
fn check_span(addr: u32, len: u64) -> Result<()> {
    if addr as u64 + len > 1 << 32 {
        Err(Error::AddressOverflow)
    } else {
        Ok(())
    }
}

/// `len` must also fit the 32 bit length/count fields.
fn check_len(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::AddressOverflow)
}

/// Zero bytes to prepend so `len` becomes a whole number of elements.
fn padding(len: usize, width: Width) -> usize {
    let width = width.bytes() as usize;
    (width - len % width) % width
}
