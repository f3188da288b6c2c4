//! In-memory transport - used to run the monitor hosted, without hardware.

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use crate::transport::Transport;
use crate::{Error, Result};

/// [`Transport`] over a pair of in-memory queues.
///
/// Input is whatever the test pushes, output collects everything the monitor
/// sends.  Where a UART would block on an empty receiver this returns
/// [`Error::WouldBlock`], so a caller can tell "waiting for the host" apart
/// from any other outcome.  The transmitter is always ready, but waits on it
/// are counted.
#[derive(Debug, Default)]
pub struct QueueTransport {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
    tx_empty_waits: usize,
    tx_idle_waits: usize,
}

impl QueueTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(bytes: &[u8]) -> Self {
        let mut transport = Self::new();
        transport.push_input(bytes);
        transport
    }

    /// Queue bytes as if sent by the host
    pub fn push_input(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    /// Bytes not yet consumed by the monitor
    pub fn pending_input(&self) -> usize {
        self.rx.len()
    }

    /// Everything transmitted so far
    pub fn output(&self) -> &[u8] {
        &self.tx
    }

    /// Drain everything transmitted so far
    pub fn take_output(&mut self) -> Vec<u8> {
        core::mem::take(&mut self.tx)
    }

    /// Number of waits for an empty transmit FIFO
    pub fn tx_empty_waits(&self) -> usize {
        self.tx_empty_waits
    }

    /// Number of waits for an idle transmitter
    pub fn tx_idle_waits(&self) -> usize {
        self.tx_idle_waits
    }
}

impl Transport for QueueTransport {
    fn recv_byte(&mut self) -> Result<u8> {
        self.rx.pop_front().ok_or(Error::WouldBlock)
    }

    fn put_byte(&mut self, byte: u8) -> Result<()> {
        self.tx.push(byte);
        Ok(())
    }

    fn wait_tx_empty(&mut self) -> Result<()> {
        self.tx_empty_waits += 1;
        Ok(())
    }

    fn wait_tx_idle(&mut self) -> Result<()> {
        self.tx_idle_waits += 1;
        Ok(())
    }
}
