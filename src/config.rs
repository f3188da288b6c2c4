//! Configuration for the monitor and the host client.

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

/// Monitor configuration.
///
/// The defaults reproduce the original board firmware: line errors are never
/// checked, and reads are transmitted in FIFO-sized bursts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Check the line status register for overrun, parity, framing and break
    /// conditions on every received byte, failing the current command with
    /// [`crate::Error::TransportFault`].  Applied to the transport when the
    /// monitor is created, overriding any setting made on it directly.
    pub check_line_errors: bool,

    /// Wait for an empty transmit FIFO once per burst of up to 16 bytes,
    /// rather than once per element.
    pub burst_tx: bool,
}

impl MonitorConfig {
    // Const so a target can hold the config in a static.
    pub const fn new() -> Self {
        Self {
            check_line_errors: false,
            burst_tx: true,
        }
    }

    pub const fn with_line_error_checks(mut self, check: bool) -> Self {
        self.check_line_errors = check;
        self
    }

    pub const fn with_burst_tx(mut self, burst: bool) -> Self {
        self.burst_tx = burst;
        self
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Host client configuration.
///
/// Each count is the number of link read timeouts tolerated while waiting
/// for a particular response before giving up with [`crate::Error::Timeout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    /// Pings sent while waiting for the monitor to come up
    pub retries: u32,
    /// Timeouts tolerated waiting for an ack or for read data
    pub ack_retries: u32,
    /// Timeouts tolerated waiting for `Running` after execute or jump
    pub exec_retries: u32,
}

impl ClientConfig {
    pub const fn new() -> Self {
        Self {
            retries: 10,
            ack_retries: 10,
            exec_retries: 2,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}
