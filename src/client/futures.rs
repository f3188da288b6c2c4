//! Asynchronous Client - typically used by a Host.

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

use alloc::boxed::Box;
use alloc::vec::Vec;
use async_trait::async_trait;
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

use crate::client::{check_len, check_span, check_word_aligned, padding};
use crate::config::ClientConfig;
use crate::memory::{Access, Stride};
use crate::protocol::{Command, Response, Width};
use crate::{Error, ProtocolError, Result};

// Initial buffer size for read data
const READ_CAPACITY: usize = 4096;

/// Host end of the serial link.
///
/// Implement this over the host's serial port, opened 8N1 at the board's
/// baud rate with a short read timeout.  This trait keeps the client free of
/// any particular async runtime or serial library.
#[async_trait(?Send)]
pub trait AsyncLink {
    /// Write all of `data` and flush it to the wire
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Read one byte.  `Ok(None)` means the read timed out.
    async fn recv_byte(&mut self) -> Result<Option<u8>>;

    /// Throw away anything already received
    async fn discard_input(&mut self) -> Result<()>;
}

/// Async client for the monitor.
///
/// Example usage:
///
/// ```ignore
/// use comet_monitor::client::AsyncMonitorClient;
/// use comet_monitor::config::ClientConfig;
/// use comet_monitor::protocol::Width;
///
/// let link = ...; // implement AsyncLink
/// let mut client = AsyncMonitorClient::new(link, ClientConfig::default());
/// client.connect().await?;
/// client.load_code(0x0000_1000, &image).await?;
/// client.execute(0x0000_1000).await?;
/// ```
pub struct AsyncMonitorClient<L: AsyncLink> {
    link: L,
    config: ClientConfig,
}

impl<L: AsyncLink> AsyncMonitorClient<L> {
    pub fn new(link: L, config: ClientConfig) -> Self {
        Self { link, config }
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn into_link(self) -> L {
        self.link
    }

    /// Wait for the monitor to come up.
    ///
    /// Discards stale input, then pings until a `Pong` arrives.  Gives up
    /// after `retries` pings.
    pub async fn connect(&mut self) -> Result<()> {
        self.link.discard_input().await?;

        for attempt in 1..=self.config.retries {
            self.link.send(&[Command::Ping as u8]).await?;
            match self.link.recv_byte().await? {
                Some(byte) if byte == Response::Pong as u8 => {
                    info!("Monitor ready after {attempt} ping(s)");
                    return Ok(());
                }
                Some(byte) => debug!("Ignoring {byte:#04X} while waiting for pong"),
                None => debug!("No pong, attempt {attempt}"),
            }
        }

        warn!("Monitor not responding");
        Err(Error::Timeout)
    }

    /// A single ping.
    pub async fn ping(&mut self) -> Result<()> {
        self.link.send(&[Command::Ping as u8]).await?;
        self.expect(&[Response::Pong], self.config.ack_retries)
            .await
            .map(|_| ())
    }

    /// Load `data` into target memory starting at `base`.
    pub async fn load_code(&mut self, base: u32, data: &[u8]) -> Result<()> {
        check_word_aligned(base)?;
        let len = check_len(data.len())?;
        check_span(base, len as u64)?;

        info!("Loading {len} bytes to {base:#010X}");
        let mut request = Vec::with_capacity(9 + data.len());
        request.push(Command::LoadCode as u8);
        request.extend_from_slice(&len.to_be_bytes());
        request.extend_from_slice(&base.to_be_bytes());
        request.extend_from_slice(data);
        self.link.send(&request).await?;

        self.expect(&[Response::CodeLoaded], self.config.ack_retries)
            .await
            .map(|_| ())
    }

    /// Call the code at `addr`.  If it returns, the monitor resumes.
    pub async fn execute(&mut self, addr: u32) -> Result<()> {
        self.transfer(Command::Execute, addr).await
    }

    /// Jump to the code at `addr`.  The monitor does not come back.
    pub async fn jump(&mut self, addr: u32) -> Result<()> {
        self.transfer(Command::Jump, addr).await
    }

    /// Read `count` elements of `width` starting at `addr`, returning the raw
    /// big-endian bytes.  [`Stride::Fixed`] re-reads `addr` every time.
    pub async fn read_mem(
        &mut self,
        addr: u32,
        width: Width,
        count: u32,
        stride: Stride,
    ) -> Result<Vec<u8>> {
        let access = Access::new(addr, width, count);
        if stride == Stride::Advance {
            check_span(addr, access.wire_len())?;
        }

        let command = match stride {
            Stride::Advance => Command::ReadMem,
            Stride::Fixed => Command::ReadBlock,
        };
        self.link.send(&access_request(command, &access)).await?;
        self.expect(
            &[Response::ReadMemAck, Response::ReadBlockAck],
            self.config.ack_retries,
        )
        .await?;

        // Grows as data arrives, so a huge count cannot allocate up front.
        let len = access.wire_len() as usize;
        let mut data = Vec::with_capacity(len.min(READ_CAPACITY));
        let mut timeouts = 0;
        while data.len() < len {
            match self.link.recv_byte().await? {
                Some(byte) => data.push(byte),
                None => {
                    timeouts += 1;
                    if timeouts >= self.config.ack_retries {
                        warn!("Read stalled after {} of {len} bytes", data.len());
                        return Err(Error::Timeout);
                    }
                }
            }
        }

        debug!("Read {len} bytes from {addr:#010X}");
        Ok(data)
    }

    /// Write `data` as elements of `width` starting at `addr`.
    ///
    /// Data that is not a whole number of elements is padded at the front
    /// with zero bytes, so `[0x12, 0x34, 0x56]` written as longs becomes
    /// `0x00123456`.
    pub async fn write_mem(&mut self, addr: u32, width: Width, data: &[u8]) -> Result<()> {
        let pad = padding(data.len(), width);
        if pad > 0 {
            debug!("Padding write with {pad} leading zero byte(s)");
        }
        let len = check_len(data.len() + pad)?;
        check_span(addr, len as u64)?;

        let access = Access::new(addr, width, len / width.bytes());
        let mut request = access_request(Command::WriteMem, &access);
        request.resize(request.len() + pad, 0);
        request.extend_from_slice(data);

        info!("Writing {len} bytes to {addr:#010X}");
        self.link.send(&request).await?;
        self.expect(&[Response::WriteMemAck], self.config.ack_retries)
            .await
            .map(|_| ())
    }

    /// Collect console output from a loaded image, up to `max` bytes.
    ///
    /// Use after [`Self::execute()`] or [`Self::jump()`], once the image owns
    /// the serial port.  Returns at the first link read timeout, so an empty
    /// result means the board has been quiet.  Carriage returns become
    /// newlines.  Other control bytes and anything outside printable ASCII
    /// are dropped.
    pub async fn read_console(&mut self, max: usize) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        while output.len() < max {
            match self.link.recv_byte().await? {
                Some(b'\r') => output.push(b'\n'),
                Some(byte @ 0x20..0x7F) => output.push(byte),
                Some(byte) => trace!("Dropping console byte {byte:#04X}"),
                None => break,
            }
        }
        Ok(output)
    }
}

// Internal functions
impl<L: AsyncLink> AsyncMonitorClient<L> {
    async fn transfer(&mut self, command: Command, addr: u32) -> Result<()> {
        check_word_aligned(addr)?;

        info!("{command:?} at {addr:#010X}");
        let mut request = Vec::with_capacity(5);
        request.push(command as u8);
        request.extend_from_slice(&addr.to_be_bytes());
        self.link.send(&request).await?;

        self.expect(&[Response::Running], self.config.exec_retries)
            .await
            .map(|_| ())
    }

    /// Wait for one of `accepted`.
    ///
    /// Other bytes are skipped.  Each skipped byte or read timeout uses up
    /// one of `retries`.  Once they are exhausted the error reports the last
    /// stray byte if there was one, otherwise a timeout.
    async fn expect(&mut self, accepted: &[Response], retries: u32) -> Result<Response> {
        let mut stray = None;
        for _ in 0..retries.max(1) {
            match self.link.recv_byte().await? {
                Some(byte) => match Response::from_byte(byte) {
                    Some(response) if accepted.contains(&response) => {
                        trace!("Got {response:?}");
                        return Ok(response);
                    }
                    _ => {
                        warn!("Unexpected byte {byte:#04X}, want {accepted:?}");
                        stray = Some(byte);
                    }
                },
                None => trace!("Timed out waiting for {accepted:?}"),
            }
        }

        match stray {
            Some(got) => Err(Error::Protocol(ProtocolError::UnexpectedResponse {
                expected: accepted[0] as u8,
                got,
            })),
            None => Err(Error::Timeout),
        }
    }
}

/// Command, width, count, address.
fn access_request(command: Command, access: &Access) -> Vec<u8> {
    let mut request = Vec::with_capacity(10);
    request.push(command as u8);
    request.push(access.width as u8);
    request.extend_from_slice(&access.count.to_be_bytes());
    request.extend_from_slice(&access.address.to_be_bytes());
    request
}
