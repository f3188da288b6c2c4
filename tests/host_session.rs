//! The host client driving a hosted monitor end to end.

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

#![cfg(feature = "async")]

use std::collections::VecDeque;

use async_trait::async_trait;
use comet_monitor::client::{AsyncLink, AsyncMonitorClient};
use comet_monitor::config::{ClientConfig, MonitorConfig};
use comet_monitor::exec::{ControlTransfer, TransferMode};
use comet_monitor::hexdump::hexdump;
use comet_monitor::memory::{AddressSpace, BufferSpace, Stride};
use comet_monitor::monitor::{Monitor, State};
use comet_monitor::protocol::Width;
use comet_monitor::transport::QueueTransport;
use comet_monitor::{Error, Result};

/// Records transfers.  The "image" it enters prints `program_output` to
/// the serial port.
#[derive(Default)]
struct Calls {
    made: Vec<(u32, TransferMode)>,
    program_output: Vec<u8>,
    printed: Vec<u8>,
}

impl ControlTransfer for Calls {
    fn transfer(&mut self, address: u32, mode: TransferMode) -> Result<()> {
        self.made.push((address, mode));
        self.printed.extend_from_slice(&self.program_output);
        Ok(())
    }
}

/// A board on the other end of the wire.  Whatever the host sends is run
/// through the monitor straight away; its replies queue up for reading.
struct Board {
    monitor: Monitor<QueueTransport, BufferSpace, Calls>,
    replies: VecDeque<u8>,
    powered: bool,
}

impl Board {
    fn new(memory: BufferSpace) -> Self {
        Self {
            monitor: Monitor::new(
                QueueTransport::new(),
                memory,
                Calls::default(),
                MonitorConfig::new(),
            ),
            replies: VecDeque::new(),
            powered: true,
        }
    }

    fn run(&mut self) -> Result<()> {
        let result = match self.monitor.run() {
            Ok(_) | Err(Error::WouldBlock) => Ok(()),
            Err(err) => Err(err),
        };
        let output = self.monitor.transport_mut().take_output();
        self.replies.extend(output);
        let printed = std::mem::take(&mut self.monitor.exec_mut().printed);
        self.replies.extend(printed);
        result
    }
}

#[async_trait(?Send)]
impl AsyncLink for Board {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.powered {
            return Ok(());
        }
        self.monitor.transport_mut().push_input(data);
        self.run().map_err(|_| Error::Io)
    }

    async fn recv_byte(&mut self) -> Result<Option<u8>> {
        Ok(self.replies.pop_front())
    }

    async fn discard_input(&mut self) -> Result<()> {
        self.replies.clear();
        Ok(())
    }
}

fn session(memory: BufferSpace) -> AsyncMonitorClient<Board> {
    let _ = env_logger::builder().is_test(true).try_init();
    AsyncMonitorClient::new(Board::new(memory), ClientConfig::default())
}

#[tokio::test]
async fn upload_and_execute() {
    let image: Vec<u8> = (0..200u8).collect();
    let mut client = session(BufferSpace::new(0x0001_0000, 0x1000));

    client.link_mut().replies.extend([0xEE, 0xEE]);
    client.connect().await.unwrap();
    client.load_code(0x0001_0000, &image).await.unwrap();
    client.execute(0x0001_0000).await.unwrap();

    // The monitor is back and serving requests after the call returned.
    client.ping().await.unwrap();
    let readback = client
        .read_mem(0x0001_0000, Width::Byte, image.len() as u32, Stride::Advance)
        .await
        .unwrap();
    assert_eq!(readback, image);

    let board = client.into_link();
    assert_eq!(board.monitor.exec().made, [(0x0001_0000, TransferMode::Call)]);
    assert_eq!(board.monitor.state(), State::Idle);
}

#[tokio::test]
async fn peek_and_poke_in_every_width() {
    let mut client = session(BufferSpace::new(0x2000, 0x40));

    client
        .write_mem(0x2000, Width::Byte, &[0x01, 0x02])
        .await
        .unwrap();
    client
        .write_mem(0x2002, Width::Word, &[0x12, 0x34, 0x56, 0x78])
        .await
        .unwrap();
    client
        .write_mem(0x2008, Width::Long, &[0xAB, 0xCD, 0xEF])
        .await
        .unwrap();

    let words = client
        .read_mem(0x2002, Width::Word, 2, Stride::Advance)
        .await
        .unwrap();
    assert_eq!(words, [0x12, 0x34, 0x56, 0x78]);

    let long = client
        .read_mem(0x2008, Width::Long, 1, Stride::Advance)
        .await
        .unwrap();
    assert_eq!(long, [0x00, 0xAB, 0xCD, 0xEF]);

    let block = client
        .read_mem(0x2000, Width::Word, 3, Stride::Fixed)
        .await
        .unwrap();
    assert_eq!(block, [0x01, 0x02, 0x01, 0x02, 0x01, 0x02]);

    let board = client.into_link();
    let mut memory = board.monitor.memory().clone();
    assert_eq!(memory.read_u32(0x2008), Ok(0x00AB_CDEF));
}

#[tokio::test]
async fn jump_leaves_the_monitor_behind() {
    let mut client = session(BufferSpace::new(0, 0x10));
    client.jump(0x0000_0400).await.unwrap();

    // Nothing answers any more.
    assert_eq!(client.ping().await, Err(Error::Timeout));

    let board = client.into_link();
    assert_eq!(board.monitor.state(), State::Departed(0x400));
    assert_eq!(board.monitor.exec().made, [(0x400, TransferMode::Jump)]);
}

#[tokio::test]
async fn unpowered_board_times_out() {
    let mut client = session(BufferSpace::new(0, 0x10));
    client.link_mut().powered = false;
    assert_eq!(client.connect().await, Err(Error::Timeout));
}

#[tokio::test]
async fn unmapped_read_surfaces_as_link_error() {
    let mut client = session(BufferSpace::new(0x1000, 0x10));
    assert_eq!(
        client.read_mem(0x0000, Width::Byte, 1, Stride::Advance).await,
        Err(Error::Io)
    );
}

#[tokio::test]
async fn dump_what_was_read() {
    let mut client = session(BufferSpace::new(0x100, 0x20));
    client
        .write_mem(0x104, Width::Byte, b"COMET68k")
        .await
        .unwrap();
    let data = client
        .read_mem(0x104, Width::Byte, 8, Stride::Advance)
        .await
        .unwrap();
    let dump = hexdump(&data, 0x104);
    assert!(dump.contains(" 00000100          434f4d45 5436386b"));
    assert!(dump.ends_with("COMET68k\n"));
}

#[tokio::test]
async fn console_output_after_execute() {
    let mut client = session(BufferSpace::new(0x4000, 0x10));
    let image = client.link_mut().monitor.exec_mut();
    image.program_output = b"COMET68k\r\n\x1b[0mready\r\n".to_vec();

    client.execute(0x4000).await.unwrap();
    assert_eq!(
        client.read_console(256).await,
        Ok(b"COMET68k\n[0mready\n".to_vec())
    );
    assert_eq!(client.read_console(256).await, Ok(Vec::new()));
}

#[tokio::test]
async fn console_output_after_jump() {
    let mut client = session(BufferSpace::new(0, 0x10));
    client.link_mut().monitor.exec_mut().program_output = b"booting\r".to_vec();

    client.jump(0x0000_0800).await.unwrap();
    assert_eq!(client.read_console(4).await, Ok(b"boot".to_vec()));
    assert_eq!(client.read_console(256).await, Ok(b"ing\n".to_vec()));
}
