//! The monitor's protocol state machine.
//!
//! A single control loop with no interrupts and no reentrancy.  In
//! [`State::Idle`] it reads one command byte and moves to that command's
//! state.  Each command state performs its action, sends its response and
//! returns to idle.  The exception is [`State::Jump`]: control never comes
//! back.
//!
//! Target usage:
//!
//! ```ignore
//! use comet_monitor::config::MonitorConfig;
//! use comet_monitor::exec::M68kTransfer;
//! use comet_monitor::memory::RawMemory;
//! use comet_monitor::monitor::Monitor;
//! use comet_monitor::transport::{MmioPort, Uart};
//!
//! // Board bring-up has already configured the UART for 8N1.
//! let uart = Uart::new(unsafe { MmioPort::new(0x00C2_0008) });
//! let mut monitor = Monitor::new(
//!     uart,
//!     unsafe { RawMemory::new() },
//!     unsafe { M68kTransfer::new() },
//!     MonitorConfig::new(),
//! );
//! monitor.run().ok();
//! ```

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

use crate::Result;
use crate::config::MonitorConfig;
use crate::exec::{ControlTransfer, TransferMode};
use crate::memory::{self, Access, AddressSpace};
use crate::protocol::{Command, Response, Width};
use crate::transport::Transport;

/// Monitor state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Waiting for a command byte
    Idle,
    Ping,
    LoadCode,
    Execute,
    Jump,
    ReadMem,
    WriteMem,
    ReadBlock,
    /// A jump handed control away and, unusually, the transfer returned.
    /// Only reachable with hosted [`ControlTransfer`] implementations.
    Departed(u32),
}

impl From<Command> for State {
    fn from(command: Command) -> Self {
        match command {
            Command::Ping => State::Ping,
            Command::LoadCode => State::LoadCode,
            Command::Execute => State::Execute,
            Command::Jump => State::Jump,
            Command::ReadMem => State::ReadMem,
            Command::WriteMem => State::WriteMem,
            Command::ReadBlock => State::ReadBlock,
        }
    }
}

/// The monitor.
///
/// Owns its transport, the address space it pokes at, and the control
/// transfer edge.  The only state carried between commands is [`State`].
pub struct Monitor<T: Transport, M: AddressSpace, X: ControlTransfer> {
    transport: T,
    memory: M,
    exec: X,
    config: MonitorConfig,
    state: State,
}

impl<T: Transport, M: AddressSpace, X: ControlTransfer> Monitor<T, M, X> {
    /// Create a monitor in the Idle state.  Line-error checking on
    /// `transport` is set from `config`.
    pub fn new(mut transport: T, memory: M, exec: X, config: MonitorConfig) -> Self {
        debug!("Monitor created {config:?}");
        transport.set_line_error_checks(config.check_line_errors);
        Self {
            transport,
            memory,
            exec,
            config,
            state: State::Idle,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut M {
        &mut self.memory
    }

    pub fn exec(&self) -> &X {
        &self.exec
    }

    pub fn exec_mut(&mut self) -> &mut X {
        &mut self.exec
    }

    pub fn into_parts(self) -> (T, M, X) {
        (self.transport, self.memory, self.exec)
    }

    /// Run commands until control leaves the monitor.
    ///
    /// Recoverable errors (see [`crate::Error::is_recoverable()`]) abort the
    /// current command only.  Any other error is returned.  On hardware this
    /// never returns.  With a hosted [`ControlTransfer`] it returns the
    /// target of a jump that came back.
    pub fn run(&mut self) -> Result<u32> {
        loop {
            match self.step() {
                Ok(State::Departed(address)) => return Ok(address),
                Ok(_) => {}
                Err(err) if err.is_recoverable() => warn!("Command aborted: {err}"),
                Err(err) => return Err(err),
            }
        }
    }

    /// Perform exactly one state transition and return the new state.
    ///
    /// On error the current command is abandoned and the monitor is back in
    /// [`State::Idle`].  Whatever the host already sent for that command is
    /// not resynchronised: bytes still to come are read as commands.
    pub fn step(&mut self) -> Result<State> {
        let result = match self.state {
            State::Idle => self.idle(),
            State::Ping => self.ping(),
            State::LoadCode => self.load_code(),
            State::Execute => self.handoff(TransferMode::Call),
            State::Jump => self.handoff(TransferMode::Jump),
            State::ReadMem => self.read_mem(),
            State::WriteMem => self.write_mem(),
            State::ReadBlock => self.read_block(),
            State::Departed(address) => Ok(State::Departed(address)),
        };

        match result {
            Ok(next) => {
                trace!("{:?} -> {next:?}", self.state);
                self.state = next;
                Ok(next)
            }
            Err(err) => {
                debug!("{:?} failed: {err:?}", self.state);
                self.state = State::Idle;
                Err(err)
            }
        }
    }
}

// Per-state actions
impl<T: Transport, M: AddressSpace, X: ControlTransfer> Monitor<T, M, X> {
    fn idle(&mut self) -> Result<State> {
        let byte = self.transport.recv_byte()?;
        match Command::from_byte(byte) {
            Some(command) => {
                debug!("Command {command:?}");
                Ok(State::from(command))
            }
            None => {
                debug!("Ignoring unknown command {byte:#04X}");
                Ok(State::Idle)
            }
        }
    }

    fn ping(&mut self) -> Result<State> {
        self.respond(Response::Pong)?;
        Ok(State::Idle)
    }

    fn load_code(&mut self) -> Result<State> {
        let length = self.transport.recv_long()?;
        let address = self.transport.recv_long()?;
        debug!("Loading {length} bytes at {address:#010X}");

        memory::write(
            &mut self.memory,
            &mut self.transport,
            Access::new(address, Width::Byte, length),
        )?;

        self.respond(Response::CodeLoaded)?;
        Ok(State::Idle)
    }

    fn handoff(&mut self, mode: TransferMode) -> Result<State> {
        let address = self.transport.recv_long()?;
        self.respond(Response::Running)?;

        // The host must have the ack before the image takes over the UART.
        self.transport.wait_tx_idle()?;

        info!("{mode:?} to {address:#010X}");
        self.exec.transfer(address, mode)?;

        match mode {
            TransferMode::Call => {
                debug!("Returned from {address:#010X}");
                Ok(State::Idle)
            }
            TransferMode::Jump => Ok(State::Departed(address)),
        }
    }

    fn read_mem(&mut self) -> Result<State> {
        let access = self.recv_access()?;
        self.respond(Response::ReadMemAck)?;
        memory::read(
            &mut self.memory,
            &mut self.transport,
            access,
            self.config.burst_tx,
        )?;
        Ok(State::Idle)
    }

    fn write_mem(&mut self) -> Result<State> {
        let access = self.recv_access()?;
        memory::write(&mut self.memory, &mut self.transport, access)?;
        self.respond(Response::WriteMemAck)?;
        Ok(State::Idle)
    }

    fn read_block(&mut self) -> Result<State> {
        let access = self.recv_access()?;
        self.respond(Response::ReadMemAck)?;
        memory::read_fixed(
            &mut self.memory,
            &mut self.transport,
            access,
            self.config.burst_tx,
        )?;
        Ok(State::Idle)
    }

    /// Width, count and address, in that order.  All three are consumed
    /// before the width is checked.
    fn recv_access(&mut self) -> Result<Access> {
        let width = self.transport.recv_byte()?;
        let count = self.transport.recv_long()?;
        let address = self.transport.recv_long()?;
        let width = Width::try_from(width)?;
        debug!("{count} x {width:?} at {address:#010X}");
        Ok(Access::new(address, width, count))
    }

    fn respond(&mut self, response: Response) -> Result<()> {
        self.transport.send_byte(response as u8)
    }
}
