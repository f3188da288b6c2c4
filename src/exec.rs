//! Handing control to a loaded image.
//!
//! This is the one inherently non-portable operation in the crate.  The rest
//! of the monitor only sees [`ControlTransfer`], so it can run hosted against
//! a test double.  On a 68k target use `M68kTransfer`.
//!
//! A called image that returns must follow the m68k C calling convention:
//! it may change only d0, d1, a0 and a1, and must return with the stack as
//! it found it.  Returning from an image that does not is undefined.

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

use crate::Result;

/// How control is handed over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    /// Subroutine call.  If the image returns, the monitor carries on.
    Call,
    /// Plain branch with no call frame.  The monitor is gone.
    Jump,
}

/// Transfer of control to an arbitrary address.
pub trait ControlTransfer {
    /// Transfer control to `address`.
    ///
    /// For [`TransferMode::Call`] this returns once the called code does.
    /// Hardware implementations never return from [`TransferMode::Jump`];
    /// hosted doubles may, and the monitor then treats itself as departed.
    fn transfer(&mut self, address: u32, mode: TransferMode) -> Result<()>;
}

impl<X: ControlTransfer + ?Sized> ControlTransfer for &mut X {
    fn transfer(&mut self, address: u32, mode: TransferMode) -> Result<()> {
        (**self).transfer(address, mode)
    }
}

#[cfg(target_arch = "m68k")]
pub use m68k::M68kTransfer;

#[cfg(target_arch = "m68k")]
mod m68k {
    use super::{ControlTransfer, TransferMode};
    use crate::Result;

    /// Control transfer on a 68k CPU running in supervisor mode.
    ///
    /// Registers and stack are handed over as they are; nothing is saved or
    /// restored around the call.
    #[derive(Clone, Copy)]
    pub struct M68kTransfer;

    impl M68kTransfer {
        /// # Safety
        ///
        /// The addresses later passed to [`ControlTransfer::transfer()`] must
        /// hold executable code that is safe to enter with the monitor's
        /// registers and stack.
        pub const unsafe fn new() -> Self {
            Self
        }
    }

    impl ControlTransfer for M68kTransfer {
        fn transfer(&mut self, address: u32, mode: TransferMode) -> Result<()> {
            match mode {
                // Pulses the RESET line so peripherals start fresh.  On some
                // boards this also reaches devices beyond the peripherals.
                // Clobbers are the C ABI's caller-saved registers; there is
                // no clobber_abi for m68k.
                TransferMode::Call => unsafe {
                    core::arch::asm!(
                        "reset",
                        "jsr (%a0)",
                        inout("a0") address => _,
                        out("a1") _,
                        out("d0") _,
                        out("d1") _,
                    );
                },
                TransferMode::Jump => unsafe {
                    core::arch::asm!(
                        "jmp (%a0)",
                        in("a0") address,
                        options(noreturn),
                    );
                },
            }
            Ok(())
        }
    }
}
