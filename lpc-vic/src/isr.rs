//! Support for interrupt handlers bound to VIC slots.
//!
//! A handler written with [`macro@isr`] runs its body, clears the pending flag of its
//! channel (if one is given) and finally acknowledges the VIC. A handler that forgets
//! the acknowledgement blocks every request of equal or lower priority.
use crate::register::{Lpc214x, Register, RegisterBank};

pub use lpc_vic_macros::isr;

/// Value written to `VICVectAddr` at the end of a handler.
pub const ACKNOWLEDGE: u32 = 0;

/// Entry point of an interrupt handler, as stored in a vector slot.
pub type Handler = unsafe extern "C" fn();

/// Signals the end of the current interrupt to the VIC priority logic.
#[inline]
pub fn acknowledge<B: RegisterBank + ?Sized>(bank: &B) {
    bank.write(Register::VectAddr, ACKNOWLEDGE);
}

/// Address of `handler` as written to a vector slot.
#[inline]
pub fn handler_address(handler: Handler) -> u32 {
    handler as usize as u32
}

/// Register bank used by handlers that do not name one.
///
/// # Safety
///
/// Same as [`Lpc214x::steal`]: only call it on an LPC214x.
#[doc(hidden)]
#[inline(always)]
pub unsafe fn hardware_bank() -> Lpc214x {
    Lpc214x::steal()
}
