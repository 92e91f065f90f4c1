//! Interrupt core for the LPC214x Vectored Interrupt Controller (VIC).
//!
//! Masks IRQs/FIQs at the processor, binds handlers to the 16 vectored slots (or the
//! non-vectored default), and arms or disarms the on-chip interrupt sources: watchdog,
//! Timer0, Timer1, RTC, `EINT0` and `EINT2`.
//!
//! Every register access goes through a [`RegisterBank`], so the same code drives the
//! memory-mapped [`Lpc214x`] on target and the in-memory [`sim::SimBank`] in tests.
#![cfg_attr(not(test), no_std)]

pub mod api;
pub mod channel;
pub mod cpsr;
pub mod isr;
pub mod register;
pub mod sim;
pub mod vic;

pub use api::{Lpc2148, Vic};
pub use channel::{Channel, ExtTrigger, Polarity, TriggerMode};
pub use cpsr::{
    disable_fiq, disable_irq, enable_fiq, enable_irq, free, restore_fiq, restore_irq, Cpsr,
    Guard, Snapshot, StatusRegister,
};
pub use isr::{acknowledge, handler_address, isr, Handler};
pub use register::{Lpc214x, Register, RegisterBank, N_SLOTS};
pub use vic::{update_vic_table, Slot, SlotEntry};
