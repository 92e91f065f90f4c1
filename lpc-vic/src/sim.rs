//! In-memory LPC214x for exercising the interrupt core off-target.
//!
//! [`SimBank`] keeps the register semantics the core relies on (set/clear register
//! pairs, write-one-to-clear flags) and models how the VIC picks a handler:
//! [`SimBank::dispatch`] plays the part of the IRQ exception reading `VICVectAddr`,
//! and a write to `VICVectAddr` acknowledges it. CPSR masking is not applied to
//! dispatch; callers check [`SimCpsr`] themselves when they need to.
use core::cell::{Cell, RefCell};

use heapless::{HistoryBuffer, Vec};

use crate::channel::Channel;
use crate::cpsr::{StatusRegister, FIQ_MASK, IRQ_MASK};
use crate::register::{Register, RegisterBank, N_SLOTS};
use crate::vic::{CHANNEL_FIELD, CONTROL_MASK, SLOT_ENABLE};

/// Number of register writes remembered by [`SimBank::writes`].
pub const LOG_DEPTH: usize = 64;
/// Priority of the non-vectored handler, below every vectored slot.
pub const DEFAULT_PRIORITY: u8 = N_SLOTS as u8;

const EXT_MASK: u32 = 0x0F;
/// VIC channels of `EINT0` to `EINT3`, by `EXTINT` bit.
const EINT_CHANNELS: [u8; 4] = [14, 15, 16, 17];

#[derive(Debug, Default)]
struct State {
    int_select: u32,
    int_enable: u32,
    soft_int: u32,
    vect_addr: u32,
    def_vect_addr: u32,
    slot_addr: [u32; N_SLOTS],
    slot_cntl: [u32; N_SLOTS],
    pinsel0: u32,
    pinsel1: u32,
    extint: u32,
    extmode: u32,
    extpolar: u32,
    t0ir: u32,
    t1ir: u32,
    ilr: u32,
    watchdog: bool,
}

impl State {
    /// Lines asserted by the peripherals and by software.
    fn raw(&self) -> u32 {
        let mut raw = self.soft_int;
        if self.watchdog {
            raw |= Channel::Watchdog.mask();
        }
        if self.t0ir != 0 {
            raw |= Channel::Timer0.mask();
        }
        if self.t1ir != 0 {
            raw |= Channel::Timer1.mask();
        }
        if self.ilr != 0 {
            raw |= Channel::Rtc.mask();
        }
        for (bit, channel) in EINT_CHANNELS.iter().enumerate() {
            if self.extint & (1u32 << bit) != 0 {
                raw |= 1u32 << *channel;
            }
        }
        raw
    }

    fn irq_status(&self) -> u32 {
        self.raw() & self.int_enable & !self.int_select
    }

    fn fiq_status(&self) -> u32 {
        self.raw() & self.int_enable & self.int_select
    }
}

/// In-memory register bank. Not `Sync`: one bank per test thread.
#[derive(Debug)]
pub struct SimBank {
    state: RefCell<State>,
    /// Priorities being serviced, innermost last.
    in_service: RefCell<Vec<u8, { N_SLOTS + 1 }>>,
    log: RefCell<HistoryBuffer<(Register, u32), LOG_DEPTH>>,
}

impl Default for SimBank {
    fn default() -> Self {
        Self::new()
    }
}

impl SimBank {
    /// Creates a bank with every register at zero.
    pub fn new() -> Self {
        Self {
            state: RefCell::new(State::default()),
            in_service: RefCell::new(Vec::new()),
            log: RefCell::new(HistoryBuffer::new()),
        }
    }

    /// Makes the peripheral behind `channel` raise its interrupt flag.
    pub fn assert_line(&self, channel: Channel) {
        let mut state = self.state.borrow_mut();
        match channel {
            Channel::Watchdog => state.watchdog = true,
            Channel::Timer0 => state.t0ir |= 0x1, // MR0
            Channel::Timer1 => state.t1ir |= 0x1,
            Channel::Rtc => state.ilr |= 0x1, // counter increment
            Channel::Eint0 => state.extint |= 0x1,
            Channel::Eint2 => state.extint |= 0x4,
        }
    }

    /// Takes the next IRQ, like the core does on an IRQ exception.
    ///
    /// Returns the handler address of the highest-priority pending request, or `None`
    /// if nothing is pending or everything pending is blocked by a request in service.
    pub fn dispatch(&self) -> Option<u32> {
        let mut state = self.state.borrow_mut();
        let mut in_service = self.in_service.borrow_mut();

        let status = state.irq_status();
        if status == 0 {
            return None;
        }

        let mut vectored: u32 = 0;
        let mut candidate = None;
        for n in 0..N_SLOTS {
            let control = state.slot_cntl[n] as u8;
            if control & SLOT_ENABLE == 0 {
                continue;
            }
            let bit: u32 = 1 << (control & CHANNEL_FIELD);
            vectored |= bit;
            if candidate.is_none() && status & bit != 0 {
                candidate = Some((n as u8, state.slot_addr[n]));
            }
        }
        let (priority, address) = match candidate {
            Some(found) => found,
            None if status & !vectored != 0 => (DEFAULT_PRIORITY, state.def_vect_addr),
            None => return None,
        };

        let ceiling = in_service.last().copied().unwrap_or(DEFAULT_PRIORITY + 1);
        if priority >= ceiling {
            log::trace!("priority {priority} blocked by {ceiling} in service");
            return None;
        }
        // priorities in service strictly decrease, so the stack never overflows
        in_service.push(priority).ok()?;
        state.vect_addr = address;
        Some(address)
    }

    /// Priority of the innermost request in service, if any.
    pub fn in_service(&self) -> Option<u8> {
        self.in_service.borrow().last().copied()
    }

    /// Register writes since creation or the last [`SimBank::clear_writes`], oldest first.
    /// Only the last [`LOG_DEPTH`] writes are kept.
    pub fn writes(&self) -> Vec<(Register, u32), LOG_DEPTH> {
        self.log.borrow().oldest_ordered().copied().collect()
    }

    /// Forgets the recorded writes.
    pub fn clear_writes(&self) {
        *self.log.borrow_mut() = HistoryBuffer::new();
    }
}

impl RegisterBank for SimBank {
    fn read(&self, register: Register) -> u32 {
        let state = self.state.borrow();
        match register {
            Register::IrqStatus => state.irq_status(),
            Register::FiqStatus => state.fiq_status(),
            Register::RawIntr => state.raw(),
            Register::IntSelect => state.int_select,
            Register::IntEnable => state.int_enable,
            Register::IntEnClr | Register::SoftIntClear => 0,
            Register::SoftInt => state.soft_int,
            Register::VectAddr => state.vect_addr,
            Register::DefVectAddr => state.def_vect_addr,
            Register::SlotAddr(n) => state.slot_addr.get(n as usize).copied().unwrap_or(0),
            Register::SlotCntl(n) => state.slot_cntl.get(n as usize).copied().unwrap_or(0),
            Register::Pinsel0 => state.pinsel0,
            Register::Pinsel1 => state.pinsel1,
            Register::ExtInt => state.extint,
            Register::ExtMode => state.extmode,
            Register::ExtPolar => state.extpolar,
            Register::T0Ir => state.t0ir,
            Register::T1Ir => state.t1ir,
            Register::Ilr => state.ilr,
        }
    }

    fn write(&self, register: Register, value: u32) {
        self.log.borrow_mut().write((register, value));
        let mut state = self.state.borrow_mut();
        match register {
            Register::IrqStatus | Register::FiqStatus | Register::RawIntr => {}
            Register::IntSelect => state.int_select = value,
            Register::IntEnable => state.int_enable |= value,
            Register::IntEnClr => state.int_enable &= !value,
            Register::SoftInt => state.soft_int |= value,
            Register::SoftIntClear => state.soft_int &= !value,
            Register::VectAddr => {
                self.in_service.borrow_mut().pop();
            }
            Register::DefVectAddr => state.def_vect_addr = value,
            Register::SlotAddr(n) => {
                if let Some(slot) = state.slot_addr.get_mut(n as usize) {
                    *slot = value;
                }
            }
            Register::SlotCntl(n) => {
                if let Some(slot) = state.slot_cntl.get_mut(n as usize) {
                    *slot = value & CONTROL_MASK as u32;
                }
            }
            Register::Pinsel0 => state.pinsel0 = value,
            Register::Pinsel1 => state.pinsel1 = value,
            Register::ExtInt => state.extint &= !value,
            Register::ExtMode => state.extmode = value & EXT_MASK,
            Register::ExtPolar => state.extpolar = value & EXT_MASK,
            Register::T0Ir => state.t0ir &= !value,
            Register::T1Ir => state.t1ir &= !value,
            Register::Ilr => state.ilr &= !value,
        }
    }
}

/// In-memory program status register.
#[derive(Debug, Default)]
pub struct SimCpsr(Cell<u32>);

impl SimCpsr {
    pub const fn new(bits: u32) -> Self {
        Self(Cell::new(bits))
    }

    pub fn bits(&self) -> u32 {
        self.0.get()
    }

    pub fn set_bits(&self, bits: u32) {
        self.0.set(bits)
    }

    pub fn irq_masked(&self) -> bool {
        self.bits() & IRQ_MASK != 0
    }

    pub fn fiq_masked(&self) -> bool {
        self.bits() & FIQ_MASK != 0
    }
}

impl StatusRegister for SimCpsr {
    fn read(&self) -> u32 {
        self.bits()
    }

    fn write(&self, value: u32) {
        self.set_bits(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enable_registers_set_and_clear() {
        let bank = SimBank::new();
        bank.write(Register::IntEnable, 0x0000_4010);
        bank.write(Register::IntEnable, 0x0000_0001);
        assert_eq!(bank.read(Register::IntEnable), 0x0000_4011);
        bank.write(Register::IntEnClr, 0x0000_0010);
        assert_eq!(bank.read(Register::IntEnable), 0x0000_4001);
        assert_eq!(bank.read(Register::IntEnClr), 0);
    }

    #[test]
    fn flags_are_write_one_to_clear() {
        let bank = SimBank::new();
        bank.assert_line(Channel::Eint0);
        bank.assert_line(Channel::Eint2);
        bank.write(Register::ExtInt, 0x4);
        assert_eq!(bank.read(Register::ExtInt), 0x1);
        assert_eq!(bank.read(Register::RawIntr), Channel::Eint0.mask());
    }

    #[test]
    fn select_routes_to_fiq() {
        let bank = SimBank::new();
        bank.assert_line(Channel::Timer1);
        bank.write(Register::IntEnable, Channel::Timer1.mask());
        bank.write(Register::IntSelect, Channel::Timer1.mask());
        assert_eq!(bank.read(Register::IrqStatus), 0);
        assert_eq!(bank.read(Register::FiqStatus), Channel::Timer1.mask());
        assert_eq!(bank.dispatch(), None);
    }

    #[test]
    fn slot_registers_past_the_table_do_not_alias() {
        let bank = SimBank::new();
        bank.write(Register::SlotAddr(0), 0x0000_0400);
        bank.write(Register::SlotCntl(0), 0x24);
        bank.write(Register::SlotAddr(N_SLOTS as u8), 0xDEAD_BEEF);
        bank.write(Register::SlotCntl(N_SLOTS as u8), 0x2D);

        assert_eq!(bank.read(Register::SlotAddr(0)), 0x0000_0400);
        assert_eq!(bank.read(Register::SlotCntl(0)), 0x24);
        assert_eq!(bank.read(Register::SlotAddr(N_SLOTS as u8)), 0);
        assert_eq!(bank.read(Register::SlotCntl(0xFF)), 0);
    }

    #[test]
    fn log_keeps_the_latest_writes() {
        let bank = SimBank::new();
        for i in 0..(LOG_DEPTH as u32 + 3) {
            bank.write(Register::DefVectAddr, i);
        }
        let writes = bank.writes();
        assert_eq!(writes.len(), LOG_DEPTH);
        assert_eq!(writes[0], (Register::DefVectAddr, 3));
        bank.clear_writes();
        assert!(bank.writes().is_empty());
    }
}
