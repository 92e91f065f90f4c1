//! Register map of the LPC214x blocks touched by the interrupt core.
use tock_registers::{
    interfaces::{Readable, Writeable},
    register_structs,
    registers::{ReadOnly, ReadWrite, WriteOnly},
};

/// Number of vectored slots in the VIC.
pub const N_SLOTS: usize = 16;

/// A 32-bit register reachable through a [`RegisterBank`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Register {
    /// `VICIRQStatus`: enabled lines routed to IRQ and currently asserted.
    IrqStatus,
    /// `VICFIQStatus`: enabled lines routed to FIQ and currently asserted.
    FiqStatus,
    /// `VICRawIntr`: every asserted line, enabled or not.
    RawIntr,
    /// `VICIntSelect`: 1 routes the channel to FIQ, 0 to IRQ.
    IntSelect,
    /// `VICIntEnable`: writing ones enables channels, zeros have no effect.
    IntEnable,
    /// `VICIntEnClr`: writing ones disables channels.
    IntEnClr,
    /// `VICSoftInt`: software-forced lines.
    SoftInt,
    /// `VICSoftIntClear`: writing ones clears bits of `VICSoftInt`.
    SoftIntClear,
    /// `VICVectAddr`: writing any value updates the priority hardware.
    VectAddr,
    /// `VICDefVectAddr`: handler address for non-vectored IRQs.
    DefVectAddr,
    /// `VICVectAddrN` of slot `N`. Slots past the last one read as zero and ignore writes.
    SlotAddr(u8),
    /// `VICVectCntlN` of slot `N`. Same range rule as [`Register::SlotAddr`].
    SlotCntl(u8),
    /// `PINSEL0`: function select of P0.0 to P0.15.
    Pinsel0,
    /// `PINSEL1`: function select of P0.16 to P0.31.
    Pinsel1,
    /// `EXTINT`: external interrupt flags, write one to clear.
    ExtInt,
    /// `EXTMODE`: level (0) or edge (1) sensitivity per external interrupt.
    ExtMode,
    /// `EXTPOLAR`: low/falling (0) or high/rising (1) per external interrupt.
    ExtPolar,
    /// `T0IR`: Timer0 interrupt flags, write one to clear.
    T0Ir,
    /// `T1IR`: Timer1 interrupt flags, write one to clear.
    T1Ir,
    /// `ILR`: RTC interrupt location, write one to clear.
    Ilr,
}

/// Access to the interrupt-related registers of the microcontroller.
///
/// Methods take `&self`: like memory-mapped I/O, a bank is shared mutable state and
/// callers serialize read-modify-write sequences with a critical section.
pub trait RegisterBank {
    /// Reads a register. Write-only registers read as zero.
    fn read(&self, register: Register) -> u32;

    /// Writes a register. Read-only registers ignore writes.
    fn write(&self, register: Register, value: u32);

    /// Read-modify-write of a register. Not atomic with respect to interrupts.
    #[inline]
    fn modify<F: FnOnce(u32) -> u32>(&self, register: Register, f: F)
    where
        Self: Sized,
    {
        self.write(register, f(self.read(register)));
    }
}

impl<B: RegisterBank + ?Sized> RegisterBank for &B {
    #[inline]
    fn read(&self, register: Register) -> u32 {
        (**self).read(register)
    }

    #[inline]
    fn write(&self, register: Register, value: u32) {
        (**self).write(register, value)
    }
}

register_structs! {
    /// Vectored Interrupt Controller.
    pub VicRegisters {
        (0x000 => irq_status: ReadOnly<u32>),
        (0x004 => fiq_status: ReadOnly<u32>),
        (0x008 => raw_intr: ReadOnly<u32>),
        (0x00C => int_select: ReadWrite<u32>),
        (0x010 => int_enable: ReadWrite<u32>),
        (0x014 => int_en_clr: WriteOnly<u32>),
        (0x018 => soft_int: ReadWrite<u32>),
        (0x01C => soft_int_clear: WriteOnly<u32>),
        (0x020 => protection: ReadWrite<u32>),
        (0x024 => _reserved0),
        (0x030 => vect_addr: ReadWrite<u32>),
        (0x034 => def_vect_addr: ReadWrite<u32>),
        (0x038 => _reserved1),
        (0x100 => slot_addr: [ReadWrite<u32>; N_SLOTS]),
        (0x140 => _reserved2),
        (0x200 => slot_cntl: [ReadWrite<u32>; N_SLOTS]),
        (0x240 => @END),
    },

    /// Pin connect block.
    pub PinConnectRegisters {
        (0x000 => pinsel0: ReadWrite<u32>),
        (0x004 => pinsel1: ReadWrite<u32>),
        (0x008 => @END),
    },

    /// External interrupt inputs of the system control block.
    pub ExtIntRegisters {
        (0x000 => extint: ReadWrite<u32>),
        (0x004 => extwake: ReadWrite<u32>),
        (0x008 => extmode: ReadWrite<u32>),
        (0x00C => extpolar: ReadWrite<u32>),
        (0x010 => @END),
    },

    /// Interrupt register of a timer or of the RTC (first word of the block).
    pub FlagRegisters {
        (0x000 => flags: ReadWrite<u32>),
        (0x004 => @END),
    }
}

const VIC_BASE: usize = 0xFFFF_F000;
const PINSEL_BASE: usize = 0xE002_C000;
const EXTINT_BASE: usize = 0xE01F_C140;
const TIMER0_BASE: usize = 0xE000_4000;
const TIMER1_BASE: usize = 0xE000_8000;
const RTC_BASE: usize = 0xE002_4000;

/// The memory-mapped registers of an LPC214x.
#[derive(Debug)]
pub struct Lpc214x {
    _private: (),
}

impl Lpc214x {
    /// Returns a handle to the memory-mapped registers.
    ///
    /// # Safety
    ///
    /// Must only be used on an LPC214x, where the register blocks live at their fixed addresses.
    #[inline]
    pub const unsafe fn steal() -> Self {
        Self { _private: () }
    }

    #[inline(always)]
    fn vic(&self) -> &VicRegisters {
        // SAFETY: `steal` guarantees the block is mapped at this address
        unsafe { &*(VIC_BASE as *const VicRegisters) }
    }

    #[inline(always)]
    fn pins(&self) -> &PinConnectRegisters {
        // SAFETY: see `vic`
        unsafe { &*(PINSEL_BASE as *const PinConnectRegisters) }
    }

    #[inline(always)]
    fn ext(&self) -> &ExtIntRegisters {
        // SAFETY: see `vic`
        unsafe { &*(EXTINT_BASE as *const ExtIntRegisters) }
    }

    #[inline(always)]
    fn flags(&self, base: usize) -> &FlagRegisters {
        // SAFETY: see `vic`
        unsafe { &*(base as *const FlagRegisters) }
    }
}

impl RegisterBank for Lpc214x {
    fn read(&self, register: Register) -> u32 {
        let vic = self.vic();
        match register {
            Register::IrqStatus => vic.irq_status.get(),
            Register::FiqStatus => vic.fiq_status.get(),
            Register::RawIntr => vic.raw_intr.get(),
            Register::IntSelect => vic.int_select.get(),
            Register::IntEnable => vic.int_enable.get(),
            Register::IntEnClr | Register::SoftIntClear => 0,
            Register::SoftInt => vic.soft_int.get(),
            Register::VectAddr => vic.vect_addr.get(),
            Register::DefVectAddr => vic.def_vect_addr.get(),
            Register::SlotAddr(n) => vic.slot_addr.get(n as usize).map_or(0, |r| r.get()),
            Register::SlotCntl(n) => vic.slot_cntl.get(n as usize).map_or(0, |r| r.get()),
            Register::Pinsel0 => self.pins().pinsel0.get(),
            Register::Pinsel1 => self.pins().pinsel1.get(),
            Register::ExtInt => self.ext().extint.get(),
            Register::ExtMode => self.ext().extmode.get(),
            Register::ExtPolar => self.ext().extpolar.get(),
            Register::T0Ir => self.flags(TIMER0_BASE).flags.get(),
            Register::T1Ir => self.flags(TIMER1_BASE).flags.get(),
            Register::Ilr => self.flags(RTC_BASE).flags.get(),
        }
    }

    fn write(&self, register: Register, value: u32) {
        let vic = self.vic();
        match register {
            Register::IrqStatus | Register::FiqStatus | Register::RawIntr => {}
            Register::IntSelect => vic.int_select.set(value),
            Register::IntEnable => vic.int_enable.set(value),
            Register::IntEnClr => vic.int_en_clr.set(value),
            Register::SoftInt => vic.soft_int.set(value),
            Register::SoftIntClear => vic.soft_int_clear.set(value),
            Register::VectAddr => vic.vect_addr.set(value),
            Register::DefVectAddr => vic.def_vect_addr.set(value),
            Register::SlotAddr(n) => {
                if let Some(r) = vic.slot_addr.get(n as usize) {
                    r.set(value)
                }
            }
            Register::SlotCntl(n) => {
                if let Some(r) = vic.slot_cntl.get(n as usize) {
                    r.set(value)
                }
            }
            Register::Pinsel0 => self.pins().pinsel0.set(value),
            Register::Pinsel1 => self.pins().pinsel1.set(value),
            Register::ExtInt => self.ext().extint.set(value),
            Register::ExtMode => self.ext().extmode.set(value),
            Register::ExtPolar => self.ext().extpolar.set(value),
            Register::T0Ir => self.flags(TIMER0_BASE).flags.set(value),
            Register::T1Ir => self.flags(TIMER1_BASE).flags.set(value),
            Register::Ilr => self.flags(RTC_BASE).flags.set(value),
        }
    }
}
