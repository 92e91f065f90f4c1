//! Vector table: the 16 (handler address, control word) slots of the VIC.
use crate::register::{Register, RegisterBank, N_SLOTS};

/// Valid bits of a `VICVectCntlN` register.
pub const CONTROL_MASK: u8 = 0x3F;
/// Slot enable bit of a control word.
pub const SLOT_ENABLE: u8 = 0x20;
/// Channel number field of a control word.
pub const CHANNEL_FIELD: u8 = 0x1F;

/// Where a handler address is stored.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Slot {
    /// One of the 16 vectored slots. Lower slots have higher priority.
    Vectored(u8),
    /// The non-vectored default handler (`VICDefVectAddr`).
    Default,
}

impl Slot {
    /// Maps `0..=15` to a vectored slot and anything else to [`Slot::Default`].
    #[inline]
    pub const fn new(index: u16) -> Self {
        match index < N_SLOTS as u16 {
            true => Self::Vectored(index as u8),
            false => Self::Default,
        }
    }

    /// Returns the slot index, or `None` for the default handler.
    #[inline]
    pub const fn index(self) -> Option<u8> {
        match self {
            Self::Vectored(n) if (n as usize) < N_SLOTS => Some(n),
            _ => None,
        }
    }
}

impl From<u16> for Slot {
    #[inline]
    fn from(index: u16) -> Self {
        Self::new(index)
    }
}

impl From<u8> for Slot {
    #[inline]
    fn from(index: u8) -> Self {
        Self::new(index as u16)
    }
}

/// A slot's registers as read back from the bank.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SlotEntry {
    /// Handler address.
    pub address: u32,
    /// Control word.
    pub control: u8,
}

impl SlotEntry {
    /// Returns `true` if the slot is enabled in its control word.
    #[inline]
    pub const fn is_enabled(&self) -> bool {
        self.control & SLOT_ENABLE != 0
    }

    /// Channel number encoded in the control word.
    #[inline]
    pub const fn channel(&self) -> u8 {
        self.control & CHANNEL_FIELD
    }
}

/// Binds `handler` and `control` to `slot`.
///
/// A vectored slot gets exactly its own address/control pair written, with `control`
/// truncated to six bits. Any other slot only writes the default handler address.
/// An occupied slot is silently overwritten.
#[inline]
pub fn update_vic_table<B: RegisterBank>(bank: &B, slot: impl Into<Slot>, handler: u32, control: u8) {
    match slot.into().index() {
        Some(n) => {
            bank.write(Register::SlotAddr(n), handler);
            bank.write(Register::SlotCntl(n), (control & CONTROL_MASK) as u32);
        }
        None => bank.write(Register::DefVectAddr, handler), // non-vectored IRQ
    }
}

/// Reads back the registers of a vectored slot. Returns `None` for the default slot.
#[inline]
pub fn read_slot<B: RegisterBank>(bank: &B, slot: impl Into<Slot>) -> Option<SlotEntry> {
    slot.into().index().map(|n| SlotEntry {
        address: bank.read(Register::SlotAddr(n)),
        control: (bank.read(Register::SlotCntl(n)) as u8) & CONTROL_MASK,
    })
}
