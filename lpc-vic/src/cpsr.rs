//! IRQ/FIQ masking through the Current Program Status Register.
//!
//! These primitives are not a nesting counter: a bare [`enable_irq`] re-enables IRQs no
//! matter how many [`disable_irq`] calls came before. Nested critical sections thread
//! the [`Snapshot`] through [`restore_irq`], or use a [`Guard`], which does it on drop.
use core::marker::PhantomData;

use critical_section::CriticalSection;

/// IRQ disable bit (`I`).
pub const IRQ_MASK: u32 = 0x0000_0080;
/// FIQ disable bit (`F`).
pub const FIQ_MASK: u32 = 0x0000_0040;
/// Both interrupt disable bits.
pub const INT_MASK: u32 = IRQ_MASK | FIQ_MASK;

/// Read/write access to a program status register.
pub trait StatusRegister {
    /// Reads the register.
    fn read(&self) -> u32;

    /// Writes the register.
    fn write(&self, value: u32);
}

impl<S: StatusRegister + ?Sized> StatusRegister for &S {
    #[inline]
    fn read(&self) -> u32 {
        (**self).read()
    }

    #[inline]
    fn write(&self, value: u32) {
        (**self).write(value)
    }
}

/// The CPSR of the running core.
#[derive(Clone, Copy, Debug, Default)]
pub struct Cpsr;

#[cfg(all(target_arch = "arm", not(target_feature = "mclass")))]
impl StatusRegister for Cpsr {
    #[instruction_set(arm::a32)]
    fn read(&self) -> u32 {
        let cpsr: u32;
        // SAFETY: reading the CPSR has no side effects
        unsafe {
            core::arch::asm!("mrs {}, cpsr", out(reg) cpsr, options(nomem, nostack, preserves_flags))
        };
        cpsr
    }

    #[instruction_set(arm::a32)]
    fn write(&self, value: u32) {
        // Only the control field: mode and interrupt masks. No `nomem`, so the write
        // also acts as a compiler barrier around critical sections.
        // SAFETY: callers only change the I/F bits of a value read from the CPSR
        unsafe { core::arch::asm!("msr cpsr_c, {}", in(reg) value, options(nostack)) };
    }
}

/// Processor status captured before a mask change.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Snapshot(u32);

impl Snapshot {
    /// Wraps a raw status register value.
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the raw status register value.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns `true` if IRQs were masked.
    #[inline]
    pub const fn irq_masked(self) -> bool {
        self.0 & IRQ_MASK != 0
    }

    /// Returns `true` if FIQs were masked.
    #[inline]
    pub const fn fiq_masked(self) -> bool {
        self.0 & FIQ_MASK != 0
    }
}

#[inline]
fn update<S: StatusRegister + ?Sized, F: FnOnce(u32) -> u32>(cpsr: &S, f: F) -> Snapshot {
    let old = cpsr.read();
    cpsr.write(f(old));
    Snapshot(old)
}

/// Copies the bits of `mask` from `saved` into the current status register.
#[inline]
fn restore<S: StatusRegister + ?Sized>(cpsr: &S, saved: Snapshot, mask: u32) -> Snapshot {
    update(cpsr, |current| (current & !mask) | (saved.0 & mask))
}

/// Masks IRQs. Returns the status before the change.
#[inline]
pub fn disable_irq<S: StatusRegister + ?Sized>(cpsr: &S) -> Snapshot {
    update(cpsr, |v| v | IRQ_MASK)
}

/// Unmasks IRQs. Returns the status before the change.
#[inline]
pub fn enable_irq<S: StatusRegister + ?Sized>(cpsr: &S) -> Snapshot {
    update(cpsr, |v| v & !IRQ_MASK)
}

/// Restores only the IRQ bit from `saved`; every other bit keeps its current value.
/// Returns the status before the change.
#[inline]
pub fn restore_irq<S: StatusRegister + ?Sized>(cpsr: &S, saved: Snapshot) -> Snapshot {
    restore(cpsr, saved, IRQ_MASK)
}

/// Masks FIQs. Returns the status before the change.
#[inline]
pub fn disable_fiq<S: StatusRegister + ?Sized>(cpsr: &S) -> Snapshot {
    update(cpsr, |v| v | FIQ_MASK)
}

/// Unmasks FIQs. Returns the status before the change.
#[inline]
pub fn enable_fiq<S: StatusRegister + ?Sized>(cpsr: &S) -> Snapshot {
    update(cpsr, |v| v & !FIQ_MASK)
}

/// Restores only the FIQ bit from `saved`. Returns the status before the change.
#[inline]
pub fn restore_fiq<S: StatusRegister + ?Sized>(cpsr: &S, saved: Snapshot) -> Snapshot {
    restore(cpsr, saved, FIQ_MASK)
}

/// Scoped critical section. Masks interrupts when created and restores the previous
/// state of the masked bits when dropped, on every exit path.
#[must_use = "interrupts are restored as soon as the guard is dropped"]
pub struct Guard<'a, S: StatusRegister + ?Sized> {
    cpsr: &'a S,
    saved: Snapshot,
    mask: u32,
    // not Send: the saved state belongs to the current context
    _not_send: PhantomData<*mut ()>,
}

impl<'a, S: StatusRegister + ?Sized> Guard<'a, S> {
    #[inline]
    fn new(cpsr: &'a S, mask: u32) -> Self {
        let saved = update(cpsr, |v| v | mask);
        Self {
            cpsr,
            saved,
            mask,
            _not_send: PhantomData,
        }
    }

    /// Masks IRQs until the guard is dropped.
    #[inline]
    pub fn irq(cpsr: &'a S) -> Self {
        Self::new(cpsr, IRQ_MASK)
    }

    /// Masks FIQs until the guard is dropped.
    #[inline]
    pub fn fiq(cpsr: &'a S) -> Self {
        Self::new(cpsr, FIQ_MASK)
    }

    /// Masks both IRQs and FIQs until the guard is dropped.
    #[inline]
    pub fn all(cpsr: &'a S) -> Self {
        Self::new(cpsr, INT_MASK)
    }

    /// Status captured when the guard was created.
    #[inline]
    pub fn saved(&self) -> Snapshot {
        self.saved
    }

    /// Token for `critical_section::Mutex`, valid while the guard lives.
    ///
    /// Returns `None` for a guard that leaves IRQs unmasked ([`Guard::fiq`]).
    #[inline]
    pub fn token(&self) -> Option<CriticalSection<'_>> {
        if self.mask & IRQ_MASK == 0 {
            return None;
        }
        // SAFETY: this guard masks IRQs until it is dropped
        Some(unsafe { CriticalSection::new() })
    }
}

impl<S: StatusRegister + ?Sized> Drop for Guard<'_, S> {
    #[inline]
    fn drop(&mut self) {
        restore(self.cpsr, self.saved, self.mask);
    }
}

/// Runs `f` with IRQs masked, then restores the previous IRQ state.
#[inline]
pub fn free<S, F, R>(cpsr: &S, f: F) -> R
where
    S: StatusRegister + ?Sized,
    F: FnOnce(CriticalSection<'_>) -> R,
{
    let _guard = Guard::irq(cpsr);
    // SAFETY: IRQs stay masked until `_guard` is dropped, after `f` returns
    f(unsafe { CriticalSection::new() })
}

#[cfg(all(
    target_arch = "arm",
    not(target_feature = "mclass"),
    feature = "critical-section-single-core"
))]
mod single_core {
    use super::{disable_irq, enable_irq, Cpsr};
    use critical_section::{set_impl, Impl, RawRestoreState};

    struct SingleCoreCriticalSection;
    set_impl!(SingleCoreCriticalSection);

    unsafe impl Impl for SingleCoreCriticalSection {
        unsafe fn acquire() -> RawRestoreState {
            // `true` if IRQs were enabled before
            !disable_irq(&Cpsr).irq_masked()
        }

        unsafe fn release(was_enabled: RawRestoreState) {
            if was_enabled {
                enable_irq(&Cpsr);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimCpsr;

    const SYSTEM_MODE: u32 = 0x1F;

    #[test]
    fn disable_then_enable_round_trip() {
        let cpsr = SimCpsr::new(SYSTEM_MODE);
        let before = disable_irq(&cpsr);
        assert!(!before.irq_masked());
        assert!(cpsr.irq_masked());
        let masked = enable_irq(&cpsr);
        assert!(masked.irq_masked());
        assert_eq!(cpsr.bits(), SYSTEM_MODE);
    }

    #[test]
    fn enable_is_not_a_nesting_counter() {
        let cpsr = SimCpsr::new(SYSTEM_MODE);
        disable_irq(&cpsr);
        disable_irq(&cpsr);
        enable_irq(&cpsr);
        assert!(!cpsr.irq_masked());
    }

    #[test]
    fn restore_copies_only_the_irq_bit() {
        let cpsr = SimCpsr::new(SYSTEM_MODE);
        let saved = disable_irq(&cpsr);
        disable_irq(&cpsr);
        // something else changes while nested
        disable_fiq(&cpsr);
        cpsr.set_bits(cpsr.bits() | 0x2000_0000);

        let before = restore_irq(&cpsr, saved);
        assert!(before.irq_masked());
        assert_eq!(cpsr.bits(), SYSTEM_MODE | FIQ_MASK | 0x2000_0000);
    }

    #[test]
    fn fiq_bit_is_independent() {
        let cpsr = SimCpsr::new(SYSTEM_MODE | IRQ_MASK);
        let saved = disable_fiq(&cpsr);
        assert!(cpsr.fiq_masked());
        assert!(cpsr.irq_masked());
        enable_irq(&cpsr);
        restore_fiq(&cpsr, saved);
        assert!(!cpsr.fiq_masked());
        assert!(!cpsr.irq_masked());
        enable_fiq(&cpsr);
        assert_eq!(cpsr.bits(), SYSTEM_MODE);
    }

    #[test]
    fn guards_nest() {
        let cpsr = SimCpsr::new(SYSTEM_MODE);
        {
            let outer = Guard::irq(&cpsr);
            assert!(!outer.saved().irq_masked());
            {
                let inner = Guard::irq(&cpsr);
                assert!(inner.saved().irq_masked());
            }
            assert!(cpsr.irq_masked());
        }
        assert!(!cpsr.irq_masked());
    }

    #[test]
    fn guard_restores_on_early_return() {
        fn find(cpsr: &SimCpsr, values: &[u32]) -> Option<usize> {
            let _guard = Guard::all(cpsr);
            for (i, v) in values.iter().enumerate() {
                if *v == 3 {
                    return Some(i);
                }
            }
            None
        }

        let cpsr = SimCpsr::new(SYSTEM_MODE);
        assert_eq!(find(&cpsr, &[1, 2, 3, 4]), Some(2));
        assert_eq!(cpsr.bits(), SYSTEM_MODE);
    }

    #[test]
    fn free_keeps_an_outer_mask() {
        let cpsr = SimCpsr::new(SYSTEM_MODE | IRQ_MASK);
        let value = free(&cpsr, |_| {
            assert!(cpsr.irq_masked());
            7
        });
        assert_eq!(value, 7);
        assert!(cpsr.irq_masked());
    }

    #[test]
    fn free_hands_out_a_usable_token() {
        use core::cell::Cell;
        use critical_section::Mutex;

        let cpsr = SimCpsr::new(SYSTEM_MODE);
        let counter = Mutex::new(Cell::new(0u32));
        free(&cpsr, |cs| {
            let c = counter.borrow(cs);
            c.set(c.get() + 1);
        });
        free(&cpsr, |cs| assert_eq!(counter.borrow(cs).get(), 1));
        assert!(!cpsr.irq_masked());
    }

    #[test]
    fn token_only_while_irqs_are_masked() {
        let cpsr = SimCpsr::new(SYSTEM_MODE);
        {
            let fiq = Guard::fiq(&cpsr);
            assert!(!cpsr.irq_masked());
            assert!(fiq.token().is_none());
        }
        {
            let irq = Guard::irq(&cpsr);
            assert!(irq.token().is_some());
        }
        let all = Guard::all(&cpsr);
        assert!(all.token().is_some());
        assert!(cpsr.irq_masked());
    }
}
