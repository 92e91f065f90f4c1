//! Registration API: arms and disarms interrupt channels.
use crate::channel::{Channel, ExtTrigger};
use crate::cpsr::{self, Cpsr, Guard, Snapshot, StatusRegister};
use crate::register::{Lpc214x, Register, RegisterBank};
use crate::vic::{self, Slot, SlotEntry};

/// Vectored Interrupt Controller together with the CPSR used for its critical sections.
#[derive(Debug)]
pub struct Vic<B, S> {
    bank: B,
    cpsr: S,
}

/// The VIC of the running LPC214x.
pub type Lpc2148 = Vic<Lpc214x, Cpsr>;

#[cfg(all(target_arch = "arm", not(target_feature = "mclass")))]
impl Lpc2148 {
    /// Returns the VIC of the running microcontroller.
    ///
    /// # Safety
    ///
    /// Must only be used on an LPC214x. See [`Lpc214x::steal`].
    #[inline]
    pub const unsafe fn steal() -> Self {
        Self::new(Lpc214x::steal(), Cpsr)
    }
}

impl<B: RegisterBank, S: StatusRegister> Vic<B, S> {
    /// Creates a controller on top of a register bank and a status register.
    #[inline]
    pub const fn new(bank: B, cpsr: S) -> Self {
        Self { bank, cpsr }
    }

    /// Returns the register bank.
    #[inline(always)]
    pub fn bank(&self) -> &B {
        &self.bank
    }

    /// Returns the status register.
    #[inline(always)]
    pub fn cpsr(&self) -> &S {
        &self.cpsr
    }

    /// Masks IRQs. Returns the status before the change.
    #[inline]
    pub fn disable_irq(&self) -> Snapshot {
        cpsr::disable_irq(&self.cpsr)
    }

    /// Unmasks IRQs. Returns the status before the change.
    #[inline]
    pub fn enable_irq(&self) -> Snapshot {
        cpsr::enable_irq(&self.cpsr)
    }

    /// Restores only the IRQ bit from `saved`.
    #[inline]
    pub fn restore_irq(&self, saved: Snapshot) -> Snapshot {
        cpsr::restore_irq(&self.cpsr, saved)
    }

    /// Masks FIQs. Returns the status before the change.
    #[inline]
    pub fn disable_fiq(&self) -> Snapshot {
        cpsr::disable_fiq(&self.cpsr)
    }

    /// Unmasks FIQs. Returns the status before the change.
    #[inline]
    pub fn enable_fiq(&self) -> Snapshot {
        cpsr::enable_fiq(&self.cpsr)
    }

    /// Restores only the FIQ bit from `saved`.
    #[inline]
    pub fn restore_fiq(&self, saved: Snapshot) -> Snapshot {
        cpsr::restore_fiq(&self.cpsr, saved)
    }

    /// Masks IRQs until the returned guard is dropped.
    #[inline]
    pub fn critical_section(&self) -> Guard<'_, S> {
        Guard::irq(&self.cpsr)
    }

    /// Binds `handler` and `control` to `slot`. See [`vic::update_vic_table`].
    #[inline]
    pub fn update_vic_table(&self, slot: impl Into<Slot>, handler: u32, control: u8) {
        vic::update_vic_table(&self.bank, slot, handler, control);
    }

    /// Reads back a vectored slot. `None` for the default slot.
    #[inline]
    pub fn read_slot(&self, slot: impl Into<Slot>) -> Option<SlotEntry> {
        vic::read_slot(&self.bank, slot)
    }

    /// Arms `channel` with `handler` in `slot`. External interrupt channels get their
    /// default trigger.
    #[inline]
    pub fn enable(&self, channel: Channel, slot: impl Into<Slot>, handler: u32) {
        self.arm(channel, slot.into(), handler, channel.default_trigger());
    }

    /// Arms an external interrupt channel with an explicit trigger. For other channels
    /// the trigger is ignored.
    #[inline]
    pub fn enable_with(
        &self,
        channel: Channel,
        slot: impl Into<Slot>,
        handler: u32,
        trigger: ExtTrigger,
    ) {
        self.arm(channel, slot.into(), handler, Some(trigger));
    }

    /// Stops future dispatch of `channel`. The slot keeps its contents.
    #[inline]
    pub fn disable(&self, channel: Channel) {
        self.bank.write(Register::IntEnClr, channel.mask());
    }

    fn arm(&self, channel: Channel, slot: Slot, handler: u32, trigger: Option<ExtTrigger>) {
        let _cs = self.critical_section();

        // 1. nothing half-configured can fire
        self.disable(channel);

        // 2. pin function, mode and polarity
        if let Some(trigger) = trigger {
            channel.configure_pin(&self.bank, trigger);
        }

        // 3. reconfiguring may have latched a request
        channel.clear_pending(&self.bank);

        // 4. vector slot
        self.warn_on_collision(channel, slot);
        log::trace!("binding {channel:?} to {slot:?} at {handler:#010x}");
        vic::update_vic_table(&self.bank, slot, handler, channel.control());

        // 5. IRQ, not FIQ
        self.bank.modify(Register::IntSelect, |v| v & !channel.mask());

        // 6. live
        self.bank.write(Register::IntEnable, channel.mask());
    }

    /// Logs when `slot` still routes another channel that is enabled.
    fn warn_on_collision(&self, channel: Channel, slot: Slot) {
        let Some(entry) = vic::read_slot(&self.bank, slot) else {
            return;
        };
        let previous = entry.channel();
        if entry.is_enabled()
            && previous != channel.number()
            && self.read_int_enable() & (1 << previous) != 0
        {
            log::debug!(
                "{slot:?} taken over by {channel:?}, channel {previous} loses its vector"
            );
        }
    }

    /// Arms the watchdog time-out interrupt (channel 0).
    pub fn enable_watchdog(&self, slot: impl Into<Slot>, handler: u32) {
        self.enable(Channel::Watchdog, slot, handler);
    }

    /// Disables the watchdog interrupt. The time-out flag is untouched.
    pub fn disable_watchdog(&self) {
        self.disable(Channel::Watchdog);
    }

    /// Arms the Timer0 match/capture interrupt (channel 4).
    pub fn enable_timer0(&self, slot: impl Into<Slot>, handler: u32) {
        self.enable(Channel::Timer0, slot, handler);
    }

    /// Disables the Timer0 interrupt.
    pub fn disable_timer0(&self) {
        self.disable(Channel::Timer0);
    }

    /// Arms the Timer1 match/capture interrupt (channel 5).
    pub fn enable_timer1(&self, slot: impl Into<Slot>, handler: u32) {
        self.enable(Channel::Timer1, slot, handler);
    }

    /// Disables the Timer1 interrupt.
    pub fn disable_timer1(&self) {
        self.disable(Channel::Timer1);
    }

    /// Arms the RTC interrupt (channel 13).
    pub fn enable_rtc(&self, slot: impl Into<Slot>, handler: u32) {
        self.enable(Channel::Rtc, slot, handler);
    }

    /// Disables the RTC interrupt.
    pub fn disable_rtc(&self) {
        self.disable(Channel::Rtc);
    }

    /// Arms `EINT0` on P0.16, falling edge.
    pub fn enable_eint0(&self, slot: impl Into<Slot>, handler: u32) {
        self.enable(Channel::Eint0, slot, handler);
    }

    /// Arms `EINT0` on P0.16 with an explicit trigger.
    pub fn enable_eint0_with(&self, slot: impl Into<Slot>, handler: u32, trigger: ExtTrigger) {
        self.enable_with(Channel::Eint0, slot, handler, trigger);
    }

    /// Disables `EINT0`. The pin keeps its function.
    pub fn disable_eint0(&self) {
        self.disable(Channel::Eint0);
    }

    /// Arms `EINT2` on P0.15, rising edge.
    pub fn enable_eint2(&self, slot: impl Into<Slot>, handler: u32) {
        self.enable(Channel::Eint2, slot, handler);
    }

    /// Arms `EINT2` on P0.15 with an explicit trigger.
    pub fn enable_eint2_with(&self, slot: impl Into<Slot>, handler: u32, trigger: ExtTrigger) {
        self.enable_with(Channel::Eint2, slot, handler, trigger);
    }

    /// Disables `EINT2`.
    pub fn disable_eint2(&self) {
        self.disable(Channel::Eint2);
    }

    /// Returns `VICIntEnable`.
    #[inline]
    pub fn read_int_enable(&self) -> u32 {
        self.bank.read(Register::IntEnable)
    }

    /// Enables the channels set in `mask`. Zeros have no effect.
    #[inline]
    pub fn write_int_enable(&self, mask: u32) {
        self.bank.write(Register::IntEnable, mask);
    }

    /// Disables every channel.
    #[inline]
    pub fn clear_int_enable(&self) {
        self.bank.write(Register::IntEnClr, u32::MAX);
    }

    /// Disables every channel and returns the mask from before.
    ///
    /// Not atomic: call it with IRQs masked if a handler may change the mask.
    #[inline]
    pub fn read_and_clear_int_enable(&self) -> u32 {
        let old = self.read_int_enable();
        self.clear_int_enable();
        old
    }

    /// Clears every software-forced line.
    #[inline]
    pub fn clear_soft_int(&self) {
        self.bank.write(Register::SoftIntClear, u32::MAX);
    }

    /// Clears every software-forced line and returns them from before.
    #[inline]
    pub fn read_and_clear_soft_int(&self) -> u32 {
        let old = self.bank.read(Register::SoftInt);
        self.clear_soft_int();
        old
    }

    /// Asserted lines that are enabled and routed to IRQ (`VICIRQStatus`).
    #[inline]
    pub fn irq_status(&self) -> u32 {
        self.bank.read(Register::IrqStatus)
    }

    /// Every asserted line (`VICRawIntr`).
    #[inline]
    pub fn raw_interrupts(&self) -> u32 {
        self.bank.read(Register::RawIntr)
    }
}
