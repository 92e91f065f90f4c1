//! Interrupt channels and their fixed VIC configuration.
use crate::register::{Register, RegisterBank};

/// Hardware interrupt sources handled by this crate. The discriminant is the VIC channel.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum Channel {
    Watchdog = 0,
    Timer0 = 4,
    Timer1 = 5,
    Rtc = 13,
    /// External interrupt 0 (P0.16).
    Eint0 = 14,
    /// External interrupt 2 (P0.15).
    Eint2 = 16,
}

/// Sensitivity of an external interrupt pin.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TriggerMode {
    Level,
    Edge,
}

/// Active level or edge of an external interrupt pin.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Polarity {
    /// Low level, or falling edge.
    Low,
    /// High level, or rising edge.
    High,
}

/// Trigger configuration of an external interrupt pin.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ExtTrigger {
    pub mode: TriggerMode,
    pub polarity: Polarity,
}

impl ExtTrigger {
    pub const LOW_LEVEL: Self = Self::new(TriggerMode::Level, Polarity::Low);
    pub const HIGH_LEVEL: Self = Self::new(TriggerMode::Level, Polarity::High);
    pub const FALLING_EDGE: Self = Self::new(TriggerMode::Edge, Polarity::Low);
    pub const RISING_EDGE: Self = Self::new(TriggerMode::Edge, Polarity::High);

    #[inline]
    pub const fn new(mode: TriggerMode, polarity: Polarity) -> Self {
        Self { mode, polarity }
    }
}

/// How a channel's peripheral drops its interrupt request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PendingClear {
    /// The flag is only cleared by a reset (watchdog time-out).
    None,
    /// Write the given bits to a write-one-to-clear register.
    WriteOne(Register, u32),
    /// Write back the current value of a write-one-to-clear register.
    WriteBack(Register),
}

/// Pin and external-interrupt block configuration of an `EINTn` channel.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ExtPin {
    /// Pin function select register.
    pub pinsel: Register,
    /// Bit offset of the pin's two-bit function field.
    pub shift: u8,
    /// Function code selecting `EINTn`.
    pub function: u32,
    /// Bit of this input in `EXTINT`, `EXTMODE` and `EXTPOLAR`.
    pub flag: u32,
    /// Trigger used when none is given.
    pub default_trigger: ExtTrigger,
}

/// Fixed VIC configuration of a channel.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ChannelInfo {
    pub channel: Channel,
    /// Control word for `VICVectCntlN`: slot enable plus channel number.
    pub control: u8,
    pub pending: PendingClear,
    pub pin: Option<ExtPin>,
}

/// Valid bits of `EXTMODE` and `EXTPOLAR`. Higher bits must be written as zero.
const EXT_MASK: u32 = 0x0F;

static CHANNELS: [ChannelInfo; 6] = [
    ChannelInfo {
        channel: Channel::Watchdog,
        control: 0x20,
        pending: PendingClear::None,
        pin: None,
    },
    ChannelInfo {
        channel: Channel::Timer0,
        control: 0x24,
        pending: PendingClear::WriteBack(Register::T0Ir),
        pin: None,
    },
    ChannelInfo {
        channel: Channel::Timer1,
        control: 0x25,
        pending: PendingClear::WriteBack(Register::T1Ir),
        pin: None,
    },
    ChannelInfo {
        channel: Channel::Rtc,
        control: 0x2D,
        pending: PendingClear::WriteBack(Register::Ilr),
        pin: None,
    },
    ChannelInfo {
        channel: Channel::Eint0,
        control: 0x2E,
        pending: PendingClear::WriteOne(Register::ExtInt, 0x1),
        pin: Some(ExtPin {
            pinsel: Register::Pinsel1,
            shift: 0,
            function: 0b01,
            flag: 0x1,
            default_trigger: ExtTrigger::FALLING_EDGE,
        }),
    },
    ChannelInfo {
        channel: Channel::Eint2,
        control: 0x30,
        pending: PendingClear::WriteOne(Register::ExtInt, 0x4),
        pin: Some(ExtPin {
            pinsel: Register::Pinsel0,
            shift: 30,
            function: 0b10,
            flag: 0x4,
            default_trigger: ExtTrigger::RISING_EDGE,
        }),
    },
];

impl Channel {
    /// Every channel, in ascending channel order.
    pub const ALL: [Channel; 6] = [
        Channel::Watchdog,
        Channel::Timer0,
        Channel::Timer1,
        Channel::Rtc,
        Channel::Eint0,
        Channel::Eint2,
    ];

    /// Returns the channel's entry in the configuration table.
    #[inline]
    pub fn info(self) -> &'static ChannelInfo {
        match self {
            Channel::Watchdog => &CHANNELS[0],
            Channel::Timer0 => &CHANNELS[1],
            Channel::Timer1 => &CHANNELS[2],
            Channel::Rtc => &CHANNELS[3],
            Channel::Eint0 => &CHANNELS[4],
            Channel::Eint2 => &CHANNELS[5],
        }
    }

    /// VIC channel number.
    #[inline]
    pub const fn number(self) -> u8 {
        self as u8
    }

    /// Bit of the channel in the enable, select and status registers.
    #[inline]
    pub const fn mask(self) -> u32 {
        1 << self.number()
    }

    /// Control word for the channel's vector slot.
    #[inline]
    pub fn control(self) -> u8 {
        self.info().control
    }

    /// Trigger applied by the plain `enable` call, for external interrupt channels.
    #[inline]
    pub fn default_trigger(self) -> Option<ExtTrigger> {
        self.info().pin.map(|pin| pin.default_trigger)
    }

    /// Drops the peripheral's interrupt request.
    ///
    /// Handlers call this before acknowledging the VIC, or the request fires again.
    #[inline]
    pub fn clear_pending<B: RegisterBank>(self, bank: &B) {
        match self.info().pending {
            PendingClear::None => {}
            PendingClear::WriteOne(register, bits) => bank.write(register, bits),
            PendingClear::WriteBack(register) => bank.write(register, bank.read(register)),
        }
    }

    /// Routes the pin to `EINTn` and programs its trigger. No-op for other channels.
    ///
    /// Changing the trigger may latch a spurious request, so the caller clears the
    /// pending flag afterwards.
    pub fn configure_pin<B: RegisterBank>(self, bank: &B, trigger: ExtTrigger) {
        let Some(pin) = self.info().pin else {
            return;
        };
        let field: u32 = 0b11 << pin.shift;
        bank.modify(pin.pinsel, |v| (v & !field) | (pin.function << pin.shift));
        bank.modify(Register::ExtMode, |v| match trigger.mode {
            TriggerMode::Level => v & EXT_MASK & !pin.flag,
            TriggerMode::Edge => (v & EXT_MASK & !pin.flag) | pin.flag,
        });
        bank.modify(Register::ExtPolar, |v| match trigger.polarity {
            Polarity::Low => v & EXT_MASK & !pin.flag,
            Polarity::High => (v & EXT_MASK & !pin.flag) | pin.flag,
        });
    }
}

impl TryFrom<u8> for Channel {
    type Error = u8;

    #[inline]
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Watchdog),
            4 => Ok(Self::Timer0),
            5 => Ok(Self::Timer1),
            13 => Ok(Self::Rtc),
            14 => Ok(Self::Eint0),
            16 => Ok(Self::Eint2),
            _ => Err(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimBank;
    use crate::vic::{CHANNEL_FIELD, SLOT_ENABLE};

    #[test]
    fn table_matches_channels() {
        for channel in Channel::ALL {
            let info = channel.info();
            assert_eq!(info.channel, channel);
            assert_eq!(info.control, SLOT_ENABLE | channel.number());
            assert_eq!(info.control & CHANNEL_FIELD, channel.number());
            assert_eq!(Channel::try_from(channel.number()), Ok(channel));
        }
        assert_eq!(Channel::try_from(15), Err(15));
    }

    #[test]
    fn control_bytes() {
        let controls: [u8; 6] = Channel::ALL.map(Channel::control);
        assert_eq!(controls, [0x20, 0x24, 0x25, 0x2D, 0x2E, 0x30]);
        assert_eq!(Channel::Eint2.mask(), 1 << 16);
    }

    #[test]
    fn eint0_pin_configuration() {
        let bank = SimBank::new();
        bank.write(Register::Pinsel1, 0xFFFF_FFFE);
        bank.write(Register::ExtMode, 0x4);
        bank.write(Register::ExtPolar, 0x5);

        Channel::Eint0.configure_pin(&bank, ExtTrigger::FALLING_EDGE);
        assert_eq!(bank.read(Register::Pinsel1), 0xFFFF_FFFD);
        assert_eq!(bank.read(Register::ExtMode), 0x5);
        assert_eq!(bank.read(Register::ExtPolar), 0x4);

        Channel::Eint0.configure_pin(&bank, ExtTrigger::HIGH_LEVEL);
        assert_eq!(bank.read(Register::ExtMode), 0x4);
        assert_eq!(bank.read(Register::ExtPolar), 0x5);
    }

    #[test]
    fn eint2_pin_configuration() {
        let bank = SimBank::new();
        bank.write(Register::Pinsel0, 0x4000_0005);

        Channel::Eint2.configure_pin(&bank, Channel::Eint2.default_trigger().unwrap());
        assert_eq!(bank.read(Register::Pinsel0), 0x8000_0005);
        assert_eq!(bank.read(Register::ExtMode), 0x4);
        assert_eq!(bank.read(Register::ExtPolar), 0x4);
    }

    #[test]
    fn other_channels_leave_pins_alone() {
        let bank = SimBank::new();
        Channel::Timer0.configure_pin(&bank, ExtTrigger::RISING_EDGE);
        assert!(bank.writes().is_empty());
        assert_eq!(Channel::Rtc.default_trigger(), None);
    }

    #[test]
    fn clear_pending_sequences() {
        let bank = SimBank::new();
        for channel in Channel::ALL {
            bank.assert_line(channel);
        }
        for channel in Channel::ALL {
            channel.clear_pending(&bank);
        }
        // only the watchdog flag survives a software clear
        assert_eq!(bank.read(Register::RawIntr), Channel::Watchdog.mask());
    }
}
