use std::cell::Cell;

use lpc_vic::sim::{SimBank, SimCpsr};
use lpc_vic::{handler_address, Channel, Register, RegisterBank, Vic};

thread_local! {
    static BANK: &'static SimBank = Box::leak(Box::new(SimBank::new()));
    static PRESSES: Cell<u32> = const { Cell::new(0) };
    static TICKS: Cell<u32> = const { Cell::new(0) };
}

fn bank() -> &'static SimBank {
    BANK.with(|bank| *bank)
}

#[lpc_vic::isr(bank = bank, channel = Eint0)]
fn on_button() {
    PRESSES.with(|p| p.set(p.get() + 1));
}

#[lpc_vic::isr(bank = bank)]
fn on_tick() {
    TICKS.with(|t| t.set(t.get() + 1));
    // only MR0 is handled here
    bank().write(Register::T0Ir, 0x1);
}

fn vic() -> Vic<&'static SimBank, SimCpsr> {
    Vic::new(bank(), SimCpsr::new(0x1F))
}

#[test]
fn handler_clears_its_channel_and_acknowledges() {
    let vic = vic();
    vic.enable_eint0(0u8, handler_address(on_button));

    bank().assert_line(Channel::Eint0);
    let address = bank().dispatch();
    assert_eq!(address, Some(handler_address(on_button)));
    unsafe { on_button() };

    assert_eq!(PRESSES.with(Cell::get), 1);
    assert_eq!(bank().read(Register::ExtInt), 0);
    assert_eq!(bank().in_service(), None);
    assert_eq!(bank().dispatch(), None);
}

#[test]
fn handler_without_channel_only_acknowledges() {
    let vic = vic();
    vic.enable_timer0(4u8, handler_address(on_tick));

    bank().assert_line(Channel::Timer0);
    assert_eq!(bank().dispatch(), Some(handler_address(on_tick)));
    bank().clear_writes();
    unsafe { on_tick() };

    assert_eq!(
        bank().writes().as_slice(),
        &[(Register::T0Ir, 0x1), (Register::VectAddr, 0)]
    );
    assert_eq!(TICKS.with(Cell::get), 1);
    assert_eq!(bank().dispatch(), None);
}
