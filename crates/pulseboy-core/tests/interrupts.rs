use std::cell::RefCell;
use std::rc::Rc;

use pulseboy_core::{
    bus::AddressBus,
    interrupt::{IE_ADDR, IF_ADDR, Interrupt, InterruptRouter, NO_INTERRUPT},
};

#[test]
fn highest_pending_covers_every_register_state() {
    let mut router = InterruptRouter::new();
    for enable in 0..=0xFFu8 {
        router.write_enable(enable);
        for pending in 0..=0xFFu8 {
            router.write_pending(pending);
            let index = router.highest_pending_index();
            let live = pending & enable & 0x1F;
            assert!(index <= NO_INTERRUPT, "IE={enable:02X} IF={pending:02X}");
            assert_eq!(
                index == NO_INTERRUPT,
                live == 0,
                "IE={enable:02X} IF={pending:02X}"
            );
            if live != 0 {
                assert_eq!(index, live.trailing_zeros() as u8);
            }
        }
    }
}

#[test]
fn reserved_bits_always_read_back_set() {
    let mut router = InterruptRouter::new();
    for value in 0..=0xFFu8 {
        router.write_enable(value);
        router.write_pending(value.rotate_left(3));
        assert_eq!(router.read_enable() & 0xE0, 0xE0);
        assert_eq!(router.read_pending() & 0xE0, 0xE0);
        assert_eq!(router.read_enable() & 0x1F, value & 0x1F);
    }
}

#[test]
fn acknowledge_services_highest_priority_once() {
    let mut router = InterruptRouter::new();
    router.write_enable(0x1F);
    router.request(Interrupt::Serial);
    router.request(Interrupt::Timer);
    assert_eq!(router.acknowledge(), None, "IME clear");

    router.set_master_enable(true);
    let serviced = router.acknowledge();
    assert_eq!(serviced, Some(Interrupt::Timer));
    assert_eq!(serviced.map(Interrupt::vector), Some(0x50));
    assert!(!router.master_enable());
    assert!(router.is_pending(Interrupt::Serial));
    assert!(!router.is_pending(Interrupt::Timer));
}

#[test]
fn disabled_lines_stay_pending_without_service() {
    let mut router = InterruptRouter::new();
    router.request(Interrupt::VBlank);
    router.write_enable(Interrupt::Joypad.bit());
    router.set_master_enable(true);
    assert_eq!(router.highest_pending(), None);
    assert_eq!(router.acknowledge(), None);
    assert!(router.master_enable());
}

#[test]
fn requester_is_limited_to_granted_lines() {
    let router = InterruptRouter::new();
    let timer = router.requester(&[Interrupt::Timer]);
    timer.request(Interrupt::Timer);
    assert_eq!(router.read_pending(), 0xE4);
    timer.clear(Interrupt::Timer);
    assert_eq!(router.read_pending(), 0xE0);
}

#[test]
#[should_panic(expected = "not granted")]
fn requester_panics_on_foreign_line() {
    let router = InterruptRouter::new();
    let timer = router.requester(&[Interrupt::Timer]);
    timer.request(Interrupt::VBlank);
}

#[test]
fn registers_are_reachable_over_the_bus() {
    let router = Rc::new(RefCell::new(InterruptRouter::new()));
    let mut bus = AddressBus::new();
    bus.map_device(IF_ADDR..=IF_ADDR, &router);
    bus.map_device(IE_ADDR..=IE_ADDR, &router);

    bus.immediate_write(IE_ADDR, 0xFF);
    assert_eq!(bus.immediate_read(IE_ADDR), 0xFF);
    bus.immediate_write(IF_ADDR, 0x00);
    assert_eq!(bus.immediate_read(IF_ADDR), 0xE0);

    router.borrow().request(Interrupt::LcdStat);
    assert_eq!(bus.immediate_read(IF_ADDR), 0xE2);
    assert_eq!(router.borrow().highest_pending(), Some(Interrupt::LcdStat));
}
