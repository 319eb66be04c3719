//! Cycle-accurate Game Boy / Game Boy Color timing core.
//!
//! This crate contains the picture unit's scanline timing, the interrupt
//! router and the memory-mapped bus that ties them together. The processor,
//! cartridge and pixel pipeline are external collaborators that plug in via
//! the [`bus`] and [`clock`] seams; the [`gameboy`] facade wires the rest.

/// Direct-mapped 64K address bus and the device trait behind it.
pub mod bus;

/// Cycle-debt budget and the per-cycle `Pulse` entry point.
pub mod clock;

/// High-level facade that wires every unit into a single machine.
pub mod gameboy;

/// Hardware modes and construction-time configuration.
pub mod hardware;

/// IE/IF registers, priority resolution and request capabilities.
pub mod interrupt;

/// Joypad input register and edge-triggered interrupt behavior.
pub mod joypad;

/// VRAM, WRAM and HRAM with their bank-select registers.
pub mod memory;

/// Object attribute memory and per-scanline object search.
pub mod oam;

/// Pixel Processing Unit (PPU) scanline state machine.
pub mod ppu;
