//! Board interfaces the protocol core is written against.
//!
//! Hardware bring-up (clocks, UART peripherals, flash and EEPROM drivers,
//! button wiring) lives outside this crate. Boards hand the core byte-level
//! serial access, the flash page holding the fob record, the provisioning
//! EEPROM and the unlock button; test suites substitute in-memory fakes.

use thiserror::Error;

/// One UART, polled a byte at a time; writes block until drained.
pub trait SerialPort {
	fn read_byte(&mut self) -> Option<u8>;
	fn write_all(&mut self, buf: &[u8]);
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("flash device error")]
pub struct FlashError;

/// The flash page holding the persistent fob record. Both operations block
/// until the hardware finishes.
pub trait FlashPage {
	fn erase(&mut self) -> Result<(), FlashError>;
	fn program(&mut self, data: &[u8]) -> Result<(), FlashError>;
	fn read(&self, buf: &mut [u8]);
}

/// Factory-provisioned EEPROM, read-only at runtime.
pub trait Eeprom {
	fn read(&self, offset: usize, buf: &mut [u8]);
}

/// Raw unlock-button level; debouncing is the caller's job.
pub trait Button {
	fn is_pressed(&mut self) -> bool;
}
