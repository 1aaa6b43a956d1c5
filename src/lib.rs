//! Protocol core of a car key-fob access-control system.
//!
//! Three device roles share this core: a car, a paired fob and an unpaired
//! fob. Each device drives two point-to-point serial links — one to the host
//! PC, one to a peer board — through a byte-stream framing codec, an
//! ephemeral-ECDH/AES-CBC session layer and a command dispatcher. Three
//! multi-hop transactions (pairing a fob under PIN authentication, enabling a
//! packaged feature, unlocking the car) are sequenced across the two links by
//! a per-device transaction state.
//!
//! All hardware access goes through the traits in [`hal`], so the whole core
//! runs unmodified on the host for testing.

#![no_std]
#![warn(rust_2018_idioms)]

#[cfg(test)]
#[macro_use]
extern crate std;

#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate log;

pub mod command;
pub mod config;
pub mod crc;
pub mod crypto;
pub mod device;
pub mod entropy;
pub mod error;
pub mod framing;
pub mod hal;
pub mod link;
pub mod session;
pub mod state;

pub use crate::command::Command;
pub use crate::device::TransactionState;
pub use crate::device::car::Car;
pub use crate::device::fob::{Fob, FobProvision};
pub use crate::error::ProtocolError;
