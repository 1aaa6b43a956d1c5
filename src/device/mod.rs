//! Device roles and the cross-link transaction state.

pub mod car;
pub mod fob;

pub use self::car::Car;
pub use self::fob::{Fob, FobProvision};

use crate::config::ENC_PIN_LEN;

/// Sequencing state for the multi-hop transactions, one per device.
///
/// Set when the device initiates a board-link handshake, cleared on
/// completion, on any NACK sent or received, and by the watchdog. The
/// encrypted PIN of a pending pairing rides inside its variant instead of a
/// separate buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransactionState {
	Idle,
	WaitingForPairedEcdh { pin: [u8; ENC_PIN_LEN] },
	WaitingForCarEcdh,
}

impl TransactionState {
	pub fn is_idle(&self) -> bool {
		matches!(self, Self::Idle)
	}

	/// A board-link failure during a host-initiated transaction must also
	/// NACK the host; a button-initiated unlock fails silently.
	pub fn host_initiated(&self) -> bool {
		matches!(self, Self::WaitingForPairedEcdh { .. })
	}
}
