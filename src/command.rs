//! The closed command set carried in the first payload byte.

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::config::{CAR_SECRET_LEN, ECDH_PUBLIC_LEN, ENC_PIN_LEN, FEATURE_BLOB_LEN, IV_LEN};
use crate::error::ProtocolError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Command {
	/// Session request: ephemeral public key and fresh IV, always cleartext.
	NewEcdh = 0xAB,
	/// Session response: responder's ephemeral public key, always cleartext.
	ReturnEcdh = 0xE0,
	/// Host asks a paired fob to stand by for pairing.
	PairPairedEnter = 0x4D,
	/// Host hands an unpaired fob the hashed PIN and starts the pairing run.
	PairUnpairedStart = 0x50,
	/// Unpaired fob requests the car secret, proving the PIN.
	GetSecret = 0x47,
	/// Paired fob hands over the car secret.
	ReturnSecret = 0x52,
	/// Host delivers an encrypted feature package.
	EnableFeature = 0x45,
	/// Fob presents the unlock secret and its feature bitfield.
	UnlockCar = 0x55,
	Ack = 0x41,
	Nack = 0xAA,
}

impl Command {
	pub fn parse(payload: &[u8]) -> Result<Self, ProtocolError> {
		let first = *payload.first().ok_or(ProtocolError::FrameTooShort)?;
		Self::try_from(first).map_err(|_| ProtocolError::UnexpectedCommand)
	}
}

/// Unpadded payload sizes, command byte included.
pub const NEW_ECDH_LEN: usize = 1 + ECDH_PUBLIC_LEN + IV_LEN;
pub const RETURN_ECDH_LEN: usize = 1 + ECDH_PUBLIC_LEN;
pub const PAIR_START_LEN: usize = 1 + ENC_PIN_LEN;
pub const GET_SECRET_LEN: usize = 1 + ENC_PIN_LEN;
pub const RETURN_SECRET_LEN: usize = 1 + CAR_SECRET_LEN;
pub const ENABLE_FEATURE_LEN: usize = 1 + FEATURE_BLOB_LEN;
pub const UNLOCK_CAR_LEN: usize = 1 + CAR_SECRET_LEN + 1;
pub const CONTROL_LEN: usize = 1;
