//! Per-link session state: one ECDH key agreement plus the AES-CBC context
//! derived from it, lasting from NEW_ECDH until an explicit teardown.
//!
//! The cipher only exists inside [`Session::Established`], so a key can
//! never be read before the handshake that derives it has finished.

use crate::command::{Command, NEW_ECDH_LEN, RETURN_ECDH_LEN};
use crate::config::{ECDH_PUBLIC_LEN, IV_LEN};
use crate::crypto::{BlockCipher, EphemeralKeypair};
use crate::entropy::Pool;
use crate::error::ProtocolError;

pub enum Session {
	Idle,
	Handshaking {
		keypair: EphemeralKeypair,
		iv: [u8; IV_LEN],
	},
	Established {
		cipher: BlockCipher,
	},
}

impl Session {
	pub fn is_established(&self) -> bool {
		matches!(self, Self::Established { .. })
	}

	pub fn cipher(&self) -> Option<&BlockCipher> {
		match self {
			Self::Established { cipher } => Some(cipher),
			Self::Idle | Self::Handshaking { .. } => None,
		}
	}

	/// Discards all session state, keys included.
	pub fn reset(&mut self) {
		if !matches!(self, Self::Idle) {
			debug!("session torn down");
		}
		*self = Self::Idle;
	}

	/// Starts a handshake: fresh keypair, fresh IV, NEW_ECDH payload out.
	pub fn initiate(&mut self, rng: &mut Pool) -> [u8; NEW_ECDH_LEN] {
		let keypair = EphemeralKeypair::generate(rng);
		let mut iv = [0u8; IV_LEN];
		rng.fill(&mut iv);

		let mut payload = [0u8; NEW_ECDH_LEN];
		payload[0] = Command::NewEcdh.into();
		payload[1..1 + ECDH_PUBLIC_LEN].copy_from_slice(keypair.public_bytes());
		payload[1 + ECDH_PUBLIC_LEN..].copy_from_slice(&iv);

		*self = Self::Handshaking { keypair, iv };
		payload
	}

	/// Answers a NEW_ECDH payload: adopt the peer IV, derive the key and
	/// build the RETURN_ECDH reply.
	pub fn respond(
		&mut self,
		payload: &[u8],
		rng: &mut Pool,
	) -> Result<[u8; RETURN_ECDH_LEN], ProtocolError> {
		if !matches!(self, Self::Idle) {
			return Err(ProtocolError::UnexpectedCommand);
		}
		if payload.len() != NEW_ECDH_LEN {
			return Err(ProtocolError::WrongSizeForCommand);
		}
		let peer = <&[u8; ECDH_PUBLIC_LEN]>::try_from(&payload[1..1 + ECDH_PUBLIC_LEN])
			.map_err(|_| ProtocolError::WrongSizeForCommand)?;
		let mut iv = [0u8; IV_LEN];
		iv.copy_from_slice(&payload[1 + ECDH_PUBLIC_LEN..]);

		let keypair = EphemeralKeypair::generate(rng);
		let key = keypair.diffie_hellman(peer)?;

		let mut reply = [0u8; RETURN_ECDH_LEN];
		reply[0] = Command::ReturnEcdh.into();
		reply[1..].copy_from_slice(keypair.public_bytes());

		*self = Self::Established {
			cipher: BlockCipher::new(key, iv),
		};
		debug!("session established (responder)");
		Ok(reply)
	}

	/// Finishes an initiated handshake from the RETURN_ECDH payload.
	pub fn complete(&mut self, payload: &[u8]) -> Result<(), ProtocolError> {
		let Self::Handshaking { keypair, iv } = &*self else {
			return Err(ProtocolError::UnexpectedCommand);
		};
		if payload.len() != RETURN_ECDH_LEN {
			return Err(ProtocolError::WrongSizeForCommand);
		}
		let peer = <&[u8; ECDH_PUBLIC_LEN]>::try_from(&payload[1..])
			.map_err(|_| ProtocolError::WrongSizeForCommand)?;
		let cipher = BlockCipher::new(keypair.diffie_hellman(peer)?, *iv);

		*self = Self::Established { cipher };
		debug!("session established (initiator)");
		Ok(())
	}
}
