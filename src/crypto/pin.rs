//! PIN handling.
//!
//! The host hashes the six-digit PIN with Blake2b; fobs only ever see,
//! forward and store the digest after encrypting it under the PIN-encryption
//! key, so a captured wire exchange never exposes the digest itself.

use blake2::Blake2bVar;
use blake2::digest::{Update, VariableOutput};

use crate::config::{ENC_PIN_LEN, PIN_HASH_LEN};
use crate::crypto::cipher::BlockCipher;
use crate::error::ProtocolError;

/// ASCII digits of a pairing PIN.
pub const PIN_LEN: usize = 6;

/// Blake2b digest of the PIN as entered at the host.
pub fn hash_pin(pin: &[u8; PIN_LEN]) -> [u8; PIN_HASH_LEN] {
	let mut hasher = Blake2bVar::new(PIN_HASH_LEN).expect("digest size fits Blake2b");
	hasher.update(pin);
	let mut digest = [0u8; PIN_HASH_LEN];
	hasher
		.finalize_variable(&mut digest)
		.expect("digest size fits Blake2b");
	digest
}

/// Zero-pads a digest to the encrypted-PIN width.
pub fn pad_hashed_pin(digest: &[u8; PIN_HASH_LEN]) -> [u8; ENC_PIN_LEN] {
	let mut padded = [0u8; ENC_PIN_LEN];
	padded[..PIN_HASH_LEN].copy_from_slice(digest);
	padded
}

/// Encrypts a padded PIN digest for transfer and storage.
pub fn encrypt_pin(
	cipher: &BlockCipher,
	padded: &[u8; ENC_PIN_LEN],
) -> Result<[u8; ENC_PIN_LEN], ProtocolError> {
	let mut out = *padded;
	cipher.encrypt(&mut out)?;
	Ok(out)
}
