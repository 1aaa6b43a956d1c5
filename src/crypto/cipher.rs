//! AES-192-CBC contexts for sessions and provisioning secrets.

use aes::Aes192;
use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};

use crate::config::{IV_LEN, SESSION_KEY_LEN};
use crate::error::ProtocolError;

type Encryptor = cbc::Encryptor<Aes192>;
type Decryptor = cbc::Decryptor<Aes192>;

/// One CBC context: a 24-byte key and the IV every call re-chains from.
///
/// Frames within a session stay independently decryptable; the mode adds no
/// replay protection inside a session.
#[derive(Clone)]
pub struct BlockCipher {
	key: [u8; SESSION_KEY_LEN],
	iv: [u8; IV_LEN],
}

impl BlockCipher {
	pub fn new(key: [u8; SESSION_KEY_LEN], iv: [u8; IV_LEN]) -> Self {
		Self { key, iv }
	}

	/// In-place encryption of a block-aligned buffer.
	pub fn encrypt(&self, buf: &mut [u8]) -> Result<(), ProtocolError> {
		let len = buf.len();
		Encryptor::new((&self.key).into(), (&self.iv).into())
			.encrypt_padded_mut::<NoPadding>(buf, len)
			.map_err(|_| ProtocolError::LengthNotMultipleOf16)?;
		Ok(())
	}

	/// In-place decryption of a block-aligned buffer.
	pub fn decrypt(&self, buf: &mut [u8]) -> Result<(), ProtocolError> {
		Decryptor::new((&self.key).into(), (&self.iv).into())
			.decrypt_padded_mut::<NoPadding>(buf)
			.map_err(|_| ProtocolError::LengthNotMultipleOf16)?;
		Ok(())
	}
}
