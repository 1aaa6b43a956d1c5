//! Facade over the cryptographic primitives the protocol is built from:
//! ephemeral ECDH for session setup, AES-192-CBC for session and
//! provisioning ciphertexts, Blake2b for PIN digests.

pub mod cipher;
pub mod ecdh;
pub mod pin;

pub use self::cipher::BlockCipher;
pub use self::ecdh::EphemeralKeypair;
