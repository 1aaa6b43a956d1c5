//! Ephemeral key agreement on secp192r1.
//!
//! Both sides of a link generate a fresh keypair per session and exchange
//! untagged SEC1 public points. The 24-byte x-coordinate of the shared point
//! is used directly as the AES-192 session key.

use p192::NistP192;
use p192::elliptic_curve::ecdh;
use p192::elliptic_curve::generic_array::GenericArray;
use p192::elliptic_curve::sec1::{EncodedPoint as GenericEncodedPoint, FromEncodedPoint, ToEncodedPoint};
use p192::elliptic_curve::{PublicKey, SecretKey};

type EncodedPoint = GenericEncodedPoint<NistP192>;

use crate::config::{ECDH_PUBLIC_LEN, ECDH_SHARED_LEN};
use crate::entropy::Pool;
use crate::error::ProtocolError;

pub struct EphemeralKeypair {
	secret: SecretKey<NistP192>,
	public: [u8; ECDH_PUBLIC_LEN],
}

impl EphemeralKeypair {
	pub fn generate(rng: &mut Pool) -> Self {
		let secret = SecretKey::random(rng);
		let point = secret.public_key().to_encoded_point(false);
		let mut public = [0u8; ECDH_PUBLIC_LEN];
		public.copy_from_slice(&point.as_bytes()[1..]);
		Self { secret, public }
	}

	pub fn public_bytes(&self) -> &[u8; ECDH_PUBLIC_LEN] {
		&self.public
	}

	/// Derives the shared secret against an untagged peer public point.
	pub fn diffie_hellman(
		&self,
		peer: &[u8; ECDH_PUBLIC_LEN],
	) -> Result<[u8; ECDH_SHARED_LEN], ProtocolError> {
		let point = EncodedPoint::from_untagged_bytes(GenericArray::from_slice(peer));
		let peer_key = Option::<PublicKey<NistP192>>::from(PublicKey::from_encoded_point(&point))
			.ok_or(ProtocolError::MalformedPublicKey)?;
		let shared = ecdh::diffie_hellman(self.secret.to_nonzero_scalar(), peer_key.as_affine());
		let mut key = [0u8; ECDH_SHARED_LEN];
		key.copy_from_slice(shared.raw_secret_bytes().as_slice());
		Ok(key)
	}
}
