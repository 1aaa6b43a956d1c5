//! Random data for the protocol core.
//!
//! A ChaCha-based generator seeded once at boot from whatever entropy source
//! the board offers. IVs, ephemeral scalars and frame padding all draw from
//! the same pool, so the quality of every random byte reduces to the quality
//! of the boot seed.

use rand_chacha::ChaCha20Rng;
use rand_chacha::rand_core::{CryptoRng, Error, RngCore, SeedableRng};

pub struct Pool(ChaCha20Rng);

impl Pool {
	pub fn from_seed(seed: [u8; 32]) -> Self {
		Self(ChaCha20Rng::from_seed(seed))
	}

	/// Fills `buf` with random data.
	pub fn fill(&mut self, buf: &mut [u8]) {
		self.0.fill_bytes(buf);
	}
}

impl RngCore for Pool {
	fn next_u32(&mut self) -> u32 {
		self.0.next_u32()
	}

	fn next_u64(&mut self) -> u64 {
		self.0.next_u64()
	}

	fn fill_bytes(&mut self, dest: &mut [u8]) {
		self.0.fill_bytes(dest);
	}

	fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
		self.0.try_fill_bytes(dest)
	}
}

impl CryptoRng for Pool {}
