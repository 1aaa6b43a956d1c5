//! A minimal host-PC endpoint speaking the device wire format, built from
//! the crate's own framing and crypto facade.

use keyfob::Command;
use keyfob::command::RETURN_ECDH_LEN;
use keyfob::config::{BLOCK_LEN, ECDH_PUBLIC_LEN, IV_LEN};
use keyfob::crc::crc16;
use keyfob::crypto::{BlockCipher, EphemeralKeypair};
use keyfob::entropy::Pool;

pub struct HostEndpoint {
	rng: Pool,
	pending: Option<(EphemeralKeypair, [u8; IV_LEN])>,
	cipher: Option<BlockCipher>,
}

impl HostEndpoint {
	pub fn new(seed: u8) -> Self {
		Self {
			rng: Pool::from_seed([seed; 32]),
			pending: None,
			cipher: None,
		}
	}

	/// The NEW_ECDH frame opening a session.
	pub fn hello(&mut self) -> Vec<u8> {
		let keypair = EphemeralKeypair::generate(&mut self.rng);
		let mut iv = [0u8; IV_LEN];
		self.rng.fill(&mut iv);

		let mut payload = vec![u8::from(Command::NewEcdh)];
		payload.extend_from_slice(keypair.public_bytes());
		payload.extend_from_slice(&iv);
		self.pending = Some((keypair, iv));
		frame(&payload)
	}

	/// Absorbs the device's RETURN_ECDH payload; the session is live after.
	pub fn complete(&mut self, payload: &[u8]) {
		assert_eq!(payload.len(), RETURN_ECDH_LEN);
		assert_eq!(payload[0], u8::from(Command::ReturnEcdh));
		let (keypair, iv) = self.pending.take().expect("no handshake in flight");
		let peer: &[u8; ECDH_PUBLIC_LEN] = payload[1..].try_into().unwrap();
		let key = keypair.diffie_hellman(peer).unwrap();
		self.cipher = Some(BlockCipher::new(key, iv));
	}

	/// Pads, encrypts and frames a command payload.
	pub fn command(&mut self, payload: &[u8]) -> Vec<u8> {
		let mut buf = payload.to_vec();
		buf.resize(buf.len().next_multiple_of(BLOCK_LEN), 0);
		self.cipher
			.as_ref()
			.expect("session not established")
			.encrypt(&mut buf)
			.unwrap();
		frame(&buf)
	}

	/// Decrypts a device response payload.
	pub fn decrypt(&self, payload: &[u8]) -> Vec<u8> {
		let mut buf = payload.to_vec();
		self.cipher
			.as_ref()
			.expect("session not established")
			.decrypt(&mut buf)
			.unwrap();
		buf
	}
}

/// Splits a captured byte stream into checksum-validated frame payloads.
pub fn split_frames(bytes: &[u8]) -> Vec<Vec<u8>> {
	let mut frames = Vec::new();
	let mut rest = bytes;
	while !rest.is_empty() {
		let total = usize::from(rest[0]);
		assert!(total >= 3, "runt frame in stream");
		assert!(rest.len() > total, "truncated frame in stream");
		let payload = &rest[1..total - 1];
		let crc = u16::from_be_bytes([rest[total - 1], rest[total]]);
		assert_eq!(crc16(payload), crc, "bad checksum in stream");
		frames.push(payload.to_vec());
		rest = &rest[total + 1..];
	}
	frames
}

pub fn frame(payload: &[u8]) -> Vec<u8> {
	let mut out = vec![(payload.len() + 2) as u8];
	out.extend_from_slice(payload);
	out.extend_from_slice(&crc16(payload).to_be_bytes());
	out
}
