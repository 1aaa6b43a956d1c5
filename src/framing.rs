//! Byte-stream framing: the receive state machine and the transmit path.
//!
//! A frame is one length byte `L` (counting everything after itself,
//! checksum included), `L - 2` payload bytes and a big-endian CRC-16 over the
//! payload. The receiver is a three-state machine fed one byte per poll;
//! every malformed input resets it silently, so line noise never produces a
//! wire response.

use crate::config::{BLOCK_LEN, MAX_DATA, MAX_FRAME, MIN_FRAME_LEN};
use crate::crc::crc16;
use crate::entropy::Pool;
use crate::error::ProtocolError;
use crate::hal::SerialPort;

/// A reassembled, checksum-validated payload.
pub type Payload = heapless::Vec<u8, MAX_DATA>;

enum RxState {
	Reset,
	Data,
	Crc,
}

pub struct FrameCodec {
	state: RxState,
	buf: Payload,
	remaining: usize,
	crc: u16,
}

impl FrameCodec {
	pub fn new() -> Self {
		Self {
			state: RxState::Reset,
			buf: Payload::new(),
			remaining: 0,
			crc: 0,
		}
	}

	/// Feeds one received byte; returns a payload when it completes a valid
	/// frame.
	pub fn push_byte(&mut self, byte: u8) -> Option<Payload> {
		match self.state {
			RxState::Reset => {
				let length = usize::from(byte);
				if (MIN_FRAME_LEN..MAX_FRAME).contains(&length) {
					self.buf.clear();
					self.crc = 0;
					self.remaining = length;
					self.state = RxState::Data;
				}
				None
			}
			RxState::Data => {
				if self.buf.push(byte).is_err() {
					self.state = RxState::Reset;
					return None;
				}
				self.remaining -= 1;
				if self.remaining == 2 {
					self.state = RxState::Crc;
				}
				None
			}
			RxState::Crc => {
				self.crc = self.crc << 8 | u16::from(byte);
				self.remaining -= 1;
				if self.remaining > 0 {
					return None;
				}
				self.state = RxState::Reset;
				if self.buf.is_empty() || crc16(&self.buf) != self.crc {
					debug!("dropping frame: {}", ProtocolError::CrcMismatch);
					return None;
				}
				Some(self.buf.clone())
			}
		}
	}
}

impl Default for FrameCodec {
	fn default() -> Self {
		Self::new()
	}
}

/// Rounds a payload length up to the cipher block.
pub const fn padded_len(len: usize) -> usize {
	len.div_ceil(BLOCK_LEN) * BLOCK_LEN
}

/// Pads a payload to the cipher block with bytes from the entropy pool.
pub fn pad_payload(payload: &mut Payload, rng: &mut Pool) -> Result<(), ProtocolError> {
	let need = padded_len(payload.len()) - payload.len();
	let mut pad = [0u8; BLOCK_LEN];
	rng.fill(&mut pad[..need]);
	payload
		.extend_from_slice(&pad[..need])
		.map_err(|_| ProtocolError::FrameTooLong)
}

/// Frames a payload and writes it out in one blocking call.
pub fn write_frame<P: SerialPort>(port: &mut P, payload: &[u8]) -> Result<(), ProtocolError> {
	if payload.is_empty() {
		return Err(ProtocolError::FrameTooShort);
	}
	if payload.len() + 2 >= MAX_FRAME {
		return Err(ProtocolError::FrameTooLong);
	}
	port.write_all(&[(payload.len() + 2) as u8]);
	port.write_all(payload);
	port.write_all(&crc16(payload).to_be_bytes());
	Ok(())
}
