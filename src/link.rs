//! One serial link: its port, its framing codec and its session.
//!
//! Every device owns two links — host side and board side — and polls each
//! for one byte per loop iteration. Frames arriving on an established link
//! are decrypted here, so the dispatcher above only ever sees plaintext.

use crate::command::Command;
use crate::config::BLOCK_LEN;
use crate::entropy::Pool;
use crate::error::ProtocolError;
use crate::framing::{FrameCodec, Payload, pad_payload, write_frame};
use crate::hal::SerialPort;
use crate::session::Session;

/// Outcome of feeding a frame to a not-yet-established link.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandshakeEvent {
	/// We were the responder; the reply went out and the session is live.
	Replied,
	/// We were the initiator; the peer answered and the session is live.
	Completed,
	/// The peer refused; the caller decides how far the failure spreads.
	PeerNack,
}

pub struct Link<P: SerialPort> {
	port: P,
	codec: FrameCodec,
	session: Session,
}

impl<P: SerialPort> Link<P> {
	pub fn new(port: P) -> Self {
		Self {
			port,
			codec: FrameCodec::new(),
			session: Session::Idle,
		}
	}

	pub fn port_mut(&mut self) -> &mut P {
		&mut self.port
	}

	pub fn is_established(&self) -> bool {
		self.session.is_established()
	}

	pub fn teardown(&mut self) {
		self.session.reset();
	}

	/// Feeds at most one available byte into the codec; yields a plaintext
	/// payload when a valid frame completes.
	pub fn poll(&mut self) -> Option<Payload> {
		let byte = self.port.read_byte()?;
		let mut payload = self.codec.push_byte(byte)?;
		if let Some(cipher) = self.session.cipher() {
			if payload.len() % BLOCK_LEN != 0 {
				debug!("dropping frame: {}", ProtocolError::LengthNotMultipleOf16);
				return None;
			}
			if cipher.decrypt(&mut payload).is_err() {
				return None;
			}
		}
		Some(payload)
	}

	/// Opens a handshake towards the peer.
	pub fn initiate(&mut self, rng: &mut Pool) -> Result<(), ProtocolError> {
		let hello = self.session.initiate(rng);
		write_frame(&mut self.port, &hello)
	}

	/// Establishment dispatch for frames arriving before the session is up.
	/// Only the two handshake commands and a peer NACK are meaningful here.
	pub fn handle_handshake(
		&mut self,
		payload: &[u8],
		rng: &mut Pool,
	) -> Result<HandshakeEvent, ProtocolError> {
		match Command::parse(payload)? {
			Command::NewEcdh => {
				let reply = self.session.respond(payload, rng)?;
				write_frame(&mut self.port, &reply)?;
				Ok(HandshakeEvent::Replied)
			}
			Command::ReturnEcdh => {
				self.session.complete(payload)?;
				Ok(HandshakeEvent::Completed)
			}
			Command::Nack => Ok(HandshakeEvent::PeerNack),
			_ => Err(ProtocolError::UnexpectedCommand),
		}
	}

	/// Pads, encrypts and frames a command payload on an established session.
	pub fn send(&mut self, payload: &[u8], rng: &mut Pool) -> Result<(), ProtocolError> {
		let Some(cipher) = self.session.cipher() else {
			return Err(ProtocolError::SessionNotEstablished);
		};
		let mut buf = Payload::from_slice(payload).map_err(|_| ProtocolError::FrameTooLong)?;
		pad_payload(&mut buf, rng)?;
		cipher.encrypt(&mut buf)?;
		write_frame(&mut self.port, &buf)
	}

	pub fn ack(&mut self, rng: &mut Pool) -> Result<(), ProtocolError> {
		self.send(&[Command::Ack.into()], rng)
	}

	/// Emits exactly one NACK and tears the session down with it. Without an
	/// established session the frame goes out padded but in clear; that is
	/// the only non-handshake frame ever sent unencrypted.
	pub fn nack(&mut self, rng: &mut Pool) {
		let mut buf = Payload::new();
		let _ = buf.push(Command::Nack.into());
		if pad_payload(&mut buf, rng).is_ok() {
			if let Some(cipher) = self.session.cipher() {
				let _ = cipher.encrypt(&mut buf);
			}
			let _ = write_frame(&mut self.port, &buf);
		}
		self.teardown();
	}
}
