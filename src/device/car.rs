//! Car role: answers UNLOCK_CAR on the board link and reports to the host.
//!
//! The car never initiates a handshake and keeps no transaction state; its
//! host link exists to print banners, so frames arriving there are only ever
//! serviced by the establishment logic.

use crate::command::{self, Command};
use crate::config::{
	BANNER_LEN, CAR_ID_LEN, FEATURE_COUNT, UNHAPPY_CAR_MSG, UNLOCK_EEPROM_LOC, feature_banner_loc,
};
use crate::entropy::Pool;
use crate::error::ProtocolError;
use crate::framing::padded_len;
use crate::hal::{Eeprom, SerialPort};
use crate::link::{HandshakeEvent, Link};
use crate::state::FeatureSet;

pub struct Car<H: SerialPort, B: SerialPort, E> {
	host: Link<H>,
	board: Link<B>,
	eeprom: E,
	car_id: [u8; CAR_ID_LEN],
	rng: Pool,
}

impl<H, B, E> Car<H, B, E>
where
	H: SerialPort,
	B: SerialPort,
	E: Eeprom,
{
	pub fn new(host: H, board: B, eeprom: E, car_id: [u8; CAR_ID_LEN], seed: [u8; 32]) -> Self {
		Self {
			host: Link::new(host),
			board: Link::new(board),
			eeprom,
			car_id,
			rng: Pool::from_seed(seed),
		}
	}

	pub fn run(&mut self) -> ! {
		loop {
			self.poll();
		}
	}

	/// One cooperative step: a host byte, then a board byte.
	pub fn poll(&mut self) {
		if let Some(payload) = self.host.poll() {
			self.on_host_frame(&payload);
		}
		if let Some(payload) = self.board.poll() {
			self.on_board_frame(&payload);
		}
	}

	pub fn host_port_mut(&mut self) -> &mut H {
		self.host.port_mut()
	}

	pub fn board_port_mut(&mut self) -> &mut B {
		self.board.port_mut()
	}

	fn on_host_frame(&mut self, payload: &[u8]) {
		if !self.host.is_established() {
			match self.host.handle_handshake(payload, &mut self.rng) {
				Ok(HandshakeEvent::Replied) => {}
				Ok(HandshakeEvent::Completed | HandshakeEvent::PeerNack) => self.host.teardown(),
				Err(err) => {
					warn!("host link: {err}");
					self.host.nack(&mut self.rng);
				}
			}
			return;
		}
		// no host-side commands are defined for the car
		warn!("host link: {}", ProtocolError::UnexpectedCommand);
		self.host.nack(&mut self.rng);
	}

	fn on_board_frame(&mut self, payload: &[u8]) {
		if !self.board.is_established() {
			match self.board.handle_handshake(payload, &mut self.rng) {
				Ok(HandshakeEvent::Replied) => {}
				Ok(HandshakeEvent::Completed | HandshakeEvent::PeerNack) => self.board.teardown(),
				Err(err) => {
					warn!("board link: {err}");
					self.board.nack(&mut self.rng);
				}
			}
			return;
		}
		if let Err(err) = self.board_command(payload) {
			warn!("board link: {err}");
			self.board.nack(&mut self.rng);
		}
	}

	fn board_command(&mut self, payload: &[u8]) -> Result<(), ProtocolError> {
		match Command::parse(payload)? {
			Command::UnlockCar => {
				if payload.len() != padded_len(command::UNLOCK_CAR_LEN) {
					return Err(ProtocolError::WrongSizeForCommand);
				}
				if payload[1..1 + CAR_ID_LEN] == self.car_id {
					self.write_banners(payload[1 + CAR_ID_LEN]);
				} else {
					warn!("unlock rejected: {}", ProtocolError::CarIdMismatch);
					self.host.port_mut().write_all(UNHAPPY_CAR_MSG);
				}
				// one-shot operation either way
				self.board.teardown();
				Ok(())
			}
			_ => Err(ProtocolError::UnexpectedCommand),
		}
	}

	/// Streams the unlock banner and one banner per enabled feature, in bit
	/// order, raw onto the host UART.
	fn write_banners(&mut self, features: u8) {
		info!("car unlocked, features 0b{features:03b}");
		let features = FeatureSet::from_bits_truncate(features);
		let mut banner = [0u8; BANNER_LEN];
		self.eeprom.read(UNLOCK_EEPROM_LOC, &mut banner);
		self.host.port_mut().write_all(&banner);
		for feature in 0..FEATURE_COUNT {
			if features.bits() & (1 << feature) != 0 {
				self.eeprom.read(feature_banner_loc(feature), &mut banner);
				self.host.port_mut().write_all(&banner);
			}
		}
	}
}
