//! Fob role: pairing and feature enablement from the host link, secret
//! transfer on the board link, button-initiated unlock.
//!
//! Paired and unpaired fobs run the same firmware; the persistent record
//! decides which side of each transaction a fob may take.

use crate::command::{self, Command};
use crate::config::{
	CAR_SECRET_LEN, DEBOUNCE_POLLS, EEPROM_KEY_LEN, ENC_PIN_LEN, FEATURE_BLOB_LEN, FEATURE_COUNT,
	FEATURE_KEY_LOC, FEATURE_NUM_OFFSET, FEATURE_PIN_OFFSET, FEATURE_TAG_LEN, IV_LEN, PIN_KEY_LOC,
	STORED_PIN_LEN, TXN_TIMEOUT_POLLS,
};
use crate::crypto::{BlockCipher, pin};
use crate::device::TransactionState;
use crate::entropy::Pool;
use crate::error::ProtocolError;
use crate::framing::padded_len;
use crate::hal::{Button, Eeprom, FlashPage, SerialPort};
use crate::link::{HandshakeEvent, Link};
use crate::state::{FeatureSet, FobRecord, FobState};

/// Build-time material a fob leaves the factory with. `factory_paired`
/// builds install the PIN and car secret on first boot; all other fobs
/// start unpaired and receive both through a pairing transaction.
#[derive(Clone, Copy, Debug)]
pub struct FobProvision {
	pub pair_pin: [u8; STORED_PIN_LEN],
	pub car_secret: [u8; CAR_SECRET_LEN],
	pub factory_paired: bool,
}

pub struct Fob<H: SerialPort, B: SerialPort, F, BT> {
	host: Link<H>,
	board: Link<B>,
	state: FobState<F>,
	button: BT,
	rng: Pool,
	txn: TransactionState,
	txn_age: u32,
	press_run: u8,
	pin_cipher: BlockCipher,
	feature_cipher: BlockCipher,
}

impl<H, B, F, BT> Fob<H, B, F, BT>
where
	H: SerialPort,
	B: SerialPort,
	F: FlashPage,
	BT: Button,
{
	pub fn new<E: Eeprom>(
		host: H,
		board: B,
		flash: F,
		eeprom: &E,
		button: BT,
		provision: FobProvision,
		seed: [u8; 32],
	) -> Result<Self, ProtocolError> {
		let mut key = [0u8; EEPROM_KEY_LEN];
		eeprom.read(PIN_KEY_LOC, &mut key);
		let pin_cipher = BlockCipher::new(key, [0; IV_LEN]);
		eeprom.read(FEATURE_KEY_LOC, &mut key);
		let feature_cipher = BlockCipher::new(key, [0; IV_LEN]);

		let mut state = FobState::load(flash);
		if provision.factory_paired && !state.is_paired() {
			state.install_pairing(&provision.pair_pin, &provision.car_secret)?;
			info!("factory pairing installed");
		}

		Ok(Self {
			host: Link::new(host),
			board: Link::new(board),
			state,
			button,
			rng: Pool::from_seed(seed),
			txn: TransactionState::Idle,
			txn_age: 0,
			press_run: 0,
			pin_cipher,
			feature_cipher,
		})
	}

	pub fn run(&mut self) -> ! {
		loop {
			self.poll();
		}
	}

	/// One cooperative step: a host byte, a board byte, the button, the
	/// transaction watchdog.
	pub fn poll(&mut self) {
		if let Some(payload) = self.host.poll() {
			self.on_host_frame(&payload);
		}
		if let Some(payload) = self.board.poll() {
			self.on_board_frame(&payload);
		}
		self.poll_button();
		self.tick_watchdog();
	}

	pub fn is_paired(&self) -> bool {
		self.state.is_paired()
	}

	pub fn features(&self) -> FeatureSet {
		self.state.features()
	}

	pub fn record(&self) -> &FobRecord {
		self.state.record()
	}

	pub fn transaction(&self) -> &TransactionState {
		&self.txn
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
				Ok(HandshakeEvent::Completed | HandshakeEvent::PeerNack) => {
					self.host.teardown();
					self.clear_transaction();
				}
				Err(err) => {
					warn!("host link: {err}");
					self.host.nack(&mut self.rng);
					self.clear_transaction();
				}
			}
			return;
		}
		if let Err(err) = self.host_command(payload) {
			warn!("host link: {err}");
			self.host.nack(&mut self.rng);
			self.clear_transaction();
		}
	}

	fn host_command(&mut self, payload: &[u8]) -> Result<(), ProtocolError> {
		match Command::parse(payload)? {
			Command::PairPairedEnter => {
				if payload.len() != padded_len(command::CONTROL_LEN) {
					return Err(ProtocolError::WrongSizeForCommand);
				}
				if !self.state.is_paired() {
					return Err(ProtocolError::RoleMismatch);
				}
				debug!("pairing: standing by as the paired side");
				self.host.ack(&mut self.rng)
			}
			Command::PairUnpairedStart => {
				if payload.len() != padded_len(command::PAIR_START_LEN) {
					return Err(ProtocolError::WrongSizeForCommand);
				}
				if self.state.is_paired() {
					return Err(ProtocolError::RoleMismatch);
				}
				if !self.txn.is_idle() {
					return Err(ProtocolError::UnexpectedCommand);
				}
				let mut hashed = [0u8; ENC_PIN_LEN];
				hashed.copy_from_slice(&payload[1..1 + ENC_PIN_LEN]);
				let pin = pin::encrypt_pin(&self.pin_cipher, &hashed)?;
				self.board.initiate(&mut self.rng)?;
				self.txn = TransactionState::WaitingForPairedEcdh { pin };
				self.txn_age = 0;
				debug!("pairing: waiting for the paired fob handshake");
				Ok(())
			}
			Command::EnableFeature => self.enable_feature(payload),
			_ => Err(ProtocolError::UnexpectedCommand),
		}
	}

	fn enable_feature(&mut self, payload: &[u8]) -> Result<(), ProtocolError> {
		if payload.len() != padded_len(command::ENABLE_FEATURE_LEN) {
			return Err(ProtocolError::WrongSizeForCommand);
		}
		if !self.state.is_paired() {
			return Err(ProtocolError::RoleMismatch);
		}
		let mut package = [0u8; FEATURE_BLOB_LEN];
		package.copy_from_slice(&payload[1..1 + FEATURE_BLOB_LEN]);
		self.feature_cipher.decrypt(&mut package)?;

		let record = self.state.record();
		if package[..FEATURE_TAG_LEN] != record.car_secret[..FEATURE_TAG_LEN] {
			return Err(ProtocolError::CarIdMismatch);
		}
		if package[FEATURE_PIN_OFFSET..FEATURE_PIN_OFFSET + STORED_PIN_LEN] != record.pin {
			return Err(ProtocolError::PinMismatch);
		}
		let feature = package[FEATURE_NUM_OFFSET];
		if feature >= FEATURE_COUNT {
			return Err(ProtocolError::UnknownFeature);
		}
		self.state
			.enable_feature(FeatureSet::from_bits_truncate(1 << feature))?;
		debug!("feature {feature} enabled");
		self.host.ack(&mut self.rng)?;
		// transaction complete, the host reopens a session for the next one
		self.host.teardown();
		Ok(())
	}

	fn on_board_frame(&mut self, payload: &[u8]) {
		if !self.board.is_established() {
			match self.board.handle_handshake(payload, &mut self.rng) {
				Ok(HandshakeEvent::Replied) => {}
				Ok(HandshakeEvent::Completed) => self.continue_transaction(),
				Ok(HandshakeEvent::PeerNack) => {
					self.board.teardown();
					self.propagate_failure();
				}
				Err(err) => {
					warn!("board link: {err}");
					self.board.nack(&mut self.rng);
					self.propagate_failure();
				}
			}
			return;
		}
		if let Err(err) = self.board_command(payload) {
			warn!("board link: {err}");
			self.board.nack(&mut self.rng);
			self.propagate_failure();
		}
	}

	/// The peer handshake finished; send whatever the pending transaction was
	/// waiting to deliver.
	fn continue_transaction(&mut self) {
		match self.txn.clone() {
			TransactionState::WaitingForPairedEcdh { pin } => {
				let mut request = [0u8; command::GET_SECRET_LEN];
				request[0] = Command::GetSecret.into();
				request[1..].copy_from_slice(&pin);
				if let Err(err) = self.board.send(&request, &mut self.rng) {
					warn!("board link: {err}");
					self.board.nack(&mut self.rng);
					self.propagate_failure();
				}
				// the transaction stays pending until RETURN_SECRET
			}
			TransactionState::WaitingForCarEcdh => {
				let mut request = [0u8; command::UNLOCK_CAR_LEN];
				request[0] = Command::UnlockCar.into();
				request[1..1 + CAR_SECRET_LEN].copy_from_slice(&self.state.record().car_secret);
				request[1 + CAR_SECRET_LEN] = self.state.features().bits();
				if let Err(err) = self.board.send(&request, &mut self.rng) {
					warn!("board link: {err}");
				}
				// fire and forget: the car answers on its own host link
				self.board.teardown();
				self.clear_transaction();
			}
			TransactionState::Idle => self.board.teardown(),
		}
	}

	fn board_command(&mut self, payload: &[u8]) -> Result<(), ProtocolError> {
		match Command::parse(payload)? {
			Command::GetSecret => {
				if payload.len() != padded_len(command::GET_SECRET_LEN) {
					return Err(ProtocolError::WrongSizeForCommand);
				}
				if !self.state.is_paired() {
					return Err(ProtocolError::RoleMismatch);
				}
				let record = self.state.record();
				if payload[1..1 + STORED_PIN_LEN] != record.pin {
					return Err(ProtocolError::PinMismatch);
				}
				let mut reply = [0u8; command::RETURN_SECRET_LEN];
				reply[0] = Command::ReturnSecret.into();
				reply[1..].copy_from_slice(&record.car_secret);
				self.board.send(&reply, &mut self.rng)?;
				// secret handed over, one-shot operation done
				self.board.teardown();
				Ok(())
			}
			Command::ReturnSecret => {
				if payload.len() != padded_len(command::RETURN_SECRET_LEN) {
					return Err(ProtocolError::WrongSizeForCommand);
				}
				if self.state.is_paired() {
					return Err(ProtocolError::RoleMismatch);
				}
				let TransactionState::WaitingForPairedEcdh { pin } = self.txn.clone() else {
					return Err(ProtocolError::UnexpectedCommand);
				};
				let mut stored_pin = [0u8; STORED_PIN_LEN];
				stored_pin.copy_from_slice(&pin[..STORED_PIN_LEN]);
				let mut car_secret = [0u8; CAR_SECRET_LEN];
				car_secret.copy_from_slice(&payload[1..1 + CAR_SECRET_LEN]);
				self.state.install_pairing(&stored_pin, &car_secret)?;
				self.clear_transaction();
				self.board.teardown();
				info!("pairing complete");
				self.host.ack(&mut self.rng)?;
				self.host.teardown();
				Ok(())
			}
			Command::Nack => {
				self.board.teardown();
				self.propagate_failure();
				Ok(())
			}
			_ => Err(ProtocolError::UnexpectedCommand),
		}
	}

	fn poll_button(&mut self) {
		if !self.button.is_pressed() {
			self.press_run = 0;
			return;
		}
		if self.press_run >= DEBOUNCE_POLLS {
			// held since the last trigger
			return;
		}
		self.press_run += 1;
		if self.press_run == DEBOUNCE_POLLS {
			self.start_unlock();
		}
	}

	fn start_unlock(&mut self) {
		if !self.state.is_paired() || !self.txn.is_idle() {
			return;
		}
		if let Err(err) = self.board.initiate(&mut self.rng) {
			warn!("board link: {err}");
			return;
		}
		self.txn = TransactionState::WaitingForCarEcdh;
		self.txn_age = 0;
		debug!("unlock: waiting for the car handshake");
	}

	fn tick_watchdog(&mut self) {
		if self.txn.is_idle() {
			return;
		}
		self.txn_age += 1;
		if self.txn_age >= TXN_TIMEOUT_POLLS {
			warn!("transaction abandoned after {TXN_TIMEOUT_POLLS} polls");
			self.board.teardown();
			self.propagate_failure();
		}
	}

	/// Board-link failure: clear the transaction and let the host know when
	/// it was the one driving it.
	fn propagate_failure(&mut self) {
		if self.txn.host_initiated() {
			self.host.nack(&mut self.rng);
		}
		self.clear_transaction();
	}

	fn clear_transaction(&mut self) {
		if !self.txn.is_idle() {
			debug!("transaction state cleared");
		}
		self.txn = TransactionState::Idle;
		self.txn_age = 0;
	}
}
