//! Shared fixtures for the scenario tests: in-memory board fakes and device
//! builders. The host PC side of each scenario lives in [`host`].
#![allow(dead_code)]

pub mod host;

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use keyfob::config::{
	BANNER_LEN, CAR_ID_LEN, CAR_SECRET_LEN, EEPROM_KEY_LEN, ENC_PIN_LEN, FEATURE_KEY_LOC, IV_LEN,
	PAIRED_MAGIC, PIN_KEY_LOC, STORED_PIN_LEN, UNLOCK_EEPROM_LOC, UNPAIRED_MAGIC,
	feature_banner_loc,
};
use keyfob::crypto::{BlockCipher, pin};
use keyfob::hal::{Button, Eeprom, FlashError, FlashPage, SerialPort};
use keyfob::state::FOB_RECORD_LEN;
use keyfob::{Car, Fob, FobProvision};

use self::host::HostEndpoint;

pub const PIN_KEY: [u8; EEPROM_KEY_LEN] = [0x3A; EEPROM_KEY_LEN];
pub const FEATURE_KEY: [u8; EEPROM_KEY_LEN] = [0x7F; EEPROM_KEY_LEN];

/// A matched car/fob set: the fob's unlock secret is the car's identity.
pub const CAR_ID: [u8; CAR_ID_LEN] = [0xAA; CAR_ID_LEN];
pub const CAR_SECRET: [u8; CAR_SECRET_LEN] = CAR_ID;

/// The all-zero hashed PIN of the reference pairing run, already padded to
/// the encrypted-PIN width.
pub const HASHED_PIN: [u8; ENC_PIN_LEN] = [0; ENC_PIN_LEN];

pub fn pin_cipher() -> BlockCipher {
	BlockCipher::new(PIN_KEY, [0; IV_LEN])
}

pub fn feature_cipher() -> BlockCipher {
	BlockCipher::new(FEATURE_KEY, [0; IV_LEN])
}

/// What a paired fob stores for [`HASHED_PIN`].
pub fn stored_pin() -> [u8; STORED_PIN_LEN] {
	let encrypted = pin::encrypt_pin(&pin_cipher(), &HASHED_PIN).unwrap();
	encrypted[..STORED_PIN_LEN].try_into().unwrap()
}

// --- serial ---

#[derive(Default)]
pub struct TestPort {
	pub rx: VecDeque<u8>,
	pub tx: Vec<u8>,
}

impl TestPort {
	pub fn feed(&mut self, bytes: &[u8]) {
		self.rx.extend(bytes.iter().copied());
	}

	pub fn take_tx(&mut self) -> Vec<u8> {
		std::mem::take(&mut self.tx)
	}
}

impl SerialPort for TestPort {
	fn read_byte(&mut self) -> Option<u8> {
		self.rx.pop_front()
	}

	fn write_all(&mut self, buf: &[u8]) {
		self.tx.extend_from_slice(buf);
	}
}

// --- flash ---

pub struct MemFlash {
	pub page: [u8; FOB_RECORD_LEN],
}

impl MemFlash {
	pub fn erased() -> Self {
		Self {
			page: [UNPAIRED_MAGIC; FOB_RECORD_LEN],
		}
	}
}

impl FlashPage for MemFlash {
	fn erase(&mut self) -> Result<(), FlashError> {
		self.page = [UNPAIRED_MAGIC; FOB_RECORD_LEN];
		Ok(())
	}

	fn program(&mut self, data: &[u8]) -> Result<(), FlashError> {
		self.page[..data.len()].copy_from_slice(data);
		Ok(())
	}

	fn read(&self, buf: &mut [u8]) {
		buf.copy_from_slice(&self.page[..buf.len()]);
	}
}

/// A flash page as the factory would leave it on an already-paired fob.
pub fn provisioned_page(
	pin: &[u8; STORED_PIN_LEN],
	secret: &[u8; CAR_SECRET_LEN],
	features: u8,
) -> MemFlash {
	let mut page = [0u8; FOB_RECORD_LEN];
	page[0] = PAIRED_MAGIC;
	page[1..17].copy_from_slice(pin);
	page[17..33].copy_from_slice(secret);
	page[33] = features;
	MemFlash { page }
}

// --- eeprom ---

pub struct FixtureEeprom {
	bytes: Vec<u8>,
}

pub fn unlock_banner() -> [u8; BANNER_LEN] {
	[b'U'; BANNER_LEN]
}

pub fn feature_banner(feature: u8) -> [u8; BANNER_LEN] {
	[b'0' + feature; BANNER_LEN]
}

impl FixtureEeprom {
	/// Keys at the bottom, banners at the top, as provisioning lays them out.
	pub fn new() -> Self {
		let mut bytes = vec![0u8; 0x800];
		bytes[PIN_KEY_LOC..PIN_KEY_LOC + EEPROM_KEY_LEN].copy_from_slice(&PIN_KEY);
		bytes[FEATURE_KEY_LOC..FEATURE_KEY_LOC + EEPROM_KEY_LEN].copy_from_slice(&FEATURE_KEY);
		bytes[UNLOCK_EEPROM_LOC..UNLOCK_EEPROM_LOC + BANNER_LEN]
			.copy_from_slice(&unlock_banner());
		for feature in 0..3 {
			let loc = feature_banner_loc(feature);
			bytes[loc..loc + BANNER_LEN].copy_from_slice(&feature_banner(feature));
		}
		Self { bytes }
	}
}

impl Eeprom for FixtureEeprom {
	fn read(&self, offset: usize, buf: &mut [u8]) {
		buf.copy_from_slice(&self.bytes[offset..offset + buf.len()]);
	}
}

// --- button ---

#[derive(Clone, Default)]
pub struct TestButton(Rc<Cell<bool>>);

impl TestButton {
	pub fn set(&self, level: bool) {
		self.0.set(level);
	}
}

impl Button for TestButton {
	fn is_pressed(&mut self) -> bool {
		self.0.get()
	}
}

// --- devices ---

pub type TestFob = Fob<TestPort, TestPort, MemFlash, TestButton>;
pub type TestCar = Car<TestPort, TestPort, FixtureEeprom>;

pub fn make_fob(seed: u8, flash: MemFlash, factory_paired: bool) -> (TestFob, TestButton) {
	let button = TestButton::default();
	let provision = FobProvision {
		pair_pin: stored_pin(),
		car_secret: CAR_SECRET,
		factory_paired,
	};
	let fob = Fob::new(
		TestPort::default(),
		TestPort::default(),
		flash,
		&FixtureEeprom::new(),
		button.clone(),
		provision,
		[seed; 32],
	)
	.unwrap();
	(fob, button)
}

pub fn paired_fob(seed: u8) -> (TestFob, TestButton) {
	make_fob(seed, MemFlash::erased(), true)
}

pub fn unpaired_fob(seed: u8) -> TestFob {
	make_fob(seed, MemFlash::erased(), false).0
}

pub fn make_car(seed: u8) -> TestCar {
	Car::new(
		TestPort::default(),
		TestPort::default(),
		FixtureEeprom::new(),
		CAR_ID,
		[seed; 32],
	)
}

// --- plumbing ---

pub fn drain_host_fob(fob: &mut TestFob) {
	while !fob.host_port_mut().rx.is_empty() {
		fob.poll();
	}
}

pub fn drain_host_car(car: &mut TestCar) {
	while !car.host_port_mut().rx.is_empty() {
		car.poll();
	}
}

pub fn drain_board_car(car: &mut TestCar) {
	while !car.board_port_mut().rx.is_empty() {
		car.poll();
	}
}

pub fn drain_board_fob(fob: &mut TestFob) {
	while !fob.board_port_mut().rx.is_empty() {
		fob.poll();
	}
}

/// Opens a host session against a fob's host link.
pub fn establish_with_fob(host: &mut HostEndpoint, fob: &mut TestFob) {
	fob.host_port_mut().feed(&host.hello());
	drain_host_fob(fob);
	let frames = host::split_frames(&fob.host_port_mut().take_tx());
	assert_eq!(frames.len(), 1, "expected exactly the RETURN_ECDH reply");
	host.complete(&frames[0]);
}

/// Opens a host session against the car's host link.
pub fn establish_with_car(host: &mut HostEndpoint, car: &mut TestCar) {
	car.host_port_mut().feed(&host.hello());
	drain_host_car(car);
	let frames = host::split_frames(&car.host_port_mut().take_tx());
	assert_eq!(frames.len(), 1, "expected exactly the RETURN_ECDH reply");
	host.complete(&frames[0]);
}

/// Shuttles board-link traffic between two fobs until both go quiet.
pub fn pump_fob_fob(a: &mut TestFob, b: &mut TestFob) {
	for _ in 0..8 {
		let to_b = a.board_port_mut().take_tx();
		b.board_port_mut().feed(&to_b);
		let to_a = b.board_port_mut().take_tx();
		a.board_port_mut().feed(&to_a);
		if to_a.is_empty() && to_b.is_empty() {
			break;
		}
		while !a.board_port_mut().rx.is_empty() || !b.board_port_mut().rx.is_empty() {
			a.poll();
			b.poll();
		}
	}
}

/// Shuttles board-link traffic between a fob and the car until both go quiet.
pub fn pump_fob_car(fob: &mut TestFob, car: &mut TestCar) {
	for _ in 0..8 {
		let to_car = fob.board_port_mut().take_tx();
		car.board_port_mut().feed(&to_car);
		let to_fob = car.board_port_mut().take_tx();
		fob.board_port_mut().feed(&to_fob);
		if to_car.is_empty() && to_fob.is_empty() {
			break;
		}
		while !fob.board_port_mut().rx.is_empty() || !car.board_port_mut().rx.is_empty() {
			fob.poll();
			car.poll();
		}
	}
}
