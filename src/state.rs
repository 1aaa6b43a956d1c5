//! Persistent fob state: the flash record and its commit discipline.

use zerocopy::{AsBytes, FromBytes};

use crate::config::{CAR_SECRET_LEN, PAIRED_MAGIC, STORED_PIN_LEN, UNPAIRED_MAGIC};
use crate::error::ProtocolError;
use crate::hal::FlashPage;

bitflags! {
	/// The three feature slots a car can expose.
	#[derive(Clone, Copy, Debug, PartialEq, Eq)]
	pub struct FeatureSet: u8 {
		const FEATURE_0 = 1 << 0;
		const FEATURE_1 = 1 << 1;
		const FEATURE_2 = 1 << 2;
	}
}

/// Flash image of a fob, programmed as one aligned write after a page erase.
#[derive(zerocopy_derive::FromZeroes, zerocopy_derive::FromBytes, zerocopy_derive::AsBytes)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(C)]
pub struct FobRecord {
	pub paired: u8,
	pub pin: [u8; STORED_PIN_LEN],
	pub car_secret: [u8; CAR_SECRET_LEN],
	pub features: u8,
	_pad: [u8; 2],
}

/// Record size, kept at a four-byte multiple for the flash programmer.
pub const FOB_RECORD_LEN: usize = 36;

const _: () = assert!(size_of::<FobRecord>() == FOB_RECORD_LEN);

impl FobRecord {
	fn unpaired() -> Self {
		Self {
			paired: UNPAIRED_MAGIC,
			pin: [UNPAIRED_MAGIC; STORED_PIN_LEN],
			car_secret: [UNPAIRED_MAGIC; CAR_SECRET_LEN],
			features: 0,
			_pad: [0; 2],
		}
	}
}

pub struct FobState<F> {
	flash: F,
	record: FobRecord,
}

impl<F: FlashPage> FobState<F> {
	/// Loads the record, remapping the erased feature byte of a
	/// never-provisioned page to "no features".
	pub fn load(flash: F) -> Self {
		let mut bytes = [0u8; FOB_RECORD_LEN];
		flash.read(&mut bytes);
		let mut record =
			FobRecord::read_from(bytes.as_slice()).unwrap_or_else(FobRecord::unpaired);
		if record.features == UNPAIRED_MAGIC {
			record.features = 0;
		}
		Self { flash, record }
	}

	pub fn record(&self) -> &FobRecord {
		&self.record
	}

	pub fn is_paired(&self) -> bool {
		self.record.paired == PAIRED_MAGIC
	}

	pub fn features(&self) -> FeatureSet {
		FeatureSet::from_bits_truncate(self.record.features)
	}

	/// Installs pairing material and commits; used at first boot of a
	/// factory-paired build and at the end of a pairing transaction.
	pub fn install_pairing(
		&mut self,
		pin: &[u8; STORED_PIN_LEN],
		car_secret: &[u8; CAR_SECRET_LEN],
	) -> Result<(), ProtocolError> {
		let previous = self.record;
		self.record.pin = *pin;
		self.record.car_secret = *car_secret;
		self.record.paired = PAIRED_MAGIC;
		if let Err(err) = self.commit() {
			self.record = previous;
			return Err(err);
		}
		Ok(())
	}

	pub fn enable_feature(&mut self, feature: FeatureSet) -> Result<(), ProtocolError> {
		let previous = self.record.features;
		self.record.features = (self.features() | feature).bits();
		if let Err(err) = self.commit() {
			self.record.features = previous;
			return Err(err);
		}
		Ok(())
	}

	/// Erase, then program the whole record. A crash in between leaves the
	/// page erased and the fob unpaired; the pairing tooling recovers that.
	fn commit(&mut self) -> Result<(), ProtocolError> {
		self.flash.erase()?;
		self.flash.program(self.record.as_bytes())?;
		Ok(())
	}
}
