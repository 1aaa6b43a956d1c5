//! Protocol-wide constants: frame bounds, field sizes and the non-volatile
//! layout shared between factory provisioning and the firmware.

/// Upper bound of the length byte; also sizes the receive window.
pub const MAX_FRAME: usize = 256;
/// Smallest valid length byte: one payload byte plus the two checksum bytes.
pub const MIN_FRAME_LEN: usize = 3;
/// Receive buffer capacity per link.
pub const MAX_DATA: usize = 256;

/// AES block size; every non-handshake payload is padded to a multiple.
pub const BLOCK_LEN: usize = 16;
/// Session IV, chosen by the handshake initiator.
pub const IV_LEN: usize = 16;
/// AES-192 session key width, fixed by the ECDH shared-secret truncation.
pub const SESSION_KEY_LEN: usize = 24;
/// Untagged SEC1 encoding of a secp192r1 point.
pub const ECDH_PUBLIC_LEN: usize = 48;
/// x-coordinate of the shared point.
pub const ECDH_SHARED_LEN: usize = 24;

/// Blake2b digest of the six-digit PIN.
pub const PIN_HASH_LEN: usize = 28;
/// Hashed PIN, zero-padded and encrypted under the PIN-encryption key.
pub const ENC_PIN_LEN: usize = 32;
/// Leading half of the encrypted PIN, kept in fob flash and compared on the
/// wire.
pub const STORED_PIN_LEN: usize = 16;

pub const CAR_ID_LEN: usize = 16;
pub const CAR_SECRET_LEN: usize = 16;

/// Feature package plaintext: car tag, encrypted-PIN half, feature number,
/// padding.
pub const FEATURE_BLOB_LEN: usize = 48;
pub const FEATURE_TAG_LEN: usize = 6;
pub const FEATURE_PIN_OFFSET: usize = 6;
pub const FEATURE_NUM_OFFSET: usize = 22;
pub const FEATURE_COUNT: u8 = 3;

/// PIN-encryption key offset in EEPROM.
pub const PIN_KEY_LOC: usize = 0x00;
/// Feature-encryption key offset in EEPROM.
pub const FEATURE_KEY_LOC: usize = 0x18;
pub const EEPROM_KEY_LEN: usize = 24;
/// Unlock banner offset in car EEPROM; feature banners sit below it.
pub const UNLOCK_EEPROM_LOC: usize = 0x7C0;
pub const BANNER_LEN: usize = 64;

pub const fn feature_banner_loc(feature: u8) -> usize {
	UNLOCK_EEPROM_LOC - (feature as usize + 1) * BANNER_LEN
}

/// `paired` byte of a provisioned flash record.
pub const PAIRED_MAGIC: u8 = 0xAB;
/// Erased-flash byte, doubling as "unpaired".
pub const UNPAIRED_MAGIC: u8 = 0xFF;

/// Poll ticks before a stuck transaction is abandoned.
pub const TXN_TIMEOUT_POLLS: u32 = 250_000;
/// Consecutive pressed samples before the unlock button fires.
pub const DEBOUNCE_POLLS: u8 = 3;

/// Cleartext rejection the car prints for a bad unlock secret.
pub const UNHAPPY_CAR_MSG: &[u8] = b"Car is not happy";
