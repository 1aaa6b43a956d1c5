//! Protocol error kinds and their propagation classes.

use thiserror::Error;

use crate::hal::FlashError;

/// Terminal conditions of the protocol core.
///
/// Framing-level kinds (`FrameTooShort`, `FrameTooLong`, `CrcMismatch`,
/// `LengthNotMultipleOf16`) are recovered silently by resetting the receive
/// state machine and never produce a wire response. Command-level kinds
/// produce exactly one NACK on the offending link and tear that session down.
/// During a host-initiated transaction a board-link failure additionally
/// clears the transaction state and forwards a NACK to the host.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
	#[error("frame shorter than the minimum length")]
	FrameTooShort,
	#[error("frame exceeds the receive window")]
	FrameTooLong,
	#[error("payload length is not a multiple of the cipher block")]
	LengthNotMultipleOf16,
	#[error("frame checksum mismatch")]
	CrcMismatch,
	#[error("command not valid for this link and role")]
	UnexpectedCommand,
	#[error("payload size does not match the command")]
	WrongSizeForCommand,
	#[error("device role does not allow this operation")]
	RoleMismatch,
	#[error("PIN does not match the stored PIN")]
	PinMismatch,
	#[error("unlock secret does not match the car identity")]
	CarIdMismatch,
	#[error("no session established on this link")]
	SessionNotEstablished,
	#[error("peer public key does not parse")]
	MalformedPublicKey,
	#[error("feature number out of range")]
	UnknownFeature,
	#[error("flash commit failed")]
	FlashCommit(#[from] FlashError),
}
