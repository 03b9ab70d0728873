//! Error types for topology detection and MSR access.

use std::io;
use std::path::PathBuf;

use crate::constants::{EXIT_IO_FAILURE, EXIT_MSR_UNSUPPORTED, EXIT_NO_SUCH_CORE};

pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while measuring power.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// The requested core has no MSR device.
	#[error("rdmsr: No CPU {core}")]
	CoreNotFound { core: usize },

	/// The MSR device exists but the CPU rejects register access.
	#[error("rdmsr: CPU {core} doesn't support MSRs")]
	MsrUnsupported { core: usize },

	/// Any other failure opening or reading an MSR device.
	#[error("rdmsr: {}: {source}", .path.display())]
	Io { path: PathBuf, source: io::Error },

	/// A register read returned fewer than eight bytes.
	#[error("rdmsr: short read of register {register:#x} on CPU {core} ({read} bytes)")]
	ShortRead { core: usize, register: u64, read: usize },

	/// A topology attribute exists but could not be read or parsed.
	#[error("failed to read topology from {}: {detail}", .path.display())]
	Topology { path: PathBuf, detail: String },

	/// The report could not be written to standard output.
	#[error("failed to write report: {0}")]
	Output(#[source] io::Error),

	/// The core selection left nothing to sample.
	#[error("no cores selected for sampling")]
	NoCores,
}

impl Error {
	/// Process exit status for this failure class.
	pub fn exit_code(&self) -> i32 {
		match self {
			Error::CoreNotFound { .. } => EXIT_NO_SUCH_CORE,
			Error::MsrUnsupported { .. } => EXIT_MSR_UNSUPPORTED,
			Error::Io { .. }
			| Error::ShortRead { .. }
			| Error::Topology { .. }
			| Error::Output(_)
			| Error::NoCores => EXIT_IO_FAILURE,
		}
	}
}
