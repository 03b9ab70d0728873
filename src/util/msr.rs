use std::fs::File;
use std::io;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::constants::MSR_DEVICE_ROOT;
use crate::error::{Error, Result};

/// Anything that can read 64-bit model-specific registers of one core
pub trait RegisterRead {
	/// Logical core index this reader is bound to
	fn core(&self) -> usize;

	/// Reads the register at `register`
	fn read(&self, register: u64) -> Result<u64>;
}

/// An open handle to a core's MSR character device
///
/// Every read is a positioned read at the register address, so the handle
/// carries no cursor state.
#[derive(Debug)]
pub struct MsrHandle {
	core: usize,
	path: PathBuf,
	file: File,
}

impl MsrHandle {
	/// Opens `/dev/cpu/<core>/msr` read-only
	pub fn open(core: usize) -> Result<Self> {
		Self::open_path(core, Path::new(MSR_DEVICE_ROOT).join(core.to_string()).join("msr"))
	}

	/// Opens an MSR device at an arbitrary path on behalf of `core`
	pub fn open_path(core: usize, path: impl Into<PathBuf>) -> Result<Self> {
		let path = path.into();
		match File::open(&path) {
			Ok(file) => {
				debug!("opened {} for CPU {}", path.display(), core);
				Ok(Self { core, path, file })
			},
			Err(e) => Err(classify_open_error(core, path, e)),
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

impl RegisterRead for MsrHandle {
	fn core(&self) -> usize {
		self.core
	}

	fn read(&self, register: u64) -> Result<u64> {
		let mut buf = [0u8; 8];
		let read = self.file.read_at(&mut buf, register).map_err(|source| Error::Io {
			path: self.path.clone(),
			source,
		})?;
		if read != buf.len() {
			return Err(Error::ShortRead {
				core: self.core,
				register,
				read,
			});
		}
		Ok(u64::from_ne_bytes(buf))
	}
}

/// Maps the OS error of a failed open onto the failure classes of the tool
fn classify_open_error(core: usize, path: PathBuf, e: io::Error) -> Error {
	match e.raw_os_error() {
		Some(libc::ENXIO) => Error::CoreNotFound { core },
		Some(libc::EIO) => Error::MsrUnsupported { core },
		Some(libc::ENOENT) => {
			warn!("{} does not exist; is the msr kernel module loaded?", path.display());
			Error::CoreNotFound { core }
		},
		_ => Error::Io { path, source: e },
	}
}
