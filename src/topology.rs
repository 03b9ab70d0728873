use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::constants::{SYSFS_CPU_ROOT, UNKNOWN_PACKAGE_ID};
use crate::error::{Error, Result};

/// A logical CPU and the physical package it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalCore {
	pub index: usize,
	pub package_id: u32,
}

/// Logical CPUs and packages discovered from sysfs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpuTopology {
	/// Logical cores in index order, `0..total_cores`
	pub cores: Vec<LogicalCore>,

	/// Maps package ID to the first core index observed in that package
	pub packages: BTreeMap<u32, usize>,
}

impl CpuTopology {
	/// Detects the topology of the running system
	pub fn detect() -> Result<Self> {
		let topology = Self::detect_in(SYSFS_CPU_ROOT)?;

		let online = num_cpus::get();
		if online != topology.total_cores() {
			warn!(
				"sysfs enumeration found {} cores but {} are reported online",
				topology.total_cores(),
				online
			);
		}

		Ok(topology)
	}

	/// Detects the topology below a sysfs CPU directory
	///
	/// Probes `cpu0`, `cpu1`, ... and stops at the first index without a
	/// `topology/physical_package_id` attribute.
	pub fn detect_in(root: impl AsRef<Path>) -> Result<Self> {
		let root = root.as_ref();
		let mut topology = Self::default();

		for index in 0.. {
			let Some(package_id) = read_package_id(root, index)? else {
				break;
			};
			debug!("found CPU {} in package {}", index, package_id);
			topology.push(LogicalCore { index, package_id });
		}

		Ok(topology)
	}

	/// Builds a topology from package IDs listed in core order
	pub fn from_package_ids(package_ids: &[u32]) -> Self {
		let mut topology = Self::default();
		for (index, &package_id) in package_ids.iter().enumerate() {
			topology.push(LogicalCore { index, package_id });
		}
		topology
	}

	fn push(&mut self, core: LogicalCore) {
		self.packages.entry(core.package_id).or_insert(core.index);
		self.cores.push(core);
	}

	pub fn total_cores(&self) -> usize {
		self.cores.len()
	}

	pub fn total_packages(&self) -> usize {
		self.packages.len()
	}

	/// Package the given core belongs to
	pub fn package_of(&self, core: usize) -> Option<u32> {
		self.cores.get(core).map(|c| c.package_id)
	}

	/// First core index observed in the given package
	pub fn representative_core(&self, package_id: u32) -> Option<usize> {
		self.packages.get(&package_id).copied()
	}
}

fn package_id_path(root: &Path, index: usize) -> PathBuf {
	root.join(format!("cpu{index}")).join("topology/physical_package_id")
}

/// Reads one CPU's package ID; `None` marks the end of enumeration
///
/// A negative ID (the kernel's "unknown package") maps to
/// [`UNKNOWN_PACKAGE_ID`].
fn read_package_id(root: &Path, index: usize) -> Result<Option<u32>> {
	let path = package_id_path(root, index);
	let contents = match fs::read_to_string(&path) {
		Ok(contents) => contents,
		Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
		Err(e) => {
			return Err(Error::Topology {
				path,
				detail: e.to_string(),
			});
		},
	};

	let value = contents.trim();
	match value.parse::<i64>() {
		Ok(id) if id < 0 => {
			warn!("CPU {} reports unknown package {}", index, id);
			Ok(Some(UNKNOWN_PACKAGE_ID))
		},
		Ok(id) => u32::try_from(id)
			.ok()
			.filter(|&id| id != UNKNOWN_PACKAGE_ID)
			.map(Some)
			.ok_or_else(|| Error::Topology {
				detail: format!("package id {id} out of range"),
				path,
			}),
		Err(e) => Err(Error::Topology {
			detail: format!("{e} in {value:?}"),
			path,
		}),
	}
}
