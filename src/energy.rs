use std::time::Instant;

use crate::constants::{AMD_ENERGY_CORE_MSR, AMD_ENERGY_PKG_MSR};

/// Which energy counter a sample was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnergyChannel {
	Core,
	Package,
}

impl EnergyChannel {
	/// MSR address of the counter
	pub const fn register(self) -> u64 {
		match self {
			EnergyChannel::Core => AMD_ENERGY_CORE_MSR,
			EnergyChannel::Package => AMD_ENERGY_PKG_MSR,
		}
	}
}

/// A raw energy counter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnergySample {
	pub channel: EnergyChannel,
	pub raw: u64,
}

/// Both counters as seen from one core's handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreEnergy {
	pub core: usize,
	pub package_id: u32,
	pub core_energy: EnergySample,
	pub package_energy: EnergySample,
}

/// Snapshot of energy readings from CPU registers
///
/// One pass over every sampled core, in index order, stamped with the moment
/// the pass started.
#[derive(Debug, Clone)]
pub struct EnergySnapshot {
	pub taken_at: Instant,
	pub cores: Vec<CoreEnergy>,
}
