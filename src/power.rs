use std::collections::BTreeMap;
use std::time::Duration;

use crate::energy::EnergySnapshot;
use crate::util::{energy_delta_joules, power_watts};

/// Power drawn by one sampled core and the package its handle reports
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorePower {
	pub core: usize,
	pub package_id: u32,

	/// Core power in watts
	pub core_watts: f64,

	/// Package power in watts, as read through this core
	pub package_watts: f64,
}

/// Contains power readings for the sampled cores
#[derive(Debug, Clone, PartialEq)]
pub struct PowerReading {
	/// Time between the two snapshots
	pub elapsed: Duration,

	pub cores: Vec<CorePower>,
}

impl PowerReading {
	/// Computes power from two snapshots of the same cores
	///
	/// The divisor is the measured time between the snapshots. Both passes
	/// read in the same order, so entries are paired by position; a pair
	/// whose core indices disagree is skipped.
	pub fn from_snapshots(start: &EnergySnapshot, end: &EnergySnapshot, energy_unit: f64) -> Self {
		let elapsed = end.taken_at.saturating_duration_since(start.taken_at);
		Self::from_snapshots_over(start, end, energy_unit, elapsed)
	}

	/// Like [`PowerReading::from_snapshots`] but with an explicit interval
	pub fn from_snapshots_over(
		start: &EnergySnapshot,
		end: &EnergySnapshot,
		energy_unit: f64,
		elapsed: Duration,
	) -> Self {
		let cores = start
			.cores
			.iter()
			.zip(&end.cores)
			.filter(|(s, e)| s.core == e.core)
			.map(|(s, e)| {
				let core_joules = energy_delta_joules(s.core_energy.raw, e.core_energy.raw, energy_unit);
				let package_joules = energy_delta_joules(s.package_energy.raw, e.package_energy.raw, energy_unit);
				CorePower {
					core: s.core,
					package_id: s.package_id,
					core_watts: power_watts(core_joules, elapsed),
					package_watts: power_watts(package_joules, elapsed),
				}
			})
			.collect();

		Self { elapsed, cores }
	}

	/// Sum of all per-core power values
	pub fn core_sum(&self) -> f64 {
		self.cores.iter().map(|c| c.core_watts).sum()
	}

	/// Package power per package ID, taken from the first sampled core in it
	pub fn packages(&self) -> BTreeMap<u32, f64> {
		let mut packages = BTreeMap::new();
		for core in &self.cores {
			packages.entry(core.package_id).or_insert(core.package_watts);
		}
		packages
	}
}
