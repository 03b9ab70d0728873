use std::io::{self, Write};

use crate::constants::TOPOLOGY_CORES_PER_LINE;
use crate::power::PowerReading;
use crate::topology::CpuTopology;
use crate::units::UnitScale;

/// Lists every detected core with its package, eight per line
pub fn print_topology(out: &mut impl Write, topology: &CpuTopology) -> io::Result<()> {
	write!(out, "\t")?;
	for (i, core) in topology.cores.iter().enumerate() {
		write!(out, "{} ({})", core.index, core.package_id)?;
		if i % TOPOLOGY_CORES_PER_LINE == TOPOLOGY_CORES_PER_LINE - 1 {
			write!(out, "\n\t")?;
		} else {
			write!(out, ", ")?;
		}
	}
	writeln!(out)?;
	writeln!(
		out,
		"\tDetected {} cores in {} packages\n",
		topology.total_cores(),
		topology.total_packages()
	)
}

/// Shows the unit register, its exponents and the derived multipliers
pub fn print_units(out: &mut impl Write, units: &UnitScale) -> io::Result<()> {
	writeln!(out, "Core energy units: {:x}", units.raw)?;
	writeln!(
		out,
		"Time_unit:{}, Energy_unit: {}, Power_unit: {}",
		units.time_exp, units.energy_exp, units.power_exp
	)?;
	writeln!(
		out,
		"Time_unit:{}, Energy_unit: {}, Power_unit: {}",
		units.time_unit(),
		units.energy_unit(),
		units.power_unit()
	)
}

/// Prints per-core and per-package power plus the core sum
pub fn print_reading(out: &mut impl Write, reading: &PowerReading) -> io::Result<()> {
	for core in &reading.cores {
		writeln!(
			out,
			"Core {}, energy used: {:.3}W, Package: {:.3}W",
			core.core, core.core_watts, core.package_watts
		)?;
	}
	writeln!(out, "Core sum: {:.3}W", reading.core_sum())?;

	for (package_id, watts) in reading.packages() {
		writeln!(out, "Package {}: {:.3}W", package_id, watts)?;
	}

	out.flush()
}
