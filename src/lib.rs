pub mod constants;
pub mod cpu_type;
pub mod display;
pub mod energy;
pub mod error;
pub mod power;
pub mod sampler;
pub mod topology;
pub mod units;
pub mod util;

use std::io;

use log::info;

pub use crate::error::{Error, Result};
use crate::power::PowerReading;
use crate::sampler::{PowerSampler, SamplerConfig};
use crate::topology::CpuTopology;

/// Detects the topology, samples the selected cores once and prints the results
///
/// This is the main entry point for the power measurement functionality.
pub fn measure_cpu_power(config: &SamplerConfig) -> Result<PowerReading> {
	cpu_type::warn_if_not_amd();

	let mut stdout = io::stdout().lock();
	let topology = CpuTopology::detect()?;
	display::print_topology(&mut stdout, &topology).map_err(Error::Output)?;

	let sampler = PowerSampler::open(&topology, config)?;
	info!(
		"sampling {} of {} cores every {} ms",
		sampler.cores().count(),
		topology.total_cores(),
		config.interval.as_millis()
	);
	display::print_units(&mut stdout, sampler.units()).map_err(Error::Output)?;

	let reading = sampler.measure()?;
	display::print_reading(&mut stdout, &reading).map_err(Error::Output)?;

	Ok(reading)
}
