use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::constants::DATA_COLLECTION_INTERVAL_MS;
use crate::energy::{CoreEnergy, EnergyChannel, EnergySample, EnergySnapshot};
use crate::error::{Error, Result};
use crate::power::PowerReading;
use crate::topology::CpuTopology;
use crate::units::UnitScale;
use crate::util::msr::{MsrHandle, RegisterRead};

/// Which logical cores get their own MSR handle
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CoreSelection {
	/// Cores `0..total_cores / 2`
	///
	/// With SMT enabled Linux usually numbers the first hardware thread of
	/// every physical core first, so this reads each core once.
	#[default]
	LowerHalf,
	/// Every detected core
	All,
	/// An explicit list of core indices
	List(Vec<usize>),
}

impl CoreSelection {
	/// Resolves the selection against a detected topology
	///
	/// A listed index the topology does not contain is `CoreNotFound`.
	pub fn resolve(&self, topology: &CpuTopology) -> Result<Vec<usize>> {
		match self {
			CoreSelection::LowerHalf => Ok((0..topology.total_cores() / 2).collect()),
			CoreSelection::All => Ok((0..topology.total_cores()).collect()),
			CoreSelection::List(cores) => match cores.iter().find(|&&core| core >= topology.total_cores()) {
				Some(&core) => Err(Error::CoreNotFound { core }),
				None => Ok(cores.clone()),
			},
		}
	}
}

/// Sampling parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplerConfig {
	/// Time to wait between the two passes
	pub interval: Duration,
	pub selection: CoreSelection,
}

impl Default for SamplerConfig {
	fn default() -> Self {
		Self {
			interval: Duration::from_millis(DATA_COLLECTION_INTERVAL_MS),
			selection: CoreSelection::default(),
		}
	}
}

/// Takes two passes over the energy counters and turns the difference into watts
pub struct PowerSampler<R: RegisterRead = MsrHandle> {
	/// One reader per sampled core, in index order
	handles: Vec<R>,
	package_ids: Vec<u32>,
	units: UnitScale,
	interval: Duration,
}

impl PowerSampler<MsrHandle> {
	/// Opens an MSR handle for every selected core and decodes the units
	///
	/// Stops at the first core that cannot be opened.
	pub fn open(topology: &CpuTopology, config: &SamplerConfig) -> Result<Self> {
		let cores = config.selection.resolve(topology)?;
		let handles = cores.into_iter().map(MsrHandle::open).collect::<Result<Vec<_>>>()?;
		Self::with_handles(handles, topology, config)
	}
}

impl<R: RegisterRead> PowerSampler<R> {
	/// Builds a sampler over already opened readers
	pub fn with_handles(handles: Vec<R>, topology: &CpuTopology, config: &SamplerConfig) -> Result<Self> {
		let first = handles.first().ok_or(Error::NoCores)?;
		let units = UnitScale::read(first)?;
		debug!("unit register {:#x} read through CPU {}", units.raw, first.core());

		let package_ids = handles
			.iter()
			.map(|h| topology.package_of(h.core()).ok_or(Error::CoreNotFound { core: h.core() }))
			.collect::<Result<Vec<_>>>()?;

		Ok(Self {
			handles,
			package_ids,
			units,
			interval: config.interval,
		})
	}

	pub fn units(&self) -> &UnitScale {
		&self.units
	}

	/// Indices of the sampled cores
	pub fn cores(&self) -> impl Iterator<Item = usize> + '_ {
		self.handles.iter().map(|h| h.core())
	}

	/// Reads core and package energy from every handle in index order
	pub fn snapshot(&self) -> Result<EnergySnapshot> {
		let taken_at = Instant::now();
		let cores = self
			.handles
			.iter()
			.zip(&self.package_ids)
			.map(|(handle, &package_id)| {
				Ok(CoreEnergy {
					core: handle.core(),
					package_id,
					core_energy: read_sample(handle, EnergyChannel::Core)?,
					package_energy: read_sample(handle, EnergyChannel::Package)?,
				})
			})
			.collect::<Result<Vec<_>>>()?;

		Ok(EnergySnapshot { taken_at, cores })
	}

	/// Samples twice, `interval` apart, and computes the power drawn
	pub fn measure(&self) -> Result<PowerReading> {
		let start = self.snapshot()?;
		thread::sleep(self.interval);
		let end = self.snapshot()?;

		let reading = PowerReading::from_snapshots(&start, &end, self.units.energy_unit());
		info!(
			"sampled {} cores over {:.1} ms",
			reading.cores.len(),
			reading.elapsed.as_secs_f64() * 1000.0
		);
		Ok(reading)
	}
}

fn read_sample(handle: &impl RegisterRead, channel: EnergyChannel) -> Result<EnergySample> {
	Ok(EnergySample {
		channel,
		raw: handle.read(channel.register())?,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::constants::*;
	use std::cell::{Cell, RefCell};
	use std::collections::HashMap;
	use std::rc::Rc;

	/// In-memory registers; every counter read advances the counter by a fixed step
	struct FakeMsr {
		core: usize,
		registers: RefCell<HashMap<u64, u64>>,
		steps: HashMap<u64, u64>,
		reads: Rc<Cell<usize>>,
		fail_after: Option<usize>,
	}

	impl FakeMsr {
		fn new(core: usize, core_step: u64, package_step: u64, reads: Rc<Cell<usize>>) -> Self {
			Self {
				core,
				registers: RefCell::new(HashMap::from([
					(AMD_ENERGY_UNIT_MSR, 0x000A_0D03),
					(AMD_ENERGY_CORE_MSR, 1000),
					(AMD_ENERGY_PKG_MSR, 50_000),
				])),
				steps: HashMap::from([(AMD_ENERGY_CORE_MSR, core_step), (AMD_ENERGY_PKG_MSR, package_step)]),
				reads,
				fail_after: None,
			}
		}
	}

	impl RegisterRead for FakeMsr {
		fn core(&self) -> usize {
			self.core
		}

		fn read(&self, register: u64) -> Result<u64> {
			let n = self.reads.get();
			self.reads.set(n + 1);
			if self.fail_after.is_some_and(|limit| n >= limit) {
				return Err(Error::ShortRead {
					core: self.core,
					register,
					read: 0,
				});
			}
			let mut registers = self.registers.borrow_mut();
			let value = registers.get(&register).copied().unwrap_or_default();
			if let Some(step) = self.steps.get(&register) {
				registers.insert(register, value + step);
			}
			Ok(value)
		}
	}

	fn config(interval_ms: u64) -> SamplerConfig {
		SamplerConfig {
			interval: Duration::from_millis(interval_ms),
			selection: CoreSelection::All,
		}
	}

	#[test]
	fn lower_half_is_default_selection() {
		let topology = CpuTopology::from_package_ids(&[0; 8]);
		assert_eq!(SamplerConfig::default().interval, Duration::from_millis(100));
		assert_eq!(CoreSelection::default().resolve(&topology).unwrap(), vec![0, 1, 2, 3]);
		assert_eq!(CoreSelection::All.resolve(&topology).unwrap().len(), 8);
		assert_eq!(CoreSelection::List(vec![5, 1]).resolve(&topology).unwrap(), vec![5, 1]);
		assert!(
			CoreSelection::LowerHalf
				.resolve(&CpuTopology::from_package_ids(&[0]))
				.unwrap()
				.is_empty()
		);
	}

	#[test]
	fn units_come_from_first_handle() {
		let reads = Rc::new(Cell::new(0));
		let topology = CpuTopology::from_package_ids(&[0, 0]);
		let handles = vec![FakeMsr::new(0, 1, 1, reads.clone()), FakeMsr::new(1, 1, 1, reads.clone())];

		let sampler = PowerSampler::with_handles(handles, &topology, &config(0)).unwrap();
		assert_eq!(sampler.units().energy_exp, 13);
		assert_eq!(sampler.units().time_exp, 10);
		assert_eq!(sampler.units().power_exp, 3);
		assert_eq!(reads.get(), 1);
	}

	#[test]
	fn no_handles_is_an_error() {
		let topology = CpuTopology::from_package_ids(&[0]);
		let result = PowerSampler::<FakeMsr>::with_handles(Vec::new(), &topology, &config(0));
		assert!(matches!(result, Err(Error::NoCores)));
	}

	#[test]
	fn snapshot_reads_core_then_package_in_index_order() {
		let reads = Rc::new(Cell::new(0));
		let topology = CpuTopology::from_package_ids(&[0, 0, 1, 1]);
		let handles: Vec<FakeMsr> = (0..4).map(|i| FakeMsr::new(i, 1, 1, reads.clone())).collect();

		let sampler = PowerSampler::with_handles(handles, &topology, &config(0)).unwrap();
		let snapshot = sampler.snapshot().unwrap();

		assert_eq!(reads.get(), 1 + 4 * 2);
		let cores: Vec<_> = snapshot.cores.iter().map(|c| (c.core, c.package_id)).collect();
		assert_eq!(cores, vec![(0, 0), (1, 0), (2, 1), (3, 1)]);
		assert_eq!(snapshot.cores[0].core_energy.channel, EnergyChannel::Core);
		assert_eq!(snapshot.cores[0].package_energy.channel, EnergyChannel::Package);
		assert_eq!(snapshot.cores[0].core_energy.raw, 1000);
		assert_eq!(snapshot.cores[0].package_energy.raw, 50_000);
	}

	#[test]
	fn measure_converts_deltas_to_watts() {
		let reads = Rc::new(Cell::new(0));
		let topology = CpuTopology::from_package_ids(&[0, 0]);
		// 8192 counts per read at 1/8192 J per count: 1 J per pass
		let handles = vec![
			FakeMsr::new(0, 8192, 8192 * 4, reads.clone()),
			FakeMsr::new(1, 8192 * 2, 8192 * 4, reads.clone()),
		];

		let sampler = PowerSampler::with_handles(handles, &topology, &config(20)).unwrap();
		let reading = sampler.measure().unwrap();

		assert!(reading.elapsed >= Duration::from_millis(20));
		let secs = reading.elapsed.as_secs_f64();
		let expected = [1.0 / secs, 2.0 / secs];
		for (core, want) in reading.cores.iter().zip(expected) {
			assert!((core.core_watts - want).abs() < 1e-9);
			assert!((core.package_watts - 4.0 / secs).abs() < 1e-9);
		}
		assert!((reading.core_sum() - 3.0 / secs).abs() < 1e-9);
	}

	#[test]
	fn read_failure_discards_the_whole_measurement() {
		let reads = Rc::new(Cell::new(0));
		let topology = CpuTopology::from_package_ids(&[0, 0]);
		let mut failing = FakeMsr::new(1, 1, 1, reads.clone());
		// unit read + first pass succeed, second pass fails on core 1
		failing.fail_after = Some(1 + 4 + 2);
		let handles = vec![FakeMsr::new(0, 1, 1, reads.clone()), failing];

		let sampler = PowerSampler::with_handles(handles, &topology, &config(0)).unwrap();
		let err = sampler.measure().unwrap_err();
		assert!(matches!(err, Error::ShortRead { core: 1, .. }));
	}

	#[test]
	fn opening_a_missing_core_fails_before_any_read() {
		// selection points past any real CPU, so the device node cannot exist
		let topology = CpuTopology::from_package_ids(&[0]);
		let config = SamplerConfig {
			interval: Duration::ZERO,
			selection: CoreSelection::List(vec![usize::MAX]),
		};
		match PowerSampler::open(&topology, &config) {
			Err(Error::CoreNotFound { core }) => assert_eq!(core, usize::MAX),
			Err(other) => panic!("expected core-not-found, got {other}"),
			Ok(_) => panic!("opened a core that does not exist"),
		}
	}

	#[test]
	fn listed_core_outside_topology_is_rejected() {
		let topology = CpuTopology::from_package_ids(&[0, 0, 1, 1]);
		let selection = CoreSelection::List(vec![1, 4, 2]);
		assert!(matches!(selection.resolve(&topology), Err(Error::CoreNotFound { core: 4 })));
	}

	#[test]
	fn handle_for_unknown_core_is_not_labelled_package_zero() {
		let reads = Rc::new(Cell::new(0));
		let topology = CpuTopology::from_package_ids(&[1, 1]);
		let handles = vec![FakeMsr::new(0, 1, 1, reads.clone()), FakeMsr::new(7, 1, 1, reads.clone())];

		let result = PowerSampler::with_handles(handles, &topology, &config(0));
		assert!(matches!(result, Err(Error::CoreNotFound { core: 7 })));
	}

	#[test]
	fn duplicate_listed_cores_get_their_own_deltas() {
		let reads = Rc::new(Cell::new(0));
		let topology = CpuTopology::from_package_ids(&[0, 0]);
		// the same core twice; each reader keeps its own counter
		let handles = vec![
			FakeMsr::new(1, 8192, 8192, reads.clone()),
			FakeMsr::new(1, 8192 * 3, 8192, reads.clone()),
		];

		let sampler = PowerSampler::with_handles(handles, &topology, &config(0)).unwrap();
		let start = sampler.snapshot().unwrap();
		let end = sampler.snapshot().unwrap();
		let energy_unit = sampler.units().energy_unit();
		let reading = PowerReading::from_snapshots_over(&start, &end, energy_unit, Duration::from_secs(1));

		let watts: Vec<_> = reading.cores.iter().map(|c| c.core_watts).collect();
		assert_eq!(watts, vec![1.0, 3.0]);
	}
}
