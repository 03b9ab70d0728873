//! Decoding of the RAPL power unit register.
//!
//! The register holds three exponents. A raw counter value multiplied by
//! `0.5^exponent` gives seconds, joules or watts respectively, so an energy
//! exponent of 13 means one count is 1/8192 J.

use crate::constants::*;
use crate::error::Result;
use crate::util::msr::RegisterRead;

/// Scaling exponents decoded from the power unit register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitScale {
	/// Register value the exponents were taken from
	pub raw: u64,
	pub time_exp: u8,
	pub energy_exp: u8,
	pub power_exp: u8,
}

impl UnitScale {
	/// Extracts the exponents from a raw register value
	pub const fn decode(raw: u64) -> Self {
		Self {
			raw,
			time_exp: ((raw & AMD_TIME_UNIT_MASK) >> AMD_TIME_UNIT_SHIFT) as u8,
			energy_exp: ((raw & AMD_ENERGY_UNIT_MASK) >> AMD_ENERGY_UNIT_SHIFT) as u8,
			power_exp: (raw & AMD_POWER_UNIT_MASK) as u8,
		}
	}

	/// Reads and decodes the unit register through `msr`
	///
	/// The register is package-wide, so any core's handle will do.
	pub fn read(msr: &impl RegisterRead) -> Result<Self> {
		Ok(Self::decode(msr.read(AMD_ENERGY_UNIT_MSR)?))
	}

	/// Seconds per time count
	pub fn time_unit(&self) -> f64 {
		multiplier(self.time_exp)
	}

	/// Joules per energy count
	pub fn energy_unit(&self) -> f64 {
		multiplier(self.energy_exp)
	}

	/// Watts per power count
	pub fn power_unit(&self) -> f64 {
		multiplier(self.power_exp)
	}
}

/// `0.5^exponent`
pub fn multiplier(exponent: u8) -> f64 {
	0.5f64.powi(i32::from(exponent))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn decodes_typical_zen_value() {
		// Zen 2 reports 0x000A1003: time 10, energy 16, power 3
		let units = UnitScale::decode(0x000A_1003);
		assert_eq!((units.time_exp, units.energy_exp, units.power_exp), (10, 16, 3));
		assert_eq!(units.energy_unit(), 1.0 / 65536.0);
		assert_eq!(units.power_unit(), 0.125);
		assert_eq!(units.time_unit(), 1.0 / 1024.0);
	}

	#[test]
	fn fields_are_isolated_by_their_masks() {
		let units = UnitScale::decode(0xFFFF_FFFF_FFFF_FFFF);
		assert_eq!((units.time_exp, units.energy_exp, units.power_exp), (0xF, 0x1F, 0xF));

		let units = UnitScale::decode(0x0D00);
		assert_eq!((units.time_exp, units.energy_exp, units.power_exp), (0, 13, 0));
		assert_eq!(units.energy_unit(), 1.0 / 8192.0);
	}

	#[test]
	fn multiplier_is_half_to_the_exponent_and_decreasing() {
		let mut previous = f64::INFINITY;
		for e in 0..15u8 {
			let m = multiplier(e);
			assert_eq!(m, 0.5f64.powi(e as i32));
			assert!(m < previous);
			previous = m;
		}
		assert_eq!(multiplier(0), 1.0);
	}
}
