pub mod msr;

use std::time::Duration;

/// Raw counter increase between two readings
///
/// Rollover is not corrected; a counter that went backwards wraps instead of
/// panicking.
pub const fn counter_delta(start: u64, end: u64) -> u64 {
	end.wrapping_sub(start)
}

/// Converts a raw counter increase to joules
///
/// # Arguments
///
/// * `energy_start` - Starting raw counter value
/// * `energy_end` - Ending raw counter value
/// * `energy_unit` - Joules per count (`0.5^exponent`)
pub fn energy_delta_joules(energy_start: u64, energy_end: u64, energy_unit: f64) -> f64 {
	counter_delta(energy_start, energy_end) as f64 * energy_unit
}

/// Average power in watts over `elapsed`
///
/// Returns zero for a zero-length interval.
pub fn power_watts(energy_joules: f64, elapsed: Duration) -> f64 {
	let secs = elapsed.as_secs_f64();
	if secs > 0.0 { energy_joules / secs } else { 0.0 }
}
