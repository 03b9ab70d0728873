use std::fs;

use log::warn;

use crate::constants::CPUINFO_PATH;

/// Represents CPU manufacturer types that can be detected
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CpuType {
	/// AMD CPU architecture
	Amd,
	/// Intel CPU architecture, which uses different RAPL registers
	Intel,
	/// Any other CPU architecture
	Unsupported,
}

impl CpuType {
	/// Classifies the contents of `/proc/cpuinfo`
	pub fn from_cpuinfo(cpuinfo: &str) -> Self {
		if cpuinfo.contains("AuthenticAMD") {
			CpuType::Amd
		} else if cpuinfo.contains("GenuineIntel") {
			CpuType::Intel
		} else {
			CpuType::Unsupported
		}
	}
}

/// Detects the CPU manufacturer by reading /proc/cpuinfo
pub fn detect_cpu_type() -> CpuType {
	let cpuinfo = fs::read_to_string(CPUINFO_PATH).unwrap_or_default();
	CpuType::from_cpuinfo(&cpuinfo)
}

/// Warns when the energy MSRs are unlikely to mean what this tool expects
///
/// Only a warning: the MSR reads themselves decide whether the run fails.
pub fn warn_if_not_amd() -> CpuType {
	let cpu_type = detect_cpu_type();
	if cpu_type != CpuType::Amd {
		warn!("CPU vendor is {:?}; AMD energy MSRs may be absent or meaningless", cpu_type);
	}
	cpu_type
}
