// AMD RAPL MSR addresses
pub const AMD_ENERGY_UNIT_MSR: u64 = 0xC001_0299;
pub const AMD_ENERGY_CORE_MSR: u64 = 0xC001_029A;
pub const AMD_ENERGY_PKG_MSR: u64 = 0xC001_029B;

// Fields of the unit register
pub const AMD_TIME_UNIT_MASK: u64 = 0xF_0000;
pub const AMD_ENERGY_UNIT_MASK: u64 = 0x1F00;
pub const AMD_POWER_UNIT_MASK: u64 = 0xF;
pub const AMD_TIME_UNIT_SHIFT: u32 = 16;
pub const AMD_ENERGY_UNIT_SHIFT: u32 = 8;

// Kernel interfaces
pub const SYSFS_CPU_ROOT: &str = "/sys/devices/system/cpu";
pub const MSR_DEVICE_ROOT: &str = "/dev/cpu";
pub const CPUINFO_PATH: &str = "/proc/cpuinfo";

// Sampling settings
pub const DATA_COLLECTION_INTERVAL_MS: u64 = 100;
pub const TOPOLOGY_CORES_PER_LINE: usize = 8;

// Process exit statuses
pub const EXIT_NO_SUCH_CORE: i32 = 2;
pub const EXIT_MSR_UNSUPPORTED: i32 = 3;
pub const EXIT_IO_FAILURE: i32 = 127;

// Package ID recorded for CPUs whose sysfs attribute is negative
pub const UNKNOWN_PACKAGE_ID: u32 = u32::MAX;
