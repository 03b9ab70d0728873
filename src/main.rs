use std::process;

use log::error;
use zen_power::measure_cpu_power;
use zen_power::sampler::SamplerConfig;

fn main() {
	let env = env_logger::Env::default().default_filter_or("info");
	env_logger::init_from_env(env);

	if let Err(e) = measure_cpu_power(&SamplerConfig::default()) {
		error!("{}", e);
		process::exit(e.exit_code());
	}
}
