use std::env;

use tracing_subscriber::EnvFilter;

use fabric_routing::{get_version_number,terminal_main};

fn main()
{
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_|EnvFilter::new("info")))
		.with_writer(std::io::stderr)
		.init();
	let args: Vec<String> = env::args().collect();
	log::debug!("fabric-routing version {}",get_version_number());
	if let Err(error) = terminal_main(&args)
	{
		eprintln!("Error: {}",error);
		std::process::exit(1);
	}
}
