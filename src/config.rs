/*!

Run-time configuration of the engine.

[GatewayConfig] holds the parameters of the file rendezvous with the simulator and [EngineOptions] everything a command needs, built from the command line with [EngineOptions::from_matches].

*/

use std::path::{Path,PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error;
use crate::error::Error;
use crate::ipc::pool::{GatewayKey,DEFAULT_GATEWAY_KEY};

///Parameters of the file rendezvous.
#[derive(Debug,Clone,PartialEq,Eq)]
pub struct GatewayConfig
{
	///File written by the simulator, relative to the run directory.
	pub request_file: PathBuf,
	///File read by the simulator, relative to the run directory.
	pub response_file: PathBuf,
	///Sleep between checks for the request file.
	pub poll_interval: Duration,
	///Give up waiting for the request after this long. `None` waits forever.
	pub wait_timeout: Option<Duration>,
	///Further attempts to read a request that could not be parsed.
	pub max_retries: usize,
	pub retry_delay: Duration,
	///Dump the fairness model as `model.lp` in the run directory.
	pub write_model: bool,
}

impl Default for GatewayConfig
{
	fn default() -> GatewayConfig
	{
		GatewayConfig{
			request_file: PathBuf::from("shared_memory_java.json"),
			response_file: PathBuf::from("shared_memory_python.json"),
			poll_interval: Duration::from_millis(10),
			wait_timeout: None,
			max_retries: 5,
			retry_delay: Duration::from_millis(100),
			write_model: true,
		}
	}
}

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum Command
{
	///Answer one request with an edge coloring.
	EdgeColoring,
	///Answer one request with min-max fair paths.
	Omniscient,
	///Route the colliding jobs recorded in a directory.
	OmniscientOffline,
	///Solve a fixed instance and print the paths.
	OmniscientTest,
	///Time the coloring on random demand sets.
	ColoringBenchmark,
}

impl Command
{
	///Whether the command needs a run directory as its second free argument.
	pub fn needs_run_dir(&self) -> bool
	{
		matches!(self,Command::EdgeColoring | Command::Omniscient | Command::OmniscientOffline)
	}
}

impl FromStr for Command
{
	type Err = Error;
	fn from_str(s:&str) -> Result<Command,Error>
	{
		match s
		{
			"edge_coloring" => Ok(Command::EdgeColoring),
			"omniscient" => Ok(Command::Omniscient),
			"omniscient_offline" => Ok(Command::OmniscientOffline),
			"omniscient_test" => Ok(Command::OmniscientTest),
			"coloring_benchmark" => Ok(Command::ColoringBenchmark),
			_ => Err(error!(bad_argument).with_message(format!("unknown command `{}`",s))),
		}
	}
}

///Everything needed to run a command.
#[derive(Debug,Clone,PartialEq)]
pub struct EngineOptions
{
	pub command: Command,
	pub run_dir: PathBuf,
	pub key: GatewayKey,
	pub gateway: GatewayConfig,
	///ToRs of the fabric for the commands that do not receive it in a request.
	pub n_tors: usize,
	///Link bandwidth for the offline job intervals.
	pub bandwidth: f64,
	///File of failed links for the offline analysis.
	pub failures: Option<PathBuf>,
	pub seed: u64,
}

impl EngineOptions
{
	pub fn new(command:Command, run_dir:&Path) -> EngineOptions
	{
		EngineOptions{
			command,
			run_dir: run_dir.to_path_buf(),
			key: DEFAULT_GATEWAY_KEY,
			gateway: GatewayConfig::default(),
			n_tors: 8,
			bandwidth: 100.0,
			failures: None,
			seed: 42,
		}
	}
	///Read the options from the parsed command line. The free arguments are the command and, when it needs one, the run directory.
	pub fn from_matches(matches:&getopts::Matches) -> Result<EngineOptions,Error>
	{
		let command : Command = matches.free.first().ok_or_else(||error!(bad_argument).with_message("no command given".to_string()))?.parse()?;
		let run_dir = match matches.free.get(1)
		{
			Some(dir) => PathBuf::from(dir),
			None if command.needs_run_dir() => return Err(error!(bad_argument).with_message(format!("command {:?} needs a run directory",command))),
			None => PathBuf::from("."),
		};
		let mut options = EngineOptions::new(command,&run_dir);
		if let Some(key) = parse_option(matches,"key")?
		{
			options.key = key;
		}
		if let Some(n_tors) = parse_option(matches,"n_tors")?
		{
			options.n_tors = n_tors;
		}
		if let Some(bandwidth) = parse_option(matches,"bandwidth")?
		{
			options.bandwidth = bandwidth;
		}
		if let Some(seed) = parse_option(matches,"seed")?
		{
			options.seed = seed;
		}
		options.failures = matches.opt_str("failures").map(PathBuf::from);
		let gateway = &mut options.gateway;
		if let Some(ms) = parse_option::<u64>(matches,"poll_ms")?
		{
			gateway.poll_interval = Duration::from_millis(ms);
		}
		if let Some(s) = parse_option::<f64>(matches,"timeout_s")?
		{
			if !(s>=0.0) || !s.is_finite()
			{
				return Err(error!(bad_argument).with_message(format!("--timeout_s={} is not a valid duration",s)));
			}
			gateway.wait_timeout = Some(Duration::from_secs_f64(s));
		}
		if let Some(retries) = parse_option(matches,"retries")?
		{
			gateway.max_retries = retries;
		}
		if let Some(request) = matches.opt_str("request")
		{
			gateway.request_file = PathBuf::from(request);
		}
		if let Some(response) = matches.opt_str("response")
		{
			gateway.response_file = PathBuf::from(response);
		}
		if matches.opt_present("no_model_dump")
		{
			gateway.write_model = false;
		}
		Ok(options)
	}
}

fn parse_option<T:FromStr>(matches:&getopts::Matches, name:&str) -> Result<Option<T>,Error>
{
	match matches.opt_str(name)
	{
		None => Ok(None),
		Some(text) => text.parse::<T>().map(Some).map_err(|_|error!(bad_argument).with_message(format!("--{}={} could not be parsed",name,text))),
	}
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::terminal_default_options;
	fn parse(args:&[&str]) -> Result<EngineOptions,Error>
	{
		let matches = terminal_default_options().parse(args).expect("valid command line");
		EngineOptions::from_matches(&matches)
	}
	#[test]
	fn defaults()
	{
		let options = parse(&["omniscient","/tmp/run"]).unwrap();
		assert_eq!(options.command,Command::Omniscient);
		assert_eq!(options.run_dir,PathBuf::from("/tmp/run"));
		assert_eq!(options.key,DEFAULT_GATEWAY_KEY);
		assert_eq!(options.gateway,GatewayConfig::default());
		assert_eq!(options.gateway.wait_timeout,None);
	}
	#[test]
	fn overrides()
	{
		let options = parse(&["edge_coloring","run","--poll_ms","5","--timeout_s","1.5","--retries","2","--no_model_dump","--key","7"]).unwrap();
		assert_eq!(options.gateway.poll_interval,Duration::from_millis(5));
		assert_eq!(options.gateway.wait_timeout,Some(Duration::from_millis(1500)));
		assert_eq!(options.gateway.max_retries,2);
		assert!(!options.gateway.write_model);
		assert_eq!(options.key,7);
	}
	#[test]
	fn bad_command_lines()
	{
		assert!(parse(&["omniscient"]).is_err());
		assert!(parse(&["paint","run"]).is_err());
		assert!(parse(&["omniscient","run","--retries","many"]).is_err());
		assert!(parse(&["omniscient_test","--n_tors","16"]).is_ok());
	}
}
