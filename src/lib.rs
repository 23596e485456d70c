/*!
fabric-routing
=====

This crate computes routing assignments for a simulated two-tier data-center fabric, where every ToR connects to every core switch. Once per control interval the simulator asks for an assignment of its active commodities (source-destination demands between hosts) and this crate answers with either

* a color per commodity, through a proper edge coloring of the bipartite demand multigraph, so that commodities sharing a source or a destination never share a color ([coloring]), or
* a core per commodity, through an integer program minimizing the load of the most loaded ToR–core link while avoiding failed links and cores ([fairness]).

The simulator runs in another process. Both sides meet in a run directory, where the simulator drops a request file and waits for the response file ([ipc]).

# Usage

The binary serves one request and exits.

```text
fabric-routing edge_coloring RUN_DIR
fabric-routing omniscient RUN_DIR [--timeout_s SECONDS] [--no_model_dump]
fabric-routing omniscient_offline JOBS_DIR --n_tors 16 --bandwidth 100 [--failures FILE]
fabric-routing omniscient_test --n_tors 8
fabric-routing coloring_benchmark --n_tors 32 --seed 42
```

Logging goes through the `log` facade; the binary prints it according to `RUST_LOG`, for example `RUST_LOG=fabric_routing=debug`.

# Request example

```json
{
	"src_dst_pairs": {"0": [24, 26], "1": [24, 28]},
	"failed_links": [[0, 8], [8, 0]],
	"failed_cores": [9],
	"num_tors": 8
}
```

is answered with `{"0": 1, "1": 0}`, or with `{"error": {"kind": "infeasible", "message": "..."}}` when no assignment exists. The strings written by the simulator, such as `"{0=(24,26), 1=(24,28)}"`, are accepted too; see [ipc::wire].

*/

// --- crate attributes ---
// At clippy::style
	#![allow(clippy::needless_return)]
	#![allow(clippy::new_without_default)]
	#![allow(clippy::comparison_chain)]
	#![allow(clippy::single_match)]
	#![allow(clippy::let_and_return)]
	#![allow(clippy::len_without_is_empty)]
	#![allow(clippy::needless_range_loop)]
	#![allow(clippy::collapsible_else_if)]
	#![allow(clippy::tabs_in_doc_comments)]
	//NaN-aware comparisons of parsed floats.
	#![allow(clippy::nonminimal_bool)]
// At clippy::complexity
	#![allow(clippy::type_complexity)]
// At clippy::cargo
	#![warn(clippy::cargo)]
	#![allow(clippy::cargo_common_metadata)]

pub mod error;
pub mod config;
pub mod commodity;
pub mod matrix;
pub mod union_find;
pub mod coloring;
pub mod topology;
pub mod fairness;
pub mod ipc;
pub mod commands;

use config::{Command,EngineOptions};
use error::Error;
use ipc::GatewayPool;

pub fn get_version_number() -> &'static str
{
	match option_env!("CARGO_PKG_VERSION")
	{
		Some( version ) => version,
		_ => "?",
	}
}

/// The default options to be used in a terminal application.
/// You could build the `EngineOptions` directly instead.
pub fn terminal_default_options() -> getopts::Options
{
	let mut opts = getopts::Options::new();
	opts.optopt("","poll_ms","milliseconds between checks for the request file","MILLISECONDS");
	opts.optopt("","timeout_s","give up waiting for the request after this long (default: wait forever)","SECONDS");
	opts.optopt("","retries","attempts to read again a request that does not parse","COUNT");
	opts.optopt("k","key","identifier of the run","KEY");
	opts.optopt("","request","name of the request file in the run directory","FILE");
	opts.optopt("","response","name of the response file in the run directory","FILE");
	opts.optflag("","no_model_dump","do not write model.lp into the run directory");
	opts.optopt("n","n_tors","number of ToRs, for the commands without a request","COUNT");
	opts.optopt("b","bandwidth","link bandwidth used to compute job intervals","BITS_PER_TIME_UNIT");
	opts.optopt("f","failures","file of failed links, one `from to` per line","FILE");
	opts.optopt("s","seed","seed of the random generator","SEED");
	opts.optflag("h","help","show this help");
	opts
}

pub fn print_usage(program:&str, opts:&getopts::Options)
{
	let brief = format!("Usage: {} COMMAND [RUN_DIR] [options]\nCommands: edge_coloring, omniscient, omniscient_offline, omniscient_test, coloring_benchmark",program);
	print!("{}",opts.usage(&brief));
}

/// Run the command described by `options`, printing the results of the offline commands.
pub fn run(options:&EngineOptions, pool:&mut GatewayPool) -> Result<(),Error>
{
	match options.command
	{
		Command::EdgeColoring =>
		{
			commands::edge_coloring(pool,options.key,&options.run_dir,&options.gateway)?;
		},
		Command::Omniscient =>
		{
			commands::omniscient(pool,options.key,&options.run_dir,&options.gateway)?;
		},
		Command::OmniscientOffline =>
		{
			let reports = commands::omniscient_offline(options)?;
			if reports.is_empty()
			{
				println!("No possible collisions.");
			}
			for report in reports
			{
				print!("{}",report);
			}
		},
		Command::OmniscientTest =>
		{
			let (alpha,paths) = commands::omniscient_test(options.n_tors)?;
			println!("Objective (alpha): {}",alpha);
			for (src,src_tor,core,dst_tor,dst) in paths
			{
				println!("({},{},{},{},{})",src,src_tor,core,dst_tor,dst);
			}
		},
		Command::ColoringBenchmark =>
		{
			let sizes : Vec<usize> = (0..8).map(|i|options.n_tors<<i).collect();
			println!("commodities hosts colors max_degree milliseconds");
			for row in commands::coloring_benchmark(options.n_tors,&sizes,options.seed)?
			{
				println!("{} {} {} {} {:.3}",row.commodities,row.hosts,row.colors,row.maximum_degree,row.elapsed.as_secs_f64()*1000.0);
			}
		},
	}
	Ok(())
}

/// The standard main, once the logger is installed. `args[0]` is the program name.
pub fn terminal_main(args:&[String]) -> Result<(),Error>
{
	let opts = terminal_default_options();
	let matches = opts.parse(&args[1..]).map_err(|e|error!(bad_argument).with_message(e.to_string()))?;
	if matches.opt_present("help") || matches.free.is_empty()
	{
		print_usage(&args[0],&opts);
		return Ok(());
	}
	let options = EngineOptions::from_matches(&matches)?;
	let mut pool = GatewayPool::new();
	let result = run(&options,&mut pool);
	pool.close_and_remove_all()?;
	result
}
