/*!

The commands of the engine.

[edge_coloring] and [omniscient] serve exactly one request of the simulator each. The rest are offline tools: [omniscient_offline] routes the colliding jobs recorded by the traffic generator, [omniscient_test] solves a small fixed instance and [coloring_benchmark] times the coloring on random demand sets.

*/

use std::fs::File;
use std::io::{BufWriter,Write};
use std::path::Path;
use std::time::{Duration,Instant};

use log::{info,warn};
use rand::{Rng,SeedableRng,rngs::StdRng};

use crate::coloring::{color_commodities,maximum_degree};
use crate::commodity::{Assignment,CommoditySet,HostId};
use crate::config::{GatewayConfig,EngineOptions};
use crate::error;
use crate::error::{Error,ErrorKind};
use crate::fairness::{Controller,FailureState,checkpoint};
use crate::fairness::grouping::{group_jobs,solve_group,GroupReport};
use crate::fairness::jobs::{load_jobs,fetch_failed_links};
use crate::ipc::{GatewayPool,GatewayKey,SharedMemoryGateway,Request,Response};
use crate::topology::{TwoTierFabric,NodeId};

pub const MODEL_FILE_NAME: &str = "model.lp";

/**
One request/response cycle: wait for the request, consume it, compute the assignment and answer.
Failures after the request has been seen are answered with an error document before being returned.
**/
fn serve<F>(gateway:&SharedMemoryGateway, compute:F) -> Result<Assignment,Error>
	where F: FnOnce(&Request) -> Result<Assignment,Error>
{
	let request = match gateway.read()
	{
		Ok(request) => request,
		Err(e) =>
		{
			//Both mean a request was there; it is consumed and answered.
			if matches!(e.kind,ErrorKind::RetriesExhausted{..} | ErrorKind::MalformedRequest)
			{
				gateway.close()?;
				gateway.write_error(&e)?;
			}
			return Err(e);
		},
	};
	gateway.close()?;
	match compute(&request)
	{
		Ok(assignment) =>
		{
			gateway.write(&Response::Assignment(assignment.clone()))?;
			Ok(assignment)
		},
		Err(e) =>
		{
			warn!("answering with an error: {}",e);
			gateway.write_error(&e)?;
			Err(e)
		},
	}
}

///Answer one request with a proper edge coloring of its commodities.
pub fn edge_coloring(pool:&mut GatewayPool, key:GatewayKey, run_dir:&Path, config:&GatewayConfig) -> Result<Assignment,Error>
{
	let gateway = pool.get_or_create(key,run_dir,config);
	serve(gateway,|request|{
		let assignment = color_commodities(&request.commodities);
		info!("edge coloring: {} commodities, maximum degree {}",request.commodities.len(),maximum_degree(&request.commodities));
		Ok(assignment)
	})
}

///The checkpointed controller of `run_dir`, or a new one when there is none or it does not fit.
fn restore_controller(run_dir:&Path, n_tors:usize) -> Result<Controller,Error>
{
	match checkpoint::load(run_dir,n_tors)
	{
		Ok(Some(controller)) => Ok(controller),
		Ok(None) => Ok(Controller::new(TwoTierFabric::new(n_tors)?)),
		Err(e) if matches!(e.kind,ErrorKind::BadCheckpoint) =>
		{
			warn!("starting from scratch: {}",e);
			Ok(Controller::new(TwoTierFabric::new(n_tors)?))
		},
		Err(e) => Err(e),
	}
}

pub fn write_model(controller:&Controller, path:&Path) -> Result<(),Error>
{
	let file = File::create(path).map_err(|e|error!(could_not_create_file,path.to_path_buf(),e))?;
	let mut writer = BufWriter::new(file);
	controller.write_lp(&mut writer)?;
	writer.flush().map_err(|e|error!(io,e))
}

///Answer one request with the min-max fair path of each commodity.
pub fn omniscient(pool:&mut GatewayPool, key:GatewayKey, run_dir:&Path, config:&GatewayConfig) -> Result<Assignment,Error>
{
	let gateway = pool.get_or_create(key,run_dir,config);
	serve(gateway,|request|{
		let n_tors = request.require_num_tors()?;
		let mut controller = restore_controller(run_dir,n_tors)?;
		controller.cleanup();
		controller.load(&request.commodities,request.failures())?;
		controller.build_model()?;
		if config.write_model
		{
			write_model(&controller,&run_dir.join(MODEL_FILE_NAME))?;
		}
		let alpha = controller.solve()?;
		let assignment = controller.fetch_solution(&request.commodities)?;
		checkpoint::save(&controller,run_dir)?;
		info!("omniscient: {} commodities, {} failed links, {} failed cores, alpha={}",request.commodities.len(),request.failed_links.len(),request.failed_cores.len(),alpha);
		Ok(assignment)
	})
}

/**
Route the jobs recorded under `options.run_dir` group by group.
Jobs that collide with no other are skipped, so only groups of two or more jobs are reported.
**/
pub fn omniscient_offline(options:&EngineOptions) -> Result<Vec<GroupReport>,Error>
{
	let jobs = load_jobs(&options.run_dir,options.bandwidth)?;
	let failures = match &options.failures
	{
		Some(path) => FailureState::new(fetch_failed_links(path)?,vec![]),
		None => FailureState::default(),
	};
	let mut controller = Controller::new(TwoTierFabric::new(options.n_tors)?);
	let mut reports = vec![];
	for group in group_jobs(&jobs)
	{
		if group.len() < 2
		{
			continue;
		}
		let members : Vec<_> = group.iter().map(|&index|&jobs[index]).collect();
		reports.push(solve_group(&mut controller,&members,&failures)?);
	}
	info!("omniscient offline: {} jobs, {} colliding groups",jobs.len(),reports.len());
	Ok(reports)
}

///A chosen path, as `(src,src_tor,core,dst_tor,dst)`.
pub type HostPath = (HostId,NodeId,NodeId,NodeId,HostId);

///The fixed instance of [omniscient_test]: 13 commodities among the first and last hosts of the fabric.
pub fn test_instance(fabric:&TwoTierFabric) -> CommoditySet
{
	let first = fabric.hosts().start;
	let last = fabric.hosts().end-1;
	CommoditySet::from_pairs(vec![
		(0,(first,first+2)),
		(1,(first,first+4)),
		(2,(first+1,last)),
		(3,(first+1,last-2)),
		(4,(first+2,first)),
		(5,(first+2,last-3)),
		(6,(last-2,last)),
		(7,(last-3,first)),
		(8,(last-2,first+3)),
		(9,(last-2,last)),
		(10,(last-1,first)),
		(11,(last-1,first+2)),
		(12,(last,last-2)),
	])
}

///Solve [test_instance] without failures, returning α and the path of each inter-rack commodity.
pub fn omniscient_test(n_tors:usize) -> Result<(usize,Vec<HostPath>),Error>
{
	let fabric = TwoTierFabric::new(n_tors)?;
	if fabric.num_hosts() < 5
	{
		return Err(error!(bad_argument).with_message(format!("the test instance needs at least 5 hosts, {} ToRs give {}",n_tors,fabric.num_hosts())));
	}
	let commodities = test_instance(&fabric);
	let mut controller = Controller::new(fabric);
	controller.route(&commodities,FailureState::default())?;
	let alpha = controller.alpha()?;
	let selected = controller.selected_paths()?;
	let paths = commodities.iter().filter_map(|commodity|selected.get(&commodity.id).map(|path|(commodity.source,path.source_tor,path.core,path.destination_tor,commodity.destination))).collect();
	Ok((alpha,paths))
}

#[derive(Debug,Clone,PartialEq,Eq)]
pub struct BenchmarkRow
{
	pub commodities: usize,
	pub hosts: usize,
	pub colors: usize,
	pub maximum_degree: usize,
	pub elapsed: Duration,
}

///Random commodities among `hosts` hosts, never from a host to itself.
pub fn random_commodities(rng:&mut StdRng, hosts:usize, count:usize) -> CommoditySet
{
	assert!(hosts>=2,"random commodities need two hosts");
	CommoditySet::from_pairs((0..count).map(|id|{
		let source = rng.gen_range(0..hosts);
		let mut destination = rng.gen_range(0..hosts-1);
		if destination>=source
		{
			destination += 1;
		}
		(id,(source,destination))
	}))
}

///Color random demand sets of the given sizes over the hosts of an `n_tors` fabric.
pub fn coloring_benchmark(n_tors:usize, sizes:&[usize], seed:u64) -> Result<Vec<BenchmarkRow>,Error>
{
	let fabric = TwoTierFabric::new(n_tors)?;
	let hosts = fabric.num_hosts();
	if hosts < 2
	{
		return Err(error!(bad_argument).with_message(format!("{} ToRs give too few hosts",n_tors)));
	}
	let mut rng = StdRng::seed_from_u64(seed);
	let mut rows = Vec::with_capacity(sizes.len());
	for &size in sizes
	{
		let commodities = random_commodities(&mut rng,hosts,size);
		let start = Instant::now();
		let assignment = color_commodities(&commodities);
		let elapsed = start.elapsed();
		let colors = assignment.values().max().map(|c|c+1).unwrap_or(0);
		rows.push(BenchmarkRow{ commodities:size, hosts, colors, maximum_degree:maximum_degree(&commodities), elapsed });
	}
	Ok(rows)
}
