/*!

Collision grouping of jobs for the offline analysis.

Two jobs collide when their activity intervals intersect and they send from some common ToR. Groups are the connected components of the collision relation, so two jobs in different groups never collide and every group can be solved on its own.

*/

use std::collections::BTreeSet;
use std::fmt;

use itertools::Itertools;
use log::debug;

use crate::commodity::CommoditySet;
use crate::error::Error;
use crate::topology::NodeId;
use crate::union_find::UnionFind;
use super::controller::{Controller,FailureState};
use super::jobs::Job;

///Whether two half-open intervals share some instant.
pub fn intervals_intersect(a:(u64,u64), b:(u64,u64)) -> bool
{
	a.0.max(b.0) < a.1.min(b.1)
}

pub fn jobs_collide(a:&Job, b:&Job) -> bool
{
	intervals_intersect(a.interval(),b.interval()) && !a.tors.is_disjoint(&b.tors)
}

///Partition `jobs` into groups of indices. Groups are ordered by their first job and each is sorted.
pub fn group_jobs(jobs:&[Job]) -> Vec<Vec<usize>>
{
	let mut union_find = UnionFind::new(jobs.len());
	for (a,b) in (0..jobs.len()).tuple_combinations()
	{
		if jobs_collide(&jobs[a],&jobs[b])
		{
			union_find.union(a,b);
		}
	}
	debug!("{} jobs in {} collision groups",jobs.len(),union_find.group_count());
	union_find.all_group_members()
}

///A routed job of a group.
#[derive(Debug,Clone,PartialEq,Eq)]
pub struct JobReport
{
	pub job_id: usize,
	///Jobs of the group colliding directly with this one.
	pub colliding_jobs: Vec<usize>,
	///ToRs shared with the colliding jobs.
	pub common_tors: BTreeSet<NodeId>,
	///`(src,src_tor,core,dst_tor,dst)` of each virtual link.
	pub paths: Vec<(usize,NodeId,NodeId,NodeId,usize)>,
}

#[derive(Debug,Clone,PartialEq,Eq)]
pub struct GroupReport
{
	pub alpha: usize,
	pub jobs: Vec<JobReport>,
}

impl fmt::Display for GroupReport
{
	fn fmt(&self, formatter:&mut fmt::Formatter) -> fmt::Result
	{
		writeln!(formatter,"{}","-".repeat(80))?;
		writeln!(formatter,"jobs {} alpha={}",self.jobs.iter().map(|j|j.job_id).join(","),self.alpha)?;
		for job in self.jobs.iter()
		{
			writeln!(formatter,"job {} collides with {:?} on ToRs {:?}",job.job_id,job.colliding_jobs,job.common_tors)?;
			for path in job.paths.iter()
			{
				writeln!(formatter,"  {:?}",path)?;
			}
		}
		Ok(())
	}
}

/**
Route the virtual links of a group of jobs together and report the chosen paths.
The controller is cleaned up before loading, so that it can be reused for every group.
**/
pub fn solve_group(controller:&mut Controller, jobs:&[&Job], failures:&FailureState) -> Result<GroupReport,Error>
{
	//Every virtual link becomes a commodity, numbered in job order.
	let mut owners = vec![];
	let mut pairs = vec![];
	for (job_index,job) in jobs.iter().enumerate()
	{
		for link in job.virtual_links.iter()
		{
			pairs.push((pairs.len(),(link.source,link.destination)));
			owners.push((job_index,*link));
		}
	}
	let commodities = CommoditySet::from_pairs(pairs);
	controller.route(&commodities,failures.clone())?;
	let alpha = controller.alpha()?;
	let selected = controller.selected_paths()?;
	let mut reports : Vec<JobReport> = jobs.iter().map(|job|{
		let colliding : Vec<&&Job> = jobs.iter().filter(|other|other.id!=job.id && jobs_collide(job,other)).collect();
		let common_tors = colliding.iter().flat_map(|other|job.tors.intersection(&other.tors).copied().collect::<Vec<_>>()).collect();
		JobReport{
			job_id: job.id,
			colliding_jobs: colliding.iter().map(|other|other.id).collect(),
			common_tors,
			paths: vec![],
		}
	}).collect();
	let mut by_commodity = selected;
	for (commodity_id,(job_index,link)) in owners.into_iter().enumerate()
	{
		if let Some(path) = by_commodity.remove(&commodity_id)
		{
			reports[job_index].paths.push((link.source,path.source_tor,path.core,path.destination_tor,link.destination));
		}
	}
	debug!("group of {} jobs solved with alpha={}",jobs.len(),alpha);
	Ok(GroupReport{alpha,jobs:reports})
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::fairness::jobs::VirtualLink;
	use crate::topology::TwoTierFabric;
	fn job(id:usize, interval:(u64,u64), tors:&[NodeId]) -> Job
	{
		Job{ id, virtual_links:vec![], tors:tors.iter().copied().collect(), start_time:interval.0, flow_size:1.0, end_time:interval.1 }
	}
	#[test]
	fn touching_intervals_do_not_intersect()
	{
		assert!(intervals_intersect((0,10),(5,15)));
		assert!(!intervals_intersect((0,10),(10,15)));
		assert!(intervals_intersect((0,10),(2,3)));
	}
	#[test]
	fn groups_are_transitive()
	{
		let jobs = vec![
			job(0,(0,10),&[0,1]),
			job(1,(5,20),&[1,2]),
			job(2,(15,30),&[2,3]),
			//Overlaps job 0 in time only.
			job(3,(0,30),&[5]),
			//Shares ToRs with job 0 but not time.
			job(4,(40,50),&[0]),
		];
		assert_eq!(group_jobs(&jobs),vec![vec![0,1,2],vec![3],vec![4]]);
	}
	#[test]
	fn group_report_lists_paths()
	{
		let fabric = TwoTierFabric::new(4).unwrap();
		let mut controller = Controller::new(fabric);
		let mut a = job(7,(0,10),&[0]);
		a.virtual_links = vec![VirtualLink{source:6,destination:8,source_tor:0,destination_tor:1}];
		let mut b = job(9,(5,15),&[0]);
		b.virtual_links = vec![VirtualLink{source:7,destination:9,source_tor:0,destination_tor:1}];
		let report = solve_group(&mut controller,&[&a,&b],&FailureState::default()).unwrap();
		assert_eq!(report.alpha,1);
		assert_eq!(report.jobs[0].colliding_jobs,vec![9]);
		assert_eq!(report.jobs[1].common_tors.iter().copied().collect::<Vec<_>>(),vec![0]);
		let cores : BTreeSet<NodeId> = report.jobs.iter().map(|j|j.paths[0].2).collect();
		assert_eq!(cores.len(),2);
		assert!(report.to_string().contains("alpha=1"));
	}
	#[test]
	fn reported_tors_are_the_routed_ones()
	{
		//The job file claims ToRs 2 and 3, but hosts 6 and 8 hang from ToRs 0 and 1.
		let mut controller = Controller::new(TwoTierFabric::new(4).unwrap());
		let mut a = job(1,(0,10),&[2]);
		a.virtual_links = vec![VirtualLink{source:6,destination:8,source_tor:2,destination_tor:3}];
		let b = job(2,(0,10),&[2]);
		let report = solve_group(&mut controller,&[&a,&b],&FailureState::default()).unwrap();
		let (source,source_tor,core,destination_tor,destination) = report.jobs[0].paths[0];
		assert_eq!((source,source_tor,destination_tor,destination),(6,0,1,8));
		assert!(controller.fabric().cores().contains(&core));
	}
}
