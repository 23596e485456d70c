/*!

Centralized controller with a global view of a two-tier fabric, selecting one core for each inter-rack commodity so that the most loaded link carries as few commodities as possible.

The integer program is

* `min α`
* `Σ_{p∈P_l} x_p^l = 1` for each commodity `l`,
* `Σ_{l} Σ_{p∈P_l : e∈p} x_p^l ≤ x_e` for each link `e`,
* `x_e ≤ α` for each link `e`,
* `x_p^l ∈ {0,1}`, `x_e, α ∈ ℕ`.

Paths through failed cores or links are not generated at all, instead of being forced to zero.

A controller goes through `Idle → Loaded → ModelBuilt → Solved` and back to `Idle` with [Controller::cleanup]. The candidate-path cache survives the cleanup, since the geometry of the fabric does not change during a run.

*/

use std::collections::{BTreeMap,BTreeSet};
use std::io::Write;

use good_lp::{constraint,variable,Constraint,Expression,ProblemVariables,ResolutionError,Solution,SolverModel,Variable};
use good_lp::solvers::microlp::microlp;
use itertools::Itertools;
use log::{debug,info,warn};
use serde::{Serialize,Deserialize};

use crate::commodity::{Commodity,CommodityId,CommoditySet,Assignment};
use crate::error;
use crate::error::Error;
use crate::topology::{TwoTierFabric,NodeId,Link,LinkSlot,LinkTable};

///A two-hop path `src_tor → core → dst_tor`.
#[derive(Debug,Clone,Copy,PartialEq,Eq,Hash,Serialize,Deserialize)]
pub struct CandidatePath
{
	pub source_tor: NodeId,
	pub core: NodeId,
	pub destination_tor: NodeId,
}

impl CandidatePath
{
	pub fn links(&self) -> [Link;2]
	{
		[(self.source_tor,self.core),(self.core,self.destination_tor)]
	}
}

///Failed resources of one control interval. Replaced wholesale on each load.
#[derive(Debug,Clone,Default,PartialEq,Eq)]
pub struct FailureState
{
	pub failed_links: BTreeSet<Link>,
	pub failed_cores: BTreeSet<NodeId>,
}

impl FailureState
{
	pub fn new<L:IntoIterator<Item=Link>,C:IntoIterator<Item=NodeId>>(failed_links:L, failed_cores:C) -> FailureState
	{
		FailureState{
			failed_links: failed_links.into_iter().collect(),
			failed_cores: failed_cores.into_iter().collect(),
		}
	}
	pub fn path_is_alive(&self, path:&CandidatePath) -> bool
	{
		!self.failed_cores.contains(&path.core) && path.links().iter().all(|link|!self.failed_links.contains(link))
	}
}

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum ControllerState
{
	Idle,
	Loaded,
	ModelBuilt,
	Solved,
}

///A path-selection variable of a commodity.
struct PathVariable
{
	///Position in the commodity's list of paths over non-failed cores. This is what the peer receives.
	path_index: usize,
	path: CandidatePath,
	variable: Variable,
}

///What the controller knows of a loaded commodity.
struct Registration
{
	commodity: Commodity,
	///Empty for commodities whose ends share a ToR; they never reach the core layer.
	candidates: Vec<PathVariable>,
	intra_rack: bool,
}

///Everything the integer program needs besides the path variables.
struct Model
{
	constraints: Vec<Constraint>,
	alpha: Variable,
}

///The outcome of a solved instance.
#[derive(Debug,Clone,PartialEq,Eq)]
pub struct SolvedInstance
{
	///Maximum number of selected paths crossing a link.
	pub alpha: usize,
	///Position in `Registration::candidates` of the selected path of each commodity.
	selected: BTreeMap<CommodityId,usize>,
}

pub struct Controller
{
	fabric: TwoTierFabric,
	///Per ToR pair, one path through each core of the fabric, in core order.
	shortest_paths: BTreeMap<(NodeId,NodeId),Vec<CandidatePath>>,
	failures: FailureState,
	state: ControllerState,
	registrations: BTreeMap<CommodityId,Registration>,
	///For each link, the `(commodity, candidate position)` of the paths crossing it.
	links_containing_paths: LinkTable<Vec<(CommodityId,usize)>>,
	variables: Option<ProblemVariables>,
	model: Option<Model>,
	solution: Option<SolvedInstance>,
}

impl Controller
{
	pub fn new(fabric:TwoTierFabric) -> Controller
	{
		Controller{
			fabric,
			shortest_paths: BTreeMap::new(),
			failures: FailureState::default(),
			state: ControllerState::Idle,
			registrations: BTreeMap::new(),
			links_containing_paths: LinkTable::constant(&fabric,vec![]),
			variables: None,
			model: None,
			solution: None,
		}
	}
	///A controller for `fabric` whose path cache starts with `paths`.
	///Entries whose geometry does not match the fabric are dropped.
	pub fn with_path_cache(fabric:TwoTierFabric, paths:BTreeMap<(NodeId,NodeId),Vec<CandidatePath>>) -> Controller
	{
		let mut controller = Controller::new(fabric);
		for ((source_tor,destination_tor),list) in paths
		{
			if list==controller.compute_paths(source_tor,destination_tor)
			{
				controller.shortest_paths.insert((source_tor,destination_tor),list);
			}
			else
			{
				debug!("discarding cached paths for ToRs {}->{}",source_tor,destination_tor);
			}
		}
		controller
	}
	pub fn fabric(&self) -> &TwoTierFabric
	{
		&self.fabric
	}
	pub fn state(&self) -> ControllerState
	{
		self.state
	}
	pub fn failures(&self) -> &FailureState
	{
		&self.failures
	}
	pub fn path_cache(&self) -> &BTreeMap<(NodeId,NodeId),Vec<CandidatePath>>
	{
		&self.shortest_paths
	}
	fn compute_paths(&self, source_tor:NodeId, destination_tor:NodeId) -> Vec<CandidatePath>
	{
		self.fabric.cores().map(|core|CandidatePath{source_tor,core,destination_tor}).collect()
	}
	///The cached paths of a ToR pair, computing them on first use.
	fn fetch_shortest_paths(&mut self, source_tor:NodeId, destination_tor:NodeId) -> Vec<CandidatePath>
	{
		if let Some(paths) = self.shortest_paths.get(&(source_tor,destination_tor))
		{
			return paths.clone();
		}
		let paths = self.compute_paths(source_tor,destination_tor);
		self.shortest_paths.insert((source_tor,destination_tor),paths.clone());
		paths
	}
	fn require(&self, expected:ControllerState, operation:&str) -> Result<(),Error>
	{
		if self.state!=expected
		{
			return Err(error!(invalid_state).with_message(format!("{} requires the controller to be {:?} but it is {:?}",operation,expected,self.state)));
		}
		Ok(())
	}
	/**
	Register the commodities of a control interval together with its failures.
	Each commodity gets a path-selection variable per candidate path that avoids the failed cores and links.
	Fails on hosts outside the fabric, leaving the controller idle.
	**/
	pub fn load(&mut self, commodities:&CommoditySet, failures:FailureState) -> Result<(),Error>
	{
		self.require(ControllerState::Idle,"load")?;
		for &core in failures.failed_cores.iter()
		{
			if self.fabric.core_index(core).is_none()
			{
				debug!("ignoring failed node {} which is not a core",core);
			}
		}
		let mut resolved = Vec::with_capacity(commodities.len());
		for commodity in commodities
		{
			let source_tor = self.fabric.tor_of_host(commodity.source)?;
			let destination_tor = self.fabric.tor_of_host(commodity.destination)?;
			resolved.push((*commodity,source_tor,destination_tor));
		}
		let alive_cores : Vec<NodeId> = self.fabric.cores().filter(|core|!failures.failed_cores.contains(core)).collect();
		let mut variables = ProblemVariables::new();
		for (commodity,source_tor,destination_tor) in resolved
		{
			let intra_rack = source_tor==destination_tor;
			let mut candidates = vec![];
			if !intra_rack
			{
				let paths = self.fetch_shortest_paths(source_tor,destination_tor);
				for (path_index,&core) in alive_cores.iter().enumerate()
				{
					let path = paths[core-self.fabric.cores().start];
					if !failures.path_is_alive(&path)
					{
						continue;
					}
					let position = candidates.len();
					for link in path.links()
					{
						if let Some(slot) = self.fabric.link_slot(link)
						{
							self.links_containing_paths.get_mut(slot).push((commodity.id,position));
						}
					}
					candidates.push(PathVariable{ path_index, path, variable: variables.add(variable().binary()) });
				}
			}
			self.registrations.insert(commodity.id,Registration{commodity,candidates,intra_rack});
		}
		self.failures = failures;
		self.variables = Some(variables);
		self.state = ControllerState::Loaded;
		debug!("loaded {} commodities, {} path variables",self.registrations.len(),self.registrations.values().map(|r|r.candidates.len()).sum::<usize>());
		Ok(())
	}
	/**
	Build the integer program over the loaded commodities.
	Fails with `Infeasible` when some inter-rack commodity has no surviving candidate path.
	**/
	pub fn build_model(&mut self) -> Result<(),Error>
	{
		self.require(ControllerState::Loaded,"build_model")?;
		if let Some(stranded) = self.registrations.values().find(|r|!r.intra_rack && r.candidates.is_empty())
		{
			return Err(error!(infeasible).with_message(format!("commodity {} ({}->{}) has no path avoiding the failed resources",stranded.commodity.id,stranded.commodity.source,stranded.commodity.destination)));
		}
		let variables = self.variables.as_mut().ok_or_else(||error!(invalid_state).with_message("no variables were registered".to_string()))?;
		let alpha = variables.add(variable().integer().min(0));
		let mut constraints = vec![];
		//Each commodity traverses exactly one path.
		for registration in self.registrations.values().filter(|r|!r.intra_rack)
		{
			let sum : Expression = registration.candidates.iter().map(|c|c.variable).sum();
			constraints.push(constraint!(sum == 1));
		}
		for (_,crossing) in self.links_containing_paths.iter()
		{
			let link_load = variables.add(variable().integer().min(0));
			let sum : Expression = crossing.iter().map(|(id,position)|self.registrations[id].candidates[*position].variable).sum();
			constraints.push(constraint!(sum <= link_load));
			constraints.push(constraint!(link_load <= alpha));
		}
		debug!("built model with {} constraints",constraints.len());
		self.model = Some(Model{constraints,alpha});
		self.state = ControllerState::ModelBuilt;
		Ok(())
	}
	/**
	Solve the built model and return the optimal α, the load of the most loaded link.
	A model that is infeasible, unbounded or not solved to optimality is an error, each of its own kind.
	**/
	pub fn solve(&mut self) -> Result<usize,Error>
	{
		self.require(ControllerState::ModelBuilt,"solve")?;
		let variables = self.variables.take().ok_or_else(||error!(invalid_state).with_message("the variables were already consumed".to_string()))?;
		let model = self.model.take().ok_or_else(||error!(invalid_state).with_message("no model was built".to_string()))?;
		let alpha = model.alpha;
		let mut problem = variables.minimise(alpha).using(microlp);
		for constraint in model.constraints
		{
			problem.add_constraint(constraint);
		}
		let solution = match problem.solve()
		{
			Ok(solution) => solution,
			Err(ResolutionError::Infeasible) => return Err(error!(infeasible).with_message("the solver found no feasible assignment".to_string())),
			Err(ResolutionError::Unbounded) => return Err(error!(unbounded)),
			Err(other) => return Err(error!(solver_failure).with_message(other.to_string())),
		};
		let mut selected = BTreeMap::new();
		for (&id,registration) in self.registrations.iter()
		{
			if registration.intra_rack
			{
				continue;
			}
			let chosen : Vec<usize> = registration.candidates.iter().positions(|c|solution.value(c.variable)>0.5).collect();
			if chosen.len()!=1
			{
				return Err(error!(solver_failure).with_message(format!("commodity {} has {} selected paths",id,chosen.len())));
			}
			selected.insert(id,chosen[0]);
		}
		let objective = solution.value(alpha).round() as usize;
		let mut instance = SolvedInstance{alpha:objective,selected};
		instance.alpha = self.loads_of(&instance).max().unwrap_or(0);
		if instance.alpha!=objective
		{
			warn!("solver objective {} differs from the maximum link load {}",objective,instance.alpha);
		}
		let alpha = instance.alpha;
		info!("min-max link fairness solved: {} commodities, alpha={}",self.registrations.len(),alpha);
		self.solution = Some(instance);
		self.state = ControllerState::Solved;
		Ok(alpha)
	}
	fn loads_of(&self, instance:&SolvedInstance) -> LinkTable<usize>
	{
		let mut loads = LinkTable::constant(&self.fabric,0usize);
		for (id,&position) in instance.selected.iter()
		{
			for link in self.registrations[id].candidates[position].path.links()
			{
				if let Some(slot) = self.fabric.link_slot(link)
				{
					*loads.get_mut(slot) += 1;
				}
			}
		}
		loads
	}
	fn solved(&self) -> Result<&SolvedInstance,Error>
	{
		self.require(ControllerState::Solved,"reading the solution")?;
		self.solution.as_ref().ok_or_else(||error!(invalid_state))
	}
	/**
	The path index chosen for each of the given commodities. Commodities within a rack get 0.
	Every commodity must have been loaded.
	**/
	pub fn fetch_solution(&self, commodities:&CommoditySet) -> Result<Assignment,Error>
	{
		let instance = self.solved()?;
		let mut assignment = Assignment::new();
		for commodity in commodities
		{
			let registration = self.registrations.get(&commodity.id).ok_or_else(||error!(invalid_state).with_message(format!("commodity {} was not loaded",commodity.id)))?;
			let path_index = match instance.selected.get(&commodity.id)
			{
				Some(&position) => registration.candidates[position].path_index,
				None => 0,
			};
			assignment.insert(commodity.id,path_index);
		}
		Ok(assignment)
	}
	///The selected path of each inter-rack commodity.
	pub fn selected_paths(&self) -> Result<BTreeMap<CommodityId,CandidatePath>,Error>
	{
		let instance = self.solved()?;
		Ok(instance.selected.iter().map(|(id,&position)|(*id,self.registrations[id].candidates[position].path)).collect())
	}
	///Number of selected paths crossing each link.
	pub fn link_loads(&self) -> Result<LinkTable<usize>,Error>
	{
		let instance = self.solved()?;
		Ok(self.loads_of(instance))
	}
	pub fn alpha(&self) -> Result<usize,Error>
	{
		Ok(self.solved()?.alpha)
	}
	/**
	Discard the variables, the model, the solution and the failure state.
	Keeps the fabric and the candidate-path cache.
	**/
	pub fn cleanup(&mut self)
	{
		self.registrations.clear();
		self.links_containing_paths.fill(vec![]);
		self.failures = FailureState::default();
		self.variables = None;
		self.model = None;
		self.solution = None;
		self.state = ControllerState::Idle;
	}
	///Run a whole control interval: cleanup, load, build, solve and fetch.
	pub fn route(&mut self, commodities:&CommoditySet, failures:FailureState) -> Result<Assignment,Error>
	{
		self.cleanup();
		self.load(commodities,failures)?;
		self.build_model()?;
		self.solve()?;
		self.fetch_solution(commodities)
	}
	/**
	Write the model in CPLEX LP format. Needs a built or solved model; the variable names are
	`x_<commodity>_<path index>` for paths, `x_e_<from>_<to>` for links and `alpha`.
	**/
	pub fn write_lp<W:Write>(&self, out:&mut W) -> Result<(),Error>
	{
		if self.state!=ControllerState::ModelBuilt && self.state!=ControllerState::Solved
		{
			return Err(error!(invalid_state).with_message(format!("there is no model to write in state {:?}",self.state)));
		}
		let io = |e|error!(io,e);
		let path_name = |id:&CommodityId,position:usize|format!("x_{}_{}",id,self.registrations[id].candidates[position].path_index);
		let link_name = |slot:LinkSlot|{
			let (from,to) = self.fabric.link_of_slot(slot);
			format!("{}_{}",from,to)
		};
		writeln!(out,"\\ min-max link fairness over {} ToRs",self.fabric.num_tors()).map_err(io)?;
		writeln!(out,"Minimize\n obj: alpha\nSubject To").map_err(io)?;
		for (id,registration) in self.registrations.iter().filter(|(_,r)|!r.intra_rack)
		{
			let terms = (0..registration.candidates.len()).map(|position|path_name(id,position)).join(" + ");
			writeln!(out," one_path_{}: {} = 1",id,terms).map_err(io)?;
		}
		let mut link_names = vec![];
		for (slot,crossing) in self.links_containing_paths.iter()
		{
			let name = link_name(slot);
			if crossing.is_empty()
			{
				writeln!(out," load_{}: - x_e_{} <= 0",name,name).map_err(io)?;
			}
			else
			{
				let terms = crossing.iter().map(|(id,position)|path_name(id,*position)).join(" + ");
				writeln!(out," load_{}: {} - x_e_{} <= 0",name,terms,name).map_err(io)?;
			}
			writeln!(out," bottleneck_{}: x_e_{} - alpha <= 0",name,name).map_err(io)?;
			link_names.push(format!("x_e_{}",name));
		}
		writeln!(out,"Bounds\n alpha >= 0").map_err(io)?;
		for name in link_names.iter()
		{
			writeln!(out," {} >= 0",name).map_err(io)?;
		}
		writeln!(out,"Generals\n alpha {}",link_names.join(" ")).map_err(io)?;
		let binaries = self.registrations.iter().flat_map(|(id,r)|(0..r.candidates.len()).map(move |position|(id,position))).map(|(id,position)|path_name(id,position)).join(" ");
		writeln!(out,"Binaries\n {}\nEnd",binaries).map_err(io)?;
		Ok(())
	}
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::error::ErrorKind;
	fn fabric(num_tors:usize) -> TwoTierFabric
	{
		TwoTierFabric::new(num_tors).expect("valid fabric")
	}
	#[test]
	fn lifecycle_is_enforced()
	{
		let mut controller = Controller::new(fabric(4));
		assert!(matches!(controller.solve().map_err(|e|e.kind),Err(ErrorKind::InvalidState)));
		assert!(matches!(controller.build_model().map_err(|e|e.kind),Err(ErrorKind::InvalidState)));
		let commodities = CommoditySet::from_pairs(vec![(0,(6,8))]);
		controller.load(&commodities,FailureState::default()).expect("load");
		assert_eq!(controller.state(),ControllerState::Loaded);
		assert!(controller.load(&commodities,FailureState::default()).is_err());
		controller.build_model().expect("build");
		controller.solve().expect("solve");
		assert_eq!(controller.state(),ControllerState::Solved);
		controller.cleanup();
		assert_eq!(controller.state(),ControllerState::Idle);
		assert_eq!(controller.path_cache().len(),1);
	}
	#[test]
	fn spreads_over_cores()
	{
		//4 ToRs, 2 cores, hosts 6..14 with 2 per ToR.
		let mut controller = Controller::new(fabric(4));
		let commodities = CommoditySet::from_pairs(vec![(0,(6,8)),(1,(7,9))]);
		let assignment = controller.route(&commodities,FailureState::default()).expect("route");
		assert_eq!(controller.alpha().unwrap(),1);
		assert_ne!(assignment[&0],assignment[&1]);
	}
	#[test]
	fn unknown_host_is_reported()
	{
		let mut controller = Controller::new(fabric(4));
		let commodities = CommoditySet::from_pairs(vec![(0,(6,99))]);
		let error = controller.route(&commodities,FailureState::default()).unwrap_err();
		assert!(matches!(error.kind,ErrorKind::UnknownHost(99)));
		assert_eq!(controller.state(),ControllerState::Idle);
	}
	#[test]
	fn failed_link_removes_candidate_but_keeps_index()
	{
		//Core 4 cannot reach ToR 1, so commodity 0 must take core 5, which is index 1.
		let mut controller = Controller::new(fabric(4));
		let commodities = CommoditySet::from_pairs(vec![(0,(6,8))]);
		let failures = FailureState::new(vec![(4,1)],vec![]);
		let assignment = controller.route(&commodities,failures).expect("route");
		assert_eq!(assignment[&0],1);
		let paths = controller.selected_paths().unwrap();
		assert_eq!(paths[&0].core,5);
	}
	#[test]
	fn intra_rack_is_not_routed()
	{
		let mut controller = Controller::new(fabric(4));
		let commodities = CommoditySet::from_pairs(vec![(3,(6,7))]);
		let assignment = controller.route(&commodities,FailureState::new(vec![],vec![4,5])).expect("route");
		assert_eq!(assignment[&3],0);
		assert_eq!(controller.alpha().unwrap(),0);
	}
	#[test]
	fn lp_dump_lists_every_part()
	{
		let mut controller = Controller::new(fabric(4));
		let commodities = CommoditySet::from_pairs(vec![(0,(6,8))]);
		controller.load(&commodities,FailureState::default()).unwrap();
		let mut buffer = vec![];
		assert!(controller.write_lp(&mut buffer).is_err());
		controller.build_model().unwrap();
		controller.write_lp(&mut buffer).unwrap();
		let text = String::from_utf8(buffer).unwrap();
		assert!(text.contains("one_path_0: x_0_0 + x_0_1 = 1"),"{}",text);
		assert!(text.contains("load_0_4: x_0_0 - x_e_0_4 <= 0"),"{}",text);
		assert!(text.contains("load_2_4: - x_e_2_4 <= 0"),"{}",text);
		assert!(text.contains("bottleneck_4_1: x_e_4_1 - alpha <= 0"),"{}",text);
		assert!(text.contains("Binaries\n x_0_0 x_0_1"),"{}",text);
		assert!(text.trim_end().ends_with("End"));
	}
}
