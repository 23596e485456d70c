/*!

The two-tier fabric: every ToR is connected to every core switch.

Node ids follow the numbering of the simulator. For `T` ToRs there are `T/2` cores and each ToR hosts `T/2` servers.
* ToRs are `0..T`.
* Cores are `T..T+T/2`.
* Hosts are `T+T/2..T+T/2+T*T/2`, the first `T/2` of them under ToR 0, and so on.

Only the ToR–core links are modelled. A link is the directed pair `(from,to)`.

*/

use std::ops::Range;

use serde::{Serialize,Deserialize};

use crate::matrix::Matrix;
use crate::error;
use crate::error::Error;

pub type NodeId = usize;
///A directed link `(from,to)`.
pub type Link = (NodeId,NodeId);

///Which physical link, in table coordinates.
#[derive(Debug,Clone,Copy,PartialEq,Eq,Hash)]
pub enum LinkSlot
{
	///From ToR `tor` to the core of index `core`.
	Up{ tor:usize, core:usize },
	///From the core of index `core` to ToR `tor`.
	Down{ core:usize, tor:usize },
}

#[derive(Debug,Clone,Copy,PartialEq,Eq,Serialize,Deserialize)]
pub struct TwoTierFabric
{
	num_tors: usize,
}

impl TwoTierFabric
{
	///A fabric with `num_tors` ToRs. It needs at least 2 of them, so that there is at least a core.
	pub fn new(num_tors:usize) -> Result<TwoTierFabric,Error>
	{
		if num_tors < 2
		{
			return Err(error!(bad_argument).with_message(format!("a two-tier fabric needs at least 2 ToRs, got {}",num_tors)));
		}
		Ok(TwoTierFabric{num_tors})
	}
	pub fn num_tors(&self) -> usize
	{
		self.num_tors
	}
	///Number of cores, which is also the number of hosts per ToR.
	pub fn radix(&self) -> usize
	{
		self.num_tors/2
	}
	pub fn num_cores(&self) -> usize
	{
		self.radix()
	}
	pub fn num_hosts(&self) -> usize
	{
		self.num_tors*self.radix()
	}
	pub fn tors(&self) -> Range<NodeId>
	{
		0..self.num_tors
	}
	pub fn cores(&self) -> Range<NodeId>
	{
		self.num_tors..self.num_tors+self.radix()
	}
	pub fn hosts(&self) -> Range<NodeId>
	{
		let first = self.num_tors+self.radix();
		first..first+self.num_hosts()
	}
	///The node id of the core with the given index.
	pub fn core(&self, index:usize) -> NodeId
	{
		assert!(index < self.num_cores(),"core index {} out of range",index);
		self.num_tors+index
	}
	///Index of a core among the cores, `None` if the node is not a core.
	pub fn core_index(&self, node:NodeId) -> Option<usize>
	{
		if self.cores().contains(&node) { Some(node-self.num_tors) } else { None }
	}
	pub fn is_tor(&self, node:NodeId) -> bool
	{
		node < self.num_tors
	}
	pub fn tor_of_host(&self, host:NodeId) -> Result<NodeId,Error>
	{
		if !self.hosts().contains(&host)
		{
			return Err(error!(unknown_host,host));
		}
		Ok( (host-self.hosts().start)/self.radix() )
	}
	///All the ToR–core links, for each ToR and core first the upward and then the downward one.
	pub fn links(&self) -> Vec<Link>
	{
		let mut links = Vec::with_capacity(2*self.num_tors*self.num_cores());
		for tor in self.tors()
		{
			for core in self.cores()
			{
				links.push((tor,core));
				links.push((core,tor));
			}
		}
		links
	}
	///Table coordinates of a link, `None` if it is not a ToR–core link of this fabric.
	pub fn link_slot(&self, link:Link) -> Option<LinkSlot>
	{
		let (from,to) = link;
		if self.is_tor(from)
		{
			self.core_index(to).map(|core|LinkSlot::Up{tor:from,core})
		}
		else if self.is_tor(to)
		{
			self.core_index(from).map(|core|LinkSlot::Down{core,tor:to})
		}
		else
		{
			None
		}
	}
	pub fn link_of_slot(&self, slot:LinkSlot) -> Link
	{
		match slot
		{
			LinkSlot::Up{tor,core} => (tor,self.core(core)),
			LinkSlot::Down{core,tor} => (self.core(core),tor),
		}
	}
}

///A value for each ToR–core link of a fabric.
#[derive(Debug,Clone,PartialEq,Eq)]
pub struct LinkTable<T>
{
	up: Matrix<T>,
	down: Matrix<T>,
}

impl<T:Clone> LinkTable<T>
{
	pub fn constant(fabric:&TwoTierFabric, value:T) -> LinkTable<T>
	{
		LinkTable{
			up: Matrix::constant(value.clone(),fabric.num_tors(),fabric.num_cores()),
			down: Matrix::constant(value,fabric.num_tors(),fabric.num_cores()),
		}
	}
	pub fn fill(&mut self, value:T)
	{
		self.up.fill(value.clone());
		self.down.fill(value);
	}
}

impl<T> LinkTable<T>
{
	pub fn get_mut(&mut self, slot:LinkSlot) -> &mut T
	{
		match slot
		{
			LinkSlot::Up{tor,core} => self.up.get_mut(tor,core),
			LinkSlot::Down{core,tor} => self.down.get_mut(tor,core),
		}
	}
	///Iterate over `(slot,value)`, first the upward links.
	pub fn iter(&self) -> impl Iterator<Item=(LinkSlot,&T)>
	{
		let up = self.up.entries().map(|(tor,core,value)|(LinkSlot::Up{tor,core},value));
		let down = self.down.entries().map(|(tor,core,value)|(LinkSlot::Down{core,tor},value));
		up.chain(down)
	}
}

impl<T:Ord+Copy> LinkTable<T>
{
	pub fn max(&self) -> Option<T>
	{
		self.up.max().max(self.down.max())
	}
}

#[cfg(test)]
mod tests
{
	use super::*;
	#[test]
	fn numbering()
	{
		let fabric = TwoTierFabric::new(8).expect("valid fabric");
		assert_eq!(fabric.cores(),8..12);
		assert_eq!(fabric.hosts(),12..44);
		assert_eq!(fabric.tor_of_host(15).unwrap(),0);
		assert_eq!(fabric.tor_of_host(12).unwrap(),0);
		assert_eq!(fabric.tor_of_host(43).unwrap(),7);
		assert_eq!(fabric.tor_of_host(17).unwrap(),1);
		assert!(fabric.tor_of_host(44).is_err());
		assert!(fabric.tor_of_host(3).is_err());
		assert_eq!(fabric.links().len(),2*8*4);
		assert_eq!(fabric.core_index(9),Some(1));
		assert_eq!(fabric.core_index(7),None);
	}
	#[test]
	fn slots_round_trip()
	{
		let fabric = TwoTierFabric::new(4).expect("valid fabric");
		for link in fabric.links()
		{
			let slot = fabric.link_slot(link).expect("fabric link");
			assert_eq!(fabric.link_of_slot(slot),link);
		}
		assert_eq!(fabric.link_slot((0,1)),None);
		assert_eq!(fabric.link_slot((4,5)),None);
	}
	#[test]
	fn table_max()
	{
		let fabric = TwoTierFabric::new(4).expect("valid fabric");
		let mut table = LinkTable::constant(&fabric,0usize);
		*table.get_mut(LinkSlot::Down{core:1,tor:3}) += 2;
		assert_eq!(table.max(),Some(2));
		assert_eq!(table.iter().filter(|(_,v)|**v>0).count(),1);
		assert!(TwoTierFabric::new(1).is_err());
	}
}
