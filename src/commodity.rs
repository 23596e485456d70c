/*!

Demands routed by the engine.

A [Commodity] is one source-destination demand of a control interval. Ids are given by the simulator and are returned untouched in the assignment.

*/

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde::{Serialize,Deserialize};

use crate::error;
use crate::error::Error;

///Identifier of a commodity, as given by the simulator.
pub type CommodityId = usize;
///Identifier of a host (a server hanging from some ToR).
pub type HostId = usize;

#[derive(Debug,Clone,Copy,PartialEq,Eq,Hash,PartialOrd,Ord,Serialize,Deserialize)]
pub struct Commodity
{
	pub id: CommodityId,
	pub source: HostId,
	pub destination: HostId,
}

impl Commodity
{
	pub fn new(id:CommodityId, source:HostId, destination:HostId) -> Commodity
	{
		Commodity{id,source,destination}
	}
}

///The commodities of one control interval, sorted by id.
///Immutable once decoded.
#[derive(Debug,Clone,Default,PartialEq,Eq)]
pub struct CommoditySet
{
	commodities: Vec<Commodity>,
}

impl CommoditySet
{
	///Build from `(id,(source,destination))` pairs. A repeated id keeps the last pair.
	pub fn from_pairs<I:IntoIterator<Item=(CommodityId,(HostId,HostId))>>(pairs:I) -> CommoditySet
	{
		let map : BTreeMap<CommodityId,(HostId,HostId)> = pairs.into_iter().collect();
		CommoditySet::from_map(map)
	}
	///Build from `(id,(source,destination))` pairs, failing with `MalformedRequest` on a repeated id.
	pub fn try_from_pairs<I:IntoIterator<Item=(CommodityId,(HostId,HostId))>>(pairs:I) -> Result<CommoditySet,Error>
	{
		let mut map = BTreeMap::new();
		for (id,pair) in pairs
		{
			match map.entry(id)
			{
				Entry::Vacant(entry) => { entry.insert(pair); },
				Entry::Occupied(_) => return Err(error!(malformed_request).with_message(format!("commodity {} appears more than once",id))),
			}
		}
		Ok(CommoditySet::from_map(map))
	}
	fn from_map(map:BTreeMap<CommodityId,(HostId,HostId)>) -> CommoditySet
	{
		CommoditySet{
			commodities: map.into_iter().map(|(id,(source,destination))|Commodity::new(id,source,destination)).collect(),
		}
	}
	pub fn len(&self) -> usize
	{
		self.commodities.len()
	}
	pub fn is_empty(&self) -> bool
	{
		self.commodities.is_empty()
	}
	pub fn iter(&self) -> std::slice::Iter<'_,Commodity>
	{
		self.commodities.iter()
	}
	pub fn ids(&self) -> impl Iterator<Item=CommodityId> + '_
	{
		self.commodities.iter().map(|c|c.id)
	}
}

impl<'a> IntoIterator for &'a CommoditySet
{
	type Item = &'a Commodity;
	type IntoIter = std::slice::Iter<'a,Commodity>;
	fn into_iter(self) -> Self::IntoIter
	{
		self.commodities.iter()
	}
}

///The answer for one control interval: a color or a path index for each commodity.
pub type Assignment = BTreeMap<CommodityId,usize>;
