use std::collections::{BTreeMap,BTreeSet};
use fabric_routing::commodity::{Assignment,CommoditySet,HostId};
use fabric_routing::topology::TwoTierFabric;
use rand::rngs::StdRng;
use rand::Rng;

///Parameters of a random demand set.
pub struct DemandBuilder
{
    pub sources: usize,
    pub destinations: usize,
    pub commodities: usize,
    ///Offset added to destination ids so they do not overlap the sources.
    pub destination_offset: usize,
}

#[allow(dead_code)]
pub fn random_demand(builder: &DemandBuilder, rng: &mut StdRng) -> CommoditySet
{
    CommoditySet::from_pairs((0..builder.commodities).map(|id| {
        let source = rng.gen_range(0..builder.sources);
        let destination = builder.destination_offset + rng.gen_range(0..builder.destinations);
        (id, (source, destination))
    }))
}

///Random inter- and intra-rack commodities among the hosts of a fabric.
#[allow(dead_code)]
pub fn random_fabric_demand(fabric: &TwoTierFabric, commodities: usize, rng: &mut StdRng) -> CommoditySet
{
    let hosts = fabric.hosts();
    CommoditySet::from_pairs((0..commodities).map(|id| {
        let source = rng.gen_range(hosts.clone());
        let destination = rng.gen_range(hosts.clone());
        (id * 3 + 1, (source, destination))
    }))
}

///Largest number of commodities at a source or at a destination.
#[allow(dead_code)]
pub fn degree_bound(commodities: &CommoditySet) -> usize
{
    let mut tails: BTreeMap<HostId, usize> = BTreeMap::new();
    let mut heads: BTreeMap<HostId, usize> = BTreeMap::new();
    for c in commodities.iter()
    {
        *tails.entry(c.source).or_insert(0) += 1;
        *heads.entry(c.destination).or_insert(0) += 1;
    }
    tails.values().chain(heads.values()).copied().max().unwrap_or(0)
}

///Panics if two commodities with a common end share a color.
#[allow(dead_code)]
pub fn assert_proper(commodities: &CommoditySet, colors: &Assignment)
{
    let mut used_at_source: BTreeSet<(HostId, usize)> = BTreeSet::new();
    let mut used_at_destination: BTreeSet<(HostId, usize)> = BTreeSet::new();
    for c in commodities.iter()
    {
        let color = colors[&c.id];
        assert!(used_at_source.insert((c.source, color)), "color {} repeated at source {}", color, c.source);
        assert!(used_at_destination.insert((c.destination, color)), "color {} repeated at destination {}", color, c.destination);
    }
}

#[allow(dead_code)]
pub fn distinct_values(assignment: &Assignment) -> usize
{
    assignment.values().collect::<BTreeSet<_>>().len()
}
