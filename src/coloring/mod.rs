/*!

Proper edge coloring of the bipartite demand multigraph.

Each commodity is an edge from the tail copy of its source host to the head copy of its destination host. Two commodities sharing a source or a destination never get the same color, and exactly as many colors as the maximum degree are used, which is optimal for bipartite multigraphs.

The graph is first made K-regular ([regular]). Then `color(edges,k)` proceeds by
* `k==1`: the edges are a perfect matching and get a new color.
* `k` odd: a perfect matching is removed ([matching]) and colored, and we continue with `k-1`.
* `k` even: the edges are split in two `k/2`-regular halves by Eulerian circuits ([euler]).

The recursion depth is bounded by about `2*log2(K)`.

*/

pub mod regular;
pub mod matching;
pub mod euler;

use std::collections::BTreeMap;

use log::debug;

use crate::commodity::{CommoditySet,Assignment,HostId};
use self::regular::{RegularGraph,build_regular_graph};
use self::matching::HopcroftKarp;
use self::euler::euler_split;

///Recursive colorer over a fixed regular graph.
struct Colorer<'a>
{
	graph: &'a RegularGraph,
	///Edges of each color, indices of `graph`.
	classes: Vec<Vec<usize>>,
}

impl<'a> Colorer<'a>
{
	fn new(graph:&'a RegularGraph) -> Colorer<'a>
	{
		Colorer{ graph, classes: Vec::with_capacity(graph.degree) }
	}
	fn color(&mut self, edges:Vec<usize>, k:usize)
	{
		if k==0 || edges.is_empty()
		{
			return;
		}
		if k==1
		{
			self.classes.push(edges);
			return;
		}
		if k%2==1
		{
			let (matched,rest) = self.extract_perfect_matching(edges);
			self.classes.push(matched);
			self.color(rest,k-1);
		}
		else
		{
			let (first,second) = euler_split(self.graph,&edges);
			self.color(first,k/2);
			self.color(second,k/2);
		}
	}
	///Split `edges`, a regular subgraph, into a perfect matching and the remaining edges.
	fn extract_perfect_matching(&self, edges:Vec<usize>) -> (Vec<usize>,Vec<usize>)
	{
		let side = self.graph.side;
		let mut hopcroft_karp = HopcroftKarp::new(side,side);
		for &edge in edges.iter()
		{
			hopcroft_karp.add_edge(self.graph.tails[edge],self.graph.heads[edge]);
		}
		let pairs = hopcroft_karp.max_matching();
		assert_eq!(pairs.len(),side,"a regular bipartite graph must have a perfect matching");
		//Only one of the parallel edges of each matched pair is taken.
		let mut pending : Vec<Option<usize>> = (0..side).map(|tail|hopcroft_karp.matched_head(tail)).collect();
		let mut matched = Vec::with_capacity(side);
		let mut rest = Vec::with_capacity(edges.len()-side);
		for edge in edges
		{
			let tail = self.graph.tails[edge];
			if pending[tail]==Some(self.graph.heads[edge])
			{
				pending[tail] = None;
				matched.push(edge);
			}
			else
			{
				rest.push(edge);
			}
		}
		(matched,rest)
	}
}

/**
Color the edges of the bipartite multigraph with `num_tails` tails, `num_heads` heads and edges `tails[i]->heads[i]`.
Returns the color of each edge, in `0..K` where K is the maximum degree.
**/
pub fn color_bipartite(num_tails:usize, num_heads:usize, tails:&[usize], heads:&[usize]) -> Vec<usize>
{
	let graph = build_regular_graph(num_tails,num_heads,tails,heads);
	let mut colorer = Colorer::new(&graph);
	colorer.color((0..graph.num_edges()).collect(),graph.degree);
	assert_eq!(colorer.classes.len(),graph.degree,"a K-regular graph is colored with K matchings");
	let mut colors = vec![usize::MAX;graph.real_edges];
	for (color,class) in colorer.classes.iter().enumerate()
	{
		for &edge in class.iter()
		{
			if graph.is_real(edge)
			{
				colors[edge] = color;
			}
		}
	}
	assert!(colors.iter().all(|&c|c!=usize::MAX),"some demand edge was left without color");
	colors
}

///Index the distinct hosts of an iterator in order of first appearance.
fn dense_ids<I:Iterator<Item=HostId>>(hosts:I) -> (Vec<usize>,usize)
{
	let mut index : BTreeMap<HostId,usize> = BTreeMap::new();
	let ids : Vec<usize> = hosts.map(|host|{
		let next = index.len();
		*index.entry(host).or_insert(next)
	}).collect();
	(ids,index.len())
}

///Color every commodity so that commodities sharing a source or a destination host get different colors.
///An empty set gives an empty assignment.
pub fn color_commodities(commodities:&CommoditySet) -> Assignment
{
	let (tails,num_tails) = dense_ids(commodities.iter().map(|c|c.source));
	let (heads,num_heads) = dense_ids(commodities.iter().map(|c|c.destination));
	let colors = color_bipartite(num_tails,num_heads,&tails,&heads);
	debug!("colored {} commodities with {} colors",commodities.len(),colors.iter().max().map(|c|c+1).unwrap_or(0));
	commodities.ids().zip(colors).collect()
}

///Largest number of commodities sharing a source host or sharing a destination host.
pub fn maximum_degree(commodities:&CommoditySet) -> usize
{
	let mut out_degree : BTreeMap<HostId,usize> = BTreeMap::new();
	let mut in_degree : BTreeMap<HostId,usize> = BTreeMap::new();
	for commodity in commodities
	{
		*out_degree.entry(commodity.source).or_insert(0) += 1;
		*in_degree.entry(commodity.destination).or_insert(0) += 1;
	}
	out_degree.values().chain(in_degree.values()).copied().max().unwrap_or(0)
}
