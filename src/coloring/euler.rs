/*!

Split an even-degree bipartite multigraph in two halves through Eulerian circuits.

Each connected component is walked once by Hierholzer's algorithm with an explicit stack. Alternating the edges along every closed walk puts half of the edges of each node in each half, so a K-regular graph with even K gives two K/2-regular graphs.

*/

use super::regular::RegularGraph;

/**
The Eulerian circuits of the subgraph of `graph` formed by `edges`, one per connected component with edges.
Each circuit is a sequence of edge indices (of `graph`) where consecutive edges share a node, as do the last and the first.
Every node must have even degree in the subgraph.
**/
pub fn eulerian_circuits(graph:&RegularGraph, edges:&[usize]) -> Vec<Vec<usize>>
{
	let side = graph.side;
	//Tails are `0..side` and heads are `side..2*side`.
	let mut adjacency : Vec<Vec<(usize,usize)>> = vec![vec![];2*side];
	for (local,&edge) in edges.iter().enumerate()
	{
		let tail = graph.tails[edge];
		let head = graph.heads[edge]+side;
		adjacency[tail].push((head,local));
		adjacency[head].push((tail,local));
	}
	let mut used = vec![false;edges.len()];
	let mut circuits = vec![];
	let mut stack : Vec<(usize,Option<usize>)> = vec![];
	for start in 0..2*side
	{
		if adjacency[start].is_empty()
		{
			continue;
		}
		let mut circuit = vec![];
		stack.push((start,None));
		while let Some(&(node,arrived_by)) = stack.last()
		{
			let mut next = None;
			while let Some((neighbour,local)) = adjacency[node].pop()
			{
				if !used[local]
				{
					used[local] = true;
					next = Some((neighbour,local));
					break;
				}
			}
			match next
			{
				Some((neighbour,local)) => stack.push((neighbour,Some(local))),
				None =>
				{
					stack.pop();
					if let Some(local) = arrived_by
					{
						circuit.push(edges[local]);
					}
				},
			}
		}
		if !circuit.is_empty()
		{
			circuit.reverse();
			circuits.push(circuit);
		}
	}
	circuits
}

///Split `edges` in two by alternating positions along the Eulerian circuits.
///Every edge goes to exactly one half. For a K-regular subgraph with even K both halves are K/2-regular.
pub fn euler_split(graph:&RegularGraph, edges:&[usize]) -> (Vec<usize>,Vec<usize>)
{
	let mut even = Vec::with_capacity(edges.len()/2);
	let mut odd = Vec::with_capacity(edges.len()/2);
	for circuit in eulerian_circuits(graph,edges)
	{
		debug_assert!(circuit.len()%2==0,"closed walks in bipartite graphs have even length");
		for (position,edge) in circuit.into_iter().enumerate()
		{
			if position%2==0
			{
				even.push(edge);
			}
			else
			{
				odd.push(edge);
			}
		}
	}
	(even,odd)
}

#[cfg(test)]
mod tests
{
	use super::*;
	use super::super::regular::build_regular_graph;
	#[test]
	fn circuit_is_closed_walk()
	{
		//A 2-regular graph made of two 4-cycles.
		let tails = [0,0,1,1,2,2,3,3];
		let heads = [0,1,0,1,2,3,2,3];
		let graph = build_regular_graph(4,4,&tails,&heads);
		assert_eq!(graph.degree,2);
		let all : Vec<usize> = (0..graph.num_edges()).collect();
		let circuits = eulerian_circuits(&graph,&all);
		let total : usize = circuits.iter().map(|c|c.len()).sum();
		assert_eq!(total,graph.num_edges());
		for circuit in circuits.iter()
		{
			for (position,&edge) in circuit.iter().enumerate()
			{
				let next = circuit[(position+1)%circuit.len()];
				let shares_tail = graph.tails[edge]==graph.tails[next];
				let shares_head = graph.heads[edge]==graph.heads[next];
				assert!(shares_tail || shares_head,"edges {} and {} are not consecutive",edge,next);
			}
		}
	}
	#[test]
	fn split_halves_degree()
	{
		//4-regular on 2 nodes per side.
		let tails = [0,0,0,0,1,1,1,1];
		let heads = [0,0,1,1,0,0,1,1];
		let graph = build_regular_graph(2,2,&tails,&heads);
		assert_eq!(graph.degree,4);
		let all : Vec<usize> = (0..graph.num_edges()).collect();
		let (first,second) = euler_split(&graph,&all);
		for half in [&first,&second]
		{
			let (tail_degree,head_degree) = graph.degrees_of(half);
			assert!(tail_degree.iter().chain(head_degree.iter()).all(|&d|d==2));
		}
		let mut joined : Vec<usize> = first.iter().chain(second.iter()).copied().collect();
		joined.sort();
		assert_eq!(joined,all);
	}
}
