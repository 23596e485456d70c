/*!

Turn a bipartite demand multigraph into a K-regular one.

Nodes of each side are contracted while their summed degree stays within K, the largest degree of the graph. The surviving nodes are renumbered `0..P` on both sides and the missing degree is filled with synthetic edges.

*/

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use log::debug;

use crate::union_find::UnionFind;

///A K-regular bipartite multigraph with `side` nodes on each side.
///Edge `i` goes from tail `tails[i]` to head `heads[i]`. The first `real_edges` edges are the original ones, in their original order; the rest are padding.
#[derive(Debug,Clone,PartialEq,Eq)]
pub struct RegularGraph
{
	pub degree: usize,
	pub side: usize,
	pub tails: Vec<usize>,
	pub heads: Vec<usize>,
	pub real_edges: usize,
}

impl RegularGraph
{
	pub fn num_edges(&self) -> usize
	{
		self.tails.len()
	}
	pub fn is_real(&self, edge:usize) -> bool
	{
		edge < self.real_edges
	}
	///Degree of every tail and every head restricted to the given edges.
	pub fn degrees_of(&self, edges:&[usize]) -> (Vec<usize>,Vec<usize>)
	{
		let mut tail_degree = vec![0;self.side];
		let mut head_degree = vec![0;self.side];
		for &edge in edges
		{
			tail_degree[self.tails[edge]] += 1;
			head_degree[self.heads[edge]] += 1;
		}
		(tail_degree,head_degree)
	}
	///Whether every node has degree exactly `degree`.
	pub fn is_regular(&self) -> bool
	{
		let all : Vec<usize> = (0..self.num_edges()).collect();
		let (tail_degree,head_degree) = self.degrees_of(&all);
		tail_degree.iter().chain(head_degree.iter()).all(|&d|d==self.degree)
	}
}

///Merge nodes by pairs of smallest degree while the merged degree is at most `bound`.
fn contract(degrees:&[usize], bound:usize) -> UnionFind
{
	let mut heap : BinaryHeap<Reverse<(usize,usize)>> = degrees.iter().enumerate().map(|(index,&degree)|Reverse((degree,index))).collect();
	let mut union_find = UnionFind::new(degrees.len());
	while let (Some(Reverse((first_degree,first))),Some(Reverse((second_degree,second)))) = (heap.pop(),heap.pop())
	{
		//Any other pair would be at least as heavy.
		if first_degree+second_degree > bound
		{
			break;
		}
		let root = union_find.union(first,second);
		heap.push(Reverse((first_degree+second_degree,root)));
	}
	union_find
}

///Dense ids for the roots of `union_find`, in increasing order of root. Returns the ids and how many there are.
fn relabel(union_find:&mut UnionFind) -> (Vec<usize>,usize)
{
	let n = union_find.len();
	let mut ids = vec![usize::MAX;n];
	let mut count = 0;
	for i in 0..n
	{
		if union_find.find(i)==i
		{
			ids[i] = count;
			count += 1;
		}
	}
	(ids,count)
}

/**
Build the regular graph for a bipartite multigraph with `num_tails` tails and `num_heads` heads.
Edge `i` goes from `tails[i]` to `heads[i]`.

A graph without edges gives degree 0 and no nodes.
**/
pub fn build_regular_graph(num_tails:usize, num_heads:usize, tails:&[usize], heads:&[usize]) -> RegularGraph
{
	assert_eq!(tails.len(),heads.len(),"every edge needs both endpoints");
	let mut tail_degree = vec![0;num_tails];
	let mut head_degree = vec![0;num_heads];
	for (&tail,&head) in tails.iter().zip(heads.iter())
	{
		tail_degree[tail] += 1;
		head_degree[head] += 1;
	}
	let degree = tail_degree.iter().chain(head_degree.iter()).copied().max().unwrap_or(0);

	let mut tail_classes = contract(&tail_degree,degree);
	let (tail_ids,tail_count) = relabel(&mut tail_classes);
	let mut head_classes = contract(&head_degree,degree);
	let (head_ids,head_count) = relabel(&mut head_classes);
	let side = tail_count.max(head_count);

	let total_edges = side*degree;
	let mut new_tails = Vec::with_capacity(total_edges);
	let mut new_heads = Vec::with_capacity(total_edges);
	let mut new_tail_degree = vec![0;side];
	let mut new_head_degree = vec![0;side];
	for (&tail,&head) in tails.iter().zip(heads.iter())
	{
		let u = tail_ids[tail_classes.find(tail)];
		let v = head_ids[head_classes.find(head)];
		new_tails.push(u);
		new_heads.push(v);
		new_tail_degree[u] += 1;
		new_head_degree[v] += 1;
	}
	//Round-robin fill. Both sides miss the same total degree.
	let mut head = 0;
	for tail in 0..side
	{
		while new_tail_degree[tail] < degree
		{
			while new_head_degree[head]==degree
			{
				head += 1;
			}
			new_tails.push(tail);
			new_heads.push(head);
			new_tail_degree[tail] += 1;
			new_head_degree[head] += 1;
		}
	}
	debug!("regularized {} edges into a {}-regular graph with {} nodes per side and {} padding edges",tails.len(),degree,side,new_tails.len()-tails.len());
	RegularGraph{
		degree,
		side,
		tails: new_tails,
		heads: new_heads,
		real_edges: tails.len(),
	}
}
