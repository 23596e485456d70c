/*!

Maximum matching in bipartite graphs by Hopcroft–Karp.

Tails are `0..n` and heads `0..m`. Repeated edges are allowed and harmless.

*/

use std::collections::VecDeque;

const UNREACHED: usize = usize::MAX;

#[derive(Debug,Clone)]
pub struct HopcroftKarp
{
	adjacency: Vec<Vec<usize>>,
	///Head matched to each tail.
	match_tail: Vec<Option<usize>>,
	///Tail matched to each head.
	match_head: Vec<Option<usize>>,
	///BFS layer of each tail in the current phase.
	layer: Vec<usize>,
}

impl HopcroftKarp
{
	pub fn new(n:usize, m:usize) -> HopcroftKarp
	{
		HopcroftKarp{
			adjacency: vec![vec![];n],
			match_tail: vec![None;n],
			match_head: vec![None;m],
			layer: vec![UNREACHED;n],
		}
	}
	pub fn add_edge(&mut self, tail:usize, head:usize)
	{
		assert!(head < self.match_head.len(),"head {} out of range",head);
		self.adjacency[tail].push(head);
	}
	///The head currently matched with `tail`.
	pub fn matched_head(&self, tail:usize) -> Option<usize>
	{
		self.match_tail[tail]
	}
	///Layer the tails from the free ones. Returns whether some free head is reachable.
	fn build_layers(&mut self) -> bool
	{
		let mut queue = VecDeque::new();
		for tail in 0..self.adjacency.len()
		{
			if self.match_tail[tail].is_none()
			{
				self.layer[tail] = 0;
				queue.push_back(tail);
			}
			else
			{
				self.layer[tail] = UNREACHED;
			}
		}
		let mut found_free = false;
		while let Some(tail) = queue.pop_front()
		{
			for &head in self.adjacency[tail].iter()
			{
				match self.match_head[head]
				{
					None => found_free = true,
					Some(next) =>
					{
						if self.layer[next]==UNREACHED
						{
							self.layer[next] = self.layer[tail]+1;
							queue.push_back(next);
						}
					}
				}
			}
		}
		found_free
	}
	///Look for an augmenting path from `tail` following the layers.
	fn augment(&mut self, tail:usize) -> bool
	{
		for index in 0..self.adjacency[tail].len()
		{
			let head = self.adjacency[tail][index];
			let augmented = match self.match_head[head]
			{
				None => true,
				Some(next) => self.layer[next]==self.layer[tail]+1 && self.augment(next),
			};
			if augmented
			{
				self.match_tail[tail] = Some(head);
				self.match_head[head] = Some(tail);
				return true;
			}
		}
		//Dead end for the rest of the phase.
		self.layer[tail] = UNREACHED;
		false
	}
	///Compute a maximum matching, returned as `(tail,head)` pairs sorted by tail.
	pub fn max_matching(&mut self) -> Vec<(usize,usize)>
	{
		while self.build_layers()
		{
			let mut augmented = 0;
			for tail in 0..self.adjacency.len()
			{
				if self.match_tail[tail].is_none() && self.augment(tail)
				{
					augmented += 1;
				}
			}
			if augmented==0
			{
				break;
			}
		}
		self.match_tail.iter().enumerate().filter_map(|(tail,head)|head.map(|head|(tail,head))).collect()
	}
}
