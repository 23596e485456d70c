/*!

Disjoint sets with union by size and path compression.

Used to contract nodes of the demand graph and to gather colliding jobs into groups.
Indices out of range are a programming error and panic.

*/

#[derive(Debug,Clone)]
pub struct UnionFind
{
	///Parent of each element; a root is its own parent.
	parent: Vec<usize>,
	size: Vec<usize>,
	///Number of disjoint sets.
	groups: usize,
}

impl UnionFind
{
	///`n` singleton sets `{0},{1},...,{n-1}`.
	pub fn new(n:usize) -> UnionFind
	{
		UnionFind{
			parent: (0..n).collect(),
			size: vec![1;n],
			groups: n,
		}
	}
	pub fn len(&self) -> usize
	{
		self.parent.len()
	}
	pub fn is_empty(&self) -> bool
	{
		self.parent.is_empty()
	}
	///The representative of the set containing `x`.
	///Compresses the path from `x`; iterative so deep chains do not overflow the stack.
	pub fn find(&mut self, x:usize) -> usize
	{
		let mut root = x;
		while self.parent[root]!=root
		{
			root = self.parent[root];
		}
		let mut current = x;
		while self.parent[current]!=root
		{
			let next = self.parent[current];
			self.parent[current] = root;
			current = next;
		}
		root
	}
	///Merge the sets of `x` and `y`. Returns the new root.
	pub fn union(&mut self, x:usize, y:usize) -> usize
	{
		let mut x = self.find(x);
		let mut y = self.find(y);
		if x==y
		{
			return x;
		}
		if self.size[x] < self.size[y]
		{
			std::mem::swap(&mut x,&mut y);
		}
		self.parent[y] = x;
		self.size[x] += self.size[y];
		self.groups -= 1;
		x
	}
	///Number of elements in the set of `x`.
	pub fn size(&mut self, x:usize) -> usize
	{
		let root = self.find(x);
		self.size[root]
	}
	pub fn group_count(&self) -> usize
	{
		self.groups
	}
	///All the sets, each sorted, ordered by their smallest element.
	pub fn all_group_members(&mut self) -> Vec<Vec<usize>>
	{
		let n = self.parent.len();
		let mut position = vec![usize::MAX;n];
		let mut groups : Vec<Vec<usize>> = Vec::with_capacity(self.groups);
		for i in 0..n
		{
			let root = self.find(i);
			if position[root]==usize::MAX
			{
				position[root] = groups.len();
				groups.push(vec![]);
			}
			groups[position[root]].push(i);
		}
		groups
	}
}
