///A simple row-major matrix. Used for the per-link tables of the fabric, with a row per ToR and a column per core.
#[derive(Debug,Clone,PartialEq,Eq)]
pub struct Matrix<T>
{
	data: Vec<T>,
	//num_rows: usize,
	num_columns: usize,
}

impl<T> Matrix<T>
{
	///Read/write a matrix entry.
	pub fn get_mut(&mut self,row:usize,column:usize) -> &mut T
	{
		&mut self.data[row*self.num_columns+column]
	}
	///Build a matrix with constant values.
	pub fn constant(value:T,num_rows:usize,num_columns:usize) -> Matrix<T> where T:Clone
	{
		Matrix{
			data: vec![value;num_rows*num_columns],
			//num_rows,
			num_columns,
		}
	}
	///Iterate over `(row,column,entry)`.
	pub fn entries(&self) -> impl Iterator<Item=(usize,usize,&T)>
	{
		let num_columns = self.num_columns;
		self.data.iter().enumerate().map(move |(index,value)|(index/num_columns,index%num_columns,value))
	}
	///Set every entry to `value`.
	pub fn fill(&mut self, value:T) where T:Clone
	{
		for entry in self.data.iter_mut()
		{
			*entry = value.clone();
		}
	}
}

impl<T:Ord+Copy> Matrix<T>
{
	///Greatest entry, `None` for an empty matrix.
	pub fn max(&self) -> Option<T>
	{
		self.data.iter().copied().max()
	}
}
