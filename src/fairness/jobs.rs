/*!

Training jobs recorded by the traffic generator, for the offline analysis of collisions.

A run directory holds one `job_<id>[-suffix]` directory per job, each with a `data_parallelism.txt` file. That file is space separated with a header line, for example

```text
#src dst src_tor dst_tor start_time flow_size
12 14 0 1 1000 262144
```

Extra columns are ignored. Rows whose ends share a ToR never reach the core layer and are not virtual links.

*/

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use log::debug;

use crate::commodity::HostId;
use crate::error;
use crate::error::Error;
use crate::topology::{NodeId,Link};

pub const DATA_PARALLELISM_FILE_NAME: &str = "data_parallelism.txt";

///A host-level demand of a job that crosses the core layer.
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub struct VirtualLink
{
	pub source: HostId,
	pub destination: HostId,
	pub source_tor: NodeId,
	pub destination_tor: NodeId,
}

#[derive(Debug,Clone,PartialEq)]
pub struct Job
{
	pub id: usize,
	pub virtual_links: Vec<VirtualLink>,
	///ToRs the job sends from.
	pub tors: BTreeSet<NodeId>,
	pub start_time: u64,
	pub flow_size: f64,
	///Expected end when the flows run at full bandwidth.
	pub end_time: u64,
}

impl Job
{
	///The half-open activity interval `[start,end)`.
	pub fn interval(&self) -> (u64,u64)
	{
		(self.start_time,self.end_time)
	}
}

///Column positions of the fields we use.
struct Columns
{
	source: usize,
	destination: usize,
	source_tor: usize,
	destination_tor: usize,
	start_time: usize,
	flow_size: usize,
}

impl Columns
{
	fn from_header(header:&str) -> Result<Columns,Error>
	{
		let names : Vec<&str> = header.trim_start_matches('#').split_whitespace().collect();
		let find = |name:&str| names.iter().position(|n|*n==name).ok_or_else(||error!(malformed_request).with_message(format!("column {} missing from header `{}`",name,header)));
		Ok(Columns{
			source: find("src")?,
			destination: find("dst")?,
			source_tor: find("src_tor")?,
			destination_tor: find("dst_tor")?,
			start_time: find("start_time")?,
			flow_size: find("flow_size")?,
		})
	}
}

fn field<T:std::str::FromStr>(fields:&[&str], index:usize, line_number:usize) -> Result<T,Error>
{
	let text = fields.get(index).ok_or_else(||error!(malformed_request).with_message(format!("line {} has only {} fields",line_number,fields.len())))?;
	text.parse::<T>().map_err(|_|error!(malformed_request).with_message(format!("line {}: cannot parse `{}`",line_number,text)))
}

/**
Build a job from the contents of its `data_parallelism.txt`.
`bandwidth` is in bits per time unit, so a flow of `s` bytes is expected to last `round(8*s/bandwidth)`.
**/
pub fn parse_data_parallelism(id:usize, text:&str, bandwidth:f64) -> Result<Job,Error>
{
	if !(bandwidth>0.0)
	{
		return Err(error!(bad_argument).with_message(format!("bandwidth must be positive, got {}",bandwidth)));
	}
	let mut lines = text.lines().enumerate().filter(|(_,line)|!line.trim().is_empty());
	let (_,header) = lines.next().ok_or_else(||error!(malformed_request).with_message(format!("job {} has an empty data parallelism file",id)))?;
	let columns = Columns::from_header(header)?;
	let mut virtual_links = vec![];
	let mut tors = BTreeSet::new();
	let mut start_time = u64::MAX;
	let mut flow_size = f64::INFINITY;
	for (index,line) in lines
	{
		let fields : Vec<&str> = line.split_whitespace().collect();
		let line_number = index+1;
		let source_tor : NodeId = field(&fields,columns.source_tor,line_number)?;
		let destination_tor : NodeId = field(&fields,columns.destination_tor,line_number)?;
		tors.insert(source_tor);
		start_time = start_time.min(field(&fields,columns.start_time,line_number)?);
		flow_size = flow_size.min(field(&fields,columns.flow_size,line_number)?);
		if source_tor!=destination_tor
		{
			virtual_links.push(VirtualLink{
				source: field(&fields,columns.source,line_number)?,
				destination: field(&fields,columns.destination,line_number)?,
				source_tor,
				destination_tor,
			});
		}
	}
	if tors.is_empty()
	{
		return Err(error!(malformed_request).with_message(format!("job {} has no flows",id)));
	}
	let duration = (8.0*flow_size/bandwidth).round() as u64;
	Ok(Job{ id, virtual_links, tors, start_time, flow_size, end_time: start_time+duration })
}

///The job id of a directory named `job_<id>` or `job_<id>-<anything>`.
pub fn job_id_of_directory(name:&str) -> Option<usize>
{
	let rest = name.strip_prefix("job_")?;
	rest.split('-').next()?.parse().ok()
}

///Every job found under `dir`, sorted by start time and then id.
pub fn load_jobs(dir:&Path, bandwidth:f64) -> Result<Vec<Job>,Error>
{
	let entries = fs::read_dir(dir).map_err(|e|error!(could_not_open_file,dir.to_path_buf(),e))?;
	let mut jobs = vec![];
	for entry in entries
	{
		let entry = entry.map_err(|e|error!(io,e))?;
		let name = entry.file_name();
		let id = match name.to_str().and_then(job_id_of_directory)
		{
			Some(id) => id,
			None => continue,
		};
		let path = entry.path().join(DATA_PARALLELISM_FILE_NAME);
		let text = fs::read_to_string(&path).map_err(|e|error!(could_not_open_file,path.clone(),e))?;
		jobs.push(parse_data_parallelism(id,&text,bandwidth).map_err(|e|{
			let message = format!("{}: {}",path.display(),e.message.as_deref().unwrap_or(""));
			e.with_message(message)
		})?);
	}
	jobs.sort_by_key(|job|(job.start_time,job.id));
	debug!("loaded {} jobs from {}",jobs.len(),dir.display());
	Ok(jobs)
}

///Read a failure file with one `from to` link per line. Blank lines and lines starting with `#` are skipped.
pub fn fetch_failed_links(path:&Path) -> Result<BTreeSet<Link>,Error>
{
	let text = fs::read_to_string(path).map_err(|e|error!(could_not_open_file,path.to_path_buf(),e))?;
	let mut links = BTreeSet::new();
	for (index,line) in text.lines().enumerate()
	{
		let line = line.trim();
		if line.is_empty() || line.starts_with('#')
		{
			continue;
		}
		let fields : Vec<&str> = line.split_whitespace().collect();
		if fields.len()!=2
		{
			return Err(error!(malformed_request).with_message(format!("{} line {}: expected `from to`",path.display(),index+1)));
		}
		links.insert((field(&fields,0,index+1)?,field(&fields,1,index+1)?));
	}
	Ok(links)
}

#[cfg(test)]
mod tests
{
	use super::*;
	const SAMPLE: &str = "#src dst src_tor dst_tor start_time flow_size extra\n\
		12 14 0 1 1000 250 x\n\
		14 16 1 2 1200 300 x\n\
		13 12 0 0 900 100 x\n";
	#[test]
	fn parse_sample()
	{
		let job = parse_data_parallelism(3,SAMPLE,10.0).expect("valid job");
		assert_eq!(job.virtual_links.len(),2);
		assert_eq!(job.virtual_links[1],VirtualLink{source:14,destination:16,source_tor:1,destination_tor:2});
		assert_eq!(job.tors.iter().copied().collect::<Vec<_>>(),vec![0,1]);
		assert_eq!(job.start_time,900);
		//8*100/10
		assert_eq!(job.interval(),(900,980));
	}
	#[test]
	fn bad_inputs()
	{
		assert!(parse_data_parallelism(0,"",10.0).is_err());
		assert!(parse_data_parallelism(0,"#src dst\n1 2\n",10.0).is_err());
		assert!(parse_data_parallelism(0,SAMPLE,0.0).is_err());
		assert!(parse_data_parallelism(0,"#src dst src_tor dst_tor start_time flow_size\n1 2 0 one 5 5\n",1.0).is_err());
	}
	#[test]
	fn directories_and_failures()
	{
		assert_eq!(job_id_of_directory("job_17-data"),Some(17));
		assert_eq!(job_id_of_directory("job_4"),Some(4));
		assert_eq!(job_id_of_directory("jobs"),None);
		let dir = tempfile::tempdir().expect("tempdir");
		for (name,start) in [("job_2-a",50),("job_1",10)]
		{
			let job_dir = dir.path().join(name);
			std::fs::create_dir(&job_dir).unwrap();
			std::fs::write(job_dir.join(DATA_PARALLELISM_FILE_NAME),format!("#src dst src_tor dst_tor start_time flow_size\n12 14 0 1 {} 10\n",start)).unwrap();
		}
		std::fs::write(dir.path().join("failures.txt"),"# failed\n0 4\n\n4 0\n").unwrap();
		let jobs = load_jobs(dir.path(),1.0).unwrap();
		assert_eq!(jobs.iter().map(|j|j.id).collect::<Vec<_>>(),vec![1,2]);
		let failed = fetch_failed_links(&dir.path().join("failures.txt")).unwrap();
		assert_eq!(failed.into_iter().collect::<Vec<_>>(),vec![(0,4),(4,0)]);
	}
}
