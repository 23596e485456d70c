/*!

Persistence of the controller between invocations of the same run.

Only what is independent of a control interval is saved: the fabric and the candidate-path cache. The file is JSON, tagged with a format version so that a checkpoint written by an incompatible build is refused instead of misread.

*/

use std::collections::BTreeMap;
use std::fs::{self,File};
use std::io::{BufReader,BufWriter,Write};
use std::path::{Path,PathBuf};

use chrono::{DateTime,Utc};
use log::debug;
use serde::{Serialize,Deserialize};

use crate::error;
use crate::error::Error;
use crate::topology::{TwoTierFabric,NodeId};
use super::controller::{Controller,CandidatePath};

pub const CHECKPOINT_FORMAT_VERSION: u32 = 1;
pub const CHECKPOINT_FILE_NAME: &str = "controller.json";

#[derive(Debug,Clone,PartialEq,Eq,Serialize,Deserialize)]
pub struct PathCacheEntry
{
	pub source_tor: NodeId,
	pub destination_tor: NodeId,
	pub paths: Vec<CandidatePath>,
}

#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
pub struct Checkpoint
{
	pub format_version: u32,
	pub n_tors: usize,
	pub saved_at: DateTime<Utc>,
	pub paths: Vec<PathCacheEntry>,
}

impl Checkpoint
{
	pub fn of(controller:&Controller) -> Checkpoint
	{
		Checkpoint{
			format_version: CHECKPOINT_FORMAT_VERSION,
			n_tors: controller.fabric().num_tors(),
			saved_at: Utc::now(),
			paths: controller.path_cache().iter().map(|(&(source_tor,destination_tor),paths)|PathCacheEntry{source_tor,destination_tor,paths:paths.clone()}).collect(),
		}
	}
	///Rebuild a controller for a fabric of `n_tors` ToRs.
	pub fn restore(self, n_tors:usize) -> Result<Controller,Error>
	{
		if self.format_version!=CHECKPOINT_FORMAT_VERSION
		{
			return Err(error!(bad_checkpoint).with_message(format!("checkpoint has format version {} but {} is expected",self.format_version,CHECKPOINT_FORMAT_VERSION)));
		}
		if self.n_tors!=n_tors
		{
			return Err(error!(bad_checkpoint).with_message(format!("checkpoint is for {} ToRs but the request has {}",self.n_tors,n_tors)));
		}
		let fabric = TwoTierFabric::new(n_tors)?;
		let paths : BTreeMap<(NodeId,NodeId),Vec<CandidatePath>> = self.paths.into_iter().map(|entry|((entry.source_tor,entry.destination_tor),entry.paths)).collect();
		Ok(Controller::with_path_cache(fabric,paths))
	}
}

pub fn checkpoint_path(run_dir:&Path) -> PathBuf
{
	run_dir.join(CHECKPOINT_FILE_NAME)
}

///Write the controller's checkpoint into `run_dir`, replacing any previous one.
pub fn save(controller:&Controller, run_dir:&Path) -> Result<(),Error>
{
	let path = checkpoint_path(run_dir);
	let tmp = path.with_extension("json.tmp");
	let file = File::create(&tmp).map_err(|e|error!(could_not_create_file,tmp.clone(),e))?;
	let mut writer = BufWriter::new(file);
	serde_json::to_writer(&mut writer,&Checkpoint::of(controller)).map_err(|e|error!(undetermined).with_message(format!("could not serialize checkpoint: {}",e)))?;
	writer.flush().map_err(|e|error!(io,e))?;
	fs::rename(&tmp,&path).map_err(|e|error!(io,e))?;
	debug!("saved controller checkpoint to {}",path.display());
	Ok(())
}

///Load the checkpoint of `run_dir`, `Ok(None)` if there is none.
pub fn load(run_dir:&Path, n_tors:usize) -> Result<Option<Controller>,Error>
{
	let path = checkpoint_path(run_dir);
	if !path.exists()
	{
		return Ok(None);
	}
	let file = File::open(&path).map_err(|e|error!(could_not_open_file,path.clone(),e))?;
	let checkpoint : Checkpoint = serde_json::from_reader(BufReader::new(file)).map_err(|e|error!(bad_checkpoint).with_message(format!("could not parse {}: {}",path.display(),e)))?;
	debug!("loaded controller checkpoint saved at {}",checkpoint.saved_at);
	checkpoint.restore(n_tors).map(Some)
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::commodity::CommoditySet;
	use crate::error::ErrorKind;
	use crate::fairness::controller::FailureState;
	#[test]
	fn round_trip_keeps_cache()
	{
		let dir = tempfile::tempdir().expect("tempdir");
		let mut controller = Controller::new(TwoTierFabric::new(4).unwrap());
		let commodities = CommoditySet::from_pairs(vec![(0,(6,8)),(1,(10,12))]);
		controller.route(&commodities,FailureState::default()).unwrap();
		save(&controller,dir.path()).unwrap();
		let restored = load(dir.path(),4).unwrap().expect("checkpoint present");
		assert_eq!(restored.path_cache(),controller.path_cache());
		assert!(load(dir.path(),8).is_err());
	}
	#[test]
	fn missing_and_foreign_checkpoints()
	{
		let dir = tempfile::tempdir().expect("tempdir");
		assert!(load(dir.path(),4).unwrap().is_none());
		let mut checkpoint = Checkpoint::of(&Controller::new(TwoTierFabric::new(4).unwrap()));
		checkpoint.format_version = 0;
		let error = checkpoint.restore(4).err().expect("old version");
		assert!(matches!(error.kind,ErrorKind::BadCheckpoint));
		std::fs::write(checkpoint_path(dir.path()),"not json").unwrap();
		assert!(matches!(load(dir.path(),4).err().map(|e|e.kind),Some(ErrorKind::BadCheckpoint)));
	}
}
