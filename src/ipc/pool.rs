/*!

Registry of gateways, one per run identifier.

The caller owns the pool and passes it to whoever needs a gateway, so several runs can be served by the same process without any global state.

*/

use std::collections::BTreeMap;
use std::path::Path;

use log::debug;

use crate::config::GatewayConfig;
use crate::error::Error;
use super::gateway::SharedMemoryGateway;

///Identifier of a run, as agreed with the simulator.
pub type GatewayKey = u64;
pub const DEFAULT_GATEWAY_KEY: GatewayKey = 42;

#[derive(Debug,Default)]
pub struct GatewayPool
{
	gateways: BTreeMap<GatewayKey,SharedMemoryGateway>,
}

impl GatewayPool
{
	pub fn new() -> GatewayPool
	{
		GatewayPool::default()
	}
	///The gateway of `key`, created for `run_dir` on first use. Later calls return the existing one whatever the directory.
	pub fn get_or_create(&mut self, key:GatewayKey, run_dir:&Path, config:&GatewayConfig) -> &SharedMemoryGateway
	{
		self.gateways.entry(key).or_insert_with(||{
			debug!("creating gateway {} for {}",key,run_dir.display());
			SharedMemoryGateway::new(run_dir,config.clone())
		})
	}
	pub fn len(&self) -> usize
	{
		self.gateways.len()
	}
	pub fn is_empty(&self) -> bool
	{
		self.gateways.is_empty()
	}
	///Close the gateway of `key` and forget it. Returns whether there was one.
	pub fn close_and_remove(&mut self, key:GatewayKey) -> Result<bool,Error>
	{
		match self.gateways.remove(&key)
		{
			Some(gateway) =>
			{
				gateway.close()?;
				Ok(true)
			},
			None => Ok(false),
		}
	}
	///Close every gateway. All of them are removed even if some close fails; the first failure is returned.
	pub fn close_and_remove_all(&mut self) -> Result<(),Error>
	{
		let mut result = Ok(());
		for (_,gateway) in std::mem::take(&mut self.gateways)
		{
			if let Err(e) = gateway.close()
			{
				if result.is_ok()
				{
					result = Err(e);
				}
			}
		}
		result
	}
}

#[cfg(test)]
mod tests
{
	use super::*;
	#[test]
	fn lifecycle()
	{
		let first = tempfile::tempdir().expect("tempdir");
		let second = tempfile::tempdir().expect("tempdir");
		let config = GatewayConfig::default();
		let mut pool = GatewayPool::new();
		let path = pool.get_or_create(1,first.path(),&config).request_path();
		assert_eq!(pool.get_or_create(1,second.path(),&config).request_path(),path);
		pool.get_or_create(2,second.path(),&config);
		assert_eq!(pool.len(),2);
		std::fs::write(&path,"{}").unwrap();
		assert!(pool.close_and_remove(1).unwrap());
		assert!(!path.exists());
		assert!(!pool.close_and_remove(1).unwrap());
		pool.close_and_remove_all().unwrap();
		assert!(pool.is_empty());
	}
}
