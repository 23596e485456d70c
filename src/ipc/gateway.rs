/*!

The file rendezvous with the simulator.

The simulator writes a request file into the run directory and waits for the response file. The engine polls for the request, reads it, deletes it so the simulator knows it was consumed, and writes the response. There is no locking: a request read while still being written is cut JSON and is read again after a short delay, a bounded number of times.

Files are written through a temporary file and a rename, so the other side never sees a partial document from us.

*/

use std::fs;
use std::io::{self,Write};
use std::path::{Path,PathBuf};
use std::thread;
use std::time::Instant;

use log::{debug,warn};

use crate::config::GatewayConfig;
use crate::error;
use crate::error::Error;
use super::wire::{Request,Response};

#[derive(Debug,Clone)]
pub struct SharedMemoryGateway
{
	run_dir: PathBuf,
	config: GatewayConfig,
}

impl SharedMemoryGateway
{
	pub fn new(run_dir:&Path, config:GatewayConfig) -> SharedMemoryGateway
	{
		SharedMemoryGateway{ run_dir:run_dir.to_path_buf(), config }
	}
	pub fn request_path(&self) -> PathBuf
	{
		self.run_dir.join(&self.config.request_file)
	}
	pub fn response_path(&self) -> PathBuf
	{
		self.run_dir.join(&self.config.response_file)
	}
	/**
	Poll `path` until it exists and has some content, returning the content.
	An empty file is taken as a write in progress. Waits forever unless the configuration sets a timeout.
	**/
	fn wait_for(&self, path:&Path) -> Result<String,Error>
	{
		let start = Instant::now();
		loop
		{
			match fs::read_to_string(path)
			{
				Ok(text) if !text.trim().is_empty() => return Ok(text),
				Ok(_) => (),
				Err(e) if e.kind()==io::ErrorKind::NotFound => (),
				Err(e) => return Err(error!(could_not_open_file,path.to_path_buf(),e)),
			}
			if let Some(timeout) = self.config.wait_timeout
			{
				if start.elapsed() >= timeout
				{
					return Err(error!(timeout).with_message(format!("no document at {} after {:?}",path.display(),timeout)));
				}
			}
			thread::sleep(self.config.poll_interval);
		}
	}
	/**
	Wait for the request and decode it.
	A request that is not complete JSON is read again up to `max_retries` times; after that the last parse error is reported as `RetriesExhausted`.
	A complete document that does not decode is returned at once as `MalformedRequest`.
	**/
	pub fn read(&self) -> Result<Request,Error>
	{
		let path = self.request_path();
		let mut attempt = 0;
		loop
		{
			let text = self.wait_for(&path)?;
			match Request::from_json(&text)
			{
				Ok(request) =>
				{
					debug!("read request with {} commodities from {}",request.commodities.len(),path.display());
					return Ok(request);
				},
				Err(e) if e.is_transient() && attempt < self.config.max_retries =>
				{
					attempt += 1;
					warn!("could not parse {} (attempt {} of {}): {}",path.display(),attempt,self.config.max_retries+1,e);
					thread::sleep(self.config.retry_delay);
				},
				Err(e) if e.is_transient() =>
				{
					let message = format!("{}: {}",path.display(),e);
					return Err(error!(retries_exhausted,attempt+1).with_message(message));
				},
				Err(e) => return Err(e),
			}
		}
	}
	///Delete the request file, telling the simulator that it was consumed. Nothing to do if it is already gone.
	pub fn close(&self) -> Result<(),Error>
	{
		let path = self.request_path();
		match fs::remove_file(&path)
		{
			Ok(()) => Ok(()),
			Err(e) if e.kind()==io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(error!(io,e).with_message(format!("could not remove {}",path.display()))),
		}
	}
	pub fn write(&self, response:&Response) -> Result<(),Error>
	{
		write_atomically(&self.response_path(),&response.to_json().to_string())
	}
	///Report a failure to the simulator in place of an assignment.
	pub fn write_error(&self, error:&Error) -> Result<(),Error>
	{
		self.write(&Response::failure(error))
	}
	///Write a request, as the simulator does.
	pub fn write_request(&self, request:&Request) -> Result<(),Error>
	{
		write_atomically(&self.request_path(),&request.to_json().to_string())
	}
	///Wait for the response and take it, as the simulator does.
	pub fn take_response(&self) -> Result<Response,Error>
	{
		let path = self.response_path();
		let text = self.wait_for(&path)?;
		let response = Response::from_json(&text)?;
		fs::remove_file(&path).map_err(|e|error!(io,e))?;
		Ok(response)
	}
}

///Replace `path` with `contents` through a sibling temporary file.
pub fn write_atomically(path:&Path, contents:&str) -> Result<(),Error>
{
	let mut tmp_name = path.as_os_str().to_os_string();
	tmp_name.push(".tmp");
	let tmp = PathBuf::from(tmp_name);
	let mut file = fs::File::create(&tmp).map_err(|e|error!(could_not_create_file,tmp.clone(),e))?;
	file.write_all(contents.as_bytes()).map_err(|e|error!(io,e))?;
	file.sync_all().map_err(|e|error!(io,e))?;
	drop(file);
	fs::rename(&tmp,path).map_err(|e|error!(io,e).with_message(format!("could not move {} into place",tmp.display())))?;
	Ok(())
}

#[cfg(test)]
mod tests
{
	use super::*;
	use std::time::Duration;
	use crate::commodity::CommoditySet;
	use crate::error::ErrorKind;
	fn quick_config() -> GatewayConfig
	{
		GatewayConfig{
			poll_interval: Duration::from_millis(1),
			wait_timeout: Some(Duration::from_millis(50)),
			retry_delay: Duration::from_millis(1),
			..GatewayConfig::default()
		}
	}
	#[test]
	fn times_out_without_request()
	{
		let dir = tempfile::tempdir().expect("tempdir");
		let gateway = SharedMemoryGateway::new(dir.path(),quick_config());
		let error = gateway.read().err().expect("nothing to read");
		assert!(matches!(error.kind,ErrorKind::Timeout));
		//An empty file is not a request.
		fs::write(gateway.request_path(),"").unwrap();
		assert!(matches!(gateway.read().err().map(|e|e.kind),Some(ErrorKind::Timeout)));
	}
	#[test]
	fn request_round_trip_and_close()
	{
		let dir = tempfile::tempdir().expect("tempdir");
		let gateway = SharedMemoryGateway::new(dir.path(),quick_config());
		let request = Request::new(CommoditySet::from_pairs(vec![(0,(1,2))]));
		gateway.write_request(&request).unwrap();
		assert_eq!(gateway.read().unwrap(),request);
		gateway.close().unwrap();
		assert!(!gateway.request_path().exists());
		gateway.close().unwrap();
	}
	#[test]
	fn garbage_exhausts_retries()
	{
		let dir = tempfile::tempdir().expect("tempdir");
		let gateway = SharedMemoryGateway::new(dir.path(),quick_config());
		fs::write(gateway.request_path(),"{\"src_dst_pairs\":").unwrap();
		let error = gateway.read().err().expect("garbage");
		assert!(matches!(error.kind,ErrorKind::RetriesExhausted{attempts:6}),"{}",error);
	}
	#[test]
	fn bad_content_is_not_retried()
	{
		let dir = tempfile::tempdir().expect("tempdir");
		let config = GatewayConfig{ retry_delay:Duration::from_secs(30), ..quick_config() };
		let gateway = SharedMemoryGateway::new(dir.path(),config);
		fs::write(gateway.request_path(),r#"{"src_dst_pairs":{"a":[1,2]}}"#).unwrap();
		let start = Instant::now();
		let error = gateway.read().err().expect("bad commodity id");
		assert!(start.elapsed() < Duration::from_secs(30),"the request was retried");
		assert!(matches!(error.kind,ErrorKind::MalformedRequest),"{}",error);
		gateway.write_error(&error).unwrap();
		match gateway.take_response().unwrap()
		{
			Response::Failure{kind,message} =>
			{
				assert_eq!(kind,"malformed_request");
				assert!(message.contains("`a`"),"{}",message);
			},
			other => panic!("unexpected {:?}",other),
		}
	}
	#[test]
	fn response_is_written_whole()
	{
		let dir = tempfile::tempdir().expect("tempdir");
		let gateway = SharedMemoryGateway::new(dir.path(),quick_config());
		gateway.write_error(&error!(unbounded)).unwrap();
		let mut tmp = gateway.response_path().into_os_string();
		tmp.push(".tmp");
		assert!(!PathBuf::from(tmp).exists());
		match gateway.take_response().unwrap()
		{
			Response::Failure{kind,..} => assert_eq!(kind,"unbounded"),
			other => panic!("unexpected {:?}",other),
		}
		assert!(!gateway.response_path().exists());
	}
}
