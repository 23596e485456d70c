/*!

Errors produced by the engine.

Every error records the [SourceLocation] where it was raised, an [ErrorKind] and an optional message.
Build them with the [error!](crate::error) macro, which fills in the location.

```ignore
return Err(error!(malformed_request).with_message(format!("bad commodity {}",text)));
```

*/

use std::fmt::{self,Display,Formatter};
use std::path::PathBuf;

///Position in the source code where an error has been generated.
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub struct SourceLocation
{
	pub file: &'static str,
	pub line: u32,
	pub column: u32,
}

impl Display for SourceLocation
{
	fn fmt(&self, formatter: &mut Formatter) -> fmt::Result
	{
		write!(formatter,"{}:{}:{}",self.file,self.line,self.column)
	}
}

///The different classes of errors.
#[derive(Debug)]
pub enum ErrorKind
{
	///The request payload could not be decoded.
	MalformedRequest,
	///The request is not complete JSON yet, as when the peer is still writing it.
	IncompleteRequest,
	///A host that does not hang from any ToR of the fabric.
	UnknownHost(usize),
	///The integer program has no feasible assignment.
	Infeasible,
	///The integer program is unbounded.
	Unbounded,
	///The solver stopped without an optimal solution for other reasons.
	SolverFailure,
	///An operation was called in a state where it is not allowed.
	InvalidState,
	///Waited longer than the configured bound for the peer.
	Timeout,
	///The peer file kept failing to parse after all the retries.
	RetriesExhausted{ attempts: usize },
	CouldNotOpenFile{ path: PathBuf, error: std::io::Error },
	CouldNotCreateFile{ path: PathBuf, error: std::io::Error },
	Io(std::io::Error),
	///A checkpoint from another format version or another fabric.
	BadCheckpoint,
	BadArgument,
	///When no better description is available.
	Undetermined,
}

impl ErrorKind
{
	///Short identifier used in the error responses sent to the peer.
	pub fn label(&self) -> &'static str
	{
		match self
		{
			ErrorKind::MalformedRequest => "malformed_request",
			ErrorKind::IncompleteRequest => "incomplete_request",
			ErrorKind::UnknownHost(_) => "unknown_host",
			ErrorKind::Infeasible => "infeasible",
			ErrorKind::Unbounded => "unbounded",
			ErrorKind::SolverFailure => "solver_failure",
			ErrorKind::InvalidState => "invalid_state",
			ErrorKind::Timeout => "timeout",
			ErrorKind::RetriesExhausted{..} => "retries_exhausted",
			ErrorKind::CouldNotOpenFile{..} => "could_not_open_file",
			ErrorKind::CouldNotCreateFile{..} => "could_not_create_file",
			ErrorKind::Io(_) => "io",
			ErrorKind::BadCheckpoint => "bad_checkpoint",
			ErrorKind::BadArgument => "bad_argument",
			ErrorKind::Undetermined => "undetermined",
		}
	}
}

impl Display for ErrorKind
{
	fn fmt(&self, formatter: &mut Formatter) -> fmt::Result
	{
		match self
		{
			ErrorKind::UnknownHost(host) => write!(formatter,"unknown host {}",host),
			ErrorKind::RetriesExhausted{attempts} => write!(formatter,"retries exhausted after {} attempts",attempts),
			ErrorKind::CouldNotOpenFile{path,error} => write!(formatter,"could not open {}: {}",path.display(),error),
			ErrorKind::CouldNotCreateFile{path,error} => write!(formatter,"could not create {}: {}",path.display(),error),
			ErrorKind::Io(error) => write!(formatter,"io error: {}",error),
			kind => write!(formatter,"{}",kind.label()),
		}
	}
}

#[derive(Debug)]
pub struct Error
{
	pub source_location: SourceLocation,
	pub kind: ErrorKind,
	pub message: Option<String>,
}

impl Error
{
	pub fn new(source_location:SourceLocation, kind:ErrorKind) -> Error
	{
		Error{ source_location, kind, message:None }
	}
	///Attach a human readable message. Replaces any previous one.
	pub fn with_message(mut self, message:String) -> Error
	{
		self.message = Some(message);
		self
	}
	pub fn malformed_request(source_location:SourceLocation) -> Error
	{
		Error::new(source_location,ErrorKind::MalformedRequest)
	}
	pub fn incomplete_request(source_location:SourceLocation) -> Error
	{
		Error::new(source_location,ErrorKind::IncompleteRequest)
	}
	pub fn unknown_host(source_location:SourceLocation, host:usize) -> Error
	{
		Error::new(source_location,ErrorKind::UnknownHost(host))
	}
	pub fn infeasible(source_location:SourceLocation) -> Error
	{
		Error::new(source_location,ErrorKind::Infeasible)
	}
	pub fn unbounded(source_location:SourceLocation) -> Error
	{
		Error::new(source_location,ErrorKind::Unbounded)
	}
	pub fn solver_failure(source_location:SourceLocation) -> Error
	{
		Error::new(source_location,ErrorKind::SolverFailure)
	}
	pub fn invalid_state(source_location:SourceLocation) -> Error
	{
		Error::new(source_location,ErrorKind::InvalidState)
	}
	pub fn timeout(source_location:SourceLocation) -> Error
	{
		Error::new(source_location,ErrorKind::Timeout)
	}
	pub fn retries_exhausted(source_location:SourceLocation, attempts:usize) -> Error
	{
		Error::new(source_location,ErrorKind::RetriesExhausted{attempts})
	}
	pub fn could_not_open_file(source_location:SourceLocation, path:PathBuf, error:std::io::Error) -> Error
	{
		Error::new(source_location,ErrorKind::CouldNotOpenFile{path,error})
	}
	pub fn could_not_create_file(source_location:SourceLocation, path:PathBuf, error:std::io::Error) -> Error
	{
		Error::new(source_location,ErrorKind::CouldNotCreateFile{path,error})
	}
	pub fn io(source_location:SourceLocation, error:std::io::Error) -> Error
	{
		Error::new(source_location,ErrorKind::Io(error))
	}
	pub fn bad_checkpoint(source_location:SourceLocation) -> Error
	{
		Error::new(source_location,ErrorKind::BadCheckpoint)
	}
	pub fn bad_argument(source_location:SourceLocation) -> Error
	{
		Error::new(source_location,ErrorKind::BadArgument)
	}
	pub fn undetermined(source_location:SourceLocation) -> Error
	{
		Error::new(source_location,ErrorKind::Undetermined)
	}
	///Whether retrying the same read may succeed.
	///Only a file that is not yet complete JSON qualifies; a complete document with bad content never gets better.
	pub fn is_transient(&self) -> bool
	{
		matches!(self.kind,ErrorKind::IncompleteRequest)
	}
}

impl Display for Error
{
	fn fmt(&self, formatter: &mut Formatter) -> fmt::Result
	{
		write!(formatter,"{} ({})",self.kind,self.source_location)?;
		if let Some(message) = &self.message
		{
			write!(formatter,": {}",message)?;
		}
		Ok(())
	}
}

impl std::error::Error for Error
{
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)>
	{
		match &self.kind
		{
			ErrorKind::CouldNotOpenFile{error,..} | ErrorKind::CouldNotCreateFile{error,..} | ErrorKind::Io(error) => Some(error),
			_ => None,
		}
	}
}

///Build a [SourceLocation] for the current position.
#[macro_export]
macro_rules! source_location{
	() => {
		$crate::error::SourceLocation{ file:file!(), line:line!(), column:column!() }
	};
}

///`error!(kind,args...)` calls `Error::kind(source_location!(),args...)`.
#[macro_export]
macro_rules! error{
	($kind:ident) => {
		$crate::error::Error::$kind( $crate::source_location!() )
	};
	($kind:ident, $($args:expr),* ) => {
		$crate::error::Error::$kind( $crate::source_location!(), $($args),* )
	};
}
