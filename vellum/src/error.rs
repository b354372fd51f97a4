use std::io;

use thiserror::Error;

/// Error kinds surfaced by the handle API.
///
/// Every variant corresponds to one of the error kinds in the handle API
/// contract: a bad handle id or access-mode mismatch, a malformed argument,
/// an exhausted handle table, a failed allocation, or a backing-file I/O
/// failure.
#[derive(Debug, Error)]
pub enum Error {
	#[error("bad handle")]
	BadHandle,

	#[error("invalid argument")]
	InvalidArgument,

	#[error("too many open files")]
	TooManyOpenFiles,

	#[error("out of memory")]
	OutOfMemory,

	#[error(transparent)]
	Io(io::Error),
}

impl From<io::Error> for Error {
	/// An allocation failure surfaces as `io::Error` with
	/// `ErrorKind::OutOfMemory` from the page-load path (`engine::load_page`);
	/// route that case to `Error::OutOfMemory` instead of collapsing it into
	/// the generic I/O variant, so callers can actually match on it per §7.
	fn from(err: io::Error) -> Self {
		if err.kind() == io::ErrorKind::OutOfMemory {
			Error::OutOfMemory
		} else {
			Error::Io(err)
		}
	}
}

pub type Result<T> = std::result::Result<T, Error>;
