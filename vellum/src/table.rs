//! Process-wide table of open handles, identified by small integers (§4.4,
//! §5, §6). Slots `0..RESERVED_HANDLE_SLOTS` are never handed out so a
//! handle id can't be confused with a standard stream descriptor.
//!
//! Guarded by one `parking_lot::Mutex` behind a `OnceLock`; the lock only
//! serializes slot allocation and is never held across backing-file I/O
//! (§5).

use std::{
	path::Path,
	sync::OnceLock,
};

use parking_lot::Mutex;
use static_assertions::assert_impl_all;

use crate::{
	config::cache_capacity_pages,
	consts::{MAX_HANDLES, RESERVED_HANDLE_SLOTS},
	error::{Error, Result},
	handle::{Handle, OpenFlags, Whence},
};

struct HandleTable {
	slots: Vec<Option<Handle>>,
}

assert_impl_all!(HandleTable: Send);

impl HandleTable {
	fn new() -> Self {
		Self {
			slots: Vec::new(),
		}
	}

	fn insert(&mut self, handle: Handle) -> Result<usize> {
		let start = self.slots.len().max(RESERVED_HANDLE_SLOTS);
		for idx in RESERVED_HANDLE_SLOTS..self.slots.len() {
			if self.slots[idx].is_none() {
				self.slots[idx] = Some(handle);
				return Ok(idx);
			}
		}

		if start >= MAX_HANDLES {
			return Err(Error::TooManyOpenFiles);
		}

		self.slots.resize_with(start + 1, || None);
		self.slots[start] = Some(handle);
		Ok(start)
	}

	fn get_mut(&mut self, id: usize) -> Result<&mut Handle> {
		if id < RESERVED_HANDLE_SLOTS {
			return Err(Error::BadHandle);
		}
		self.slots
			.get_mut(id)
			.and_then(Option::as_mut)
			.ok_or(Error::BadHandle)
	}

	fn take(&mut self, id: usize) -> Result<Handle> {
		if id < RESERVED_HANDLE_SLOTS {
			return Err(Error::BadHandle);
		}
		self.slots
			.get_mut(id)
			.and_then(Option::take)
			.ok_or(Error::BadHandle)
	}
}

fn table() -> &'static Mutex<HandleTable> {
	static TABLE: OnceLock<Mutex<HandleTable>> = OnceLock::new();
	TABLE.get_or_init(|| Mutex::new(HandleTable::new()))
}

/// Opens `path` with the given flags and returns a handle id ≥
/// `RESERVED_HANDLE_SLOTS` (§6).
pub fn open(path: &Path, flags: OpenFlags) -> Result<usize> {
	let handle = Handle::open(path, flags, cache_capacity_pages())?;
	table().lock().insert(handle)
}

/// Reads into `buf` from the handle's current position (§4.4).
pub fn read(id: usize, buf: &mut [u8]) -> Result<usize> {
	table().lock().get_mut(id)?.read(buf)
}

/// Writes `buf` at the handle's current position (§4.4).
pub fn write(id: usize, buf: &[u8]) -> Result<usize> {
	table().lock().get_mut(id)?.write(buf)
}

/// Repositions the handle and returns the new absolute position (§4.4).
pub fn seek(id: usize, offset: i64, whence: Whence) -> Result<u64> {
	table().lock().get_mut(id)?.seek(offset, whence)
}

/// Flushes dirty pages and syncs the backing file (§4.4).
pub fn fsync(id: usize) -> Result<()> {
	table().lock().get_mut(id)?.fsync()
}

/// Flushes, syncs, truncates, and releases the handle's slot. Always frees
/// the slot even if the underlying flush/sync/truncate failed (§4.4, §7).
pub fn close(id: usize) -> Result<()> {
	let handle = table().lock().take(id)?;
	handle.close()
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write as _;

	fn scratch_file() -> tempfile::NamedTempFile {
		tempfile::NamedTempFile::new().unwrap()
	}

	#[test]
	fn open_close_roundtrips_a_handle_id() {
		let file = scratch_file();
		let id = open(file.path(), OpenFlags::read_write()).unwrap();
		assert!(id >= RESERVED_HANDLE_SLOTS);
		close(id).unwrap();
	}

	#[test]
	fn operations_on_a_closed_handle_fail_bad_handle() {
		let file = scratch_file();
		let id = open(file.path(), OpenFlags::read_write()).unwrap();
		close(id).unwrap();

		let mut buf = [0u8; 4];
		assert!(matches!(read(id, &mut buf), Err(Error::BadHandle)));
	}

	#[test]
	fn reserved_slots_are_always_bad_handles() {
		for id in 0..RESERVED_HANDLE_SLOTS {
			let mut buf = [0u8; 1];
			assert!(matches!(read(id, &mut buf), Err(Error::BadHandle)));
		}
	}

	#[test]
	fn write_then_read_back_round_trips() {
		let mut file = scratch_file();
		file.write_all(&[0xABu8; 4096 * 10]).unwrap();
		file.flush().unwrap();

		let id = open(file.path(), OpenFlags::read_write()).unwrap();
		let mut buf = [0u8; 4096];
		let n = read(id, &mut buf).unwrap();
		assert_eq!(n, 4096);
		assert!(buf.iter().all(|&b| b == 0xAB));
		close(id).unwrap();
	}
}
