//! A single open handle: backing file, position/size bookkeeping, access
//! flags, and its own [`ReplacementEngine`] (§3 "Handle", §4.4).

use std::path::Path;

use crate::{
	backing_file::BackingFile,
	engine::ReplacementEngine,
	error::{Error, Result},
	io_target::IoTarget,
};

/// Mode flags passed to [`crate::table::open`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenFlags {
	pub read: bool,
	pub write: bool,
	pub append: bool,
	pub create: bool,
}

impl OpenFlags {
	pub fn read_only() -> Self {
		Self {
			read: true,
			..Default::default()
		}
	}

	pub fn write_only() -> Self {
		Self {
			write: true,
			..Default::default()
		}
	}

	pub fn read_write() -> Self {
		Self {
			read: true,
			write: true,
			..Default::default()
		}
	}
}

/// Whence values for [`crate::table::seek`] (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
	Set,
	Current,
	End,
}

pub(crate) struct Handle {
	backing: BackingFile,
	flags: OpenFlags,
	pos: u64,
	size: u64,
	engine: ReplacementEngine,
}

impl Handle {
	pub fn open(path: &Path, flags: OpenFlags, cache_capacity_pages: usize) -> Result<Self> {
		let backing = BackingFile::open(path, &flags)?;
		let size = backing.len()?;
		let page_size = backing.page_size();

		Ok(Self {
			backing,
			flags,
			pos: 0,
			size,
			engine: ReplacementEngine::new(cache_capacity_pages, page_size),
		})
	}

	fn page_size(&self) -> u64 {
		self.engine.page_size() as u64
	}

	/// Reads up to `buf.len()` bytes starting at the handle's current
	/// position, per §4.4 "Read of N bytes". Returns the number of bytes
	/// actually read (0 = immediate EOF). A failure before any byte is
	/// copied returns the error; a failure after a partial transfer returns
	/// the bytes transferred so far; the caller will see the error on a
	/// later call once the position retries the same page.
	pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
		if !self.flags.read {
			return Err(Error::BadHandle);
		}

		let page_size = self.page_size();
		let mut total = 0usize;

		while total < buf.len() {
			let page_no = self.pos / page_size;
			let in_page = (self.pos % page_size) as usize;
			let want = (buf.len() - total).min(page_size as usize - in_page);

			let idx = match self.engine.fetch(page_no, &mut self.backing, self.size) {
				Ok(idx) => idx,
				Err(err) if total > 0 => {
					log::error!("read stopped after {total} bytes: {err}");
					return Ok(total);
				}
				Err(err) => return Err(err.into()),
			};

			let entry = self.engine.entry(idx);
			if in_page >= entry.valid_len {
				break;
			}

			let take = want.min(entry.valid_len - in_page);
			buf[total..total + take].copy_from_slice(&entry.data[in_page..in_page + take]);
			self.pos += take as u64;
			total += take;

			if take < want {
				break;
			}
		}

		Ok(total)
	}

	/// Writes `buf` starting at the handle's current position, per §4.4
	/// "Write of N bytes". Returns the number of bytes written.
	pub fn write(&mut self, buf: &[u8]) -> Result<usize> {
		if !self.flags.write {
			return Err(Error::BadHandle);
		}

		if self.flags.append {
			self.pos = self.size;
		}

		let page_size = self.page_size();
		let mut total = 0usize;

		while total < buf.len() {
			let page_no = self.pos / page_size;
			let in_page = (self.pos % page_size) as usize;
			let chunk = (buf.len() - total).min(page_size as usize - in_page);

			let idx = match self.engine.fetch(page_no, &mut self.backing, self.size) {
				Ok(idx) => idx,
				Err(err) if total > 0 => {
					log::error!("write stopped after {total} bytes: {err}");
					return Ok(total);
				}
				Err(err) => return Err(err.into()),
			};

			let entry = self.engine.entry_mut(idx);
			if in_page > entry.valid_len {
				entry.data[entry.valid_len..in_page].fill(0);
			}
			entry.data[in_page..in_page + chunk].copy_from_slice(&buf[total..total + chunk]);
			entry.valid_len = entry.valid_len.max(in_page + chunk);
			entry.dirty = true;

			self.pos += chunk as u64;
			total += chunk;

			if self.pos > self.size {
				self.size = self.pos;
				self.backing.set_len(self.size)?;
			}
		}

		Ok(total)
	}

	pub fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
		let base: i64 = match whence {
			Whence::Set => 0,
			Whence::Current => self.pos as i64,
			Whence::End => self.size as i64,
		};

		let new_pos = base
			.checked_add(offset)
			.ok_or(Error::InvalidArgument)?;
		if new_pos < 0 {
			return Err(Error::InvalidArgument);
		}

		self.pos = new_pos as u64;
		Ok(self.pos)
	}

	pub fn fsync(&mut self) -> Result<()> {
		self.engine.flush_all(&mut self.backing, self.size)?;
		IoTarget::sync(&self.backing)?;
		self.backing.set_len(self.size)?;
		Ok(())
	}

	/// Flushes, syncs, and truncates, returning the first error encountered
	/// (§4.4, §7 "Close returns the first of {flush error, close error}").
	/// All three steps are attempted regardless of earlier failures.
	pub fn close(mut self) -> Result<()> {
		let flush_result = self.engine.flush_all(&mut self.backing, self.size);
		let sync_result = IoTarget::sync(&self.backing);
		let truncate_result = self.backing.set_len(self.size);

		[flush_result, sync_result, truncate_result]
			.into_iter()
			.find(Result::is_err)
			.unwrap_or(Ok(()))
			.map_err(Error::from)
	}
}
