//! The page-I/O seam the replacement engine reads and writes through.
//!
//! The same trait is implemented both by a real file (via
//! `pread`/`pwrite`-style positioned I/O) and by
//! [`crate::aligned_buf::AlignedBuffer`], so engine unit tests can run
//! against an in-memory target without touching disk.

use std::{fs::File, io, ops::Range};

#[cfg(unix)]
use std::os::unix::fs::FileExt;

#[cfg(windows)]
use std::os::windows::fs::FileExt;

use crate::aligned_buf::AlignedBuffer;

pub(crate) trait IoTarget {
	fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize>;

	fn write_at(&mut self, buf: &[u8], offset: u64) -> io::Result<usize>;

	fn set_len(&mut self, len: u64) -> io::Result<()>;

	fn sync(&self) -> io::Result<()>;
}

impl IoTarget for File {
	#[cfg(unix)]
	fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
		FileExt::read_at(self, buf, offset)
	}

	#[cfg(windows)]
	fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
		FileExt::seek_read(self, buf, offset)
	}

	#[cfg(unix)]
	fn write_at(&mut self, buf: &[u8], offset: u64) -> io::Result<usize> {
		FileExt::write_at(self, buf, offset)
	}

	#[cfg(windows)]
	fn write_at(&mut self, buf: &[u8], offset: u64) -> io::Result<usize> {
		FileExt::seek_write(self, buf, offset)
	}

	fn set_len(&mut self, len: u64) -> io::Result<()> {
		File::set_len(self, len)
	}

	fn sync(&self) -> io::Result<()> {
		File::sync_all(self)
	}
}

fn get_buf_range(len: usize, buf_len: usize, offset: u64) -> Range<usize> {
	if offset >= len as u64 {
		return 0..0;
	}
	let start = offset as usize;
	start..usize::min(start + buf_len, len)
}

impl IoTarget for AlignedBuffer {
	fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
		let range = get_buf_range(self.len(), buf.len(), offset);
		let num_read = range.len();
		buf[0..num_read].copy_from_slice(&self[range]);
		Ok(num_read)
	}

	fn write_at(&mut self, buf: &[u8], offset: u64) -> io::Result<usize> {
		let range = get_buf_range(self.len(), buf.len(), offset);
		let num_written = range.len();
		self[range.clone()].copy_from_slice(&buf[0..num_written]);
		Ok(num_written)
	}

	fn set_len(&mut self, _len: u64) -> io::Result<()> {
		// The in-memory test target is allocated at a fixed size up front;
		// truncation is a no-op since tests only use it to exercise the
		// replacement engine, not size bookkeeping.
		Ok(())
	}

	fn sync(&self) -> io::Result<()> {
		Ok(())
	}
}
