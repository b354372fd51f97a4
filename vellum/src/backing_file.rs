//! Opens the backing file with a direct-I/O hint, falling back to buffered
//! I/O plus per-I/O cache-drop advisories on `EINVAL` (§4.4, §9).

use std::{
	fs::{File, OpenOptions},
	io,
	path::Path,
};

use crate::{consts::FALLBACK_PAGE_SIZE, handle::OpenFlags, io_target::IoTarget};

pub(crate) struct BackingFile {
	file: File,
	page_size: usize,
	/// Set when `O_DIRECT` was unavailable; every I/O issues a best-effort
	/// cache-drop advisory to approximate bypassing the OS page cache.
	drop_hints: bool,
}

impl BackingFile {
	pub fn open(path: &Path, flags: &OpenFlags) -> io::Result<Self> {
		let mut opts = OpenOptions::new();
		opts.read(true).write(true);
		if flags.create {
			opts.create(true);
		}

		let (file, drop_hints) = Self::open_direct_or_fallback(&opts, path)?;
		let page_size = system_page_size();

		Ok(Self {
			file,
			page_size,
			drop_hints,
		})
	}

	#[cfg(target_os = "linux")]
	fn open_direct_or_fallback(opts: &OpenOptions, path: &Path) -> io::Result<(File, bool)> {
		use std::os::unix::fs::OpenOptionsExt;

		let mut direct = opts.clone();
		direct.custom_flags(libc::O_DIRECT);
		match direct.open(path) {
			Ok(file) => Ok((file, false)),
			Err(err) if err.raw_os_error() == Some(libc::EINVAL) => {
				log::warn!(
					"O_DIRECT unsupported for {}; falling back to buffered I/O with cache-drop hints",
					path.display()
				);
				Ok((opts.open(path)?, true))
			}
			Err(err) => Err(err),
		}
	}

	#[cfg(not(target_os = "linux"))]
	fn open_direct_or_fallback(opts: &OpenOptions, path: &Path) -> io::Result<(File, bool)> {
		Ok((opts.open(path)?, true))
	}

	#[inline]
	pub fn page_size(&self) -> usize {
		self.page_size
	}

	pub fn len(&self) -> io::Result<u64> {
		Ok(self.file.metadata()?.len())
	}

	#[cfg(unix)]
	fn drop_cache_hint(&self, offset: u64, len: u64) {
		if !self.drop_hints {
			return;
		}
		use std::os::unix::io::AsRawFd;
		// Best-effort: failures here are explicitly not surfaced (§7).
		unsafe {
			libc::posix_fadvise(
				self.file.as_raw_fd(),
				offset as libc::off_t,
				len as libc::off_t,
				libc::POSIX_FADV_DONTNEED,
			);
		}
	}

	#[cfg(not(unix))]
	fn drop_cache_hint(&self, _offset: u64, _len: u64) {}
}

impl IoTarget for BackingFile {
	fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
		let n = self.file.read_at(buf, offset)?;
		self.drop_cache_hint(offset, buf.len() as u64);
		Ok(n)
	}

	fn write_at(&mut self, buf: &[u8], offset: u64) -> io::Result<usize> {
		let n = self.file.write_at(buf, offset)?;
		self.drop_cache_hint(offset, buf.len() as u64);
		Ok(n)
	}

	fn set_len(&mut self, len: u64) -> io::Result<()> {
		self.file.set_len(len)
	}

	fn sync(&self) -> io::Result<()> {
		IoTarget::sync(&self.file)
	}
}

#[cfg(unix)]
fn system_page_size() -> usize {
	// Safety: sysconf with _SC_PAGESIZE never fails in practice; a negative
	// result just means "unknown", handled below.
	let n = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
	if n > 0 {
		n as usize
	} else {
		FALLBACK_PAGE_SIZE
	}
}

#[cfg(not(unix))]
fn system_page_size() -> usize {
	FALLBACK_PAGE_SIZE
}
