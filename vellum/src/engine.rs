//! The 2Q replacement engine (§4.3): the resident set split into a
//! short-term admission queue (A1in) and a frequency queue (Am), backed by a
//! non-resident ghost queue (A1out) that records recent A1in evictions to
//! recognize re-references worth promoting straight to Am.
//!
//! Three explicit capacities (`kin`/`am_cap`/`kout`) drive admission,
//! promotion, and eviction; an intrusive-list-backed resident/ghost set
//! (§4.1) tracks queue membership, and ghost hits promote straight to Am on
//! re-reference, wired to real page I/O through the [`IoTarget`] seam.

use std::io;

use crate::{
	aligned_buf::AlignedBuffer,
	consts::MIN_CACHE_CAPACITY,
	hash_index::HashIndex,
	io_target::IoTarget,
	list::List,
	page::{GhostEntry, PageEntry, Queue},
	slab::Slab,
};

pub(crate) struct ReplacementEngine {
	capacity: usize,
	kin: usize,
	am_cap: usize,
	kout: usize,
	page_size: usize,

	resident: Slab<PageEntry>,
	resident_index: HashIndex,
	a1in: List,
	am: List,
	a1in_sz: usize,
	am_sz: usize,

	ghosts: Slab<GhostEntry>,
	ghost_index: HashIndex,
	a1out: List,
	a1out_sz: usize,
}

impl ReplacementEngine {
	pub fn new(capacity: usize, page_size: usize) -> Self {
		let capacity = capacity.max(MIN_CACHE_CAPACITY);
		let kin = (capacity / 4).clamp(1, capacity / 2);
		let am_cap = capacity - kin;
		let kout = (capacity / 2).max(1);

		Self {
			capacity,
			kin,
			am_cap,
			kout,
			page_size,
			resident: Slab::new(),
			resident_index: HashIndex::with_capacity_hint(capacity),
			a1in: List::new(),
			am: List::new(),
			a1in_sz: 0,
			am_sz: 0,
			ghosts: Slab::new(),
			ghost_index: HashIndex::with_capacity_hint(kout),
			a1out: List::new(),
			a1out_sz: 0,
		}
	}

	#[inline]
	pub fn page_size(&self) -> usize {
		self.page_size
	}

	#[inline]
	pub fn a1in_len(&self) -> usize {
		self.a1in_sz
	}

	#[inline]
	pub fn am_len(&self) -> usize {
		self.am_sz
	}

	#[inline]
	pub fn a1out_len(&self) -> usize {
		self.a1out_sz
	}

	pub fn entry(&self, idx: usize) -> &PageEntry {
		self.resident.get(idx)
	}

	pub fn entry_mut(&mut self, idx: usize) -> &mut PageEntry {
		self.resident.get_mut(idx)
	}

	/// Looks up `page_no`, handling hit / ghost-hit / cold-miss per §4.3, and
	/// returns the resident slot index. `known_size` is the handle's current
	/// logical file size, threaded through to any eviction-triggered flush
	/// so the post-flush truncate (§4.4) lands on the right length.
	pub fn fetch<Io: IoTarget>(
		&mut self,
		page_no: u64,
		io: &mut Io,
		known_size: u64,
	) -> io::Result<usize> {
		if let Some(idx) = self.resident_index.get(page_no) {
			self.handle_resident_hit(idx, io, known_size)?;
			return Ok(idx);
		}

		if let Some(ghost_idx) = self.ghost_index.remove(page_no) {
			self.a1out.remove(&mut self.ghosts, ghost_idx);
			self.a1out_sz -= 1;
			self.ghosts.remove(ghost_idx);

			log::trace!("page {page_no} ghost hit, promoting to Am");
			self.ensure_space_for_am(io, known_size)?;
			let idx = self.load_into(page_no, Queue::Am, io)?;
			self.am.push_front(&mut self.resident, idx);
			self.am_sz += 1;
			self.resident_index.insert(page_no, idx);
			return Ok(idx);
		}

		log::trace!("page {page_no} cold miss, admitting to A1in");
		self.ensure_space_for_a1in(io, known_size)?;
		let idx = self.load_into(page_no, Queue::A1in, io)?;
		self.a1in.push_front(&mut self.resident, idx);
		self.a1in_sz += 1;
		self.resident_index.insert(page_no, idx);
		Ok(idx)
	}

	fn handle_resident_hit<Io: IoTarget>(
		&mut self,
		idx: usize,
		io: &mut Io,
		known_size: u64,
	) -> io::Result<()> {
		match self.resident.get(idx).queue {
			Queue::A1in => {
				log::trace!("page {} A1in hit, promoting to Am", self.resident.get(idx).page_no);
				self.a1in.remove(&mut self.resident, idx);
				self.a1in_sz -= 1;
				self.ensure_space_for_am(io, known_size)?;
				self.resident.get_mut(idx).queue = Queue::Am;
				self.am.push_front(&mut self.resident, idx);
				self.am_sz += 1;
			}
			Queue::Am => {
				self.am.remove(&mut self.resident, idx);
				self.am.push_front(&mut self.resident, idx);
			}
		}
		Ok(())
	}

	fn load_into<Io: IoTarget>(
		&mut self,
		page_no: u64,
		queue: Queue,
		io: &Io,
	) -> io::Result<usize> {
		let (data, valid_len) = load_page(io, page_no, self.page_size)?;
		Ok(self.resident.insert(PageEntry::new(page_no, data, valid_len, queue)))
	}

	fn ensure_space_for_a1in<Io: IoTarget>(
		&mut self,
		io: &mut Io,
		known_size: u64,
	) -> io::Result<()> {
		if self.a1in_sz >= self.kin {
			self.evict_a1in_tail(io, known_size)?;
		} else {
			while self.a1in_sz + self.am_sz >= self.capacity {
				if self.am_sz > 0 {
					self.evict_am_tail(io, known_size)?;
				} else {
					self.evict_a1in_tail(io, known_size)?;
				}
			}
		}
		Ok(())
	}

	fn ensure_space_for_am<Io: IoTarget>(
		&mut self,
		io: &mut Io,
		known_size: u64,
	) -> io::Result<()> {
		while self.am_sz >= self.am_cap {
			self.evict_am_tail(io, known_size)?;
		}
		while self.a1in_sz + self.am_sz >= self.capacity {
			if self.a1in_sz > 0 {
				self.evict_a1in_tail(io, known_size)?;
			} else {
				self.evict_am_tail(io, known_size)?;
			}
		}
		Ok(())
	}

	/// Evicts the A1in tail. On success, records a ghost for the evicted page
	/// (trimming the ghost list if it now exceeds `kout`). On a flush
	/// failure, restores the entry to the A1in head and resident index and
	/// propagates the error (§4.3 "Eviction of an A1in tail entry").
	fn evict_a1in_tail<Io: IoTarget>(&mut self, io: &mut Io, known_size: u64) -> io::Result<()> {
		let idx = self
			.a1in
			.pop_back(&mut self.resident)
			.expect("ensure_space_for_a1in only evicts when A1in is non-empty");
		self.a1in_sz -= 1;
		let page_no = self.resident.get(idx).page_no;
		self.resident_index.remove(page_no);

		match flush_if_dirty(self.resident.get_mut(idx), io, known_size) {
			Ok(()) => {
				self.resident.remove(idx);
				self.add_ghost(page_no);
				Ok(())
			}
			Err(err) => {
				log::error!("flush failed evicting page {page_no} from A1in: {err}");
				self.resident_index.insert(page_no, idx);
				self.a1in.push_front(&mut self.resident, idx);
				self.a1in_sz += 1;
				Err(err)
			}
		}
	}

	/// Evicts the Am tail. Does not record a ghost (§4.3 "Eviction of an Am
	/// tail entry").
	fn evict_am_tail<Io: IoTarget>(&mut self, io: &mut Io, known_size: u64) -> io::Result<()> {
		let idx = self
			.am
			.pop_back(&mut self.resident)
			.expect("ensure_space_for_am only evicts when Am is non-empty");
		self.am_sz -= 1;
		let page_no = self.resident.get(idx).page_no;
		self.resident_index.remove(page_no);

		match flush_if_dirty(self.resident.get_mut(idx), io, known_size) {
			Ok(()) => {
				self.resident.remove(idx);
				Ok(())
			}
			Err(err) => {
				log::error!("flush failed evicting page {page_no} from Am: {err}");
				self.resident_index.insert(page_no, idx);
				self.am.push_front(&mut self.resident, idx);
				self.am_sz += 1;
				Err(err)
			}
		}
	}

	fn add_ghost(&mut self, page_no: u64) {
		let ghost_idx = self.ghosts.insert(GhostEntry::new(page_no));
		self.a1out.push_front(&mut self.ghosts, ghost_idx);
		self.ghost_index.insert(page_no, ghost_idx);
		self.a1out_sz += 1;

		if self.a1out_sz > self.kout {
			let tail = self
				.a1out
				.pop_back(&mut self.ghosts)
				.expect("a1out_sz > 0 implies a1out non-empty");
			let trimmed = self.ghosts.remove(tail);
			self.ghost_index.remove(trimmed.page_no);
			self.a1out_sz -= 1;
		}
	}

	/// Flushes every dirty resident page (both queues) and truncates to
	/// `known_size` after each successful flush, per §4.4 close/fsync.
	pub fn flush_all<Io: IoTarget>(&mut self, io: &mut Io, known_size: u64) -> io::Result<()> {
		let indices: Vec<usize> = self
			.a1in
			.iter(&self.resident)
			.chain(self.am.iter(&self.resident))
			.collect();
		for idx in indices {
			flush_if_dirty(self.resident.get_mut(idx), io, known_size)?;
		}
		Ok(())
	}
}

fn flush_if_dirty<Io: IoTarget>(
	entry: &mut PageEntry,
	io: &mut Io,
	known_size: u64,
) -> io::Result<()> {
	if !entry.dirty {
		return Ok(());
	}
	let offset = entry.page_no * entry.data.len() as u64;
	io.write_at(&entry.data, offset)?;
	io.set_len(known_size)?;
	entry.dirty = false;
	Ok(())
}

fn load_page<Io: IoTarget>(io: &Io, page_no: u64, page_size: usize) -> io::Result<(AlignedBuffer, usize)> {
	let mut data = AlignedBuffer::new(page_size, page_size)
		.ok_or_else(|| io::Error::new(io::ErrorKind::OutOfMemory, "failed to allocate page buffer"))?;
	let offset = page_no * page_size as u64;
	let valid_len = io.read_at(&mut data, offset)?;
	// `AlignedBuffer::new` zero-fills on allocation, so the tail beyond
	// `valid_len` is already zero; nothing further to do.
	Ok((data, valid_len))
}
