//! Open-addressed hash table mapping a 64-bit page number to a slab slot.
//!
//! Fixed capacity, sized at construction to roughly 4x the expected maximum
//! element count and rounded up to a power of two (§4.2) — no rehashing is
//! implemented, by design (see the open question in `DESIGN.md`).

#[derive(Clone, Copy)]
enum Slot {
	Empty,
	Tombstone,
	Occupied(u64, usize),
}

pub(crate) struct HashIndex {
	slots: Vec<Slot>,
	mask: usize,
	len: usize,
}

impl HashIndex {
	/// `max_elems` is the largest number of live entries this index is ever
	/// expected to hold; the backing table is sized to roughly `4 *
	/// max_elems`, rounded up to a power of two.
	pub fn with_capacity_hint(max_elems: usize) -> Self {
		let min_slots = (max_elems.max(1) * 4).max(8);
		let cap = min_slots.next_power_of_two();
		Self {
			slots: vec![Slot::Empty; cap],
			mask: cap - 1,
			len: 0,
		}
	}

	#[inline]
	pub fn len(&self) -> usize {
		self.len
	}

	/// splitmix64-style finalizer: two odd multiplies with xor-shifts in
	/// between, chosen to avoid clustering on the sequential/near-sequential
	/// page numbers a scan produces.
	fn mix(key: u64) -> u64 {
		let mut x = key;
		x ^= x >> 30;
		x = x.wrapping_mul(0xbf58_476d_1ce4_e5b9);
		x ^= x >> 27;
		x = x.wrapping_mul(0x94d0_49bb_1331_11eb);
		x ^= x >> 31;
		x
	}

	#[inline]
	fn start(&self, key: u64) -> usize {
		(Self::mix(key) as usize) & self.mask
	}

	pub fn get(&self, key: u64) -> Option<usize> {
		let mut i = self.start(key);
		loop {
			match self.slots[i] {
				Slot::Empty => return None,
				Slot::Occupied(k, v) if k == key => return Some(v),
				_ => {}
			}
			i = (i + 1) & self.mask;
		}
	}

	pub fn contains(&self, key: u64) -> bool {
		self.get(key).is_some()
	}

	/// Inserts or overwrites the value for `key`. Reuses the first tombstone
	/// encountered while probing, per §4.2.
	pub fn insert(&mut self, key: u64, value: usize) {
		let mut i = self.start(key);
		let mut first_tombstone = None;
		loop {
			match self.slots[i] {
				Slot::Empty => {
					let target = first_tombstone.unwrap_or(i);
					self.slots[target] = Slot::Occupied(key, value);
					self.len += 1;
					return;
				}
				Slot::Tombstone => {
					if first_tombstone.is_none() {
						first_tombstone = Some(i);
					}
				}
				Slot::Occupied(k, _) if k == key => {
					self.slots[i] = Slot::Occupied(key, value);
					return;
				}
				Slot::Occupied(..) => {}
			}
			i = (i + 1) & self.mask;
		}
	}

	pub fn remove(&mut self, key: u64) -> Option<usize> {
		let mut i = self.start(key);
		loop {
			match self.slots[i] {
				Slot::Empty => return None,
				Slot::Occupied(k, v) if k == key => {
					self.slots[i] = Slot::Tombstone;
					self.len -= 1;
					return Some(v);
				}
				_ => {}
			}
			i = (i + 1) & self.mask;
		}
	}
}
