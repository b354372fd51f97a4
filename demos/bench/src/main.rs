//! Throughput driver for the vellum handle API. Pre-creates a file sized to
//! the requested working set, drives a uniform-random page-access pattern
//! over the public handle API, and reports pages/sec derived purely from
//! wall-clock deltas. Not part of the core: this binary has no access to the
//! replacement engine's internal counters, only what `open`/`read`/`write`
//! expose.

use std::{fs::OpenOptions, path::PathBuf, time::Instant};

use anyhow::{Context, Result};
use clap::Parser;
use rand::Rng;

const PAGE_SIZE: u64 = 4096;

#[derive(Parser, Debug)]
#[command(about = "Random-access throughput benchmark for the vellum cache")]
struct Args {
	/// Backing file to read/write. Created (and pre-sized) if missing.
	#[arg(long)]
	path: PathBuf,

	/// Size of the working set in pages; the backing file is pre-sized to
	/// this many pages if it doesn't already hold at least that many.
	#[arg(long, default_value_t = 4096)]
	working_set_pages: u64,

	/// Number of page accesses to perform.
	#[arg(long, default_value_t = 100_000)]
	ops: u64,

	/// Cache capacity in pages; overrides VELLUM_CACHE_PAGES for this run.
	#[arg(long)]
	cache_pages: Option<usize>,

	/// Fraction of accesses that are writes, in [0.0, 1.0].
	#[arg(long, default_value_t = 0.1)]
	write_fraction: f64,
}

fn main() -> Result<()> {
	env_logger::init();
	let args = Args::parse();

	if let Some(cap) = args.cache_pages {
		// SAFETY: single-threaded at this point, before any vellum handle is
		// opened; cache_capacity_pages() reads this exactly once, lazily.
		unsafe {
			std::env::set_var("VELLUM_CACHE_PAGES", cap.to_string());
		}
	}

	ensure_sized(&args.path, args.working_set_pages)
		.with_context(|| format!("pre-sizing {}", args.path.display()))?;

	let id = vellum::open(&args.path, vellum::OpenFlags::read_write())
		.context("opening backing file")?;

	let mut rng = rand::thread_rng();
	let mut page_buf = vec![0u8; PAGE_SIZE as usize];

	let start = Instant::now();
	let mut reads = 0u64;
	let mut writes = 0u64;

	for _ in 0..args.ops {
		let page = rng.gen_range(0..args.working_set_pages);
		vellum::seek(id, (page * PAGE_SIZE) as i64, vellum::Whence::Set)?;

		if rng.gen_bool(args.write_fraction) {
			rng.fill(&mut page_buf[..]);
			vellum::write(id, &page_buf)?;
			writes += 1;
		} else {
			vellum::read(id, &mut page_buf)?;
			reads += 1;
		}
	}

	let elapsed = start.elapsed();
	vellum::close(id).context("closing backing file")?;

	let secs = elapsed.as_secs_f64();
	println!("ops={} reads={} writes={} elapsed={:.3}s pages/sec={:.1}", args.ops, reads, writes, secs, args.ops as f64 / secs);

	Ok(())
}

fn ensure_sized(path: &PathBuf, working_set_pages: u64) -> Result<()> {
	let file = OpenOptions::new()
		.read(true)
		.write(true)
		.create(true)
		.open(path)?;
	let target_len = working_set_pages * PAGE_SIZE;
	if file.metadata()?.len() < target_len {
		file.set_len(target_len)?;
	}
	Ok(())
}
