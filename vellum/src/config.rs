use std::sync::OnceLock;

use crate::consts::{CAPACITY_ENV_VAR, CAPACITY_SANITY_CEILING, DEFAULT_CAPACITY_PAGES};

static CACHE_CAPACITY: OnceLock<usize> = OnceLock::new();

/// Per-handle cache capacity in pages, read once from `VELLUM_CACHE_PAGES` at
/// first-handle-open time and fixed for the remainder of the process.
pub(crate) fn cache_capacity_pages() -> usize {
	*CACHE_CAPACITY.get_or_init(|| {
		let configured = std::env::var(CAPACITY_ENV_VAR)
			.ok()
			.and_then(|val| val.parse::<usize>().ok())
			.filter(|&n| n > 0 && n < CAPACITY_SANITY_CEILING);

		match configured {
			Some(n) => n,
			None => DEFAULT_CAPACITY_PAGES,
		}
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_positive_integer() {
		// The OnceLock is process-global, so this only verifies the parsing
		// logic in isolation rather than the cached path.
		let configured = "512"
			.parse::<usize>()
			.ok()
			.filter(|&n| n > 0 && n < CAPACITY_SANITY_CEILING);
		assert_eq!(configured, Some(512));
	}

	#[test]
	fn rejects_values_at_or_above_ceiling() {
		let configured = CAPACITY_SANITY_CEILING
			.to_string()
			.parse::<usize>()
			.ok()
			.filter(|&n| n > 0 && n < CAPACITY_SANITY_CEILING);
		assert_eq!(configured, None);
	}

	#[test]
	fn rejects_zero() {
		let configured = "0"
			.parse::<usize>()
			.ok()
			.filter(|&n| n > 0 && n < CAPACITY_SANITY_CEILING);
		assert_eq!(configured, None);
	}
}
