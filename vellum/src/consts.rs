//! Process-wide constants governing handle table sizing and cache defaults.

/// Slots `0..RESERVED_HANDLE_SLOTS` are never handed out, so a handle id can
/// never collide with the conventional stdin/stdout/stderr descriptor range.
pub(crate) const RESERVED_HANDLE_SLOTS: usize = 3;

/// Hard ceiling on the number of simultaneously open handles.
pub(crate) const MAX_HANDLES: usize = 4096;

/// Fallback page size used on platforms where the system page size can't be
/// queried, and the unconditional default before a handle's own page size is
/// known.
pub(crate) const FALLBACK_PAGE_SIZE: usize = 4096;

/// Minimum cache capacity accepted by the replacement engine; below this the
/// kin/am_cap/kout split degenerates.
pub(crate) const MIN_CACHE_CAPACITY: usize = 4;

/// Default cache capacity in pages, used when `CAPACITY_ENV_VAR` is absent or
/// unparseable.
pub(crate) const DEFAULT_CAPACITY_PAGES: usize = 256;

/// Environment variable consulted once at first-handle-open time.
pub(crate) const CAPACITY_ENV_VAR: &str = "VELLUM_CACHE_PAGES";

/// Values at or above this are rejected as nonsensical and the default is
/// used instead.
pub(crate) const CAPACITY_SANITY_CEILING: usize = 10_000_000;
