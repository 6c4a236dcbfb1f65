//! Keyed caching primitives.
//!
//! - [`TtlCache`]: bounded map with per-entry time-to-live, oldest-first eviction
//! - [`cached`]: wraps an async function so results are served from a [`TtlCache`]
//! - [`SingleFlight`]: collapses concurrent calls with the same key into one operation

mod memoize;
mod single_flight;
mod ttl;

pub use memoize::{cached, Memoized};
pub use single_flight::SingleFlight;
pub use ttl::TtlCache;
