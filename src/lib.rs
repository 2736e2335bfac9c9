//! Astrological chart computation engine.
//!
//! Derives natal and related chart layers (transit, secondary progression,
//! solar arc, solar return, heliocentric), detects aspects with
//! class-sensitive orbs, searches harmonic resonances, and scans a
//! year-long horizon for transit windows. The planetary ephemeris itself
//! is an external oracle consumed through a trait; keeping the engine in a
//! library crate lets multiple front-ends (CLI, GUI, web) share it.

pub mod input;
pub mod report;

pub use astro_aspects as aspects;
pub use astro_chart as chart;
pub use astro_config as config;
pub use astro_core as geometry;
pub use astro_ephem as ephem;
pub use astro_export as export;
pub use astro_search as search;

/// Returns the version of the library for smoke tests.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
