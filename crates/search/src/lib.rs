//! Time-domain searches over the ephemeris oracle: the solar-return
//! root-finder and the year-horizon transit window scanner.

pub mod solar_return;
pub mod transits;

pub use solar_return::{SolarReturnError, find_solar_return};
pub use transits::{
    CancelToken, DaySample, DaySampler, ScanError, ScanProgress, ScanRequest, TimeWindow,
    TransitInterval, scan_transits,
};
