//! Static lookup tables used by the derived-formula and UDF-decompression
//! code: range decimation parameters, temperature calibration curves, and
//! the BAQ/FDBAQ block-reconstruction tables.

pub mod range_decimation;
pub mod reconstruction;
pub mod temperature;

pub use range_decimation::{d_value, filter_output_offset, range_decimation_info};
pub use reconstruction::{fdbaq_lut, baq_lut};
pub use temperature::{lookup_efe_temperature, lookup_ta_temperature, lookup_tgu_temperature};
