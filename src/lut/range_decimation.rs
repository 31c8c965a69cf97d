//! Range decimation parameters and the `D(rd, C)` lookup used by
//! `RadarConfigurationSupport::swl_n3rx_samples` (S1-IF-ASD-PL-0007 §3.2.5.4,
//! table 5.1-1, table 5.1-2).

use crate::error::Error;

pub const REF_FREQ_MHZ: f64 = 37.53472224;

#[derive(Debug, Clone, Copy)]
pub struct RangeDecimationInfo {
    pub decimation_filter_band_hz: f64,
    /// Decimation ratio expressed as `(numerator, denominator)`.
    pub decimation_ratio: (u32, u32),
    pub filter_length: u32,
}

impl RangeDecimationInfo {
    pub fn sampling_frequency_hz(&self) -> f64 {
        let (num, den) = self.decimation_ratio;
        (num as f64 / den as f64) * 4.0 * REF_FREQ_MHZ * 1e6
    }
}

const fn info(band_hz: f64, num: u32, den: u32, filter_length: u32) -> Option<RangeDecimationInfo> {
    Some(RangeDecimationInfo {
        decimation_filter_band_hz: band_hz,
        decimation_ratio: (num, den),
        filter_length,
    })
}

/// Indexed by the 4-bit `range_decimation` field (0..=11); index 2 is
/// reserved (unassigned in the ICD).
pub static RANGE_DECIMATION_LUT: [Option<RangeDecimationInfo>; 12] = [
    info(100.0e6, 3, 4, 28),
    info(87.71e6, 2, 3, 28),
    None,
    info(74.25e6, 5, 9, 32),
    info(59.44e6, 4, 9, 40),
    info(50.62e6, 3, 8, 48),
    info(44.89e6, 1, 3, 52),
    info(22.20e6, 1, 6, 92),
    info(56.59e6, 3, 7, 36),
    info(42.86e6, 5, 16, 68),
    info(15.10e6, 3, 26, 120),
    info(48.35e6, 4, 11, 44),
];

/// `D_LUT2D` (S1-IF-ASD-PL-0007, table 5.1-1), indexed `[range_decimation][C]`.
pub static D_LUT2D: [&[u8]; 12] = [
    &[1, 1, 2, 3],
    &[1, 1, 2],
    &[],
    &[1, 1, 2, 2, 3, 3, 4, 4, 5],
    &[0, 1, 1, 2, 2, 3, 3, 4, 4],
    &[0, 1, 1, 1, 2, 2, 3, 3],
    &[0, 0, 1],
    &[0, 0, 0, 0, 0, 1],
    &[0, 1, 1, 2, 2, 3, 3],
    &[0, 0, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 4, 4, 4, 5],
    &[
        0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 2, 2, 2, 2, 3, 3,
    ],
    &[0, 1, 1, 1, 2, 2, 3, 3, 3, 4, 4],
];

/// `FILTER_OUTPUT_OFFSET_LUT` (S1-IF-ASD-PL-0007, table 5.1-2), indexed by
/// the 4-bit range decimation code; `None` entries are reserved codes.
pub static FILTER_OUTPUT_OFFSET_LUT: [Option<u32>; 16] = [
    Some(87),
    Some(87),
    None,
    Some(88),
    Some(90),
    Some(92),
    Some(93),
    Some(103),
    Some(89),
    Some(97),
    Some(110),
    Some(91),
    None,
    None,
    None,
    None,
];

pub fn range_decimation_info(code: u8) -> Result<RangeDecimationInfo, Error> {
    RANGE_DECIMATION_LUT
        .get(code as usize)
        .copied()
        .flatten()
        .ok_or(Error::LutLookup {
            table: "RANGE_DECIMATION_LUT",
            index: code as usize,
        })
}

pub fn filter_output_offset(code: u8) -> Result<u32, Error> {
    FILTER_OUTPUT_OFFSET_LUT
        .get(code as usize)
        .copied()
        .flatten()
        .ok_or(Error::LutLookup {
            table: "FILTER_OUTPUT_OFFSET_LUT",
            index: code as usize,
        })
}

pub fn d_value(code: u8, c: usize) -> Result<u32, Error> {
    D_LUT2D
        .get(code as usize)
        .and_then(|row| row.get(c))
        .map(|&v| v as u32)
        .ok_or(Error::LutLookup {
            table: "D_LUT2D",
            index: c,
        })
}
