//! BAQ (3/4/5-bit) and FDBAQ block-reconstruction tables
//! (S1-IF-ASD-PL-0007 §5.2).
//!
//! Each `(mode, THIDX)` pair selects a reconstruction LUT mapping a raw
//! code value to a reconstructed float. Below the mode's threshold the LUT
//! is a "simple reconstruction": the small codes are their own value and
//! the top code is read off `SRM_LUT_A`/`SRM_LUT_B`. At or above the
//! threshold it is a "normal reconstruction": `NRL[code] * sigma[thidx]`.
//! Negative codes mirror the positive half. Tables are memoized behind a
//! shared cache since a stream only ever touches a handful of THIDX values.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;

use crate::error::Error;

/// Simple-reconstruction table A, indexed by BAQ bits-per-sample (3, 4, 5).
fn srm_lut_a(baq_bits: u8) -> Option<&'static [f64]> {
    match baq_bits {
        3 => Some(&[3.0000, 3.0000, 3.1200, 3.5500]),
        4 => Some(&[7.0000, 7.0000, 7.0000, 7.1700, 7.4000, 7.7600]),
        5 => Some(&[
            15.0000, 15.0000, 15.0000, 15.0000, 15.0000, 15.0000, 15.4400, 15.5600, 16.1100,
            16.3800, 16.6500,
        ]),
        _ => None,
    }
}

/// Normalized reconstruction levels for BAQ, indexed by bits-per-sample.
fn baq_nrl_lut(baq_bits: u8) -> Option<&'static [f64]> {
    match baq_bits {
        3 => Some(&[0.2490, 0.7681, 1.3655, 2.1864]),
        4 => Some(&[
            0.1290, 0.3900, 0.6601, 0.9471, 1.2623, 1.6261, 2.0793, 2.7467,
        ]),
        5 => Some(&[
            0.0660, 0.1985, 0.3320, 0.4677, 0.6061, 0.7487, 0.8964, 1.0510, 1.2143, 1.3896,
            1.5800, 1.7914, 2.0329, 2.3234, 2.6971, 3.2692,
        ]),
        _ => None,
    }
}

/// Simple-reconstruction table B, indexed by BRC (0..=4).
fn srm_lut_b(brc: u8) -> Option<&'static [f64]> {
    match brc {
        0 => Some(&[3.0000, 3.0000, 3.1600, 3.5300]),
        1 => Some(&[4.0000, 4.0000, 4.0800, 4.3700]),
        2 => Some(&[6.0000, 6.0000, 6.0000, 6.1500, 6.5000, 6.8800]),
        3 => Some(&[9.0000, 9.0000, 9.0000, 9.0000, 9.3600, 9.5000, 10.1000]),
        4 => Some(&[
            15.0000, 15.0000, 15.0000, 15.0000, 15.0000, 15.0000, 15.2200, 15.5000, 16.0500,
        ]),
        _ => None,
    }
}

/// Normalized reconstruction levels for FDBAQ, indexed by BRC.
fn fdbaq_nrl_lut(brc: u8) -> Option<&'static [f64]> {
    match brc {
        0 => Some(&[0.3637, 1.0915, 1.8208, 2.6406]),
        1 => Some(&[0.3042, 0.9127, 1.5216, 2.1313, 2.8426]),
        2 => Some(&[0.2305, 0.6916, 1.1528, 1.6140, 2.0754, 2.5369, 3.1191]),
        3 => Some(&[
            0.1702, 0.5107, 0.8511, 1.1916, 1.5321, 1.8726, 2.2131, 2.5536, 2.8942, 3.3744,
        ]),
        4 => Some(&[
            0.1130, 0.3389, 0.5649, 0.7908, 1.0167, 1.2428, 1.4687, 1.6947, 1.9206, 2.1466,
            2.3725, 2.5985, 2.8244, 3.0504, 3.2764, 3.6623,
        ]),
        _ => None,
    }
}

/// BRC block sizes (number of positive codes), indexed by BRC (0..=4).
pub fn brc_size(brc: u8) -> Option<u32> {
    match brc {
        0 => Some(4),
        1 => Some(5),
        2 => Some(7),
        3 => Some(10),
        4 => Some(16),
        _ => None,
    }
}

/// Sigma factors, indexed by THIDX (0..=255).
pub static SIGMA_FACTORS_LUT: [f64; 256] = [
    0.00, 0.63, 1.25, 1.88, 2.51, 3.13, 3.76, 4.39, 5.01, 5.64, 6.27, 6.89, 7.52, 8.15, 8.77, 9.40,
    10.03, 10.65, 11.28, 11.91, 12.53, 13.16, 13.79, 14.41, 15.04, 15.67, 16.29, 16.92, 17.55,
    18.17, 18.80, 19.43, 20.05, 20.68, 21.31, 21.93, 22.56, 23.19, 23.81, 24.44, 25.07, 25.69,
    26.32, 26.95, 27.57, 28.20, 28.83, 29.45, 30.08, 30.71, 31.33, 31.96, 32.59, 33.21, 33.84,
    34.47, 35.09, 35.72, 36.35, 36.97, 37.60, 38.23, 38.85, 39.48, 40.11, 40.73, 41.36, 41.99,
    42.61, 43.24, 43.87, 44.49, 45.12, 45.75, 46.37, 47.00, 47.63, 48.25, 48.88, 49.51, 50.13,
    50.76, 51.39, 52.01, 52.64, 53.27, 53.89, 54.52, 55.15, 55.77, 56.40, 57.03, 57.65, 58.28,
    58.91, 59.53, 60.16, 60.79, 61.41, 62.04, 62.98, 64.24, 65.49, 66.74, 68.00, 69.25, 70.50,
    71.76, 73.01, 74.26, 75.52, 76.77, 78.02, 79.28, 80.53, 81.78, 83.04, 84.29, 85.54, 86.80,
    88.05, 89.30, 90.56, 91.81, 93.06, 94.32, 95.57, 96.82, 98.08, 99.33, 100.58, 101.84, 103.09,
    104.34, 105.60, 106.85, 108.10, 109.35, 110.61, 111.86, 113.11, 114.37, 115.62, 116.87, 118.13,
    119.38, 120.63, 121.89, 123.14, 124.39, 125.65, 126.90, 128.15, 129.41, 130.66, 131.91, 133.17,
    134.42, 135.67, 136.93, 138.18, 139.43, 140.69, 141.94, 143.19, 144.45, 145.70, 146.95, 148.21,
    149.46, 150.71, 151.97, 153.22, 154.47, 155.73, 156.98, 158.23, 159.49, 160.74, 161.99, 163.25,
    164.50, 165.75, 167.01, 168.26, 169.51, 170.77, 172.02, 173.27, 174.53, 175.78, 177.03, 178.29,
    179.54, 180.79, 182.05, 183.30, 184.55, 185.81, 187.06, 188.31, 189.57, 190.82, 192.07, 193.33,
    194.58, 195.83, 197.09, 198.34, 199.59, 200.85, 202.10, 203.35, 204.61, 205.86, 207.11, 208.37,
    209.62, 210.87, 212.13, 213.38, 214.63, 215.89, 217.14, 218.39, 219.65, 220.90, 222.15, 223.41,
    224.66, 225.91, 227.17, 228.42, 229.67, 230.93, 232.18, 233.43, 234.69, 235.94, 237.19, 238.45,
    239.70, 240.95, 242.21, 243.46, 244.71, 245.97, 247.22, 248.47, 249.73, 250.98, 252.23, 253.49,
    254.74, 255.99, 255.99,
];

fn sigma_factor(thidx: u8) -> f64 {
    SIGMA_FACTORS_LUT[thidx as usize]
}

fn build_lut(n: u32, thidx: u8, simple: Option<f64>, nrl: &[f64]) -> Result<Arc<[f32]>, Error> {
    let n = n as usize;
    let mut lut = vec![0.0f64; 2 * n];
    if let Some(value) = simple {
        for (c, slot) in lut.iter_mut().take(n - 1).enumerate() {
            *slot = c as f64;
        }
        lut[n - 1] = value;
    } else {
        let sigma = sigma_factor(thidx);
        for (slot, level) in lut[..n].iter_mut().zip(nrl) {
            *slot = level * sigma;
        }
    }
    for i in 0..n {
        lut[n + i] = -lut[i];
    }
    Ok(lut.into_iter().map(|v| v as f32).collect())
}

type LutCache = Mutex<HashMap<(u8, u8), Arc<[f32]>>>;

static BAQ_CACHE: Lazy<LutCache> = Lazy::new(|| Mutex::new(HashMap::new()));
static FDBAQ_CACHE: Lazy<LutCache> = Lazy::new(|| Mutex::new(HashMap::new()));

/// Build (or fetch from cache) the BAQ reconstruction LUT for a given
/// bits-per-sample mode (3, 4 or 5) and THIDX.
///
/// Mirrors the original `get_baq_lut`: the simple/normal split compares
/// `thidx` directly against `n = 2^(nbits-1)`, not against the length of
/// `SRM_LUT_A`, so a THIDX in `[len(SRM_LUT_A), n)` is a genuine
/// out-of-range lookup in both implementations (see DESIGN.md).
pub fn baq_lut(baq_bits: u8, thidx: u8) -> Result<Arc<[f32]>, Error> {
    if let Some(hit) = BAQ_CACHE.lock().unwrap().get(&(baq_bits, thidx)) {
        return Ok(hit.clone());
    }
    let nrl = baq_nrl_lut(baq_bits).ok_or(Error::LutLookup {
        table: "BAQ_NRL_LUT",
        index: baq_bits as usize,
    })?;
    let n = nrl.len() as u32;
    let srm = srm_lut_a(baq_bits).ok_or(Error::LutLookup {
        table: "SRM_LUT_A",
        index: baq_bits as usize,
    })?;

    let lut = if (thidx as u32) < n {
        let value = *srm.get(thidx as usize).ok_or(Error::LutLookup {
            table: "SRM_LUT_A",
            index: thidx as usize,
        })?;
        build_lut(n, thidx, Some(value), nrl)?
    } else {
        build_lut(n, thidx, None, nrl)?
    };

    BAQ_CACHE
        .lock()
        .unwrap()
        .insert((baq_bits, thidx), lut.clone());
    Ok(lut)
}

/// Build (or fetch from cache) the FDBAQ reconstruction LUT for a given
/// BRC (0..=4) and THIDX.
pub fn fdbaq_lut(brc: u8, thidx: u8) -> Result<Arc<[f32]>, Error> {
    if let Some(hit) = FDBAQ_CACHE.lock().unwrap().get(&(brc, thidx)) {
        return Ok(hit.clone());
    }
    let nrl = fdbaq_nrl_lut(brc).ok_or(Error::LutLookup {
        table: "FDBAQ_NRL_LUT",
        index: brc as usize,
    })?;
    let n = brc_size(brc).ok_or(Error::LutLookup {
        table: "BRC_SIZE",
        index: brc as usize,
    })?;
    let srm = srm_lut_b(brc).ok_or(Error::LutLookup {
        table: "SRM_LUT_B",
        index: brc as usize,
    })?;
    let m = srm.len() as u32 - 1;

    let lut = if (thidx as u32) <= m {
        let value = *srm.get(thidx as usize).ok_or(Error::LutLookup {
            table: "SRM_LUT_B",
            index: thidx as usize,
        })?;
        build_lut(n, thidx, Some(value), nrl)?
    } else {
        build_lut(n, thidx, None, nrl)?
    };

    FDBAQ_CACHE
        .lock()
        .unwrap()
        .insert((brc, thidx), lut.clone());
    Ok(lut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baq_lut_mirrors_negatives() {
        let lut = baq_lut(3, 250).unwrap();
        for c in 0..4 {
            assert_eq!(lut[c + 4], -lut[c]);
        }
    }

    #[test]
    fn baq_lut_simple_reconstruction_identity() {
        let lut = baq_lut(4, 0).unwrap();
        assert_eq!(lut[0], 0.0);
        assert_eq!(lut[1], 1.0);
        assert_eq!(lut[2], 2.0);
        assert_eq!(lut[6], 6.0);
        assert_eq!(lut[7], 7.0);
    }

    #[test]
    fn fdbaq_lut_mirrors_negatives() {
        let lut = fdbaq_lut(2, 200).unwrap();
        for c in 0..7 {
            assert_eq!(lut[c + 7], -lut[c]);
        }
    }

    #[test]
    fn fdbaq_lut_simple_reconstruction_identity() {
        let lut = fdbaq_lut(0, 0).unwrap();
        assert_eq!(lut[0], 0.0);
        assert_eq!(lut[1], 1.0);
        assert_eq!(lut[2], 2.0);
        assert_eq!(lut[3], 3.0);
    }

    #[test]
    fn results_are_cached() {
        let a = baq_lut(5, 10).unwrap();
        let b = baq_lut(5, 10).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
