//! Temperature calibration curves (S1-IF-ASD-PL-0007 §5.4).

use crate::error::Error;

/// TGU (Tile Generation Unit) temperature LUT, in Celsius, indexed by the
/// raw 7-bit sensor code (S1-IF-ASD-PL-0007 §5.4.1).
pub static TGU_TEMPERATURE_LUT: [f64; 128] = [
    116.14, 115.02, 113.90, 112.78, 111.66, 110.54, 109.42, 108.30, 107.18, 106.06, 104.94,
    103.82, 102.70, 101.58, 100.46, 99.34, 98.22, 97.10, 95.98, 94.86, 93.74, 92.62, 91.50, 90.38,
    89.26, 88.14, 87.02, 85.90, 84.78, 83.66, 82.54, 81.42, 80.30, 79.18, 78.06, 76.94, 75.82,
    74.70, 73.58, 72.46, 71.34, 70.22, 69.10, 67.98, 66.86, 65.74, 64.62, 63.50, 62.38, 61.26,
    60.14, 59.02, 57.90, 56.78, 55.66, 54.54, 53.42, 52.30, 51.18, 50.06, 48.94, 47.82, 46.70,
    45.58, 44.46, 43.34, 42.22, 41.10, 39.98, 38.86, 37.74, 36.62, 35.50, 34.38, 33.26, 32.14,
    31.02, 29.90, 28.78, 27.66, 26.54, 25.42, 24.30, 23.18, 22.06, 20.94, 19.82, 18.70, 17.58,
    16.46, 15.34, 14.22, 13.10, 11.98, 10.86, 9.74, 8.62, 7.50, 6.38, 5.26, 4.14, 3.02, 1.90, 0.78,
    -0.34, -1.46, -2.58, -3.70, -4.82, -5.94, -7.06, -8.18, -9.30, -10.42, -11.54, -12.66, -13.78,
    -14.90, -16.02, -17.14, -18.26, -19.38, -20.50, -21.62, -22.74, -23.86, -24.98, -26.10,
];

/// EFE (Electronic Front End) temperature LUT, in Celsius, indexed by the
/// raw 8-bit sensor code (S1-IF-ASD-PL-0007 §5.4.2). The first four entries
/// are unassigned in the ICD.
pub static EFE_TEMPERATURE_LUT: [Option<f64>; 256] = {
    const fn v(x: f64) -> Option<f64> {
        Some(x)
    }
    [
        None, None, None, None, v(-51.38), v(-47.38), v(-44.38), v(-41.50), v(-38.75), v(-36.75),
        v(-34.88), v(-32.88), v(-31.00), v(-29.63), v(-28.00), v(-27.00), v(-25.50), v(-24.13),
        v(-23.13), v(-22.00), v(-21.00), v(-20.00), v(-19.00), v(-18.13), v(-17.00), v(-16.00),
        v(-15.00), v(-14.38), v(-13.88), v(-13.00), v(-12.00), v(-11.38), v(-10.88), v(-10.00),
        v(-9.00), v(-8.50), v(-8.00), v(-7.00), v(-6.50), v(-6.00), v(-5.38), v(-4.88), v(-4.00),
        v(-3.50), v(-3.00), v(-2.50), v(-2.00), v(-1.38), v(-1.00), v(-0.13), v(0.25), v(1.00),
        v(1.50), v(2.00), v(2.50), v(3.00), v(3.50), v(3.88), v(4.25), v(4.88), v(5.13), v(5.88),
        v(6.13), v(6.63), v(7.00), v(7.50), v(8.00), v(8.50), v(9.00), v(9.50), v(9.88), v(10.13),
        v(10.50), v(11.00), v(11.50), v(11.88), v(12.13), v(12.63), v(13.00), v(13.50), v(14.00),
        v(14.50), v(14.88), v(15.13), v(15.50), v(16.00), v(16.50), v(16.88), v(17.13), v(17.50),
        v(17.88), v(18.13), v(18.50), v(19.00), v(19.50), v(19.88), v(20.13), v(20.50), v(21.00),
        v(21.50), v(21.88), v(22.13), v(22.50), v(22.88), v(23.13), v(23.50), v(24.00), v(24.50),
        v(24.50), v(25.00), v(25.50), v(25.88), v(26.13), v(26.50), v(26.88), v(27.13), v(27.50),
        v(28.00), v(28.50), v(28.75), v(29.13), v(29.50), v(29.88), v(30.13), v(30.50), v(30.88),
        v(31.13), v(31.50), v(32.00), v(32.50), v(32.75), v(33.13), v(33.50), v(33.88), v(34.13),
        v(34.50), v(34.88), v(35.13), v(35.50), v(36.00), v(36.50), v(36.88), v(37.13), v(37.50),
        v(37.88), v(38.13), v(38.50), v(39.00), v(39.50), v(39.75), v(40.13), v(40.50), v(40.88),
        v(41.13), v(41.75), v(42.13), v(42.50), v(42.88), v(43.13), v(43.50), v(43.88), v(44.25),
        v(44.75), v(45.13), v(45.50), v(45.88), v(46.25), v(46.75), v(47.13), v(47.50), v(47.88),
        v(48.25), v(48.75), v(49.13), v(49.50), v(49.88), v(50.25), v(50.88), v(51.13), v(51.75),
        v(52.13), v(52.50), v(52.88), v(53.25), v(53.88), v(54.25), v(54.88), v(55.13), v(55.75),
        v(56.13), v(56.75), v(57.13), v(57.50), v(57.88), v(58.25), v(58.88), v(59.25), v(59.88),
        v(60.25), v(60.88), v(61.25), v(61.88), v(62.25), v(62.88), v(63.25), v(63.88), v(64.25),
        v(64.88), v(65.25), v(65.88), v(66.50), v(67.13), v(67.75), v(68.13), v(68.88), v(69.25),
        v(69.88), v(70.50), v(71.13), v(71.88), v(72.25), v(73.00), v(73.75), v(74.25), v(74.88),
        v(75.50), v(76.25), v(76.88), v(77.50), v(78.50), v(79.13), v(79.88), v(80.50), v(81.25),
        v(82.00), v(82.88), v(83.63), v(84.50), v(85.50), v(86.88), v(87.00), v(87.88), v(88.63),
        v(89.63), v(90.63), v(91.63), v(92.63), v(93.63), v(95.00), v(96.00), v(97.00), v(98.50),
        v(99.88), v(100.88), v(102.00), v(103.50),
    ]
};

pub fn lookup_tgu_temperature(code: u8) -> Result<f64, Error> {
    TGU_TEMPERATURE_LUT
        .get(code as usize)
        .copied()
        .ok_or(Error::LutLookup {
            table: "TGU_TEMPERATURE_LUT",
            index: code as usize,
        })
}

pub fn lookup_efe_temperature(code: u8) -> Result<f64, Error> {
    EFE_TEMPERATURE_LUT
        .get(code as usize)
        .copied()
        .flatten()
        .ok_or(Error::LutLookup {
            table: "EFE_TEMPERATURE_LUT",
            index: code as usize,
        })
}

/// TA (Tile Antenna) temperature sensor. The source defines no dedicated
/// TA curve; it reuses the EFE curve (see DESIGN.md).
pub fn lookup_ta_temperature(code: u8) -> Result<f64, Error> {
    lookup_efe_temperature(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tgu_endpoints() {
        assert_eq!(lookup_tgu_temperature(0).unwrap(), 116.14);
        assert_eq!(lookup_tgu_temperature(127).unwrap(), -26.10);
    }

    #[test]
    fn efe_holes_are_errors() {
        assert!(lookup_efe_temperature(0).is_err());
        assert_eq!(lookup_efe_temperature(4).unwrap(), -51.38);
        assert_eq!(lookup_efe_temperature(255).unwrap(), 103.50);
    }

    #[test]
    fn ta_reuses_efe_table() {
        assert_eq!(
            lookup_ta_temperature(4).unwrap(),
            lookup_efe_temperature(4).unwrap()
        );
    }
}
