//! Primary and secondary header records (S1-IF-ASD-PL-0007 §3.1-3.2) and the
//! derived physical quantities defined on top of them (§3.2.5).
//!
//! Every `decode` function pulls its bits off a shared [`BitReader`] so a
//! caller can assemble the full secondary header (62 bytes) from a single
//! cursor without copying sub-slices. Consistency checks that the ICD
//! declares fixed (version, sync marker, ...) are enforced at decode time
//! and reported as [`Error::HeaderConsistency`] / [`Error::SyncMarker`].

use serde::Serialize;

use crate::bitreader::BitReader;
use crate::error::{Error, Result};
use crate::lut;
use crate::platform::{CalTypeDialect, ECalType};

pub const SYNC_MARKER: u32 = 0x352E_F853;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PrimaryHeader {
    pub version: u8,
    pub packet_type: u8,
    pub secondary_header_flag: bool,
    pub pid: u8,
    pub pcat: u8,
    pub sequence_flags: u8,
    pub sequence_counter: u16,
    /// Already adjusted: the ICD stores `packet_data_length - 1`, this
    /// field holds the true byte count of the packet data field.
    pub packet_data_length: u16,
}

impl PrimaryHeader {
    pub fn decode(r: &mut BitReader, packet_index: usize) -> Result<Self> {
        let version = r.read_u8(3)?;
        let packet_type = r.read_u8(1)?;
        let secondary_header_flag = r.read_bool()?;
        let pid = r.read_u8(7)?;
        let pcat = r.read_u8(4)?;
        let sequence_flags = r.read_u8(2)?;
        let sequence_counter = r.read_u16(14)?;
        let packet_data_length = r.read_u16(16)?.wrapping_add(1);

        if version != 0 {
            return Err(Error::HeaderConsistency {
                packet_index,
                detail: format!("packet version number must be 0, got {version}"),
            });
        }
        if packet_type != 0 {
            return Err(Error::HeaderConsistency {
                packet_index,
                detail: format!("packet type must be 0, got {packet_type}"),
            });
        }
        if !secondary_header_flag {
            return Err(Error::HeaderConsistency {
                packet_index,
                detail: "secondary header flag must be set".to_string(),
            });
        }
        if sequence_flags != 3 {
            return Err(Error::HeaderConsistency {
                packet_index,
                detail: format!("sequence flags must be 3 (unsegmented), got {sequence_flags}"),
            });
        }

        Ok(Self {
            version,
            packet_type,
            secondary_header_flag,
            pid,
            pcat,
            sequence_flags,
            sequence_counter,
            packet_data_length,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Datation {
    pub coarse_time: u32,
    pub fine_time: u16,
}

impl Datation {
    pub fn decode(r: &mut BitReader) -> Result<Self> {
        Ok(Self {
            coarse_time: r.read_u32(32)?,
            fine_time: r.read_u16(16)?,
        })
    }

    /// Sub-second time stamp, in seconds (S1-IF-ASD-PL-0007 §3.2.1.2).
    pub fn fine_time_sec(&self) -> f64 {
        (self.fine_time as f64 + 0.5) * 2f64.powi(-16)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ETestMode {
    Default,
    ContingencyRxmFullyOperational,
    ContingencyRxmFullyBypassed,
    Oper,
    Bypass,
}

impl ETestMode {
    fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(ETestMode::Default),
            4 => Some(ETestMode::ContingencyRxmFullyOperational),
            5 => Some(ETestMode::ContingencyRxmFullyBypassed),
            6 => Some(ETestMode::Oper),
            7 => Some(ETestMode::Bypass),
            _ => None,
        }
    }

    /// True for the two test modes that select UDF Format A/B (bypass).
    pub fn is_bypass_family(self) -> bool {
        matches!(
            self,
            ETestMode::Bypass | ETestMode::ContingencyRxmFullyBypassed
        )
    }

    /// The raw telemetry code, for error reporting.
    pub fn raw_value(self) -> u8 {
        match self {
            ETestMode::Default => 0,
            ETestMode::ContingencyRxmFullyOperational => 4,
            ETestMode::ContingencyRxmFullyBypassed => 5,
            ETestMode::Oper => 6,
            ETestMode::Bypass => 7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ERxChannelId {
    Rxv,
    Rxh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FixedAncillary {
    pub sync_marker: u32,
    pub data_take_id: u32,
    /// Event Configuration Code raw value; the mode/timeline model it
    /// selects is out of scope for this crate, so it is kept as a raw code.
    pub ecc_num: u8,
    pub test_mode: ETestMode,
    pub rx_channel_id: ERxChannelId,
    pub instrument_configuration_id: u32,
}

impl FixedAncillary {
    pub fn decode(r: &mut BitReader, packet_index: usize) -> Result<Self> {
        let sync_marker = r.read_u32(32)?;
        if sync_marker != SYNC_MARKER {
            return Err(Error::SyncMarker {
                packet_index,
                found: sync_marker,
            });
        }
        let data_take_id = r.read_u32(32)?;
        let ecc_num = r.read_u8(8)?;
        r.skip(1)?;
        let test_mode_raw = r.read_u8(3)?;
        let test_mode = ETestMode::from_raw(test_mode_raw).ok_or(Error::InvalidEnum {
            packet_index,
            field: "test_mode",
            value: test_mode_raw as u64,
        })?;
        let rx_channel_id_raw = r.read_u8(4)?;
        let rx_channel_id = match rx_channel_id_raw {
            0 => ERxChannelId::Rxv,
            1 => ERxChannelId::Rxh,
            _ => {
                return Err(Error::InvalidEnum {
                    packet_index,
                    field: "rx_channel_id",
                    value: rx_channel_id_raw as u64,
                })
            }
        };
        let instrument_configuration_id = r.read_u32(32)?;

        Ok(Self {
            sync_marker,
            data_take_id,
            ecc_num,
            test_mode,
            rx_channel_id,
            instrument_configuration_id,
        })
    }
}

/// One 3-byte sub-commutated ancillary data fragment: a word index into the
/// 64-packet cycle and its 16-bit payload. Reassembly happens in
/// [`crate::subcomm::SubCommReassembler`], not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubCommutated {
    pub word_index: u8,
    pub word_data: [u8; 2],
}

impl SubCommutated {
    pub fn decode(r: &mut BitReader) -> Result<Self> {
        let word_index = r.read_u8(8)?;
        let hi = r.read_u8(8)?;
        let lo = r.read_u8(8)?;
        Ok(Self {
            word_index,
            word_data: [hi, lo],
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Counters {
    pub space_packet_count: u32,
    pub pri_count: u32,
}

impl Counters {
    pub fn decode(r: &mut BitReader) -> Result<Self> {
        Ok(Self {
            space_packet_count: r.read_u32(32)?,
            pri_count: r.read_u32(32)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EPolarization {
    HTxOnly,
    HH,
    HV,
    HVh,
    VTxOnly,
    VH,
    VV,
    VVh,
}

impl EPolarization {
    fn from_raw(raw: u8) -> Self {
        match raw & 0b111 {
            0 => EPolarization::HTxOnly,
            1 => EPolarization::HH,
            2 => EPolarization::HV,
            3 => EPolarization::HVh,
            4 => EPolarization::VTxOnly,
            5 => EPolarization::VH,
            6 => EPolarization::VV,
            _ => EPolarization::VVh,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ETemperatureCompensation {
    FeOffTaOff,
    FeOnTaOff,
    FeOffTaOn,
    FeOnTaOn,
}

impl ETemperatureCompensation {
    fn from_raw(raw: u8) -> Self {
        match raw & 0b11 {
            0 => ETemperatureCompensation::FeOffTaOff,
            1 => ETemperatureCompensation::FeOnTaOff,
            2 => ETemperatureCompensation::FeOffTaOn,
            _ => ETemperatureCompensation::FeOnTaOn,
        }
    }
}

/// The polymorphic 24-bit SAS SSB record (S1-IF-ASD-PL-0007 §3.2.5.13).
///
/// `ssb_flag` selects between an imaging/noise interpretation of the last
/// 14 bits (elevation/azimuth beam address) and a calibration
/// interpretation (SAS test flag, cal type, calibration beam address). Both
/// shapes are exposed as accessors on the same record, matching the
/// original's tagged-union-with-checked-accessors shape: by default an
/// accessor for the "other" shape returns `None`, but passing
/// `check = false` returns the raw bits reinterpreted regardless of
/// `ssb_flag`, which supports bulk field dumping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SasData {
    pub ssb_flag: bool,
    pub polarization: EPolarization,
    pub temperature_compensation: ETemperatureCompensation,
    /// Raw 4-bit field: `elevation_beam_address` when `!ssb_flag`, packs
    /// `sas_test` (bit 0) and `cal_type` (bits 1-3) when `ssb_flag`.
    dynamic_data: u8,
    /// Raw 10-bit field: `azimuth_beam_address` or `calibration_beam_address`.
    beam_address: u16,
}

impl SasData {
    pub fn decode(r: &mut BitReader) -> Result<Self> {
        let ssb_flag = r.read_bool()?;
        let polarization = EPolarization::from_raw(r.read_u8(3)?);
        let temperature_compensation = ETemperatureCompensation::from_raw(r.read_u8(2)?);
        r.skip(2)?;
        let dynamic_data = r.read_u8(4)?;
        r.skip(2)?;
        let beam_address = r.read_u16(10)?;
        Ok(Self {
            ssb_flag,
            polarization,
            temperature_compensation,
            dynamic_data,
            beam_address,
        })
    }

    pub fn get_elevation_beam_address(&self, check: bool) -> Option<u8> {
        if check && self.ssb_flag {
            return None;
        }
        Some(self.dynamic_data)
    }

    pub fn get_azimuth_beam_address(&self, check: bool) -> Option<u16> {
        if check && self.ssb_flag {
            return None;
        }
        Some(self.beam_address)
    }

    pub fn get_sas_test(&self, check: bool) -> Option<bool> {
        if check && !self.ssb_flag {
            return None;
        }
        Some((self.dynamic_data >> 3) & 0b1 != 0)
    }

    pub fn get_cal_type(&self, check: bool, dialect: CalTypeDialect) -> Option<ECalType> {
        if check && !self.ssb_flag {
            return None;
        }
        ECalType::from_raw(self.dynamic_data & 0b111, dialect)
    }

    pub fn get_calibration_beam_address(&self, check: bool) -> Option<u16> {
        if check && !self.ssb_flag {
            return None;
        }
        Some(self.beam_address)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ECalMode {
    Pcc2IcalInterleaved,
    Pcc2IcalPreamble,
    Pcc32PhaseCodedCharacterization,
    Rf672PhaseCodedCharacterization,
}

impl ECalMode {
    fn from_raw(raw: u8) -> Self {
        match raw & 0b11 {
            0 => ECalMode::Pcc2IcalInterleaved,
            1 => ECalMode::Pcc2IcalPreamble,
            2 => ECalMode::Pcc32PhaseCodedCharacterization,
            _ => ECalMode::Rf672PhaseCodedCharacterization,
        }
    }
}

/// SES signal type (S1-IF-ASD-PL-0007 §3.2.5.14.3). Raw value 11 is
/// `TA_CAL` on S1A/B and `TXH_CAL_ISO` on S1C/D, mirroring `ECalType`'s
/// split at raw values 5/6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ESignalType {
    Echo,
    Noise,
    TxCal,
    RxCal,
    EpdnCal,
    TaCal,
    ApdnCal,
    TxhCalIso,
}

impl ESignalType {
    fn from_raw(raw: u8, dialect: CalTypeDialect) -> Option<Self> {
        match (raw, dialect) {
            (0, _) => Some(ESignalType::Echo),
            (1, _) => Some(ESignalType::Noise),
            (8, _) => Some(ESignalType::TxCal),
            (9, _) => Some(ESignalType::RxCal),
            (10, _) => Some(ESignalType::EpdnCal),
            (11, CalTypeDialect::S1AB) => Some(ESignalType::TaCal),
            (11, CalTypeDialect::S1CD) => Some(ESignalType::TxhCalIso),
            (12, _) => Some(ESignalType::ApdnCal),
            (15, _) => Some(ESignalType::TxhCalIso),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SesData {
    pub cal_mode: ECalMode,
    pub tx_pulse_number: u8,
    signal_type_raw: u8,
    pub swap: bool,
    pub swath_number: u8,
}

impl SesData {
    pub fn decode(r: &mut BitReader) -> Result<Self> {
        let cal_mode = ECalMode::from_raw(r.read_u8(2)?);
        r.skip(1)?;
        let tx_pulse_number = r.read_u8(5)?;
        let signal_type_raw = r.read_u8(4)?;
        r.skip(3)?;
        let swap = r.read_bool()?;
        let swath_number = r.read_u8(8)?;
        Ok(Self {
            cal_mode,
            tx_pulse_number,
            signal_type_raw,
            swap,
            swath_number,
        })
    }

    pub fn signal_type(&self, dialect: CalTypeDialect, packet_index: usize) -> Result<ESignalType> {
        ESignalType::from_raw(self.signal_type_raw, dialect).ok_or(Error::InvalidEnum {
            packet_index,
            field: "signal_type",
            value: self.signal_type_raw as u64,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EBaqMode {
    Bypass,
    Baq3,
    Baq4,
    Baq5,
    Fdbaq0,
    Fdbaq1,
    Fdbaq2,
}

impl EBaqMode {
    fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(EBaqMode::Bypass),
            3 => Some(EBaqMode::Baq3),
            4 => Some(EBaqMode::Baq4),
            5 => Some(EBaqMode::Baq5),
            12 => Some(EBaqMode::Fdbaq0),
            13 => Some(EBaqMode::Fdbaq1),
            14 => Some(EBaqMode::Fdbaq2),
            _ => None,
        }
    }

    /// Bits-per-sample for a BAQ (not FDBAQ) mode.
    pub fn baq_bits(self) -> Option<u8> {
        match self {
            EBaqMode::Baq3 => Some(3),
            EBaqMode::Baq4 => Some(4),
            EBaqMode::Baq5 => Some(5),
            _ => None,
        }
    }

    /// The raw telemetry code, for error reporting.
    pub fn raw_value(self) -> u8 {
        match self {
            EBaqMode::Bypass => 0,
            EBaqMode::Baq3 => 3,
            EBaqMode::Baq4 => 4,
            EBaqMode::Baq5 => 5,
            EBaqMode::Fdbaq0 => 12,
            EBaqMode::Fdbaq1 => 13,
            EBaqMode::Fdbaq2 => 14,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RadarConfigurationSupport {
    pub error_flag: bool,
    pub baq_mode: EBaqMode,
    pub baq_block_len: u8,
    /// Raw 4-bit range decimation code (0..=11, index 2 reserved).
    pub range_decimation: u8,
    pub rx_gain: u8,
    pub tx_ramp_rate: u16,
    pub tx_pulse_start_freq: u16,
    pub tx_pulse_length: u32,
    pub rank: u8,
    pub pri: u32,
    pub swst: u32,
    pub swl: u32,
    pub sas: SasData,
    pub ses: SesData,
}

impl RadarConfigurationSupport {
    pub fn decode(r: &mut BitReader, packet_index: usize) -> Result<Self> {
        let error_flag = r.read_bool()?;
        r.skip(2)?;
        let baq_mode_raw = r.read_u8(5)?;
        let baq_mode = EBaqMode::from_raw(baq_mode_raw).ok_or(Error::InvalidEnum {
            packet_index,
            field: "baq_mode",
            value: baq_mode_raw as u64,
        })?;
        let baq_block_len = r.read_u8(8)?;
        r.skip(8)?;
        let range_decimation = r.read_u8(8)?;
        let rx_gain = r.read_u8(8)?;
        let tx_ramp_rate = r.read_u16(16)?;
        let tx_pulse_start_freq = r.read_u16(16)?;
        let tx_pulse_length = r.read_u32(24)?;
        r.skip(3)?;
        let rank = r.read_u8(5)?;
        let pri = r.read_u32(24)?;
        let swst = r.read_u32(24)?;
        let swl = r.read_u32(24)?;
        let sas = SasData::decode(r)?;
        let ses = SesData::decode(r)?;

        Ok(Self {
            error_flag,
            baq_mode,
            baq_block_len,
            range_decimation,
            rx_gain,
            tx_ramp_rate,
            tx_pulse_start_freq,
            tx_pulse_length,
            rank,
            pri,
            swst,
            swl,
            sas,
            ses,
        })
    }

    /// Number of complex radar samples per BAQ block (§3.2.5.3).
    pub fn baq_block_len_samples(&self) -> u32 {
        8 * (self.baq_block_len as u32 + 1)
    }

    pub fn range_decimation_info(&self) -> Result<lut::range_decimation::RangeDecimationInfo> {
        lut::range_decimation_info(self.range_decimation)
    }

    /// Rx Gain, in dB (§3.2.5.5).
    pub fn rx_gain_db(&self) -> f64 {
        -0.5 * self.rx_gain as f64
    }

    fn tx_ramp_rate_mhz_per_usec(&self) -> f64 {
        let sign = if self.tx_ramp_rate >> 15 != 0 {
            1.0
        } else {
            -1.0
        };
        let value = (self.tx_ramp_rate & 0x7FFF) as f64;
        sign * (value * lut::range_decimation::REF_FREQ_MHZ.powi(2) / 2f64.powi(21))
    }

    /// Tx Pulse Ramp Rate, in Hz/s (§3.2.5.6).
    pub fn tx_ramp_rate_hz_per_sec(&self) -> f64 {
        self.tx_ramp_rate_mhz_per_usec() * 1e12
    }

    /// Tx Pulse Start Frequency, in Hz (§3.2.5.7).
    pub fn tx_pulse_start_freq_hz(&self) -> f64 {
        let sign = if self.tx_pulse_start_freq >> 15 != 0 {
            1.0
        } else {
            -1.0
        };
        let value = (self.tx_pulse_start_freq & 0x7FFF) as f64;
        let ref_freq = lut::range_decimation::REF_FREQ_MHZ;
        1e6 * (self.tx_ramp_rate_mhz_per_usec() / (4.0 * ref_freq) + sign * value * ref_freq / 2f64.powi(14))
    }

    /// Tx Pulse Length, in seconds (§3.2.5.8).
    pub fn tx_pulse_length_sec(&self) -> f64 {
        self.tx_pulse_length as f64 / lut::range_decimation::REF_FREQ_MHZ * 1e-6
    }

    /// Tx Pulse Length in samples after decimation (N3_Tx, §3.2.5.8).
    pub fn tx_pulse_length_samples(&self) -> Result<u32> {
        let rdinfo = self.range_decimation_info()?;
        let f_dec = rdinfo.sampling_frequency_hz();
        Ok((self.tx_pulse_length_sec() * f_dec).ceil() as u32)
    }

    /// Pulse Repetition Interval, in seconds (§3.2.5.10).
    pub fn pri_sec(&self) -> f64 {
        self.pri as f64 / lut::range_decimation::REF_FREQ_MHZ * 1e-6
    }

    /// Sampling Window Start Time, in seconds (§3.2.5.11).
    pub fn swst_sec(&self) -> f64 {
        self.swst as f64 / lut::range_decimation::REF_FREQ_MHZ * 1e-6
    }

    /// Duration of the decimation filter transient, in seconds (§3.2.5.11).
    pub fn delta_t_suppr_sec(&self) -> f64 {
        320.0 / 8.0 / lut::range_decimation::REF_FREQ_MHZ * 1e-6
    }

    /// Sampling Window Start Time after the decimation filter transient,
    /// in seconds (§3.2.5.11).
    pub fn swst_after_decimation_sec(&self) -> f64 {
        (self.swst as f64 + 320.0 / 8.0) / lut::range_decimation::REF_FREQ_MHZ * 1e-6
    }

    /// Sampling Window Length, in seconds (§3.2.5.12).
    pub fn swl_sec(&self) -> f64 {
        self.swl as f64 / lut::range_decimation::REF_FREQ_MHZ * 1e-6
    }

    /// Sampling Window Length in complex samples after decimation (N3_Rx,
    /// §3.2.5.12).
    ///
    /// The division `b / den` truncates toward zero, matching the
    /// original's `int(b / den)` (the original itself flags this as
    /// uncertain between truncation and rounding; see DESIGN.md).
    pub fn swl_n3rx_samples(&self) -> Result<u32> {
        let rdinfo = self.range_decimation_info()?;
        let (num, den) = rdinfo.decimation_ratio;
        let (num, den) = (num as i64, den as i64);
        let filter_output_offset = lut::filter_output_offset(self.range_decimation)?;
        debug_assert_eq!(filter_output_offset, 80 + rdinfo.filter_length / 4);

        let b = 2 * self.swl as i64 - filter_output_offset as i64 - 17;
        let q = b / den;
        let c = b - den * q;
        let d = lut::d_value(self.range_decimation, c as usize)?;
        Ok((2 * (num * q + d as i64 + 1)) as u32)
    }

    /// Sampling Window Length after decimation, in seconds (§3.2.5.12).
    pub fn swl_n3rx_sec(&self) -> Result<f64> {
        let fs = self.range_decimation_info()?.sampling_frequency_hz();
        Ok(self.swl_n3rx_samples()? as f64 / fs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RadarSampleCount {
    pub number_of_quads: u16,
}

impl RadarSampleCount {
    pub fn decode(r: &mut BitReader) -> Result<Self> {
        let number_of_quads = r.read_u16(16)?;
        r.skip(8)?;
        Ok(Self { number_of_quads })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SecondaryHeader {
    pub datation: Datation,
    pub fixed_ancillary: FixedAncillary,
    pub subcommutated: SubCommutated,
    pub counters: Counters,
    pub radar_configuration_support: RadarConfigurationSupport,
    pub radar_sample_count: RadarSampleCount,
}

impl SecondaryHeader {
    pub const LEN_BYTES: usize = 62;

    pub fn decode(bytes: &[u8; Self::LEN_BYTES], packet_index: usize) -> Result<Self> {
        let mut r = BitReader::new(bytes);
        let datation = Datation::decode(&mut r)?;
        let fixed_ancillary = FixedAncillary::decode(&mut r, packet_index)?;
        let subcommutated = SubCommutated::decode(&mut r)?;
        let counters = Counters::decode(&mut r)?;
        let radar_configuration_support = RadarConfigurationSupport::decode(&mut r, packet_index)?;
        let radar_sample_count = RadarSampleCount::decode(&mut r)?;

        Ok(Self {
            datation,
            fixed_ancillary,
            subcommutated,
            counters,
            radar_configuration_support,
            radar_sample_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn primary_header_bytes(sequence_counter: u16, packet_data_length_minus_one: u16) -> [u8; 6] {
        let mut b = [0u8; 6];
        // version=0, type=0, secondary_header_flag=1, pid=0, pcat=0
        b[0] = 0b0001_0000;
        b[1] = 0;
        let seq = 0xC000 | (sequence_counter & 0x3FFF);
        b[2..4].copy_from_slice(&seq.to_be_bytes());
        b[4..6].copy_from_slice(&packet_data_length_minus_one.to_be_bytes());
        b
    }

    #[test]
    fn primary_header_roundtrip() {
        let bytes = primary_header_bytes(42, 99);
        let mut r = BitReader::new(&bytes);
        let hdr = PrimaryHeader::decode(&mut r, 0).unwrap();
        assert_eq!(hdr.version, 0);
        assert_eq!(hdr.sequence_flags, 3);
        assert_eq!(hdr.sequence_counter, 42);
        assert_eq!(hdr.packet_data_length, 100);
    }

    #[test]
    fn primary_header_rejects_bad_version() {
        let mut bytes = primary_header_bytes(0, 0);
        bytes[0] |= 0b0010_0000; // version = 1
        let mut r = BitReader::new(&bytes);
        assert!(matches!(
            PrimaryHeader::decode(&mut r, 7),
            Err(Error::HeaderConsistency { packet_index: 7, .. })
        ));
    }

    #[test]
    fn fixed_ancillary_rejects_bad_sync() {
        let mut bytes = [0u8; 14];
        bytes[0..4].copy_from_slice(&0u32.to_be_bytes());
        let mut r = BitReader::new(&bytes);
        let err = FixedAncillary::decode(&mut r, 3).unwrap_err();
        assert!(matches!(err, Error::SyncMarker { packet_index: 3, .. }));
    }

    #[test]
    fn sas_data_accessor_check_flag() {
        // ssb_flag=1, pol=0, tcmp=0, pad(2)=0, dynamic_data=0b1010
        // (sas_test=1, cal_type=0b010=2), pad(2)=0, beam_address=5.
        // Packed MSB-first across 24 bits: 1 000 00 00 1010 00 0000000101
        let bits: u32 = (1 << 23) | (0b1010 << 12) | 5;
        let packed = bits.to_be_bytes();
        let mut r = BitReader::new(&packed[1..]);
        let sas = SasData::decode(&mut r).unwrap();
        assert!(sas.ssb_flag);
        assert_eq!(sas.get_elevation_beam_address(true), None);
        assert_eq!(sas.get_elevation_beam_address(false), Some(0b1010));
        assert_eq!(sas.get_sas_test(true), Some(true));
        assert_eq!(
            sas.get_cal_type(true, CalTypeDialect::S1AB),
            Some(ECalType::EpdnCal)
        );
        assert_eq!(sas.get_calibration_beam_address(true), Some(5));
    }

    #[test]
    fn ebaq_mode_rejects_gap_values() {
        assert!(EBaqMode::from_raw(1).is_none());
        assert_eq!(EBaqMode::from_raw(4), Some(EBaqMode::Baq4));
        assert_eq!(EBaqMode::from_raw(4).unwrap().baq_bits(), Some(4));
    }
}
