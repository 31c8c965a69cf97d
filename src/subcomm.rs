//! The sub-commutated ancillary data reassembler (S1-IF-ASD-PL-0007 §3.2.3).
//!
//! One 16-bit word of PVT/attitude/housekeeping data rides along in every
//! packet's `SubCommutated` fragment, tagged with its position (1..64) in a
//! 64-packet cycle. [`SubCommReassembler`] is a streaming state machine that
//! watches the fragment stream go by, notices cycle boundaries, and hands
//! back the three sub-records once a cycle's 64 words are collected.
//!
//! The three sub-record sizes are not taken from the spec's rounded "(40 B)"
//! labels: `PvtAncillaryData` and `AttitudeAncillaryData` work out to 44 and
//! 38 bytes respectively once their declared fields (including the 56-bit
//! time stamp) are laid out bit-for-bit, which puts `Attitude` adjacent to
//! (not overlapping) `HkTemperatureAncillaryData` at word 42. See
//! DESIGN.md for this reconciliation.

use serde::Serialize;
use tracing::warn;

use crate::bitreader::BitReader;
use crate::error::{Error, Result};
use crate::header::SubCommutated;

const CYCLE_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PvtAncillaryData {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub vx: f32,
    pub vy: f32,
    pub vz: f32,
    /// Yocto-seconds (1e-24 s) time stamp.
    pub time_stamp: u64,
}

impl PvtAncillaryData {
    pub const FIRST_WORD_INDEX: u8 = 1;
    pub const SIZE_BYTES: usize = 44;

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut r = BitReader::new(bytes);
        let x = r.read_f64()?;
        let y = r.read_f64()?;
        let z = r.read_f64()?;
        let vx = r.read_f32()?;
        let vy = r.read_f32()?;
        let vz = r.read_f32()?;
        r.skip(8)?;
        let time_stamp = r.read_u64(56)?;
        Ok(Self {
            x,
            y,
            z,
            vx,
            vy,
            vz,
            time_stamp,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PointingStatus {
    pub aocs_op_mode: u8,
    pub roll_error: bool,
    pub pitch_error: bool,
    pub yaw_error: bool,
}

impl PointingStatus {
    fn decode(r: &mut BitReader) -> Result<Self> {
        let aocs_op_mode = r.read_u8(8)?;
        r.skip(4)?;
        let roll_error = r.read_bool()?;
        let pitch_error = r.read_bool()?;
        let yaw_error = r.read_bool()?;
        Ok(Self {
            aocs_op_mode,
            roll_error,
            pitch_error,
            yaw_error,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AttitudeAncillaryData {
    pub q0: f32,
    pub q1: f32,
    pub q2: f32,
    pub q3: f32,
    pub omega_x: f32,
    pub omega_y: f32,
    pub omega_z: f32,
    /// Yocto-seconds (1e-24 s) time stamp.
    pub time_stamp: u64,
    pub pointing_status: PointingStatus,
}

impl AttitudeAncillaryData {
    pub const FIRST_WORD_INDEX: u8 = 23;
    pub const SIZE_BYTES: usize = 38;

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut r = BitReader::new(bytes);
        let q0 = r.read_f32()?;
        let q1 = r.read_f32()?;
        let q2 = r.read_f32()?;
        let q3 = r.read_f32()?;
        let omega_x = r.read_f32()?;
        let omega_y = r.read_f32()?;
        let omega_z = r.read_f32()?;
        r.skip(8)?;
        let time_stamp = r.read_u64(56)?;
        let pointing_status = PointingStatus::decode(&mut r)?;
        Ok(Self {
            q0,
            q1,
            q2,
            q3,
            omega_x,
            omega_y,
            omega_z,
            time_stamp,
            pointing_status,
        })
    }
}

/// One tile's three temperature sensor codes (EFE-H, EFE-V, TA), raw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TileTemperature {
    pub efeh: u8,
    pub efev: u8,
    pub ta: u8,
}

pub const HK_TILE_COUNT: usize = 14;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HkTemperatureAncillaryData {
    pub temperature_update_status: u16,
    pub tiles: [TileTemperature; HK_TILE_COUNT],
    pub tgu_temperature_raw: u8,
}

impl HkTemperatureAncillaryData {
    pub const FIRST_WORD_INDEX: u8 = 42;
    pub const SIZE_BYTES: usize = 46;

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut r = BitReader::new(bytes);
        let temperature_update_status = r.read_u16(16)?;
        let mut tiles = [TileTemperature {
            efeh: 0,
            efev: 0,
            ta: 0,
        }; HK_TILE_COUNT];
        for tile in tiles.iter_mut() {
            tile.efeh = r.read_u8(8)?;
            tile.efev = r.read_u8(8)?;
            tile.ta = r.read_u8(8)?;
        }
        r.skip(9)?;
        let tgu_temperature_raw = r.read_u8(7)?;
        Ok(Self {
            temperature_update_status,
            tiles,
            tgu_temperature_raw,
        })
    }

    pub fn tgu_temperature_celsius(&self) -> Result<f64> {
        crate::lut::lookup_tgu_temperature(self.tgu_temperature_raw)
    }

    pub fn efe_temperature_celsius(&self, tile: usize, horizontal: bool) -> Result<f64> {
        let code = if horizontal {
            self.tiles[tile].efeh
        } else {
            self.tiles[tile].efev
        };
        crate::lut::lookup_efe_temperature(code)
    }

    pub fn ta_temperature_celsius(&self, tile: usize) -> Result<f64> {
        crate::lut::lookup_ta_temperature(self.tiles[tile].ta)
    }
}

/// A closed 64-packet sub-commutation cycle: the ordered fragments observed
/// while it was open, complete iff exactly 64 fragments were collected.
#[derive(Debug, Clone, Default)]
pub struct SubCommCycle {
    pub fragments: Vec<SubCommutated>,
}

impl SubCommCycle {
    pub fn is_complete(&self) -> bool {
        self.fragments.len() == CYCLE_LEN
    }

    fn sub_record_bytes(&self, first_word_index: u8, n_words: usize) -> Option<Vec<u8>> {
        let start = self
            .fragments
            .iter()
            .position(|f| f.word_index == first_word_index)?;
        let end = start + n_words;
        if end > self.fragments.len() {
            return None;
        }
        let slice = &self.fragments[start..end];
        let last_expected = first_word_index as u32 + n_words as u32 - 1;
        if slice.last()?.word_index as u32 != last_expected {
            return None;
        }
        let mut bytes = Vec::with_capacity(n_words * 2);
        for fragment in slice {
            bytes.extend_from_slice(&fragment.word_data);
        }
        Some(bytes)
    }

    /// Decode the three sub-records this cycle carries. Any sub-record
    /// whose word range is missing or misaligned is `None`, with a
    /// corresponding error pushed onto the returned error list.
    pub fn decode(&self) -> DecodedSubComm {
        let mut errors = Vec::new();

        let pvt = match self.sub_record_bytes(
            PvtAncillaryData::FIRST_WORD_INDEX,
            PvtAncillaryData::SIZE_BYTES / 2,
        ) {
            Some(bytes) => PvtAncillaryData::decode(&bytes).ok(),
            None => {
                errors.push(Error::IncompleteCycle {
                    fragments: self.fragments.len(),
                });
                None
            }
        };

        let attitude = match self.sub_record_bytes(
            AttitudeAncillaryData::FIRST_WORD_INDEX,
            AttitudeAncillaryData::SIZE_BYTES / 2,
        ) {
            Some(bytes) => AttitudeAncillaryData::decode(&bytes).ok(),
            None => {
                errors.push(Error::IncompleteCycle {
                    fragments: self.fragments.len(),
                });
                None
            }
        };

        let hk_temperature = match self.sub_record_bytes(
            HkTemperatureAncillaryData::FIRST_WORD_INDEX,
            HkTemperatureAncillaryData::SIZE_BYTES / 2,
        ) {
            Some(bytes) => HkTemperatureAncillaryData::decode(&bytes).ok(),
            None => {
                errors.push(Error::IncompleteCycle {
                    fragments: self.fragments.len(),
                });
                None
            }
        };

        DecodedSubComm {
            pvt,
            attitude,
            hk_temperature,
            errors,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DecodedSubComm {
    pub pvt: Option<PvtAncillaryData>,
    pub attitude: Option<AttitudeAncillaryData>,
    pub hk_temperature: Option<HkTemperatureAncillaryData>,
    pub errors: Vec<Error>,
}

enum State {
    Idle,
    Accumulating {
        cycle: SubCommCycle,
        last_packet_count: usize,
    },
}

/// Streaming sub-commutated data reassembler. One instance per input stream;
/// feed it fragments in packet order, then call [`finalize`] at end of
/// stream to flush any still-open cycle.
///
/// [`finalize`]: SubCommReassembler::finalize
pub struct SubCommReassembler {
    state: State,
    closed_cycles: Vec<SubCommCycle>,
}

impl Default for SubCommReassembler {
    fn default() -> Self {
        Self::new()
    }
}

impl SubCommReassembler {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            closed_cycles: Vec::new(),
        }
    }

    fn close_current(&mut self) {
        if let State::Accumulating { cycle, .. } =
            std::mem::replace(&mut self.state, State::Idle)
        {
            if !cycle.is_complete() {
                warn!(
                    fragments = cycle.fragments.len(),
                    "incomplete sub-commutated data cycle"
                );
            }
            self.closed_cycles.push(cycle);
        }
    }

    /// Feed one packet's sub-commutated fragment into the reassembler.
    pub fn feed(&mut self, packet_count: usize, fragment: SubCommutated) -> Result<()> {
        if fragment.word_index == 0 {
            return Ok(());
        }
        if fragment.word_index as usize > CYCLE_LEN {
            return Err(Error::InvalidIndex {
                index: fragment.word_index as u16,
            });
        }

        let was_idle = matches!(self.state, State::Idle);
        let should_break = match &self.state {
            State::Idle => false,
            State::Accumulating {
                cycle,
                last_packet_count,
            } => {
                let prev_index = cycle
                    .fragments
                    .last()
                    .expect("accumulating cycle always has at least one fragment")
                    .word_index;
                let gap = packet_count.saturating_sub(*last_packet_count);
                fragment.word_index < prev_index || gap > 1
            }
        };

        if should_break {
            self.close_current();
        }

        if was_idle && fragment.word_index != 1 {
            warn!(
                word_index = fragment.word_index,
                "starting an incomplete sub-commutated data cycle"
            );
        }

        match &mut self.state {
            State::Idle => {
                let mut cycle = SubCommCycle::default();
                cycle.fragments.push(fragment);
                self.state = State::Accumulating {
                    cycle,
                    last_packet_count: packet_count,
                };
            }
            State::Accumulating {
                cycle,
                last_packet_count,
            } => {
                cycle.fragments.push(fragment);
                *last_packet_count = packet_count;
            }
        }

        if fragment.word_index as usize == CYCLE_LEN {
            self.close_current();
        }
        Ok(())
    }

    /// Flush any cycle still open at end of stream.
    pub fn finalize(&mut self) {
        self.close_current();
    }

    /// All cycles closed so far (complete and incomplete).
    pub fn cycles(&self) -> &[SubCommCycle] {
        &self.closed_cycles
    }

    /// Consume the reassembler, returning every closed cycle.
    pub fn into_cycles(self) -> Vec<SubCommCycle> {
        self.closed_cycles
    }

    /// Decode every *complete* closed cycle, skipping incomplete ones
    /// (their fragments are still retained in [`cycles`]).
    ///
    /// [`cycles`]: SubCommReassembler::cycles
    pub fn decode_complete_cycles(&self) -> Vec<DecodedSubComm> {
        self.closed_cycles
            .iter()
            .filter(|c| c.is_complete())
            .map(|c| c.decode())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(word_index: u8) -> SubCommutated {
        SubCommutated {
            word_index,
            word_data: [word_index, word_index.wrapping_add(1)],
        }
    }

    #[test]
    fn full_cycle_closes_at_index_64() {
        let mut r = SubCommReassembler::new();
        for i in 1..=64u8 {
            r.feed(i as usize, fragment(i)).unwrap();
        }
        r.finalize();
        assert_eq!(r.cycles().len(), 1);
        assert!(r.cycles()[0].is_complete());
    }

    #[test]
    fn backward_index_closes_and_opens_new_cycle() {
        let mut r = SubCommReassembler::new();
        r.feed(0, fragment(1)).unwrap();
        r.feed(1, fragment(2)).unwrap();
        r.feed(2, fragment(1)).unwrap(); // index went backward
        r.finalize();
        assert_eq!(r.cycles().len(), 2);
        assert!(!r.cycles()[0].is_complete());
    }

    #[test]
    fn packet_gap_closes_cycle() {
        let mut r = SubCommReassembler::new();
        r.feed(0, fragment(1)).unwrap();
        r.feed(1, fragment(2)).unwrap();
        r.feed(5, fragment(3)).unwrap(); // packet_count jumped by 4
        r.finalize();
        assert_eq!(r.cycles().len(), 2);
    }

    #[test]
    fn index_zero_is_a_no_op() {
        let mut r = SubCommReassembler::new();
        r.feed(0, fragment(0)).unwrap();
        r.finalize();
        assert!(r.cycles().is_empty());
    }

    #[test]
    fn index_above_64_is_invalid() {
        let mut r = SubCommReassembler::new();
        assert!(matches!(
            r.feed(0, fragment(65)),
            Err(Error::InvalidIndex { index: 65 })
        ));
    }

    #[test]
    fn complete_cycle_concatenates_to_128_bytes() {
        let mut r = SubCommReassembler::new();
        for i in 1..=64u8 {
            r.feed(i as usize, fragment(i)).unwrap();
        }
        r.finalize();
        let cycle = &r.cycles()[0];
        let total: usize = cycle.fragments.iter().map(|f| f.word_data.len()).sum();
        assert_eq!(total, 128);
    }

    #[test]
    fn pvt_decodes_from_words_1_through_22() {
        let mut bytes = vec![0u8; PvtAncillaryData::SIZE_BYTES];
        bytes[0..8].copy_from_slice(&1.5f64.to_be_bytes());
        let decoded = PvtAncillaryData::decode(&bytes).unwrap();
        assert_eq!(decoded.x, 1.5);
    }
}
