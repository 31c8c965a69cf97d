//! User Data Field sample decoder (S1-IF-ASD-PL-0007 §4.4).
//!
//! The UDF carries `N_q` complex radar samples across four channels, `Ie,
//! Io, Qe, Qo`, in one of four compression formats selected by `(baq_mode,
//! test_mode)`. Bypass (A/B) is a flat 10-bit sign-and-magnitude code per
//! sample; BAQ (C) and FDBAQ (D) are block-adaptive quantizers, 128 samples
//! per block, reconstructed through a per-block lookup table keyed by a
//! threshold index (and, for FDBAQ, a per-block Huffman code rate). Qe
//! carries the per-block THIDX header in both C and D; in D, Ie additionally
//! carries the per-block BRC (Huffman table selector), shared by all four
//! channels of that block.

use num_complex::Complex32;

use crate::bitreader::BitReader;
use crate::error::{Error, Result};
use crate::header::{EBaqMode, ETestMode};
use crate::huffman;
use crate::lut;

const BLOCK_SAMPLES: u32 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DataFormat {
    A,
    B,
    C,
    D,
}

fn data_format(baq_mode: EBaqMode, test_mode: ETestMode) -> Option<DataFormat> {
    use EBaqMode::*;
    use ETestMode::*;
    match (baq_mode, test_mode) {
        (Bypass, Bypass | ContingencyRxmFullyBypassed) => Some(DataFormat::A),
        (Bypass, Default | Oper | ContingencyRxmFullyOperational) => Some(DataFormat::B),
        (Baq3 | Baq4 | Baq5, Default | Oper | ContingencyRxmFullyOperational) => {
            Some(DataFormat::C)
        }
        (Fdbaq0 | Fdbaq1 | Fdbaq2, Default | Oper | ContingencyRxmFullyOperational) => {
            Some(DataFormat::D)
        }
        _ => None,
    }
}

fn n_words_for_bits(bits: u32) -> u32 {
    (bits + 15) / 16
}

fn block_count(number_of_quads: u32) -> u32 {
    (number_of_quads + BLOCK_SAMPLES - 1) / BLOCK_SAMPLES
}

fn samples_in_block(block: u32, n_blocks: u32, number_of_quads: u32) -> u32 {
    if block + 1 < n_blocks {
        BLOCK_SAMPLES
    } else {
        number_of_quads - BLOCK_SAMPLES * (n_blocks - 1)
    }
}

/// Pad the reader forward to `total_bits` counted from `start`, the
/// channel's word-aligned region boundary.
fn pad_to(r: &mut BitReader, start: usize, total_bits: usize) -> Result<()> {
    let consumed = r.bit_pos() - start;
    r.skip(total_bits.saturating_sub(consumed))
}

/// Interleave four per-channel sample arrays into `2*N_q` complex samples,
/// per §4.4.1: `out[2k] = (Ie[k], Qe[k])`, `out[2k+1] = (Io[k], Qo[k])`.
fn interleave(ie: &[f32], io: &[f32], qe: &[f32], qo: &[f32]) -> Vec<Complex32> {
    let nq = ie.len();
    let mut out = Vec::with_capacity(2 * nq);
    for k in 0..nq {
        out.push(Complex32::new(ie[k], qe[k]));
        out.push(Complex32::new(io[k], qo[k]));
    }
    out
}

// ---------------------------------------------------------------------
// Format A/B: bypass
// ---------------------------------------------------------------------

/// Decode one bypass channel: `N_q` 10-bit sign-and-magnitude samples, the
/// channel padded up to a 16-bit word boundary.
fn bypass_channel(r: &mut BitReader, number_of_quads: u32) -> Result<Vec<f32>> {
    let total_bits = (n_words_for_bits(10 * number_of_quads) * 16) as usize;
    let start = r.bit_pos();
    let mut samples = Vec::with_capacity(number_of_quads as usize);
    for _ in 0..number_of_quads {
        samples.push(r.read_sign_magnitude(10)? as f32);
    }
    pad_to(r, start, total_bits)?;
    Ok(samples)
}

fn decode_bypass(data: &[u8], number_of_quads: u32) -> Result<Vec<Complex32>> {
    let mut r = BitReader::new(data);
    let ie = bypass_channel(&mut r, number_of_quads)?;
    let io = bypass_channel(&mut r, number_of_quads)?;
    let qe = bypass_channel(&mut r, number_of_quads)?;
    let qo = bypass_channel(&mut r, number_of_quads)?;
    Ok(interleave(&ie, &io, &qe, &qo))
}

// ---------------------------------------------------------------------
// Format C: BAQ
// ---------------------------------------------------------------------

/// Raw `k`-bit unsigned codes for one plain (headerless) BAQ channel, plus
/// the channel's word-aligned byte region.
fn baq_read_codes(r: &mut BitReader, k: u8, number_of_quads: u32) -> Result<Vec<u8>> {
    let total_bits = (n_words_for_bits(k as u32 * number_of_quads) * 16) as usize;
    let start = r.bit_pos();
    let mut codes = Vec::with_capacity(number_of_quads as usize);
    for _ in 0..number_of_quads {
        codes.push(r.read_u8(k as u32)?);
    }
    pad_to(r, start, total_bits)?;
    Ok(codes)
}

/// Qe carries one 8-bit THIDX header per block ahead of that block's
/// `k`-bit codes.
fn baq_read_qe(
    r: &mut BitReader,
    k: u8,
    number_of_quads: u32,
    n_blocks: u32,
) -> Result<(Vec<u8>, Vec<u8>)> {
    let total_bits = (n_words_for_bits(k as u32 * number_of_quads + 8 * n_blocks) * 16) as usize;
    let start = r.bit_pos();
    let mut codes = Vec::with_capacity(number_of_quads as usize);
    let mut thidx = Vec::with_capacity(n_blocks as usize);
    let mut remaining = number_of_quads;
    for b in 0..n_blocks {
        let n = samples_in_block(b, n_blocks, number_of_quads).min(remaining);
        thidx.push(r.read_u8(8)?);
        for _ in 0..n {
            codes.push(r.read_u8(k as u32)?);
        }
        remaining -= n;
    }
    pad_to(r, start, total_bits)?;
    Ok((codes, thidx))
}

/// Reconstruct a channel's codes against the per-block THIDX lookup tables.
fn baq_reconstruct(codes: &[u8], k: u8, n_blocks: u32, number_of_quads: u32, thidx: &[u8]) -> Result<Vec<f32>> {
    let mut out = Vec::with_capacity(codes.len());
    let mut remaining = number_of_quads;
    let mut pos = 0usize;
    for b in 0..n_blocks {
        let n = samples_in_block(b, n_blocks, number_of_quads).min(remaining) as usize;
        let lut = lut::baq_lut(k, thidx[b as usize])?;
        for &code in &codes[pos..pos + n] {
            out.push(*lut.get(code as usize).ok_or(Error::LutLookup {
                table: "baq_lut",
                index: code as usize,
            })?);
        }
        pos += n;
        remaining -= n as u32;
    }
    Ok(out)
}

fn decode_baq(data: &[u8], number_of_quads: u32, k: u8) -> Result<Vec<Complex32>> {
    let n_blocks = block_count(number_of_quads);
    let mut r = BitReader::new(data);
    let ie_codes = baq_read_codes(&mut r, k, number_of_quads)?;
    let io_codes = baq_read_codes(&mut r, k, number_of_quads)?;
    let (qe_codes, thidx) = baq_read_qe(&mut r, k, number_of_quads, n_blocks)?;
    let qo_codes = baq_read_codes(&mut r, k, number_of_quads)?;

    let ie = baq_reconstruct(&ie_codes, k, n_blocks, number_of_quads, &thidx)?;
    let io = baq_reconstruct(&io_codes, k, n_blocks, number_of_quads, &thidx)?;
    let qe = baq_reconstruct(&qe_codes, k, n_blocks, number_of_quads, &thidx)?;
    let qo = baq_reconstruct(&qo_codes, k, n_blocks, number_of_quads, &thidx)?;
    Ok(interleave(&ie, &io, &qe, &qo))
}

// ---------------------------------------------------------------------
// Format D: FDBAQ
// ---------------------------------------------------------------------

/// A decoded Huffman code, not yet reconstructed: `negative`/`magnitude`
/// as returned by the Huffman decoder, with `magnitude` doubling as the
/// positive-half LUT index.
#[derive(Debug, Clone, Copy)]
struct RawCode {
    negative: bool,
    magnitude: u8,
}

impl RawCode {
    fn lut_index(self, n: u32) -> usize {
        if self.negative {
            n as usize + self.magnitude as usize
        } else {
            self.magnitude as usize
        }
    }
}

/// Ie carries one 3-bit BRC header per block ahead of that block's
/// Huffman-coded codes.
fn fdbaq_read_ie(
    r: &mut BitReader,
    number_of_quads: u32,
    n_blocks: u32,
) -> Result<(Vec<RawCode>, Vec<u8>)> {
    let start = r.bit_pos();
    let mut codes = Vec::with_capacity(number_of_quads as usize);
    let mut brc = Vec::with_capacity(n_blocks as usize);
    let mut remaining = number_of_quads;
    for b in 0..n_blocks {
        let n = samples_in_block(b, n_blocks, number_of_quads).min(remaining);
        let block_brc = r.read_u8(3)?;
        brc.push(block_brc);
        for _ in 0..n {
            let d = huffman::decode(block_brc, r)?;
            codes.push(RawCode {
                negative: d.negative,
                magnitude: d.magnitude,
            });
        }
        remaining -= n;
    }
    let consumed = r.bit_pos() - start;
    r.skip((16 - consumed % 16) % 16)?;
    Ok((codes, brc))
}

/// Io/Qo: headerless, Huffman-coded against the BRC sequence Ie already
/// established.
fn fdbaq_read_plain(
    r: &mut BitReader,
    number_of_quads: u32,
    n_blocks: u32,
    brc: &[u8],
) -> Result<Vec<RawCode>> {
    let start = r.bit_pos();
    let mut codes = Vec::with_capacity(number_of_quads as usize);
    let mut remaining = number_of_quads;
    for b in 0..n_blocks {
        let n = samples_in_block(b, n_blocks, number_of_quads).min(remaining);
        for _ in 0..n {
            let d = huffman::decode(brc[b as usize], r)?;
            codes.push(RawCode {
                negative: d.negative,
                magnitude: d.magnitude,
            });
        }
        remaining -= n;
    }
    let consumed = r.bit_pos() - start;
    r.skip((16 - consumed % 16) % 16)?;
    Ok(codes)
}

/// Qe: one 8-bit THIDX header per block, then Huffman-coded codes against
/// Ie's BRC sequence.
fn fdbaq_read_qe(
    r: &mut BitReader,
    number_of_quads: u32,
    n_blocks: u32,
    brc: &[u8],
) -> Result<(Vec<RawCode>, Vec<u8>)> {
    let start = r.bit_pos();
    let mut codes = Vec::with_capacity(number_of_quads as usize);
    let mut thidx = Vec::with_capacity(n_blocks as usize);
    let mut remaining = number_of_quads;
    for b in 0..n_blocks {
        let n = samples_in_block(b, n_blocks, number_of_quads).min(remaining);
        thidx.push(r.read_u8(8)?);
        for _ in 0..n {
            let d = huffman::decode(brc[b as usize], r)?;
            codes.push(RawCode {
                negative: d.negative,
                magnitude: d.magnitude,
            });
        }
        remaining -= n;
    }
    let consumed = r.bit_pos() - start;
    r.skip((16 - consumed % 16) % 16)?;
    Ok((codes, thidx))
}

fn fdbaq_reconstruct(
    codes: &[RawCode],
    n_blocks: u32,
    number_of_quads: u32,
    brc: &[u8],
    thidx: &[u8],
) -> Result<Vec<f32>> {
    let mut out = Vec::with_capacity(codes.len());
    let mut remaining = number_of_quads;
    let mut pos = 0usize;
    for b in 0..n_blocks {
        let n = samples_in_block(b, n_blocks, number_of_quads).min(remaining) as usize;
        let block_brc = brc[b as usize];
        let n_levels = lut::reconstruction::brc_size(block_brc).ok_or(Error::LutLookup {
            table: "BRC_SIZE",
            index: block_brc as usize,
        })?;
        let lut = lut::fdbaq_lut(block_brc, thidx[b as usize])?;
        for &code in &codes[pos..pos + n] {
            let idx = code.lut_index(n_levels);
            out.push(*lut.get(idx).ok_or(Error::LutLookup {
                table: "fdbaq_lut",
                index: idx,
            })?);
        }
        pos += n;
        remaining -= n as u32;
    }
    Ok(out)
}

fn decode_fdbaq(data: &[u8], number_of_quads: u32) -> Result<Vec<Complex32>> {
    let n_blocks = block_count(number_of_quads);
    let mut r = BitReader::new(data);
    let (ie_codes, brc) = fdbaq_read_ie(&mut r, number_of_quads, n_blocks)?;
    let io_codes = fdbaq_read_plain(&mut r, number_of_quads, n_blocks, &brc)?;
    let (qe_codes, thidx) = fdbaq_read_qe(&mut r, number_of_quads, n_blocks, &brc)?;
    let qo_codes = fdbaq_read_plain(&mut r, number_of_quads, n_blocks, &brc)?;

    // Pad the overall UDF to a multiple of 4 bytes (§4.4.3); ignored if the
    // caller already trimmed the slice to the packet's declared UDF length.
    let consumed = r.bit_pos();
    let _ = r.skip((32 - consumed % 32) % 32);

    let ie = fdbaq_reconstruct(&ie_codes, n_blocks, number_of_quads, &brc, &thidx)?;
    let io = fdbaq_reconstruct(&io_codes, n_blocks, number_of_quads, &brc, &thidx)?;
    let qe = fdbaq_reconstruct(&qe_codes, n_blocks, number_of_quads, &brc, &thidx)?;
    let qo = fdbaq_reconstruct(&qo_codes, n_blocks, number_of_quads, &brc, &thidx)?;
    Ok(interleave(&ie, &io, &qe, &qo))
}

// ---------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------

/// Decode a packet's User Data Field into `2*number_of_quads` complex
/// samples, dispatching on `(baq_mode, test_mode)` per §4.4.
pub fn decode_udf(
    data: &[u8],
    number_of_quads: u16,
    baq_mode: EBaqMode,
    test_mode: ETestMode,
    packet_index: usize,
) -> Result<Vec<Complex32>> {
    let nq = number_of_quads as u32;
    match data_format(baq_mode, test_mode) {
        Some(DataFormat::A) | Some(DataFormat::B) => decode_bypass(data, nq),
        Some(DataFormat::C) => {
            let k = baq_mode.baq_bits().expect("format C implies a BAQ mode");
            decode_baq(data, nq, k)
        }
        Some(DataFormat::D) => decode_fdbaq(data, nq),
        None => Err(Error::InvalidFormat {
            packet_index,
            baq_mode: baq_mode.raw_value(),
            test_mode: test_mode.raw_value(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn bits_to_bytes(bits: &str) -> Vec<u8> {
        let mut padded = bits.to_string();
        while padded.len() % 8 != 0 {
            padded.push('0');
        }
        padded
            .as_bytes()
            .chunks(8)
            .map(|chunk| u8::from_str_radix(std::str::from_utf8(chunk).unwrap(), 2).unwrap())
            .collect()
    }

    #[test]
    fn format_dispatch_matches_table() {
        assert_eq!(
            data_format(EBaqMode::Bypass, ETestMode::Bypass),
            Some(DataFormat::A)
        );
        assert_eq!(
            data_format(EBaqMode::Bypass, ETestMode::ContingencyRxmFullyBypassed),
            Some(DataFormat::A)
        );
        assert_eq!(
            data_format(EBaqMode::Bypass, ETestMode::Default),
            Some(DataFormat::B)
        );
        assert_eq!(
            data_format(EBaqMode::Baq4, ETestMode::Oper),
            Some(DataFormat::C)
        );
        assert_eq!(
            data_format(EBaqMode::Fdbaq1, ETestMode::Default),
            Some(DataFormat::D)
        );
        assert_eq!(
            data_format(EBaqMode::Baq4, ETestMode::ContingencyRxmFullyBypassed),
            None
        );
    }

    #[test]
    fn bypass_roundtrip_one_quad() {
        // One quad (nq=1): 4 channels * 10 bits, each channel padded to a
        // 16-bit word, so 4 words = 8 bytes total.
        // Ie = +5, Io = -3, Qe = +1, Qo = -2, each sign-and-magnitude 10-bit.
        fn sm(neg: bool, mag: u16) -> String {
            format!("{}{:09b}", if neg { 1 } else { 0 }, mag)
        }
        let mut bits = String::new();
        bits.push_str(&sm(false, 5));
        bits.push_str("000000"); // pad to 16 bits
        bits.push_str(&sm(true, 3));
        bits.push_str("000000");
        bits.push_str(&sm(false, 1));
        bits.push_str("000000");
        bits.push_str(&sm(true, 2));
        bits.push_str("000000");
        let data = bits_to_bytes(&bits);
        assert_eq!(data.len(), 8);

        let out = decode_udf(&data, 1, EBaqMode::Bypass, ETestMode::Bypass, 0).unwrap();
        assert_eq!(out.len(), 2);
        assert_relative_eq!(out[0].re, 5.0);
        assert_relative_eq!(out[0].im, 1.0);
        assert_relative_eq!(out[1].re, -3.0);
        assert_relative_eq!(out[1].im, -2.0);
    }

    #[test]
    fn invalid_combination_is_invalid_format() {
        let data = vec![0u8; 32];
        let err = decode_udf(
            &data,
            1,
            EBaqMode::Baq4,
            ETestMode::ContingencyRxmFullyBypassed,
            9,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidFormat {
                packet_index: 9,
                baq_mode: 4,
                test_mode: 5,
            }
        ));
    }

    #[test]
    fn baq_single_block_all_zero_codes_reconstruct_to_zero() {
        // nq=4, k=3: Ie/Io/Qo each ceil(3*4/16)=1 word; Qe ceil(3*4+8*1 /16)=2
        // words. All codes zero, THIDX=0 selects simple reconstruction
        // (0 < 2^(k-1)=4), so code 0 reconstructs to 0.0.
        let mut data = Vec::new();
        data.extend_from_slice(&[0u8; 2]); // Ie
        data.extend_from_slice(&[0u8; 2]); // Io
        data.extend_from_slice(&[0u8; 4]); // Qe: THIDX byte + 3 codes + pad
        data.extend_from_slice(&[0u8; 2]); // Qo

        let out = decode_udf(&data, 4, EBaqMode::Baq3, ETestMode::Default, 0).unwrap();
        assert_eq!(out.len(), 8);
        for s in &out {
            assert_relative_eq!(s.re, 0.0);
            assert_relative_eq!(s.im, 0.0);
        }
    }

    #[test]
    fn fdbaq_single_block_brc0_zero_codes() {
        // nq=2: every header (BRC, THIDX) and every Huffman code is bit
        // pattern zero. BRC0's "00" is (+0), and (brc=0, thidx=0) reconstructs
        // code 0 to 0.0 (simple reconstruction), so an all-zero buffer
        // round-trips to all-zero samples regardless of the 16-bit per-
        // channel padding boundaries.
        //
        // Layout: Ie = 3-bit BRC + 2*2-bit codes (7 bits, padded to 16);
        // Io = 2*2-bit codes (4 bits, padded to 16); Qe = 8-bit THIDX +
        // 2*2-bit codes (12 bits, padded to 16); Qo = 2*2-bit codes (padded
        // to 16). Total 64 bits = 8 bytes, already a multiple of 4.
        let data = vec![0u8; 8];

        let out = decode_udf(&data, 2, EBaqMode::Fdbaq0, ETestMode::Default, 0).unwrap();
        assert_eq!(out.len(), 4);
        for s in &out {
            assert_relative_eq!(s.re, 0.0);
            assert_relative_eq!(s.im, 0.0);
        }
    }
}
