//! The decoding error taxonomy.
//!
//! Every fallible operation in this crate returns one of these variants.
//! Header-level errors carry the packet index at which they occurred so a
//! caller iterating a stream can report exactly where decoding broke down.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("truncated input: needed {needed} more bit(s) at bit offset {offset}")]
    Truncated { offset: usize, needed: usize },

    #[error("bad sync marker in packet {packet_index}: expected 0x352EF853, got {found:#010x}")]
    SyncMarker { packet_index: usize, found: u32 },

    #[error("header consistency violation in packet {packet_index}: {detail}")]
    HeaderConsistency { packet_index: usize, detail: String },

    #[error("invalid enum value {value} for {field} in packet {packet_index}")]
    InvalidEnum {
        packet_index: usize,
        field: &'static str,
        value: u64,
    },

    #[error("sub-commutated word index {index} out of range (0..=64)")]
    InvalidIndex { index: u16 },

    #[error("sub-commutated data word had {len} byte(s), expected 2")]
    BadFragmentSize { len: usize },

    #[error("sub-commutated cycle finalized with {fragments} fragment(s), expected 64")]
    IncompleteCycle { fragments: usize },

    #[error("no UDF format tabulated for (baq_mode={baq_mode:?}, test_mode={test_mode:?}) in packet {packet_index}")]
    InvalidFormat {
        packet_index: usize,
        baq_mode: u8,
        test_mode: u8,
    },

    #[error("huffman decoding ran off the end of the block after consuming {bits_consumed} bit(s)")]
    InvalidHuffman { bits_consumed: usize },

    #[error("lookup table index {index} out of range for {table}")]
    LutLookup { table: &'static str, index: usize },
}
