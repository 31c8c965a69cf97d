//! Decoder for Sentinel-1 SAR Instrument Source Packets (ISP), as specified
//! by "Sentinel-1 SAR Space Packet Protocol Data Unit" (S1-IF-ASD-PL-0007).
//!
//! The crate decodes the CCSDS-style primary/secondary header pair found at
//! the front of every packet, reassembles the sub-commutated ancillary data
//! (PVT, attitude, housekeeping temperatures) scattered one 16-bit word per
//! packet across 64-packet cycles, and decompresses the per-packet complex
//! radar samples carried in the User Data Field (bypass, BAQ, FDBAQ).

pub mod bitreader;
pub mod driver;
pub mod error;
pub mod header;
pub mod huffman;
pub mod lut;
pub mod platform;
pub mod subcomm;
pub mod udf;

pub mod prelude {
    pub use crate::driver::{
        decode_packets_parallel, DecodedDataItem, DriverError, DriverOptions, DriverResult,
        ErrorPolicy, StreamDriver, UdfMode, UdfPayload,
    };
    pub use crate::error::{Error, Result};
    pub use crate::header::{
        Counters, Datation, FixedAncillary, PrimaryHeader, RadarConfigurationSupport,
        RadarSampleCount, SasData, SecondaryHeader, SesData, SubCommutated,
    };
    pub use crate::platform::{CalTypeDialect, ECalType, Platform};
    pub use crate::subcomm::{
        AttitudeAncillaryData, DecodedSubComm, HkTemperatureAncillaryData, PvtAncillaryData,
        SubCommCycle, SubCommReassembler,
    };
    pub use crate::udf::decode_udf;
}
