#![cfg_attr(docsrs, feature(doc_cfg))]
//! CCSDS Space Packet (CCSDS 133.0-B-2), ECSS PUS-C (ECSS-E-ST-70-41C), and
//! CFDP PDU (CCSDS 727.0-B-5) en/de-coding.
//!
//! The core is pure and stateless: every pack/unpack call is a synchronous
//! value-to-value transformation over owned buffers. No I/O, scheduling, or
//! shared mutable state lives in this crate beyond the read-only
//! [`config`] snapshot.

pub mod ccsds;
pub mod cfdp;
pub mod config;
pub mod crc;
pub mod ecss;
pub mod error;
pub mod time;

pub use ccsds::{PacketId, PacketSeqCtrl, PacketType, SequenceFlags, SpacePacketHeader};
pub use error::{PacketError, Result};
pub use time::{CdsShortTimestamp, ClockSource};
