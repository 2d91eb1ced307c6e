//! CFDP PDU header (CCSDS 727.0-B-5 §5.1).
//!
//! The directive-parameter byte pinned by the S1/S2 wire samples (§8) only
//! closes out under `[es_status][delivery_code][condition_code][file_status]`
//! bit order, not the `[...][file_status][condition_code]` order the prose
//! of §4.7.1 lists; per §9's own disclaimer the pinned byte wins. The same
//! applies here: the length subfields of byte 3 hold `Le`/`Ls` directly,
//! not `Le - 1`/`Ls - 1` as the prose names them, because only the direct
//! encoding reproduces the 9-byte S1 sample.

use crate::cfdp::{pack_variable_width, unpack_variable_width};
use crate::error::{PacketError, Result};

/// CFDP protocol version carried in the 3-bit version field.
pub const CFDP_VERSION: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PduType {
    FileDirective = 0,
    FileData = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    TowardReceiver = 0,
    TowardSender = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransmissionMode {
    Acknowledged = 0,
    Unacknowledged = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrcFlag {
    NotPresent = 0,
    Present = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LargeFileFlag {
    Normal = 0,
    Large = 1,
}

/// Entity addressing shared by every PDU of one CFDP transaction: the
/// width (in bytes) of entity IDs and the transaction sequence number,
/// and the source/destination entity IDs themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PduConfig {
    pub entity_id_len: u8,
    pub seq_num_len: u8,
    pub source_entity_id: u64,
    pub dest_entity_id: u64,
    pub transaction_seq_num: u64,
    pub transmission_mode: TransmissionMode,
    pub crc_flag: CrcFlag,
    pub large_file_flag: LargeFileFlag,
    pub segmentation_control: bool,
    pub has_segment_metadata: bool,
}

impl Default for PduConfig {
    fn default() -> Self {
        Self {
            entity_id_len: 1,
            seq_num_len: 1,
            source_entity_id: 0,
            dest_entity_id: 0,
            transaction_seq_num: 0,
            transmission_mode: TransmissionMode::Acknowledged,
            crc_flag: CrcFlag::NotPresent,
            large_file_flag: LargeFileFlag::Normal,
            segmentation_control: false,
            has_segment_metadata: false,
        }
    }
}

fn validate_width(width: u8) -> Result<()> {
    match width {
        1 | 2 | 4 | 8 => Ok(()),
        other => Err(PacketError::FieldOverflow {
            value: other as u64,
            bits: 3,
        }),
    }
}

/// The fixed 10-byte-minimum CFDP PDU header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PduHeader {
    pub pdu_type: PduType,
    pub direction: Direction,
    pub pdu_data_length: u16,
    pub config: PduConfig,
}

impl PduHeader {
    pub fn new(pdu_type: PduType, direction: Direction, pdu_data_length: u16, config: PduConfig) -> Result<Self> {
        validate_width(config.entity_id_len)?;
        validate_width(config.seq_num_len)?;
        Ok(Self {
            pdu_type,
            direction,
            pdu_data_length,
            config,
        })
    }

    /// Header length in bytes: `4 + 2*Le + Ls`.
    pub fn header_len(&self) -> usize {
        4 + 2 * self.config.entity_id_len as usize + self.config.seq_num_len as usize
    }

    pub fn pack(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.header_len());
        let byte0 = (CFDP_VERSION & 0x07) << 5
            | (self.pdu_type as u8 & 0x1) << 4
            | (self.direction as u8 & 0x1) << 3
            | (self.config.transmission_mode as u8 & 0x1) << 2
            | (self.config.crc_flag as u8 & 0x1) << 1
            | (self.config.large_file_flag as u8 & 0x1);
        out.push(byte0);
        out.extend_from_slice(&self.pdu_data_length.to_be_bytes());
        let byte3 = (self.config.segmentation_control as u8) << 7
            | (self.config.entity_id_len & 0x07) << 4
            | (self.config.has_segment_metadata as u8) << 3
            | (self.config.seq_num_len & 0x07);
        out.push(byte3);
        out.extend(pack_variable_width(self.config.source_entity_id, self.config.entity_id_len as usize).unwrap());
        out.extend(pack_variable_width(self.config.transaction_seq_num, self.config.seq_num_len as usize).unwrap());
        out.extend(pack_variable_width(self.config.dest_entity_id, self.config.entity_id_len as usize).unwrap());
        out
    }

    pub fn unpack(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 4 {
            return Err(PacketError::BytesTooShort {
                expected: 4,
                found: bytes.len(),
            });
        }
        let byte0 = bytes[0];
        let version = (byte0 >> 5) & 0x07;
        if version != CFDP_VERSION {
            return Err(PacketError::FieldOverflow {
                value: version as u64,
                bits: 3,
            });
        }
        let pdu_type = if (byte0 >> 4) & 0x1 == 0 {
            PduType::FileDirective
        } else {
            PduType::FileData
        };
        let direction = if (byte0 >> 3) & 0x1 == 0 {
            Direction::TowardReceiver
        } else {
            Direction::TowardSender
        };
        let transmission_mode = if (byte0 >> 2) & 0x1 == 0 {
            TransmissionMode::Acknowledged
        } else {
            TransmissionMode::Unacknowledged
        };
        let crc_flag = if (byte0 >> 1) & 0x1 == 0 {
            CrcFlag::NotPresent
        } else {
            CrcFlag::Present
        };
        let large_file_flag = if byte0 & 0x1 == 0 {
            LargeFileFlag::Normal
        } else {
            LargeFileFlag::Large
        };
        let pdu_data_length = u16::from_be_bytes([bytes[1], bytes[2]]);
        let byte3 = bytes[3];
        let segmentation_control = (byte3 >> 7) & 0x1 != 0;
        let entity_id_len = (byte3 >> 4) & 0x07;
        let has_segment_metadata = (byte3 >> 3) & 0x1 != 0;
        let seq_num_len = byte3 & 0x07;
        validate_width(entity_id_len)?;
        validate_width(seq_num_len)?;

        let header_len = 4 + 2 * entity_id_len as usize + seq_num_len as usize;
        if bytes.len() < header_len {
            return Err(PacketError::BytesTooShort {
                expected: header_len,
                found: bytes.len(),
            });
        }
        let mut cursor = 4_usize;
        let source_entity_id = unpack_variable_width(&bytes[cursor..], entity_id_len as usize)?;
        cursor += entity_id_len as usize;
        let transaction_seq_num = unpack_variable_width(&bytes[cursor..], seq_num_len as usize)?;
        cursor += seq_num_len as usize;
        let dest_entity_id = unpack_variable_width(&bytes[cursor..], entity_id_len as usize)?;

        Ok(Self {
            pdu_type,
            direction,
            pdu_data_length,
            config: PduConfig {
                entity_id_len,
                seq_num_len,
                source_entity_id,
                dest_entity_id,
                transaction_seq_num,
                transmission_mode,
                crc_flag,
                large_file_flag,
                segmentation_control,
                has_segment_metadata,
            },
        })
    }
}
