//! CCSDS Space Packet Protocol primary header (CCSDS 133.0-B-2).

use byteorder::{BigEndian, ReadBytesExt};
use std::io::Read;

use crate::error::{PacketError, Result};

/// Wire size of [`SpacePacketHeader`] in bytes.
pub const SPACE_PACKET_HEADER_SIZE: usize = 6;

/// Maximum legal value of [`SpacePacketHeader::apid`] (11 bits).
pub const MAX_APID: u16 = 0x7FF;
/// Maximum legal value of [`SpacePacketHeader::seq_count`] (14 bits).
pub const MAX_SEQ_COUNT: u16 = 0x3FFF;

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// Distinguishes telemetry from telecommand packets.
pub enum PacketType {
    /// A telemetry packet (downlink).
    Tm = 0,
    /// A telecommand packet (uplink).
    Tc = 1,
}

impl PacketType {
    pub fn from_bit(bit: u8) -> Self {
        match bit & 0x1 {
            0 => Self::Tm,
            _ => Self::Tc,
        }
    }
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// Sequence flags, identifying the packet's position within a segmented
/// group of source packets.
pub enum SequenceFlags {
    Continuation = 0b00,
    First = 0b01,
    Last = 0b10,
    Unsegmented = 0b11,
}

impl SequenceFlags {
    pub fn from_2bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Self::Continuation,
            0b01 => Self::First,
            0b10 => Self::Last,
            _ => Self::Unsegmented,
        }
    }
}

/// The first two bytes of a [`SpacePacketHeader`], viewed as a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PacketId {
    pub packet_version: u8,
    pub packet_type: PacketType,
    pub sec_header_flag: bool,
    pub apid: u16,
}

impl PacketId {
    pub fn raw(&self) -> u16 {
        u16::from(self.packet_version & 0x7) << 13
            | u16::from(self.packet_type as u8 & 0x1) << 12
            | u16::from(self.sec_header_flag) << 11
            | (self.apid & MAX_APID)
    }

    pub fn from_raw(raw: u16) -> Self {
        Self {
            packet_version: ((raw >> 13) & 0x7) as u8,
            packet_type: PacketType::from_bit(((raw >> 12) & 0x1) as u8),
            sec_header_flag: (raw >> 11) & 0x1 != 0,
            apid: raw & MAX_APID,
        }
    }

    pub fn pack(&self) -> [u8; 2] {
        self.raw().to_be_bytes()
    }
}

/// Bytes 3-4 of a [`SpacePacketHeader`], viewed as a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PacketSeqCtrl {
    pub seq_flags: SequenceFlags,
    pub seq_count: u16,
}

impl PacketSeqCtrl {
    pub fn raw(&self) -> u16 {
        (self.seq_flags as u16) << 14 | (self.seq_count & MAX_SEQ_COUNT)
    }

    pub fn from_raw(raw: u16) -> Self {
        Self {
            seq_flags: SequenceFlags::from_2bits((raw >> 14) as u8),
            seq_count: raw & MAX_SEQ_COUNT,
        }
    }

    pub fn pack(&self) -> [u8; 2] {
        self.raw().to_be_bytes()
    }
}

/// The 6-byte CCSDS Space Packet primary header.
///
/// `data_length` is always the on-wire "packet data field length minus one",
/// per CCSDS 133.0-B-2; [`Self::total_packet_len`] converts back to the
/// physical size of header + data field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpacePacketHeader {
    pub packet_id: PacketId,
    pub packet_seq_ctrl: PacketSeqCtrl,
    pub data_length: u16,
}

impl SpacePacketHeader {
    pub fn new(
        packet_version: u8,
        packet_type: PacketType,
        sec_header_flag: bool,
        apid: u16,
        seq_flags: SequenceFlags,
        seq_count: u16,
        data_length: u16,
    ) -> Result<Self> {
        if apid > MAX_APID {
            return Err(PacketError::FieldOverflow {
                value: apid as u64,
                bits: 11,
            });
        }
        if seq_count > MAX_SEQ_COUNT {
            return Err(PacketError::FieldOverflow {
                value: seq_count as u64,
                bits: 14,
            });
        }
        Ok(Self {
            packet_id: PacketId {
                packet_version,
                packet_type,
                sec_header_flag,
                apid,
            },
            packet_seq_ctrl: PacketSeqCtrl {
                seq_flags,
                seq_count,
            },
            data_length,
        })
    }

    /// Total physical size of header + data field once packed.
    pub fn total_packet_len(&self) -> usize {
        self.data_length as usize + SPACE_PACKET_HEADER_SIZE + 1
    }

    pub fn pack(&self) -> [u8; SPACE_PACKET_HEADER_SIZE] {
        let mut out = [0_u8; SPACE_PACKET_HEADER_SIZE];
        out[0..2].copy_from_slice(&self.packet_id.pack());
        out[2..4].copy_from_slice(&self.packet_seq_ctrl.pack());
        out[4..6].copy_from_slice(&self.data_length.to_be_bytes());
        out
    }

    pub fn unpack<R: Read>(buffer: &mut R) -> Result<Self> {
        let packet_id = buffer
            .read_u16::<BigEndian>()
            .map_err(|_| PacketError::BytesTooShort {
                expected: SPACE_PACKET_HEADER_SIZE,
                found: 0,
            })?;
        let packet_seq_ctrl =
            buffer
                .read_u16::<BigEndian>()
                .map_err(|_| PacketError::BytesTooShort {
                    expected: SPACE_PACKET_HEADER_SIZE,
                    found: 2,
                })?;
        let data_length =
            buffer
                .read_u16::<BigEndian>()
                .map_err(|_| PacketError::BytesTooShort {
                    expected: SPACE_PACKET_HEADER_SIZE,
                    found: 4,
                })?;
        Ok(Self {
            packet_id: PacketId::from_raw(packet_id),
            packet_seq_ctrl: PacketSeqCtrl::from_raw(packet_seq_ctrl),
            data_length,
        })
    }

    /// Decode straight from a byte slice, checking its length up front
    /// rather than relying on `Read::read_exact`'s generic I/O error.
    pub fn unpack_from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < SPACE_PACKET_HEADER_SIZE {
            return Err(PacketError::BytesTooShort {
                expected: SPACE_PACKET_HEADER_SIZE,
                found: bytes.len(),
            });
        }
        Self::unpack(&mut &bytes[..SPACE_PACKET_HEADER_SIZE])
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(
        SequenceFlags::Continuation,
        true,
        PacketType::Tc
    )]
    #[case(SequenceFlags::First, false, PacketType::Tm)]
    #[case(SequenceFlags::Unsegmented, true, PacketType::Tm)]
    fn header_roundtrip(
        #[case] seq_flags: SequenceFlags,
        #[case] sec_header_flag: bool,
        #[case] packet_type: PacketType,
    ) {
        let expected = SpacePacketHeader::new(
            0,
            packet_type,
            sec_header_flag,
            0x7FE,
            seq_flags,
            0x3FFD,
            0x0014,
        )
        .unwrap();

        let buffer = expected.pack();
        let recovered = SpacePacketHeader::unpack(&mut buffer.as_slice()).unwrap();
        assert_eq!(expected, recovered);
    }

    #[test]
    fn total_packet_len_invariant() {
        let header =
            SpacePacketHeader::new(0, PacketType::Tm, true, 1, SequenceFlags::Unsegmented, 1, 19)
                .unwrap();
        assert_eq!(header.total_packet_len(), header.data_length as usize + 7);
    }

    #[test]
    fn apid_overflow_rejected() {
        let err = SpacePacketHeader::new(
            0,
            PacketType::Tm,
            false,
            0x800,
            SequenceFlags::Unsegmented,
            0,
            0,
        )
        .unwrap_err();
        assert!(matches!(err, PacketError::FieldOverflow { bits: 11, .. }));
    }

    #[test]
    fn seq_count_overflow_rejected() {
        let err = SpacePacketHeader::new(
            0,
            PacketType::Tm,
            false,
            0,
            SequenceFlags::Unsegmented,
            0x4000,
            0,
        )
        .unwrap_err();
        assert!(matches!(err, PacketError::FieldOverflow { bits: 14, .. }));
    }

    #[test]
    fn unpack_too_short() {
        let buf = [0_u8; 5];
        assert!(matches!(
            SpacePacketHeader::unpack_from_bytes(&buf),
            Err(PacketError::BytesTooShort { expected: 6, found: 5 })
        ));
    }
}
