//! PUS Telecommand (TC) packets: a [`crate::ccsds::SpacePacketHeader`] plus
//! a PUS-C secondary header, application data, and a trailing CRC-16.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::ccsds::{PacketType, SequenceFlags, SpacePacketHeader, SPACE_PACKET_HEADER_SIZE};
use crate::config;
use crate::crc::crc16;
use crate::ecss::PusVersion;
use crate::error::{PacketError, Result};

/// Wire size of [`PusTcSecondaryHeader`]: `[version:4][ack:4]`, `service`,
/// `subservice`, `source_id:16 BE`.
pub const PUS_TC_SECONDARY_HEADER_SIZE: usize = 5;
const CRC_SIZE: usize = 2;

/// Acknowledgement flags requested of the four PUS verification stages
/// (Service 1), packed into the low nibble of the secondary header's first
/// byte: acceptance, start, progress, completion, from high bit to low.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckFlags {
    pub acceptance: bool,
    pub start: bool,
    pub progress: bool,
    pub completion: bool,
}

impl AckFlags {
    pub const NONE: Self = Self {
        acceptance: false,
        start: false,
        progress: false,
        completion: false,
    };

    pub const ALL: Self = Self {
        acceptance: true,
        start: true,
        progress: true,
        completion: true,
    };

    fn nibble(self) -> u8 {
        (self.acceptance as u8) << 3
            | (self.start as u8) << 2
            | (self.progress as u8) << 1
            | (self.completion as u8)
    }

    fn from_nibble(nibble: u8) -> Self {
        Self {
            acceptance: nibble & 0b1000 != 0,
            start: nibble & 0b0100 != 0,
            progress: nibble & 0b0010 != 0,
            completion: nibble & 0b0001 != 0,
        }
    }
}

/// The PUS TC secondary header. Only the PUS-C wire layout is implemented
/// (see `PusTc::new`); the version nibble is still checked against the
/// configured default so a PUS-A request fails loudly instead of silently
/// producing a PUS-C packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PusTcSecondaryHeader {
    pub ack_flags: AckFlags,
    pub service: u8,
    pub subservice: u8,
    pub source_id: u16,
}

impl PusTcSecondaryHeader {
    pub fn new(ack_flags: AckFlags, service: u8, subservice: u8, source_id: u16) -> Self {
        Self {
            ack_flags,
            service,
            subservice,
            source_id,
        }
    }

    pub fn pack(&self) -> [u8; PUS_TC_SECONDARY_HEADER_SIZE] {
        let mut out = [0_u8; PUS_TC_SECONDARY_HEADER_SIZE];
        out[0] = (PusVersion::PusC.version_nibble() << 4) | self.ack_flags.nibble();
        out[1] = self.service;
        out[2] = self.subservice;
        (&mut out[3..5])
            .write_u16::<BigEndian>(self.source_id)
            .expect("fixed-size buffer write cannot fail");
        out
    }

    pub fn unpack(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < PUS_TC_SECONDARY_HEADER_SIZE {
            return Err(PacketError::BytesTooShort {
                expected: PUS_TC_SECONDARY_HEADER_SIZE,
                found: bytes.len(),
            });
        }
        let version = (bytes[0] & 0xF0) >> 4;
        if version != PusVersion::PusC.version_nibble() {
            return Err(PacketError::InvalidPusVersion(version));
        }
        let source_id = (&bytes[3..5]).read_u16::<BigEndian>().unwrap();
        Ok(Self {
            ack_flags: AckFlags::from_nibble(bytes[0] & 0x0F),
            service: bytes[1],
            subservice: bytes[2],
            source_id,
        })
    }
}

/// A PUS Telecommand packet: space packet header, PUS-C secondary header,
/// application data, and a closing CRC-16/CCITT-FALSE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PusTc {
    pub space_packet_header: SpacePacketHeader,
    pub secondary_header: PusTcSecondaryHeader,
    pub app_data: Vec<u8>,
}

impl PusTc {
    /// `pus_version` defaults to [`config::default_pus_tc_version`] when
    /// `None`; the only value this crate can currently pack is
    /// [`PusVersion::PusC`] (see [`PusTcSecondaryHeader`]), so any other
    /// resolved version is rejected with [`PacketError::InvalidPusVersion`].
    pub fn new(
        service: u8,
        subservice: u8,
        ack_flags: AckFlags,
        source_id: u16,
        app_data: Vec<u8>,
        apid: Option<u16>,
        pus_version: Option<PusVersion>,
        seq_count: u16,
    ) -> Result<Self> {
        let pus_version = pus_version.unwrap_or_else(config::default_pus_tc_version);
        if pus_version != PusVersion::PusC {
            return Err(PacketError::InvalidPusVersion(pus_version.version_nibble()));
        }
        let secondary_header = PusTcSecondaryHeader::new(ack_flags, service, subservice, source_id);
        let data_length =
            (PUS_TC_SECONDARY_HEADER_SIZE + app_data.len() + CRC_SIZE - 1) as u16;
        let space_packet_header = SpacePacketHeader::new(
            0,
            PacketType::Tc,
            true,
            apid.unwrap_or_else(config::default_tc_apid),
            SequenceFlags::Unsegmented,
            seq_count,
            data_length,
        )?;
        Ok(Self {
            space_packet_header,
            secondary_header,
            app_data,
        })
    }

    pub fn packet_len(&self) -> usize {
        self.space_packet_header.total_packet_len()
    }

    pub fn pack(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.packet_len());
        out.extend_from_slice(&self.space_packet_header.pack());
        out.extend_from_slice(&self.secondary_header.pack());
        out.extend_from_slice(&self.app_data);
        let crc = crc16(&out);
        out.extend_from_slice(&crc.to_be_bytes());
        out
    }

    /// Decode a TC packet from `raw`, returning it alongside any trailing
    /// bytes beyond the length field's indicated size (see §4.4, §7).
    pub fn unpack(raw: &[u8]) -> Result<(Self, usize)> {
        let space_packet_header = SpacePacketHeader::unpack_from_bytes(raw)?;
        let expected = space_packet_header.total_packet_len();
        if raw.len() < expected {
            return Err(PacketError::BytesTooShort {
                expected,
                found: raw.len(),
            });
        }
        let sec_hdr_start = SPACE_PACKET_HEADER_SIZE;
        let data_start = sec_hdr_start + PUS_TC_SECONDARY_HEADER_SIZE;
        if expected < data_start + CRC_SIZE {
            return Err(PacketError::BytesTooShort {
                expected: data_start + CRC_SIZE,
                found: expected,
            });
        }
        let secondary_header =
            PusTcSecondaryHeader::unpack(&raw[sec_hdr_start..data_start])?;
        let app_data = raw[data_start..expected - CRC_SIZE].to_vec();
        let computed = crc16(&raw[..expected]);
        if computed != 0 {
            return Err(PacketError::InvalidTmCrc16(computed));
        }
        Ok((
            Self {
                space_packet_header,
                secondary_header,
                app_data,
            },
            raw.len() - expected,
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AckFlags::NONE)]
    #[case(AckFlags::ALL)]
    fn secondary_header_roundtrip(#[case] ack_flags: AckFlags) {
        let header = PusTcSecondaryHeader::new(ack_flags, 17, 1, 0xBEEF);
        let packed = header.pack();
        let recovered = PusTcSecondaryHeader::unpack(&packed).unwrap();
        assert_eq!(header, recovered);
    }

    /// S4 from §8: a ping command with acceptance+completion ack requested.
    #[test]
    fn ping_command_scenario() {
        let ack = AckFlags {
            acceptance: true,
            start: false,
            progress: false,
            completion: true,
        };
        let tc = PusTc::new(17, 1, ack, 0, vec![], Some(0x10), None, 7).unwrap();
        assert_eq!(tc.space_packet_header.data_length, 6);
        assert_eq!(tc.packet_len(), 13);
        let packed = tc.pack();
        let (recovered, trailing) = PusTc::unpack(&packed).unwrap();
        assert_eq!(trailing, 0);
        assert_eq!(recovered, tc);
        assert_eq!(recovered.secondary_header.ack_flags.nibble(), 0b1001);
    }

    #[test]
    fn wrong_version_nibble_rejected() {
        let mut packed = PusTc::new(17, 1, AckFlags::ALL, 0, vec![1, 2, 3], Some(0), None, 0)
            .unwrap()
            .pack();
        packed[6] = 0x0F;
        assert!(matches!(
            PusTc::unpack(&packed),
            Err(PacketError::InvalidPusVersion(_))
        ));
    }

    #[test]
    fn pus_a_requested_is_rejected() {
        let err = PusTc::new(
            17,
            1,
            AckFlags::ALL,
            0,
            vec![],
            Some(0),
            Some(PusVersion::PusA),
            0,
        )
        .unwrap_err();
        assert!(matches!(err, PacketError::InvalidPusVersion(_)));
    }

    #[test]
    fn corrupted_app_data_fails_crc() {
        let mut packed = PusTc::new(17, 1, AckFlags::ALL, 0, vec![1, 2, 3], Some(0), None, 0)
            .unwrap()
            .pack();
        let last = packed.len() - 3;
        packed[last] ^= 0xFF;
        assert!(matches!(
            PusTc::unpack(&packed),
            Err(PacketError::InvalidTmCrc16(_))
        ));
    }
}
