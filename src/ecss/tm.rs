//! PUS Telemetry (TM) packets: a [`crate::ccsds::SpacePacketHeader`] plus a
//! PUS secondary header, opaque source data, and a trailing CRC-16.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::ccsds::{PacketType, SequenceFlags, SpacePacketHeader, SPACE_PACKET_HEADER_SIZE};
use crate::config;
use crate::crc::crc16;
use crate::ecss::PusVersion;
use crate::error::{PacketError, Result};
use crate::time::{CdsShortTimestamp, CDS_SHORT_TIMESTAMP_SIZE};

const HEADER_SIZE_WITHOUT_TIME_PUS_A: usize = 4;
const HEADER_SIZE_WITHOUT_TIME_PUS_C: usize = 7;
const CRC_SIZE: usize = 2;

/// Decide the PUS version from the first byte of a secondary header, for
/// callers that don't already know which flavor a packet carries.
fn infer_pus_version(first_byte: u8) -> Result<PusVersion> {
    match (first_byte & 0xF0) >> 4 {
        0b0000 => Ok(PusVersion::PusA),
        0b0010 => Ok(PusVersion::PusC),
        other => Err(PacketError::InvalidPusVersion(other)),
    }
}

/// The PUS TM secondary header, in either its PUS-A or PUS-C layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PusTmSecondaryHeader {
    pub pus_version: PusVersion,
    pub service: u8,
    pub subservice: u8,
    pub message_counter: u16,
    pub destination_id: u16,
    pub spacecraft_time_ref: u8,
    pub timestamp: CdsShortTimestamp,
}

impl PusTmSecondaryHeader {
    pub fn new(
        pus_version: PusVersion,
        service: u8,
        subservice: u8,
        message_counter: u16,
        destination_id: u16,
        spacecraft_time_ref: u8,
        timestamp: CdsShortTimestamp,
    ) -> Result<Self> {
        if pus_version == PusVersion::PusA && message_counter > 0xFF {
            return Err(PacketError::FieldOverflow {
                value: message_counter as u64,
                bits: 8,
            });
        }
        Ok(Self {
            pus_version,
            service,
            subservice,
            message_counter,
            destination_id,
            spacecraft_time_ref,
            timestamp,
        })
    }

    /// Size in bytes of this secondary header once packed, timestamp
    /// included.
    pub fn header_size(&self) -> usize {
        match self.pus_version {
            PusVersion::PusA => HEADER_SIZE_WITHOUT_TIME_PUS_A + CDS_SHORT_TIMESTAMP_SIZE,
            PusVersion::PusC => HEADER_SIZE_WITHOUT_TIME_PUS_C + CDS_SHORT_TIMESTAMP_SIZE,
        }
    }

    pub fn pack(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.header_size());
        match self.pus_version {
            PusVersion::PusA => {
                out.push(self.pus_version.version_nibble() << 4);
                out.push(self.service);
                out.push(self.subservice);
                out.push(self.message_counter as u8);
            }
            PusVersion::PusC => {
                out.push((self.pus_version.version_nibble() << 4) | (self.spacecraft_time_ref & 0x0F));
                out.push(self.service);
                out.push(self.subservice);
                out.write_u16::<BigEndian>(self.message_counter).unwrap();
                out.write_u16::<BigEndian>(self.destination_id).unwrap();
            }
        }
        out.extend_from_slice(&self.timestamp.pack());
        out
    }

    /// Decode from the start of a secondary header. `pus_version` is
    /// inferred from the version nibble when `None`.
    pub fn unpack(bytes: &[u8], pus_version: Option<PusVersion>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(PacketError::BytesTooShort {
                expected: HEADER_SIZE_WITHOUT_TIME_PUS_A + CDS_SHORT_TIMESTAMP_SIZE,
                found: 0,
            });
        }
        let pus_version = match pus_version {
            Some(v) => v,
            None => infer_pus_version(bytes[0])?,
        };
        let (header_size_without_time, declared_nibble) = match pus_version {
            PusVersion::PusA => (HEADER_SIZE_WITHOUT_TIME_PUS_A, (bytes[0] & 0x70) >> 4),
            PusVersion::PusC => (HEADER_SIZE_WITHOUT_TIME_PUS_C, (bytes[0] & 0xF0) >> 4),
        };
        if declared_nibble != pus_version.version_nibble() {
            return Err(PacketError::InvalidPusVersion(declared_nibble));
        }
        let total = header_size_without_time + CDS_SHORT_TIMESTAMP_SIZE;
        if bytes.len() < total {
            return Err(PacketError::BytesTooShort {
                expected: total,
                found: bytes.len(),
            });
        }
        let (message_counter, destination_id, spacecraft_time_ref, time_start) = match pus_version
        {
            PusVersion::PusA => (bytes[3] as u16, 0_u16, 0_u8, 4),
            PusVersion::PusC => {
                let mc = (&bytes[3..5]).read_u16::<BigEndian>().unwrap();
                let dest = (&bytes[5..7]).read_u16::<BigEndian>().unwrap();
                (mc, dest, bytes[0] & 0x0F, 7)
            }
        };
        let timestamp = CdsShortTimestamp::unpack(&mut &bytes[time_start..time_start + CDS_SHORT_TIMESTAMP_SIZE])?;
        Ok(Self {
            pus_version,
            service: bytes[1],
            subservice: bytes[2],
            message_counter,
            destination_id,
            spacecraft_time_ref,
            timestamp,
        })
    }
}

/// A PUS Telemetry packet: space packet header, PUS secondary header,
/// opaque source data, and a closing CRC-16/CCITT-FALSE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PusTm {
    pub space_packet_header: SpacePacketHeader,
    pub secondary_header: PusTmSecondaryHeader,
    pub source_data: Vec<u8>,
}

impl PusTm {
    /// Build a new TM packet, computing `data_length` from the secondary
    /// header and source data per §4.4. `apid` defaults to
    /// [`config::default_tm_apid`] when `None`.
    pub fn new(
        service: u8,
        subservice: u8,
        timestamp: CdsShortTimestamp,
        seq_count: u16,
        source_data: Vec<u8>,
        apid: Option<u16>,
        pus_version: Option<PusVersion>,
        message_counter: u16,
        destination_id: u16,
        spacecraft_time_ref: u8,
    ) -> Result<Self> {
        let pus_version = pus_version.unwrap_or_else(config::default_pus_tm_version);
        let secondary_header = PusTmSecondaryHeader::new(
            pus_version,
            service,
            subservice,
            message_counter,
            destination_id,
            spacecraft_time_ref,
            timestamp,
        )?;
        let data_length = (secondary_header.header_size() + source_data.len() + CRC_SIZE - 1) as u16;
        let space_packet_header = SpacePacketHeader::new(
            0,
            PacketType::Tm,
            true,
            apid.unwrap_or_else(config::default_tm_apid),
            SequenceFlags::Unsegmented,
            seq_count,
            data_length,
        )?;
        Ok(Self {
            space_packet_header,
            secondary_header,
            source_data,
        })
    }

    pub fn packet_len(&self) -> usize {
        self.space_packet_header.total_packet_len()
    }

    pub fn pack(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.packet_len());
        out.extend_from_slice(&self.space_packet_header.pack());
        out.extend_from_slice(&self.secondary_header.pack());
        out.extend_from_slice(&self.source_data);
        let crc = crc16(&out);
        out.extend_from_slice(&crc.to_be_bytes());
        out
    }

    /// Decode a TM packet from `raw`. Returns the packet and the number of
    /// trailing bytes left over after the length field's indicated size —
    /// a non-zero count is a recoverable condition the caller may choose
    /// to warn about, not a failure (see §4.4, §7).
    pub fn unpack(raw: &[u8], pus_version: Option<PusVersion>) -> Result<(Self, usize)> {
        let space_packet_header = SpacePacketHeader::unpack_from_bytes(raw)?;
        let expected = space_packet_header.total_packet_len();
        if raw.len() < expected {
            return Err(PacketError::BytesTooShort {
                expected,
                found: raw.len(),
            });
        }
        let secondary_header =
            PusTmSecondaryHeader::unpack(&raw[SPACE_PACKET_HEADER_SIZE..expected], pus_version)?;
        let sec_hdr_len = secondary_header.header_size();
        let data_start = SPACE_PACKET_HEADER_SIZE + sec_hdr_len;
        if expected < data_start + CRC_SIZE {
            return Err(PacketError::BytesTooShort {
                expected: data_start + CRC_SIZE,
                found: expected,
            });
        }
        let source_data = raw[data_start..expected - CRC_SIZE].to_vec();
        let computed = crc16(&raw[..expected]);
        if computed != 0 {
            return Err(PacketError::InvalidTmCrc16(computed));
        }
        Ok((
            Self {
                space_packet_header,
                secondary_header,
                source_data,
            },
            raw.len() - expected,
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    fn ts() -> CdsShortTimestamp {
        CdsShortTimestamp::zero()
    }

    #[rstest]
    #[case(PusVersion::PusA)]
    #[case(PusVersion::PusC)]
    fn secondary_header_roundtrip(#[case] version: PusVersion) {
        let header =
            PusTmSecondaryHeader::new(version, 17, 2, 0x42, 0x0102, 0b0011, ts()).unwrap();
        let packed = header.pack();
        let recovered = PusTmSecondaryHeader::unpack(&packed, Some(version)).unwrap();
        assert_eq!(header.service, recovered.service);
        assert_eq!(header.subservice, recovered.subservice);
        assert_eq!(header.timestamp, recovered.timestamp);
        match version {
            PusVersion::PusA => assert_eq!(recovered.message_counter, 0x42),
            PusVersion::PusC => {
                assert_eq!(recovered.message_counter, 0x42);
                assert_eq!(recovered.destination_id, 0x0102);
                assert_eq!(recovered.spacecraft_time_ref, 0b0011);
            }
        }
    }

    #[test]
    fn pus_a_message_counter_overflow() {
        let err =
            PusTmSecondaryHeader::new(PusVersion::PusA, 0, 0, 0x100, 0, 0, ts()).unwrap_err();
        assert!(matches!(err, PacketError::FieldOverflow { .. }));
    }

    #[test]
    fn pus_c_byte0_is_0x20_with_zero_time_ref() {
        let header = PusTmSecondaryHeader::new(PusVersion::PusC, 17, 2, 0, 0, 0, ts()).unwrap();
        assert_eq!(header.pack()[0], 0x20);
    }

    /// S3 from §8: Service 17 ping reply with an all-zero timestamp.
    #[test]
    fn ping_reply_scenario() {
        let tm = PusTm::new(17, 2, ts(), 22, vec![], Some(0xEF), Some(PusVersion::PusC), 0, 0, 0)
            .unwrap();
        assert_eq!(tm.space_packet_header.data_length, 15);
        assert_eq!(tm.packet_len(), 22);
        let packed = tm.pack();
        assert_eq!(packed.len(), 22);
        let (recovered, trailing) = PusTm::unpack(&packed, Some(PusVersion::PusC)).unwrap();
        assert_eq!(trailing, 0);
        assert_eq!(recovered, tm);
    }

    #[test]
    fn empty_source_data_pus_c_is_22_bytes_on_wire() {
        let tm = PusTm::new(17, 1, ts(), 0, vec![], Some(0), Some(PusVersion::PusC), 0, 0, 0)
            .unwrap();
        assert_eq!(tm.space_packet_header.data_length, 15);
        assert_eq!(tm.pack().len(), 22);
    }

    /// S5 from §8: corrupting a single bit breaks CRC closure.
    #[test]
    fn corrupted_byte_fails_crc() {
        let tm = PusTm::new(17, 2, ts(), 22, vec![], Some(0xEF), Some(PusVersion::PusC), 0, 0, 0)
            .unwrap();
        let mut packed = tm.pack();
        packed[10] ^= 0xFF;
        let err = PusTm::unpack(&packed, Some(PusVersion::PusC)).unwrap_err();
        assert!(matches!(err, PacketError::InvalidTmCrc16(_)));
    }

    #[test]
    fn trailing_bytes_are_reported_not_rejected() {
        let tm = PusTm::new(17, 2, ts(), 22, vec![], Some(0xEF), Some(PusVersion::PusC), 0, 0, 0)
            .unwrap();
        let mut packed = tm.pack();
        packed.push(0xAA);
        let (recovered, trailing) = PusTm::unpack(&packed, Some(PusVersion::PusC)).unwrap();
        assert_eq!(trailing, 1);
        assert_eq!(recovered, tm);
    }

    #[test]
    fn data_length_0xffff_with_short_buffer_is_bytes_too_short() {
        let mut packed = PusTm::new(17, 2, ts(), 0, vec![], Some(0), Some(PusVersion::PusC), 0, 0, 0)
            .unwrap()
            .pack();
        packed[4] = 0xFF;
        packed[5] = 0xFF;
        packed.resize(20, 0);
        assert!(matches!(
            PusTm::unpack(&packed, Some(PusVersion::PusC)),
            Err(PacketError::BytesTooShort { .. })
        ));
    }
}
