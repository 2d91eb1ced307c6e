//! The Finished file directive (§4.7.1): reports the terminal outcome of
//! one CFDP file transfer.

use crate::cfdp::header::PduHeader;
use crate::cfdp::pdu::{DirectiveCode, FileDirectivePdu};
use crate::cfdp::tlv::{CfdpTlv, EntityIdTlv, FileStoreResponseTlv, TlvType};
use crate::error::{PacketError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryCode {
    Complete = 0,
    Incomplete = 1,
}

/// Disposition of the received file in the receiver's filestore, per the
/// CFDP blue book's Finished-PDU file status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileDeliveryStatus {
    DiscardedDeliberately = 0,
    DiscardedFilestoreRejection = 1,
    Retained = 2,
    Unreported = 3,
}

/// Condition codes a Finished PDU may report, per the CFDP blue book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionCode {
    NoError = 0,
    PositiveAckLimitReached = 1,
    KeepAliveLimitReached = 2,
    InvalidTransmissionMode = 3,
    FilestoreRejection = 4,
    FileChecksumFailure = 5,
    FileSizeError = 6,
    NakLimitReached = 7,
    InactivityDetected = 8,
    InvalidFileStructure = 9,
    CheckLimitReached = 11,
    UnsupportedChecksumType = 13,
    SuspendRequestReceived = 14,
    CancelRequestReceived = 15,
}

impl ConditionCode {
    fn from_nibble(nibble: u8) -> Result<Self> {
        Ok(match nibble {
            0 => Self::NoError,
            1 => Self::PositiveAckLimitReached,
            2 => Self::KeepAliveLimitReached,
            3 => Self::InvalidTransmissionMode,
            4 => Self::FilestoreRejection,
            5 => Self::FileChecksumFailure,
            6 => Self::FileSizeError,
            7 => Self::NakLimitReached,
            8 => Self::InactivityDetected,
            9 => Self::InvalidFileStructure,
            11 => Self::CheckLimitReached,
            13 => Self::UnsupportedChecksumType,
            14 => Self::SuspendRequestReceived,
            15 => Self::CancelRequestReceived,
            other => {
                return Err(PacketError::InvalidEnumValue {
                    domain: "CFDP Finished-PDU condition code",
                    value: other,
                })
            }
        })
    }
}

fn file_status_from_2bits(bits: u8) -> Result<FileDeliveryStatus> {
    Ok(match bits {
        0 => FileDeliveryStatus::DiscardedDeliberately,
        1 => FileDeliveryStatus::DiscardedFilestoreRejection,
        2 => FileDeliveryStatus::Retained,
        3 => FileDeliveryStatus::Unreported,
        _ => unreachable!("2-bit field"),
    })
}

/// Reports the terminal outcome of a file transfer: delivery status,
/// disposition of the file, the condition that ended the transfer, and
/// optionally a fault location and/or filestore action results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedPdu {
    pub header: PduHeader,
    pub delivery_code: DeliveryCode,
    pub file_status: FileDeliveryStatus,
    pub condition_code: ConditionCode,
    pub fault_location: Option<EntityIdTlv>,
    pub file_store_responses: Vec<FileStoreResponseTlv>,
}

impl FinishedPdu {
    pub fn new(
        mut header: PduHeader,
        delivery_code: DeliveryCode,
        file_status: FileDeliveryStatus,
        condition_code: ConditionCode,
        fault_location: Option<EntityIdTlv>,
        file_store_responses: Vec<FileStoreResponseTlv>,
    ) -> Result<Self> {
        let mut tlv_len = 0_usize;
        if let Some(location) = &fault_location {
            tlv_len += location.to_tlv()?.packed_len();
        }
        for response in &file_store_responses {
            tlv_len += response.to_tlv()?.packed_len();
        }
        header.pdu_data_length = (2 + tlv_len) as u16;
        Ok(Self {
            header,
            delivery_code,
            file_status,
            condition_code,
            fault_location,
            file_store_responses,
        })
    }

    fn status_byte(&self) -> u8 {
        (self.delivery_code as u8 & 0x1) << 6
            | (self.condition_code as u8 & 0x0F) << 2
            | (self.file_status as u8 & 0x03)
    }

    pub fn packet_len(&self) -> usize {
        self.header.header_len() + self.header.pdu_data_length as usize
    }

    pub fn pack(&self) -> Result<Vec<u8>> {
        let prefix = FileDirectivePdu::new(self.header, DirectiveCode::Finished);
        let mut out = prefix.pack();
        out.push(self.status_byte());
        if let Some(location) = &self.fault_location {
            out.extend(location.to_tlv()?.pack());
        }
        for response in &self.file_store_responses {
            out.extend(response.to_tlv()?.pack());
        }
        Ok(out)
    }

    pub fn unpack(bytes: &[u8]) -> Result<Self> {
        let (prefix, mut cursor) = FileDirectivePdu::unpack(bytes)?;
        if prefix.directive_code != DirectiveCode::Finished {
            return Err(PacketError::UnsupportedDirectiveCode(prefix.directive_code.code()));
        }
        if bytes.len() <= cursor {
            return Err(PacketError::BytesTooShort {
                expected: cursor + 1,
                found: bytes.len(),
            });
        }
        let status_byte = bytes[cursor];
        let delivery_code = if (status_byte >> 6) & 0x1 == 0 {
            DeliveryCode::Complete
        } else {
            DeliveryCode::Incomplete
        };
        let condition_code = ConditionCode::from_nibble((status_byte >> 2) & 0x0F)?;
        let file_status = file_status_from_2bits(status_byte & 0x03)?;
        cursor += 1;

        let tlv_region_end = prefix.header.header_len() + prefix.header.pdu_data_length as usize;
        if bytes.len() < tlv_region_end {
            return Err(PacketError::BytesTooShort {
                expected: tlv_region_end,
                found: bytes.len(),
            });
        }

        let mut fault_location = None;
        let mut file_store_responses = Vec::new();
        while cursor < tlv_region_end {
            let (tlv, consumed) = CfdpTlv::unpack(&bytes[cursor..tlv_region_end])?;
            cursor += consumed;
            if tlv.tlv_type == TlvType::EntityId.code() {
                if fault_location.is_some() {
                    return Err(PacketError::DuplicateField("fault_location"));
                }
                fault_location = Some(EntityIdTlv::from_tlv(&tlv)?);
            } else if tlv.tlv_type == TlvType::FileStoreResponse.code() {
                file_store_responses.push(FileStoreResponseTlv::from_tlv(&tlv)?);
            } else {
                return Err(PacketError::TlvTypeMismatch {
                    expected: TlvType::FileStoreResponse.code(),
                    found: tlv.tlv_type,
                });
            }
        }

        Ok(Self {
            header: prefix.header,
            delivery_code,
            file_status,
            condition_code,
            fault_location,
            file_store_responses,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cfdp::header::{Direction, PduConfig, PduType};
    use crate::cfdp::tlv::ActionCode;

    fn base_header() -> PduHeader {
        PduHeader::new(PduType::FileDirective, Direction::TowardSender, 0, PduConfig::default()).unwrap()
    }

    /// S1 from §8: empty FinishedPdu round-trip.
    #[test]
    fn s1_empty_finished_pdu_matches_wire_sample() {
        let pdu = FinishedPdu::new(
            base_header(),
            DeliveryCode::Complete,
            FileDeliveryStatus::Unreported,
            ConditionCode::NoError,
            None,
            vec![],
        )
        .unwrap();
        let packed = pdu.pack().unwrap();
        assert_eq!(
            packed,
            vec![0x20, 0x00, 0x02, 0x11, 0x00, 0x00, 0x00, 0x05, 0x03]
        );
        let recovered = FinishedPdu::unpack(&packed).unwrap();
        assert_eq!(recovered, pdu);
        assert_eq!(recovered.pack().unwrap(), packed);
    }

    /// S2 from §8: FinishedPdu with one FileStoreResponseTlv.
    #[test]
    fn s2_finished_pdu_with_file_store_response() {
        let response = FileStoreResponseTlv::new(
            ActionCode::RemoveDirectory,
            0,
            b"test.txt".to_vec(),
            None,
            vec![],
        )
        .unwrap();
        let pdu = FinishedPdu::new(
            base_header(),
            DeliveryCode::Complete,
            FileDeliveryStatus::Unreported,
            ConditionCode::FilestoreRejection,
            None,
            vec![response],
        )
        .unwrap();
        let packed = pdu.pack().unwrap();
        assert_eq!(packed.len(), 22);
        assert_eq!(
            &packed[9..],
            &[0x06, 0x0B, 0x60, 0x08, b't', b'e', b's', b't', b'.', b't', b'x', b't', 0x00][..]
        );
        let recovered = FinishedPdu::unpack(&packed).unwrap();
        assert_eq!(recovered, pdu);
    }

    #[test]
    fn duplicate_fault_location_rejected() {
        let location = EntityIdTlv { entity_id: 1, width: 1 };
        let pdu = FinishedPdu::new(
            base_header(),
            DeliveryCode::Complete,
            FileDeliveryStatus::Unreported,
            ConditionCode::NoError,
            Some(location),
            vec![],
        )
        .unwrap();
        let mut packed = pdu.pack().unwrap();
        let duplicate_tlv = location.to_tlv().unwrap().pack();
        let new_pdu_data_length = pdu.header.pdu_data_length + duplicate_tlv.len() as u16;
        packed[2..4].copy_from_slice(&new_pdu_data_length.to_be_bytes());
        packed.extend(duplicate_tlv);
        assert!(matches!(
            FinishedPdu::unpack(&packed),
            Err(PacketError::DuplicateField("fault_location"))
        ));
    }
}
