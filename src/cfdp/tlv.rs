//! CFDP TLV/LV sub-structures (§4.7.2, §4.7.3) and the typed-TLV pattern
//! (§4.8, §9 "Dynamic dispatch -> tagged variants").
//!
//! Type codes for `FileStoreResponse` (0x06) and `EntityId` (0x07) are
//! pinned/resolved per §4.9: the S2 wire sample fixes FileStoreResponse at
//! 0x06, and EntityId is deliberately assigned a distinct code rather than
//! reusing it, resolving the Open Question in §9 in EntityId's favor.

use crate::error::{PacketError, Result};

/// Known CFDP TLV type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TlvType {
    FilestoreRequest = 0x00,
    MessageToUser = 0x02,
    FaultHandlerOverride = 0x04,
    FlowLabel = 0x05,
    FileStoreResponse = 0x06,
    EntityId = 0x07,
}

impl TlvType {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Result<Self> {
        Ok(match code {
            0x00 => Self::FilestoreRequest,
            0x02 => Self::MessageToUser,
            0x04 => Self::FaultHandlerOverride,
            0x05 => Self::FlowLabel,
            0x06 => Self::FileStoreResponse,
            0x07 => Self::EntityId,
            other => {
                return Err(PacketError::InvalidEnumValue {
                    domain: "CFDP TLV type code",
                    value: other,
                })
            }
        })
    }
}

/// The generic "unknown variant" TLV: a type code and a raw value, with no
/// structure imposed on the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CfdpTlv {
    pub tlv_type: u8,
    pub value: Vec<u8>,
}

impl CfdpTlv {
    pub fn new(tlv_type: u8, value: Vec<u8>) -> Result<Self> {
        if value.len() > u8::MAX as usize {
            return Err(PacketError::InvalidTlvLength {
                length: value.len(),
                available: u8::MAX as usize,
            });
        }
        Ok(Self { tlv_type, value })
    }

    pub fn packed_len(&self) -> usize {
        2 + self.value.len()
    }

    pub fn pack(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.packed_len());
        out.push(self.tlv_type);
        out.push(self.value.len() as u8);
        out.extend_from_slice(&self.value);
        out
    }

    /// Decode one TLV from the front of `bytes`, returning it and the
    /// number of bytes consumed.
    pub fn unpack(bytes: &[u8]) -> Result<(Self, usize)> {
        if bytes.len() < 2 {
            return Err(PacketError::BytesTooShort {
                expected: 2,
                found: bytes.len(),
            });
        }
        let tlv_type = bytes[0];
        let length = bytes[1] as usize;
        if bytes.len() < 2 + length {
            return Err(PacketError::InvalidTlvLength {
                length,
                available: bytes.len() - 2,
            });
        }
        Ok((
            Self {
                tlv_type,
                value: bytes[2..2 + length].to_vec(),
            },
            2 + length,
        ))
    }
}

fn pack_lv(bytes: &[u8]) -> Result<Vec<u8>> {
    if bytes.len() > u8::MAX as usize {
        return Err(PacketError::InvalidTlvLength {
            length: bytes.len(),
            available: u8::MAX as usize,
        });
    }
    let mut out = Vec::with_capacity(1 + bytes.len());
    out.push(bytes.len() as u8);
    out.extend_from_slice(bytes);
    Ok(out)
}

fn unpack_lv(bytes: &[u8]) -> Result<(Vec<u8>, usize)> {
    if bytes.is_empty() {
        return Err(PacketError::BytesTooShort {
            expected: 1,
            found: 0,
        });
    }
    let length = bytes[0] as usize;
    if bytes.len() < 1 + length {
        return Err(PacketError::InvalidTlvLength {
            length,
            available: bytes.len() - 1,
        });
    }
    Ok((bytes[1..1 + length].to_vec(), 1 + length))
}

/// Filestore action codes, shared by [`FilestoreRequestTlv`] and
/// [`FileStoreResponseTlv`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionCode {
    CreateFile = 0,
    DeleteFile = 1,
    RenameFile = 2,
    AppendFile = 3,
    ReplaceFile = 4,
    CreateDirectory = 5,
    RemoveDirectory = 6,
    DenyFile = 7,
    DenyDirectory = 8,
}

impl ActionCode {
    pub fn from_nibble(nibble: u8) -> Result<Self> {
        Ok(match nibble {
            0 => Self::CreateFile,
            1 => Self::DeleteFile,
            2 => Self::RenameFile,
            3 => Self::AppendFile,
            4 => Self::ReplaceFile,
            5 => Self::CreateDirectory,
            6 => Self::RemoveDirectory,
            7 => Self::DenyFile,
            8 => Self::DenyDirectory,
            other => {
                return Err(PacketError::InvalidEnumValue {
                    domain: "CFDP filestore action code",
                    value: other,
                })
            }
        })
    }

    /// Whether this action carries a second filename (rename/append/replace).
    pub fn takes_second_filename(self) -> bool {
        matches!(self, Self::RenameFile | Self::AppendFile | Self::ReplaceFile)
    }
}

/// `fault_location` / proxy-entity TLV: an entity ID of declared width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityIdTlv {
    pub entity_id: u64,
    pub width: usize,
}

impl EntityIdTlv {
    pub fn to_tlv(self) -> Result<CfdpTlv> {
        CfdpTlv::new(TlvType::EntityId.code(), crate::cfdp::pack_variable_width(self.entity_id, self.width)?)
    }

    pub fn from_tlv(tlv: &CfdpTlv) -> Result<Self> {
        if tlv.tlv_type != TlvType::EntityId.code() {
            return Err(PacketError::TlvTypeMismatch {
                expected: TlvType::EntityId.code(),
                found: tlv.tlv_type,
            });
        }
        Ok(Self {
            entity_id: crate::cfdp::unpack_variable_width(&tlv.value, tlv.value.len())?,
            width: tlv.value.len(),
        })
    }
}

/// A single filestore action result, per §4.7.3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStoreResponseTlv {
    pub action_code: ActionCode,
    pub status_code: u8,
    pub first_file_name: Vec<u8>,
    pub second_file_name: Option<Vec<u8>>,
    pub filestore_message: Vec<u8>,
}

impl FileStoreResponseTlv {
    pub fn new(
        action_code: ActionCode,
        status_code: u8,
        first_file_name: Vec<u8>,
        second_file_name: Option<Vec<u8>>,
        filestore_message: Vec<u8>,
    ) -> Result<Self> {
        if status_code > 0x0F {
            return Err(PacketError::FieldOverflow {
                value: status_code as u64,
                bits: 4,
            });
        }
        if action_code.takes_second_filename() != second_file_name.is_some() {
            return Err(PacketError::InvalidTlvLength {
                length: second_file_name.as_ref().map(Vec::len).unwrap_or(0),
                available: 0,
            });
        }
        Ok(Self {
            action_code,
            status_code,
            first_file_name,
            second_file_name,
            filestore_message,
        })
    }

    fn value_bytes(&self) -> Result<Vec<u8>> {
        let mut value = Vec::new();
        value.push((self.action_code as u8) << 4 | (self.status_code & 0x0F));
        value.extend(pack_lv(&self.first_file_name)?);
        if let Some(second) = &self.second_file_name {
            value.extend(pack_lv(second)?);
        }
        value.extend(pack_lv(&self.filestore_message)?);
        Ok(value)
    }

    pub fn to_tlv(&self) -> Result<CfdpTlv> {
        CfdpTlv::new(TlvType::FileStoreResponse.code(), self.value_bytes()?)
    }

    pub fn from_tlv(tlv: &CfdpTlv) -> Result<Self> {
        if tlv.tlv_type != TlvType::FileStoreResponse.code() {
            return Err(PacketError::TlvTypeMismatch {
                expected: TlvType::FileStoreResponse.code(),
                found: tlv.tlv_type,
            });
        }
        let value = &tlv.value;
        if value.is_empty() {
            return Err(PacketError::BytesTooShort {
                expected: 1,
                found: 0,
            });
        }
        let action_code = ActionCode::from_nibble((value[0] & 0xF0) >> 4)?;
        let status_code = value[0] & 0x0F;
        let mut cursor = 1_usize;
        let (first_file_name, consumed) = unpack_lv(&value[cursor..])?;
        cursor += consumed;
        let second_file_name = if action_code.takes_second_filename() {
            let (name, consumed) = unpack_lv(&value[cursor..])?;
            cursor += consumed;
            Some(name)
        } else {
            None
        };
        let (filestore_message, _) = unpack_lv(&value[cursor..])?;
        Ok(Self {
            action_code,
            status_code,
            first_file_name,
            second_file_name,
            filestore_message,
        })
    }
}

/// A filestore request issued alongside a Metadata PDU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilestoreRequestTlv {
    pub action_code: ActionCode,
    pub first_file_name: Vec<u8>,
    pub second_file_name: Option<Vec<u8>>,
}

impl FilestoreRequestTlv {
    pub fn to_tlv(&self) -> Result<CfdpTlv> {
        let mut value = vec![(self.action_code as u8) << 4];
        value.extend(pack_lv(&self.first_file_name)?);
        if let Some(second) = &self.second_file_name {
            value.extend(pack_lv(second)?);
        }
        CfdpTlv::new(TlvType::FilestoreRequest.code(), value)
    }

    pub fn from_tlv(tlv: &CfdpTlv) -> Result<Self> {
        if tlv.tlv_type != TlvType::FilestoreRequest.code() {
            return Err(PacketError::TlvTypeMismatch {
                expected: TlvType::FilestoreRequest.code(),
                found: tlv.tlv_type,
            });
        }
        let value = &tlv.value;
        if value.is_empty() {
            return Err(PacketError::BytesTooShort {
                expected: 1,
                found: 0,
            });
        }
        let action_code = ActionCode::from_nibble((value[0] & 0xF0) >> 4)?;
        let (first_file_name, consumed) = unpack_lv(&value[1..])?;
        let second_file_name = if action_code.takes_second_filename() {
            Some(unpack_lv(&value[1 + consumed..])?.0)
        } else {
            None
        };
        Ok(Self {
            action_code,
            first_file_name,
            second_file_name,
        })
    }
}

/// The ASCII marker CFDP proxy/directory-operations messages carry as the
/// first four bytes of their `MessageToUserTlv` value.
pub const CFDP_MESSAGE_MARKER: [u8; 4] = *b"cfdp";

/// A vendor- or CFDP-defined message piggy-backed on a Metadata PDU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageToUserTlv {
    pub value: Vec<u8>,
}

impl MessageToUserTlv {
    pub fn is_reserved_cfdp_message(&self) -> bool {
        self.value.len() >= 4 && self.value[..4] == CFDP_MESSAGE_MARKER
    }

    pub fn to_tlv(&self) -> Result<CfdpTlv> {
        CfdpTlv::new(TlvType::MessageToUser.code(), self.value.clone())
    }

    pub fn from_tlv(tlv: &CfdpTlv) -> Result<Self> {
        if tlv.tlv_type != TlvType::MessageToUser.code() {
            return Err(PacketError::TlvTypeMismatch {
                expected: TlvType::MessageToUser.code(),
                found: tlv.tlv_type,
            });
        }
        Ok(Self { value: tlv.value.clone() })
    }
}

/// Overrides the default fault handler for one condition code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultHandlerOverrideTlv {
    pub condition_code: u8,
    pub handler_code: u8,
}

impl FaultHandlerOverrideTlv {
    pub fn to_tlv(self) -> Result<CfdpTlv> {
        CfdpTlv::new(
            TlvType::FaultHandlerOverride.code(),
            vec![(self.condition_code & 0x0F) << 4 | (self.handler_code & 0x0F)],
        )
    }

    pub fn from_tlv(tlv: &CfdpTlv) -> Result<Self> {
        if tlv.tlv_type != TlvType::FaultHandlerOverride.code() {
            return Err(PacketError::TlvTypeMismatch {
                expected: TlvType::FaultHandlerOverride.code(),
                found: tlv.tlv_type,
            });
        }
        if tlv.value.is_empty() {
            return Err(PacketError::BytesTooShort {
                expected: 1,
                found: 0,
            });
        }
        Ok(Self {
            condition_code: (tlv.value[0] & 0xF0) >> 4,
            handler_code: tlv.value[0] & 0x0F,
        })
    }
}

/// Opaque flow-control label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowLabelTlv {
    pub data: Vec<u8>,
}

impl FlowLabelTlv {
    pub fn to_tlv(&self) -> Result<CfdpTlv> {
        CfdpTlv::new(TlvType::FlowLabel.code(), self.data.clone())
    }

    pub fn from_tlv(tlv: &CfdpTlv) -> Result<Self> {
        if tlv.tlv_type != TlvType::FlowLabel.code() {
            return Err(PacketError::TlvTypeMismatch {
                expected: TlvType::FlowLabel.code(),
                found: tlv.tlv_type,
            });
        }
        Ok(Self { data: tlv.value.clone() })
    }
}

/// Wraps a [`CfdpTlv`] and offers fallible conversions to each typed
/// variant, per §4.8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlvHolder(pub CfdpTlv);

impl TlvHolder {
    pub fn new(tlv: CfdpTlv) -> Self {
        Self(tlv)
    }

    /// The decoded [`TlvType`] of the wrapped TLV.
    pub fn tlv_type(&self) -> Result<TlvType> {
        TlvType::from_code(self.0.tlv_type)
    }

    pub fn as_entity_id(&self) -> Result<EntityIdTlv> {
        EntityIdTlv::from_tlv(&self.0)
    }

    pub fn as_message_to_user(&self) -> Result<MessageToUserTlv> {
        MessageToUserTlv::from_tlv(&self.0)
    }

    pub fn as_file_store_response(&self) -> Result<FileStoreResponseTlv> {
        FileStoreResponseTlv::from_tlv(&self.0)
    }

    pub fn as_fault_handler_override(&self) -> Result<FaultHandlerOverrideTlv> {
        FaultHandlerOverrideTlv::from_tlv(&self.0)
    }

    pub fn as_flow_label(&self) -> Result<FlowLabelTlv> {
        FlowLabelTlv::from_tlv(&self.0)
    }

    pub fn as_filestore_request(&self) -> Result<FilestoreRequestTlv> {
        FilestoreRequestTlv::from_tlv(&self.0)
    }
}
