//! ECSS Service 1: Request Verification. Reports acceptance, start,
//! progress, and completion of a previously received telecommand, each
//! tagged with the [`RequestId`] of the TC it refers to.

use byteorder::{BigEndian, ReadBytesExt};

use crate::ecss::tc::PusTc;
use crate::ecss::{PacketFieldEnum, Pfc};
use crate::error::{PacketError, Result};

/// Wire size of a [`RequestId`]: the TC's packet ID and packet sequence
/// control fields, exactly as they appeared in the space packet header of
/// the command being reported on.
pub const REQUEST_ID_SIZE: usize = 4;

/// Subservices of Service 1, one pair (success/failure) per verification
/// stage.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subservice {
    AcceptanceSuccess = 1,
    AcceptanceFailure = 2,
    StartSuccess = 3,
    StartFailure = 4,
    StepSuccess = 5,
    StepFailure = 6,
    CompletionSuccess = 7,
    CompletionFailure = 8,
}

impl Subservice {
    pub fn from_u8(value: u8) -> Result<Self> {
        Ok(match value {
            1 => Self::AcceptanceSuccess,
            2 => Self::AcceptanceFailure,
            3 => Self::StartSuccess,
            4 => Self::StartFailure,
            5 => Self::StepSuccess,
            6 => Self::StepFailure,
            7 => Self::CompletionSuccess,
            8 => Self::CompletionFailure,
            other => {
                return Err(PacketError::InvalidEnumValue {
                    domain: "PUS Service 1 subservice",
                    value: other,
                })
            }
        })
    }

    pub fn is_failure(self) -> bool {
        matches!(
            self,
            Self::AcceptanceFailure | Self::StartFailure | Self::StepFailure | Self::CompletionFailure
        )
    }
}

/// Identifies the telecommand a verification report refers to: the packet
/// ID and packet sequence control of its space packet header, concatenated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestId {
    pub packet_id_raw: u16,
    pub packet_seq_ctrl_raw: u16,
}

impl RequestId {
    pub fn from_sp_header(tc: &PusTc) -> Self {
        Self {
            packet_id_raw: tc.space_packet_header.packet_id.raw(),
            packet_seq_ctrl_raw: tc.space_packet_header.packet_seq_ctrl.raw(),
        }
    }

    pub fn pack(&self) -> [u8; REQUEST_ID_SIZE] {
        let mut out = [0_u8; REQUEST_ID_SIZE];
        out[0..2].copy_from_slice(&self.packet_id_raw.to_be_bytes());
        out[2..4].copy_from_slice(&self.packet_seq_ctrl_raw.to_be_bytes());
        out
    }

    pub fn unpack(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < REQUEST_ID_SIZE {
            return Err(PacketError::BytesTooShort {
                expected: REQUEST_ID_SIZE,
                found: bytes.len(),
            });
        }
        let mut cursor = bytes;
        Ok(Self {
            packet_id_raw: cursor.read_u16::<BigEndian>().unwrap(),
            packet_seq_ctrl_raw: cursor.read_u16::<BigEndian>().unwrap(),
        })
    }
}

/// Identifies a single step within a multi-step command execution, for
/// `StepSuccess`/`StepFailure` reports. Its wire width is declared by the
/// embedder via [`Pfc`] (see `UnpackParams`).
pub type StepId = PacketFieldEnum;

/// An error code accompanying a failure report, plus any additional bytes
/// describing it. The error code's wire width is declared by the embedder
/// via [`Pfc`] (see `UnpackParams`); `error_data` is whatever remains of the
/// report's application data after the error code and runs to the end of
/// the packet, matching the original's `FailureNotice(code=..., data=...)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureNotice {
    pub error_code: PacketFieldEnum,
    pub error_data: Vec<u8>,
}

impl FailureNotice {
    pub fn new(pfc: Pfc, value: u64, error_data: Vec<u8>) -> Result<Self> {
        Ok(Self {
            error_code: PacketFieldEnum::new(pfc, value)?,
            error_data,
        })
    }

    pub fn pack(&self) -> Vec<u8> {
        let mut out = self.error_code.pack();
        out.extend_from_slice(&self.error_data);
        out
    }

    pub fn unpack(bytes: &[u8], pfc: Pfc) -> Result<Self> {
        let error_code = PacketFieldEnum::unpack(bytes, pfc)?;
        let error_data = bytes[pfc.byte_width()..].to_vec();
        Ok(Self { error_code, error_data })
    }
}

/// Declares the wire widths of the variable-length fields a Service 1
/// failure/step report may carry, since the standard does not fix them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnpackParams {
    pub step_id_pfc: Pfc,
    pub err_code_pfc: Pfc,
}

impl Default for UnpackParams {
    fn default() -> Self {
        Self {
            step_id_pfc: Pfc::OneByte,
            err_code_pfc: Pfc::TwoBytes,
        }
    }
}

/// Application data of a Service 1 report, independent of which subservice
/// carries it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service1Tm {
    pub subservice: Subservice,
    pub request_id: RequestId,
    pub step_id: Option<StepId>,
    pub failure_notice: Option<FailureNotice>,
}

impl Service1Tm {
    pub fn acceptance_success(request_id: RequestId) -> Self {
        Self {
            subservice: Subservice::AcceptanceSuccess,
            request_id,
            step_id: None,
            failure_notice: None,
        }
    }

    pub fn acceptance_failure(request_id: RequestId, failure_notice: FailureNotice) -> Self {
        Self {
            subservice: Subservice::AcceptanceFailure,
            request_id,
            step_id: None,
            failure_notice: Some(failure_notice),
        }
    }

    pub fn start_success(request_id: RequestId) -> Self {
        Self {
            subservice: Subservice::StartSuccess,
            request_id,
            step_id: None,
            failure_notice: None,
        }
    }

    pub fn start_failure(request_id: RequestId, failure_notice: FailureNotice) -> Self {
        Self {
            subservice: Subservice::StartFailure,
            request_id,
            step_id: None,
            failure_notice: Some(failure_notice),
        }
    }

    pub fn step_success(request_id: RequestId, step_id: StepId) -> Self {
        Self {
            subservice: Subservice::StepSuccess,
            request_id,
            step_id: Some(step_id),
            failure_notice: None,
        }
    }

    pub fn step_failure(request_id: RequestId, step_id: StepId, failure_notice: FailureNotice) -> Self {
        Self {
            subservice: Subservice::StepFailure,
            request_id,
            step_id: Some(step_id),
            failure_notice: Some(failure_notice),
        }
    }

    pub fn completion_success(request_id: RequestId) -> Self {
        Self {
            subservice: Subservice::CompletionSuccess,
            request_id,
            step_id: None,
            failure_notice: None,
        }
    }

    pub fn completion_failure(request_id: RequestId, failure_notice: FailureNotice) -> Self {
        Self {
            subservice: Subservice::CompletionFailure,
            request_id,
            step_id: None,
            failure_notice: Some(failure_notice),
        }
    }

    pub fn pack(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(REQUEST_ID_SIZE + 9);
        out.extend_from_slice(&self.request_id.pack());
        if let Some(step_id) = &self.step_id {
            out.extend_from_slice(&step_id.pack());
        }
        if let Some(notice) = &self.failure_notice {
            out.extend_from_slice(&notice.pack());
        }
        out
    }

    pub fn unpack(subservice: u8, bytes: &[u8], params: UnpackParams) -> Result<Self> {
        let subservice = Subservice::from_u8(subservice)?;
        let request_id = RequestId::unpack(bytes)?;
        let mut cursor = REQUEST_ID_SIZE;
        let step_id = if matches!(subservice, Subservice::StepSuccess | Subservice::StepFailure) {
            let field = StepId::unpack(&bytes[cursor..], params.step_id_pfc)?;
            cursor += params.step_id_pfc.byte_width();
            Some(field)
        } else {
            None
        };
        let failure_notice = if subservice.is_failure() {
            Some(FailureNotice::unpack(&bytes[cursor..], params.err_code_pfc)?)
        } else {
            None
        };
        Ok(Self {
            subservice,
            request_id,
            step_id,
            failure_notice,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ecss::tc::AckFlags;

    fn sample_request_id() -> RequestId {
        let tc = PusTc::new(17, 1, AckFlags::ALL, 0, vec![], Some(0x42), None, 7).unwrap();
        RequestId::from_sp_header(&tc)
    }

    #[test]
    fn request_id_roundtrip() {
        let request_id = sample_request_id();
        let packed = request_id.pack();
        assert_eq!(RequestId::unpack(&packed).unwrap(), request_id);
    }

    #[test]
    fn acceptance_success_roundtrip() {
        let report = Service1Tm::acceptance_success(sample_request_id());
        let packed = report.pack();
        let recovered = Service1Tm::unpack(1, &packed, UnpackParams::default()).unwrap();
        assert_eq!(recovered, report);
    }

    #[test]
    fn acceptance_failure_roundtrip() {
        let notice = FailureNotice::new(Pfc::TwoBytes, 0x00A1, vec![]).unwrap();
        let report = Service1Tm::acceptance_failure(sample_request_id(), notice);
        let packed = report.pack();
        let recovered = Service1Tm::unpack(2, &packed, UnpackParams::default()).unwrap();
        assert_eq!(recovered, report);
        assert!(recovered.subservice.is_failure());
    }

    /// S4 scenario: a step failure whose error code carries trailing
    /// `error_data` bytes `[0x02, 0x04]`.
    #[test]
    fn step_failure_roundtrip_with_error_data() {
        let params = UnpackParams {
            step_id_pfc: Pfc::OneByte,
            err_code_pfc: Pfc::OneByte,
        };
        let step = StepId::new(Pfc::OneByte, 3).unwrap();
        let notice = FailureNotice::new(Pfc::OneByte, 8, vec![0x02, 0x04]).unwrap();
        let report = Service1Tm::step_failure(sample_request_id(), step, notice);
        let packed = report.pack();
        let recovered = Service1Tm::unpack(6, &packed, params).unwrap();
        assert_eq!(recovered, report);
        assert_eq!(
            recovered.failure_notice.unwrap().error_data,
            vec![0x02, 0x04]
        );
    }

    #[test]
    fn unsupported_subservice_rejected() {
        assert!(matches!(
            Subservice::from_u8(9),
            Err(PacketError::InvalidEnumValue { value: 9, .. })
        ));
    }
}
