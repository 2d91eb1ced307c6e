//! File directive PDUs (§4.7): a [`crate::cfdp::header::PduHeader`] followed
//! by a one-byte directive code identifying the payload that follows.

use crate::cfdp::header::PduHeader;
use crate::error::{PacketError, Result};

/// Directive codes identifying which file directive PDU follows the
/// header, per §4.7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveCode {
    Eof = 0x04,
    Finished = 0x05,
    Ack = 0x06,
    Metadata = 0x07,
    Nak = 0x08,
    Prompt = 0x09,
    KeepAlive = 0x0C,
}

impl DirectiveCode {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Result<Self> {
        Ok(match code {
            0x04 => Self::Eof,
            0x05 => Self::Finished,
            0x06 => Self::Ack,
            0x07 => Self::Metadata,
            0x08 => Self::Nak,
            0x09 => Self::Prompt,
            0x0C => Self::KeepAlive,
            other => return Err(PacketError::UnsupportedDirectiveCode(other)),
        })
    }
}

/// The common prefix every file directive PDU shares: a [`PduHeader`]
/// followed by its [`DirectiveCode`]. Directive-specific bodies (such as
/// [`crate::cfdp::finished::FinishedPdu`]) are layered on top of this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDirectivePdu {
    pub header: PduHeader,
    pub directive_code: DirectiveCode,
}

impl FileDirectivePdu {
    pub fn new(header: PduHeader, directive_code: DirectiveCode) -> Self {
        Self { header, directive_code }
    }

    pub fn pack(&self) -> Vec<u8> {
        let mut out = self.header.pack();
        out.push(self.directive_code.code());
        out
    }

    /// Decode the header and directive code; returns the parsed prefix and
    /// the offset of the byte immediately following the directive code.
    pub fn unpack(bytes: &[u8]) -> Result<(Self, usize)> {
        let header = PduHeader::unpack(bytes)?;
        let offset = header.header_len();
        if bytes.len() <= offset {
            return Err(PacketError::BytesTooShort {
                expected: offset + 1,
                found: bytes.len(),
            });
        }
        let directive_code = DirectiveCode::from_code(bytes[offset])?;
        Ok((Self { header, directive_code }, offset + 1))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cfdp::header::{Direction, PduConfig, PduType};

    #[test]
    fn directive_code_roundtrip() {
        for code in [
            DirectiveCode::Eof,
            DirectiveCode::Finished,
            DirectiveCode::Ack,
            DirectiveCode::Metadata,
            DirectiveCode::Nak,
            DirectiveCode::Prompt,
            DirectiveCode::KeepAlive,
        ] {
            assert_eq!(DirectiveCode::from_code(code.code()).unwrap(), code);
        }
    }

    #[test]
    fn unsupported_directive_code_rejected() {
        assert!(matches!(
            DirectiveCode::from_code(0xFF),
            Err(PacketError::UnsupportedDirectiveCode(0xFF))
        ));
    }

    #[test]
    fn file_directive_prefix_roundtrip() {
        let header = PduHeader::new(
            PduType::FileDirective,
            Direction::TowardReceiver,
            2,
            PduConfig::default(),
        )
        .unwrap();
        let pdu = FileDirectivePdu::new(header, DirectiveCode::Finished);
        let packed = pdu.pack();
        let (recovered, consumed) = FileDirectivePdu::unpack(&packed).unwrap();
        assert_eq!(recovered, pdu);
        assert_eq!(consumed, packed.len());
    }
}
