//! ECSS-E-ST-70-41C Packet Utilization Standard (PUS) services layered atop
//! the CCSDS Space Packet container.

pub mod tc;
pub mod tm;
pub mod verification;
pub mod test_service;

use crate::error::{PacketError, Result};

/// Which revision of the PUS secondary header a packet carries.
///
/// There is deliberately no `GlobalConfig` sentinel variant here (see §9):
/// callers that want "use the process default" pass `None` to the
/// constructors that accept `Option<PusVersion>` instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PusVersion {
    /// Version nibble `0b000`.
    PusA,
    /// Version nibble `0b010` (2).
    PusC,
}

impl PusVersion {
    pub(crate) fn version_nibble(self) -> u8 {
        match self {
            PusVersion::PusA => 0b000,
            PusVersion::PusC => 0b010,
        }
    }

    pub(crate) fn from_version_nibble(nibble: u8) -> Result<Self> {
        match nibble {
            0b000 => Ok(PusVersion::PusA),
            0b010 => Ok(PusVersion::PusC),
            other => Err(PacketError::InvalidPusVersion(other)),
        }
    }
}

/// Well-known PUS service numbers used by the service bodies in this crate.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PusServiceId {
    Verification = 1,
    Test = 17,
}

/// Packet Field Code: declares the on-wire byte width of a PUS numeric
/// field. Only the four widths the standard defines are representable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pfc {
    OneByte,
    TwoBytes,
    FourBytes,
    EightBytes,
}

impl Pfc {
    pub fn byte_width(self) -> usize {
        match self {
            Pfc::OneByte => 1,
            Pfc::TwoBytes => 2,
            Pfc::FourBytes => 4,
            Pfc::EightBytes => 8,
        }
    }

    pub fn from_byte_width(width: usize) -> Result<Self> {
        match width {
            1 => Ok(Pfc::OneByte),
            2 => Ok(Pfc::TwoBytes),
            4 => Ok(Pfc::FourBytes),
            8 => Ok(Pfc::EightBytes),
            other => Err(PacketError::FieldOverflow {
                value: other as u64,
                bits: 8,
            }),
        }
    }
}

/// A numeric value tagged with its declared [`Pfc`] width, used for the
/// variable-width `StepId` and error-code fields of Service 1 reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PacketFieldEnum {
    pub pfc: Pfc,
    pub value: u64,
}

impl PacketFieldEnum {
    pub fn new(pfc: Pfc, value: u64) -> Result<Self> {
        let max = match pfc {
            Pfc::OneByte => u8::MAX as u64,
            Pfc::TwoBytes => u16::MAX as u64,
            Pfc::FourBytes => u32::MAX as u64,
            Pfc::EightBytes => u64::MAX,
        };
        if value > max {
            return Err(PacketError::FieldOverflow {
                value,
                bits: pfc.byte_width() as u32 * 8,
            });
        }
        Ok(Self { pfc, value })
    }

    pub fn pack(&self) -> Vec<u8> {
        let width = self.pfc.byte_width();
        self.value.to_be_bytes()[8 - width..].to_vec()
    }

    pub fn unpack(bytes: &[u8], pfc: Pfc) -> Result<Self> {
        let width = pfc.byte_width();
        if bytes.len() < width {
            return Err(PacketError::BytesTooShort {
                expected: width,
                found: bytes.len(),
            });
        }
        let mut buf = [0_u8; 8];
        buf[8 - width..].copy_from_slice(&bytes[..width]);
        Ok(Self {
            pfc,
            value: u64::from_be_bytes(buf),
        })
    }
}

/// Read the service ID (byte 7) straight out of a raw PUS packet without a
/// full decode, mirroring `get_service_from_raw_pus_packet` in the Python
/// original (see §4.9).
pub fn pus_service_id(raw: &[u8]) -> Result<u8> {
    if raw.len() < 8 {
        return Err(PacketError::BytesTooShort {
            expected: 8,
            found: raw.len(),
        });
    }
    Ok(raw[7])
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(PusVersion::PusA, 0b000)]
    #[case(PusVersion::PusC, 0b010)]
    fn version_nibble_roundtrip(#[case] version: PusVersion, #[case] nibble: u8) {
        assert_eq!(version.version_nibble(), nibble);
        assert_eq!(PusVersion::from_version_nibble(nibble).unwrap(), version);
    }

    #[test]
    fn invalid_version_nibble() {
        assert!(matches!(
            PusVersion::from_version_nibble(1),
            Err(PacketError::InvalidPusVersion(1))
        ));
    }

    #[rstest]
    #[case(Pfc::OneByte, 0xAB)]
    #[case(Pfc::TwoBytes, 0xABCD)]
    #[case(Pfc::FourBytes, 0xDEAD_BEEF)]
    #[case(Pfc::EightBytes, u64::MAX)]
    fn packet_field_enum_roundtrip(#[case] pfc: Pfc, #[case] value: u64) {
        let field = PacketFieldEnum::new(pfc, value).unwrap();
        let packed = field.pack();
        assert_eq!(packed.len(), pfc.byte_width());
        let recovered = PacketFieldEnum::unpack(&packed, pfc).unwrap();
        assert_eq!(recovered, field);
    }

    #[test]
    fn packet_field_enum_overflow() {
        assert!(PacketFieldEnum::new(Pfc::OneByte, 0x100).is_err());
    }

    #[test]
    fn service_id_from_raw() {
        let raw = [0_u8; 8];
        assert_eq!(pus_service_id(&raw).unwrap(), 0);
        assert!(pus_service_id(&raw[..7]).is_err());
    }
}
