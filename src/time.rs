//! CCSDS Day Segmented (CDS) short time code, as used by PUS secondary
//! headers (CCSDS 301.0-B-4).

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::Read;

use crate::error::{PacketError, Result};

/// Fixed length of the CDS short timestamp on the wire.
pub const CDS_SHORT_TIMESTAMP_SIZE: usize = 7;

/// Low nibble of the p-field identifying the CDS time code, per §4.3.
const CDS_TIME_CODE_ID: u8 = 0b0100;

/// Extract the time code identification nibble from a p-field byte.
pub fn read_p_field(p_field: u8) -> u8 {
    p_field & 0x0F
}

/// A 7-byte CCSDS Day Segmented short timestamp:
/// `[p_field:1][days_from_epoch:2 BE][ms_of_day:4 BE]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CdsShortTimestamp {
    /// Identifies the time code and extension state. Bit 7 is the
    /// extension flag; the low nibble must equal [`CDS_TIME_CODE_ID`].
    pub p_field: u8,
    /// Days elapsed since the CCSDS epoch (1958-01-01).
    pub days_from_epoch: u16,
    /// Milliseconds elapsed since midnight of `days_from_epoch`.
    pub ms_of_day: u32,
}

impl CdsShortTimestamp {
    /// Build a timestamp with the canonical CDS p-field.
    pub fn new(days_from_epoch: u16, ms_of_day: u32) -> Self {
        Self {
            p_field: CDS_TIME_CODE_ID,
            days_from_epoch,
            ms_of_day,
        }
    }

    /// Build a timestamp whose wire bytes are all zero; useful as a
    /// structural placeholder in tests and in scenarios where the
    /// embedder has not yet wired in a [`ClockSource`].
    pub fn zero() -> Self {
        Self::new(0, 0)
    }

    /// Use an embedder-supplied clock rather than reading system time
    /// directly from the codec core (see §6 Clock interface).
    pub fn init_from_current_time(clock: &dyn ClockSource) -> Self {
        clock.now()
    }

    pub fn pack(&self) -> [u8; CDS_SHORT_TIMESTAMP_SIZE] {
        let mut out = [0_u8; CDS_SHORT_TIMESTAMP_SIZE];
        out[0] = self.p_field;
        (&mut out[1..3])
            .write_u16::<BigEndian>(self.days_from_epoch)
            .expect("fixed-size buffer write cannot fail");
        (&mut out[3..7])
            .write_u32::<BigEndian>(self.ms_of_day)
            .expect("fixed-size buffer write cannot fail");
        out
    }

    pub fn unpack<R: Read>(buffer: &mut R) -> Result<Self> {
        let mut raw = [0_u8; CDS_SHORT_TIMESTAMP_SIZE];
        buffer
            .read_exact(&mut raw)
            .map_err(|_| PacketError::BytesTooShort {
                expected: CDS_SHORT_TIMESTAMP_SIZE,
                found: 0,
            })?;
        let mut cursor = &raw[1..];
        Ok(Self {
            p_field: raw[0],
            days_from_epoch: cursor.read_u16::<BigEndian>().unwrap(),
            ms_of_day: cursor.read_u32::<BigEndian>().unwrap(),
        })
    }
}

/// External collaborator injected by the embedder so the codec core never
/// reads system time directly (see §6).
pub trait ClockSource {
    fn now(&self) -> CdsShortTimestamp;
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    struct FixedClock(CdsShortTimestamp);
    impl ClockSource for FixedClock {
        fn now(&self) -> CdsShortTimestamp {
            self.0
        }
    }

    #[rstest]
    #[case(0, 0)]
    #[case(19723, 43_200_000)]
    #[case(u16::MAX, u32::MAX)]
    fn roundtrip(#[case] days: u16, #[case] ms: u32) {
        let expected = CdsShortTimestamp::new(days, ms);
        let packed = expected.pack();
        let recovered = CdsShortTimestamp::unpack(&mut packed.as_slice()).unwrap();
        assert_eq!(expected, recovered);
    }

    #[test]
    fn unpack_too_short() {
        let buf = [0_u8; 3];
        assert!(matches!(
            CdsShortTimestamp::unpack(&mut buf.as_slice()),
            Err(PacketError::BytesTooShort { .. })
        ));
    }

    #[test]
    fn clock_injection() {
        let fixed = FixedClock(CdsShortTimestamp::new(1, 2));
        let ts = CdsShortTimestamp::init_from_current_time(&fixed);
        assert_eq!(ts, CdsShortTimestamp::new(1, 2));
    }

    #[test]
    fn time_code_id_matches_cds() {
        let ts = CdsShortTimestamp::zero();
        assert_eq!(read_p_field(ts.p_field), CDS_TIME_CODE_ID);
    }
}
