//! ECSS Service 17: Test. A connection-test ping/pong pair with no
//! application data of its own.

use crate::ecss::tm::PusTm;
use crate::ecss::PusServiceId;
use crate::error::Result;
use crate::time::CdsShortTimestamp;

/// Subservices of Service 17.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subservice {
    TcPing = 1,
    TmReply = 2,
}

/// A Service 17 `TmReply` (subservice 2), a thin wrapper over [`PusTm`]
/// carrying no source data beyond the common secondary header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service17Tm(pub PusTm);

impl Service17Tm {
    pub fn new(timestamp: CdsShortTimestamp, seq_count: u16, apid: Option<u16>) -> Result<Self> {
        let tm = PusTm::new(
            PusServiceId::Test as u8,
            Subservice::TmReply as u8,
            timestamp,
            seq_count,
            vec![],
            apid,
            None,
            0,
            0,
            0,
        )?;
        Ok(Self(tm))
    }

    pub fn pack(&self) -> Vec<u8> {
        self.0.pack()
    }

    /// Decode a Service 17 reply. `timestamp_len` is accepted for parity
    /// with the variable-length timestamps the standard allows in
    /// general, even though this crate only implements the fixed 7-byte
    /// CDS short code (see §4.9); any other value is rejected.
    pub fn unpack(raw: &[u8], timestamp_len: usize) -> Result<(Self, usize)> {
        use crate::error::PacketError;
        use crate::time::CDS_SHORT_TIMESTAMP_SIZE;

        if timestamp_len != CDS_SHORT_TIMESTAMP_SIZE {
            return Err(PacketError::FieldOverflow {
                value: timestamp_len as u64,
                bits: (CDS_SHORT_TIMESTAMP_SIZE * 8) as u32,
            });
        }
        let (tm, trailing) = PusTm::unpack(raw, None)?;
        Ok((Self(tm), trailing))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ping_reply_roundtrip() {
        let reply = Service17Tm::new(CdsShortTimestamp::zero(), 22, Some(0xEF)).unwrap();
        let packed = reply.pack();
        let (recovered, trailing) = Service17Tm::unpack(&packed, 7).unwrap();
        assert_eq!(trailing, 0);
        assert_eq!(recovered, reply);
        assert_eq!(recovered.0.secondary_header.subservice, Subservice::TmReply as u8);
    }

    #[test]
    fn wrong_timestamp_len_rejected() {
        let reply = Service17Tm::new(CdsShortTimestamp::zero(), 0, None).unwrap();
        let packed = reply.pack();
        assert!(Service17Tm::unpack(&packed, 4).is_err());
    }
}
