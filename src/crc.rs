//! CRC-16/CCITT-FALSE: polynomial 0x1021, initial value 0xFFFF, no input or
//! output reflection, no final XOR. Used to close every PUS TM/TC packet.

use crc::{Crc, CRC_16_IBM_3740};

/// The `crc` crate's `CRC_16_IBM_3740` constant is CRC-16/CCITT-FALSE under
/// a different name: poly 0x1021, init 0xFFFF, refin/refout false, xorout 0.
const CRC_CCITT_FALSE: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);

/// Compute the CRC-16/CCITT-FALSE checksum over `bytes`.
///
/// For any packet `P` produced by a `pack()` in this crate,
/// `crc16(P) == 0` by construction: the trailing two bytes are chosen so the
/// checksum of the whole packet closes to zero.
pub fn crc16(bytes: &[u8]) -> u16 {
    CRC_CCITT_FALSE.checksum(bytes)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn known_vector() {
        // "123456789" is the standard CRC check string; CRC-16/CCITT-FALSE
        // (check value from the CRC RevEng catalogue) is 0x29B1.
        assert_eq!(crc16(b"123456789"), 0x29B1);
    }

    #[test]
    fn closes_over_itself() {
        let mut data = b"a test input".to_vec();
        let crc = crc16(&data);
        data.extend_from_slice(&crc.to_be_bytes());
        assert_eq!(crc16(&data), 0);
    }

    #[test]
    fn single_bit_flip_breaks_closure() {
        let mut data = b"a test input".to_vec();
        let crc = crc16(&data);
        data.extend_from_slice(&crc.to_be_bytes());
        data[3] ^= 0x01;
        assert_ne!(crc16(&data), 0);
    }
}
