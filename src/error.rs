use thiserror::Error;

/// A crate-wide `Result`, conveniently wrapping [`PacketError`].
pub type Result<T> = std::result::Result<T, PacketError>;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
/// Error taxonomy shared by every codec in this crate.
pub enum PacketError {
    #[error("buffer of {found} bytes is shorter than the {expected} bytes required")]
    BytesTooShort { expected: usize, found: usize },

    #[error("PUS secondary header version nibble {0:#x} is neither PUS-A (0) nor PUS-C (2)")]
    InvalidPusVersion(u8),

    #[error("PUS packet CRC16 does not close: expected residue 0, computed {0:#06x}")]
    InvalidTmCrc16(u16),

    #[error("value {value} does not fit in a {bits}-bit field")]
    FieldOverflow { value: u64, bits: u32 },

    #[error("TLV type code {found:#04x} does not match the expected {expected:#04x}")]
    TlvTypeMismatch { expected: u8, found: u8 },

    #[error("TLV length {length} is inconsistent with the available {available} bytes")]
    InvalidTlvLength { length: usize, available: usize },

    #[error("CFDP directive code {0:#04x} is not a recognized file directive")]
    UnsupportedDirectiveCode(u8),

    #[error("duplicate {0} field is not permitted more than once")]
    DuplicateField(&'static str),

    #[error("value {value:#04x} is not a valid {domain}")]
    InvalidEnumValue { domain: &'static str, value: u8 },
}
