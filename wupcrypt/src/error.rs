use thiserror::Error;

/// Errors from signature dispatch, block cipher and ticket operations.
///
/// A signature that fails to verify is not an error: [`crate::verify`]
/// returns `Ok(false)` for that case. An `Err` always means the operation
/// could not run at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptError {
    // ── Algorithm selection ───────────────────────────────────────────
    #[error("unsupported signature type 0x{0:08x}")]
    UnsupportedSignatureType(u32),

    // ── RSA ───────────────────────────────────────────────────────────
    #[error("RSA key init failed: {0}")]
    KeyInit(String),
    #[error("RSA signing failed: {0}")]
    Signing(String),

    // ── AES ───────────────────────────────────────────────────────────
    #[error("invalid cipher input: {0}")]
    InvalidCipherInput(String),

    // ── Ticket parsing ────────────────────────────────────────────────
    #[error("ticket record too small ({size} bytes, need at least {required})")]
    RecordTooSmall { size: usize, required: usize },
    #[error("ticket record at offset {offset} with size {size} exceeds source ({available} bytes)")]
    RecordOutOfBounds {
        offset: u64,
        size: usize,
        available: usize,
    },

    // ── Key material ──────────────────────────────────────────────────
    #[error("no common key available for index {0}")]
    MissingKeyMaterial(u8),

    // ── I/O ───────────────────────────────────────────────────────────
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for CryptError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

/// Type alias for results that may return a [`CryptError`].
pub type CryptResult<T> = std::result::Result<T, CryptError>;

/// Error returned by `FromStr` implementations on enum types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseError {
    pub kind: &'static str,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_type_formats_as_hex() {
        let err = CryptError::UnsupportedSignatureType(0x10002);
        assert_eq!(err.to_string(), "unsupported signature type 0x00010002");
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such ticket");
        let err = CryptError::from(io);
        assert!(matches!(err, CryptError::Io(ref msg) if msg.contains("no such ticket")));
    }
}
