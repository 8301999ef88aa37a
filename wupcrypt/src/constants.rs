use hex_literal::hex;

/*
    Signature type tags (big-endian u32 at offset 0 of a signed record).
*/
pub const SIG_TYPE_RSA4096_SHA1: u32 = 0x0001_0000;
pub const SIG_TYPE_RSA2048_SHA1: u32 = 0x0001_0001;
pub const SIG_TYPE_ECC_SHA1: u32 = 0x0001_0002;
pub const SIG_TYPE_RSA4096_SHA256: u32 = 0x0001_0003;
pub const SIG_TYPE_RSA2048_SHA256: u32 = 0x0001_0004;
pub const SIG_TYPE_ECC_SHA256: u32 = 0x0001_0005;

/**
    Fixed RSA public exponent (65537) shared by every CDN signing key.
    Only the modulus and, for signing, the private exponent are supplied per key.
*/
pub const RSA_PUBLIC_EXPONENT: [u8; 3] = hex!("010001");

pub const AES_BLOCK_SIZE: usize = 16;

/**
    Length of the fixed part of a ticket record, up to and including the
    limit-entry table. Tickets on the CDN are usually longer (0x350 bytes)
    because a content index section follows; those bytes are not decoded.
*/
pub const TICKET_RECORD_SIZE: usize = 0x2A4;

/// Start of the signed region of a ticket (the issuer field).
pub const TICKET_SIGNED_BODY_OFFSET: usize = 0x140;

/// Offset of the encrypted title key inside a ticket.
pub const TICKET_TITLE_KEY_OFFSET: u64 = 0x1BF;

/// Offset of the title id inside a ticket.
pub const TICKET_TITLE_ID_OFFSET: u64 = 0x1DC;
