use core::fmt;
use core::str::FromStr;

use crate::constants::{
    SIG_TYPE_ECC_SHA1, SIG_TYPE_ECC_SHA256, SIG_TYPE_RSA2048_SHA1, SIG_TYPE_RSA2048_SHA256,
    SIG_TYPE_RSA4096_SHA1, SIG_TYPE_RSA4096_SHA256,
};
use crate::error::ParseError;

/**
    Signature type tag as stored (big-endian) at offset 0 of every signed
    CDN record. Values follow the console's signed-blob header convention.
*/
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SignatureType {
    Rsa4096Sha1 = SIG_TYPE_RSA4096_SHA1,
    Rsa2048Sha1 = SIG_TYPE_RSA2048_SHA1,
    EccSha1 = SIG_TYPE_ECC_SHA1,
    Rsa4096Sha256 = SIG_TYPE_RSA4096_SHA256,
    Rsa2048Sha256 = SIG_TYPE_RSA2048_SHA256,
    EccSha256 = SIG_TYPE_ECC_SHA256,
}

impl SignatureType {
    pub const ALL: [Self; 6] = [
        Self::Rsa4096Sha1,
        Self::Rsa2048Sha1,
        Self::EccSha1,
        Self::Rsa4096Sha256,
        Self::Rsa2048Sha256,
        Self::EccSha256,
    ];

    pub const fn from_u32(u: u32) -> Option<Self> {
        match u {
            SIG_TYPE_RSA4096_SHA1 => Some(Self::Rsa4096Sha1),
            SIG_TYPE_RSA2048_SHA1 => Some(Self::Rsa2048Sha1),
            SIG_TYPE_ECC_SHA1 => Some(Self::EccSha1),
            SIG_TYPE_RSA4096_SHA256 => Some(Self::Rsa4096Sha256),
            SIG_TYPE_RSA2048_SHA256 => Some(Self::Rsa2048Sha256),
            SIG_TYPE_ECC_SHA256 => Some(Self::EccSha256),
            _ => None,
        }
    }

    pub const fn to_u32(self) -> u32 {
        self as u32
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.to_name().eq_ignore_ascii_case(name))
    }

    pub const fn to_name(self) -> &'static str {
        match self {
            Self::Rsa4096Sha1 => "rsa4096-sha1",
            Self::Rsa2048Sha1 => "rsa2048-sha1",
            Self::EccSha1 => "ecc-sha1",
            Self::Rsa4096Sha256 => "rsa4096-sha256",
            Self::Rsa2048Sha256 => "rsa2048-sha256",
            Self::EccSha256 => "ecc-sha256",
        }
    }

    /// Size in bytes of the signature blob that follows the tag.
    pub const fn signature_len(self) -> usize {
        match self {
            Self::Rsa4096Sha1 | Self::Rsa4096Sha256 => 0x200,
            Self::Rsa2048Sha1 | Self::Rsa2048Sha256 => 0x100,
            Self::EccSha1 | Self::EccSha256 => 0x3C,
        }
    }
}

impl From<SignatureType> for u32 {
    fn from(t: SignatureType) -> Self {
        t.to_u32()
    }
}

impl fmt::Display for SignatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_name())
    }
}

impl FromStr for SignatureType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| ParseError {
            kind: "signature type",
            value: s.to_owned(),
        })
    }
}

/// RSA modulus size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RsaKeySize {
    Rsa2048,
    Rsa4096,
}

impl RsaKeySize {
    /// Modulus (and private exponent) length in bytes.
    pub const fn byte_len(self) -> usize {
        match self {
            Self::Rsa2048 => 0x100,
            Self::Rsa4096 => 0x200,
        }
    }

    pub const fn bits(self) -> usize {
        self.byte_len() * 8
    }
}

impl fmt::Display for RsaKeySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RSA-{}", self.bits())
    }
}

/// Digest algorithm used for a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
}

impl HashAlgorithm {
    pub const fn digest_len(self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 => 32,
        }
    }

    pub const fn to_name(self) -> &'static str {
        match self {
            Self::Sha1 => "SHA-1",
            Self::Sha256 => "SHA-256",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_name())
    }
}

/**
    Hash identifier embedded in the PKCS#1 v1.5 `DigestInfo` prefix.

    Kept separate from [`HashAlgorithm`]: ECC signature types carry a digest
    algorithm but have no PKCS#1 identifier, and the RSA path must reject them.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PkcsHashId {
    Sha1,
    Sha256,
}

/**
    A decrypted 16-byte title key.

    `Display` prints the key as lowercase hex.
*/
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TitleKey([u8; 16]);

impl TitleKey {
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    pub const fn to_bytes(self) -> [u8; 16] {
        self.0
    }

    /// True for the all-zero key produced when no common key was available.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 16]
    }
}

impl fmt::Display for TitleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for TitleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TitleKey(..)")
    }
}

impl From<[u8; 16]> for TitleKey {
    fn from(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for TitleKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
