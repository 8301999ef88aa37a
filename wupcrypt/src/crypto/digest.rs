use sha1::Sha1;
use sha2::{Digest as _, Sha256};
use subtle::ConstantTimeEq;

use crate::types::HashAlgorithm;

/// A computed message digest, sized by its algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Digest {
    Sha1([u8; 20]),
    Sha256([u8; 32]),
}

impl Digest {
    pub const fn algorithm(&self) -> HashAlgorithm {
        match self {
            Self::Sha1(_) => HashAlgorithm::Sha1,
            Self::Sha256(_) => HashAlgorithm::Sha256,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Sha1(d) => d,
            Self::Sha256(d) => d,
        }
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Hash `data` with the given algorithm in a single pass.
pub fn compute_digest(data: &[u8], algorithm: HashAlgorithm) -> Digest {
    match algorithm {
        HashAlgorithm::Sha1 => Digest::Sha1(Sha1::digest(data).into()),
        HashAlgorithm::Sha256 => Digest::Sha256(Sha256::digest(data).into()),
    }
}

/**
    Check that SHA-256 of `data` equals `expected`.

    Used for content hash checks (TMD content records). The comparison runs
    in constant time.
*/
pub fn verify_sha256(data: &[u8], expected: &[u8; 32]) -> bool {
    let actual: [u8; 32] = Sha256::digest(data).into();
    actual[..].ct_eq(&expected[..]).into()
}
