/*!
    Signature-type → algorithm lookups.

    Every lookup is a pure function over one immutable table and is total:
    an unrecognized tag yields `None` (or `0` for the digest length) instead
    of an error. Callers decide how to reject it.

    | Tag      | Type            | RSA key  | Digest  | PKCS#1 id |
    |----------|-----------------|----------|---------|-----------|
    | 0x10000  | RSA-4096/SHA-1  | 4096-bit | SHA-1   | SHA-1     |
    | 0x10001  | RSA-2048/SHA-1  | 2048-bit | SHA-1   | SHA-1     |
    | 0x10002  | ECC/SHA-1       | -        | SHA-1   | -         |
    | 0x10003  | RSA-4096/SHA-256| 4096-bit | SHA-256 | SHA-256   |
    | 0x10004  | RSA-2048/SHA-256| 2048-bit | SHA-256 | SHA-256   |
    | 0x10005  | ECC/SHA-256     | -        | SHA-256 | -         |
*/
use crate::types::{HashAlgorithm, PkcsHashId, RsaKeySize, SignatureType};

struct AlgorithmEntry {
    sig_type: SignatureType,
    key_size: Option<RsaKeySize>,
    hash: HashAlgorithm,
    pkcs_id: Option<PkcsHashId>,
}

static ALGORITHMS: [AlgorithmEntry; 6] = [
    AlgorithmEntry {
        sig_type: SignatureType::Rsa4096Sha1,
        key_size: Some(RsaKeySize::Rsa4096),
        hash: HashAlgorithm::Sha1,
        pkcs_id: Some(PkcsHashId::Sha1),
    },
    AlgorithmEntry {
        sig_type: SignatureType::Rsa2048Sha1,
        key_size: Some(RsaKeySize::Rsa2048),
        hash: HashAlgorithm::Sha1,
        pkcs_id: Some(PkcsHashId::Sha1),
    },
    AlgorithmEntry {
        sig_type: SignatureType::EccSha1,
        key_size: None,
        hash: HashAlgorithm::Sha1,
        pkcs_id: None,
    },
    AlgorithmEntry {
        sig_type: SignatureType::Rsa4096Sha256,
        key_size: Some(RsaKeySize::Rsa4096),
        hash: HashAlgorithm::Sha256,
        pkcs_id: Some(PkcsHashId::Sha256),
    },
    AlgorithmEntry {
        sig_type: SignatureType::Rsa2048Sha256,
        key_size: Some(RsaKeySize::Rsa2048),
        hash: HashAlgorithm::Sha256,
        pkcs_id: Some(PkcsHashId::Sha256),
    },
    AlgorithmEntry {
        sig_type: SignatureType::EccSha256,
        key_size: None,
        hash: HashAlgorithm::Sha256,
        pkcs_id: None,
    },
];

fn entry(sig_type: u32) -> Option<&'static AlgorithmEntry> {
    let sig_type = SignatureType::from_u32(sig_type)?;
    ALGORITHMS.iter().find(|e| e.sig_type == sig_type)
}

/// RSA key size for a tag. `None` for ECC and unknown tags.
pub fn key_size_for(sig_type: impl Into<u32>) -> Option<RsaKeySize> {
    entry(sig_type.into()).and_then(|e| e.key_size)
}

/// Digest algorithm for a tag. `None` only for unknown tags.
pub fn hash_algorithm_for(sig_type: impl Into<u32>) -> Option<HashAlgorithm> {
    entry(sig_type.into()).map(|e| e.hash)
}

/// PKCS#1 v1.5 hash identifier for a tag. `None` for ECC and unknown tags.
pub fn pkcs_hash_id_for(sig_type: impl Into<u32>) -> Option<PkcsHashId> {
    entry(sig_type.into()).and_then(|e| e.pkcs_id)
}

/// Digest length in bytes for a tag, `0` for unknown tags.
pub fn digest_len_for(sig_type: impl Into<u32>) -> usize {
    hash_algorithm_for(sig_type).map_or(0, HashAlgorithm::digest_len)
}
