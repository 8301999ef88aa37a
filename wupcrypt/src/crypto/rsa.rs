use rsa::{BigUint, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::Sha256;

use crate::constants::RSA_PUBLIC_EXPONENT;
use crate::crypto::digest::compute_digest;
use crate::error::{CryptError, CryptResult};
use crate::registry::{hash_algorithm_for, key_size_for, pkcs_hash_id_for};
use crate::types::{HashAlgorithm, PkcsHashId, RsaKeySize};

/**
    Raw big-endian RSA key material, borrowed for a single sign or verify call.

    The public exponent is always 65537 and is not part of the material.
    The private exponent is only needed for signing.
*/
#[derive(Clone, Copy)]
pub struct RsaKeyMaterial<'a> {
    pub modulus: &'a [u8],
    pub private_exponent: Option<&'a [u8]>,
}

impl<'a> RsaKeyMaterial<'a> {
    pub const fn public(modulus: &'a [u8]) -> Self {
        Self {
            modulus,
            private_exponent: None,
        }
    }

    pub const fn private(modulus: &'a [u8], private_exponent: &'a [u8]) -> Self {
        Self {
            modulus,
            private_exponent: Some(private_exponent),
        }
    }
}

impl core::fmt::Debug for RsaKeyMaterial<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RsaKeyMaterial")
            .field("modulus_len", &self.modulus.len())
            .field("has_private_exponent", &self.private_exponent.is_some())
            .finish()
    }
}

/**
    Everything a signature type resolves to on the RSA path.

    ECC and unknown tags fail here with `UnsupportedSignatureType`, before
    any key material is touched.
*/
struct RsaScheme {
    key_size: RsaKeySize,
    hash: HashAlgorithm,
    pkcs_id: PkcsHashId,
}

impl RsaScheme {
    fn resolve(sig_type: u32) -> CryptResult<Self> {
        let key_size =
            key_size_for(sig_type).ok_or(CryptError::UnsupportedSignatureType(sig_type))?;
        let hash =
            hash_algorithm_for(sig_type).ok_or(CryptError::UnsupportedSignatureType(sig_type))?;
        let pkcs_id =
            pkcs_hash_id_for(sig_type).ok_or(CryptError::UnsupportedSignatureType(sig_type))?;

        log::debug!("signature type 0x{sig_type:08x}: {key_size} with {hash}");

        Ok(Self {
            key_size,
            hash,
            pkcs_id,
        })
    }

    fn padding(&self) -> Pkcs1v15Sign {
        match self.pkcs_id {
            PkcsHashId::Sha1 => Pkcs1v15Sign::new::<Sha1>(),
            PkcsHashId::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
        }
    }

    fn check_len(&self, what: &str, bytes: &[u8]) -> CryptResult<()> {
        let expected = self.key_size.byte_len();
        if bytes.len() != expected {
            return Err(CryptError::KeyInit(format!(
                "{what} must be {expected} bytes for {}, got {}",
                self.key_size,
                bytes.len()
            )));
        }
        Ok(())
    }

    /// Length check plus a set top bit, so the key really has `key_size` bits.
    fn check_modulus(&self, modulus: &[u8]) -> CryptResult<()> {
        self.check_len("modulus", modulus)?;
        if modulus[0] & 0x80 == 0 {
            return Err(CryptError::KeyInit(format!(
                "modulus is shorter than {} bits",
                self.key_size.bits()
            )));
        }
        Ok(())
    }

    fn public_key(&self, key: &RsaKeyMaterial<'_>) -> CryptResult<RsaPublicKey> {
        self.check_modulus(key.modulus)?;
        RsaPublicKey::new(
            BigUint::from_bytes_be(key.modulus),
            BigUint::from_bytes_be(&RSA_PUBLIC_EXPONENT),
        )
        .map_err(|e| CryptError::KeyInit(e.to_string()))
    }

    fn private_key(&self, key: &RsaKeyMaterial<'_>) -> CryptResult<RsaPrivateKey> {
        self.check_modulus(key.modulus)?;
        let d = key
            .private_exponent
            .ok_or_else(|| CryptError::Signing("no private exponent supplied".into()))?;
        self.check_len("private exponent", d)?;

        RsaPrivateKey::from_components(
            BigUint::from_bytes_be(key.modulus),
            BigUint::from_bytes_be(&RSA_PUBLIC_EXPONENT),
            BigUint::from_bytes_be(d),
            Vec::new(),
        )
        .map_err(|e| CryptError::KeyInit(e.to_string()))
    }
}

/**
    Produce a PKCS#1 v1.5 signature over `message` for an RSA signature type.

    The message is hashed here with the digest the type names; pass the raw
    bytes, not a digest. The result is exactly one modulus long.
*/
pub fn sign(
    sig_type: impl Into<u32>,
    key: &RsaKeyMaterial<'_>,
    message: &[u8],
) -> CryptResult<Vec<u8>> {
    let scheme = RsaScheme::resolve(sig_type.into())?;
    let private_key = scheme.private_key(key)?;
    let digest = compute_digest(message, scheme.hash);

    private_key
        .sign(scheme.padding(), digest.as_bytes())
        .map_err(|e| CryptError::Signing(e.to_string()))
}

/**
    Check a PKCS#1 v1.5 signature over `message`.

    Returns `Ok(false)` whenever the check runs and does not match, including
    a signature of the wrong length. `Err` is reserved for an unsupported type
    or unusable key material.
*/
pub fn verify(
    sig_type: impl Into<u32>,
    key: &RsaKeyMaterial<'_>,
    message: &[u8],
    signature: &[u8],
) -> CryptResult<bool> {
    let scheme = RsaScheme::resolve(sig_type.into())?;
    let public_key = scheme.public_key(key)?;
    let digest = compute_digest(message, scheme.hash);

    match public_key.verify(scheme.padding(), digest.as_bytes(), signature) {
        Ok(()) => Ok(true),
        Err(e) => {
            log::debug!("signature mismatch: {e}");
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SignatureType;
    use rsa::pkcs1::DecodeRsaPrivateKey;
    use rsa::traits::{PrivateKeyParts, PublicKeyParts};

    struct TestKey {
        n: Vec<u8>,
        d: Vec<u8>,
    }

    impl TestKey {
        fn load(der: &[u8]) -> Self {
            let key = RsaPrivateKey::from_pkcs1_der(der).unwrap();
            let n = key.n().to_bytes_be();
            let mut d = key.d().to_bytes_be();
            while d.len() < n.len() {
                d.insert(0, 0);
            }
            Self { n, d }
        }

        fn private(&self) -> RsaKeyMaterial<'_> {
            RsaKeyMaterial::private(&self.n, &self.d)
        }

        fn public(&self) -> RsaKeyMaterial<'_> {
            RsaKeyMaterial::public(&self.n)
        }
    }

    fn key_2048() -> TestKey {
        TestKey::load(include_bytes!("../../testfiles/rsa2048.der"))
    }

    fn key_4096() -> TestKey {
        TestKey::load(include_bytes!("../../testfiles/rsa4096.der"))
    }

    const FIXTURE_MESSAGE: &[u8] = b"wupcrypt fixture message";
    const FIXTURE_SIG: &[u8] = include_bytes!("../../testfiles/rsa2048_sha256.sig");

    #[test]
    fn sign_then_verify_rsa2048_sha256() {
        let key = key_2048();
        for len in [0usize, 1, 100_000] {
            let msg = vec![0x5Au8; len];
            let sig = sign(SignatureType::Rsa2048Sha256, &key.private(), &msg).unwrap();
            assert_eq!(sig.len(), 0x100);
            assert!(verify(SignatureType::Rsa2048Sha256, &key.public(), &msg, &sig).unwrap());
        }
    }

    #[test]
    fn sign_then_verify_rsa4096_sha1() {
        let key = key_4096();
        for len in [0usize, 1, 100_000] {
            let msg = vec![0xA5u8; len];
            let sig = sign(SignatureType::Rsa4096Sha1, &key.private(), &msg).unwrap();
            assert_eq!(sig.len(), 0x200);
            assert!(verify(SignatureType::Rsa4096Sha1, &key.public(), &msg, &sig).unwrap());
        }
    }

    #[test]
    fn known_good_signature_verifies() {
        let key = key_2048();
        assert!(
            verify(SignatureType::Rsa2048Sha256, &key.public(), FIXTURE_MESSAGE, FIXTURE_SIG)
                .unwrap()
        );
    }

    #[test]
    fn signing_is_deterministic() {
        let key = key_2048();
        let sig = sign(SignatureType::Rsa2048Sha256, &key.private(), FIXTURE_MESSAGE).unwrap();
        assert_eq!(sig, FIXTURE_SIG);
    }

    #[test]
    fn flipped_bit_fails_verification() {
        let key = key_2048();
        let mut sig = FIXTURE_SIG.to_vec();
        sig[0x80] ^= 0x01;
        assert!(!verify(SignatureType::Rsa2048Sha256, &key.public(), FIXTURE_MESSAGE, &sig).unwrap());
    }

    #[test]
    fn mismatches_are_false_not_errors() {
        let key = key_2048();
        let public = key.public();
        // wrong message
        assert!(!verify(SignatureType::Rsa2048Sha256, &public, b"other", FIXTURE_SIG).unwrap());
        // wrong digest for this signature
        assert!(!verify(SignatureType::Rsa2048Sha1, &public, FIXTURE_MESSAGE, FIXTURE_SIG).unwrap());
        // truncated signature
        assert!(
            !verify(SignatureType::Rsa2048Sha256, &public, FIXTURE_MESSAGE, &FIXTURE_SIG[1..])
                .unwrap()
        );
        assert!(!verify(SignatureType::Rsa2048Sha256, &public, FIXTURE_MESSAGE, &[]).unwrap());
    }

    #[test]
    fn ecc_and_unknown_types_are_rejected() {
        let key = key_2048();
        for tag in [
            SignatureType::EccSha1.to_u32(),
            SignatureType::EccSha256.to_u32(),
            0,
            0x10006,
        ] {
            let err = verify(tag, &key.public(), b"m", FIXTURE_SIG).unwrap_err();
            assert_eq!(err, CryptError::UnsupportedSignatureType(tag));
            let err = sign(tag, &key.private(), b"m").unwrap_err();
            assert_eq!(err, CryptError::UnsupportedSignatureType(tag));
        }
    }

    #[test]
    fn modulus_length_must_match_type() {
        let key = key_2048();
        let err = verify(SignatureType::Rsa4096Sha256, &key.public(), b"m", &[0u8; 0x200])
            .unwrap_err();
        assert!(matches!(err, CryptError::KeyInit(_)));

        let err = sign(SignatureType::Rsa4096Sha1, &key.private(), b"m").unwrap_err();
        assert!(matches!(err, CryptError::KeyInit(_)));
    }

    #[test]
    fn zero_led_modulus_is_rejected() {
        let key = key_2048();
        let mut short_n = key.n.clone();
        short_n[0] = 0;

        let err = sign(
            SignatureType::Rsa2048Sha256,
            &RsaKeyMaterial::private(&short_n, &key.d),
            b"m",
        )
        .unwrap_err();
        assert!(matches!(err, CryptError::KeyInit(_)));

        let err = verify(
            SignatureType::Rsa2048Sha256,
            &RsaKeyMaterial::public(&short_n),
            FIXTURE_MESSAGE,
            FIXTURE_SIG,
        )
        .unwrap_err();
        assert!(matches!(err, CryptError::KeyInit(_)));
    }

    #[test]
    fn private_exponent_length_must_match_modulus() {
        let key = key_2048();
        let short = RsaKeyMaterial::private(&key.n, &key.d[1..]);
        let err = sign(SignatureType::Rsa2048Sha256, &short, b"m").unwrap_err();
        assert!(matches!(err, CryptError::KeyInit(_)));
    }

    #[test]
    fn signing_without_private_exponent_fails() {
        let key = key_2048();
        let err = sign(SignatureType::Rsa2048Sha256, &key.public(), b"m").unwrap_err();
        assert!(matches!(err, CryptError::Signing(_)));
    }

    #[test]
    fn debug_does_not_print_key_bytes() {
        let key = key_2048();
        let out = format!("{:?}", key.private());
        assert_eq!(
            out,
            "RsaKeyMaterial { modulus_len: 256, has_private_exponent: true }"
        );
    }
}
