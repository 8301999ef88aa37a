use aes::Aes128;
use cbc::cipher::{
    BlockDecryptMut, BlockEncryptMut, KeyIvInit, StreamCipher, block_padding::NoPadding,
};

use crate::constants::AES_BLOCK_SIZE;
use crate::error::{CryptError, CryptResult};

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;
type Aes128Ctr = ctr::Ctr128BE<Aes128>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CbcDirection {
    Encrypt,
    Decrypt,
}

/**
    AES-128-CBC over a whole number of blocks, without padding.

    Input must be non-empty and a multiple of 16 bytes. On success `iv` is
    replaced with the last ciphertext block, so a second call with the same
    `iv` continues the chain where the first one stopped.
*/
pub fn cbc_transform(
    key: &[u8; 16],
    iv: &mut [u8; 16],
    input: &[u8],
    direction: CbcDirection,
) -> CryptResult<Vec<u8>> {
    if input.is_empty() || !input.len().is_multiple_of(AES_BLOCK_SIZE) {
        return Err(CryptError::InvalidCipherInput(format!(
            "CBC input must be non-empty and block-aligned, got {} bytes",
            input.len()
        )));
    }

    let len = input.len();
    let mut buf = input.to_vec();

    match direction {
        CbcDirection::Encrypt => {
            Aes128CbcEnc::new(key.into(), (&*iv).into())
                .encrypt_padded_mut::<NoPadding>(&mut buf, len)
                .map_err(|e| CryptError::InvalidCipherInput(e.to_string()))?;
            iv.copy_from_slice(&buf[len - AES_BLOCK_SIZE..]);
        }
        CbcDirection::Decrypt => {
            Aes128CbcDec::new(key.into(), (&*iv).into())
                .decrypt_padded_mut::<NoPadding>(&mut buf)
                .map_err(|e| CryptError::InvalidCipherInput(e.to_string()))?;
            iv.copy_from_slice(&input[len - AES_BLOCK_SIZE..]);
        }
    }

    Ok(buf)
}

/// Single-block CBC decrypt. Infallible counterpart of [`cbc_transform`] for one block.
pub(crate) fn cbc_decrypt_block(key: &[u8; 16], iv: &[u8; 16], block: &[u8; 16]) -> [u8; 16] {
    let mut block = aes::Block::from(*block);
    Aes128CbcDec::new(key.into(), iv.into()).decrypt_block_mut(&mut block);
    block.into()
}

/// Single-block CBC encrypt, the inverse of [`cbc_decrypt_block`].
pub(crate) fn cbc_encrypt_block(key: &[u8; 16], iv: &[u8; 16], block: &[u8; 16]) -> [u8; 16] {
    let mut block = aes::Block::from(*block);
    Aes128CbcEnc::new(key.into(), iv.into()).encrypt_block_mut(&mut block);
    block.into()
}

/**
    Counter block for the AES block containing `byte_offset`.

    The block index is `ceil(byte_offset / 16)` and is merged into the low
    64 bits (bytes 8..16, big-endian) with a bitwise OR, not added. A base
    whose low half is already non-zero therefore does not advance the way a
    true counter would. Existing encrypted content depends on this, so it is
    kept. Bytes 0..8 pass through untouched.
*/
pub fn derive_counter(base: &[u8; 16], byte_offset: u64) -> [u8; 16] {
    let index = byte_offset.div_ceil(AES_BLOCK_SIZE as u64);

    let mut low = [0u8; 8];
    low.copy_from_slice(&base[8..]);
    let merged = u64::from_be_bytes(low) | index;

    let mut counter = *base;
    counter[8..].copy_from_slice(&merged.to_be_bytes());
    counter
}

/**
    AES-128-CTR keystream XOR starting at the counter for `byte_offset`.

    The keystream begins at the start of the derived block; the counter then
    increments as a 128-bit big-endian integer. Applying it twice with the
    same arguments restores the input.
*/
pub fn ctr_transform(key: &[u8; 16], base: &[u8; 16], input: &[u8], byte_offset: u64) -> Vec<u8> {
    let counter = derive_counter(base, byte_offset);
    let mut buf = input.to_vec();
    Aes128Ctr::new(key.into(), (&counter).into()).apply_keystream(&mut buf);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    const KEY: [u8; 16] = hex!("2b7e151628aed2a6abf7158809cf4f3c");

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 + 3) as u8).collect()
    }

    #[test]
    fn cbc_matches_nist_vector() {
        let mut iv = hex!("000102030405060708090a0b0c0d0e0f");
        let ct = cbc_transform(
            &KEY,
            &mut iv,
            &hex!("6bc1bee22e409f96e93d7e117393172a"),
            CbcDirection::Encrypt,
        )
        .unwrap();
        assert_eq!(ct, hex!("7649abac8119b246cee98e9b12e9197d"));
        assert_eq!(iv, hex!("7649abac8119b246cee98e9b12e9197d"));
    }

    #[test]
    fn single_block_helpers_agree_with_transform() {
        let iv = hex!("000102030405060708090a0b0c0d0e0f");
        let pt = hex!("6bc1bee22e409f96e93d7e117393172a");
        let ct = cbc_encrypt_block(&KEY, &iv, &pt);
        assert_eq!(ct, hex!("7649abac8119b246cee98e9b12e9197d"));
        assert_eq!(cbc_decrypt_block(&KEY, &iv, &ct), pt);

        let mut chain = iv;
        let via_transform = cbc_transform(&KEY, &mut chain, &ct, CbcDirection::Decrypt).unwrap();
        assert_eq!(via_transform, pt);
    }

    #[test]
    fn cbc_round_trips() {
        for len in [16, 32, 160] {
            for iv_byte in [0x00u8, 0xFF] {
                let pt = sample(len);

                let mut iv = [iv_byte; 16];
                let ct = cbc_transform(&KEY, &mut iv, &pt, CbcDirection::Encrypt).unwrap();
                assert_eq!(ct.len(), len);
                assert_ne!(ct, pt);

                let mut iv = [iv_byte; 16];
                let back = cbc_transform(&KEY, &mut iv, &ct, CbcDirection::Decrypt).unwrap();
                assert_eq!(back, pt, "len={len} iv={iv_byte:#04x}");
            }
        }
    }

    #[test]
    fn cbc_iv_carries_chain_across_calls() {
        let pt = sample(64);

        let mut iv = [0u8; 16];
        let whole = cbc_transform(&KEY, &mut iv, &pt, CbcDirection::Encrypt).unwrap();

        let mut iv = [0u8; 16];
        let mut split = cbc_transform(&KEY, &mut iv, &pt[..32], CbcDirection::Encrypt).unwrap();
        split.extend(cbc_transform(&KEY, &mut iv, &pt[32..], CbcDirection::Encrypt).unwrap());
        assert_eq!(split, whole);

        let mut iv = [0u8; 16];
        let mut back = cbc_transform(&KEY, &mut iv, &whole[..48], CbcDirection::Decrypt).unwrap();
        back.extend(cbc_transform(&KEY, &mut iv, &whole[48..], CbcDirection::Decrypt).unwrap());
        assert_eq!(back, pt);
    }

    #[test]
    fn cbc_rejects_unaligned_or_empty_input() {
        let mut iv = [0u8; 16];
        for input in [&[][..], &[0u8; 15][..], &[0u8; 17][..]] {
            let err = cbc_transform(&KEY, &mut iv, input, CbcDirection::Decrypt).unwrap_err();
            assert!(matches!(err, CryptError::InvalidCipherInput(_)));
        }
        assert_eq!(iv, [0u8; 16]);
    }

    #[test]
    fn counter_index_is_ceiling_of_offset() {
        let base = hex!("0102030405060708 0000000000000000");
        assert_eq!(derive_counter(&base, 0), base);
        assert_eq!(derive_counter(&base, 32), hex!("0102030405060708 0000000000000002"));
        assert_eq!(derive_counter(&base, 33), hex!("0102030405060708 0000000000000003"));
        assert_eq!(derive_counter(&base, 1), hex!("0102030405060708 0000000000000001"));
    }

    #[test]
    fn counter_merges_index_with_or() {
        let base = hex!("ffffffffffffffff 0000000000000003");
        // 3 | 2 == 3, an additive counter would give 5
        assert_eq!(derive_counter(&base, 32), base);
        assert_eq!(
            derive_counter(&base, 64),
            hex!("ffffffffffffffff 0000000000000007")
        );
    }

    #[test]
    fn ctr_matches_nist_vector() {
        let base = hex!("f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff");
        let ct = ctr_transform(&KEY, &base, &hex!("6bc1bee22e409f96e93d7e117393172a"), 0);
        assert_eq!(ct, hex!("874d6191b620e3261bef6864990db6ce"));
    }

    #[test]
    fn ctr_is_self_inverse() {
        let base = hex!("00050000100402000000000000000000");
        let pt = sample(100);
        for offset in [0u64, 16, 4096, 1_048_576] {
            let ct = ctr_transform(&KEY, &base, &pt, offset);
            assert_ne!(ct, pt);
            assert_eq!(ctr_transform(&KEY, &base, &ct, offset), pt, "offset={offset}");
        }
    }

    #[test]
    fn ctr_offset_selects_keystream_block() {
        let base = [0u8; 16];
        let pt = sample(64);
        let whole = ctr_transform(&KEY, &base, &pt, 0);
        let tail = ctr_transform(&KEY, &base, &pt[32..], 32);
        assert_eq!(tail, whole[32..]);
    }
}
