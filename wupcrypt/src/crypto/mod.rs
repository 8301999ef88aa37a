mod aes;
mod digest;
mod rsa;

pub use self::aes::{CbcDirection, cbc_transform, ctr_transform, derive_counter};
pub use self::digest::{Digest, compute_digest, verify_sha256};
pub use self::rsa::{RsaKeyMaterial, sign, verify};

pub(crate) use self::aes::{cbc_decrypt_block, cbc_encrypt_block};
