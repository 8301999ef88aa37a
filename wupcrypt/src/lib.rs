mod constants;
mod crypto;
mod error;
mod keys;
mod registry;
mod ticket;
mod types;

pub use self::constants::{RSA_PUBLIC_EXPONENT, TICKET_RECORD_SIZE};
pub use self::crypto::{
    CbcDirection, Digest, RsaKeyMaterial, cbc_transform, compute_digest, ctr_transform,
    derive_counter, sign, verify, verify_sha256,
};
pub use self::error::{CryptError, CryptResult, ParseError};
pub use self::keys::{CommonKeySource, CommonKeyTable};
pub use self::registry::{digest_len_for, hash_algorithm_for, key_size_for, pkcs_hash_id_for};
pub use self::ticket::{
    TICKET_LAYOUT, Ticket, TicketField, TicketRecord, UnwrapWarning, UnwrappedTicket,
    decrypt_title_key, encrypt_title_key, read_title_key, sign_ticket, unwrap_ticket,
    unwrap_title_key_from_file,
};
pub use self::types::{HashAlgorithm, PkcsHashId, RsaKeySize, SignatureType, TitleKey};
