use std::fmt;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::constants::{
    TICKET_RECORD_SIZE, TICKET_SIGNED_BODY_OFFSET, TICKET_TITLE_ID_OFFSET, TICKET_TITLE_KEY_OFFSET,
};
use crate::crypto::{self, RsaKeyMaterial, cbc_decrypt_block, cbc_encrypt_block};
use crate::error::{CryptError, CryptResult};
use crate::keys::CommonKeySource;
use crate::registry::key_size_for;
use crate::types::{RsaKeySize, SignatureType, TitleKey};

/**
    Fields of the fixed ticket layout.

    Offsets are relative to the start of the record, multi-byte integers are
    big-endian. Everything past [`TICKET_RECORD_SIZE`] is carried along but
    not decoded.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TicketField {
    SignatureType,
    Signature,
    Issuer,
    EcdhData,
    FormatVersion,
    CaCrlVersion,
    SignerCrlVersion,
    EncryptedTitleKey,
    TicketId,
    DeviceId,
    TitleId,
    TicketVersion,
    LicenseType,
    CommonKeyIndex,
    AccountId,
    Audit,
    LimitEntries,
}

impl TicketField {
    /// `(offset, length)` of the field.
    pub const fn span(self) -> (usize, usize) {
        match self {
            Self::SignatureType => (0x000, 4),
            Self::Signature => (0x004, 0x100),
            Self::Issuer => (0x140, 0x40),
            Self::EcdhData => (0x180, 0x3C),
            Self::FormatVersion => (0x1BC, 1),
            Self::CaCrlVersion => (0x1BD, 1),
            Self::SignerCrlVersion => (0x1BE, 1),
            Self::EncryptedTitleKey => (0x1BF, 0x10),
            Self::TicketId => (0x1D0, 8),
            Self::DeviceId => (0x1D8, 4),
            Self::TitleId => (0x1DC, 8),
            Self::TicketVersion => (0x1E6, 2),
            Self::LicenseType => (0x1F0, 1),
            Self::CommonKeyIndex => (0x1F1, 1),
            Self::AccountId => (0x21C, 4),
            Self::Audit => (0x221, 1),
            Self::LimitEntries => (0x264, 0x40),
        }
    }

    pub const fn range(self) -> core::ops::Range<usize> {
        let (offset, len) = self.span();
        offset..offset + len
    }
}

pub const TICKET_LAYOUT: [TicketField; 17] = [
    TicketField::SignatureType,
    TicketField::Signature,
    TicketField::Issuer,
    TicketField::EcdhData,
    TicketField::FormatVersion,
    TicketField::CaCrlVersion,
    TicketField::SignerCrlVersion,
    TicketField::EncryptedTitleKey,
    TicketField::TicketId,
    TicketField::DeviceId,
    TicketField::TitleId,
    TicketField::TicketVersion,
    TicketField::LicenseType,
    TicketField::CommonKeyIndex,
    TicketField::AccountId,
    TicketField::Audit,
    TicketField::LimitEntries,
];

/// Copy a field whose length is fixed by [`TicketField::span`].
fn field<const N: usize>(bytes: &[u8], f: TicketField) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[f.range()]);
    out
}

/**
    A decoded ticket record.

    Holds the full record as read (including any bytes past the fixed
    layout) so the signed body can be re-hashed.
*/
#[derive(Clone, PartialEq, Eq)]
pub struct TicketRecord {
    raw: Vec<u8>,
    sig_type: u32,
    format_version: u8,
    ca_crl_version: u8,
    signer_crl_version: u8,
    encrypted_title_key: [u8; 16],
    ticket_id: [u8; 8],
    device_id: [u8; 4],
    title_id: [u8; 8],
    ticket_version: u16,
    license_type: u8,
    common_key_index: u8,
    account_id: [u8; 4],
    audit: u8,
}

impl TicketRecord {
    /// The single decode step. Field offsets are only valid after this length check.
    fn decode(bytes: &[u8]) -> CryptResult<Self> {
        if bytes.len() < TICKET_RECORD_SIZE {
            return Err(CryptError::RecordTooSmall {
                size: bytes.len(),
                required: TICKET_RECORD_SIZE,
            });
        }

        let format_version = bytes[TicketField::FormatVersion.span().0];
        let ca_crl_version = bytes[TicketField::CaCrlVersion.span().0];
        let signer_crl_version = bytes[TicketField::SignerCrlVersion.span().0];
        let license_type = bytes[TicketField::LicenseType.span().0];
        let common_key_index = bytes[TicketField::CommonKeyIndex.span().0];
        let audit = bytes[TicketField::Audit.span().0];

        Ok(Self {
            raw: bytes.to_vec(),
            sig_type: u32::from_be_bytes(field(bytes, TicketField::SignatureType)),
            format_version,
            ca_crl_version,
            signer_crl_version,
            encrypted_title_key: field(bytes, TicketField::EncryptedTitleKey),
            ticket_id: field(bytes, TicketField::TicketId),
            device_id: field(bytes, TicketField::DeviceId),
            title_id: field(bytes, TicketField::TitleId),
            ticket_version: u16::from_be_bytes(field(bytes, TicketField::TicketVersion)),
            license_type,
            common_key_index,
            account_id: field(bytes, TicketField::AccountId),
            audit,
        })
    }

    /// Raw signature type tag.
    pub fn sig_type(&self) -> u32 {
        self.sig_type
    }

    /// Signature type, if the tag is one we know.
    pub fn signature_type(&self) -> Option<SignatureType> {
        SignatureType::from_u32(self.sig_type)
    }

    pub fn signature(&self) -> &[u8] {
        &self.raw[TicketField::Signature.range()]
    }

    /// Issuer string with trailing NUL padding removed.
    pub fn issuer(&self) -> String {
        let bytes = &self.raw[TicketField::Issuer.range()];
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        String::from_utf8_lossy(&bytes[..end]).trim().to_owned()
    }

    pub fn ecdh_data(&self) -> &[u8] {
        &self.raw[TicketField::EcdhData.range()]
    }

    pub fn format_version(&self) -> u8 {
        self.format_version
    }

    pub fn ca_crl_version(&self) -> u8 {
        self.ca_crl_version
    }

    pub fn signer_crl_version(&self) -> u8 {
        self.signer_crl_version
    }

    pub fn encrypted_title_key(&self) -> &[u8; 16] {
        &self.encrypted_title_key
    }

    pub fn ticket_id(&self) -> &[u8; 8] {
        &self.ticket_id
    }

    pub fn device_id(&self) -> &[u8; 4] {
        &self.device_id
    }

    pub fn title_id(&self) -> &[u8; 8] {
        &self.title_id
    }

    pub fn ticket_version(&self) -> u16 {
        self.ticket_version
    }

    pub fn license_type(&self) -> u8 {
        self.license_type
    }

    pub fn common_key_index(&self) -> u8 {
        self.common_key_index
    }

    pub fn account_id(&self) -> &[u8; 4] {
        &self.account_id
    }

    pub fn audit(&self) -> u8 {
        self.audit
    }

    pub fn limit_entries(&self) -> &[u8] {
        &self.raw[TicketField::LimitEntries.range()]
    }

    /// The whole record, including bytes past the fixed layout.
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Region covered by the signature: issuer to end of record.
    pub fn signed_body(&self) -> &[u8] {
        &self.raw[TICKET_SIGNED_BODY_OFFSET..]
    }

    /// IV for the title key: title id followed by eight zero bytes.
    pub fn iv(&self) -> [u8; 16] {
        title_key_iv(&self.title_id)
    }

    /**
        Check the ticket signature against an RSA-2048 modulus.

        Only RSA-2048 tags are accepted since the fixed layout has room for a
        0x100-byte signature. A mismatch is `Ok(false)`.
    */
    pub fn verify_signature(&self, modulus: &[u8]) -> CryptResult<bool> {
        require_rsa2048(self.sig_type)?;
        crypto::verify(
            self.sig_type,
            &RsaKeyMaterial::public(modulus),
            self.signed_body(),
            self.signature(),
        )
    }
}

impl fmt::Debug for TicketRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TicketRecord")
            .field("sig_type", &format_args!("0x{:08x}", self.sig_type))
            .field("issuer", &self.issuer())
            .field("title_id", &hex::encode(self.title_id))
            .field("ticket_version", &self.ticket_version)
            .field("common_key_index", &self.common_key_index)
            .field("len", &self.raw.len())
            .finish_non_exhaustive()
    }
}

/// Non-fatal conditions raised while unwrapping a title key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnwrapWarning {
    /// No common key for this index. The title key was left all-zero.
    MissingKeyMaterial { index: u8 },
}

impl fmt::Display for UnwrapWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingKeyMaterial { index } => {
                write!(f, "no common key for index {index}, title key left zeroed")
            }
        }
    }
}

/**
    A ticket whose record has been decoded but whose title key is still
    encrypted.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    record: TicketRecord,
}

impl Ticket {
    /// Decode a ticket occupying all of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> CryptResult<Self> {
        Ok(Self {
            record: TicketRecord::decode(bytes)?,
        })
    }

    /**
        Read `size` bytes at `offset` from a seekable source and decode them.

        Fails with `RecordTooSmall` before touching the source if `size` is
        below the fixed record length, and with `RecordOutOfBounds` if the
        source ends before `offset + size`.
    */
    pub fn read_from<R: Read + Seek>(reader: &mut R, offset: u64, size: usize) -> CryptResult<Self> {
        if size < TICKET_RECORD_SIZE {
            return Err(CryptError::RecordTooSmall {
                size,
                required: TICKET_RECORD_SIZE,
            });
        }

        let available = reader.seek(SeekFrom::End(0))?;
        let fits = offset
            .checked_add(size as u64)
            .is_some_and(|end| end <= available);
        if !fits {
            return Err(CryptError::RecordOutOfBounds {
                offset,
                size,
                available: usize::try_from(available).unwrap_or(usize::MAX),
            });
        }

        reader.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; size];
        reader.read_exact(&mut buf)?;

        log::debug!("read {size} byte ticket at offset {offset:#x}");
        Self::from_bytes(&buf)
    }

    pub fn record(&self) -> &TicketRecord {
        &self.record
    }

    /**
        Decrypt the title key with the common key named by the ticket.

        If `keys` has no entry for the ticket's common-key index the result
        carries an all-zero title key and an [`UnwrapWarning`] instead of
        failing. Use [`Ticket::unwrap_title_key_strict`] to get an error.
    */
    pub fn unwrap_title_key<K: CommonKeySource + ?Sized>(self, keys: &K) -> UnwrappedTicket {
        let index = self.record.common_key_index;
        match keys.common_key(index) {
            Some(common_key) => self.unwrap_with(common_key),
            None => {
                log::warn!("no common key for index {index}, using zeroed title key");
                UnwrappedTicket {
                    record: self.record,
                    title_key: TitleKey::new([0u8; 16]),
                    warning: Some(UnwrapWarning::MissingKeyMaterial { index }),
                }
            }
        }
    }

    /// Like [`Ticket::unwrap_title_key`], but a missing common key is an error.
    pub fn unwrap_title_key_strict<K: CommonKeySource + ?Sized>(
        self,
        keys: &K,
    ) -> CryptResult<UnwrappedTicket> {
        let index = self.record.common_key_index;
        let common_key = keys
            .common_key(index)
            .ok_or(CryptError::MissingKeyMaterial(index))?;
        Ok(self.unwrap_with(common_key))
    }

    fn unwrap_with(self, common_key: &[u8; 16]) -> UnwrappedTicket {
        log::debug!(
            "unwrapping title key for {} with common key {}",
            hex::encode(self.record.title_id),
            self.record.common_key_index
        );
        let title_key = decrypt_title_key(
            &self.record.encrypted_title_key,
            &self.record.title_id,
            common_key,
        );
        UnwrappedTicket {
            record: self.record,
            title_key,
            warning: None,
        }
    }
}

/// A ticket with its title key decrypted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnwrappedTicket {
    record: TicketRecord,
    title_key: TitleKey,
    warning: Option<UnwrapWarning>,
}

impl UnwrappedTicket {
    pub fn title_key(&self) -> &TitleKey {
        &self.title_key
    }

    pub fn title_id(&self) -> &[u8; 8] {
        self.record.title_id()
    }

    pub fn iv(&self) -> [u8; 16] {
        self.record.iv()
    }

    pub fn record(&self) -> &TicketRecord {
        &self.record
    }

    pub fn warning(&self) -> Option<UnwrapWarning> {
        self.warning
    }
}

/**
    Decode the ticket at `bytes[offset..offset + size]` and unwrap its title
    key with the common key the ticket names.

    `size` is checked against the fixed record length before the bounds of
    `bytes` are.
*/
pub fn unwrap_ticket<K: CommonKeySource + ?Sized>(
    bytes: &[u8],
    offset: u64,
    size: usize,
    keys: &K,
) -> CryptResult<UnwrappedTicket> {
    if size < TICKET_RECORD_SIZE {
        return Err(CryptError::RecordTooSmall {
            size,
            required: TICKET_RECORD_SIZE,
        });
    }

    let out_of_bounds = || CryptError::RecordOutOfBounds {
        offset,
        size,
        available: bytes.len(),
    };
    let start = usize::try_from(offset).map_err(|_| out_of_bounds())?;
    let end = start.checked_add(size).ok_or_else(out_of_bounds)?;
    let record = bytes.get(start..end).ok_or_else(out_of_bounds)?;

    Ok(Ticket::from_bytes(record)?.unwrap_title_key(keys))
}

fn title_key_iv(title_id: &[u8; 8]) -> [u8; 16] {
    let mut iv = [0u8; 16];
    iv[..8].copy_from_slice(title_id);
    iv
}

/// AES-128-CBC decrypt a title key; the IV is the title id padded with zeros.
pub fn decrypt_title_key(
    encrypted: &[u8; 16],
    title_id: &[u8; 8],
    common_key: &[u8; 16],
) -> TitleKey {
    TitleKey::new(cbc_decrypt_block(common_key, &title_key_iv(title_id), encrypted))
}

/// Inverse of [`decrypt_title_key`].
pub fn encrypt_title_key(title_key: &TitleKey, title_id: &[u8; 8], common_key: &[u8; 16]) -> [u8; 16] {
    cbc_encrypt_block(common_key, &title_key_iv(title_id), title_key.as_bytes())
}

/**
    Read just the encrypted title key and title id from a ticket stream
    (positioned relative to the start of the stream) and decrypt the key.

    No other part of the ticket is read or checked.
*/
pub fn read_title_key<R: Read + Seek>(reader: &mut R, common_key: &[u8; 16]) -> CryptResult<TitleKey> {
    let mut encrypted = [0u8; 16];
    reader.seek(SeekFrom::Start(TICKET_TITLE_KEY_OFFSET))?;
    reader.read_exact(&mut encrypted)?;

    let mut title_id = [0u8; 8];
    reader.seek(SeekFrom::Start(TICKET_TITLE_ID_OFFSET))?;
    reader.read_exact(&mut title_id)?;

    Ok(decrypt_title_key(&encrypted, &title_id, common_key))
}

/// [`read_title_key`] on a ticket file.
pub fn unwrap_title_key_from_file(
    path: impl AsRef<Path>,
    common_key: &[u8; 16],
) -> CryptResult<TitleKey> {
    let path = path.as_ref();
    let mut file = File::open(path)
        .map_err(|e| CryptError::Io(format!("{}: {e}", path.display())))?;
    read_title_key(&mut file, common_key)
}

/**
    Sign a ticket in place.

    Reads the signature type from the record, signs `bytes[0x140..]` and
    writes the signature at offset 4. The type must be an RSA-2048 one and
    `key` must carry the private exponent.
*/
pub fn sign_ticket(bytes: &mut [u8], key: &RsaKeyMaterial<'_>) -> CryptResult<()> {
    if bytes.len() < TICKET_RECORD_SIZE {
        return Err(CryptError::RecordTooSmall {
            size: bytes.len(),
            required: TICKET_RECORD_SIZE,
        });
    }

    let sig_type = u32::from_be_bytes(field(bytes, TicketField::SignatureType));
    require_rsa2048(sig_type)?;

    let signature = crypto::sign(sig_type, key, &bytes[TICKET_SIGNED_BODY_OFFSET..])?;
    let slot = &mut bytes[TicketField::Signature.range()];
    if signature.len() != slot.len() {
        return Err(CryptError::Signing(format!(
            "signature is {} bytes, ticket slot holds {}",
            signature.len(),
            slot.len()
        )));
    }
    slot.copy_from_slice(&signature);
    Ok(())
}

fn require_rsa2048(sig_type: u32) -> CryptResult<()> {
    match key_size_for(sig_type) {
        Some(RsaKeySize::Rsa2048) => Ok(()),
        _ => Err(CryptError::UnsupportedSignatureType(sig_type)),
    }
}
