//! AES-256 owner-password protection
//!
//! The user password is always empty, so anyone can open and print the
//! document; changing it requires the randomly generated owner password.

use std::collections::BTreeMap;
use std::sync::Arc;

use lopdf::encryption::crypt_filters::{Aes256CryptFilter, CryptFilter};
use lopdf::encryption::{EncryptionState, EncryptionVersion, Permissions};
use lopdf::Document;
use rand::{distributions::Alphanumeric, Rng, RngCore};

use crate::error::StampError;

/// Length of generated owner passwords
pub const OWNER_PASSWORD_LEN: usize = 32;

const CRYPT_FILTER_NAME: &[u8] = b"StdCF";

/// Random alphanumeric owner password
pub fn generate_owner_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(OWNER_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

/// Viewing, printing and copying are allowed; editing is not
pub fn viewer_permissions() -> Permissions {
    Permissions::PRINTABLE
        | Permissions::PRINTABLE_IN_HIGH_QUALITY
        | Permissions::COPYABLE
        | Permissions::COPYABLE_FOR_ACCESSIBILITY
}

/// Encrypt `doc` in place with an empty user password and `owner_password`
pub fn encrypt_with_owner_password(doc: &mut Document, owner_password: &str) -> Result<(), StampError> {
    let mut file_key = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut file_key);

    let crypt_filter: Arc<dyn CryptFilter> = Arc::new(Aes256CryptFilter);
    let version = EncryptionVersion::V5 {
        encrypt_metadata: true,
        crypt_filters: BTreeMap::from([(CRYPT_FILTER_NAME.to_vec(), crypt_filter)]),
        file_encryption_key: &file_key,
        stream_filter: CRYPT_FILTER_NAME.to_vec(),
        string_filter: CRYPT_FILTER_NAME.to_vec(),
        owner_password,
        user_password: "",
        permissions: viewer_permissions(),
    };

    let state = EncryptionState::try_from(version)
        .map_err(|e| StampError::Encryption(e.to_string()))?;
    doc.encrypt(&state)
        .map_err(|e| StampError::Encryption(e.to_string()))
}
