//! AES-256-GCM secret encryption with PBKDF2 key stretching.
//!
//! The password is stretched with PBKDF2-HMAC-SHA256 at 600 000
//! iterations over a fresh random 256-bit salt; the plaintext is sealed
//! with AES-256-GCM under a fresh random 96-bit nonce. Both random values
//! come from the OS cryptographic RNG.
//!
//! The sealed container `{salt, iv, ciphertext}` is the only durable
//! format the engine defines; it serializes with serde.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::WalletError;

/// PBKDF2 iteration count.
pub const PBKDF2_ITERATIONS: u32 = 600_000;

/// Salt length in bytes.
pub const SALT_LEN: usize = 32;

/// AES-GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// An encrypted secret at rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedSecret {
    /// PBKDF2 salt.
    pub salt: Vec<u8>,
    /// AES-GCM nonce.
    pub iv: Vec<u8>,
    /// Ciphertext including the authentication tag.
    pub ciphertext: Vec<u8>,
}

/// Stretch a password into a 256-bit AES key.
pub fn derive_key(password: &[u8], salt: &[u8]) -> Zeroizing<[u8; 32]> {
    let mut key = Zeroizing::new([0u8; 32]);
    pbkdf2_hmac::<Sha256>(password, salt, PBKDF2_ITERATIONS, &mut key[..]);
    key
}

/// Encrypt plaintext with a password.
pub fn seal(plaintext: &[u8], password: &[u8]) -> Result<SealedSecret, WalletError> {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LEN];
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);

    let key = derive_key(password, &salt);
    let cipher = Aes256Gcm::new_from_slice(&key[..])
        .map_err(|e| WalletError::Encryption(e.to_string()))?;
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| WalletError::Encryption(e.to_string()))?;

    Ok(SealedSecret {
        salt: salt.to_vec(),
        iv: nonce_bytes.to_vec(),
        ciphertext,
    })
}

/// Decrypt a secret sealed with [`seal`].
///
/// Returns [`WalletError::IncorrectPassword`] when the authentication tag
/// does not verify — a wrong password and a tampered container are
/// indistinguishable by design of the AEAD.
pub fn open(sealed: &SealedSecret, password: &[u8]) -> Result<Zeroizing<Vec<u8>>, WalletError> {
    if sealed.iv.len() != NONCE_LEN {
        return Err(WalletError::Encoding(format!(
            "sealed secret IV must be {NONCE_LEN} bytes, got {}",
            sealed.iv.len()
        )));
    }

    let key = derive_key(password, &sealed.salt);
    let cipher = Aes256Gcm::new_from_slice(&key[..])
        .map_err(|e| WalletError::Encryption(e.to_string()))?;
    let nonce = Nonce::from_slice(&sealed.iv);

    cipher
        .decrypt(nonce, sealed.ciphertext.as_slice())
        .map(Zeroizing::new)
        .map_err(|_| WalletError::IncorrectPassword)
}
