//! Key sources and hierarchical derivation.
//!
//! A wallet owns exactly one [`KeySource`]: a mnemonic phrase, a master
//! seed, or an imported raw private key. Phrases derive seeds, seeds
//! derive per-path private keys (BIP-32 over secp256k1), and an imported
//! key is terminal — asking it to derive fails with
//! [`WalletError::CannotDerive`].
//!
//! Derivation re-runs on every call; public keys are cached per currency,
//! not here.

use std::str::FromStr;

use bitcoin::NetworkKind;
use bitcoin::bip32::Xpriv;
use bitcoin::secp256k1::{Secp256k1, SecretKey};
use zeroize::Zeroizing;

use crate::error::WalletError;
use crate::mnemonic::{self, PhraseLength};
use crate::vault::SecretVault;

pub use bip39::Language;
pub use bitcoin::bip32::DerivationPath;

/// A secp256k1 public key in both wire encodings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    pub compressed: [u8; 33],
    pub uncompressed: [u8; 65],
}

impl PublicKey {
    /// Compute both encodings from a raw 32-byte secret key.
    pub fn from_secret(secret: &[u8]) -> Result<Self, WalletError> {
        let secp = Secp256k1::new();
        let key = SecretKey::from_slice(secret)
            .map_err(|e| WalletError::KeyDerivation(e.to_string()))?;
        let public = key.public_key(&secp);
        Ok(Self {
            compressed: public.serialize(),
            uncompressed: public.serialize_uncompressed(),
        })
    }
}

/// A mnemonic recovery phrase.
#[derive(Debug)]
pub struct Phrase {
    vault: SecretVault,
}

impl Phrase {
    /// Wrap an existing phrase. Validity is the caller's concern; wallet
    /// constructors check it first.
    pub fn new(phrase: &str) -> Self {
        Self {
            vault: SecretVault::new(phrase.as_bytes().to_vec()),
        }
    }

    /// Generate a fresh phrase from OS entropy.
    pub fn generate(language: Language, length: PhraseLength) -> Self {
        Self::new(&mnemonic::generate_phrase(language, length))
    }

    /// Whether `phrase` checksums correctly in any supported language.
    pub fn is_valid(phrase: &str) -> bool {
        mnemonic::is_valid_phrase(phrase)
    }

    /// The phrase text. Requires plaintext access.
    pub fn phrase(&self) -> Result<Zeroizing<String>, WalletError> {
        let bytes = self.vault.plaintext()?;
        String::from_utf8(bytes.to_vec())
            .map(Zeroizing::new)
            .map_err(|_| WalletError::Encoding("phrase is not valid UTF-8".into()))
    }

    /// Derive the BIP-39 seed. Pure function of the phrase bytes.
    pub fn to_seed(&self) -> Result<Seed, WalletError> {
        let phrase = self.phrase()?;
        let seed = mnemonic::phrase_to_seed(&phrase)?;
        Ok(Seed::new(seed.to_vec()))
    }

    /// Derive the private key at `path` via the seed.
    pub fn derive(&self, path: &DerivationPath) -> Result<PrivateKeyMaterial, WalletError> {
        self.to_seed()?.derive(path)
    }

    pub fn vault(&self) -> &SecretVault {
        &self.vault
    }
}

/// A BIP-32 master seed.
#[derive(Debug)]
pub struct Seed {
    vault: SecretVault,
}

impl Seed {
    pub fn new(seed: impl Into<Vec<u8>>) -> Self {
        Self {
            vault: SecretVault::new(seed),
        }
    }

    /// Parse a hex-encoded seed.
    pub fn from_hex(hex_str: &str) -> Result<Self, WalletError> {
        let bytes = hex::decode(hex_str.trim_start_matches("0x"))
            .map_err(|_| WalletError::Encoding("invalid seed hex".into()))?;
        Ok(Self::new(bytes))
    }

    /// Derive the private key at `path`.
    pub fn derive(&self, path: &DerivationPath) -> Result<PrivateKeyMaterial, WalletError> {
        let seed = self.vault.plaintext()?;
        let secp = Secp256k1::new();
        let master = Xpriv::new_master(NetworkKind::Main, &seed)
            .map_err(|e| WalletError::KeyDerivation(e.to_string()))?;
        let child = master
            .derive_priv(&secp, path)
            .map_err(|e| WalletError::KeyDerivation(e.to_string()))?;
        Ok(PrivateKeyMaterial::new(child.private_key.secret_bytes()))
    }

    /// The base58 extended private key of the master node.
    pub fn extended_private_key(&self) -> Result<String, WalletError> {
        let seed = self.vault.plaintext()?;
        let master = Xpriv::new_master(NetworkKind::Main, &seed)
            .map_err(|e| WalletError::KeyDerivation(e.to_string()))?;
        Ok(master.to_string())
    }

    pub fn vault(&self) -> &SecretVault {
        &self.vault
    }
}

/// An imported raw secp256k1 private key. Terminal: it has no derivation
/// tree below it.
#[derive(Debug)]
pub struct PrivateKeyMaterial {
    vault: SecretVault,
}

impl PrivateKeyMaterial {
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self {
            vault: SecretVault::new(key),
        }
    }

    /// Parse a hex-encoded key.
    pub fn from_hex(hex_str: &str) -> Result<Self, WalletError> {
        let bytes = hex::decode(hex_str.trim_start_matches("0x"))
            .map_err(|_| WalletError::Encoding("invalid private key hex".into()))?;
        Ok(Self::new(bytes))
    }

    /// Parse a Wallet Import Format key.
    pub fn from_wif(wif: &str) -> Result<Self, WalletError> {
        let key = bitcoin::PrivateKey::from_wif(wif).map_err(|_| {
            WalletError::Encoding(
                "the string supplied in Wallet Import Format (WIF) is invalid".into(),
            )
        })?;
        Ok(Self::new(key.inner.secret_bytes()))
    }

    /// Export as mainnet compressed WIF.
    pub fn to_wif(&self) -> Result<String, WalletError> {
        let bytes = self.secret_bytes()?;
        let key = SecretKey::from_slice(&bytes[..])
            .map_err(|e| WalletError::KeyDerivation(e.to_string()))?;
        Ok(bitcoin::PrivateKey::new(key, NetworkKind::Main).to_wif())
    }

    /// The raw 32 key bytes. Requires plaintext access.
    pub fn secret_bytes(&self) -> Result<Zeroizing<[u8; 32]>, WalletError> {
        let bytes = self.vault.plaintext()?;
        let array: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| WalletError::Encoding("private key must be 32 bytes".into()))?;
        Ok(Zeroizing::new(array))
    }

    /// The corresponding public key in both encodings.
    pub fn public_key(&self) -> Result<PublicKey, WalletError> {
        let bytes = self.secret_bytes()?;
        PublicKey::from_secret(&bytes[..])
    }

    pub fn vault(&self) -> &SecretVault {
        &self.vault
    }
}

/// The wallet's origin of key material.
#[derive(Debug)]
pub enum KeySource {
    Phrase(Phrase),
    Seed(Seed),
    PrivateKey(PrivateKeyMaterial),
}

impl KeySource {
    /// The secret container backing this source.
    pub fn vault(&self) -> &SecretVault {
        match self {
            KeySource::Phrase(phrase) => phrase.vault(),
            KeySource::Seed(seed) => seed.vault(),
            KeySource::PrivateKey(key) => key.vault(),
        }
    }

    /// Derive a new private key at `path`.
    ///
    /// Imported raw keys have no derivation tree and fail with
    /// [`WalletError::CannotDerive`].
    pub fn derive(&self, path: &DerivationPath) -> Result<PrivateKeyMaterial, WalletError> {
        match self {
            KeySource::Phrase(phrase) => phrase.derive(path),
            KeySource::Seed(seed) => seed.derive(path),
            KeySource::PrivateKey(_) => Err(WalletError::CannotDerive),
        }
    }

    /// The signing key a currency configured at `path` should use.
    ///
    /// An imported private key signs for every currency regardless of
    /// path; hierarchical sources derive at `path`.
    pub fn signing_key(&self, path: &DerivationPath) -> Result<Zeroizing<[u8; 32]>, WalletError> {
        match self {
            KeySource::PrivateKey(key) => key.secret_bytes(),
            KeySource::Phrase(_) | KeySource::Seed(_) => self.derive(path)?.secret_bytes(),
        }
    }

    /// The public key at `path`.
    pub fn public_key(&self, path: &DerivationPath) -> Result<PublicKey, WalletError> {
        let secret = self.signing_key(path)?;
        PublicKey::from_secret(&secret[..])
    }
}

/// Parse a derivation path string.
pub fn parse_derivation_path(path: &str) -> Result<DerivationPath, WalletError> {
    DerivationPath::from_str(path)
        .map_err(|e| WalletError::KeyDerivation(format!("invalid derivation path {path}: {e}")))
}
