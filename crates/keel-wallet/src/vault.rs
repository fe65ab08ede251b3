//! The encrypted secret container.
//!
//! A [`SecretVault`] holds a secret byte buffer that is either plaintext
//! or sealed (`{salt, iv, ciphertext}`). Sealed material is only usable
//! inside a [`run_unencrypted`](SecretVault::run_unencrypted) scope,
//! which decrypts, runs the caller's closure, and re-seals before
//! returning — on every exit path, including closure failure.
//!
//! # Locking
//!
//! A per-container async mutex (the cycle lock) serializes
//! `run_unencrypted` and `encrypt` against each other: the
//! decrypt → use → re-encrypt cycle is atomic with respect to other
//! cycles on the same container. Plaintext reads taken outside a guarded
//! scope are deliberately *not* lock-gated — they are advisory-gated by a
//! development warning only. Different containers are fully independent.
//!
//! Key stretching runs on the blocking thread pool; the container's
//! locks are held across those awaits by design.

use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;
use tracing::warn;
use zeroize::Zeroizing;

use crate::encryption::{SealedSecret, open, seal};
use crate::error::WalletError;

enum SecretState {
    Plain(Zeroizing<Vec<u8>>),
    Sealed(SealedSecret),
}

/// A secret byte buffer with encryption-at-rest and scoped decryption.
pub struct SecretVault {
    state: RwLock<SecretState>,
    /// Serializes decrypt→use→re-encrypt cycles and `encrypt` calls.
    cycle: Mutex<()>,
    /// When set, plaintext reads outside a cycle log a development-only
    /// warning. Enabled after wallet setup unless the configuration
    /// acknowledges unencrypted use.
    warn_on_plaintext: AtomicBool,
}

impl SecretVault {
    /// Create a vault holding plaintext secret bytes.
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            state: RwLock::new(SecretState::Plain(Zeroizing::new(secret.into()))),
            cycle: Mutex::new(()),
            warn_on_plaintext: AtomicBool::new(false),
        }
    }

    /// Resume a vault from a stored sealed container.
    pub fn from_sealed(sealed: SealedSecret) -> Self {
        Self {
            state: RwLock::new(SecretState::Sealed(sealed)),
            cycle: Mutex::new(()),
            warn_on_plaintext: AtomicBool::new(false),
        }
    }

    /// Whether the secret is currently sealed.
    pub fn is_encrypted(&self) -> bool {
        matches!(*self.read_state(), SecretState::Sealed(_))
    }

    /// The sealed container for persistence, if currently sealed.
    pub fn sealed(&self) -> Option<SealedSecret> {
        match &*self.read_state() {
            SecretState::Sealed(sealed) => Some(sealed.clone()),
            SecretState::Plain(_) => None,
        }
    }

    /// Turn the plaintext-access warning on or off.
    pub fn set_plaintext_warning(&self, enabled: bool) {
        self.warn_on_plaintext.store(enabled, Ordering::Relaxed);
    }

    /// Read the plaintext secret.
    ///
    /// Fails with [`WalletError::WalletIsEncrypted`] while sealed. Works
    /// outside a [`run_unencrypted`](Self::run_unencrypted) scope, but
    /// that path is development-only and logs a warning unless
    /// acknowledged — it is a usability signal, not a security boundary.
    pub fn plaintext(&self) -> Result<Zeroizing<Vec<u8>>, WalletError> {
        let state = self.read_state();
        match &*state {
            SecretState::Sealed(_) => Err(WalletError::WalletIsEncrypted),
            SecretState::Plain(bytes) => {
                if self.warn_on_plaintext.load(Ordering::Relaxed) && !self.cycle_held() {
                    warn!(
                        "wallet secret is being used unencrypted; this should only \
                         happen during development. Call encrypt(password) after \
                         creation and use run_unencrypted(password, ...) for \
                         operations that need the private key"
                    );
                }
                Ok(bytes.clone())
            }
        }
    }

    /// Encrypt the plaintext secret under `password`.
    ///
    /// Fails with [`WalletError::AlreadyEncrypted`] if already sealed.
    pub async fn encrypt(&self, password: &str) -> Result<(), WalletError> {
        let _guard = self.cycle.lock().await;

        let plain = match &*self.read_state() {
            SecretState::Sealed(_) => return Err(WalletError::AlreadyEncrypted),
            SecretState::Plain(bytes) => bytes.clone(),
        };

        let sealed = seal_blocking(plain, password.to_owned()).await?;
        *self.write_state() = SecretState::Sealed(sealed);
        Ok(())
    }

    /// Decrypt, run `operation`, and re-seal.
    ///
    /// Fails with [`WalletError::NotEncrypted`] if the vault is already
    /// plaintext and [`WalletError::IncorrectPassword`] if the password
    /// does not verify (the container is left sealed and untouched).
    /// The closure's failure, if any, propagates only after the secret
    /// has been re-sealed.
    pub async fn run_unencrypted<T, F, Fut>(
        &self,
        password: &str,
        operation: F,
    ) -> Result<T, WalletError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, WalletError>>,
    {
        let _guard = self.cycle.lock().await;

        let sealed = match &*self.read_state() {
            SecretState::Plain(_) => return Err(WalletError::NotEncrypted),
            SecretState::Sealed(sealed) => sealed.clone(),
        };

        // Wrong password leaves the sealed state untouched.
        let plain = open_blocking(sealed, password.to_owned()).await?;
        *self.write_state() = SecretState::Plain(plain.clone());

        let result = operation().await;

        let resealed = seal_blocking(plain, password.to_owned()).await?;
        *self.write_state() = SecretState::Sealed(resealed);

        result
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, SecretState> {
        self.state.read().expect("vault state poisoned")
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, SecretState> {
        self.state.write().expect("vault state poisoned")
    }

    fn cycle_held(&self) -> bool {
        self.cycle.try_lock().is_err()
    }
}

impl std::fmt::Debug for SecretVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretVault")
            .field("encrypted", &self.is_encrypted())
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Run the key stretch and AEAD seal off the async reactor.
async fn seal_blocking(
    plain: Zeroizing<Vec<u8>>,
    password: String,
) -> Result<SealedSecret, WalletError> {
    tokio::task::spawn_blocking(move || seal(&plain, password.as_bytes()))
        .await
        .map_err(|e| WalletError::Encryption(e.to_string()))?
}

/// Run the key stretch and AEAD open off the async reactor.
async fn open_blocking(
    sealed: SealedSecret,
    password: String,
) -> Result<Zeroizing<Vec<u8>>, WalletError> {
    tokio::task::spawn_blocking(move || open(&sealed, password.as_bytes()))
        .await
        .map_err(|e| WalletError::Encryption(e.to_string()))?
}
