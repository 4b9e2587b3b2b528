//! The platform secret store, addressed as `(service, name) -> secret`.
//!
//! Backends offer no enumeration, which is why the name index exists.

use crate::error::{Error, Result};
use crate::secret::Secret;

/// Keyed access to stored secrets. Not-found is an outcome, not an error.
pub trait SecretStore {
    /// Stores `secret` under `name`, replacing any previous value.
    fn set(&self, name: &str, secret: &Secret) -> Result<()>;

    /// Returns `None` when nothing is stored under `name`.
    fn get(&self, name: &str) -> Result<Option<Secret>>;

    /// Returns `false` when nothing was stored under `name`.
    fn delete(&self, name: &str) -> Result<bool>;
}

/// A [`SecretStore`] backed by the OS keyring (macOS Keychain, Windows
/// Credential Manager, Secret Service).
#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new<S: Into<String>>(service: S) -> KeyringStore {
        KeyringStore {
            service: service.into(),
        }
    }

    fn entry(&self, name: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, name).map_err(store_error)
    }
}

fn store_error(error: keyring::Error) -> Error {
    match error {
        keyring::Error::TooLong(attr, limit) => {
            Error::TooLarge(format!("{} exceeds the limit of {}", attr, limit))
        }
        e => Error::Store(e.to_string()),
    }
}

impl SecretStore for KeyringStore {
    fn set(&self, name: &str, secret: &Secret) -> Result<()> {
        self.entry(name)?
            .set_password(secret.str())
            .map_err(store_error)?;
        debug!(service = %self.service, name = %name, "stored secret in keyring");
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Option<Secret>> {
        match self.entry(name)?.get_password() {
            Ok(secret) => Ok(Some(Secret::new(secret))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(store_error(e)),
        }
    }

    fn delete(&self, name: &str) -> Result<bool> {
        match self.entry(name)?.delete_credential() {
            Ok(()) => {
                debug!(service = %self.service, name = %name, "deleted secret from keyring");
                Ok(true)
            }
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) => Err(store_error(e)),
        }
    }
}
