//! Normalization and validation of user-supplied TOTP secrets.

use crate::error::{Error, Result};
use data_encoding::BASE32_NOPAD;
use std::fmt;

/// A secret string whose backing buffer is zeroed when the value is dropped.
///
/// Values from [`normalize`] are uppercase Base32 with no spaces or padding.
/// Raw prompt answers are wrapped too, until they are normalized.
#[derive(PartialEq)]
pub struct Secret {
    secret: String,
}

impl Secret {
    /// Wraps a value without checking it, such as one read back from the
    /// keyring or a raw prompt answer.
    pub fn new(secret: String) -> Self {
        Secret { secret }
    }

    pub fn str(&self) -> &str {
        &self.secret
    }

    /// The raw key bytes the secret encodes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        BASE32_NOPAD
            .decode(self.secret.as_bytes())
            .map_err(|_| Error::invalid_format("Invalid secret (expected Base32)"))
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Secret(**redacted**)")
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        zero(&mut self.secret);
    }
}

/// Overwrites the bytes of `s` with zeros and leaves it empty.
pub fn zero(s: &mut String) {
    unsafe {
        let bytes = s.as_mut_vec();
        memsec::memzero(bytes.as_mut_ptr(), bytes.len());
        bytes.set_len(0);
    }
}

/// Trims, strips interior spaces and uppercases `raw`, then checks that the
/// result is unpadded Base32.
///
/// The normalized text is returned, not the decoded key bytes. It is built
/// in one buffer owned by the returned [`Secret`], so no unzeroed copy of the
/// secret is left behind.
pub fn normalize(raw: &str) -> Result<Secret> {
    let raw = raw.trim();
    // Uppercasing may lengthen non-ASCII input; reserve enough to never grow.
    let mut secret = Secret::new(String::with_capacity(raw.len() * 3));
    for c in raw.chars().filter(|&c| c != ' ') {
        secret.secret.extend(c.to_uppercase());
    }
    if secret.secret.is_empty() {
        return Err(Error::invalid_format("No secret was given"));
    }
    secret.decode()?;
    Ok(secret)
}
