use crate::error::{Error, Result};
use crate::secret::Secret;
use std::time::SystemTimeError;
use totp_rs::{Algorithm, TOTP};

pub const DIGITS: usize = 6;
pub const STEP: u64 = 30;

fn totp(secret: &Secret) -> Result<TOTP> {
    // Short secrets are common in the wild, so the RFC length check is off.
    Ok(TOTP::new_unchecked(
        Algorithm::SHA1,
        DIGITS,
        1,
        STEP,
        secret.decode()?,
    ))
}

/// The code for the current 30-second step.
pub fn current_code(secret: &Secret) -> Result<String> {
    totp(secret)?.generate_current().map_err(clock_error)
}

fn clock_error(error: SystemTimeError) -> Error {
    Error::Clock(format!("clock is set before the Unix epoch ({})", error))
}
