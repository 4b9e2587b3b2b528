use std::io;
use std::result;

#[derive(Debug, Fail)]
pub enum Error {
    /// The name has no secret in the keyring.
    #[fail(display = "Given name \"{}\" is not found", _0)]
    NotFound(String),

    #[fail(display = "{}", _0)]
    InvalidFormat(String),

    /// The keyring refused the payload because of its size.
    #[fail(display = "secret too large to store in system keyring: {}", _0)]
    TooLarge(String),

    #[fail(display = "{}", _0)]
    Io(#[cause] io::Error),

    #[fail(display = "malformed index file: {}", _0)]
    Json(#[cause] serde_json::Error),

    #[fail(display = "system keyring error: {}", _0)]
    Store(String),

    #[fail(display = "{}", _0)]
    Decode(String),

    /// The system time could not be turned into a TOTP counter.
    #[fail(display = "system clock error: {}", _0)]
    Clock(String),

    /// Input closed while a prompt was waiting for an answer.
    #[fail(display = "input closed before an answer was given")]
    Cancelled,
}

pub type Result<T> = result::Result<T, Error>;

impl Error {
    pub fn invalid_format<S: Into<String>>(reason: S) -> Error {
        Error::InvalidFormat(reason.into())
    }

    pub fn decode<S: Into<String>>(reason: S) -> Error {
        Error::Decode(reason.into())
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound(_) => true,
            _ => false,
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Error::Io(error)
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Json(error)
    }
}
