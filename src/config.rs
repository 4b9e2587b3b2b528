use crate::error::{Error, Result};
use std::env;
use std::io;
use std::path::PathBuf;

pub const DEFAULT_SERVICE: &str = "totp";
pub const INDEX_FILE_NAME: &str = ".totp.json";

pub const INDEX_ENV: &str = "TOTP_INDEX";
pub const SERVICE_ENV: &str = "TOTP_SERVICE";

/// Where the name index lives and which keyring service holds the secrets.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub index_path: PathBuf,
    pub service: String,
}

impl Config {
    pub fn new<P: Into<PathBuf>, S: Into<String>>(index_path: P, service: S) -> Config {
        Config {
            index_path: index_path.into(),
            service: service.into(),
        }
    }

    /// Explicit values first, then `$TOTP_INDEX` / `$TOTP_SERVICE`, then
    /// `~/.totp.json` and `totp`.
    pub fn load(index_path: Option<&str>, service: Option<&str>) -> Result<Config> {
        Config::from_lookup(
            |key| {
                let explicit = match key {
                    INDEX_ENV => index_path,
                    SERVICE_ENV => service,
                    _ => None,
                };
                explicit.map(String::from).or_else(|| env::var(key).ok())
            },
            dirs::home_dir(),
        )
    }

    fn from_lookup<F>(lookup: F, home: Option<PathBuf>) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let index_path = match lookup(INDEX_ENV).filter(|v| !v.is_empty()) {
            Some(path) => PathBuf::from(path),
            None => home
                .ok_or_else(|| {
                    Error::Io(io::Error::new(
                        io::ErrorKind::NotFound,
                        "could not determine the home directory",
                    ))
                })?
                .join(INDEX_FILE_NAME),
        };
        let service = lookup(SERVICE_ENV)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_SERVICE.to_string());
        Ok(Config::new(index_path, service))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_home() {
        let config = Config::from_lookup(|_| None, Some(PathBuf::from("/home/me"))).unwrap();
        assert_eq!(config, Config::new("/home/me/.totp.json", "totp"));
    }

    #[test]
    fn environment_overrides() {
        let config = Config::from_lookup(
            |key| match key {
                INDEX_ENV => Some(String::from("/tmp/index.json")),
                SERVICE_ENV => Some(String::from("totp-work")),
                _ => None,
            },
            None,
        )
        .unwrap();
        assert_eq!(config, Config::new("/tmp/index.json", "totp-work"));
    }

    #[test]
    fn empty_values_are_ignored() {
        let config =
            Config::from_lookup(|_| Some(String::new()), Some(PathBuf::from("/root"))).unwrap();
        assert_eq!(config, Config::new("/root/.totp.json", "totp"));
    }

    #[test]
    fn explicit_values_win() {
        let config = Config::load(Some("/tmp/explicit.json"), Some("totp-explicit")).unwrap();
        assert_eq!(config, Config::new("/tmp/explicit.json", "totp-explicit"));
    }

    #[test]
    fn missing_home_is_an_error() {
        match Config::from_lookup(|_| None, None) {
            Err(Error::Io(_)) => (),
            other => panic!("unexpected {:?}", other),
        }
    }
}
