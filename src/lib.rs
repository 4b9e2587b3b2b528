extern crate data_encoding;
extern crate dirs;
#[macro_use]
extern crate failure;
extern crate image;
extern crate keyring;
extern crate memsec;
extern crate rqrr;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate serde_json;
extern crate tempfile;
extern crate totp_rs;
#[macro_use]
extern crate tracing;
extern crate url;

pub mod config;
pub mod error;
pub mod import;
pub mod index;
pub mod manager;
pub mod prompt;
pub mod secret;
pub mod store;
pub mod totp;

use crate::config::Config;
use crate::index::FileIndex;
use crate::manager::EntryManager;
use crate::store::KeyringStore;

/// The manager the command line works with: the system keyring plus the
/// JSON index, both as named by `config`.
pub fn open(config: &Config) -> EntryManager<KeyringStore, FileIndex> {
    EntryManager::new(
        KeyringStore::new(config.service.clone()),
        FileIndex::new(config.index_path.clone()),
    )
}
