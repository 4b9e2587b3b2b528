//! The local ledger of registered names.
//!
//! The keyring cannot enumerate its entries, so every name that is stored is
//! also recorded here. The file never holds secrets.

use crate::error::{Error, Result};

use serde::{Deserialize, Deserializer};
use tempfile::NamedTempFile;

use std::fs;
use std::io;
use std::io::prelude::*;
use std::path::{Path, PathBuf};
use std::result;

#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Clone)]
pub struct IndexFile {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub names: Vec<String>,
}

/// Older versions of the tool wrote `"names": null` once every entry was gone.
fn null_as_empty<'de, D>(deserializer: D) -> result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl IndexFile {
    pub fn new(names: Vec<String>) -> IndexFile {
        IndexFile { names }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Serializes with sorted names, 2-space indentation and a trailing
    /// newline so identical content always produces identical bytes.
    pub fn to_writer<W: Write>(&self, mut writer: W) -> Result<()> {
        let mut sorted = self.clone();
        sorted.names.sort();
        serde_json::to_writer_pretty(&mut writer, &sorted)?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<IndexFile> {
        Ok(serde_json::from_reader(reader)?)
    }
}

/// Persistence for the name ledger.
///
/// `add` and `remove` are read-modify-write on top of `read` and `write`;
/// both are idempotent.
pub trait NameIndex {
    fn read(&self) -> Result<IndexFile>;

    fn write(&self, index: &IndexFile) -> Result<()>;

    fn add(&self, name: &str) -> Result<()> {
        let mut index = self.read()?;
        if index.contains(name) {
            return Ok(());
        }
        index.names.push(name.to_string());
        self.write(&index)
    }

    fn remove(&self, name: &str) -> Result<()> {
        let mut index = self.read()?;
        index.names.retain(|n| n != name);
        self.write(&index)
    }
}

/// A [`NameIndex`] stored as a JSON document at a fixed path.
#[derive(Debug, Clone)]
pub struct FileIndex {
    path: PathBuf,
}

impl FileIndex {
    pub fn new<P: Into<PathBuf>>(path: P) -> FileIndex {
        FileIndex { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl NameIndex for FileIndex {
    /// A missing file is an empty index.
    fn read(&self) -> Result<IndexFile> {
        match fs::File::open(&self.path) {
            Ok(file) => IndexFile::from_reader(io::BufReader::new(file)),
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => Ok(IndexFile::default()),
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Writes the new document to a uniquely named file next to the old one
    /// and renames it into place, so readers see either the old or the new
    /// file in full. Concurrent writers never share a temp file.
    fn write(&self, index: &IndexFile) -> Result<()> {
        let mut contents = Vec::new();
        index.to_writer(&mut contents)?;

        // The temp file is removed when dropped unless it was persisted.
        let mut file = NamedTempFile::new_in(self.dir())?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.as_file()
                .set_permissions(fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(&contents)?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        debug!(path = ?self.path, names = index.names.len(), "index written");
        Ok(())
    }
}

#[cfg(test)]
pub mod test {
    use super::*;
    use std::cell::{Cell, RefCell};

    /// In-memory index whose writes can be made to fail.
    #[derive(Debug, Default)]
    pub struct MemoryIndex {
        index: RefCell<IndexFile>,
        pub fail_write: Cell<bool>,
    }

    impl MemoryIndex {
        pub fn with(names: &[&str]) -> MemoryIndex {
            let index = MemoryIndex::default();
            index.index.borrow_mut().names = names.iter().map(|n| n.to_string()).collect();
            index
        }

        pub fn names(&self) -> Vec<String> {
            self.index.borrow().names.clone()
        }
    }

    impl NameIndex for MemoryIndex {
        fn read(&self) -> Result<IndexFile> {
            Ok(self.index.borrow().clone())
        }

        fn write(&self, index: &IndexFile) -> Result<()> {
            if self.fail_write.get() {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::Other,
                    "No space left on device",
                )));
            }
            let mut sorted = index.clone();
            sorted.names.sort();
            *self.index.borrow_mut() = sorted;
            Ok(())
        }
    }
}
