//! Keeps the keyring and the name index consistent without a transaction.
//!
//! Ordering rules:
//!
//! * add writes the keyring first, then the index. A failed keyring write
//!   leaves no trace.
//! * delete removes from the keyring, then from the index even when the
//!   keyring had nothing.
//! * list drops indexed names the keyring no longer knows and persists the
//!   result.

use crate::error::{Error, Result};
use crate::index::NameIndex;
use crate::prompt::Prompt;
use crate::secret::Secret;
use crate::store::SecretStore;

pub struct EntryManager<S, I> {
    store: S,
    index: I,
}

impl<S: SecretStore, I: NameIndex> EntryManager<S, I> {
    pub fn new(store: S, index: I) -> EntryManager<S, I> {
        EntryManager { store, index }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    /// Stores `secret` under `name` and records the name.
    ///
    /// If the index write fails after the keyring write succeeded, the error
    /// is returned and the entry stays retrievable with `get_entry` but is
    /// missing from `list_entries` until it is added again.
    pub fn add_entry(&self, name: &str, secret: &Secret) -> Result<()> {
        self.store.set(name, secret)?;
        if let Err(e) = self.index.add(name) {
            warn!(name = %name, error = %e, "secret stored but name not indexed");
            return Err(e);
        }
        info!(name = %name, "entry added");
        Ok(())
    }

    /// Reads the secret straight from the keyring. The index is not
    /// consulted.
    pub fn get_entry(&self, name: &str) -> Result<Secret> {
        self.store
            .get(name)?
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// Removes `name` from both stores. Deleting an absent name succeeds.
    pub fn delete_entry(&self, name: &str) -> Result<()> {
        if !self.store.delete(name)? {
            debug!(name = %name, "no secret in keyring, removing from index only");
        }
        self.index.remove(name)?;
        info!(name = %name, "entry deleted");
        Ok(())
    }

    /// Indexed names that still resolve in the keyring, in index order.
    ///
    /// Names whose secret is gone are pruned from the index as a side
    /// effect. Any other keyring error aborts without pruning.
    pub fn list_entries(&self) -> Result<Vec<String>> {
        let mut index = self.index.read()?;
        let mut kept = Vec::with_capacity(index.names.len());
        for name in index.names.drain(..) {
            if self.store.get(&name)?.is_some() {
                kept.push(name);
            } else {
                warn!(name = %name, "dropping stale name from index");
            }
        }
        index.names = kept;
        self.index.write(&index)?;
        Ok(index.names)
    }

    /// Whether the keyring holds a secret for `name`, whatever the index says.
    pub fn name_exists(&self, name: &str) -> Result<bool> {
        Ok(self.store.get(name)?.is_some())
    }

    /// Returns `candidate`, or the first replacement from `prompt` that is
    /// not already taken in the keyring.
    pub fn resolve_name<P: Prompt + ?Sized>(
        &self,
        candidate: &str,
        prompt: &mut P,
    ) -> Result<String> {
        let mut name = candidate.to_string();
        while self.name_exists(&name)? {
            name = prompt.new_name(&name)?;
        }
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::test::MemoryIndex;
    use crate::index::FileIndex;
    use crate::prompt::StaticPrompt;
    use crate::secret::normalize;
    use crate::store::test::MemoryStore;

    fn secret() -> Secret {
        normalize("JBSWY3DPEHPK3PXP").unwrap()
    }

    fn manager(stored: &[&str], indexed: &[&str]) -> EntryManager<MemoryStore, MemoryIndex> {
        EntryManager::new(MemoryStore::with(stored), MemoryIndex::with(indexed))
    }

    #[test]
    fn add_get_list_delete() {
        let dir = tempfile::tempdir().unwrap();
        let manager = EntryManager::new(
            MemoryStore::new(),
            FileIndex::new(dir.path().join(".totp.json")),
        );

        manager.add_entry("x", &secret()).unwrap();
        assert_eq!(manager.get_entry("x").unwrap(), secret());
        assert_eq!(manager.list_entries().unwrap(), vec!["x"]);

        manager.delete_entry("x").unwrap();
        assert!(manager.list_entries().unwrap().is_empty());
        assert!(manager.get_entry("x").unwrap_err().is_not_found());
    }

    #[test]
    fn add_is_idempotent_in_index() {
        let manager = manager(&[], &[]);
        manager.add_entry("x", &secret()).unwrap();
        manager.add_entry("x", &secret()).unwrap();
        assert_eq!(manager.index().names(), vec!["x"]);
    }

    #[test]
    fn failed_store_write_leaves_no_index_entry() {
        let manager = manager(&[], &[]);
        manager.store().fail_set_too_large.set(true);
        match manager.add_entry("x", &secret()) {
            Err(Error::TooLarge(_)) => (),
            other => panic!("unexpected {:?}", other),
        }
        assert!(manager.index().names().is_empty());
        assert!(!manager.store().contains("x"));
    }

    #[test]
    fn failed_index_write_leaves_unlisted_entry() {
        let manager = manager(&[], &[]);
        manager.index().fail_write.set(true);
        match manager.add_entry("x", &secret()) {
            Err(Error::Io(_)) => (),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(manager.get_entry("x").unwrap(), secret());

        manager.index().fail_write.set(false);
        assert!(manager.list_entries().unwrap().is_empty());
        manager.add_entry("x", &secret()).unwrap();
        assert_eq!(manager.list_entries().unwrap(), vec!["x"]);
    }

    #[test]
    fn get_ignores_index() {
        let unindexed = manager(&["x"], &[]);
        assert!(unindexed.get_entry("x").is_ok());
        let unstored = manager(&[], &["y"]);
        assert!(unstored.get_entry("y").unwrap_err().is_not_found());
    }

    #[test]
    fn delete_absent_name_succeeds() {
        let manager = manager(&[], &["a"]);
        manager.delete_entry("x").unwrap();
        assert_eq!(manager.index().names(), vec!["a"]);
    }

    #[test]
    fn delete_indexed_but_unstored_name() {
        let manager = manager(&[], &["a", "x"]);
        manager.delete_entry("x").unwrap();
        assert_eq!(manager.index().names(), vec!["a"]);
    }

    #[test]
    fn delete_store_failure_keeps_index() {
        let manager = manager(&["x"], &["x"]);
        manager.store().fail_delete.set(true);
        assert!(manager.delete_entry("x").is_err());
        assert_eq!(manager.index().names(), vec!["x"]);
    }

    #[test]
    fn list_heals_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".totp.json");
        let manager = EntryManager::new(MemoryStore::with(&["A"]), FileIndex::new(&path));
        manager.index().add("A").unwrap();
        manager.index().add("B").unwrap();

        assert_eq!(manager.list_entries().unwrap(), vec!["A"]);
        assert_eq!(FileIndex::new(&path).read().unwrap().names, vec!["A"]);
    }

    #[test]
    fn list_keeps_index_order() {
        let manager = manager(&["a", "b", "c"], &["a", "b", "c"]);
        assert_eq!(manager.list_entries().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn list_store_failure_prunes_nothing() {
        let manager = manager(&["A"], &["A", "B"]);
        manager.store().fail_get.set(true);
        match manager.list_entries() {
            Err(Error::Store(_)) => (),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(manager.index().names(), vec!["A", "B"]);
    }

    #[test]
    fn name_exists_checks_store_not_index() {
        let manager = manager(&["x"], &["y"]);
        assert!(manager.name_exists("x").unwrap());
        assert!(!manager.name_exists("y").unwrap());
    }

    #[test]
    fn resolve_name_prompts_on_collision() {
        // The index has been deleted; the keyring still has "x".
        let manager = manager(&["x", "x2"], &[]);
        let mut prompt = StaticPrompt::new(vec![], vec![String::from("x2"), String::from("x3")]);
        assert_eq!(manager.resolve_name("x", &mut prompt).unwrap(), "x3");

        let mut prompt = StaticPrompt::new(vec![], vec![]);
        assert_eq!(manager.resolve_name("free", &mut prompt).unwrap(), "free");
    }

    #[test]
    fn resolve_name_gives_up_when_prompt_does() {
        let manager = manager(&["x"], &[]);
        let mut prompt = StaticPrompt::new(vec![], vec![]);
        match manager.resolve_name("x", &mut prompt) {
            Err(Error::Cancelled) => (),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn out_of_band_removal_is_healed() {
        let manager = manager(&[], &[]);
        manager.add_entry("x", &secret()).unwrap();
        manager.store().remove_out_of_band("x");
        assert!(manager.list_entries().unwrap().is_empty());
        assert!(manager.index().names().is_empty());
    }
}
