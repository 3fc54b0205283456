// SPDX-License-Identifier: MIT

//! Preference stores: where the entries of a domain are read from and written back to.
//!
//! A store is picked once per session from the [`Domain`] and the configured [`Backend`]:
//! - [`PlistFileStore`] edits a plist file directly (path domains, or any domain off macOS).
//! - [`DefaultsCommandStore`] goes through the `defaults` tool, which keeps the preferences
//!   daemon in sync.
//!
//! Both are wrapped in a [`CachedStore`] that remembers the last full read.

mod cache;
mod command;
mod file;

use std::{
    collections::{BTreeMap, BTreeSet},
    path::PathBuf,
    str::FromStr,
};

use crate::core::{
    error::{EditError, Result},
    types::{Domain, PlistType, PlistValue},
};

pub use cache::CachedStore;
pub use command::{DEFAULTS_PROGRAM, DefaultsCommandStore, list_domains};
pub use file::PlistFileStore;

/// Source and sink for the top-level entries of one domain.
pub trait PreferenceStore {
    fn domain(&self) -> &Domain;

    /// Reads every entry set in the domain.
    fn read_all(&self) -> Result<BTreeMap<String, PlistValue>>;

    /// Reports the type of the value under `key`, if it is set.
    fn read_type(&self, key: &str) -> Result<Option<PlistType>> {
        Ok(self.read_all()?.get(key).map(PlistValue::plist_type))
    }

    /// Sets a single entry, replacing any previous value.
    fn write(&mut self, key: &str, value: &PlistValue) -> Result<()>;

    /// Removes the given entries. Keys that are not set are ignored.
    fn delete_keys(&mut self, keys: &BTreeSet<String>) -> Result<()>;

    /// Flushes pending changes and picks up changes made elsewhere.
    fn synchronize(&mut self) -> Result<()>;
}

impl<S: PreferenceStore + ?Sized> PreferenceStore for Box<S> {
    fn domain(&self) -> &Domain {
        (**self).domain()
    }

    fn read_all(&self) -> Result<BTreeMap<String, PlistValue>> {
        (**self).read_all()
    }

    fn read_type(&self, key: &str) -> Result<Option<PlistType>> {
        (**self).read_type(key)
    }

    fn write(&mut self, key: &str, value: &PlistValue) -> Result<()> {
        (**self).write(key, value)
    }

    fn delete_keys(&mut self, keys: &BTreeSet<String>) -> Result<()> {
        (**self).delete_keys(keys)
    }

    fn synchronize(&mut self) -> Result<()> {
        (**self).synchronize()
    }
}

/// Backend selection for preferences (`defaults` tool vs plist file).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Plist files for path domains and off macOS, the `defaults` tool otherwise.
    #[default]
    Auto,
    File,
    Command,
}

impl FromStr for Backend {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(Backend::Auto),
            "file" => Ok(Backend::File),
            "command" => Ok(Backend::Command),
            other => Err(EditError::UnknownBackend(other.to_string())),
        }
    }
}

/// Run-time settings for opening stores.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: Backend,
    /// The `defaults` executable used by the command backend.
    pub defaults_program: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Auto,
            defaults_program: PathBuf::from(DEFAULTS_PROGRAM),
        }
    }
}

impl StoreConfig {
    /// Resolves [`Backend::Auto`] for `domain`.
    pub fn backend_for(&self, domain: &Domain) -> Backend {
        match (self.backend, domain) {
            (Backend::Auto, Domain::Path(_)) => Backend::File,
            (Backend::Auto, _) if cfg!(target_os = "macos") => Backend::Command,
            (Backend::Auto, _) => Backend::File,
            (chosen, _) => chosen,
        }
    }
}

/// Opens the store for `domain` according to `config`.
pub fn open(domain: Domain, config: &StoreConfig) -> Result<CachedStore<Box<dyn PreferenceStore>>> {
    let store: Box<dyn PreferenceStore> = match config.backend_for(&domain) {
        Backend::Command => Box::new(DefaultsCommandStore::new(
            domain,
            config.defaults_program.clone(),
        )),
        _ => Box::new(PlistFileStore::new(domain)?),
    };
    log::debug!(
        "opened {} with the {:?} backend",
        store.domain(),
        config.backend_for(store.domain())
    );
    Ok(CachedStore::new(store))
}
