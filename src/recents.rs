// SPDX-License-Identifier: MIT

//! Recently opened domains, kept as an XML plist array of domain names.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::debug;
use plist::Value;

use crate::core::{
    error::{EditError, Result},
    types::Domain,
};

pub const DEFAULT_LIMIT: usize = 10;

/// Most-recently-used list of domains.
#[derive(Debug, Clone)]
pub struct Recents {
    path: PathBuf,
    limit: usize,
    /// Most recent first.
    domains: Vec<Domain>,
}

/// `<config dir>/defaults-edit/recents.plist`
pub fn default_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(env!("CARGO_PKG_NAME")).join("recents.plist"))
        .ok_or(EditError::HomeDirUnavailable)
}

impl Recents {
    /// Loads the list at `path`. A missing file is an empty list; entries that are not
    /// strings are skipped.
    pub fn load(path: impl Into<PathBuf>, limit: usize) -> Result<Self> {
        let path = path.into();
        let domains = match fs::read(&path) {
            Ok(buf) => match Value::from_reader(std::io::Cursor::new(buf))? {
                Value::Array(items) => items
                    .iter()
                    .filter_map(Value::as_string)
                    .map(Domain::parse)
                    .take(limit)
                    .collect(),
                _ => return Err(EditError::InvalidRoot(path.display().to_string())),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(EditError::FileRead { path, source }),
        };
        debug!("loaded {} recent domain(s)", domains.len());
        Ok(Self {
            path,
            limit,
            domains,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records `domain` as the most recent, dropping the oldest beyond the limit.
    pub fn add(&mut self, domain: Domain) {
        self.domains.retain(|d| *d != domain);
        self.domains.insert(0, domain);
        self.domains.truncate(self.limit);
    }

    pub fn clear(&mut self) {
        self.domains.clear();
    }

    /// Most recent first.
    pub fn iter(&self) -> impl Iterator<Item = &Domain> {
        self.domains.iter()
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn save(&self) -> Result<()> {
        let write_err = |source| EditError::FileWrite {
            path: self.path.clone(),
            source,
        };
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(write_err)?;
        }
        let names = self
            .domains
            .iter()
            .map(|d| Value::String(d.defaults_arg()))
            .collect();
        Value::Array(names).to_file_xml(&self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use tempfile::TempDir;

    fn user(name: &str) -> Domain {
        Domain::User(name.to_string())
    }

    #[test]
    fn adding_moves_to_front_and_evicts_the_oldest() {
        let dir = TempDir::new().unwrap();
        let mut recents = Recents::load(dir.path().join("recents.plist"), 3).unwrap();
        assert!(recents.is_empty());

        for name in ["a", "b", "c"] {
            recents.add(user(name));
        }
        recents.add(user("a"));
        recents.add(user("d"));

        let order: Vec<_> = recents.iter().cloned().collect();
        assert_eq!(order, vec![user("d"), user("a"), user("c")]);
    }

    #[test]
    fn survives_a_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("recents.plist");
        let mut recents = Recents::load(&path, DEFAULT_LIMIT).unwrap();
        recents.add(Domain::Global);
        recents.add(user("com.apple.dock"));
        recents.save().unwrap();

        let loaded = Recents::load(&path, DEFAULT_LIMIT).unwrap();
        let order: Vec<_> = loaded.iter().cloned().collect();
        assert_eq!(order, vec![user("com.apple.dock"), Domain::Global]);

        let mut cleared = loaded;
        cleared.clear();
        cleared.save().unwrap();
        assert!(Recents::load(&path, DEFAULT_LIMIT).unwrap().is_empty());
    }
}
