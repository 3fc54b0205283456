// SPDX-License-Identifier: MIT

use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::{Path, PathBuf},
};

use log::{debug, warn};

use crate::{
    core::{
        convert::{read_document, write_document},
        error::{EditError, Result},
        types::{Domain, PlistValue},
    },
    store::PreferenceStore,
};

/// A plist file as loaded, with what is needed to write it back the same way.
struct LoadedPlist {
    entries: BTreeMap<String, PlistValue>,
    orig_owner: Option<(u32, u32)>,
    is_binary: bool,
}

/// Reads and writes a domain's preference file directly.
#[derive(Debug, Clone)]
pub struct PlistFileStore {
    domain: Domain,
    path: PathBuf,
}

impl PlistFileStore {
    pub fn new(domain: Domain) -> Result<Self> {
        let path = domain.plist_path()?;
        Ok(Self { domain, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the plist; a missing file is an empty domain.
    fn load(&self) -> Result<LoadedPlist> {
        let metadata = match fs::metadata(&self.path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(LoadedPlist {
                    entries: BTreeMap::new(),
                    orig_owner: None,
                    is_binary: false,
                });
            }
            Err(source) => {
                return Err(EditError::FileRead {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let buf = fs::read(&self.path).map_err(|source| EditError::FileRead {
            path: self.path.clone(),
            source,
        })?;
        let (plist, is_binary) = read_document(&buf)?;
        let entries = plist
            .into_dictionary()
            .ok_or_else(|| EditError::InvalidRoot(self.path.display().to_string()))?;

        Ok(LoadedPlist {
            entries,
            orig_owner: owner_of(&metadata),
            is_binary,
        })
    }

    /// Saves the plist in its original format through a temporary file and an atomic rename,
    /// keeping the original owner and permissions.
    fn save(&self, loaded: &LoadedPlist) -> Result<()> {
        let write_err = |source| EditError::FileWrite {
            path: self.path.clone(),
            source,
        };

        let buf = write_document(
            &PlistValue::Dictionary(loaded.entries.clone()),
            loaded.is_binary,
        )?;

        let orig_perm = fs::metadata(&self.path).ok().map(|m| m.permissions());

        let dir = self
            .path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(write_err)?;
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| write_err(std::io::Error::other("path has no file name")))?;
        let tmp_path = dir.join(format!("{}.tmp", file_name.to_string_lossy()));

        fs::write(&tmp_path, &buf).map_err(write_err)?;

        if let Some((uid, gid)) = loaded.orig_owner {
            if let Err(e) = restore_ownership(&tmp_path, uid, gid) {
                warn!("could not restore ownership of {}: {e}", self.path.display());
            }
        }

        if let Err(source) = fs::rename(&tmp_path, &self.path) {
            if let Err(e) = fs::remove_file(&tmp_path) {
                debug!("could not remove {}: {e}", tmp_path.display());
            }
            return Err(write_err(source));
        }

        if let Some(perm) = orig_perm {
            fs::set_permissions(&self.path, perm).map_err(write_err)?;
        }

        debug!(
            "saved {} entries to {}",
            loaded.entries.len(),
            self.path.display()
        );
        Ok(())
    }

    fn modify(&self, edit: impl FnOnce(&mut BTreeMap<String, PlistValue>) -> bool) -> Result<()> {
        let mut loaded = self.load()?;
        if edit(&mut loaded.entries) {
            self.save(&loaded)?;
        }
        Ok(())
    }
}

#[cfg(unix)]
fn owner_of(metadata: &fs::Metadata) -> Option<(u32, u32)> {
    use std::os::unix::fs::MetadataExt;
    Some((metadata.uid(), metadata.gid()))
}

#[cfg(not(unix))]
fn owner_of(_metadata: &fs::Metadata) -> Option<(u32, u32)> {
    None
}

#[cfg(unix)]
fn restore_ownership(path: &Path, uid: u32, gid: u32) -> std::io::Result<()> {
    std::os::unix::fs::chown(path, Some(uid), Some(gid))
}

#[cfg(not(unix))]
fn restore_ownership(_path: &Path, _uid: u32, _gid: u32) -> std::io::Result<()> {
    Ok(())
}

impl PreferenceStore for PlistFileStore {
    fn domain(&self) -> &Domain {
        &self.domain
    }

    fn read_all(&self) -> Result<BTreeMap<String, PlistValue>> {
        Ok(self.load()?.entries)
    }

    fn write(&mut self, key: &str, value: &PlistValue) -> Result<()> {
        self.modify(|entries| {
            entries.insert(key.to_string(), value.clone());
            true
        })
    }

    fn delete_keys(&mut self, keys: &BTreeSet<String>) -> Result<()> {
        self.modify(|entries| {
            let before = entries.len();
            entries.retain(|k, _| !keys.contains(k));
            entries.len() != before
        })
    }

    // every write goes straight to disk
    fn synchronize(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::core::types::PlistType;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> PlistFileStore {
        PlistFileStore::new(Domain::Path(dir.path().join("com.example.test.plist"))).unwrap()
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        assert!(store_in(&dir).read_all().unwrap().is_empty());
    }

    #[test]
    fn writes_and_deletes_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        store.write("tilesize", &PlistValue::Integer(48)).unwrap();
        store
            .write("name", &PlistValue::String("dock".into()))
            .unwrap();
        assert_eq!(
            store.read_type("tilesize").unwrap(),
            Some(PlistType::Integer)
        );
        assert_eq!(store.read_type("nope").unwrap(), None);

        store
            .delete_keys(&BTreeSet::from(["tilesize".to_string(), "absent".to_string()]))
            .unwrap();
        let entries = store.read_all().unwrap();
        assert_eq!(entries.keys().collect::<Vec<_>>(), vec!["name"]);
        assert!(!dir.path().join("com.example.test.plist.tmp").exists());
    }

    #[test]
    fn binary_files_stay_binary() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("com.example.test.plist");
        let seed = write_document(&PlistValue::Dictionary(BTreeMap::new()), true).unwrap();
        fs::write(&path, seed).unwrap();

        let mut store = store_in(&dir);
        store.write("flag", &PlistValue::Boolean(true)).unwrap();

        let raw = fs::read(&path).unwrap();
        assert!(raw.starts_with(b"bplist00"));
        let (_, is_binary) = read_document(&raw).unwrap();
        assert!(is_binary);
    }

    #[test]
    fn failed_rename_leaves_no_temporary_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("com.example.test.plist");
        // a non-empty directory cannot be replaced by a file
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), b"x").unwrap();

        let store = store_in(&dir);
        let loaded = LoadedPlist {
            entries: BTreeMap::from([("k".to_string(), PlistValue::Integer(1))]),
            orig_owner: None,
            is_binary: false,
        };
        assert!(matches!(
            store.save(&loaded),
            Err(EditError::FileWrite { .. })
        ));
        assert!(!dir.path().join("com.example.test.plist.tmp").exists());
        assert!(path.join("keep").exists());
    }

    #[test]
    fn non_dictionary_root_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("com.example.test.plist");
        fs::write(&path, write_document(&PlistValue::Array(vec![]), false).unwrap()).unwrap();
        assert!(matches!(
            store_in(&dir).read_all(),
            Err(EditError::InvalidRoot(_))
        ));
    }
}
