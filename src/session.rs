// SPDX-License-Identifier: MIT

//! Editing one domain: the tree editor on top of a preference store.
//!
//! Edits are computed on the whole domain tree with the functions in [`crate::editor`], then
//! persisted as the difference between the old and new top-level entries: changed or new
//! keys are written one by one, vanished keys are deleted in one batch.

use std::collections::BTreeSet;

use log::{debug, info};

use crate::{
    core::{
        error::{EditError, Result},
        types::{Domain, PlistType, PlistValue},
    },
    editor::{
        self, CollisionPolicy,
        coerce::parse_scalar,
        item::PlistItem,
        path::{PlistPath, Segment},
    },
    store::PreferenceStore,
};

/// An open domain.
pub struct DomainSession<S> {
    store: S,
}

impl<S: PreferenceStore> DomainSession<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn domain(&self) -> &Domain {
        self.store.domain()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The whole domain as a dictionary.
    pub fn tree(&self) -> Result<PlistValue> {
        Ok(PlistValue::Dictionary(self.store.read_all()?))
    }

    /// The top-level entries whose key contains `filter`.
    pub fn listing(&self, filter: Option<&str>) -> Result<PlistValue> {
        let entries = self.store.read_all()?;
        Ok(PlistValue::Dictionary(editor::filter_keys(&entries, filter)))
    }

    /// Every key visible to the domain: the entries of `global` with the domain's own
    /// entries on top, filtered like [`Self::listing`].
    pub fn visible<G: PreferenceStore + ?Sized>(
        &self,
        global: &G,
        filter: Option<&str>,
    ) -> Result<PlistValue> {
        let mut entries = if *self.domain() == Domain::Global {
            Default::default()
        } else {
            global.read_all()?
        };
        entries.extend(self.store.read_all()?);
        Ok(PlistValue::Dictionary(editor::filter_keys(&entries, filter)))
    }

    /// The type of the node at `path`. Top-level keys ask the store, which may know more
    /// than the value itself tells.
    pub fn type_at(&self, path: &PlistPath) -> Result<PlistType> {
        if let [Segment::Key(key)] = path.segments() {
            if let Some(kind) = self.store.read_type(key)? {
                return Ok(kind);
            }
        }
        Ok(editor::resolve(&self.tree()?, path)?.plist_type())
    }

    /// Stages the node at `path` for editing.
    pub fn item_at(&self, path: &PlistPath) -> Result<PlistItem> {
        let tree = self.tree()?;
        let value = editor::resolve(&tree, path)?.clone();
        let key = path
            .last()
            .map(Segment::label)
            .ok_or_else(|| EditError::invalid_path(path, "the domain itself is not an entry"))?;
        Ok(PlistItem::from_entry(key, value))
    }

    /// Replaces the node at `path` with the staged item.
    pub fn commit(
        &mut self,
        path: &PlistPath,
        item: PlistItem,
        policy: CollisionPolicy,
    ) -> Result<()> {
        if path.is_empty() {
            return Err(EditError::invalid_path(path, "the domain itself is not an entry"));
        }
        let (key, value) = item.into_entry()?;
        let old = self.tree()?;
        let new = editor::replace_with(&old, path, &key, value, policy)?;
        self.persist(old, new)
    }

    /// Adds the staged item under the container at `parent`.
    pub fn add(
        &mut self,
        parent: &PlistPath,
        item: PlistItem,
        policy: CollisionPolicy,
    ) -> Result<()> {
        let (key, value) = item.into_entry()?;
        let old = self.tree()?;
        let new = editor::insert(&old, parent, &key, value, policy)?;
        self.persist(old, new)
    }

    /// Removes the nodes at `paths`. Later indexes go first so earlier ones stay valid.
    pub fn remove(&mut self, paths: &[PlistPath]) -> Result<()> {
        let mut ordered: Vec<&PlistPath> = paths.iter().collect();
        ordered.sort();
        ordered.dedup();
        let old = self.tree()?;
        let mut new = old.clone();
        for path in ordered.into_iter().rev() {
            new = editor::remove(&new, path)?;
        }
        self.persist(old, new)
    }

    /// Sets the node at `path` from user-typed text, read as `kind` or as the node's current
    /// type. A missing node is created only when its parent exists and can hold it: a new
    /// key of a dictionary, or the element just past the end of an array.
    pub fn set(&mut self, path: &PlistPath, kind: Option<PlistType>, text: &str) -> Result<()> {
        let tree = self.tree()?;
        let missing = match editor::resolve(&tree, path) {
            Ok(_) => {
                let mut item = self.item_at(path)?;
                let kind = kind.unwrap_or(item.declared_type());
                item.set_type(kind);
                item.set_value(Some(parse_scalar(kind, text)?));
                return self.commit(path, item, CollisionPolicy::Reject);
            }
            Err(e) => e,
        };

        let Some((parent, last)) = path.split_last() else {
            return Err(missing);
        };
        let creatable = match (editor::resolve(&tree, &parent), last) {
            (Ok(PlistValue::Dictionary(_)), Segment::Key(_)) => true,
            (Ok(PlistValue::Array(items)), Segment::Index(index)) => *index == items.len(),
            _ => false,
        };
        if !creatable {
            return Err(missing);
        }

        let kind = kind.unwrap_or(PlistType::String);
        let mut item = PlistItem::default();
        item.set_key(last.label());
        item.set_type(kind);
        item.set_value(Some(parse_scalar(kind, text)?));
        self.add(&parent, item, CollisionPolicy::Reject)
    }

    /// Picks up changes made outside this session.
    pub fn reload(&mut self) -> Result<()> {
        self.store.synchronize()
    }

    fn persist(&mut self, old: PlistValue, new: PlistValue) -> Result<()> {
        let old = old.into_dictionary().unwrap_or_default();
        let new = match new {
            PlistValue::Dictionary(dict) => dict,
            other => {
                debug!("edit produced a {} root", other.plist_type());
                return Err(EditError::InvalidRoot(self.domain().to_string()));
            }
        };

        let mut written = 0;
        for (key, value) in &new {
            if old.get(key) != Some(value) {
                self.store.write(key, value)?;
                written += 1;
            }
        }
        let deleted: BTreeSet<String> = old
            .keys()
            .filter(|key| !new.contains_key(*key))
            .cloned()
            .collect();
        if !deleted.is_empty() {
            self.store.delete_keys(&deleted)?;
        }
        info!(
            "{}: wrote {written} key(s), deleted {} key(s)",
            self.domain(),
            deleted.len()
        );
        self.store.synchronize()
    }
}
