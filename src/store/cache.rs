// SPDX-License-Identifier: MIT

use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet},
};

use crate::{
    core::{
        error::Result,
        types::{Domain, PlistType, PlistValue},
    },
    store::PreferenceStore,
};

/// Remembers the last full read of the wrapped store until something changes it.
pub struct CachedStore<S> {
    inner: S,
    cached: RefCell<Option<BTreeMap<String, PlistValue>>>,
}

impl<S: PreferenceStore> CachedStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cached: RefCell::new(None),
        }
    }

    /// Drops the remembered read so the next one goes to the store.
    pub fn invalidate(&self) {
        self.cached.borrow_mut().take();
    }

    pub fn is_cached(&self) -> bool {
        self.cached.borrow().is_some()
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: PreferenceStore> PreferenceStore for CachedStore<S> {
    fn domain(&self) -> &Domain {
        self.inner.domain()
    }

    fn read_all(&self) -> Result<BTreeMap<String, PlistValue>> {
        if let Some(entries) = self.cached.borrow().as_ref() {
            return Ok(entries.clone());
        }
        let entries = self.inner.read_all()?;
        *self.cached.borrow_mut() = Some(entries.clone());
        Ok(entries)
    }

    fn read_type(&self, key: &str) -> Result<Option<PlistType>> {
        self.inner.read_type(key)
    }

    fn write(&mut self, key: &str, value: &PlistValue) -> Result<()> {
        self.invalidate();
        self.inner.write(key, value)
    }

    fn delete_keys(&mut self, keys: &BTreeSet<String>) -> Result<()> {
        self.invalidate();
        self.inner.delete_keys(keys)
    }

    fn synchronize(&mut self) -> Result<()> {
        self.invalidate();
        self.inner.synchronize()
    }
}
