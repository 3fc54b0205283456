// SPDX-License-Identifier: MIT

//! Property-list tree editing.
//!
//! Every operation here is a pure transformation: lookups borrow from the tree they are
//! given, edits rebuild the nodes along the edited path and return a new root, leaving
//! every node off that path equal to its counterpart in the input.

pub mod coerce;
pub mod item;
pub mod path;

use std::{
    collections::{BTreeMap, btree_map},
    iter::Enumerate,
    slice,
};

use log::warn;
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::core::{
    error::{EditError, Result},
    types::PlistValue,
};

use self::path::{PlistPath, Segment};

/// What to do when a rename or insert targets a key that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionPolicy {
    /// Log a warning and let the new entry replace the existing one.
    #[default]
    Overwrite,
    /// Fail with [`EditError::KeyCollision`].
    Reject,
}

/// Children of a node, in display order.
pub enum Children<'a> {
    Dictionary(btree_map::Iter<'a, String, PlistValue>),
    Array(Enumerate<slice::Iter<'a, PlistValue>>),
    Leaf,
}

impl<'a> Iterator for Children<'a> {
    type Item = (Segment, &'a PlistValue);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Children::Dictionary(iter) => iter
                .next()
                .map(|(key, child)| (Segment::Key(key.clone()), child)),
            Children::Array(iter) => iter
                .next()
                .map(|(index, child)| (Segment::Index(index), child)),
            Children::Leaf => None,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Children::Dictionary(iter) => iter.size_hint(),
            Children::Array(iter) => iter.size_hint(),
            Children::Leaf => (0, Some(0)),
        }
    }
}

/// Lists the children of `node`: dictionary entries by ascending key, array elements in
/// order, nothing for a leaf.
pub fn children(node: &PlistValue) -> Children<'_> {
    match node {
        PlistValue::Dictionary(dict) => Children::Dictionary(dict.iter()),
        PlistValue::Array(items) => Children::Array(items.iter().enumerate()),
        _ => Children::Leaf,
    }
}

pub fn is_expandable(node: &PlistValue) -> bool {
    matches!(node, PlistValue::Dictionary(_) | PlistValue::Array(_))
}

/// Finds the node at `path`.
pub fn resolve<'a>(root: &'a PlistValue, path: &PlistPath) -> Result<&'a PlistValue> {
    path.segments()
        .iter()
        .try_fold(root, |node, segment| child(node, segment, path))
}

fn child<'a>(node: &'a PlistValue, segment: &Segment, path: &PlistPath) -> Result<&'a PlistValue> {
    match (node, segment) {
        (PlistValue::Dictionary(dict), Segment::Key(key)) => dict
            .get(key)
            .ok_or_else(|| EditError::invalid_path(path, format!("no key `{key}`"))),
        (PlistValue::Array(items), Segment::Index(index)) => {
            items.get(*index).ok_or_else(|| {
                EditError::invalid_path(
                    path,
                    format!("index {index} out of bounds for {} elements", items.len()),
                )
            })
        }
        (node, segment) => Err(mismatch(node, segment, path)),
    }
}

fn mismatch(node: &PlistValue, segment: &Segment, path: &PlistPath) -> EditError {
    let reason = match segment {
        Segment::Key(key) => format!("key `{key}` applied to {}", node.plist_type()),
        Segment::Index(index) => format!("index {index} applied to {}", node.plist_type()),
    };
    EditError::invalid_path(path, reason)
}

/// Rebuilds the nodes from `node` down to the end of `rest`, splicing in what `edit`
/// returns for the final node. Keys and indexes along the way are kept as they are.
fn rebuild<F>(node: &PlistValue, rest: &[Segment], path: &PlistPath, edit: F) -> Result<PlistValue>
where
    F: FnOnce(&PlistValue) -> Result<PlistValue>,
{
    let Some((head, tail)) = rest.split_first() else {
        return edit(node);
    };
    let replaced = rebuild(child(node, head, path)?, tail, path, edit)?;
    match (node, head) {
        (PlistValue::Dictionary(dict), Segment::Key(key)) => {
            let mut dict = dict.clone();
            dict.insert(key.clone(), replaced);
            Ok(PlistValue::Dictionary(dict))
        }
        (PlistValue::Array(items), Segment::Index(index)) => {
            let mut items = items.clone();
            items[*index] = replaced;
            Ok(PlistValue::Array(items))
        }
        (node, segment) => Err(mismatch(node, segment, path)),
    }
}

fn check_collision(
    dict: &BTreeMap<String, PlistValue>,
    key: &str,
    policy: CollisionPolicy,
    path: &PlistPath,
) -> Result<()> {
    if !dict.contains_key(key) {
        return Ok(());
    }
    match policy {
        CollisionPolicy::Overwrite => {
            warn!("key `{key}` already exists at `{path}`, overwriting");
            Ok(())
        }
        CollisionPolicy::Reject => Err(EditError::KeyCollision {
            key: key.to_string(),
        }),
    }
}

/// Replaces the node at `path` with `new_value`, renaming it to `new_key` when its parent
/// is a dictionary. Array elements keep their index; `new_key` is ignored for them.
/// A rename onto an existing sibling key overwrites it with a warning.
pub fn replace(
    root: &PlistValue,
    path: &PlistPath,
    new_key: &str,
    new_value: PlistValue,
) -> Result<PlistValue> {
    replace_with(root, path, new_key, new_value, CollisionPolicy::Overwrite)
}

/// [`replace`] with an explicit policy for renames onto an existing key.
pub fn replace_with(
    root: &PlistValue,
    path: &PlistPath,
    new_key: &str,
    new_value: PlistValue,
    policy: CollisionPolicy,
) -> Result<PlistValue> {
    let Some((last, parents)) = path.segments().split_last() else {
        return Ok(new_value);
    };
    rebuild(root, parents, path, |parent| match (parent, last) {
        (PlistValue::Dictionary(dict), Segment::Key(key)) => {
            if !dict.contains_key(key) {
                return Err(EditError::invalid_path(path, format!("no key `{key}`")));
            }
            let mut dict = dict.clone();
            if new_key != key {
                check_collision(&dict, new_key, policy, path)?;
                dict.remove(key);
            }
            dict.insert(new_key.to_string(), new_value);
            Ok(PlistValue::Dictionary(dict))
        }
        (PlistValue::Array(items), Segment::Index(index)) => {
            if *index >= items.len() {
                return Err(EditError::invalid_path(
                    path,
                    format!("index {index} out of bounds for {} elements", items.len()),
                ));
            }
            let mut items = items.clone();
            items[*index] = new_value;
            Ok(PlistValue::Array(items))
        }
        (node, segment) => Err(mismatch(node, segment, path)),
    })
}

/// Adds `value` under the container at `parent`: as entry `key` of a dictionary, or at the
/// end of an array (where `key` is ignored).
pub fn insert(
    root: &PlistValue,
    parent: &PlistPath,
    key: &str,
    value: PlistValue,
    policy: CollisionPolicy,
) -> Result<PlistValue> {
    rebuild(root, parent.segments(), parent, |node| match node {
        PlistValue::Dictionary(dict) => {
            check_collision(dict, key, policy, &parent.child(key))?;
            let mut dict = dict.clone();
            dict.insert(key.to_string(), value);
            Ok(PlistValue::Dictionary(dict))
        }
        PlistValue::Array(items) => {
            let mut items = items.clone();
            items.push(value);
            Ok(PlistValue::Array(items))
        }
        leaf => Err(EditError::invalid_path(
            parent,
            format!("cannot add children to {}", leaf.plist_type()),
        )),
    })
}

/// Removes the node at `path`. Later array elements move up by one.
pub fn remove(root: &PlistValue, path: &PlistPath) -> Result<PlistValue> {
    let Some((last, parents)) = path.segments().split_last() else {
        return Err(EditError::invalid_path(path, "the root cannot be removed"));
    };
    rebuild(root, parents, path, |parent| {
        // validates the final segment against the parent
        child(parent, last, path)?;
        match (parent, last) {
            (PlistValue::Dictionary(dict), Segment::Key(key)) => {
                let mut dict = dict.clone();
                dict.remove(key);
                Ok(PlistValue::Dictionary(dict))
            }
            (PlistValue::Array(items), Segment::Index(index)) => {
                let mut items = items.clone();
                items.remove(*index);
                Ok(PlistValue::Array(items))
            }
            (node, segment) => Err(mismatch(node, segment, path)),
        }
    })
}

/// Lowercases `text` and strips its accents, so that "Café" and "cafe" compare equal.
fn fold(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Keeps the entries whose key contains `needle`, ignoring case and diacritics. `None` or
/// an empty needle keeps everything.
pub fn filter_keys(
    dict: &BTreeMap<String, PlistValue>,
    needle: Option<&str>,
) -> BTreeMap<String, PlistValue> {
    let needle = needle.map(fold).filter(|n| !n.is_empty());
    dict.iter()
        .filter(|(key, _)| match &needle {
            Some(n) => fold(key).contains(n.as_str()),
            None => true,
        })
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// The node at `path`, with a dictionary narrowed to the keys matching `needle`.
pub fn view(root: &PlistValue, path: &PlistPath, needle: Option<&str>) -> Result<PlistValue> {
    Ok(match resolve(root, path)? {
        PlistValue::Dictionary(dict) => PlistValue::Dictionary(filter_keys(dict, needle)),
        other => other.clone(),
    })
}
