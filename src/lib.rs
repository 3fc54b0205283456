// SPDX-License-Identifier: MIT

//! Library API for defaults-edit: browse and edit macOS preference domains as
//! property-list trees.
//!
//! - [`editor`] holds the pure tree operations: lookup, path-addressed replacement,
//!   insertion, removal and declared-type coercion.
//! - [`store`] reads and writes the top-level entries of a domain, either as a plist file
//!   or through the `defaults` tool.
//! - [`DomainSession`] ties the two together and persists each edit.

pub mod core;
pub mod editor;
pub mod prettifier;
pub mod recents;
pub mod session;
pub mod store;

#[cfg(feature = "cli")]
pub mod cli;

pub use crate::core::{
    convert::{data_to_hex, hex_to_data},
    error::{EditError, Result},
    types::{Domain, PlistType, PlistValue},
};
pub use editor::{
    CollisionPolicy, children,
    coerce::{coerce, parse_scalar},
    filter_keys, insert, is_expandable,
    item::PlistItem,
    path::{PlistPath, Segment},
    remove, replace, replace_with, resolve, view,
};
pub use recents::Recents;
pub use session::DomainSession;
pub use store::{Backend, PreferenceStore, StoreConfig};

#[cfg(feature = "cli")]
pub use cli::build_cli;
