// SPDX-License-Identifier: MIT

//! This module defines the types for representing preference domains and property-list values.
//!
//! Editing in [`crate::editor`] works on [`PlistValue`] trees; stores in [`crate::store`]
//! exchange top-level entries of a [`Domain`].

use std::{collections::BTreeMap, path::PathBuf, str::FromStr};

use chrono::{DateTime, Utc};

use crate::core::error::{EditError, Result};

/// Preferences domain (user, global or a plist file).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Domain {
    /// A user domain, e.g., "com.apple.finder"
    User(String),
    /// The global preferences domain / NSGlobalDomain (".GlobalPreferences")
    Global,
    /// A direct path to a plist file
    Path(PathBuf),
}

impl Domain {
    /// Interprets a domain argument the way `defaults` does.
    pub fn parse(name: &str) -> Self {
        match name {
            "-g" | "NSGlobalDomain" | ".GlobalPreferences" => Domain::Global,
            other if other.contains('/') || other.ends_with(".plist") => {
                Domain::Path(PathBuf::from(other))
            }
            other => Domain::User(other.to_string()),
        }
    }

    /// Returns the preference file backing this domain.
    pub fn plist_path(&self) -> Result<PathBuf> {
        let prefs = || {
            dirs::home_dir()
                .map(|home| home.join("Library").join("Preferences"))
                .ok_or(EditError::HomeDirUnavailable)
        };
        match self {
            Domain::Global => Ok(prefs()?.join(".GlobalPreferences.plist")),
            Domain::User(name) => Ok(prefs()?.join(format!("{name}.plist"))),
            Domain::Path(path) => Ok(path.clone()),
        }
    }

    /// Returns the name the `defaults` tool accepts for this domain.
    pub fn defaults_arg(&self) -> String {
        match self {
            Domain::Global => String::from("NSGlobalDomain"),
            Domain::User(name) => name.clone(),
            Domain::Path(path) => path.display().to_string(),
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Domain::User(s) => write!(f, "{s}"),
            Domain::Global => write!(f, "NSGlobalDomain"),
            Domain::Path(p) => write!(f, "{}", p.display()),
        }
    }
}

/// A node of a property list.
#[derive(Debug, Clone, PartialEq)]
pub enum PlistValue {
    String(String),
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Date(DateTime<Utc>),
    Data(Vec<u8>),
    /// Iterates in ascending ordinal key order.
    Dictionary(BTreeMap<String, PlistValue>),
    Array(Vec<PlistValue>),
}

impl Default for PlistValue {
    fn default() -> Self {
        PlistValue::String(String::default())
    }
}

impl PlistValue {
    /// Returns the kind of this value.
    pub fn plist_type(&self) -> PlistType {
        match self {
            PlistValue::String(_) => PlistType::String,
            PlistValue::Boolean(_) => PlistType::Boolean,
            PlistValue::Integer(_) => PlistType::Integer,
            PlistValue::Real(_) => PlistType::Real,
            PlistValue::Date(_) => PlistType::Date,
            PlistValue::Data(_) => PlistType::Data,
            PlistValue::Dictionary(_) => PlistType::Dictionary,
            PlistValue::Array(_) => PlistType::Array,
        }
    }

    pub fn as_dictionary(&self) -> Option<&BTreeMap<String, PlistValue>> {
        match self {
            PlistValue::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    pub fn into_dictionary(self) -> Option<BTreeMap<String, PlistValue>> {
        match self {
            PlistValue::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }
}

/// The eight property-list kinds, in the order the value editor presents them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PlistType {
    String,
    Boolean,
    Integer,
    Real,
    Date,
    Data,
    Dictionary,
    Array,
}

impl PlistType {
    pub const ALL: [PlistType; 8] = [
        PlistType::String,
        PlistType::Boolean,
        PlistType::Integer,
        PlistType::Real,
        PlistType::Date,
        PlistType::Data,
        PlistType::Dictionary,
        PlistType::Array,
    ];

    /// Returns the name `defaults read-type` uses for this kind.
    pub fn name(self) -> &'static str {
        match self {
            PlistType::String => "string",
            PlistType::Boolean => "boolean",
            PlistType::Integer => "integer",
            PlistType::Real => "float",
            PlistType::Date => "date",
            PlistType::Data => "data",
            PlistType::Dictionary => "dictionary",
            PlistType::Array => "array",
        }
    }

    /// A fresh value of this kind. Dates default to the current time.
    pub fn default_value(self) -> PlistValue {
        match self {
            PlistType::String => PlistValue::String(String::new()),
            PlistType::Boolean => PlistValue::Boolean(false),
            PlistType::Integer => PlistValue::Integer(0),
            PlistType::Real => PlistValue::Real(0.0),
            PlistType::Date => PlistValue::Date(Utc::now()),
            PlistType::Data => PlistValue::Data(Vec::new()),
            PlistType::Dictionary => PlistValue::Dictionary(BTreeMap::new()),
            PlistType::Array => PlistValue::Array(Vec::new()),
        }
    }

    pub fn is_container(self) -> bool {
        matches!(self, PlistType::Dictionary | PlistType::Array)
    }

    /// Reads the output of `defaults read-type`, e.g. "Type is float".
    pub fn from_read_type_output(output: &str) -> Option<Self> {
        let output = output.trim();
        let word = output.strip_prefix("Type is ").unwrap_or(output);
        word.parse()
            .ok()
            .or_else(|| Self::ALL.into_iter().find(|t| output.contains(t.name())))
    }
}

impl FromStr for PlistType {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" => Ok(PlistType::String),
            "bool" | "boolean" => Ok(PlistType::Boolean),
            "int" | "integer" => Ok(PlistType::Integer),
            "float" | "real" => Ok(PlistType::Real),
            "date" => Ok(PlistType::Date),
            "data" => Ok(PlistType::Data),
            "dict" | "dictionary" => Ok(PlistType::Dictionary),
            "array" => Ok(PlistType::Array),
            _ => Err(EditError::UnknownType(s.to_string())),
        }
    }
}

impl std::fmt::Display for PlistType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_domain_arguments() {
        assert_eq!(Domain::parse("-g"), Domain::Global);
        assert_eq!(Domain::parse("NSGlobalDomain"), Domain::Global);
        assert_eq!(
            Domain::parse("com.apple.dock"),
            Domain::User("com.apple.dock".into())
        );
        assert_eq!(
            Domain::parse("/tmp/prefs.plist"),
            Domain::Path(PathBuf::from("/tmp/prefs.plist"))
        );
        assert_eq!(
            Domain::parse("local.plist"),
            Domain::Path(PathBuf::from("local.plist"))
        );
    }

    #[test]
    fn type_names_accept_aliases() {
        assert_eq!("bool".parse::<PlistType>().ok(), Some(PlistType::Boolean));
        assert_eq!("float".parse::<PlistType>().ok(), Some(PlistType::Real));
        assert_eq!("dict".parse::<PlistType>().ok(), Some(PlistType::Dictionary));
        assert!(matches!(
            "number".parse::<PlistType>(),
            Err(EditError::UnknownType(_))
        ));
    }

    #[test]
    fn read_type_output_maps_to_kind() {
        assert_eq!(
            PlistType::from_read_type_output("Type is float\n"),
            Some(PlistType::Real)
        );
        assert_eq!(
            PlistType::from_read_type_output("Type is boolean"),
            Some(PlistType::Boolean)
        );
        assert_eq!(
            PlistType::from_read_type_output("Type is dictionary"),
            Some(PlistType::Dictionary)
        );
        assert_eq!(PlistType::from_read_type_output("garbage"), None);
    }
}
