// SPDX-License-Identifier: MIT

use crate::{
    core::{
        error::{EditError, Result},
        types::{PlistType, PlistValue},
    },
    editor::coerce::coerce,
};

/// An entry being added or edited, before it is merged into a tree or written to a store.
#[derive(Debug, Clone, PartialEq)]
pub struct PlistItem {
    key: String,
    declared_type: PlistType,
    value: Option<PlistValue>,
}

impl Default for PlistItem {
    fn default() -> Self {
        Self {
            key: String::from("Key"),
            declared_type: PlistType::String,
            value: Some(PlistValue::String(String::new())),
        }
    }
}

impl PlistItem {
    /// Stages an existing entry for editing.
    pub fn from_entry(key: impl Into<String>, value: PlistValue) -> Self {
        Self {
            key: key.into(),
            declared_type: value.plist_type(),
            value: Some(value),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn set_key(&mut self, key: impl Into<String>) {
        self.key = key.into();
    }

    pub fn declared_type(&self) -> PlistType {
        self.declared_type
    }

    pub fn value(&self) -> Option<&PlistValue> {
        self.value.as_ref()
    }

    pub fn set_value(&mut self, value: Option<PlistValue>) {
        self.value = value;
    }

    /// Switches the declared type, converting the staged value to match.
    pub fn set_type(&mut self, new_type: PlistType) {
        self.value = Some(coerce(self.value.as_ref(), self.declared_type, new_type));
        self.declared_type = new_type;
    }

    pub fn validate(&self) -> Result<()> {
        if self.key.is_empty() {
            return Err(EditError::EmptyKey);
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Consumes the item into the `(key, value)` pair to commit. A missing value becomes the
    /// declared type's default; a value of another kind is coerced to the declared type.
    pub fn into_entry(self) -> Result<(String, PlistValue)> {
        self.validate()?;
        let value = match self.value {
            Some(value) if value.plist_type() == self.declared_type => value,
            Some(value) => coerce(Some(&value), value.plist_type(), self.declared_type),
            None => self.declared_type.default_value(),
        };
        Ok((self.key, value))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn default_item_is_an_empty_string_entry() {
        let item = PlistItem::default();
        assert_eq!(item.key(), "Key");
        assert_eq!(item.declared_type(), PlistType::String);
        assert_eq!(item.value(), Some(&PlistValue::String(String::new())));
        assert!(item.is_valid());
    }

    #[test]
    fn empty_key_fails_validation() {
        let mut item = PlistItem::from_entry("tilesize", PlistValue::Integer(48));
        item.set_key("");
        assert!(!item.is_valid());
        assert!(matches!(item.into_entry(), Err(EditError::EmptyKey)));
    }

    #[test]
    fn type_switches_carry_numbers_across() {
        let mut item = PlistItem::from_entry("tilesize", PlistValue::Integer(48));
        item.set_type(PlistType::Real);
        assert_eq!(item.value(), Some(&PlistValue::Real(48.0)));
        item.set_type(PlistType::String);
        assert_eq!(item.value(), Some(&PlistValue::String("48".into())));
        item.set_type(PlistType::Integer);
        assert_eq!(item.value(), Some(&PlistValue::Integer(48)));
        item.set_type(PlistType::Boolean);
        assert_eq!(item.value(), Some(&PlistValue::Boolean(false)));
    }

    #[test]
    fn into_entry_fills_in_or_converts_the_value() {
        let mut item = PlistItem::default();
        item.set_key("count");
        item.set_type(PlistType::Integer);
        item.set_value(None);
        assert_eq!(
            item.clone().into_entry().unwrap(),
            ("count".to_string(), PlistValue::Integer(0))
        );

        item.set_value(Some(PlistValue::String("12".into())));
        assert_eq!(
            item.into_entry().unwrap(),
            ("count".to_string(), PlistValue::Integer(12))
        );
    }
}
