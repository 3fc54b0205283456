// SPDX-License-Identifier: MIT

use std::{collections::BTreeMap, io::Cursor, time::SystemTime};

use chrono::{DateTime, Utc};
use plist::Value;

use crate::core::{
    error::{EditError, Result},
    types::PlistValue,
};

pub(crate) fn plist_to_value(val: &Value) -> Result<PlistValue> {
    let val = match val {
        Value::String(s) => PlistValue::String(s.clone()),
        Value::Integer(i) => PlistValue::Integer(
            i.as_signed()
                .or_else(|| i.as_unsigned().map(|u| i64::try_from(u).unwrap_or(i64::MAX)))
                .unwrap_or(0),
        ),
        Value::Real(f) => PlistValue::Real(*f),
        Value::Boolean(b) => PlistValue::Boolean(*b),
        Value::Array(arr) => PlistValue::Array(
            arr.iter()
                .map(plist_to_value)
                .collect::<Result<Vec<_>>>()?,
        ),
        Value::Dictionary(dict) => {
            let mut result = BTreeMap::new();
            for (k, v) in dict.iter() {
                result.insert(k.clone(), plist_to_value(v)?);
            }
            PlistValue::Dictionary(result)
        }
        Value::Data(data) => PlistValue::Data(data.clone()),
        Value::Date(date) => {
            let system_time: SystemTime = date.clone().into();
            PlistValue::Date(DateTime::<Utc>::from(system_time))
        }
        // keyed archives store object references as UIDs
        Value::Uid(uid) => PlistValue::Integer(i64::try_from(uid.get()).unwrap_or(i64::MAX)),
        other => return Err(EditError::UnsupportedValue(format!("{other:?}"))),
    };

    Ok(val)
}

pub(crate) fn value_to_plist(val: &PlistValue) -> Value {
    match val {
        PlistValue::String(s) => Value::String(s.clone()),
        PlistValue::Boolean(b) => Value::Boolean(*b),
        PlistValue::Integer(i) => Value::Integer((*i).into()),
        PlistValue::Real(f) => Value::Real(*f),
        PlistValue::Date(dt) => Value::Date(plist::Date::from(SystemTime::from(*dt))),
        PlistValue::Data(data) => Value::Data(data.clone()),
        PlistValue::Dictionary(dict) => Value::Dictionary(
            dict.iter()
                .map(|(k, v)| (k.clone(), value_to_plist(v)))
                .collect(),
        ),
        PlistValue::Array(arr) => Value::Array(arr.iter().map(value_to_plist).collect()),
    }
}

/// Parses a plist document, trying XML first. Returns the value and whether it was not XML.
pub(crate) fn read_document(buf: &[u8]) -> Result<(PlistValue, bool)> {
    let (plist, is_binary) = match Value::from_reader_xml(Cursor::new(buf)) {
        Ok(plist) => (plist, false),
        Err(_) => (Value::from_reader(Cursor::new(buf))?, true),
    };
    Ok((plist_to_value(&plist)?, is_binary))
}

/// Serializes a value as an XML or binary plist document.
pub(crate) fn write_document(value: &PlistValue, binary: bool) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let plist = value_to_plist(value);
    if binary {
        plist.to_writer_binary(&mut buf)?;
    } else {
        plist.to_writer_xml(&mut buf)?;
    }
    Ok(buf)
}

/// Lowercase hex text for a data value.
pub fn data_to_hex(data: &[u8]) -> String {
    hex::encode(data)
}

/// Reads hex text back into bytes. Whitespace, a `0x` prefix and `<...>` brackets are ignored.
pub fn hex_to_data(text: &str) -> Option<Vec<u8>> {
    let trimmed = text.trim();
    let trimmed = trimmed
        .strip_prefix('<')
        .and_then(|t| t.strip_suffix('>'))
        .unwrap_or(trimmed);
    let trimmed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(digits).ok()
}
