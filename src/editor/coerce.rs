// SPDX-License-Identifier: MIT

//! Best-effort conversion of a staged value when its declared type changes, and parsing of
//! typed values from text.

use std::{collections::BTreeMap, io::Cursor};

use chrono::{DateTime, Utc};
use log::debug;

use crate::core::{
    convert::{hex_to_data, plist_to_value},
    error::{EditError, Result},
    types::{PlistType, PlistValue},
};

/// Derives a value of `new_type` from the previously staged value. Never fails.
///
/// Integers and reals convert into each other by promotion or truncation, numbers become
/// their decimal text and numeric text is parsed back. Everything else starts over from the
/// type's default (booleans always reset to `false`, dates to the current time).
pub fn coerce(old: Option<&PlistValue>, old_type: PlistType, new_type: PlistType) -> PlistValue {
    if old_type == new_type {
        if let Some(old) = old.filter(|v| v.plist_type() == new_type) {
            return old.clone();
        }
    }

    match (new_type, old) {
        (PlistType::String, Some(PlistValue::Integer(i))) => PlistValue::String(i.to_string()),
        (PlistType::String, Some(PlistValue::Real(r))) => PlistValue::String(r.to_string()),
        (PlistType::String, Some(PlistValue::String(s))) => PlistValue::String(s.clone()),
        (PlistType::Real, Some(PlistValue::Integer(i))) => PlistValue::Real(*i as f64),
        (PlistType::Real, Some(PlistValue::Real(r))) => PlistValue::Real(*r),
        (PlistType::Real, Some(PlistValue::String(s))) => {
            PlistValue::Real(parse_real(s).unwrap_or_else(|| unparsable(s, PlistType::Real, 0.0)))
        }
        (PlistType::Integer, Some(PlistValue::Integer(i))) => PlistValue::Integer(*i),
        (PlistType::Integer, Some(PlistValue::Real(r))) => PlistValue::Integer(*r as i64),
        (PlistType::Integer, Some(PlistValue::String(s))) => PlistValue::Integer(
            parse_integer(s).unwrap_or_else(|| unparsable(s, PlistType::Integer, 0)),
        ),
        (new_type, _) => new_type.default_value(),
    }
}

fn unparsable<T>(text: &str, kind: PlistType, fallback: T) -> T {
    debug!(
        "{}, using zero",
        EditError::UnparsableScalar {
            text: text.to_string(),
            kind,
        }
    );
    fallback
}

fn parse_real(text: &str) -> Option<f64> {
    text.trim().parse().ok()
}

/// Whole numbers parse directly; decimal text is truncated toward zero.
fn parse_integer(text: &str) -> Option<i64> {
    let text = text.trim();
    text.parse().ok().or_else(|| {
        text.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f as i64)
    })
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("now") {
        return Some(Utc::now());
    }
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_container(text: &str, kind: PlistType) -> Option<PlistValue> {
    match (kind, text.trim()) {
        (PlistType::Dictionary, "" | "{}") => return Some(PlistValue::Dictionary(BTreeMap::new())),
        (PlistType::Array, "" | "[]" | "()") => return Some(PlistValue::Array(Vec::new())),
        _ => {}
    }
    plist::Value::from_reader_xml(Cursor::new(text.as_bytes()))
        .ok()
        .and_then(|v| plist_to_value(&v).ok())
        .filter(|v| v.plist_type() == kind)
}

/// Parses user-typed text as a value of `kind`.
///
/// Booleans accept true/false/yes/no/1/0, dates RFC 3339 or `now`, data hex digits, and
/// containers `{}`/`[]` or a whole XML plist document of the same kind.
pub fn parse_scalar(kind: PlistType, text: &str) -> Result<PlistValue> {
    let parsed = match kind {
        PlistType::String => Some(PlistValue::String(text.to_string())),
        PlistType::Boolean => parse_bool(text).map(PlistValue::Boolean),
        PlistType::Integer => text.trim().parse().ok().map(PlistValue::Integer),
        PlistType::Real => parse_real(text).map(PlistValue::Real),
        PlistType::Date => parse_date(text).map(PlistValue::Date),
        PlistType::Data => hex_to_data(text).map(PlistValue::Data),
        PlistType::Dictionary | PlistType::Array => parse_container(text, kind),
    };
    parsed.ok_or_else(|| EditError::UnparsableScalar {
        text: text.to_string(),
        kind,
    })
}
