// SPDX-License-Identifier: MIT

use std::fmt::Write;

use crate::{
    core::{convert::data_to_hex, types::PlistValue},
    editor::{self, path::Segment},
};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Prettify a `PlistValue` in Apple-style format (for CLI).
pub fn apple_style_string(val: &PlistValue, indent: usize) -> String {
    let ind = |n| "    ".repeat(n);
    match val {
        PlistValue::Dictionary(dict) => {
            let mut out = String::new();
            out.push_str("{\n");
            for (k, v) in dict {
                out.push_str(&format!(
                    "{}{} = {}",
                    ind(indent + 1),
                    quote_key(k),
                    apple_style_string(v, indent + 1)
                ));
                out.push(';');
                out.push('\n');
            }
            out.push_str(&format!("{}}}", ind(indent)));
            out
        }
        PlistValue::Array(arr) => {
            let mut out = String::new();
            out.push_str("(\n");
            let mut iter = arr.iter().peekable();
            while let Some(v) = iter.next() {
                out.push_str(&ind(indent + 1));
                out.push_str(&apple_style_string(v, indent + 1));
                if iter.peek().is_some() {
                    out.push(',');
                }
                out.push('\n');
            }
            out.push_str(&format!("{})", ind(indent)));
            out
        }
        PlistValue::String(s) => quote_string(s),
        PlistValue::Integer(i) => i.to_string(),
        PlistValue::Real(f) => f.to_string(),
        PlistValue::Boolean(b) => {
            if *b {
                "1".to_string()
            } else {
                "0".to_string()
            }
        }
        PlistValue::Data(data) => format!(
            "{{length = {}, bytes = 0x{}}}",
            data.len(),
            data_to_hex(data)
        ),
        PlistValue::Date(dt) => format!("\"{}\"", dt.format(DATE_FORMAT)),
    }
}

/// The one-line summary shown next to a node in an outline.
pub fn display_value(val: &PlistValue) -> String {
    match val {
        PlistValue::Array(items) => format!("[{} elements]", items.len()),
        PlistValue::Dictionary(dict) => format!("[{} key-value pairs]", dict.len()),
        PlistValue::Boolean(true) => "True".to_string(),
        PlistValue::Boolean(false) => "False".to_string(),
        PlistValue::Data(data) => data_to_hex(data),
        PlistValue::Date(dt) => dt.format(DATE_FORMAT).to_string(),
        PlistValue::String(s) => s.clone(),
        PlistValue::Integer(i) => i.to_string(),
        PlistValue::Real(f) => f.to_string(),
    }
}

/// Renders the tree below `root` as an indented outline of `key  type  value` rows.
pub fn render_outline(root: &PlistValue) -> String {
    let mut out = String::new();
    outline_rows(root, 0, &mut out);
    out
}

fn outline_rows(node: &PlistValue, depth: usize, out: &mut String) {
    for (segment, child) in editor::children(node) {
        let label = match &segment {
            Segment::Key(key) => key.clone(),
            Segment::Index(index) => format!("Item {index}"),
        };
        // writing to a String cannot fail
        let _ = writeln!(
            out,
            "{}{label}  {}  {}",
            "  ".repeat(depth),
            child.plist_type(),
            display_value(child)
        );
        outline_rows(child, depth + 1, out);
    }
}

/// Quotes a key for Apple-style output.
fn quote_key(key: &str) -> String {
    if !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        key.to_string()
    } else {
        format!("\"{}\"", escape(key))
    }
}

/// Quotes a string for Apple-style output.
fn quote_string(s: &str) -> String {
    if !s.is_empty()
        && s.chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        s.to_string()
    } else {
        format!("\"{}\"", escape(s))
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::collections::BTreeMap;

    use chrono::{TimeZone, Utc};

    use super::*;

    fn sample() -> PlistValue {
        PlistValue::Dictionary(BTreeMap::from([
            ("autohide".to_string(), PlistValue::Boolean(true)),
            (
                "persistent apps".to_string(),
                PlistValue::Array(vec![
                    PlistValue::String("Safari".into()),
                    PlistValue::String("Mail app".into()),
                ]),
            ),
            ("tilesize".to_string(), PlistValue::Integer(48)),
        ]))
    }

    #[test]
    fn apple_style_matches_defaults_read() {
        let expected = "{\n    autohide = 1;\n    \"persistent apps\" = (\n        Safari,\n        \"Mail app\"\n    );\n    tilesize = 48;\n}";
        assert_eq!(apple_style_string(&sample(), 0), expected);
    }

    #[test]
    fn apple_style_scalars() {
        assert_eq!(
            apple_style_string(&PlistValue::Data(vec![0xde, 0xad]), 0),
            "{length = 2, bytes = 0xdead}"
        );
        let date = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(
            apple_style_string(&PlistValue::Date(date), 0),
            "\"2024-03-01 12:30:00 +0000\""
        );
        assert_eq!(apple_style_string(&PlistValue::String(String::new()), 0), "\"\"");
    }

    #[test]
    fn display_values_summarize_containers() {
        assert_eq!(display_value(&sample()), "[3 key-value pairs]");
        assert_eq!(
            display_value(&PlistValue::Array(vec![PlistValue::Integer(1)])),
            "[1 elements]"
        );
        assert_eq!(display_value(&PlistValue::Boolean(false)), "False");
        assert_eq!(display_value(&PlistValue::Data(vec![0x0a, 0xff])), "0aff");
        assert_eq!(display_value(&PlistValue::Real(1.5)), "1.5");
    }

    #[test]
    fn outline_indents_children() {
        let outline = render_outline(&sample());
        let lines: Vec<&str> = outline.lines().collect();
        assert_eq!(
            lines,
            vec![
                "autohide  boolean  True",
                "persistent apps  array  [2 elements]",
                "  Item 0  string  Safari",
                "  Item 1  string  Mail app",
                "tilesize  integer  48",
            ]
        );
    }
}
