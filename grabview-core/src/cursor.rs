use std::fmt;

use crate::navigate::navigate;
use crate::step::Step;
use crate::value::Value;

/// A navigable view over nested data that never fails on a missing key.
///
/// An inline cursor narrows its own value with every step and keeps no
/// history. A copying cursor leaves itself untouched and hands out a new,
/// independent cursor per step, so one root can be branched several ways.
///
/// ```
/// use grabview_core::{Cursor, Value};
///
/// let mut data = Cursor::copying(Value::map([("a", Value::map([("b", 1)]))]));
/// assert_eq!(data.get("a").get("b").value(), &Value::Int(1));
/// assert_eq!(data.scan("a.x.y").value(), &Value::Absent);
/// ```
#[derive(Clone)]
pub struct Cursor {
    data: Value,
    inline: bool,
}

impl Cursor {
    /// An inline cursor.
    pub fn new(data: Value) -> Self {
        Cursor { data, inline: true }
    }

    /// A copying cursor.
    pub fn copying(data: Value) -> Self {
        Cursor {
            data,
            inline: false,
        }
    }

    pub fn is_inline(&self) -> bool {
        self.inline
    }

    pub fn value(&self) -> &Value {
        &self.data
    }

    pub fn into_value(self) -> Value {
        self.data
    }

    /// Applies one step.
    ///
    /// Inline cursors narrow themselves and return a cursor over the same
    /// narrowed value; copying cursors return a fresh copying cursor.
    pub fn get(&mut self, step: impl Into<Step>) -> Cursor {
        let next = navigate(&self.data, &step.into());
        if self.inline {
            self.data = next.clone();
            Cursor::new(next)
        } else {
            Cursor::copying(next)
        }
    }

    /// Applies every segment of a dotted path. Numeric segments are indices.
    pub fn scan(&mut self, path: &str) -> Cursor {
        let mut current = self.data.clone();
        for step in Step::parse_path(path) {
            if current.is_absent() {
                break;
            }
            current = navigate(&current, &step);
        }
        if self.inline {
            self.data = current.clone();
            Cursor::new(current)
        } else {
            Cursor::copying(current)
        }
    }
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.data, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn data() -> Value {
        Value::map([
            ("a", Value::map([("b", 1)])),
            (
                "b",
                Value::seq([
                    Value::map([("c", "c")]),
                    Value::from("d"),
                    Value::from(4),
                    Value::seq([Value::from("e"), Value::from(5)]),
                ]),
            ),
            ("c", Value::seq([Value::from("d"), Value::from(6)])),
            ("d", Value::set(["e", "f", "g", "h"])),
            ("e", Value::Null),
        ])
    }

    #[test]
    fn values() {
        let mut root = Cursor::copying(data());
        assert_eq!(root.get("a").value(), &Value::map([("b", 1)]));
        assert_eq!(root.get("b").get(0).value(), &Value::map([("c", "c")]));
        assert_eq!(root.get("b").get(100).value(), &Value::Absent);
        assert_eq!(root.get("e").value(), &Value::Null);
        assert_eq!(root.get("not_existing_key").value(), &Value::Absent);
        assert_eq!(root.get("not_existing_key").get(1000).value(), &Value::Absent);
        assert_eq!(root.get(1000).value(), &Value::Absent);
    }

    #[test]
    fn scan_paths() {
        let mut root = Cursor::copying(data());
        assert_eq!(root.scan("a").value(), &Value::map([("b", 1)]));
        assert_eq!(root.scan("b.0").value(), &Value::map([("c", "c")]));
        assert_eq!(root.scan("b.3.1").value(), &Value::Int(5));
        assert_eq!(root.scan("b.100").value(), &Value::Absent);
        assert_eq!(root.scan("not_existing_key").value(), &Value::Absent);
        assert_eq!(root.scan("a.b.c.d.e.f.-1000").value(), &Value::Absent);
        assert_eq!(root.scan("d.g").value(), &Value::from("g"));
    }

    #[test]
    fn pattern_step() {
        let mut root = Cursor::copying(data());
        let found = root.get(Regex::new("^(a|b|e|f)$").unwrap());
        assert_eq!(found.value().as_items().map(<[Value]>::len), Some(3));
    }

    #[test]
    fn inline_cursor_narrows_in_place() {
        let mut cursor = Cursor::new(data());
        cursor.get("b");
        cursor.get(3);
        assert_eq!(cursor.value(), &Value::seq([Value::from("e"), Value::from(5)]));
        cursor.get("missing");
        assert_eq!(cursor.value(), &Value::Absent);
    }

    #[test]
    fn copying_cursor_branches_independently() {
        let mut root = Cursor::copying(data());
        let left = root.get("a");
        let right = root.get("c");
        assert_eq!(left.value(), &Value::map([("b", 1)]));
        assert_eq!(right.value().as_items().map(<[Value]>::len), Some(2));
        assert_eq!(root.value(), &data());
    }
}
