//! YAML-like block parsing.
//!
//! Text is parsed by `serde_yaml` and then narrowed to what a record can hold:
//! nested mappings whose leaves are scalars.
//!
//! ## Scalars
//!
//! Plain scalars are resolved by type first and then stored as text, so a
//! value reads the same whether or not it was quoted as long as its canonical
//! form is unchanged:
//!
//! | YAML | Stored as |
//! |------|-----------|
//! | `App`, `"My App"`, `'it''s'` | `App`, `My App`, `it's` |
//! | `3306`, `-12` | `3306`, `-12` |
//! | `1.50`, `1e3` | `1.5`, `1000.0` |
//! | `true`, `False` | `true`, `false` |
//! | `~`, `null`, nothing | empty string |
//!
//! Quote a value to keep its exact spelling.
//!
//! ## Rejected input
//!
//! Sequences, tagged values, non-scalar keys, keys repeated in one mapping,
//! a root that is not a mapping and streams of several documents. Aliases are
//! expanded in place.
//!
//! ```rust
//! use protogroup::{from_yaml, Tree};
//!
//! let text = "name: App\ndatabase:\n  host: localhost\n  port: 3306 # default\n";
//! let tree = from_yaml(text).unwrap();
//! let db = tree.get("database").unwrap();
//! assert_eq!(db.get("port").and_then(Tree::as_str), Some("3306"));
//! ```

use crate::store::{RecordId, Store};
use crate::{path, Error, Result, Tree, TreeMap};
use serde_yaml::{Mapping, Value};
use tracing::debug;

/// Parses YAML-like text into a tree.
///
/// An empty document gives an empty tree.
///
/// # Errors
///
/// Returns a syntax error with line and column for text `serde_yaml` rejects,
/// and a malformed-input error for content outside the supported subset.
pub fn from_yaml(text: &str) -> Result<Tree> {
    if text.trim().is_empty() {
        return Ok(Tree::default());
    }
    let value: Value = serde_yaml::from_str(text).map_err(|e| syntax_error(&e))?;
    match value {
        Value::Null => Ok(Tree::default()),
        Value::Mapping(map) => branch(map, ""),
        other => Err(Error::malformed(format!(
            "YAML document root must be a mapping, found {}",
            describe(&other)
        ))),
    }
}

fn syntax_error(err: &serde_yaml::Error) -> Error {
    match err.location() {
        Some(at) => Error::syntax(at.line(), at.column(), &err.to_string()),
        None => Error::malformed(err),
    }
}

fn branch(map: Mapping, at: &str) -> Result<Tree> {
    let mut children = TreeMap::with_capacity(map.len());
    for (key, value) in map {
        let key = scalar_text(&key).ok_or_else(|| {
            Error::malformed(format!(
                "mapping key below '{}' is a {}",
                location(at),
                describe(&key)
            ))
        })?;
        if children.contains_key(&key) {
            return Err(Error::conflict(
                &key,
                &format!("appears twice in the mapping below '{}'", location(at)),
            ));
        }
        let child = node(value, &key)?;
        children.insert(key, child);
    }
    Ok(Tree::Branch(children))
}

fn node(value: Value, key: &str) -> Result<Tree> {
    match value {
        Value::Mapping(map) => branch(map, key),
        Value::Sequence(_) => Err(Error::malformed(format!(
            "'{}' holds a sequence; only mappings and scalars are supported",
            key
        ))),
        Value::Tagged(tagged) => Err(Error::malformed(format!(
            "'{}' carries the tag {}",
            key, tagged.tag
        ))),
        scalar => scalar_text(&scalar)
            .map(Tree::Scalar)
            .ok_or_else(|| Error::malformed(format!("'{}' is not a scalar", key))),
    }
}

/// Text of a resolved scalar. `None` for collections and tagged values.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => None,
    }
}

/// Whether `s` written as a plain scalar reads back as exactly `s`.
pub(crate) fn reads_back_plain(s: &str) -> bool {
    serde_yaml::from_str::<Value>(s)
        .ok()
        .as_ref()
        .and_then(scalar_text)
        .is_some_and(|text| text == s)
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

fn location(at: &str) -> &str {
    if at.is_empty() {
        "<root>"
    } else {
        at
    }
}

impl Store {
    /// Creates or replaces a record from YAML-like text.
    ///
    /// # Errors
    ///
    /// Fails on malformed text or keys that cannot be flattened; the store is
    /// unchanged on failure.
    pub fn from_yaml(&mut self, name: &str, text: &str) -> Result<RecordId> {
        let data = path::flatten(&from_yaml(text)?, self.delimiter())?;
        let fields = data.len();
        let id = self.create_from_flat(name, data)?;
        debug!(record = name, fields, "loaded YAML");
        Ok(id)
    }
}
