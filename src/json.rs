//! JSON reading and writing.
//!
//! Output goes through `serde_json` with either the compact writer
//! (`indent == 0`) or a pretty printer at the configured width. Input is parsed
//! by a [`JsonBackend`]; the store uses [`BuiltinJson`] unless another backend
//! has been installed with [`Store::set_json_backend`] and reports itself
//! available.
//!
//! ```rust
//! use protogroup::{JsonOptions, Store};
//!
//! let mut store = Store::new();
//! store.from_json("app", r#"{"name": "App", "database": {"port": 3306}}"#).unwrap();
//! assert_eq!(store.get("app", "database,port").unwrap().as_deref(), Some("3306"));
//!
//! let json = store.to_json_with("app", &JsonOptions::new().with_indent(0)).unwrap();
//! assert_eq!(json, r#"{"database":{"port":"3306"},"name":"App"}"#);
//! ```

use crate::path;
use crate::store::{RecordId, Store};
use crate::{Error, FlatMap, JsonOptions, Result, Tree};
use serde::Serialize;
use tracing::{debug, warn};

/// A parser turning JSON text into flattened record data.
///
/// Implementations must produce the same key/value set as [`BuiltinJson`]:
/// paths joined with `delimiter`, strings verbatim, numbers as their JSON
/// text, booleans as `true`/`false`, `null` as the empty string and arrays as
/// their compact JSON text.
pub trait JsonBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the backend can be used right now. Unavailable backends are
    /// skipped in favour of the built-in parser.
    fn is_available(&self) -> bool {
        true
    }

    fn parse(&self, text: &str, delimiter: char) -> Result<FlatMap>;
}

/// The `serde_json` backed parser.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinJson;

impl JsonBackend for BuiltinJson {
    fn name(&self) -> &str {
        "builtin"
    }

    fn parse(&self, text: &str, delimiter: char) -> Result<FlatMap> {
        path::flatten(&parse_tree(text)?, delimiter)
    }
}

fn syntax_error(err: &serde_json::Error) -> Error {
    Error::syntax(err.line(), err.column(), &err.to_string())
}

/// Parses a JSON document whose root is an object.
///
/// # Errors
///
/// Returns a syntax error for invalid JSON and a malformed-input error for a
/// non-object root.
pub fn parse_tree(text: &str) -> Result<Tree> {
    let tree: Tree = serde_json::from_str(text).map_err(|e| syntax_error(&e))?;
    if !tree.is_branch() {
        return Err(Error::malformed("JSON document root must be an object"));
    }
    Ok(tree)
}

/// Renders a tree as JSON text.
///
/// # Examples
///
/// ```rust
/// use protogroup::json::to_json;
/// use protogroup::{tree, JsonOptions};
///
/// let t = tree!({ "b": "2", "a": { "c": "x y" } });
/// let text = to_json(&t, &JsonOptions::new()).unwrap();
/// assert_eq!(text, "{\n  \"a\": {\n    \"c\": \"x y\"\n  },\n  \"b\": \"2\"\n}");
/// ```
pub fn to_json(tree: &Tree, options: &JsonOptions) -> Result<String> {
    let sorted;
    let tree = if options.sort_keys {
        sorted = tree.sorted();
        &sorted
    } else {
        tree
    };

    if options.indent == 0 {
        return serde_json::to_string(tree).map_err(Error::custom);
    }

    let indent = vec![b' '; options.indent];
    let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent);
    let mut out = Vec::with_capacity(128);
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    tree.serialize(&mut serializer).map_err(Error::custom)?;
    String::from_utf8(out).map_err(Error::custom)
}

impl Store {
    /// Renders a record as JSON using the store's [`JsonOptions`].
    pub fn to_json(&self, name: &str) -> Result<String> {
        let options = self.options().json.clone();
        self.to_json_with(name, &options)
    }

    pub fn to_json_with(&self, name: &str, options: &JsonOptions) -> Result<String> {
        to_json(&self.tree(name)?, options)
    }

    /// Creates or replaces a record from JSON text.
    ///
    /// # Errors
    ///
    /// Fails on invalid JSON, a non-object root, or keys that cannot be
    /// flattened; the store is unchanged on failure.
    pub fn from_json(&mut self, name: &str, text: &str) -> Result<RecordId> {
        let delimiter = self.delimiter();
        let data = match self.json_backend() {
            Some(backend) if backend.is_available() => backend.parse(text, delimiter)?,
            Some(backend) => {
                warn!(backend = backend.name(), "JSON backend unavailable, using builtin parser");
                BuiltinJson.parse(text, delimiter)?
            }
            None => BuiltinJson.parse(text, delimiter)?,
        };
        let fields = data.len();
        let id = self.create_from_flat(name, data)?;
        debug!(record = name, fields, "loaded JSON");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{tree, ErrorKind};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_minified_and_insertion_order() {
        let t = tree!({ "z": "1", "a": "2" });
        let options = JsonOptions::new().with_indent(0).with_sort_keys(false);
        assert_eq!(to_json(&t, &options).unwrap(), r#"{"z":"1","a":"2"}"#);
    }

    #[test]
    fn test_escaping() {
        let t = tree!({ "q": "say \"hi\"\nnow" });
        let text = to_json(&t, &JsonOptions::new().with_indent(0)).unwrap();
        assert_eq!(text, r#"{"q":"say \"hi\"\nnow"}"#);
    }

    #[test]
    fn test_root_must_be_object() {
        assert_eq!(parse_tree("[1, 2]").unwrap_err().kind(), ErrorKind::MalformedInput);
        assert_eq!(parse_tree("\"x\"").unwrap_err().kind(), ErrorKind::MalformedInput);
        match parse_tree("{\n  \"a\": }").unwrap_err() {
            Error::Syntax { line, .. } => assert_eq!(line, 2),
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_from_json_stringifies() {
        let mut store = Store::new();
        store
            .from_json("r", r#"{"on": true, "off": null, "list": [1, 2], "pi": 3.5}"#)
            .unwrap();
        assert_eq!(store.get("r", "on").unwrap().as_deref(), Some("true"));
        assert_eq!(store.get("r", "off").unwrap().as_deref(), Some(""));
        assert_eq!(store.get("r", "list").unwrap().as_deref(), Some("[1,2]"));
        assert_eq!(store.get("r", "pi").unwrap().as_deref(), Some("3.5"));
    }

    #[test]
    fn test_delimiter_in_key_rejected() {
        let mut store = Store::new();
        let err = store.from_json("r", r#"{"a,b": "1"}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
        assert!(!store.exists("r"));
    }

    struct Counting {
        available: bool,
        calls: Arc<AtomicUsize>,
    }

    impl JsonBackend for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn parse(&self, text: &str, delimiter: char) -> Result<FlatMap> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            BuiltinJson.parse(text, delimiter)
        }
    }

    #[test]
    fn test_backend_substitution_and_fallback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut store = Store::new();

        store.set_json_backend(Box::new(Counting {
            available: true,
            calls: Arc::clone(&calls),
        }));
        store.from_json("a", r#"{"k": "v"}"#).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        store.set_json_backend(Box::new(Counting {
            available: false,
            calls: Arc::clone(&calls),
        }));
        store.from_json("b", r#"{"k": "v"}"#).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.data("a").unwrap(), store.data("b").unwrap());

        assert!(store.clear_json_backend().is_some());
    }
}
