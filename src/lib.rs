//! # protogroup
//!
//! Hierarchical records built from reusable pieces, with prototype-style
//! inheritance of operations and lossless conversion to nested text formats.
//!
//! ## What is a group?
//!
//! A group is a named record of flattened keys (`database,host`) mapping to
//! string values. Groups are composed from other groups, cloned into linked
//! descendants that inherit their operations, and written to or read from
//! JSON, a YAML-like block format and a line-oriented legacy format.
//!
//! ## Key Features
//!
//! - **Composition**: `%name` values flatten another record in under a key,
//!   `$name` values substitute a variable
//! - **Prototype dispatch**: operations resolve along the clone chain at call
//!   time and always act on the record they were called on
//! - **Lossless round trips**: nested text formats map to flat records and back
//!   without loss for any mapping of strings
//! - **No partial success**: a failed construction or load leaves the store
//!   unchanged
//!
//! ## Quick Start
//!
//! ```rust
//! use protogroup::{Operation, Store};
//!
//! let mut store = Store::new();
//! store.create("db", &["host", "localhost", "port", "3306"]).unwrap();
//! store.create_from_lists("app", &["name", "database"], &["App", "%db"]).unwrap();
//!
//! store
//!     .define_operation("app", "describe", Operation::new(|store, this, _| {
//!         let name = store.get_by_id(this, "name").unwrap_or_default();
//!         let host = store.get_by_id(this, "database,host").unwrap_or_default();
//!         Ok(format!("{name} on {host}"))
//!     }))
//!     .unwrap();
//!
//! store.clone_record("staging", "app").unwrap();
//! store.set("staging", "database,host", "staging.internal").unwrap();
//!
//! let args: [&str; 0] = [];
//! assert_eq!(store.dispatch("staging", "describe", &args).unwrap(), "App on staging.internal");
//! assert_eq!(store.dispatch("app", "describe", &args).unwrap(), "App on localhost");
//! ```
//!
//! ### Text Formats
//!
//! ```rust
//! use protogroup::Store;
//!
//! let mut store = Store::new();
//! store.from_json("app", r#"{"name": "App", "database": {"port": 3306}}"#).unwrap();
//!
//! assert_eq!(store.to_yaml("app").unwrap(), "database:\n  port: 3306\nname: App\n");
//! assert_eq!(store.to_legacy("app").unwrap(), "database,port > 3306\n\nname          > App\n");
//! ```
//!
//! ### Trees Without a Store
//!
//! ```rust
//! use protogroup::{from_yaml, to_json, tree};
//!
//! let t = tree!({ "name": "App" });
//! assert_eq!(to_json(&t).unwrap(), "{\n  \"name\": \"App\"\n}");
//! assert_eq!(from_yaml("name: App\n").unwrap(), t);
//! ```
//!
//! ## Logging
//!
//! The crate emits `tracing` events (`debug` for record lifecycle and I/O,
//! `trace` for sigil resolution and dispatch hops, `warn` for dangling links
//! and backend fallback). It never installs a subscriber.
//!
//! ## Concurrency
//!
//! A [`Store`] is plain owned state with no interior locking. Share it across
//! threads behind a `Mutex` or `RwLock`.
//!
//! ## Format Reference
//!
//! See the [`formats`] module for the exact text layouts.

pub mod compose;
pub mod de;
pub mod dispatch;
pub mod error;
pub mod formats;
pub mod io;
pub mod json;
pub mod legacy;
pub mod macros;
pub mod map;
pub mod options;
pub mod path;
pub mod query;
pub mod ser;
pub mod sigil;
pub mod store;
pub mod tree;

pub use dispatch::Operation;
pub use error::{Error, ErrorKind, Result};
pub use io::{Format, Sink, Source};
pub use json::{BuiltinJson, JsonBackend};
pub use map::FlatMap;
pub use options::{
    GroupOptions, JsonOptions, LegacyOptions, MissingSuffix, OrderOptions, Sigils, SuffixMatch,
    YamlOptions,
};
pub use path::{flatten, unflatten};
pub use ser::YamlWriter;
pub use sigil::{Resolved, SigilResolver, Token};
pub use store::{Field, Record, RecordId, Store, Variable};
pub use tree::{Tree, TreeMap};

use std::io as stdio;

/// Renders a tree as pretty-printed JSON with sorted keys.
///
/// # Errors
///
/// Returns an error if the tree cannot be serialized.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_json(tree: &Tree) -> Result<String> {
    json::to_json(tree, &JsonOptions::default())
}

/// Renders a tree as JSON with custom options.
///
/// # Examples
///
/// ```rust
/// use protogroup::{to_json_with_options, tree, JsonOptions};
///
/// let t = tree!({ "b": "1", "a": "2" });
/// let options = JsonOptions::new().with_indent(0).with_sort_keys(false);
/// assert_eq!(to_json_with_options(&t, &options).unwrap(), r#"{"b":"1","a":"2"}"#);
/// ```
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_json_with_options(tree: &Tree, options: &JsonOptions) -> Result<String> {
    json::to_json(tree, options)
}

/// Renders a tree in the YAML-like block format with sorted keys.
///
/// # Errors
///
/// Returns an error if the root is not a branch.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_yaml(tree: &Tree) -> Result<String> {
    ser::to_yaml(tree, &YamlOptions::default())
}

/// Renders a tree in the YAML-like block format with custom options.
///
/// # Examples
///
/// ```rust
/// use protogroup::{to_yaml_with_options, tree, YamlOptions};
///
/// let t = tree!({ "db": { "port": "1", "host": "h" } });
/// let options = YamlOptions::new().with_indent(4).with_sort_keys(false);
/// assert_eq!(to_yaml_with_options(&t, &options).unwrap(), "db:\n    port: 1\n    host: h\n");
/// ```
///
/// # Errors
///
/// Returns an error if the root is not a branch.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_yaml_with_options(tree: &Tree, options: &YamlOptions) -> Result<String> {
    ser::to_yaml(tree, options)
}

/// Parses a JSON object into a tree, keeping document order.
///
/// # Errors
///
/// Returns a syntax error with line and column for invalid JSON, or a
/// malformed-input error for a non-object root.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_json(text: &str) -> Result<Tree> {
    json::parse_tree(text)
}

/// Parses YAML-like text into a tree.
///
/// Scalars of any YAML type are stored as text; see the [`de`] module.
///
/// # Errors
///
/// Returns a syntax error with line and column for invalid YAML, or a
/// malformed-input error for sequences, tags, repeated keys or a non-mapping
/// root.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_yaml(text: &str) -> Result<Tree> {
    de::from_yaml(text)
}

/// Writes a tree to `writer` in `format`, using default options.
///
/// Legacy output flattens with the default `,` path delimiter.
///
/// # Examples
///
/// ```rust
/// use protogroup::{to_writer, tree, Format};
///
/// let mut buffer = Vec::new();
/// to_writer(&mut buffer, &tree!({ "db": { "port": "1" } }), Format::Legacy).unwrap();
/// assert_eq!(buffer, b"db,port > 1\n");
/// ```
///
/// # Errors
///
/// Returns an error if rendering fails or the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W>(mut writer: W, tree: &Tree, format: Format) -> Result<()>
where
    W: stdio::Write,
{
    let options = GroupOptions::default();
    let text = match format {
        Format::Json => json::to_json(tree, &options.json)?,
        Format::Yaml => ser::to_yaml(tree, &options.yaml)?,
        Format::Legacy => legacy::to_legacy(
            &flatten(tree, options.path_delimiter)?,
            options.path_delimiter,
            &options.legacy,
        )?,
    };
    writer
        .write_all(text.as_bytes())
        .map_err(|e| Error::io("<writer>", &e))
}

/// Reads a tree in `format` from `reader`, using default options.
///
/// # Errors
///
/// Returns an error if reading fails or the text does not parse.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R>(mut reader: R, format: Format) -> Result<Tree>
where
    R: stdio::Read,
{
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|e| Error::io("<reader>", &e))?;
    match format {
        Format::Json => from_json(&text),
        Format::Yaml => from_yaml(&text),
        Format::Legacy => {
            let options = GroupOptions::default();
            unflatten(
                &legacy::from_legacy(&text, &options.legacy)?,
                options.path_delimiter,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reader_round_trip_each_format() {
        let t = tree!({ "name": "My App", "db": { "host": "h", "port": "1" } });
        for format in [Format::Json, Format::Yaml, Format::Legacy] {
            let mut buffer = Vec::new();
            to_writer(&mut buffer, &t, format).unwrap();
            let back = from_reader(Cursor::new(buffer), format).unwrap();
            assert_eq!(
                flatten(&back, ',').unwrap(),
                flatten(&t, ',').unwrap(),
                "{format}"
            );
        }
    }

    #[test]
    fn test_yaml_with_options() {
        let t = tree!({ "a": { "b": "c" } });
        let out = to_yaml_with_options(&t, &YamlOptions::new().with_indent(3)).unwrap();
        assert_eq!(out, "a:\n   b: c\n");
    }

    #[test]
    fn test_from_json_errors() {
        assert!(from_json("not json").is_err());
        assert!(from_json("[]").is_err());
    }
}
