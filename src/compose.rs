//! Building records from key/value lists.
//!
//! All three entry points funnel into one staging step: each value is resolved
//! through a [`SigilResolver`], composed entries are merged under their key,
//! and the finished record is committed to the store in one go. If any value
//! fails to resolve, the store is left as it was.
//!
//! ```rust
//! use protogroup::Store;
//!
//! let mut store = Store::new();
//! store.create("db", &["host", "localhost", "port", "3306"]).unwrap();
//! store.create_from_lists("app", &["name", "database"], &["App", "%db"]).unwrap();
//!
//! assert_eq!(store.get("app", "database,port").unwrap().as_deref(), Some("3306"));
//! ```

use crate::path;
use crate::sigil::{Resolved, SigilResolver};
use crate::store::{Field, Record, RecordId, Store};
use crate::{Error, Result};
use tracing::debug;

impl Store {
    /// Creates a record from alternating keys and values.
    ///
    /// A single pass-by-name argument (`&var`) supplies the whole list.
    ///
    /// # Errors
    ///
    /// Fails with malformed input for an odd number of items, and with the
    /// resolver's errors for unresolved sigils.
    pub fn create<S: AsRef<str>>(&mut self, name: &str, pairs: &[S]) -> Result<RecordId> {
        let items = SigilResolver::new(self).resolve_list(pairs)?;
        if items.len() % 2 != 0 {
            return Err(Error::malformed(format!(
                "record '{}' needs key/value pairs but got {} items",
                name,
                items.len()
            )));
        }
        let mut items = items.into_iter();
        let mut pairs = Vec::with_capacity(items.len() / 2);
        while let (Some(key), Some(value)) = (items.next(), items.next()) {
            pairs.push((key, value));
        }
        self.build(name, pairs)
    }

    /// Creates a record from parallel key and value lists.
    ///
    /// Either list may be a single pass-by-name argument.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::LengthMismatch`] when the resolved lists differ in
    /// length.
    pub fn create_from_lists<K, V>(&mut self, name: &str, keys: &[K], values: &[V]) -> Result<RecordId>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let resolver = SigilResolver::new(self);
        let keys = resolver.resolve_list(keys)?;
        let values = resolver.resolve_list(values)?;
        if keys.len() != values.len() {
            return Err(Error::LengthMismatch {
                keys: keys.len(),
                values: values.len(),
            });
        }
        self.build(name, keys.into_iter().zip(values).collect())
    }

    /// Creates a record from a block of `key value` lines.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use protogroup::Store;
    ///
    /// let mut store = Store::new();
    /// store
    ///     .create_from_block("app", "# settings\nname App\n\ntitle \"My App\"\n")
    ///     .unwrap();
    /// assert_eq!(store.get("app", "title").unwrap().as_deref(), Some("My App"));
    /// ```
    pub fn create_from_block(&mut self, name: &str, text: &str) -> Result<RecordId> {
        let pairs = parse_block(text)?;
        self.build(name, pairs)
    }

    fn build(&mut self, name: &str, pairs: Vec<(String, String)>) -> Result<RecordId> {
        let delimiter = self.delimiter();
        let mut record = Record::new();
        {
            let resolver = SigilResolver::new(self);
            for (key, raw) in &pairs {
                match resolver.resolve(key, raw)? {
                    Resolved::Scalar(value) => {
                        stage(&record, key, delimiter)?;
                        let field = self.make_field(key, value);
                        record.insert(key.clone(), field);
                    }
                    Resolved::Entries(entries) => {
                        for (entry_key, value) in entries {
                            stage(&record, &entry_key, delimiter)?;
                            record.insert(entry_key, Field::Scalar(value));
                        }
                    }
                }
            }
        }
        let fields = record.len();
        let id = self.commit(name, record)?;
        debug!(record = name, fields, %id, "created record");
        Ok(id)
    }
}

/// Rejects `key` if it collides with a key already staged. Repeating the same
/// key overwrites.
fn stage(record: &Record, key: &str, delimiter: char) -> Result<()> {
    path::check_key(key, delimiter)?;
    if let Some(existing) = path::find_conflict(record.keys(), key, delimiter) {
        return Err(Error::conflict(
            key,
            &format!("collides with '{}' in the same record", existing),
        ));
    }
    Ok(())
}

/// Splits a block of `key value` lines into pairs.
///
/// Blank lines and lines starting with `#` are skipped. The value is the rest
/// of the line after the first run of whitespace; one pair of surrounding
/// double quotes is removed.
///
/// # Errors
///
/// Returns a syntax error for a line that has a key but no value.
pub fn parse_block(text: &str) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let (key, value) = match trimmed.split_once(char::is_whitespace) {
            Some((key, value)) => (key, value.trim()),
            None => {
                return Err(Error::syntax_with_context(
                    index + 1,
                    trimmed.len() + 1,
                    &format!("key '{}' has no value", trimmed),
                    line,
                    Some("Write an empty value as \"\""),
                ))
            }
        };
        pairs.push((key.to_string(), unquote(value).to_string()));
    }
    Ok(pairs)
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_app_with_composed_database() {
        let mut store = Store::new();
        store
            .create_from_lists("db", &["host", "port"], &["localhost", "3306"])
            .unwrap();
        store
            .create_from_lists("app", &["name", "database"], &["App", "%db"])
            .unwrap();
        let data = store.data("app").unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(data.get("name"), Some("App"));
        assert_eq!(data.get("database,host"), Some("localhost"));
        assert_eq!(data.get("database,port"), Some("3306"));
    }

    #[test]
    fn test_length_mismatch() {
        let mut store = Store::new();
        let err = store.create_from_lists("x", &["a", "b"], &["1"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
        assert!(matches!(err, Error::LengthMismatch { keys: 2, values: 1 }));
        assert!(!store.exists("x"));
    }

    #[test]
    fn test_odd_pairs() {
        let mut store = Store::new();
        let err = store.create("x", &["a", "1", "b"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn test_failure_leaves_store_unchanged() {
        let mut store = Store::new();
        store.create("app", &["name", "old"]).unwrap();
        let err = store.create("app", &["name", "new", "db", "%missing"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(store.get("app", "name").unwrap().as_deref(), Some("old"));
    }

    #[test]
    fn test_pass_by_name_and_deref() {
        let mut store = Store::new();
        store.set_var("keys", vec!["name", "owner"]);
        store.set_var("who", "ops team");
        store
            .create_from_lists("app", &["&keys"], &["App", "$who"])
            .unwrap();
        assert_eq!(store.get("app", "owner").unwrap().as_deref(), Some("ops team"));

        store.set_var("pairs", vec!["a", "1", "b", "2"]);
        store.create("flat", &["&pairs"]).unwrap();
        assert_eq!(store.keys("flat").unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_composition_is_snapshot() {
        let mut store = Store::new();
        store.create("db", &["host", "a"]).unwrap();
        store.create("app", &["database", "%db"]).unwrap();
        store.set("db", "host", "b").unwrap();
        assert_eq!(store.get("app", "database,host").unwrap().as_deref(), Some("a"));
    }

    #[test]
    fn test_nested_composition() {
        let mut store = Store::new();
        store.create("creds", &["user", "root"]).unwrap();
        store.create("db", &["host", "h", "auth", "%creds"]).unwrap();
        store.create("app", &["database", "%db"]).unwrap();
        assert_eq!(
            store.get("app", "database,auth,user").unwrap().as_deref(),
            Some("root")
        );
    }

    #[test]
    fn test_escaped_sigil_is_literal() {
        let mut store = Store::new();
        store.create("x", &["discount", "%%10", "price", "$$5"]).unwrap();
        assert_eq!(store.get("x", "discount").unwrap().as_deref(), Some("%10"));
        assert_eq!(store.get("x", "price").unwrap().as_deref(), Some("$5"));
    }

    #[test]
    fn test_prefix_collision_in_one_build() {
        let mut store = Store::new();
        store.create("db", &["host", "h"]).unwrap();
        let err = store
            .create("app", &["database", "plain", "database", "%db"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn test_proto_key_links() {
        let mut store = Store::new();
        store.create("base", &["a", "1"]).unwrap();
        store.create("derived", &["proto", "base", "b", "2"]).unwrap();
        assert_eq!(store.record("derived").unwrap().parent(), store.id("base"));
        let err = store.create("base", &["proto", "derived"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn test_parse_block() {
        let text = "# comment\n\n  name   App  \ntitle \"Two Words\"\nempty \"\"\n";
        let pairs = parse_block(text).unwrap();
        assert_eq!(
            pairs,
            vec![
                ("name".to_string(), "App".to_string()),
                ("title".to_string(), "Two Words".to_string()),
                ("empty".to_string(), String::new()),
            ]
        );
        match parse_block("ok 1\nlonely\n").unwrap_err() {
            Error::Syntax { line, .. } => assert_eq!(line, 2),
            other => panic!("expected syntax error, got {other:?}"),
        }
    }
}
