//! Record storage with clone-and-link semantics.
//!
//! A [`Store`] exclusively owns every live [`Record`]. Records are addressed by
//! name, and each name maps to a stable [`RecordId`] handle. Prototype links
//! between records hold the parent's handle, so walking a chain never goes
//! back through name lookup.
//!
//! ## Record lifecycle
//!
//! A record becomes live through composition ([`Store::create`] and friends),
//! [`Store::clone_record`], [`Store::copy_record`], or one of the loaders. It
//! stays live until [`Store::remove`] or [`Store::clear`]. Re-creating a live
//! name keeps its handle, so descendants linked to it see the new definition.
//! Removing an ancestor does not touch its descendants; their link dangles.
//!
//! ## Examples
//!
//! ```rust
//! use protogroup::Store;
//!
//! let mut store = Store::new();
//! store.create("base", &["colour", "red", "size", "10"]).unwrap();
//! store.clone_record("child", "base").unwrap();
//!
//! store.set("child", "colour", "blue").unwrap();
//! assert_eq!(store.get("base", "colour").unwrap().as_deref(), Some("red"));
//! assert_eq!(store.get("child", "proto").unwrap().as_deref(), Some("base"));
//! ```

use crate::dispatch::Operation;
use crate::json::JsonBackend;
use crate::path;
use crate::{Error, FlatMap, GroupOptions, Result, Tree};
use indexmap::IndexMap;
use std::fmt;
use tracing::{debug, warn};

/// Stable handle of a record inside one [`Store`].
///
/// Handles are never reused, even after the record is removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(u64);

impl RecordId {
    #[must_use]
    pub const fn index(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One entry of a record.
///
/// Data, parent links and operations share the key space but are kept apart
/// by type.
#[derive(Clone, Debug)]
pub enum Field {
    Scalar(String),
    /// Link to the record this one was cloned from. `name` is the parent's
    /// name when the link was made and is what the data view shows.
    Parent { id: RecordId, name: String },
    Operation(Operation),
}

impl Field {
    /// The value this field contributes to the data view, if any.
    #[must_use]
    pub fn as_data(&self) -> Option<&str> {
        match self {
            Field::Scalar(s) => Some(s),
            Field::Parent { name, .. } => Some(name),
            Field::Operation(_) => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_operation(&self) -> bool {
        matches!(self, Field::Operation(_))
    }
}

/// A named, mutable set of fields.
#[derive(Clone, Debug, Default)]
pub struct Record {
    fields: IndexMap<String, Field>,
}

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Field> {
        self.fields.get(key)
    }

    /// Returns an iterator over all fields, in insertion order.
    pub fn fields(&self) -> indexmap::map::Iter<'_, String, Field> {
        self.fields.iter()
    }

    /// Returns the handle of the parent record, if this record is linked.
    #[must_use]
    pub fn parent(&self) -> Option<RecordId> {
        self.fields.values().find_map(|field| match field {
            Field::Parent { id, .. } => Some(*id),
            _ => None,
        })
    }

    /// Flattened data view: scalars and parent links, without operations.
    #[must_use]
    pub fn data(&self) -> FlatMap {
        self.fields
            .iter()
            .filter_map(|(k, field)| field.as_data().map(|v| (k.clone(), v.to_string())))
            .collect()
    }

    pub(crate) fn keys(&self) -> indexmap::map::Keys<'_, String, Field> {
        self.fields.keys()
    }

    pub(crate) fn insert(&mut self, key: String, field: Field) -> Option<Field> {
        self.fields.insert(key, field)
    }

    pub(crate) fn remove(&mut self, key: &str) -> Option<Field> {
        self.fields.shift_remove(key)
    }
}

/// A caller-scoped named value.
///
/// Variables feed dereference (`$name`), pass-by-name (`&name`) and
/// composition (`%name`) tokens, and receive text written to a variable sink.
#[derive(Clone, Debug, PartialEq)]
pub enum Variable {
    Scalar(String),
    List(Vec<String>),
    Map(FlatMap),
}

impl Variable {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Variable::Scalar(s) => Some(s),
            _ => None,
        }
    }
}

impl From<String> for Variable {
    fn from(value: String) -> Self {
        Variable::Scalar(value)
    }
}

impl From<&str> for Variable {
    fn from(value: &str) -> Self {
        Variable::Scalar(value.to_string())
    }
}

impl From<Vec<String>> for Variable {
    fn from(value: Vec<String>) -> Self {
        Variable::List(value)
    }
}

impl From<Vec<&str>> for Variable {
    fn from(value: Vec<&str>) -> Self {
        Variable::List(value.into_iter().map(str::to_string).collect())
    }
}

impl From<FlatMap> for Variable {
    fn from(value: FlatMap) -> Self {
        Variable::Map(value)
    }
}

struct Slot {
    name: String,
    record: Record,
}

/// Owner of all live records and variables.
///
/// Not internally synchronized: share it across threads only behind a lock.
pub struct Store {
    options: GroupOptions,
    slots: IndexMap<RecordId, Slot>,
    names: IndexMap<String, RecordId>,
    variables: IndexMap<String, Variable>,
    next_id: u64,
    json_backend: Option<Box<dyn JsonBackend>>,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("options", &self.options)
            .field("records", &self.names)
            .field("variables", &self.variables.len())
            .field(
                "json_backend",
                &self.json_backend.as_ref().map(|backend| backend.name()),
            )
            .finish()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(GroupOptions::default())
    }

    #[must_use]
    pub fn with_options(options: GroupOptions) -> Self {
        Store {
            options,
            slots: IndexMap::new(),
            names: IndexMap::new(),
            variables: IndexMap::new(),
            next_id: 0,
            json_backend: None,
        }
    }

    #[must_use]
    pub fn options(&self) -> &GroupOptions {
        &self.options
    }

    pub(crate) fn delimiter(&self) -> char {
        self.options.path_delimiter
    }

    /// Drops every record and variable. Handles issued before stay unused.
    pub fn clear(&mut self) {
        debug!(records = self.names.len(), "clearing store");
        self.slots.clear();
        self.names.clear();
        self.variables.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    #[must_use]
    pub fn id(&self, name: &str) -> Option<RecordId> {
        self.names.get(name).copied()
    }

    #[must_use]
    pub fn name_of(&self, id: RecordId) -> Option<&str> {
        self.slots.get(&id).map(|slot| slot.name.as_str())
    }

    /// Names of all live records, in creation order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }

    pub(crate) fn require(&self, name: &str) -> Result<RecordId> {
        self.id(name).ok_or_else(|| Error::not_found("record", name))
    }

    /// Returns the named record.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if no record has that name.
    pub fn record(&self, name: &str) -> Result<&Record> {
        let id = self.require(name)?;
        self.record_by_id(id)
            .ok_or_else(|| Error::not_found("record", name))
    }

    #[must_use]
    pub fn record_by_id(&self, id: RecordId) -> Option<&Record> {
        self.slots.get(&id).map(|slot| &slot.record)
    }

    pub(crate) fn record_mut(&mut self, id: RecordId) -> Option<&mut Record> {
        self.slots.get_mut(&id).map(|slot| &mut slot.record)
    }

    /// Reads one data field. Operation fields read as `None`.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the record does not exist.
    pub fn get(&self, name: &str, key: &str) -> Result<Option<String>> {
        let id = self.require(name)?;
        Ok(self.get_by_id(id, key))
    }

    #[must_use]
    pub fn get_by_id(&self, id: RecordId, key: &str) -> Option<String> {
        self.record_by_id(id)
            .and_then(|record| record.field(key))
            .and_then(Field::as_data)
            .map(str::to_string)
    }

    /// Keys of the record's data view, in insertion order.
    pub fn keys(&self, name: &str) -> Result<Vec<String>> {
        Ok(self.record(name)?.data().into_iter().map(|(k, _)| k).collect())
    }

    /// Flattened data of a record, including its parent link.
    pub fn data(&self, name: &str) -> Result<FlatMap> {
        Ok(self.record(name)?.data())
    }

    /// Nested form of a record's data.
    pub fn tree(&self, name: &str) -> Result<Tree> {
        path::unflatten(&self.data(name)?, self.delimiter())
    }

    /// Assigns one field directly.
    ///
    /// Assigning the parent key a value that names a live record links to
    /// that record; any other value is stored as plain data.
    ///
    /// # Errors
    ///
    /// Fails if the record is absent, the key is malformed or collides with an
    /// existing key, or the link would form a cycle.
    pub fn set(&mut self, name: &str, key: &str, value: &str) -> Result<()> {
        let id = self.require(name)?;
        self.set_by_id(id, key, value)
    }

    pub fn set_by_id(&mut self, id: RecordId, key: &str, value: &str) -> Result<()> {
        path::check_key(key, self.delimiter())?;
        let record = self
            .record_by_id(id)
            .ok_or_else(|| Error::not_found("record", &id.to_string()))?;
        if let Some(existing) = path::find_conflict(record.keys(), key, self.delimiter()) {
            return Err(Error::conflict(
                key,
                &format!("collides with existing key '{}'", existing),
            ));
        }
        let field = self.make_field(key, value.to_string());
        if let Field::Parent { id: parent, .. } = &field {
            if self.creates_cycle(id, *parent) {
                return Err(Error::malformed(format!(
                    "linking {} to '{}' would form a cycle",
                    id, value
                )));
            }
        }
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.record.insert(key.to_string(), field);
        }
        Ok(())
    }

    /// Removes one field. Returns whether it existed.
    pub fn unset(&mut self, name: &str, key: &str) -> Result<bool> {
        let id = self.require(name)?;
        Ok(self
            .slots
            .get_mut(&id)
            .and_then(|slot| slot.record.remove(key))
            .is_some())
    }

    /// Removes a record. Descendants linked to it stay live.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.names.shift_remove(name) {
            Some(id) => {
                self.slots.shift_remove(&id);
                debug!(record = name, %id, "removed record");
                true
            }
            None => false,
        }
    }

    /// Clones `source` into `name` and links the new record to it.
    ///
    /// Data is a snapshot: later data changes on either side stay local.
    /// The link is live: operations added to `source` later become callable
    /// on `name`.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if `source` does not exist.
    pub fn clone_record(&mut self, name: &str, source: &str) -> Result<RecordId> {
        let source_id = self.require(source)?;
        let mut record = self.record(source)?.clone();
        let parent_key = self.options.parent_key.clone();
        record.remove(&parent_key);
        if let Some(existing) = path::find_conflict(record.keys(), &parent_key, self.delimiter()) {
            return Err(Error::conflict(
                &parent_key,
                &format!("parent key collides with '{}' in '{}'", existing, source),
            ));
        }
        record.insert(
            parent_key,
            Field::Parent {
                id: source_id,
                name: source.to_string(),
            },
        );
        let id = self.commit(name, record)?;
        debug!(record = name, parent = source, %id, "cloned record");
        Ok(id)
    }

    /// Copies every field of `source` into `name` without linking them.
    pub fn copy_record(&mut self, name: &str, source: &str) -> Result<RecordId> {
        let record = self.record(source)?.clone();
        let id = self.commit(name, record)?;
        debug!(record = name, source, %id, "copied record");
        Ok(id)
    }

    /// Builds and commits a record from already-resolved flat data.
    ///
    /// # Errors
    ///
    /// Fails on malformed keys or prefix collisions; the store is left
    /// unchanged.
    pub fn create_from_flat(&mut self, name: &str, data: FlatMap) -> Result<RecordId> {
        path::check_structure(&data, self.delimiter())?;
        let mut record = Record::new();
        for (key, value) in data {
            let field = self.make_field(&key, value);
            record.insert(key, field);
        }
        self.commit(name, record)
    }

    /// Installs a fully built record under `name`, reusing the handle of a
    /// live record with the same name.
    pub(crate) fn commit(&mut self, name: &str, record: Record) -> Result<RecordId> {
        if name.is_empty() {
            return Err(Error::malformed("record name is empty"));
        }
        if let (Some(existing), Some(parent)) = (self.id(name), record.parent()) {
            if self.creates_cycle(existing, parent) {
                return Err(Error::malformed(format!(
                    "record '{}' would become its own ancestor",
                    name
                )));
            }
        }
        let id = match self.id(name) {
            Some(id) => id,
            None => {
                let id = RecordId(self.next_id);
                self.next_id += 1;
                self.names.insert(name.to_string(), id);
                id
            }
        };
        self.slots.insert(
            id,
            Slot {
                name: name.to_string(),
                record,
            },
        );
        debug!(record = name, %id, "committed record");
        Ok(id)
    }

    /// Turns an assignment into a field, resolving parent links by name.
    pub(crate) fn make_field(&self, key: &str, value: String) -> Field {
        if key == self.options.parent_key {
            if let Some(id) = self.id(&value) {
                return Field::Parent { id, name: value };
            }
            warn!(key, parent = %value, "parent link names no live record; stored as data");
        }
        Field::Scalar(value)
    }

    /// Whether making `parent` the parent of `child` closes a loop.
    pub(crate) fn creates_cycle(&self, child: RecordId, parent: RecordId) -> bool {
        let mut current = Some(parent);
        let mut hops = 0;
        while let Some(id) = current {
            if id == child {
                return true;
            }
            hops += 1;
            if hops > self.options.max_chain_depth {
                return false;
            }
            current = self.record_by_id(id).and_then(Record::parent);
        }
        false
    }

    /// Sets a caller-scoped variable.
    pub fn set_var(&mut self, name: &str, value: impl Into<Variable>) {
        self.variables.insert(name.to_string(), value.into());
    }

    #[must_use]
    pub fn var(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn unset_var(&mut self, name: &str) -> Option<Variable> {
        self.variables.shift_remove(name)
    }

    pub fn variables(&self) -> indexmap::map::Iter<'_, String, Variable> {
        self.variables.iter()
    }

    /// Substitutes an external JSON parser for the built-in one.
    pub fn set_json_backend(&mut self, backend: Box<dyn JsonBackend>) {
        debug!(backend = backend.name(), "installed JSON backend");
        self.json_backend = Some(backend);
    }

    pub fn clear_json_backend(&mut self) -> Option<Box<dyn JsonBackend>> {
        self.json_backend.take()
    }

    pub(crate) fn json_backend(&self) -> Option<&dyn JsonBackend> {
        self.json_backend.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn store_with_base() -> Store {
        let mut store = Store::new();
        store
            .create_from_flat(
                "base",
                [("colour", "red"), ("size,w", "10"), ("size,h", "20")]
                    .into_iter()
                    .collect(),
            )
            .unwrap();
        store
    }

    #[test]
    fn test_clone_links_and_snapshots() {
        let mut store = store_with_base();
        let child = store.clone_record("child", "base").unwrap();
        let base = store.id("base").unwrap();
        assert_eq!(store.record_by_id(child).unwrap().parent(), Some(base));

        store.set("base", "colour", "green").unwrap();
        assert_eq!(store.get("child", "colour").unwrap().as_deref(), Some("red"));
        store.set("child", "size,w", "99").unwrap();
        assert_eq!(store.get("base", "size,w").unwrap().as_deref(), Some("10"));
    }

    #[test]
    fn test_clone_missing_source() {
        let mut store = Store::new();
        let err = store.clone_record("child", "ghost").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("ghost"));
        assert!(!store.exists("child"));
    }

    #[test]
    fn test_copy_has_no_link() {
        let mut store = store_with_base();
        let copy = store.copy_record("copy", "base").unwrap();
        assert_eq!(store.record_by_id(copy).unwrap().parent(), None);
        assert_eq!(store.data("copy").unwrap(), store.data("base").unwrap());
    }

    #[test]
    fn test_set_rejects_prefix_collision() {
        let mut store = store_with_base();
        let err = store.set("base", "size", "big").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
        let err = store.set("base", "colour,shade", "dark").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
        assert_eq!(store.get("base", "colour").unwrap().as_deref(), Some("red"));
    }

    #[test]
    fn test_parent_key_links_only_live_records() {
        let mut store = store_with_base();
        store.create_from_flat("other", FlatMap::new()).unwrap();
        store.set("other", "proto", "base").unwrap();
        assert_eq!(store.record("other").unwrap().parent(), store.id("base"));

        store.set("other", "proto", "nobody").unwrap();
        assert_eq!(store.record("other").unwrap().parent(), None);
        assert_eq!(store.get("other", "proto").unwrap().as_deref(), Some("nobody"));
    }

    #[test]
    fn test_cycles_rejected() {
        let mut store = store_with_base();
        store.clone_record("child", "base").unwrap();
        let err = store.set("base", "proto", "child").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
        assert!(store.clone_record("base", "child").is_err());
        assert!(store.clone_record("base", "base").is_err());
    }

    #[test]
    fn test_recreate_keeps_handle() {
        let mut store = store_with_base();
        let before = store.id("base").unwrap();
        store.create_from_flat("base", FlatMap::new()).unwrap();
        assert_eq!(store.id("base"), Some(before));
        assert!(store.data("base").unwrap().is_empty());
    }

    #[test]
    fn test_remove_and_clear() {
        let mut store = store_with_base();
        store.clone_record("child", "base").unwrap();
        store.set_var("x", "1");
        assert!(store.remove("base"));
        assert!(!store.remove("base"));
        assert!(store.exists("child"));
        assert_eq!(store.get("child", "proto").unwrap().as_deref(), Some("base"));

        store.clear();
        assert!(store.is_empty());
        assert!(store.var("x").is_none());
    }

    #[test]
    fn test_unset() {
        let mut store = store_with_base();
        assert!(store.unset("base", "colour").unwrap());
        assert!(!store.unset("base", "colour").unwrap());
        assert_eq!(store.keys("base").unwrap(), vec!["size,w", "size,h"]);
    }

    #[test]
    fn test_tree_view() {
        let store = store_with_base();
        let tree = store.tree("base").unwrap();
        assert_eq!(
            tree.get("size").and_then(|s| s.get("h")).and_then(Tree::as_str),
            Some("20")
        );
    }
}
