//! Conversion between nested trees and flattened key paths.
//!
//! A flattened key is a non-empty sequence of segments joined by a delimiter
//! (`,` by default). [`flatten`] walks a [`Tree`] depth-first and emits one
//! entry per scalar leaf; [`unflatten`] rebuilds the tree and rejects any key
//! set in which one path would have to be both a scalar and a branch.
//!
//! ```rust
//! use protogroup::path::{flatten, unflatten};
//! use protogroup::tree;
//!
//! let tree = tree!({ "name": "App", "database": { "host": "localhost" } });
//! let flat = flatten(&tree, ',').unwrap();
//! assert_eq!(flat.get("database,host"), Some("localhost"));
//! assert_eq!(unflatten(&flat, ',').unwrap(), tree);
//! ```
//!
//! Empty branches carry no leaves and therefore vanish from the flat form.
//! Keys hold at most [`MAX_DEPTH`] segments.

use crate::{Error, FlatMap, Result, Tree, TreeMap};

/// Most segments a flattened key may have. Matches the nesting limit of the
/// JSON and YAML parsers.
pub const MAX_DEPTH: usize = 128;

/// Joins a key prefix and a segment. An empty prefix yields the segment itself.
#[must_use]
pub fn join(prefix: &str, segment: &str, delimiter: char) -> String {
    if prefix.is_empty() {
        return segment.to_string();
    }
    let mut key = String::with_capacity(prefix.len() + segment.len() + 1);
    key.push_str(prefix);
    key.push(delimiter);
    key.push_str(segment);
    key
}

/// Splits a flattened key into its segments.
pub fn split(key: &str, delimiter: char) -> std::str::Split<'_, char> {
    key.split(delimiter)
}

/// Returns the first segment of a key.
#[must_use]
pub fn head(key: &str, delimiter: char) -> &str {
    key.split(delimiter).next().unwrap_or(key)
}

/// Checks that a flattened key is non-empty, has no empty segments and is at
/// most [`MAX_DEPTH`] segments deep.
///
/// # Errors
///
/// Returns a malformed-input error naming the key.
pub fn check_key(key: &str, delimiter: char) -> Result<()> {
    if key.is_empty() {
        return Err(Error::malformed("empty key"));
    }
    let mut depth = 0;
    for segment in split(key, delimiter) {
        if segment.is_empty() {
            return Err(Error::malformed(format!(
                "key '{}' has an empty path segment",
                key
            )));
        }
        depth += 1;
    }
    if depth > MAX_DEPTH {
        return Err(Error::malformed(format!(
            "key starting '{}' has {} segments, more than {}",
            head(key, delimiter),
            depth,
            MAX_DEPTH
        )));
    }
    Ok(())
}

/// Checks that a single segment can be joined without ambiguity.
fn check_segment(prefix: &str, segment: &str, delimiter: char) -> Result<()> {
    if segment.is_empty() {
        return Err(Error::malformed(format!(
            "empty segment below '{}'",
            if prefix.is_empty() { "<root>" } else { prefix }
        )));
    }
    if segment.contains(delimiter) {
        return Err(Error::malformed(format!(
            "segment '{}' below '{}' contains the path delimiter '{}'",
            segment,
            if prefix.is_empty() { "<root>" } else { prefix },
            delimiter
        )));
    }
    Ok(())
}

/// Finds an existing key that structurally collides with `key`.
///
/// A collision is a key that is a strict path prefix of `key`, or a key that
/// `key` is a strict path prefix of. Identical keys do not collide.
#[must_use]
pub fn find_conflict<'a, I>(keys: I, key: &str, delimiter: char) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a String>,
{
    keys.into_iter()
        .find(|existing| {
            is_path_prefix(existing, key, delimiter) || is_path_prefix(key, existing, delimiter)
        })
        .map(String::as_str)
}

/// Checks that no key of `map` is a path prefix of another.
///
/// # Errors
///
/// Returns the same errors as [`unflatten`].
pub fn check_structure(map: &FlatMap, delimiter: char) -> Result<()> {
    unflatten(map, delimiter).map(|_| ())
}

fn is_path_prefix(prefix: &str, key: &str, delimiter: char) -> bool {
    key.len() > prefix.len()
        && key.starts_with(prefix)
        && key[prefix.len()..].starts_with(delimiter)
}

/// Flattens a tree into delimiter-joined keys.
///
/// The root must be a branch. Segments may not be empty or contain the
/// delimiter.
///
/// # Errors
///
/// Returns a malformed-input error for a scalar root or an invalid segment.
pub fn flatten(tree: &Tree, delimiter: char) -> Result<FlatMap> {
    let map = match tree {
        Tree::Branch(map) => map,
        Tree::Scalar(_) => return Err(Error::malformed("cannot flatten a scalar root")),
    };
    let mut out = FlatMap::new();
    flatten_into(&mut out, "", map, 1, delimiter)?;
    Ok(out)
}

fn flatten_into(
    out: &mut FlatMap,
    prefix: &str,
    map: &TreeMap,
    depth: usize,
    delimiter: char,
) -> Result<()> {
    if depth > MAX_DEPTH && !map.is_empty() {
        return Err(Error::malformed(format!(
            "tree below '{}' nests deeper than {} levels",
            head(prefix, delimiter),
            MAX_DEPTH
        )));
    }
    for (segment, child) in map {
        check_segment(prefix, segment, delimiter)?;
        let key = join(prefix, segment, delimiter);
        match child {
            Tree::Branch(children) => flatten_into(out, &key, children, depth + 1, delimiter)?,
            Tree::Scalar(value) => {
                if out.insert(key.clone(), value.clone()).is_some() {
                    return Err(Error::conflict(&key, "produced twice while flattening"));
                }
            }
        }
    }
    Ok(())
}

/// Rebuilds the nested tree from a flat map.
///
/// Branch order follows first appearance of each segment in the map.
///
/// # Errors
///
/// Returns a conflict error if one key is a path prefix of another, and a
/// malformed-input error for keys with empty segments.
///
/// ```rust
/// use protogroup::path::unflatten;
/// use protogroup::{ErrorKind, FlatMap};
///
/// let flat: FlatMap = [("a", "1"), ("a,b", "2")].into_iter().collect();
/// let err = unflatten(&flat, ',').unwrap_err();
/// assert_eq!(err.kind(), ErrorKind::MalformedInput);
/// ```
pub fn unflatten(map: &FlatMap, delimiter: char) -> Result<Tree> {
    let mut root = TreeMap::new();
    for (key, value) in map {
        check_key(key, delimiter)?;
        insert_path(&mut root, key, value, delimiter)?;
    }
    Ok(Tree::Branch(root))
}

fn insert_path(root: &mut TreeMap, key: &str, value: &str, delimiter: char) -> Result<()> {
    let segments: Vec<&str> = split(key, delimiter).collect();
    let (last, parents) = match segments.split_last() {
        Some(parts) => parts,
        None => return Err(Error::malformed("empty key")),
    };

    let mut node = root;
    let mut walked = String::new();
    for segment in parents {
        walked = join(&walked, segment, delimiter);
        let child = node
            .entry((*segment).to_string())
            .or_insert_with(|| Tree::Branch(TreeMap::new()));
        node = match child {
            Tree::Branch(children) => children,
            Tree::Scalar(_) => {
                return Err(Error::conflict(
                    &walked,
                    &format!("holds a scalar but '{}' needs it to be a branch", key),
                ))
            }
        };
    }

    match node.get(*last) {
        Some(Tree::Branch(_)) => Err(Error::conflict(
            key,
            "is a branch of longer keys and cannot also hold a scalar",
        )),
        _ => {
            node.insert((*last).to_string(), Tree::Scalar(value.to_string()));
            Ok(())
        }
    }
}
