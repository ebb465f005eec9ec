//! Nested representation of record data.
//!
//! [`Tree`] is the unflattened form of a record: a node is either a scalar
//! string or a branch mapping segment names to child nodes. It is the
//! interchange type between [`path`](crate::path) and the text codecs.
//!
//! ## Creating Trees
//!
//! ```rust
//! use protogroup::{tree, Tree};
//!
//! let app = tree!({
//!     "name": "App",
//!     "database": { "host": "localhost", "port": 3306 }
//! });
//! assert_eq!(app.get("name").and_then(Tree::as_str), Some("App"));
//! assert_eq!(app.leaf_count(), 3);
//! ```
//!
//! ## JSON Scalars
//!
//! Deserializing JSON into a `Tree` keeps objects as branches in document order
//! and turns every other JSON value into a scalar. An object that repeats a key
//! is rejected.
//!
//! | JSON       | Scalar text            |
//! |------------|------------------------|
//! | string     | the string itself      |
//! | number     | its JSON text          |
//! | `true`     | `true`                 |
//! | `null`     | empty string           |
//! | array      | compact JSON of array  |

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Key under which `serde_json` hands over a number's source text when
/// `arbitrary_precision` is enabled.
const JSON_NUMBER_TOKEN: &str = "$serde_json::private::Number";

/// Children of a branch, in insertion order.
pub type TreeMap = IndexMap<String, Tree>;

/// A scalar or a mapping of segment names to subtrees.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Tree {
    Scalar(String),
    Branch(TreeMap),
}

impl Default for Tree {
    fn default() -> Self {
        Tree::Branch(TreeMap::new())
    }
}

impl Tree {
    #[inline]
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        matches!(self, Tree::Scalar(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_branch(&self) -> bool {
        matches!(self, Tree::Branch(_))
    }

    /// If the node is a scalar, returns its text. Otherwise returns `None`.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Tree::Scalar(s) => Some(s),
            Tree::Branch(_) => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_branch(&self) -> Option<&TreeMap> {
        match self {
            Tree::Branch(map) => Some(map),
            Tree::Scalar(_) => None,
        }
    }

    /// Returns the child named `segment` of a branch.
    #[must_use]
    pub fn get(&self, segment: &str) -> Option<&Tree> {
        self.as_branch().and_then(|map| map.get(segment))
    }

    /// Number of scalar leaves below this node.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        match self {
            Tree::Scalar(_) => 1,
            Tree::Branch(map) => map.values().map(Tree::leaf_count).sum(),
        }
    }

    /// Returns a copy with every branch's children sorted by key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use protogroup::tree;
    ///
    /// let sorted = tree!({ "b": "2", "a": "1" }).sorted();
    /// let keys: Vec<_> = sorted.as_branch().unwrap().keys().cloned().collect();
    /// assert_eq!(keys, vec!["a", "b"]);
    /// ```
    #[must_use]
    pub fn sorted(&self) -> Tree {
        match self {
            Tree::Scalar(s) => Tree::Scalar(s.clone()),
            Tree::Branch(map) => {
                let mut entries: Vec<_> = map.iter().map(|(k, v)| (k.clone(), v.sorted())).collect();
                entries.sort_by(|a, b| a.0.cmp(&b.0));
                Tree::Branch(entries.into_iter().collect())
            }
        }
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tree::Scalar(s) => write!(f, "{}", s),
            Tree::Branch(map) => write!(f, "{{branch of {}}}", map.len()),
        }
    }
}

impl Serialize for Tree {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Tree::Scalar(s) => serializer.serialize_str(s),
            Tree::Branch(map) => {
                use serde::ser::SerializeMap;
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Tree {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct TreeVisitor;

        impl<'de> Visitor<'de> for TreeVisitor {
            type Value = Tree;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a JSON value")
            }

            fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E> {
                Ok(Tree::Scalar(value.to_string()))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E> {
                Ok(Tree::Scalar(value.to_string()))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E> {
                Ok(Tree::Scalar(value.to_string()))
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E> {
                Ok(Tree::Scalar(serde_json::Number::from_f64(value).map_or_else(
                    || value.to_string(),
                    |n| n.to_string(),
                )))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E> {
                Ok(Tree::Scalar(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> Result<Self::Value, E> {
                Ok(Tree::Scalar(value))
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E> {
                Ok(Tree::Scalar(String::new()))
            }

            fn visit_none<E>(self) -> Result<Self::Value, E> {
                Ok(Tree::Scalar(String::new()))
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                // Arrays are opaque scalars holding their own compact JSON text.
                let mut items = Vec::new();
                while let Some(item) = seq.next_element::<serde_json::Value>()? {
                    items.push(item);
                }
                Ok(Tree::Scalar(serde_json::Value::Array(items).to_string()))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut children = TreeMap::new();
                while let Some(key) = map.next_key::<String>()? {
                    if key == JSON_NUMBER_TOKEN && children.is_empty() {
                        return Ok(Tree::Scalar(map.next_value::<String>()?));
                    }
                    if children.contains_key(&key) {
                        return Err(de::Error::custom(format!("duplicate key '{}'", key)));
                    }
                    let value = map.next_value::<Tree>()?;
                    children.insert(key, value);
                }
                Ok(Tree::Branch(children))
            }
        }

        deserializer.deserialize_any(TreeVisitor)
    }
}

impl From<String> for Tree {
    fn from(value: String) -> Self {
        Tree::Scalar(value)
    }
}

impl From<&str> for Tree {
    fn from(value: &str) -> Self {
        Tree::Scalar(value.to_string())
    }
}

impl From<TreeMap> for Tree {
    fn from(value: TreeMap) -> Self {
        Tree::Branch(value)
    }
}
