//! Interpretation of construction values.
//!
//! Every value handed to the composition engine is classified by its first
//! character against the store's [`Sigils`]:
//!
//! | Prefix | Token | Result |
//! |--------|-------|--------|
//! | `%name` | compose | the named record's (or map variable's) flat data, re-prefixed with the current key |
//! | `$name` | dereference | the current value of the named scalar variable |
//! | `&name` | pass-by-name | a whole key or value list taken from the named variable |
//! | anything else | literal | the value itself |
//!
//! A doubled sigil escapes it: `%%20` is the literal `%20`. A lone sigil
//! character is a literal too.

use crate::options::Sigils;
use crate::path;
use crate::store::{Store, Variable};
use crate::{Error, FlatMap, Result};
use tracing::trace;

/// A classified construction value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token<'a> {
    Literal(&'a str),
    Compose(&'a str),
    Deref(&'a str),
}

impl Sigils {
    /// Classifies one value token.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use protogroup::{Sigils, Token};
    ///
    /// let sigils = Sigils::default();
    /// assert_eq!(sigils.classify("%db"), Token::Compose("db"));
    /// assert_eq!(sigils.classify("$host"), Token::Deref("host"));
    /// assert_eq!(sigils.classify("$$5"), Token::Literal("$5"));
    /// assert_eq!(sigils.classify("plain"), Token::Literal("plain"));
    /// ```
    #[must_use]
    pub fn classify<'a>(&self, raw: &'a str) -> Token<'a> {
        if let Some(rest) = strip_sigil(raw, self.compose) {
            return match rest {
                Sigil::Named(name) => Token::Compose(name),
                Sigil::Escaped(text) => Token::Literal(text),
            };
        }
        if let Some(rest) = strip_sigil(raw, self.deref) {
            return match rest {
                Sigil::Named(name) => Token::Deref(name),
                Sigil::Escaped(text) => Token::Literal(text),
            };
        }
        Token::Literal(raw)
    }

    /// Returns the variable named by a pass-by-name argument.
    #[must_use]
    pub fn by_name_target<'a>(&self, raw: &'a str) -> Option<&'a str> {
        match strip_sigil(raw, self.by_name) {
            Some(Sigil::Named(name)) => Some(name),
            _ => None,
        }
    }

    /// Removes the escape from a doubled pass-by-name sigil.
    fn unescape_by_name<'a>(&self, raw: &'a str) -> &'a str {
        match strip_sigil(raw, self.by_name) {
            Some(Sigil::Escaped(text)) => text,
            _ => raw,
        }
    }
}

enum Sigil<'a> {
    Named(&'a str),
    Escaped(&'a str),
}

fn strip_sigil(raw: &str, sigil: char) -> Option<Sigil<'_>> {
    let rest = raw.strip_prefix(sigil)?;
    if rest.starts_with(sigil) {
        Some(Sigil::Escaped(rest))
    } else if rest.is_empty() {
        None
    } else {
        Some(Sigil::Named(rest))
    }
}

/// The outcome of resolving one value.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolved {
    Scalar(String),
    /// Composed entries, already prefixed with the key they were composed under.
    Entries(FlatMap),
}

/// Resolves construction tokens against a store's records and variables.
#[derive(Debug)]
pub struct SigilResolver<'s> {
    store: &'s Store,
}

impl<'s> SigilResolver<'s> {
    #[must_use]
    pub fn new(store: &'s Store) -> Self {
        SigilResolver { store }
    }

    fn sigils(&self) -> &Sigils {
        &self.store.options().sigils
    }

    /// Resolves the value `raw` being assigned to `key`.
    ///
    /// # Errors
    ///
    /// Returns a not-found error when a compose or dereference target does not
    /// exist, and a malformed-input error when a dereferenced variable is not
    /// a scalar.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use protogroup::{Resolved, SigilResolver, Store};
    ///
    /// let mut store = Store::new();
    /// store.create("db", &["host", "localhost"]).unwrap();
    /// store.set_var("name", "App");
    ///
    /// let resolver = SigilResolver::new(&store);
    /// assert_eq!(resolver.resolve("name", "$name").unwrap(), Resolved::Scalar("App".into()));
    /// match resolver.resolve("database", "%db").unwrap() {
    ///     Resolved::Entries(map) => assert_eq!(map.get("database,host"), Some("localhost")),
    ///     other => panic!("{other:?}"),
    /// }
    /// ```
    pub fn resolve(&self, key: &str, raw: &str) -> Result<Resolved> {
        match self.sigils().classify(raw) {
            Token::Literal(text) => Ok(Resolved::Scalar(text.to_string())),
            Token::Deref(name) => {
                let value = match self.store.var(name) {
                    Some(Variable::Scalar(value)) => value.clone(),
                    Some(_) => {
                        return Err(Error::malformed(format!(
                            "variable '{}' dereferenced for key '{}' is not a scalar",
                            name, key
                        )))
                    }
                    None => return Err(Error::not_found("variable", name)),
                };
                trace!(key, variable = name, "dereferenced");
                Ok(Resolved::Scalar(value))
            }
            Token::Compose(name) => {
                let source = if self.store.exists(name) {
                    self.store.data(name)?
                } else {
                    match self.store.var(name) {
                        Some(Variable::Map(map)) => map.clone(),
                        _ => return Err(Error::not_found("record or mapping", name)),
                    }
                };
                let delimiter = self.store.options().path_delimiter;
                let entries: FlatMap = source
                    .into_iter()
                    .map(|(k, v)| (path::join(key, &k, delimiter), v))
                    .collect();
                trace!(key, source = name, entries = entries.len(), "composed");
                Ok(Resolved::Entries(entries))
            }
        }
    }

    /// Resolves a key or value list at the argument boundary.
    ///
    /// A list made of exactly one pass-by-name token is replaced by the
    /// variable it names: a list variable as is, a scalar variable split on
    /// whitespace. Any other list is returned unchanged apart from escaped
    /// pass-by-name sigils.
    ///
    /// # Errors
    ///
    /// Returns a not-found error for a missing variable and a malformed-input
    /// error for a map variable.
    pub fn resolve_list<S: AsRef<str>>(&self, args: &[S]) -> Result<Vec<String>> {
        if let [only] = args {
            if let Some(name) = self.sigils().by_name_target(only.as_ref()) {
                let list = match self.store.var(name) {
                    Some(Variable::List(items)) => items.clone(),
                    Some(Variable::Scalar(text)) => {
                        text.split_whitespace().map(str::to_string).collect()
                    }
                    Some(Variable::Map(_)) => {
                        return Err(Error::malformed(format!(
                            "variable '{}' passed by name holds a mapping, not a list",
                            name
                        )))
                    }
                    None => return Err(Error::not_found("variable", name)),
                };
                trace!(variable = name, len = list.len(), "passed by name");
                return Ok(list);
            }
        }
        Ok(args
            .iter()
            .map(|a| self.sigils().unescape_by_name(a.as_ref()).to_string())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_classify_edges() {
        let sigils = Sigils::default();
        assert_eq!(sigils.classify("%"), Token::Literal("%"));
        assert_eq!(sigils.classify("%%"), Token::Literal("%"));
        assert_eq!(sigils.classify("50%"), Token::Literal("50%"));
        assert_eq!(sigils.classify(""), Token::Literal(""));
        assert_eq!(sigils.by_name_target("&keys"), Some("keys"));
        assert_eq!(sigils.by_name_target("&&keys"), None);
    }

    #[test]
    fn test_custom_sigils() {
        let sigils = Sigils {
            compose: '*',
            deref: '^',
            by_name: '@',
        };
        assert_eq!(sigils.classify("*db"), Token::Compose("db"));
        assert_eq!(sigils.classify("%db"), Token::Literal("%db"));
        assert_eq!(sigils.classify("^v"), Token::Deref("v"));
    }

    #[test]
    fn test_missing_targets() {
        let store = Store::new();
        let resolver = SigilResolver::new(&store);
        let err = resolver.resolve("k", "%nothing").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("nothing"));
        let err = resolver.resolve("k", "$nothing").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_deref_non_scalar() {
        let mut store = Store::new();
        store.set_var("list", vec!["a", "b"]);
        let err = SigilResolver::new(&store).resolve("k", "$list").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn test_compose_map_variable() {
        let mut store = Store::new();
        let map: FlatMap = [("host", "h"), ("port", "1")].into_iter().collect();
        store.set_var("dbconf", map);
        match SigilResolver::new(&store).resolve("db", "%dbconf").unwrap() {
            Resolved::Entries(entries) => {
                assert_eq!(entries.get("db,host"), Some("h"));
                assert_eq!(entries.get("db,port"), Some("1"));
            }
            other => panic!("expected entries, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_list() {
        let mut store = Store::new();
        store.set_var("keys", vec!["a", "b"]);
        store.set_var("words", "x  y\tz");
        store.set_var("map", FlatMap::new());
        let resolver = SigilResolver::new(&store);

        assert_eq!(resolver.resolve_list(&["&keys"]).unwrap(), vec!["a", "b"]);
        assert_eq!(resolver.resolve_list(&["&words"]).unwrap(), vec!["x", "y", "z"]);
        assert_eq!(resolver.resolve_list(&["&&keys"]).unwrap(), vec!["&keys"]);
        assert_eq!(
            resolver.resolve_list(&["&keys", "c"]).unwrap(),
            vec!["&keys", "c"]
        );
        assert!(resolver.resolve_list(&["&map"]).is_err());
        assert_eq!(
            resolver.resolve_list(&["&gone"]).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }
}
