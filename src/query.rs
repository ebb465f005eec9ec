//! Read-side helpers over a record's flat data.

use crate::store::{RecordId, Store};
use crate::{Error, MissingSuffix, OrderOptions, Result, SuffixMatch};
use tracing::debug;

impl Store {
    /// Copies every data field of `source` whose key starts with `prefix` into
    /// a record named `out`.
    ///
    /// Keys are copied unchanged and operations are left behind. A prefix that
    /// matches nothing still creates `out`, empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use protogroup::Store;
    ///
    /// let mut store = Store::new();
    /// store.create("app", &["name", "App", "db,host", "h", "db,port", "1"]).unwrap();
    /// store.get_subgroup("db_only", "app", "db,").unwrap();
    /// assert_eq!(store.keys("db_only").unwrap(), vec!["db,host", "db,port"]);
    /// ```
    pub fn get_subgroup(&mut self, out: &str, source: &str, prefix: &str) -> Result<RecordId> {
        let data = self.data(source)?.with_prefix(prefix);
        let fields = data.len();
        let id = self.create_from_flat(out, data)?;
        debug!(record = out, source, prefix, fields, "extracted subgroup");
        Ok(id)
    }

    /// Returns values of `name` in the order given by `suffixes`.
    ///
    /// For each suffix the first key in insertion order that matches it
    /// contributes its value. [`OrderOptions`] chooses between substring and
    /// trailing-segment matching and whether an unmatched suffix is skipped or
    /// an error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use protogroup::{OrderOptions, Store};
    ///
    /// let mut store = Store::new();
    /// store.create("addr", &["city", "Oslo", "street", "Main St", "zip", "0150"]).unwrap();
    /// let values = store
    ///     .order_values("addr", &["street", "zip", "country", "city"], &OrderOptions::new())
    ///     .unwrap();
    /// assert_eq!(values, vec!["Main St", "0150", "Oslo"]);
    /// ```
    pub fn order_values<S: AsRef<str>>(
        &self,
        name: &str,
        suffixes: &[S],
        options: &OrderOptions,
    ) -> Result<Vec<String>> {
        let data = self.data(name)?;
        let delimiter = self.delimiter();
        let mut values = Vec::with_capacity(suffixes.len());
        for suffix in suffixes {
            let suffix = suffix.as_ref();
            let found = data.iter().find(|(key, _)| match options.matching {
                SuffixMatch::Substring => key.contains(suffix),
                SuffixMatch::Segment => {
                    key.as_str() == suffix
                        || key
                            .strip_suffix(suffix)
                            .is_some_and(|rest| rest.ends_with(delimiter))
                }
            });
            match (found, options.missing) {
                (Some((_, value)), _) => values.push(value.clone()),
                (None, MissingSuffix::Skip) => {}
                (None, MissingSuffix::Error) => {
                    return Err(Error::not_found("key matching suffix", suffix));
                }
            }
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, Operation};

    fn address_store() -> Store {
        let mut store = Store::new();
        store
            .create(
                "addr",
                &["home,street", "Main St", "home,city", "Oslo", "cityhall", "yes"],
            )
            .unwrap();
        store
    }

    #[test]
    fn test_subgroup_empty_and_operations() {
        let mut store = address_store();
        store
            .define_operation("addr", "home,op", Operation::new(|_, _, _| Ok(String::new())))
            .unwrap();
        store.get_subgroup("home", "addr", "home,").unwrap();
        assert_eq!(store.keys("home").unwrap(), vec!["home,street", "home,city"]);
        assert!(store.record("home").unwrap().field("home,op").is_none());

        store.get_subgroup("none", "addr", "zzz").unwrap();
        assert!(store.exists("none"));
        assert!(store.data("none").unwrap().is_empty());

        let err = store.get_subgroup("x", "ghost", "").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_substring_takes_first_in_insertion_order() {
        let store = address_store();
        let values = store
            .order_values("addr", &["city"], &OrderOptions::new())
            .unwrap();
        assert_eq!(values, vec!["Oslo"]);
    }

    #[test]
    fn test_segment_matching() {
        let store = address_store();
        let options = OrderOptions::new().with_matching(SuffixMatch::Segment);
        let values = store
            .order_values("addr", &["hall", "cityhall", "city"], &options)
            .unwrap();
        assert_eq!(values, vec!["yes", "Oslo"]);
    }

    #[test]
    fn test_strict_missing() {
        let store = address_store();
        let err = store
            .order_values("addr", &["street", "country"], &OrderOptions::strict())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("country"));
    }
}
