/// Builds a [`Tree`](crate::Tree) from a JSON-like literal.
///
/// Objects become branches in the order written; every other token becomes a
/// scalar through `ToString`.
///
/// # Examples
///
/// ```rust
/// use protogroup::{tree, Tree};
///
/// let t = tree!({
///     "name": "App",
///     "database": { "host": "localhost", "port": 3306 }
/// });
/// assert_eq!(
///     t.get("database").and_then(|db| db.get("port")),
///     Some(&Tree::from("3306"))
/// );
/// ```
#[macro_export]
macro_rules! tree {
    // Handle empty branch
    ({}) => {
        $crate::Tree::Branch($crate::TreeMap::new())
    };

    // Handle non-empty branch
    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut branch = $crate::TreeMap::new();
        $(
            branch.insert($key.to_string(), $crate::tree!($value));
        )*
        $crate::Tree::Branch(branch)
    }};

    // Anything else is a scalar
    ($s:expr) => {
        $crate::Tree::Scalar(($s).to_string())
    };
}
