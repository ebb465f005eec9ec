use protogroup::{flatten, tree, Tree, TreeMap};

#[test]
fn test_tree_macro_scalars() {
    assert_eq!(tree!("hello world"), Tree::Scalar("hello world".to_string()));
    assert_eq!(tree!(""), Tree::Scalar(String::new()));
    assert_eq!(tree!(42), Tree::Scalar("42".to_string()));
    assert_eq!(tree!(-7), Tree::Scalar("-7".to_string()));
    assert_eq!(tree!(2.5), Tree::Scalar("2.5".to_string()));
    assert_eq!(tree!(false), Tree::Scalar("false".to_string()));
}

#[test]
fn test_tree_macro_expressions() {
    let port = 3306;
    let host = String::from("localhost");
    let t = tree!({ "host": (host.clone()), "port": port });
    assert_eq!(t.get("host").and_then(Tree::as_str), Some("localhost"));
    assert_eq!(t.get("port").and_then(Tree::as_str), Some("3306"));
}

#[test]
fn test_tree_macro_empty_branch() {
    assert_eq!(tree!({}), Tree::Branch(TreeMap::new()));
    assert_eq!(tree!({}), Tree::default());
}

#[test]
fn test_tree_macro_nested() {
    let t = tree!({
        "name": "App",
        "database": {
            "host": "localhost",
            "auth": { "user": "root" }
        },
    });

    let mut auth = TreeMap::new();
    auth.insert("user".to_string(), Tree::from("root"));
    let mut database = TreeMap::new();
    database.insert("host".to_string(), Tree::from("localhost"));
    database.insert("auth".to_string(), Tree::Branch(auth));
    let mut root = TreeMap::new();
    root.insert("name".to_string(), Tree::from("App"));
    root.insert("database".to_string(), Tree::Branch(database));

    assert_eq!(t, Tree::Branch(root));
}

#[test]
fn test_tree_macro_preserves_order() {
    let t = tree!({ "z": "1", "a": "2", "m": "3" });
    let keys: Vec<_> = t.as_branch().unwrap().keys().cloned().collect();
    assert_eq!(keys, vec!["z", "a", "m"]);

    let flat = flatten(&t, ',').unwrap();
    let flat_keys: Vec<_> = flat.keys().cloned().collect();
    assert_eq!(flat_keys, vec!["z", "a", "m"]);
}
