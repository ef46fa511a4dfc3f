//! Pure tree-manipulation helpers
//!
//! The document tree is a `serde_json::Value` whose branches are JSON
//! objects. These functions implement the navigation and mutation rules the
//! engine builds on: intermediate objects materialize on demand, a write
//! through an existing scalar converts it to a branch, and removals of
//! missing nodes are no-ops.

use crate::store::path::TreePath;
use serde_json::{Map, Value};

/// Resolve a path to a node, if present
pub fn get_at<'a>(root: &'a Value, path: &TreePath) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.segments() {
        current = current.as_object()?.get(segment.as_str())?;
    }
    Some(current)
}

/// Replace the subtree at `path` with `value`
///
/// Missing intermediate nodes are created; scalar intermediates are
/// overwritten with objects.
pub fn set_at(root: &mut Value, path: &TreePath, value: Value) {
    set_segments(root, path.segments(), value);
}

fn set_segments(node: &mut Value, segments: &[String], value: Value) {
    match segments.split_first() {
        None => *node = value,
        Some((head, rest)) => {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            if let Value::Object(map) = node {
                set_segments(map.entry(head.as_str()).or_insert(Value::Null), rest, value);
            }
        }
    }
}

/// Remove the subtree at `path`
///
/// Returns whether anything was removed. Removing the root resets the tree
/// to an empty object.
pub fn remove_at(root: &mut Value, path: &TreePath) -> bool {
    let segments = path.segments();
    if segments.is_empty() {
        let was_empty = root
            .as_object()
            .map(|map| map.is_empty())
            .unwrap_or(false);
        *root = Value::Object(Map::new());
        return !was_empty;
    }

    let mut current = root;
    for segment in &segments[..segments.len() - 1] {
        match current {
            Value::Object(map) => match map.get_mut(segment.as_str()) {
                Some(next) => current = next,
                None => return false,
            },
            _ => return false,
        }
    }

    match current {
        Value::Object(map) => map.remove(segments[segments.len() - 1].as_str()).is_some(),
        _ => false,
    }
}

/// Merge `fields` into the object at `path`, one level deep
///
/// Null-valued fields remove the corresponding child. Returns the applied
/// changes as `(key, new_value)` pairs, `None` marking a removal; removals
/// of keys that were not present are skipped.
pub fn merge_at(
    root: &mut Value,
    path: &TreePath,
    fields: &Map<String, Value>,
) -> Vec<(String, Option<Value>)> {
    let mut changes = Vec::new();
    merge_segments(root, path.segments(), fields, &mut changes);
    changes
}

fn merge_segments(
    node: &mut Value,
    segments: &[String],
    fields: &Map<String, Value>,
    changes: &mut Vec<(String, Option<Value>)>,
) {
    match segments.split_first() {
        None => {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            if let Value::Object(map) = node {
                for (key, value) in fields {
                    if value.is_null() {
                        if map.remove(key).is_some() {
                            changes.push((key.clone(), None));
                        }
                    } else {
                        map.insert(key.clone(), value.clone());
                        changes.push((key.clone(), Some(value.clone())));
                    }
                }
            }
        }
        Some((head, rest)) => {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            if let Value::Object(map) = node {
                merge_segments(
                    map.entry(head.as_str()).or_insert(Value::Null),
                    rest,
                    fields,
                    changes,
                );
            }
        }
    }
}

/// Count scalar leaves under a node
pub fn count_leaves(node: &Value) -> u64 {
    match node {
        Value::Object(map) => map.values().map(count_leaves).sum(),
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(raw: &str) -> TreePath {
        TreePath::parse(raw).unwrap()
    }

    #[test]
    fn test_set_creates_intermediates() {
        let mut root = json!({});
        set_at(&mut root, &path("accounts/u1/posts/p1"), json!({"text": "hi"}));

        assert_eq!(
            root,
            json!({"accounts": {"u1": {"posts": {"p1": {"text": "hi"}}}}})
        );
    }

    #[test]
    fn test_set_converts_scalar_to_branch() {
        let mut root = json!({"counter": 5});
        set_at(&mut root, &path("counter/nested"), json!(true));

        assert_eq!(root, json!({"counter": {"nested": true}}));
    }

    #[test]
    fn test_set_replaces_whole_subtree() {
        let mut root = json!({"a": {"b": 1, "c": 2}});
        set_at(&mut root, &path("a"), json!({"d": 3}));

        assert_eq!(root, json!({"a": {"d": 3}}));
    }

    #[test]
    fn test_get_missing_is_none() {
        let root = json!({"a": {"b": 1}});
        assert_eq!(get_at(&root, &path("a/b")), Some(&json!(1)));
        assert_eq!(get_at(&root, &path("a/x")), None);
        assert_eq!(get_at(&root, &path("a/b/deeper")), None);
    }

    #[test]
    fn test_remove() {
        let mut root = json!({"a": {"b": 1, "c": 2}});

        assert!(remove_at(&mut root, &path("a/b")));
        assert_eq!(root, json!({"a": {"c": 2}}));

        // Removing a missing node is a no-op
        assert!(!remove_at(&mut root, &path("a/b")));
        assert!(!remove_at(&mut root, &path("x/y/z")));
    }

    #[test]
    fn test_remove_root_clears_tree() {
        let mut root = json!({"a": 1});
        assert!(remove_at(&mut root, &TreePath::root()));
        assert_eq!(root, json!({}));
        assert!(!remove_at(&mut root, &TreePath::root()));
    }

    #[test]
    fn test_merge_one_level() {
        let mut root = json!({"profile": {"name": "ada", "online": true}});

        let mut fields = Map::new();
        fields.insert("online".to_string(), json!(false));
        fields.insert("name".to_string(), Value::Null);
        fields.insert("missing".to_string(), Value::Null);

        let changes = merge_at(&mut root, &path("profile"), &fields);

        assert_eq!(root, json!({"profile": {"online": false}}));
        // The removal of a key that was never present is not reported
        assert_eq!(changes.len(), 2);
        assert!(changes.contains(&("online".to_string(), Some(json!(false)))));
        assert!(changes.contains(&("name".to_string(), None)));
    }

    #[test]
    fn test_merge_materializes_object() {
        let mut root = json!({});
        let mut fields = Map::new();
        fields.insert("x".to_string(), json!(1));

        merge_at(&mut root, &path("a/b"), &fields);
        assert_eq!(root, json!({"a": {"b": {"x": 1}}}));
    }

    #[test]
    fn test_count_leaves() {
        assert_eq!(count_leaves(&json!({})), 0);
        assert_eq!(count_leaves(&json!(7)), 1);
        assert_eq!(count_leaves(&json!({"a": {"b": 1, "c": 2}, "d": 3})), 3);
    }
}
