//! Reserved mapping keys that mark flattened shapes.
//!
//! A plain mapping whose own key equals one of these strings is ambiguous on
//! restore; tags win.

/// Dotted type path of an instance.
pub const OBJECT: &str = "tj/object";
/// Sequence payload of a sequence or set subtype.
pub const SEQ: &str = "tj/seq";
/// Members of an unordered set.
pub const SET: &str = "tj/set";
/// Elements of a fixed-arity tuple.
pub const TUPLE: &str = "tj/tuple";
/// Reference to a type (not an instance).
pub const TYPE: &str = "tj/type";
/// Captured state of an instance with a state hook.
pub const STATE: &str = "tj/state";
/// Back-reference to an already flattened value, by memo index.
pub const ID: &str = "tj/id";
/// Textual representation written by a repr handler.
pub const REPR: &str = "tj/repr";

pub const RESERVED: [&str; 8] = [OBJECT, SEQ, SET, TUPLE, TYPE, STATE, ID, REPR];

pub fn is_tag(key: &str) -> bool {
    RESERVED.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn tags_are_distinct() {
        let unique: HashSet<_> = RESERVED.iter().collect();
        assert_eq!(unique.len(), RESERVED.len());
    }

    #[test]
    fn is_tag_matrix() {
        assert!(is_tag(OBJECT));
        assert!(is_tag("tj/id"));
        assert!(!is_tag("name"));
        assert!(!is_tag("tj/"));
        assert!(!is_tag("TJ/OBJECT"));
    }
}
