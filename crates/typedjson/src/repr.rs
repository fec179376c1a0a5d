//! Textual representations of live values.
//!
//! Used wherever a value has to become a single string: non-string mapping
//! keys, values cut off by the depth limit, and cycles in lossy output.

use std::collections::HashSet;

use crate::reflect::ReprError;
use crate::value::Value;

pub fn repr(value: &Value) -> Result<String, ReprError> {
    let mut out = String::new();
    write_repr(value, &mut out, &mut HashSet::new())?;
    Ok(out)
}

/// [`repr`], or [`fallback_text`] when the representation fails.
pub fn repr_or_fallback(value: &Value) -> String {
    repr(value).unwrap_or_else(|_| fallback_text(value, None))
}

/// Substitute text for a value that cannot represent itself: the type path
/// plus, when given, an identity token.
pub fn fallback_text(value: &Value, token: Option<usize>) -> String {
    match token {
        Some(token) => format!("<{} object #{token}>", value.type_path()),
        None => format!("<{} object>", value.type_path()),
    }
}

/// Text used for a mapping key: strings as-is, anything else via [`repr`].
pub fn key_text(key: &Value) -> Result<String, ReprError> {
    match key {
        Value::Str(s) => Ok(s.clone()),
        other => repr(other),
    }
}

fn write_repr(value: &Value, out: &mut String, active: &mut HashSet<usize>) -> Result<(), ReprError> {
    let id = match value {
        Value::Null => {
            out.push_str("null");
            return Ok(());
        }
        Value::Bool(b) => {
            out.push_str(if *b { "true" } else { "false" });
            return Ok(());
        }
        Value::Int(i) => {
            out.push_str(&i.to_string());
            return Ok(());
        }
        Value::Float(f) => {
            out.push_str(&format!("{f:?}"));
            return Ok(());
        }
        Value::Str(s) => {
            out.push_str(&format!("{s:?}"));
            return Ok(());
        }
        Value::Type(ty) => {
            out.push_str(&format!("<type '{}'>", ty.path()));
            return Ok(());
        }
        Value::Object(obj) => {
            let text = match obj.try_borrow() {
                Ok(obj) => obj.repr()?,
                Err(err) => return Err(ReprError::new(obj_path(value), err.to_string())),
            };
            out.push_str(&text);
            return Ok(());
        }
        // Only containers reach this point.
        other => other.identity().unwrap_or_default(),
    };

    if !active.insert(id) {
        out.push_str(match value {
            Value::Tuple(_) => "(...)",
            Value::Set(_) | Value::Dict(_) => "{...}",
            _ => "[...]",
        });
        return Ok(());
    }
    let result = write_container(value, out, active);
    active.remove(&id);
    result
}

fn write_container(
    value: &Value,
    out: &mut String,
    active: &mut HashSet<usize>,
) -> Result<(), ReprError> {
    match value {
        Value::List(list) => {
            out.push('[');
            write_items(&list.to_vec(), out, active)?;
            out.push(']');
        }
        Value::Tuple(tuple) => {
            let items = tuple.to_vec();
            out.push('(');
            write_items(&items, out, active)?;
            if items.len() == 1 {
                out.push(',');
            }
            out.push(')');
        }
        Value::Set(set) => {
            let members = set.to_vec();
            if members.is_empty() {
                out.push_str("set()");
            } else {
                out.push('{');
                write_items(&members, out, active)?;
                out.push('}');
            }
        }
        Value::Dict(dict) => {
            let entries = dict.entries().clone();
            out.push('{');
            for (i, (k, v)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_repr(k, out, active)?;
                out.push_str(": ");
                write_repr(v, out, active)?;
            }
            out.push('}');
        }
        _ => {}
    }
    Ok(())
}

fn write_items(items: &[Value], out: &mut String, active: &mut HashSet<usize>) -> Result<(), ReprError> {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_repr(item, out, active)?;
    }
    Ok(())
}

fn obj_path(value: &Value) -> String {
    match value {
        // An object that is mutably borrowed cannot be asked for its path either.
        Value::Object(_) => "object".to_owned(),
        other => other.type_path().to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{List, TypeRef};

    #[test]
    fn scalar_matrix() {
        assert_eq!(repr(&Value::Null).unwrap(), "null");
        assert_eq!(repr(&Value::Bool(true)).unwrap(), "true");
        assert_eq!(repr(&Value::Int(-3)).unwrap(), "-3");
        assert_eq!(repr(&Value::Float(2.0)).unwrap(), "2.0");
        assert_eq!(repr(&Value::from("a\"b")).unwrap(), r#""a\"b""#);
        assert_eq!(
            repr(&Value::Type(TypeRef::new("samples.Thing"))).unwrap(),
            "<type 'samples.Thing'>"
        );
    }

    #[test]
    fn container_matrix() {
        assert_eq!(repr(&Value::tuple([1, 2])).unwrap(), "(1, 2)");
        assert_eq!(repr(&Value::tuple([4])).unwrap(), "(4,)");
        assert_eq!(repr(&Value::list(["x"])).unwrap(), r#"["x"]"#);
        assert_eq!(repr(&Value::set(Vec::<Value>::new())).unwrap(), "set()");
        assert_eq!(repr(&Value::set([1])).unwrap(), "{1}");
        assert_eq!(
            repr(&Value::dict([(Value::Int(1), Value::list([true]))])).unwrap(),
            "{1: [true]}"
        );
    }

    #[test]
    fn key_text_passes_strings_through() {
        assert_eq!(key_text(&Value::from("plain")).unwrap(), "plain");
        assert_eq!(key_text(&Value::tuple([1, 2])).unwrap(), "(1, 2)");
        assert_eq!(key_text(&Value::Int(7)).unwrap(), "7");
    }

    #[test]
    fn repeated_but_acyclic_is_not_marked() {
        let shared = Value::list([1]);
        let outer = Value::list([shared.clone(), shared]);
        assert_eq!(repr(&outer).unwrap(), "[[1], [1]]");

        let cyclic = List::new();
        cyclic.push(cyclic.clone());
        assert_eq!(repr(&Value::List(cyclic)).unwrap(), "[[...]]");
    }

    #[test]
    fn fallback_text_matrix() {
        assert_eq!(fallback_text(&Value::list([1]), Some(3)), "<typedjson.List object #3>");
        assert_eq!(fallback_text(&Value::Int(1), None), "<typedjson.Int object>");
    }
}
