//! Live values: the object graphs typedjson flattens and restores.
//!
//! Scalars are plain data. Containers and objects are shared handles: cloning
//! a [`List`] or [`ObjectRef`] clones the handle, so two clones are the same
//! object and survive a flatten/restore round trip as the same object.

use std::cell::{BorrowError, Ref, RefCell, RefMut};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use crate::reflect::{Reflect, TypePath};

pub const NULL_PATH: &str = "typedjson.Null";
pub const BOOL_PATH: &str = "typedjson.Bool";
pub const INT_PATH: &str = "typedjson.Int";
pub const FLOAT_PATH: &str = "typedjson.Float";
pub const STR_PATH: &str = "typedjson.Str";
pub const LIST_PATH: &str = "typedjson.List";
pub const TUPLE_PATH: &str = "typedjson.Tuple";
pub const SET_PATH: &str = "typedjson.Set";
pub const DICT_PATH: &str = "typedjson.Dict";
pub const TYPE_PATH: &str = "typedjson.Type";

/// Type paths of the value kinds; always resolvable as type references.
pub const BUILTIN_TYPE_PATHS: [&str; 10] = [
    NULL_PATH, BOOL_PATH, INT_PATH, FLOAT_PATH, STR_PATH, LIST_PATH, TUPLE_PATH, SET_PATH,
    DICT_PATH, TYPE_PATH,
];

#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(List),
    Tuple(Tuple),
    Set(Set),
    Dict(Dict),
    Object(ObjectRef),
    Type(TypeRef),
}

fn rc_identity<T: ?Sized>(rc: &Rc<T>) -> usize {
    Rc::as_ptr(rc) as *const () as usize
}

impl Value {
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::List(List::from_vec(items.into_iter().map(Into::into).collect()))
    }

    pub fn tuple<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::Tuple(Tuple::new(items.into_iter().map(Into::into).collect()))
    }

    pub fn set<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::Set(Set::from_values(items.into_iter().map(Into::into)))
    }

    pub fn dict<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        let dict = Dict::new();
        for (key, value) in entries {
            dict.insert(key, value);
        }
        Value::Dict(dict)
    }

    pub fn object<T: Reflect>(obj: T) -> Self {
        Value::Object(ObjectRef::new(obj))
    }

    /// Address of the shared allocation behind a container or object.
    /// Scalars and type references have no identity.
    pub fn identity(&self) -> Option<usize> {
        match self {
            Value::List(v) => Some(rc_identity(&v.0)),
            Value::Tuple(v) => Some(rc_identity(&v.0)),
            Value::Set(v) => Some(rc_identity(&v.0)),
            Value::Dict(v) => Some(rc_identity(&v.0)),
            Value::Object(v) => Some(rc_identity(&v.0)),
            _ => None,
        }
    }

    /// Whether both values are handles to the same object.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        matches!((self.identity(), other.identity()), (Some(a), Some(b)) if a == b)
    }

    pub fn type_path(&self) -> &'static str {
        match self {
            Value::Null => NULL_PATH,
            Value::Bool(_) => BOOL_PATH,
            Value::Int(_) => INT_PATH,
            Value::Float(_) => FLOAT_PATH,
            Value::Str(_) => STR_PATH,
            Value::List(_) => LIST_PATH,
            Value::Tuple(_) => TUPLE_PATH,
            Value::Set(_) => SET_PATH,
            Value::Dict(_) => DICT_PATH,
            Value::Object(obj) => obj.type_path(),
            Value::Type(_) => TYPE_PATH,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&Tuple> {
        match self {
            Value::Tuple(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&Set> {
        match self {
            Value::Set(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&TypeRef> {
        match self {
            Value::Type(t) => Some(t),
            _ => None,
        }
    }
}

// -----------------------------------------------------------------------------
// Containers

/// Ordered, growable sequence.
#[derive(Clone, Default)]
pub struct List(Rc<RefCell<Vec<Value>>>);

impl List {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(items: Vec<Value>) -> Self {
        Self(Rc::new(RefCell::new(items)))
    }

    pub fn push(&self, value: impl Into<Value>) {
        self.0.borrow_mut().push(value.into());
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.borrow().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn borrow(&self) -> Ref<'_, Vec<Value>> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Vec<Value>> {
        self.0.borrow_mut()
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.0.borrow().clone()
    }

    pub fn ptr_eq(&self, other: &List) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Fixed-arity ordered sequence. Elements are set once, at construction.
#[derive(Clone)]
pub struct Tuple(Rc<RefCell<Vec<Value>>>);

impl Tuple {
    pub fn new(items: Vec<Value>) -> Self {
        Self(Rc::new(RefCell::new(items)))
    }

    /// An empty tuple registered before its elements are restored, so that
    /// elements may refer back to it.
    pub(crate) fn placeholder() -> Self {
        Self::new(Vec::new())
    }

    pub(crate) fn fill(&self, items: Vec<Value>) {
        *self.0.borrow_mut() = items;
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.borrow().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn items(&self) -> Ref<'_, [Value]> {
        Ref::map(self.0.borrow(), Vec::as_slice)
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.0.borrow().clone()
    }

    pub fn ptr_eq(&self, other: &Tuple) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Unordered collection without duplicates. Members keep insertion order
/// internally; equality ignores it.
#[derive(Clone, Default)]
pub struct Set(Rc<RefCell<Vec<Value>>>);

impl Set {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
        let set = Self::new();
        for value in values {
            set.insert(value);
        }
        set
    }

    /// Adds `value` unless an equal member exists. Returns whether it was added.
    pub fn insert(&self, value: impl Into<Value>) -> bool {
        let value = value.into();
        if self.contains(&value) {
            return false;
        }
        self.0.borrow_mut().push(value);
        true
    }

    /// Appends `value` without comparing it to existing members. Restored
    /// members are distinct by identity even while they are half built.
    pub(crate) fn push_distinct(&self, value: Value) {
        self.0.borrow_mut().push(value);
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.0.borrow().iter().any(|member| member == value)
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn borrow(&self) -> Ref<'_, Vec<Value>> {
        self.0.borrow()
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.0.borrow().clone()
    }

    pub fn ptr_eq(&self, other: &Set) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Insertion-ordered association of arbitrary keys to values.
#[derive(Clone, Default)]
pub struct Dict(Rc<RefCell<Vec<(Value, Value)>>>);

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the entry whose key equals `key`, returning the
    /// previous value. A replaced entry keeps its position.
    pub fn insert(&self, key: impl Into<Value>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        // Keys may reach back into this dict, so compare under a shared borrow.
        let position = self.0.borrow().iter().position(|(k, _)| *k == key);
        let mut entries = self.0.borrow_mut();
        match position {
            Some(index) => Some(std::mem::replace(&mut entries[index].1, value)),
            None => {
                entries.push((key, value));
                None
            }
        }
    }

    /// Value under the string key `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0
            .borrow()
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v.clone())
    }

    pub fn get_value(&self, key: &Value) -> Option<Value> {
        self.0
            .borrow()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> Vec<Value> {
        self.0.borrow().iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn entries(&self) -> Ref<'_, Vec<(Value, Value)>> {
        self.0.borrow()
    }

    pub fn ptr_eq(&self, other: &Dict) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

// -----------------------------------------------------------------------------
// Objects and type references

/// Shared handle to an instance of a [`Reflect`] type.
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<dyn Reflect>>);

impl ObjectRef {
    pub fn new<T: Reflect>(obj: T) -> Self {
        Self(Rc::new(RefCell::new(obj)))
    }

    pub fn type_path(&self) -> &'static str {
        self.0.borrow().reflect_type_path()
    }

    pub fn borrow(&self) -> Ref<'_, dyn Reflect> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, dyn Reflect> {
        self.0.borrow_mut()
    }

    pub fn try_borrow(&self) -> Result<Ref<'_, dyn Reflect>, BorrowError> {
        self.0.try_borrow()
    }

    pub fn is<T: Reflect>(&self) -> bool {
        self.0.borrow().as_any().is::<T>()
    }

    pub fn downcast_ref<T: Reflect>(&self) -> Option<Ref<'_, T>> {
        Ref::filter_map(self.0.borrow(), |obj| obj.as_any().downcast_ref::<T>()).ok()
    }

    pub fn downcast_mut<T: Reflect>(&self) -> Option<RefMut<'_, T>> {
        RefMut::filter_map(self.0.borrow_mut(), |obj| obj.as_any_mut().downcast_mut::<T>()).ok()
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// A reference to a type itself, by dotted path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    path: String,
}

impl TypeRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn of<T: TypePath>() -> Self {
        Self::new(T::type_path())
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

// -----------------------------------------------------------------------------
// Conversions

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i.into())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i.into())
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(List::from_vec(items))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

macro_rules! value_from_handle {
    ($($ty:ident),*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$ty(v)
                }
            }
        )*
    };
}

value_from_handle!(List, Tuple, Set, Dict);

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

impl From<TypeRef> for Value {
    fn from(ty: TypeRef) -> Self {
        Value::Type(ty)
    }
}

// -----------------------------------------------------------------------------
// Equality

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        eq_in(self, other, &mut HashSet::new())
    }
}

macro_rules! handle_eq {
    ($($ty:ident),*) => {
        $(
            impl PartialEq for $ty {
                fn eq(&self, other: &Self) -> bool {
                    Value::$ty(self.clone()) == Value::$ty(other.clone())
                }
            }
        )*
    };
}

handle_eq!(List, Tuple, Set, Dict);

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        Value::Object(self.clone()) == Value::Object(other.clone())
    }
}

/// Structural equality. A pair of handles already under comparison counts
/// as equal, which keeps cyclic graphs finite.
fn eq_in(a: &Value, b: &Value, seen: &mut HashSet<(usize, usize)>) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Type(x), Value::Type(y)) => x == y,
        _ => {
            let (Some(ia), Some(ib)) = (a.identity(), b.identity()) else {
                return false;
            };
            if ia == ib {
                return true;
            }
            if !seen.insert((ia, ib)) {
                return true;
            }
            match (a, b) {
                (Value::List(x), Value::List(y)) => seq_eq(&x.borrow(), &y.borrow(), seen),
                (Value::Tuple(x), Value::Tuple(y)) => seq_eq(&x.items(), &y.items(), seen),
                (Value::Set(x), Value::Set(y)) => {
                    let (x, y) = (x.borrow(), y.borrow());
                    x.len() == y.len()
                        && x.iter().all(|m| y.iter().any(|n| eq_in(m, n, seen)))
                }
                (Value::Dict(x), Value::Dict(y)) => {
                    let (x, y) = (x.entries(), y.entries());
                    x.len() == y.len()
                        && x.iter().all(|(k, v)| {
                            y.iter()
                                .find(|(k2, _)| eq_in(k, k2, seen))
                                .is_some_and(|(_, v2)| eq_in(v, v2, seen))
                        })
                }
                (Value::Object(x), Value::Object(y)) => object_eq(x, y, seen),
                _ => false,
            }
        }
    }
}

fn seq_eq(a: &[Value], b: &[Value], seen: &mut HashSet<(usize, usize)>) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| eq_in(x, y, seen))
}

fn object_eq(a: &ObjectRef, b: &ObjectRef, seen: &mut HashSet<(usize, usize)>) -> bool {
    if a.type_path() != b.type_path() {
        return false;
    }
    let (a_items, b_items) = (container_value(a), container_value(b));
    match (&a_items, &b_items) {
        (Some(x), Some(y)) if !eq_in(x, y, seen) => return false,
        (Some(_), None) | (None, Some(_)) => return false,
        _ => {}
    }
    let (a_attrs, b_attrs) = (a.borrow().attributes(), b.borrow().attributes());
    if a_attrs.len() != b_attrs.len() {
        return false;
    }
    let attrs_eq = a_attrs
        .iter()
        .zip(&b_attrs)
        .all(|((ka, va), (kb, vb))| ka == kb && eq_in(va, vb, seen));
    if !attrs_eq {
        return false;
    }
    let (a_state, b_state) = (a.borrow().state(), b.borrow().state());
    match (a_state, b_state) {
        (Some(x), Some(y)) => eq_in(&x, &y, seen),
        (None, None) => true,
        _ => false,
    }
}

fn container_value(obj: &ObjectRef) -> Option<Value> {
    obj.borrow().container().map(Value::from)
}

// -----------------------------------------------------------------------------
// Debug

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::repr::repr_or_fallback(self))
    }
}

macro_rules! handle_debug {
    ($($ty:ident),*) => {
        $(
            impl fmt::Debug for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    fmt::Debug::fmt(&Value::$ty(self.clone()), f)
                }
            }
        )*
    };
}

handle_debug!(List, Tuple, Set, Dict);

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({})", self.type_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_identity() {
        let list = Value::list([1, 2]);
        let alias = list.clone();
        assert!(list.ptr_eq(&alias));
        alias.as_list().unwrap().push(3);
        assert_eq!(list.as_list().unwrap().len(), 3);

        let copy = Value::list([1, 2, 3]);
        assert_eq!(list, copy);
        assert!(!list.ptr_eq(&copy));
    }

    #[test]
    fn scalars_have_no_identity() {
        assert_eq!(Value::Null.identity(), None);
        assert_eq!(Value::from("a").identity(), None);
        assert_eq!(Value::Type(TypeRef::new("a.B")).identity(), None);
        assert!(!Value::Int(1).ptr_eq(&Value::Int(1)));
    }

    #[test]
    fn set_ignores_order_and_duplicates() {
        let a = Value::set([1, 2, 3, 2]);
        let b = Value::set([3, 1, 2]);
        assert_eq!(a.as_set().unwrap().len(), 3);
        assert_eq!(a, b);
        assert_ne!(a, Value::set([1, 2]));
    }

    #[test]
    fn dict_insert_replaces_in_place() {
        let dict = Dict::new();
        assert_eq!(dict.insert("a", 1), None);
        dict.insert("b", 2);
        assert_eq!(dict.insert("a", 10), Some(Value::Int(1)));
        assert_eq!(dict.keys(), vec![Value::from("a"), Value::from("b")]);
        assert_eq!(dict.get("a"), Some(Value::Int(10)));
        assert_eq!(dict.get_value(&Value::Int(1)), None);
    }

    #[test]
    fn list_and_tuple_are_distinct() {
        assert_ne!(Value::list([1, 2]), Value::tuple([1, 2]));
        assert_eq!(Value::tuple([1, 2]), Value::tuple([1, 2]));
        assert_ne!(Value::Int(1), Value::Float(1.0));
    }

    #[test]
    fn cyclic_lists_compare_without_looping() {
        let a = List::new();
        a.push(1);
        a.push(a.clone());
        let b = List::new();
        b.push(1);
        b.push(b.clone());
        assert_eq!(Value::List(a.clone()), Value::List(b));
        assert_eq!(format!("{:?}", Value::List(a)), "[1, [...]]");
    }

    #[test]
    fn tuple_placeholder_is_filled_in_place() {
        let tuple = Tuple::placeholder();
        let alias = tuple.clone();
        tuple.fill(vec![Value::Int(4), Value::Int(16)]);
        assert_eq!(alias.to_vec(), vec![Value::Int(4), Value::Int(16)]);
        assert_eq!(alias.get(1), Some(Value::Int(16)));
    }

    #[test]
    fn dict_keys_may_contain_the_dict() {
        let dict = Dict::new();
        dict.insert(Value::tuple([Value::Dict(dict.clone())]), 1);
        let previous = dict.insert(Value::tuple([Value::Dict(dict.clone())]), 2);
        assert_eq!(previous, Some(Value::Int(1)));
        assert_eq!(dict.len(), 1);
    }
}
