//! Restoration engine: tagged [`FlatValue`] tree → live [`Value`] graph.
//!
//! Memo slots are taken in the same pre-order the pickler assigned them: a
//! container or instance is recorded before any of its parts is restored,
//! so a `{"tj/id": n}` inside those parts already resolves to it.

use serde_json::Map;

use crate::error::{Error, Result};
use crate::handlers::HandlerRegistry;
use crate::reflect::Container;
use crate::registry::TypeRegistry;
use crate::tags;
use crate::value::{Dict, List, Set, Tuple, TypeRef, Value};
use crate::FlatValue;

/// One restore call's worth of state. Build one unpickler per in-flight call.
pub struct Unpickler {
    types: TypeRegistry,
    handlers: HandlerRegistry,
    memo: Vec<Value>,
}

impl Unpickler {
    pub fn new(types: TypeRegistry, handlers: HandlerRegistry) -> Self {
        Self {
            types,
            handlers,
            memo: Vec::new(),
        }
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn reset(&mut self) {
        self.memo.clear();
    }

    /// Restores `flat` with a fresh memo.
    pub fn restore(&mut self, flat: &FlatValue) -> Result<Value> {
        self.reset();
        let value = self.restore_child(flat);
        self.reset();
        value
    }

    /// Restores a node nested inside the one currently being restored,
    /// sharing the memo. Handlers call this for their children.
    pub fn restore_child(&mut self, flat: &FlatValue) -> Result<Value> {
        Ok(match flat {
            FlatValue::Null => Value::Null,
            FlatValue::Bool(b) => Value::Bool(*b),
            FlatValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            FlatValue::String(s) => Value::Str(s.clone()),
            FlatValue::Array(items) => self.restore_list(items)?,
            FlatValue::Object(data) => self.restore_mapping(data)?,
        })
    }

    fn restore_mapping(&mut self, data: &Map<String, FlatValue>) -> Result<Value> {
        if let Some(index) = data.get(tags::ID) {
            return self.restore_reference(index);
        }
        if let Some(path) = data.get(tags::TYPE) {
            return self.restore_type(path);
        }
        if let Some(path) = data.get(tags::OBJECT) {
            return self.restore_object(path, data);
        }
        if let Some(items) = data.get(tags::TUPLE) {
            return self.restore_tuple(items);
        }
        if let Some(items) = data.get(tags::SET) {
            return self.restore_set(items);
        }
        self.restore_dict(data)
    }

    fn restore_reference(&self, index: &FlatValue) -> Result<Value> {
        let index = index
            .as_u64()
            .ok_or_else(|| Error::malformed(tags::ID, "expected a non-negative integer"))?;
        let index = usize::try_from(index).map_err(|_| Error::DanglingReference(usize::MAX))?;
        self.memo
            .get(index)
            .cloned()
            .ok_or(Error::DanglingReference(index))
    }

    fn restore_type(&self, path: &FlatValue) -> Result<Value> {
        let path = path
            .as_str()
            .ok_or_else(|| Error::malformed(tags::TYPE, "expected a dotted path"))?;
        let registration = self.types.resolve(path)?;
        Ok(Value::Type(TypeRef::new(registration.path())))
    }

    fn restore_list(&mut self, items: &[FlatValue]) -> Result<Value> {
        let list = List::new();
        self.memo.push(Value::List(list.clone()));
        for item in items {
            let value = self.restore_child(item)?;
            list.push(value);
        }
        Ok(Value::List(list))
    }

    fn restore_tuple(&mut self, items: &FlatValue) -> Result<Value> {
        let items = tagged_array(tags::TUPLE, items)?;
        let tuple = Tuple::placeholder();
        self.memo.push(Value::Tuple(tuple.clone()));
        let values = items
            .iter()
            .map(|item| self.restore_child(item))
            .collect::<Result<Vec<_>>>()?;
        tuple.fill(values);
        Ok(Value::Tuple(tuple))
    }

    fn restore_set(&mut self, items: &FlatValue) -> Result<Value> {
        let items = tagged_array(tags::SET, items)?;
        let set = Set::new();
        self.memo.push(Value::Set(set.clone()));
        for item in items {
            let value = self.restore_child(item)?;
            set.push_distinct(value);
        }
        Ok(Value::Set(set))
    }

    fn restore_dict(&mut self, data: &Map<String, FlatValue>) -> Result<Value> {
        let dict = Dict::new();
        self.memo.push(Value::Dict(dict.clone()));
        self.restore_entries(&dict, data)?;
        Ok(Value::Dict(dict))
    }

    fn restore_entries(&mut self, dict: &Dict, data: &Map<String, FlatValue>) -> Result<()> {
        for (key, flat) in data {
            let value = self.restore_child(flat)?;
            dict.insert(key.as_str(), value);
        }
        Ok(())
    }

    fn restore_object(&mut self, path: &FlatValue, data: &Map<String, FlatValue>) -> Result<Value> {
        let path = path
            .as_str()
            .ok_or_else(|| Error::malformed(tags::OBJECT, "expected a dotted path"))?;

        if let Some(handler) = self.handlers.lookup(path) {
            let slot = self.memo.len();
            self.memo.push(Value::Null);
            let value = handler.restore(data, self)?;
            if let Some(entry) = self.memo.get_mut(slot) {
                *entry = value.clone();
            }
            return Ok(value);
        }

        let obj = self.types.construct(path)?;
        self.memo.push(Value::Object(obj.clone()));

        if let Some(state) = data.get(tags::STATE) {
            let state = self.restore_child(state)?;
            obj.borrow_mut().set_state(state);
            return Ok(Value::Object(obj));
        }

        let container = obj.borrow().container();
        match container {
            Some(Container::Mapping(dict)) => {
                let entries: Map<String, FlatValue> = data
                    .iter()
                    .filter(|(key, _)| !tags::is_tag(key))
                    .map(|(key, flat)| (key.clone(), flat.clone()))
                    .collect();
                self.restore_entries(&dict, &entries)?;
                return Ok(Value::Object(obj));
            }
            Some(Container::Sequence(list)) => {
                if let Some(items) = data.get(tags::SEQ) {
                    for item in tagged_array(tags::SEQ, items)? {
                        let value = self.restore_child(item)?;
                        list.push(value);
                    }
                }
            }
            Some(Container::Set(set)) => {
                if let Some(items) = data.get(tags::SEQ) {
                    for item in tagged_array(tags::SEQ, items)? {
                        let value = self.restore_child(item)?;
                        set.push_distinct(value);
                    }
                }
            }
            None if data.contains_key(tags::SEQ) => {
                return Err(Error::malformed(
                    tags::SEQ,
                    format!("`{path}` has no container to fill"),
                ));
            }
            None => {}
        }

        for (name, flat) in data {
            if tags::is_tag(name) {
                continue;
            }
            let value = self.restore_child(flat)?;
            obj.borrow_mut().set_attribute(name, value);
        }
        Ok(Value::Object(obj))
    }
}

fn tagged_array<'a>(tag: &'static str, flat: &'a FlatValue) -> Result<&'a Vec<FlatValue>> {
    flat.as_array()
        .ok_or_else(|| Error::malformed(tag, "expected an array"))
}
