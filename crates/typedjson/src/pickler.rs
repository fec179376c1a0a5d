//! Flattening engine: live [`Value`] graph → tagged [`FlatValue`] tree.
//!
//! Every container and object gets the next memo index the first time it is
//! seen, before its parts are visited. A second visit emits
//! `{"tj/id": index}` instead of descending again, which is what keeps
//! shared references shared and cycles finite.

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Number};

use crate::config::EncodeOptions;
use crate::handlers::{HandlerRegistry, Strategy};
use crate::reflect::Container;
use crate::repr::{fallback_text, key_text, repr_or_fallback};
use crate::tags;
use crate::value::{Dict, ObjectRef, Value};
use crate::FlatValue;

/// One flatten call's worth of state. Not shareable across overlapping
/// calls; build one pickler per in-flight call.
pub struct Pickler {
    handlers: HandlerRegistry,
    options: EncodeOptions,
    /// Identity → memo index.
    memo: HashMap<usize, usize>,
    /// Holds every memoized value so no address is reused mid-call.
    keepalive: Vec<Value>,
    /// Identities currently being flattened (lossy mode cycle detection).
    in_progress: HashSet<usize>,
    key_tokens: HashMap<usize, usize>,
    depth: usize,
}

impl Pickler {
    pub fn new(handlers: HandlerRegistry, options: EncodeOptions) -> Self {
        Self {
            handlers,
            options,
            memo: HashMap::new(),
            keepalive: Vec::new(),
            in_progress: HashSet::new(),
            key_tokens: HashMap::new(),
            depth: 0,
        }
    }

    pub fn options(&self) -> EncodeOptions {
        self.options
    }

    pub fn unpicklable(&self) -> bool {
        self.options.unpicklable
    }

    pub fn set_options(&mut self, options: EncodeOptions) {
        self.options = options;
    }

    pub fn reset(&mut self) {
        self.memo.clear();
        self.keepalive.clear();
        self.in_progress.clear();
        self.key_tokens.clear();
        self.depth = 0;
    }

    /// Flattens `value` with a fresh memo.
    pub fn flatten(&mut self, value: &Value) -> FlatValue {
        self.reset();
        let flat = self.flatten_child(value);
        self.reset();
        flat
    }

    /// Flattens a value nested inside the one currently being flattened,
    /// sharing the memo. Handlers call this for their children.
    pub fn flatten_child(&mut self, value: &Value) -> FlatValue {
        match value {
            Value::Null => FlatValue::Null,
            Value::Bool(b) => FlatValue::Bool(*b),
            Value::Int(i) => FlatValue::Number((*i).into()),
            Value::Float(f) => Number::from_f64(*f).map_or(FlatValue::Null, FlatValue::Number),
            Value::Str(s) => FlatValue::String(s.clone()),
            Value::Type(ty) => {
                if !self.options.unpicklable {
                    return FlatValue::String(ty.path().to_owned());
                }
                let mut data = Map::new();
                data.insert(tags::TYPE.to_owned(), FlatValue::String(ty.path().to_owned()));
                FlatValue::Object(data)
            }
            _ => self.flatten_shared(value),
        }
    }

    fn flatten_shared(&mut self, value: &Value) -> FlatValue {
        let Some(id) = value.identity() else {
            return FlatValue::Null;
        };

        if self.options.unpicklable {
            if let Some(&index) = self.memo.get(&id) {
                let mut data = Map::new();
                data.insert(tags::ID.to_owned(), FlatValue::Number(index.into()));
                return FlatValue::Object(data);
            }
        } else if self.in_progress.contains(&id) {
            return FlatValue::String(repr_or_fallback(value));
        }

        if self.options.max_depth.is_some_and(|max| self.depth >= max) {
            return FlatValue::String(repr_or_fallback(value));
        }

        if self.options.unpicklable {
            self.memo.insert(id, self.memo.len());
            self.keepalive.push(value.clone());
        }
        self.in_progress.insert(id);
        self.depth += 1;

        let flat = match value {
            Value::List(list) => FlatValue::Array(self.flatten_items(&list.to_vec())),
            Value::Tuple(tuple) => {
                let items = self.flatten_items(&tuple.to_vec());
                self.tagged_items(tags::TUPLE, items)
            }
            Value::Set(set) => {
                let items = self.flatten_items(&set.to_vec());
                self.tagged_items(tags::SET, items)
            }
            Value::Dict(dict) => {
                let mut data = Map::new();
                self.flatten_entries(dict, &mut data, false);
                FlatValue::Object(data)
            }
            Value::Object(obj) => self.flatten_object(obj),
            _ => FlatValue::Null,
        };

        self.depth -= 1;
        self.in_progress.remove(&id);
        flat
    }

    fn tagged_items(&self, tag: &str, items: Vec<FlatValue>) -> FlatValue {
        if !self.options.unpicklable {
            return FlatValue::Array(items);
        }
        let mut data = Map::new();
        data.insert(tag.to_owned(), FlatValue::Array(items));
        FlatValue::Object(data)
    }

    fn flatten_items(&mut self, items: &[Value]) -> Vec<FlatValue> {
        items.iter().map(|item| self.flatten_child(item)).collect()
    }

    /// Writes `dict`'s entries into `data`. A key whose text is already
    /// present is dropped before its value is visited, as is a tag-named key
    /// when `skip_tags` is set.
    fn flatten_entries(
        &mut self,
        dict: &Dict,
        data: &mut Map<String, FlatValue>,
        skip_tags: bool,
    ) {
        let entries = dict.entries().clone();
        for (key, value) in entries {
            let key = self.key_text(&key);
            if skip_tags && tags::is_tag(&key) {
                log::debug!("skipping mapping entry named like tag `{key}`");
                continue;
            }
            if data.contains_key(&key) {
                log::debug!("dropping duplicate mapping key `{key}`");
                continue;
            }
            let flat = self.flatten_child(&value);
            data.insert(key, flat);
        }
    }

    fn key_text(&mut self, key: &Value) -> String {
        match key_text(key) {
            Ok(text) => text,
            Err(err) => {
                let token = match key.identity() {
                    Some(id) => {
                        let next = self.key_tokens.len();
                        let token = *self.key_tokens.entry(id).or_insert(next);
                        if token == next {
                            self.keepalive.push(key.clone());
                        }
                        token
                    }
                    None => self.key_tokens.len(),
                };
                log::trace!("key representation failed ({err}), using fallback");
                fallback_text(key, Some(token))
            }
        }
    }

    fn flatten_object(&mut self, obj: &ObjectRef) -> FlatValue {
        let mut data = Map::new();
        if self.options.unpicklable {
            data.insert(
                tags::OBJECT.to_owned(),
                FlatValue::String(obj.type_path().to_owned()),
            );
        }

        match Strategy::of(&self.handlers, obj) {
            Strategy::Handler(handler) => handler.flatten(obj, data, self),
            Strategy::State(state) => {
                let state = self.flatten_child(&state);
                if !self.options.unpicklable {
                    return state;
                }
                data.insert(tags::STATE.to_owned(), state);
                FlatValue::Object(data)
            }
            Strategy::Container(container) => self.flatten_container(obj, container, data),
            Strategy::Generic => {
                self.flatten_attributes(obj, &mut data);
                FlatValue::Object(data)
            }
        }
    }

    /// Container data first, then the instance's extra attributes. Mapping
    /// subtypes merge their entries into the instance mapping and carry no
    /// attributes.
    fn flatten_container(
        &mut self,
        obj: &ObjectRef,
        container: Container,
        mut data: Map<String, FlatValue>,
    ) -> FlatValue {
        let items = match container {
            Container::Mapping(dict) => {
                self.flatten_entries(&dict, &mut data, true);
                return FlatValue::Object(data);
            }
            Container::Sequence(list) => self.flatten_items(&list.to_vec()),
            Container::Set(set) => self.flatten_items(&set.to_vec()),
        };
        if !self.options.unpicklable {
            return FlatValue::Array(items);
        }
        data.insert(tags::SEQ.to_owned(), FlatValue::Array(items));
        self.flatten_attributes(obj, &mut data);
        FlatValue::Object(data)
    }

    fn flatten_attributes(&mut self, obj: &ObjectRef, data: &mut Map<String, FlatValue>) {
        let attributes = obj.borrow().attributes();
        for (name, value) in attributes {
            if tags::is_tag(&name) {
                log::debug!("skipping attribute `{name}` of `{}`: reserved", obj.type_path());
                continue;
            }
            if data.contains_key(&name) {
                continue;
            }
            let flat = self.flatten_child(&value);
            data.insert(name, flat);
        }
    }
}
